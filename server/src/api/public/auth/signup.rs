use crate::api::{ApiError, ApiJson, ErrorResponse};
use crate::auth::{create_session, hash_password};
use crate::db::DbPool;
use crate::get_conn;
use crate::models::{NewUser, User};
use crate::schema::users;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use saucier_core::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Registration payload. Only `username` and `password` are required; the
/// profile fields are stored when given.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub firstname: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub profile_pic: Option<String>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupResponse {
    pub user_id: i32,
    pub token: String,
}

/// Trimmed signup fields, ready to insert.
#[derive(Debug, PartialEq)]
struct Profile<'a> {
    username: &'a str,
    firstname: Option<&'a str>,
    lastname: Option<&'a str>,
    country: Option<&'a str>,
    email: Option<&'a str>,
    profile_pic: Option<&'a str>,
}

/// Blank optional fields count as absent.
fn optional<'a>(
    value: &'a Option<String>,
    field: &'static str,
    max: usize,
) -> CoreResult<Option<&'a str>> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.chars().count() > max => Err(CoreError::invalid(
            field,
            format!("must be at most {max} characters"),
        )),
        Some(v) => Ok(Some(v)),
    }
}

impl SignupRequest {
    fn profile(&self) -> CoreResult<Profile<'_>> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(CoreError::invalid("username", "cannot be empty"));
        }
        if username.chars().count() > 255 {
            return Err(CoreError::invalid("username", "must be at most 255 characters"));
        }
        if self.password.is_empty() {
            return Err(CoreError::invalid("password", "cannot be empty"));
        }

        let email = optional(&self.email, "email", 255)?;
        if let Some(email) = email {
            let valid = email
                .split_once('@')
                .is_some_and(|(local, domain)| {
                    !local.is_empty() && domain.contains('.') && !domain.contains('@')
                });
            if !valid {
                return Err(CoreError::invalid("email", "must be an email address"));
            }
        }

        Ok(Profile {
            username,
            firstname: optional(&self.firstname, "firstname", 50)?,
            lastname: optional(&self.lastname, "lastname", 50)?,
            country: optional(&self.country, "country", 100)?,
            email,
            profile_pic: optional(&self.profile_pic, "profilePic", 2048)?,
        })
    }
}

fn internal_error(message: &str) -> axum::response::Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    tag = "auth",
    request_body(content = SignupRequest, example = json!({
        "username": "chef",
        "password": "password",
        "firstname": "Ada",
        "lastname": "Lovelace",
        "country": "UK",
        "email": "ada@example.com"
    })),
    responses(
        (status = 201, description = "User created successfully", body = SignupResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 409, description = "Username or email already registered", body = ErrorResponse)
    )
)]
pub async fn signup(
    State(pool): State<Arc<DbPool>>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> impl IntoResponse {
    let profile = match req.profile() {
        Ok(p) => p,
        Err(e) => return ApiError(e).into_response(),
    };

    let mut conn = get_conn!(pool);

    let password_hash = match hash_password(&req.password) {
        Ok(h) => h,
        Err(e) => {
            tracing::error!("Failed to hash password: {}", e);
            return internal_error("Failed to hash password");
        }
    };

    let new_user = NewUser {
        username: profile.username,
        password_hash: &password_hash,
        firstname: profile.firstname,
        lastname: profile.lastname,
        country: profile.country,
        email: profile.email,
        profile_pic: profile.profile_pic,
    };

    let user: User = match diesel::insert_into(users::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result(&mut conn)
    {
        Ok(u) => u,
        Err(DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info)) => {
            let taken = if info.constraint_name() == Some("users_email_lower_key") {
                "email"
            } else {
                "username"
            };
            return ApiError(CoreError::Conflict(taken.to_string())).into_response();
        }
        Err(e) => {
            tracing::error!("Failed to create user: {}", e);
            return internal_error("Failed to create user");
        }
    };

    let token = match create_session(&mut conn, user.id) {
        Ok(t) => t,
        Err(e) => {
            tracing::error!("Failed to create session: {}", e);
            return internal_error("Failed to create session");
        }
    };

    tracing::info!(user_id = user.id, "user signed up");
    (
        StatusCode::CREATED,
        Json(SignupResponse {
            user_id: user.id,
            token,
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> SignupRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_profile_fields_are_trimmed_and_optional() {
        let req = request(json!({
            "username": " chef ",
            "password": "pw",
            "firstname": "Ada ",
            "lastname": "",
            "email": "ada@example.com",
            "profilePic": "https://example.com/ada.png"
        }));
        assert_eq!(
            req.profile().unwrap(),
            Profile {
                username: "chef",
                firstname: Some("Ada"),
                lastname: None,
                country: None,
                email: Some("ada@example.com"),
                profile_pic: Some("https://example.com/ada.png"),
            }
        );

        let minimal = request(json!({"username": "chef", "password": "pw"}));
        assert_eq!(minimal.profile().unwrap().email, None);
    }

    #[test]
    fn test_profile_rejects_bad_fields() {
        let field_of = |body: serde_json::Value| match request(body).profile() {
            Err(CoreError::InvalidInput { field, .. }) => field,
            other => panic!("expected invalid input, got {other:?}"),
        };
        assert_eq!(field_of(json!({"username": "  ", "password": "pw"})), "username");
        assert_eq!(field_of(json!({"username": "chef", "password": ""})), "password");
        assert_eq!(
            field_of(json!({"username": "chef", "password": "pw", "email": "nope"})),
            "email"
        );
        assert_eq!(
            field_of(json!({"username": "chef", "password": "pw", "email": "a@b@c.com"})),
            "email"
        );
        assert_eq!(
            field_of(json!({"username": "chef", "password": "pw", "country": "x".repeat(101)})),
            "country"
        );
    }
}
