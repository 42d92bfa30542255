use crate::api::{ApiJson, ErrorResponse};
use crate::auth::{create_session, hash_password, verify_password, PasswordCheck};
use crate::db::DbPool;
use crate::get_conn;
use crate::models::User;
use crate::schema::users;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

fn invalid_credentials() -> axum::response::Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: "Invalid credentials".to_string(),
        }),
    )
        .into_response()
}

/// Re-hash with the current cost parameters. Failure only costs another
/// attempt at the next login.
fn upgrade_hash(conn: &mut PgConnection, user_id: i32, password: &str) {
    let result = hash_password(password)
        .map_err(|e| e.to_string())
        .and_then(|hash| {
            diesel::update(users::table.find(user_id))
                .set((
                    users::password_hash.eq(hash),
                    users::updated_at.eq(chrono::Utc::now()),
                ))
                .execute(conn)
                .map_err(|e| e.to_string())
        });
    match result {
        Ok(_) => tracing::info!(user_id, "password hash upgraded"),
        Err(e) => tracing::warn!(user_id, error = %e, "password hash upgrade failed"),
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body(content = LoginRequest, example = json!({"username": "user", "password": "password"})),
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(pool): State<Arc<DbPool>>,
    ApiJson(req): ApiJson<LoginRequest>,
) -> impl IntoResponse {
    let mut conn = get_conn!(pool);

    // Usernames are unique case-insensitively (see the users migration).
    let user: User = match users::table
        .filter(
            diesel::dsl::sql::<diesel::sql_types::Bool>("LOWER(username) = LOWER(")
                .bind::<diesel::sql_types::Text, _>(req.username.trim())
                .sql(")"),
        )
        .filter(users::deleted_at.is_null())
        .select(User::as_select())
        .first(&mut conn)
    {
        Ok(u) => u,
        Err(_) => return invalid_credentials(),
    };

    match verify_password(&req.password, &user.password_hash) {
        PasswordCheck::Invalid => return invalid_credentials(),
        PasswordCheck::Valid { rehash: false } => {}
        PasswordCheck::Valid { rehash: true } => upgrade_hash(&mut conn, user.id, &req.password),
    }

    match create_session(&mut conn, user.id) {
        Ok(token) => (StatusCode::OK, Json(LoginResponse { token })).into_response(),
        Err(e) => {
            tracing::error!("Failed to create session: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to create session".to_string(),
                }),
            )
                .into_response()
        }
    }
}
