use crate::api::{ApiError, ErrorResponse};
use crate::auth::{bearer_token, delete_session, AuthUser};
use crate::db::DbPool;
use crate::get_conn;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use saucier_core::RecipeService;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LogoutResponse {
    pub success: bool,
}

/// End the current session and forget the caller's last search.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 502, description = "Store unavailable", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn logout(
    AuthUser(user): AuthUser,
    State(pool): State<Arc<DbPool>>,
    State(service): State<RecipeService>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(e) = service.clear_last_search(user.id).await {
        return ApiError::from(e).into_response();
    }

    let mut conn = get_conn!(pool);
    // The extractor already accepted this header.
    if let Ok(token) = bearer_token(&headers) {
        if let Err(e) = delete_session(&mut conn, token) {
            tracing::error!("Failed to delete session: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "Failed to delete session".to_string(),
                }),
            )
                .into_response();
        }
    }

    tracing::info!(user_id = user.id, "user logged out");
    (StatusCode::OK, Json(LogoutResponse { success: true })).into_response()
}
