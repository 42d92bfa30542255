pub mod auth;

use crate::AppState;
use axum::routing::post;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for the identity endpoints
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/auth/signup", post(auth::signup::signup))
        .route("/api/auth/login", post(auth::login::login))
        .route("/api/auth/logout", post(auth::logout::logout))
}

#[derive(OpenApi)]
#[openapi(
    paths(auth::login::login, auth::signup::signup, auth::logout::logout),
    components(schemas(
        auth::login::LoginRequest,
        auth::login::LoginResponse,
        auth::signup::SignupRequest,
        auth::signup::SignupResponse,
        auth::logout::LogoutResponse,
    ))
)]
pub struct ApiDoc;
