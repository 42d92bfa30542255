use crate::api::{ApiResult, ErrorResponse};
use crate::auth::AuthUser;
use axum::{extract::State, Json};
use saucier_core::{Personalized, RecipeService};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct UserRecipesResponse {
    pub recipes: Vec<Personalized>,
}

#[utoipa::path(
    get,
    path = "/api/users/recipes",
    tag = "users",
    responses(
        (status = 200, description = "Previews of the caller's own recipes", body = UserRecipesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_user_recipes(
    AuthUser(user): AuthUser,
    State(service): State<RecipeService>,
) -> ApiResult<Json<UserRecipesResponse>> {
    let recipes = service.list_user_recipes(user.id).await?;
    Ok(Json(UserRecipesResponse { recipes }))
}
