use crate::api::{ApiResult, ErrorResponse};
use crate::auth::AuthUser;
use axum::{extract::State, Json};
use saucier_core::{Personalized, RecipeService};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ViewedRecipesResponse {
    pub viewed_recipes: Vec<Personalized>,
}

/// The caller's most recently viewed recipes, newest first.
#[utoipa::path(
    get,
    path = "/api/users/viewed-recipes",
    tag = "users",
    responses(
        (status = 200, description = "Recently viewed recipe previews", body = ViewedRecipesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 502, description = "Catalog unavailable", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_viewed_recipes(
    AuthUser(user): AuthUser,
    State(service): State<RecipeService>,
) -> ApiResult<Json<ViewedRecipesResponse>> {
    let viewed_recipes = service.list_recent_views(user.id).await?;
    Ok(Json(ViewedRecipesResponse { viewed_recipes }))
}
