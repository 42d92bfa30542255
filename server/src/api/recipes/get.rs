use crate::api::{ApiResult, ErrorResponse};
use crate::auth::MaybeAuthUser;
use axum::{
    extract::{Path, State},
    Json,
};
use saucier_core::{Personalized, RecipeService};

/// Full recipe. A signed-in caller's first visit is recorded as a view.
#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = String, Path, description = "Recipe ID: digits, `personal-<n>` or `catalog-<n>`")
    ),
    responses(
        (status = 200, description = "Recipe details", body = Personalized),
        (status = 401, description = "Invalid token", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse),
        (status = 502, description = "Catalog unavailable", body = ErrorResponse)
    ),
    security(
        (),
        ("bearer_auth" = [])
    )
)]
pub async fn get_recipe(
    user: MaybeAuthUser,
    State(service): State<RecipeService>,
    Path(id): Path<String>,
) -> ApiResult<Json<Personalized>> {
    let recipe = service.get_recipe_by_id(&id, user.user_id()).await?;
    Ok(Json(recipe))
}
