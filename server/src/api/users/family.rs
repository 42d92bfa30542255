use crate::api::{ApiJson, ApiResult, ErrorResponse};
use crate::auth::AuthUser;
use axum::{extract::State, http::StatusCode, Json};
use saucier_core::{FamilyRecipe, FamilyRecipePayload, RecipeService};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FamilyRecipesResponse {
    pub family_recipes: Vec<FamilyRecipe>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFamilyRecipeResponse {
    pub recipe_id: i64,
}

#[utoipa::path(
    post,
    path = "/api/users/family-recipes",
    tag = "users",
    request_body(content = FamilyRecipePayload, example = json!({
        "title": "Grandma's Kugel",
        "owner": "Grandma Rose",
        "occasion": "Passover",
        "ingredients": ["noodles", "eggs", "raisins"],
        "instructions": "Mix everything and bake for an hour."
    })),
    responses(
        (status = 201, description = "Family recipe saved", body = CreateFamilyRecipeResponse),
        (status = 400, description = "Missing field", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_family_recipe(
    AuthUser(user): AuthUser,
    State(service): State<RecipeService>,
    ApiJson(payload): ApiJson<FamilyRecipePayload>,
) -> ApiResult<(StatusCode, Json<CreateFamilyRecipeResponse>)> {
    let recipe_id = service.add_family_recipe(user.id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateFamilyRecipeResponse { recipe_id }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/users/family-recipes",
    tag = "users",
    responses(
        (status = 200, description = "The caller's family recipes", body = FamilyRecipesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_family_recipes(
    AuthUser(user): AuthUser,
    State(service): State<RecipeService>,
) -> ApiResult<Json<FamilyRecipesResponse>> {
    let family_recipes = service.list_family_recipes(user.id).await?;
    Ok(Json(FamilyRecipesResponse { family_recipes }))
}
