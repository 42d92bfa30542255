use crate::api::{ApiJson, ApiResult, ErrorResponse};
use crate::auth::AuthUser;
use axum::{extract::State, http::StatusCode, Json};
use saucier_core::{PersonalRecipePayload, RecipeService};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecipeResponse {
    pub recipe_id: i64,
}

#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body(content = PersonalRecipePayload, example = json!({
        "title": "Pancakes",
        "servings": 4,
        "vegetarian": true,
        "ingredients": [{"name": "flour", "amount": 2, "unit": "cup"}],
        "instructions": ["Mix", "Fry"]
    })),
    responses(
        (status = 201, description = "Recipe created successfully", body = CreateRecipeResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_recipe(
    AuthUser(user): AuthUser,
    State(service): State<RecipeService>,
    ApiJson(payload): ApiJson<PersonalRecipePayload>,
) -> ApiResult<(StatusCode, Json<CreateRecipeResponse>)> {
    let recipe_id = service.create_personal_recipe(payload, user.id).await?;
    Ok((StatusCode::CREATED, Json(CreateRecipeResponse { recipe_id })))
}
