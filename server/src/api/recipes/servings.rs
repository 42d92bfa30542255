use crate::api::{ApiJson, ApiResult, ErrorResponse};
use crate::auth::AuthUser;
use axum::{
    extract::{Path, State},
    Json,
};
use saucier_core::{coerce_servings, CoreError, RecipeService, StoredIngredient};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ServingsRequest {
    #[schema(value_type = u32)]
    pub servings: Option<Value>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ServingsResponse {
    pub ingredients: Vec<StoredIngredient>,
}

/// Rescale one of the caller's own recipes to a new serving count.
#[utoipa::path(
    put,
    path = "/api/recipes/{id}/servings",
    tag = "recipes",
    params(
        ("id" = i64, Path, description = "Personal recipe ID")
    ),
    request_body(content = ServingsRequest, example = json!({"servings": 6})),
    responses(
        (status = 200, description = "Rescaled ingredients", body = ServingsResponse),
        (status = 400, description = "Invalid servings", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 404, description = "No such recipe owned by the caller", body = ErrorResponse),
        (status = 502, description = "Update failed, possibly part way", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_servings(
    AuthUser(user): AuthUser,
    State(service): State<RecipeService>,
    Path(id): Path<i64>,
    ApiJson(request): ApiJson<ServingsRequest>,
) -> ApiResult<Json<ServingsResponse>> {
    let servings = match &request.servings {
        Some(value) => coerce_servings(value)?,
        None => return Err(CoreError::invalid("servings", "is required").into()),
    };
    let ingredients = service.update_servings(id, servings, user.id).await?;
    Ok(Json(ServingsResponse { ingredients }))
}
