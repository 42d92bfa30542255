use crate::api::{ApiJson, ApiResult, ErrorResponse};
use crate::auth::AuthUser;
use axum::{extract::State, http::StatusCode, Json};
use saucier_core::{CoreError, CoreResult, Personalized, RecipeKey, RecipeService};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteRequest {
    /// A number, or a `personal-<n>` / `catalog-<n>` string.
    #[schema(value_type = String, example = "catalog-715538")]
    pub recipe_id: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddFavoriteResponse {
    /// The favorited recipe with its source, e.g. `catalog-715538`.
    pub recipe_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FavoritesResponse {
    pub favorites: Vec<Personalized>,
}

/// Accepts a positive integer as a JSON number or digit string, or a
/// `personal-<n>` / `catalog-<n>` string.
fn parse_recipe_key(value: Option<&Value>) -> CoreResult<RecipeKey> {
    let key = match value {
        Some(Value::Number(n)) => n.as_i64().map(RecipeKey::Ambiguous),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    };
    match key {
        Some(
            key @ (RecipeKey::Ambiguous(id) | RecipeKey::Personal(id) | RecipeKey::Catalog(id)),
        ) if id > 0 => Ok(key),
        _ => Err(CoreError::invalid("recipeId", "must be a positive integer")),
    }
}

#[utoipa::path(
    post,
    path = "/api/users/favorites",
    tag = "users",
    request_body(content = AddFavoriteRequest, example = json!({"recipeId": "catalog-715538"})),
    responses(
        (status = 201, description = "Recipe favorited", body = AddFavoriteResponse),
        (status = 400, description = "Invalid recipe ID", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 409, description = "Already a favorite", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn add_favorite(
    AuthUser(user): AuthUser,
    State(service): State<RecipeService>,
    ApiJson(request): ApiJson<AddFavoriteRequest>,
) -> ApiResult<(StatusCode, Json<AddFavoriteResponse>)> {
    let key = parse_recipe_key(request.recipe_id.as_ref())?;
    let recipe = service.add_favorite(user.id, key).await?;
    Ok((
        StatusCode::CREATED,
        Json(AddFavoriteResponse {
            recipe_id: recipe.to_string(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/users/favorites",
    tag = "users",
    responses(
        (status = 200, description = "Favorited recipe previews", body = FavoritesResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 502, description = "Catalog unavailable", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_favorites(
    AuthUser(user): AuthUser,
    State(service): State<RecipeService>,
) -> ApiResult<Json<FavoritesResponse>> {
    let favorites = service.list_favorites(user.id).await?;
    Ok(Json(FavoritesResponse { favorites }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_recipe_key() {
        let parse = |v: Value| parse_recipe_key(Some(&v));
        assert_eq!(parse(json!(42)).unwrap(), RecipeKey::Ambiguous(42));
        assert_eq!(parse(json!("715538")).unwrap(), RecipeKey::Ambiguous(715538));
        assert_eq!(parse(json!("personal-4")).unwrap(), RecipeKey::Personal(4));
        assert_eq!(parse(json!("catalog-4")).unwrap(), RecipeKey::Catalog(4));
        assert!(parse(json!(0)).is_err());
        assert!(parse(json!("catalog-0")).is_err());
        assert!(parse(json!(-3)).is_err());
        assert!(parse(json!(1.5)).is_err());
        assert!(parse(json!(" 4")).is_err());
        assert!(parse(json!("recipe-4")).is_err());
        assert!(parse_recipe_key(None).is_err());
    }
}
