use crate::api::{ApiResult, ErrorResponse};
use crate::auth::MaybeAuthUser;
use axum::{
    extract::{Query, State},
    Json,
};
use saucier_core::{Personalized, RecipeService};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RandomParams {
    /// How many recipes to return (default 3, at most 100)
    pub number: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RandomResponse {
    pub recipes: Vec<Personalized>,
}

#[utoipa::path(
    get,
    path = "/api/recipes/random",
    tag = "recipes",
    params(RandomParams),
    responses(
        (status = 200, description = "Random recipe previews", body = RandomResponse),
        (status = 400, description = "Invalid number", body = ErrorResponse),
        (status = 502, description = "Catalog unavailable", body = ErrorResponse)
    ),
    security(
        (),
        ("bearer_auth" = [])
    )
)]
pub async fn random_recipes(
    user: MaybeAuthUser,
    State(service): State<RecipeService>,
    Query(params): Query<RandomParams>,
) -> ApiResult<Json<RandomResponse>> {
    let number = params.number.map(Value::String);
    let recipes = service
        .get_random_recipes(number.as_ref(), user.user_id())
        .await?;
    Ok(Json(RandomResponse { recipes }))
}
