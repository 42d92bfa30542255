use crate::api::{ApiResult, ErrorResponse};
use crate::auth::MaybeAuthUser;
use axum::{
    extract::{Query, State},
    Json,
};
use saucier_core::{RecipeService, SearchRequest, SearchResults};
use serde::Deserialize;
use serde_json::Value;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Free-text query (required)
    pub query: Option<String>,
    pub cuisine: Option<String>,
    pub diet: Option<String>,
    pub intolerances: Option<String>,
    /// Result count (default 5, at most 100)
    pub number: Option<String>,
    /// Catalog sort key (default "popularity")
    pub sort: Option<String>,
}

impl From<SearchParams> for SearchRequest {
    fn from(params: SearchParams) -> Self {
        SearchRequest {
            query: params.query,
            cuisine: params.cuisine,
            diet: params.diet,
            intolerances: params.intolerances,
            number: params.number.map(Value::String),
            sort: params.sort,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/recipes/search",
    tag = "recipes",
    params(SearchParams),
    responses(
        (status = 200, description = "Matching recipe previews", body = SearchResults),
        (status = 400, description = "Missing query or bad number", body = ErrorResponse),
        (status = 502, description = "Catalog unavailable", body = ErrorResponse)
    ),
    security(
        (),
        ("bearer_auth" = [])
    )
)]
pub async fn search_recipes(
    user: MaybeAuthUser,
    State(service): State<RecipeService>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResults>> {
    let results = service
        .search_recipes(params.into(), user.user_id())
        .await?;
    Ok(Json(results))
}
