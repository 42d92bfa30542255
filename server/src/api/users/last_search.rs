use crate::api::{ApiResult, ErrorResponse};
use crate::auth::AuthUser;
use axum::{extract::State, Json};
use saucier_core::{RecipeService, SearchCriteria};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LastSearchResponse {
    pub last_search: Option<SearchCriteria>,
}

#[utoipa::path(
    get,
    path = "/api/users/last-search",
    tag = "users",
    responses(
        (status = 200, description = "Criteria of the caller's last search, if any", body = LastSearchResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_last_search(
    AuthUser(user): AuthUser,
    State(service): State<RecipeService>,
) -> ApiResult<Json<LastSearchResponse>> {
    let last_search = service.get_last_search(user.id).await?;
    Ok(Json(LastSearchResponse { last_search }))
}
