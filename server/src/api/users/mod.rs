pub mod family;
pub mod favorites;
pub mod last_search;
pub mod recipes;
pub mod viewed;

use crate::AppState;
use axum::routing::get;
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for per-user endpoints (mounted at /api/users)
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/favorites",
            get(favorites::list_favorites).post(favorites::add_favorite),
        )
        .route("/recipes", get(recipes::list_user_recipes))
        .route("/viewed-recipes", get(viewed::list_viewed_recipes))
        .route("/last-search", get(last_search::get_last_search))
        .route(
            "/family-recipes",
            get(family::list_family_recipes).post(family::add_family_recipe),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        favorites::add_favorite,
        favorites::list_favorites,
        recipes::list_user_recipes,
        viewed::list_viewed_recipes,
        last_search::get_last_search,
        family::add_family_recipe,
        family::list_family_recipes,
    ),
    components(schemas(
        favorites::AddFavoriteRequest,
        favorites::AddFavoriteResponse,
        favorites::FavoritesResponse,
        recipes::UserRecipesResponse,
        viewed::ViewedRecipesResponse,
        last_search::LastSearchResponse,
        family::FamilyRecipesResponse,
        family::CreateFamilyRecipeResponse,
        saucier_core::FamilyRecipePayload,
    ))
)]
pub struct ApiDoc;
