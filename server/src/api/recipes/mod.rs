pub mod create;
pub mod get;
pub mod random;
pub mod search;
pub mod servings;

use crate::AppState;
use axum::routing::{get, post, put};
use axum::Router;
use utoipa::OpenApi;

/// Returns the router for /api/recipes endpoints (mounted at /api/recipes)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create::create_recipe))
        .route("/random", get(random::random_recipes))
        .route("/search", get(search::search_recipes))
        .route("/{id}", get(get::get_recipe))
        .route("/{id}/servings", put(servings::update_servings))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        create::create_recipe,
        random::random_recipes,
        search::search_recipes,
        get::get_recipe,
        servings::update_servings,
    ),
    components(schemas(
        create::CreateRecipeResponse,
        saucier_core::PersonalRecipePayload,
        saucier_core::IngredientPayload,
        saucier_core::InstructionsPayload,
        random::RandomResponse,
        saucier_core::SearchResults,
        servings::ServingsRequest,
        servings::ServingsResponse,
    ))
)]
pub struct ApiDoc;
