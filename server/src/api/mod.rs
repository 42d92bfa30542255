pub mod public;
pub mod recipes;
pub mod users;

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use saucier_core::{
    CoreError, FamilyRecipe, Ingredient, Personalized, RecipeSource, RecipeView, SearchCriteria,
    StoredIngredient, UserFlags,
};
use serde::Serialize;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{OpenApi, ToSchema};

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Maps core outcomes onto HTTP. Dependency failures are logged here and
/// reach the client only as a generic retryable message.
#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self.0 {
            CoreError::NotFound(_) => (StatusCode::NOT_FOUND, self.0.to_string()),
            CoreError::Conflict(_) => (StatusCode::CONFLICT, self.0.to_string()),
            CoreError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, self.0.to_string()),
            CoreError::Unauthorized => (StatusCode::UNAUTHORIZED, self.0.to_string()),
            CoreError::DependencyFailure { detail, partial } => {
                tracing::error!(detail = %detail, partial, "dependency failure");
                let message = if *partial {
                    "upstream dependency failed part way; some changes were applied, retry later"
                } else {
                    "upstream dependency failed, retry later"
                };
                (StatusCode::BAD_GATEWAY, message.to_string())
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// `Json` body extractor whose rejections are [`ErrorResponse`] 400s.
///
/// The message keeps the path of the offending field, e.g.
/// ``invalid `body`: ... vegan: invalid type: string "yes", expected a boolean``.
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                tracing::debug!(status = %rejection.status(), "rejected request body");
                Err(ApiError(CoreError::invalid("body", rejection.body_text())))
            }
        }
    }
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Base spec with shared components and security
    #[derive(OpenApi)]
    #[openapi(components(schemas(
        ErrorResponse,
        Ingredient,
        StoredIngredient,
        RecipeSource,
        RecipeView,
        UserFlags,
        Personalized,
        SearchCriteria,
        FamilyRecipe,
    )))]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        public::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
        users::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}
