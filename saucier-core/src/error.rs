use thiserror::Error;

use crate::catalog::CatalogError;
use crate::scale::ScaleError;
use crate::store::StoreError;

/// Outcome taxonomy surfaced to the routing layer.
///
/// `NotFound` and `Conflict` are expected results of normal operation;
/// `DependencyFailure` is the only retryable variant.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    Conflict(String),

    #[error("invalid `{field}`: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("authentication required")]
    Unauthorized,

    #[error("dependency failed: {detail}")]
    DependencyFailure {
        detail: String,
        /// Set when a multi-step write stopped half way and left some of its
        /// effects in place.
        partial: bool,
    },
}

impl CoreError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        CoreError::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn dependency(detail: impl Into<String>) -> Self {
        CoreError::DependencyFailure {
            detail: detail.into(),
            partial: false,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, CoreError::DependencyFailure { .. })
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        let partial = matches!(err, StoreError::PartialWrite { .. });
        CoreError::DependencyFailure {
            detail: format!("store: {err}"),
            partial,
        }
    }
}

impl From<CatalogError> for CoreError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(id) => CoreError::NotFound(format!("catalog recipe {id}")),
            other => CoreError::dependency(format!("catalog: {other}")),
        }
    }
}

impl From<ScaleError> for CoreError {
    fn from(err: ScaleError) -> Self {
        CoreError::invalid("servings", err.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
