//! Remote recipe catalog: wire shapes, the client trait, and implementations.
//!
//! All catalog traffic goes through [`RecipeCatalog`] so the resolver can be
//! exercised against [`FakeCatalog`] in tests.

mod client;
mod fake;
mod rate_limiter;

pub use client::{CatalogClient, CatalogClientBuilder, DEFAULT_BASE_URL};
pub use fake::FakeCatalog;
pub use rate_limiter::RateLimiter;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::types::{RecipeId, SearchCriteria};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("catalog has no recipe {0}")]
    NotFound(RecipeId),

    #[error("catalog returned HTTP {0}")]
    Status(u16),

    #[error("catalog request failed: {0}")]
    Transport(String),

    #[error("unexpected catalog payload: {0}")]
    Decode(String),

    #[error("catalog API key not configured")]
    NotConfigured,
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key.
        CatalogError::Transport(err.without_url().to_string())
    }
}

/// Recipe object as the catalog sends it. Every field is optional on the
/// wire; the normalizer decides what is required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogRecipe {
    pub id: Option<RecipeId>,
    pub title: Option<String>,
    pub image: Option<String>,
    pub ready_in_minutes: Option<i64>,
    pub aggregate_likes: Option<i64>,
    pub vegan: Option<bool>,
    pub vegetarian: Option<bool>,
    pub gluten_free: Option<bool>,
    pub servings: Option<i64>,
    pub extended_ingredients: Option<Vec<CatalogIngredient>>,
    pub instructions: Option<String>,
    pub analyzed_instructions: Option<Vec<AnalyzedInstructions>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogIngredient {
    pub id: Option<i64>,
    pub name: Option<String>,
    pub amount: Option<f64>,
    pub unit: Option<String>,
    pub original: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzedInstructions {
    #[serde(default)]
    pub steps: Vec<AnalyzedStep>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyzedStep {
    pub step: String,
}

/// Remote catalog operations. One attempt per call, no retries.
#[async_trait]
pub trait RecipeCatalog: Send + Sync {
    async fn fetch_random(&self, number: u32) -> Result<Vec<CatalogRecipe>, CatalogError>;

    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<CatalogRecipe>, CatalogError>;

    async fn fetch_by_id(&self, id: RecipeId) -> Result<CatalogRecipe, CatalogError>;
}
