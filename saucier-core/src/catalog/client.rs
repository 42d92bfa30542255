//! reqwest-backed catalog client.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::rate_limiter::RateLimiter;
use super::{CatalogError, CatalogRecipe, RecipeCatalog};
use crate::types::{RecipeId, SearchCriteria};

pub const DEFAULT_BASE_URL: &str = "https://api.spoonacular.com/recipes";

/// Configuration for [`CatalogClient`].
#[derive(Clone)]
pub struct CatalogClientBuilder {
    base_url: String,
    api_key: Option<String>,
    rate_limit_ms: u64,
    timeout: Duration,
    user_agent: String,
}

impl Default for CatalogClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogClientBuilder {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            rate_limit_ms: 200,
            timeout: Duration::from_secs(10),
            user_agent: concat!("saucier/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Without a key every call fails with [`CatalogError::NotConfigured`].
    pub fn api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Minimum spacing between requests to the catalog host. 0 disables it.
    pub fn rate_limit_ms(mut self, ms: u64) -> Self {
        self.rate_limit_ms = ms;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<CatalogClient, reqwest::Error> {
        let inner = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()?;

        Ok(CatalogClient {
            inner: Arc::new(inner),
            base_url: self.base_url.trim_end_matches('/').to_string(),
            api_key: self.api_key,
            rate_limiter: RateLimiter::new(Duration::from_millis(self.rate_limit_ms)),
        })
    }
}

/// Production catalog client.
pub struct CatalogClient {
    inner: Arc<reqwest::Client>,
    base_url: String,
    api_key: Option<String>,
    rate_limiter: RateLimiter,
}

#[derive(Deserialize)]
struct RandomResponse {
    #[serde(default)]
    recipes: Vec<CatalogRecipe>,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<CatalogRecipe>,
}

impl CatalogClient {
    pub fn builder() -> CatalogClientBuilder {
        CatalogClientBuilder::new()
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn host(&self) -> Option<String> {
        reqwest::Url::parse(&self.base_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.to_string()))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        let api_key = self.api_key.as_deref().ok_or(CatalogError::NotConfigured)?;
        let url = format!("{}/{}", self.base_url, path);

        if let Some(host) = self.host() {
            self.rate_limiter.wait(&host).await;
        }

        tracing::debug!(path, "catalog: request");
        let response = self
            .inner
            .get(&url)
            .query(params)
            .query(&[("apiKey", api_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(path, status = %status, "catalog: request failed");
            return Err(CatalogError::Status(status.as_u16()));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CatalogError::Decode(e.without_url().to_string()))
    }
}

#[async_trait]
impl RecipeCatalog for CatalogClient {
    async fn fetch_random(&self, number: u32) -> Result<Vec<CatalogRecipe>, CatalogError> {
        let response: RandomResponse = self
            .get_json("random", &[("number", number.to_string())])
            .await?;
        Ok(response.recipes)
    }

    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<CatalogRecipe>, CatalogError> {
        let mut params = vec![
            ("query", criteria.query.clone()),
            ("number", criteria.number.to_string()),
            ("sort", criteria.sort.clone()),
            ("addRecipeInformation", "true".to_string()),
        ];
        let optional = [
            ("cuisine", &criteria.cuisine),
            ("diet", &criteria.diet),
            ("intolerances", &criteria.intolerances),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                params.push((key, v.clone()));
            }
        }

        let response: SearchResponse = self.get_json("complexSearch", &params).await?;
        Ok(response.results)
    }

    async fn fetch_by_id(&self, id: RecipeId) -> Result<CatalogRecipe, CatalogError> {
        let path = format!("{id}/information");
        match self
            .get_json(&path, &[("includeNutrition", "false".to_string())])
            .await
        {
            Err(CatalogError::Status(404)) => Err(CatalogError::NotFound(id)),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_client_fails_without_network() {
        let client = CatalogClient::builder()
            .base_url("http://127.0.0.1:9")
            .api_key(Some("  ".to_string()))
            .build()
            .unwrap();
        assert!(!client.is_configured());
        assert!(matches!(
            client.fetch_by_id(1).await,
            Err(CatalogError::NotConfigured)
        ));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = CatalogClient::builder()
            .base_url("https://catalog.example.com/recipes/")
            .build()
            .unwrap();
        assert_eq!(client.base_url, "https://catalog.example.com/recipes");
        assert_eq!(client.host().as_deref(), Some("catalog.example.com"));
    }
}
