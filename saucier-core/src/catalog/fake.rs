//! In-process catalog for tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use super::{CatalogError, CatalogRecipe, RecipeCatalog};
use crate::types::{RecipeId, SearchCriteria};

/// A catalog serving a fixed set of recipes.
///
/// Counts every call so tests can assert the catalog was never reached.
#[derive(Default)]
pub struct FakeCatalog {
    recipes: RwLock<BTreeMap<RecipeId, CatalogRecipe>>,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a minimal recipe with the given id and title.
    pub fn with_recipe(self, id: RecipeId, title: &str) -> Self {
        self.with_raw(CatalogRecipe {
            id: Some(id),
            title: Some(title.to_string()),
            servings: Some(2),
            ..Default::default()
        })
    }

    pub fn with_raw(self, recipe: CatalogRecipe) -> Self {
        if let Some(id) = recipe.id {
            self.recipes
                .write()
                .unwrap_or_else(|e| e.into_inner())
                .insert(id, recipe);
        }
        self
    }

    /// Make every subsequent call fail with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<(), CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(CatalogError::Transport("fake catalog offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecipeCatalog for FakeCatalog {
    async fn fetch_random(&self, number: u32) -> Result<Vec<CatalogRecipe>, CatalogError> {
        self.enter()?;
        let recipes = self.recipes.read().unwrap_or_else(|e| e.into_inner());
        Ok(recipes.values().take(number as usize).cloned().collect())
    }

    async fn search(&self, criteria: &SearchCriteria) -> Result<Vec<CatalogRecipe>, CatalogError> {
        self.enter()?;
        let needle = criteria.query.to_lowercase();
        let recipes = self.recipes.read().unwrap_or_else(|e| e.into_inner());
        Ok(recipes
            .values()
            .filter(|r| {
                r.title
                    .as_deref()
                    .is_some_and(|t| t.to_lowercase().contains(&needle))
            })
            .take(criteria.number as usize)
            .cloned()
            .collect())
    }

    async fn fetch_by_id(&self, id: RecipeId) -> Result<CatalogRecipe, CatalogError> {
        self.enter()?;
        self.recipes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned()
            .ok_or(CatalogError::NotFound(id))
    }
}
