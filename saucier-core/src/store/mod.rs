//! Relational store seams.
//!
//! The server implements these traits over Postgres; [`MemoryStore`] backs
//! the tests. Every method is one store round trip and is atomic on its own.
//! Implementations must bind all values as query parameters.

mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
use futures::future::join_all;
use thiserror::Error;

use crate::types::{
    FamilyRecipeRow, NewFamilyRecipe, NewPersonalRecipe, PersonalRecipeRow, RecipeId,
    RecipeRef, SearchCriteria, ServingsSnapshot, StoredIngredient, UserId,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("unique constraint `{0}` violated")]
    UniqueViolation(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    /// A multi-step write stopped part way; `applied` writes took effect.
    #[error("{failed} writes failed after {applied} succeeded: {cause}")]
    PartialWrite {
        applied: usize,
        failed: usize,
        cause: String,
    },
}

/// Personal recipes and their ingredient rows.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn insert_recipe(
        &self,
        user_id: UserId,
        recipe: &NewPersonalRecipe,
    ) -> Result<RecipeId, StoreError>;

    async fn find_recipe(&self, id: RecipeId) -> Result<Option<PersonalRecipeRow>, StoreError>;

    async fn list_recipes_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PersonalRecipeRow>, StoreError>;

    /// Servings and ingredient rows of a recipe owned by `user_id`.
    async fn servings_snapshot(
        &self,
        recipe_id: RecipeId,
        user_id: UserId,
    ) -> Result<Option<ServingsSnapshot>, StoreError>;

    /// Returns false when no recipe matched `(recipe_id, user_id)`.
    async fn set_servings(
        &self,
        recipe_id: RecipeId,
        user_id: UserId,
        servings: i32,
    ) -> Result<bool, StoreError>;

    async fn set_ingredient_amount(
        &self,
        recipe_id: RecipeId,
        ingredient_id: i64,
        amount: f64,
    ) -> Result<(), StoreError>;

    /// Persist a scaling result: new servings plus every ingredient amount.
    ///
    /// The default issues the servings update, then all ingredient updates
    /// concurrently, and reports [`StoreError::PartialWrite`] if any of the
    /// latter fail. Each ingredient update is an idempotent overwrite, so the
    /// whole call is safe to retry. Stores with transactions should override
    /// this and apply everything atomically.
    async fn apply_scaling(
        &self,
        recipe_id: RecipeId,
        user_id: UserId,
        servings: i32,
        scaled: &[StoredIngredient],
    ) -> Result<bool, StoreError> {
        if !self.set_servings(recipe_id, user_id, servings).await? {
            return Ok(false);
        }

        let updates = scaled.iter().filter_map(|row| {
            row.ingredient
                .amount
                .map(|amount| self.set_ingredient_amount(recipe_id, row.id, amount))
        });
        let results = join_all(updates).await;
        let total = results.len();
        let errors: Vec<StoreError> = results.into_iter().filter_map(Result::err).collect();

        match errors.first() {
            None => Ok(true),
            Some(first) => Err(StoreError::PartialWrite {
                // The servings update counts as applied.
                applied: 1 + total - errors.len(),
                failed: errors.len(),
                cause: first.to_string(),
            }),
        }
    }
}

/// Per-user interaction records: views, favorites, last search.
///
/// Views and favorites are keyed on `(user, source, recipe id)`.
#[async_trait]
pub trait InteractionStore: Send + Sync {
    async fn view_exists(&self, user_id: UserId, recipe: RecipeRef) -> Result<bool, StoreError>;

    /// Fails with [`StoreError::UniqueViolation`] if the row already exists.
    async fn insert_view(&self, user_id: UserId, recipe: RecipeRef) -> Result<(), StoreError>;

    /// Most recent first.
    async fn recent_views(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<RecipeRef>, StoreError>;

    async fn favorite_exists(&self, user_id: UserId, recipe: RecipeRef)
        -> Result<bool, StoreError>;

    /// Fails with [`StoreError::UniqueViolation`] if the row already exists.
    async fn insert_favorite(&self, user_id: UserId, recipe: RecipeRef)
        -> Result<(), StoreError>;

    /// Most recently added first.
    async fn favorites(&self, user_id: UserId) -> Result<Vec<RecipeRef>, StoreError>;

    async fn upsert_last_search(
        &self,
        user_id: UserId,
        criteria: &SearchCriteria,
    ) -> Result<(), StoreError>;

    async fn last_search(&self, user_id: UserId) -> Result<Option<SearchCriteria>, StoreError>;

    async fn clear_last_search(&self, user_id: UserId) -> Result<(), StoreError>;
}

/// Family recipes: insert and list only.
#[async_trait]
pub trait FamilyStore: Send + Sync {
    async fn insert_family_recipe(
        &self,
        user_id: UserId,
        recipe: &NewFamilyRecipe,
    ) -> Result<i64, StoreError>;

    async fn family_recipes(&self, user_id: UserId) -> Result<Vec<FamilyRecipeRow>, StoreError>;
}
