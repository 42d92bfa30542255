//! Per-user interaction records.

use std::sync::Arc;

use crate::error::{CoreError, CoreResult};
use crate::store::{InteractionStore, StoreError};
use crate::types::{RecipeRef, SearchCriteria, UserFlags, UserId};

/// How many recent views are listed.
pub const RECENT_VIEWS_LIMIT: usize = 3;

#[derive(Clone)]
pub struct InteractionLedger {
    store: Arc<dyn InteractionStore>,
}

impl InteractionLedger {
    pub fn new(store: Arc<dyn InteractionStore>) -> Self {
        Self { store }
    }

    /// Record that `user_id` opened `recipe`. Idempotent.
    ///
    /// Returns true if this call created the row. A concurrent caller that
    /// loses the race hits the unique constraint, which counts as already
    /// recorded.
    pub async fn record_view(&self, user_id: UserId, recipe: RecipeRef) -> CoreResult<bool> {
        if self.store.view_exists(user_id, recipe).await? {
            return Ok(false);
        }
        match self.store.insert_view(user_id, recipe).await {
            Ok(()) => Ok(true),
            Err(StoreError::UniqueViolation(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Favorite a recipe; a second call for the same pair is a `Conflict`.
    pub async fn add_favorite(&self, user_id: UserId, recipe: RecipeRef) -> CoreResult<()> {
        match self.store.insert_favorite(user_id, recipe).await {
            Ok(()) => {
                tracing::info!(user_id, %recipe, "favorite added");
                Ok(())
            }
            Err(StoreError::UniqueViolation(_)) => {
                Err(CoreError::Conflict(format!("favorite for recipe {recipe}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn list_favorites(&self, user_id: UserId) -> CoreResult<Vec<RecipeRef>> {
        Ok(self.store.favorites(user_id).await?)
    }

    /// Most recently viewed first, at most `limit` (capped at
    /// [`RECENT_VIEWS_LIMIT`]).
    pub async fn list_views(&self, user_id: UserId, limit: usize) -> CoreResult<Vec<RecipeRef>> {
        let limit = limit.min(RECENT_VIEWS_LIMIT);
        Ok(self.store.recent_views(user_id, limit).await?)
    }

    pub async fn upsert_last_search(
        &self,
        user_id: UserId,
        criteria: &SearchCriteria,
    ) -> CoreResult<()> {
        Ok(self.store.upsert_last_search(user_id, criteria).await?)
    }

    pub async fn get_last_search(&self, user_id: UserId) -> CoreResult<Option<SearchCriteria>> {
        Ok(self.store.last_search(user_id).await?)
    }

    /// Forget the last search, e.g. on logout.
    pub async fn clear_last_search(&self, user_id: UserId) -> CoreResult<()> {
        Ok(self.store.clear_last_search(user_id).await?)
    }

    /// Both flags for one pair; the two lookups run concurrently.
    pub async fn flags(&self, user_id: UserId, recipe: RecipeRef) -> CoreResult<UserFlags> {
        let (viewed, favorite) = tokio::try_join!(
            self.store.view_exists(user_id, recipe),
            self.store.favorite_exists(user_id, recipe),
        )?;
        Ok(UserFlags { viewed, favorite })
    }
}
