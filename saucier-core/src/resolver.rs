//! Working out which source owns a requested recipe id.
//!
//! Personal and catalog recipes share one integer space. A bare numeric id
//! is looked up locally first and then in the catalog; `personal-<n>` and
//! `catalog-<n>` skip the guess and go to one source.

use futures::future::try_join_all;
use std::str::FromStr;
use std::sync::Arc;

use crate::catalog::{CatalogError, CatalogRecipe, RecipeCatalog};
use crate::error::{CoreError, CoreResult};
use crate::ledger::InteractionLedger;
use crate::normalize::from_catalog;
use crate::personalize::Personalizer;
use crate::repository::PersonalRecipes;
use crate::types::{
    Personalized, RecipeId, RecipeRef, RecipeSource, RecipeView, SearchCriteria, UserId,
};

/// A parsed recipe identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeKey {
    /// Bare digits: personal first, then catalog.
    Ambiguous(RecipeId),
    Personal(RecipeId),
    Catalog(RecipeId),
    /// Anything else. Never matches a stored recipe and never reaches the
    /// catalog.
    Opaque,
}

impl FromStr for RecipeKey {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = if let Some(rest) = s.strip_prefix("personal-") {
            digits(rest).map_or(RecipeKey::Opaque, RecipeKey::Personal)
        } else if let Some(rest) = s.strip_prefix("catalog-") {
            digits(rest).map_or(RecipeKey::Opaque, RecipeKey::Catalog)
        } else {
            digits(s).map_or(RecipeKey::Opaque, RecipeKey::Ambiguous)
        };
        Ok(key)
    }
}

impl From<RecipeRef> for RecipeKey {
    fn from(recipe: RecipeRef) -> Self {
        match recipe.source {
            RecipeSource::Personal => RecipeKey::Personal(recipe.id),
            RecipeSource::Catalog => RecipeKey::Catalog(recipe.id),
        }
    }
}

/// `^\d+$`, and small enough to be an id.
fn digits(s: &str) -> Option<RecipeId> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

#[derive(Clone)]
pub struct Resolver {
    personal: PersonalRecipes,
    catalog: Arc<dyn RecipeCatalog>,
    personalizer: Personalizer,
    ledger: InteractionLedger,
}

impl Resolver {
    pub fn new(
        personal: PersonalRecipes,
        catalog: Arc<dyn RecipeCatalog>,
        ledger: InteractionLedger,
    ) -> Self {
        Self {
            personal,
            catalog,
            personalizer: Personalizer::new(ledger.clone()),
            ledger,
        }
    }

    pub fn personalizer(&self) -> &Personalizer {
        &self.personalizer
    }

    /// Full view of one recipe, decorated for `user_id`. The first time a
    /// user opens a recipe a view is recorded; the returned flags describe
    /// the state before this request.
    pub async fn resolve(&self, id: &str, user_id: Option<UserId>) -> CoreResult<Personalized> {
        let key: RecipeKey = id.parse().unwrap_or(RecipeKey::Opaque);
        let view = self
            .lookup(key)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("recipe {id}")))?;

        let decorated = self.personalizer.decorate(view, user_id).await?;
        if let Some(user_id) = user_id {
            let recipe = decorated.view.recipe_ref();
            if self.ledger.record_view(user_id, recipe).await? {
                tracing::debug!(user_id, %recipe, "first view recorded");
            }
        }
        Ok(decorated)
    }

    /// Which source owns `key`, without fetching anything from the catalog.
    ///
    /// A bare id belongs to the personal store if a personal recipe has it and
    /// to the catalog otherwise. `Ok(None)` for keys that can never match.
    pub async fn qualify(&self, key: RecipeKey) -> CoreResult<Option<RecipeRef>> {
        Ok(match key {
            RecipeKey::Opaque => None,
            RecipeKey::Personal(id) => Some(RecipeRef::personal(id)),
            RecipeKey::Catalog(id) => Some(RecipeRef::catalog(id)),
            RecipeKey::Ambiguous(id) => Some(match self.local(id).await? {
                Some(_) => RecipeRef::personal(id),
                None => RecipeRef::catalog(id),
            }),
        })
    }

    /// Like [`resolve`](Self::resolve) but returns an undecorated preview and
    /// records nothing. `Ok(None)` when the source no longer has the recipe.
    pub async fn preview(&self, recipe: RecipeRef) -> CoreResult<Option<RecipeView>> {
        Ok(self
            .lookup(recipe.into())
            .await?
            .map(RecipeView::into_preview))
    }

    /// Previews for a list of recipes, in order. Recipes that no longer
    /// resolve are left out.
    pub async fn previews(
        &self,
        recipes: &[RecipeRef],
        user_id: Option<UserId>,
    ) -> CoreResult<Vec<Personalized>> {
        let found = try_join_all(recipes.iter().map(|recipe| self.preview(*recipe))).await?;
        let views: Vec<RecipeView> = found.into_iter().flatten().collect();
        if views.len() < recipes.len() {
            tracing::debug!(
                missing = recipes.len() - views.len(),
                "dropped recipes that no longer resolve"
            );
        }
        self.personalizer.decorate_all(views, user_id).await
    }

    pub async fn random(
        &self,
        number: u32,
        user_id: Option<UserId>,
    ) -> CoreResult<Vec<Personalized>> {
        let raw = self.catalog.fetch_random(number).await?;
        self.catalog_previews(raw, user_id).await
    }

    /// Catalog search. For a signed-in caller a successful search becomes
    /// the last search; that write runs in the background and only logs on
    /// failure.
    pub async fn search(
        &self,
        criteria: &SearchCriteria,
        user_id: Option<UserId>,
    ) -> CoreResult<Vec<Personalized>> {
        let raw = self.catalog.search(criteria).await?;

        if let Some(user_id) = user_id {
            let ledger = self.ledger.clone();
            let criteria = criteria.clone();
            tokio::spawn(async move {
                if let Err(e) = ledger.upsert_last_search(user_id, &criteria).await {
                    tracing::warn!(user_id, error = %e, "failed to save last search");
                }
            });
        }

        self.catalog_previews(raw, user_id).await
    }

    async fn lookup(&self, key: RecipeKey) -> CoreResult<Option<RecipeView>> {
        match key {
            RecipeKey::Opaque => Ok(None),
            RecipeKey::Personal(id) => self.local(id).await,
            RecipeKey::Catalog(id) => self.remote(id).await,
            RecipeKey::Ambiguous(id) => match self.local(id).await? {
                Some(view) => Ok(Some(view)),
                None => self.remote(id).await,
            },
        }
    }

    async fn local(&self, id: RecipeId) -> CoreResult<Option<RecipeView>> {
        Ok(self.personal.get_by_id(id).await?.map(|r| r.view))
    }

    async fn remote(&self, id: RecipeId) -> CoreResult<Option<RecipeView>> {
        match self.catalog.fetch_by_id(id).await {
            Ok(raw) => Ok(Some(from_catalog(raw)?)),
            Err(CatalogError::NotFound(_)) => Ok(None),
            Err(e) => {
                tracing::warn!(recipe_id = id, error = %e, "catalog lookup failed");
                Err(e.into())
            }
        }
    }

    /// Normalize list results to previews. Entries the catalog sent without
    /// an id or title are skipped.
    async fn catalog_previews(
        &self,
        raw: Vec<CatalogRecipe>,
        user_id: Option<UserId>,
    ) -> CoreResult<Vec<Personalized>> {
        let views: Vec<RecipeView> = raw
            .into_iter()
            .filter_map(|r| match from_catalog(r) {
                Ok(view) => Some(view.into_preview()),
                Err(e) => {
                    tracing::debug!(error = %e, "skipping malformed catalog entry");
                    None
                }
            })
            .collect();
        self.personalizer.decorate_all(views, user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_parsing() {
        let parse = |s: &str| s.parse::<RecipeKey>().unwrap();
        assert_eq!(parse("42"), RecipeKey::Ambiguous(42));
        assert_eq!(parse(" 42 "), RecipeKey::Opaque);
        assert_eq!(parse("42\n"), RecipeKey::Opaque);
        assert_eq!(parse("+42"), RecipeKey::Opaque);
        assert_eq!(parse("personal-7"), RecipeKey::Personal(7));
        assert_eq!(parse("catalog-716429"), RecipeKey::Catalog(716429));
        assert_eq!(parse("catalog-"), RecipeKey::Opaque);
        assert_eq!(parse("-3"), RecipeKey::Opaque);
        assert_eq!(parse("abc"), RecipeKey::Opaque);
        assert_eq!(parse("12a"), RecipeKey::Opaque);
        assert_eq!(parse("99999999999999999999999"), RecipeKey::Opaque);
        assert_eq!(parse("personal- 7"), RecipeKey::Opaque);
    }

    #[test]
    fn test_qualified_refs_skip_the_guess() {
        assert_eq!(
            RecipeKey::from(RecipeRef::personal(3)),
            RecipeKey::Personal(3)
        );
        assert_eq!(RecipeKey::from(RecipeRef::catalog(3)), RecipeKey::Catalog(3));
    }
}
