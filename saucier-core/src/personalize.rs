//! Attaching per-user flags to recipe views.

use futures::future::try_join_all;

use crate::error::CoreResult;
use crate::ledger::InteractionLedger;
use crate::types::{Personalized, RecipeView, UserId};

#[derive(Clone)]
pub struct Personalizer {
    ledger: InteractionLedger,
}

impl Personalizer {
    pub fn new(ledger: InteractionLedger) -> Self {
        Self { ledger }
    }

    /// Compose `view` with the caller's viewed/favorite flags.
    ///
    /// Anonymous callers get both flags false and no store call is made. A
    /// failed lookup is an error; flags are only false when no row exists.
    pub async fn decorate(
        &self,
        view: RecipeView,
        user_id: Option<UserId>,
    ) -> CoreResult<Personalized> {
        let Some(user_id) = user_id else {
            return Ok(Personalized::anonymous(view));
        };

        let recipe = view.recipe_ref();
        let flags = self
            .ledger
            .flags(user_id, recipe)
            .await
            .inspect_err(|e| {
                tracing::warn!(user_id, %recipe, error = %e, "flag lookup failed");
            })?;
        Ok(Personalized { view, flags })
    }

    /// Decorate a batch. Lookups run concurrently; output order matches input.
    pub async fn decorate_all(
        &self,
        views: Vec<RecipeView>,
        user_id: Option<UserId>,
    ) -> CoreResult<Vec<Personalized>> {
        if user_id.is_none() {
            return Ok(views.into_iter().map(Personalized::anonymous).collect());
        }
        try_join_all(views.into_iter().map(|view| self.decorate(view, user_id))).await
    }
}
