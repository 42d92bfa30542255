//! The operations handed to the routing layer.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::catalog::RecipeCatalog;
use crate::error::{CoreError, CoreResult};
use crate::family::{FamilyRecipePayload, FamilyRecipes};
use crate::ledger::{InteractionLedger, RECENT_VIEWS_LIMIT};
use crate::repository::{PersonalRecipePayload, PersonalRecipes};
use crate::resolver::{RecipeKey, Resolver};
use crate::store::{FamilyStore, InteractionStore, RecipeStore};
use crate::types::{
    FamilyRecipe, Personalized, RecipeId, RecipeRef, RecipeView, SearchCriteria,
    StoredIngredient, UserId,
};

pub const DEFAULT_SEARCH_NUMBER: u32 = 5;
pub const DEFAULT_RANDOM_NUMBER: u32 = 3;
pub const MAX_NUMBER: u32 = 100;
pub const DEFAULT_SORT: &str = "popularity";

/// Search request as it arrives from a client.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct SearchRequest {
    pub query: Option<String>,
    pub cuisine: Option<String>,
    pub diet: Option<String>,
    pub intolerances: Option<String>,
    #[schema(value_type = Option<u32>)]
    pub number: Option<Value>,
    pub sort: Option<String>,
}

impl SearchRequest {
    pub fn validate(self) -> CoreResult<SearchCriteria> {
        let query = self
            .query
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .ok_or_else(|| CoreError::invalid("query", "is required"))?;
        let blank_to_none = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };

        Ok(SearchCriteria {
            query,
            cuisine: blank_to_none(self.cuisine),
            diet: blank_to_none(self.diet),
            intolerances: blank_to_none(self.intolerances),
            number: clamp_number(self.number.as_ref(), DEFAULT_SEARCH_NUMBER)?,
            sort: blank_to_none(self.sort).unwrap_or_else(|| DEFAULT_SORT.to_string()),
        })
    }
}

/// Result count: absent means `default`, otherwise a whole number clamped to
/// `1..=MAX_NUMBER`.
pub fn clamp_number(value: Option<&Value>, default: u32) -> CoreResult<u32> {
    let n = match value {
        None | Some(Value::Null) => return Ok(default),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match n {
        Some(n) if n.is_finite() && n.fract() == 0.0 => {
            Ok(n.clamp(1.0, MAX_NUMBER as f64) as u32)
        }
        _ => Err(CoreError::invalid("number", "must be a whole number")),
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub results: Vec<Personalized>,
    pub total_results: usize,
    /// The criteria saved as the caller's last search; absent for anonymous
    /// callers.
    pub last_search: Option<SearchCriteria>,
}

/// Explicit dependencies of a [`RecipeService`].
pub struct ServiceDeps {
    pub recipes: Arc<dyn RecipeStore>,
    pub interactions: Arc<dyn InteractionStore>,
    pub family: Arc<dyn FamilyStore>,
    pub catalog: Arc<dyn RecipeCatalog>,
}

/// Entry point for every recipe operation. Cheap to clone.
#[derive(Clone)]
pub struct RecipeService {
    personal: PersonalRecipes,
    ledger: InteractionLedger,
    resolver: Resolver,
    family: FamilyRecipes,
}

impl RecipeService {
    pub fn new(deps: ServiceDeps) -> Self {
        let personal = PersonalRecipes::new(deps.recipes);
        let ledger = InteractionLedger::new(deps.interactions);
        let resolver = Resolver::new(personal.clone(), deps.catalog, ledger.clone());
        Self {
            personal,
            ledger,
            resolver,
            family: FamilyRecipes::new(deps.family),
        }
    }

    pub fn ledger(&self) -> &InteractionLedger {
        &self.ledger
    }

    pub async fn get_random_recipes(
        &self,
        number: Option<&Value>,
        user_id: Option<UserId>,
    ) -> CoreResult<Vec<Personalized>> {
        let number = clamp_number(number, DEFAULT_RANDOM_NUMBER)?;
        self.resolver.random(number, user_id).await
    }

    pub async fn search_recipes(
        &self,
        request: SearchRequest,
        user_id: Option<UserId>,
    ) -> CoreResult<SearchResults> {
        let criteria = request.validate()?;
        let results = self.resolver.search(&criteria, user_id).await?;
        Ok(SearchResults {
            total_results: results.len(),
            results,
            last_search: user_id.map(|_| criteria),
        })
    }

    pub async fn get_recipe_by_id(
        &self,
        id: &str,
        user_id: Option<UserId>,
    ) -> CoreResult<Personalized> {
        self.resolver.resolve(id, user_id).await
    }

    pub async fn create_personal_recipe(
        &self,
        payload: PersonalRecipePayload,
        user_id: UserId,
    ) -> CoreResult<RecipeId> {
        self.personal.create(payload, user_id).await
    }

    pub async fn update_servings(
        &self,
        recipe_id: RecipeId,
        new_servings: u32,
        user_id: UserId,
    ) -> CoreResult<Vec<StoredIngredient>> {
        self.personal
            .update_servings(recipe_id, new_servings, user_id)
            .await
    }

    /// Favorite the recipe `key` names. A bare id goes to the personal
    /// recipe with that id if there is one, otherwise to the catalog recipe.
    pub async fn add_favorite(&self, user_id: UserId, key: RecipeKey) -> CoreResult<RecipeRef> {
        let recipe = self
            .resolver
            .qualify(key)
            .await?
            .filter(|recipe| recipe.id > 0)
            .ok_or_else(|| CoreError::invalid("recipeId", "must be a positive integer"))?;
        self.ledger.add_favorite(user_id, recipe).await?;
        Ok(recipe)
    }

    /// Favorited recipes as decorated previews, most recently added first.
    pub async fn list_favorites(&self, user_id: UserId) -> CoreResult<Vec<Personalized>> {
        let recipes = self.ledger.list_favorites(user_id).await?;
        self.resolver.previews(&recipes, Some(user_id)).await
    }

    pub async fn list_recent_views(&self, user_id: UserId) -> CoreResult<Vec<Personalized>> {
        let recipes = self.ledger.list_views(user_id, RECENT_VIEWS_LIMIT).await?;
        self.resolver.previews(&recipes, Some(user_id)).await
    }

    pub async fn get_last_search(&self, user_id: UserId) -> CoreResult<Option<SearchCriteria>> {
        self.ledger.get_last_search(user_id).await
    }

    pub async fn clear_last_search(&self, user_id: UserId) -> CoreResult<()> {
        self.ledger.clear_last_search(user_id).await
    }

    pub async fn add_family_recipe(
        &self,
        user_id: UserId,
        payload: FamilyRecipePayload,
    ) -> CoreResult<i64> {
        self.family.add(user_id, payload).await
    }

    pub async fn list_family_recipes(&self, user_id: UserId) -> CoreResult<Vec<FamilyRecipe>> {
        self.family.list(user_id).await
    }

    /// The caller's own recipes as decorated previews.
    pub async fn list_user_recipes(&self, user_id: UserId) -> CoreResult<Vec<Personalized>> {
        let views: Vec<RecipeView> = self.personal.list_for_user(user_id).await?;
        self.resolver
            .personalizer()
            .decorate_all(views, Some(user_id))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_search_defaults() {
        let criteria = SearchRequest {
            query: Some(" pasta ".to_string()),
            cuisine: Some("".to_string()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(criteria.query, "pasta");
        assert_eq!(criteria.cuisine, None);
        assert_eq!(criteria.number, DEFAULT_SEARCH_NUMBER);
        assert_eq!(criteria.sort, DEFAULT_SORT);
    }

    #[test]
    fn test_search_requires_query() {
        let err = SearchRequest::default().validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput { field: "query", .. }));
    }

    #[test]
    fn test_number_clamped() {
        assert_eq!(clamp_number(Some(&json!(500)), 5).unwrap(), MAX_NUMBER);
        assert_eq!(clamp_number(Some(&json!(0)), 5).unwrap(), 1);
        assert_eq!(clamp_number(Some(&json!("12")), 5).unwrap(), 12);
        assert_eq!(clamp_number(None, 3).unwrap(), 3);
        assert!(clamp_number(Some(&json!("lots")), 5).is_err());
        assert!(clamp_number(Some(&json!(2.5)), 5).is_err());
    }
}
