//! In-memory store with the same uniqueness rules as the Postgres schema.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::{Mutex, RwLock};

use super::{FamilyStore, InteractionStore, RecipeStore, StoreError};
use crate::types::{
    FamilyRecipeRow, NewFamilyRecipe, NewPersonalRecipe, PersonalRecipeRow, RecipeId,
    RecipeRef, SearchCriteria, ServingsSnapshot, StoredIngredient, UserId,
};

/// Store used by tests and local experiments.
///
/// Ingredient writes go through the trait's default (non-transactional)
/// `apply_scaling`, and individual ingredient ids can be made to fail, which
/// is how partial writes are exercised.
#[derive(Default)]
pub struct MemoryStore {
    recipes: RwLock<BTreeMap<RecipeId, PersonalRecipeRow>>,
    recipe_seq: AtomicI64,
    ingredient_seq: AtomicI64,
    /// (user, recipe) -> insertion sequence
    views: DashMap<(UserId, RecipeRef), u64>,
    favorites: DashMap<(UserId, RecipeRef), u64>,
    event_seq: AtomicU64,
    last_search: DashMap<UserId, SearchCriteria>,
    family: RwLock<Vec<FamilyRecipeRow>>,
    family_seq: AtomicI64,
    unavailable: AtomicBool,
    failing_ingredients: Mutex<HashSet<i64>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail as if the database were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Make amount updates for one ingredient row fail.
    pub fn fail_ingredient_updates(&self, ingredient_id: i64) {
        self.failing_ingredients
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(ingredient_id);
    }

    /// Insert a raw row as an older write path would have left it.
    pub fn insert_raw_recipe(&self, row: PersonalRecipeRow) {
        self.recipe_seq.fetch_max(row.id, Ordering::SeqCst);
        self.write_recipes().insert(row.id, row);
    }

    pub fn view_count(&self, user_id: UserId) -> usize {
        self.views.iter().filter(|e| e.key().0 == user_id).count()
    }

    pub fn favorite_count(&self, user_id: UserId) -> usize {
        self.favorites.iter().filter(|e| e.key().0 == user_id).count()
    }

    pub fn last_search_count(&self) -> usize {
        self.last_search.len()
    }

    pub fn last_search_row(&self, user_id: UserId) -> Option<SearchCriteria> {
        self.last_search.get(&user_id).map(|c| c.value().clone())
    }

    pub fn recipe_row(&self, id: RecipeId) -> Option<PersonalRecipeRow> {
        self.read_recipes().get(&id).cloned()
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store switched off".to_string()));
        }
        Ok(())
    }

    fn next_event(&self) -> u64 {
        self.event_seq.fetch_add(1, Ordering::SeqCst)
    }

    fn read_recipes(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<RecipeId, PersonalRecipeRow>> {
        self.recipes.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_recipes(
        &self,
    ) -> std::sync::RwLockWriteGuard<'_, BTreeMap<RecipeId, PersonalRecipeRow>> {
        self.recipes.write().unwrap_or_else(|e| e.into_inner())
    }

    fn insert_unique(
        map: &DashMap<(UserId, RecipeRef), u64>,
        key: (UserId, RecipeRef),
        seq: u64,
        constraint: &str,
    ) -> Result<(), StoreError> {
        match map.entry(key) {
            Entry::Occupied(_) => Err(StoreError::UniqueViolation(constraint.to_string())),
            Entry::Vacant(slot) => {
                slot.insert(seq);
                Ok(())
            }
        }
    }

    fn newest_first(map: &DashMap<(UserId, RecipeRef), u64>, user_id: UserId) -> Vec<RecipeRef> {
        let mut rows: Vec<(u64, RecipeRef)> = map
            .iter()
            .filter(|e| e.key().0 == user_id)
            .map(|e| (*e.value(), e.key().1))
            .collect();
        rows.sort_by(|a, b| b.0.cmp(&a.0));
        rows.into_iter().map(|(_, recipe)| recipe).collect()
    }
}

#[async_trait]
impl RecipeStore for MemoryStore {
    async fn insert_recipe(
        &self,
        user_id: UserId,
        recipe: &NewPersonalRecipe,
    ) -> Result<RecipeId, StoreError> {
        self.check()?;
        let id = self.recipe_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let ingredients = recipe
            .ingredients
            .iter()
            .map(|ing| StoredIngredient {
                id: self.ingredient_seq.fetch_add(1, Ordering::SeqCst) + 1,
                ingredient: ing.clone(),
            })
            .collect();
        let row = PersonalRecipeRow {
            id,
            user_id,
            title: recipe.title.clone(),
            image: recipe.image.clone(),
            ready_in_minutes: recipe.ready_in_minutes.and_then(|m| i32::try_from(m).ok()),
            popularity: 0,
            vegan: recipe.vegan,
            vegetarian: recipe.vegetarian,
            gluten_free: recipe.gluten_free,
            servings: i32::try_from(recipe.servings).unwrap_or(i32::MAX),
            instructions: Some(recipe.instructions.clone()),
            legacy_ingredients: None,
            ingredients,
            created_at: Utc::now(),
        };
        self.write_recipes().insert(id, row);
        Ok(id)
    }

    async fn find_recipe(&self, id: RecipeId) -> Result<Option<PersonalRecipeRow>, StoreError> {
        self.check()?;
        Ok(self.read_recipes().get(&id).cloned())
    }

    async fn list_recipes_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PersonalRecipeRow>, StoreError> {
        self.check()?;
        Ok(self
            .read_recipes()
            .values()
            .rev()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn servings_snapshot(
        &self,
        recipe_id: RecipeId,
        user_id: UserId,
    ) -> Result<Option<ServingsSnapshot>, StoreError> {
        self.check()?;
        Ok(self
            .read_recipes()
            .get(&recipe_id)
            .filter(|r| r.user_id == user_id)
            .map(|r| ServingsSnapshot {
                servings: r.servings,
                ingredients: r.ingredients.clone(),
            }))
    }

    async fn set_servings(
        &self,
        recipe_id: RecipeId,
        user_id: UserId,
        servings: i32,
    ) -> Result<bool, StoreError> {
        self.check()?;
        let mut recipes = self.write_recipes();
        match recipes.get_mut(&recipe_id).filter(|r| r.user_id == user_id) {
            Some(row) => {
                row.servings = servings;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_ingredient_amount(
        &self,
        recipe_id: RecipeId,
        ingredient_id: i64,
        amount: f64,
    ) -> Result<(), StoreError> {
        self.check()?;
        if self
            .failing_ingredients
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&ingredient_id)
        {
            return Err(StoreError::Query(format!(
                "update of ingredient {ingredient_id} rejected"
            )));
        }
        let mut recipes = self.write_recipes();
        if let Some(row) = recipes
            .get_mut(&recipe_id)
            .and_then(|r| r.ingredients.iter_mut().find(|i| i.id == ingredient_id))
        {
            row.ingredient.amount = Some(amount);
        }
        Ok(())
    }
}

#[async_trait]
impl InteractionStore for MemoryStore {
    async fn view_exists(&self, user_id: UserId, recipe: RecipeRef) -> Result<bool, StoreError> {
        self.check()?;
        Ok(self.views.contains_key(&(user_id, recipe)))
    }

    async fn insert_view(&self, user_id: UserId, recipe: RecipeRef) -> Result<(), StoreError> {
        self.check()?;
        let seq = self.next_event();
        Self::insert_unique(&self.views, (user_id, recipe), seq, "views_user_recipe_key")
    }

    async fn recent_views(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<RecipeRef>, StoreError> {
        self.check()?;
        let mut recipes = Self::newest_first(&self.views, user_id);
        recipes.truncate(limit);
        Ok(recipes)
    }

    async fn favorite_exists(
        &self,
        user_id: UserId,
        recipe: RecipeRef,
    ) -> Result<bool, StoreError> {
        self.check()?;
        Ok(self.favorites.contains_key(&(user_id, recipe)))
    }

    async fn insert_favorite(&self, user_id: UserId, recipe: RecipeRef) -> Result<(), StoreError> {
        self.check()?;
        let seq = self.next_event();
        Self::insert_unique(
            &self.favorites,
            (user_id, recipe),
            seq,
            "favorites_user_recipe_key",
        )
    }

    async fn favorites(&self, user_id: UserId) -> Result<Vec<RecipeRef>, StoreError> {
        self.check()?;
        Ok(Self::newest_first(&self.favorites, user_id))
    }

    async fn upsert_last_search(
        &self,
        user_id: UserId,
        criteria: &SearchCriteria,
    ) -> Result<(), StoreError> {
        self.check()?;
        self.last_search.insert(user_id, criteria.clone());
        Ok(())
    }

    async fn last_search(&self, user_id: UserId) -> Result<Option<SearchCriteria>, StoreError> {
        self.check()?;
        Ok(self.last_search.get(&user_id).map(|c| c.value().clone()))
    }

    async fn clear_last_search(&self, user_id: UserId) -> Result<(), StoreError> {
        self.check()?;
        self.last_search.remove(&user_id);
        Ok(())
    }
}

#[async_trait]
impl FamilyStore for MemoryStore {
    async fn insert_family_recipe(
        &self,
        user_id: UserId,
        recipe: &NewFamilyRecipe,
    ) -> Result<i64, StoreError> {
        self.check()?;
        let id = self.family_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.family
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .push(FamilyRecipeRow {
                id,
                user_id,
                title: recipe.title.clone(),
                owner: recipe.owner.clone(),
                occasion: Some(recipe.occasion.clone()),
                image: recipe.image.clone(),
                ingredients: recipe.ingredients.clone(),
                instructions: recipe.instructions.clone(),
                created_at: Utc::now(),
            });
        Ok(id)
    }

    async fn family_recipes(&self, user_id: UserId) -> Result<Vec<FamilyRecipeRow>, StoreError> {
        self.check()?;
        Ok(self
            .family
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }
}
