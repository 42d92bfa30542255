//! Postgres implementation of the core store traits.
//!
//! Diesel is synchronous, so every call checks out a pooled connection on the
//! blocking pool. Each call opens one `db.query` span, which the query
//! counting layer picks up. All values go through diesel's bind parameters.

use async_trait::async_trait;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use saucier_core::{
    FamilyRecipeRow, FamilyStore, InteractionStore, NewFamilyRecipe, NewPersonalRecipe,
    PersonalRecipeRow, RecipeId, RecipeRef, RecipeSource, RecipeStore, SearchCriteria,
    ServingsSnapshot, StoredIngredient, StoreError, UserId,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::Instrument;

use crate::db::DbPool;
use crate::models::{
    FamilyRecipe, LastSearch, NewFamilyRecipe as NewFamilyRecipeRow, NewRecipe,
    NewRecipeIngredient, Recipe, RecipeIngredient,
};
use crate::schema::{family_recipes, favorites, last_search, recipe_ingredients, recipes, views};

#[derive(Clone)]
pub struct PgStore {
    pool: Arc<DbPool>,
}

impl PgStore {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    async fn run<T, F>(&self, operation: &'static str, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> Result<T, DieselError> + Send + 'static,
    {
        let pool = self.pool.clone();
        let span = tracing::info_span!("db.query", db.operation = operation);
        let task_span = span.clone();
        tokio::task::spawn_blocking(move || {
            let _guard = task_span.enter();
            let mut conn = pool
                .get()
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            f(&mut conn).map_err(store_error)
        })
        .instrument(span)
        .await
        .map_err(|e| StoreError::Unavailable(format!("database task failed: {e}")))?
    }
}

fn store_error(err: DieselError) -> StoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            StoreError::UniqueViolation(info.constraint_name().unwrap_or("unique").to_string())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            StoreError::Unavailable(info.message().to_string())
        }
        other => StoreError::Query(other.to_string()),
    }
}

fn load_ingredients(
    conn: &mut PgConnection,
    recipe_ids: &[RecipeId],
) -> Result<HashMap<RecipeId, Vec<StoredIngredient>>, DieselError> {
    let rows: Vec<RecipeIngredient> = recipe_ingredients::table
        .filter(recipe_ingredients::recipe_id.eq_any(recipe_ids))
        .order((recipe_ingredients::recipe_id, recipe_ingredients::position))
        .select(RecipeIngredient::as_select())
        .load(conn)?;

    let mut grouped: HashMap<RecipeId, Vec<StoredIngredient>> = HashMap::new();
    for row in rows {
        grouped.entry(row.recipe_id).or_default().push(row.into());
    }
    Ok(grouped)
}

/// `(recipe_source, recipe_id)` rows back to refs. Rows with a source this
/// build does not know are skipped.
fn recipe_refs(rows: Vec<(String, RecipeId)>) -> Vec<RecipeRef> {
    rows.into_iter()
        .filter_map(|(source, id)| match RecipeSource::parse(&source) {
            Some(source) => Some(RecipeRef { source, id }),
            None => {
                tracing::warn!(
                    source = %source,
                    recipe_id = id,
                    "skipping row with unknown recipe source"
                );
                None
            }
        })
        .collect()
}

fn count_i32(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

#[async_trait]
impl RecipeStore for PgStore {
    async fn insert_recipe(
        &self,
        user_id: UserId,
        recipe: &NewPersonalRecipe,
    ) -> Result<RecipeId, StoreError> {
        let recipe = recipe.clone();
        self.run("insert_recipe", move |conn| {
            conn.transaction::<_, DieselError, _>(|conn| {
                let id: i64 = diesel::insert_into(recipes::table)
                    .values(&NewRecipe {
                        user_id,
                        title: &recipe.title,
                        image: recipe.image.as_deref(),
                        ready_in_minutes: recipe.ready_in_minutes.map(count_i32),
                        vegan: recipe.vegan,
                        vegetarian: recipe.vegetarian,
                        gluten_free: recipe.gluten_free,
                        servings: count_i32(recipe.servings),
                        instructions: &recipe.instructions,
                    })
                    .returning(recipes::id)
                    .get_result(conn)?;

                let ingredients: Vec<NewRecipeIngredient> = recipe
                    .ingredients
                    .iter()
                    .enumerate()
                    .map(|(position, ing)| NewRecipeIngredient {
                        recipe_id: id,
                        position: i32::try_from(position).unwrap_or(i32::MAX),
                        name: &ing.name,
                        amount: ing.amount,
                        unit: ing.unit.as_deref(),
                    })
                    .collect();
                if !ingredients.is_empty() {
                    diesel::insert_into(recipe_ingredients::table)
                        .values(&ingredients)
                        .execute(conn)?;
                }
                Ok(id)
            })
        })
        .await
    }

    async fn find_recipe(&self, id: RecipeId) -> Result<Option<PersonalRecipeRow>, StoreError> {
        self.run("find_recipe", move |conn| {
            let Some(recipe) = recipes::table
                .find(id)
                .select(Recipe::as_select())
                .first(conn)
                .optional()?
            else {
                return Ok(None);
            };
            let mut ingredients = load_ingredients(conn, &[id])?;
            Ok(Some(
                recipe.into_row(ingredients.remove(&id).unwrap_or_default()),
            ))
        })
        .await
    }

    async fn list_recipes_by_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<PersonalRecipeRow>, StoreError> {
        self.run("list_recipes_by_user", move |conn| {
            let rows: Vec<Recipe> = recipes::table
                .filter(recipes::user_id.eq(user_id))
                .order(recipes::id.desc())
                .select(Recipe::as_select())
                .load(conn)?;
            let ids: Vec<RecipeId> = rows.iter().map(|r| r.id).collect();
            let mut ingredients = load_ingredients(conn, &ids)?;
            Ok(rows
                .into_iter()
                .map(|r| {
                    let ings = ingredients.remove(&r.id).unwrap_or_default();
                    r.into_row(ings)
                })
                .collect())
        })
        .await
    }

    async fn servings_snapshot(
        &self,
        recipe_id: RecipeId,
        user_id: UserId,
    ) -> Result<Option<ServingsSnapshot>, StoreError> {
        self.run("servings_snapshot", move |conn| {
            let Some(servings) = recipes::table
                .filter(recipes::id.eq(recipe_id))
                .filter(recipes::user_id.eq(user_id))
                .select(recipes::servings)
                .first::<i32>(conn)
                .optional()?
            else {
                return Ok(None);
            };
            let mut ingredients = load_ingredients(conn, &[recipe_id])?;
            Ok(Some(ServingsSnapshot {
                servings,
                ingredients: ingredients.remove(&recipe_id).unwrap_or_default(),
            }))
        })
        .await
    }

    async fn set_servings(
        &self,
        recipe_id: RecipeId,
        user_id: UserId,
        servings: i32,
    ) -> Result<bool, StoreError> {
        self.run("set_servings", move |conn| {
            let updated = diesel::update(
                recipes::table
                    .filter(recipes::id.eq(recipe_id))
                    .filter(recipes::user_id.eq(user_id)),
            )
            .set(recipes::servings.eq(servings))
            .execute(conn)?;
            Ok(updated > 0)
        })
        .await
    }

    async fn set_ingredient_amount(
        &self,
        recipe_id: RecipeId,
        ingredient_id: i64,
        amount: f64,
    ) -> Result<(), StoreError> {
        self.run("set_ingredient_amount", move |conn| {
            diesel::update(
                recipe_ingredients::table
                    .filter(recipe_ingredients::id.eq(ingredient_id))
                    .filter(recipe_ingredients::recipe_id.eq(recipe_id)),
            )
            .set(recipe_ingredients::amount.eq(amount))
            .execute(conn)?;
            Ok(())
        })
        .await
    }

    /// Servings and every ingredient amount in one transaction.
    async fn apply_scaling(
        &self,
        recipe_id: RecipeId,
        user_id: UserId,
        servings: i32,
        scaled: &[StoredIngredient],
    ) -> Result<bool, StoreError> {
        let scaled = scaled.to_vec();
        self.run("apply_scaling", move |conn| {
            conn.transaction::<_, DieselError, _>(|conn| {
                let updated = diesel::update(
                    recipes::table
                        .filter(recipes::id.eq(recipe_id))
                        .filter(recipes::user_id.eq(user_id)),
                )
                .set(recipes::servings.eq(servings))
                .execute(conn)?;
                if updated == 0 {
                    return Ok(false);
                }

                for row in &scaled {
                    diesel::update(
                        recipe_ingredients::table
                            .filter(recipe_ingredients::id.eq(row.id))
                            .filter(recipe_ingredients::recipe_id.eq(recipe_id)),
                    )
                    .set(recipe_ingredients::amount.eq(row.ingredient.amount))
                    .execute(conn)?;
                }
                Ok(true)
            })
        })
        .await
    }
}

#[async_trait]
impl InteractionStore for PgStore {
    async fn view_exists(&self, user_id: UserId, recipe: RecipeRef) -> Result<bool, StoreError> {
        self.run("view_exists", move |conn| {
            diesel::select(exists(
                views::table
                    .filter(views::user_id.eq(user_id))
                    .filter(views::recipe_source.eq(recipe.source.as_str()))
                    .filter(views::recipe_id.eq(recipe.id)),
            ))
            .get_result(conn)
        })
        .await
    }

    async fn insert_view(&self, user_id: UserId, recipe: RecipeRef) -> Result<(), StoreError> {
        self.run("insert_view", move |conn| {
            diesel::insert_into(views::table)
                .values((
                    views::user_id.eq(user_id),
                    views::recipe_source.eq(recipe.source.as_str()),
                    views::recipe_id.eq(recipe.id),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn recent_views(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<RecipeRef>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = self
            .run("recent_views", move |conn| {
                views::table
                    .filter(views::user_id.eq(user_id))
                    .order((views::created_at.desc(), views::id.desc()))
                    .limit(limit)
                    .select((views::recipe_source, views::recipe_id))
                    .load(conn)
            })
            .await?;
        Ok(recipe_refs(rows))
    }

    async fn favorite_exists(
        &self,
        user_id: UserId,
        recipe: RecipeRef,
    ) -> Result<bool, StoreError> {
        self.run("favorite_exists", move |conn| {
            diesel::select(exists(
                favorites::table
                    .filter(favorites::user_id.eq(user_id))
                    .filter(favorites::recipe_source.eq(recipe.source.as_str()))
                    .filter(favorites::recipe_id.eq(recipe.id)),
            ))
            .get_result(conn)
        })
        .await
    }

    async fn insert_favorite(&self, user_id: UserId, recipe: RecipeRef) -> Result<(), StoreError> {
        self.run("insert_favorite", move |conn| {
            diesel::insert_into(favorites::table)
                .values((
                    favorites::user_id.eq(user_id),
                    favorites::recipe_source.eq(recipe.source.as_str()),
                    favorites::recipe_id.eq(recipe.id),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn favorites(&self, user_id: UserId) -> Result<Vec<RecipeRef>, StoreError> {
        let rows = self
            .run("favorites", move |conn| {
                favorites::table
                    .filter(favorites::user_id.eq(user_id))
                    .order((favorites::created_at.desc(), favorites::id.desc()))
                    .select((favorites::recipe_source, favorites::recipe_id))
                    .load(conn)
            })
            .await?;
        Ok(recipe_refs(rows))
    }

    async fn upsert_last_search(
        &self,
        user_id: UserId,
        criteria: &SearchCriteria,
    ) -> Result<(), StoreError> {
        let row = LastSearch::new(user_id, criteria);
        self.run("upsert_last_search", move |conn| {
            diesel::insert_into(last_search::table)
                .values(&row)
                .on_conflict(last_search::user_id)
                .do_update()
                .set(&row)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn last_search(&self, user_id: UserId) -> Result<Option<SearchCriteria>, StoreError> {
        self.run("last_search", move |conn| {
            Ok(last_search::table
                .find(user_id)
                .select(LastSearch::as_select())
                .first(conn)
                .optional()?
                .map(SearchCriteria::from))
        })
        .await
    }

    async fn clear_last_search(&self, user_id: UserId) -> Result<(), StoreError> {
        self.run("clear_last_search", move |conn| {
            diesel::delete(last_search::table.find(user_id)).execute(conn)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl FamilyStore for PgStore {
    async fn insert_family_recipe(
        &self,
        user_id: UserId,
        recipe: &NewFamilyRecipe,
    ) -> Result<i64, StoreError> {
        let recipe = recipe.clone();
        self.run("insert_family_recipe", move |conn| {
            diesel::insert_into(family_recipes::table)
                .values(&NewFamilyRecipeRow {
                    user_id,
                    title: &recipe.title,
                    owner: &recipe.owner,
                    occasion: &recipe.occasion,
                    image: recipe.image.as_deref(),
                    ingredients: &recipe.ingredients,
                    instructions: &recipe.instructions,
                })
                .returning(family_recipes::id)
                .get_result(conn)
        })
        .await
    }

    async fn family_recipes(&self, user_id: UserId) -> Result<Vec<FamilyRecipeRow>, StoreError> {
        self.run("family_recipes", move |conn| {
            let rows: Vec<FamilyRecipe> = family_recipes::table
                .filter(family_recipes::user_id.eq(user_id))
                .order(family_recipes::id.asc())
                .select(FamilyRecipe::as_select())
                .load(conn)?;
            Ok(rows.into_iter().map(FamilyRecipeRow::from).collect())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_keeps_constraint_name() {
        struct Info;
        impl diesel::result::DatabaseErrorInformation for Info {
            fn message(&self) -> &str {
                "duplicate key value violates unique constraint"
            }
            fn details(&self) -> Option<&str> {
                None
            }
            fn hint(&self) -> Option<&str> {
                None
            }
            fn table_name(&self) -> Option<&str> {
                Some("favorites")
            }
            fn column_name(&self) -> Option<&str> {
                None
            }
            fn constraint_name(&self) -> Option<&str> {
                Some("favorites_user_recipe_key")
            }
            fn statement_position(&self) -> Option<i32> {
                None
            }
        }

        let err = store_error(DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new(Info),
        ));
        assert_eq!(
            err,
            StoreError::UniqueViolation("favorites_user_recipe_key".to_string())
        );
        assert!(matches!(store_error(DieselError::NotFound), StoreError::Query(_)));
    }

    #[test]
    fn test_recipe_refs_keep_source() {
        let refs = recipe_refs(vec![
            ("catalog".to_string(), 1),
            ("personal".to_string(), 1),
            ("spoonacular".to_string(), 2),
        ]);
        assert_eq!(refs, vec![RecipeRef::catalog(1), RecipeRef::personal(1)]);
    }
}
