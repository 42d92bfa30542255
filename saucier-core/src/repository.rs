//! Personal (user-authored) recipes.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{CoreError, CoreResult};
use crate::normalize::{decode_text_list, encode_text_list, from_local_row};
use crate::scale::scale;
use crate::store::{RecipeStore, StoreError};
use crate::types::{
    Ingredient, NewPersonalRecipe, PersonalRecipe, RecipeId, RecipeView, StoredIngredient, UserId,
};

/// Incoming personal recipe. Loosely typed on purpose: [`validate`] turns it
/// into a [`NewPersonalRecipe`] or an `InvalidInput` naming the bad field.
///
/// [`validate`]: PersonalRecipePayload::validate
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersonalRecipePayload {
    pub title: Option<String>,
    pub image: Option<String>,
    #[schema(value_type = Option<u32>)]
    pub ready_in_minutes: Option<Value>,
    #[schema(value_type = Option<u32>)]
    pub servings: Option<Value>,
    pub vegan: Option<bool>,
    pub vegetarian: Option<bool>,
    pub gluten_free: Option<bool>,
    #[serde(default)]
    pub ingredients: Vec<IngredientPayload>,
    pub instructions: Option<InstructionsPayload>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct IngredientPayload {
    pub name: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub amount: Option<Value>,
    pub unit: Option<String>,
}

/// Steps as a list, or one block of text (split like legacy rows).
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum InstructionsPayload {
    Steps(Vec<String>),
    Text(String),
}

impl InstructionsPayload {
    fn into_steps(self) -> Vec<String> {
        match self {
            InstructionsPayload::Steps(steps) => steps
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            InstructionsPayload::Text(text) => decode_text_list(&text),
        }
    }
}

impl PersonalRecipePayload {
    pub fn validate(self) -> CoreResult<NewPersonalRecipe> {
        let title = self
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| CoreError::invalid("title", "is required"))?;

        let servings = match &self.servings {
            None | Some(Value::Null) => 1,
            Some(v) => coerce_servings(v)?,
        };

        let ready_in_minutes = match &self.ready_in_minutes {
            None | Some(Value::Null) => None,
            Some(v) => Some(coerce_count(v).ok_or_else(|| {
                CoreError::invalid("readyInMinutes", "must be a non-negative integer")
            })?),
        };

        let ingredients = self
            .ingredients
            .into_iter()
            .map(IngredientPayload::validate)
            .collect::<CoreResult<Vec<_>>>()?;

        let steps = self
            .instructions
            .map(InstructionsPayload::into_steps)
            .unwrap_or_default();

        Ok(NewPersonalRecipe {
            title,
            image: self.image.filter(|i| !i.trim().is_empty()),
            ready_in_minutes,
            vegan: self.vegan.unwrap_or(false),
            vegetarian: self.vegetarian.unwrap_or(false),
            gluten_free: self.gluten_free.unwrap_or(false),
            servings,
            ingredients,
            instructions: encode_text_list(&steps),
        })
    }
}

impl IngredientPayload {
    fn validate(self) -> CoreResult<Ingredient> {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| CoreError::invalid("ingredients.name", "is required"))?;

        let amount = match self.amount {
            None | Some(Value::Null) => None,
            Some(v) => Some(
                number_of(&v)
                    .filter(|a| a.is_finite() && *a >= 0.0)
                    .ok_or_else(|| {
                        CoreError::invalid("ingredients.amount", "must be a non-negative number")
                    })?,
            ),
        };

        Ok(Ingredient {
            name,
            amount,
            unit: self.unit.filter(|u| !u.trim().is_empty()),
        })
    }
}

/// Numbers and numeric strings; anything else is `None`.
fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Whole, non-negative numbers (`4`, `4.0`, `"4"`).
fn coerce_count(value: &Value) -> Option<u32> {
    let n = number_of(value)?;
    if !n.is_finite() || n < 0.0 || n.fract() != 0.0 || n > u32::MAX as f64 {
        return None;
    }
    Some(n as u32)
}

/// Servings must coerce to a positive integer that fits the servings column.
pub fn coerce_servings(value: &Value) -> CoreResult<u32> {
    coerce_count(value)
        .filter(|n| *n > 0 && i32::try_from(*n).is_ok())
        .ok_or_else(|| CoreError::invalid("servings", "must be a positive integer"))
}

/// Store access for personal recipes.
#[derive(Clone)]
pub struct PersonalRecipes {
    store: Arc<dyn RecipeStore>,
}

impl PersonalRecipes {
    pub fn new(store: Arc<dyn RecipeStore>) -> Self {
        Self { store }
    }

    /// Validate and insert; returns the new recipe id. Nothing is written
    /// when validation fails.
    pub async fn create(
        &self,
        payload: PersonalRecipePayload,
        user_id: UserId,
    ) -> CoreResult<RecipeId> {
        let recipe = payload.validate()?;
        let id = self.store.insert_recipe(user_id, &recipe).await?;
        tracing::info!(user_id, recipe_id = id, "personal recipe created");
        Ok(id)
    }

    pub async fn get_by_id(&self, id: RecipeId) -> CoreResult<Option<PersonalRecipe>> {
        Ok(self.store.find_recipe(id).await?.map(|row| PersonalRecipe {
            owner: row.user_id,
            created_at: row.created_at,
            view: from_local_row(row),
        }))
    }

    /// Previews of every recipe the user authored, newest first.
    pub async fn list_for_user(&self, user_id: UserId) -> CoreResult<Vec<RecipeView>> {
        Ok(self
            .store
            .list_recipes_by_user(user_id)
            .await?
            .into_iter()
            .map(|row| from_local_row(row).into_preview())
            .collect())
    }

    /// Rescale a recipe the caller owns to `new_servings` and persist it.
    ///
    /// A recipe owned by someone else is indistinguishable from a missing
    /// one. Returns the rescaled ingredient rows.
    pub async fn update_servings(
        &self,
        recipe_id: RecipeId,
        new_servings: u32,
        user_id: UserId,
    ) -> CoreResult<Vec<StoredIngredient>> {
        let new_servings = i32::try_from(new_servings)
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| CoreError::invalid("servings", "must be a positive integer"))?;

        let snapshot = self
            .store
            .servings_snapshot(recipe_id, user_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("recipe {recipe_id}")))?;

        let (ids, current): (Vec<i64>, Vec<Ingredient>) = snapshot
            .ingredients
            .into_iter()
            .map(|row| (row.id, row.ingredient))
            .unzip();
        let rescaled = scale(&current, snapshot.servings.into(), new_servings.into())?;
        let rows: Vec<StoredIngredient> = ids
            .into_iter()
            .zip(rescaled)
            .map(|(id, ingredient)| StoredIngredient { id, ingredient })
            .collect();

        match self
            .store
            .apply_scaling(recipe_id, user_id, new_servings, &rows)
            .await
        {
            Ok(true) => {
                tracing::info!(
                    recipe_id,
                    from = snapshot.servings,
                    to = new_servings,
                    "servings updated"
                );
                Ok(rows)
            }
            // Deleted between the snapshot and the write.
            Ok(false) => Err(CoreError::NotFound(format!("recipe {recipe_id}"))),
            Err(e @ StoreError::PartialWrite { .. }) => {
                tracing::error!(recipe_id, error = %e, "servings update partially applied");
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn payload(value: Value) -> PersonalRecipePayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_servings_coercion() {
        assert_eq!(coerce_servings(&json!(4)).unwrap(), 4);
        assert_eq!(coerce_servings(&json!(4.0)).unwrap(), 4);
        assert_eq!(coerce_servings(&json!(" 6 ")).unwrap(), 6);
        for bad in [json!(0), json!(-2), json!(2.5), json!("many"), json!(true), json!([4])] {
            let err = coerce_servings(&bad).unwrap_err();
            assert!(
                matches!(err, CoreError::InvalidInput { field: "servings", .. }),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_requires_title() {
        let err = payload(json!({"title": "   "})).validate().unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput { field: "title", .. }));
    }

    #[test]
    fn test_validate_encodes_instructions() {
        let recipe = payload(json!({
            "title": "Shakshuka",
            "servings": "2",
            "instructions": "Fry onions; add tomatoes; crack eggs",
            "ingredients": [{"name": "egg", "amount": 4, "unit": ""}, {"name": "salt"}]
        }))
        .validate()
        .unwrap();
        assert_eq!(recipe.servings, 2);
        assert_eq!(
            recipe.instructions,
            r#"["Fry onions","add tomatoes","crack eggs"]"#
        );
        assert_eq!(recipe.ingredients[0].amount, Some(4.0));
        assert_eq!(recipe.ingredients[0].unit, None);
        assert_eq!(recipe.ingredients[1], Ingredient::free_text("salt"));
    }

    #[test]
    fn test_validate_rejects_bad_amount() {
        let err = payload(json!({
            "title": "Bread",
            "ingredients": [{"name": "flour", "amount": -1}]
        }))
        .validate()
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidInput {
                field: "ingredients.amount",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_invalid_payload_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let repo = PersonalRecipes::new(store.clone());
        let err = repo
            .create(payload(json!({"title": "x", "servings": 0})), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput { .. }));
        assert!(repo.list_for_user(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_servings_rescales_and_persists() {
        let store = Arc::new(MemoryStore::new());
        let repo = PersonalRecipes::new(store.clone());
        let id = repo
            .create(
                payload(json!({
                    "title": "Pancakes",
                    "servings": 4,
                    "ingredients": [
                        {"name": "flour", "amount": 2, "unit": "cup"},
                        {"name": "salt", "amount": 0.5, "unit": "tsp"}
                    ]
                })),
                1,
            )
            .await
            .unwrap();

        let rows = repo.update_servings(id, 6, 1).await.unwrap();
        let amounts: Vec<Option<f64>> = rows.iter().map(|r| r.ingredient.amount).collect();
        assert_eq!(amounts, vec![Some(3.0), Some(0.75)]);

        let stored = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.view.servings, Some(6));
        assert_eq!(
            stored.view.ingredients.unwrap()[1],
            Ingredient::new("salt", 0.75, "tsp")
        );
    }

    #[tokio::test]
    async fn test_update_servings_partial_failure_is_reported() {
        let store = Arc::new(MemoryStore::new());
        let repo = PersonalRecipes::new(store.clone());
        let id = repo
            .create(
                payload(json!({
                    "title": "Stew",
                    "servings": 2,
                    "ingredients": [
                        {"name": "beef", "amount": 500, "unit": "g"},
                        {"name": "wine", "amount": 1, "unit": "cup"}
                    ]
                })),
                1,
            )
            .await
            .unwrap();
        let wine_id = store.servings_snapshot(id, 1).await.unwrap().unwrap().ingredients[1].id;
        store.fail_ingredient_updates(wine_id);

        let err = repo.update_servings(id, 4, 1).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::DependencyFailure { partial: true, .. }
        ));
    }
}
