//! Family recipes: free-form heirloom recipes kept per user.

use serde::Deserialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{CoreError, CoreResult};
use crate::normalize::{decode_text_list, encode_text_list};
use crate::store::FamilyStore;
use crate::types::{FamilyRecipe, FamilyRecipeRow, NewFamilyRecipe, UserId};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct FamilyRecipePayload {
    pub title: Option<String>,
    pub owner: Option<String>,
    pub occasion: Option<String>,
    pub image: Option<String>,
    pub ingredients: Option<Vec<String>>,
    pub instructions: Option<String>,
}

fn required(value: Option<String>, field: &'static str) -> CoreResult<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CoreError::invalid(field, "is required"))
}

impl FamilyRecipePayload {
    pub fn validate(self) -> CoreResult<NewFamilyRecipe> {
        let title = required(self.title, "title")?;
        let owner = required(self.owner, "owner")?;
        let occasion = required(self.occasion, "occasion")?;
        let ingredients: Vec<String> = self
            .ingredients
            .ok_or_else(|| CoreError::invalid("ingredients", "must be an array"))?
            .into_iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect();
        let instructions = required(self.instructions, "instructions")?;

        Ok(NewFamilyRecipe {
            title,
            owner,
            occasion,
            image: self.image.filter(|i| !i.trim().is_empty()),
            ingredients: encode_text_list(&ingredients),
            instructions,
        })
    }
}

impl From<FamilyRecipeRow> for FamilyRecipe {
    fn from(row: FamilyRecipeRow) -> Self {
        FamilyRecipe {
            id: row.id,
            title: row.title,
            owner: row.owner,
            occasion: row.occasion.unwrap_or_default(),
            images: row.image.iter().cloned().collect(),
            image: row.image,
            ingredients: decode_text_list(&row.ingredients),
            instructions: row.instructions,
            created_at: row.created_at,
        }
    }
}

#[derive(Clone)]
pub struct FamilyRecipes {
    store: Arc<dyn FamilyStore>,
}

impl FamilyRecipes {
    pub fn new(store: Arc<dyn FamilyStore>) -> Self {
        Self { store }
    }

    pub async fn add(&self, user_id: UserId, payload: FamilyRecipePayload) -> CoreResult<i64> {
        let recipe = payload.validate()?;
        let id = self.store.insert_family_recipe(user_id, &recipe).await?;
        tracing::info!(user_id, family_recipe_id = id, "family recipe added");
        Ok(id)
    }

    pub async fn list(&self, user_id: UserId) -> CoreResult<Vec<FamilyRecipe>> {
        Ok(self
            .store
            .family_recipes(user_id)
            .await?
            .into_iter()
            .map(FamilyRecipe::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Utc;

    fn payload() -> FamilyRecipePayload {
        FamilyRecipePayload {
            title: Some("Nonna's lasagna".to_string()),
            owner: Some("Nonna".to_string()),
            occasion: Some("Christmas".to_string()),
            image: None,
            ingredients: Some(vec!["pasta sheets".to_string(), " ragu ".to_string()]),
            instructions: Some("Layer and bake.".to_string()),
        }
    }

    #[test]
    fn test_missing_fields_are_named() {
        let err = FamilyRecipePayload {
            occasion: None,
            ..payload()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput { field: "occasion", .. }));

        let err = FamilyRecipePayload {
            ingredients: None,
            ..payload()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput { field: "ingredients", .. }));
    }

    #[test]
    fn test_legacy_ingredient_text_decodes() {
        let recipe = FamilyRecipe::from(FamilyRecipeRow {
            id: 1,
            user_id: 1,
            title: "Soup".to_string(),
            owner: "Grandpa".to_string(),
            occasion: None,
            image: Some("https://img.example.com/soup.jpg".to_string()),
            ingredients: "water; bones ;".to_string(),
            instructions: "Simmer.".to_string(),
            created_at: Utc::now(),
        });
        assert_eq!(recipe.ingredients, vec!["water", "bones"]);
        assert_eq!(recipe.images, vec!["https://img.example.com/soup.jpg"]);
        assert_eq!(recipe.occasion, "");
    }

    #[tokio::test]
    async fn test_add_then_list() {
        let family = FamilyRecipes::new(Arc::new(MemoryStore::new()));
        family.add(7, payload()).await.unwrap();

        let listed = family.list(7).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].ingredients, vec!["pasta sheets", "ragu"]);
        assert!(listed[0].images.is_empty());
        assert!(family.list(8).await.unwrap().is_empty());
    }
}
