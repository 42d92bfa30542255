use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Authenticated caller, as handed over by the identity collaborator.
pub type UserId = i32;

/// Recipe identifier. Personal and catalog recipes share this integer space.
pub type RecipeId = i64;

/// Which backing source a recipe came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecipeSource {
    Personal,
    Catalog,
}

impl RecipeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeSource::Personal => "personal",
            RecipeSource::Catalog => "catalog",
        }
    }

    /// Inverse of [`as_str`](Self::as_str).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "personal" => Some(RecipeSource::Personal),
            "catalog" => Some(RecipeSource::Catalog),
            _ => None,
        }
    }
}

/// A recipe id together with the source that owns it.
///
/// Interaction rows are keyed on this, so a personal recipe and a catalog
/// recipe with the same number never share views or favorites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecipeRef {
    pub source: RecipeSource,
    pub id: RecipeId,
}

impl RecipeRef {
    pub fn personal(id: RecipeId) -> Self {
        Self {
            source: RecipeSource::Personal,
            id,
        }
    }

    pub fn catalog(id: RecipeId) -> Self {
        Self {
            source: RecipeSource::Catalog,
            id,
        }
    }
}

impl std::fmt::Display for RecipeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.source.as_str(), self.id)
    }
}

/// One ingredient line of a normalized recipe.
///
/// Legacy free-text ingredient lines carry only a name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Ingredient {
    pub name: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

impl Ingredient {
    pub fn new(name: impl Into<String>, amount: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount: Some(amount),
            unit: Some(unit.into()),
        }
    }

    /// An ingredient known only by its text, e.g. "a pinch of salt".
    pub fn free_text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            amount: None,
            unit: None,
        }
    }
}

/// Canonical recipe shape, independent of where the recipe came from.
///
/// Previews leave `servings`, `ingredients` and `instructions` unset; full
/// views carry all three. Per-user flags are not part of this type, see
/// [`Personalized`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecipeView {
    pub id: RecipeId,
    pub source: RecipeSource,
    pub title: String,
    pub image: Option<String>,
    pub ready_in_minutes: Option<u32>,
    pub popularity: u32,
    pub vegan: bool,
    pub vegetarian: bool,
    pub gluten_free: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub servings: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients: Option<Vec<Ingredient>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Vec<String>>,
}

impl RecipeView {
    pub fn is_full(&self) -> bool {
        self.servings.is_some()
    }

    pub fn recipe_ref(&self) -> RecipeRef {
        RecipeRef {
            source: self.source,
            id: self.id,
        }
    }

    /// Drop the detail fields, keeping the preview fields.
    pub fn into_preview(self) -> Self {
        Self {
            servings: None,
            ingredients: None,
            instructions: None,
            ..self
        }
    }
}

/// Per-user flags attached by the personalization decorator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserFlags {
    pub viewed: bool,
    pub favorite: bool,
}

/// A recipe view composed with the caller's flags. The wrapped view is
/// never modified by decoration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Personalized {
    #[serde(flatten)]
    pub view: RecipeView,
    #[serde(flatten)]
    pub flags: UserFlags,
}

impl Personalized {
    /// Compose a view with default (anonymous) flags.
    pub fn anonymous(view: RecipeView) -> Self {
        Self {
            view,
            flags: UserFlags::default(),
        }
    }
}

/// A stored ingredient row of a personal recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StoredIngredient {
    pub id: i64,
    #[serde(flatten)]
    pub ingredient: Ingredient,
}

/// A personal recipe row as the relational store returns it.
///
/// `instructions` and `legacy_ingredients` are raw text; they are decoded by
/// the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalRecipeRow {
    pub id: RecipeId,
    pub user_id: UserId,
    pub title: String,
    pub image: Option<String>,
    pub ready_in_minutes: Option<i32>,
    pub popularity: i32,
    pub vegan: bool,
    pub vegetarian: bool,
    pub gluten_free: bool,
    pub servings: i32,
    pub instructions: Option<String>,
    pub legacy_ingredients: Option<String>,
    pub ingredients: Vec<StoredIngredient>,
    pub created_at: DateTime<Utc>,
}

/// A personal recipe with its text columns decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct PersonalRecipe {
    pub owner: UserId,
    pub created_at: DateTime<Utc>,
    pub view: RecipeView,
}

/// A validated personal recipe ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPersonalRecipe {
    pub title: String,
    pub image: Option<String>,
    pub ready_in_minutes: Option<u32>,
    pub vegan: bool,
    pub vegetarian: bool,
    pub gluten_free: bool,
    pub servings: u32,
    pub ingredients: Vec<Ingredient>,
    /// Instructions already encoded as a JSON array of steps.
    pub instructions: String,
}

/// Servings count plus ingredient rows, read before scaling.
#[derive(Debug, Clone, PartialEq)]
pub struct ServingsSnapshot {
    pub servings: i32,
    pub ingredients: Vec<StoredIngredient>,
}

/// Parameters of a catalog search; also what the last-search record holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SearchCriteria {
    pub query: String,
    pub cuisine: Option<String>,
    pub diet: Option<String>,
    pub intolerances: Option<String>,
    pub number: u32,
    pub sort: String,
}

/// A family recipe as stored and listed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FamilyRecipe {
    pub id: i64,
    pub title: String,
    pub owner: String,
    pub occasion: String,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub ingredients: Vec<String>,
    pub instructions: String,
    pub created_at: DateTime<Utc>,
}

/// A validated family recipe ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFamilyRecipe {
    pub title: String,
    pub owner: String,
    pub occasion: String,
    pub image: Option<String>,
    /// Ingredient list encoded as a JSON array.
    pub ingredients: String,
    pub instructions: String,
}

/// Raw family recipe row.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyRecipeRow {
    pub id: i64,
    pub user_id: UserId,
    pub title: String,
    pub owner: String,
    pub occasion: Option<String>,
    pub image: Option<String>,
    pub ingredients: String,
    pub instructions: String,
    pub created_at: DateTime<Utc>,
}
