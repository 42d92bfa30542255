pub mod catalog;
pub mod error;
pub mod family;
pub mod ledger;
pub mod normalize;
pub mod personalize;
pub mod repository;
pub mod resolver;
pub mod scale;
pub mod service;
pub mod store;
pub mod types;

pub use catalog::{
    CatalogClient, CatalogClientBuilder, CatalogError, CatalogRecipe, FakeCatalog, RecipeCatalog,
};
pub use error::{CoreError, CoreResult};
pub use family::{FamilyRecipePayload, FamilyRecipes};
pub use ledger::{InteractionLedger, RECENT_VIEWS_LIMIT};
pub use personalize::Personalizer;
pub use repository::{
    coerce_servings, IngredientPayload, InstructionsPayload, PersonalRecipePayload,
    PersonalRecipes,
};
pub use resolver::{RecipeKey, Resolver};
pub use scale::{scale, ScaleError};
pub use service::{RecipeService, SearchRequest, SearchResults, ServiceDeps};
pub use store::{FamilyStore, InteractionStore, MemoryStore, RecipeStore, StoreError};
pub use types::{
    FamilyRecipe, FamilyRecipeRow, Ingredient, NewFamilyRecipe, NewPersonalRecipe,
    PersonalRecipe, PersonalRecipeRow, Personalized, RecipeId, RecipeRef, RecipeSource, RecipeView,
    SearchCriteria, ServingsSnapshot, StoredIngredient, UserFlags, UserId,
};
