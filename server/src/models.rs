use chrono::{DateTime, Utc};
use diesel::prelude::*;
use saucier_core::{
    FamilyRecipeRow, Ingredient, PersonalRecipeRow, SearchCriteria, StoredIngredient,
};

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub country: Option<String>,
    pub email: Option<String>,
    pub profile_pic: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password_hash: &'a str,
    pub firstname: Option<&'a str>,
    pub lastname: Option<&'a str>,
    pub country: Option<&'a str>,
    pub email: Option<&'a str>,
    pub profile_pic: Option<&'a str>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::sessions)]
pub struct NewSession<'a> {
    pub user_id: i32,
    pub token_hash: &'a str,
    pub expires_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Recipe {
    pub id: i64,
    pub user_id: i32,
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
    pub created_at: DateTime<Utc>,
}

impl Recipe {
    pub fn into_row(self, ingredients: Vec<StoredIngredient>) -> PersonalRecipeRow {
        PersonalRecipeRow {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            image: self.image,
            ready_in_minutes: self.ready_in_minutes,
            popularity: self.popularity,
            vegan: self.vegan,
            vegetarian: self.vegetarian,
            gluten_free: self.gluten_free,
            servings: self.servings,
            instructions: self.instructions,
            legacy_ingredients: self.legacy_ingredients,
            ingredients,
            created_at: self.created_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipes)]
pub struct NewRecipe<'a> {
    pub user_id: i32,
    pub title: &'a str,
    pub image: Option<&'a str>,
    pub ready_in_minutes: Option<i32>,
    pub vegan: bool,
    pub vegetarian: bool,
    pub gluten_free: bool,
    pub servings: i32,
    pub instructions: &'a str,
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::recipe_ingredients)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[allow(dead_code)]
pub struct RecipeIngredient {
    pub id: i64,
    pub recipe_id: i64,
    pub position: i32,
    pub name: String,
    pub amount: Option<f64>,
    pub unit: Option<String>,
}

impl From<RecipeIngredient> for StoredIngredient {
    fn from(row: RecipeIngredient) -> Self {
        StoredIngredient {
            id: row.id,
            ingredient: Ingredient {
                name: row.name,
                amount: row.amount,
                unit: row.unit,
            },
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::recipe_ingredients)]
pub struct NewRecipeIngredient<'a> {
    pub recipe_id: i64,
    pub position: i32,
    pub name: &'a str,
    pub amount: Option<f64>,
    pub unit: Option<&'a str>,
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug)]
#[diesel(table_name = crate::schema::last_search)]
#[diesel(primary_key(user_id))]
#[diesel(treat_none_as_null = true)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct LastSearch {
    pub user_id: i32,
    pub query: String,
    pub cuisine: Option<String>,
    pub diet: Option<String>,
    pub intolerances: Option<String>,
    pub number: i32,
    pub sort: String,
    pub updated_at: DateTime<Utc>,
}

impl LastSearch {
    pub fn new(user_id: i32, criteria: &SearchCriteria) -> Self {
        LastSearch {
            user_id,
            query: criteria.query.clone(),
            cuisine: criteria.cuisine.clone(),
            diet: criteria.diet.clone(),
            intolerances: criteria.intolerances.clone(),
            number: i32::try_from(criteria.number).unwrap_or(i32::MAX),
            sort: criteria.sort.clone(),
            updated_at: Utc::now(),
        }
    }
}

impl From<LastSearch> for SearchCriteria {
    fn from(row: LastSearch) -> Self {
        SearchCriteria {
            query: row.query,
            cuisine: row.cuisine,
            diet: row.diet,
            intolerances: row.intolerances,
            number: u32::try_from(row.number).unwrap_or(1),
            sort: row.sort,
        }
    }
}

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = crate::schema::family_recipes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct FamilyRecipe {
    pub id: i64,
    pub user_id: i32,
    pub title: String,
    pub owner: String,
    pub occasion: Option<String>,
    pub image: Option<String>,
    pub ingredients: String,
    pub instructions: String,
    pub created_at: DateTime<Utc>,
}

impl From<FamilyRecipe> for FamilyRecipeRow {
    fn from(row: FamilyRecipe) -> Self {
        FamilyRecipeRow {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            owner: row.owner,
            occasion: row.occasion,
            image: row.image,
            ingredients: row.ingredients,
            instructions: row.instructions,
            created_at: row.created_at,
        }
    }
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::family_recipes)]
pub struct NewFamilyRecipe<'a> {
    pub user_id: i32,
    pub title: &'a str,
    pub owner: &'a str,
    pub occasion: &'a str,
    pub image: Option<&'a str>,
    pub ingredients: &'a str,
    pub instructions: &'a str,
}
