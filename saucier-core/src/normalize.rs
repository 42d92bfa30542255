//! Mapping from source-specific recipe shapes to [`RecipeView`].
//!
//! Stored text columns went through two historical write paths: JSON arrays
//! and semicolon-separated lists. Decoding tries JSON first and falls back to
//! splitting, so neither shape is ever an error.

use serde_json::Value;

use crate::catalog::{CatalogError, CatalogRecipe};
use crate::types::{Ingredient, PersonalRecipeRow, RecipeSource, RecipeView};

/// Map a remote catalog recipe to a full view.
///
/// Fails only when the catalog omits the id or title.
pub fn from_catalog(raw: CatalogRecipe) -> Result<RecipeView, CatalogError> {
    let id = raw
        .id
        .ok_or_else(|| CatalogError::Decode("recipe without id".to_string()))?;
    let title = raw
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| CatalogError::Decode(format!("recipe {id} without title")))?;

    let ingredients = raw
        .extended_ingredients
        .unwrap_or_default()
        .into_iter()
        .filter_map(|ing| {
            let name = ing.name?.trim().to_string();
            if name.is_empty() {
                return None;
            }
            Some(Ingredient {
                name,
                amount: ing.amount.filter(|a| a.is_finite()),
                unit: ing.unit.filter(|u| !u.trim().is_empty()),
            })
        })
        .collect();

    let analyzed_steps: Vec<String> = raw
        .analyzed_instructions
        .unwrap_or_default()
        .into_iter()
        .flat_map(|block| block.steps)
        .map(|s| s.step.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let instructions = if analyzed_steps.is_empty() {
        split_instruction_text(raw.instructions.as_deref().unwrap_or(""))
    } else {
        analyzed_steps
    };

    Ok(RecipeView {
        id,
        source: RecipeSource::Catalog,
        title,
        image: raw.image.filter(|i| !i.is_empty()),
        ready_in_minutes: raw.ready_in_minutes.and_then(|m| u32::try_from(m).ok()),
        popularity: raw
            .aggregate_likes
            .map(|l| u32::try_from(l.max(0)).unwrap_or(u32::MAX))
            .unwrap_or(0),
        vegan: raw.vegan.unwrap_or(false),
        vegetarian: raw.vegetarian.unwrap_or(false),
        gluten_free: raw.gluten_free.unwrap_or(false),
        servings: Some(positive_or_one(raw.servings.unwrap_or(1))),
        ingredients: Some(ingredients),
        instructions: Some(instructions),
    })
}

/// Map a stored personal recipe row to a full view.
///
/// Structured ingredient rows win; rows written before ingredients had their
/// own table fall back to the legacy text column.
pub fn from_local_row(row: PersonalRecipeRow) -> RecipeView {
    let ingredients = if row.ingredients.is_empty() {
        row.legacy_ingredients
            .as_deref()
            .map(decode_ingredient_list)
            .unwrap_or_default()
    } else {
        row.ingredients.into_iter().map(|s| s.ingredient).collect()
    };

    RecipeView {
        id: row.id,
        source: RecipeSource::Personal,
        title: row.title,
        image: row.image,
        ready_in_minutes: row.ready_in_minutes.and_then(|m| u32::try_from(m).ok()),
        popularity: u32::try_from(row.popularity).unwrap_or(0),
        vegan: row.vegan,
        vegetarian: row.vegetarian,
        gluten_free: row.gluten_free,
        servings: Some(positive_or_one(row.servings.into())),
        ingredients: Some(ingredients),
        instructions: Some(
            row.instructions
                .as_deref()
                .map(decode_text_list)
                .unwrap_or_default(),
        ),
    }
}

fn positive_or_one(n: i64) -> u32 {
    u32::try_from(n).ok().filter(|n| *n > 0).unwrap_or(1)
}

/// Decode a stored list of strings.
///
/// A JSON array decodes element-wise (non-string elements keep their JSON
/// text). Anything else is split on `;`, trimmed, and empty segments dropped.
pub fn decode_text_list(text: &str) -> Vec<String> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => non_blank(&s),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        _ => split_legacy(text),
    }
}

/// Decode a stored ingredient list. JSON elements may be `{name, amount,
/// unit}` objects or plain strings; legacy text yields name-only entries.
pub fn decode_ingredient_list(text: &str) -> Vec<Ingredient> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => non_blank(&s).map(Ingredient::free_text),
                Value::Object(_) => serde_json::from_value::<Ingredient>(item)
                    .ok()
                    .filter(|ing| !ing.name.trim().is_empty()),
                _ => None,
            })
            .collect(),
        _ => split_legacy(text)
            .into_iter()
            .map(Ingredient::free_text)
            .collect(),
    }
}

/// Encode steps the way new rows are written.
pub fn encode_text_list(items: &[String]) -> String {
    // Serializing a slice of strings cannot fail.
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

fn split_legacy(text: &str) -> Vec<String> {
    text.split(';').filter_map(non_blank).collect()
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Break catalog free-text instructions into steps. The catalog sometimes
/// sends HTML lists; list items, paragraphs and line breaks become step
/// boundaries and other tags are dropped.
fn split_instruction_text(text: &str) -> Vec<String> {
    let mut plain = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '<' {
            plain.push(c);
            continue;
        }
        let tag: String = chars.by_ref().take_while(|c| *c != '>').collect();
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or("")
            .to_ascii_lowercase();
        if matches!(name.as_str(), "li" | "p" | "br" | "ol" | "ul" | "div") {
            plain.push('\n');
        }
    }
    plain.lines().filter_map(non_blank).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{AnalyzedInstructions, AnalyzedStep, CatalogIngredient};
    use crate::types::StoredIngredient;
    use chrono::Utc;

    fn local_row() -> PersonalRecipeRow {
        PersonalRecipeRow {
            id: 7,
            user_id: 1,
            title: "Grandma's soup".to_string(),
            image: None,
            ready_in_minutes: Some(40),
            popularity: 0,
            vegan: false,
            vegetarian: true,
            gluten_free: false,
            servings: 4,
            instructions: Some(r#"["Chop","Boil"]"#.to_string()),
            legacy_ingredients: None,
            ingredients: vec![],
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_decode_json_array() {
        assert_eq!(decode_text_list(r#"["a","b"]"#), vec!["a", "b"]);
    }

    #[test]
    fn test_decode_legacy_semicolons() {
        assert_eq!(decode_text_list("a; b ;"), vec!["a", "b"]);
        assert_eq!(decode_text_list(";;"), Vec::<String>::new());
        assert_eq!(decode_text_list(""), Vec::<String>::new());
    }

    #[test]
    fn test_decode_non_array_json_falls_back() {
        // Valid JSON, but not a list: treated as legacy text.
        assert_eq!(decode_text_list("42"), vec!["42"]);
        assert_eq!(decode_text_list(r#"{"a":1}; x"#), vec![r#"{"a":1}"#, "x"]);
    }

    #[test]
    fn test_decode_ingredient_list_mixed() {
        let decoded = decode_ingredient_list(
            r#"[{"name":"flour","amount":2,"unit":"cup"},"salt",{"amount":1}]"#,
        );
        assert_eq!(
            decoded,
            vec![
                Ingredient::new("flour", 2.0, "cup"),
                Ingredient::free_text("salt")
            ]
        );
        assert_eq!(
            decode_ingredient_list("2 eggs; milk"),
            vec![Ingredient::free_text("2 eggs"), Ingredient::free_text("milk")]
        );
    }

    #[test]
    fn test_from_local_row_prefers_structured_rows() {
        let mut row = local_row();
        row.legacy_ingredients = Some("ignored".to_string());
        row.ingredients = vec![StoredIngredient {
            id: 1,
            ingredient: Ingredient::new("leek", 2.0, ""),
        }];
        let view = from_local_row(row);
        assert_eq!(view.source, RecipeSource::Personal);
        assert_eq!(view.servings, Some(4));
        assert_eq!(view.ingredients, Some(vec![Ingredient::new("leek", 2.0, "")]));
        assert_eq!(
            view.instructions,
            Some(vec!["Chop".to_string(), "Boil".to_string()])
        );
    }

    #[test]
    fn test_from_local_row_legacy_text() {
        let mut row = local_row();
        row.legacy_ingredients = Some("leek; potato".to_string());
        row.instructions = Some("Chop everything; Boil ;".to_string());
        let view = from_local_row(row);
        assert_eq!(
            view.ingredients,
            Some(vec![
                Ingredient::free_text("leek"),
                Ingredient::free_text("potato")
            ])
        );
        assert_eq!(
            view.instructions,
            Some(vec!["Chop everything".to_string(), "Boil".to_string()])
        );
    }

    #[test]
    fn test_from_catalog_defaults() {
        let raw = CatalogRecipe {
            id: Some(716429),
            title: Some("Pasta".to_string()),
            extended_ingredients: Some(vec![
                CatalogIngredient {
                    id: Some(1),
                    name: Some("butter".to_string()),
                    amount: Some(1.5),
                    unit: Some("tbsp".to_string()),
                    original: None,
                },
                CatalogIngredient {
                    id: Some(2),
                    name: None,
                    amount: Some(3.0),
                    unit: None,
                    original: Some("3 mystery".to_string()),
                },
            ]),
            ..Default::default()
        };
        let view = from_catalog(raw).unwrap();
        assert_eq!(view.source, RecipeSource::Catalog);
        assert_eq!(view.popularity, 0);
        assert!(!view.vegan && !view.vegetarian && !view.gluten_free);
        assert_eq!(view.servings, Some(1));
        assert_eq!(
            view.ingredients,
            Some(vec![Ingredient::new("butter", 1.5, "tbsp")])
        );
        assert_eq!(view.instructions, Some(vec![]));
    }

    #[test]
    fn test_from_catalog_html_instructions() {
        let raw = CatalogRecipe {
            id: Some(1),
            title: Some("Toast".to_string()),
            instructions: Some("<ol><li>Slice bread.</li><li>Toast it.</li></ol>".to_string()),
            ..Default::default()
        };
        let view = from_catalog(raw).unwrap();
        assert_eq!(
            view.instructions,
            Some(vec!["Slice bread.".to_string(), "Toast it.".to_string()])
        );
    }

    #[test]
    fn test_from_catalog_prefers_analyzed_steps() {
        let raw = CatalogRecipe {
            id: Some(1),
            title: Some("Toast".to_string()),
            instructions: Some("Do it all at once.".to_string()),
            analyzed_instructions: Some(vec![AnalyzedInstructions {
                steps: vec![
                    AnalyzedStep {
                        step: "Slice.".to_string(),
                    },
                    AnalyzedStep {
                        step: "Toast.".to_string(),
                    },
                ],
            }]),
            ..Default::default()
        };
        let view = from_catalog(raw).unwrap();
        assert_eq!(
            view.instructions,
            Some(vec!["Slice.".to_string(), "Toast.".to_string()])
        );
    }

    #[test]
    fn test_from_catalog_requires_title() {
        let raw = CatalogRecipe {
            id: Some(1),
            title: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(from_catalog(raw), Err(CatalogError::Decode(_))));
    }
}
