//! Proportional ingredient scaling for a changed serving count.

use thiserror::Error;

use crate::types::Ingredient;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScaleError {
    #[error("servings must be a positive integer, got {0}")]
    InvalidServings(i64),
}

/// Ratio between the new and old serving counts.
pub fn scale_factor(old_servings: i64, new_servings: i64) -> Result<f64, ScaleError> {
    if old_servings <= 0 {
        return Err(ScaleError::InvalidServings(old_servings));
    }
    if new_servings <= 0 {
        return Err(ScaleError::InvalidServings(new_servings));
    }
    Ok(new_servings as f64 / old_servings as f64)
}

/// Multiply and round to two decimals, half away from zero.
pub fn scale_amount(amount: f64, factor: f64) -> f64 {
    (amount * factor * 100.0).round() / 100.0
}

/// Rescale every ingredient amount by `new_servings / old_servings`.
///
/// Ingredients without an amount, and all other fields, pass through. An
/// unchanged serving count returns the amounts exactly as given, unrounded.
pub fn scale(
    ingredients: &[Ingredient],
    old_servings: i64,
    new_servings: i64,
) -> Result<Vec<Ingredient>, ScaleError> {
    let factor = scale_factor(old_servings, new_servings)?;
    if old_servings == new_servings {
        return Ok(ingredients.to_vec());
    }
    Ok(ingredients
        .iter()
        .map(|ing| Ingredient {
            amount: ing.amount.map(|a| scale_amount(a, factor)),
            ..ing.clone()
        })
        .collect())
}
