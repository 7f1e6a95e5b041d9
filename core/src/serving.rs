use crate::error::{EngineError, require_finite};
use crate::models::{FoodRecord, Macros};
use crate::units::KG_PER_LB;

/// Smallest reference serving used as a denominator.
pub const MIN_REFERENCE_SERVING: f64 = 1e-6;

/// Rescale a food's nutrients from its reference serving to `requested`.
///
/// `requested` is in the record's own `serving_unit`. Scaling is linear:
/// the reference size returns the record's macros unchanged and 0 returns
/// all zeros.
pub fn scale(food: &FoodRecord, requested: f64) -> Result<Macros, EngineError> {
    let requested = require_finite("serving", requested)?;
    if requested < 0.0 {
        return Err(EngineError::invalid(
            "serving",
            format!("must not be negative (got {requested})"),
        ));
    }
    let reference = food.normalized_serving_size().max(MIN_REFERENCE_SERVING);
    Ok(food.macros.scaled(requested / reference))
}

/// Convert a quantity with a unit to grams.
/// Volume-based conversions assume water density (1 ml = 1 g).
/// Returns `(grams, is_approximate)` where `is_approximate` is true for volume conversions.
#[must_use]
pub fn convert_to_grams(quantity: f64, unit: &str) -> Option<(f64, bool)> {
    let lower = unit.to_lowercase();
    match lower.as_str() {
        "g" | "gram" | "grams" => Some((quantity, false)),
        "kg" | "kilogram" | "kilograms" => Some((quantity * 1000.0, false)),
        "lb" | "lbs" | "pound" | "pounds" => Some((quantity * KG_PER_LB * 1000.0, false)),
        "oz" | "ounce" | "ounces" => Some((quantity * KG_PER_LB * 1000.0 / 16.0, false)),
        "tbsp" | "tablespoon" | "tablespoons" => Some((quantity * 15.0, true)),
        "tsp" | "teaspoon" | "teaspoons" => Some((quantity * 5.0, true)),
        "ml" | "milliliter" | "milliliters" | "millilitre" | "millilitres" => {
            Some((quantity, true))
        }
        "l" | "liter" | "liters" | "litre" | "litres" => Some((quantity * 1000.0, true)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chicken() -> FoodRecord {
        FoodRecord {
            source_id: Some("171077".to_string()),
            description: "Chicken breast, roasted".to_string(),
            brand: "Generic".to_string(),
            serving_size: 100.0,
            serving_unit: "g".to_string(),
            macros: Macros {
                protein_g: 31.0,
                carbs_g: 0.0,
                fats_g: 3.6,
                calories: 165.0,
            },
        }
    }

    #[test]
    fn test_scale_identity_at_reference() {
        let food = chicken();
        assert_eq!(scale(&food, 100.0).unwrap(), food.macros);
    }

    #[test]
    fn test_scale_to_zero() {
        assert_eq!(scale(&chicken(), 0.0).unwrap(), Macros::default());
    }

    #[test]
    fn test_scale_proportional() {
        let m = scale(&chicken(), 150.0).unwrap();
        assert!((m.protein_g - 46.5).abs() < 1e-9);
        assert!((m.fats_g - 5.4).abs() < 1e-9);
        assert!((m.calories - 247.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_reference_falls_back_to_default() {
        let mut food = chicken();
        food.serving_size = 0.0;
        let m = scale(&food, 50.0).unwrap();
        assert!((m.calories - 82.5).abs() < 1e-9);
    }

    #[test]
    fn test_non_gram_reference() {
        let mut food = chicken();
        food.serving_size = 28.0;
        food.serving_unit = "g".to_string();
        let m = scale(&food, 56.0).unwrap();
        assert!((m.calories - 330.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_negative_or_nan_serving() {
        assert!(matches!(
            scale(&chicken(), -1.0),
            Err(EngineError::InvalidInput { field: "serving", .. })
        ));
        assert!(scale(&chicken(), f64::NAN).is_err());
    }

    #[test]
    fn test_convert_to_grams() {
        assert_eq!(convert_to_grams(200.0, "g"), Some((200.0, false)));
        assert_eq!(convert_to_grams(2.0, "kg"), Some((2000.0, false)));
        let (g, approx) = convert_to_grams(1.0, "lb").unwrap();
        assert!((g - 453.592).abs() < 1e-9);
        assert!(!approx);
        let (g, _) = convert_to_grams(1.0, "oz").unwrap();
        assert!((g - 28.3495).abs() < 1e-9);
        assert_eq!(convert_to_grams(2.0, "tbsp"), Some((30.0, true)));
        assert_eq!(convert_to_grams(1.0, "handful"), None);
    }

    proptest! {
        #[test]
        fn prop_scaling_is_linear(
            reference in 1.0f64..500.0,
            protein in 0.0f64..100.0,
            calories in 0.0f64..900.0,
            s1 in 0.1f64..1000.0,
            s2 in 0.1f64..1000.0,
        ) {
            let food = FoodRecord {
                source_id: None,
                description: "x".to_string(),
                brand: "Generic".to_string(),
                serving_size: reference,
                serving_unit: "g".to_string(),
                macros: Macros { protein_g: protein, carbs_g: 0.0, fats_g: 0.0, calories },
            };
            let a = scale(&food, s1).unwrap();
            let b = scale(&food, s2).unwrap();
            let tol = 1e-9 * (1.0 + protein.max(calories));
            prop_assert!((a.protein_g / s1 - b.protein_g / s2).abs() < tol);
            prop_assert!((a.calories / s1 - b.calories / s2).abs() < tol);
        }
    }
}
