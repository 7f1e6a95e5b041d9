use serde::{Deserialize, Serialize};

use crate::error::{EngineError, require_finite, require_positive};
use crate::models::Macros;
use crate::units::lb_from_kg;

pub const KCAL_PER_G_PROTEIN: f64 = 4.0;
pub const KCAL_PER_G_CARBS: f64 = 4.0;
pub const KCAL_PER_G_FAT: f64 = 9.0;

/// What to do when the calorie budget can't cover protein and fat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarbPolicy {
    /// Report the negative carb figure unchanged.
    #[default]
    AllowNegative,
    ClampToZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerOptions {
    pub deficit_kcal: f64,
    pub protein_g_per_lb: f64,
    pub fat_fraction: f64,
    pub carb_policy: CarbPolicy,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            deficit_kcal: 150.0,
            protein_g_per_lb: 1.0,
            fat_fraction: 0.25,
            carb_policy: CarbPolicy::AllowNegative,
        }
    }
}

impl PlannerOptions {
    pub fn validate(&self) -> Result<(), EngineError> {
        require_finite("deficit_kcal", self.deficit_kcal)?;
        let ratio = require_finite("protein_g_per_lb", self.protein_g_per_lb)?;
        if ratio < 0.0 {
            return Err(EngineError::invalid(
                "protein_g_per_lb",
                format!("must not be negative (got {ratio})"),
            ));
        }
        let fraction = require_finite("fat_fraction", self.fat_fraction)?;
        if !(0.0..=1.0).contains(&fraction) {
            return Err(EngineError::invalid(
                "fat_fraction",
                format!("must be between 0 and 1 (got {fraction})"),
            ));
        }
        Ok(())
    }
}

/// Plan daily targets from total energy expenditure.
///
/// `calories` on the result is `tdee - deficit`; the gram figures follow from
/// [`split_calories`].
pub fn plan(
    tdee: f64,
    target_weight_kg: f64,
    options: &PlannerOptions,
) -> Result<Macros, EngineError> {
    let tdee = require_finite("tdee", tdee)?;
    options.validate()?;
    split_calories(tdee - options.deficit_kcal, target_weight_kg, options)
}

/// Split a calorie budget into protein/fat/carb grams.
///
/// Protein is fixed per pound of target weight, fat is a fraction of the
/// budget, carbs take whatever is left.
pub fn split_calories(
    target_calories: f64,
    target_weight_kg: f64,
    options: &PlannerOptions,
) -> Result<Macros, EngineError> {
    let target_calories = require_finite("target_calories", target_calories)?;
    let target_weight_kg = require_positive("target_weight", target_weight_kg)?;
    options.validate()?;

    let protein_g = lb_from_kg(target_weight_kg) * options.protein_g_per_lb;
    let fats_g = target_calories * options.fat_fraction / KCAL_PER_G_FAT;
    let carbs_g = (target_calories - protein_g * KCAL_PER_G_PROTEIN - fats_g * KCAL_PER_G_FAT)
        / KCAL_PER_G_CARBS;

    let carbs_g = match options.carb_policy {
        CarbPolicy::AllowNegative => carbs_g,
        CarbPolicy::ClampToZero => carbs_g.max(0.0),
    };

    Ok(Macros {
        protein_g,
        carbs_g,
        fats_g,
        calories: target_calories,
    })
}

/// Targets entered by hand; calories are derived from the gram values.
pub fn from_grams(protein_g: f64, carbs_g: f64, fats_g: f64) -> Result<Macros, EngineError> {
    for (field, value) in [
        ("protein_g", protein_g),
        ("carbs_g", carbs_g),
        ("fats_g", fats_g),
    ] {
        if require_finite(field, value)? < 0.0 {
            return Err(EngineError::invalid(field, "must not be negative"));
        }
    }
    Ok(Macros {
        protein_g,
        carbs_g,
        fats_g,
        calories: protein_g * KCAL_PER_G_PROTEIN
            + carbs_g * KCAL_PER_G_CARBS
            + fats_g * KCAL_PER_G_FAT,
    })
}
