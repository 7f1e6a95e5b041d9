use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, require_positive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    VeryActive,
    ExtremelyActive,
}

pub const ACTIVITY_LEVELS: &[ActivityLevel] = &[
    ActivityLevel::Sedentary,
    ActivityLevel::Light,
    ActivityLevel::Moderate,
    ActivityLevel::VeryActive,
    ActivityLevel::ExtremelyActive,
];

impl ActivityLevel {
    #[must_use]
    pub fn multiplier(self) -> f64 {
        match self {
            Self::Sedentary => 1.2,
            Self::Light => 1.375,
            Self::Moderate => 1.55,
            Self::VeryActive => 1.725,
            Self::ExtremelyActive => 1.9,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sedentary => "sedentary",
            Self::Light => "light",
            Self::Moderate => "moderate",
            Self::VeryActive => "very_active",
            Self::ExtremelyActive => "extremely_active",
        }
    }
}

impl fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityLevel {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace([' ', '-'], "_");
        ACTIVITY_LEVELS
            .iter()
            .copied()
            .find(|level| level.as_str() == key)
            .ok_or_else(|| {
                EngineError::invalid(
                    "activity_level",
                    format!(
                        "'{s}' is not one of sedentary, light, moderate, very_active, extremely_active"
                    ),
                )
            })
    }
}

/// Constant term of the BMR formula.
///
/// The two Mifflin-St Jeor variants differ only here. Which one applies is an
/// explicit choice; the profile's recorded sex is never consulted implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmrOffset {
    #[default]
    Female,
    Male,
}

impl BmrOffset {
    #[must_use]
    pub fn kcal(self) -> f64 {
        match self {
            Self::Female => -161.0,
            Self::Male => 5.0,
        }
    }
}

/// Body metrics needed for an energy estimate, all metric.
#[derive(Debug, Clone, Copy)]
pub struct BodyMetrics {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnergyEstimate {
    pub bmr: f64,
    pub tdee: f64,
    pub activity_level: ActivityLevel,
}

pub fn bmr(metrics: &BodyMetrics, offset: BmrOffset) -> Result<f64, EngineError> {
    let weight = require_positive("weight_kg", metrics.weight_kg)?;
    let height = require_positive("height_cm", metrics.height_cm)?;
    if metrics.age == 0 {
        return Err(EngineError::invalid("age", "must be greater than 0"));
    }
    Ok(10.0 * weight + 6.25 * height - 5.0 * f64::from(metrics.age) + offset.kcal())
}

pub fn estimate(
    metrics: &BodyMetrics,
    activity_level: ActivityLevel,
    offset: BmrOffset,
) -> Result<EnergyEstimate, EngineError> {
    let bmr = bmr(metrics, offset)?;
    Ok(EnergyEstimate {
        bmr,
        tdee: bmr * activity_level.multiplier(),
        activity_level,
    })
}
