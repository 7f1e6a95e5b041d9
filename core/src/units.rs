//! Metric/imperial conversions used at the display boundary.
//!
//! Storage is always metric (kg, cm). Everything else in the engine works in
//! metric; these helpers exist for converting user input and rendering output.

pub const KG_PER_LB: f64 = 0.453_592;
pub const CM_PER_IN: f64 = 2.54;

#[must_use]
pub fn kg_from_lb(lb: f64) -> f64 {
    lb * KG_PER_LB
}

#[must_use]
pub fn lb_from_kg(kg: f64) -> f64 {
    kg / KG_PER_LB
}

#[must_use]
pub fn cm_from_in(inches: f64) -> f64 {
    inches * CM_PER_IN
}

#[must_use]
pub fn in_from_cm(cm: f64) -> f64 {
    cm / CM_PER_IN
}

/// Weight unit accepted on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightUnit {
    Kg,
    Lb,
}

impl WeightUnit {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "kg" | "kgs" => Some(Self::Kg),
            "lb" | "lbs" => Some(Self::Lb),
            _ => None,
        }
    }

    #[must_use]
    pub fn to_kg(self, value: f64) -> f64 {
        match self {
            Self::Kg => value,
            Self::Lb => kg_from_lb(value),
        }
    }
}
