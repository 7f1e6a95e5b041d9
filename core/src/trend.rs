use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, require_finite};
use crate::models::ProgressEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Gain,
    Loss,
    NoChange,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Gain => "gain",
            Self::Loss => "loss",
            Self::NoChange => "no change",
        })
    }
}

/// How small a change still counts as no change. The default of 0 means
/// only an exactly equal weight is `NoChange`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendPolicy {
    pub no_change_tolerance_kg: f64,
}

impl TrendPolicy {
    pub fn validate(&self) -> Result<(), EngineError> {
        let tol = require_finite("no_change_tolerance_kg", self.no_change_tolerance_kg)?;
        if tol < 0.0 {
            return Err(EngineError::invalid(
                "no_change_tolerance_kg",
                format!("must not be negative (got {tol})"),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn classify(&self, delta_kg: f64) -> Trend {
        if delta_kg.abs() <= self.no_change_tolerance_kg {
            Trend::NoChange
        } else if delta_kg > 0.0 {
            Trend::Gain
        } else {
            Trend::Loss
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeightChange {
    /// Latest minus earliest weight.
    pub delta_kg: f64,
    pub trend: Trend,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

// All functions below take entries ordered most recent first, the order
// `Database::get_progress_entries` returns them in.

pub fn latest(entries: &[ProgressEntry]) -> Result<&ProgressEntry, EngineError> {
    entries.first().ok_or(EngineError::NoData)
}

pub fn change(entries: &[ProgressEntry], policy: &TrendPolicy) -> Result<WeightChange, EngineError> {
    policy.validate()?;
    let (Some(newest), Some(oldest)) = (entries.first(), entries.last()) else {
        return Err(EngineError::InsufficientData {
            needed: 2,
            found: 0,
        });
    };
    if entries.len() < 2 {
        return Err(EngineError::InsufficientData {
            needed: 2,
            found: entries.len(),
        });
    }
    let delta_kg = newest.weight_kg - oldest.weight_kg;
    Ok(WeightChange {
        delta_kg,
        trend: policy.classify(delta_kg),
        from: oldest.date,
        to: newest.date,
    })
}

/// A borrowed window over the most recent entries.
///
/// Nothing is copied; `iter` can be called any number of times and always
/// yields the same entries.
#[derive(Debug, Clone, Copy)]
pub struct HistoryView<'a> {
    entries: &'a [ProgressEntry],
}

impl<'a> HistoryView<'a> {
    pub fn iter(&self) -> std::slice::Iter<'a, ProgressEntry> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &HistoryView<'a> {
    type Item = &'a ProgressEntry;
    type IntoIter = std::slice::Iter<'a, ProgressEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[must_use]
pub fn history_view(entries: &[ProgressEntry], limit: usize) -> HistoryView<'_> {
    HistoryView {
        entries: &entries[..limit.min(entries.len())],
    }
}

/// `(date, weight_kg)` pairs oldest first, for charting.
#[must_use]
pub fn weight_series(entries: &[ProgressEntry]) -> Vec<(NaiveDate, f64)> {
    entries.iter().rev().map(|e| (e.date, e.weight_kg)).collect()
}
