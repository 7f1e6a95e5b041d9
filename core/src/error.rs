use thiserror::Error;

/// Typed failures raised by the nutrition engine.
///
/// Persistence plumbing stays on `anyhow`; these are the errors a caller is
/// expected to match on and surface to the user.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid {field}: {message}")]
    InvalidInput {
        field: &'static str,
        message: String,
    },

    #[error("ledger consistency violation: {0}")]
    Consistency(String),

    #[error("no results found for '{query}'")]
    LookupUnavailable { query: String },

    #[error("no progress entries recorded")]
    NoData,

    #[error("need at least {needed} progress entries, found {found}")]
    InsufficientData { needed: usize, found: usize },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}

impl EngineError {
    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }
}

/// Reject NaN/infinite values and anything `<= 0`.
pub(crate) fn require_positive(field: &'static str, value: f64) -> Result<f64, EngineError> {
    if !value.is_finite() {
        return Err(EngineError::invalid(field, "must be a finite number"));
    }
    if value <= 0.0 {
        return Err(EngineError::invalid(
            field,
            format!("must be greater than 0 (got {value})"),
        ));
    }
    Ok(value)
}

pub(crate) fn require_finite(field: &'static str, value: f64) -> Result<f64, EngineError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EngineError::invalid(field, "must be a finite number"))
    }
}
