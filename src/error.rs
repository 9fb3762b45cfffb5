use thiserror::Error;

/// Rejected viewer configuration.
///
/// Every variant names the offending field so an authoring mistake in a
/// tuning file can be fixed without guessing.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid tuning XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("unable to read tuning file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("<{field}> is not a number: {value:?}")]
    NotANumber { field: String, value: String },

    #[error("<{field}> expects three components, got {value:?}")]
    Components { field: String, value: String },

    #[error("{field} must be {requirement}, got {value}")]
    OutOfRange {
        field: &'static str,
        requirement: &'static str,
        value: f32,
    },

    #[error("{lower} ({lower_value}) must be less than {upper} ({upper_value})")]
    Ordering {
        lower: &'static str,
        lower_value: f32,
        upper: &'static str,
        upper_value: f32,
    },
}

impl ConfigError {
    pub(crate) fn out_of_range(field: &'static str, requirement: &'static str, value: f32) -> Self {
        Self::OutOfRange {
            field,
            requirement,
            value,
        }
    }
}

pub(crate) fn require_positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::out_of_range(field, "a positive finite number", value))
    }
}

pub(crate) fn require_non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::out_of_range(field, "a non-negative finite number", value))
    }
}

pub(crate) fn require_less(
    lower: &'static str,
    lower_value: f32,
    upper: &'static str,
    upper_value: f32,
) -> Result<(), ConfigError> {
    if lower_value < upper_value {
        Ok(())
    } else {
        Err(ConfigError::Ordering {
            lower,
            lower_value,
            upper,
            upper_value,
        })
    }
}
