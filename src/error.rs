//! Error types and handling for `epwgen`

use chrono::NaiveDateTime;
use thiserror::Error;

/// Main error type for the `epwgen` library
#[derive(Error, Debug)]
pub enum EpwGenError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Transport or authentication failure while fetching weather data
    #[error("Fetch error: {message}")]
    Fetch { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Unfillable gap in a required weather variable
    #[error("Data completeness error: '{field}' has a gap longer than {max_gap} hours ({start} to {end})")]
    DataCompleteness {
        field: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
        max_gap: usize,
    },

    /// Physically inconsistent irradiance inputs to the illuminance model
    #[error("Model precondition violated: {message}")]
    ModelPrecondition { message: String },

    /// Internal invariant violation detected before serialization
    #[error("Format error: {message}")]
    Format { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl EpwGenError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new fetch error
    pub fn fetch<S: Into<String>>(message: S) -> Self {
        Self::Fetch {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new model precondition error
    pub fn model_precondition<S: Into<String>>(message: S) -> Self {
        Self::ModelPrecondition {
            message: message.into(),
        }
    }

    /// Create a new format error
    pub fn format<S: Into<String>>(message: S) -> Self {
        Self::Format {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            EpwGenError::Config { .. } => {
                "Configuration error. Please check your config file and API key.".to_string()
            }
            EpwGenError::Fetch { .. } => {
                "Unable to retrieve weather data. Please check your internet connection and API key."
                    .to_string()
            }
            EpwGenError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            EpwGenError::DataCompleteness { field, .. } => {
                format!(
                    "The weather record for '{field}' has too many consecutive missing hours to produce a valid file."
                )
            }
            EpwGenError::ModelPrecondition { message } => {
                format!("Inconsistent irradiance data: {message}")
            }
            EpwGenError::Format { .. } => {
                "The assembled weather table failed an internal consistency check; no file was written."
                    .to_string()
            }
            EpwGenError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = EpwGenError::config("missing API key");
        assert!(matches!(config_err, EpwGenError::Config { .. }));

        let fetch_err = EpwGenError::fetch("connection failed");
        assert!(matches!(fetch_err, EpwGenError::Fetch { .. }));

        let validation_err = EpwGenError::validation("invalid coordinates");
        assert!(matches!(validation_err, EpwGenError::Validation { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = EpwGenError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let fetch_err = EpwGenError::fetch("test");
        assert!(fetch_err.user_message().contains("Unable to retrieve"));

        let validation_err = EpwGenError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }

    #[test]
    fn test_data_completeness_display_names_field_and_span() {
        let start = chrono::NaiveDate::from_ymd_opt(2023, 3, 1)
            .unwrap()
            .and_hms_opt(4, 0, 0)
            .unwrap();
        let end = start + chrono::Duration::hours(8);
        let err = EpwGenError::DataCompleteness {
            field: "temperature (degC)".to_string(),
            start,
            end,
            max_gap: 6,
        };
        let msg = err.to_string();
        assert!(msg.contains("temperature (degC)"));
        assert!(msg.contains("2023-03-01 04:00:00"));
        assert!(msg.contains("2023-03-01 12:00:00"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let epw_err: EpwGenError = io_err.into();
        assert!(matches!(epw_err, EpwGenError::Io { .. }));
    }
}
