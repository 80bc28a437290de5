use std::path::PathBuf;
use thiserror::Error;

use crate::registration::RegistrationError;
use crate::validation::ValidationReport;

/// The main error type for setup operations.
#[derive(Debug, Error)]
pub enum SetupError {
    /// The camera could not be initialised or failed to produce a still.
    #[error("Camera error: {reason}")]
    Camera { reason: String },

    /// Operator input was rejected (degenerate or duplicate region, too few
    /// control points, coordinates outside the image).
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// An action was attempted out of workflow order.
    #[error("Action not allowed: {message}")]
    State { message: String },

    #[error("Registration failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse site file {path}: {source}")]
    SiteJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write site file {path}: {source}")]
    SiteJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse settings file {path}: {source}")]
    SettingsParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid setting: {message}")]
    InvalidSetting { message: String },

    #[error("Validation failed with {error_count} error(s) and {warning_count} warning(s)")]
    ValidationFailed {
        error_count: usize,
        warning_count: usize,
        report: ValidationReport,
    },

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

impl SetupError {
    pub(crate) fn camera(reason: impl Into<String>) -> Self {
        SetupError::Camera {
            reason: reason.into(),
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        SetupError::Validation {
            message: message.into(),
        }
    }

    pub(crate) fn state(message: impl Into<String>) -> Self {
        SetupError::State {
            message: message.into(),
        }
    }
}
