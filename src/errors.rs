// SPDX-License-Identifier: MPL-2.0

//! Error types for the application layer
//!
//! Platform failures arrive as [`BackendError`]; everything the terminal and
//! CLI can add on top is folded into [`AppError`].

use crate::backends::BackendError;
use std::fmt;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Main application error type
#[derive(Debug)]
pub enum AppError {
    /// Enumeration, acquisition or playback failure
    Backend(BackendError),
    /// Terminal setup, drawing or input failure
    Terminal(std::io::Error),
    /// Output serialization failure
    Serialization(String),
    /// Configuration errors
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Backend(e) => write!(f, "{}", e),
            AppError::Terminal(e) => write!(f, "Terminal error: {}", e),
            AppError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Backend(e) => Some(e),
            AppError::Terminal(e) => Some(e),
            _ => None,
        }
    }
}

impl From<BackendError> for AppError {
    fn from(err: BackendError) -> Self {
        AppError::Backend(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Terminal(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_passes_through_display() {
        let err: AppError = BackendError::PermissionDenied("camera".to_string()).into();
        assert_eq!(err.to_string(), "Permission denied: camera");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_config_error_display() {
        let err = AppError::Config("frame capacity must be positive".to_string());
        assert!(err.to_string().starts_with("Configuration error"));
    }
}
