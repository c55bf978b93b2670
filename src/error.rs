//! Custom error types for process-text-sender.
//!
//! This module provides structured error types using `thiserror` for better
//! error handling and more informative error messages.

use std::io;
use thiserror::Error;

use crate::desktop::WindowHandle;

/// Main error type for process-text-sender operations.
#[derive(Error, Debug)]
pub enum PtsError {
    /// No running process matches the requested name.
    #[error("process '{name}' was not found")]
    TargetNotFound { name: String },

    /// The process exists but no window could be resolved for it.
    #[error("no window found for process '{process}'{}; enumerated handles: [{}]",
        format_filter(.filter),
        format_handles(.enumerated))]
    WindowNotFound {
        process: String,
        filter: Option<String>,
        enumerated: Vec<WindowHandle>,
    },

    /// An injection step or external tool failed.
    #[error("delivery failed during {step}: {reason}")]
    DeliveryFailed { step: String, reason: String },

    /// A markup key sequence could not be interpreted.
    #[error("invalid key markup '{input}': {reason}")]
    InvalidMarkup { input: String, reason: String },

    /// Reading, writing or restoring the clipboard failed.
    #[error("clipboard error: {0}")]
    Clipboard(String),

    /// Platform-specific operation is not supported.
    #[error("operation not supported on this platform: {0}")]
    UnsupportedPlatform(String),

    /// Configuration validation error.
    #[error("configuration error: {0}")]
    ConfigValidation(String),

    /// Error reading or parsing configuration file.
    #[error("failed to load config from '{path}': {reason}")]
    ConfigLoad { path: String, reason: String },

    /// Error parsing duration string.
    #[error("invalid duration '{value}': {reason}")]
    InvalidDuration { value: String, reason: String },

    /// Malformed payload arguments on the command line.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for process-text-sender operations.
pub type Result<T> = std::result::Result<T, PtsError>;

fn format_filter(filter: &Option<String>) -> String {
    match filter {
        Some(title) => format!(" matching title '{title}'"),
        None => String::new(),
    }
}

fn format_handles(handles: &[WindowHandle]) -> String {
    handles
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl PtsError {
    /// Create a new TargetNotFound error.
    pub fn target_not_found(name: impl Into<String>) -> Self {
        Self::TargetNotFound { name: name.into() }
    }

    /// Create a new WindowNotFound error.
    pub fn window_not_found(
        process: impl Into<String>,
        filter: Option<String>,
        enumerated: Vec<WindowHandle>,
    ) -> Self {
        Self::WindowNotFound {
            process: process.into(),
            filter,
            enumerated,
        }
    }

    /// Create a new DeliveryFailed error.
    pub fn delivery_failed(step: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DeliveryFailed {
            step: step.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidMarkup error.
    pub fn invalid_markup(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidMarkup {
            input: input.into(),
            reason: reason.into(),
        }
    }

    /// Create a new Clipboard error.
    pub fn clipboard(message: impl Into<String>) -> Self {
        Self::Clipboard(message.into())
    }

    /// Create a new UnsupportedPlatform error.
    pub fn unsupported_platform(message: impl Into<String>) -> Self {
        Self::UnsupportedPlatform(message.into())
    }

    /// Create a new ConfigValidation error.
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation(message.into())
    }

    /// Create a new ConfigLoad error.
    pub fn config_load(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConfigLoad {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidDuration error.
    pub fn invalid_duration(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidDuration {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidArguments error.
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments(message.into())
    }

    /// True for failures that happen before any desktop state was touched.
    pub fn is_resolution_failure(&self) -> bool {
        matches!(
            self,
            Self::TargetNotFound { .. } | Self::WindowNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PtsError::target_not_found("notepad");
        assert_eq!(err.to_string(), "process 'notepad' was not found");

        let err = PtsError::delivery_failed("xdotool type", "exit status 1");
        assert_eq!(
            err.to_string(),
            "delivery failed during xdotool type: exit status 1"
        );

        let err = PtsError::config_validation("process_name cannot be empty");
        assert_eq!(
            err.to_string(),
            "configuration error: process_name cannot be empty"
        );
    }

    #[test]
    fn test_window_not_found_lists_handles() {
        let err = PtsError::window_not_found(
            "editor",
            Some("Untitled".to_string()),
            vec![WindowHandle::new(0x1a2b), WindowHandle::new(0xff)],
        );
        assert_eq!(
            err.to_string(),
            "no window found for process 'editor' matching title 'Untitled'; \
             enumerated handles: [0000000000001A2B, 00000000000000FF]"
        );

        let err = PtsError::window_not_found("editor", None, vec![]);
        assert_eq!(
            err.to_string(),
            "no window found for process 'editor'; enumerated handles: []"
        );
    }

    #[test]
    fn test_resolution_failures() {
        assert!(PtsError::target_not_found("x").is_resolution_failure());
        assert!(PtsError::window_not_found("x", None, vec![]).is_resolution_failure());
        assert!(!PtsError::clipboard("busy").is_resolution_failure());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let pts_err: PtsError = io_err.into();
        assert!(matches!(pts_err, PtsError::Io(_)));
    }
}
