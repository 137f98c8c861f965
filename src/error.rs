//! Error types and handling for Sessy Bridge
//!
//! This module defines the error types used throughout the bridge. Vendor
//! failures are split into request errors (the device answered, but not with
//! a usable 200) and transport errors (the device could not be reached), so
//! the retry loop can decide what is worth another attempt.

use thiserror::Error;

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, SessyError>;

/// Main error type for Sessy Bridge
#[derive(Debug, Error)]
pub enum SessyError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// The Sessy API answered with a non-200 status or an unusable body
    #[error("Failed call to Sessy API (status code = {status}, error message: '{message}')")]
    Request { status: u16, message: String },

    /// The Sessy device could not be reached (DNS, refused, timeout)
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The dynamic schedule lacks an element for the requested date
    #[error("Missing schedule information '{element}' for {date}")]
    Schedule { element: String, date: String },

    /// Every attempt of a retried call failed
    #[error("Failed to call Sessy API (too many retries)")]
    TooManyRetries,

    /// Vendor strategy string or selector level without a known mapping
    #[error("Unknown power strategy: {value}")]
    UnknownStrategy { value: String },

    /// Switch text other than On/Off
    #[error("Unknown switch state: {value}")]
    UnknownSwitchState { value: String },

    /// A host command that cannot be mapped onto a vendor call
    #[error("Command error: {message}")]
    Command { message: String },

    /// Host device store errors
    #[error("Host error: {message}")]
    Host { message: String },

    /// HTTP/Web server errors
    #[error("Web server error: {message}")]
    Web { message: String },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// File I/O errors
    #[error("I/O error: {message}")]
    Io { message: String },

    /// Validation errors
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },
}

impl SessyError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        SessyError::Config {
            message: message.into(),
        }
    }

    /// Create a new request error from an HTTP status and vendor message
    pub fn request<S: Into<String>>(status: u16, message: S) -> Self {
        SessyError::Request {
            status,
            message: message.into(),
        }
    }

    /// Create a new transport error
    pub fn transport<S: Into<String>>(message: S) -> Self {
        SessyError::Transport {
            message: message.into(),
        }
    }

    /// Create a new schedule error
    pub fn schedule<S: Into<String>>(element: S, date: S) -> Self {
        SessyError::Schedule {
            element: element.into(),
            date: date.into(),
        }
    }

    /// Create a new unknown strategy error
    pub fn unknown_strategy<S: Into<String>>(value: S) -> Self {
        SessyError::UnknownStrategy {
            value: value.into(),
        }
    }

    /// Create a new unknown switch state error
    pub fn unknown_switch_state<S: Into<String>>(value: S) -> Self {
        SessyError::UnknownSwitchState {
            value: value.into(),
        }
    }

    /// Create a new command error
    pub fn command<S: Into<String>>(message: S) -> Self {
        SessyError::Command {
            message: message.into(),
        }
    }

    /// Create a new host error
    pub fn host<S: Into<String>>(message: S) -> Self {
        SessyError::Host {
            message: message.into(),
        }
    }

    /// Create a new web error
    pub fn web<S: Into<String>>(message: S) -> Self {
        SessyError::Web {
            message: message.into(),
        }
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        SessyError::Io {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        SessyError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Whether the retry loop should try this call again
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessyError::Request { .. } | SessyError::Transport { .. }
        )
    }
}

impl From<std::io::Error> for SessyError {
    fn from(err: std::io::Error) -> Self {
        SessyError::io(err.to_string())
    }
}

impl From<serde_yaml::Error> for SessyError {
    fn from(err: serde_yaml::Error) -> Self {
        SessyError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for SessyError {
    fn from(err: serde_json::Error) -> Self {
        SessyError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Connection, timeout and body read failures are transport errors
impl From<reqwest::Error> for SessyError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => SessyError::request(status.as_u16(), err.to_string()),
            None => SessyError::transport(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = SessyError::config("test config error");
        assert!(matches!(err, SessyError::Config { .. }));

        let err = SessyError::request(500, "boom");
        assert!(matches!(err, SessyError::Request { status: 500, .. }));

        let err = SessyError::validation("field", "test validation error");
        assert!(matches!(err, SessyError::Validation { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = SessyError::request(401, "unauthorized");
        assert_eq!(
            err.to_string(),
            "Failed call to Sessy API (status code = 401, error message: 'unauthorized')"
        );

        let err = SessyError::schedule("energy_prices", "2024-05-01");
        assert_eq!(
            err.to_string(),
            "Missing schedule information 'energy_prices' for 2024-05-01"
        );

        assert_eq!(
            SessyError::TooManyRetries.to_string(),
            "Failed to call Sessy API (too many retries)"
        );
    }

    #[test]
    fn test_retryable_classification() {
        assert!(SessyError::request(503, "busy").is_retryable());
        assert!(SessyError::transport("refused").is_retryable());
        assert!(!SessyError::schedule("power_strategy", "2024-05-01").is_retryable());
        assert!(!SessyError::unknown_strategy("POWER_STRATEGY_FOO").is_retryable());
        assert!(!SessyError::TooManyRetries.is_retryable());
    }
}
