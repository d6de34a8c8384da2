use thiserror::Error;
use tracing::{error, warn};

/// Error severity for UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,     // Blue - informational
    Warning,  // Yellow - recoverable
    Error,    // Red - operation failed
}

/// Domain-specific errors for keycut
#[derive(Error, Debug)]
pub enum KeycutError {
    #[error("invalid hotkey definition: {0}")]
    Validation(String),

    #[error("could not persist hotkeys: {0}")]
    Persistence(String),

    #[error("hotkey registration failed: {0}")]
    Registration(String),

    #[error("action failed: {0}")]
    Dispatch(String),

    #[error("window query failed: {0}")]
    WindowQuery(String),
}

impl KeycutError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Validation(_) => ErrorSeverity::Warning,
            Self::Persistence(_) => ErrorSeverity::Error,
            Self::Registration(_) => ErrorSeverity::Warning,
            Self::Dispatch(_) => ErrorSeverity::Error,
            Self::WindowQuery(_) => ErrorSeverity::Info,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Persistence(msg) => format!("Could not save: {}", msg),
            Self::Registration(msg) => format!("Shortcut unavailable: {}", msg),
            Self::Dispatch(msg) => format!("Could not run action: {}", msg),
            Self::WindowQuery(msg) => msg.clone(),
        }
    }
}

pub type Result<T> = std::result::Result<T, KeycutError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and the user doesn't need to know.
pub trait ResultExt<T> {
    /// Log error with caller location and return None. Use for recoverable failures.
    fn log_err(self) -> Option<T>;
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn log_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                error!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation failed"
                );
                None
            }
        }
    }

    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_are_warnings() {
        let err = KeycutError::Validation("key combo must not be empty".into());
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.user_message(), "key combo must not be empty");
    }

    #[test]
    fn persistence_errors_are_errors() {
        let err = KeycutError::Persistence("disk full".into());
        assert_eq!(err.severity(), ErrorSeverity::Error);
        assert!(err.user_message().contains("disk full"));
    }

    #[test]
    fn log_err_returns_value_on_ok() {
        let result: std::result::Result<u32, String> = Ok(7);
        assert_eq!(result.log_err(), Some(7));
    }

    #[test]
    fn log_err_returns_none_on_err() {
        let result: std::result::Result<u32, String> = Err("boom".into());
        assert_eq!(result.log_err(), None);
    }
}
