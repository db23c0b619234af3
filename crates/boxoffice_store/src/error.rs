//! Opaque backend errors.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// An error reported by the remote document store.
///
/// The store layer does not interpret failures beyond carrying the
/// backend's reported code and message; mapping onto the closed error
/// taxonomy (and the retry decision) happens in the client layer.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StoreError {
    /// Backend-reported error code, when one was provided.
    pub code: Option<String>,
    /// Human-readable message.
    pub message: String,
    /// Resource the failing operation targeted, when known.
    pub path: Option<String>,
}

impl StoreError {
    /// Creates an error carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
            path: None,
        }
    }

    /// Creates an error with an explicit backend code.
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
            path: None,
        }
    }

    /// Attaches the target resource path.
    #[must_use]
    pub fn at_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_shows_message() {
        let err = StoreError::with_code("unavailable", "backend is down");
        assert_eq!(err.to_string(), "backend is down");
        assert_eq!(err.code.as_deref(), Some("unavailable"));
    }

    #[test]
    fn at_path_attaches_target() {
        let err = StoreError::msg("boom").at_path("events/evt-1");
        assert_eq!(err.path.as_deref(), Some("events/evt-1"));
        assert_eq!(err.code, None);
    }
}
