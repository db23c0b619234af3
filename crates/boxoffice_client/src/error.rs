//! Error taxonomy for client operations.

use boxoffice_document::ValidationErrors;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Result type for client operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Closed set of error codes surfaced on [`SyncError`].
///
/// The first group mirrors the document-store taxonomy; the second group
/// holds the blob-storage analogues some backends report. `Display`
/// yields the kebab-case wire string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The caller lacks permission for the target resource. Permanent.
    PermissionDenied,
    /// The backend is temporarily unreachable. Transient.
    Unavailable,
    /// The network request itself failed. Transient.
    NetworkRequestFailed,
    /// The backend throttled the caller. Transient.
    ResourceExhausted,
    /// The target resource does not exist. Permanent.
    NotFound,
    /// The backend gave up waiting. Transient.
    DeadlineExceeded,
    /// A pre-flight validator rejected the update. Permanent, local.
    DataValidationFailed,
    /// Storage analogue of [`ErrorCode::NotFound`]. Permanent.
    ObjectNotFound,
    /// Storage analogue of [`ErrorCode::PermissionDenied`]. Permanent.
    Unauthorized,
    /// Storage analogue of [`ErrorCode::ResourceExhausted`].
    QuotaExceeded,
    /// The storage backend exhausted its own retry budget. Transient.
    RetryLimitExceeded,
    /// An upload landed with the wrong size. Transient.
    ServerFileWrongSize,
    /// Anything that could not be classified.
    Unknown,
}

impl ErrorCode {
    /// Every code, ordered so that no earlier wire string is a substring
    /// of a later one (message scanning relies on this).
    pub const ALL: [Self; 13] = [
        Self::PermissionDenied,
        Self::Unavailable,
        Self::NetworkRequestFailed,
        Self::ResourceExhausted,
        Self::DeadlineExceeded,
        Self::DataValidationFailed,
        Self::ObjectNotFound,
        Self::Unauthorized,
        Self::QuotaExceeded,
        Self::RetryLimitExceeded,
        Self::ServerFileWrongSize,
        Self::NotFound,
        Self::Unknown,
    ];

    /// The kebab-case wire string backends report.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission-denied",
            Self::Unavailable => "unavailable",
            Self::NetworkRequestFailed => "network-request-failed",
            Self::ResourceExhausted => "resource-exhausted",
            Self::NotFound => "not-found",
            Self::DeadlineExceeded => "deadline-exceeded",
            Self::DataValidationFailed => "data-validation-failed",
            Self::ObjectNotFound => "object-not-found",
            Self::Unauthorized => "unauthorized",
            Self::QuotaExceeded => "quota-exceeded",
            Self::RetryLimitExceeded => "retry-limit-exceeded",
            Self::ServerFileWrongSize => "server-file-wrong-size",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a wire string. Returns `None` for unrecognized codes.
    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|known| known.as_str() == code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A terminal or intermediate failure record.
///
/// Constructed by the classifier on every caught failure; handed to a
/// retry observer on intermediate failures and returned as the terminal
/// error once retries are exhausted.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct SyncError {
    /// Classified error code.
    pub code: ErrorCode,
    /// Human-readable message.
    pub message: String,
    /// When the failure was recorded.
    pub timestamp: DateTime<Utc>,
    /// Target resource, when known.
    pub path: Option<String>,
    /// Retries performed before this failure became terminal.
    pub retry_count: u32,
    /// Field-level detail for validation failures.
    pub validation_errors: Option<ValidationErrors>,
}

impl SyncError {
    /// Creates an error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            timestamp: Utc::now(),
            path: None,
            retry_count: 0,
            validation_errors: None,
        }
    }

    /// Creates a pre-flight validation failure with field-level detail.
    pub fn validation(errors: ValidationErrors, path: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::DataValidationFailed,
            message: "update rejected by pre-flight validation".into(),
            timestamp: Utc::now(),
            path: Some(path.into()),
            retry_count: 0,
            validation_errors: Some(errors),
        }
    }
}
