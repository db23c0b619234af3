//! Heuristic classification of opaque backend errors.
//!
//! Backends report failures as opaque objects: sometimes a structured
//! code, sometimes a code buried in the message text, sometimes prose
//! only. All sniffing lives here so the heuristics can be swapped per
//! backend without touching the retry executor or the pagination engine.

use crate::error::ErrorCode;
use boxoffice_store::StoreError;

/// Default retry ceiling when a policy does not override it.
pub const DEFAULT_RETRY_CEILING: u32 = 3;

/// Maps an opaque backend error onto the closed [`ErrorCode`] set.
///
/// Inspection order: the explicit code property, then a known code
/// embedded in the message text, then keyword heuristics as a last
/// resort. Never fails; unrecognized input maps to [`ErrorCode::Unknown`].
pub fn classify(error: &StoreError) -> ErrorCode {
    if let Some(code) = error.code.as_deref() {
        if let Some(known) = ErrorCode::parse(code) {
            return known;
        }
        // Some backends namespace their codes, e.g. "db/unavailable".
        if let Some((_, suffix)) = code.rsplit_once('/') {
            if let Some(known) = ErrorCode::parse(suffix) {
                return known;
            }
        }
    }

    let message = error.message.to_ascii_lowercase();

    // A known wire string embedded in the message text.
    for code in ErrorCode::ALL {
        if code != ErrorCode::Unknown && message.contains(code.as_str()) {
            return code;
        }
    }

    // Keyword heuristics, last resort.
    if message.contains("permission") || message.contains("insufficient") {
        ErrorCode::PermissionDenied
    } else if message.contains("not found") || message.contains("no such") {
        ErrorCode::NotFound
    } else if message.contains("network") {
        ErrorCode::NetworkRequestFailed
    } else if message.contains("quota") || message.contains("exhausted") {
        ErrorCode::ResourceExhausted
    } else if message.contains("deadline") || message.contains("timed out") || message.contains("timeout") {
        ErrorCode::DeadlineExceeded
    } else if message.contains("unavailable") || message.contains("offline") {
        ErrorCode::Unavailable
    } else {
        ErrorCode::Unknown
    }
}

/// Decides whether another attempt is allowed after a classified failure.
///
/// Transient codes retry until the ceiling; permanent codes never retry;
/// anything else is allowed exactly one retry.
pub fn should_retry(code: ErrorCode, attempts_so_far: u32, max_retries: u32) -> bool {
    if attempts_so_far >= max_retries {
        return false;
    }
    match code {
        ErrorCode::Unavailable
        | ErrorCode::NetworkRequestFailed
        | ErrorCode::ResourceExhausted
        | ErrorCode::DeadlineExceeded
        | ErrorCode::RetryLimitExceeded
        | ErrorCode::ServerFileWrongSize => true,
        ErrorCode::PermissionDenied
        | ErrorCode::NotFound
        | ErrorCode::Unauthorized
        | ErrorCode::ObjectNotFound
        | ErrorCode::DataValidationFailed => false,
        ErrorCode::QuotaExceeded | ErrorCode::Unknown => attempts_so_far < 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_code_wins() {
        let err = StoreError::with_code("permission-denied", "whatever the message says");
        assert_eq!(classify(&err), ErrorCode::PermissionDenied);
    }

    #[test]
    fn namespaced_code_is_unwrapped() {
        let err = StoreError::with_code("db/unavailable", "rpc failed");
        assert_eq!(classify(&err), ErrorCode::Unavailable);

        let err = StoreError::with_code("storage/object-not-found", "download failed");
        assert_eq!(classify(&err), ErrorCode::ObjectNotFound);
    }

    #[test]
    fn code_embedded_in_message() {
        let err = StoreError::msg("request failed with deadline-exceeded after 30s");
        assert_eq!(classify(&err), ErrorCode::DeadlineExceeded);

        // The storage analogue is matched before its shorter cousin.
        let err = StoreError::msg("GET returned object-not-found");
        assert_eq!(classify(&err), ErrorCode::ObjectNotFound);
    }

    #[test]
    fn keyword_heuristics() {
        assert_eq!(
            classify(&StoreError::msg("Missing or insufficient permissions.")),
            ErrorCode::PermissionDenied
        );
        assert_eq!(
            classify(&StoreError::msg("A network error has occurred")),
            ErrorCode::NetworkRequestFailed
        );
        assert_eq!(
            classify(&StoreError::msg("document was not found")),
            ErrorCode::NotFound
        );
        assert_eq!(
            classify(&StoreError::msg("the operation timed out")),
            ErrorCode::DeadlineExceeded
        );
        assert_eq!(
            classify(&StoreError::msg("client is offline")),
            ErrorCode::Unavailable
        );
    }

    #[test]
    fn unrecognized_input_maps_to_unknown() {
        assert_eq!(classify(&StoreError::msg("")), ErrorCode::Unknown);
        assert_eq!(classify(&StoreError::msg("???")), ErrorCode::Unknown);
        assert_eq!(
            classify(&StoreError::with_code("totally-novel", "mystery")),
            ErrorCode::Unknown
        );
    }

    #[test]
    fn transient_codes_retry_until_ceiling() {
        for code in [
            ErrorCode::Unavailable,
            ErrorCode::ResourceExhausted,
            ErrorCode::DeadlineExceeded,
            ErrorCode::RetryLimitExceeded,
            ErrorCode::ServerFileWrongSize,
        ] {
            assert!(should_retry(code, 0, DEFAULT_RETRY_CEILING));
            assert!(should_retry(code, 2, DEFAULT_RETRY_CEILING));
            assert!(!should_retry(code, 3, DEFAULT_RETRY_CEILING));
        }
    }

    #[test]
    fn permanent_codes_never_retry() {
        for code in [
            ErrorCode::PermissionDenied,
            ErrorCode::NotFound,
            ErrorCode::Unauthorized,
            ErrorCode::ObjectNotFound,
            ErrorCode::DataValidationFailed,
        ] {
            assert!(!should_retry(code, 0, DEFAULT_RETRY_CEILING));
        }
    }

    #[test]
    fn unknown_codes_retry_exactly_once() {
        assert!(should_retry(ErrorCode::Unknown, 0, DEFAULT_RETRY_CEILING));
        assert!(!should_retry(ErrorCode::Unknown, 1, DEFAULT_RETRY_CEILING));
        assert!(should_retry(ErrorCode::QuotaExceeded, 0, DEFAULT_RETRY_CEILING));
        assert!(!should_retry(ErrorCode::QuotaExceeded, 1, DEFAULT_RETRY_CEILING));
    }
}
