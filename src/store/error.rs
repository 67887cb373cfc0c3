//! Errors from the session document store.
//!
//! Both backends report failures as [`StoreError`]. The orchestrator passes
//! them to callers unchanged and never retries.

use derive_more::{Display, Error};
use tracing::instrument;

/// A failed read or write of a session document, with the location that
/// raised it.
#[derive(Debug, Clone, Display, Error)]
#[display("Session store error: {} at {}:{}", message, file, line)]
pub struct StoreError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl StoreError {
    /// Creates a store error at the caller's location.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

impl From<diesel::result::Error> for StoreError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        Self::new(format!("SQLite query failed: {}", err))
    }
}

impl From<diesel::ConnectionError> for StoreError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        Self::new(format!("SQLite connection failed: {}", err))
    }
}

impl From<serde_json::Error> for StoreError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("Corrupt session document: {}", err))
    }
}

impl From<tokio::task::JoinError> for StoreError {
    #[track_caller]
    fn from(err: tokio::task::JoinError) -> Self {
        Self::new(format!("Blocking store task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_document_names_the_cause() {
        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = StoreError::from(parse);
        assert!(err.to_string().starts_with("Session store error: Corrupt session document"));
        assert!(err.file.ends_with("error.rs"));
    }
}
