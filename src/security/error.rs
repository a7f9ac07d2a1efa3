//! Error taxonomy for the security core.
//!
//! | Variant | Raised by |
//! |---------|-----------|
//! | [`PolicyDenied`](GuardError::PolicyDenied) | Isolator in `block` mode |
//! | [`Configuration`](GuardError::Configuration) | Setters given an unknown session type, mode, level or glob |
//! | [`Storage`](GuardError::Storage) | Any store read/write that a decision depends on |
//! | [`NotFound`](GuardError::NotFound) / [`AlreadyExists`](GuardError::AlreadyExists) | Secret inventory lookups |
//!
//! Unsafe outbound content is not an error: `check_before_send` returns
//! `false` and the caller decides.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GuardError>;

#[derive(Debug, Error)]
pub enum GuardError {
    #[error("BLOCKED in {session_type} session: {reason}")]
    PolicyDenied {
        reason: String,
        session_type: String,
    },

    #[error("invalid {kind} '{value}' (expected one of: {expected})")]
    Configuration {
        kind: &'static str,
        value: String,
        expected: String,
    },

    #[error("storage failure on {}: {source}", store.display())]
    Storage {
        store: PathBuf,
        #[source]
        source: StorageError,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl GuardError {
    pub fn configuration(kind: &'static str, value: &str, expected: &[&str]) -> Self {
        Self::Configuration {
            kind,
            value: value.to_string(),
            expected: expected.join(", "),
        }
    }

    /// Adapter for `map_err`: tag a storage failure with the store it hit.
    pub fn storage<E: Into<StorageError>>(store: &Path) -> impl FnOnce(E) -> Self + '_ {
        move |e| Self::Storage {
            store: store.to_path_buf(),
            source: e.into(),
        }
    }

    pub fn is_policy_denied(&self) -> bool {
        matches!(self, Self::PolicyDenied { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_lists_choices() {
        let err = GuardError::configuration("enforcement mode", "loud", &["block", "warn"]);
        assert_eq!(
            err.to_string(),
            "invalid enforcement mode 'loud' (expected one of: block, warn)"
        );
    }

    #[test]
    fn storage_error_names_store() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err = GuardError::storage(Path::new("/state/audit.sqlite"))(io);
        assert!(err.to_string().contains("/state/audit.sqlite"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
