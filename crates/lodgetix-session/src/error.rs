//! # Session Error Types
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Session Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Registration  │  │     Persistence         │ │
//! │  │                 │  │                 │  │     (retryable)         │ │
//! │  │  InvalidConfig  │  │  Core(..)       │  │  Persistence            │ │
//! │  │  ConfigLoad..   │  │  UnknownPackage │  │  SaveTimedOut           │ │
//! │  │  ConfigSave..   │  │  UnknownTicket  │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  A persistence failure never touches the in-memory registration; the   │
//! │  wizard shows a dismissible retry prompt.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use lodgetix_core::CoreError;
use lodgetix_db::DbError;
use thiserror::Error;

/// Result type alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

#[derive(Debug, Error)]
pub enum SessionError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid session configuration.
    #[error("Invalid session configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Registration Errors
    // =========================================================================
    /// The registration engine rejected the operation.
    ///
    /// ## When This Occurs
    /// - Quantity of zero or above the cap
    /// - Package with no included tickets
    /// - Mutation aimed at the ledger the current mode doesn't use
    /// - Stored draft that fails schema checks on resume
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Package id not in the session's catalog snapshot.
    #[error("Unknown package: {0}")]
    UnknownPackage(String),

    /// Ticket id not in the session's catalog snapshot.
    #[error("Unknown ticket: {0}")]
    UnknownTicket(String),

    /// No catalog is stored for the function.
    #[error("No catalog available for function {0}")]
    CatalogUnavailable(String),

    // =========================================================================
    // Persistence Errors
    // =========================================================================
    /// Draft store call failed. Local selections are kept.
    #[error("Failed to persist draft {draft_id}: {reason}")]
    Persistence { draft_id: String, reason: String },

    /// Draft store didn't answer in time. Local selections are kept.
    #[error("Saving draft {draft_id} timed out after {secs} seconds")]
    SaveTimedOut { draft_id: String, secs: u64 },

    /// Resume asked for a draft that was never saved.
    #[error("Draft not found: {0}")]
    DraftNotFound(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<std::io::Error> for SessionError {
    fn from(err: std::io::Error) -> Self {
        SessionError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for SessionError {
    fn from(err: toml::de::Error) -> Self {
        SessionError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for SessionError {
    fn from(err: toml::ser::Error) -> Self {
        SessionError::ConfigSaveFailed(err.to_string())
    }
}

impl SessionError {
    /// Wraps a storage failure for a specific draft.
    pub fn persistence(draft_id: &str, err: DbError) -> Self {
        SessionError::Persistence {
            draft_id: draft_id.to_string(),
            reason: err.to_string(),
        }
    }

    /// Returns true if the caller should offer a retry.
    ///
    /// ## Retryable Errors
    /// - Draft store failures
    /// - Save timeouts
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessionError::Persistence { .. } | SessionError::SaveTimedOut { .. }
        )
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        match self {
            SessionError::InvalidConfig(_)
            | SessionError::ConfigLoadFailed(_)
            | SessionError::ConfigSaveFailed(_)
            | SessionError::CatalogUnavailable(_) => true,
            SessionError::Core(core) => core.is_configuration_error(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(SessionError::persistence("draft-1", DbError::PoolExhausted).is_retryable());
        assert!(SessionError::SaveTimedOut {
            draft_id: "draft-1".into(),
            secs: 10
        }
        .is_retryable());

        assert!(!SessionError::InvalidConfig("bad".into()).is_retryable());
        assert!(!SessionError::UnknownPackage("pkg-x".into()).is_retryable());
        assert!(!SessionError::from(CoreError::InvalidQuantity { quantity: 0 }).is_retryable());
    }

    #[test]
    fn test_config_classification() {
        let empty = CoreError::EmptyPackage {
            package_id: "pkg-empty".into(),
        };
        assert!(SessionError::from(empty).is_config_error());
        assert!(SessionError::CatalogUnavailable("fn-x".into()).is_config_error());
        assert!(!SessionError::DraftNotFound("draft-x".into()).is_config_error());
    }

    #[test]
    fn test_error_display() {
        let err = SessionError::persistence("draft-7", DbError::PoolExhausted);
        assert_eq!(
            err.to_string(),
            "Failed to persist draft draft-7: Connection pool exhausted"
        );
    }
}
