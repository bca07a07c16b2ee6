//! Unified error handling for the warden.
//!
//! Every privileged operation and every enforcement decision reports failures
//! through [`ModerationError`]. Each variant knows whether the caller gets to
//! see it and, if so, which notice text it turns into.

use crate::db::DbError;
use thiserror::Error;

/// Generic text for failures whose details stay in the log.
pub const GENERIC_FAILURE: &str = "An error occurred.";

/// Errors produced by the moderation core.
#[derive(Debug, Error)]
pub enum ModerationError {
    /// Role or channel-scope check failed, or the caller has no account.
    #[error("permission denied")]
    PermissionDenied,

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// A channel-scoped command was invoked without its channel argument.
    #[error("no channel given")]
    MissingChannelArgument,

    #[error("username already in use: {0}")]
    DuplicateRegistration(String),

    /// Lookup miss on a mutation target.
    #[error("{0} is not registered")]
    RecordNotFound(String),

    /// Bad arity or value; carries the usage line shown to the caller.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    /// Record store I/O failure.
    #[error("store failure: {0}")]
    Store(#[from] DbError),

    /// A channel the warden joined has no policy row.
    #[error("no policy for channel {0}")]
    PolicyMissing(String),
}

impl ModerationError {
    /// Get a static error code string for log labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission_denied",
            Self::UnknownCommand(_) => "unknown_command",
            Self::MissingChannelArgument => "missing_channel_argument",
            Self::DuplicateRegistration(_) => "duplicate_registration",
            Self::RecordNotFound(_) => "record_not_found",
            Self::InvalidArguments(_) => "invalid_arguments",
            Self::InvalidPattern(_) => "invalid_pattern",
            Self::Store(_) => "store_failure",
            Self::PolicyMissing(_) => "policy_missing",
        }
    }

    /// Text of the private notice sent to the caller.
    ///
    /// Returns `None` for internal invariant violations, which are only logged.
    pub fn user_notice(&self) -> Option<String> {
        let text = match self {
            Self::PermissionDenied => "Permission denied!".to_string(),
            Self::UnknownCommand(_) => "Unknown command!".to_string(),
            Self::MissingChannelArgument => "No channel given!".to_string(),
            Self::DuplicateRegistration(_) => "Username already in use.".to_string(),
            Self::RecordNotFound(name) => format!("{} is not registered!", name),
            Self::InvalidArguments(usage) => format!("Usage: {}", usage),
            Self::InvalidPattern(pattern) => format!("Invalid pattern: {}", pattern),
            Self::Store(_) => GENERIC_FAILURE.to_string(),
            Self::PolicyMissing(_) => return None,
        };
        Some(text)
    }

    /// Whether the failure is an operational problem rather than a caller
    /// mistake. Those are logged at `warn`/`error`; the rest at `debug`.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Store(_) | Self::PolicyMissing(_))
    }
}

/// Result type for moderation operations.
pub type ModerationResult<T> = Result<T, ModerationError>;
