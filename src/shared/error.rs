//! Shared Error Types
//!
//! This module defines the error taxonomy for club membership governance.
//! Every failure carries a human-readable reason that can be shown to the user
//! as-is.
//!
//! # Error Categories
//!
//! - `NotFound` - Referenced club, request or member is absent
//! - `InvariantViolation` - A write would break `managers ⊆ members`
//! - `PermissionDenied` - A non-manager attempted a manager-only operation
//! - `AlreadyMember` / `DuplicateRequest` - Redundant join attempts
//! - `LastManagerProtected` - Removal would leave a club without managers
//! - `RemoteFailure` - Network or backend error (retryable)
//!
//! Precondition failures are produced locally and never reach the network.
//! Only `RemoteFailure` is worth retrying, and retries are always initiated by
//! the caller re-issuing the same operation.
//!
//! # Usage
//!
//! ```rust
//! use clubhub::shared::error::ClubError;
//!
//! let error = ClubError::not_found("club", "c-trail-runners");
//! assert!(!error.is_retryable());
//! ```
use thiserror::Error;

/// Errors produced by the membership core
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ClubError {
    /// Referenced entity does not exist
    #[error("{entity} '{id}' was not found")]
    NotFound {
        /// Kind of entity ("club", "request", "member")
        entity: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// A mutation would leave a club in an inconsistent state
    #[error("Club state rejected: {message}")]
    InvariantViolation {
        /// Human-readable error message
        message: String,
    },

    /// The acting user lacks the rights for this operation
    #[error("User '{user_id}' is not allowed to {action}")]
    PermissionDenied {
        /// Acting user
        user_id: String,
        /// What they tried to do
        action: String,
    },

    /// The user already belongs to the club
    #[error("User '{user_id}' is already a member of club '{club_id}'")]
    AlreadyMember {
        /// Club that was targeted
        club_id: String,
        /// User that tried to join
        user_id: String,
    },

    /// The user already has an outstanding request for the club
    #[error("User '{user_id}' already has a pending request for club '{club_id}'")]
    DuplicateRequest {
        /// Club that was targeted
        club_id: String,
        /// User that tried to join
        user_id: String,
    },

    /// Removing this user would leave the club without any manager
    #[error("User '{user_id}' is the last manager of club '{club_id}' and cannot be removed")]
    LastManagerProtected {
        /// Club that would become manager-less
        club_id: String,
        /// The sole manager
        user_id: String,
    },

    /// Network or backend failure, including timeouts
    #[error("Remote call failed: {message}")]
    RemoteFailure {
        /// Human-readable error message
        message: String,
    },
}

impl ClubError {
    /// Create a new not-found error
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create a new invariant violation
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Create a new permission error
    pub fn permission_denied(user_id: impl ToString, action: impl Into<String>) -> Self {
        Self::PermissionDenied {
            user_id: user_id.to_string(),
            action: action.into(),
        }
    }

    /// Create a new already-member error
    pub fn already_member(club_id: impl ToString, user_id: impl ToString) -> Self {
        Self::AlreadyMember {
            club_id: club_id.to_string(),
            user_id: user_id.to_string(),
        }
    }

    /// Create a new duplicate request error
    pub fn duplicate_request(club_id: impl ToString, user_id: impl ToString) -> Self {
        Self::DuplicateRequest {
            club_id: club_id.to_string(),
            user_id: user_id.to_string(),
        }
    }

    /// Create a new last-manager error
    pub fn last_manager(club_id: impl ToString, user_id: impl ToString) -> Self {
        Self::LastManagerProtected {
            club_id: club_id.to_string(),
            user_id: user_id.to_string(),
        }
    }

    /// Create a new remote failure
    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteFailure {
            message: message.into(),
        }
    }

    /// Whether re-issuing the same operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RemoteFailure { .. })
    }
}

impl From<serde_json::Error> for ClubError {
    fn from(err: serde_json::Error) -> Self {
        Self::remote(format!("Malformed response: {}", err))
    }
}

impl From<reqwest::Error> for ClubError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::remote(format!("Request timed out: {}", err))
        } else {
            Self::remote(format!("Network error: {}", err))
        }
    }
}
