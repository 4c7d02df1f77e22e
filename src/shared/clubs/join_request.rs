//! Club Join Request Data Structure
//!
//! Represents a non-member's intent to join a club. A request starts out
//! `pending` and is resolved exactly once, to `approved` or `denied`.

use super::ids::{ClubId, RequestId, UserId};
use super::membership::UserProfile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a join request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum JoinRequestStatus {
    /// Waiting for a manager
    #[default]
    Pending,
    /// Requester became a member
    Approved,
    /// Request was turned down
    Denied,
}

impl JoinRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JoinRequestStatus::Pending => "pending",
            JoinRequestStatus::Approved => "approved",
            JoinRequestStatus::Denied => "denied",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(JoinRequestStatus::Pending),
            "approved" => Some(JoinRequestStatus::Approved),
            "denied" => Some(JoinRequestStatus::Denied),
            _ => None,
        }
    }

    /// Approved and denied requests never change again
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JoinRequestStatus::Pending)
    }
}

/// A request to join a club
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClubJoinRequest {
    /// Unique request ID
    pub id: RequestId,
    /// Club the request targets
    pub club_id: ClubId,
    /// User asking to join
    pub user_id: UserId,
    /// Display name of the requester
    pub user_name: String,
    /// Email of the requester
    pub user_email: String,
    /// Optional message to the managers
    #[serde(default)]
    pub message: Option<String>,
    /// Current status of the request
    #[serde(default)]
    pub status: JoinRequestStatus,
    /// When the request was created
    pub created_at: DateTime<Utc>,
}

impl ClubJoinRequest {
    /// Create a new pending request for `requester`
    pub fn new(club_id: ClubId, requester: &UserProfile, message: Option<String>) -> Self {
        Self {
            id: RequestId::generate(),
            club_id,
            user_id: requester.id.clone(),
            user_name: requester.display_name.clone(),
            user_email: requester.email.clone(),
            message: message.filter(|m| !m.trim().is_empty()),
            status: JoinRequestStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Check if the request is pending
    pub fn is_pending(&self) -> bool {
        self.status == JoinRequestStatus::Pending
    }

    /// Copy of this request carrying a terminal status
    pub fn resolved(&self, status: JoinRequestStatus) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }
}
