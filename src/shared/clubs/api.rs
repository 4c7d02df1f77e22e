//! Request and response bodies exchanged with the club backend.

use super::club::Club;
use super::ids::{ClubId, RequestId, UserId};
use super::membership::{Role, UserClubMembership};
use crate::shared::error::ClubError;
use serde::{Deserialize, Serialize};

/// Body of `POST /clubs/{id}/join`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct JoinClubRequest {
    /// Optional message for the managers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Response for listing clubs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListClubsResponse {
    pub clubs: Vec<Club>,
}

/// Response for listing a user's memberships
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMembershipsResponse {
    pub memberships: Vec<UserClubMembership>,
}

/// Result of any membership write.
///
/// Carries the server's view of the affected user so the client can
/// reconcile instead of trusting its optimistic guess.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MembershipAck {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    pub club_id: ClubId,
    /// User whose membership the write affected
    pub user_id: UserId,
    /// Role of `user_id` after the write
    pub role: Role,
    /// Outstanding request of `user_id`, if the server queued one
    #[serde(default)]
    pub pending_request_id: Option<RequestId>,
    /// Server-side member count; advisory only
    #[serde(default)]
    pub member_count: usize,
}

impl MembershipAck {
    /// A successful ack for `user_id` ending up with `role`
    pub fn ok(club_id: ClubId, user_id: UserId, role: Role) -> Self {
        Self {
            success: true,
            error: None,
            club_id,
            user_id,
            role,
            pending_request_id: None,
            member_count: 0,
        }
    }

    pub fn with_pending_request(mut self, request_id: RequestId) -> Self {
        self.pending_request_id = Some(request_id);
        self
    }

    pub fn with_member_count(mut self, member_count: usize) -> Self {
        self.member_count = member_count;
        self
    }

    /// Turn a `success: false` body into an error
    pub fn into_result(self) -> Result<Self, ClubError> {
        if self.success {
            Ok(self)
        } else {
            Err(ClubError::remote(
                self.error
                    .unwrap_or_else(|| "Backend rejected the request".to_string()),
            ))
        }
    }
}
