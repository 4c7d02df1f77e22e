//! Roles and the per-user membership view.

use super::ids::{ClubId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A user's standing in a club.
///
/// Ordered by capability: `NonMember < Member < Manager`. A manager is always
/// a member as well.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    NonMember,
    Member,
    Manager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::NonMember => "non_member",
            Role::Member => "member",
            Role::Manager => "manager",
        }
    }

    pub fn is_member(&self) -> bool {
        *self >= Role::Member
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the signed-in user, provided by authentication
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
}

impl UserProfile {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            display_name: display_name.into(),
            email: email.into(),
        }
    }
}

/// One entry of a user's derived membership list
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserClubMembership {
    /// Club the user belongs to
    pub club_id: ClubId,
    /// Display name of the club
    pub club_name: String,
    /// Either `Member` or `Manager`
    pub role: Role,
    /// When the user joined
    pub joined_at: DateTime<Utc>,
}
