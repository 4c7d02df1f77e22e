/**
 * Membership Event System
 *
 * This module defines the events published on the synchronization bus whenever
 * the club registry changes. Independent UI surfaces subscribe to them to keep
 * their partial views in step without a round trip to the backend.
 *
 * Every event carries the registry version of the club after the change, so a
 * subscriber can tell which state it reflects.
 */
use crate::shared::clubs::{ClubId, RequestId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of membership event, used as the subscription key
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    MemberJoined,
    MemberLeft,
    RequestOpened,
    RequestClosed,
    ClubReloaded,
}

/// What changed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MembershipChange {
    /// A user became a member
    MemberJoined { club_id: ClubId, user_id: UserId },
    /// A user stopped being a member
    MemberLeft { club_id: ClubId, user_id: UserId },
    /// A join request was created
    RequestOpened {
        club_id: ClubId,
        request_id: RequestId,
        user_id: UserId,
    },
    /// A join request left the pending list; `approved` when the requester
    /// became a member in the same write
    RequestClosed {
        club_id: ClubId,
        request_id: RequestId,
        user_id: UserId,
        approved: bool,
    },
    /// The club was replaced by a fetched snapshot
    ClubReloaded {
        club_id: ClubId,
        member_ids: Vec<UserId>,
    },
}

/// Membership event delivered to bus subscribers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MembershipEvent {
    /// The change itself
    pub change: MembershipChange,
    /// Registry version of the club after the change
    pub version: u64,
    /// When the change was applied locally
    pub timestamp: DateTime<Utc>,
}

impl MembershipChange {
    pub fn kind(&self) -> EventKind {
        match self {
            MembershipChange::MemberJoined { .. } => EventKind::MemberJoined,
            MembershipChange::MemberLeft { .. } => EventKind::MemberLeft,
            MembershipChange::RequestOpened { .. } => EventKind::RequestOpened,
            MembershipChange::RequestClosed { .. } => EventKind::RequestClosed,
            MembershipChange::ClubReloaded { .. } => EventKind::ClubReloaded,
        }
    }

    pub fn club_id(&self) -> &ClubId {
        match self {
            MembershipChange::MemberJoined { club_id, .. }
            | MembershipChange::MemberLeft { club_id, .. }
            | MembershipChange::RequestOpened { club_id, .. }
            | MembershipChange::RequestClosed { club_id, .. }
            | MembershipChange::ClubReloaded { club_id, .. } => club_id,
        }
    }
}

impl MembershipEvent {
    /// Create a new event for a change at `version`
    pub fn new(change: MembershipChange, version: u64) -> Self {
        Self {
            change,
            version,
            timestamp: Utc::now(),
        }
    }

    /// Create a member-joined event
    pub fn member_joined(club_id: ClubId, user_id: UserId, version: u64) -> Self {
        Self::new(MembershipChange::MemberJoined { club_id, user_id }, version)
    }

    /// Create a member-left event
    pub fn member_left(club_id: ClubId, user_id: UserId, version: u64) -> Self {
        Self::new(MembershipChange::MemberLeft { club_id, user_id }, version)
    }

    pub fn kind(&self) -> EventKind {
        self.change.kind()
    }

    pub fn club_id(&self) -> &ClubId {
        self.change.club_id()
    }
}
