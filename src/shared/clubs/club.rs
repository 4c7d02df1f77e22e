//! Club Data Structure
//!
//! A club owns its roster: the manager set, the member map (user → joined at)
//! and the list of outstanding join requests. `member_count` is a cached copy
//! of `members.len()` kept for display and for the wire format; the registry
//! recomputes it on every write and it is never edited on its own.

use super::ids::{ClubId, RequestId, UserId};
use super::join_request::ClubJoinRequest;
use crate::shared::error::ClubError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Activity type a club is organised around
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityCategory {
    Running,
    Cycling,
    Hiking,
    Swimming,
    Climbing,
    Yoga,
    Football,
    Basketball,
    Tennis,
    Padel,
    #[default]
    Other,
}

impl ActivityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityCategory::Running => "running",
            ActivityCategory::Cycling => "cycling",
            ActivityCategory::Hiking => "hiking",
            ActivityCategory::Swimming => "swimming",
            ActivityCategory::Climbing => "climbing",
            ActivityCategory::Yoga => "yoga",
            ActivityCategory::Football => "football",
            ActivityCategory::Basketball => "basketball",
            ActivityCategory::Tennis => "tennis",
            ActivityCategory::Padel => "padel",
            ActivityCategory::Other => "other",
        }
    }
}

/// A club and its membership roster
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Club {
    pub id: ClubId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: ActivityCategory,
    #[serde(default)]
    pub location: String,
    /// Users with elevated rights; always a subset of `members`
    #[serde(default)]
    pub manager_ids: BTreeSet<UserId>,
    /// Members keyed by user id, valued by join time
    #[serde(default)]
    pub members: BTreeMap<UserId, DateTime<Utc>>,
    /// Outstanding requests, all with status `pending`
    #[serde(default)]
    pub pending_requests: Vec<ClubJoinRequest>,
    /// Cached `members.len()`
    #[serde(default)]
    pub member_count: usize,
    pub created_at: DateTime<Utc>,
}

impl Club {
    /// Create an empty club managed by `founder`
    pub fn new(id: impl Into<ClubId>, name: impl Into<String>, founder: UserId) -> Self {
        let now = Utc::now();
        let mut members = BTreeMap::new();
        members.insert(founder.clone(), now);
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            category: ActivityCategory::Other,
            location: String::new(),
            manager_ids: BTreeSet::from([founder]),
            members,
            pending_requests: Vec::new(),
            member_count: 1,
            created_at: now,
        }
    }

    pub fn with_category(mut self, category: ActivityCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Iterate over the ids of all members, managers included
    pub fn member_ids(&self) -> impl Iterator<Item = &UserId> {
        self.members.keys()
    }

    pub fn has_member(&self, user_id: &UserId) -> bool {
        self.members.contains_key(user_id)
    }

    pub fn has_manager(&self, user_id: &UserId) -> bool {
        self.manager_ids.contains(user_id)
    }

    /// The pending request of `user_id`, if any
    pub fn pending_request_of(&self, user_id: &UserId) -> Option<&ClubJoinRequest> {
        self.pending_requests
            .iter()
            .find(|r| r.is_pending() && &r.user_id == user_id)
    }

    pub fn find_request(&self, request_id: RequestId) -> Option<&ClubJoinRequest> {
        self.pending_requests.iter().find(|r| r.id == request_id)
    }

    /// Managers are implicitly members; make that explicit and refresh the count
    pub fn normalized(mut self) -> Self {
        for manager in &self.manager_ids {
            self.members
                .entry(manager.clone())
                .or_insert(self.created_at);
        }
        self.member_count = self.members.len();
        self
    }

    /// Verify the roster invariants
    pub fn check_invariants(&self) -> Result<(), ClubError> {
        if let Some(stray) = self.manager_ids.iter().find(|m| !self.members.contains_key(*m)) {
            return Err(ClubError::invariant(format!(
                "manager '{}' of club '{}' is not a member",
                stray, self.id
            )));
        }

        if self.member_count != self.members.len() {
            return Err(ClubError::invariant(format!(
                "club '{}' reports {} members but lists {}",
                self.id,
                self.member_count,
                self.members.len()
            )));
        }

        let mut requesters = HashSet::new();
        for request in &self.pending_requests {
            if !request.is_pending() {
                return Err(ClubError::invariant(format!(
                    "request '{}' in club '{}' is {} but still listed as pending",
                    request.id,
                    self.id,
                    request.status.as_str()
                )));
            }
            if request.club_id != self.id {
                return Err(ClubError::invariant(format!(
                    "request '{}' belongs to club '{}', not '{}'",
                    request.id, request.club_id, self.id
                )));
            }
            if !requesters.insert(&request.user_id) {
                return Err(ClubError::invariant(format!(
                    "user '{}' has more than one pending request for club '{}'",
                    request.user_id, self.id
                )));
            }
        }

        Ok(())
    }
}
