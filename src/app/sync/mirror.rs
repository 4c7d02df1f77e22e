//! # Membership Mirror
//!
//! A screen-local cache of club rosters kept current by bus events. Each
//! feature area can own one; they never write back to the registry.
//!
//! Update rule, identical for every mirror:
//! - `MemberJoined` adds the user
//! - `MemberLeft` removes the user
//! - `ClubReloaded` replaces the whole roster
//!
//! Counts are always derived from the mirrored member set, so two mirrors that
//! saw the same events report the same numbers.

use super::bus::{Subscription, SyncBus};
use crate::shared::{Club, ClubId, EventKind, MembershipChange, MembershipEvent, UserId};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, PoisonError};

/// Mirrored roster of one club
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MirroredClub {
    pub member_ids: BTreeSet<UserId>,
    /// Registry version of the last applied event
    pub version: u64,
}

impl MirroredClub {
    pub fn member_count(&self) -> usize {
        self.member_ids.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MembershipMirror {
    clubs: Arc<Mutex<HashMap<ClubId, MirroredClub>>>,
}

impl MembershipMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `clubs` from a full snapshot
    pub fn seed<'a>(&self, clubs: impl IntoIterator<Item = &'a Club>) {
        let mut mirrored = self.lock();
        for club in clubs {
            mirrored.insert(
                club.id.clone(),
                MirroredClub {
                    member_ids: club.member_ids().cloned().collect(),
                    version: 0,
                },
            );
        }
    }

    /// Subscribe to the roster events on `bus`
    pub fn attach(&self, bus: &SyncBus) -> Vec<Subscription> {
        [EventKind::MemberJoined, EventKind::MemberLeft, EventKind::ClubReloaded]
            .into_iter()
            .map(|kind| {
                let mirror = self.clone();
                bus.subscribe(kind, move |event| mirror.apply(event))
            })
            .collect()
    }

    /// Apply one event to the mirrored state
    pub fn apply(&self, event: &MembershipEvent) {
        let mut mirrored = self.lock();
        match &event.change {
            MembershipChange::MemberJoined { club_id, user_id } => {
                if let Some(club) = mirrored.get_mut(club_id) {
                    club.member_ids.insert(user_id.clone());
                    club.version = club.version.max(event.version);
                } else {
                    tracing::trace!("[BUS] mirror ignores join for untracked club {}", club_id);
                }
            }
            MembershipChange::MemberLeft { club_id, user_id } => {
                if let Some(club) = mirrored.get_mut(club_id) {
                    club.member_ids.remove(user_id);
                    club.version = club.version.max(event.version);
                }
            }
            MembershipChange::ClubReloaded { club_id, member_ids } => {
                mirrored.insert(
                    club_id.clone(),
                    MirroredClub {
                        member_ids: member_ids.iter().cloned().collect(),
                        version: event.version,
                    },
                );
            }
            MembershipChange::RequestOpened { .. } | MembershipChange::RequestClosed { .. } => {}
        }
    }

    /// Mirrored member count; zero for clubs this mirror does not track
    pub fn member_count(&self, club_id: &ClubId) -> usize {
        self.lock()
            .get(club_id)
            .map(MirroredClub::member_count)
            .unwrap_or(0)
    }

    pub fn is_member(&self, club_id: &ClubId, user_id: &UserId) -> bool {
        self.lock()
            .get(club_id)
            .is_some_and(|club| club.member_ids.contains(user_id))
    }

    pub fn snapshot(&self, club_id: &ClubId) -> Option<MirroredClub> {
        self.lock().get(club_id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ClubId, MirroredClub>> {
        self.clubs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
