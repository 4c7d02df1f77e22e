//! # Club Registry
//!
//! The single in-process owner of club state. Every other component reads
//! from here and every write goes through [`ClubRegistry::apply_mutation`],
//! which is where `member_count` is recomputed and the roster invariants are
//! enforced.
//!
//! ## Concurrency
//!
//! Each club sits in its own slot behind a mutex, so writes to one club are
//! serialized while different clubs proceed independently. Every write bumps
//! the club's version; the reconciler compares versions to spot backend
//! replies that were overtaken by a newer local change.
//!
//! Events produced by a write are queued in the slot's outbox under the same
//! lock and delivered by whichever caller is currently draining that outbox.
//! Delivery order per club therefore matches write order, and bus handlers may
//! read or even write the club that notified them. The flip side is that a
//! writer racing another thread on the same club can return before its own
//! events have reached subscribers; the draining thread delivers them.

use crate::app::sync::SyncBus;
use crate::shared::{Club, ClubError, ClubId, MembershipChange, MembershipEvent};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

/// A club together with its registry version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedClub {
    pub club: Club,
    pub version: u64,
}

#[derive(Debug)]
struct SlotState {
    current: VersionedClub,
    outbox: VecDeque<MembershipEvent>,
    draining: bool,
}

#[derive(Debug)]
struct ClubSlot {
    state: Mutex<SlotState>,
}

#[derive(Debug, Default)]
struct Slots {
    /// Load order
    order: Vec<ClubId>,
    by_id: HashMap<ClubId, Arc<ClubSlot>>,
}

/// Authoritative holder of all club state
#[derive(Debug)]
pub struct ClubRegistry {
    slots: RwLock<Slots>,
    bus: SyncBus,
}

impl ClubSlot {
    fn new(club: Club) -> Self {
        Self {
            state: Mutex::new(SlotState {
                current: VersionedClub { club, version: 1 },
                outbox: VecDeque::new(),
                draining: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Resets the draining flag if a handler unwinds mid-delivery
struct DrainGuard<'a>(&'a ClubSlot);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().draining = false;
    }
}

impl ClubRegistry {
    /// Create an empty registry publishing on `bus`
    pub fn new(bus: SyncBus) -> Self {
        Self {
            slots: RwLock::new(Slots::default()),
            bus,
        }
    }

    /// Create a registry pre-loaded with `clubs`
    pub fn with_clubs(bus: SyncBus, clubs: Vec<Club>) -> Self {
        let registry = Self::new(bus);
        registry.load(clubs);
        registry
    }

    pub fn bus(&self) -> &SyncBus {
        &self.bus
    }

    /// Current state of a club
    pub fn get_club(&self, club_id: &ClubId) -> Option<Club> {
        self.get_versioned(club_id).map(|v| v.club)
    }

    /// Current state of a club with its version
    pub fn get_versioned(&self, club_id: &ClubId) -> Option<VersionedClub> {
        self.slot(club_id).map(|slot| slot.lock().current.clone())
    }

    pub fn version_of(&self, club_id: &ClubId) -> Option<u64> {
        self.slot(club_id).map(|slot| slot.lock().current.version)
    }

    /// All clubs in load order
    pub fn list_clubs(&self) -> Vec<Club> {
        let slots = self.read_slots();
        slots
            .order
            .iter()
            .filter_map(|id| slots.by_id.get(id))
            .map(|slot| slot.lock().current.club.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.read_slots().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Upsert a fetched snapshot.
    ///
    /// Each club is normalized (managers become members, the count is
    /// recomputed, malformed pending entries are dropped) and replaces any
    /// existing state for the same id. Clubs absent from `clubs` are kept.
    /// Returns the number of clubs loaded.
    pub fn load(&self, clubs: Vec<Club>) -> usize {
        let mut loaded = 0;
        for club in clubs {
            let club = sanitize(club);
            if let Err(error) = club.check_invariants() {
                tracing::warn!("[REGISTRY] skipping club {}: {}", club.id, error);
                continue;
            }

            let (slot, is_new) = {
                let mut slots = self.slots.write().unwrap_or_else(PoisonError::into_inner);
                match slots.by_id.get(&club.id) {
                    Some(slot) => (slot.clone(), false),
                    None => {
                        let slot = Arc::new(ClubSlot::new(club.clone()));
                        slots.order.push(club.id.clone());
                        slots.by_id.insert(club.id.clone(), slot.clone());
                        (slot, true)
                    }
                }
            };

            let version = {
                let mut state = slot.lock();
                if !is_new {
                    state.current = VersionedClub {
                        club: club.clone(),
                        version: state.current.version + 1,
                    };
                }
                let event = MembershipEvent::new(
                    MembershipChange::ClubReloaded {
                        club_id: club.id.clone(),
                        member_ids: club.member_ids().cloned().collect(),
                    },
                    state.current.version,
                );
                state.outbox.push_back(event);
                state.current.version
            };
            tracing::debug!("[REGISTRY] loaded club {} at v{}", club.id, version);

            self.drain(&slot);
            loaded += 1;
        }
        loaded
    }

    /// Apply a write to one club.
    ///
    /// `mutator` receives the current club and returns the replacement, or an
    /// error to abort. It runs under the club's lock, so checks made inside it
    /// see exactly the state the write replaces. The registry recomputes
    /// `member_count`, validates the result and only then stores it; on any
    /// error the club is left untouched.
    ///
    /// The write's events may still be in flight when this returns if another
    /// thread is delivering events for the same club; that thread delivers
    /// them, in order, before it stops.
    pub fn apply_mutation<F>(&self, club_id: &ClubId, mutator: F) -> Result<VersionedClub, ClubError>
    where
        F: FnOnce(&Club) -> Result<Club, ClubError>,
    {
        let slot = self.slot_or_not_found(club_id)?;
        let updated = {
            let mut state = slot.lock();
            let next = mutator(&state.current.club)?;
            store(&mut state, next)?
        };
        self.written(&slot, &updated);
        Ok(updated)
    }

    /// Like [`apply_mutation`](Self::apply_mutation), but `mutator` may
    /// return `None` to leave the club alone. A replacement equal to the
    /// current club is skipped too, so no-op writes never bump the version.
    pub fn apply_if_changed<F>(&self, club_id: &ClubId, mutator: F) -> Result<Option<VersionedClub>, ClubError>
    where
        F: FnOnce(&Club) -> Result<Option<Club>, ClubError>,
    {
        self.write_if(club_id, None, mutator)
    }

    /// Like [`apply_if_changed`](Self::apply_if_changed), but only while the
    /// club is still at `expected_version`. Returns `Ok(None)` without calling
    /// `mutator` once the club has moved on.
    pub fn apply_mutation_at<F>(
        &self,
        club_id: &ClubId,
        expected_version: u64,
        mutator: F,
    ) -> Result<Option<VersionedClub>, ClubError>
    where
        F: FnOnce(&Club) -> Result<Option<Club>, ClubError>,
    {
        self.write_if(club_id, Some(expected_version), mutator)
    }

    fn write_if<F>(
        &self,
        club_id: &ClubId,
        expected_version: Option<u64>,
        mutator: F,
    ) -> Result<Option<VersionedClub>, ClubError>
    where
        F: FnOnce(&Club) -> Result<Option<Club>, ClubError>,
    {
        let slot = self.slot_or_not_found(club_id)?;
        let updated = {
            let mut state = slot.lock();
            if let Some(expected) = expected_version {
                if state.current.version != expected {
                    tracing::debug!(
                        "[REGISTRY] skipping write to club {}: expected v{}, at v{}",
                        club_id,
                        expected,
                        state.current.version
                    );
                    return Ok(None);
                }
            }
            let Some(mut next) = mutator(&state.current.club)? else {
                return Ok(None);
            };
            next.member_count = next.members.len();
            if next == state.current.club {
                return Ok(None);
            }
            store(&mut state, next)?
        };
        self.written(&slot, &updated);
        Ok(Some(updated))
    }

    fn written(&self, slot: &ClubSlot, updated: &VersionedClub) {
        tracing::debug!(
            "[REGISTRY] club {} now v{} with {} members",
            updated.club.id,
            updated.version,
            updated.club.member_count
        );
        self.drain(slot);
    }

    /// Deliver queued events unless another caller is already doing so
    fn drain(&self, slot: &ClubSlot) {
        {
            let mut state = slot.lock();
            if state.draining {
                return;
            }
            state.draining = true;
        }
        let guard = DrainGuard(slot);

        loop {
            let next = {
                let mut state = slot.lock();
                let next = state.outbox.pop_front();
                if next.is_none() {
                    // Cleared under the same lock a writer checks, so no event
                    // can be left behind in the outbox.
                    state.draining = false;
                }
                next
            };
            match next {
                Some(event) => {
                    self.bus.publish(event);
                }
                None => break,
            }
        }
        std::mem::forget(guard);
    }

    fn slot(&self, club_id: &ClubId) -> Option<Arc<ClubSlot>> {
        self.read_slots().by_id.get(club_id).cloned()
    }

    fn slot_or_not_found(&self, club_id: &ClubId) -> Result<Arc<ClubSlot>, ClubError> {
        self.slot(club_id).ok_or_else(|| ClubError::not_found("club", club_id))
    }

    fn read_slots(&self) -> std::sync::RwLockReadGuard<'_, Slots> {
        self.slots.read().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Validate `next`, bump the version and queue the diff events.
/// Leaves `state` untouched on error.
fn store(state: &mut SlotState, mut next: Club) -> Result<VersionedClub, ClubError> {
    if next.id != state.current.club.id {
        return Err(ClubError::invariant(format!(
            "a write to club '{}' tried to change its id to '{}'",
            state.current.club.id, next.id
        )));
    }
    next.member_count = next.members.len();
    next.check_invariants()?;

    let version = state.current.version + 1;
    let events = diff_events(&state.current.club, &next, version);
    state.current = VersionedClub { club: next, version };
    state.outbox.extend(events);
    Ok(state.current.clone())
}

/// Bring a fetched club into a shape the invariants accept
fn sanitize(club: Club) -> Club {
    let mut club = club.normalized();
    let club_id = club.id.clone();
    let mut seen = std::collections::HashSet::new();
    club.pending_requests.retain(|request| {
        request.is_pending() && request.club_id == club_id && seen.insert(request.user_id.clone())
    });
    club
}

/// Events describing the difference between two states of one club
fn diff_events(before: &Club, after: &Club, version: u64) -> Vec<MembershipEvent> {
    let club_id = &after.id;
    let mut events = Vec::new();

    for user_id in after.member_ids().filter(|u| !before.has_member(u)) {
        events.push(MembershipEvent::member_joined(club_id.clone(), user_id.clone(), version));
    }
    for user_id in before.member_ids().filter(|u| !after.has_member(u)) {
        events.push(MembershipEvent::member_left(club_id.clone(), user_id.clone(), version));
    }

    for request in &after.pending_requests {
        if before.find_request(request.id).is_none() {
            events.push(MembershipEvent::new(
                MembershipChange::RequestOpened {
                    club_id: club_id.clone(),
                    request_id: request.id,
                    user_id: request.user_id.clone(),
                },
                version,
            ));
        }
    }
    for request in &before.pending_requests {
        if after.find_request(request.id).is_none() {
            let approved = after.has_member(&request.user_id) && !before.has_member(&request.user_id);
            events.push(MembershipEvent::new(
                MembershipChange::RequestClosed {
                    club_id: club_id.clone(),
                    request_id: request.id,
                    user_id: request.user_id.clone(),
                    approved,
                },
                version,
            ));
        }
    }

    events
}
