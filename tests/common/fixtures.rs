//! Shared fixtures: users, clubs and a fully wired membership stack

use super::fake_backend::FakeBackend;
use clubhub::app::clubs::{ClubRegistry, RequestLifecycle};
use clubhub::app::offline::Reconciler;
use clubhub::app::sync::SyncBus;
use clubhub::shared::{Club, ClubId, UserProfile};
use std::sync::Arc;
use std::time::Duration;

/// Timeout used by test stacks
pub const TEST_TIMEOUT: Duration = Duration::from_millis(200);

pub fn alice() -> UserProfile {
    UserProfile::new("user-a", "Alice", "alice@example.com")
}

pub fn bob() -> UserProfile {
    UserProfile::new("user-b", "Bob", "bob@example.com")
}

pub fn carol() -> UserProfile {
    UserProfile::new("user-c", "Carol", "carol@example.com")
}

pub fn c1() -> ClubId {
    ClubId::new("c1")
}

/// Club `c1`, managed by Alice and nobody else
pub fn club_c1() -> Club {
    Club::new(c1(), "Trail Runners", alice().id)
}

/// Registry, bus, reconciler and lifecycle over a [`FakeBackend`]
pub struct Stack {
    pub bus: SyncBus,
    pub registry: Arc<ClubRegistry>,
    pub lifecycle: RequestLifecycle<FakeBackend>,
}

impl Stack {
    /// Backend and registry both start from `clubs`; Alice is signed in
    pub fn new(clubs: Vec<Club>) -> Self {
        Self::with_timeout(clubs, TEST_TIMEOUT)
    }

    pub fn with_timeout(clubs: Vec<Club>, timeout: Duration) -> Self {
        let bus = SyncBus::new();
        let registry = Arc::new(ClubRegistry::with_clubs(bus.clone(), clubs.clone()));
        let backend = FakeBackend::new(alice(), clubs);
        let lifecycle = RequestLifecycle::new(Reconciler::new(backend, registry.clone(), timeout));
        Self {
            bus,
            registry,
            lifecycle,
        }
    }

    pub fn backend(&self) -> &FakeBackend {
        self.lifecycle.reconciler().backend()
    }

    /// Current registry state of a club that must exist
    pub fn club(&self, club_id: &ClubId) -> Club {
        self.registry
            .get_club(club_id)
            .unwrap_or_else(|| panic!("club {} is not loaded", club_id))
    }
}
