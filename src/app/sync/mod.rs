//! # Membership Synchronization
//!
//! Keeps independent screens in agreement about club rosters without a shared
//! store.
//!
//! ## Key Components
//!
//! - `bus.rs`: typed, synchronous publish/subscribe channel owned next to the
//!   registry
//! - `mirror.rs`: per-screen roster cache that applies bus events with one
//!   deterministic rule
//!
//! The registry publishes after every successful write; mirrors that missed an
//! event (because they subscribed late) recover on the next full fetch, which
//! arrives as a `ClubReloaded` event.

pub mod bus;
pub mod mirror;

pub use bus::{EventHandler, Subscription, SyncBus};
pub use mirror::{MembershipMirror, MirroredClub};
