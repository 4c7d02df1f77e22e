//! ClubHub - Membership Core
//!
//! ClubHub is a social app for finding and joining sports and outdoor clubs.
//! This library holds the part of it with real rules attached: club membership
//! governance. It decides how a user's role in a club changes, how join
//! requests are opened and resolved, how every screen agrees on the member
//! count, and how optimistic local changes line up with the backend.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared with the backend
//!   - Clubs, join requests, roles, membership acks
//!   - Membership events
//!   - Error and configuration types
//!
//! - **`app`** - The client-side core
//!   - `clubs::registry` - single owner of all club state
//!   - `clubs::queries` - pure role and count helpers
//!   - `clubs::lifecycle` - join, approve, deny and removal operations
//!   - `sync` - in-process publish/subscribe bus and mirrors
//!   - `offline` - backend reconciliation with a cached read fallback
//!   - `local_db` - SQLite snapshot cache
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use clubhub::app::clubs::{queries, ClubRegistry, HttpClubBackend, RequestLifecycle};
//! use clubhub::app::offline::Reconciler;
//! use clubhub::app::sync::SyncBus;
//! use clubhub::app::Config;
//! use clubhub::shared::{ClubId, UserProfile};
//!
//! # async fn example() -> Result<(), clubhub::shared::ClubError> {
//! let config = Config::new();
//! let bus = SyncBus::new();
//! let registry = Arc::new(ClubRegistry::new(bus.clone()));
//! let backend = HttpClubBackend::new(config.clone());
//! let reconciler = Reconciler::new(backend, registry.clone(), config.request_timeout());
//! let lifecycle = RequestLifecycle::new(reconciler);
//!
//! let me = UserProfile::new("u-42", "Sam", "sam@example.com");
//! lifecycle.reconciler().refresh_registry(&me.id).await?;
//!
//! let club_id = ClubId::new("trail-runners");
//! lifecycle.request_to_join(&club_id, &me, Some("Hi!".to_string())).await?;
//! let club = registry.get_club(&club_id);
//! println!("pending: {}", queries::pending_count_of(club.as_ref()));
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! - The registry serializes writes per club behind a mutex and is shared as
//!   `Arc<ClubRegistry>`
//! - Bus handlers run synchronously on the publishing thread
//! - Only backend calls suspend; they run on tokio

/// Shared types and data structures
pub mod shared;

/// Client-side membership core
pub mod app;
