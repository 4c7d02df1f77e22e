//! Club membership: the registry, pure queries over it, the request
//! lifecycle and the backend client.

pub mod club_api;
pub mod lifecycle;
pub mod queries;
pub mod registry;

pub use club_api::{ClubBackend, HttpClubBackend};
pub use lifecycle::RequestLifecycle;
pub use registry::{ClubRegistry, VersionedClub};
