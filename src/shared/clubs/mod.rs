//! Clubs Module
//!
//! This module contains all the data structures for club membership:
//!
//! - `Club` - A club and its roster
//! - `ClubJoinRequest` - A request to join a club
//! - `Role` / `UserClubMembership` - A user's standing and derived membership list
//! - `MembershipAck` - The backend's answer to a membership write
//!
//! # Usage
//!
//! ```rust
//! use clubhub::shared::clubs::{Club, ClubJoinRequest, Role, UserId};
//! ```

pub mod api;
pub mod club;
pub mod ids;
pub mod join_request;
pub mod membership;

// Re-export all types
pub use api::{JoinClubRequest, ListClubsResponse, ListMembershipsResponse, MembershipAck};
pub use club::{ActivityCategory, Club};
pub use ids::{ClubId, RequestId, UserId};
pub use join_request::{ClubJoinRequest, JoinRequestStatus};
pub use membership::{Role, UserClubMembership, UserProfile};
