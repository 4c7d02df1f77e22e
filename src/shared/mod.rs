//! Shared Module
//!
//! This module contains types and data structures that are shared between the
//! membership core and the backend it talks to. These types are used for
//! serialization over the club API and for the local snapshot cache.
//!
//! # Overview
//!
//! The shared module provides platform-agnostic types: clubs, join requests,
//! roles, bus events, errors and configuration. None of them perform I/O.

/// Club, request and membership types
pub mod clubs;

/// Membership events published on the sync bus
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use clubs::{Club, ClubId, ClubJoinRequest, JoinRequestStatus, RequestId, Role, UserId, UserProfile};
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::ClubError;
pub use event::{EventKind, MembershipChange, MembershipEvent};
