//! # Offline Support
//!
//! Keeps the registry usable when the backend is slow or unreachable.
//!
//! ## Architecture
//!
//! - **Optimistic writes**: the lifecycle changes the registry first and
//!   calls the backend second
//! - **Reconciliation**: backend acks are adopted unless a newer local write
//!   overtook them
//! - **Fallback reads**: live data, then the cached snapshot, then demo data
//!
//! ## Key Components
//!
//! - `reconciliation.rs`: the `Reconciler` and its reply and read types

pub mod reconciliation;

pub use reconciliation::{DataSource, Fetched, Reconciler, RemoteReply};
