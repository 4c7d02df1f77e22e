//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - An in-memory club backend
//! - User, club and stack fixtures
//! - Mock HTTP server helpers
//! - Custom assertion macros

pub mod assertions;
pub mod fake_backend;
pub mod fixtures;

// Re-export commonly used utilities
pub use fake_backend::*;
pub use fixtures::*;
pub use mock_server::*;
