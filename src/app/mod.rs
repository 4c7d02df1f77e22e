//! Client-side membership core.

pub mod clubs;
pub mod config;
pub mod local_db;
pub mod offline;
pub mod seed;
pub mod sync;

pub use config::Config;
