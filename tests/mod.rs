//! Test suite for ClubHub
//!
//! This module organizes all tests

pub mod common;
pub mod property;
