//! Built-in demo clubs.
//!
//! Shown on a first run when neither the backend nor a cached snapshot is
//! available. The data is fixed so every install sees the same clubs.

use crate::app::clubs::queries;
use crate::shared::clubs::{ActivityCategory, UserClubMembership};
use crate::shared::{Club, UserId};
use chrono::{DateTime, Utc};

/// 2024-05-01T08:00:00Z
const SEED_CREATED_AT: i64 = 1_714_550_400;

fn seed_time() -> DateTime<Utc> {
    DateTime::from_timestamp(SEED_CREATED_AT, 0).unwrap_or_default()
}

fn seed_club(id: &str, name: &str, manager: &str, members: &[&str]) -> Club {
    let mut club = Club::new(id, name, UserId::new(manager));
    club.created_at = seed_time();
    club.members = std::iter::once(manager)
        .chain(members.iter().copied())
        .map(|user| (UserId::new(user), seed_time()))
        .collect();
    club.normalized()
}

/// The fixed demo clubs
pub fn demo_clubs() -> Vec<Club> {
    vec![
        seed_club("seed-trail-runners", "Trail Runners", "seed-ana", &["seed-ben", "seed-caro"])
            .with_category(ActivityCategory::Running)
            .with_location("Bilbao")
            .with_description("Early morning trail runs every weekend."),
        seed_club("seed-sunday-riders", "Sunday Riders", "seed-ben", &["seed-dani"])
            .with_category(ActivityCategory::Cycling)
            .with_location("Donostia")
            .with_description("Relaxed road rides, coffee stop included."),
        seed_club("seed-padel-night", "Padel Night", "seed-caro", &[])
            .with_category(ActivityCategory::Padel)
            .with_location("Vitoria")
            .with_description("Weeknight doubles for all levels."),
    ]
}

/// Memberships of `user_id` in the demo clubs
pub fn demo_memberships(user_id: &UserId) -> Vec<UserClubMembership> {
    queries::memberships_for(&demo_clubs(), user_id)
}
