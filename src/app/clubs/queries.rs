//! Membership queries.
//!
//! Pure, total functions over a club snapshot. They take `Option<&Club>` so
//! screens can ask about clubs that have not loaded yet: a missing club
//! answers `NonMember` and zero rather than an error.

use crate::shared::clubs::UserClubMembership;
use crate::shared::{Club, ClubJoinRequest, Role, UserId};

/// Role of `user_id` in `club`
pub fn role_of(club: Option<&Club>, user_id: &UserId) -> Role {
    match club {
        Some(club) if club.has_manager(user_id) => Role::Manager,
        Some(club) if club.has_member(user_id) => Role::Member,
        _ => Role::NonMember,
    }
}

pub fn is_manager(club: Option<&Club>, user_id: &UserId) -> bool {
    role_of(club, user_id) == Role::Manager
}

/// True for members and managers alike
pub fn is_member(club: Option<&Club>, user_id: &UserId) -> bool {
    role_of(club, user_id).is_member()
}

/// Number of requests still waiting for a manager
pub fn pending_count_of(club: Option<&Club>) -> usize {
    club.map(|c| c.pending_requests.iter().filter(|r| r.is_pending()).count())
        .unwrap_or(0)
}

/// Authoritative member count, always the size of the member set
pub fn approved_member_count(club: Option<&Club>) -> usize {
    club.map(|c| c.members.len()).unwrap_or(0)
}

/// Outstanding request of `user_id`, if any
pub fn pending_request_for<'a>(club: Option<&'a Club>, user_id: &UserId) -> Option<&'a ClubJoinRequest> {
    club.and_then(|c| c.pending_request_of(user_id))
}

/// Authoritative count, logging when the cached counter drifted
pub fn reconcile_count(club: Option<&Club>) -> usize {
    let authoritative = approved_member_count(club);
    if let Some(club) = club {
        if club.member_count != authoritative {
            tracing::debug!(
                "[REGISTRY] club {} advertises {} members, roster has {}",
                club.id,
                club.member_count,
                authoritative
            );
        }
    }
    authoritative
}

/// The derived membership list of `user_id` across `clubs`
pub fn memberships_for<'a>(
    clubs: impl IntoIterator<Item = &'a Club>,
    user_id: &UserId,
) -> Vec<UserClubMembership> {
    clubs
        .into_iter()
        .filter_map(|club| {
            let joined_at = *club.members.get(user_id)?;
            Some(UserClubMembership {
                club_id: club.id.clone(),
                club_name: club.name.clone(),
                role: role_of(Some(club), user_id),
                joined_at,
            })
        })
        .collect()
}
