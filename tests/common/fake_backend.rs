//! In-memory club backend
//!
//! Holds its own authoritative copy of the clubs and answers writes the way
//! the real service does, on behalf of whichever user is signed in. Failures,
//! latency and instant approval can be switched on per test.

use async_trait::async_trait;
use clubhub::app::clubs::ClubBackend;
use clubhub::app::clubs::queries;
use clubhub::shared::clubs::{MembershipAck, UserClubMembership};
use clubhub::shared::{Club, ClubError, ClubId, ClubJoinRequest, RequestId, UserId, UserProfile};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug)]
struct FakeState {
    clubs: HashMap<ClubId, Club>,
    order: Vec<ClubId>,
    signed_in: UserProfile,
    offline: bool,
    fail_next: usize,
    delay: Option<Duration>,
    auto_approve: bool,
    calls: Vec<String>,
}

/// Authoritative backend living in the test process
#[derive(Debug)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new(signed_in: UserProfile, clubs: Vec<Club>) -> Self {
        let order = clubs.iter().map(|c| c.id.clone()).collect();
        let clubs = clubs.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self {
            state: Mutex::new(FakeState {
                clubs,
                order,
                signed_in,
                offline: false,
                fail_next: 0,
                delay: None,
                auto_approve: false,
                calls: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    /// Act as `profile` for the following writes
    pub fn sign_in(&self, profile: &UserProfile) {
        self.lock().signed_in = profile.clone();
    }

    /// Every call fails while offline
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    /// Fail the next `count` calls
    pub fn fail_next(&self, count: usize) {
        self.lock().fail_next = count;
    }

    /// Answer every call after `delay`
    pub fn set_delay(&self, delay: Duration) {
        self.lock().delay = Some(delay);
    }

    /// Let joins through without a request
    pub fn set_auto_approve(&self, enabled: bool) {
        self.lock().auto_approve = enabled;
    }

    /// Names of the calls made so far
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// The backend's own copy of a club
    pub fn server_club(&self, club_id: &ClubId) -> Option<Club> {
        self.lock().clubs.get(club_id).cloned()
    }

    /// Record the call, wait out the delay, then decide whether it fails
    async fn enter(&self, call: &str) -> Result<(), ClubError> {
        let delay = {
            let mut state = self.lock();
            state.calls.push(call.to_string());
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.lock();
        if state.offline {
            return Err(ClubError::remote("connection refused"));
        }
        if state.fail_next > 0 {
            state.fail_next -= 1;
            return Err(ClubError::remote("Request failed: 500 Internal Server Error"));
        }
        Ok(())
    }

    fn write<F>(&self, club_id: &ClubId, apply: F) -> Result<MembershipAck, ClubError>
    where
        F: FnOnce(&mut Club, &UserProfile) -> Result<(UserId, Option<RequestId>), ClubError>,
    {
        let mut state = self.lock();
        let signed_in = state.signed_in.clone();
        let club = state
            .clubs
            .get_mut(club_id)
            .ok_or_else(|| ClubError::remote("Club or request not found"))?;

        let (user_id, pending_request_id) = apply(club, &signed_in)?;
        club.member_count = club.members.len();

        let mut ack = MembershipAck::ok(
            club_id.clone(),
            user_id.clone(),
            queries::role_of(Some(club), &user_id),
        )
        .with_member_count(club.member_count);
        ack.pending_request_id = pending_request_id;
        Ok(ack)
    }

    fn require_manager(club: &Club, user: &UserProfile) -> Result<(), ClubError> {
        if club.has_manager(&user.id) {
            Ok(())
        } else {
            Err(ClubError::remote("You are not allowed to do that in this club"))
        }
    }
}

#[async_trait]
impl ClubBackend for FakeBackend {
    async fn fetch_clubs(&self) -> Result<Vec<Club>, ClubError> {
        self.enter("fetch_clubs").await?;
        let state = self.lock();
        Ok(state
            .order
            .iter()
            .filter_map(|id| state.clubs.get(id).cloned())
            .collect())
    }

    async fn fetch_memberships(&self, user_id: &UserId) -> Result<Vec<UserClubMembership>, ClubError> {
        self.enter("fetch_memberships").await?;
        let state = self.lock();
        let clubs: Vec<&Club> = state.order.iter().filter_map(|id| state.clubs.get(id)).collect();
        Ok(queries::memberships_for(clubs, user_id))
    }

    async fn join(&self, club_id: &ClubId, message: Option<&str>) -> Result<MembershipAck, ClubError> {
        self.enter("join").await?;
        let auto_approve = self.lock().auto_approve;
        self.write(club_id, |club, user| {
            if club.has_member(&user.id) {
                return Ok((user.id.clone(), None));
            }
            if auto_approve {
                club.pending_requests.retain(|r| r.user_id != user.id);
                club.members.insert(user.id.clone(), chrono::Utc::now());
                return Ok((user.id.clone(), None));
            }
            let id = match club.pending_request_of(&user.id) {
                Some(existing) => existing.id,
                None => {
                    let request =
                        ClubJoinRequest::new(club.id.clone(), user, message.map(str::to_string));
                    let id = request.id;
                    club.pending_requests.push(request);
                    id
                }
            };
            Ok((user.id.clone(), Some(id)))
        })
    }

    async fn leave(&self, club_id: &ClubId) -> Result<MembershipAck, ClubError> {
        self.enter("leave").await?;
        self.write(club_id, |club, user| {
            club.members.remove(&user.id);
            club.manager_ids.remove(&user.id);
            Ok((user.id.clone(), None))
        })
    }

    async fn remove_member(&self, club_id: &ClubId, user_id: &UserId) -> Result<MembershipAck, ClubError> {
        self.enter("remove_member").await?;
        self.write(club_id, |club, user| {
            Self::require_manager(club, user)?;
            club.members.remove(user_id);
            club.manager_ids.remove(user_id);
            Ok((user_id.clone(), None))
        })
    }

    async fn approve_request(&self, club_id: &ClubId, request_id: RequestId) -> Result<MembershipAck, ClubError> {
        self.enter("approve_request").await?;
        self.write(club_id, |club, user| {
            Self::require_manager(club, user)?;
            let position = club
                .pending_requests
                .iter()
                .position(|r| r.id == request_id)
                .ok_or_else(|| ClubError::remote("Club or request not found"))?;
            let request = club.pending_requests.remove(position);
            club.members.insert(request.user_id.clone(), chrono::Utc::now());
            Ok((request.user_id, None))
        })
    }

    async fn deny_request(&self, club_id: &ClubId, request_id: RequestId) -> Result<MembershipAck, ClubError> {
        self.enter("deny_request").await?;
        self.write(club_id, |club, user| {
            Self::require_manager(club, user)?;
            let position = club
                .pending_requests
                .iter()
                .position(|r| r.id == request_id)
                .ok_or_else(|| ClubError::remote("Club or request not found"))?;
            let request = club.pending_requests.remove(position);
            Ok((request.user_id, None))
        })
    }
}
