//! # Request Lifecycle
//!
//! Join, approve, deny and removal operations. A join request moves through
//! `pending → approved | denied`; both outcomes are terminal and a later
//! rejoin opens a new request with a new id.
//!
//! Every operation follows the same shape:
//!
//! 1. Check preconditions and apply the optimistic change in one registry
//!    mutation, so the check sees exactly the state it changes
//! 2. Call the backend through the reconciler
//! 3. On failure, undo this operation's own change against the current state
//!    and return the error
//! 4. On a fresh success, adopt the backend's view of the affected user;
//!    a stale success is left alone
//!
//! Precondition failures never reach the network. Retries are up to the
//! caller.

use crate::app::clubs::queries;
use crate::app::clubs::registry::ClubRegistry;
use crate::app::clubs::ClubBackend;
use crate::app::offline::{Reconciler, RemoteReply};
use crate::shared::{
    Club, ClubError, ClubId, ClubJoinRequest, JoinRequestStatus, RequestId, Role, UserId, UserProfile,
};
use chrono::Utc;
use std::sync::Arc;

/// Membership operations for the signed-in user
pub struct RequestLifecycle<B> {
    reconciler: Reconciler<B>,
}

fn ensure_not_member(club: &Club, user_id: &UserId) -> Result<(), ClubError> {
    if queries::is_member(Some(club), user_id) {
        return Err(ClubError::already_member(&club.id, user_id));
    }
    Ok(())
}

fn ensure_manager(club: &Club, acting: &UserId, action: &str) -> Result<(), ClubError> {
    if !queries::is_manager(Some(club), acting) {
        return Err(ClubError::permission_denied(acting, action));
    }
    Ok(())
}

impl<B: ClubBackend> RequestLifecycle<B> {
    pub fn new(reconciler: Reconciler<B>) -> Self {
        Self { reconciler }
    }

    pub fn registry(&self) -> &Arc<ClubRegistry> {
        self.reconciler.registry()
    }

    pub fn reconciler(&self) -> &Reconciler<B> {
        &self.reconciler
    }

    /// Ask to join a club that approves members.
    ///
    /// Opens a pending request right away and leaves the roster alone.
    /// Returns the request as it stands once the backend answered: still
    /// pending (under the backend's id), or approved if the backend let the
    /// user straight in.
    pub async fn request_to_join(
        &self,
        club_id: &ClubId,
        requester: &UserProfile,
        message: Option<String>,
    ) -> Result<ClubJoinRequest, ClubError> {
        let request = ClubJoinRequest::new(club_id.clone(), requester, message);
        let optimistic = self.registry().apply_mutation(club_id, |club| {
            ensure_not_member(club, &requester.id)?;
            if club.pending_request_of(&requester.id).is_some() {
                return Err(ClubError::duplicate_request(&club.id, &requester.id));
            }
            let mut next = club.clone();
            next.pending_requests.push(request.clone());
            Ok(next)
        })?;
        tracing::info!("[LIFECYCLE] {} asked to join club {}", requester.id, club_id);

        let call = self
            .reconciler
            .backend()
            .join(club_id, request.message.as_deref());
        match self.reconciler.dispatch(club_id, optimistic.version, call).await {
            Ok(RemoteReply::Fresh(ack)) => {
                self.reconciler.reconcile(&ack, optimistic.version, Some(requester))?;
            }
            Ok(RemoteReply::Stale(_)) => {}
            Err(error) => {
                let request_id = request.id;
                self.compensate(club_id, "request_to_join", |club| {
                    let position = club.pending_requests.iter().position(|r| r.id == request_id)?;
                    let mut next = club.clone();
                    next.pending_requests.remove(position);
                    Some(next)
                });
                return Err(error);
            }
        }

        Ok(self.outcome_of(club_id, request))
    }

    /// Join a club without approval.
    ///
    /// The user becomes a member immediately and any pending request of theirs
    /// is closed. If the backend only queued a request, the membership is
    /// withdrawn and the request recorded instead. Returns the resulting role.
    pub async fn join_instantly(&self, club_id: &ClubId, user: &UserProfile) -> Result<Role, ClubError> {
        let joined_at = Utc::now();
        let mut dropped: Option<ClubJoinRequest> = None;
        let optimistic = self.registry().apply_mutation(club_id, |club| {
            ensure_not_member(club, &user.id)?;
            let mut next = club.clone();
            if let Some(position) = next.pending_requests.iter().position(|r| r.user_id == user.id) {
                dropped = Some(next.pending_requests.remove(position));
            }
            next.members.insert(user.id.clone(), joined_at);
            Ok(next)
        })?;
        tracing::info!("[LIFECYCLE] {} joined club {}", user.id, club_id);

        let call = self.reconciler.backend().join(club_id, None);
        match self.reconciler.dispatch(club_id, optimistic.version, call).await {
            Ok(RemoteReply::Fresh(ack)) => {
                self.reconciler.reconcile(&ack, optimistic.version, Some(user))?;
            }
            Ok(RemoteReply::Stale(_)) => {}
            Err(error) => {
                self.compensate(club_id, "join_instantly", |club| {
                    let mut next = club.clone();
                    let mut changed = false;
                    if next.members.get(&user.id) == Some(&joined_at) && !next.has_manager(&user.id) {
                        next.members.remove(&user.id);
                        changed = true;
                    }
                    if let Some(request) = &dropped {
                        if !next.has_member(&user.id) && next.pending_request_of(&user.id).is_none() {
                            next.pending_requests.push(request.clone());
                            changed = true;
                        }
                    }
                    changed.then_some(next)
                });
                return Err(error);
            }
        }

        let club = self.registry().get_club(club_id);
        Ok(queries::role_of(club.as_ref(), &user.id))
    }

    /// Approve a pending request; `acting` must manage the club.
    ///
    /// Approving a request that is no longer pending is `NotFound`.
    pub async fn approve(
        &self,
        club_id: &ClubId,
        request_id: RequestId,
        acting: &UserId,
    ) -> Result<ClubJoinRequest, ClubError> {
        let joined_at = Utc::now();
        let mut taken: Option<ClubJoinRequest> = None;
        let optimistic = self.registry().apply_mutation(club_id, |club| {
            ensure_manager(club, acting, "approve join requests")?;
            let position = club
                .pending_requests
                .iter()
                .position(|r| r.id == request_id)
                .ok_or_else(|| ClubError::not_found("join request", request_id))?;
            let mut next = club.clone();
            let request = next.pending_requests.remove(position);
            next.members.entry(request.user_id.clone()).or_insert(joined_at);
            taken = Some(request);
            Ok(next)
        })?;
        let request = taken.ok_or_else(|| ClubError::not_found("join request", request_id))?;
        tracing::info!(
            "[LIFECYCLE] {} approved {} in club {}",
            acting,
            request.user_id,
            club_id
        );

        let call = self.reconciler.backend().approve_request(club_id, request_id);
        match self.reconciler.dispatch(club_id, optimistic.version, call).await {
            Ok(RemoteReply::Fresh(ack)) => {
                self.reconciler.reconcile(&ack, optimistic.version, None)?;
            }
            Ok(RemoteReply::Stale(_)) => {}
            Err(error) => {
                let user_id = &request.user_id;
                self.compensate(club_id, "approve", |club| {
                    let mut next = club.clone();
                    let mut changed = false;
                    if next.members.get(user_id) == Some(&joined_at) && !next.has_manager(user_id) {
                        next.members.remove(user_id);
                        changed = true;
                    }
                    if !next.has_member(user_id) && next.pending_request_of(user_id).is_none() {
                        next.pending_requests.push(request.clone());
                        changed = true;
                    }
                    changed.then_some(next)
                });
                return Err(error);
            }
        }

        Ok(request.resolved(JoinRequestStatus::Approved))
    }

    /// Deny a pending request; `acting` must manage the club
    pub async fn deny(
        &self,
        club_id: &ClubId,
        request_id: RequestId,
        acting: &UserId,
    ) -> Result<ClubJoinRequest, ClubError> {
        let mut taken: Option<ClubJoinRequest> = None;
        let optimistic = self.registry().apply_mutation(club_id, |club| {
            ensure_manager(club, acting, "deny join requests")?;
            let position = club
                .pending_requests
                .iter()
                .position(|r| r.id == request_id)
                .ok_or_else(|| ClubError::not_found("join request", request_id))?;
            let mut next = club.clone();
            taken = Some(next.pending_requests.remove(position));
            Ok(next)
        })?;
        let request = taken.ok_or_else(|| ClubError::not_found("join request", request_id))?;
        tracing::info!(
            "[LIFECYCLE] {} denied {} in club {}",
            acting,
            request.user_id,
            club_id
        );

        let call = self.reconciler.backend().deny_request(club_id, request_id);
        match self.reconciler.dispatch(club_id, optimistic.version, call).await {
            Ok(RemoteReply::Fresh(ack)) => {
                self.reconciler.reconcile(&ack, optimistic.version, None)?;
            }
            Ok(RemoteReply::Stale(_)) => {}
            Err(error) => {
                let user_id = &request.user_id;
                self.compensate(club_id, "deny", |club| {
                    if club.has_member(user_id) || club.pending_request_of(user_id).is_some() {
                        return None;
                    }
                    let mut next = club.clone();
                    next.pending_requests.push(request.clone());
                    Some(next)
                });
                return Err(error);
            }
        }

        Ok(request.resolved(JoinRequestStatus::Denied))
    }

    /// Remove `member` from a club.
    ///
    /// Managers may remove anyone; everyone else only themselves. The last
    /// manager cannot be removed.
    pub async fn remove_member(&self, club_id: &ClubId, member: &UserId, acting: &UserId) -> Result<(), ClubError> {
        let mut removed = None;
        let optimistic = self.registry().apply_mutation(club_id, |club| {
            if acting != member {
                ensure_manager(club, acting, "remove members")?;
            }
            let joined_at = *club
                .members
                .get(member)
                .ok_or_else(|| ClubError::not_found("member", member))?;
            let was_manager = club.has_manager(member);
            if was_manager && club.manager_ids.len() == 1 {
                return Err(ClubError::last_manager(&club.id, member));
            }
            let mut next = club.clone();
            next.members.remove(member);
            next.manager_ids.remove(member);
            removed = Some((joined_at, was_manager));
            Ok(next)
        })?;
        let (joined_at, was_manager) = removed.ok_or_else(|| ClubError::not_found("member", member))?;
        if acting == member {
            tracing::info!("[LIFECYCLE] {} left club {}", member, club_id);
        } else {
            tracing::info!("[LIFECYCLE] {} removed {} from club {}", acting, member, club_id);
        }

        let call = if acting == member {
            self.reconciler.backend().leave(club_id)
        } else {
            self.reconciler.backend().remove_member(club_id, member)
        };
        match self.reconciler.dispatch(club_id, optimistic.version, call).await {
            Ok(RemoteReply::Fresh(ack)) => {
                self.reconciler.reconcile(&ack, optimistic.version, None)?;
            }
            Ok(RemoteReply::Stale(_)) => {}
            Err(error) => {
                self.compensate(club_id, "remove_member", |club| {
                    if club.has_member(member) || club.pending_request_of(member).is_some() {
                        return None;
                    }
                    let mut next = club.clone();
                    next.members.insert(member.clone(), joined_at);
                    if was_manager {
                        next.manager_ids.insert(member.clone());
                    }
                    Some(next)
                });
                return Err(error);
            }
        }

        Ok(())
    }

    /// Leave a club
    pub async fn leave(&self, club_id: &ClubId, user_id: &UserId) -> Result<(), ClubError> {
        self.remove_member(club_id, user_id, user_id).await
    }

    /// Undo a failed operation's own change.
    ///
    /// `undo` maps the current club to its repaired state, or `None` when
    /// there is nothing left to undo. It runs under the club's lock, and a
    /// no-op leaves the version alone.
    fn compensate<F>(&self, club_id: &ClubId, operation: &str, undo: F)
    where
        F: FnOnce(&Club) -> Option<Club>,
    {
        match self.registry().apply_if_changed(club_id, |club| Ok(undo(club))) {
            Ok(Some(updated)) => tracing::info!(
                "[LIFECYCLE] rolled back {} on club {} (v{})",
                operation,
                club_id,
                updated.version
            ),
            Ok(None) => {
                tracing::debug!("[LIFECYCLE] nothing to undo for {} on club {}", operation, club_id)
            }
            Err(error) => tracing::warn!(
                "[LIFECYCLE] could not roll back {} on club {}: {}",
                operation,
                club_id,
                error
            ),
        }
    }

    /// Where `request` ended up after the backend answered
    fn outcome_of(&self, club_id: &ClubId, request: ClubJoinRequest) -> ClubJoinRequest {
        let club = self.registry().get_club(club_id);
        if let Some(pending) = queries::pending_request_for(club.as_ref(), &request.user_id) {
            return pending.clone();
        }
        if queries::is_member(club.as_ref(), &request.user_id) {
            request.resolved(JoinRequestStatus::Approved)
        } else {
            request.resolved(JoinRequestStatus::Denied)
        }
    }
}
