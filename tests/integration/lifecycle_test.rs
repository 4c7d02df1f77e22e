//! Join request lifecycle scenarios against the in-memory backend

use crate::common::*;
use crate::{assert_consistent, assert_err, assert_ok};
use clubhub::app::clubs::queries;
use clubhub::shared::{ClubError, JoinRequestStatus, Role};
use pretty_assertions::assert_eq;

#[tokio::test]
async fn test_request_and_approve_adds_member() {
    let stack = Stack::new(vec![club_c1()]);

    stack.backend().sign_in(&bob());
    let request = assert_ok!(
        stack
            .lifecycle
            .request_to_join(&c1(), &bob(), Some("Can I join?".to_string()))
            .await
    );
    assert_eq!(request.status, JoinRequestStatus::Pending);
    assert_eq!(request.message.as_deref(), Some("Can I join?"));

    // The local request now carries the backend's id
    let server_request = stack.backend().server_club(&c1()).unwrap().pending_requests[0].clone();
    assert_eq!(request.id, server_request.id);

    stack.backend().sign_in(&alice());
    let approved = assert_ok!(stack.lifecycle.approve(&c1(), request.id, &alice().id).await);
    assert_eq!(approved.status, JoinRequestStatus::Approved);

    let club = stack.club(&c1());
    assert_consistent!(club);
    let members: Vec<_> = club.member_ids().cloned().collect();
    assert_eq!(members, vec![alice().id, bob().id]);
    assert_eq!(club.member_count, 2);
    assert_eq!(queries::pending_count_of(Some(&club)), 0);
    assert_eq!(queries::role_of(Some(&club), &bob().id), Role::Member);
    assert_eq!(stack.backend().server_club(&c1()).unwrap().members.len(), 2);
}

#[tokio::test]
async fn test_duplicate_request_is_rejected() {
    let stack = Stack::new(vec![club_c1()]);
    stack.backend().sign_in(&bob());

    assert_ok!(stack.lifecycle.request_to_join(&c1(), &bob(), None).await);
    assert_err!(
        stack.lifecycle.request_to_join(&c1(), &bob(), None).await,
        ClubError::DuplicateRequest { .. }
    );

    assert_eq!(queries::pending_count_of(Some(&stack.club(&c1()))), 1);
    assert_eq!(stack.backend().calls(), vec!["join"]);
}

#[tokio::test]
async fn test_member_cannot_request_again() {
    let stack = Stack::new(vec![club_c1()]);
    assert_err!(
        stack.lifecycle.request_to_join(&c1(), &alice(), None).await,
        ClubError::AlreadyMember { .. }
    );
    assert!(stack.backend().calls().is_empty());
}

#[tokio::test]
async fn test_rejoin_after_denial_opens_new_request() {
    let stack = Stack::new(vec![club_c1()]);

    stack.backend().sign_in(&bob());
    let first = assert_ok!(stack.lifecycle.request_to_join(&c1(), &bob(), None).await);

    stack.backend().sign_in(&alice());
    let denied = assert_ok!(stack.lifecycle.deny(&c1(), first.id, &alice().id).await);
    assert_eq!(denied.status, JoinRequestStatus::Denied);
    assert_eq!(queries::role_of(Some(&stack.club(&c1())), &bob().id), Role::NonMember);

    stack.backend().sign_in(&bob());
    let second = assert_ok!(stack.lifecycle.request_to_join(&c1(), &bob(), None).await);
    assert_ne!(first.id, second.id);
    assert_eq!(queries::pending_count_of(Some(&stack.club(&c1()))), 1);
}

#[tokio::test]
async fn test_approving_twice_is_not_found() {
    let stack = Stack::new(vec![club_c1()]);
    stack.backend().sign_in(&bob());
    let request = assert_ok!(stack.lifecycle.request_to_join(&c1(), &bob(), None).await);
    stack.backend().sign_in(&alice());

    assert_ok!(stack.lifecycle.approve(&c1(), request.id, &alice().id).await);
    assert_err!(
        stack.lifecycle.approve(&c1(), request.id, &alice().id).await,
        ClubError::NotFound { .. }
    );
    assert_eq!(stack.club(&c1()).member_count, 2);
}

#[tokio::test]
async fn test_non_manager_cannot_approve() {
    let stack = Stack::new(vec![club_c1()]);
    stack.backend().sign_in(&bob());
    let request = assert_ok!(stack.lifecycle.request_to_join(&c1(), &bob(), None).await);

    assert_err!(
        stack.lifecycle.approve(&c1(), request.id, &carol().id).await,
        ClubError::PermissionDenied { .. }
    );
    assert_eq!(queries::pending_count_of(Some(&stack.club(&c1()))), 1);
}

#[tokio::test]
async fn test_sole_manager_cannot_leave() {
    let stack = Stack::new(vec![club_c1()]);
    let before = stack.registry.get_versioned(&c1()).unwrap();

    assert_err!(
        stack.lifecycle.leave(&c1(), &alice().id).await,
        ClubError::LastManagerProtected { .. }
    );
    assert_eq!(stack.registry.get_versioned(&c1()).unwrap(), before);
}

#[tokio::test]
async fn test_one_of_two_managers_may_leave() {
    let mut club = club_c1();
    club.manager_ids.insert(bob().id);
    let stack = Stack::new(vec![club.normalized()]);

    stack.backend().sign_in(&bob());
    assert_ok!(stack.lifecycle.leave(&c1(), &bob().id).await);

    let club = stack.club(&c1());
    assert_consistent!(club);
    assert_eq!(queries::role_of(Some(&club), &bob().id), Role::NonMember);
    assert!(queries::is_manager(Some(&club), &alice().id));
}

#[tokio::test]
async fn test_failed_join_rolls_back() {
    let stack = Stack::new(vec![club_c1()]);
    stack.backend().sign_in(&bob());
    stack.backend().fail_next(1);

    let error = stack.lifecycle.request_to_join(&c1(), &bob(), None).await.unwrap_err();
    assert!(error.is_retryable());
    assert_eq!(queries::role_of(Some(&stack.club(&c1())), &bob().id), Role::NonMember);
    assert_eq!(queries::pending_count_of(Some(&stack.club(&c1()))), 0);

    // Retrying is up to the caller and works once the backend recovers
    assert_ok!(stack.lifecycle.request_to_join(&c1(), &bob(), None).await);
    assert_eq!(queries::pending_count_of(Some(&stack.club(&c1()))), 1);
}

#[tokio::test]
async fn test_instant_join_and_failed_instant_join() {
    let stack = Stack::new(vec![club_c1()]);
    stack.backend().sign_in(&bob());
    stack.backend().set_auto_approve(true);

    stack.backend().set_offline(true);
    assert_err!(
        stack.lifecycle.join_instantly(&c1(), &bob()).await,
        ClubError::RemoteFailure { .. }
    );
    assert_eq!(stack.club(&c1()).member_count, 1);

    stack.backend().set_offline(false);
    let role = assert_ok!(stack.lifecycle.join_instantly(&c1(), &bob()).await);
    assert_eq!(role, Role::Member);
    assert_eq!(stack.club(&c1()).member_count, 2);
}

#[tokio::test]
async fn test_instant_join_against_approval_club_records_request() {
    let stack = Stack::new(vec![club_c1()]);
    stack.backend().sign_in(&bob());

    let role = assert_ok!(stack.lifecycle.join_instantly(&c1(), &bob()).await);
    assert_eq!(role, Role::NonMember);

    let club = stack.club(&c1());
    assert_consistent!(club);
    let server_id = stack.backend().server_club(&c1()).unwrap().pending_requests[0].id;
    assert_eq!(club.pending_request_of(&bob().id).map(|r| r.id), Some(server_id));
}

#[tokio::test]
async fn test_manager_removes_member() {
    let stack = Stack::new(vec![club_c1()]);
    stack.backend().sign_in(&bob());
    stack.backend().set_auto_approve(true);
    assert_ok!(stack.lifecycle.join_instantly(&c1(), &bob()).await);

    stack.backend().sign_in(&alice());
    assert_ok!(stack.lifecycle.remove_member(&c1(), &bob().id, &alice().id).await);

    assert_eq!(stack.club(&c1()).member_count, 1);
    assert_eq!(stack.backend().calls(), vec!["join", "remove_member"]);
}

#[tokio::test]
async fn test_failed_removal_restores_manager_flag() {
    let mut club = club_c1();
    club.manager_ids.insert(bob().id);
    let club = club.normalized();
    let joined_at = club.members[&bob().id];
    let stack = Stack::new(vec![club]);

    stack.backend().fail_next(1);
    assert_err!(stack.lifecycle.remove_member(&c1(), &bob().id, &alice().id).await);

    let club = stack.club(&c1());
    assert!(club.has_manager(&bob().id));
    assert_eq!(club.members.get(&bob().id), Some(&joined_at));
}
