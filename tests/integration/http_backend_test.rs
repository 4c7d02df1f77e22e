//! HTTP club backend against a mocked API

use crate::common::*;
use crate::{assert_contains, assert_err, assert_ok};
use clubhub::app::clubs::{ClubBackend, HttpClubBackend};
use clubhub::app::Config;
use clubhub::shared::clubs::MembershipAck;
use clubhub::shared::{AppConfig, ClubError, RequestId, Role};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_fetch_clubs_parses_listing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/clubs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "clubs": [{
                "id": "c1",
                "name": "Trail Runners",
                "category": "running",
                "manager_ids": ["user-a"],
                "members": {"user-a": "2024-05-01T08:00:00Z"},
                "member_count": 1,
                "created_at": "2024-05-01T08:00:00Z"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let clubs = assert_ok!(backend_for(&server).fetch_clubs().await);
    assert_eq!(clubs.len(), 1);
    assert_eq!(clubs[0].id, c1());
    assert!(clubs[0].has_manager(&alice().id));
}

#[tokio::test]
async fn test_fetch_memberships_uses_user_path() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users/user-b/club-memberships"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "memberships": [{
                "club_id": "c1",
                "club_name": "Trail Runners",
                "role": "member",
                "joined_at": "2024-06-01T10:00:00Z"
            }]
        })))
        .mount(&server)
        .await;

    let memberships = assert_ok!(backend_for(&server).fetch_memberships(&bob().id).await);
    assert_eq!(memberships[0].role, Role::Member);
}

#[tokio::test]
async fn test_join_sends_message_with_bearer_token() {
    let server = MockServer::start().await;
    let request_id = RequestId::generate();
    let ack = MembershipAck::ok(c1(), bob().id, Role::NonMember).with_pending_request(request_id);
    Mock::given(method("POST"))
        .and(path("/api/clubs/c1/join"))
        .and(header("Authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
        .and(body_json(json!({"message": "Hello"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ack_body(&ack)))
        .expect(1)
        .mount(&server)
        .await;

    let reply = assert_ok!(backend_for(&server).join(&c1(), Some("Hello")).await);
    assert_eq!(reply, ack);
}

#[tokio::test]
async fn test_write_endpoints() {
    let server = MockServer::start().await;
    let request_id = RequestId::generate();
    let ack = MembershipAck::ok(c1(), bob().id, Role::Member);

    for (verb, route) in [
        ("POST", "/api/clubs/c1/leave".to_string()),
        ("DELETE", "/api/clubs/c1/members/user-b".to_string()),
        ("POST", format!("/api/clubs/c1/requests/{}/approve", request_id)),
        ("POST", format!("/api/clubs/c1/requests/{}/denied", request_id)),
    ] {
        Mock::given(method(verb))
            .and(path(route.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(ack_body(&ack)))
            .expect(1)
            .mount(&server)
            .await;
    }

    let backend = backend_for(&server);
    assert_ok!(backend.leave(&c1()).await);
    assert_ok!(backend.remove_member(&c1(), &bob().id).await);
    assert_ok!(backend.approve_request(&c1(), request_id).await);
    assert_ok!(backend.deny_request(&c1(), request_id).await);
}

#[tokio::test]
async fn test_status_codes_map_to_friendly_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/clubs/missing/join"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/clubs/c1/join"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let backend = backend_for(&server);
    let error = backend.join(&"missing".into(), None).await.unwrap_err();
    assert_eq!(error, ClubError::remote("Club or request not found"));

    let error = backend.join(&c1(), None).await.unwrap_err();
    assert_contains!(error.to_string(), "refresh and try again");
}

#[tokio::test]
async fn test_rejected_ack_is_an_error() {
    let server = MockServer::start().await;
    let mut ack = MembershipAck::ok(c1(), bob().id, Role::NonMember);
    ack.success = false;
    ack.error = Some("Club is full".to_string());
    Mock::given(method("POST"))
        .and(path("/api/clubs/c1/join"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ack_body(&ack)))
        .mount(&server)
        .await;

    let error = backend_for(&server).join(&c1(), None).await.unwrap_err();
    assert_eq!(error, ClubError::remote("Club is full"));
}

#[tokio::test]
async fn test_writes_require_a_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = Config::with_builder(AppConfig::builder().server_url(server.uri())).unwrap();
    let backend = HttpClubBackend::new(config);
    assert_err!(backend.join(&c1(), None).await, ClubError::RemoteFailure { .. });
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/clubs"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"clubs": []}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let backend = HttpClubBackend::new(config_for(&server, Duration::from_millis(50)));
    let error = backend.fetch_clubs().await.unwrap_err();
    assert!(error.is_retryable());
}
