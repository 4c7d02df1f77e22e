//! Club API Client
//!
//! This module defines the backend contract used by the reconciler and an
//! HTTP implementation of it on top of `reqwest`.

use crate::app::config::Config;
use crate::shared::clubs::{
    JoinClubRequest, ListClubsResponse, ListMembershipsResponse, MembershipAck, UserClubMembership,
};
use crate::shared::{Club, ClubError, ClubId, RequestId, UserId};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

/// Authoritative membership backend.
///
/// Writes act on behalf of the signed-in user and answer with the resulting
/// membership of the affected user.
#[async_trait]
pub trait ClubBackend: Send + Sync {
    async fn fetch_clubs(&self) -> Result<Vec<Club>, ClubError>;

    async fn fetch_memberships(&self, user_id: &UserId) -> Result<Vec<UserClubMembership>, ClubError>;

    async fn join(&self, club_id: &ClubId, message: Option<&str>) -> Result<MembershipAck, ClubError>;

    async fn leave(&self, club_id: &ClubId) -> Result<MembershipAck, ClubError>;

    async fn remove_member(&self, club_id: &ClubId, user_id: &UserId) -> Result<MembershipAck, ClubError>;

    async fn approve_request(&self, club_id: &ClubId, request_id: RequestId) -> Result<MembershipAck, ClubError>;

    async fn deny_request(&self, club_id: &ClubId, request_id: RequestId) -> Result<MembershipAck, ClubError>;
}

/// Club backend reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpClubBackend {
    config: Config,
    client: Client,
}

impl HttpClubBackend {
    pub fn new(config: Config) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.get_token() {
            Some(token) => request.header("Authorization", format!("Bearer {}", token)),
            None => request,
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClubError> {
        let response = self.authorized(request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| status.to_string());

            let friendly_error = match status {
                StatusCode::NOT_FOUND => "Club or request not found".to_string(),
                StatusCode::CONFLICT => "Membership changed on the server; refresh and try again".to_string(),
                StatusCode::FORBIDDEN => "You are not allowed to do that in this club".to_string(),
                StatusCode::UNAUTHORIZED => "Not authenticated".to_string(),
                _ => format!("Request failed: {} - {}", status, error_text),
            };
            return Err(ClubError::remote(friendly_error));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| ClubError::remote(format!("Failed to parse response: {}", e)))
    }

    async fn write(&self, request: RequestBuilder) -> Result<MembershipAck, ClubError> {
        if self.config.get_token().is_none() {
            return Err(ClubError::remote("Not authenticated"));
        }
        self.send::<MembershipAck>(request).await?.into_result()
    }
}

#[async_trait]
impl ClubBackend for HttpClubBackend {
    async fn fetch_clubs(&self) -> Result<Vec<Club>, ClubError> {
        let url = self.config.api_url("/api/clubs");
        let list = self.send::<ListClubsResponse>(self.client.get(&url)).await?;
        Ok(list.clubs)
    }

    async fn fetch_memberships(&self, user_id: &UserId) -> Result<Vec<UserClubMembership>, ClubError> {
        let url = self
            .config
            .api_url(&format!("/api/users/{}/club-memberships", user_id));
        let list = self
            .send::<ListMembershipsResponse>(self.client.get(&url))
            .await?;
        Ok(list.memberships)
    }

    async fn join(&self, club_id: &ClubId, message: Option<&str>) -> Result<MembershipAck, ClubError> {
        let url = self.config.api_url(&format!("/api/clubs/{}/join", club_id));
        let body = JoinClubRequest {
            message: message.map(str::to_string),
        };
        self.write(self.client.post(&url).json(&body)).await
    }

    async fn leave(&self, club_id: &ClubId) -> Result<MembershipAck, ClubError> {
        let url = self.config.api_url(&format!("/api/clubs/{}/leave", club_id));
        self.write(self.client.post(&url)).await
    }

    async fn remove_member(&self, club_id: &ClubId, user_id: &UserId) -> Result<MembershipAck, ClubError> {
        let url = self
            .config
            .api_url(&format!("/api/clubs/{}/members/{}", club_id, user_id));
        self.write(self.client.delete(&url)).await
    }

    async fn approve_request(&self, club_id: &ClubId, request_id: RequestId) -> Result<MembershipAck, ClubError> {
        let url = self
            .config
            .api_url(&format!("/api/clubs/{}/requests/{}/approve", club_id, request_id));
        self.write(self.client.post(&url)).await
    }

    async fn deny_request(&self, club_id: &ClubId, request_id: RequestId) -> Result<MembershipAck, ClubError> {
        let url = self
            .config
            .api_url(&format!("/api/clubs/{}/requests/{}/denied", club_id, request_id));
        self.write(self.client.post(&url)).await
    }
}
