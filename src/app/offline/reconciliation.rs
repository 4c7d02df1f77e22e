//! # Backend Reconciliation
//!
//! Sits between the registry and the club backend. Reads go through a
//! fallback chain and writes go through [`Reconciler::dispatch`], which
//! bounds every call by the configured timeout and tags the reply as fresh or
//! stale against the registry version the write was issued at.
//!
//! ## Read path
//!
//! 1. **Live**: ask the backend and store the answer in the snapshot cache
//! 2. **Cached**: the last live answer for this user
//! 3. **Seed**: the built-in demo clubs, when enabled
//!
//! The tier is reported through [`DataSource`]; tiers are never mixed.
//!
//! ## Write replies
//!
//! A reply is fresh when nothing touched the club since the optimistic write
//! that preceded the call. A stale reply raced with a newer local change and
//! is not applied. Writes never succeed offline: a timeout or transport error
//! is a [`ClubError::RemoteFailure`].

use crate::app::clubs::registry::{ClubRegistry, VersionedClub};
use crate::app::clubs::ClubBackend;
use crate::app::local_db::{LocalDatabase, Snapshot};
use crate::app::seed;
use crate::shared::clubs::{MembershipAck, UserClubMembership};
use crate::shared::{Club, ClubError, ClubId, ClubJoinRequest, Role, UserId, UserProfile};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Where a read was answered from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSource {
    /// The backend answered
    Live,
    /// Last live answer from the local snapshot cache
    Cached,
    /// Built-in demo data
    Seed,
}

/// A read result tagged with its source
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    pub data: T,
    pub source: DataSource,
    /// When the data left the backend; `None` for seed data
    pub fetched_at: Option<DateTime<Utc>>,
}

impl<T> Fetched<T> {
    fn live(data: T) -> Self {
        Self {
            data,
            source: DataSource::Live,
            fetched_at: Some(Utc::now()),
        }
    }

    fn cached(snapshot: Snapshot<T>) -> Self {
        Self {
            data: snapshot.data,
            source: DataSource::Cached,
            fetched_at: Some(snapshot.fetched_at),
        }
    }

    fn seed(data: T) -> Self {
        Self {
            data,
            source: DataSource::Seed,
            fetched_at: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.source == DataSource::Live
    }
}

/// Backend reply to a write, tagged against the registry version
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteReply {
    /// No local write touched the club while the call was in flight
    Fresh(MembershipAck),
    /// The club changed locally in the meantime; the ack must not be applied
    Stale(MembershipAck),
}

impl RemoteReply {
    pub fn ack(&self) -> &MembershipAck {
        match self {
            RemoteReply::Fresh(ack) | RemoteReply::Stale(ack) => ack,
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, RemoteReply::Stale(_))
    }
}

/// Reconciles the registry with the club backend
pub struct Reconciler<B> {
    backend: B,
    registry: Arc<ClubRegistry>,
    timeout: Duration,
    cache: Option<LocalDatabase>,
    seed_fallback: bool,
}

impl<B: ClubBackend> Reconciler<B> {
    /// Create a reconciler without a snapshot cache; seed fallback is on
    pub fn new(backend: B, registry: Arc<ClubRegistry>, timeout: Duration) -> Self {
        Self {
            backend,
            registry,
            timeout,
            cache: None,
            seed_fallback: true,
        }
    }

    /// Use `cache` as the second read tier
    pub fn with_cache(mut self, cache: LocalDatabase) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_seed_fallback(mut self, enabled: bool) -> Self {
        self.seed_fallback = enabled;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &Arc<ClubRegistry> {
        &self.registry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run a backend call under the configured timeout
    async fn bounded<T, F>(&self, call: F) -> Result<T, ClubError>
    where
        F: Future<Output = Result<T, ClubError>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ClubError::remote(format!(
                "Request timed out after {} ms",
                self.timeout.as_millis()
            ))),
        }
    }

    /// All clubs, from the first tier that answers
    pub async fn fetch_clubs(&self, user_id: &UserId) -> Result<Fetched<Vec<Club>>, ClubError> {
        let error = match self.bounded(self.backend.fetch_clubs()).await {
            Ok(clubs) => {
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.store_club_snapshot(user_id, &clubs).await {
                        tracing::warn!("[CACHE] could not store club snapshot: {}", e);
                    }
                }
                tracing::debug!("[RECONCILE] fetched {} clubs live", clubs.len());
                return Ok(Fetched::live(clubs));
            }
            Err(error) => error,
        };

        tracing::warn!("[RECONCILE] live club fetch failed: {}", error);
        if let Some(cache) = &self.cache {
            match cache.load_club_snapshot(user_id).await {
                Ok(Some(snapshot)) => {
                    tracing::info!("[RECONCILE] using club snapshot from {}", snapshot.fetched_at);
                    return Ok(Fetched::cached(snapshot));
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("[CACHE] could not read club snapshot: {}", e),
            }
        }
        if self.seed_fallback {
            tracing::info!("[RECONCILE] using built-in demo clubs");
            return Ok(Fetched::seed(seed::demo_clubs()));
        }
        Err(error)
    }

    /// Memberships of `user_id`, from the first tier that answers
    pub async fn fetch_memberships(
        &self,
        user_id: &UserId,
    ) -> Result<Fetched<Vec<UserClubMembership>>, ClubError> {
        let error = match self.bounded(self.backend.fetch_memberships(user_id)).await {
            Ok(memberships) => {
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.store_membership_snapshot(user_id, &memberships).await {
                        tracing::warn!("[CACHE] could not store membership snapshot: {}", e);
                    }
                }
                return Ok(Fetched::live(memberships));
            }
            Err(error) => error,
        };

        tracing::warn!("[RECONCILE] live membership fetch failed: {}", error);
        if let Some(cache) = &self.cache {
            match cache.load_membership_snapshot(user_id).await {
                Ok(Some(snapshot)) => return Ok(Fetched::cached(snapshot)),
                Ok(None) => {}
                Err(e) => tracing::warn!("[CACHE] could not read membership snapshot: {}", e),
            }
        }
        if self.seed_fallback {
            return Ok(Fetched::seed(seed::demo_memberships(user_id)));
        }
        Err(error)
    }

    /// Fetch clubs and load them into the registry.
    ///
    /// Live data always replaces what the registry holds. Cached and seed
    /// data only fill an empty registry, so fallback data never overwrites
    /// newer state.
    pub async fn refresh_registry(&self, user_id: &UserId) -> Result<DataSource, ClubError> {
        let fetched = self.fetch_clubs(user_id).await?;
        if fetched.is_live() || self.registry.is_empty() {
            let loaded = self.registry.load(fetched.data);
            tracing::info!("[RECONCILE] loaded {} clubs ({:?})", loaded, fetched.source);
        } else {
            tracing::info!(
                "[RECONCILE] keeping current registry over {:?} data",
                fetched.source
            );
        }
        Ok(fetched.source)
    }

    /// Run one write against the backend.
    ///
    /// `issued_version` is the club version right after the optimistic local
    /// write. The reply is stale when the registry moved past it while the
    /// call was in flight.
    pub async fn dispatch<F>(
        &self,
        club_id: &ClubId,
        issued_version: u64,
        call: F,
    ) -> Result<RemoteReply, ClubError>
    where
        F: Future<Output = Result<MembershipAck, ClubError>>,
    {
        let ack = self.bounded(call).await.map_err(|error| {
            tracing::warn!("[RECONCILE] write to club {} failed: {}", club_id, error);
            error
        })?;

        if &ack.club_id != club_id {
            return Err(ClubError::remote(format!(
                "Backend answered for club '{}' instead of '{}'",
                ack.club_id, club_id
            )));
        }

        match self.registry.version_of(club_id) {
            Some(current) if current == issued_version => Ok(RemoteReply::Fresh(ack)),
            current => {
                tracing::debug!(
                    "[RECONCILE] discarding ack for club {}: issued at v{}, now {:?}",
                    club_id,
                    issued_version,
                    current
                );
                Ok(RemoteReply::Stale(ack))
            }
        }
    }

    /// Adopt the backend's view of one user's membership.
    ///
    /// The ack is applied only while the club is still at `issued_version`,
    /// checked under the club's lock, so a local write that lands after
    /// [`dispatch`](Self::dispatch) judged the reply fresh still wins.
    /// Returns the updated club, or `None` when the club moved on or already
    /// agreed. `profile` is only needed to record a request the backend
    /// queued that the registry does not know about yet.
    pub fn reconcile(
        &self,
        ack: &MembershipAck,
        issued_version: u64,
        profile: Option<&UserProfile>,
    ) -> Result<Option<VersionedClub>, ClubError> {
        let updated = self
            .registry
            .apply_mutation_at(&ack.club_id, issued_version, |club| Ok(adopt(club, ack, profile)))?;
        let Some(updated) = updated else {
            tracing::debug!(
                "[RECONCILE] nothing to adopt for {} in club {} (issued at v{})",
                ack.user_id,
                ack.club_id,
                issued_version
            );
            return Ok(None);
        };

        tracing::info!(
            "[RECONCILE] backend says {} is {} in club {}",
            ack.user_id,
            ack.role,
            ack.club_id
        );

        if ack.member_count != 0 && ack.member_count != updated.club.member_count {
            tracing::debug!(
                "[RECONCILE] backend counts {} members in club {}, registry has {}",
                ack.member_count,
                ack.club_id,
                updated.club.member_count
            );
        }
        Ok(Some(updated))
    }
}

/// `club` with the acked user's membership replaced by the backend's view,
/// or `None` if nothing differs
fn adopt(club: &Club, ack: &MembershipAck, profile: Option<&UserProfile>) -> Option<Club> {
    let user_id = &ack.user_id;
    let mut next = club.clone();

    match ack.role {
        Role::Manager | Role::Member => {
            next.members.entry(user_id.clone()).or_insert_with(Utc::now);
            if ack.role == Role::Manager {
                next.manager_ids.insert(user_id.clone());
            } else {
                next.manager_ids.remove(user_id);
            }
            next.pending_requests.retain(|r| &r.user_id != user_id);
        }
        Role::NonMember => {
            next.members.remove(user_id);
            next.manager_ids.remove(user_id);
            match ack.pending_request_id {
                Some(server_id) => {
                    let local = next
                        .pending_requests
                        .iter_mut()
                        .find(|r| &r.user_id == user_id);
                    match (local, profile) {
                        (Some(request), _) => request.id = server_id,
                        (None, Some(profile)) if &profile.id == user_id => {
                            let mut request = ClubJoinRequest::new(next.id.clone(), profile, None);
                            request.id = server_id;
                            next.pending_requests.push(request);
                        }
                        (None, _) => tracing::warn!(
                            "[RECONCILE] backend holds request {} for {} but no profile to record it",
                            server_id,
                            user_id
                        ),
                    }
                }
                None => next.pending_requests.retain(|r| &r.user_id != user_id),
            }
        }
    }

    let changed = next.members != club.members
        || next.manager_ids != club.manager_ids
        || next.pending_requests != club.pending_requests;
    changed.then_some(next)
}
