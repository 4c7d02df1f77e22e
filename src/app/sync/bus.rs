//! # Synchronization Bus
//!
//! Process-wide publish/subscribe channel for membership events. Screens that
//! do not share a state container subscribe here to learn about joins and
//! departures made elsewhere.
//!
//! ## Delivery
//!
//! - **Synchronous**: handlers run on the publishing thread before `publish`
//!   returns. For registry events the publisher is whichever thread is
//!   draining that club's outbox, which need not be the thread that made
//!   the write
//! - **Best effort**: no persistence and no replay; a late subscriber only sees
//!   events published after it subscribed
//! - **Async surfaces**: `watch()` hands out a `tokio::sync::broadcast`
//!   receiver fed with the same events
//!
//! ## Usage
//!
//! ```rust
//! use clubhub::app::sync::SyncBus;
//! use clubhub::shared::{ClubId, EventKind, MembershipEvent, UserId};
//!
//! let bus = SyncBus::new();
//! let subscription = bus.subscribe(EventKind::MemberJoined, |event| {
//!     println!("joined: {:?}", event.change);
//! });
//!
//! bus.publish(MembershipEvent::member_joined(ClubId::new("c1"), UserId::new("b"), 1));
//! subscription.unsubscribe();
//! ```

use crate::shared::{EventKind, MembershipEvent};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use tokio::sync::broadcast;

/// Capacity of the async watch channel
const WATCH_CAPACITY: usize = 256;

/// Event handler invoked for every matching event
pub type EventHandler = Arc<dyn Fn(&MembershipEvent) + Send + Sync>;

/// Subscription key; `None` matches every kind
type Topic = Option<EventKind>;

struct BusInner {
    handlers: RwLock<HashMap<Topic, Vec<(u64, EventHandler)>>>,
    next_id: AtomicU64,
    watch_tx: broadcast::Sender<MembershipEvent>,
}

/// Cloneable handle to the bus; all clones share one set of subscribers
#[derive(Clone)]
pub struct SyncBus {
    inner: Arc<BusInner>,
}

/// Live subscription. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the handler"]
pub struct Subscription {
    bus: Weak<BusInner>,
    topic: Topic,
    id: u64,
}

impl SyncBus {
    pub fn new() -> Self {
        let (watch_tx, _) = broadcast::channel(WATCH_CAPACITY);
        Self {
            inner: Arc::new(BusInner {
                handlers: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                watch_tx,
            }),
        }
    }

    /// Subscribe `handler` to one event kind
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> Subscription
    where
        F: Fn(&MembershipEvent) + Send + Sync + 'static,
    {
        self.register(Some(kind), Arc::new(handler))
    }

    /// Subscribe `handler` to every event
    pub fn subscribe_all<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&MembershipEvent) + Send + Sync + 'static,
    {
        self.register(None, Arc::new(handler))
    }

    /// Receiver for async consumers
    pub fn watch(&self) -> broadcast::Receiver<MembershipEvent> {
        self.inner.watch_tx.subscribe()
    }

    /// Deliver `event` to all matching handlers.
    ///
    /// Returns the number of handlers invoked.
    pub fn publish(&self, event: MembershipEvent) -> usize {
        let targets: Vec<EventHandler> = {
            let handlers = self
                .inner
                .handlers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            [Some(event.kind()), None]
                .iter()
                .filter_map(|topic| handlers.get(topic))
                .flatten()
                .map(|(_, handler)| handler.clone())
                .collect()
        };

        // Handlers run without the lock held so they may subscribe or drop
        // subscriptions themselves.
        for handler in &targets {
            handler(&event);
        }

        tracing::debug!(
            "[BUS] {:?} for club {} (v{}) delivered to {} handlers",
            event.kind(),
            event.club_id(),
            event.version,
            targets.len()
        );

        // No receivers is fine
        let _ = self.inner.watch_tx.send(event);

        targets.len()
    }

    /// Number of live handler subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(Vec::len)
            .sum()
    }

    fn register(&self, topic: Topic, handler: EventHandler) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(topic)
            .or_default()
            .push((id, handler));

        Subscription {
            bus: Arc::downgrade(&self.inner),
            topic,
            id,
        }
    }
}

impl Default for SyncBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SyncBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncBus")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl Subscription {
    /// Detach the handler now
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let Some(bus) = self.bus.upgrade() else {
            return;
        };
        let mut handlers = bus.handlers.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(list) = handlers.get_mut(&self.topic) {
            list.retain(|(id, _)| *id != self.id);
            if list.is_empty() {
                handlers.remove(&self.topic);
            }
        }
    }
}
