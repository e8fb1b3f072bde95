//! Session Observer: the latest [`SessionState`] of one client, with
//! publish/subscribe.
//!
//! # Contract
//!
//! - A new observer holds [`SessionState::Unknown`]
//! - [`SessionObserver::publish`] replaces the value and notifies subscribers,
//!   but only when the value actually changed
//! - Each [`SessionSubscription`] receives every later transition exactly
//!   once, in publication order
//! - Dropping a subscription unsubscribes it
//!
//! The identity provider adapter ([`AuthClient`](crate::middleware::AuthClient))
//! is the only code that publishes; everything else reads.
//!
//! [`SessionHub`] keeps one observer per browser client, keyed by the
//! [`ClientId`] stored in the cookie session.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::mpsc;
use uuid::Uuid;

use skillswap_core::SessionState;

/// Identifies one browser client across requests.
pub type ClientId = Uuid;

type Shared = Arc<Mutex<ObserverState>>;

#[derive(Default)]
struct ObserverState {
    current: SessionState,
    next_id: u64,
    subscribers: HashMap<u64, mpsc::UnboundedSender<SessionState>>,
}

/// Observable session value for one client.
///
/// Cheap to clone; clones observe the same value.
#[derive(Clone, Default)]
pub struct SessionObserver {
    shared: Shared,
}

impl SessionObserver {
    /// A new observer in the `Unknown` state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ObserverState> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Latest published value.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.lock().current.clone()
    }

    /// Register for transitions published after this call.
    #[must_use]
    pub fn subscribe(&self) -> SessionSubscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.insert(id, tx);

        SessionSubscription {
            id,
            rx,
            observer: Arc::downgrade(&self.shared),
        }
    }

    /// Publish a new value.
    ///
    /// Returns `true` if this was a transition (the value differed and
    /// subscribers were notified).
    pub fn publish(&self, next: SessionState) -> bool {
        let mut state = self.lock();
        if state.current == next {
            return false;
        }
        state.current = next.clone();
        // Sending while holding the lock keeps concurrent publishers ordered.
        state
            .subscribers
            .retain(|_, tx| tx.send(next.clone()).is_ok());
        true
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

impl std::fmt::Debug for SessionObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SessionObserver")
            .field("current", &state.current)
            .field("subscribers", &state.subscribers.len())
            .finish()
    }
}

/// Handle receiving transitions from one [`SessionObserver`].
pub struct SessionSubscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<SessionState>,
    observer: Weak<Mutex<ObserverState>>,
}

impl SessionSubscription {
    /// Wait for the next transition.
    ///
    /// Returns `None` once the observer itself is gone.
    pub async fn recv(&mut self) -> Option<SessionState> {
        self.rx.recv().await
    }

    /// Next already-delivered transition, without waiting.
    pub fn try_recv(&mut self) -> Option<SessionState> {
        self.rx.try_recv().ok()
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        if let Some(shared) = self.observer.upgrade() {
            shared
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .subscribers
                .remove(&self.id);
        }
    }
}

/// Process-wide registry of per-client observers.
///
/// Observers idle longer than the cookie session are evicted; the next
/// request for that client starts again from `Unknown` and re-resolves from
/// the stored tokens.
#[derive(Clone)]
pub struct SessionHub {
    observers: Cache<ClientId, SessionObserver>,
}

impl SessionHub {
    /// Create a hub evicting observers after `idle` without access.
    #[must_use]
    pub fn new(idle: Duration) -> Self {
        Self {
            observers: Cache::builder()
                .max_capacity(100_000)
                .time_to_idle(idle)
                .build(),
        }
    }

    /// The observer for `client`, created on first access.
    pub async fn observer(&self, client: ClientId) -> SessionObserver {
        self.observers
            .get_with(client, async { SessionObserver::new() })
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use skillswap_core::{Identity, UserId};

    use super::*;

    fn signed_in(name: &str) -> SessionState {
        SessionState::SignedIn(Identity {
            uid: UserId::new("u1"),
            display_name: Some(name.to_string()),
            email: Some("u1@example.com".to_string()),
            photo_url: None,
        })
    }

    #[test]
    fn test_starts_unknown() {
        let observer = SessionObserver::new();
        assert_eq!(observer.current(), SessionState::Unknown);
        assert!(!observer.current().is_resolved());
    }

    #[tokio::test]
    async fn test_transitions_delivered_in_order() {
        let observer = SessionObserver::new();
        let mut sub = observer.subscribe();

        assert!(observer.publish(SessionState::SignedOut));
        assert!(observer.publish(signed_in("Alex")));
        assert!(observer.publish(SessionState::SignedOut));

        assert_eq!(sub.recv().await, Some(SessionState::SignedOut));
        assert_eq!(sub.recv().await, Some(signed_in("Alex")));
        assert_eq!(sub.recv().await, Some(SessionState::SignedOut));
        assert_eq!(sub.try_recv(), None);
    }

    #[tokio::test]
    async fn test_identical_publish_is_not_a_transition() {
        let observer = SessionObserver::new();
        let mut sub = observer.subscribe();

        assert!(observer.publish(signed_in("Alex")));
        assert!(!observer.publish(signed_in("Alex")));
        assert!(observer.publish(signed_in("Alexander")));

        assert_eq!(sub.recv().await, Some(signed_in("Alex")));
        assert_eq!(sub.recv().await, Some(signed_in("Alexander")));
        assert_eq!(sub.try_recv(), None);
    }

    #[test]
    fn test_every_subscriber_gets_each_transition_once() {
        let observer = SessionObserver::new();
        let mut a = observer.subscribe();
        let mut b = observer.subscribe();

        observer.publish(SessionState::SignedOut);

        assert_eq!(a.try_recv(), Some(SessionState::SignedOut));
        assert_eq!(a.try_recv(), None);
        assert_eq!(b.try_recv(), Some(SessionState::SignedOut));
        assert_eq!(b.try_recv(), None);
    }

    #[test]
    fn test_subscription_sees_only_later_transitions() {
        let observer = SessionObserver::new();
        observer.publish(SessionState::SignedOut);

        let mut sub = observer.subscribe();
        assert_eq!(sub.try_recv(), None);
        assert_eq!(observer.current(), SessionState::SignedOut);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let observer = SessionObserver::new();
        let sub = observer.subscribe();
        let _kept = observer.subscribe();
        assert_eq!(observer.subscriber_count(), 2);

        drop(sub);
        assert_eq!(observer.subscriber_count(), 1);

        observer.publish(SessionState::SignedOut);
        assert_eq!(observer.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_recv_ends_when_observer_dropped() {
        let observer = SessionObserver::new();
        let mut sub = observer.subscribe();
        drop(observer);
        assert_eq!(sub.recv().await, None);
    }

    #[tokio::test]
    async fn test_hub_returns_same_observer_per_client() {
        let hub = SessionHub::new(Duration::from_secs(60));
        let client = Uuid::new_v4();

        let first = hub.observer(client).await;
        first.publish(SessionState::SignedOut);

        let again = hub.observer(client).await;
        assert_eq!(again.current(), SessionState::SignedOut);

        let other = hub.observer(Uuid::new_v4()).await;
        assert_eq!(other.current(), SessionState::Unknown);
    }
}
