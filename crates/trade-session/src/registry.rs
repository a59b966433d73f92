//! Subscription registry.
//!
//! Maps a [`SubscriptionKey`] to the subscribers interested in it:
//! - `Request(id)`: every reply echoing that request id
//! - `Broadcast`:   unsolicited messages and replies nobody asked for
//! - `State`:       engine lifecycle transitions
//!
//! One lock guards the whole map. Dispatch holds it (shared) while it
//! makes a single non-blocking delivery attempt per subscriber, so an
//! unsubscribe that returns is never followed by another delivery to
//! that subscriber for that key.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

use trade_core::{EngineState, RequestId};

use crate::endpoint::{Delivery, DeliveryError, Subscriber};

/// Dispatch key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubscriptionKey {
    Request(RequestId),
    Broadcast,
    State,
}

impl fmt::Display for SubscriptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriptionKey::Request(id) => write!(f, "request {id}"),
            SubscriptionKey::Broadcast => f.write_str("broadcast"),
            SubscriptionKey::State => f.write_str("state"),
        }
    }
}

/// Returned by [`Registry::subscribe`] once the registry has been closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryClosed(pub EngineState);

#[derive(Default)]
struct Routes {
    by_key: HashMap<SubscriptionKey, Vec<Subscriber>>,
    closed: Option<EngineState>,
}

/// Thread-safe key → subscribers map.
#[derive(Default)]
pub struct Registry {
    routes: RwLock<Routes>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    /// Register `subscriber` for `key`.
    ///
    /// Returns `Ok(false)` if that pair was already registered.
    pub fn subscribe(&self, key: SubscriptionKey, subscriber: &Subscriber) -> Result<bool, RegistryClosed> {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(state) = routes.closed {
            return Err(RegistryClosed(state));
        }

        let subscribers = routes.by_key.entry(key).or_default();
        if subscribers.contains(subscriber) {
            return Ok(false);
        }
        subscribers.push(subscriber.clone());
        debug!(%key, subscriber = subscriber.id().0, "subscribed");
        Ok(true)
    }

    /// Remove the `(key, subscriber)` pair. No-op if absent.
    pub fn unsubscribe(&self, key: SubscriptionKey, subscriber: &Subscriber) -> bool {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        let Some(subscribers) = routes.by_key.get_mut(&key) else {
            return false;
        };

        let before = subscribers.len();
        subscribers.retain(|s| s != subscriber);
        let removed = subscribers.len() != before;
        if subscribers.is_empty() {
            routes.by_key.remove(&key);
        }
        removed
    }

    /// Number of subscribers currently registered for `key`.
    pub fn subscriber_count(&self, key: SubscriptionKey) -> usize {
        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        routes.by_key.get(&key).map_or(0, Vec::len)
    }

    /// Hand `delivery` to every subscriber of `key`.
    ///
    /// Returns how many subscribers were registered, whether or not each
    /// accepted the delivery. A key with no subscribers drops it.
    pub fn dispatch(&self, key: SubscriptionKey, delivery: &Delivery) -> usize {
        let mut saw_closed = false;

        let matched = {
            let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
            let Some(subscribers) = routes.by_key.get(&key) else {
                return 0;
            };

            for subscriber in subscribers {
                match subscriber.try_deliver(delivery.clone()) {
                    Ok(()) => {}
                    Err(DeliveryError::Full) => {
                        warn!(%key, subscriber = subscriber.id().0, "subscriber full, delivery dropped");
                    }
                    Err(DeliveryError::Closed) => saw_closed = true,
                }
            }
            subscribers.len()
        };

        if saw_closed {
            self.prune_closed();
        }
        matched
    }

    /// Close the registry after the engine reaches `terminal`.
    ///
    /// State subscribers get the terminal state, every route is dropped,
    /// and later subscribe calls fail. Only the first call has an effect.
    pub fn close(&self, terminal: EngineState) {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        if routes.closed.is_some() {
            return;
        }
        routes.closed = Some(terminal);

        if let Some(subscribers) = routes.by_key.get(&SubscriptionKey::State) {
            let delivery = Delivery::State(terminal);
            for subscriber in subscribers {
                if let Err(e) = subscriber.try_deliver(delivery.clone()) {
                    warn!(subscriber = subscriber.id().0, ?e, state = %terminal, "state delivery failed");
                }
            }
        }
        routes.by_key.clear();
    }

    fn prune_closed(&self) {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        routes.by_key.retain(|key, subscribers| {
            subscribers.retain(|s| {
                let closed = s.is_closed();
                if closed {
                    debug!(%key, subscriber = s.id().0, "pruning closed subscriber");
                }
                !closed
            });
            !subscribers.is_empty()
        });
    }
}
