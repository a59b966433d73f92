//! Delivery endpoints.
//!
//! The engine hands decoded messages and state changes to endpoints it
//! does not own. An endpoint is anything that can accept a [`Delivery`]
//! without blocking and can say whether its consumer has gone away:
//! bounded or unbounded tokio channels, or a plain callback.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use trade_core::{EngineState, Message};

/// What an endpoint receives.
#[derive(Debug, Clone)]
pub enum Delivery {
    /// A decoded inbound message.
    Message(Arc<Message>),
    /// A lifecycle transition, for state subscribers.
    State(EngineState),
}

impl Delivery {
    pub fn message(&self) -> Option<&Arc<Message>> {
        match self {
            Delivery::Message(m) => Some(m),
            Delivery::State(_) => None,
        }
    }

    pub fn state(&self) -> Option<EngineState> {
        match self {
            Delivery::State(s) => Some(*s),
            Delivery::Message(_) => None,
        }
    }
}

/// Why a delivery attempt did not go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The endpoint has no room right now; the delivery is dropped.
    Full,
    /// The consumer is gone; the endpoint will be unregistered.
    Closed,
}

/// Non-blocking sink for deliveries.
///
/// `try_deliver` is called from the reader task while the registry is
/// locked, so implementations must return promptly and must not call
/// back into the engine's subscribe/unsubscribe methods.
pub trait Endpoint: Send + Sync + 'static {
    fn try_deliver(&self, delivery: Delivery) -> Result<(), DeliveryError>;

    fn is_closed(&self) -> bool;
}

impl Endpoint for mpsc::Sender<Delivery> {
    fn try_deliver(&self, delivery: Delivery) -> Result<(), DeliveryError> {
        self.try_send(delivery).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => DeliveryError::Full,
            mpsc::error::TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }

    fn is_closed(&self) -> bool {
        mpsc::Sender::is_closed(self)
    }
}

impl Endpoint for mpsc::UnboundedSender<Delivery> {
    fn try_deliver(&self, delivery: Delivery) -> Result<(), DeliveryError> {
        self.send(delivery).map_err(|_| DeliveryError::Closed)
    }

    fn is_closed(&self) -> bool {
        mpsc::UnboundedSender::is_closed(self)
    }
}

/// Endpoint backed by a closure. Never reports itself closed.
pub struct Callback<F>(pub F);

impl<F> Endpoint for Callback<F>
where
    F: Fn(Delivery) + Send + Sync + 'static,
{
    fn try_deliver(&self, delivery: Delivery) -> Result<(), DeliveryError> {
        (self.0)(delivery);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        false
    }
}

/// Process-wide counter for assigning unique `SubscriberId`s.
static NEXT_SUBSCRIBER_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a subscriber; the registry keys duplicates on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

/// Cloneable handle to an endpoint.
///
/// Clones share the same id, so subscribing a clone to a key the
/// original is already on is a no-op.
#[derive(Clone)]
pub struct Subscriber {
    id: SubscriberId,
    endpoint: Arc<dyn Endpoint>,
}

impl Subscriber {
    pub fn new(endpoint: impl Endpoint) -> Self {
        Subscriber {
            id: SubscriberId(NEXT_SUBSCRIBER_ID.fetch_add(1, Ordering::Relaxed)),
            endpoint: Arc::new(endpoint),
        }
    }

    /// Subscriber backed by a bounded channel of `capacity` deliveries.
    pub fn channel(capacity: usize) -> (Subscriber, mpsc::Receiver<Delivery>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Subscriber::new(tx), rx)
    }

    /// Subscriber backed by an unbounded channel.
    pub fn unbounded() -> (Subscriber, mpsc::UnboundedReceiver<Delivery>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Subscriber::new(tx), rx)
    }

    pub fn callback<F>(f: F) -> Subscriber
    where
        F: Fn(Delivery) + Send + Sync + 'static,
    {
        Subscriber::new(Callback(f))
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub(crate) fn try_deliver(&self, delivery: Delivery) -> Result<(), DeliveryError> {
        self.endpoint.try_deliver(delivery)
    }

    pub fn is_closed(&self) -> bool {
        self.endpoint.is_closed()
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id.0).finish()
    }
}

impl PartialEq for Subscriber {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Subscriber {}
