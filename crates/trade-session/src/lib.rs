//! trade-session
//!
//! Async session engine for the vendor trading gateway.
//!
//! - [`config`]   : connection settings (defaults, TOML, environment)
//! - [`endpoint`] : where deliveries go (channels or callbacks)
//! - [`registry`] : request id / broadcast / state subscriptions
//! - [`engine`]   : the connected session facade

pub mod config;
pub mod endpoint;
pub mod engine;
pub mod error;
pub mod registry;

// internal machinery, not re-exported
mod handshake;
mod reader;
mod state;
mod transport;

pub use config::{ConfigError, SessionConfig};
pub use endpoint::{Callback, Delivery, DeliveryError, Endpoint, Subscriber, SubscriberId};
pub use engine::Engine;
pub use error::{Result, SessionError};
pub use registry::SubscriptionKey;

pub use trade_core::{EngineState, Message, RequestId};
pub use trade_protocol::Catalogue;
