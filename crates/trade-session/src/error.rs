//! Error types for the session engine.

use thiserror::Error;

use trade_core::EngineState;
use trade_protocol::{DecodeError, EncodeError, HandshakeError};

use crate::config::ConfigError;

/// Everything a session operation can fail with.
///
/// `Encoding` and `NotReady` are local to the failing call. `Io`,
/// `Handshake` and (past the configured threshold) `Decoding` end the
/// session and are also recorded as its fatal error.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Malformed or incomplete outbound message.
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodeError),

    /// Malformed inbound frame.
    #[error("decoding error: {0}")]
    Decoding(#[from] DecodeError),

    /// Transport read or write failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Session negotiation failed.
    #[error("handshake error: {0}")]
    Handshake(#[from] HandshakeError),

    /// Operation attempted outside the `Ready` state.
    #[error("engine is not ready (state: {0})")]
    NotReady(EngineState),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl SessionError {
    /// A copy suitable for storing as the fatal error while the
    /// original is returned to the caller.
    pub(crate) fn duplicate(&self) -> SessionError {
        match self {
            SessionError::Encoding(e) => SessionError::Encoding(e.clone()),
            SessionError::Decoding(e) => SessionError::Decoding(e.clone()),
            SessionError::Io(e) => SessionError::Io(std::io::Error::new(e.kind(), e.to_string())),
            SessionError::Handshake(e) => SessionError::Handshake(e.clone()),
            SessionError::NotReady(s) => SessionError::NotReady(*s),
            SessionError::Config(e) => SessionError::Config(ConfigError::Invalid(e.to_string())),
        }
    }
}

/// Result type alias using SessionError.
pub type Result<T> = std::result::Result<T, SessionError>;
