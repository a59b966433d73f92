//! Errors that can arise when encoding/decoding frames.

use thiserror::Error;
use trade_core::{FieldKind, MessageError};

/// A malformed or incomplete outbound message.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    /// A required field is unset and its schema has no default.
    #[error("{message}: required field `{field}` is unset")]
    MissingField {
        message: &'static str,
        field: &'static str,
    },

    /// A field was populated that does not exist at the negotiated version.
    #[error("{message}: field `{field}` is not supported at protocol version {version}")]
    UnsupportedField {
        message: &'static str,
        field: &'static str,
        version: u32,
    },

    /// Text fields may not contain the field terminator.
    #[error("{message}: field `{field}` contains a NUL byte")]
    EmbeddedNul {
        message: &'static str,
        field: &'static str,
    },

    /// Stored value does not match the field kind.
    #[error("{message}: field `{field}` holds a {got} value, expected {expected:?}")]
    KindMismatch {
        message: &'static str,
        field: &'static str,
        expected: FieldKind,
        got: &'static str,
    },

    /// Payload does not fit the 32-bit length prefix.
    #[error("frame payload of {0} bytes exceeds the length prefix")]
    FrameTooLarge(usize),
}

/// A malformed inbound frame.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    /// Buffer too short for a length prefix or the announced payload.
    #[error("buffer truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },

    /// Announced payload exceeds the configured maximum.
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge { len: usize, max: usize },

    /// The payload does not end with a field terminator.
    #[error("payload is not NUL-terminated")]
    Unterminated,

    /// Field text is not valid UTF-8. `index` counts fields after the tag.
    #[error("field {index} is not valid UTF-8")]
    InvalidUtf8 { index: usize },

    /// The leading tag field is missing or not a number.
    #[error("invalid message tag {0:?}")]
    InvalidTag(String),

    /// No schema for this tag. Carries the raw fields for diagnostics.
    #[error("unknown message tag {tag} ({} fields follow)", .fields.len())]
    UnknownTag { tag: u32, fields: Vec<String> },

    /// Fewer fields than the schema requires at this version.
    #[error("{message}: expected at least {expected} fields, got {got}")]
    TooFewFields {
        message: &'static str,
        expected: usize,
        got: usize,
    },

    /// A required field is empty.
    #[error("{message}: required field `{field}` is empty")]
    EmptyField {
        message: &'static str,
        field: &'static str,
    },

    /// Field text does not parse as its declared kind.
    #[error("{message}: field `{field}` has invalid {kind:?} value {value:?}")]
    InvalidField {
        message: &'static str,
        field: &'static str,
        kind: FieldKind,
        value: String,
    },

    #[error(transparent)]
    Message(#[from] MessageError),
}

/// Failures while negotiating the session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandshakeError {
    /// The preamble does not start with the protocol magic.
    #[error("handshake preamble does not start with the API magic")]
    BadMagic,

    /// Preamble or reply fields are missing or unparseable.
    #[error("malformed handshake: {0}")]
    Malformed(String),

    /// Gateway picked a version outside the offered range.
    #[error("gateway negotiated version {version}, outside offered range {min}..={max}")]
    VersionOutOfRange { version: u32, min: u32, max: u32 },

    /// Server time could not be parsed.
    #[error("invalid server time {0:?}")]
    InvalidServerTime(String),

    /// The gateway closed the socket before replying.
    #[error("gateway closed the connection during handshake")]
    Closed,

    /// No reply within the configured timeout.
    #[error("handshake timed out after {0} ms")]
    Timeout(u64),

    /// TCP connect did not complete within the configured timeout.
    #[error("connect timed out after {0} ms")]
    ConnectTimeout(u64),
}
