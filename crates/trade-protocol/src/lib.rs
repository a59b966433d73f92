//! trade-protocol
//!
//! Wire-level encoding/decoding for the gateway session.
//!
//! This crate is responsible for turning schema-driven
//! `trade_core::Message`s into length-prefixed frames and back again.
//!
//! - [`wire_types`] : tags, version constants, separators
//! - [`catalogue`]  : the per-version schema table keyed by tag
//! - [`frame`]      : length-prefix framing over a byte buffer
//! - [`codec`]      : field encode/decode driven by a schema
//! - [`handshake`]  : unframed preamble and framed handshake reply

pub mod wire_types;
pub mod catalogue;
pub mod error;
pub mod frame;
pub mod codec;
pub mod handshake;
mod text;

pub use catalogue::Catalogue;
pub use codec::{decode, decode_frame, encode, encode_frame};
pub use error::{DecodeError, EncodeError, HandshakeError};
pub use frame::{split_frame, write_frame};
pub use handshake::{HandshakeReply, Preamble};
