//! Field encoding/decoding for schema-driven messages.
//!
//! This module converts between:
//! - raw frame payloads (`&[u8]`)
//! - `trade_core::Message` values described by a [`Schema`]
//!
//! Payload model:
//!
//! ```text
//! tag \0 field_1 \0 field_2 \0 ... field_n \0
//! ```
//!
//! - `tag` is the decimal message tag selecting the schema.
//! - Fields follow in declaration order, only those active at the
//!   negotiated protocol version.
//! - Every value is decimal ASCII / UTF-8 text:
//!   - Int / Float : Rust's shortest round-trip decimal form
//!   - Bool        : `0` / `1`
//!   - Epoch       : seconds since the Unix epoch
//!   - DateTime    : `yyyyMMdd HH:mm:ss`
//!   - Str         : raw text, no NUL allowed
//! - An empty field is `Unset`; only optional fields may be empty.
//!
//! Decoding tolerates extra trailing fields (newer gateways append
//! fields before the client learns about them) and missing trailing
//! optional fields.

use bytes::{Bytes, BytesMut};

use trade_core::{Direction, FieldKind, FieldSpec, FieldValue, Message, Schema};

use crate::catalogue::Catalogue;
use crate::error::{DecodeError, EncodeError};
use crate::frame::write_frame;
use crate::text::{format_datetime, parse_bool, parse_datetime, parse_epoch};
use crate::wire_types::{FIELD_TERMINATOR, LENGTH_PREFIX_LEN};

// ============================================================================
// ENCODE
// ============================================================================

/// Encode a message payload at protocol `version`.
///
/// The encoded bytes are appended to `out`.
pub fn encode(msg: &Message, version: u32, out: &mut Vec<u8>) -> Result<(), EncodeError> {
    let schema = msg.schema();

    push_field(out, &schema.tag.to_string());

    for (index, spec) in schema.fields.iter().enumerate() {
        let value = &msg.values()[index];

        if !spec.is_active(version) {
            if !value.is_unset() {
                return Err(EncodeError::UnsupportedField {
                    message: schema.name,
                    field: spec.name,
                    version,
                });
            }
            continue;
        }

        let text = encode_value(schema, spec, value)?;
        push_field(out, &text);
    }

    Ok(())
}

/// Encode a message and wrap it in a length-prefixed frame.
pub fn encode_frame(msg: &Message, version: u32) -> Result<Bytes, EncodeError> {
    let mut payload = Vec::with_capacity(128);
    encode(msg, version, &mut payload)?;

    let mut frame = BytesMut::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    write_frame(&payload, &mut frame)?;
    Ok(frame.freeze())
}

/// Encode raw text fields as a payload: every field NUL-terminated.
///
/// Used for the handshake reply, which has no tag.
pub fn encode_fields<S: AsRef<str>>(fields: &[S], out: &mut Vec<u8>) {
    for field in fields {
        push_field(out, field.as_ref());
    }
}

fn encode_value(
    schema: &Schema,
    spec: &FieldSpec,
    value: &FieldValue,
) -> Result<String, EncodeError> {
    let value = match value {
        FieldValue::Unset => match spec.default {
            Some(default) => FieldValue::from(default),
            None if spec.optional => return Ok(String::new()),
            None => {
                return Err(EncodeError::MissingField {
                    message: schema.name,
                    field: spec.name,
                })
            }
        },
        other => other.clone(),
    };

    let text = match (spec.kind, value) {
        (FieldKind::Int, FieldValue::Int(v)) => v.to_string(),
        (FieldKind::Float, FieldValue::Float(v)) => v.to_string(),
        (FieldKind::Float, FieldValue::Int(v)) => (v as f64).to_string(),
        (FieldKind::Bool, FieldValue::Bool(v)) => (if v { "1" } else { "0" }).to_string(),
        (FieldKind::Epoch, FieldValue::Time(t)) => t.timestamp().to_string(),
        (FieldKind::DateTime, FieldValue::Time(t)) => format_datetime(&t),
        (FieldKind::Str, FieldValue::Str(s)) => {
            if s.as_bytes().contains(&FIELD_TERMINATOR) {
                return Err(EncodeError::EmbeddedNul {
                    message: schema.name,
                    field: spec.name,
                });
            }
            s
        }
        (kind, other) => {
            return Err(EncodeError::KindMismatch {
                message: schema.name,
                field: spec.name,
                expected: kind,
                got: other.kind_name(),
            })
        }
    };

    Ok(text)
}

fn push_field(out: &mut Vec<u8>, text: &str) {
    out.extend_from_slice(text.as_bytes());
    out.push(FIELD_TERMINATOR);
}

// ============================================================================
// DECODE
// ============================================================================

/// Split a payload into its NUL-terminated text fields.
pub fn split_fields(payload: &[u8]) -> Result<Vec<&str>, DecodeError> {
    if payload.is_empty() {
        return Ok(Vec::new());
    }
    if payload.last() != Some(&FIELD_TERMINATOR) {
        return Err(DecodeError::Unterminated);
    }

    payload[..payload.len() - 1]
        .split(|b| *b == FIELD_TERMINATOR)
        .enumerate()
        .map(|(index, raw)| std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8 { index }))
        .collect()
}

/// Decode a single payload (without length prefix) at protocol `version`.
///
/// `direction` selects which half of the catalogue the tag is looked up
/// in: clients decode `Inbound`, a gateway (or a test double) decodes
/// `Outbound`.
pub fn decode(
    payload: &[u8],
    direction: Direction,
    version: u32,
    catalogue: &Catalogue,
) -> Result<Message, DecodeError> {
    if payload.is_empty() {
        return Err(DecodeError::InvalidTag(String::new()));
    }
    if payload.last() != Some(&FIELD_TERMINATOR) {
        return Err(DecodeError::Unterminated);
    }

    // The tag is read on its own so an unknown kind can still be
    // reported with its raw fields, whatever bytes they hold.
    let split = payload
        .iter()
        .position(|b| *b == FIELD_TERMINATOR)
        .unwrap_or(payload.len() - 1);
    let (tag_raw, rest) = (&payload[..split], &payload[split + 1..]);

    let tag_text = std::str::from_utf8(tag_raw)
        .map_err(|_| DecodeError::InvalidTag(String::from_utf8_lossy(tag_raw).into_owned()))?;
    let tag = tag_text
        .parse::<u32>()
        .map_err(|_| DecodeError::InvalidTag(tag_text.to_string()))?;

    let Some(schema) = catalogue.lookup(direction, tag) else {
        return Err(DecodeError::UnknownTag {
            tag,
            fields: lossy_fields(rest),
        });
    };

    let fields = split_fields(rest)?;
    decode_fields(schema, &fields, version)
}

fn lossy_fields(rest: &[u8]) -> Vec<String> {
    match rest.split_last() {
        Some((_, body)) => body
            .split(|b| *b == FIELD_TERMINATOR)
            .map(|raw| String::from_utf8_lossy(raw).into_owned())
            .collect(),
        None => Vec::new(),
    }
}

/// Decode a length-prefixed frame from the front of `bytes`.
///
/// Returns the message and the number of bytes consumed.
pub fn decode_frame(
    bytes: &[u8],
    direction: Direction,
    version: u32,
    catalogue: &Catalogue,
) -> Result<(Message, usize), DecodeError> {
    if bytes.len() < LENGTH_PREFIX_LEN {
        return Err(DecodeError::Truncated {
            needed: LENGTH_PREFIX_LEN,
            available: bytes.len(),
        });
    }

    let len = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let end = LENGTH_PREFIX_LEN + len;
    if bytes.len() < end {
        return Err(DecodeError::Truncated {
            needed: end,
            available: bytes.len(),
        });
    }

    let msg = decode(&bytes[LENGTH_PREFIX_LEN..end], direction, version, catalogue)?;
    Ok((msg, end))
}

fn decode_fields(schema: &'static Schema, raw: &[&str], version: u32) -> Result<Message, DecodeError> {
    let required = schema.required_count(version);
    if raw.len() < required {
        return Err(DecodeError::TooFewFields {
            message: schema.name,
            expected: required,
            got: raw.len(),
        });
    }

    let mut values = vec![FieldValue::Unset; schema.fields.len()];
    let mut cursor = raw.iter();

    for (index, spec) in schema.active_fields(version) {
        let Some(text) = cursor.next() else {
            // Trailing optional fields may be omitted entirely.
            break;
        };
        values[index] = decode_value(schema, spec, text)?;
    }

    Ok(Message::from_values(schema, values)?)
}

fn decode_value(schema: &Schema, spec: &FieldSpec, text: &str) -> Result<FieldValue, DecodeError> {
    if text.is_empty() {
        return match spec.kind {
            FieldKind::Str if !spec.optional => Ok(FieldValue::Str(String::new())),
            _ if spec.optional => Ok(FieldValue::Unset),
            _ => Err(DecodeError::EmptyField {
                message: schema.name,
                field: spec.name,
            }),
        };
    }

    let parsed = match spec.kind {
        FieldKind::Int => text.parse::<i64>().ok().map(FieldValue::Int),
        FieldKind::Float => text.parse::<f64>().ok().map(FieldValue::Float),
        FieldKind::Bool => parse_bool(text).map(FieldValue::Bool),
        FieldKind::Epoch => parse_epoch(text).map(FieldValue::Time),
        FieldKind::DateTime => parse_datetime(text).map(FieldValue::Time),
        FieldKind::Str => Some(FieldValue::Str(text.to_string())),
    };

    parsed.ok_or_else(|| DecodeError::InvalidField {
        message: schema.name,
        field: spec.name,
        kind: spec.kind,
        value: text.to_string(),
    })
}
