//! Session handshake.
//!
//! ```text
//! client → gateway (unframed)
//! ---------------------------
//! "API\0"
//! "v{min}..{max}\0"     supported protocol version range
//! "{client_id}\0"       client identifier requested by the caller
//!
//! gateway → client (framed, length-prefixed)
//! ------------------------------------------
//! "{version}\0"         negotiated protocol version
//! "{client_id}\0"       client id assigned to this session
//! "{server_time}\0"     yyyyMMdd HH:mm:ss [zone]
//! ```
//!
//! Both sides are implemented here so a gateway double can reuse them.

use bytes::BytesMut;
use chrono::{DateTime, Utc};

use crate::codec::{encode_fields, split_fields};
use crate::error::{EncodeError, HandshakeError};
use crate::frame::write_frame;
use crate::text::{format_datetime, parse_datetime};
use crate::wire_types::{FIELD_TERMINATOR, HANDSHAKE_MAGIC};

/// What the client offers when it opens a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preamble {
    pub min_version: u32,
    pub max_version: u32,
    pub client_id: i64,
}

impl Preamble {
    /// Append the unframed preamble to `out`.
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(HANDSHAKE_MAGIC);
        out.extend_from_slice(format!("v{}..{}", self.min_version, self.max_version).as_bytes());
        out.push(FIELD_TERMINATOR);
        out.extend_from_slice(self.client_id.to_string().as_bytes());
        out.push(FIELD_TERMINATOR);
    }

    /// Parse a preamble from the front of `buf`.
    ///
    /// Returns `Ok(None)` until all of it has arrived, otherwise the
    /// preamble and the number of bytes it occupied.
    pub fn parse(buf: &[u8]) -> Result<Option<(Preamble, usize)>, HandshakeError> {
        let magic_len = HANDSHAKE_MAGIC.len().min(buf.len());
        if buf[..magic_len] != HANDSHAKE_MAGIC[..magic_len] {
            return Err(HandshakeError::BadMagic);
        }
        if buf.len() < HANDSHAKE_MAGIC.len() {
            return Ok(None);
        }

        let body = &buf[HANDSHAKE_MAGIC.len()..];
        let mut terminators = body
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == FIELD_TERMINATOR)
            .map(|(i, _)| i);
        let (Some(first), Some(second)) = (terminators.next(), terminators.next()) else {
            return Ok(None);
        };

        let range = text(&body[..first])?;
        let client_id = text(&body[first + 1..second])?;

        let (min, max) = range
            .strip_prefix('v')
            .and_then(|r| r.split_once(".."))
            .ok_or_else(|| HandshakeError::Malformed(format!("version range {range:?}")))?;

        let preamble = Preamble {
            min_version: parse_num(min, "min version")?,
            max_version: parse_num(max, "max version")?,
            client_id: parse_num(client_id, "client id")?,
        };

        Ok(Some((preamble, HANDSHAKE_MAGIC.len() + second + 1)))
    }

    /// Check the gateway's answer against what was offered.
    pub fn accept(&self, reply: &HandshakeReply) -> Result<(), HandshakeError> {
        if reply.version < self.min_version || reply.version > self.max_version {
            return Err(HandshakeError::VersionOutOfRange {
                version: reply.version,
                min: self.min_version,
                max: self.max_version,
            });
        }
        Ok(())
    }
}

/// The gateway's answer to a [`Preamble`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeReply {
    pub version: u32,
    pub client_id: i64,
    pub server_time: DateTime<Utc>,
}

impl HandshakeReply {
    /// Parse the reply payload (length prefix already removed).
    pub fn parse(payload: &[u8]) -> Result<HandshakeReply, HandshakeError> {
        let fields = split_fields(payload).map_err(|e| HandshakeError::Malformed(e.to_string()))?;

        let [version, client_id, server_time, ..] = fields.as_slice() else {
            return Err(HandshakeError::Malformed(format!(
                "expected 3 reply fields, got {}",
                fields.len()
            )));
        };

        Ok(HandshakeReply {
            version: parse_num(version, "version")?,
            client_id: parse_num(client_id, "client id")?,
            server_time: parse_datetime(server_time)
                .ok_or_else(|| HandshakeError::InvalidServerTime(server_time.to_string()))?,
        })
    }

    /// Append the framed reply to `out`.
    pub fn encode_frame(&self, out: &mut BytesMut) -> Result<(), EncodeError> {
        let mut payload = Vec::with_capacity(48);
        encode_fields(
            &[
                self.version.to_string(),
                self.client_id.to_string(),
                format!("{} UTC", format_datetime(&self.server_time)),
            ],
            &mut payload,
        );
        write_frame(&payload, out)
    }
}

fn text(raw: &[u8]) -> Result<&str, HandshakeError> {
    std::str::from_utf8(raw).map_err(|_| HandshakeError::Malformed("non UTF-8 preamble".to_string()))
}

fn parse_num<T: std::str::FromStr>(s: &str, what: &str) -> Result<T, HandshakeError> {
    s.parse::<T>()
        .map_err(|_| HandshakeError::Malformed(format!("{what} {s:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::split_frame;
    use chrono::TimeZone;

    fn preamble() -> Preamble {
        Preamble {
            min_version: 100,
            max_version: 151,
            client_id: 7,
        }
    }

    #[test]
    fn preamble_wire_form() {
        let mut out = Vec::new();
        preamble().encode(&mut out);
        assert_eq!(out, b"API\0v100..151\07\0");
    }

    #[test]
    fn preamble_parse_waits_for_both_fields() {
        let mut out = Vec::new();
        preamble().encode(&mut out);

        for cut in 0..out.len() {
            assert_eq!(Preamble::parse(&out[..cut]).unwrap(), None, "cut at {cut}");
        }
        assert_eq!(Preamble::parse(&out).unwrap(), Some((preamble(), out.len())));
    }

    #[test]
    fn preamble_rejects_wrong_magic() {
        assert_eq!(Preamble::parse(b"GET / HTTP/1.1"), Err(HandshakeError::BadMagic));
    }

    #[test]
    fn reply_roundtrip_through_frame() {
        let reply = HandshakeReply {
            version: 151,
            client_id: 7,
            server_time: Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap(),
        };

        let mut buf = BytesMut::new();
        reply.encode_frame(&mut buf).unwrap();
        let payload = split_frame(&mut buf, 1024).unwrap().unwrap();

        assert_eq!(HandshakeReply::parse(&payload).unwrap(), reply);
    }

    #[test]
    fn accept_checks_version_range() {
        let reply = HandshakeReply {
            version: 99,
            client_id: 7,
            server_time: Utc::now(),
        };
        assert_eq!(
            preamble().accept(&reply),
            Err(HandshakeError::VersionOutOfRange {
                version: 99,
                min: 100,
                max: 151
            })
        );
    }

    #[test]
    fn reply_with_missing_fields_is_malformed() {
        assert!(matches!(
            HandshakeReply::parse(b"151\0"),
            Err(HandshakeError::Malformed(_))
        ));
    }
}
