//! Length-prefix framing.
//!
//! ```text
//! +------------------+---------------------------------+
//! | len (u32 BE)     | payload (len bytes)             |
//! +------------------+---------------------------------+
//! ```
//!
//! The splitter works on a growable read buffer so a transport can
//! append whatever the socket returned and pull out complete frames.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{DecodeError, EncodeError};
use crate::wire_types::LENGTH_PREFIX_LEN;

/// Remove one complete frame payload from the front of `buf`.
///
/// Returns `Ok(None)` while the frame is still incomplete. A length
/// above `max_len` cannot be skipped safely and is reported as an error;
/// the buffer is left untouched in that case.
pub fn split_frame(buf: &mut BytesMut, max_len: usize) -> Result<Option<BytesMut>, DecodeError> {
    if buf.len() < LENGTH_PREFIX_LEN {
        return Ok(None);
    }

    let len = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]) as usize;
    if len > max_len {
        return Err(DecodeError::FrameTooLarge { len, max: max_len });
    }

    if buf.len() < LENGTH_PREFIX_LEN + len {
        // Make room for the rest of the frame in one go.
        buf.reserve(LENGTH_PREFIX_LEN + len - buf.len());
        return Ok(None);
    }

    buf.advance(LENGTH_PREFIX_LEN);
    Ok(Some(buf.split_to(len)))
}

/// Append `payload` to `out` with its length prefix.
pub fn write_frame(payload: &[u8], out: &mut BytesMut) -> Result<(), EncodeError> {
    let len = u32::try_from(payload.len()).map_err(|_| EncodeError::FrameTooLarge(payload.len()))?;
    out.reserve(LENGTH_PREFIX_LEN + payload.len());
    out.put_u32(len);
    out.extend_from_slice(payload);
    Ok(())
}
