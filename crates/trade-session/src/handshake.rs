//! Client side of session negotiation.

use std::io;

use bytes::BytesMut;
use tracing::{debug, info};

use trade_protocol::{HandshakeError, HandshakeReply, Preamble};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::transport::{read_frame, BoxedReader, FrameWriter};

/// Send the preamble and wait for the gateway's reply.
///
/// Any bytes the gateway sent after the reply frame are left in `buf`
/// for the reader loop.
pub(crate) async fn perform(
    reader: &mut BoxedReader,
    writer: &mut FrameWriter,
    buf: &mut BytesMut,
    config: &SessionConfig,
) -> Result<HandshakeReply> {
    let preamble = Preamble {
        min_version: config.min_version,
        max_version: config.max_version,
        client_id: config.client_id,
    };

    let mut out = Vec::with_capacity(32);
    preamble.encode(&mut out);
    if let Err(e) = writer.write_all(&out).await {
        return Err(match e.kind() {
            io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset | io::ErrorKind::UnexpectedEof => {
                HandshakeError::Closed.into()
            }
            _ => e.into(),
        });
    }
    debug!(
        min = preamble.min_version,
        max = preamble.max_version,
        client_id = preamble.client_id,
        "handshake preamble sent"
    );

    let payload = match read_frame(reader, buf, config.max_frame_len).await {
        Ok(payload) => payload,
        Err(SessionError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => {
            return Err(HandshakeError::Closed.into());
        }
        Err(SessionError::Decoding(e)) => return Err(HandshakeError::Malformed(e.to_string()).into()),
        Err(e) => return Err(e),
    };

    let reply = HandshakeReply::parse(&payload)?;
    preamble.accept(&reply)?;

    info!(
        version = reply.version,
        client_id = reply.client_id,
        server_time = %reply.server_time,
        "handshake complete"
    );
    Ok(reply)
}
