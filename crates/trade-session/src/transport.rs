// Byte transport: framed reads into a growable buffer, serialized writes.

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use trade_protocol::split_frame;

use crate::error::Result;

pub(crate) type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;
pub(crate) type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

pub(crate) const READ_BUFFER_CAPACITY: usize = 64 * 1024;

/// Read until one complete frame payload can be split off `buf`.
///
/// Bytes past the frame stay in `buf` for the next call. Cancel safe:
/// anything read before cancellation is kept in `buf`.
pub(crate) async fn read_frame<R>(reader: &mut R, buf: &mut BytesMut, max_len: usize) -> Result<BytesMut>
where
    R: AsyncRead + Unpin + ?Sized,
{
    loop {
        if let Some(frame) = split_frame(buf, max_len)? {
            return Ok(frame);
        }

        let n = reader.read_buf(buf).await?;
        if n == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "gateway closed the connection").into());
        }
    }
}

/// Write half of the transport. Callers hold it behind a mutex so only
/// one frame is in flight at a time.
pub(crate) struct FrameWriter {
    inner: BoxedWriter,
}

impl FrameWriter {
    pub(crate) fn new(inner: BoxedWriter) -> Self {
        FrameWriter { inner }
    }

    /// Write already-encoded bytes (a whole frame, or the unframed
    /// handshake preamble) and flush.
    pub(crate) async fn write_all(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.inner.write_all(bytes).await?;
        self.inner.flush().await
    }

    pub(crate) async fn shutdown(&mut self) -> io::Result<()> {
        self.inner.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use trade_protocol::{write_frame, DecodeError};

    #[tokio::test]
    async fn reads_frames_across_partial_writes() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut writer = FrameWriter::new(Box::new(server));

        let mut wire = BytesMut::new();
        write_frame(b"49\01\01700000000\0", &mut wire).unwrap();
        write_frame(b"52\01\07\0", &mut wire).unwrap();

        let (head, tail) = wire.split_at(6);
        writer.write_all(head).await.unwrap();
        writer.write_all(tail).await.unwrap();

        let mut buf = BytesMut::new();
        let first = read_frame(&mut client, &mut buf, 1024).await.unwrap();
        assert_eq!(&first[..], b"49\01\01700000000\0");
        let second = read_frame(&mut client, &mut buf, 1024).await.unwrap();
        assert_eq!(&second[..], b"52\01\07\0");
    }

    #[tokio::test]
    async fn eof_is_an_io_error() {
        let (mut client, server) = tokio::io::duplex(64);
        drop(server);

        let err = read_frame(&mut client, &mut BytesMut::new(), 1024).await.unwrap_err();
        assert!(matches!(err, SessionError::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let (mut client, server) = tokio::io::duplex(64);
        let mut writer = FrameWriter::new(Box::new(server));
        writer.write_all(&[0, 1, 0, 0]).await.unwrap();

        let err = read_frame(&mut client, &mut BytesMut::new(), 1024).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Decoding(DecodeError::FrameTooLarge { len: 65536, max: 1024 })
        ));
    }
}
