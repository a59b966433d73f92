// crates/trade-session/tests/support/mod.rs
//
// A scripted gateway double plus helpers shared by the session tests.
#![allow(dead_code)]

use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use bytes::BytesMut;
use chrono::{DateTime, TimeZone, Utc};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream, ReadBuf};
use tokio::sync::mpsc;
use tokio::time::{timeout, timeout_at, Instant};

use trade_core::{Direction, EngineState, Message, RequestId};
use trade_protocol::catalogue;
use trade_protocol::codec::encode_fields;
use trade_protocol::wire_types::DEFAULT_MAX_FRAME_LEN;
use trade_protocol::{decode, encode_frame, split_frame, write_frame, Catalogue, HandshakeReply, Preamble};
use trade_session::{Delivery, Engine, SessionConfig};

pub const WAIT: Duration = Duration::from_secs(2);
pub const QUIET: Duration = Duration::from_millis(100);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn test_config() -> SessionConfig {
    SessionConfig {
        client_id: 7,
        handshake_timeout_ms: 2_000,
        ..SessionConfig::default()
    }
}

pub fn server_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap()
}

/// Gateway side of a session over any byte stream.
pub struct FakeGateway<S> {
    stream: S,
    buf: BytesMut,
    catalogue: Catalogue,
    pub version: u32,
}

impl<S> FakeGateway<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S) -> Self {
        FakeGateway {
            stream,
            buf: BytesMut::with_capacity(4096),
            catalogue: Catalogue::standard(),
            version: 0,
        }
    }

    /// Read the preamble and answer with the highest offered version.
    pub async fn accept(&mut self) -> Result<Preamble> {
        let preamble = self.read_preamble().await?;
        self.reply(preamble.max_version, preamble.client_id).await?;
        Ok(preamble)
    }

    /// Read the preamble and answer with `version`, in range or not.
    pub async fn accept_with_version(&mut self, version: u32) -> Result<Preamble> {
        let preamble = self.read_preamble().await?;
        self.reply(version, preamble.client_id).await?;
        Ok(preamble)
    }

    pub async fn read_preamble(&mut self) -> Result<Preamble> {
        loop {
            if let Some((preamble, used)) = Preamble::parse(&self.buf)? {
                let _ = self.buf.split_to(used);
                return Ok(preamble);
            }
            self.fill().await?;
        }
    }

    async fn reply(&mut self, version: u32, client_id: i64) -> Result<()> {
        let reply = HandshakeReply {
            version,
            client_id,
            server_time: server_time(),
        };
        let mut out = BytesMut::new();
        reply.encode_frame(&mut out)?;
        self.stream.write_all(&out).await?;
        self.version = version;
        Ok(())
    }

    /// Next request the client sent, decoded against the outbound catalogue.
    pub async fn next_request(&mut self) -> Result<Message> {
        let payload = self.read_frame().await?;
        Ok(decode(&payload, Direction::Outbound, self.version, &self.catalogue)?)
    }

    pub async fn send(&mut self, msg: &Message) -> Result<()> {
        let frame = encode_frame(msg, self.version)?;
        self.stream.write_all(&frame).await?;
        Ok(())
    }

    /// Frame arbitrary fields, bypassing the catalogue.
    pub async fn send_raw_fields(&mut self, fields: &[&str]) -> Result<()> {
        let mut payload = Vec::new();
        encode_fields(fields, &mut payload);
        let mut out = BytesMut::new();
        write_frame(&payload, &mut out)?;
        self.stream.write_all(&out).await?;
        Ok(())
    }

    pub async fn send_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.stream.write_all(bytes).await?;
        Ok(())
    }

    pub fn disconnect(self) {
        drop(self);
    }

    async fn read_frame(&mut self) -> Result<BytesMut> {
        loop {
            if let Some(frame) = split_frame(&mut self.buf, DEFAULT_MAX_FRAME_LEN)? {
                return Ok(frame);
            }
            self.fill().await?;
        }
    }

    async fn fill(&mut self) -> Result<()> {
        let n = timeout(WAIT, self.stream.read_buf(&mut self.buf))
            .await
            .context("gateway read timed out")??;
        if n == 0 {
            bail!("client closed the connection");
        }
        Ok(())
    }
}

/// An engine connected to a fake gateway over an in-memory pipe.
pub async fn connected_pair(config: SessionConfig) -> (Engine, FakeGateway<DuplexStream>) {
    init_tracing();
    let (client, server) = tokio::io::duplex(64 * 1024);
    let mut gateway = FakeGateway::new(server);

    let (engine, accepted) = tokio::join!(
        Engine::from_stream(client, config, Arc::new(Catalogue::standard())),
        gateway.accept()
    );
    accepted.expect("gateway handshake");
    (engine.expect("engine connects"), gateway)
}

/// Client stream whose writes start failing with `BrokenPipe` once
/// `broken` is set. Reads pass through untouched.
pub struct BreakableWrites {
    inner: DuplexStream,
    broken: Arc<AtomicBool>,
}

impl BreakableWrites {
    pub fn new(inner: DuplexStream) -> (Self, Arc<AtomicBool>) {
        let broken = Arc::new(AtomicBool::new(false));
        (
            BreakableWrites {
                inner,
                broken: Arc::clone(&broken),
            },
            broken,
        )
    }

    fn check(&self) -> io::Result<()> {
        if self.broken.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "write side broken"));
        }
        Ok(())
    }
}

impl AsyncRead for BreakableWrites {
    fn poll_read(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>, buf: &mut ReadBuf<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_read(cx, buf)
    }
}

impl AsyncWrite for BreakableWrites {
    fn poll_write(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        if let Err(e) = self.check() {
            return Poll::Ready(Err(e));
        }
        Pin::new(&mut self.inner).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
        if let Err(e) = self.check() {
            return Poll::Ready(Err(e));
        }
        Pin::new(&mut self.inner).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.inner).poll_shutdown(cx)
    }
}

/// Wait for a message with one of `tags`, skipping anything else.
pub async fn expect(rx: &mut mpsc::Receiver<Delivery>, within: Duration, tags: &[u32]) -> Arc<Message> {
    let deadline = Instant::now() + within;
    loop {
        let delivery = timeout_at(deadline, rx.recv())
            .await
            .unwrap_or_else(|_| panic!("no message with tag in {tags:?} within {within:?}"))
            .expect("delivery channel closed");

        match delivery {
            Delivery::Message(msg) if tags.contains(&msg.tag()) => return msg,
            other => tracing::debug!(?other, "skipping delivery"),
        }
    }
}

pub async fn expect_state(rx: &mut mpsc::Receiver<Delivery>, within: Duration) -> EngineState {
    let deadline = Instant::now() + within;
    loop {
        let delivery = timeout_at(deadline, rx.recv())
            .await
            .expect("no state delivery in time")
            .expect("delivery channel closed");
        if let Delivery::State(state) = delivery {
            return state;
        }
    }
}

/// `None` if nothing arrives within `within`.
pub async fn next_within(rx: &mut mpsc::Receiver<Delivery>, within: Duration) -> Option<Delivery> {
    timeout(within, rx.recv()).await.ok().flatten()
}

pub fn mkt_data_request(id: RequestId, symbol: &str) -> Message {
    let mut msg = Message::new(&catalogue::REQ_MKT_DATA)
        .with("symbol", symbol)
        .and_then(|m| m.with("sec_type", "STK"))
        .and_then(|m| m.with("exchange", "SMART"))
        .and_then(|m| m.with("currency", "USD"))
        .unwrap();
    msg.set_request_id(id).unwrap();
    msg
}

pub fn tick_price(id: RequestId, price: f64) -> Message {
    Message::new(&catalogue::TICK_PRICE)
        .with("version", 6)
        .and_then(|m| m.with("req_id", id))
        .and_then(|m| m.with("tick_type", 1))
        .and_then(|m| m.with("price", price))
        .and_then(|m| m.with("attr_mask", 0))
        .unwrap()
}

pub fn contract_data_end(id: i64) -> Message {
    Message::new(&catalogue::CONTRACT_DATA_END)
        .with("version", 1)
        .and_then(|m| m.with("req_id", id))
        .unwrap()
}

pub fn err_msg(id: i64, code: i64, text: &str) -> Message {
    Message::new(&catalogue::ERR_MSG)
        .with("version", 2)
        .and_then(|m| m.with("id", id))
        .and_then(|m| m.with("code", code))
        .and_then(|m| m.with("message", text))
        .unwrap()
}

pub fn current_time(secs: i64) -> Message {
    Message::new(&catalogue::CURRENT_TIME)
        .with("version", 1)
        .and_then(|m| m.with("time", Utc.timestamp_opt(secs, 0).unwrap()))
        .unwrap()
}

pub fn next_valid_id(order_id: i64) -> Message {
    Message::new(&catalogue::NEXT_VALID_ID)
        .with("version", 1)
        .and_then(|m| m.with("order_id", order_id))
        .unwrap()
}
