//! The session engine facade.
//!
//! An [`Engine`] is a connected, handshaken session. It is cheap to
//! clone; every clone drives the same connection. Dropping the last clone
//! without calling [`Engine::stop`] still shuts the reader down and
//! reports `ExitNormal` to state subscribers.

use std::sync::{Arc, Mutex, PoisonError};

use bytes::BytesMut;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use trade_core::{EngineState, Message, RequestId, RequestIdAllocator};
use trade_protocol::{encode_frame, Catalogue, HandshakeError};

use crate::config::SessionConfig;
use crate::endpoint::Subscriber;
use crate::error::{Result, SessionError};
use crate::handshake;
use crate::reader;
use crate::registry::{Registry, RegistryClosed, SubscriptionKey};
use crate::state::StateMachine;
use crate::transport::{BoxedReader, FrameWriter, READ_BUFFER_CAPACITY};

/// State shared between the facade and the reader task.
pub(crate) struct Shared {
    pub(crate) config: SessionConfig,
    pub(crate) catalogue: Arc<Catalogue>,
    /// Negotiated protocol version.
    pub(crate) version: u32,
    pub(crate) ids: RequestIdAllocator,
    pub(crate) registry: Registry,
    pub(crate) state: StateMachine,
    writer: AsyncMutex<Option<FrameWriter>>,
    shutdown: watch::Sender<bool>,
}

impl Shared {
    /// Enter the exit state `next`.
    ///
    /// Closes the registry (which publishes `next` to state subscribers)
    /// before `next` is visible through `state()`, then stops the reader
    /// and shuts the write half down. Returns `false` if the session had
    /// already exited.
    pub(crate) async fn finish(&self, next: EngineState, cause: Option<SessionError>) -> bool {
        if !self.state.transition_with(next, cause, || self.registry.close(next)) {
            return false;
        }

        match self.state.fatal() {
            Some(e) => error!(state = %next, error = %e, "session failed"),
            None => info!(state = %next, "session stopped"),
        }

        let _ = self.shutdown.send(true);

        if let Some(mut writer) = self.writer.lock().await.take() {
            if let Err(e) = writer.shutdown().await {
                debug!(error = %e, "transport shutdown failed");
            }
        }
        true
    }
}

struct Inner {
    shared: Arc<Shared>,
    client_id: i64,
    server_time: DateTime<Utc>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let _ = self.shared.shutdown.send(true);
    }
}

/// Handle to a live gateway session.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

impl Engine {
    /// Connect over TCP with the standard catalogue.
    pub async fn connect(config: SessionConfig) -> Result<Engine> {
        Self::connect_with_catalogue(config, Arc::new(Catalogue::standard())).await
    }

    pub async fn connect_with_catalogue(config: SessionConfig, catalogue: Arc<Catalogue>) -> Result<Engine> {
        config.validate()?;
        let addr = config.socket_addr_string();
        info!(%addr, client_id = config.client_id, "connecting to gateway");

        let stream = match timeout(config.connect_timeout(), TcpStream::connect(&addr)).await {
            Ok(stream) => stream?,
            Err(_) => return Err(HandshakeError::ConnectTimeout(config.connect_timeout_ms).into()),
        };
        stream.set_nodelay(true)?;

        Self::from_stream(stream, config, catalogue).await
    }

    /// Run a session over an already-open transport.
    ///
    /// Returns once the handshake has completed and the reader is running.
    pub async fn from_stream<S>(stream: S, config: SessionConfig, catalogue: Arc<Catalogue>) -> Result<Engine>
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        config.validate()?;

        let (read_half, write_half) = tokio::io::split(stream);
        let mut reader: BoxedReader = Box::new(read_half);
        let mut writer = FrameWriter::new(Box::new(write_half));
        let mut buf = BytesMut::with_capacity(READ_BUFFER_CAPACITY);

        let reply = match timeout(
            config.handshake_timeout(),
            handshake::perform(&mut reader, &mut writer, &mut buf, &config),
        )
        .await
        {
            Ok(reply) => reply?,
            Err(_) => return Err(HandshakeError::Timeout(config.handshake_timeout_ms).into()),
        };

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let shared = Arc::new(Shared {
            config,
            catalogue,
            version: reply.version,
            ids: RequestIdAllocator::new(),
            registry: Registry::new(),
            state: StateMachine::new(EngineState::Connecting),
            writer: AsyncMutex::new(Some(writer)),
            shutdown: shutdown_tx,
        });
        shared.state.transition(EngineState::Ready, None);
        info!(version = reply.version, client_id = reply.client_id, "session ready");

        // Anything that arrived behind the handshake reply is handed over.
        let handle = tokio::spawn(reader::run(Arc::clone(&shared), reader, buf, shutdown_rx));

        Ok(Engine {
            inner: Arc::new(Inner {
                shared,
                client_id: reply.client_id,
                server_time: reply.server_time,
                reader: Mutex::new(Some(handle)),
            }),
        })
    }

    fn shared(&self) -> &Shared {
        &self.inner.shared
    }

    pub fn state(&self) -> EngineState {
        self.shared().state.get()
    }

    /// The error that ended the session, once it has ended abnormally.
    pub fn fatal_error(&self) -> Option<&SessionError> {
        self.shared().state.fatal()
    }

    /// Client id the gateway assigned in the handshake.
    pub fn client_id(&self) -> i64 {
        self.inner.client_id
    }

    pub fn server_version(&self) -> u32 {
        self.shared().version
    }

    pub fn server_time(&self) -> DateTime<Utc> {
        self.inner.server_time
    }

    pub fn next_request_id(&self) -> RequestId {
        self.shared().ids.next()
    }

    /// Encode `msg` at the negotiated version and write it as one frame.
    ///
    /// A write failure ends the session with `ExitError`; the same error
    /// is returned here.
    pub async fn send(&self, msg: &Message) -> Result<()> {
        let shared = self.shared();
        let state = shared.state.get();
        if state != EngineState::Ready {
            return Err(SessionError::NotReady(state));
        }

        let frame = encode_frame(msg, shared.version)?;

        let written = {
            let mut guard = shared.writer.lock().await;
            match guard.as_mut() {
                Some(writer) => writer.write_all(&frame).await,
                None => return Err(SessionError::NotReady(shared.state.get())),
            }
        };

        if let Err(e) = written {
            let err = SessionError::from(e);
            warn!(message = msg.name(), error = %err, "write failed");
            shared.finish(EngineState::ExitError, Some(err.duplicate())).await;
            return Err(err);
        }

        debug!(message = msg.name(), request_id = ?msg.request_id(), bytes = frame.len(), "sent");
        Ok(())
    }

    /// Deliver every reply carrying `id` to `subscriber`.
    pub fn subscribe(&self, subscriber: &Subscriber, id: RequestId) -> Result<()> {
        self.subscribe_key(SubscriptionKey::Request(id), subscriber)
    }

    pub fn unsubscribe(&self, subscriber: &Subscriber, id: RequestId) {
        self.shared().registry.unsubscribe(SubscriptionKey::Request(id), subscriber);
    }

    /// Deliver unsolicited messages and replies no one subscribed to.
    pub fn subscribe_broadcast(&self, subscriber: &Subscriber) -> Result<()> {
        self.subscribe_key(SubscriptionKey::Broadcast, subscriber)
    }

    pub fn unsubscribe_broadcast(&self, subscriber: &Subscriber) {
        self.shared().registry.unsubscribe(SubscriptionKey::Broadcast, subscriber);
    }

    /// Deliver state transitions, including the terminal one.
    pub fn subscribe_state(&self, subscriber: &Subscriber) -> Result<()> {
        self.subscribe_key(SubscriptionKey::State, subscriber)
    }

    pub fn unsubscribe_state(&self, subscriber: &Subscriber) {
        self.shared().registry.unsubscribe(SubscriptionKey::State, subscriber);
    }

    fn subscribe_key(&self, key: SubscriptionKey, subscriber: &Subscriber) -> Result<()> {
        let state = self.state();
        if state != EngineState::Ready {
            return Err(SessionError::NotReady(state));
        }
        match self.shared().registry.subscribe(key, subscriber) {
            Ok(_) => Ok(()),
            Err(RegistryClosed(state)) => Err(SessionError::NotReady(state)),
        }
    }

    /// Close the session and wait for the reader to finish.
    ///
    /// Calling it again, or after the session failed, is a no-op.
    pub async fn stop(&self) {
        self.shared().finish(EngineState::ExitNormal, None).await;

        let handle = self
            .inner
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "reader task ended abnormally");
            }
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state())
            .field("client_id", &self.inner.client_id)
            .field("version", &self.shared().version)
            .finish()
    }
}
