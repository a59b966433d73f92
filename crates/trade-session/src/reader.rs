// crates/trade-session/src/reader.rs
//
// Reader task: pull frames off the transport, decode them at the
// negotiated version and hand them to the registry.

use std::sync::Arc;

use bytes::BytesMut;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use trade_core::{Direction, EngineState, Message};
use trade_protocol::catalogue::NEXT_VALID_ID;
use trade_protocol::{decode, DecodeError};

use crate::endpoint::Delivery;
use crate::engine::Shared;
use crate::registry::SubscriptionKey;
use crate::transport::{read_frame, BoxedReader};

/// Run until the transport fails, the decode failure limit is exceeded,
/// or shutdown is signalled.
pub(crate) async fn run(
    shared: Arc<Shared>,
    mut reader: BoxedReader,
    mut buf: BytesMut,
    mut shutdown: watch::Receiver<bool>,
) {
    let max_frame_len = shared.config.max_frame_len;
    let limit = shared.config.max_consecutive_decode_failures;
    let mut failures: u32 = 0;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let frame = tokio::select! {
            biased;
            _ = shutdown.changed() => break,
            frame = read_frame(&mut reader, &mut buf, max_frame_len) => frame,
        };

        let payload = match frame {
            Ok(payload) => payload,
            Err(e) => {
                // Transport errors and unsplittable frames both end the session.
                shared.finish(EngineState::ExitError, Some(e)).await;
                return;
            }
        };

        if shared.state.get().is_terminal() {
            break;
        }

        match decode(&payload, Direction::Inbound, shared.version, &shared.catalogue) {
            Ok(msg) => {
                failures = 0;
                route(&shared, msg);
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                match &e {
                    DecodeError::UnknownTag { tag, fields } => {
                        warn!(tag, ?fields, consecutive = failures, "unknown message tag, frame dropped");
                    }
                    other => {
                        warn!(error = %other, consecutive = failures, "undecodable frame dropped");
                    }
                }

                if limit != 0 && failures > limit {
                    shared.finish(EngineState::ExitError, Some(e.into())).await;
                    return;
                }
            }
        }
    }

    // Shutdown without an exit transition means every engine handle was
    // dropped while the session was still up.
    if !shared.state.get().is_terminal() {
        shared.finish(EngineState::ExitNormal, None).await;
    }
    info!("reader stopped");
}

/// Pick the dispatch key for `msg` and deliver it.
fn route(shared: &Shared, msg: Message) {
    if *msg.schema() == NEXT_VALID_ID {
        if let Some(next) = msg.int("order_id") {
            shared.ids.advance_to(next);
            debug!(next, "request ids seeded by gateway");
        }
    }

    let key = match msg.request_id() {
        Some(id) if id.0 > 0 => SubscriptionKey::Request(id),
        _ => SubscriptionKey::Broadcast,
    };

    let name = msg.name();
    let delivery = Delivery::Message(Arc::new(msg));

    let mut routed_to = key;
    let mut matched = shared.registry.dispatch(key, &delivery);
    if matched == 0 && key != SubscriptionKey::Broadcast {
        routed_to = SubscriptionKey::Broadcast;
        matched = shared.registry.dispatch(SubscriptionKey::Broadcast, &delivery);
    }

    if matched == 0 {
        debug!(message = name, %key, "no subscribers, message dropped");
    } else {
        debug!(message = name, key = %routed_to, subscribers = matched, "dispatched");
    }
}
