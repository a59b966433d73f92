// crates/trade-session/examples/market_data.rs
//
// Connect to a gateway, subscribe to one symbol's market data and print
// what comes back for a few seconds.
//
//   GATEWAY_PORT=4002 RUST_LOG=info cargo run -p trade-session --example market_data -- AAPL

use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::{sleep_until, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

use trade_protocol::catalogue;
use trade_session::{Delivery, Engine, Message, SessionConfig, Subscriber};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let symbol = std::env::args().nth(1).unwrap_or_else(|| "AAPL".to_string());
    let config = SessionConfig::from_env().context("loading gateway config")?;
    let engine = Engine::connect(config).await.context("connecting to gateway")?;
    info!(
        version = engine.server_version(),
        client_id = engine.client_id(),
        server_time = %engine.server_time(),
        "connected"
    );

    let (sub, mut rx) = Subscriber::channel(256);
    engine.subscribe_broadcast(&sub)?;
    engine.subscribe_state(&sub)?;

    let id = engine.next_request_id();
    engine.subscribe(&sub, id)?;

    let mut request = Message::new(&catalogue::REQ_MKT_DATA)
        .with("symbol", symbol.as_str())?
        .with("sec_type", "STK")?
        .with("exchange", "SMART")?
        .with("currency", "USD")?;
    request.set_request_id(id)?;
    engine.send(&request).await?;

    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        tokio::select! {
            _ = sleep_until(deadline) => break,
            delivery = rx.recv() => match delivery {
                Some(Delivery::Message(msg)) => println!("{} {:?}", msg.name(), msg.values()),
                Some(Delivery::State(state)) => {
                    println!("session {state}");
                    break;
                }
                None => break,
            },
        }
    }

    engine.stop().await;
    if let Some(err) = engine.fatal_error() {
        anyhow::bail!("session ended with error: {err}");
    }
    Ok(())
}
