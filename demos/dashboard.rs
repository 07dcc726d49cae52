//! # Demo: dashboard
//!
//! Keeps two simulated feeds fresh: `prices` answers every time, `orders` is
//! throttled by its backend every few calls. The host goes to the background
//! for a while and comes back, which triggers an immediate refresh.
//!
//! ## Flow
//! ```text
//! Engine::start([prices, orders])
//!   ├─► prices: fetch at 0s, then every 2s (×4 while backgrounded)
//!   ├─► orders: fetch at 0s, then every 3s
//!   │     └─ 429 → BackoffScheduled{3000ms}, {4500ms}, then the slow curve {5000ms}
//!   ├─► 8s:  Background  ─► intervals scaled on the next computation
//!   └─► 16s: Foreground  ─► poll_now() for both feeds
//! Ctrl-C ─► Engine::stop()
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=pollvisor=debug cargo run --example dashboard
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use pollvisor::{
    Engine, EngineConfig, LogWriter, RawFailure, ResourceSpec, Subscribe, Visibility,
};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

static ORDER_CALLS: AtomicU64 = AtomicU64::new(0);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pollvisor=info")),
        )
        .init();

    // 1. Configure the engine (idle multiplier 4, fetches time out after 2s)
    let cfg = EngineConfig {
        idle_multiplier: 4,
        fetch_timeout: Duration::from_secs(2),
        ..EngineConfig::default()
    };

    // 2. Attach the tracing subscriber
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let engine = Engine::builder(cfg).with_subscribers(subs).build();

    // 3. Define the feeds
    let prices = ResourceSpec::from_fn(
        "prices",
        || async {
            tokio::time::sleep(Duration::from_millis(80)).await;
            Ok::<_, RawFailure>(vec![101.25f64, 99.5, 100.75])
        },
        |records: Vec<f64>| println!("[prices] {records:?}"),
    )
    .with_interval(Duration::from_secs(2));

    let orders = ResourceSpec::from_fn(
        "orders",
        || async {
            let call = ORDER_CALLS.fetch_add(1, Ordering::Relaxed) + 1;
            tokio::time::sleep(Duration::from_millis(120)).await;
            if (2..=4).contains(&call) {
                return Err(RawFailure::new(Some(429), "Too Many Requests"));
            }
            Ok(vec![format!("order-{call}")])
        },
        |records: Vec<String>| println!("[orders] {} record(s)", records.len()),
    )
    .with_interval(Duration::from_secs(3));

    // 4. Start and feed visibility from a watch channel
    let disposer = engine.start([prices, orders]).await?;
    let (visibility_tx, visibility_rx) = watch::channel(Visibility::Foreground);
    let listener = engine.visibility().spawn_listener(visibility_rx);

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(8)).await;
        println!("[host] hidden");
        let _ = visibility_tx.send(Visibility::Background);

        tokio::time::sleep(Duration::from_secs(8)).await;
        println!("[host] visible again");
        let _ = visibility_tx.send(Visibility::Foreground);
    });

    // 5. Run until Ctrl-C
    tokio::signal::ctrl_c().await?;
    println!("[main] stopping, failures(orders)={:?}", engine.failures("orders").await);
    disposer.dispose().await;
    listener.abort();

    println!("[main] done.");
    Ok(())
}
