//! Scoutlink Signal Server
//!
//! Signaling relay for lead/scout peer discovery at a competition. Peers
//! short-poll per-room mailboxes over plain HTTP; once direct channels are
//! up, bulk data bypasses this server entirely.
//!
//! # Usage
//!
//! ```bash
//! scoutlink-signal --port 8080
//!
//! # Shorter room lifetime for testing
//! scoutlink-signal --port 8080 --room-ttl-secs 120
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use scoutlink_signal::{SignalBroker, SignalServer, DEFAULT_PORT, ROOM_TTL_SECS};

#[derive(Parser, Debug)]
#[command(name = "scoutlink-signal")]
#[command(about = "Scoutlink signaling server for lead/scout peer discovery")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Bind address
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Room time-to-live in seconds, counted from creation
    #[arg(long, default_value_t = ROOM_TTL_SECS)]
    room_ttl_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();

    let addr: SocketAddr = format!("{}:{}", args.bind, args.port).parse()?;
    let ttl = Duration::from_secs(args.room_ttl_secs);

    info!("Starting Scoutlink Signal Server");
    info!("Listening on {}, room TTL {}s", addr, args.room_ttl_secs);

    let broker = Arc::new(SignalBroker::in_memory());

    // Sweep cadence matches the TTL; the sweeper dies with the server
    let sweeper = broker.clone().spawn_sweeper(ttl, ttl);

    let server = SignalServer::new(broker);
    let result = server.serve(addr).await;

    sweeper.abort();
    result?;

    Ok(())
}
