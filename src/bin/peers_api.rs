//! Tracks every peer the local node has connected to and serves the list at
//! `GET /peers`.

use clap::Parser;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use zkscam_boot::peers::{self, PeerBook};
use zkscam_boot::rpc::HttpRpc;
use zkscam_boot::ticker::StopSignal;

#[derive(Parser, Debug)]
#[command(name = "peers-api", version, about = "Collects node peers and serves them over HTTP")]
struct Cli {
    /// Node JSON-RPC endpoint
    #[arg(long, default_value = "http://127.0.0.1:8545")]
    rpc_url: String,

    /// Port of the peers API
    #[arg(long, default_value_t = peers::DEFAULT_API_PORT)]
    port: u16,

    /// Seconds between admin_peers calls
    #[arg(long, default_value_t = peers::DEFAULT_POLL_INTERVAL.as_secs())]
    interval_secs: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let book = Arc::new(Mutex::new(PeerBook::default()));
    let stop = StopSignal::new();

    // The blocking RPC client lives on its own thread, outside the runtime.
    let poller = {
        let book = book.clone();
        let stop = stop.clone();
        let interval = Duration::from_secs(cli.interval_secs);
        let rpc_url = cli.rpc_url.clone();
        thread::spawn(move || {
            let rpc = HttpRpc::new(rpc_url);
            peers::poll_peers(&rpc, &book, interval, stop);
        })
    };

    let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
    let shutdown = async {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Ctrl-C received, stopping...");
    };
    let served = peers::serve(addr, book, shutdown).await;

    stop.stop();
    if poller.join().is_err() {
        tracing::error!("peer poller panicked");
    }
    served?;
    Ok(())
}
