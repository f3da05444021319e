//! Lists every transaction sent from or to an account across a block range.

use clap::Parser;
use std::process;
use zkscam_boot::rpc::HttpRpc;
use zkscam_boot::scan;
use zkscam_boot::ticker::StopSignal;

#[derive(Parser, Debug)]
#[command(name = "scan-account", version, about = "Finds an account's transactions block by block")]
struct Cli {
    /// Account address to look for
    account: String,

    #[arg(long, default_value_t = 0)]
    from_block: u64,

    /// Last block to scan (default: latest)
    #[arg(long)]
    to_block: Option<u64>,

    #[arg(long, default_value = "http://localhost:8545")]
    rpc_url: String,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let stop = StopSignal::new();
    if let Err(e) = stop.install_ctrlc() {
        tracing::warn!("Ctrl-C handler not installed: {}", e);
    }

    let rpc = HttpRpc::new(cli.rpc_url);
    let result = scan::scan_account(&rpc, &cli.account, cli.from_block, cli.to_block, &stop, |tx| {
        println!("\n{}", tx.report());
    });

    match result {
        Ok(summary) => {
            println!(
                "\nFinished searching blocks. {} scanned, {} matching transactions, {} failed.",
                summary.blocks_scanned,
                summary.matches,
                summary.failed_blocks.len()
            );
        }
        Err(e) => {
            tracing::error!("Error searching transactions: {}", e);
            process::exit(e.exit_code());
        }
    }
}
