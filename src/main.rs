use clap::Parser;
use std::path::PathBuf;
use std::process;
use zkscam_boot::log::BootLog;
use zkscam_boot::node::GethNode;
use zkscam_boot::rpc::HttpRpc;
use zkscam_boot::settings::{self, BootSettings};
use zkscam_boot::ticker::StopSignal;
use zkscam_boot::Bootstrap;

#[derive(Parser, Debug)]
#[command(name = "zkscam-boot", version, about = "Boots and mines on the private network node")]
struct Cli {
    /// Settings file (default: boot_config.json next to the executable)
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let base_dir = match settings::base_dir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::error!("Could not resolve the executable directory: {}", e);
            process::exit(1);
        }
    };
    let config_path = cli
        .config
        .unwrap_or_else(|| base_dir.join(settings::CONFIG_FILE));

    let settings = match BootSettings::load(&config_path) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!("Failed to load or save configuration: {}", e);
            process::exit(1);
        }
    };
    let paths = settings.paths(&base_dir);

    let log = match BootLog::create(&paths.log_file) {
        Ok(log) => log,
        Err(e) => {
            tracing::error!("Could not create {}: {}", paths.log_file.display(), e);
            process::exit(1);
        }
    };

    let stop = StopSignal::new();
    if let Err(e) = stop.install_ctrlc() {
        tracing::warn!("Ctrl-C handler not installed: {}", e);
    }

    let rpc = HttpRpc::new(settings.rpc_url.clone());
    tracing::debug!("node RPC endpoint: {}", rpc.url());
    let node = GethNode::new(settings.clone(), paths.clone());

    let mut bootstrap = Bootstrap::new(settings, paths, log, rpc, node, stop);
    if let Err(e) = bootstrap.run() {
        process::exit(e.exit_code());
    }
}
