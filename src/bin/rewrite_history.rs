//! Rewrites the history of the repository in the current directory through
//! `git filter-repo`. Command-line arguments are ignored.

use std::process;
use zkscam_boot::history::FilterRepo;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match FilterRepo::default().run() {
        Ok(status) => process::exit(status.code().unwrap_or(1)),
        Err(e) => {
            tracing::error!("{}", e);
            process::exit(e.exit_code());
        }
    }
}
