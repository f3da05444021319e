//! Error types for the bootstrap sequence.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Every failure the bootstrap can hit. All of them are fatal when they escape
/// the sequence; the poll loops log and swallow their own.
#[derive(Debug, Error)]
pub enum BootError {
    /// The chain data directory exists but could not be removed
    #[error("failed to delete {}: {source}", path.display())]
    DataDir { path: PathBuf, source: io::Error },

    /// The key file could not be opened or read
    #[error("failed to read {}: {source}", path.display())]
    KeyFileRead { path: PathBuf, source: io::Error },

    /// The key file does not hold a private key and an address
    #[error("expected 2 lines (private key, miner address), found {found}")]
    KeyFileFormat { found: usize },

    /// `init` ran and exited unsuccessfully; carries the captured stderr
    #[error("{0}")]
    NodeInit(String),

    /// A child process could not be started at all
    #[error("failed to start {program}: {source}")]
    Spawn { program: String, source: io::Error },

    /// Network failure or an unparseable HTTP body
    #[error("RPC request {method} failed: {reason}")]
    RpcTransport { method: String, reason: String },

    /// The node answered but not with what the step needed
    #[error("RPC {method} returned an unexpected response: {body}")]
    RpcResponse { method: String, body: String },

    /// boot_config.json could not be parsed or written
    #[error("settings error: {0}")]
    Settings(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl BootError {
    /// Process exit status for a fatal error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

pub type Result<T> = std::result::Result<T, BootError>;
