//! Bootstrap for a private-network mining node: wipes and re-initializes the
//! chain data, launches the node, prepares the miner account over JSON-RPC and
//! reports mining progress.

pub mod bootstrap;
pub mod errors;
pub mod history;
pub mod keyfile;
pub mod log;
pub mod node;
pub mod peers;
pub mod rpc;
pub mod scan;
pub mod settings;
pub mod ticker;

#[cfg(test)]
mod tests;

pub use bootstrap::{BlockCheck, Bootstrap, SyncStatus};
pub use errors::{BootError, Result};
pub use settings::{BootPaths, BootSettings};
