use crate::errors::{BootError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs, io};

pub const CONFIG_FILE: &str = "boot_config.json";

pub const IMPORTING_STATUS_FILE: &str = "Importing_status.json";
pub const UNLOCKING_STATUS_FILE: &str = "Unlocking_status.json";
pub const MINER_STATUS_FILE: &str = "miner_status.json";

#[cfg(windows)]
const DEFAULT_NODE_BINARY: &str = "geth.exe";
#[cfg(not(windows))]
const DEFAULT_NODE_BINARY: &str = "geth";

const DEFAULT_BOOTNODE: &str = "enode://8d8fcc2f81bb0f6a653b3e71f8ce31c1227ab39fb8a1a3fe6008521767273e29054019bcf933e3a4954131c56790aaef0aff8251fe4c389dae3380483e2576df@103.97.58.18:30303";

/// Everything the bootstrap needs to know about the node and the chain.
/// File names are relative to the directory holding the executable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootSettings {
    /// JSON-RPC endpoint of the launched node
    pub rpc_url: String,

    /// Node executable (e.g. geth.exe)
    pub node_binary: String,

    /// Genesis definition consumed by `init`
    pub genesis_file: String,

    /// Two-line file: private key, then miner address
    pub key_file: String,

    /// Chain data directory, wiped on every start
    pub data_dir: String,

    pub ipc_file: String,
    pub log_file: String,

    /// Node flags
    pub p2p_port: u16,
    pub sync_mode: String,
    pub http_addr: String,
    pub http_port: u16,
    pub http_api: Vec<String>,
    pub http_cors_domain: String,
    pub network_id: u64,
    pub bootnodes: Vec<String>,

    /// Pause after `init` returns
    pub post_init_delay_secs: u64,

    /// Pause between launching the node and the first RPC call.
    /// The node is assumed ready once it elapses.
    pub startup_delay_secs: u64,

    pub sync_poll_interval_secs: u64,
    pub block_poll_interval_secs: u64,

    /// How long a fatal error stays on screen before the process exits
    pub fatal_exit_delay_secs: u64,
}

impl Default for BootSettings {
    fn default() -> Self {
        BootSettings {
            rpc_url: "http://localhost:8545".to_string(),
            node_binary: DEFAULT_NODE_BINARY.to_string(),
            genesis_file: "zkscam.json".to_string(),
            key_file: "miner_private_key.txt".to_string(),
            data_dir: "data".to_string(),
            ipc_file: "geth.ipc".to_string(),
            log_file: "log.txt".to_string(),
            p2p_port: 30303,
            sync_mode: "full".to_string(),
            http_addr: "0.0.0.0".to_string(),
            http_port: 8545,
            http_api: ["personal", "eth", "net", "web3", "txpool", "miner", "admin"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            http_cors_domain: "*".to_string(),
            network_id: 63658,
            bootnodes: vec![DEFAULT_BOOTNODE.to_string()],
            post_init_delay_secs: 3,
            startup_delay_secs: 10,
            sync_poll_interval_secs: 10,
            block_poll_interval_secs: 30,
            fatal_exit_delay_secs: 60,
        }
    }
}

/// Absolute locations derived from the settings and the base directory.
#[derive(Debug, Clone, PartialEq)]
pub struct BootPaths {
    pub base_dir: PathBuf,
    pub node_binary: PathBuf,
    pub genesis_file: PathBuf,
    pub key_file: PathBuf,
    pub data_dir: PathBuf,
    pub ipc_file: PathBuf,
    pub log_file: PathBuf,
    pub importing_status: PathBuf,
    pub unlocking_status: PathBuf,
    pub miner_status: PathBuf,
}

impl BootSettings {
    /// Writes these settings to `path` as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json_data = serde_json::to_string_pretty(self)
            .map_err(|e| BootError::Settings(format!("failed to serialize settings: {}", e)))?;
        fs::write(path, json_data)?;
        tracing::info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Reads settings from `path`; fields absent from the file take their
    /// defaults. A missing file is replaced by a freshly written default one.
    /// Unparseable JSON is a `BootError::Settings`.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(data) => {
                let settings: BootSettings = serde_json::from_str(&data).map_err(|e| {
                    BootError::Settings(format!("failed to parse {}: {}", path.display(), e))
                })?;
                tracing::info!("Configuration loaded from {}", path.display());
                Ok(settings)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!("Configuration file not found. Creating default...");
                let default_settings = BootSettings::default();
                default_settings.save(path)?;
                Ok(default_settings)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn paths(&self, base_dir: &Path) -> BootPaths {
        BootPaths {
            base_dir: base_dir.to_path_buf(),
            node_binary: base_dir.join(&self.node_binary),
            genesis_file: base_dir.join(&self.genesis_file),
            key_file: base_dir.join(&self.key_file),
            data_dir: base_dir.join(&self.data_dir),
            ipc_file: base_dir.join(&self.ipc_file),
            log_file: base_dir.join(&self.log_file),
            importing_status: base_dir.join(IMPORTING_STATUS_FILE),
            unlocking_status: base_dir.join(UNLOCKING_STATUS_FILE),
            miner_status: base_dir.join(MINER_STATUS_FILE),
        }
    }

    pub fn post_init_delay(&self) -> Duration {
        Duration::from_secs(self.post_init_delay_secs)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_secs)
    }

    pub fn sync_poll_interval(&self) -> Duration {
        Duration::from_secs(self.sync_poll_interval_secs)
    }

    pub fn block_poll_interval(&self) -> Duration {
        Duration::from_secs(self.block_poll_interval_secs)
    }

    pub fn fatal_exit_delay(&self) -> Duration {
        Duration::from_secs(self.fatal_exit_delay_secs)
    }
}

/// Directory holding the running executable. Every input and output file
/// lives next to it; falls back to the working directory when the executable
/// path cannot be resolved.
pub fn base_dir() -> io::Result<PathBuf> {
    match env::current_exe() {
        Ok(exe) => match exe.parent() {
            Some(dir) => Ok(dir.to_path_buf()),
            None => env::current_dir(),
        },
        Err(_) => env::current_dir(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_creates_default_when_missing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let settings = BootSettings::load(&path).unwrap();
        assert_eq!(settings, BootSettings::default());
        assert!(path.exists());

        let reloaded = BootSettings::load(&path).unwrap();
        assert_eq!(reloaded, settings);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, r#"{ "http_port": 9545, "fatal_exit_delay_secs": 0 }"#).unwrap();

        let settings = BootSettings::load(&path).unwrap();
        assert_eq!(settings.http_port, 9545);
        assert_eq!(settings.fatal_exit_delay(), Duration::ZERO);
        assert_eq!(settings.network_id, 63658);
        assert_eq!(settings.genesis_file, "zkscam.json");
    }

    #[test]
    fn malformed_file_is_a_settings_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(BootSettings::load(&path), Err(BootError::Settings(_))));
    }

    #[test]
    fn paths_are_rooted_at_base_dir() {
        let base = Path::new("/opt/miner");
        let paths = BootSettings::default().paths(base);

        assert_eq!(paths.data_dir, base.join("data"));
        assert_eq!(paths.key_file, base.join("miner_private_key.txt"));
        assert_eq!(paths.ipc_file, base.join("geth.ipc"));
        assert_eq!(paths.miner_status, base.join("miner_status.json"));
    }
}
