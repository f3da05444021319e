//! The external node binary: one-shot `init`, then a long-running process.

use crate::errors::{BootError, Result};
use crate::settings::{BootPaths, BootSettings};
use std::ffi::OsString;
use std::process::{Child, Command, Stdio};

/// Windows `CREATE_NEW_CONSOLE`: the node gets its own console window.
#[cfg(windows)]
const CREATE_NEW_CONSOLE: u32 = 0x0000_0010;

/// Lifecycle of the node as seen by the bootstrap.
pub trait NodeProcess {
    /// Writes the genesis block into the data directory.
    fn init_chain(&mut self) -> Result<()>;

    /// Starts the node with `miner_address` as the block reward beneficiary.
    fn launch(&mut self, miner_address: &str) -> Result<()>;

    /// Kills a launched node and reaps it. Returns false if nothing was running.
    fn terminate(&mut self) -> bool;
}

pub struct GethNode {
    settings: BootSettings,
    paths: BootPaths,
    child: Option<Child>,
}

impl GethNode {
    pub fn new(settings: BootSettings, paths: BootPaths) -> Self {
        GethNode {
            settings,
            paths,
            child: None,
        }
    }

    fn program(&self) -> String {
        self.paths.node_binary.display().to_string()
    }
}

/// `<node> --datadir <data> init <genesis>`
pub fn init_args(paths: &BootPaths) -> Vec<OsString> {
    vec![
        "--datadir".into(),
        paths.data_dir.clone().into_os_string(),
        "init".into(),
        paths.genesis_file.clone().into_os_string(),
    ]
}

/// Full argument list of the long-running node, ending in `console`.
pub fn launch_args(settings: &BootSettings, paths: &BootPaths, miner_address: &str) -> Vec<OsString> {
    fn flag(args: &mut Vec<OsString>, name: &str, value: impl Into<OsString>) {
        args.push(name.into());
        args.push(value.into());
    }

    let mut args: Vec<OsString> = Vec::new();
    flag(&mut args, "--datadir", paths.data_dir.as_os_str());
    flag(&mut args, "--port", settings.p2p_port.to_string());
    flag(&mut args, "--ipcpath", paths.ipc_file.as_os_str());
    args.push("--http".into());
    flag(&mut args, "--syncmode", settings.sync_mode.as_str());
    flag(&mut args, "--http.addr", settings.http_addr.as_str());
    flag(&mut args, "--http.port", settings.http_port.to_string());
    args.push("--allow-insecure-unlock".into());
    flag(&mut args, "--http.api", settings.http_api.join(","));
    flag(&mut args, "--http.corsdomain", settings.http_cors_domain.as_str());
    flag(&mut args, "--networkid", settings.network_id.to_string());
    flag(&mut args, "--bootnodes", settings.bootnodes.join(","));
    flag(&mut args, "--miner.etherbase", miner_address);
    args.push("console".into());
    args
}

impl NodeProcess for GethNode {
    fn init_chain(&mut self) -> Result<()> {
        let output = Command::new(&self.paths.node_binary)
            .args(init_args(&self.paths))
            .stdin(Stdio::null())
            .output()
            .map_err(|source| BootError::Spawn {
                program: self.program(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!(status = ?output.status, "node init exited unsuccessfully");
            return Err(BootError::NodeInit(stderr));
        }
        Ok(())
    }

    fn launch(&mut self, miner_address: &str) -> Result<()> {
        let mut command = Command::new(&self.paths.node_binary);
        command
            .args(launch_args(&self.settings, &self.paths, miner_address))
            .current_dir(&self.paths.base_dir);

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            command.creation_flags(CREATE_NEW_CONSOLE);
        }

        let child = command.spawn().map_err(|source| BootError::Spawn {
            program: self.program(),
            source,
        })?;
        tracing::debug!(pid = child.id(), "node launched");
        self.child = Some(child);
        Ok(())
    }

    fn terminate(&mut self) -> bool {
        let Some(mut child) = self.child.take() else {
            return false;
        };
        if let Err(e) = child.kill() {
            tracing::warn!("failed to kill node process {}: {}", child.id(), e);
        }
        if let Err(e) = child.wait() {
            tracing::warn!("failed to reap node process: {}", e);
        }
        true
    }
}
