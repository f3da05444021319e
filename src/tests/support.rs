//! Scripted stand-ins for the node process and its RPC endpoint.

use crate::errors::{BootError, Result};
use crate::log::BootLog;
use crate::node::NodeProcess;
use crate::rpc::RpcTransport;
use crate::settings::{BootPaths, BootSettings};
use crate::ticker::StopSignal;
use crate::Bootstrap;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub const PRIVATE_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
pub const MINER: &str = "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23";

#[derive(Debug, Clone)]
pub enum Reply {
    Body(Value),
    Fail(&'static str),
}

/// Replies are consumed in order per method; the last one repeats forever.
#[derive(Default)]
pub struct ScriptedRpc {
    replies: RefCell<HashMap<String, VecDeque<Reply>>>,
    calls: RefCell<Vec<(String, Value)>>,
    stop_after: Option<(String, usize, StopSignal)>,
}

impl ScriptedRpc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, method: &str, reply: Reply) -> Self {
        self.replies
            .borrow_mut()
            .entry(method.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn body(self, method: &str, body: Value) -> Self {
        self.reply(method, Reply::Body(body))
    }

    /// Raises `stop` once `method` has been called `count` times.
    pub fn stop_after(mut self, method: &str, count: usize, stop: &StopSignal) -> Self {
        self.stop_after = Some((method.to_string(), count, stop.clone()));
        self
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn params_of(&self, method: &str) -> Option<Value> {
        self.calls
            .borrow()
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, p)| p.clone())
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls.borrow().iter().filter(|(m, _)| m == method).count()
    }
}

impl RpcTransport for ScriptedRpc {
    fn call(&self, method: &str, params: Value) -> Result<Value> {
        self.calls.borrow_mut().push((method.to_string(), params));

        if let Some((stop_method, count, stop)) = &self.stop_after {
            if stop_method == method && self.count(method) >= *count {
                stop.stop();
            }
        }

        let reply = {
            let mut replies = self.replies.borrow_mut();
            match replies.get_mut(method) {
                Some(queue) if queue.len() > 1 => queue.pop_front(),
                Some(queue) => queue.front().cloned(),
                None => None,
            }
        };

        match reply {
            Some(Reply::Body(body)) => Ok(body),
            Some(Reply::Fail(reason)) => Err(BootError::RpcTransport {
                method: method.to_string(),
                reason: reason.to_string(),
            }),
            None => Err(BootError::RpcTransport {
                method: method.to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}

/// Records what the bootstrap asked of the node.
#[derive(Debug)]
pub struct FakeNode {
    pub events: Vec<&'static str>,
    pub init_stderr: Option<String>,
    pub data_dir: PathBuf,
    pub data_dir_present_at_init: Option<bool>,
    pub etherbase: Option<String>,
    running: bool,
}

impl FakeNode {
    pub fn new(paths: &BootPaths) -> Self {
        FakeNode {
            events: Vec::new(),
            init_stderr: None,
            data_dir: paths.data_dir.clone(),
            data_dir_present_at_init: None,
            etherbase: None,
            running: false,
        }
    }

    pub fn failing_init(mut self, stderr: &str) -> Self {
        self.init_stderr = Some(stderr.to_string());
        self
    }

    pub fn launched(&self) -> bool {
        self.events.contains(&"launch")
    }

    pub fn terminated(&self) -> bool {
        self.events.contains(&"terminate")
    }
}

impl NodeProcess for FakeNode {
    fn init_chain(&mut self) -> Result<()> {
        self.events.push("init");
        self.data_dir_present_at_init = Some(self.data_dir.exists());
        match &self.init_stderr {
            Some(stderr) => Err(BootError::NodeInit(stderr.clone())),
            None => Ok(()),
        }
    }

    fn launch(&mut self, miner_address: &str) -> Result<()> {
        self.events.push("launch");
        self.etherbase = Some(miner_address.to_string());
        self.running = true;
        Ok(())
    }

    fn terminate(&mut self) -> bool {
        if !self.running {
            return false;
        }
        self.events.push("terminate");
        self.running = false;
        true
    }
}

/// A base directory with a key file and settings that never sleep.
pub struct Sandbox {
    _dir: TempDir,
    pub settings: BootSettings,
    pub paths: BootPaths,
    pub stop: StopSignal,
}

impl Sandbox {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let settings = BootSettings {
            post_init_delay_secs: 0,
            startup_delay_secs: 0,
            sync_poll_interval_secs: 0,
            block_poll_interval_secs: 0,
            fatal_exit_delay_secs: 0,
            ..BootSettings::default()
        };
        let paths = settings.paths(dir.path());
        fs::write(&paths.key_file, format!("{}\n{}\n", PRIVATE_KEY, MINER)).unwrap();

        Sandbox {
            _dir: dir,
            settings,
            paths,
            stop: StopSignal::new(),
        }
    }

    pub fn write_key_file(&self, contents: &str) {
        fs::write(&self.paths.key_file, contents).unwrap();
    }

    pub fn bootstrap(&self, rpc: ScriptedRpc, node: FakeNode) -> Bootstrap<ScriptedRpc, FakeNode> {
        let log = BootLog::create(&self.paths.log_file).unwrap();
        Bootstrap::new(
            self.settings.clone(),
            self.paths.clone(),
            log,
            rpc,
            node,
            self.stop.clone(),
        )
    }

    pub fn node(&self) -> FakeNode {
        FakeNode::new(&self.paths)
    }

    pub fn log_contents(&self) -> String {
        fs::read_to_string(&self.paths.log_file).unwrap()
    }
}
