//! The bootstrap pipeline: wipe, init, launch, import, unlock, wait for sync,
//! mine, then watch blocks until stopped.
//!
//! Any step that fails ends the run: the failure is logged, the node (if it
//! was launched) is terminated, and the caller gets the error after the
//! operator delay. Errors inside the two poll loops are logged and retried on
//! the next tick, without limit.

use crate::errors::{BootError, Result};
use crate::keyfile::MinerKey;
use crate::log::BootLog;
use crate::node::NodeProcess;
use crate::rpc::{self, RpcTransport};
use crate::settings::{BootPaths, BootSettings};
use crate::ticker::{StopSignal, Ticker};
use serde_json::{Value, json};
use std::fs;

/// One reading of the node's sync state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// `eth_syncing` returned `false`
    Complete,
    Syncing {
        current_block: u64,
        highest_block: u64,
        peer_count: u64,
    },
    /// The response carried no `result` at all
    Unknown,
}

/// Outcome of inspecting the latest block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockCheck {
    /// The miner is listed on the block; `total` is the running success count
    Mined { block_number: u64, total: u64 },
    NotMining { block_number: u64 },
}

pub struct Bootstrap<R, N> {
    settings: BootSettings,
    paths: BootPaths,
    log: BootLog,
    rpc: R,
    node: N,
    stop: StopSignal,
    blocks_mined: u64,
}

impl<R: RpcTransport, N: NodeProcess> Bootstrap<R, N> {
    pub fn new(
        settings: BootSettings,
        paths: BootPaths,
        log: BootLog,
        rpc: R,
        node: N,
        stop: StopSignal,
    ) -> Self {
        Bootstrap {
            settings,
            paths,
            log,
            rpc,
            node,
            stop,
            blocks_mined: 0,
        }
    }

    pub fn blocks_mined(&self) -> u64 {
        self.blocks_mined
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn rpc(&self) -> &R {
        &self.rpc
    }

    /// Runs the whole pipeline. Returns `Ok` only once the stop signal has
    /// been raised; a fatal error is returned after cleanup and the operator
    /// delay.
    pub fn run(&mut self) -> Result<()> {
        match self.sequence() {
            Ok(()) => {
                self.log.info("已停止。", "Stopped.");
                Ok(())
            }
            Err(e) => {
                self.abort();
                Err(e)
            }
        }
    }

    fn sequence(&mut self) -> Result<()> {
        self.wipe_data_dir()?;
        let key = self.read_key()?;
        self.log.info(
            &format!("Miner Address: {}", key.address),
            &format!("Miner Address: {}", key.address),
        );

        self.init_chain()?;
        if !self.stop.sleep(self.settings.post_init_delay()) {
            return Ok(());
        }

        self.launch_node(&key)?;
        self.log.info(
            "等待 Geth 启动和打开 HTTP API...",
            "Waiting for Geth to start and open HTTP API...",
        );
        if !self.stop.sleep(self.settings.startup_delay()) {
            return Ok(());
        }

        self.import_key(&key)?;
        self.unlock_account(&key)?;

        if !self.wait_for_sync() {
            return Ok(());
        }

        self.start_mining()?;
        self.watch_blocks(&key);
        Ok(())
    }

    fn abort(&mut self) {
        if self.node.terminate() {
            self.log.info("Geth 进程已终止。", "Geth process terminated.");
        }
        self.stop.sleep(self.settings.fatal_exit_delay());
    }

    fn wipe_data_dir(&self) -> Result<()> {
        let data_dir = &self.paths.data_dir;
        if !data_dir.exists() {
            self.log.info(
                "data 目录不存在，跳过删除。",
                "Data directory does not exist, skipping deletion.",
            );
            return Ok(());
        }

        match fs::remove_dir_all(data_dir) {
            Ok(()) => {
                self.log
                    .info("成功删除 data 目录。", "Successfully deleted the data directory.");
                Ok(())
            }
            Err(source) => {
                let e = BootError::DataDir {
                    path: data_dir.clone(),
                    source,
                };
                self.log.error(
                    &format!("删除 data 目录失败: {}", e),
                    &format!("Failed to delete data directory: {}", e),
                );
                Err(e)
            }
        }
    }

    fn read_key(&self) -> Result<MinerKey> {
        MinerKey::read(&self.paths.key_file).map_err(|e| {
            match &e {
                BootError::KeyFileFormat { .. } => self.log.error(
                    "私钥文件格式错误，至少需要两行：私钥和矿工地址。",
                    "Private key file format error, at least two lines required: private key and miner address.",
                ),
                _ => self.log.error(
                    &format!("读取私钥文件失败: {}", e),
                    &format!("Failed to read private key file: {}", e),
                ),
            }
            e
        })
    }

    fn init_chain(&mut self) -> Result<()> {
        self.log
            .info("初始化区块链数据...", "Initializing blockchain data...");
        match self.node.init_chain() {
            Ok(()) => {
                self.log.info(
                    "区块链数据初始化完成。",
                    "Blockchain data initialization completed.",
                );
                Ok(())
            }
            Err(e) => {
                self.log.error(
                    &format!("初始化区块链数据失败: {}", e),
                    &format!("Failed to initialize blockchain data: {}", e),
                );
                Err(e)
            }
        }
    }

    fn launch_node(&mut self, key: &MinerKey) -> Result<()> {
        self.log.info("启动 Geth 节点...", "Starting Geth node...");
        match self.node.launch(&key.address) {
            Ok(()) => {
                self.log.info(
                    "Geth 节点已启动，并在新的控制台窗口中显示。",
                    "Geth node has been started and is displayed in a new console window.",
                );
                Ok(())
            }
            Err(e) => {
                self.log.error(
                    &format!("启动 Geth 节点失败: {}", e),
                    &format!("Failed to start Geth node: {}", e),
                );
                Err(e)
            }
        }
    }

    fn import_key(&self, key: &MinerKey) -> Result<()> {
        self.log.info("导入私钥...", "Importing private key...");

        // The raw key doubles as the keystore passphrase.
        let params = json!([key.private_key, key.private_key]);
        let result = self
            .rpc
            .call("personal_importRawKey", params)
            .and_then(|body| {
                rpc::write_status(&self.paths.importing_status, &body)?;
                Ok(body)
            });

        match result {
            Ok(body) => {
                self.log.info(
                    &format!("导入私钥响应: {}", body),
                    &format!("Import raw key response: {}", body),
                );
                Ok(())
            }
            Err(e) => {
                self.log.error(
                    &format!("导入私钥失败，请检查你的私钥与地址是否正确，文件是否保存: {}", e),
                    &format!(
                        "Failed to import private key. Please check if your private key and address are correct and the file is saved: {}",
                        e
                    ),
                );
                Err(e)
            }
        }
    }

    fn unlock_account(&self, key: &MinerKey) -> Result<()> {
        self.log.info("解锁账户...", "Unlocking account...");

        // Duration 0 keeps the account unlocked for as long as the node runs.
        let params = json!([key.address, key.private_key, 0]);
        let body = match self.rpc.call("personal_unlockAccount", params) {
            Ok(body) => body,
            Err(e) => {
                self.log.error(
                    &format!("解锁账户失败, 请检查你的私钥与地址是否正确: {}", e),
                    &format!(
                        "Failed to unlock account, please check if your private key and address are correct: {}",
                        e
                    ),
                );
                return Err(e);
            }
        };

        if body.get("result") != Some(&Value::Bool(true)) {
            self.log.error(
                &format!("解锁账户失败: {}", body),
                &format!("Failed to unlock account: {}", body),
            );
            self.log.error(
                "解锁账户失败, 请检查你的私钥与地址是否正确",
                "Failed to unlock account, please check if your private key and address are correct",
            );
            return Err(BootError::RpcResponse {
                method: "personal_unlockAccount".to_string(),
                body: body.to_string(),
            });
        }

        if let Err(e) = rpc::write_status(&self.paths.unlocking_status, &body) {
            self.log.error(
                &format!("写入解锁状态失败: {}", e),
                &format!("Failed to write unlock status: {}", e),
            );
            return Err(e);
        }
        self.log.info(
            &format!("解锁账户成功: {}", body),
            &format!("Account successfully unlocked: {}", body),
        );
        Ok(())
    }

    /// Asks the node for its sync progress and peer count.
    pub fn poll_sync(&self) -> Result<SyncStatus> {
        let sync = self.rpc.call("eth_syncing", json!([]))?;
        let peers = self.rpc.call("net_peerCount", json!([]))?;

        match sync.get("result") {
            None => Ok(SyncStatus::Unknown),
            Some(Value::Bool(false)) => Ok(SyncStatus::Complete),
            Some(progress @ Value::Object(_)) => Ok(SyncStatus::Syncing {
                current_block: rpc::quantity_field(progress, "currentBlock")?,
                highest_block: rpc::quantity_field(progress, "highestBlock")?,
                peer_count: rpc::quantity_field(&peers, "result")?,
            }),
            Some(_) => Err(BootError::RpcResponse {
                method: "eth_syncing".to_string(),
                body: sync.to_string(),
            }),
        }
    }

    /// Polls until the node reports it is no longer syncing. Returns false if
    /// stopped first.
    fn wait_for_sync(&self) -> bool {
        self.log
            .info("检查同步状态...", "Checking synchronization status...");

        let mut ticker = Ticker::new(self.settings.sync_poll_interval(), self.stop.clone());
        while ticker.tick() {
            match self.poll_sync() {
                Ok(SyncStatus::Complete) => {
                    self.log.info("同步已完成。", "Synchronization complete.");
                    return true;
                }
                Ok(SyncStatus::Syncing {
                    current_block,
                    highest_block,
                    peer_count,
                }) => self.log.info(
                    &format!(
                        "同步中... 当前块: {}, 最高块: {}, 对等节点数: {}...",
                        current_block, highest_block, peer_count
                    ),
                    &format!(
                        "Synchronizing... Current block: {}, Highest block: {}, Peer count: {}...",
                        current_block, highest_block, peer_count
                    ),
                ),
                Ok(SyncStatus::Unknown) => self.log.info(
                    "无法获取同步状态。",
                    "Unable to retrieve synchronization status.",
                ),
                Err(e) => self.log.error(
                    &format!("检查同步状态失败: {}", e),
                    &format!("Failed to check synchronization status: {}", e),
                ),
            }
        }
        false
    }

    fn start_mining(&self) -> Result<()> {
        self.log.info("启动挖矿...", "Starting mining...");
        let result = self.rpc.call("miner_start", json!([])).and_then(|body| {
            rpc::write_status(&self.paths.miner_status, &body)?;
            Ok(body)
        });

        match result {
            Ok(body) => {
                self.log.info(
                    &format!("启动挖矿响应: {}", body),
                    &format!("Mining start response: {}", body),
                );
                Ok(())
            }
            Err(e) => {
                self.log.error(
                    &format!("启动挖矿失败, 请截图保存并报告: {}", e),
                    &format!("Failed to start mining. Please take a screenshot and report it: {}", e),
                );
                Err(e)
            }
        }
    }

    /// Fetches the latest block and checks whether `miner_address` is listed
    /// in its `minerAddresses` field. Bumps the success counter when it is.
    pub fn check_latest_block(&mut self, miner_address: &str) -> Result<BlockCheck> {
        let latest = self.rpc.call("eth_blockNumber", json!([]))?;
        let block_number = rpc::quantity_field(&latest, "result")?;

        let details = self.rpc.call(
            "eth_getBlockByNumber",
            json!([rpc::format_quantity(block_number), true]),
        )?;
        let malformed = || BootError::RpcResponse {
            method: "eth_getBlockByNumber".to_string(),
            body: details.to_string(),
        };

        let miner_addresses = match details.get("result") {
            None => None,
            Some(Value::Object(block)) => block.get("minerAddresses"),
            Some(_) => return Err(malformed()),
        };
        let listed = match miner_addresses {
            None => false,
            Some(Value::Array(addresses)) => addresses
                .iter()
                .filter_map(Value::as_str)
                .any(|a| a.eq_ignore_ascii_case(miner_address)),
            Some(_) => return Err(malformed()),
        };

        if listed {
            self.blocks_mined += 1;
            Ok(BlockCheck::Mined {
                block_number,
                total: self.blocks_mined,
            })
        } else {
            Ok(BlockCheck::NotMining { block_number })
        }
    }

    /// Reports mining progress on every tick until stopped.
    fn watch_blocks(&mut self, key: &MinerKey) {
        self.log.info(
            &format!("Geth 正在使用账户 {} 挖矿。", key.address),
            &format!("Geth is mining using account {}.", key.address),
        );
        self.log
            .info("定期检查区块信息...", "Periodically checking block information...");

        let mut ticker = Ticker::new(self.settings.block_poll_interval(), self.stop.clone());
        while ticker.tick() {
            match self.check_latest_block(&key.address) {
                Ok(BlockCheck::Mined { total, .. }) => self.log.info(
                    &format!("挖矿成功！账户 {} 已经成功挖出 {} 个区块。", key.address, total),
                    &format!(
                        "Mining successful! Account {} has successfully mined {} blocks.",
                        key.address, total
                    ),
                ),
                Ok(BlockCheck::NotMining { .. }) => {
                    self.log.info("还没开始挖矿。", "Mining has not started yet.")
                }
                Err(e) => self.log.error(
                    &format!("检查区块信息失败: {}", e),
                    &format!("Failed to check block information: {}", e),
                ),
            }
        }
    }
}
