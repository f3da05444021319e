//! Account history scan: walks a block range with full transaction bodies and
//! reports every transaction sent from or to one account.

use crate::errors::{BootError, Result};
use crate::rpc::{self, RpcTransport};
use crate::ticker::StopSignal;
use serde_json::{Value, json};

const WEI_PER_ETHER: u32 = 18;
const WEI_PER_GWEI: u32 = 9;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountTransaction {
    pub block_number: u64,
    pub hash: String,
    pub from: String,
    /// None for contract creation
    pub to: Option<String>,
    pub value_wei: u128,
    pub gas: u64,
    pub gas_price_wei: u128,
}

impl AccountTransaction {
    /// Multi-line report in the same layout for every match.
    pub fn report(&self) -> String {
        format!(
            "Block Number: {}\nTransaction Hash: {}\nFrom: {}\nTo: {}\nValue: {} ETH\nGas Used: {}\nGas Price: {} Gwei",
            self.block_number,
            self.hash,
            self.from,
            self.to.as_deref().unwrap_or("null"),
            format_units(self.value_wei, WEI_PER_ETHER),
            self.gas,
            format_units(self.gas_price_wei, WEI_PER_GWEI),
        )
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub blocks_scanned: u64,
    pub matches: usize,
    /// Blocks that could not be fetched or decoded
    pub failed_blocks: Vec<u64>,
    /// True if the scan ended early on a stop request
    pub interrupted: bool,
}

/// Renders an integer amount with `decimals` fractional digits, trailing zeros
/// trimmed (`1500000000000000000`, 18 → `"1.5"`).
pub fn format_units(amount: u128, decimals: u32) -> String {
    let unit = 10u128.pow(decimals);
    let whole = amount / unit;
    let fraction = amount % unit;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", fraction, width = decimals as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

pub fn latest_block<R: RpcTransport>(rpc: &R) -> Result<u64> {
    let body = rpc.call("eth_blockNumber", json!([]))?;
    match body.get("result") {
        Some(n) => rpc::parse_quantity(n),
        None => Err(BootError::RpcResponse {
            method: "eth_blockNumber".to_string(),
            body: body.to_string(),
        }),
    }
}

fn string_field(tx: &Value, key: &str) -> Option<String> {
    tx.get(key).and_then(Value::as_str).map(str::to_string)
}

fn decode_transaction(block_number: u64, tx: &Value) -> Result<AccountTransaction> {
    let malformed = || BootError::RpcResponse {
        method: "eth_getBlockByNumber".to_string(),
        body: tx.to_string(),
    };
    Ok(AccountTransaction {
        block_number,
        hash: string_field(tx, "hash").ok_or_else(malformed)?,
        from: string_field(tx, "from").ok_or_else(malformed)?,
        to: string_field(tx, "to"),
        value_wei: rpc::parse_wide_quantity(tx.get("value").ok_or_else(malformed)?)?,
        gas: rpc::parse_quantity(tx.get("gas").ok_or_else(malformed)?)?,
        gas_price_wei: match tx.get("gasPrice") {
            Some(price) => rpc::parse_wide_quantity(price)?,
            None => 0,
        },
    })
}

/// Picks the transactions of one `eth_getBlockByNumber(.., true)` result that
/// touch `account`. Addresses compare without regard to case.
pub fn matching_transactions(block: &Value, account: &str) -> Result<Vec<AccountTransaction>> {
    let block_number = match block.get("number") {
        Some(n) => rpc::parse_quantity(n)?,
        None => 0,
    };
    let Some(transactions) = block.get("transactions").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };

    let touches = |tx: &Value, key: &str| {
        tx.get(key)
            .and_then(Value::as_str)
            .is_some_and(|addr| addr.eq_ignore_ascii_case(account))
    };

    transactions
        .iter()
        .filter(|tx| touches(tx, "from") || touches(tx, "to"))
        .map(|tx| decode_transaction(block_number, tx))
        .collect()
}

/// Scans blocks `start..=end` (`end` defaults to the chain head) and hands
/// every match to `on_match`. A block that fails is recorded and skipped.
pub fn scan_account<R, F>(
    rpc: &R,
    account: &str,
    start: u64,
    end: Option<u64>,
    stop: &StopSignal,
    mut on_match: F,
) -> Result<ScanSummary>
where
    R: RpcTransport,
    F: FnMut(&AccountTransaction),
{
    let end = match end {
        Some(end) => end,
        None => {
            let latest = latest_block(rpc)?;
            tracing::info!("Using endBlockNumber: {}", latest);
            latest
        }
    };
    tracing::info!(
        "Searching for transactions to/from account \"{}\" from block {} to {}",
        account,
        start,
        end
    );

    let mut summary = ScanSummary::default();
    for number in start..=end {
        if stop.is_stopped() {
            summary.interrupted = true;
            break;
        }
        summary.blocks_scanned += 1;

        let found = rpc
            .call(
                "eth_getBlockByNumber",
                json!([rpc::format_quantity(number), true]),
            )
            .and_then(|body| match body.get("result") {
                Some(block @ Value::Object(_)) => matching_transactions(block, account),
                _ => Ok(Vec::new()),
            });

        match found {
            Ok(matches) => {
                summary.matches += matches.len();
                matches.iter().for_each(&mut on_match);
            }
            Err(e) => {
                tracing::error!("Error at block {}: {}", number, e);
                summary.failed_blocks.push(number);
            }
        }
    }
    Ok(summary)
}
