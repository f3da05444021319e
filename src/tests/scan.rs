use super::support::*;
use crate::errors::BootError;
use crate::scan::{self, AccountTransaction};
use crate::ticker::StopSignal;
use serde_json::json;

fn transfer(from: &str, to: &str) -> serde_json::Value {
    json!({
        "hash": format!("0x{}{}", &from[2..6], &to[2..6]),
        "from": from,
        "to": to,
        "value": "0xde0b6b3a7640000",
        "gas": "0x5208",
        "gasPrice": "0x3b9aca00"
    })
}

#[test]
fn scan_reports_transactions_touching_the_account() {
    let other = "0x1111111111111111111111111111111111111111";
    let rpc = ScriptedRpc::new()
        .body("eth_blockNumber", json!({ "result": "0x2" }))
        .body("eth_getBlockByNumber", json!({ "result": { "number": "0x0", "transactions": [] } }))
        .reply("eth_getBlockByNumber", Reply::Fail("connection reset"))
        .body(
            "eth_getBlockByNumber",
            json!({ "result": {
                "number": "0x2",
                "transactions": [transfer(other, &MINER.to_uppercase().replace("0X", "0x")), transfer(other, other)]
            } }),
        );

    let mut found: Vec<AccountTransaction> = Vec::new();
    let summary = scan::scan_account(&rpc, MINER, 0, None, &StopSignal::new(), |tx| {
        found.push(tx.clone())
    })
    .unwrap();

    assert_eq!(summary.blocks_scanned, 3);
    assert_eq!(summary.matches, 1);
    assert_eq!(summary.failed_blocks, [1]);
    assert!(!summary.interrupted);
    assert_eq!(rpc.params_of("eth_getBlockByNumber"), Some(json!(["0x0", true])));

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].block_number, 2);
    assert_eq!(found[0].from, other);
    let report = found[0].report();
    assert!(report.contains("Value: 1 ETH"));
    assert!(report.contains("Gas Used: 21000"));
    assert!(report.contains("Gas Price: 1 Gwei"));
}

#[test]
fn missing_blocks_are_skipped() {
    let rpc = ScriptedRpc::new().body("eth_getBlockByNumber", json!({ "result": null }));

    let summary = scan::scan_account(&rpc, MINER, 5, Some(7), &StopSignal::new(), |_| {
        panic!("no block, no match")
    })
    .unwrap();

    assert_eq!(summary.blocks_scanned, 3);
    assert!(summary.failed_blocks.is_empty());
    assert_eq!(rpc.count("eth_blockNumber"), 0);
}

#[test]
fn stop_request_ends_the_scan_early() {
    let stop = StopSignal::new();
    let rpc = ScriptedRpc::new()
        .body("eth_getBlockByNumber", json!({ "result": { "number": "0x0", "transactions": [] } }))
        .stop_after("eth_getBlockByNumber", 2, &stop);

    let summary = scan::scan_account(&rpc, MINER, 0, Some(100), &stop, |_| {}).unwrap();

    assert!(summary.interrupted);
    assert_eq!(summary.blocks_scanned, 2);
}

#[test]
fn unknown_chain_head_is_fatal() {
    let rpc = ScriptedRpc::new().reply("eth_blockNumber", Reply::Fail("connection refused"));

    let err = scan::scan_account(&rpc, MINER, 0, None, &StopSignal::new(), |_| {}).unwrap_err();
    assert!(matches!(err, BootError::RpcTransport { .. }));
    assert_eq!(rpc.count("eth_getBlockByNumber"), 0);
}
