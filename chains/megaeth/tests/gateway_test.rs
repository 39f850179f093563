use alloy::primitives::{Address, B256, Bytes, U256};
use megaeth_bot::gateway::{ChainGateway, GatewayError, RpcGateway};
use mockito::{Matcher, Request, Server, ServerGuard};
use serde_json::{Value, json};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const TX_HASH: B256 = B256::repeat_byte(0x5a);

fn wallet() -> Address {
    Address::repeat_byte(0x11)
}

/// Wraps `payload` (a `result` or `error` member) in a JSON-RPC envelope
/// carrying the caller's request id.
fn reply(payload: Value) -> impl Fn(&Request) -> Vec<u8> + Send + Sync + 'static {
    move |req| {
        let id = req
            .body()
            .ok()
            .and_then(|body| serde_json::from_slice::<Value>(body).ok())
            .and_then(|v| v.get("id").cloned())
            .unwrap_or(json!(0));

        let mut envelope = json!({ "jsonrpc": "2.0", "id": id });
        if let (Some(out), Some(fields)) = (envelope.as_object_mut(), payload.as_object()) {
            out.extend(fields.clone());
        }
        serde_json::to_vec(&envelope).unwrap()
    }
}

async fn rpc_method(server: &mut ServerGuard, method: &str, payload: Value) -> mockito::Mock {
    server
        .mock("POST", "/")
        .match_body(Matcher::PartialJson(json!({ "method": method })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body_from_request(reply(payload))
        .create_async()
        .await
}

fn gateway(url: &str, cancel: CancellationToken) -> RpcGateway {
    RpcGateway::connect(url, reqwest::Client::new(), wallet(), cancel).unwrap()
}

fn latest_block(base_fee: Option<&str>) -> Value {
    let mut block = json!({
        "hash": format!("0x{}", "ab".repeat(32)),
        "parentHash": format!("0x{}", "cd".repeat(32)),
        "sha3Uncles": format!("0x{}", "00".repeat(32)),
        "miner": format!("0x{}", "00".repeat(20)),
        "stateRoot": format!("0x{}", "00".repeat(32)),
        "transactionsRoot": format!("0x{}", "00".repeat(32)),
        "receiptsRoot": format!("0x{}", "00".repeat(32)),
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "difficulty": "0x0",
        "number": "0x10",
        "gasLimit": "0x1c9c380",
        "gasUsed": "0x0",
        "timestamp": "0x6553f100",
        "extraData": "0x",
        "mixHash": format!("0x{}", "00".repeat(32)),
        "nonce": "0x0000000000000000",
        "uncles": [],
        "transactions": []
    });
    if let Some(fee) = base_fee {
        block["baseFeePerGas"] = json!(fee);
    }
    block
}

fn receipt(status: &str) -> Value {
    json!({
        "type": "0x2",
        "status": status,
        "cumulativeGasUsed": "0x5208",
        "logs": [],
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "transactionHash": TX_HASH.to_string(),
        "transactionIndex": "0x0",
        "blockHash": format!("0x{}", "ab".repeat(32)),
        "blockNumber": "0x10",
        "from": wallet().to_string(),
        "to": format!("0x{}", "22".repeat(20)),
        "gasUsed": "0x5208",
        "effectiveGasPrice": "0x3b9aca00",
        "contractAddress": null
    })
}

#[tokio::test]
async fn test_chain_id_is_decoded() {
    let mut server = Server::new_async().await;
    rpc_method(&mut server, "eth_chainId", json!({ "result": "0x18c6" })).await;

    let chain_id = gateway(&server.url(), CancellationToken::new())
        .chain_id()
        .await
        .unwrap();

    assert_eq!(chain_id, 6342);
}

#[tokio::test]
async fn test_estimate_revert_is_classified() {
    let mut server = Server::new_async().await;
    rpc_method(
        &mut server,
        "eth_estimateGas",
        json!({ "error": { "code": 3, "message": "execution reverted: !Qty", "data": "0x" } }),
    )
    .await;

    let err = gateway(&server.url(), CancellationToken::new())
        .estimate_gas(Address::repeat_byte(0x22), U256::ZERO, Bytes::new())
        .await
        .unwrap_err();

    match err {
        GatewayError::EstimationReverted(reason) => assert!(reason.contains("!Qty")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_node_refusal_is_a_rejection() {
    let mut server = Server::new_async().await;
    rpc_method(
        &mut server,
        "eth_sendRawTransaction",
        json!({ "error": { "code": -32000, "message": "nonce too low" } }),
    )
    .await;

    let err = gateway(&server.url(), CancellationToken::new())
        .submit(Bytes::from_static(&[0x02, 0xf8, 0x6b]))
        .await
        .unwrap_err();

    match err {
        GatewayError::Rejected(reason) => assert_eq!(reason, "nonce too low"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_node_is_a_network_error() {
    let err = gateway("http://127.0.0.1:1", CancellationToken::new())
        .estimate_gas(Address::repeat_byte(0x22), U256::ZERO, Bytes::new())
        .await
        .unwrap_err();

    assert!(
        matches!(err, GatewayError::Network { stage: "gas estimate", .. }),
        "{err:?}"
    );
}

#[tokio::test]
async fn test_base_fee_is_read_from_latest_header() {
    let mut server = Server::new_async().await;
    rpc_method(
        &mut server,
        "eth_getBlockByNumber",
        json!({ "result": latest_block(Some("0x3b9aca00")) }),
    )
    .await;

    let base_fee = gateway(&server.url(), CancellationToken::new())
        .latest_base_fee()
        .await
        .unwrap();

    assert_eq!(base_fee, 1_000_000_000);
}

#[tokio::test]
async fn test_header_without_base_fee_is_reported() {
    let mut server = Server::new_async().await;
    rpc_method(
        &mut server,
        "eth_getBlockByNumber",
        json!({ "result": latest_block(None) }),
    )
    .await;

    let err = gateway(&server.url(), CancellationToken::new())
        .latest_base_fee()
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::MissingBaseFee), "{err:?}");
}

#[tokio::test]
async fn test_mined_receipt_is_reported() {
    let mut server = Server::new_async().await;
    rpc_method(
        &mut server,
        "eth_getTransactionReceipt",
        json!({ "result": receipt("0x1") }),
    )
    .await;

    let confirmed = gateway(&server.url(), CancellationToken::new())
        .wait_confirmed(TX_HASH)
        .await
        .unwrap();

    assert!(confirmed.success);
    assert_eq!(confirmed.tx_hash, TX_HASH);
    assert_eq!(confirmed.block_number, Some(16));
    assert_eq!(confirmed.gas_used, 21_000);
}

#[tokio::test]
async fn test_reverted_receipt_is_not_success() {
    let mut server = Server::new_async().await;
    rpc_method(
        &mut server,
        "eth_getTransactionReceipt",
        json!({ "result": receipt("0x0") }),
    )
    .await;

    let confirmed = gateway(&server.url(), CancellationToken::new())
        .wait_confirmed(TX_HASH)
        .await
        .unwrap();

    assert!(!confirmed.success);
}

#[tokio::test]
async fn test_unmined_transaction_times_out() {
    let mut server = Server::new_async().await;
    rpc_method(&mut server, "eth_getTransactionReceipt", json!({ "result": null })).await;

    let err = gateway(&server.url(), CancellationToken::new())
        .with_confirmation(Duration::from_millis(300), Duration::from_millis(50))
        .wait_confirmed(TX_HASH)
        .await
        .unwrap_err();

    match err {
        GatewayError::ConfirmationTimeout(hash, waited) => {
            assert_eq!(hash, TX_HASH);
            assert_eq!(waited, Duration::from_millis(300));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_run_stops_waiting() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = gateway("http://127.0.0.1:1", cancel)
        .wait_confirmed(TX_HASH)
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Cancelled), "{err:?}");
}

#[tokio::test]
async fn test_cancellation_interrupts_polling() {
    let mut server = Server::new_async().await;
    rpc_method(&mut server, "eth_getTransactionReceipt", json!({ "result": null })).await;

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        canceller.cancel();
    });

    let err = gateway(&server.url(), cancel)
        .with_confirmation(Duration::from_secs(30), Duration::from_millis(50))
        .wait_confirmed(TX_HASH)
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Cancelled), "{err:?}");
}
