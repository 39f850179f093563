use alloy::primitives::{Address, B256, Bytes, TxHash, U256};
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use core_logic::{ClientPool, RetryExecutor, RetryPolicy, TaskStatus};
use megaeth_bot::accounts::AccountData;
use megaeth_bot::gateway::{ChainGateway, GatewayError, Receipt};
use megaeth_bot::tasks::mint::{self, mint_with};
use megaeth_bot::verify::Verifier;
use megaeth_bot::workflows::{MintCall, Workflow, WorkflowKind};
use megaeth_bot::{MintDescriptor, RunContext, Settings};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

#[derive(Default)]
struct FakeChain {
    broke: bool,
    revert_estimate: bool,
    revert_receipt: bool,
    submitted: Mutex<Vec<Bytes>>,
    estimated: Mutex<Vec<(Address, U256, Bytes)>>,
}

impl FakeChain {
    fn hash() -> TxHash {
        B256::repeat_byte(0x5a)
    }
}

#[async_trait]
impl ChainGateway for FakeChain {
    fn address(&self) -> Address {
        signer().address()
    }

    async fn pending_nonce(&self) -> Result<u64, GatewayError> {
        Ok(3)
    }

    async fn balance(&self) -> Result<U256, GatewayError> {
        if self.broke {
            return Ok(U256::from(1_000u64));
        }
        Ok(U256::from(10u64).pow(U256::from(18)))
    }

    async fn chain_id(&self) -> Result<u64, GatewayError> {
        Ok(6342)
    }

    async fn suggest_priority_fee(&self) -> Result<u128, GatewayError> {
        Ok(1_000_000)
    }

    async fn latest_base_fee(&self) -> Result<u128, GatewayError> {
        Ok(2_500_000)
    }

    async fn estimate_gas(&self, to: Address, value: U256, data: Bytes) -> Result<u64, GatewayError> {
        self.estimated.lock().unwrap().push((to, value, data));
        if self.revert_estimate {
            return Err(GatewayError::EstimationReverted(
                "execution reverted: !Qty".to_string(),
            ));
        }
        Ok(180_000)
    }

    async fn submit(&self, signed_tx: Bytes) -> Result<TxHash, GatewayError> {
        self.submitted.lock().unwrap().push(signed_tx);
        Ok(Self::hash())
    }

    async fn wait_confirmed(&self, tx_hash: TxHash) -> Result<Receipt, GatewayError> {
        Ok(Receipt {
            tx_hash,
            success: !self.revert_receipt,
            block_number: Some(1_234),
            gas_used: 150_000,
        })
    }
}

fn signer() -> PrivateKeySigner {
    KEY.parse().unwrap()
}

fn descriptor(kind: WorkflowKind) -> MintDescriptor {
    match kind.workflow() {
        Workflow::Mint(desc) => desc,
        Workflow::Faucet => panic!("{} is not a mint", kind),
    }
}

fn verifier(url: String) -> Verifier {
    let clients = Arc::new(ClientPool::from_proxies(&[], Duration::from_secs(5)).unwrap());
    Verifier::new(
        &url,
        clients,
        RetryExecutor::new(RetryPolicy::single(), CancellationToken::new()),
    )
}

#[tokio::test]
async fn test_confirmed_mint_without_verifier_succeeds() {
    let chain = FakeChain::default();
    let desc = descriptor(WorkflowKind::Xyroph);

    let result = mint_with(&chain, &signer(), &desc, None, "[1/1]").await.unwrap();

    assert_eq!(result.status(), TaskStatus::Success);
    assert_eq!(result.tx_hash, Some(FakeChain::hash().to_string()));
    assert_eq!(chain.submitted.lock().unwrap().len(), 1);

    let estimated = chain.estimated.lock().unwrap();
    let (to, value, data) = &estimated[0];
    assert_eq!(*to, desc.contract_address());
    assert_eq!(*value, desc.value());
    assert_eq!(*data, desc.build_call_data(signer().address()));
}

#[tokio::test]
async fn test_reverting_estimate_sends_nothing() {
    let chain = FakeChain {
        revert_estimate: true,
        ..Default::default()
    };
    let desc = descriptor(WorkflowKind::Megamafia);

    let result = mint_with(&chain, &signer(), &desc, None, "[1/1]").await.unwrap();

    assert_eq!(result.status(), TaskStatus::Failed);
    assert!(result.error.unwrap().contains("!Qty"));
    assert!(chain.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_underfunded_paid_mint_is_not_built() {
    let chain = FakeChain {
        broke: true,
        ..Default::default()
    };
    let desc = descriptor(WorkflowKind::AngryMonkeys);

    let result = mint_with(&chain, &signer(), &desc, None, "[1/1]").await.unwrap();

    assert_eq!(result.status(), TaskStatus::Failed);
    assert!(result.error.unwrap().contains("below the mint price"));
    assert!(chain.estimated.lock().unwrap().is_empty());
    assert!(chain.submitted.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_reverted_receipt_fails_with_hash() {
    let chain = FakeChain {
        revert_receipt: true,
        ..Default::default()
    };
    let desc = descriptor(WorkflowKind::Bloom);

    let result = mint_with(&chain, &signer(), &desc, None, "[1/1]").await.unwrap();

    assert_eq!(result.status(), TaskStatus::Failed);
    assert_eq!(result.tx_hash, Some(FakeChain::hash().to_string()));
}

#[tokio::test]
async fn test_accepted_event_is_full_success() {
    let mut server = Server::new_async().await;
    let event = server
        .mock("POST", "/event")
        .match_header("x-client-id", Matcher::Any)
        .match_body(Matcher::PartialJson(json!({
            "action": "transaction:sent",
            "chainId": 6342,
            "transactionHash": FakeChain::hash().to_string(),
        })))
        .with_status(200)
        .with_body(r#"{"message":"OK"}"#)
        .expect(1)
        .create_async()
        .await;

    let chain = FakeChain::default();
    let desc = descriptor(WorkflowKind::MegaCat);
    let verifier = verifier(format!("{}/event", server.url()));

    let result = mint_with(&chain, &signer(), &desc, Some(&verifier), "[1/1]")
        .await
        .unwrap();

    assert_eq!(result.status(), TaskStatus::Success, "{:?}", result);
    event.assert_async().await;
}

#[tokio::test]
async fn test_rejected_event_is_unverified() {
    let mut server = Server::new_async().await;
    let event = server
        .mock("POST", "/event")
        .with_status(500)
        .with_body(r#"{"message":"internal"}"#)
        .expect(1)
        .create_async()
        .await;

    let chain = FakeChain::default();
    let desc = descriptor(WorkflowKind::LordLapin);
    let verifier = verifier(format!("{}/event", server.url()));

    let result = mint_with(&chain, &signer(), &desc, Some(&verifier), "[1/1]")
        .await
        .unwrap();

    assert_eq!(result.status(), TaskStatus::Unverified);
    assert!(result.success);
    assert_eq!(result.tx_hash, Some(FakeChain::hash().to_string()));
    event.assert_async().await;
}

#[tokio::test]
async fn test_address_only_account_cannot_mint() {
    let clients = ClientPool::from_proxies(&[], Duration::from_secs(5)).unwrap();
    let ctx = RunContext::new(Settings::default(), clients, 1, CancellationToken::new());
    let account = AccountData::from_line("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266").unwrap();

    let result = mint::run(&ctx, &account, &descriptor(WorkflowKind::Blackhole))
        .await
        .unwrap();

    assert_eq!(result.status(), TaskStatus::Failed);
    assert_eq!(result.error.as_deref(), Some("no signing key"));
}
