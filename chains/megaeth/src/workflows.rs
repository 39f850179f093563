//! Workflow registry.
//!
//! [`WorkflowKind`] is the closed set of selectable workflows. Resolving a
//! name happens once at startup; an unknown name is a configuration error
//! before any account is touched.

use crate::accounts::AccountData;
use crate::config::Settings;
use crate::context::RunContext;
use crate::tasks;
use alloy::primitives::{Address, B256, Bytes, U256, address};
use alloy::sol;
use alloy::sol_types::SolCall;
use anyhow::Result;
use async_trait::async_trait;
use core_logic::{ConfigError, Task, TaskResult};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Marker the drop contracts use for "pay in the native token".
pub const NATIVE_CURRENCY: Address = address!("0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE");

sol! {
    struct ClaimProof {
        bytes32[] proof;
        uint256 leafIndex;
        uint256 leafAmount;
        address leafAddress;
    }

    function claim(
        address receiver,
        uint256 quantity,
        address currency,
        uint256 pricePerToken,
        ClaimProof allowlistProof,
        bytes data
    ) external payable;
}

/// How a mint's call data is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MintVariant {
    /// Drop-style `claim(...)` with a placeholder proof that the target
    /// contracts accept on their public claim path.
    Claim,
    /// Fixed call data, sent as is.
    RawCall(Bytes),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintDescriptor {
    pub display_name: &'static str,
    pub contract: Address,
    pub value: U256,
    pub variant: MintVariant,
}

/// What the mint flow needs from a descriptor.
pub trait MintCall: Send + Sync {
    fn build_call_data(&self, receiver: Address) -> Bytes;
    fn contract_address(&self) -> Address;
    fn value(&self) -> U256;
    fn display_name(&self) -> &str;
}

impl MintCall for MintDescriptor {
    fn build_call_data(&self, receiver: Address) -> Bytes {
        match &self.variant {
            MintVariant::RawCall(data) => data.clone(),
            MintVariant::Claim => claimCall {
                receiver,
                quantity: U256::from(1),
                currency: NATIVE_CURRENCY,
                pricePerToken: self.value,
                allowlistProof: ClaimProof {
                    proof: Vec::<B256>::new(),
                    leafIndex: U256::ZERO,
                    leafAmount: U256::MAX,
                    leafAddress: Address::ZERO,
                },
                data: Bytes::new(),
            }
            .abi_encode()
            .into(),
        }
    }

    fn contract_address(&self) -> Address {
        self.contract
    }

    fn value(&self) -> U256 {
        self.value
    }

    fn display_name(&self) -> &str {
        self.display_name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkflowKind {
    Faucet,
    FunStarts,
    Megamafia,
    MegaCat,
    Blackhole,
    Xyroph,
    LordLapin,
    AngryMonkeys,
    Bloom,
}

impl WorkflowKind {
    /// Menu order.
    pub const ALL: [WorkflowKind; 9] = [
        WorkflowKind::Faucet,
        WorkflowKind::FunStarts,
        WorkflowKind::Megamafia,
        WorkflowKind::MegaCat,
        WorkflowKind::Blackhole,
        WorkflowKind::Xyroph,
        WorkflowKind::LordLapin,
        WorkflowKind::AngryMonkeys,
        WorkflowKind::Bloom,
    ];

    pub fn menu_name(&self) -> &'static str {
        match self {
            WorkflowKind::Faucet => "Faucet test tokens",
            WorkflowKind::FunStarts => "Mint FUN Starts NFT",
            WorkflowKind::Megamafia => "Mint Megamafia NFT",
            WorkflowKind::MegaCat => "Mint Mega Cat NFT",
            WorkflowKind::Blackhole => "Mint Blackhole NFT",
            WorkflowKind::Xyroph => "Mint Xyroph NFT",
            WorkflowKind::LordLapin => "Mint Lord Lapin NFT",
            WorkflowKind::AngryMonkeys => "Mint Angry Monkeys",
            WorkflowKind::Bloom => "Mint Bloom NFT",
        }
    }

    /// Short name accepted by `--workflow`.
    pub fn slug(&self) -> &'static str {
        match self {
            WorkflowKind::Faucet => "faucet",
            WorkflowKind::FunStarts => "fun-starts",
            WorkflowKind::Megamafia => "megamafia",
            WorkflowKind::MegaCat => "mega-cat",
            WorkflowKind::Blackhole => "blackhole",
            WorkflowKind::Xyroph => "xyroph",
            WorkflowKind::LordLapin => "lord-lapin",
            WorkflowKind::AngryMonkeys => "angry-monkeys",
            WorkflowKind::Bloom => "bloom",
        }
    }

    pub fn workflow(&self) -> Workflow {
        let claim = |display_name, contract, value: u64| {
            Workflow::Mint(MintDescriptor {
                display_name,
                contract,
                value: U256::from(value),
                variant: MintVariant::Claim,
            })
        };

        match self {
            WorkflowKind::Faucet => Workflow::Faucet,
            WorkflowKind::FunStarts => Workflow::Mint(MintDescriptor {
                display_name: "Mint Fun NFT",
                contract: address!("0xb8027dca96746f073896c45f65b720f9bd2afee7"),
                value: U256::ZERO,
                // mint()
                variant: MintVariant::RawCall(Bytes::from_static(&[0x12, 0x49, 0xc5, 0x8b])),
            }),
            WorkflowKind::Megamafia => claim(
                "Megamafia",
                address!("0xa3C89fEb775940886001E8f541f4b803AaD0a47B"),
                0,
            ),
            WorkflowKind::MegaCat => claim(
                "Mega Cat",
                address!("0x0837ec39d40CCdcea4b4B6bfCfb3d71E7EbFC71C"),
                0,
            ),
            WorkflowKind::Blackhole => claim(
                "Blackhole",
                address!("0xcfD3dDe3A4B393a2a204ff16B112C2cA9B85abb7"),
                0,
            ),
            WorkflowKind::Xyroph => claim(
                "Xyroph",
                address!("0xd59522848e5429986d6fe6607aef6b8e7706aea5"),
                1_550_000_000_000_000,
            ),
            WorkflowKind::LordLapin => claim(
                "Lord Lapin",
                address!("0x0d7BEa5686E3c85cb018faa066AB36CF00b63eBB"),
                0,
            ),
            WorkflowKind::AngryMonkeys => claim(
                "Angry Monkeys",
                address!("0x8ac06714c0d417569bcc642cd74e48a64fe99504"),
                1_440_000_000_000_000,
            ),
            WorkflowKind::Bloom => claim(
                "Bloom",
                address!("0xb33C085f82B253B12a9d36F8E8EdD123FFB53d31"),
                0,
            ),
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.menu_name())
    }
}

impl FromStr for WorkflowKind {
    type Err = ConfigError;

    /// Accepts the menu name or the slug, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        WorkflowKind::ALL
            .into_iter()
            .find(|k| {
                k.slug().eq_ignore_ascii_case(wanted) || k.menu_name().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ConfigError::UnknownWorkflow {
                name: s.to_string(),
            })
    }
}

/// A resolved workflow, immutable for the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Workflow {
    Faucet,
    Mint(MintDescriptor),
}

impl Workflow {
    pub fn display_name(&self) -> &str {
        match self {
            Workflow::Faucet => "Faucet",
            Workflow::Mint(desc) => desc.display_name(),
        }
    }

    /// Fails on settings this workflow cannot run without.
    pub fn check_settings(&self, settings: &Settings) -> Result<(), ConfigError> {
        match self {
            Workflow::Faucet if !settings.has_captcha_key() => Err(ConfigError::MissingField {
                field: "capmonster_api_key".to_string(),
            }),
            _ => Ok(()),
        }
    }
}

/// Binds a workflow to the shared run context for the scheduler.
pub struct WorkflowTask {
    workflow: Workflow,
    ctx: Arc<RunContext>,
}

impl WorkflowTask {
    pub fn new(workflow: Workflow, ctx: Arc<RunContext>) -> Self {
        Self { workflow, ctx }
    }
}

#[async_trait]
impl Task<AccountData> for WorkflowTask {
    fn name(&self) -> &str {
        self.workflow.display_name()
    }

    async fn run(&self, account: AccountData) -> Result<TaskResult> {
        match &self.workflow {
            Workflow::Faucet => tasks::faucet::run(&self.ctx, &account).await,
            Workflow::Mint(desc) => tasks::mint::run(&self.ctx, &account, desc).await,
        }
    }
}
