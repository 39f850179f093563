//! Account loading.
//!
//! Each line of the account file is either a private key (64 hex chars,
//! optional `0x`) or a bare address (40 hex chars). Address-only accounts
//! can run workflows that never sign, such as the faucet claim.

use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use anyhow::{Context, Result};
use core_logic::WalletError;
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use zeroize::Zeroizing;

#[derive(Clone)]
pub struct AccountData {
    signer: Option<PrivateKeySigner>,
    address: Address,
    log_data: String,
}

impl AccountData {
    pub fn from_line(line: &str) -> Result<Self, WalletError> {
        let trimmed = line.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if hex_part.is_empty() || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(WalletError::InvalidKeyFormat);
        }

        match hex_part.len() {
            40 => {
                let address: Address =
                    format!("0x{}", hex_part)
                        .parse()
                        .map_err(|_| WalletError::InvalidAddress {
                            value: trimmed.to_string(),
                        })?;
                Ok(Self {
                    signer: None,
                    address,
                    log_data: address.to_string(),
                })
            }
            64 => {
                let bytes = Zeroizing::new(
                    hex::decode(hex_part).map_err(|_| WalletError::InvalidKeyFormat)?,
                );
                let signer = PrivateKeySigner::from_slice(&bytes)
                    .map_err(|_| WalletError::InvalidKeyFormat)?;
                let address = signer.address();
                Ok(Self {
                    signer: Some(signer),
                    address,
                    log_data: mask_key(hex_part),
                })
            }
            length => Err(WalletError::InvalidKeyLength { length }),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn signer(&self) -> Option<&PrivateKeySigner> {
        self.signer.as_ref()
    }

    pub fn require_signer(&self) -> Result<&PrivateKeySigner, WalletError> {
        self.signer.as_ref().ok_or(WalletError::MissingSigner)
    }

    pub fn is_address_only(&self) -> bool {
        self.signer.is_none()
    }

    /// Loggable form of the source line. Keys are masked.
    pub fn log_data(&self) -> &str {
        &self.log_data
    }
}

impl fmt::Debug for AccountData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountData")
            .field("address", &self.address)
            .field("has_signer", &self.signer.is_some())
            .finish()
    }
}

fn mask_key(hex_key: &str) -> String {
    format!("0x{}…{}", &hex_key[..4], &hex_key[hex_key.len() - 4..])
}

/// Parses every non-blank line, skipping malformed ones with a warning.
pub fn parse_accounts(content: &str) -> Vec<AccountData> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(idx, line)| match AccountData::from_line(line) {
            Ok(account) => Some(account),
            Err(e) => {
                warn!("Skipping account line {}: {}", idx + 1, e);
                None
            }
        })
        .collect()
}

pub fn load_accounts(path: impl AsRef<Path>) -> Result<Vec<AccountData>> {
    let path = path.as_ref();
    let content = Zeroizing::new(
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read accounts from {}", path.display()))?,
    );

    let accounts = parse_accounts(&content);
    let address_only = accounts.iter().filter(|a| a.is_address_only()).count();
    info!(
        "Loaded {} accounts from {} ({} address-only)",
        accounts.len(),
        path.display(),
        address_only
    );
    Ok(accounts)
}
