// SPDX-License-Identifier: AGPL-3.0-or-later

//! # Runtime Configuration
//!
//! Configuration is loaded from the environment at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `FUNDRAISER_RPC_URL` | EVM RPC endpoint | Sepolia public RPC |
//! | `FUNDRAISER_PRIVATE_KEY` | Hex signing key (0x prefix optional) | None (read-only) |
//! | `FUNDRAISER_CAMPAIGN_ADDRESS` | Campaign registry contract address | Required |
//! | `FUNDRAISER_VAULT_ADDRESS` | Share vault contract address | Required |
//! | `FUNDRAISER_RELAYER_URL` | Decryption relayer base URL | Required |
//! | `RUST_LOG` | Log level filter | `info` |

use std::env;
use std::str::FromStr;

use alloy::primitives::Address;

use crate::error::ClientError;

/// Environment variable name for the RPC endpoint URL.
pub const RPC_URL_ENV: &str = "FUNDRAISER_RPC_URL";
/// Environment variable name for the hex-encoded signing key.
pub const PRIVATE_KEY_ENV: &str = "FUNDRAISER_PRIVATE_KEY";
/// Environment variable name for the campaign registry contract address.
pub const CAMPAIGN_ADDRESS_ENV: &str = "FUNDRAISER_CAMPAIGN_ADDRESS";
/// Environment variable name for the share vault contract address.
pub const VAULT_ADDRESS_ENV: &str = "FUNDRAISER_VAULT_ADDRESS";
/// Environment variable name for the decryption relayer base URL.
pub const RELAYER_URL_ENV: &str = "FUNDRAISER_RELAYER_URL";

/// Network configuration.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Network name for display
    pub name: &'static str,
    /// Chain ID
    pub chain_id: u64,
    /// Default RPC endpoint URL
    pub rpc_url: &'static str,
    /// Block explorer URL
    pub explorer_url: &'static str,
}

/// Ethereum Sepolia testnet, where the confidential contracts are deployed.
pub const SEPOLIA: NetworkConfig = NetworkConfig {
    name: "Ethereum Sepolia",
    chain_id: 11155111,
    rpc_url: "https://ethereum-sepolia-rpc.publicnode.com",
    explorer_url: "https://sepolia.etherscan.io",
};

/// Fully resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Target network; writes are rejected if the RPC serves another chain.
    pub network: NetworkConfig,
    /// RPC endpoint to connect to.
    pub rpc_url: String,
    /// Hex signing key. `None` means no wallet is connected; any operation
    /// that must sign fails with `NoWalletConnected`.
    pub private_key: Option<String>,
    /// Campaign registry contract address.
    pub campaign_address: Address,
    /// Share vault contract address.
    pub vault_address: Address,
    /// Decryption relayer base URL.
    pub relayer_url: String,
}

impl ClientConfig {
    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, ClientError> {
        let rpc_url =
            env::var(RPC_URL_ENV).unwrap_or_else(|_| SEPOLIA.rpc_url.to_string());
        let private_key = env::var(PRIVATE_KEY_ENV).ok();
        let campaign_address = parse_address_env(CAMPAIGN_ADDRESS_ENV)?;
        let vault_address = parse_address_env(VAULT_ADDRESS_ENV)?;
        let relayer_url = env::var(RELAYER_URL_ENV)
            .map_err(|_| ClientError::Config(format!("{RELAYER_URL_ENV} is not set")))?;

        Ok(Self {
            network: SEPOLIA,
            rpc_url,
            private_key,
            campaign_address,
            vault_address,
            relayer_url,
        })
    }
}

fn parse_address_env(var: &str) -> Result<Address, ClientError> {
    let raw = env::var(var).map_err(|_| ClientError::Config(format!("{var} is not set")))?;
    Address::from_str(raw.trim())
        .map_err(|e| ClientError::Config(format!("{var} is not a valid address: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sepolia_network_constants() {
        assert_eq!(SEPOLIA.chain_id, 11155111);
        assert!(SEPOLIA.rpc_url.starts_with("https://"));
    }
}
