// SPDX-License-Identifier: AGPL-3.0-or-later

//! EVM chain client.
//!
//! One wallet-backed HTTP provider serves both reads and writes; every
//! write awaits its receipt before returning. The client verifies at
//! connect time that the RPC endpoint serves the configured chain id, so
//! a transaction can never land on the wrong network.

use alloy::{
    network::{Ethereum, EthereumWallet},
    providers::{
        fillers::{
            BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller,
            WalletFiller,
        },
        Identity, Provider, ProviderBuilder, RootProvider,
    },
    primitives::Address,
    rpc::types::TransactionReceipt,
    signers::local::PrivateKeySigner,
};

use crate::config::{ClientConfig, NetworkConfig};
use crate::error::ClientError;

/// Wallet-backed HTTP provider type (recommended fillers + wallet).
pub type SignerProvider = FillProvider<
    JoinFill<
        JoinFill<
            Identity,
            JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
        >,
        WalletFiller<EthereumWallet>,
    >,
    RootProvider<Ethereum>,
>;

/// Transaction receipt after confirmation.
#[derive(Debug, Clone)]
pub struct TxReceipt {
    /// Transaction hash
    pub tx_hash: String,
    /// Block number where the transaction was included
    pub block_number: u64,
    /// Gas actually used
    pub gas_used: u64,
    /// Whether the transaction was successful
    pub success: bool,
}

/// Chain client bound to one network and one signing key.
pub struct ChainClient {
    network: NetworkConfig,
    provider: SignerProvider,
    caller: Address,
}

impl ChainClient {
    /// Connect to the configured RPC endpoint with the configured key.
    ///
    /// Fails with `NoWalletConnected` when no signing key is configured
    /// and with `ChainMismatch` when the endpoint serves another chain.
    pub async fn connect(config: &ClientConfig) -> Result<Self, ClientError> {
        let key = config
            .private_key
            .as_deref()
            .ok_or(ClientError::NoWalletConnected)?;
        let signer = signer_from_hex(key)?;
        let caller = signer.address();
        let wallet = EthereumWallet::from(signer);

        let url: url::Url = config
            .rpc_url
            .parse()
            .map_err(|e: url::ParseError| ClientError::Config(format!("invalid RPC URL: {e}")))?;

        let provider = ProviderBuilder::new().wallet(wallet).connect_http(url);

        let chain_id = provider
            .get_chain_id()
            .await
            .map_err(|e| ClientError::Rpc(e.to_string()))?;
        if chain_id != config.network.chain_id {
            return Err(ClientError::ChainMismatch {
                expected: config.network.chain_id,
                actual: chain_id,
            });
        }

        tracing::debug!(
            network = config.network.name,
            chain_id,
            caller = %caller,
            "chain client connected"
        );

        Ok(Self {
            network: config.network.clone(),
            provider,
            caller,
        })
    }

    /// Address of the signing key; used as the implicit scope for
    /// caller-bound contract state.
    pub fn caller(&self) -> Address {
        self.caller
    }

    /// The underlying provider, for building contract instances.
    pub fn provider(&self) -> &SignerProvider {
        &self.provider
    }

    /// Get the network configuration.
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    /// Get the current block number.
    pub async fn block_number(&self) -> Result<u64, ClientError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| ClientError::Rpc(e.to_string()))
    }
}

/// Create a signer from a hex private key (0x prefix optional).
pub fn signer_from_hex(private_key_hex: &str) -> Result<PrivateKeySigner, ClientError> {
    let trimmed = private_key_hex
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches("0X");
    let key_bytes = alloy::hex::decode(trimmed)
        .map_err(|e| ClientError::Config(format!("invalid private key: {e}")))?;

    PrivateKeySigner::from_slice(&key_bytes)
        .map_err(|e| ClientError::Config(format!("invalid private key: {e}")))
}

/// Convert a confirmed receipt, failing when the transaction reverted.
pub fn confirm_receipt(receipt: TransactionReceipt) -> Result<TxReceipt, ClientError> {
    let tx_hash = format!("{:?}", receipt.transaction_hash);
    if !receipt.status() {
        return Err(ClientError::TransactionReverted { tx_hash });
    }

    Ok(TxReceipt {
        tx_hash,
        block_number: receipt.block_number.unwrap_or(0),
        gas_used: receipt.gas_used as u64,
        success: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signer_accepts_prefixed_and_bare_hex() {
        let bare = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";
        let prefixed = format!("0x{bare}");

        let a = signer_from_hex(bare).unwrap();
        let b = signer_from_hex(&prefixed).unwrap();
        assert_eq!(a.address(), b.address());
    }

    #[test]
    fn signer_rejects_garbage() {
        assert!(signer_from_hex("not-a-key").is_err());
        assert!(signer_from_hex("0x1234").is_err());
    }
}
