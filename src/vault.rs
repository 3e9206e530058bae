// SPDX-License-Identifier: AGPL-3.0-or-later

//! Share vault workflow.
//!
//! Deposits carry plain value; the vault encrypts balances internally.
//! Withdrawal needs the contract to hold a fresh plaintext of the
//! caller's available balance, so it runs the decryption engine first
//! and then submits the *requested* amount; whether the balance covers
//! it is the contract's check.

use alloy::primitives::{Address, Bytes, B256, U256};
use tracing::info;

use crate::amount::to_base_units;
use crate::chain::{confirm_receipt, ChainClient, SignerProvider, TxReceipt};
use crate::contracts::IShareVault;
use crate::decrypt::{
    resolve_plaintext, DecryptionRecord, EncryptedQuantity, ResolvedPlaintext,
};
use crate::error::ClientError;
use crate::relayer::PublicDecryptor;

type VaultInstance = IShareVault::IShareVaultInstance<SignerProvider>;

/// Client for the share vault contract.
pub struct VaultClient<R> {
    contract: VaultInstance,
    caller: Address,
    relayer: R,
}

impl<R> VaultClient<R>
where
    R: PublicDecryptor,
{
    /// Bind the vault at `address` to the connected chain client.
    pub fn new(chain: &ChainClient, address: Address, relayer: R) -> Self {
        Self {
            contract: IShareVault::new(address, chain.provider().clone()),
            caller: chain.caller(),
            relayer,
        }
    }

    /// Address of the vault contract.
    pub fn address(&self) -> Address {
        *self.contract.address()
    }

    /// Deposit ether into the vault. The amount is validated against the
    /// encrypted-field ceiling before submission.
    pub async fn deposit(&self, amount: &str) -> Result<TxReceipt, ClientError> {
        let amount_wei = to_base_units(amount)?;

        let receipt = self
            .contract
            .deposit()
            .value(U256::from(amount_wei))
            .send()
            .await
            .map_err(ClientError::from_contract)?
            .get_receipt()
            .await
            .map_err(|e| ClientError::Rpc(e.to_string()))?;

        let receipt = confirm_receipt(receipt)?;
        info!(amount_wei, tx = %receipt.tx_hash, "deposited into vault");
        Ok(receipt)
    }

    /// Withdraw ether from the vault.
    ///
    /// Resolves the available-balance plaintext first so the contract's
    /// cache is fresh enough to validate against, then submits the
    /// requested amount. An insufficient balance surfaces as a contract
    /// revert, not a client-side check.
    pub async fn withdraw(&self, amount: &str) -> Result<TxReceipt, ClientError> {
        let amount_wei = to_base_units(amount)?;

        self.resolve_available_balance().await?;

        let receipt = self
            .contract
            .withdraw(amount_wei)
            .send()
            .await
            .map_err(ClientError::from_contract)?
            .get_receipt()
            .await
            .map_err(|e| ClientError::Rpc(e.to_string()))?;

        let receipt = confirm_receipt(receipt)?;
        info!(amount_wei, tx = %receipt.tx_hash, "withdrew from vault");
        Ok(receipt)
    }

    /// Resolve the caller's available-balance plaintext.
    pub async fn resolve_available_balance(&self) -> Result<ResolvedPlaintext, ClientError> {
        let quantity = AvailableBalance {
            contract: &self.contract,
            caller: self.caller,
        };
        resolve_plaintext(&quantity, &self.relayer).await
    }

    /// Decryption record for the caller's available balance.
    pub async fn available_balance_status(&self) -> Result<DecryptionRecord, ClientError> {
        let raw = self
            .contract
            .getAvailableBalanceStatus()
            .from(self.caller)
            .call()
            .await
            .map_err(ClientError::from_contract)?;
        DecryptionRecord::from_parts(raw.status, raw.availableAmount, raw.cacheExpiry)
    }

    /// Ciphertext handle of the caller's full balance.
    pub async fn encrypted_balance(&self) -> Result<B256, ClientError> {
        self.contract
            .getEncryptedBalance()
            .from(self.caller)
            .call()
            .await
            .map_err(ClientError::from_contract)
    }

    /// Ciphertext handles of the caller's balance and locked amount.
    pub async fn encrypted_balance_and_locked(&self) -> Result<(B256, B256), ClientError> {
        let raw = self
            .contract
            .getEncryptedBalanceAndLocked()
            .from(self.caller)
            .call()
            .await
            .map_err(ClientError::from_contract)?;
        Ok((raw.balance, raw.locked))
    }

    /// Handle currently marked decryptable for the caller, if a request
    /// is in flight.
    pub async fn pending_available_balance_handle(&self) -> Result<B256, ClientError> {
        self.contract
            .getPendingAvailableBalanceHandle()
            .from(self.caller)
            .call()
            .await
            .map_err(ClientError::from_contract)
    }
}

/// The caller's withdrawable vault balance; the scope key is implicit
/// in the transaction sender, so every call pins `from`.
struct AvailableBalance<'a> {
    contract: &'a VaultInstance,
    caller: Address,
}

impl EncryptedQuantity for AvailableBalance<'_> {
    fn label(&self) -> &'static str {
        "available balance"
    }

    fn owner_contract(&self) -> Address {
        *self.contract.address()
    }

    async fn status(&self) -> Result<DecryptionRecord, ClientError> {
        let raw = self
            .contract
            .getAvailableBalanceStatus()
            .from(self.caller)
            .call()
            .await
            .map_err(ClientError::from_contract)?;
        DecryptionRecord::from_parts(raw.status, raw.availableAmount, raw.cacheExpiry)
    }

    async fn request_decryption(&self) -> Result<TxReceipt, ClientError> {
        let receipt = self
            .contract
            .requestAvailableBalanceDecryption()
            .send()
            .await
            .map_err(ClientError::from_contract)?
            .get_receipt()
            .await
            .map_err(|e| ClientError::Rpc(e.to_string()))?;
        confirm_receipt(receipt)
    }

    async fn encrypted_handle(&self) -> Result<B256, ClientError> {
        self.contract
            .getPendingAvailableBalanceHandle()
            .from(self.caller)
            .call()
            .await
            .map_err(ClientError::from_contract)
    }

    async fn submit_decryption(
        &self,
        cleartext: u64,
        proof: Bytes,
    ) -> Result<TxReceipt, ClientError> {
        let receipt = self
            .contract
            .submitAvailableBalanceDecryption(cleartext, proof)
            .send()
            .await
            .map_err(ClientError::from_contract)?
            .get_receipt()
            .await
            .map_err(|e| ClientError::Rpc(e.to_string()))?;
        confirm_receipt(receipt)
    }
}

#[cfg(test)]
mod tests {
    use crate::amount::to_base_units;
    use crate::error::ClientError;

    #[test]
    fn withdrawal_amount_is_the_requested_amount_in_base_units() {
        // "2.5" ether becomes exactly 2.5e18 wei regardless of whatever
        // balance the engine resolves.
        assert_eq!(to_base_units("2.5").unwrap(), 2_500_000_000_000_000_000u64);
    }

    #[test]
    fn withdrawal_rejects_out_of_range_amounts_before_any_chain_call() {
        assert!(matches!(
            to_base_units("0").unwrap_err(),
            ClientError::InvalidAmount(_)
        ));
        // Above the uint64 ceiling (~18.44 ETH).
        assert!(matches!(
            to_base_units("19").unwrap_err(),
            ClientError::InvalidAmount(_)
        ));
    }
}
