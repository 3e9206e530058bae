// SPDX-License-Identifier: AGPL-3.0-or-later

//! Self-relaying decryption engine.
//!
//! On-chain encrypted values cannot be read directly: the client must
//! flag the value as publicly decryptable, fetch its ciphertext handle,
//! have the relayer decrypt it, and submit the plaintext plus proof back
//! so the contract caches it with an expiry. [`resolve_plaintext`] runs
//! that protocol for any [`EncryptedQuantity`], doing on-chain work only
//! when the cached record is missing, stale, or half-finished.
//!
//! The engine never retries a step and holds no state of its own. All
//! protocol state lives on-chain in the quantity's decryption record, so
//! re-invoking `resolve_plaintext` after any failure is always safe: the
//! fresh status probe decides where to pick up, and a confirmed request
//! is never re-issued.

use alloy::primitives::{Address, Bytes, B256, U256};
use tracing::{debug, info};

use crate::chain::TxReceipt;
use crate::error::ClientError;
use crate::relayer::PublicDecryptor;

/// Decryption lifecycle of one encrypted quantity, as stored on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecryptStatus {
    /// No decryption has been requested, or nothing is cached.
    None,
    /// A request transaction is confirmed; the proof has not been
    /// submitted yet.
    Processing,
    /// A plaintext is cached with an expiry timestamp.
    Decrypted,
}

impl DecryptStatus {
    /// Decode the on-chain `uint8` representation.
    pub fn from_u8(raw: u8) -> Result<Self, ClientError> {
        match raw {
            0 => Ok(Self::None),
            1 => Ok(Self::Processing),
            2 => Ok(Self::Decrypted),
            other => Err(ClientError::Contract(format!(
                "unknown decrypt status {other}"
            ))),
        }
    }
}

/// One quantity's decryption record, read from contract state.
///
/// `value` is meaningful only while `status` is `Decrypted` and the
/// expiry has not passed. An expired record is functionally `None` but
/// is not reset on-chain; staleness is detected here, client-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptionRecord {
    pub status: DecryptStatus,
    pub value: u64,
    pub cache_expiry: u64,
}

impl DecryptionRecord {
    /// Build a record from the raw tuple every status getter returns.
    pub fn from_parts(status: u8, value: u64, cache_expiry: U256) -> Result<Self, ClientError> {
        Ok(Self {
            status: DecryptStatus::from_u8(status)?,
            value,
            cache_expiry: cache_expiry.saturating_to::<u64>(),
        })
    }

    /// Whether the cached value can be trusted at `now` (unix seconds).
    ///
    /// Zero is a legitimate cached value; freshness is purely
    /// expiry-driven.
    pub fn is_fresh(&self, now: u64) -> bool {
        self.status == DecryptStatus::Decrypted && now < self.cache_expiry
    }
}

/// One encrypted quantity and the contract endpoints that manage it.
///
/// The three kinds (my contribution, total raised, available balance)
/// live on different contracts with different scope keys, but share the
/// same four-method protocol shape; implementations bind the scope key
/// at construction so the engine stays kind-agnostic.
pub trait EncryptedQuantity {
    /// Short name for logging.
    fn label(&self) -> &'static str;

    /// Contract that owns the ciphertext; the relayer needs it to
    /// locate the key material.
    fn owner_contract(&self) -> Address;

    /// Read the current decryption record.
    fn status(
        &self,
    ) -> impl std::future::Future<Output = Result<DecryptionRecord, ClientError>> + Send;

    /// Step 1: flag the value as publicly decryptable and await
    /// confirmation.
    fn request_decryption(
        &self,
    ) -> impl std::future::Future<Output = Result<TxReceipt, ClientError>> + Send;

    /// Step 2: read the ciphertext handle.
    fn encrypted_handle(
        &self,
    ) -> impl std::future::Future<Output = Result<B256, ClientError>> + Send;

    /// Step 4: write the plaintext and proof back and await
    /// confirmation.
    fn submit_decryption(
        &self,
        cleartext: u64,
        proof: Bytes,
    ) -> impl std::future::Future<Output = Result<TxReceipt, ClientError>> + Send;
}

/// Outcome of [`resolve_plaintext`].
#[derive(Debug, Clone)]
pub struct ResolvedPlaintext {
    /// The verified plaintext value.
    pub cleartext: u64,
    /// Receipt of the submit transaction; `None` when the cached value
    /// was fresh and no on-chain work happened.
    pub receipt: Option<TxReceipt>,
}

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

/// Guarantee a fresh, verified plaintext for `quantity`.
///
/// Branches on the on-chain record:
/// - fresh `Decrypted`: return the cached value, zero writes;
/// - `Processing`: a prior attempt already confirmed the request
///   (possibly in another session); resume at the handle fetch;
/// - `None` or stale: run all four steps.
///
/// Steps run strictly sequentially, one attempt each; failures
/// propagate unchanged and the caller may simply call again.
pub async fn resolve_plaintext<Q, R>(
    quantity: &Q,
    relayer: &R,
) -> Result<ResolvedPlaintext, ClientError>
where
    Q: EncryptedQuantity,
    R: PublicDecryptor,
{
    let record = quantity.status().await?;
    let now = unix_now();

    if record.is_fresh(now) {
        debug!(
            quantity = quantity.label(),
            value = record.value,
            expires = record.cache_expiry,
            "cached plaintext is fresh, skipping decryption"
        );
        return Ok(ResolvedPlaintext {
            cleartext: record.value,
            receipt: None,
        });
    }

    match record.status {
        DecryptStatus::Processing => {
            // The request transaction already landed; re-issuing it
            // would at best waste gas and at worst revert.
            info!(
                quantity = quantity.label(),
                "decryption already in flight, resuming at handle fetch"
            );
        }
        _ => {
            info!(quantity = quantity.label(), "requesting decryption");
            let receipt = quantity.request_decryption().await?;
            debug!(
                quantity = quantity.label(),
                tx = %receipt.tx_hash,
                "decryption request confirmed"
            );
        }
    }

    let handle = quantity.encrypted_handle().await?;
    debug!(quantity = quantity.label(), %handle, "fetched ciphertext handle");

    let decrypted = relayer
        .public_decrypt(handle, quantity.owner_contract())
        .await?;
    debug!(
        quantity = quantity.label(),
        cleartext = decrypted.cleartext,
        proof_len = decrypted.proof.len(),
        "relayer produced plaintext and proof"
    );

    let receipt = quantity
        .submit_decryption(decrypted.cleartext, decrypted.proof)
        .await?;
    info!(
        quantity = quantity.label(),
        cleartext = decrypted.cleartext,
        tx = %receipt.tx_hash,
        "decryption proof submitted and verified on-chain"
    );

    Ok(ResolvedPlaintext {
        cleartext: decrypted.cleartext,
        receipt: Some(receipt),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use alloy::primitives::{address, b256, Bytes};

    use super::*;
    use crate::relayer::DecryptedValue;

    const OWNER: Address = address!("00000000000000000000000000000000000000aa");
    const HANDLE: B256 =
        b256!("1111111111111111111111111111111111111111111111111111111111111111");
    const CACHE_TIMEOUT: u64 = 600;

    /// In-memory stand-in for one quantity's on-chain state, with call
    /// counters for asserting which protocol steps ran.
    #[derive(Debug)]
    struct FakeChain {
        record: DecryptionRecord,
        plaintext: u64,
        request_calls: usize,
        handle_calls: usize,
        submit_calls: usize,
    }

    impl FakeChain {
        fn new(record: DecryptionRecord, plaintext: u64) -> Arc<Mutex<Self>> {
            Arc::new(Mutex::new(Self {
                record,
                plaintext,
                request_calls: 0,
                handle_calls: 0,
                submit_calls: 0,
            }))
        }
    }

    #[derive(Clone)]
    struct FakeQuantity {
        chain: Arc<Mutex<FakeChain>>,
    }

    impl EncryptedQuantity for FakeQuantity {
        fn label(&self) -> &'static str {
            "fake quantity"
        }

        fn owner_contract(&self) -> Address {
            OWNER
        }

        async fn status(&self) -> Result<DecryptionRecord, ClientError> {
            Ok(self.chain.lock().unwrap().record)
        }

        async fn request_decryption(&self) -> Result<TxReceipt, ClientError> {
            let mut chain = self.chain.lock().unwrap();
            chain.request_calls += 1;
            chain.record.status = DecryptStatus::Processing;
            Ok(receipt("0xrequest"))
        }

        async fn encrypted_handle(&self) -> Result<B256, ClientError> {
            self.chain.lock().unwrap().handle_calls += 1;
            Ok(HANDLE)
        }

        async fn submit_decryption(
            &self,
            cleartext: u64,
            _proof: Bytes,
        ) -> Result<TxReceipt, ClientError> {
            let mut chain = self.chain.lock().unwrap();
            chain.submit_calls += 1;
            chain.record = DecryptionRecord {
                status: DecryptStatus::Decrypted,
                value: cleartext,
                cache_expiry: unix_now() + CACHE_TIMEOUT,
            };
            Ok(receipt("0xsubmit"))
        }
    }

    struct FakeRelayer {
        chain: Arc<Mutex<FakeChain>>,
        reject: bool,
    }

    impl PublicDecryptor for FakeRelayer {
        async fn public_decrypt(
            &self,
            handle: B256,
            owner_contract: Address,
        ) -> Result<DecryptedValue, ClientError> {
            assert_eq!(handle, HANDLE);
            assert_eq!(owner_contract, OWNER);
            if self.reject {
                return Err(ClientError::DecryptionRejected(
                    "cleartext not found in decryption result".into(),
                ));
            }
            Ok(DecryptedValue {
                cleartext: self.chain.lock().unwrap().plaintext,
                proof: Bytes::from(vec![0xab; 16]),
            })
        }
    }

    fn receipt(hash: &str) -> TxReceipt {
        TxReceipt {
            tx_hash: hash.to_string(),
            block_number: 1,
            gas_used: 21_000,
            success: true,
        }
    }

    fn none_record() -> DecryptionRecord {
        DecryptionRecord {
            status: DecryptStatus::None,
            value: 0,
            cache_expiry: 0,
        }
    }

    #[tokio::test]
    async fn none_status_runs_full_workflow() {
        let chain = FakeChain::new(none_record(), 500);
        let quantity = FakeQuantity { chain: chain.clone() };
        let relayer = FakeRelayer { chain: chain.clone(), reject: false };

        let resolved = resolve_plaintext(&quantity, &relayer).await.unwrap();
        assert_eq!(resolved.cleartext, 500);
        assert_eq!(resolved.receipt.unwrap().tx_hash, "0xsubmit");

        let state = chain.lock().unwrap();
        assert_eq!(state.request_calls, 1);
        assert_eq!(state.handle_calls, 1);
        assert_eq!(state.submit_calls, 1);
        assert_eq!(state.record.status, DecryptStatus::Decrypted);
        assert_eq!(state.record.value, 500);
    }

    #[tokio::test]
    async fn second_call_hits_cache_with_zero_writes() {
        let chain = FakeChain::new(none_record(), 500);
        let quantity = FakeQuantity { chain: chain.clone() };
        let relayer = FakeRelayer { chain: chain.clone(), reject: false };

        let first = resolve_plaintext(&quantity, &relayer).await.unwrap();
        let second = resolve_plaintext(&quantity, &relayer).await.unwrap();

        assert_eq!(first.cleartext, 500);
        assert_eq!(second.cleartext, 500);
        assert!(second.receipt.is_none());

        let state = chain.lock().unwrap();
        assert_eq!(state.request_calls, 1);
        assert_eq!(state.submit_calls, 1);
    }

    #[tokio::test]
    async fn stale_decrypted_record_forces_refresh() {
        let stale = DecryptionRecord {
            status: DecryptStatus::Decrypted,
            value: 1_000_000_000_000_000_000,
            cache_expiry: unix_now() - 1,
        };
        let chain = FakeChain::new(stale, 750);
        let quantity = FakeQuantity { chain: chain.clone() };
        let relayer = FakeRelayer { chain: chain.clone(), reject: false };

        let resolved = resolve_plaintext(&quantity, &relayer).await.unwrap();
        assert_eq!(resolved.cleartext, 750);
        assert!(resolved.receipt.is_some());

        let state = chain.lock().unwrap();
        assert_eq!(state.request_calls, 1, "stale cache must re-run step 1");
        assert_eq!(state.submit_calls, 1);
    }

    #[tokio::test]
    async fn processing_status_resumes_without_request() {
        let processing = DecryptionRecord {
            status: DecryptStatus::Processing,
            value: 0,
            cache_expiry: 0,
        };
        let chain = FakeChain::new(processing, 321);
        let quantity = FakeQuantity { chain: chain.clone() };
        let relayer = FakeRelayer { chain: chain.clone(), reject: false };

        let resolved = resolve_plaintext(&quantity, &relayer).await.unwrap();
        assert_eq!(resolved.cleartext, 321);

        let state = chain.lock().unwrap();
        assert_eq!(state.request_calls, 0, "must not re-issue the request");
        assert_eq!(state.handle_calls, 1);
        assert_eq!(state.submit_calls, 1);
    }

    #[tokio::test]
    async fn fresh_zero_value_is_a_valid_cached_state() {
        let fresh_zero = DecryptionRecord {
            status: DecryptStatus::Decrypted,
            value: 0,
            cache_expiry: unix_now() + CACHE_TIMEOUT,
        };
        let chain = FakeChain::new(fresh_zero, 999);
        let quantity = FakeQuantity { chain: chain.clone() };
        let relayer = FakeRelayer { chain: chain.clone(), reject: false };

        let resolved = resolve_plaintext(&quantity, &relayer).await.unwrap();
        assert_eq!(resolved.cleartext, 0);
        assert!(resolved.receipt.is_none());
        assert_eq!(chain.lock().unwrap().request_calls, 0);
    }

    #[tokio::test]
    async fn relayer_rejection_propagates_and_skips_submit() {
        let chain = FakeChain::new(none_record(), 500);
        let quantity = FakeQuantity { chain: chain.clone() };
        let relayer = FakeRelayer { chain: chain.clone(), reject: true };

        let err = resolve_plaintext(&quantity, &relayer).await.unwrap_err();
        assert!(matches!(err, ClientError::DecryptionRejected(_)));

        let state = chain.lock().unwrap();
        assert_eq!(state.submit_calls, 0);
        // The request landed, so a re-invocation resumes at step 2.
        assert_eq!(state.record.status, DecryptStatus::Processing);
    }

    #[tokio::test]
    async fn reinvocation_after_relayer_failure_resumes_cleanly() {
        let chain = FakeChain::new(none_record(), 500);
        let quantity = FakeQuantity { chain: chain.clone() };

        let failing = FakeRelayer { chain: chain.clone(), reject: true };
        resolve_plaintext(&quantity, &failing).await.unwrap_err();

        let working = FakeRelayer { chain: chain.clone(), reject: false };
        let resolved = resolve_plaintext(&quantity, &working).await.unwrap();
        assert_eq!(resolved.cleartext, 500);

        let state = chain.lock().unwrap();
        assert_eq!(state.request_calls, 1, "request must not be duplicated");
        assert_eq!(state.submit_calls, 1);
    }

    #[test]
    fn record_freshness_rules() {
        let now = 1_000_000;
        let fresh = DecryptionRecord {
            status: DecryptStatus::Decrypted,
            value: 1,
            cache_expiry: now + 1,
        };
        assert!(fresh.is_fresh(now));
        assert!(!fresh.is_fresh(now + 1), "expiry instant counts as stale");

        let processing = DecryptionRecord {
            status: DecryptStatus::Processing,
            value: 1,
            cache_expiry: now + 100,
        };
        assert!(!processing.is_fresh(now));
    }

    #[test]
    fn status_decoding() {
        assert_eq!(DecryptStatus::from_u8(0).unwrap(), DecryptStatus::None);
        assert_eq!(DecryptStatus::from_u8(1).unwrap(), DecryptStatus::Processing);
        assert_eq!(DecryptStatus::from_u8(2).unwrap(), DecryptStatus::Decrypted);
        assert!(DecryptStatus::from_u8(3).is_err());
    }
}
