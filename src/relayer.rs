// SPDX-License-Identifier: AGPL-3.0-or-later

//! Decryption relayer client.
//!
//! The relayer is the only party that can turn an on-chain ciphertext
//! handle into a plaintext, and it returns a cryptographic proof the
//! contract verifies when the plaintext is submitted back. It also
//! produces the encrypted inputs `contribute` writes on-chain.
//!
//! The relayer is a process-wide resource: call [`init`] once, then
//! [`global`] anywhere. Calls before [`init`] fail with
//! `RelayerNotInitialized`.

use std::sync::OnceLock;
use std::time::Duration;

use alloy::primitives::{Address, Bytes, B256};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ClientError;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Plaintext plus the proof that it matches the ciphertext.
#[derive(Debug, Clone)]
pub struct DecryptedValue {
    pub cleartext: u64,
    pub proof: Bytes,
}

/// Ciphertext handle plus input proof, ready to write on-chain.
#[derive(Debug, Clone)]
pub struct EncryptedInput {
    pub handle: B256,
    pub proof: Bytes,
}

/// Turns an encrypted handle into a verified plaintext.
pub trait PublicDecryptor {
    fn public_decrypt(
        &self,
        handle: B256,
        owner_contract: Address,
    ) -> impl std::future::Future<Output = Result<DecryptedValue, ClientError>> + Send;
}

/// Encrypts a plaintext amount into a ciphertext the contract accepts.
pub trait InputEncryptor {
    fn encrypt_u64(
        &self,
        amount: u64,
        owner_contract: Address,
        user: Address,
    ) -> impl std::future::Future<Output = Result<EncryptedInput, ClientError>> + Send;
}

/// HTTP client for the decryption relayer.
#[derive(Debug, Clone)]
pub struct RelayerClient {
    base_url: String,
    http: Client,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PublicDecryptRequest {
    handle: B256,
    contract_address: Address,
}

#[derive(Deserialize)]
struct PublicDecryptResponse {
    cleartext: Option<String>,
    proof: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EncryptInputRequest {
    /// Decimal string; u64 amounts do not survive JSON numbers reliably.
    amount: String,
    contract_address: Address,
    user_address: Address,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EncryptInputResponse {
    handle: Option<B256>,
    input_proof: Option<String>,
}

impl RelayerClient {
    /// Create a relayer client for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let base_url = base_url.into();
        url::Url::parse(&base_url)
            .map_err(|e| ClientError::Config(format!("invalid relayer URL: {e}")))?;

        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ClientError::RelayerUnavailable(e.to_string()))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    async fn post_json<Req: Serialize, Resp: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: &Req,
    ) -> Result<Resp, ClientError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::RelayerUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ClientError::RelayerUnavailable(format!(
                "{path} returned {status}: {text}"
            )));
        }

        response
            .json::<Resp>()
            .await
            .map_err(|e| ClientError::InvalidRelayerResponse(e.to_string()))
    }
}

impl PublicDecryptor for RelayerClient {
    async fn public_decrypt(
        &self,
        handle: B256,
        owner_contract: Address,
    ) -> Result<DecryptedValue, ClientError> {
        debug!(%handle, contract = %owner_contract, "requesting public decryption");

        let response: PublicDecryptResponse = self
            .post_json(
                "/v1/public-decrypt",
                &PublicDecryptRequest {
                    handle,
                    contract_address: owner_contract,
                },
            )
            .await?;

        decrypted_from_response(response)
    }
}

impl InputEncryptor for RelayerClient {
    async fn encrypt_u64(
        &self,
        amount: u64,
        owner_contract: Address,
        user: Address,
    ) -> Result<EncryptedInput, ClientError> {
        debug!(contract = %owner_contract, user = %user, "requesting input encryption");

        let response: EncryptInputResponse = self
            .post_json(
                "/v1/encrypt-input",
                &EncryptInputRequest {
                    amount: amount.to_string(),
                    contract_address: owner_contract,
                    user_address: user,
                },
            )
            .await?;

        let handle = response.handle.ok_or_else(|| {
            ClientError::InvalidRelayerResponse("handle missing from encryption result".into())
        })?;
        let proof = response.input_proof.ok_or_else(|| {
            ClientError::InvalidRelayerResponse("input proof missing from encryption result".into())
        })?;

        Ok(EncryptedInput {
            handle,
            proof: decode_proof(&proof)?,
        })
    }
}

fn decrypted_from_response(response: PublicDecryptResponse) -> Result<DecryptedValue, ClientError> {
    let cleartext = response
        .cleartext
        .ok_or_else(|| {
            ClientError::DecryptionRejected("cleartext not found in decryption result".into())
        })?
        .parse::<u64>()
        .map_err(|e| ClientError::InvalidRelayerResponse(format!("bad cleartext: {e}")))?;

    let proof = response.proof.ok_or_else(|| {
        ClientError::DecryptionRejected("proof not found in decryption result".into())
    })?;

    Ok(DecryptedValue {
        cleartext,
        proof: decode_proof(&proof)?,
    })
}

fn decode_proof(raw: &str) -> Result<Bytes, ClientError> {
    let bytes = alloy::hex::decode(raw)
        .map_err(|e| ClientError::InvalidRelayerResponse(format!("bad proof hex: {e}")))?;
    Ok(Bytes::from(bytes))
}

// --- Process-wide singleton -------------------------------------------------

static GLOBAL: OnceLock<RelayerClient> = OnceLock::new();

/// Initialize the process-wide relayer client. Later calls with a
/// different URL keep the first client; initialization is one-shot.
pub fn init(base_url: &str) -> Result<&'static RelayerClient, ClientError> {
    if let Some(client) = GLOBAL.get() {
        return Ok(client);
    }
    let client = RelayerClient::new(base_url)?;
    Ok(GLOBAL.get_or_init(|| client))
}

/// The process-wide relayer client, if [`init`] has run.
pub fn global() -> Result<&'static RelayerClient, ClientError> {
    GLOBAL.get().ok_or(ClientError::RelayerNotInitialized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(cleartext: Option<&str>, proof: Option<&str>) -> PublicDecryptResponse {
        PublicDecryptResponse {
            cleartext: cleartext.map(String::from),
            proof: proof.map(String::from),
        }
    }

    #[test]
    fn decrypt_response_parses_cleartext_and_proof() {
        let value = decrypted_from_response(response(Some("500"), Some("0xdeadbeef"))).unwrap();
        assert_eq!(value.cleartext, 500);
        assert_eq!(value.proof.as_ref(), &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn missing_cleartext_is_rejected() {
        let err = decrypted_from_response(response(None, Some("0x00"))).unwrap_err();
        assert!(matches!(err, ClientError::DecryptionRejected(_)));
    }

    #[test]
    fn missing_proof_is_rejected() {
        let err = decrypted_from_response(response(Some("500"), None)).unwrap_err();
        assert!(matches!(err, ClientError::DecryptionRejected(_)));
    }

    #[test]
    fn non_numeric_cleartext_is_invalid() {
        let err = decrypted_from_response(response(Some("lots"), Some("0x00"))).unwrap_err();
        assert!(matches!(err, ClientError::InvalidRelayerResponse(_)));
    }

    #[test]
    fn client_rejects_invalid_base_url() {
        assert!(RelayerClient::new("not a url").is_err());
    }
}
