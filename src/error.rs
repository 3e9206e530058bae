// SPDX-License-Identifier: AGPL-3.0-or-later

//! Client error taxonomy.
//!
//! Three families of failure, matching how callers are expected to react:
//!
//! - *Precondition* errors (`NoWalletConnected`, `InvalidAmount`, ...) are
//!   detected before any chain call and are never worth retrying as-is.
//! - *Relayer* errors surface problems with the off-chain decryption
//!   service; re-invoking the top-level operation is always safe because
//!   the decryption workflow resumes from on-chain status.
//! - *Chain* errors carry revert reasons mapped to readable messages where
//!   the custom error name is recognized, raw otherwise.

/// Errors raised by the fundraiser client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    // --- Precondition -------------------------------------------------------
    #[error("no wallet connected: a signing key is required for this operation")]
    NoWalletConnected,

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid token metadata: {0}")]
    InvalidTokenMetadata(String),

    #[error("invalid campaign parameters: {0}")]
    InvalidCampaign(String),

    #[error("no contribution found for this campaign")]
    NoContributionFound,

    // --- Relayer ------------------------------------------------------------
    #[error("decryption relayer is not initialized")]
    RelayerNotInitialized,

    #[error("decryption relayer unavailable: {0}")]
    RelayerUnavailable(String),

    #[error("decryption rejected by relayer: {0}")]
    DecryptionRejected(String),

    #[error("relayer returned an invalid response: {0}")]
    InvalidRelayerResponse(String),

    // --- Chain --------------------------------------------------------------
    #[error("connected to chain id {actual}, expected {expected}")]
    ChainMismatch { expected: u64, actual: u64 },

    #[error("transaction {tx_hash} reverted")]
    TransactionReverted { tx_hash: String },

    #[error("contract call failed: {0}")]
    Contract(String),

    #[error("rpc error: {0}")]
    Rpc(String),

    // --- Configuration ------------------------------------------------------
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ClientError {
    /// Wrap an alloy contract error, translating a recognized revert
    /// reason into a user-facing message.
    pub fn from_contract(err: alloy::contract::Error) -> Self {
        Self::Contract(map_revert_reason(&err.to_string()))
    }
}

/// Known custom-error names and their user-facing messages.
///
/// The contracts revert with named errors; alloy includes the decoded
/// error name in its message, so a substring match is sufficient.
const REVERT_MESSAGES: &[(&str, &str)] = &[
    ("AlreadyClaimed", "tokens were already claimed for this campaign"),
    ("NoTokensToClaim", "there are no tokens to claim"),
    ("CampaignStillActive", "campaign deadline has not passed yet"),
    ("AlreadyFinalized", "campaign is already finalized"),
    ("AlreadyCancelled", "campaign is already cancelled"),
    ("CampaignNotExist", "campaign does not exist"),
    ("OnlyOwner", "only the campaign owner can do this"),
    (
        "InsufficientAvailableBalance",
        "withdrawal exceeds the available vault balance",
    ),
    (
        "DecryptionCacheExpired",
        "the decrypted value has expired; decrypt again and retry",
    ),
    (
        "MustDecryptFirst",
        "the encrypted value must be decrypted before this operation",
    ),
    (
        "TotalRaisedNotDecrypted",
        "total raised must be decrypted before finalizing",
    ),
    (
        "MyContributionNotDecrypted",
        "contribution must be decrypted before claiming",
    ),
    ("DecryptAlreadyInProgress", "a decryption request is already in flight"),
    ("InvalidWithdrawalAmount", "withdrawal amount is invalid"),
    ("InvalidDepositAmount", "deposit amount is invalid"),
    ("DepositAmountTooLarge", "deposit amount is too large"),
    ("ContributionNotFound", "no contribution recorded for this address"),
];

/// Map a raw revert message to a user-facing one.
///
/// Unrecognized reasons pass through unchanged so nothing is swallowed.
pub fn map_revert_reason(raw: &str) -> String {
    for (name, message) in REVERT_MESSAGES {
        if raw.contains(name) {
            return (*message).to_string();
        }
    }
    raw.to_string()
}
