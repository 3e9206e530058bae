// SPDX-License-Identifier: AGPL-3.0-or-later

//! Fundraiser Client - Confidential Campaign & Vault SDK
//!
//! Client SDK for a confidential fundraising system where contribution
//! amounts, pooled totals and vault balances live on-chain as FHE
//! ciphertexts. Reading any of them runs the four-step self-relaying
//! decryption protocol implemented in [`decrypt`].
//!
//! ## Modules
//!
//! - `amount` - Ether amount parsing with the encrypted uint64 ceiling
//! - `campaign` - Campaign registry workflow (create/contribute/finalize/cancel/claim)
//! - `chain` - EVM chain client (alloy)
//! - `contracts` - Contract bindings for the registry and the vault
//! - `decrypt` - Self-relaying decryption engine
//! - `relayer` - Decryption relayer HTTP client
//! - `vault` - Share vault workflow (deposit/withdraw)

pub mod amount;
pub mod campaign;
pub mod chain;
pub mod config;
pub mod contracts;
pub mod decrypt;
pub mod error;
pub mod relayer;
pub mod vault;

pub use campaign::{Campaign, CampaignClient, CampaignState};
pub use chain::{ChainClient, TxReceipt};
pub use config::ClientConfig;
pub use decrypt::{
    resolve_plaintext, DecryptStatus, DecryptionRecord, EncryptedQuantity, ResolvedPlaintext,
};
pub use error::ClientError;
pub use relayer::{DecryptedValue, EncryptedInput, RelayerClient};
pub use vault::VaultClient;
