// SPDX-License-Identifier: AGPL-3.0-or-later

//! Contract bindings for the campaign registry and the share vault.
//!
//! Encrypted values (`euint64` in Solidity) appear here as `bytes32`
//! ciphertext handles; only the relayer protocol can turn one into a
//! plaintext. Custom errors are declared so reverts decode to their names.

use alloy::sol;

sol! {
    /// Confidential fundraising campaign registry.
    #[sol(rpc)]
    interface IFundraising {
        error AlreadyCancelled();
        error AlreadyClaimed();
        error AlreadyFinalized();
        error CacheExpired();
        error CampaignNotExist();
        error CampaignStillActive();
        error ContributionNotFound();
        error DecryptAlreadyInProgress();
        error EmptyTitle();
        error InvalidDuration();
        error InvalidTarget();
        error MyContributionNotDecrypted();
        error NoTokensToClaim();
        error OnlyOwner();
        error TokenNameRequired();
        error TokenSymbolRequired();
        error TotalRaisedNotDecrypted();

        function createCampaign(string title, string description, uint64 target, uint256 duration) external returns (uint256);
        function contribute(uint16 campaignId, bytes32 encryptedAmount, bytes inputProof) external;
        function finalizeCampaign(uint16 campaignId, string tokenName, string tokenSymbol) external;
        function cancelCampaign(uint16 campaignId) external;
        function claimTokens(uint16 campaignId) external;

        function requestMyContributionDecryption(uint16 campaignId) external;
        function getEncryptedContribution(uint16 campaignId, address user) external view returns (bytes32);
        function submitMyContributionDecryption(uint16 campaignId, uint64 cleartextAmount, bytes proof) external;
        function getContributionStatus(uint16 campaignId, address user) external view returns (uint8 status, uint64 contribution, uint256 cacheExpiry);

        function requestTotalRaisedDecryption(uint16 campaignId) external;
        function getEncryptedTotalRaised(uint16 campaignId) external view returns (bytes32);
        function submitTotalRaisedDecryption(uint16 campaignId, uint64 cleartextTotal, bytes proof) external;
        function getTotalRaisedStatus(uint16 campaignId) external view returns (uint8 status, uint64 totalRaised, uint256 cacheExpiry);

        function getCampaign(uint16 campaignId) external view returns (address owner, string title, string description, uint64 targetAmount, uint256 deadline, bool finalized, bool cancelled, address tokenAddress);
        function campaignCount() external view returns (uint16);
        function hasContribution(uint16 campaignId, address user) external view returns (bool);
        function hasClaimed(uint16 campaignId, address user) external view returns (bool);
        function CACHE_TIMEOUT() external view returns (uint256);
    }
}

sol! {
    /// Value vault holding encrypted user balances.
    #[sol(rpc)]
    interface IShareVault {
        error DecryptAlreadyInProgress();
        error DecryptionCacheExpired();
        error DecryptionProcessing();
        error DepositAmountTooLarge();
        error InsufficientAvailableBalance();
        error InsufficientBalance();
        error InsufficientVaultBalance();
        error InvalidDepositAmount();
        error InvalidWithdrawalAmount();
        error MustDecryptFirst();
        error NoBalance();
        error WithdrawalFailed();

        function deposit() external payable;
        function withdraw(uint64 amount) external;

        function requestAvailableBalanceDecryption() external;
        function getPendingAvailableBalanceHandle() external view returns (bytes32);
        function submitAvailableBalanceDecryption(uint64 cleartextAvailable, bytes proof) external;
        function getAvailableBalanceStatus() external view returns (uint8 status, uint64 availableAmount, uint256 cacheExpiry);

        function getEncryptedBalance() external view returns (bytes32);
        function getEncryptedBalanceAndLocked() external view returns (bytes32 balance, bytes32 locked);
        function CACHE_TIMEOUT() external view returns (uint256);
    }
}
