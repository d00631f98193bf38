//! The asset ledger adapter interface.
//!
//! The core asserts no ownership over external tokens; everything a wallet
//! holds lives on the external ledger, and the core requests changes
//! through this trait. Implementations are the edge layer's concern — an
//! on-chain client, a custodial service, or the in-memory ledger used by
//! the server binary and the tests.
//!
//! Every operation either returns a transaction handle or fails with a
//! [`LedgerError`]. The transient/permanent split is the compensation
//! contract: *transient* means the caller should restore any optimistic
//! local state and may surface a retryable error; *permanent* means the
//! same compensation applies but retrying is pointless.

use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use mistvale_types::{ItemId, WalletAddress};

/// The token id the adapter uses for the world currency. Currency is an
/// ordinary fungible token on the ledger; [`AssetLedger::mint_currency`]
/// is a convenience over [`AssetLedger::mint_item`] with this id.
pub fn currency_token() -> ItemId {
    ItemId::from("mist_coin")
}

/// A handle to a settled ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxHandle(pub Uuid);

impl TxHandle {
    /// Create a fresh handle.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TxHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for TxHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Failure of an external ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The call timed out or the ledger reported a retryable status.
    /// Safe to compensate and retry later.
    #[error("transient ledger failure: {detail}")]
    Transient {
        /// Adapter-reported detail.
        detail: String,
    },

    /// The ledger rejected the operation. Compensate; do not retry.
    #[error("permanent ledger failure: {detail}")]
    Permanent {
        /// Adapter-reported detail.
        detail: String,
    },
}

impl LedgerError {
    /// Shorthand for a transient failure.
    pub fn transient(detail: impl Into<String>) -> Self {
        Self::Transient {
            detail: detail.into(),
        }
    }

    /// Shorthand for a permanent failure.
    pub fn permanent(detail: impl Into<String>) -> Self {
        Self::Permanent {
            detail: detail.into(),
        }
    }

    /// Whether compensation may be followed by a retry.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// The operations the core requires of the external asset ledger.
///
/// Methods take owned arguments so implementations can move them into
/// their request futures; the futures borrow only `self`.
pub trait AssetLedger: Send + Sync {
    /// Mint `qty` units of `token` to `wallet`.
    fn mint_item(
        &self,
        wallet: WalletAddress,
        token: ItemId,
        qty: u64,
    ) -> BoxFuture<'_, Result<TxHandle, LedgerError>>;

    /// Burn `qty` units of `token` from `wallet`.
    fn burn_item(
        &self,
        wallet: WalletAddress,
        token: ItemId,
        qty: u64,
    ) -> BoxFuture<'_, Result<TxHandle, LedgerError>>;

    /// Read the current balance of `token` held by `wallet`.
    fn item_balance(
        &self,
        wallet: WalletAddress,
        token: ItemId,
    ) -> BoxFuture<'_, Result<u64, LedgerError>>;

    /// Mint world currency to `wallet`.
    fn mint_currency(
        &self,
        wallet: WalletAddress,
        amount: u64,
    ) -> BoxFuture<'_, Result<TxHandle, LedgerError>> {
        self.mint_item(wallet, currency_token(), amount)
    }

    /// Burn world currency from `wallet` (purchases).
    fn burn_currency(
        &self,
        wallet: WalletAddress,
        amount: u64,
    ) -> BoxFuture<'_, Result<TxHandle, LedgerError>> {
        self.burn_item(wallet, currency_token(), amount)
    }

    /// Read the currency balance of `wallet`.
    fn currency_balance(
        &self,
        wallet: WalletAddress,
    ) -> BoxFuture<'_, Result<u64, LedgerError>> {
        self.item_balance(wallet, currency_token())
    }
}

/// Run a ledger call with a deadline, mapping a timeout to a transient
/// failure so the caller's compensation path is uniform.
pub async fn with_deadline<T>(
    deadline: Duration,
    call: impl core::future::Future<Output = Result<T, LedgerError>> + Send,
) -> Result<T, LedgerError> {
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_elapsed) => Err(LedgerError::transient(format!(
            "ledger call exceeded {}ms deadline",
            deadline.as_millis()
        ))),
    }
}
