//! In-memory asset ledger.
//!
//! Backs the server binary in standalone mode and every test that needs a
//! ledger. Beyond plain balances it supports two test hooks: an injected
//! failure queue (the next N operations fail with the queued errors) and
//! an artificial per-call delay for exercising timeout and zone-isolation
//! behavior.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::Mutex;

use mistvale_types::{ItemId, WalletAddress};

use crate::adapter::{AssetLedger, LedgerError, TxHandle};

#[derive(Debug, Default)]
struct LedgerState {
    balances: BTreeMap<(WalletAddress, ItemId), u64>,
    injected_failures: VecDeque<LedgerError>,
    planned_failures: BTreeMap<u64, LedgerError>,
    calls_made: u64,
    call_delay: Option<Duration>,
}

/// An in-memory [`AssetLedger`] implementation.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    state: Mutex<LedgerState>,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Directly set a balance, bypassing mint bookkeeping. Test setup.
    pub async fn set_balance(&self, wallet: &WalletAddress, token: &ItemId, qty: u64) {
        let mut state = self.state.lock().await;
        if qty == 0 {
            state.balances.remove(&(wallet.clone(), token.clone()));
        } else {
            state.balances.insert((wallet.clone(), token.clone()), qty);
        }
    }

    /// Queue an error to be returned by the next ledger operation.
    /// Multiple queued errors are consumed in order.
    pub async fn inject_failure(&self, error: LedgerError) {
        self.state.lock().await.injected_failures.push_back(error);
    }

    /// Fail the call that is `offset` operations from now (0 = the next
    /// call). Lets tests target a specific step in a multi-call
    /// sequence, e.g. the second burn of a craft.
    pub async fn inject_failure_at(&self, offset: u64, error: LedgerError) {
        let mut state = self.state.lock().await;
        let at = state.calls_made.saturating_add(offset);
        state.planned_failures.insert(at, error);
    }

    /// Delay every subsequent call by `delay` (simulates a slow chain).
    pub async fn set_call_delay(&self, delay: Option<Duration>) {
        self.state.lock().await.call_delay = delay;
    }

    /// Read a balance without going through the adapter surface.
    pub async fn balance_of(&self, wallet: &WalletAddress, token: &ItemId) -> u64 {
        self.state
            .lock()
            .await
            .balances
            .get(&(wallet.clone(), token.clone()))
            .copied()
            .unwrap_or(0)
    }

    async fn begin_call(&self) -> Result<Option<Duration>, LedgerError> {
        let mut state = self.state.lock().await;
        let index = state.calls_made;
        state.calls_made = state.calls_made.saturating_add(1);
        if let Some(error) = state.planned_failures.remove(&index) {
            return Err(error);
        }
        if let Some(error) = state.injected_failures.pop_front() {
            return Err(error);
        }
        Ok(state.call_delay)
    }
}

impl AssetLedger for InMemoryLedger {
    fn mint_item(
        &self,
        wallet: WalletAddress,
        token: ItemId,
        qty: u64,
    ) -> BoxFuture<'_, Result<TxHandle, LedgerError>> {
        async move {
            let delay = self.begin_call().await?;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if qty == 0 {
                return Err(LedgerError::permanent("mint of zero quantity"));
            }
            let mut state = self.state.lock().await;
            let entry = state.balances.entry((wallet, token)).or_insert(0);
            *entry = entry.saturating_add(qty);
            Ok(TxHandle::new())
        }
        .boxed()
    }

    fn burn_item(
        &self,
        wallet: WalletAddress,
        token: ItemId,
        qty: u64,
    ) -> BoxFuture<'_, Result<TxHandle, LedgerError>> {
        async move {
            let delay = self.begin_call().await?;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if qty == 0 {
                return Err(LedgerError::permanent("burn of zero quantity"));
            }
            let mut state = self.state.lock().await;
            let key = (wallet, token);
            let held = state.balances.get(&key).copied().unwrap_or(0);
            let Some(remaining) = held.checked_sub(qty) else {
                return Err(LedgerError::permanent(format!(
                    "insufficient balance: wanted {qty}, held {held}"
                )));
            };
            if remaining == 0 {
                state.balances.remove(&key);
            } else {
                state.balances.insert(key, remaining);
            }
            Ok(TxHandle::new())
        }
        .boxed()
    }

    fn item_balance(
        &self,
        wallet: WalletAddress,
        token: ItemId,
    ) -> BoxFuture<'_, Result<u64, LedgerError>> {
        async move {
            let delay = self.begin_call().await?;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self
                .state
                .lock()
                .await
                .balances
                .get(&(wallet, token))
                .copied()
                .unwrap_or(0))
        }
        .boxed()
    }
}
