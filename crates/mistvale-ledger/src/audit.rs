//! Append-only audit log of adapter calls made by the runtime.
//!
//! The external ledger is authoritative for balances; this log is the
//! server's own record of what it asked for and what came back, kept for
//! invariant checks (every successful gather has exactly one matching
//! mint; every gate open has exactly one key burn) and for operators
//! chasing inconsistencies. Entries are never modified or deleted.

use serde::{Deserialize, Serialize};

use mistvale_types::{ItemId, WalletAddress};

use crate::adapter::{LedgerError, TxHandle};

/// The kind of adapter call recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOp {
    /// `mint_item` (including currency mints).
    Mint,
    /// `burn_item` (including currency burns).
    Burn,
}

/// How a recorded call ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AuditOutcome {
    /// The ledger settled the operation.
    Confirmed {
        /// The settled transaction handle.
        tx: TxHandle,
    },
    /// The ledger call failed.
    Failed {
        /// Whether the failure was transient.
        transient: bool,
        /// Adapter-reported detail.
        detail: String,
    },
}

/// One recorded adapter call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// The zone tick during which the call was issued.
    pub tick: u64,
    /// Mint or burn.
    pub op: AuditOp,
    /// The wallet the call targeted.
    pub wallet: WalletAddress,
    /// The token moved.
    pub token: ItemId,
    /// Quantity requested.
    pub qty: u64,
    /// What the runtime asked for, e.g. `"gather"`, `"quest_reward"`.
    pub reason: String,
    /// How the call ended.
    pub outcome: AuditOutcome,
}

/// The append-only audit log.
#[derive(Debug, Default)]
pub struct AuditLog {
    entries: Vec<AuditEntry>,
}

impl AuditLog {
    /// Create an empty log.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record the result of a mint or burn call.
    #[allow(clippy::too_many_arguments)]
    pub fn record(
        &mut self,
        tick: u64,
        op: AuditOp,
        wallet: &WalletAddress,
        token: &ItemId,
        qty: u64,
        reason: &str,
        result: &Result<TxHandle, LedgerError>,
    ) {
        let outcome = match result {
            Ok(tx) => AuditOutcome::Confirmed { tx: *tx },
            Err(error) => AuditOutcome::Failed {
                transient: error.is_transient(),
                detail: error.to_string(),
            },
        };
        self.entries.push(AuditEntry {
            tick,
            op,
            wallet: wallet.clone(),
            token: token.clone(),
            qty,
            reason: reason.to_owned(),
            outcome,
        });
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    /// Entries recorded during a given tick.
    pub fn entries_for_tick(&self, tick: u64) -> Vec<&AuditEntry> {
        self.entries.iter().filter(|e| e.tick == tick).collect()
    }

    /// Count of *confirmed* operations of `op` for `token`.
    pub fn confirmed_count(&self, op: AuditOp, token: &ItemId) -> usize {
        self.entries
            .iter()
            .filter(|e| {
                e.op == op && e.token == *token && matches!(e.outcome, AuditOutcome::Confirmed { .. })
            })
            .count()
    }

    /// Total confirmed quantity of `op` for `token` into `wallet`.
    pub fn confirmed_qty(&self, op: AuditOp, wallet: &WalletAddress, token: &ItemId) -> u64 {
        self.entries
            .iter()
            .filter(|e| {
                e.op == op
                    && e.wallet == *wallet
                    && e.token == *token
                    && matches!(e.outcome, AuditOutcome::Confirmed { .. })
            })
            .fold(0, |acc, e| acc.saturating_add(e.qty))
    }
}

/// The audit log as shared by every zone runtime.
pub type SharedAuditLog = std::sync::Arc<tokio::sync::Mutex<AuditLog>>;

/// Create a fresh shared audit log.
pub fn shared_audit_log() -> SharedAuditLog {
    std::sync::Arc::new(tokio::sync::Mutex::new(AuditLog::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet() -> WalletAddress {
        WalletAddress::from("0xplayer")
    }

    #[test]
    fn confirmed_and_failed_entries_are_distinguished() {
        let mut log = AuditLog::new();
        let token = ItemId::from("coal_ore");

        log.record(1, AuditOp::Mint, &wallet(), &token, 1, "gather", &Ok(TxHandle::new()));
        log.record(
            1,
            AuditOp::Mint,
            &wallet(),
            &token,
            1,
            "gather",
            &Err(LedgerError::transient("congested")),
        );

        assert_eq!(log.entries().len(), 2);
        assert_eq!(log.confirmed_count(AuditOp::Mint, &token), 1);
        assert_eq!(log.confirmed_qty(AuditOp::Mint, &wallet(), &token), 1);
    }

    #[test]
    fn entries_for_tick_filters() {
        let mut log = AuditLog::new();
        let token = ItemId::from("gate_key_e");
        log.record(5, AuditOp::Burn, &wallet(), &token, 1, "gate_open", &Ok(TxHandle::new()));
        log.record(6, AuditOp::Burn, &wallet(), &token, 1, "gate_open", &Ok(TxHandle::new()));
        assert_eq!(log.entries_for_tick(5).len(), 1);
        assert_eq!(log.entries_for_tick(7).len(), 0);
    }
}
