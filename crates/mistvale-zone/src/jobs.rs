//! Outbound best-effort ledger jobs.
//!
//! Death loot is minted fire-and-forget: the kill resolves immediately,
//! the mints run on background tasks with the standard deadline, and
//! failures are logged and audited but never retried and never
//! compensated — drops are best-effort by contract. State-coupled calls
//! (gather, crafting, rewards) do *not* go through here; they run inline
//! with compensation.

use tracing::warn;

use mistvale_ledger::audit::AuditOp;
use mistvale_ledger::{currency_token, with_deadline};
use mistvale_types::{ItemId, WalletAddress};

use crate::runtime::ZoneContext;

/// One outbound mint to run off the tick path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerJob {
    /// Mint an item token.
    MintItem {
        /// Destination wallet.
        wallet: WalletAddress,
        /// Token to mint.
        token: ItemId,
        /// Quantity.
        qty: u64,
        /// Audit reason, e.g. `"loot_drop"`.
        reason: &'static str,
    },
    /// Mint world currency.
    MintCurrency {
        /// Destination wallet.
        wallet: WalletAddress,
        /// Amount.
        amount: u64,
        /// Audit reason.
        reason: &'static str,
    },
}

/// Spawn one background task per job. Must be called from within the
/// tokio runtime (the tick task and the action executor both are).
pub fn dispatch_best_effort(ctx: &ZoneContext, tick: u64, jobs: Vec<LedgerJob>) {
    for job in jobs {
        let ctx = ctx.clone();
        tokio::spawn(async move {
            run_job(&ctx, tick, job).await;
        });
    }
}

async fn run_job(ctx: &ZoneContext, tick: u64, job: LedgerJob) {
    let deadline = ctx.config.ledger_deadline();
    match job {
        LedgerJob::MintItem {
            wallet,
            token,
            qty,
            reason,
        } => {
            let result = with_deadline(
                deadline,
                ctx.ledger.mint_item(wallet.clone(), token.clone(), qty),
            )
            .await;
            if let Err(error) = &result {
                warn!(%wallet, %token, qty, reason, %error, "best-effort mint failed");
            }
            ctx.audit
                .lock()
                .await
                .record(tick, AuditOp::Mint, &wallet, &token, qty, reason, &result);
        }
        LedgerJob::MintCurrency {
            wallet,
            amount,
            reason,
        } => {
            let result =
                with_deadline(deadline, ctx.ledger.mint_currency(wallet.clone(), amount)).await;
            if let Err(error) = &result {
                warn!(%wallet, amount, reason, %error, "best-effort currency mint failed");
            }
            ctx.audit.lock().await.record(
                tick,
                AuditOp::Mint,
                &wallet,
                &currency_token(),
                amount,
                reason,
                &result,
            );
        }
    }
}
