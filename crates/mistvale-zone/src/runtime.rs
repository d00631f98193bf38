//! The zone runtime shell: shared handle, context, and the tick task.
//!
//! A zone is a single-writer cooperative actor realized as a fair
//! `tokio::sync::Mutex` around [`ZoneState`]: the tick task and the
//! action executor serialize through it, so no two operations on the
//! same zone ever run concurrently, while different zones proceed in
//! parallel. An action that awaits the ledger while holding the lock
//! stalls only its own zone — including that zone's tick counter.

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

use mistvale_content::ContentCatalog;
use mistvale_ledger::{AssetLedger, SharedAuditLog};
use mistvale_types::{EntityId, ZoneId};

use crate::config::RealmConfig;
use crate::jobs;
use crate::state::ZoneState;
use crate::tick;

/// Read-only view of party membership, implemented by the party manager
/// one layer up. The zone runtime needs it for the kill XP split.
pub trait PartyLookup: Send + Sync {
    /// The party members of `player`, if they are in a party.
    fn party_members(&self, player: EntityId) -> Option<Vec<EntityId>>;
}

/// A [`PartyLookup`] for worlds without parties (tests, tools).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoParties;

impl PartyLookup for NoParties {
    fn party_members(&self, _player: EntityId) -> Option<Vec<EntityId>> {
        None
    }
}

/// Shared read-mostly dependencies of every zone runtime.
#[derive(Clone)]
pub struct ZoneContext {
    /// The static content catalog.
    pub content: Arc<ContentCatalog>,
    /// Server configuration.
    pub config: Arc<RealmConfig>,
    /// The external asset ledger adapter.
    pub ledger: Arc<dyn AssetLedger>,
    /// The shared adapter-call audit log.
    pub audit: SharedAuditLog,
    /// Party membership view for the XP split.
    pub parties: Arc<dyn PartyLookup>,
}

/// Shared handle to one zone's state.
#[derive(Clone)]
pub struct ZoneHandle {
    /// The zone id (also the lock-ordering key).
    pub id: ZoneId,
    state: Arc<Mutex<ZoneState>>,
}

impl ZoneHandle {
    /// Wrap a freshly built state.
    pub fn new(state: ZoneState) -> Self {
        Self {
            id: state.id.clone(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Acquire the zone lock. Acquisition order is FIFO (the mutex is
    /// fair), which is what gives actions their ordering guarantee.
    pub async fn lock(&self) -> MutexGuard<'_, ZoneState> {
        self.state.lock().await
    }
}

impl core::fmt::Debug for ZoneHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ZoneHandle").field("id", &self.id).finish()
    }
}

/// Spawn the periodic tick task for a zone. The task stops when
/// `shutdown` flips to `true`.
pub fn spawn_tick_task(
    handle: ZoneHandle,
    ctx: ZoneContext,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(ctx.config.tick_interval());
        // A zone that stalls on a ledger call skips the missed ticks
        // instead of bursting to catch up.
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        info!(zone = %handle.id, "zone tick task started");
        loop {
            tokio::select! {
                _ = interval.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let loot_jobs = {
                let mut state = handle.lock().await;
                match tick::run_tick(&mut state, &ctx) {
                    Ok(summary) => summary.loot_jobs,
                    Err(err) => {
                        // A tick-internal failure never crashes the zone.
                        error!(zone = %handle.id, %err, "tick failed");
                        Vec::new()
                    }
                }
            };

            if !loot_jobs.is_empty() {
                let tick_now = handle.lock().await.tick();
                jobs::dispatch_best_effort(&ctx, tick_now, loot_jobs);
            }
        }
        info!(zone = %handle.id, "zone tick task stopped");
    })
}
