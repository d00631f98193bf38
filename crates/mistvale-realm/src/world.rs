//! The world manager: every zone runtime, plus the ordered dual-lock.
//!
//! The manager owns the zone registry behind one mutex with short
//! critical sections; zone *state* stays behind each zone's own lock.
//! Cross-zone operations acquire the two zone locks in lexicographic
//! zone-id order, so transition and dungeon teleports cannot deadlock.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::{Mutex, watch};
use tracing::info;

use mistvale_store::ChunkDiffStore;
use mistvale_types::{ActionError, ZoneId};
use mistvale_zone::runtime::{ZoneContext, ZoneHandle, spawn_tick_task};
use mistvale_zone::spawn::build_zone;
use mistvale_zone::state::ZoneState;

use crate::error::RealmError;

struct ZoneEntry {
    handle: ZoneHandle,
    shutdown: watch::Sender<bool>,
}

/// Owns all zone runtimes and routes by zone id.
pub struct WorldManager {
    ctx: ZoneContext,
    zones: Mutex<BTreeMap<ZoneId, ZoneEntry>>,
}

impl WorldManager {
    /// Boot every zone in the content catalog, replaying persisted chunk
    /// diffs, and start its tick task.
    ///
    /// # Errors
    ///
    /// Returns [`RealmError`] if a zone definition fails to build or its
    /// chunk file is corrupt.
    pub async fn boot(ctx: ZoneContext, chunks: &ChunkDiffStore) -> Result<Arc<Self>, RealmError> {
        let world = Arc::new(Self {
            ctx: ctx.clone(),
            zones: Mutex::new(BTreeMap::new()),
        });

        let defs: Vec<_> = ctx.content.zones.zones().cloned().collect();
        for def in defs {
            let diffs = chunks.load(&def.id).await?;
            let state = build_zone(&def, &ctx.content, &ctx.config, &diffs)?;
            world.add_zone(state).await;
            info!(zone = %def.id, "zone booted");
        }
        Ok(world)
    }

    /// A world with no zones (dungeon-only tests build from here).
    pub fn empty(ctx: ZoneContext) -> Arc<Self> {
        Arc::new(Self {
            ctx,
            zones: Mutex::new(BTreeMap::new()),
        })
    }

    /// The shared zone context.
    pub const fn context(&self) -> &ZoneContext {
        &self.ctx
    }

    /// Register a zone and start its tick task.
    pub async fn add_zone(&self, state: ZoneState) -> ZoneHandle {
        let handle = ZoneHandle::new(state);
        let (shutdown, shutdown_rx) = watch::channel(false);
        let _task = spawn_tick_task(handle.clone(), self.ctx.clone(), shutdown_rx);
        self.zones.lock().await.insert(
            handle.id.clone(),
            ZoneEntry {
                handle: handle.clone(),
                shutdown,
            },
        );
        handle
    }

    /// Remove a zone and stop its tick task. Returns whether the zone
    /// existed.
    pub async fn remove_zone(&self, id: &ZoneId) -> bool {
        let Some(entry) = self.zones.lock().await.remove(id) else {
            return false;
        };
        let _ = entry.shutdown.send(true);
        info!(zone = %id, "zone removed");
        true
    }

    /// Look up a zone handle.
    pub async fn zone(&self, id: &ZoneId) -> Option<ZoneHandle> {
        self.zones.lock().await.get(id).map(|e| e.handle.clone())
    }

    /// Look up a zone handle, failing with a validation error.
    pub async fn require_zone(&self, id: &ZoneId) -> Result<ZoneHandle, ActionError> {
        self.zone(id)
            .await
            .ok_or_else(|| ActionError::validation(format!("unknown zone {id}")))
    }

    /// All current zone ids.
    pub async fn zone_ids(&self) -> Vec<ZoneId> {
        self.zones.lock().await.keys().cloned().collect()
    }

    /// Persist every zone's modified terrain chunks. Zones with no
    /// edits write nothing (and clear any stale file).
    ///
    /// # Errors
    ///
    /// Returns [`RealmError::Store`] on the first failing write.
    pub async fn persist_chunk_diffs(&self, store: &ChunkDiffStore) -> Result<(), RealmError> {
        for id in self.zone_ids().await {
            let Some(zone) = self.zone(&id).await else {
                continue;
            };
            let chunks = zone.lock().await.terrain.modified_chunks();
            store.save(&id, chunks).await?;
        }
        Ok(())
    }

    /// Stop every zone tick task.
    pub async fn shutdown(&self) {
        for entry in self.zones.lock().await.values() {
            let _ = entry.shutdown.send(true);
        }
    }
}

/// Run `f` with both zones locked, acquiring in lexicographic zone-id
/// order regardless of argument order. The closure still receives the
/// states in the caller's `(a, b)` order.
///
/// # Errors
///
/// Returns a validation error when `a` and `b` are the same zone — a
/// cross-zone operation within one zone is a routing bug.
pub async fn with_zone_pair<R>(
    a: &ZoneHandle,
    b: &ZoneHandle,
    f: impl FnOnce(&mut ZoneState, &mut ZoneState) -> R,
) -> Result<R, ActionError> {
    if a.id == b.id {
        return Err(ActionError::validation(format!(
            "cross-zone operation within a single zone {}",
            a.id
        )));
    }
    if a.id < b.id {
        let mut ga = a.lock().await;
        let mut gb = b.lock().await;
        Ok(f(&mut ga, &mut gb))
    } else {
        let mut gb = b.lock().await;
        let mut ga = a.lock().await;
        Ok(f(&mut ga, &mut gb))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use mistvale_content::ContentCatalog;
    use mistvale_ledger::{AssetLedger, InMemoryLedger, shared_audit_log};
    use mistvale_types::{Bounds, Position};
    use mistvale_world::TerrainGrid;
    use mistvale_zone::runtime::NoParties;
    use mistvale_zone::RealmConfig;

    use super::*;

    fn ctx() -> ZoneContext {
        let ledger: Arc<dyn AssetLedger> = Arc::new(InMemoryLedger::new());
        ZoneContext {
            content: Arc::new(ContentCatalog::default_world().unwrap_or_default()),
            config: Arc::new(RealmConfig::default()),
            ledger,
            audit: shared_audit_log(),
            parties: Arc::new(NoParties),
        }
    }

    fn bare_zone(id: &str) -> ZoneState {
        ZoneState::new(
            ZoneId::from(id),
            Position::new(4, 4),
            1,
            TerrainGrid::generate(Bounds::new(32, 32), 1),
            16,
        )
    }

    #[tokio::test]
    async fn add_lookup_remove() {
        let world = WorldManager::empty(ctx());
        let _ = world.add_zone(bare_zone("z1")).await;
        assert!(world.zone(&ZoneId::from("z1")).await.is_some());
        assert!(world.remove_zone(&ZoneId::from("z1")).await);
        assert!(world.zone(&ZoneId::from("z1")).await.is_none());
        assert!(!world.remove_zone(&ZoneId::from("z1")).await);
        world.shutdown().await;
    }

    #[tokio::test]
    async fn zone_pair_rejects_same_zone() {
        let world = WorldManager::empty(ctx());
        let z1 = world.add_zone(bare_zone("z1")).await;
        let result = with_zone_pair(&z1, &z1, |_, _| ()).await;
        assert!(matches!(result, Err(ActionError::Validation { .. })));
        world.shutdown().await;
    }

    #[tokio::test]
    async fn zone_pair_passes_states_in_caller_order() {
        let world = WorldManager::empty(ctx());
        // "b" sorts before "z": exercise both argument orders.
        let zb = world.add_zone(bare_zone("b-zone")).await;
        let zz = world.add_zone(bare_zone("z-zone")).await;

        let ids = with_zone_pair(&zz, &zb, |first, second| {
            (first.id.clone(), second.id.clone())
        })
        .await;
        assert_eq!(
            ids.ok(),
            Some((ZoneId::from("z-zone"), ZoneId::from("b-zone")))
        );
        world.shutdown().await;
    }
}
