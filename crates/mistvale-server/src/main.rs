//! Mistvale world server binary.
//!
//! Wires the content catalog, the asset ledger adapter, the stores, the
//! world manager, and the dungeon monitor together, then runs until
//! interrupted. The HTTP/WebSocket edge is an external collaborator: it
//! takes the [`Dispatcher`] handle this binary builds and feeds it
//! authenticated envelopes.
//!
//! # Startup sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `mistvale.yaml` (defaults when absent)
//! 3. Build the content catalog and validate cross-references
//! 4. Open the character and chunk stores
//! 5. Select the ledger adapter (in-memory unless the edge wires one)
//! 6. Boot every zone and start its tick task
//! 7. Start the dungeon instance monitor
//! 8. Assemble the dispatcher
//! 9. Run until ctrl-c, then persist chunk diffs and stop cleanly

use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mistvale_content::ContentCatalog;
use mistvale_ledger::{AssetLedger, InMemoryLedger, shared_audit_log};
use mistvale_realm::{Dispatcher, DungeonManager, PartyManager, SessionManager, WorldManager};
use mistvale_store::{CharacterStore, ChunkDiffStore, character_dir, chunk_dir};
use mistvale_zone::runtime::ZoneContext;
use mistvale_zone::{PartyLookup, RealmConfig};

/// Configuration file looked for at the server root.
const CONFIG_PATH: &str = "mistvale.yaml";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("mistvale-server starting");

    // 2. Configuration.
    let config = load_config()?;
    info!(
        tick_interval_ms = config.world.tick_interval_ms,
        ledger_timeout_ms = config.ledger.call_timeout_ms,
        data_dir = %config.storage.data_dir,
        "configuration loaded"
    );

    // 3. Content.
    let content = ContentCatalog::default_world().context("content catalog failed to build")?;
    info!(
        items = content.items.len(),
        zones = content.zones.zones().count(),
        "content catalog built"
    );

    // 4. Stores.
    let data_dir = Path::new(&config.storage.data_dir);
    let characters = CharacterStore::new(character_dir(data_dir));
    let chunks = ChunkDiffStore::new(chunk_dir(data_dir));

    // 5. Ledger adapter. Standalone servers run the in-memory ledger;
    // a chain-backed deployment swaps in its own adapter here.
    let ledger: Arc<dyn AssetLedger> = Arc::new(InMemoryLedger::new());
    let audit = shared_audit_log();

    // Party manager doubles as the zone runtimes' XP-split view.
    let parties = Arc::new(PartyManager::new(config.party.max_size));
    let ctx = ZoneContext {
        content: Arc::new(content),
        config: Arc::new(config),
        ledger,
        audit,
        parties: Arc::clone(&parties) as Arc<dyn PartyLookup>,
    };

    // 6. World boot: every zone gets its tick task.
    let world = WorldManager::boot(ctx, &chunks)
        .await
        .context("world failed to boot")?;
    info!(zones = world.zone_ids().await.len(), "world booted");

    // 7. Dungeon monitor.
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let dungeons = DungeonManager::new(Arc::clone(&parties));
    let dungeon_ticker = dungeons.spawn_ticker(Arc::clone(&world), shutdown_rx);

    // 8. Dispatcher, ready for the edge layer.
    let sessions = SessionManager::new(characters);
    let _dispatcher = Dispatcher::new(
        Arc::clone(&world),
        parties,
        dungeons,
        sessions,
    );
    info!("dispatcher ready; world is live");

    // 9. Run until interrupted.
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!("shutdown requested");

    let _ = shutdown_tx.send(true);
    let _ = dungeon_ticker.await;
    world
        .persist_chunk_diffs(&chunks)
        .await
        .context("failed to persist terrain diffs")?;
    world.shutdown().await;

    info!("mistvale-server stopped");
    Ok(())
}

/// Read `mistvale.yaml`, falling back to defaults when the file is
/// absent (a missing file is normal; a malformed one is fatal).
fn load_config() -> anyhow::Result<RealmConfig> {
    let path = Path::new(CONFIG_PATH);
    if path.exists() {
        RealmConfig::from_file(path).with_context(|| format!("failed to load {CONFIG_PATH}"))
    } else {
        info!("no {CONFIG_PATH}; using defaults");
        Ok(RealmConfig::parse("{}")?)
    }
}
