//! Login and logout: the persistence hooks.
//!
//! Login loads the wallet's character record and spawns the entity into
//! its recorded zone at its recorded position (new wallets start a fresh
//! level-1 character in the starter zone). Logout snapshots the live
//! entity back to the record and despawns it. One session per wallet.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use mistvale_content::ContentCatalog;
use mistvale_content::progression::{max_essence_for, max_hp_for, stats_at_level};
use mistvale_store::{CharacterRecord, CharacterStore};
use mistvale_types::{
    ActionError, Class, Entity, EntityId, PlayerState, Position, Race, Role, WalletAddress,
    ZoneId,
};

use crate::world::WorldManager;

/// Where a login landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// The zone the character spawned into.
    pub zone: ZoneId,
    /// The spawned entity.
    pub entity: EntityId,
    /// Character level (fresh characters are level 1).
    pub level: u32,
}

#[derive(Debug, Clone)]
struct Session {
    zone: ZoneId,
    entity: EntityId,
}

/// Owns live sessions and the character store.
pub struct SessionManager {
    store: CharacterStore,
    sessions: Mutex<BTreeMap<WalletAddress, Session>>,
}

impl SessionManager {
    /// Create a manager over a character store.
    pub fn new(store: CharacterStore) -> Arc<Self> {
        Arc::new(Self {
            store,
            sessions: Mutex::new(BTreeMap::new()),
        })
    }

    /// Log a wallet in, spawning its character.
    pub async fn login(
        &self,
        world: &Arc<WorldManager>,
        wallet: &WalletAddress,
        name: &str,
        race: Race,
        class: Class,
    ) -> Result<LoginOutcome, ActionError> {
        {
            let sessions = self.sessions.lock().await;
            if sessions.contains_key(wallet) {
                return Err(ActionError::conflict("wallet already logged in"));
            }
        }

        let record = self
            .store
            .load(wallet)
            .await
            .map_err(|e| ActionError::internal(e.to_string()))?;

        let (zone_id, entity) = match record {
            Some(record) => {
                // A zone missing from this boot (a torn-down dungeon,
                // retired content) falls back to the starter zone.
                let (zone_id, pos) = if world.zone(&record.zone).await.is_some() {
                    (record.zone.clone(), Position::new(record.x, record.y))
                } else {
                    let starter = ContentCatalog::starter_zone();
                    let spawn = world
                        .require_zone(&starter)
                        .await?
                        .lock()
                        .await
                        .spawn_point;
                    (starter, spawn)
                };
                (zone_id, entity_from_record(&record, pos))
            }
            None => {
                let starter = ContentCatalog::starter_zone();
                let spawn = world
                    .require_zone(&starter)
                    .await?
                    .lock()
                    .await
                    .spawn_point;
                let entity =
                    mistvale_zone::spawn::new_player_entity(name, wallet.clone(), race, class, spawn);
                (starter, entity)
            }
        };

        let entity_id = entity.id;
        let level = entity.as_player().map_or(1, |p| p.level);
        let zone = world.require_zone(&zone_id).await?;
        zone.lock().await.insert_entity(entity);

        self.sessions.lock().await.insert(
            wallet.clone(),
            Session {
                zone: zone_id.clone(),
                entity: entity_id,
            },
        );

        info!(%wallet, zone = %zone_id, entity = %entity_id, "login");
        Ok(LoginOutcome {
            zone: zone_id,
            entity: entity_id,
            level,
        })
    }

    /// Log a wallet out: snapshot, persist, despawn.
    pub async fn logout(
        &self,
        world: &Arc<WorldManager>,
        wallet: &WalletAddress,
        entity_id: EntityId,
    ) -> Result<(), ActionError> {
        let session = {
            let sessions = self.sessions.lock().await;
            sessions
                .get(wallet)
                .cloned()
                .ok_or_else(|| ActionError::validation("wallet is not logged in"))?
        };
        if session.entity != entity_id {
            return Err(ActionError::authorization(
                "entity does not belong to this session",
            ));
        }

        // The entity may have transitioned since login; find it.
        let zone_id = self
            .locate(world, entity_id)
            .await
            .unwrap_or(session.zone.clone());
        let zone = world.require_zone(&zone_id).await?;

        let record = {
            let mut state = zone.lock().await;
            let entity = state
                .entity(entity_id)
                .ok_or_else(|| ActionError::internal("session entity missing from its zone"))?;
            mistvale_entities::validation::require_wallet(entity, Some(wallet))?;
            let player = entity
                .as_player()
                .ok_or_else(|| ActionError::internal("session entity is not a player"))?;
            let record = CharacterRecord::snapshot(&entity.name, &state.id, entity.pos, player);
            let _ = state.remove_entity(entity_id);
            record
        };

        self.store
            .save(&record)
            .await
            .map_err(|e| ActionError::internal(e.to_string()))?;
        self.sessions.lock().await.remove(wallet);

        info!(%wallet, zone = %zone_id, entity = %entity_id, "logout");
        Ok(())
    }

    /// The live session for a wallet, if any.
    pub async fn session_of(&self, wallet: &WalletAddress) -> Option<(ZoneId, EntityId)> {
        self.sessions
            .lock()
            .await
            .get(wallet)
            .map(|s| (s.zone.clone(), s.entity))
    }

    /// Scan zones for the entity (transitions move entities without
    /// updating the session record; the zone set is small).
    async fn locate(&self, world: &Arc<WorldManager>, entity_id: EntityId) -> Option<ZoneId> {
        for id in world.zone_ids().await {
            if let Some(zone) = world.zone(&id).await
                && zone.lock().await.entity(entity_id).is_some()
            {
                return Some(id);
            }
        }
        None
    }
}

/// Rebuild a live player entity from its persisted record.
fn entity_from_record(record: &CharacterRecord, pos: Position) -> Entity {
    let base_stats = stats_at_level(record.race, record.class, record.level);
    let max_hp = max_hp_for(&base_stats);
    let max_essence = max_essence_for(&base_stats);
    Entity::new(
        record.name.clone(),
        pos,
        Role::Player(PlayerState {
            wallet: record.wallet.clone(),
            level: record.level,
            xp: record.xp,
            race: record.race,
            class: record.class,
            kills: record.kills,
            hp: max_hp,
            max_hp,
            essence: max_essence,
            max_essence,
            alive: true,
            base_stats,
            professions: record.professions.iter().copied().collect(),
            learned_techniques: record.learned_techniques.iter().cloned().collect(),
            active_quests: record.active_quests.clone(),
            completed_quests: record.completed_quests.clone(),
            active_effects: Vec::new(),
            equipment: record.equipment.iter().cloned().collect(),
            cooldowns: BTreeMap::new(),
            attack_ready_at: 0,
            engaged_target: None,
        }),
    )
}
