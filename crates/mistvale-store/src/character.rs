//! Durable per-wallet character records.
//!
//! One JSON file per wallet under the character directory. Save happens
//! on logout (and may happen opportunistically), load on login. Tokens
//! live on the ledger, so the record carries progression and equipment
//! *assignments*, never balances.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use mistvale_types::{
    ActiveQuest, Class, EquipSlot, EquippedItem, PlayerState, Position, Profession, QuestId, Race,
    TechniqueId, WalletAddress, ZoneId,
};

use crate::error::StoreError;

/// The persisted character state for one wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    /// The owning wallet.
    pub wallet: WalletAddress,
    /// Character display name.
    pub name: String,
    /// Level at snapshot time.
    pub level: u32,
    /// XP at snapshot time.
    pub xp: u64,
    /// Race.
    pub race: Race,
    /// Class.
    pub class: Class,
    /// Zone the character was last in.
    pub zone: ZoneId,
    /// Tile x.
    pub x: i32,
    /// Tile y.
    pub y: i32,
    /// Lifetime kills.
    pub kills: u64,
    /// Completed quest ids, in completion order.
    pub completed_quests: Vec<QuestId>,
    /// Quests in progress at snapshot time.
    pub active_quests: Vec<ActiveQuest>,
    /// Learned technique ids.
    pub learned_techniques: Vec<TechniqueId>,
    /// Learned professions.
    pub professions: Vec<Profession>,
    /// Equipment assignments, including enchantments.
    pub equipment: Vec<(EquipSlot, EquippedItem)>,
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
}

impl CharacterRecord {
    /// Snapshot a live player entity.
    pub fn snapshot(name: &str, zone: &ZoneId, pos: Position, player: &PlayerState) -> Self {
        Self {
            wallet: player.wallet.clone(),
            name: name.to_owned(),
            level: player.level,
            xp: player.xp,
            race: player.race,
            class: player.class,
            zone: zone.clone(),
            x: pos.x,
            y: pos.y,
            kills: player.kills,
            completed_quests: player.completed_quests.clone(),
            active_quests: player.active_quests.clone(),
            learned_techniques: player.learned_techniques.iter().cloned().collect(),
            professions: player.professions.iter().copied().collect(),
            equipment: player
                .equipment
                .iter()
                .map(|(slot, item)| (*slot, item.clone()))
                .collect(),
            saved_at: Utc::now(),
        }
    }
}

/// File-backed store of [`CharacterRecord`]s, one JSON file per wallet.
#[derive(Debug, Clone)]
pub struct CharacterStore {
    dir: PathBuf,
}

impl CharacterStore {
    /// Open a store rooted at `dir` (created on first save).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Persist a record, overwriting any previous snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on filesystem or serialization failure.
    pub async fn save(&self, record: &CharacterRecord) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(&record.wallet);
        let json = serde_json::to_vec_pretty(record)?;
        tokio::fs::write(&path, json).await?;
        debug!(wallet = %record.wallet, path = %path.display(), "character saved");
        Ok(())
    }

    /// Load the record for a wallet, or `None` when the wallet has no
    /// character yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on filesystem failure or a corrupt file.
    pub async fn load(&self, wallet: &WalletAddress) -> Result<Option<CharacterRecord>, StoreError> {
        let path = self.path_for(wallet);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Remove a wallet's record (account deletion).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on filesystem failure other than absence.
    pub async fn delete(&self, wallet: &WalletAddress) -> Result<(), StoreError> {
        match tokio::fs::remove_file(self.path_for(wallet)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn path_for(&self, wallet: &WalletAddress) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize(wallet.as_str())))
    }
}

/// Wallet addresses become file names; anything outside
/// `[A-Za-z0-9._-]` maps to `_`.
fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Convenience for tests and tooling: the path layout under a data dir.
pub fn character_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("characters")
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, BTreeSet};

    use mistvale_types::StatBlock;

    use super::*;

    fn player() -> PlayerState {
        let mut professions = BTreeSet::new();
        professions.insert(Profession::Mining);
        let mut learned = BTreeSet::new();
        learned.insert(TechniqueId::from("ember_bolt"));
        PlayerState {
            wallet: WalletAddress::from("0xabc/../etc"),
            level: 7,
            xp: 2_450,
            race: Race::Elf,
            class: Class::Ranger,
            kills: 31,
            hp: 80,
            max_hp: 120,
            essence: 40,
            max_essence: 60,
            alive: true,
            base_stats: StatBlock::default(),
            professions,
            learned_techniques: learned,
            active_quests: vec![ActiveQuest {
                quest: QuestId::from("wolf_cull"),
                progress: 1,
                started_at_tick: 900,
            }],
            completed_quests: vec![QuestId::from("rat_extermination")],
            active_effects: Vec::new(),
            equipment: BTreeMap::new(),
            cooldowns: BTreeMap::new(),
            attack_ready_at: 0,
            engaged_target: None,
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let Ok(dir) = tempfile::tempdir() else {
            return;
        };
        let store = CharacterStore::new(dir.path());

        let record = CharacterRecord::snapshot(
            "Sylwen",
            &ZoneId::from("wild-meadow"),
            Position::new(120, 88),
            &player(),
        );
        let saved = store.save(&record).await;
        assert!(saved.is_ok());

        let loaded = store.load(&record.wallet).await;
        assert_eq!(loaded.ok().flatten(), Some(record));
    }

    #[tokio::test]
    async fn missing_wallet_loads_none() {
        let Ok(dir) = tempfile::tempdir() else {
            return;
        };
        let store = CharacterStore::new(dir.path());
        let loaded = store.load(&WalletAddress::from("0xnobody")).await;
        assert_eq!(loaded.ok().flatten(), None);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let Ok(dir) = tempfile::tempdir() else {
            return;
        };
        let store = CharacterStore::new(dir.path());
        let record = CharacterRecord::snapshot(
            "Sylwen",
            &ZoneId::from("wild-meadow"),
            Position::new(1, 1),
            &player(),
        );
        let _ = store.save(&record).await;
        assert!(store.delete(&record.wallet).await.is_ok());
        assert!(store.delete(&record.wallet).await.is_ok());
        let loaded = store.load(&record.wallet).await;
        assert_eq!(loaded.ok().flatten(), None);
    }

    #[test]
    fn sanitize_confines_wallets_to_the_store_dir() {
        assert_eq!(sanitize("0xabc/../etc"), "0xabc_.._etc");
        assert_eq!(sanitize("plain-wallet_1.a"), "plain-wallet_1.a");
    }
}
