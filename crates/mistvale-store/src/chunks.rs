//! Per-zone terrain chunk-diff files.
//!
//! One JSON file per zone holding only the modified chunks; a zone whose
//! terrain was never edited has no file at all. Base terrain regenerates
//! from the zone seed on load and the diffs replay on top.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use mistvale_types::ZoneId;
use mistvale_world::ChunkState;

use crate::error::StoreError;

/// The persisted chunk-state file for one zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkStateFile {
    /// The zone these chunks belong to.
    pub zone_id: ZoneId,
    /// When the file was last written.
    pub updated_at: DateTime<Utc>,
    /// The modified chunks.
    pub states: Vec<ChunkState>,
}

/// File-backed store of per-zone chunk diffs.
#[derive(Debug, Clone)]
pub struct ChunkDiffStore {
    dir: PathBuf,
}

impl ChunkDiffStore {
    /// Open a store rooted at `dir` (created on first save).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Persist a zone's modified chunks. An empty list removes the file
    /// — unmodified terrain consumes no persisted bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on filesystem or serialization failure.
    pub async fn save(&self, zone_id: &ZoneId, states: Vec<ChunkState>) -> Result<(), StoreError> {
        let path = self.path_for(zone_id);
        if states.is_empty() {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(err.into()),
            }
            return Ok(());
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let file = ChunkStateFile {
            zone_id: zone_id.clone(),
            updated_at: Utc::now(),
            states,
        };
        let json = serde_json::to_vec_pretty(&file)?;
        tokio::fs::write(&path, json).await?;
        debug!(zone = %zone_id, chunks = file.states.len(), "chunk diffs saved");
        Ok(())
    }

    /// Load a zone's modified chunks; an absent file is an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] on filesystem failure or a corrupt file.
    pub async fn load(&self, zone_id: &ZoneId) -> Result<Vec<ChunkState>, StoreError> {
        let path = self.path_for(zone_id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let file: ChunkStateFile = serde_json::from_slice(&bytes)?;
                Ok(file.states)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn path_for(&self, zone_id: &ZoneId) -> PathBuf {
        self.dir.join(format!("{}.chunks.json", sanitize(zone_id.as_str())))
    }
}

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

/// The path layout under a data dir.
pub fn chunk_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("chunks")
}

#[cfg(test)]
mod tests {
    use mistvale_types::{Bounds, Position};
    use mistvale_world::{TerrainGrid, TileKind};

    use super::*;

    #[tokio::test]
    async fn modified_chunks_round_trip_through_the_store() {
        let Ok(dir) = tempfile::tempdir() else {
            return;
        };
        let store = ChunkDiffStore::new(dir.path());
        let zone = ZoneId::from("starter-vale");

        let mut grid = TerrainGrid::generate(Bounds::new(64, 64), 9);
        let pos = Position::new(20, 21);
        let kind = if grid.tile(pos).ok() == Some(TileKind::Stone) {
            TileKind::Sand
        } else {
            TileKind::Stone
        };
        let _ = grid.set_tile(pos, kind);

        let saved = store.save(&zone, grid.modified_chunks()).await;
        assert!(saved.is_ok());

        let loaded = store.load(&zone).await.unwrap_or_default();
        let replayed = TerrainGrid::generate_with_diffs(Bounds::new(64, 64), 9, &loaded);
        assert_eq!(replayed.tile(pos).ok(), Some(kind));
    }

    #[tokio::test]
    async fn unmodified_zone_persists_nothing() {
        let Ok(dir) = tempfile::tempdir() else {
            return;
        };
        let store = ChunkDiffStore::new(dir.path());
        let zone = ZoneId::from("starter-vale");

        let saved = store.save(&zone, Vec::new()).await;
        assert!(saved.is_ok());
        // No file appears for an unmodified zone.
        let entries = std::fs::read_dir(dir.path()).map(Iterator::count).unwrap_or(0);
        assert_eq!(entries, 0);

        let loaded = store.load(&zone).await.unwrap_or_default();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn saving_empty_after_edits_removes_the_file() {
        let Ok(dir) = tempfile::tempdir() else {
            return;
        };
        let store = ChunkDiffStore::new(dir.path());
        let zone = ZoneId::from("z");

        let mut grid = TerrainGrid::generate(Bounds::new(32, 32), 1);
        let pos = Position::new(1, 1);
        let kind = if grid.tile(pos).ok() == Some(TileKind::Rock) {
            TileKind::Water
        } else {
            TileKind::Rock
        };
        let _ = grid.set_tile(pos, kind);
        let _ = store.save(&zone, grid.modified_chunks()).await;
        assert!(!store.load(&zone).await.unwrap_or_default().is_empty());

        let _ = store.save(&zone, Vec::new()).await;
        assert!(store.load(&zone).await.unwrap_or_default().is_empty());
    }
}
