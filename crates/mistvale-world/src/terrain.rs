//! The zone terrain grid: a tile array with walkability and movement cost.
//!
//! Base terrain is procedurally generated from the zone seed (see
//! [`crate::generator`]), so unmodified tiles consume no persisted bytes.
//! Edits are tracked per 16×16 chunk; the diff store persists only the
//! chunks that diverged from the generated baseline.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mistvale_types::{Bounds, Position};

use crate::chunk::{ChunkCoord, ChunkState, TileDiff};
use crate::error::WorldError;
use crate::generator;

/// The kind of a single terrain tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    /// Open grassland.
    Grass,
    /// Packed dirt.
    Dirt,
    /// Stone floor.
    Stone,
    /// Loose sand; slow to cross.
    Sand,
    /// Open water; not walkable.
    Water,
    /// Solid rock; not walkable.
    Rock,
}

impl TileKind {
    /// Whether entities can stand on this tile.
    pub const fn walkable(self) -> bool {
        !matches!(self, Self::Water | Self::Rock)
    }

    /// Relative movement cost of crossing this tile. Mob pathing weights
    /// straight-line steps by this factor.
    pub const fn move_cost(self) -> f64 {
        match self {
            Self::Grass | Self::Stone => 1.0,
            Self::Dirt => 1.2,
            Self::Sand => 1.5,
            // Unreachable for movement, but a cost keeps the table total.
            Self::Water | Self::Rock => f64::INFINITY,
        }
    }
}

/// A zone's tile grid plus its modified-chunk tracking.
#[derive(Debug, Clone)]
pub struct TerrainGrid {
    bounds: Bounds,
    seed: u64,
    tiles: Vec<TileKind>,
    /// Chunks that diverged from the generated baseline.
    modified: BTreeMap<ChunkCoord, ChunkState>,
}

impl TerrainGrid {
    /// Generate a fresh grid for `bounds` from `seed`.
    pub fn generate(bounds: Bounds, seed: u64) -> Self {
        Self {
            bounds,
            seed,
            tiles: generator::generate_tiles(bounds, seed),
            modified: BTreeMap::new(),
        }
    }

    /// Generate a grid and replay previously persisted chunk diffs onto it.
    pub fn generate_with_diffs(bounds: Bounds, seed: u64, diffs: &[ChunkState]) -> Self {
        let mut grid = Self::generate(bounds, seed);
        for chunk in diffs {
            for diff in &chunk.tile_diffs {
                // Out-of-bounds diffs from a stale file are dropped.
                let _ = grid.set_tile(Position::new(diff.x, diff.y), diff.kind);
            }
            if !chunk.object_states.is_empty() {
                let entry = grid
                    .modified
                    .entry(ChunkCoord::new(chunk.cx, chunk.cz))
                    .or_insert_with(|| ChunkState::empty(chunk.cx, chunk.cz));
                entry.object_states.extend(
                    chunk
                        .object_states
                        .iter()
                        .map(|(k, v)| (k.clone(), v.clone())),
                );
            }
        }
        grid
    }

    /// The zone bounds.
    pub const fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// The generation seed.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Read the tile at `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `pos` is outside the grid.
    pub fn tile(&self, pos: Position) -> Result<TileKind, WorldError> {
        let idx = self.index(pos)?;
        self.tiles
            .get(idx)
            .copied()
            .ok_or(WorldError::OutOfBounds { pos })
    }

    /// Whether `pos` is in bounds and walkable.
    pub fn is_walkable(&self, pos: Position) -> bool {
        self.tile(pos).map(TileKind::walkable).unwrap_or(false)
    }

    /// Movement cost of the tile at `pos`; infinite when out of bounds.
    pub fn move_cost(&self, pos: Position) -> f64 {
        self.tile(pos).map_or(f64::INFINITY, TileKind::move_cost)
    }

    /// Overwrite the tile at `pos`, recording the edit in the chunk diff.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `pos` is outside the grid.
    pub fn set_tile(&mut self, pos: Position, kind: TileKind) -> Result<(), WorldError> {
        let idx = self.index(pos)?;
        let Some(slot) = self.tiles.get_mut(idx) else {
            return Err(WorldError::OutOfBounds { pos });
        };
        if *slot == kind {
            return Ok(());
        }
        *slot = kind;

        let coord = ChunkCoord::containing(pos);
        let chunk = self
            .modified
            .entry(coord)
            .or_insert_with(|| ChunkState::empty(coord.cx, coord.cz));
        // Last write wins for repeated edits of the same tile.
        chunk.tile_diffs.retain(|d| !(d.x == pos.x && d.y == pos.y));
        chunk.tile_diffs.push(TileDiff {
            x: pos.x,
            y: pos.y,
            kind,
        });
        Ok(())
    }

    /// Record opaque placed-object state on the chunk containing `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::OutOfBounds`] if `pos` is outside the grid.
    pub fn set_object_state(
        &mut self,
        pos: Position,
        key: impl Into<String>,
        state: impl Into<String>,
    ) -> Result<(), WorldError> {
        if !self.bounds.contains(pos) {
            return Err(WorldError::OutOfBounds { pos });
        }
        let coord = ChunkCoord::containing(pos);
        let chunk = self
            .modified
            .entry(coord)
            .or_insert_with(|| ChunkState::empty(coord.cx, coord.cz));
        chunk.object_states.insert(key.into(), state.into());
        Ok(())
    }

    /// The modified chunks, ready for the diff store. Unmodified chunks
    /// never appear here.
    pub fn modified_chunks(&self) -> Vec<ChunkState> {
        self.modified.values().cloned().collect()
    }

    fn index(&self, pos: Position) -> Result<usize, WorldError> {
        if !self.bounds.contains(pos) {
            return Err(WorldError::OutOfBounds { pos });
        }
        let width = self.bounds.width as usize;
        let x = usize::try_from(pos.x).map_err(|_err| WorldError::OutOfBounds { pos })?;
        let y = usize::try_from(pos.y).map_err(|_err| WorldError::OutOfBounds { pos })?;
        y.checked_mul(width)
            .and_then(|row| row.checked_add(x))
            .ok_or(WorldError::ArithmeticOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> TerrainGrid {
        TerrainGrid::generate(Bounds::new(64, 64), 7)
    }

    #[test]
    fn generation_is_deterministic() {
        let a = grid();
        let b = grid();
        for y in 0..64 {
            for x in 0..64 {
                let pos = Position::new(x, y);
                assert_eq!(a.tile(pos).ok(), b.tile(pos).ok());
            }
        }
    }

    #[test]
    fn out_of_bounds_read_is_an_error() {
        let g = grid();
        assert_eq!(
            g.tile(Position::new(64, 0)),
            Err(WorldError::OutOfBounds {
                pos: Position::new(64, 0)
            })
        );
        assert!(!g.is_walkable(Position::new(-1, -1)));
    }

    #[test]
    fn set_tile_records_a_chunk_diff() {
        let mut g = grid();
        let pos = Position::new(20, 5);
        // Pick a kind that differs from the generated baseline so the
        // edit is a real divergence.
        let kind = if g.tile(pos).ok() == Some(TileKind::Stone) {
            TileKind::Sand
        } else {
            TileKind::Stone
        };
        let result = g.set_tile(pos, kind);
        assert!(result.is_ok());
        assert_eq!(g.tile(pos).ok(), Some(kind));

        let chunks = g.modified_chunks();
        assert_eq!(chunks.len(), 1);
        let chunk = chunks.first();
        assert_eq!(chunk.map(|c| (c.cx, c.cz)), Some((1, 0)));
        assert_eq!(chunk.map(|c| c.tile_diffs.len()), Some(1));
    }

    #[test]
    fn repeated_edits_keep_last_write() {
        let mut g = grid();
        let pos = Position::new(3, 3);
        let _ = g.set_tile(pos, TileKind::Stone);
        let _ = g.set_tile(pos, TileKind::Sand);
        let chunks = g.modified_chunks();
        let diffs = chunks.first().map(|c| c.tile_diffs.clone()).unwrap_or_default();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs.first().map(|d| d.kind), Some(TileKind::Sand));
    }

    #[test]
    fn diffs_replay_onto_generated_baseline() {
        let mut g = grid();
        let pos = Position::new(33, 17);
        let _ = g.set_tile(pos, TileKind::Rock);
        let diffs = g.modified_chunks();

        let replayed = TerrainGrid::generate_with_diffs(Bounds::new(64, 64), 7, &diffs);
        assert_eq!(replayed.tile(pos).ok(), Some(TileKind::Rock));
        assert!(!replayed.is_walkable(pos));
    }

    #[test]
    fn unmodified_grid_has_no_chunks() {
        assert!(grid().modified_chunks().is_empty());
    }
}
