//! 16×16 terrain chunking and the modified-chunk diff model.
//!
//! A chunk is identified by its `(cx, cz)` coordinate — the tile position
//! divided by [`CHUNK_SIZE`] with floor semantics so negative tiles map
//! correctly. Only chunks holding at least one tile edit or object state
//! are ever materialized; the persisted per-zone file is just the list of
//! these [`ChunkState`] records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mistvale_types::Position;

use crate::terrain::TileKind;

/// Tiles per chunk edge.
pub const CHUNK_SIZE: i32 = 16;

/// Coordinate of a chunk within a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChunkCoord {
    /// Chunk x coordinate.
    pub cx: i32,
    /// Chunk z coordinate.
    pub cz: i32,
}

impl ChunkCoord {
    /// Build a chunk coordinate directly.
    pub const fn new(cx: i32, cz: i32) -> Self {
        Self { cx, cz }
    }

    /// The chunk containing a tile position (floor division).
    pub const fn containing(pos: Position) -> Self {
        Self {
            cx: pos.x.div_euclid(CHUNK_SIZE),
            cz: pos.y.div_euclid(CHUNK_SIZE),
        }
    }
}

/// A single tile edit within a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileDiff {
    /// Tile x coordinate (zone-local, not chunk-local).
    pub x: i32,
    /// Tile y coordinate.
    pub y: i32,
    /// The tile kind after the edit.
    pub kind: TileKind,
}

/// The persisted state of one modified chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkState {
    /// Chunk x coordinate.
    pub cx: i32,
    /// Chunk z coordinate.
    pub cz: i32,
    /// Tile edits applied on top of the generated baseline.
    pub tile_diffs: Vec<TileDiff>,
    /// Opaque placed-object state, keyed by object id.
    pub object_states: BTreeMap<String, String>,
}

impl ChunkState {
    /// An empty chunk record at the given coordinate.
    pub const fn empty(cx: i32, cz: i32) -> Self {
        Self {
            cx,
            cz,
            tile_diffs: Vec::new(),
            object_states: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn containing_uses_floor_division() {
        assert_eq!(
            ChunkCoord::containing(Position::new(0, 0)),
            ChunkCoord::new(0, 0)
        );
        assert_eq!(
            ChunkCoord::containing(Position::new(15, 15)),
            ChunkCoord::new(0, 0)
        );
        assert_eq!(
            ChunkCoord::containing(Position::new(16, 31)),
            ChunkCoord::new(1, 1)
        );
        assert_eq!(
            ChunkCoord::containing(Position::new(-1, -16)),
            ChunkCoord::new(-1, -1)
        );
    }

    #[test]
    fn chunk_state_serde_roundtrip() {
        let mut state = ChunkState::empty(2, 3);
        state.tile_diffs.push(TileDiff {
            x: 33,
            y: 49,
            kind: TileKind::Stone,
        });
        state
            .object_states
            .insert("campfire-1".to_owned(), "lit".to_owned());

        let json = serde_json::to_string(&state).ok();
        assert!(json.is_some());
        let back: Result<ChunkState, _> = serde_json::from_str(json.as_deref().unwrap_or(""));
        assert_eq!(back.ok(), Some(state));
    }
}
