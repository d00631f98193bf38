//! Geography for the Mistvale world server: terrain, chunking, and the
//! spatial index.
//!
//! A zone's terrain is a tile grid generated deterministically from the
//! zone seed; edits are tracked per 16×16 chunk so persistence stores
//! diffs only. The spatial index is a bucketed grid rebuilt each tick by
//! the zone runtime to answer radius queries in O(k).
//!
//! # Modules
//!
//! - [`terrain`] — tile kinds, the grid, walkability and movement cost
//! - [`chunk`] — chunk coordinates and the modified-chunk diff model
//! - [`generator`] — deterministic procedural base terrain
//! - [`spatial`] — the bucketed spatial index
//! - [`error`] — [`WorldError`]

pub mod chunk;
pub mod error;
pub mod generator;
pub mod spatial;
pub mod terrain;

pub use chunk::{CHUNK_SIZE, ChunkCoord, ChunkState, TileDiff};
pub use error::WorldError;
pub use spatial::SpatialIndex;
pub use terrain::{TerrainGrid, TileKind};
