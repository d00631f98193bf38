//! File-backed persistence for the Mistvale world server.
//!
//! Two stores, both plain JSON on disk: per-wallet character records
//! (saved on logout, loaded on login) and per-zone terrain chunk diffs
//! (only modified chunks; base terrain regenerates from the seed). The
//! external ledger owns balances, so neither store ever records token
//! quantities.
//!
//! # Modules
//!
//! - [`character`] — [`CharacterRecord`] and [`CharacterStore`]
//! - [`chunks`] — [`ChunkStateFile`] and [`ChunkDiffStore`]
//! - [`error`] — [`StoreError`]

pub mod character;
pub mod chunks;
pub mod error;

pub use character::{CharacterRecord, CharacterStore, character_dir};
pub use chunks::{ChunkDiffStore, ChunkStateFile, chunk_dir};
pub use error::StoreError;
