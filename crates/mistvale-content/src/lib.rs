//! Static catalogs for the Mistvale world server.
//!
//! Everything in this crate is read-only after initialization: the world
//! manager builds one [`ContentCatalog`] at boot, wraps it in an `Arc`,
//! and every zone runtime reads it without locking. Runtime state never
//! lives here — a mob's hit points belong to its entity, only the
//! template belongs to the catalog.
//!
//! # Modules
//!
//! - [`items`] — item metadata keyed by ledger token id
//! - [`recipes`] — crafting and upgrade recipes with profession gates
//! - [`loot`] — per-template drop tables and the roll functions
//! - [`quests`] — quest definitions and the prerequisite chain
//! - [`techniques`] — active ability definitions
//! - [`progression`] — race × class × level curves and the XP table
//! - [`zones`] — zone definitions, mob templates, dungeon rank scaling
//! - [`catalog`] — the aggregate [`ContentCatalog`] and shipped content
//! - [`error`] — [`ContentError`]

pub mod catalog;
pub mod error;
pub mod items;
pub mod loot;
pub mod progression;
pub mod quests;
pub mod recipes;
pub mod techniques;
pub mod zones;

pub use catalog::ContentCatalog;
pub use error::ContentError;
pub use items::{ItemCatalog, ItemCategory, ItemDef};
pub use loot::{
    LootCatalog, LootDrop, LootTable, roll_auto_drops, roll_currency, roll_skinning_drops,
};
pub use progression::{MAX_LEVEL, max_essence_for, max_hp_for, stats_at_level, xp_for_level};
pub use quests::{QuestCatalog, QuestDef, QuestObjective};
pub use recipes::{RecipeDef, RecipeKind, RecipeRegistry};
pub use techniques::{TechniqueCatalog, TechniqueDef, TechniqueEffect};
pub use zones::{
    GateSpawn, MobSpawn, MobTemplate, NodeSpawn, NpcSpawn, PortalSpawn, RankScaling, StationSpawn,
    ZoneDef, ZoneRegistry,
};
