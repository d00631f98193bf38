//! Per-zone runtime for the Mistvale world server.
//!
//! A zone is a single-writer cooperative actor: a fair async mutex
//! serializes the periodic tick task and every dispatched action, while
//! different zones run in parallel. This crate owns the tick loop and
//! its eight phases, mob behavior, death and respawn processing, the
//! action executor with its three ledger disciplines, and the server
//! configuration.
//!
//! # Modules
//!
//! - [`clock`] — the monotonic per-zone tick counter
//! - [`config`] — YAML-backed [`RealmConfig`]
//! - [`state`] — [`ZoneState`]: entities, terrain, spatial index, events
//! - [`spawn`] — entity construction from content definitions
//! - [`tick`] — the eight-phase tick loop
//! - [`ai`] — mob behavior (idle → aggro → strike)
//! - [`death`] — death resolution and respawn queues
//! - [`actions`] — the action executor
//! - [`jobs`] — best-effort outbound ledger jobs
//! - [`runtime`] — [`ZoneHandle`], [`ZoneContext`], the tick task
//! - [`error`] — [`ZoneError`]

pub mod actions;
pub mod ai;
pub mod clock;
pub mod config;
pub mod death;
pub mod error;
pub mod jobs;
pub mod runtime;
pub mod spawn;
pub mod state;
pub mod tick;

pub use config::{ConfigError, RealmConfig};
pub use error::ZoneError;
pub use runtime::{NoParties, PartyLookup, ZoneContext, ZoneHandle, spawn_tick_task};
pub use state::ZoneState;
pub use tick::{TickSummary, run_tick};
