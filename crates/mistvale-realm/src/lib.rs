//! World coordination for the Mistvale server.
//!
//! This crate sits above the zone runtimes: the world manager owns every
//! zone and the ordered dual-lock for cross-zone moves; the dispatcher
//! is the single front door for authenticated requests; the party,
//! dungeon, and session managers each own their map behind one mutex
//! with short critical sections.
//!
//! # Modules
//!
//! - [`world`] — [`WorldManager`] and the ordered zone-pair lock
//! - [`dispatcher`] — [`Dispatcher`], the request front door
//! - [`party`] — [`PartyManager`] (one party per agent)
//! - [`dungeon`] — [`DungeonManager`] and instance lifecycle
//! - [`transition`] — portal transitions between zones
//! - [`session`] — login/logout over the character store
//! - [`error`] — [`RealmError`]

pub mod dispatcher;
pub mod dungeon;
pub mod error;
pub mod party;
pub mod session;
pub mod transition;
pub mod world;

pub use dispatcher::Dispatcher;
pub use dungeon::{DungeonInstance, DungeonManager, TeardownReason};
pub use error::RealmError;
pub use party::{LeaveOutcome, Party, PartyManager};
pub use session::{LoginOutcome, SessionManager};
pub use transition::{TransitionOutcome, transition_auto, transition_portal};
pub use world::{WorldManager, with_zone_pair};
