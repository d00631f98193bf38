//! Error types for the mistvale-zone crate.

use mistvale_types::{EntityId, ZoneId};

use crate::clock::ClockError;

/// Errors raised by zone construction and the tick loop. Action-path
/// failures use the shared `ActionError` taxonomy instead.
#[derive(Debug, thiserror::Error)]
pub enum ZoneError {
    /// A catalog lookup failed while building the zone.
    #[error("content error: {source}")]
    Content {
        /// The underlying catalog error.
        #[from]
        source: mistvale_content::ContentError,
    },

    /// The tick counter overflowed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// An entity expected to be present was not.
    #[error("entity {entity} not found in zone {zone}")]
    EntityNotFound {
        /// The missing entity.
        entity: EntityId,
        /// The zone searched.
        zone: ZoneId,
    },
}
