//! Error types for the mistvale-world crate.

use mistvale_types::Position;

/// Errors that can occur during terrain and spatial operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// A position fell outside the zone bounds.
    #[error("position {pos} is outside the zone bounds")]
    OutOfBounds {
        /// The offending position.
        pos: Position,
    },

    /// Checked arithmetic failed during a terrain computation.
    #[error("arithmetic overflow in terrain computation")]
    ArithmeticOverflow,
}
