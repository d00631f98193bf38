//! Error types for the mistvale-realm crate.

/// Errors raised while booting or coordinating the world. Per-action
/// failures use the shared `ActionError` taxonomy instead.
#[derive(Debug, thiserror::Error)]
pub enum RealmError {
    /// A zone failed to build from its definition.
    #[error("zone build error: {source}")]
    Zone {
        /// The underlying zone error.
        #[from]
        source: mistvale_zone::ZoneError,
    },

    /// A catalog failed to build or validate.
    #[error("content error: {source}")]
    Content {
        /// The underlying content error.
        #[from]
        source: mistvale_content::ContentError,
    },

    /// A persistence operation failed.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: mistvale_store::StoreError,
    },
}
