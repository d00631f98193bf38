//! Type-safe identifier wrappers.
//!
//! Every subject in the world has a strongly-typed identifier to prevent
//! accidental mixing at compile time. Runtime-generated identities (entities,
//! parties, dungeon instances, actions) are UUID v7 (time-ordered) newtypes.
//! Catalog and routing keys (zones, wallets, item tokens, quests, recipes,
//! techniques, mob templates) are string newtypes: they are authored in
//! content, must survive serialization unchanged, and — in the case of
//! [`ZoneId`] — sort lexicographically to define the global lock order for
//! cross-zone operations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

/// Generates a newtype wrapper around [`String`] for content-authored keys.
macro_rules! define_key {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Create a key from anything convertible to a string.
            pub fn new(key: impl Into<String>) -> Self {
                Self(key.into())
            }

            /// Return the key as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(key: &str) -> Self {
                Self(key.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(key: String) -> Self {
                Self(key)
            }
        }
    };
}

define_id! {
    /// Unique identifier for an entity (player, mob, NPC, node, station,
    /// gate, portal marker). Unique per world, generated at spawn.
    EntityId
}

define_id! {
    /// Unique identifier for a party.
    PartyId
}

define_id! {
    /// Unique identifier for a dungeon instance record.
    InstanceId
}

define_id! {
    /// Unique identifier for a dispatched action, used for per-tick
    /// duplicate suppression.
    ActionId
}

define_key! {
    /// Key of a zone. Zone ids sort lexicographically; cross-zone
    /// operations acquire zone locks in this order.
    ZoneId
}

define_key! {
    /// External asset-ledger wallet address. The ledger is authoritative
    /// for everything held under this key.
    WalletAddress
}

define_key! {
    /// Content-addressed item token id, shared between the item catalog
    /// and the external ledger.
    ItemId
}

define_key! {
    /// Key of a quest definition in the quest catalog.
    QuestId
}

define_key! {
    /// Key of a crafting or upgrade recipe in the recipe registry.
    RecipeId
}

define_key! {
    /// Key of a technique definition in the technique catalog.
    TechniqueId
}

define_key! {
    /// Key of a mob spawn template (also the loot-table key).
    MobTemplateId
}
