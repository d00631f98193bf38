//! The item catalog: static metadata for every item token id.
//!
//! The catalog is the single source of truth for what a token *is* —
//! category, equip slot, durability, prices, granted stats. Ownership and
//! quantity live on the external ledger; the catalog never changes after
//! boot.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mistvale_types::{EquipSlot, GateRank, ItemId, NodeKind, Quality, StatBlock, StatKind};

use crate::error::ContentError;

/// What an item fundamentally is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum ItemCategory {
    /// A weapon. `coef_pct` scales attacker strength in the damage
    /// formula (100 = ×1.0).
    Weapon {
        /// Weapon coefficient in percent.
        coef_pct: u32,
    },
    /// A gathering tool occupying the weapon slot.
    Tool {
        /// Which node kind this tool works.
        kind: NodeKind,
        /// Tool tier; must be ≥ the node tier.
        tier: u8,
    },
    /// Wearable armor.
    Armor {
        /// The slot this armor occupies.
        slot: EquipSlot,
    },
    /// A ring or amulet.
    Accessory {
        /// The slot this accessory occupies.
        slot: EquipSlot,
    },
    /// A raw gathered or dropped material.
    Resource,
    /// A consumable (potions and the like).
    Consumable,
    /// An enchantment catalyst burned at the altar.
    Catalyst {
        /// The stat the resulting enchantment raises.
        stat: StatKind,
        /// Flat bonus amount.
        amount: u32,
    },
    /// A dungeon gate key.
    GateKey {
        /// The rank of gate this key opens.
        rank: GateRank,
    },
}

/// Static metadata for one item token id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    /// The token id, shared with the external ledger.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Category and category-specific data.
    pub category: ItemCategory,
    /// Durability when pristine; `None` for items that do not wear.
    pub max_durability: Option<u32>,
    /// Price a merchant charges; 0 means not sold.
    pub purchase_price: u64,
    /// Price a merchant pays; 0 means not bought.
    pub sale_price: u64,
    /// Stats granted while equipped, if any.
    pub granted_stats: Option<StatBlock>,
    /// Quality grade stamped on mint.
    pub quality: Quality,
}

impl ItemDef {
    /// The equipment slot this item occupies, if it is equippable.
    pub const fn equip_slot(&self) -> Option<EquipSlot> {
        match &self.category {
            ItemCategory::Weapon { .. } | ItemCategory::Tool { .. } => Some(EquipSlot::Weapon),
            ItemCategory::Armor { slot } | ItemCategory::Accessory { slot } => Some(*slot),
            _ => None,
        }
    }

    /// The weapon coefficient for the damage formula. Tools swing poorly;
    /// everything else is bare-handed.
    pub const fn weapon_coef_pct(&self) -> u32 {
        match &self.category {
            ItemCategory::Weapon { coef_pct } => *coef_pct,
            ItemCategory::Tool { .. } => 50,
            _ => 0,
        }
    }

    /// The tool tier, if this item is a gathering tool of `kind`.
    pub fn tool_tier(&self, kind: NodeKind) -> Option<u8> {
        match &self.category {
            ItemCategory::Tool { kind: k, tier } if *k == kind => Some(*tier),
            _ => None,
        }
    }
}

/// The read-only item catalog.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: BTreeMap<ItemId, ItemDef>,
}

impl ItemCatalog {
    /// Build a catalog from a list of definitions. Later duplicates
    /// overwrite earlier ones.
    pub fn from_defs(defs: impl IntoIterator<Item = ItemDef>) -> Self {
        Self {
            items: defs.into_iter().map(|d| (d.id.clone(), d)).collect(),
        }
    }

    /// Look up an item, if present.
    pub fn get(&self, id: &ItemId) -> Option<&ItemDef> {
        self.items.get(id)
    }

    /// Look up an item or fail with [`ContentError::UnknownItem`].
    pub fn require(&self, id: &ItemId) -> Result<&ItemDef, ContentError> {
        self.items
            .get(id)
            .ok_or_else(|| ContentError::UnknownItem(id.clone()))
    }

    /// Number of cataloged items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate all definitions.
    pub fn iter(&self) -> impl Iterator<Item = &ItemDef> {
        self.items.values()
    }

    /// The key item for a gate rank, if one is cataloged.
    pub fn gate_key_for(&self, rank: GateRank) -> Option<&ItemDef> {
        self.items.values().find(|def| {
            matches!(&def.category, ItemCategory::GateKey { rank: r } if *r == rank)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pickaxe(tier: u8) -> ItemDef {
        ItemDef {
            id: ItemId::from("stone_pickaxe"),
            name: "Stone Pickaxe".to_owned(),
            category: ItemCategory::Tool {
                kind: NodeKind::Ore,
                tier,
            },
            max_durability: Some(64),
            purchase_price: 40,
            sale_price: 10,
            granted_stats: None,
            quality: Quality::Common,
        }
    }

    #[test]
    fn tools_occupy_the_weapon_slot() {
        assert_eq!(pickaxe(1).equip_slot(), Some(EquipSlot::Weapon));
    }

    #[test]
    fn tool_tier_respects_node_kind() {
        let item = pickaxe(2);
        assert_eq!(item.tool_tier(NodeKind::Ore), Some(2));
        assert_eq!(item.tool_tier(NodeKind::Flower), None);
    }

    #[test]
    fn require_unknown_item_fails() {
        let catalog = ItemCatalog::from_defs([pickaxe(1)]);
        let missing = ItemId::from("void_blade");
        assert_eq!(
            catalog.require(&missing),
            Err(ContentError::UnknownItem(missing))
        );
    }

    #[test]
    fn gate_key_lookup_by_rank() {
        let key = ItemDef {
            id: ItemId::from("gate_key_e"),
            name: "E-Rank Gate Key".to_owned(),
            category: ItemCategory::GateKey { rank: GateRank::E },
            max_durability: None,
            purchase_price: 0,
            sale_price: 0,
            granted_stats: None,
            quality: Quality::Common,
        };
        let catalog = ItemCatalog::from_defs([key]);
        assert!(catalog.gate_key_for(GateRank::E).is_some());
        assert!(catalog.gate_key_for(GateRank::S).is_none());
    }
}
