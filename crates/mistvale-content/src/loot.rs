//! Loot tables: per-mob-template drop lists with probabilistic rolls.
//!
//! Drop chances and respawn delays are catalog data taken verbatim; the
//! roll functions are generic over [`Rng`] so tests drive them with a
//! seeded generator.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use mistvale_types::{ItemId, MobTemplateId};

/// One potential drop from a loot table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootDrop {
    /// The token minted when the drop lands.
    pub item: ItemId,
    /// Drop chance in percent (0–100).
    pub chance_pct: u32,
    /// Minimum quantity.
    pub min_qty: u64,
    /// Maximum quantity (inclusive).
    pub max_qty: u64,
}

/// Drop, currency, XP, and respawn data for one mob template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootTable {
    /// The template this table belongs to.
    pub template: MobTemplateId,
    /// Drops rolled automatically on death, minted to the killer.
    pub auto_drops: Vec<LootDrop>,
    /// Drops rolled on skinning (surface out of scope; data carried).
    pub skinning_drops: Vec<LootDrop>,
    /// Currency range minted to the killer: `(min, max)` inclusive.
    pub currency: (u64, u64),
    /// XP granted to the killer before party math.
    pub xp_reward: u64,
    /// Ticks from death to respawn; `None` uses the configured default.
    pub respawn_ticks: Option<u64>,
}

/// Roll the auto-drop list, returning the landed `(item, quantity)` pairs.
pub fn roll_auto_drops<R: Rng + ?Sized>(table: &LootTable, rng: &mut R) -> Vec<(ItemId, u64)> {
    roll_drops(&table.auto_drops, rng)
}

/// Roll the skinning-drop list.
pub fn roll_skinning_drops<R: Rng + ?Sized>(table: &LootTable, rng: &mut R) -> Vec<(ItemId, u64)> {
    roll_drops(&table.skinning_drops, rng)
}

/// Roll a currency amount from the table's range.
pub fn roll_currency<R: Rng + ?Sized>(table: &LootTable, rng: &mut R) -> u64 {
    let (min, max) = table.currency;
    if min >= max {
        return min;
    }
    rng.random_range(min..=max)
}

fn roll_drops<R: Rng + ?Sized>(drops: &[LootDrop], rng: &mut R) -> Vec<(ItemId, u64)> {
    let mut landed = Vec::new();
    for drop in drops {
        if drop.chance_pct == 0 {
            continue;
        }
        if drop.chance_pct < 100 && rng.random_range(0..100_u32) >= drop.chance_pct {
            continue;
        }
        let qty = if drop.min_qty >= drop.max_qty {
            drop.min_qty
        } else {
            rng.random_range(drop.min_qty..=drop.max_qty)
        };
        if qty > 0 {
            landed.push((drop.item.clone(), qty));
        }
    }
    landed
}

/// The read-only loot catalog, keyed by mob template.
#[derive(Debug, Clone, Default)]
pub struct LootCatalog {
    tables: BTreeMap<MobTemplateId, LootTable>,
}

impl LootCatalog {
    /// Build a catalog from a list of tables.
    pub fn from_tables(tables: impl IntoIterator<Item = LootTable>) -> Self {
        Self {
            tables: tables
                .into_iter()
                .map(|t| (t.template.clone(), t))
                .collect(),
        }
    }

    /// Look up the table for a template, if present. Templates without a
    /// table drop nothing and grant no XP.
    pub fn get(&self, template: &MobTemplateId) -> Option<&LootTable> {
        self.tables.get(template)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn table() -> LootTable {
        LootTable {
            template: MobTemplateId::from("giant_rat"),
            auto_drops: vec![
                LootDrop {
                    item: ItemId::from("rat_tail"),
                    chance_pct: 100,
                    min_qty: 1,
                    max_qty: 1,
                },
                LootDrop {
                    item: ItemId::from("rat_fang"),
                    chance_pct: 0,
                    min_qty: 1,
                    max_qty: 3,
                },
            ],
            skinning_drops: Vec::new(),
            currency: (3, 9),
            xp_reward: 12,
            respawn_ticks: Some(20),
        }
    }

    #[test]
    fn certain_drops_always_land() {
        let mut rng = StdRng::seed_from_u64(1);
        let t = table();
        for _ in 0..20 {
            let drops = roll_auto_drops(&t, &mut rng);
            assert_eq!(drops.len(), 1);
            assert_eq!(drops.first().map(|(i, q)| (i.as_str(), *q)), Some(("rat_tail", 1)));
        }
    }

    #[test]
    fn zero_chance_drops_never_land() {
        let mut rng = StdRng::seed_from_u64(2);
        let t = table();
        for _ in 0..50 {
            let drops = roll_auto_drops(&t, &mut rng);
            assert!(drops.iter().all(|(item, _)| item.as_str() != "rat_fang"));
        }
    }

    #[test]
    fn skinning_rolls_use_their_own_list() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut t = table();
        t.skinning_drops = vec![LootDrop {
            item: ItemId::from("rat_hide"),
            chance_pct: 100,
            min_qty: 1,
            max_qty: 2,
        }];
        let drops = roll_skinning_drops(&t, &mut rng);
        assert_eq!(drops.len(), 1);
        assert!(drops.iter().all(|(item, qty)| item.as_str() == "rat_hide" && (1..=2).contains(qty)));
    }

    #[test]
    fn currency_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(3);
        let t = table();
        for _ in 0..100 {
            let amount = roll_currency(&t, &mut rng);
            assert!((3..=9).contains(&amount));
        }
    }

    #[test]
    fn degenerate_currency_range_returns_min() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut t = table();
        t.currency = (5, 5);
        assert_eq!(roll_currency(&t, &mut rng), 5);
        t.currency = (7, 2);
        assert_eq!(roll_currency(&t, &mut rng), 7);
    }
}
