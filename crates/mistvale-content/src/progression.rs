//! Race × class × level progression curves.
//!
//! A player's base stat block is fully derived: the class fixes the
//! level-1 block, the race applies a per-stat percentage modifier, and
//! each level past 1 adds the configured growth rate. Vitals pools derive
//! from the block. The XP curve is cumulative: `xp_for_level(n)` is the
//! total XP required to *be* level `n`.

use mistvale_types::{Class, Race, StatBlock, StatKind};

/// Level cap. Additional XP past the cap accrues without a level-up.
pub const MAX_LEVEL: u32 = 60;

/// Per-level stat growth rate (2% per level past 1).
pub const XP_GROWTH_RATE: f64 = 0.02;

/// The level-1 base stat block for a class.
pub const fn class_base_stats(class: Class) -> StatBlock {
    match class {
        Class::Warrior => StatBlock {
            strength: 12,
            defense: 10,
            hp: 12,
            agility: 6,
            intellect: 4,
            mp: 3,
            faith: 4,
            luck: 5,
        },
        Class::Mage => StatBlock {
            strength: 4,
            defense: 5,
            hp: 7,
            agility: 6,
            intellect: 13,
            mp: 12,
            faith: 5,
            luck: 5,
        },
        Class::Ranger => StatBlock {
            strength: 8,
            defense: 7,
            hp: 9,
            agility: 12,
            intellect: 6,
            mp: 5,
            faith: 4,
            luck: 7,
        },
        Class::Cleric => StatBlock {
            strength: 6,
            defense: 8,
            hp: 9,
            agility: 5,
            intellect: 7,
            mp: 9,
            faith: 12,
            luck: 5,
        },
    }
}

/// The racial modifier for one stat, as a multiplier.
pub fn race_modifier(race: Race, stat: StatKind) -> f64 {
    match (race, stat) {
        (Race::Human, _) => 1.0,
        (Race::Elf, StatKind::Agility | StatKind::Intellect) => 1.1,
        (Race::Elf, StatKind::Strength | StatKind::Defense) => 0.95,
        (Race::Dwarf, StatKind::Defense | StatKind::Hp) => 1.1,
        (Race::Dwarf, StatKind::Agility) => 0.9,
        (Race::Orc, StatKind::Strength) => 1.15,
        (Race::Orc, StatKind::Intellect | StatKind::Faith) => 0.9,
        _ => 1.0,
    }
}

/// Compute the full base stat block at a level:
/// `stat = round(base · race_modifier · (1 + growth·(level − 1)))`.
pub fn stats_at_level(race: Race, class: Class, level: u32) -> StatBlock {
    let base = class_base_stats(class);
    let growth = 1.0 + XP_GROWTH_RATE * f64::from(level.saturating_sub(1));

    let scale = |kind: StatKind| -> u32 {
        let value = f64::from(base.get(kind)) * race_modifier(race, kind) * growth;
        // Stats are small; the round cannot exceed u32.
        value.round().max(0.0) as u32
    };

    StatBlock {
        strength: scale(StatKind::Strength),
        defense: scale(StatKind::Defense),
        hp: scale(StatKind::Hp),
        agility: scale(StatKind::Agility),
        intellect: scale(StatKind::Intellect),
        mp: scale(StatKind::Mp),
        faith: scale(StatKind::Faith),
        luck: scale(StatKind::Luck),
    }
}

/// Maximum hit points for a stat block.
pub const fn max_hp_for(stats: &StatBlock) -> u32 {
    50_u32.saturating_add(stats.hp.saturating_mul(10))
}

/// Maximum essence for a stat block.
pub const fn max_essence_for(stats: &StatBlock) -> u32 {
    30_u32.saturating_add(stats.mp.saturating_mul(10))
}

/// Total XP required to be at `level`. Level 1 requires 0.
///
/// The curve is `50·(n−1)·n`: level 2 at 100 XP, level 3 at 300,
/// level 4 at 600, and so on.
pub const fn xp_for_level(level: u32) -> u64 {
    let n = level as u64;
    50_u64.saturating_mul(n.saturating_sub(1)).saturating_mul(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xp_curve_shape() {
        assert_eq!(xp_for_level(1), 0);
        assert_eq!(xp_for_level(2), 100);
        assert_eq!(xp_for_level(3), 300);
        assert_eq!(xp_for_level(4), 600);
    }

    #[test]
    fn xp_curve_is_monotonic() {
        for level in 1..MAX_LEVEL {
            assert!(xp_for_level(level) < xp_for_level(level + 1));
        }
    }

    #[test]
    fn human_level_one_matches_class_base() {
        let stats = stats_at_level(Race::Human, Class::Warrior, 1);
        assert_eq!(stats, class_base_stats(Class::Warrior));
    }

    #[test]
    fn stats_grow_with_level() {
        let low = stats_at_level(Race::Human, Class::Warrior, 1);
        let high = stats_at_level(Race::Human, Class::Warrior, 30);
        assert!(high.strength > low.strength);
        assert!(high.hp > low.hp);
    }

    #[test]
    fn orc_strength_bonus_applies() {
        // 12 · 1.15 = 13.8 → 14
        let stats = stats_at_level(Race::Orc, Class::Warrior, 1);
        assert_eq!(stats.strength, 14);
    }

    #[test]
    fn vitals_derive_from_block() {
        let stats = class_base_stats(Class::Warrior);
        assert_eq!(max_hp_for(&stats), 50 + 120);
        assert_eq!(max_essence_for(&stats), 30 + 30);
    }
}
