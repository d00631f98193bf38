//! Stat blocks and stat arithmetic.
//!
//! A [`StatBlock`] is the eight-stat record carried by every combat entity.
//! Players derive their base block from race × class × level (computed in
//! the content crate); the *effective* block adds equipment bonuses and
//! active-effect deltas and is recomputed whenever either changes.

use serde::{Deserialize, Serialize};

use crate::enums::StatKind;

/// The eight primary stats of a combat entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatBlock {
    /// Physical power.
    pub strength: u32,
    /// Damage mitigation.
    pub defense: u32,
    /// Health pool contribution.
    pub hp: u32,
    /// Agility.
    pub agility: u32,
    /// Intellect.
    pub intellect: u32,
    /// Essence pool contribution.
    pub mp: u32,
    /// Faith.
    pub faith: u32,
    /// Luck.
    pub luck: u32,
}

impl StatBlock {
    /// Read a single stat by kind.
    pub const fn get(&self, kind: StatKind) -> u32 {
        match kind {
            StatKind::Strength => self.strength,
            StatKind::Defense => self.defense,
            StatKind::Hp => self.hp,
            StatKind::Agility => self.agility,
            StatKind::Intellect => self.intellect,
            StatKind::Mp => self.mp,
            StatKind::Faith => self.faith,
            StatKind::Luck => self.luck,
        }
    }

    /// Add `amount` to a single stat, saturating at `u32::MAX`.
    pub const fn add(&mut self, kind: StatKind, amount: u32) {
        let slot = match kind {
            StatKind::Strength => &mut self.strength,
            StatKind::Defense => &mut self.defense,
            StatKind::Hp => &mut self.hp,
            StatKind::Agility => &mut self.agility,
            StatKind::Intellect => &mut self.intellect,
            StatKind::Mp => &mut self.mp,
            StatKind::Faith => &mut self.faith,
            StatKind::Luck => &mut self.luck,
        };
        *slot = slot.saturating_add(amount);
    }

    /// Component-wise saturating sum of two blocks.
    pub const fn combined(&self, other: &Self) -> Self {
        Self {
            strength: self.strength.saturating_add(other.strength),
            defense: self.defense.saturating_add(other.defense),
            hp: self.hp.saturating_add(other.hp),
            agility: self.agility.saturating_add(other.agility),
            intellect: self.intellect.saturating_add(other.intellect),
            mp: self.mp.saturating_add(other.mp),
            faith: self.faith.saturating_add(other.faith),
            luck: self.luck.saturating_add(other.luck),
        }
    }
}
