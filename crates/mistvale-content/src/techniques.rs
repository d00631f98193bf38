//! The technique catalog.
//!
//! A technique is a named active ability with an essence cost, a cooldown
//! in ticks, a target discipline, and an effect payload. The combat
//! engine interprets the payload; the catalog only describes it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use mistvale_types::{TargetKind, TechniqueId};

use crate::error::ContentError;

/// What a technique does when it resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum TechniqueEffect {
    /// Direct damage: `added` joins the base damage formula.
    Damage {
        /// Flat damage added on top of strength × weapon coefficient.
        added: u32,
    },
    /// Instant heal.
    Heal {
        /// HP restored, clamped at max.
        amount: u32,
    },
    /// Timed damage modifier on the target.
    Modifier {
        /// Additive percent to damage the target deals.
        outgoing_damage_pct: i32,
        /// Additive percent to damage the target takes.
        incoming_damage_pct: i32,
        /// Effect duration in ticks.
        duration_ticks: u64,
    },
    /// Damage over time.
    DamageOverTime {
        /// HP lost per tick.
        per_tick: u32,
        /// Effect duration in ticks.
        duration_ticks: u64,
    },
    /// Healing over time.
    RegenOverTime {
        /// HP restored per tick.
        per_tick: u32,
        /// Effect duration in ticks.
        duration_ticks: u64,
    },
}

impl TechniqueEffect {
    /// Whether this effect deals direct damage (the damage clamp of the
    /// combat formula only applies to damaging techniques).
    pub const fn is_damaging(&self) -> bool {
        matches!(self, Self::Damage { .. } | Self::DamageOverTime { .. })
    }
}

/// A static technique definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechniqueDef {
    /// Catalog key.
    pub id: TechniqueId,
    /// Display name.
    pub name: String,
    /// Essence consumed per cast.
    pub essence_cost: u32,
    /// Ticks between casts.
    pub cooldown_ticks: u64,
    /// Target discipline.
    pub target: TargetKind,
    /// Radius in tiles for AoE techniques; ignored otherwise.
    pub radius: u32,
    /// Minimum caster level.
    pub min_level: u32,
    /// The effect payload.
    pub effect: TechniqueEffect,
}

/// The read-only technique catalog.
#[derive(Debug, Clone, Default)]
pub struct TechniqueCatalog {
    techniques: BTreeMap<TechniqueId, TechniqueDef>,
}

impl TechniqueCatalog {
    /// Build a catalog from a list of definitions.
    pub fn from_defs(defs: impl IntoIterator<Item = TechniqueDef>) -> Self {
        Self {
            techniques: defs.into_iter().map(|d| (d.id.clone(), d)).collect(),
        }
    }

    /// Look up a technique, if present.
    pub fn get(&self, id: &TechniqueId) -> Option<&TechniqueDef> {
        self.techniques.get(id)
    }

    /// Look up a technique or fail with [`ContentError::UnknownTechnique`].
    pub fn require(&self, id: &TechniqueId) -> Result<&TechniqueDef, ContentError> {
        self.techniques
            .get(id)
            .ok_or_else(|| ContentError::UnknownTechnique(id.clone()))
    }

    /// Iterate all definitions.
    pub fn iter(&self) -> impl Iterator<Item = &TechniqueDef> {
        self.techniques.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damaging_effects_are_flagged() {
        assert!(TechniqueEffect::Damage { added: 10 }.is_damaging());
        assert!(
            TechniqueEffect::DamageOverTime {
                per_tick: 2,
                duration_ticks: 5
            }
            .is_damaging()
        );
        assert!(!TechniqueEffect::Heal { amount: 20 }.is_damaging());
    }

    #[test]
    fn catalog_lookup() {
        let def = TechniqueDef {
            id: TechniqueId::from("ember_bolt"),
            name: "Ember Bolt".to_owned(),
            essence_cost: 8,
            cooldown_ticks: 4,
            target: TargetKind::Single,
            radius: 0,
            min_level: 1,
            effect: TechniqueEffect::Damage { added: 6 },
        };
        let catalog = TechniqueCatalog::from_defs([def]);
        assert!(catalog.get(&TechniqueId::from("ember_bolt")).is_some());
        assert!(catalog.require(&TechniqueId::from("nope")).is_err());
    }
}
