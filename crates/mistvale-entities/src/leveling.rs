//! XP grants, level-ups, and the party XP split.
//!
//! XP is applied before any other reward on kill or turn-in so level-ups
//! are visible to subsequent effects. Leveling recomputes the base stat
//! block from the progression curves, recomputes the vitals maxima, and
//! heals to full — a policy decision, applied on every level gained.

use mistvale_types::{EntityId, PlayerState};

use mistvale_content::progression::{
    MAX_LEVEL, max_essence_for, max_hp_for, stats_at_level, xp_for_level,
};

/// Party XP bonus per member beyond the first, in percent.
pub const PARTY_BONUS_PER_EXTRA_PCT: u64 = 10;

/// What an XP grant did to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpGrant {
    /// XP actually added.
    pub xp: u64,
    /// Levels gained (0 for most grants).
    pub levels_gained: u32,
    /// Level after the grant.
    pub new_level: u32,
}

/// Grant XP and run the level-up loop.
///
/// While `xp ≥ xp_for_level(level + 1)` and the cap is not reached, the
/// level increments, stats recompute at the new level, vitals maxima
/// recompute, and the player heals to full. Past [`MAX_LEVEL`] the XP
/// still accrues but no further level-up occurs.
pub fn grant_xp(player: &mut PlayerState, amount: u64) -> XpGrant {
    player.xp = player.xp.saturating_add(amount);

    let mut levels_gained = 0_u32;
    while player.level < MAX_LEVEL && player.xp >= xp_for_level(player.level.saturating_add(1)) {
        player.level = player.level.saturating_add(1);
        levels_gained = levels_gained.saturating_add(1);
    }

    if levels_gained > 0 {
        player.base_stats = stats_at_level(player.race, player.class, player.level);
        player.max_hp = max_hp_for(&player.base_stats);
        player.max_essence = max_essence_for(&player.base_stats);
        // Heal to full on level-up, by policy.
        player.hp = player.max_hp;
        player.essence = player.max_essence;
    }

    XpGrant {
        xp: amount,
        levels_gained,
        new_level: player.level,
    }
}

/// One party member's share of a kill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpShare {
    /// The member.
    pub member: EntityId,
    /// The member's XP share.
    pub amount: u64,
}

/// Split kill XP across the party members present in the zone.
///
/// Each share starts from the mob's base XP scaled by the party bonus
/// (+10% of base per member beyond the first); live members receive the
/// full share, dead members half. A solo "party" of one receives exactly
/// the base XP.
pub fn party_xp_shares(base_xp: u64, members: &[(EntityId, bool)]) -> Vec<XpShare> {
    if members.is_empty() {
        return Vec::new();
    }

    let extras = (members.len().saturating_sub(1)) as u64;
    let bonus = base_xp
        .saturating_mul(PARTY_BONUS_PER_EXTRA_PCT)
        .saturating_mul(extras)
        / 100;
    let full_share = base_xp.saturating_add(bonus);

    members
        .iter()
        .map(|(member, alive)| XpShare {
            member: *member,
            amount: if *alive { full_share } else { full_share / 2 },
        })
        .collect()
}
