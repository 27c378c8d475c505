//! Target selection decision table
//!
//! A pure, deterministic mapping from attacker category (and cavalry
//! stance) to the enemy unit type that absorbs the attack. No randomness.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::combat::unit_type::{UnitCategory, UnitType};

/// Cavalry commitment posture for a side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CavalryStance {
    /// Cavalry fights in the melee line
    #[default]
    Frontline,
    /// Cavalry is held back and only commits during its charge window
    Reserve,
}

/// Preferred enemy category ordering for an attacker
///
/// Cavalry flanks for the backline; infantry grinds the enemy line;
/// ranged units thin the infantry first; siege trades with enemy siege.
pub fn category_priority(attacker: UnitCategory, stance: CavalryStance) -> [UnitCategory; 4] {
    match (attacker, stance) {
        (UnitCategory::Infantry, _) => [
            UnitCategory::Infantry,
            UnitCategory::Ranged,
            UnitCategory::Cavalry,
            UnitCategory::Siege,
        ],
        (UnitCategory::Cavalry, CavalryStance::Frontline) => [
            UnitCategory::Ranged,
            UnitCategory::Siege,
            UnitCategory::Infantry,
            UnitCategory::Cavalry,
        ],
        (UnitCategory::Cavalry, CavalryStance::Reserve) => [
            UnitCategory::Ranged,
            UnitCategory::Cavalry,
            UnitCategory::Infantry,
            UnitCategory::Siege,
        ],
        (UnitCategory::Ranged, _) => [
            UnitCategory::Infantry,
            UnitCategory::Cavalry,
            UnitCategory::Ranged,
            UnitCategory::Siege,
        ],
        (UnitCategory::Siege, _) => [
            UnitCategory::Siege,
            UnitCategory::Ranged,
            UnitCategory::Infantry,
            UnitCategory::Cavalry,
        ],
    }
}

/// Select the enemy unit type that absorbs this attack
///
/// Walks the category priority order and, within the first category that
/// still has live units, picks the type with the highest live count
/// (declaration order breaks ties). Returns `None` when the enemy side
/// is empty.
pub fn find_target(
    attacker: UnitCategory,
    stance: CavalryStance,
    enemy_counts: &AHashMap<UnitType, u32>,
) -> Option<UnitType> {
    for category in category_priority(attacker, stance) {
        let mut best: Option<(UnitType, u32)> = None;
        for unit in UnitType::ALL {
            if unit.category() != category {
                continue;
            }
            let count = enemy_counts.get(&unit).copied().unwrap_or(0);
            if count == 0 {
                continue;
            }
            match best {
                Some((_, best_count)) if best_count >= count => {}
                _ => best = Some((unit, count)),
            }
        }
        if let Some((unit, _)) = best {
            return Some(unit);
        }
    }
    None
}
