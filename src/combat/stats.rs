//! Per-unit combat statistics and the damage formula
//!
//! Damage is resolved per channel (melee, pierce, bludgeon) against the
//! matching armor, with a floor of 1 per active channel so over-armored
//! defenders can never stall a fight.

use serde::{Deserialize, Serialize};

use crate::combat::unit_type::UnitCategory;

/// The three damage channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    Melee,
    Pierce,
    Bludgeon,
}

impl DamageType {
    pub const ALL: [DamageType; 3] = [DamageType::Melee, DamageType::Pierce, DamageType::Bludgeon];
}

/// Damage and armor values for a single unit
///
/// Aggregation across many units is an element-wise sum. All fields are
/// non-negative by construction.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct UnitCombatStats {
    pub melee_damage: f64,
    pub pierce_damage: f64,
    pub bludgeon_damage: f64,
    pub melee_armor: f64,
    pub pierce_armor: f64,
    pub bludgeon_armor: f64,
    pub bonus_vs_cavalry: f64,
    pub bonus_vs_buildings: f64,
}

impl UnitCombatStats {
    pub fn damage(&self, channel: DamageType) -> f64 {
        match channel {
            DamageType::Melee => self.melee_damage,
            DamageType::Pierce => self.pierce_damage,
            DamageType::Bludgeon => self.bludgeon_damage,
        }
    }

    pub fn armor(&self, channel: DamageType) -> f64 {
        match channel {
            DamageType::Melee => self.melee_armor,
            DamageType::Pierce => self.pierce_armor,
            DamageType::Bludgeon => self.bludgeon_armor,
        }
    }

    /// Element-wise sum with another stat block
    pub fn add(&self, other: &Self) -> Self {
        Self {
            melee_damage: self.melee_damage + other.melee_damage,
            pierce_damage: self.pierce_damage + other.pierce_damage,
            bludgeon_damage: self.bludgeon_damage + other.bludgeon_damage,
            melee_armor: self.melee_armor + other.melee_armor,
            pierce_armor: self.pierce_armor + other.pierce_armor,
            bludgeon_armor: self.bludgeon_armor + other.bludgeon_armor,
            bonus_vs_cavalry: self.bonus_vs_cavalry + other.bonus_vs_cavalry,
            bonus_vs_buildings: self.bonus_vs_buildings + other.bonus_vs_buildings,
        }
    }

    /// Aggregate stats across a collection of units
    pub fn aggregate<I>(stats: I) -> Self
    where
        I: IntoIterator<Item = UnitCombatStats>,
    {
        stats
            .into_iter()
            .fold(Self::default(), |acc, s| acc.add(&s))
    }

    /// Scale all damage channels (research attack multipliers)
    pub fn with_attack_scaled(&self, multiplier: f64) -> Self {
        Self {
            melee_damage: self.melee_damage * multiplier,
            pierce_damage: self.pierce_damage * multiplier,
            bludgeon_damage: self.bludgeon_damage * multiplier,
            ..*self
        }
    }

    /// Scale all armor channels (research armor multipliers)
    pub fn with_armor_scaled(&self, multiplier: f64) -> Self {
        Self {
            melee_armor: self.melee_armor * multiplier,
            pierce_armor: self.pierce_armor * multiplier,
            bludgeon_armor: self.bludgeon_armor * multiplier,
            ..*self
        }
    }
}

/// Per-attack damage of one attacking unit against one defending unit
///
/// Each damage channel the attacker actually has contributes at least 1
/// after armor subtraction, and the overall result is floored at 1, so
/// every resolved attack makes forward progress.
pub fn calculate_damage_by_type(
    attacker: &UnitCombatStats,
    defender: &UnitCombatStats,
    defender_category: Option<UnitCategory>,
    is_building: bool,
) -> f64 {
    let mut total = 0.0;

    for channel in DamageType::ALL {
        let damage = attacker.damage(channel);
        if damage > 0.0 {
            total += (damage - defender.armor(channel)).max(1.0);
        }
    }

    if defender_category == Some(UnitCategory::Cavalry) {
        total += attacker.bonus_vs_cavalry;
    }

    if is_building {
        total += attacker.bonus_vs_buildings;
    }

    total.max(1.0)
}
