//! Military unit types and their base statistics
//!
//! Every unit type belongs to exactly one category. Category drives phase
//! eligibility, targeting priority, and charge-bonus eligibility.

use serde::{Deserialize, Serialize};

use crate::combat::stats::UnitCombatStats;

/// Broad combat role of a unit type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitCategory {
    Infantry,
    Cavalry,
    Ranged,
    Siege,
}

/// Building where a unit type is trained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrainingBuilding {
    Barracks,
    ArcheryRange,
    Stable,
    SiegeWorkshop,
}

/// Concrete military unit types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitType {
    Swordsman,
    Spearman,
    Archer,
    Crossbowman,
    LightCavalry,
    Knight,
    Catapult,
    Trebuchet,
}

impl UnitType {
    /// All unit types in declaration order (used as a deterministic tie-break)
    pub const ALL: [UnitType; 8] = [
        UnitType::Swordsman,
        UnitType::Spearman,
        UnitType::Archer,
        UnitType::Crossbowman,
        UnitType::LightCavalry,
        UnitType::Knight,
        UnitType::Catapult,
        UnitType::Trebuchet,
    ];

    pub fn category(&self) -> UnitCategory {
        match self {
            UnitType::Swordsman | UnitType::Spearman => UnitCategory::Infantry,
            UnitType::Archer | UnitType::Crossbowman => UnitCategory::Ranged,
            UnitType::LightCavalry | UnitType::Knight => UnitCategory::Cavalry,
            UnitType::Catapult | UnitType::Trebuchet => UnitCategory::Siege,
        }
    }

    pub fn training_building(&self) -> TrainingBuilding {
        match self.category() {
            UnitCategory::Infantry => TrainingBuilding::Barracks,
            UnitCategory::Ranged => TrainingBuilding::ArcheryRange,
            UnitCategory::Cavalry => TrainingBuilding::Stable,
            UnitCategory::Siege => TrainingBuilding::SiegeWorkshop,
        }
    }

    /// Base combat stats for one unit of this type
    pub fn base_stats(&self) -> UnitCombatStats {
        match self {
            UnitType::Swordsman => UnitCombatStats {
                melee_damage: 9.0,
                melee_armor: 2.0,
                pierce_armor: 1.0,
                bludgeon_armor: 1.0,
                ..UnitCombatStats::default()
            },
            UnitType::Spearman => UnitCombatStats {
                melee_damage: 7.0,
                melee_armor: 1.0,
                pierce_armor: 1.0,
                bonus_vs_cavalry: 12.0,
                ..UnitCombatStats::default()
            },
            UnitType::Archer => UnitCombatStats {
                pierce_damage: 6.0,
                pierce_armor: 1.0,
                ..UnitCombatStats::default()
            },
            UnitType::Crossbowman => UnitCombatStats {
                pierce_damage: 9.0,
                melee_armor: 1.0,
                pierce_armor: 2.0,
                ..UnitCombatStats::default()
            },
            UnitType::LightCavalry => UnitCombatStats {
                melee_damage: 8.0,
                melee_armor: 1.0,
                pierce_armor: 1.0,
                ..UnitCombatStats::default()
            },
            UnitType::Knight => UnitCombatStats {
                melee_damage: 12.0,
                melee_armor: 3.0,
                pierce_armor: 2.0,
                bludgeon_armor: 1.0,
                ..UnitCombatStats::default()
            },
            UnitType::Catapult => UnitCombatStats {
                bludgeon_damage: 35.0,
                bludgeon_armor: 3.0,
                bonus_vs_buildings: 80.0,
                ..UnitCombatStats::default()
            },
            UnitType::Trebuchet => UnitCombatStats {
                bludgeon_damage: 50.0,
                bludgeon_armor: 2.0,
                bonus_vs_buildings: 150.0,
                ..UnitCombatStats::default()
            },
        }
    }

    /// Hit points per unit
    pub fn hit_points(&self) -> f64 {
        match self {
            UnitType::Swordsman => 60.0,
            UnitType::Spearman => 55.0,
            UnitType::Archer => 35.0,
            UnitType::Crossbowman => 40.0,
            UnitType::LightCavalry => 70.0,
            UnitType::Knight => 110.0,
            UnitType::Catapult => 80.0,
            UnitType::Trebuchet => 70.0,
        }
    }

    /// Seconds between attacks
    pub fn attack_speed(&self) -> f64 {
        match self {
            UnitType::Swordsman => 1.5,
            UnitType::Spearman => 1.8,
            UnitType::Archer => 2.0,
            UnitType::Crossbowman => 2.5,
            UnitType::LightCavalry => 1.6,
            UnitType::Knight => 1.8,
            UnitType::Catapult => 6.0,
            UnitType::Trebuchet => 10.0,
        }
    }
}
