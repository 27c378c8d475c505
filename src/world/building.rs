//! Building entities as combat targets

use serde::{Deserialize, Serialize};

use crate::combat::garrison::GarrisonOutput;
use crate::combat::stats::UnitCombatStats;
use crate::core::types::{BuildingId, HexCoord};

/// A building that can be assaulted and may return garrison fire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    pub name: String,
    pub owner: String,
    pub location: HexCoord,
    pub health: f64,
    pub max_health: f64,
    pub melee_armor: f64,
    pub pierce_armor: f64,
    pub bludgeon_armor: f64,
    garrison: Option<GarrisonOutput>,
}

impl Building {
    pub fn new(
        name: impl Into<String>,
        owner: impl Into<String>,
        location: HexCoord,
        max_health: f64,
    ) -> Self {
        Self {
            id: BuildingId::new(),
            name: name.into(),
            owner: owner.into(),
            location,
            health: max_health,
            max_health,
            melee_armor: 8.0,
            pierce_armor: 20.0,
            bludgeon_armor: 2.0,
            garrison: None,
        }
    }

    pub fn with_garrison(mut self, output: GarrisonOutput) -> Self {
        self.garrison = Some(output);
        self
    }

    pub fn take_damage(&mut self, amount: f64) {
        self.health = (self.health - amount.max(0.0)).max(0.0);
    }

    pub fn is_destroyed(&self) -> bool {
        self.health <= 0.0
    }

    /// Defensive fire from garrisoned units, if any remain standing
    pub fn garrison_output(&self) -> Option<GarrisonOutput> {
        if self.is_destroyed() {
            None
        } else {
            self.garrison
        }
    }

    /// Armor profile used by the damage formula (no damage channels)
    pub fn combat_armor(&self) -> UnitCombatStats {
        UnitCombatStats {
            melee_armor: self.melee_armor,
            pierce_armor: self.pierce_armor,
            bludgeon_armor: self.bludgeon_armor,
            ..UnitCombatStats::default()
        }
    }
}
