//! Host-side army entities and the registry the engine resolves ids through
//!
//! The combat engine only ever holds `ArmyId`s; a destroyed army simply
//! disappears from the registry and finalize skips its sync.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::combat::unit_type::UnitType;
use crate::core::types::{ArmyId, HexCoord};

/// A commander attached to an army
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commander {
    pub name: String,
    /// Additive damage bonus for the army's side, e.g. 0.1 for +10%
    pub leadership_bonus: f64,
    pub experience: f64,
}

impl Commander {
    pub fn new(name: impl Into<String>, leadership_bonus: f64) -> Self {
        Self {
            name: name.into(),
            leadership_bonus,
            experience: 0.0,
        }
    }

    pub fn award_experience(&mut self, amount: f64) {
        self.experience += amount;
    }
}

/// A named, owned group of military units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Army {
    pub id: ArmyId,
    pub name: String,
    pub owner: String,
    pub commander: Option<Commander>,
    pub location: HexCoord,
    units: AHashMap<UnitType, u32>,
}

impl Army {
    pub fn new(name: impl Into<String>, owner: impl Into<String>, location: HexCoord) -> Self {
        Self {
            id: ArmyId::new(),
            name: name.into(),
            owner: owner.into(),
            commander: None,
            location,
            units: AHashMap::new(),
        }
    }

    pub fn with_commander(mut self, commander: Commander) -> Self {
        self.commander = Some(commander);
        self
    }

    pub fn add_units(&mut self, unit: UnitType, count: u32) {
        if count > 0 {
            *self.units.entry(unit).or_insert(0) += count;
        }
    }

    /// Remove up to `count` units of a type, returning how many were removed
    pub fn remove_units(&mut self, unit: UnitType, count: u32) -> u32 {
        let live = self.unit_count(unit);
        let removed = live.min(count);
        if removed > 0 {
            let remaining = live - removed;
            if remaining == 0 {
                self.units.remove(&unit);
            } else {
                self.units.insert(unit, remaining);
            }
        }
        removed
    }

    /// Replace the whole composition (post-combat survivor sync)
    pub fn set_units(&mut self, units: AHashMap<UnitType, u32>) {
        self.units = units.into_iter().filter(|&(_, count)| count > 0).collect();
    }

    pub fn unit_count(&self, unit: UnitType) -> u32 {
        self.units.get(&unit).copied().unwrap_or(0)
    }

    pub fn total_units(&self) -> u32 {
        self.units.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_units() == 0
    }

    pub fn composition(&self) -> &AHashMap<UnitType, u32> {
        &self.units
    }
}

/// Owning map of live armies, keyed by id
#[derive(Debug, Default)]
pub struct ArmyRegistry {
    armies: AHashMap<ArmyId, Army>,
}

impl ArmyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, army: Army) -> ArmyId {
        let id = army.id;
        self.armies.insert(id, army);
        id
    }

    pub fn get(&self, id: ArmyId) -> Option<&Army> {
        self.armies.get(&id)
    }

    pub fn get_mut(&mut self, id: ArmyId) -> Option<&mut Army> {
        self.armies.get_mut(&id)
    }

    pub fn remove(&mut self, id: ArmyId) -> Option<Army> {
        self.armies.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.armies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armies.is_empty()
    }
}
