//! Per-side aggregate combat state
//!
//! A side is one coalition (attacker or defender), possibly several
//! armies. The side-level unit counts are the authoritative live totals;
//! per-army states must always sum to them.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::combat::targeting::CavalryStance;
use crate::combat::unit_type::UnitType;

/// Which coalition of a combat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Attacker,
    Defender,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Attacker => Side::Defender,
            Side::Defender => Side::Attacker,
        }
    }
}

/// Aggregate mutable state for one side of a combat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SideCombatState {
    /// Live unit counts, mutated each tick; only ever decreases
    pub unit_counts: AHashMap<UnitType, u32>,
    /// Snapshot at combat start, grown when reinforcements merge in
    pub initial_composition: AHashMap<UnitType, u32>,
    /// Cumulative damage dealt, keyed by the attacking unit type
    pub damage_dealt_by_type: AHashMap<UnitType, f64>,
    /// Cumulative damage received, keyed by the absorbing unit type
    pub damage_received_by_type: AHashMap<UnitType, f64>,
    pub cavalry_stance: CavalryStance,
    /// Sub-lethal damage carried between ticks, per target type
    ///
    /// Kills are whole units; damage that does not complete a kill this
    /// tick pools here instead of vanishing.
    damage_pool: AHashMap<UnitType, f64>,
}

impl SideCombatState {
    pub fn from_composition(
        composition: AHashMap<UnitType, u32>,
        cavalry_stance: CavalryStance,
    ) -> Self {
        Self {
            unit_counts: composition.clone(),
            initial_composition: composition,
            damage_dealt_by_type: AHashMap::new(),
            damage_received_by_type: AHashMap::new(),
            cavalry_stance,
            damage_pool: AHashMap::new(),
        }
    }

    pub fn live_count(&self, unit: UnitType) -> u32 {
        self.unit_counts.get(&unit).copied().unwrap_or(0)
    }

    pub fn total_units(&self) -> u32 {
        self.unit_counts.values().sum()
    }

    pub fn total_initial(&self) -> u32 {
        self.initial_composition.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_units() == 0
    }

    /// Merge a reinforcement's composition into the side totals
    pub fn merge_reinforcement(&mut self, composition: &AHashMap<UnitType, u32>) {
        for (&unit, &count) in composition {
            *self.unit_counts.entry(unit).or_insert(0) += count;
            *self.initial_composition.entry(unit).or_insert(0) += count;
        }
    }

    /// Apply a damage pool to one target type, killing whole units
    ///
    /// Kills are `floor(pooled / hp)` capped at the live count; the pool
    /// remainder carries to the next tick, and drops to zero once the
    /// target type is wiped out.
    pub fn apply_damage(&mut self, target: UnitType, damage: f64) -> u32 {
        let live = self.live_count(target);
        if live == 0 || damage <= 0.0 {
            return 0;
        }

        let hp = target.hit_points();
        let pool = self.damage_pool.entry(target).or_insert(0.0);
        *pool += damage;

        let kills = ((*pool / hp).floor() as u32).min(live);
        *pool -= f64::from(kills) * hp;

        let remaining = live - kills;
        self.unit_counts.insert(target, remaining);
        if remaining == 0 {
            self.damage_pool.insert(target, 0.0);
        }

        kills
    }

    pub fn track_damage_dealt(&mut self, attacker: UnitType, amount: f64) {
        *self.damage_dealt_by_type.entry(attacker).or_insert(0.0) += amount;
    }

    pub fn track_damage_received(&mut self, target: UnitType, amount: f64) {
        *self.damage_received_by_type.entry(target).or_insert(0.0) += amount;
    }

    /// Casualties per type since combat start (or last reinforcement merge)
    pub fn casualties_by_type(&self) -> AHashMap<UnitType, u32> {
        self.initial_composition
            .iter()
            .map(|(&unit, &initial)| (unit, initial.saturating_sub(self.live_count(unit))))
            .filter(|&(_, lost)| lost > 0)
            .collect()
    }

    pub fn total_casualties(&self) -> u32 {
        self.casualties_by_type().values().sum()
    }
}
