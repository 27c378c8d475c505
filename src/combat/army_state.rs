//! Per-army state within a side, and proportional distribution
//!
//! A side may contain several armies (the originator plus reinforcements).
//! The engine holds army ids, never references; sums of per-army counts
//! must equal the side-level counts for every unit type.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::combat::unit_type::UnitType;
use crate::core::types::{ArmyId, Seconds};
use crate::world::army::Army;

/// One army's share of a side's combat state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmyCombatState {
    pub army_id: ArmyId,
    pub army_name: String,
    pub owner: String,
    pub commander_name: Option<String>,
    /// Leadership bonus captured once when the army enters combat
    pub commander_bonus: f64,
    pub initial_composition: AHashMap<UnitType, u32>,
    pub current_units: AHashMap<UnitType, u32>,
    pub casualties_by_type: AHashMap<UnitType, u32>,
    pub damage_dealt_by_type: AHashMap<UnitType, f64>,
    /// Elapsed combat time when this army joined (0 for the originator)
    pub join_time: Seconds,
    /// When this army began melee participation; None until melee starts
    pub melee_start: Option<Seconds>,
    /// Cleared when this army concedes by retreating; carried into the
    /// historical record, never consulted by tick eligibility (a retreat
    /// ends the whole combat immediately)
    pub is_active: bool,
}

impl ArmyCombatState {
    pub fn new(army: &Army, join_time: Seconds) -> Self {
        let composition = army.composition().clone();
        Self {
            army_id: army.id,
            army_name: army.name.clone(),
            owner: army.owner.clone(),
            commander_name: army.commander.as_ref().map(|c| c.name.clone()),
            commander_bonus: army
                .commander
                .as_ref()
                .map(|c| c.leadership_bonus)
                .unwrap_or(0.0),
            initial_composition: composition.clone(),
            current_units: composition,
            casualties_by_type: AHashMap::new(),
            damage_dealt_by_type: AHashMap::new(),
            join_time,
            melee_start: None,
            is_active: true,
        }
    }

    pub fn live_count(&self, unit: UnitType) -> u32 {
        self.current_units.get(&unit).copied().unwrap_or(0)
    }

    pub fn total_units(&self) -> u32 {
        self.current_units.values().sum()
    }

    pub fn total_casualties(&self) -> u32 {
        self.casualties_by_type.values().sum()
    }

    pub fn record_casualties(&mut self, unit: UnitType, count: u32) {
        if count == 0 {
            return;
        }
        let live = self.live_count(unit);
        debug_assert!(count <= live, "casualties exceed live count");
        self.current_units.insert(unit, live.saturating_sub(count));
        *self.casualties_by_type.entry(unit).or_insert(0) += count;
    }

    pub fn track_damage_dealt(&mut self, unit: UnitType, amount: f64) {
        *self.damage_dealt_by_type.entry(unit).or_insert(0.0) += amount;
    }
}

/// Distribute side-level casualties of one type across armies
///
/// Each army takes `floor(kills * share)` where share is its fraction of
/// the side's live units of that type; the rounding remainder goes one
/// unit at a time to the first armies that still have units, so per-army
/// casualties always sum exactly to `kills`.
pub fn distribute_casualties(armies: &mut [ArmyCombatState], unit: UnitType, kills: u32) {
    if kills == 0 {
        return;
    }

    let total_live: u32 = armies.iter().map(|a| a.live_count(unit)).sum();
    if total_live == 0 {
        return;
    }
    let kills = kills.min(total_live);

    let mut assigned = 0u32;
    let mut per_army: Vec<u32> = Vec::with_capacity(armies.len());
    for army in armies.iter() {
        let share =
            (u64::from(kills) * u64::from(army.live_count(unit)) / u64::from(total_live)) as u32;
        per_army.push(share);
        assigned += share;
    }

    // Hand out the rounding remainder to whoever still has units
    let mut remainder = kills - assigned;
    for (idx, army) in armies.iter().enumerate() {
        if remainder == 0 {
            break;
        }
        let headroom = army.live_count(unit).saturating_sub(per_army[idx]);
        let extra = headroom.min(remainder);
        per_army[idx] += extra;
        remainder -= extra;
    }

    for (army, &count) in armies.iter_mut().zip(per_army.iter()) {
        army.record_casualties(unit, count);
    }
}

/// Credit side-level damage output of one attacking type to its armies
///
/// Proportional to each army's share of the side's live units of that
/// type; armies with no such units get no credit.
pub fn distribute_damage_credit(armies: &mut [ArmyCombatState], unit: UnitType, damage: f64) {
    let total_live: u32 = armies.iter().map(|a| a.live_count(unit)).sum();
    if total_live == 0 || damage <= 0.0 {
        return;
    }

    for army in armies.iter_mut() {
        let live = army.live_count(unit);
        if live > 0 {
            army.track_damage_dealt(unit, damage * f64::from(live) / f64::from(total_live));
        }
    }
}
