//! Garrison defensive fire
//!
//! A one-shot calculation, not a per-tick simulation: a garrisoned
//! building splits its pierce and bludgeon output evenly across every
//! army attacking its tile, and the weakest-armored units die first.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::combat::stats::DamageType;
use crate::combat::unit_type::UnitType;
use crate::world::army::Army;

/// Damage output of a defensive garrison, per volley
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GarrisonOutput {
    pub pierce: f64,
    pub bludgeon: f64,
}

impl GarrisonOutput {
    pub fn total(&self) -> f64 {
        self.pierce + self.bludgeon
    }
}

/// Resolve one garrison volley against the attacking armies
///
/// Each damage channel is split evenly across the armies. Within one
/// army, unit types are killed in ascending order of the channel's
/// armor: `floor(max(1, pool - armor) / hp)` whole-unit kills, capped at
/// the live count, until the pool or the army is exhausted. Returns the
/// per-army kill tallies.
pub fn resolve_garrison_defense(
    output: GarrisonOutput,
    attackers: &mut [&mut Army],
) -> Vec<AHashMap<UnitType, u32>> {
    let mut results: Vec<AHashMap<UnitType, u32>> = vec![AHashMap::new(); attackers.len()];
    if attackers.is_empty() || output.total() <= 0.0 {
        return results;
    }

    let share = attackers.len() as f64;
    for (army, kills) in attackers.iter_mut().zip(results.iter_mut()) {
        apply_channel(army, DamageType::Pierce, output.pierce / share, kills);
        apply_channel(army, DamageType::Bludgeon, output.bludgeon / share, kills);
    }

    results
}

fn apply_channel(
    army: &mut Army,
    channel: DamageType,
    pool: f64,
    kills: &mut AHashMap<UnitType, u32>,
) {
    if pool <= 0.0 {
        return;
    }

    // Weakest-armored types absorb the volley first
    let mut types: Vec<UnitType> = UnitType::ALL
        .into_iter()
        .filter(|&t| army.unit_count(t) > 0)
        .collect();
    types.sort_by(|a, b| {
        a.base_stats()
            .armor(channel)
            .total_cmp(&b.base_stats().armor(channel))
    });

    let mut pool = pool;
    for unit in types {
        let live = army.unit_count(unit);
        let armor = unit.base_stats().armor(channel);
        let hp = unit.hit_points();

        let effective = (pool - armor).max(1.0);
        let killed = ((effective / hp).floor() as u32).min(live);
        if killed == 0 {
            // Too durable for the remaining pool; later types may still die
            continue;
        }

        army.remove_units(unit, killed);
        *kills.entry(unit).or_insert(0) += killed;
        pool = effective - f64::from(killed) * hp;
        if pool <= 0.0 {
            break;
        }
    }
}
