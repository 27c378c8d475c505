//! Single-shot (non-phased) combat resolution
//!
//! Field skirmishes, building assaults and villager raids resolve in one
//! call instead of ticking through phases. The winner rule here is the
//! damage-differential one: whichever side puts out more total modified
//! damage wins, with a draw band for close exchanges. Losses are
//! asymmetric: the loser bleeds half again as hard as the base rate, the
//! winner half as hard.

use ahash::AHashMap;

use crate::combat::garrison::resolve_garrison_defense;
use crate::combat::modifiers::{modified_stats, ResearchModifiers};
use crate::combat::record::CombatWinner;
use crate::combat::stats::{calculate_damage_by_type, UnitCombatStats};
use crate::combat::terrain::TerrainType;
use crate::combat::unit_type::UnitType;
use crate::core::config::CombatConfig;
use crate::world::army::Army;
use crate::world::building::Building;
use crate::world::villagers::{VillagerGroup, VILLAGER_HP};

const WINNER_LOSS_SCALE: f64 = 0.5;
const LOSER_LOSS_SCALE: f64 = 1.5;

/// Result of an instant field combat
#[derive(Debug, Clone)]
pub struct InstantOutcome {
    pub winner: CombatWinner,
    pub attacker_damage: f64,
    pub defender_damage: f64,
    pub attacker_losses: AHashMap<UnitType, u32>,
    pub defender_losses: AHashMap<UnitType, u32>,
}

/// Result of an instant building assault
#[derive(Debug, Clone)]
pub struct AssaultOutcome {
    pub damage_to_building: f64,
    pub building_destroyed: bool,
    /// Attacker casualties from garrison counter-fire
    pub attacker_losses: AHashMap<UnitType, u32>,
}

/// Resolve a field combat between two armies in a single exchange
///
/// Does not mutate the armies; the caller applies the returned losses.
pub fn resolve_field_combat(
    attacker: &Army,
    defender: &Army,
    terrain: TerrainType,
    config: &CombatConfig,
    research: &dyn ResearchModifiers,
) -> InstantOutcome {
    let modifier = terrain.modifier();

    let attacker_damage = side_damage(attacker, defender, research) * modifier.attacker_attack;
    let defender_damage = side_damage(defender, attacker, research) * modifier.defender_defense;

    let winner = damage_winner(attacker_damage, defender_damage, config.instant_draw_threshold);

    let attacker_base = loss_fraction(defender_damage, attacker);
    let defender_base = loss_fraction(attacker_damage, defender);
    let (attacker_scale, defender_scale) = match winner {
        CombatWinner::Attacker => (WINNER_LOSS_SCALE, LOSER_LOSS_SCALE),
        CombatWinner::Defender => (LOSER_LOSS_SCALE, WINNER_LOSS_SCALE),
        CombatWinner::Draw => (1.0, 1.0),
    };

    InstantOutcome {
        winner,
        attacker_damage,
        defender_damage,
        attacker_losses: losses(attacker, (attacker_base * attacker_scale).min(1.0)),
        defender_losses: losses(defender, (defender_base * defender_scale).min(1.0)),
    }
}

/// Resolve one army assaulting a building
///
/// A live garrison fires its counter-volley first; the survivors then
/// batter the walls. Mutates both the army and the building.
pub fn resolve_building_assault(
    attacker: &mut Army,
    building: &mut Building,
    research: &dyn ResearchModifiers,
) -> AssaultOutcome {
    let mut attacker_losses = AHashMap::new();
    if let Some(output) = building.garrison_output() {
        let mut results = resolve_garrison_defense(output, &mut [attacker]);
        if let Some(kills) = results.pop() {
            attacker_losses = kills;
        }
    }

    let walls = building
        .combat_armor()
        .with_armor_scaled(research.building_armor_multiplier());
    let damage: f64 = attacker
        .composition()
        .iter()
        .map(|(&unit, &count)| {
            f64::from(count)
                * calculate_damage_by_type(&modified_stats(unit, research), &walls, None, true)
        })
        .sum();

    building.take_damage(damage);

    AssaultOutcome {
        damage_to_building: damage,
        building_destroyed: building.is_destroyed(),
        attacker_losses,
    }
}

/// Resolve one army raiding an unarmed villager group
///
/// Returns the number of villagers killed. Mutates the group.
pub fn resolve_villager_raid(
    attacker: &Army,
    villagers: &mut VillagerGroup,
    research: &dyn ResearchModifiers,
) -> u32 {
    let unarmored = UnitCombatStats::default();
    let damage: f64 = attacker
        .composition()
        .iter()
        .map(|(&unit, &count)| {
            f64::from(count)
                * calculate_damage_by_type(&modified_stats(unit, research), &unarmored, None, false)
        })
        .sum();

    let kills = ((damage / VILLAGER_HP).floor() as u32).min(villagers.count());
    villagers.remove_villagers(kills)
}

/// Total modified damage one army puts out against the other's average profile
fn side_damage(army: &Army, enemy: &Army, research: &dyn ResearchModifiers) -> f64 {
    let enemy_avg = average_stats(enemy, research);
    let commander = 1.0
        + army
            .commander
            .as_ref()
            .map(|c| c.leadership_bonus)
            .unwrap_or(0.0);

    let raw: f64 = army
        .composition()
        .iter()
        .map(|(&unit, &count)| {
            f64::from(count)
                * calculate_damage_by_type(&modified_stats(unit, research), &enemy_avg, None, false)
        })
        .sum();

    raw * commander
}

fn damage_winner(attacker: f64, defender: f64, threshold: f64) -> CombatWinner {
    let larger = attacker.max(defender);
    if larger <= 0.0 {
        return CombatWinner::Draw;
    }
    if (attacker - defender).abs() / larger <= threshold {
        CombatWinner::Draw
    } else if attacker > defender {
        CombatWinner::Attacker
    } else {
        CombatWinner::Defender
    }
}

/// Fraction of an army killed by a given incoming damage total
fn loss_fraction(incoming: f64, army: &Army) -> f64 {
    let total_hp: f64 = army
        .composition()
        .iter()
        .map(|(&unit, &count)| f64::from(count) * unit.hit_points())
        .sum();
    if total_hp <= 0.0 {
        return 0.0;
    }
    (incoming / total_hp).clamp(0.0, 1.0)
}

fn losses(army: &Army, fraction: f64) -> AHashMap<UnitType, u32> {
    army.composition()
        .iter()
        .map(|(&unit, &count)| {
            let lost = ((f64::from(count) * fraction).floor() as u32).min(count);
            (unit, lost)
        })
        .filter(|&(_, lost)| lost > 0)
        .collect()
}

/// Count-weighted mean stat profile of an army (research applied)
fn average_stats(army: &Army, research: &dyn ResearchModifiers) -> UnitCombatStats {
    let total: u32 = army.total_units();
    if total == 0 {
        return UnitCombatStats::default();
    }

    let sum = UnitCombatStats::aggregate(
        army.composition()
            .iter()
            .map(|(&unit, &count)| scale(&modified_stats(unit, research), f64::from(count))),
    );
    scale(&sum, 1.0 / f64::from(total))
}

fn scale(stats: &UnitCombatStats, factor: f64) -> UnitCombatStats {
    UnitCombatStats {
        melee_damage: stats.melee_damage * factor,
        pierce_damage: stats.pierce_damage * factor,
        bludgeon_damage: stats.bludgeon_damage * factor,
        melee_armor: stats.melee_armor * factor,
        pierce_armor: stats.pierce_armor * factor,
        bludgeon_armor: stats.bludgeon_armor * factor,
        bonus_vs_cavalry: stats.bonus_vs_cavalry * factor,
        bonus_vs_buildings: stats.bonus_vs_buildings * factor,
    }
}
