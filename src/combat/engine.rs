//! The combat engine: owns active combats, drives ticks, finalizes
//!
//! One engine instance per game session, constructor-injected into the
//! host loop. The engine never holds army references, only ids resolved
//! through the caller's `ArmyRegistry` at finalize time.

use tracing::{debug, info, warn};

use crate::combat::active::ActiveCombat;
use crate::combat::army_state::{distribute_casualties, distribute_damage_credit, ArmyCombatState};
use crate::combat::events::CombatObserver;
use crate::combat::instant;
use crate::combat::modifiers::{modified_stats, NoResearch, ResearchModifiers};
use crate::combat::record::{
    ArmyBreakdown, CombatHistory, CombatRecord, CombatWinner, DetailedCombatRecord, Participant,
    ParticipantKind,
};
use crate::combat::side::Side;
use crate::combat::stats::calculate_damage_by_type;
use crate::combat::targeting::{find_target, CavalryStance};
use crate::combat::terrain::{FlatWorld, TerrainSource};
use crate::combat::unit_type::UnitType;
use crate::core::config::CombatConfig;
use crate::core::error::{CombatError, Result};
use crate::core::types::{ArmyId, CombatId, HexCoord, Seconds};
use crate::world::army::{Army, ArmyRegistry};
use crate::world::building::Building;
use crate::world::villagers::VillagerGroup;

/// Orchestrates all active combats for one game session
pub struct CombatEngine {
    config: CombatConfig,
    research: Box<dyn ResearchModifiers>,
    terrain: Box<dyn TerrainSource>,
    active: Vec<ActiveCombat>,
    history: CombatHistory,
    observers: Vec<Box<dyn CombatObserver>>,
}

impl CombatEngine {
    pub fn new(config: CombatConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            research: Box::new(NoResearch),
            terrain: Box::new(FlatWorld),
            active: Vec::new(),
            history: CombatHistory::new(),
            observers: Vec::new(),
        })
    }

    /// Swap in the host's research modifier source
    pub fn with_research(mut self, research: Box<dyn ResearchModifiers>) -> Self {
        self.research = research;
        self
    }

    /// Swap in the host's terrain lookup
    pub fn with_terrain(mut self, terrain: Box<dyn TerrainSource>) -> Self {
        self.terrain = terrain;
        self
    }

    pub fn add_observer(&mut self, observer: Box<dyn CombatObserver>) {
        self.observers.push(observer);
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    /// Start a phased combat at the defender's location
    pub fn start_phased_combat(&mut self, attacker: &Army, defender: &Army) -> Result<CombatId> {
        if self.is_army_in_combat(attacker.id) {
            return Err(CombatError::AlreadyInCombat(attacker.id));
        }
        if self.is_army_in_combat(defender.id) {
            return Err(CombatError::AlreadyInCombat(defender.id));
        }

        let terrain = self.terrain.terrain_at(defender.location);
        let combat = ActiveCombat::new(attacker, defender, terrain);
        let id = combat.id;
        info!(
            combat = ?id,
            attacker = %attacker.name,
            defender = %defender.name,
            ?terrain,
            "phased combat started"
        );
        self.active.push(combat);

        let Self {
            active, observers, ..
        } = self;
        if let Some(combat) = active.last() {
            for observer in observers.iter_mut() {
                observer.combat_started(combat);
            }
        }

        Ok(id)
    }

    /// Start a phased combat between two armies known only by id
    pub fn start_phased_combat_by_id(
        &mut self,
        attacker_id: ArmyId,
        defender_id: ArmyId,
        registry: &ArmyRegistry,
    ) -> Result<CombatId> {
        let attacker = registry
            .get(attacker_id)
            .ok_or(CombatError::ArmyNotFound(attacker_id))?;
        let defender = registry
            .get(defender_id)
            .ok_or(CombatError::ArmyNotFound(defender_id))?;
        self.start_phased_combat(attacker, defender)
    }

    /// Set a side's cavalry stance for a running combat
    pub fn set_cavalry_stance(
        &mut self,
        combat_id: CombatId,
        side: Side,
        stance: CavalryStance,
    ) -> Result<()> {
        let combat = self
            .active
            .iter_mut()
            .find(|c| c.id == combat_id)
            .ok_or(CombatError::CombatNotFound(combat_id))?;
        combat.side_state_mut(side).cavalry_stance = stance;
        Ok(())
    }

    /// Combat an army moving into `location` would join, if any
    pub fn find_combat_to_join(&self, location: HexCoord) -> Option<CombatId> {
        self.active
            .iter()
            .find(|c| c.location == location && !c.phase.is_terminal())
            .map(|c| c.id)
    }

    pub fn combat_at(&self, location: HexCoord) -> Option<&ActiveCombat> {
        self.active
            .iter()
            .find(|c| c.location == location && !c.phase.is_terminal())
    }

    pub fn get_combat(&self, combat_id: CombatId) -> Option<&ActiveCombat> {
        self.active.iter().find(|c| c.id == combat_id)
    }

    pub fn active_combats(&self) -> &[ActiveCombat] {
        &self.active
    }

    pub fn is_army_in_combat(&self, army_id: ArmyId) -> bool {
        self.active
            .iter()
            .any(|c| !c.phase.is_terminal() && c.involves_army(army_id))
    }

    /// Which side a joining army belongs on: same owner as an existing
    /// attacker joins the attackers, same owner as a defender joins the
    /// defenders, otherwise default to the attacker side.
    pub fn should_join_as_attacker(combat: &ActiveCombat, owner: &str) -> bool {
        if combat.attacker_armies.iter().any(|a| a.owner == owner) {
            true
        } else {
            !combat.defender_armies.iter().any(|a| a.owner == owner)
        }
    }

    /// Merge an army into a running combat as a reinforcement
    pub fn join_combat(&mut self, combat_id: CombatId, army: &Army) -> Result<Side> {
        if self.is_army_in_combat(army.id) {
            return Err(CombatError::AlreadyInCombat(army.id));
        }
        let combat = self
            .active
            .iter_mut()
            .find(|c| c.id == combat_id && !c.phase.is_terminal())
            .ok_or(CombatError::CombatNotFound(combat_id))?;

        let side = if Self::should_join_as_attacker(combat, &army.owner) {
            Side::Attacker
        } else {
            Side::Defender
        };
        combat.add_reinforcement(army, side);
        info!(
            combat = ?combat_id,
            army = %army.name,
            ?side,
            join_time = combat.elapsed,
            "reinforcement joined"
        );
        Ok(side)
    }

    /// Pull an army out, conceding the combat to the opposing side
    ///
    /// The combat ends immediately and is swept up (states synced back to
    /// the armies) on the next `update_combats` pass.
    pub fn retreat(&mut self, army_id: ArmyId) -> Result<()> {
        let combat = self
            .active
            .iter_mut()
            .find(|c| !c.phase.is_terminal() && c.involves_army(army_id))
            .ok_or(CombatError::NotInCombat(army_id))?;
        let side = combat
            .side_of(army_id)
            .ok_or(CombatError::NotInCombat(army_id))?;

        if let Some(state) = combat
            .armies_mut(side)
            .iter_mut()
            .find(|a| a.army_id == army_id)
        {
            state.is_active = false;
        }

        let winner = match side.opponent() {
            Side::Attacker => CombatWinner::Attacker,
            Side::Defender => CombatWinner::Defender,
        };
        info!(combat = ?combat.id, ?side, "army retreated");
        combat.force_end(winner);
        Ok(())
    }

    /// Advance every active combat by one tick
    ///
    /// Damage is resolved simultaneously: both directions are computed
    /// from the pre-tick unit counts before either side's casualties are
    /// committed. Ended combats are finalized and removed.
    pub fn update_combats(&mut self, dt: Seconds, registry: &mut ArmyRegistry) {
        for combat in &mut self.active {
            if combat.phase.is_terminal() {
                continue;
            }
            combat.elapsed += dt;
            simulate_combat_tick(combat, &self.config, self.research.as_ref(), dt);
            combat.update_phase(&self.config);
            debug!(
                combat = ?combat.id,
                elapsed = combat.elapsed,
                phase = ?combat.phase,
                attackers = combat.attacker_state.total_units(),
                defenders = combat.defender_state.total_units(),
                "combat tick"
            );
        }

        let Self {
            active, observers, ..
        } = self;
        for combat in active.iter() {
            for observer in observers.iter_mut() {
                observer.combat_updated(combat);
            }
        }

        let mut index = 0;
        while index < self.active.len() {
            if self.active[index].phase.is_terminal() {
                let combat = self.active.remove(index);
                self.finalize_combat(combat, registry);
            } else {
                index += 1;
            }
        }
    }

    pub fn history(&self) -> &CombatHistory {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Resolve a one-shot field combat and record it
    ///
    /// Applies losses to both armies directly; no phased state is created.
    pub fn resolve_field_combat(&mut self, attacker: &mut Army, defender: &mut Army) -> CombatRecord {
        let terrain = self.terrain.terrain_at(defender.location);
        let outcome = instant::resolve_field_combat(
            attacker,
            defender,
            terrain,
            &self.config,
            self.research.as_ref(),
        );

        let attacker_initial = attacker.total_units();
        let defender_initial = defender.total_units();
        for (&unit, &lost) in &outcome.attacker_losses {
            attacker.remove_units(unit, lost);
        }
        for (&unit, &lost) in &outcome.defender_losses {
            defender.remove_units(unit, lost);
        }
        self.award_instant_experience(outcome.winner, attacker, defender);

        let record = CombatRecord {
            combat_id: CombatId::new(),
            location: defender.location,
            terrain,
            attackers: vec![army_participant(attacker, attacker_initial)],
            defenders: vec![army_participant(defender, defender_initial)],
            winner: outcome.winner,
            duration: 0.0,
        };
        info!(winner = ?outcome.winner, "instant field combat resolved");
        self.record_instant(record.clone());
        record
    }

    /// Resolve a one-shot building assault and record it
    pub fn resolve_building_assault(
        &mut self,
        attacker: &mut Army,
        building: &mut Building,
    ) -> CombatRecord {
        let terrain = self.terrain.terrain_at(building.location);
        let attacker_initial = attacker.total_units();
        let health_before = building.health;
        let outcome = instant::resolve_building_assault(attacker, building, self.research.as_ref());

        let winner = if outcome.building_destroyed {
            CombatWinner::Attacker
        } else {
            CombatWinner::Defender
        };
        let record = CombatRecord {
            combat_id: CombatId::new(),
            location: building.location,
            terrain,
            attackers: vec![army_participant(attacker, attacker_initial)],
            defenders: vec![Participant {
                name: building.name.clone(),
                kind: ParticipantKind::Building,
                owner: building.owner.clone(),
                commander: None,
                initial_strength: health_before.round() as u32,
                final_strength: building.health.round() as u32,
                casualties: (health_before - building.health).round() as u32,
            }],
            winner,
            duration: 0.0,
        };
        info!(
            building = %building.name,
            destroyed = outcome.building_destroyed,
            "building assault resolved"
        );
        self.record_instant(record.clone());
        record
    }

    /// Resolve a one-shot villager raid and record it
    pub fn resolve_villager_raid(
        &mut self,
        attacker: &Army,
        villagers: &mut VillagerGroup,
    ) -> CombatRecord {
        let terrain = self.terrain.terrain_at(villagers.location);
        let initial = villagers.count();
        let killed = instant::resolve_villager_raid(attacker, villagers, self.research.as_ref());

        let winner = if killed > 0 {
            CombatWinner::Attacker
        } else {
            CombatWinner::Draw
        };
        let record = CombatRecord {
            combat_id: CombatId::new(),
            location: villagers.location,
            terrain,
            attackers: vec![army_participant(attacker, attacker.total_units())],
            defenders: vec![Participant {
                name: "Villagers".into(),
                kind: ParticipantKind::VillagerGroup,
                owner: villagers.owner.clone(),
                commander: None,
                initial_strength: initial,
                final_strength: villagers.count(),
                casualties: killed,
            }],
            winner,
            duration: 0.0,
        };
        self.record_instant(record.clone());
        record
    }

    fn record_instant(&mut self, summary: CombatRecord) {
        let record = DetailedCombatRecord {
            summary,
            phases: Vec::new(),
            attacker_armies: Vec::new(),
            defender_armies: Vec::new(),
        };
        for observer in self.observers.iter_mut() {
            observer.combat_ended(&record);
        }
        self.history.push(record);
    }

    fn award_instant_experience(
        &self,
        winner: CombatWinner,
        attacker: &mut Army,
        defender: &mut Army,
    ) {
        let (attacker_xp, defender_xp) = match winner {
            CombatWinner::Attacker => (self.config.winner_commander_xp, self.config.loser_commander_xp),
            CombatWinner::Defender => (self.config.loser_commander_xp, self.config.winner_commander_xp),
            CombatWinner::Draw => (self.config.loser_commander_xp, self.config.loser_commander_xp),
        };
        if let Some(commander) = attacker.commander.as_mut() {
            commander.award_experience(attacker_xp);
        }
        if let Some(commander) = defender.commander.as_mut() {
            commander.award_experience(defender_xp);
        }
    }

    /// Sync survivors back into the registry, award experience, record
    ///
    /// The single point where simulation state becomes externally
    /// visible. A missing army is a recoverable condition: its last-known
    /// composition still enters the historical totals.
    fn finalize_combat(&mut self, combat: ActiveCombat, registry: &mut ArmyRegistry) {
        let winner = combat.winner.unwrap_or(CombatWinner::Draw);

        for (side, states) in [
            (Side::Attacker, &combat.attacker_armies),
            (Side::Defender, &combat.defender_armies),
        ] {
            let won = matches!(
                (winner, side),
                (CombatWinner::Attacker, Side::Attacker)
                    | (CombatWinner::Defender, Side::Defender)
            );
            let xp = if won {
                self.config.winner_commander_xp
            } else {
                self.config.loser_commander_xp
            };

            for state in states {
                match registry.get_mut(state.army_id) {
                    Some(army) => {
                        army.set_units(state.current_units.clone());
                        if let Some(commander) = army.commander.as_mut() {
                            commander.award_experience(xp);
                        }
                    }
                    None => {
                        warn!(
                            army = %state.army_name,
                            combat = ?combat.id,
                            "army missing at finalize; skipping survivor sync"
                        );
                    }
                }
            }
        }

        let record = build_record(&combat, winner);
        info!(
            combat = ?combat.id,
            ?winner,
            duration = combat.elapsed,
            attacker_casualties = combat.attacker_state.total_casualties(),
            defender_casualties = combat.defender_state.total_casualties(),
            "combat ended"
        );
        for observer in self.observers.iter_mut() {
            observer.combat_ended(&record);
        }
        self.history.push(record);
    }
}

/// One planned unit-type attack, resolved against pre-tick snapshots
struct PlannedAttack {
    attacker: UnitType,
    target: UnitType,
    damage: f64,
}

/// Compute one tick of simultaneous bidirectional damage exchange
fn simulate_combat_tick(
    combat: &mut ActiveCombat,
    config: &CombatConfig,
    research: &dyn ResearchModifiers,
    dt: Seconds,
) {
    if combat.phase.is_terminal() {
        return;
    }

    // Both directions plan against the same pre-tick snapshots
    let attacker_counts = combat.attacker_state.unit_counts.clone();
    let defender_counts = combat.defender_state.unit_counts.clone();
    let onto_defender =
        plan_side_attacks(combat, Side::Attacker, &defender_counts, config, research, dt);
    let onto_attacker =
        plan_side_attacks(combat, Side::Defender, &attacker_counts, config, research, dt);

    commit_side_attacks(combat, Side::Attacker, &onto_defender);
    commit_side_attacks(combat, Side::Defender, &onto_attacker);
}

fn plan_side_attacks(
    combat: &ActiveCombat,
    side: Side,
    enemy_counts: &ahash::AHashMap<UnitType, u32>,
    config: &CombatConfig,
    research: &dyn ResearchModifiers,
    dt: Seconds,
) -> Vec<PlannedAttack> {
    let terrain = combat.terrain.modifier();
    let terrain_mult = match side {
        Side::Attacker => terrain.attacker_attack,
        Side::Defender => terrain.defender_defense,
    };
    let stance = combat.side_state(side).cavalry_stance;
    let commander = 1.0 + combat.avg_commander_bonus(side);

    let mut planned = Vec::new();
    for unit in UnitType::ALL {
        let eligible = combat.eligible_count(config, side, unit);
        if eligible == 0 {
            continue;
        }
        let Some(target) = find_target(unit.category(), stance, enemy_counts) else {
            continue;
        };

        let attacker_stats = modified_stats(unit, research);
        let target_stats = modified_stats(target, research);
        let per_attack = calculate_damage_by_type(
            &attacker_stats,
            &target_stats,
            Some(target.category()),
            false,
        );
        let charge = combat.charge_multiplier(config, side, unit);

        let damage = per_attack / unit.attack_speed()
            * f64::from(eligible)
            * dt
            * commander
            * charge
            * terrain_mult;
        if damage > 0.0 {
            planned.push(PlannedAttack {
                attacker: unit,
                target,
                damage,
            });
        }
    }
    planned
}

fn commit_side_attacks(combat: &mut ActiveCombat, side: Side, planned: &[PlannedAttack]) {
    let enemy = side.opponent();
    for attack in planned {
        combat
            .side_state_mut(side)
            .track_damage_dealt(attack.attacker, attack.damage);
        distribute_damage_credit(combat.armies_mut(side), attack.attacker, attack.damage);
        combat.note_damage(side, attack.damage);

        combat
            .side_state_mut(enemy)
            .track_damage_received(attack.target, attack.damage);
        let kills = combat
            .side_state_mut(enemy)
            .apply_damage(attack.target, attack.damage);
        distribute_casualties(combat.armies_mut(enemy), attack.target, kills);
        combat.note_casualties(enemy, kills);
    }
}

fn build_record(combat: &ActiveCombat, winner: CombatWinner) -> DetailedCombatRecord {
    let summary = CombatRecord {
        combat_id: combat.id,
        location: combat.location,
        terrain: combat.terrain,
        attackers: combat.attacker_armies.iter().map(state_participant).collect(),
        defenders: combat.defender_armies.iter().map(state_participant).collect(),
        winner,
        duration: combat.elapsed,
    };

    DetailedCombatRecord {
        summary,
        phases: combat.phase_records.clone(),
        attacker_armies: combat.attacker_armies.iter().map(state_breakdown).collect(),
        defender_armies: combat.defender_armies.iter().map(state_breakdown).collect(),
    }
}

fn state_participant(state: &ArmyCombatState) -> Participant {
    Participant {
        name: state.army_name.clone(),
        kind: ParticipantKind::Army,
        owner: state.owner.clone(),
        commander: state.commander_name.clone(),
        initial_strength: state.initial_composition.values().sum(),
        final_strength: state.total_units(),
        casualties: state.total_casualties(),
    }
}

fn state_breakdown(state: &ArmyCombatState) -> ArmyBreakdown {
    ArmyBreakdown {
        army_name: state.army_name.clone(),
        owner: state.owner.clone(),
        commander: state.commander_name.clone(),
        join_time: state.join_time,
        is_active: state.is_active,
        initial_composition: state.initial_composition.clone(),
        survivors: state.current_units.clone(),
        casualties_by_type: state.casualties_by_type.clone(),
        damage_dealt_by_type: state.damage_dealt_by_type.clone(),
    }
}

fn army_participant(army: &Army, initial_strength: u32) -> Participant {
    Participant {
        name: army.name.clone(),
        kind: ParticipantKind::Army,
        owner: army.owner.clone(),
        commander: army.commander.as_ref().map(|c| c.name.clone()),
        initial_strength,
        final_strength: army.total_units(),
        casualties: initial_strength.saturating_sub(army.total_units()),
    }
}
