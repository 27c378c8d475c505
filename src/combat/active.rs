//! A single in-progress phased combat
//!
//! Owns the phase-transition policy, the per-side and per-army states,
//! and the per-phase bookkeeping. The engine drives the tick damage
//! exchange; everything time- and phase-shaped lives here.

use serde::{Deserialize, Serialize};

use crate::combat::army_state::ArmyCombatState;
use crate::combat::phase::CombatPhase;
use crate::combat::record::{CombatWinner, PhaseRecord};
use crate::combat::side::{Side, SideCombatState};
use crate::combat::targeting::CavalryStance;
use crate::combat::terrain::TerrainType;
use crate::combat::unit_type::{UnitCategory, UnitType};
use crate::core::config::CombatConfig;
use crate::core::types::{ArmyId, CombatId, HexCoord, Seconds};
use crate::world::army::Army;

/// One active combat between two sides, each possibly several armies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveCombat {
    pub id: CombatId,
    pub location: HexCoord,
    pub terrain: TerrainType,
    pub elapsed: Seconds,
    pub phase: CombatPhase,
    /// Elapsed time at which the current phase began
    pub phase_start: Seconds,
    pub attacker_state: SideCombatState,
    pub defender_state: SideCombatState,
    /// Index 0 is the originating army; later entries are reinforcements
    pub attacker_armies: Vec<ArmyCombatState>,
    pub defender_armies: Vec<ArmyCombatState>,
    pub phase_records: Vec<PhaseRecord>,
    /// Set exactly once, when the phase reaches `Ended`
    pub winner: Option<CombatWinner>,
    // Per-phase accumulators, folded into a PhaseRecord at each transition
    phase_attacker_damage: f64,
    phase_defender_damage: f64,
    phase_attacker_casualties: u32,
    phase_defender_casualties: u32,
}

impl ActiveCombat {
    pub fn new(attacker: &Army, defender: &Army, terrain: TerrainType) -> Self {
        Self {
            id: CombatId::new(),
            location: defender.location,
            terrain,
            elapsed: 0.0,
            phase: CombatPhase::default(),
            phase_start: 0.0,
            attacker_state: SideCombatState::from_composition(
                attacker.composition().clone(),
                CavalryStance::default(),
            ),
            defender_state: SideCombatState::from_composition(
                defender.composition().clone(),
                CavalryStance::default(),
            ),
            attacker_armies: vec![ArmyCombatState::new(attacker, 0.0)],
            defender_armies: vec![ArmyCombatState::new(defender, 0.0)],
            phase_records: Vec::new(),
            winner: None,
            phase_attacker_damage: 0.0,
            phase_defender_damage: 0.0,
            phase_attacker_casualties: 0,
            phase_defender_casualties: 0,
        }
    }

    pub fn side_state(&self, side: Side) -> &SideCombatState {
        match side {
            Side::Attacker => &self.attacker_state,
            Side::Defender => &self.defender_state,
        }
    }

    pub fn side_state_mut(&mut self, side: Side) -> &mut SideCombatState {
        match side {
            Side::Attacker => &mut self.attacker_state,
            Side::Defender => &mut self.defender_state,
        }
    }

    pub fn armies(&self, side: Side) -> &[ArmyCombatState] {
        match side {
            Side::Attacker => &self.attacker_armies,
            Side::Defender => &self.defender_armies,
        }
    }

    pub fn armies_mut(&mut self, side: Side) -> &mut [ArmyCombatState] {
        match side {
            Side::Attacker => &mut self.attacker_armies,
            Side::Defender => &mut self.defender_armies,
        }
    }

    pub fn involves_army(&self, army_id: ArmyId) -> bool {
        self.side_of(army_id).is_some()
    }

    pub fn side_of(&self, army_id: ArmyId) -> Option<Side> {
        if self.attacker_armies.iter().any(|a| a.army_id == army_id) {
            Some(Side::Attacker)
        } else if self.defender_armies.iter().any(|a| a.army_id == army_id) {
            Some(Side::Defender)
        } else {
            None
        }
    }

    /// Merge a reinforcement into a side mid-combat
    ///
    /// The army gets its own join time; its charge and ranged bonus
    /// windows run relative to that, not to combat start.
    pub fn add_reinforcement(&mut self, army: &Army, side: Side) {
        let mut state = ArmyCombatState::new(army, self.elapsed);
        if self.phase >= CombatPhase::MeleeEngagement && !self.phase.is_terminal() {
            state.melee_start = Some(self.elapsed);
        }

        self.side_state_mut(side)
            .merge_reinforcement(army.composition());
        match side {
            Side::Attacker => self.attacker_armies.push(state),
            Side::Defender => self.defender_armies.push(state),
        }
    }

    /// Mean commander leadership bonus across a side's armies
    pub fn avg_commander_bonus(&self, side: Side) -> f64 {
        let armies = self.armies(side);
        if armies.is_empty() {
            return 0.0;
        }
        armies.iter().map(|a| a.commander_bonus).sum::<f64>() / armies.len() as f64
    }

    /// Live units of `unit` on `side` that may attack this tick
    ///
    /// Counted per army: an army's units attack when the current phase
    /// allows their category and stance, or when one of the army's
    /// reinforcement windows overrides the gate (late ranged volleys,
    /// reserve cavalry inside its charge window).
    pub fn eligible_count(&self, config: &CombatConfig, side: Side, unit: UnitType) -> u32 {
        if self.phase.is_terminal() {
            return 0;
        }

        let stance = self.side_state(side).cavalry_stance;
        let category = unit.category();
        let phase_ok = self.phase.allows(category, stance);

        self.armies(side)
            .iter()
            .map(|a| {
                let window_ok = self.in_ranged_window(config, a, category)
                    || self.in_charge_override(config, a, category, stance);
                if phase_ok || window_ok {
                    a.live_count(unit)
                } else {
                    0
                }
            })
            .sum()
    }

    fn in_ranged_window(
        &self,
        config: &CombatConfig,
        army: &ArmyCombatState,
        category: UnitCategory,
    ) -> bool {
        matches!(category, UnitCategory::Ranged | UnitCategory::Siege)
            && self.elapsed <= army.join_time + config.ranged_window_secs
    }

    fn in_charge_override(
        &self,
        config: &CombatConfig,
        army: &ArmyCombatState,
        category: UnitCategory,
        stance: CavalryStance,
    ) -> bool {
        category == UnitCategory::Cavalry
            && stance == CavalryStance::Reserve
            && self.phase == CombatPhase::MeleeEngagement
            && army
                .melee_start
                .map_or(false, |start| self.elapsed - start <= config.charge_window_secs)
    }

    /// Charge damage multiplier for an attacking unit type
    ///
    /// Proportional to the fraction of the side's live units of that type
    /// whose army is still inside its own charge window, so a
    /// reinforcement charging into an old fight only boosts its own units.
    pub fn charge_multiplier(&self, config: &CombatConfig, side: Side, unit: UnitType) -> f64 {
        let bonus = match unit {
            UnitType::LightCavalry | UnitType::Knight => config.cavalry_charge_bonus,
            UnitType::Swordsman => config.swordsman_charge_bonus,
            _ => return 1.0,
        };
        if !matches!(
            self.phase,
            CombatPhase::MeleeEngagement | CombatPhase::Cleanup
        ) {
            return 1.0;
        }

        let armies = self.armies(side);
        let total: u32 = armies.iter().map(|a| a.live_count(unit)).sum();
        if total == 0 {
            return 1.0;
        }

        let in_window: u32 = armies
            .iter()
            .filter(|a| {
                a.melee_start
                    .map_or(false, |start| self.elapsed - start <= config.charge_window_secs)
            })
            .map(|a| a.live_count(unit))
            .sum();

        1.0 + bonus * f64::from(in_window) / f64::from(total)
    }

    /// Accumulate damage dealt by a side within the current phase
    pub fn note_damage(&mut self, dealt_by: Side, amount: f64) {
        match dealt_by {
            Side::Attacker => self.phase_attacker_damage += amount,
            Side::Defender => self.phase_defender_damage += amount,
        }
    }

    /// Accumulate casualties suffered by a side within the current phase
    pub fn note_casualties(&mut self, suffered_by: Side, count: u32) {
        match suffered_by {
            Side::Attacker => self.phase_attacker_casualties += count,
            Side::Defender => self.phase_defender_casualties += count,
        }
    }

    /// Advance the phase state machine after a tick
    ///
    /// Extinction of either side forces `Ended` from any phase; otherwise
    /// each phase runs for its configured duration. A large tick can step
    /// through several phases at once.
    pub fn update_phase(&mut self, config: &CombatConfig) {
        if self.phase.is_terminal() {
            return;
        }

        if self.attacker_state.is_empty() || self.defender_state.is_empty() {
            let winner = self.extinction_winner();
            self.end_now(winner);
            return;
        }

        while let Some(duration) = self.phase.duration(config) {
            if self.elapsed - self.phase_start < duration {
                break;
            }
            self.close_phase(duration);
            self.phase_start += duration;
            self.phase = self.phase.next();
            match self.phase {
                CombatPhase::MeleeEngagement => self.begin_melee(),
                CombatPhase::Ended => self.winner = Some(self.timeout_winner(config)),
                _ => {}
            }
        }
    }

    /// End the combat immediately with the given winner (retreats)
    pub fn force_end(&mut self, winner: CombatWinner) {
        if !self.phase.is_terminal() {
            self.end_now(winner);
        }
    }

    fn end_now(&mut self, winner: CombatWinner) {
        self.close_phase(self.elapsed - self.phase_start);
        self.phase_start = self.elapsed;
        self.phase = CombatPhase::Ended;
        self.winner = Some(winner);
    }

    fn begin_melee(&mut self) {
        let start = self.phase_start;
        for army in self
            .attacker_armies
            .iter_mut()
            .chain(self.defender_armies.iter_mut())
        {
            if army.melee_start.is_none() {
                army.melee_start = Some(start);
            }
        }
    }

    fn close_phase(&mut self, duration: Seconds) {
        self.phase_records.push(PhaseRecord {
            phase: self.phase,
            duration,
            attacker_damage: self.phase_attacker_damage,
            defender_damage: self.phase_defender_damage,
            attacker_casualties: self.phase_attacker_casualties,
            defender_casualties: self.phase_defender_casualties,
        });
        self.phase_attacker_damage = 0.0;
        self.phase_defender_damage = 0.0;
        self.phase_attacker_casualties = 0;
        self.phase_defender_casualties = 0;
    }

    fn extinction_winner(&self) -> CombatWinner {
        // Both sides empty from the start is a no-contest
        if self.attacker_state.total_initial() == 0 && self.defender_state.total_initial() == 0 {
            return CombatWinner::Draw;
        }
        // Defender wins ties when both sides are wiped out the same tick
        if self.attacker_state.is_empty() {
            CombatWinner::Defender
        } else {
            CombatWinner::Attacker
        }
    }

    fn timeout_winner(&self, config: &CombatConfig) -> CombatWinner {
        let attackers = f64::from(self.attacker_state.total_units());
        let defenders = f64::from(self.defender_state.total_units());
        let larger = attackers.max(defenders);
        if larger == 0.0 {
            return CombatWinner::Draw;
        }

        if (attackers - defenders).abs() / larger <= config.draw_tolerance {
            CombatWinner::Draw
        } else if attackers > defenders {
            CombatWinner::Attacker
        } else {
            CombatWinner::Defender
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::HexCoord;

    fn army(name: &str, owner: &str, units: &[(UnitType, u32)]) -> Army {
        let mut army = Army::new(name, owner, HexCoord::default());
        for &(unit, count) in units {
            army.add_units(unit, count);
        }
        army
    }

    fn swordsman_combat() -> ActiveCombat {
        let attacker = army("A", "Rome", &[(UnitType::Swordsman, 10)]);
        let defender = army("B", "Carthage", &[(UnitType::Swordsman, 10)]);
        ActiveCombat::new(&attacker, &defender, TerrainType::Plains)
    }

    #[test]
    fn test_new_combat_starts_in_ranged_phase() {
        let combat = swordsman_combat();
        assert_eq!(combat.phase, CombatPhase::RangedExchange);
        assert_eq!(combat.elapsed, 0.0);
        assert!(combat.winner.is_none());
        assert_eq!(combat.attacker_armies.len(), 1);
    }

    #[test]
    fn test_reinforcement_grows_side_and_keeps_join_time() {
        let mut combat = swordsman_combat();
        combat.elapsed = 5.0;

        let late = army("C", "Rome", &[(UnitType::Archer, 6)]);
        combat.add_reinforcement(&late, Side::Attacker);

        assert_eq!(combat.attacker_armies.len(), 2);
        assert_eq!(combat.attacker_armies[1].join_time, 5.0);
        assert_eq!(combat.attacker_state.live_count(UnitType::Archer), 6);
        assert_eq!(combat.attacker_state.total_units(), 16);
    }

    #[test]
    fn test_reinforcement_during_melee_gets_melee_start() {
        let config = CombatConfig::default();
        let mut combat = swordsman_combat();
        combat.elapsed = config.ranged_phase_secs + 2.0;
        combat.update_phase(&config);
        assert_eq!(combat.phase, CombatPhase::MeleeEngagement);

        let late = army("C", "Rome", &[(UnitType::Knight, 4)]);
        combat.add_reinforcement(&late, Side::Attacker);
        assert_eq!(combat.attacker_armies[1].melee_start, Some(combat.elapsed));
    }

    #[test]
    fn test_phase_advances_on_timeout() {
        let config = CombatConfig::default();
        let mut combat = swordsman_combat();

        combat.elapsed = config.ranged_phase_secs;
        combat.update_phase(&config);
        assert_eq!(combat.phase, CombatPhase::MeleeEngagement);
        assert_eq!(combat.phase_start, config.ranged_phase_secs);
        assert_eq!(combat.phase_records.len(), 1);
        assert_eq!(combat.phase_records[0].phase, CombatPhase::RangedExchange);
    }

    #[test]
    fn test_large_tick_steps_through_all_phases() {
        let config = CombatConfig::default();
        let mut combat = swordsman_combat();

        combat.elapsed =
            config.ranged_phase_secs + config.melee_phase_secs + config.cleanup_phase_secs;
        combat.update_phase(&config);

        assert_eq!(combat.phase, CombatPhase::Ended);
        assert_eq!(combat.phase_records.len(), 3);
        // Equal survivors on both sides: a draw within tolerance
        assert_eq!(combat.winner, Some(CombatWinner::Draw));
    }

    #[test]
    fn test_extinction_forces_ended_from_any_phase() {
        let config = CombatConfig::default();
        let mut combat = swordsman_combat();
        combat.elapsed = 1.0;
        combat
            .defender_state
            .apply_damage(UnitType::Swordsman, 10.0 * UnitType::Swordsman.hit_points());

        combat.update_phase(&config);
        assert_eq!(combat.phase, CombatPhase::Ended);
        assert_eq!(combat.winner, Some(CombatWinner::Attacker));
    }

    #[test]
    fn test_defender_wins_simultaneous_extinction() {
        let config = CombatConfig::default();
        let mut combat = swordsman_combat();
        let wipe = 10.0 * UnitType::Swordsman.hit_points();
        combat.attacker_state.apply_damage(UnitType::Swordsman, wipe);
        combat.defender_state.apply_damage(UnitType::Swordsman, wipe);

        combat.update_phase(&config);
        assert_eq!(combat.winner, Some(CombatWinner::Defender));
    }

    #[test]
    fn test_empty_vs_empty_is_a_draw() {
        let config = CombatConfig::default();
        let attacker = army("A", "Rome", &[]);
        let defender = army("B", "Carthage", &[]);
        let mut combat = ActiveCombat::new(&attacker, &defender, TerrainType::Plains);

        combat.update_phase(&config);
        assert_eq!(combat.phase, CombatPhase::Ended);
        assert_eq!(combat.winner, Some(CombatWinner::Draw));
    }

    #[test]
    fn test_melee_units_wait_out_ranged_phase() {
        let config = CombatConfig::default();
        let combat = swordsman_combat();
        assert_eq!(
            combat.eligible_count(&config, Side::Attacker, UnitType::Swordsman),
            0
        );
    }

    #[test]
    fn test_late_joining_archers_fire_immediately() {
        let config = CombatConfig::default();
        let mut combat = swordsman_combat();
        combat.elapsed = config.ranged_phase_secs + 1.0;
        combat.update_phase(&config);
        assert_eq!(combat.phase, CombatPhase::MeleeEngagement);

        let late = army("C", "Rome", &[(UnitType::Archer, 6)]);
        combat.add_reinforcement(&late, Side::Attacker);
        assert_eq!(
            combat.eligible_count(&config, Side::Attacker, UnitType::Archer),
            6
        );
    }

    #[test]
    fn test_reserve_cavalry_commits_only_in_charge_window() {
        let config = CombatConfig::default();
        let attacker = army("A", "Rome", &[(UnitType::Knight, 5), (UnitType::Swordsman, 5)]);
        let defender = army("B", "Carthage", &[(UnitType::Swordsman, 10)]);
        let mut combat = ActiveCombat::new(&attacker, &defender, TerrainType::Plains);
        combat.attacker_state.cavalry_stance = CavalryStance::Reserve;

        combat.elapsed = config.ranged_phase_secs + 1.0;
        combat.update_phase(&config);
        assert_eq!(combat.phase, CombatPhase::MeleeEngagement);

        // Inside the charge window the reserve cavalry joins the melee
        assert_eq!(
            combat.eligible_count(&config, Side::Attacker, UnitType::Knight),
            5
        );

        // After the window it is held back again
        combat.elapsed = config.ranged_phase_secs + config.charge_window_secs + 1.0;
        assert_eq!(
            combat.eligible_count(&config, Side::Attacker, UnitType::Knight),
            0
        );
    }

    #[test]
    fn test_charge_multiplier_scales_with_window_fraction() {
        let config = CombatConfig::default();
        let mut combat = swordsman_combat();
        combat.elapsed = config.ranged_phase_secs + 1.0;
        combat.update_phase(&config);

        // Everyone is inside the window just after melee starts
        let full = combat.charge_multiplier(&config, Side::Attacker, UnitType::Swordsman);
        assert!((full - (1.0 + config.swordsman_charge_bonus)).abs() < 1e-9);

        // A matching reinforcement joining after the window halves the fraction
        combat.elapsed = config.ranged_phase_secs + config.charge_window_secs + 2.0;
        let late = army("C", "Rome", &[(UnitType::Swordsman, 10)]);
        combat.add_reinforcement(&late, Side::Attacker);
        let half = combat.charge_multiplier(&config, Side::Attacker, UnitType::Swordsman);
        assert!((half - (1.0 + config.swordsman_charge_bonus * 0.5)).abs() < 1e-9);

        // No charge bonus for units without one
        assert_eq!(
            combat.charge_multiplier(&config, Side::Attacker, UnitType::Archer),
            1.0
        );
    }

    #[test]
    fn test_force_end_records_open_phase() {
        let config = CombatConfig::default();
        let mut combat = swordsman_combat();
        combat.elapsed = 4.0;
        combat.note_damage(Side::Attacker, 12.0);

        combat.force_end(CombatWinner::Defender);
        assert_eq!(combat.phase, CombatPhase::Ended);
        assert_eq!(combat.phase_records.len(), 1);
        assert_eq!(combat.phase_records[0].attacker_damage, 12.0);
        assert_eq!(combat.phase_records[0].duration, 4.0);

        // Idempotent: a second force_end changes nothing
        combat.force_end(CombatWinner::Attacker);
        assert_eq!(combat.winner, Some(CombatWinner::Defender));
        assert_eq!(combat.phase_records.len(), 1);
    }

    #[test]
    fn test_timeout_winner_respects_tolerance_band() {
        let config = CombatConfig::default();
        let attacker = army("A", "Rome", &[(UnitType::Swordsman, 100)]);
        let defender = army("B", "Carthage", &[(UnitType::Swordsman, 95)]);
        let mut combat = ActiveCombat::new(&attacker, &defender, TerrainType::Plains);

        // 5% apart: inside the 10% band
        combat.elapsed =
            config.ranged_phase_secs + config.melee_phase_secs + config.cleanup_phase_secs;
        combat.update_phase(&config);
        assert_eq!(combat.winner, Some(CombatWinner::Draw));

        let attacker = army("A", "Rome", &[(UnitType::Swordsman, 100)]);
        let defender = army("B", "Carthage", &[(UnitType::Swordsman, 50)]);
        let mut combat = ActiveCombat::new(&attacker, &defender, TerrainType::Plains);
        combat.elapsed =
            config.ranged_phase_secs + config.melee_phase_secs + config.cleanup_phase_secs;
        combat.update_phase(&config);
        assert_eq!(combat.winner, Some(CombatWinner::Attacker));
    }
}
