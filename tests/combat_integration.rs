//! Combat engine integration tests

use std::cell::RefCell;
use std::rc::Rc;

use hexwar::combat::*;
use hexwar::core::types::HexCoord;
use hexwar::core::CombatConfig;
use hexwar::world::{Army, ArmyRegistry, Commander, VillagerGroup};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

fn army(name: &str, owner: &str, units: &[(UnitType, u32)]) -> Army {
    let mut army = Army::new(name, owner, HexCoord::default());
    for &(unit, count) in units {
        army.add_units(unit, count);
    }
    army
}

fn run_to_completion(engine: &mut CombatEngine, registry: &mut ArmyRegistry, max_ticks: u32) {
    init_tracing();
    for _ in 0..max_ticks {
        engine.update_combats(1.0, registry);
        if engine.active_combats().is_empty() {
            return;
        }
    }
    panic!("combat did not finish within {max_ticks} ticks");
}

struct MountainWorld;

impl TerrainSource for MountainWorld {
    fn terrain_at(&self, _location: HexCoord) -> TerrainType {
        TerrainType::Mountain
    }
}

/// Run a 10v10 swordsman fight and return (attacker, defender) casualties
fn mirror_match_casualties(terrain: Box<dyn TerrainSource>) -> (u32, u32) {
    let mut engine = CombatEngine::new(CombatConfig::default())
        .unwrap()
        .with_terrain(terrain);
    let mut registry = ArmyRegistry::new();
    let a = army("A", "Rome", &[(UnitType::Swordsman, 10)]);
    let b = army("B", "Carthage", &[(UnitType::Swordsman, 10)]);
    registry.insert(a.clone());
    registry.insert(b.clone());

    engine.start_phased_combat(&a, &b).unwrap();
    run_to_completion(&mut engine, &mut registry, 200);

    let record = &engine.history().records()[0];
    let attacker_lost: u32 = record.summary.attackers.iter().map(|p| p.casualties).sum();
    let defender_lost: u32 = record.summary.defenders.iter().map(|p| p.casualties).sum();
    (attacker_lost, defender_lost)
}

#[test]
fn test_swordsman_mirror_match_draws_blood() {
    let mut engine = CombatEngine::new(CombatConfig::default()).unwrap();
    let mut registry = ArmyRegistry::new();
    let a = army("A", "Rome", &[(UnitType::Swordsman, 10)]);
    let b = army("B", "Carthage", &[(UnitType::Swordsman, 10)]);
    let a_id = registry.insert(a.clone());
    let b_id = registry.insert(b.clone());

    engine.start_phased_combat(&a, &b).unwrap();
    run_to_completion(&mut engine, &mut registry, 200);

    let record = &engine.history().records()[0];
    let attacker = &record.summary.attackers[0];
    let defender = &record.summary.defenders[0];

    assert!(attacker.casualties + defender.casualties > 0);

    // Winner reflects whoever kept more units standing
    match record.summary.winner {
        CombatWinner::Attacker => assert!(attacker.final_strength > defender.final_strength),
        CombatWinner::Defender => assert!(defender.final_strength >= attacker.final_strength),
        CombatWinner::Draw => {}
    }

    // Registry survivors agree with the record
    let a_left = registry.get(a_id).map(|a| a.total_units()).unwrap_or(0);
    let b_left = registry.get(b_id).map(|a| a.total_units()).unwrap_or(0);
    assert_eq!(a_left, attacker.final_strength);
    assert_eq!(b_left, defender.final_strength);
}

#[test]
fn test_mountain_defender_takes_fewer_casualties() {
    let (_, defender_on_plains) = mirror_match_casualties(Box::new(FlatWorld));
    let (_, defender_on_mountain) = mirror_match_casualties(Box::new(MountainWorld));
    assert!(defender_on_mountain < defender_on_plains);
}

#[test]
fn test_reinforcement_joins_with_correct_time_and_counts() {
    let mut engine = CombatEngine::new(CombatConfig::default()).unwrap();
    let mut registry = ArmyRegistry::new();
    let a = army("A", "Rome", &[(UnitType::Swordsman, 10)]);
    let b = army("B", "Carthage", &[(UnitType::Swordsman, 10)]);
    registry.insert(a.clone());
    registry.insert(b.clone());

    let id = engine.start_phased_combat(&a, &b).unwrap();
    for _ in 0..5 {
        engine.update_combats(1.0, &mut registry);
    }

    let before = engine
        .get_combat(id)
        .map(|c| {
            (
                c.attacker_state.live_count(UnitType::Swordsman),
                c.attacker_state.live_count(UnitType::Knight),
            )
        })
        .unwrap();

    let late = army("C", "Rome", &[(UnitType::Knight, 4)]);
    registry.insert(late.clone());
    let side = engine.join_combat(id, &late).unwrap();
    assert_eq!(side, Side::Attacker);

    let combat = engine.get_combat(id).unwrap();
    assert_eq!(
        combat.attacker_state.live_count(UnitType::Swordsman),
        before.0
    );
    assert_eq!(
        combat.attacker_state.live_count(UnitType::Knight),
        before.1 + 4
    );
    assert_eq!(combat.attacker_armies[1].join_time, 5.0);
}

#[test]
fn test_empty_army_combat_terminates_quickly() {
    let mut engine = CombatEngine::new(CombatConfig::default()).unwrap();
    let mut registry = ArmyRegistry::new();
    let a = army("A", "Rome", &[]);
    let b = army("B", "Carthage", &[(UnitType::Swordsman, 10)]);
    registry.insert(a.clone());
    registry.insert(b.clone());

    engine.start_phased_combat(&a, &b).unwrap();
    run_to_completion(&mut engine, &mut registry, 5);

    let record = &engine.history().records()[0];
    assert_eq!(record.summary.winner, CombatWinner::Defender);
}

#[test]
fn test_garrison_splits_fire_across_attackers() {
    // 100 pierce split two ways: each army's 50 kills exactly one archer
    let mut a = army("A", "Rome", &[(UnitType::Archer, 10)]);
    let mut b = army("B", "Gaul", &[(UnitType::Archer, 10)]);
    let output = GarrisonOutput {
        pierce: 100.0,
        bludgeon: 0.0,
    };

    let results = resolve_garrison_defense(output, &mut [&mut a, &mut b]);
    assert_eq!(results[0][&UnitType::Archer], 1);
    assert_eq!(results[1][&UnitType::Archer], 1);
    assert_eq!(a.total_units(), 9);
    assert_eq!(b.total_units(), 9);
}

#[test]
fn test_per_army_accounting_is_conserved() {
    let mut engine = CombatEngine::new(CombatConfig::default()).unwrap();
    let mut registry = ArmyRegistry::new();
    let a = army(
        "A",
        "Rome",
        &[(UnitType::Swordsman, 8), (UnitType::Archer, 4)],
    );
    let b = army(
        "B",
        "Carthage",
        &[(UnitType::Swordsman, 9), (UnitType::Spearman, 5)],
    );
    registry.insert(a.clone());
    registry.insert(b.clone());

    let id = engine.start_phased_combat(&a, &b).unwrap();
    engine.update_combats(2.0, &mut registry);

    let late = army("C", "Rome", &[(UnitType::Swordsman, 6)]);
    registry.insert(late.clone());
    engine.join_combat(id, &late).unwrap();

    run_to_completion(&mut engine, &mut registry, 200);

    let record = &engine.history().records()[0];
    for breakdown in record
        .attacker_armies
        .iter()
        .chain(record.defender_armies.iter())
    {
        for (&unit, &initial) in &breakdown.initial_composition {
            let lost = breakdown
                .casualties_by_type
                .get(&unit)
                .copied()
                .unwrap_or(0);
            let left = breakdown.survivors.get(&unit).copied().unwrap_or(0);
            assert_eq!(initial, lost + left, "{unit:?} in {}", breakdown.army_name);
        }
    }
}

#[test]
fn test_side_casualties_are_monotonic_and_counts_non_negative() {
    let mut engine = CombatEngine::new(CombatConfig::default()).unwrap();
    let mut registry = ArmyRegistry::new();
    let a = army("A", "Rome", &[(UnitType::Swordsman, 15), (UnitType::Archer, 5)]);
    let b = army("B", "Carthage", &[(UnitType::Swordsman, 15), (UnitType::Archer, 5)]);
    registry.insert(a.clone());
    registry.insert(b.clone());

    let id = engine.start_phased_combat(&a, &b).unwrap();
    let mut last = (0u32, 0u32);
    for _ in 0..200 {
        engine.update_combats(1.0, &mut registry);
        let Some(combat) = engine.get_combat(id) else {
            return; // finalized
        };
        let now = (
            combat.attacker_state.total_casualties(),
            combat.defender_state.total_casualties(),
        );
        assert!(now.0 >= last.0 && now.1 >= last.1);
        last = now;
    }
}

#[derive(Default)]
struct Counts {
    started: u32,
    updated: u32,
    ended: u32,
    phases: Vec<CombatPhase>,
}

struct Recorder(Rc<RefCell<Counts>>);

impl CombatObserver for Recorder {
    fn combat_started(&mut self, _combat: &ActiveCombat) {
        self.0.borrow_mut().started += 1;
    }

    fn combat_updated(&mut self, combat: &ActiveCombat) {
        let mut counts = self.0.borrow_mut();
        counts.updated += 1;
        counts.phases.push(combat.phase);
    }

    fn combat_ended(&mut self, _record: &DetailedCombatRecord) {
        self.0.borrow_mut().ended += 1;
    }
}

#[test]
fn test_observer_sees_lifecycle_and_forward_phases() {
    let counts = Rc::new(RefCell::new(Counts::default()));
    let mut engine = CombatEngine::new(CombatConfig::default()).unwrap();
    engine.add_observer(Box::new(Recorder(Rc::clone(&counts))));

    let mut registry = ArmyRegistry::new();
    let a = army("A", "Rome", &[(UnitType::Swordsman, 10)]);
    let b = army("B", "Carthage", &[(UnitType::Swordsman, 10)]);
    registry.insert(a.clone());
    registry.insert(b.clone());

    engine.start_phased_combat(&a, &b).unwrap();
    run_to_completion(&mut engine, &mut registry, 200);

    let counts = counts.borrow();
    assert_eq!(counts.started, 1);
    assert!(counts.updated > 0);
    assert_eq!(counts.ended, 1);

    // Phase never regresses across ticks
    for pair in counts.phases.windows(2) {
        assert!(pair[0] <= pair[1]);
    }
}

#[test]
fn test_history_orders_most_recent_first() {
    let mut engine = CombatEngine::new(CombatConfig::default()).unwrap();
    let mut first_a = army("A", "Rome", &[(UnitType::Swordsman, 20)]);
    let mut first_b = army("B", "Carthage", &[(UnitType::Swordsman, 10)]);
    let first = engine.resolve_field_combat(&mut first_a, &mut first_b);

    let mut second_a = army("C", "Rome", &[(UnitType::Knight, 10)]);
    let mut second_b = army("D", "Carthage", &[(UnitType::Archer, 5)]);
    let second = engine.resolve_field_combat(&mut second_a, &mut second_b);

    let ids: Vec<_> = engine.history().summaries().map(|s| s.combat_id).collect();
    assert_eq!(ids, vec![second.combat_id, first.combat_id]);

    engine.clear_history();
    assert!(engine.history().is_empty());
}

#[test]
fn test_commanders_earn_experience_at_finalize() {
    let mut engine = CombatEngine::new(CombatConfig::default()).unwrap();
    let mut registry = ArmyRegistry::new();
    let a = army("A", "Rome", &[(UnitType::Knight, 20)])
        .with_commander(Commander::new("Aurelia", 0.1));
    let b = army("B", "Carthage", &[(UnitType::Archer, 2)])
        .with_commander(Commander::new("Hasdrubal", 0.1));
    let a_id = registry.insert(a.clone());
    let b_id = registry.insert(b.clone());

    engine.start_phased_combat(&a, &b).unwrap();
    run_to_completion(&mut engine, &mut registry, 200);

    let config = CombatConfig::default();
    let winner_xp = registry
        .get(a_id)
        .and_then(|a| a.commander.as_ref())
        .map(|c| c.experience)
        .unwrap_or(0.0);
    let loser_xp = registry
        .get(b_id)
        .and_then(|a| a.commander.as_ref())
        .map(|c| c.experience)
        .unwrap_or(0.0);
    assert_eq!(winner_xp, config.winner_commander_xp);
    assert_eq!(loser_xp, config.loser_commander_xp);
}

#[test]
fn test_villager_raid_through_engine() {
    let mut engine = CombatEngine::new(CombatConfig::default()).unwrap();
    let raiders = army("Raiders", "Rome", &[(UnitType::LightCavalry, 10)]);
    let mut villagers = VillagerGroup::new("Carthage", HexCoord::default(), 3);

    let record = engine.resolve_villager_raid(&raiders, &mut villagers);
    assert_eq!(record.winner, CombatWinner::Attacker);
    assert!(villagers.is_empty());
    assert_eq!(record.defenders[0].kind, ParticipantKind::VillagerGroup);
    assert_eq!(record.defenders[0].casualties, 3);
}
