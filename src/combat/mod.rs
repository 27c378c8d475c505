//! Phased combat resolution engine
//!
//! Combats run through a deterministic phase sequence (ranged exchange,
//! melee engagement, cleanup, ended) with per-tick simultaneous damage
//! exchange between two sides of one or more armies each. The engine is
//! an explicit context object driven by the host game loop; instant
//! single-shot resolution for skirmishes, building assaults and villager
//! raids lives alongside it and feeds the same history.

pub mod active;
pub mod army_state;
pub mod engine;
pub mod events;
pub mod garrison;
pub mod instant;
pub mod modifiers;
pub mod phase;
pub mod record;
pub mod side;
pub mod stats;
pub mod targeting;
pub mod terrain;
pub mod unit_type;

pub use active::ActiveCombat;
pub use army_state::{distribute_casualties, distribute_damage_credit, ArmyCombatState};
pub use engine::CombatEngine;
pub use events::CombatObserver;
pub use garrison::{resolve_garrison_defense, GarrisonOutput};
pub use instant::{AssaultOutcome, InstantOutcome};
pub use modifiers::{modified_stats, NoResearch, ResearchModifiers};
pub use phase::CombatPhase;
pub use record::{
    ArmyBreakdown, CombatHistory, CombatRecord, CombatWinner, DetailedCombatRecord, Participant,
    ParticipantKind, PhaseRecord,
};
pub use side::{Side, SideCombatState};
pub use stats::{calculate_damage_by_type, DamageType, UnitCombatStats};
pub use targeting::{category_priority, find_target, CavalryStance};
pub use terrain::{FlatWorld, TerrainModifier, TerrainSource, TerrainType};
pub use unit_type::{TrainingBuilding, UnitCategory, UnitType};
