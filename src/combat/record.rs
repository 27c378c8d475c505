//! Immutable combat result records and the in-memory history
//!
//! Records are built once at finalize and never mutated. The history is
//! an in-memory list, most recent first, with a `clear` operation; hosts
//! that want persistence can serialize it as JSON.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::combat::phase::CombatPhase;
use crate::combat::terrain::TerrainType;
use crate::combat::unit_type::UnitType;
use crate::core::error::Result;
use crate::core::types::{CombatId, HexCoord, Seconds};

/// What kind of entity a combat participant was
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticipantKind {
    Army,
    Building,
    VillagerGroup,
}

/// One participant's summary line in a combat record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub kind: ParticipantKind,
    pub owner: String,
    pub commander: Option<String>,
    pub initial_strength: u32,
    pub final_strength: u32,
    pub casualties: u32,
}

/// Outcome of a finished combat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatWinner {
    Attacker,
    Defender,
    Draw,
}

/// Immutable summary of a finished combat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatRecord {
    pub combat_id: CombatId,
    pub location: HexCoord,
    pub terrain: TerrainType,
    pub attackers: Vec<Participant>,
    pub defenders: Vec<Participant>,
    pub winner: CombatWinner,
    /// Total combat time from start to finalize
    pub duration: Seconds,
}

/// Damage and casualty tallies for one completed phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub phase: CombatPhase,
    /// How long the phase actually ran (extinction can cut it short)
    pub duration: Seconds,
    pub attacker_damage: f64,
    pub defender_damage: f64,
    pub attacker_casualties: u32,
    pub defender_casualties: u32,
}

/// Full per-army accounting for a detailed record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArmyBreakdown {
    pub army_name: String,
    pub owner: String,
    pub commander: Option<String>,
    pub join_time: Seconds,
    /// False when this army conceded the combat by retreating
    pub is_active: bool,
    pub initial_composition: AHashMap<UnitType, u32>,
    pub survivors: AHashMap<UnitType, u32>,
    pub casualties_by_type: AHashMap<UnitType, u32>,
    pub damage_dealt_by_type: AHashMap<UnitType, f64>,
}

/// Phase-by-phase, per-unit-type, per-army breakdown of a finished combat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedCombatRecord {
    pub summary: CombatRecord,
    pub phases: Vec<PhaseRecord>,
    pub attacker_armies: Vec<ArmyBreakdown>,
    pub defender_armies: Vec<ArmyBreakdown>,
}

/// In-memory combat history, most recent first
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CombatHistory {
    records: Vec<DetailedCombatRecord>,
}

impl CombatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a finished combat at the head of the history
    pub fn push(&mut self, record: DetailedCombatRecord) {
        self.records.insert(0, record);
    }

    /// All records, most recent first
    pub fn records(&self) -> &[DetailedCombatRecord] {
        &self.records
    }

    /// Summaries only, most recent first
    pub fn summaries(&self) -> impl Iterator<Item = &CombatRecord> {
        self.records.iter().map(|r| &r.summary)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Serialize the full history for host persistence
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }
}
