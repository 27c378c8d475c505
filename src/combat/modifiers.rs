//! Injectable research/technology modifiers
//!
//! The engine never reads tech state directly; the host supplies a
//! multiplier lookup that defaults to 1.0 everywhere so tests can run
//! without a research system.

use crate::combat::stats::UnitCombatStats;
use crate::combat::unit_type::{UnitCategory, UnitType};

/// Named multiplier lookups consulted by the damage calculation
pub trait ResearchModifiers {
    /// Scales the damage channels of the given category's units
    fn attack_multiplier(&self, _category: UnitCategory) -> f64 {
        1.0
    }

    /// Scales the armor channels of the given category's units
    fn armor_multiplier(&self, _category: UnitCategory) -> f64 {
        1.0
    }

    /// Scales building armor against siege bombardment
    fn building_armor_multiplier(&self) -> f64 {
        1.0
    }
}

/// No research: every multiplier is 1.0
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResearch;

impl ResearchModifiers for NoResearch {}

/// Base stats for a unit type with research multipliers applied
pub fn modified_stats(unit: UnitType, research: &dyn ResearchModifiers) -> UnitCombatStats {
    let category = unit.category();
    unit.base_stats()
        .with_attack_scaled(research.attack_multiplier(category))
        .with_armor_scaled(research.armor_multiplier(category))
}
