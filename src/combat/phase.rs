//! Combat phase state machine
//!
//! Phases advance strictly forward: ranged exchange, melee engagement,
//! cleanup, ended. Transitions are elapsed-time-driven; one side reaching
//! zero units forces `Ended` immediately from any phase.

use serde::{Deserialize, Serialize};

use crate::combat::targeting::CavalryStance;
use crate::combat::unit_type::UnitCategory;
use crate::core::config::CombatConfig;
use crate::core::types::Seconds;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum CombatPhase {
    /// Only ranged and siege units attack
    #[default]
    RangedExchange,
    /// All units attack except cavalry held in reserve
    MeleeEngagement,
    /// Mop-up: everything attacks regardless of category or stance
    Cleanup,
    /// Terminal; no further attacks or mutation
    Ended,
}

impl CombatPhase {
    pub fn next(self) -> CombatPhase {
        match self {
            CombatPhase::RangedExchange => CombatPhase::MeleeEngagement,
            CombatPhase::MeleeEngagement => CombatPhase::Cleanup,
            CombatPhase::Cleanup | CombatPhase::Ended => CombatPhase::Ended,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == CombatPhase::Ended
    }

    /// Time box for this phase; `None` for the terminal phase
    pub fn duration(self, config: &CombatConfig) -> Option<Seconds> {
        match self {
            CombatPhase::RangedExchange => Some(config.ranged_phase_secs),
            CombatPhase::MeleeEngagement => Some(config.melee_phase_secs),
            CombatPhase::Cleanup => Some(config.cleanup_phase_secs),
            CombatPhase::Ended => None,
        }
    }

    /// Phase/stance eligibility for an attacking category
    ///
    /// Reinforcement windows can override a `false` here; see
    /// `ActiveCombat::eligible_count`.
    pub fn allows(self, category: UnitCategory, stance: CavalryStance) -> bool {
        match self {
            CombatPhase::RangedExchange => {
                matches!(category, UnitCategory::Ranged | UnitCategory::Siege)
            }
            CombatPhase::MeleeEngagement => {
                !(category == UnitCategory::Cavalry && stance == CavalryStance::Reserve)
            }
            CombatPhase::Cleanup => true,
            CombatPhase::Ended => false,
        }
    }
}
