//! Combat tuning constants with documented defaults
//!
//! All magic numbers of the combat engine are collected here with
//! explanations of their purpose and how they interact.

use serde::{Deserialize, Serialize};

use crate::core::error::{CombatError, Result};
use crate::core::types::Seconds;

/// Configuration for the combat engine
///
/// These values have been tuned so that an evenly matched fight resolves
/// within a single pass through the phase sequence. Changing them affects
/// combat pacing, not correctness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatConfig {
    // === PHASE DURATIONS ===
    /// Duration of the ranged exchange phase (seconds of combat time)
    ///
    /// Only ranged and siege units attack during this window. The
    /// transition to melee is purely elapsed-time-driven.
    pub ranged_phase_secs: Seconds,

    /// Duration of the melee engagement phase
    ///
    /// Long enough for two full-strength sides to grind each other down;
    /// a one-sided fight usually ends early via extinction.
    pub melee_phase_secs: Seconds,

    /// Duration of the cleanup (mop-up) phase
    ///
    /// All remaining units attack regardless of category or stance. When
    /// this expires with both sides alive the winner is decided by
    /// remaining strength.
    pub cleanup_phase_secs: Seconds,

    // === REINFORCEMENT WINDOWS ===
    /// Charge bonus window at the start of an army's melee participation
    ///
    /// Reinforcements get their own window measured from the moment they
    /// commit to melee, not from combat start.
    pub charge_window_secs: Seconds,

    /// Ranged volley window for armies that join after the ranged phase
    ///
    /// A late-joining army's ranged and siege units may fire for this long
    /// after its join time even when the current phase would not normally
    /// allow it.
    pub ranged_window_secs: Seconds,

    // === DAMAGE MODIFIERS ===
    /// Charge damage bonus for cavalry inside its charge window
    pub cavalry_charge_bonus: f64,

    /// Charge damage bonus for swordsmen inside the charge window
    pub swordsman_charge_bonus: f64,

    // === WINNER DETERMINATION ===
    /// Relative strength band inside which a timed-out phased combat is a draw
    ///
    /// Applied to surviving unit totals when cleanup expires with both
    /// sides alive.
    pub draw_tolerance: f64,

    /// Damage differential threshold for a draw on the instant combat path
    ///
    /// The non-phased path compares total modified damage output; within
    /// this band neither side is declared the winner.
    pub instant_draw_threshold: f64,

    // === COMMANDER EXPERIENCE ===
    /// Experience awarded to commanders on the victorious side
    pub winner_commander_xp: f64,

    /// Experience awarded to commanders on the losing side (and on a draw)
    pub loser_commander_xp: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            ranged_phase_secs: 10.0,
            melee_phase_secs: 30.0,
            cleanup_phase_secs: 15.0,
            charge_window_secs: 3.0,
            ranged_window_secs: 5.0,
            cavalry_charge_bonus: 0.20,
            swordsman_charge_bonus: 0.10,
            draw_tolerance: 0.10,
            instant_draw_threshold: 0.20,
            winner_commander_xp: 100.0,
            loser_commander_xp: 25.0,
        }
    }
}

impl CombatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.ranged_phase_secs <= 0.0
            || self.melee_phase_secs <= 0.0
            || self.cleanup_phase_secs <= 0.0
        {
            return Err(CombatError::InvalidConfig(
                "phase durations must be positive".into(),
            ));
        }

        if self.charge_window_secs > self.melee_phase_secs {
            return Err(CombatError::InvalidConfig(format!(
                "charge_window_secs ({}) must not exceed melee_phase_secs ({})",
                self.charge_window_secs, self.melee_phase_secs
            )));
        }

        if self.cavalry_charge_bonus < 0.0 || self.swordsman_charge_bonus < 0.0 {
            return Err(CombatError::InvalidConfig(
                "charge bonuses must be non-negative".into(),
            ));
        }

        if !(0.0..1.0).contains(&self.draw_tolerance)
            || !(0.0..1.0).contains(&self.instant_draw_threshold)
        {
            return Err(CombatError::InvalidConfig(
                "draw thresholds must be in [0, 1)".into(),
            ));
        }

        Ok(())
    }
}
