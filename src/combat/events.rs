//! Push-style combat event notifications
//!
//! The engine drives observers; it knows nothing about who listens. All
//! callbacks default to no-ops so hosts implement only what they need.

use crate::combat::active::ActiveCombat;
use crate::combat::record::DetailedCombatRecord;

/// Callbacks fired by the engine as combats progress
pub trait CombatObserver {
    /// A new combat has been created
    fn combat_started(&mut self, _combat: &ActiveCombat) {}

    /// A combat advanced by one tick (fired after phase update)
    fn combat_updated(&mut self, _combat: &ActiveCombat) {}

    /// A combat finished and its record is final
    fn combat_ended(&mut self, _record: &DetailedCombatRecord) {}
}
