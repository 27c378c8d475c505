//! Hexwar - Phased Combat Resolution for Hex-Grid Strategy Games

pub mod combat;
pub mod core;
pub mod world;

pub use combat::{ActiveCombat, CombatEngine, CombatHistory, CombatPhase, CombatRecord, CombatWinner};
pub use core::{CombatConfig, CombatError, Result};
pub use world::{Army, ArmyRegistry, Commander};
