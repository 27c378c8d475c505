//! Core types, errors, and configuration shared across the crate

pub mod config;
pub mod error;
pub mod types;

pub use config::CombatConfig;
pub use error::{CombatError, Result};
pub use types::{ArmyId, BuildingId, CombatId, HexCoord, Seconds, VillagerGroupId};
