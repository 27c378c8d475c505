use thiserror::Error;

use crate::core::types::{ArmyId, CombatId};

#[derive(Error, Debug)]
pub enum CombatError {
    #[error("Army not found: {0:?}")]
    ArmyNotFound(ArmyId),

    #[error("Combat not found: {0:?}")]
    CombatNotFound(CombatId),

    #[error("Army already in an active combat: {0:?}")]
    AlreadyInCombat(ArmyId),

    #[error("Army not in any active combat: {0:?}")]
    NotInCombat(ArmyId),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CombatError>;
