//! Terrain types and their combat modifiers

use serde::{Deserialize, Serialize};

use crate::core::types::HexCoord;

/// Terrain of the hex a combat takes place on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TerrainType {
    #[default]
    Plains,
    Forest,
    Hills,
    Mountain,
    Swamp,
    Desert,
}

/// Combat multipliers derived from terrain
///
/// Attackers fight at a disadvantage in rough terrain (`attacker_attack`
/// is at most 1.0); entrenched defenders strike harder
/// (`defender_defense` is at least 1.0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainModifier {
    pub attacker_attack: f64,
    pub defender_defense: f64,
}

impl TerrainType {
    pub fn modifier(&self) -> TerrainModifier {
        match self {
            TerrainType::Plains => TerrainModifier {
                attacker_attack: 1.0,
                defender_defense: 1.0,
            },
            TerrainType::Forest => TerrainModifier {
                attacker_attack: 0.9,
                defender_defense: 1.15,
            },
            TerrainType::Hills => TerrainModifier {
                attacker_attack: 0.9,
                defender_defense: 1.2,
            },
            TerrainType::Mountain => TerrainModifier {
                attacker_attack: 0.8,
                defender_defense: 1.3,
            },
            TerrainType::Swamp => TerrainModifier {
                attacker_attack: 0.85,
                defender_defense: 1.1,
            },
            TerrainType::Desert => TerrainModifier {
                attacker_attack: 0.95,
                defender_defense: 1.0,
            },
        }
    }
}

/// Host-provided terrain lookup
pub trait TerrainSource {
    fn terrain_at(&self, location: HexCoord) -> TerrainType;
}

/// Trivial terrain source: plains everywhere (tests and defaults)
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatWorld;

impl TerrainSource for FlatWorld {
    fn terrain_at(&self, _location: HexCoord) -> TerrainType {
        TerrainType::Plains
    }
}
