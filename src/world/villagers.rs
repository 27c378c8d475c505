//! Villager groups as raid targets

use serde::{Deserialize, Serialize};

use crate::core::types::{HexCoord, VillagerGroupId};

/// Hit points of a single villager
pub const VILLAGER_HP: f64 = 25.0;

/// A group of unarmed villagers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VillagerGroup {
    pub id: VillagerGroupId,
    pub owner: String,
    pub location: HexCoord,
    count: u32,
}

impl VillagerGroup {
    pub fn new(owner: impl Into<String>, location: HexCoord, count: u32) -> Self {
        Self {
            id: VillagerGroupId::new(),
            owner: owner.into(),
            location,
            count,
        }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Remove up to `count` villagers, returning how many were removed
    pub fn remove_villagers(&mut self, count: u32) -> u32 {
        let removed = self.count.min(count);
        self.count -= removed;
        removed
    }
}
