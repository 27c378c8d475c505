//! Host-side entities the combat engine consumes as collaborators

pub mod army;
pub mod building;
pub mod villagers;

pub use army::{Army, ArmyRegistry, Commander};
pub use building::Building;
pub use villagers::{VillagerGroup, VILLAGER_HP};
