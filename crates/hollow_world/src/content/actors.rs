//! Actor presence tracking.
//!
//! The registry mirrors what the host reports about connected actors: where
//! they are, what they hold, and what mode they are in. Subsystems read it
//! instead of querying the host directly, so sweeps see one consistent
//! snapshot per tick.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geometry::{PartitionPos, WorldPos};

use super::types::{ActorId, ActorMode, CapabilityTier, ItemStack, RegionId, Tick};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorRecord {
    pub id: ActorId,
    pub name: String,
    pub region: RegionId,
    pub pos: WorldPos,
    pub mode: ActorMode,
    pub held_item: Option<ItemStack>,
    pub capability: CapabilityTier,
    /// Effective structure-scan radius in partitions.
    pub scan_radius: i32,
    /// Last partition a scan sweep evaluated this actor from.
    pub last_partition: Option<PartitionPos>,
    pub last_scan_tick: Option<Tick>,
    /// Set while the actor's next thrown projectile should convert terrain.
    pub conversion_primed: bool,
}

impl ActorRecord {
    pub fn new(
        id: impl Into<ActorId>,
        name: impl Into<String>,
        region: impl Into<RegionId>,
        pos: WorldPos,
        capability: CapabilityTier,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            region: region.into(),
            pos,
            mode: ActorMode::default(),
            held_item: None,
            capability,
            scan_radius: capability.scan_radius(),
            last_partition: None,
            last_scan_tick: None,
            conversion_primed: false,
        }
    }

    pub fn partition(&self) -> PartitionPos {
        PartitionPos::of_world(self.pos)
    }

    pub fn held_item_id(&self) -> Option<&str> {
        self.held_item.as_ref().map(|stack| stack.item.as_str())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActorRegistry {
    actors: BTreeMap<ActorId, ActorRecord>,
}

impl ActorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an actor record. Returns true when the actor was
    /// not previously registered.
    pub fn register(&mut self, record: ActorRecord) -> bool {
        self.actors.insert(record.id.clone(), record).is_none()
    }

    pub fn deregister(&mut self, id: &str) -> Option<ActorRecord> {
        self.actors.remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&ActorRecord> {
        self.actors.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut ActorRecord> {
        self.actors.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.actors.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActorRecord> {
        self.actors.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ActorRecord> {
        self.actors.values_mut()
    }

    pub fn ids(&self) -> Vec<ActorId> {
        self.actors.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    pub fn update_presence(&mut self, id: &str, region: &str, pos: WorldPos) {
        if let Some(record) = self.actors.get_mut(id) {
            if record.region != region {
                record.region = region.to_string();
            }
            record.pos = pos;
        }
    }

    pub fn update_held_item(&mut self, id: &str, held: Option<ItemStack>) {
        if let Some(record) = self.actors.get_mut(id) {
            record.held_item = held;
        }
    }

    pub fn update_mode(&mut self, id: &str, mode: ActorMode) {
        if let Some(record) = self.actors.get_mut(id) {
            record.mode = mode;
        }
    }
}
