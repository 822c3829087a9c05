//! Tests for the content module.

use super::*;
use crate::geometry::{partitions_within, CellBox, CellPos, Face, PartitionPos, WorldPos};
use hollow_world_store::PersistentStore;
use std::collections::{BTreeMap, BTreeSet};

/// In-memory world double. A cell reads back only while its partition is in
/// `resident`; an unset cell in a resident partition reads as air. Every
/// cell write bumps `writes` so pause paths can assert no mutation happened.
struct FakeGrid {
    cells: BTreeMap<(String, CellPos), CellRecord>,
    resident: BTreeSet<(String, PartitionPos)>,
    biomes: BTreeMap<(String, PartitionPos), BiomeId>,
    containers: BTreeMap<(String, CellPos), u32>,
    slots_written: Vec<(CellPos, u32, ItemStack)>,
    keep_alives: BTreeMap<(String, String), (CellPos, i32)>,
    spawn: CellPos,
    writes: usize,
}

impl FakeGrid {
    fn new() -> Self {
        Self {
            cells: BTreeMap::new(),
            resident: BTreeSet::new(),
            biomes: BTreeMap::new(),
            containers: BTreeMap::new(),
            slots_written: Vec::new(),
            keep_alives: BTreeMap::new(),
            spawn: CellPos::new(0, 64, 0),
            writes: 0,
        }
    }

    fn make_resident(&mut self, region: &str, partition: PartitionPos) {
        self.resident.insert((region.to_string(), partition));
    }

    /// Write a cell directly and make its partition resident.
    fn set_cell(&mut self, region: &str, cell: CellPos, cell_type: &str) {
        self.make_resident(region, cell.partition());
        self.cells
            .insert((region.to_string(), cell), CellRecord::new(cell_type));
    }

    fn set_biome(&mut self, region: &str, partition: PartitionPos, biome: &str) {
        self.biomes
            .insert((region.to_string(), partition), biome.to_string());
    }

    fn add_container(&mut self, region: &str, cell: CellPos, slots: u32) {
        self.containers.insert((region.to_string(), cell), slots);
    }

    fn cell_type(&self, region: &str, cell: CellPos) -> Option<String> {
        self.cells
            .get(&(region.to_string(), cell))
            .map(|record| record.cell_type.clone())
    }
}

impl WorldGrid for FakeGrid {
    fn is_partition_resident(&self, region: &str, partition: PartitionPos) -> bool {
        self.resident.contains(&(region.to_string(), partition))
    }

    fn read_cell(&self, region: &str, cell: CellPos) -> Option<CellRecord> {
        if !self.is_partition_resident(region, cell.partition()) {
            return None;
        }
        Some(
            self.cells
                .get(&(region.to_string(), cell))
                .cloned()
                .unwrap_or_else(|| CellRecord::new("air")),
        )
    }

    fn write_cell_type(&mut self, region: &str, cell: CellPos, cell_type: &str) {
        self.writes += 1;
        self.cells
            .insert((region.to_string(), cell), CellRecord::new(cell_type));
    }

    fn write_cell_state(&mut self, region: &str, cell: CellPos, state: &CellState) {
        self.writes += 1;
        let record = self
            .cells
            .entry((region.to_string(), cell))
            .or_insert_with(|| CellRecord::new("air"));
        for (key, value) in state {
            record.state.insert(key.clone(), value.clone());
        }
    }

    fn fill_region(&mut self, region: &str, shape: CellBox, cell_type: &str) {
        for cell in shape.cells() {
            self.write_cell_type(region, cell, cell_type);
        }
    }

    fn region_biome(&self, region: &str, cell: CellPos) -> Option<BiomeId> {
        self.biomes
            .get(&(region.to_string(), cell.partition()))
            .cloned()
    }

    fn container_slots(&self, region: &str, cell: CellPos) -> Option<u32> {
        self.containers.get(&(region.to_string(), cell)).copied()
    }

    fn write_container_slot(
        &mut self,
        region: &str,
        cell: CellPos,
        slot: u32,
        stack: &ItemStack,
    ) -> bool {
        if !self.containers.contains_key(&(region.to_string(), cell)) {
            return false;
        }
        self.slots_written.push((cell, slot, stack.clone()));
        true
    }

    fn add_keep_alive(&mut self, region: &str, name: &str, center: CellPos, radius: i32) {
        self.keep_alives
            .insert((region.to_string(), name.to_string()), (center, radius));
    }

    fn remove_keep_alive(&mut self, region: &str, name: &str) -> bool {
        self.keep_alives
            .remove(&(region.to_string(), name.to_string()))
            .is_some()
    }

    fn default_spawn(&self, _region: &str) -> CellPos {
        self.spawn
    }
}

fn survival_actor(id: &str, x: f64, y: f64, z: f64) -> ActorRecord {
    ActorRecord::new(
        id,
        id,
        REGION_OVERWORLD,
        WorldPos::new(x, y, z),
        CapabilityTier::Mid,
    )
}

/// Config with short intervals so runtime tests stay a few dozen ticks long.
fn quick_config() -> ContentConfig {
    let mut config = ContentConfig::default();
    config.seed = 7;
    config.init.retry_interval = 1;
    config.init.suspend_interval = 1;
    config.init.suspend_repeats = 2;
    config.build.poll_interval = 2;
    config.build.timeout_ticks = 8;
    config.build.release_grace = 2;
    config.scan.sweep_interval = 2;
    config.scan.rescan_window = 4;
    config.vault.sweep_interval = 2;
    config.vault.dispense_delay = 2;
    config.vault.eject_interval = 2;
    config.vault.arm_margin = 3;
    config.vault.cooldown_ticks = 50;
    config.growth.start_delay = 2;
    config.growth.sweep_interval = 2;
    config.growth.countdown_min = 4;
    config.growth.countdown_max = 8;
    config.growth.countdown_step = 2;
    config.sanitized()
}

fn count_events(events: &[ContentEvent], pred: impl Fn(&ContentEventKind) -> bool) -> usize {
    events.iter().filter(|event| pred(&event.kind)).count()
}

mod basics;
mod structures;
mod vault;
