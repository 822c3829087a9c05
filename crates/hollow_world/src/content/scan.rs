//! Deduplicated circular partition scan.
//!
//! Each tracked actor sweeps the partitions within its capability radius and
//! applies replacement rules to ones it has not seen before. A partition is
//! evaluated at most once ever: its visited flag is set after evaluation
//! whether or not any rule matched, and the flag is persisted. Skips for
//! unresident partitions leave the flag unset so the partition is evaluated
//! once it loads.

use serde::{Deserialize, Serialize};

use crate::geometry::{partitions_within, CellPos, PartitionPos, PARTITION_SIZE};
use hollow_world_store::PersistentStore;

use super::actors::ActorRecord;
use super::events::{ContentEventKind, EventLog};
use super::types::{self, BiomeId, CellTypeId, RegionId, SoundId, Tick};
use super::world::{CellState, WorldGrid};

/// Biome gate for a rule: the partition qualifies when the region reports
/// this biome at the partition's center column at `probe_y`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiomeProbe {
    pub biome: BiomeId,
    pub probe_y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchBounds {
    pub min_y: i32,
    pub max_y: i32,
}

/// Replace the first matching cell in a partition with another type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacementRule {
    pub name: String,
    pub target_cell: CellTypeId,
    pub replace_with: CellTypeId,
    #[serde(default)]
    pub state: CellState,
    #[serde(default)]
    pub biome: Option<BiomeProbe>,
    pub search: SearchBounds,
    #[serde(default)]
    pub sound: Option<SoundId>,
    #[serde(default)]
    pub summon: Option<String>,
}

/// One cell rewrite performed by a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub region: RegionId,
    pub cell: CellPos,
    pub cell_type: CellTypeId,
    pub rule: String,
}

#[derive(Debug, Clone)]
pub struct ChunkScanner {
    ns: String,
    rules: Vec<ReplacementRule>,
    rescan_window: u64,
    max_radius: i32,
}

impl ChunkScanner {
    pub fn new(
        ns: impl Into<String>,
        rules: Vec<ReplacementRule>,
        rescan_window: u64,
        max_radius: i32,
    ) -> Self {
        Self {
            ns: ns.into(),
            rules,
            rescan_window,
            max_radius,
        }
    }

    pub fn rules(&self) -> &[ReplacementRule] {
        &self.rules
    }

    /// One sweep for one actor. Skips entirely when the actor is still in
    /// the partition it was last swept from and the rescan window has not
    /// elapsed; otherwise walks every partition within the actor's radius.
    pub fn sweep_actor(
        &self,
        store: &mut PersistentStore,
        grid: &mut dyn WorldGrid,
        actor: &mut ActorRecord,
        now: Tick,
        log: &mut EventLog,
    ) -> Vec<Replacement> {
        let current = actor.partition();
        if actor.last_partition == Some(current) {
            if let Some(last) = actor.last_scan_tick {
                if now.saturating_sub(last) < self.rescan_window {
                    return Vec::new();
                }
            }
        }
        actor.last_partition = Some(current);
        actor.last_scan_tick = Some(now);

        let radius = actor.scan_radius.min(self.max_radius);
        let mut replaced = Vec::new();
        for partition in partitions_within(current, radius) {
            let key = types::visited_key(&self.ns, partition);
            if store.flag(&key) {
                continue;
            }
            if !grid.is_partition_resident(&actor.region, partition) {
                continue;
            }
            if let Some(hit) = self.apply_rules(grid, &actor.region, partition, log) {
                replaced.push(hit);
            }
            store.set(key, true);
        }
        replaced
    }

    /// First rule whose gates pass wins; later rules are not consulted for
    /// this partition.
    fn apply_rules(
        &self,
        grid: &mut dyn WorldGrid,
        region: &str,
        partition: PartitionPos,
        log: &mut EventLog,
    ) -> Option<Replacement> {
        for rule in &self.rules {
            if let Some(probe) = &rule.biome {
                let at = partition.center_cell(probe.probe_y);
                if grid.region_biome(region, at).as_deref() != Some(probe.biome.as_str()) {
                    continue;
                }
            }
            let found = match find_first_cell(grid, region, partition, &rule.search, &rule.target_cell)
            {
                Some(cell) => cell,
                None => continue,
            };
            grid.write_cell_type(region, found, &rule.replace_with);
            if !rule.state.is_empty() {
                grid.write_cell_state(region, found, &rule.state);
            }
            if let Some(sound) = &rule.sound {
                log.record(ContentEventKind::SoundPlayed {
                    sound: sound.clone(),
                    at: found.center(),
                    to_actor: None,
                });
            }
            if let Some(entity) = &rule.summon {
                log.record(ContentEventKind::EntitySummoned {
                    entity: entity.clone(),
                    at: found.center(),
                });
            }
            log.record(ContentEventKind::CellReplaced {
                region: region.to_string(),
                at: found,
                rule: rule.name.clone(),
            });
            return Some(Replacement {
                region: region.to_string(),
                cell: found,
                cell_type: rule.replace_with.clone(),
                rule: rule.name.clone(),
            });
        }
        None
    }
}

/// Row-scan the partition's columns between the rule's y bounds for the
/// first cell of the target type.
fn find_first_cell(
    grid: &dyn WorldGrid,
    region: &str,
    partition: PartitionPos,
    bounds: &SearchBounds,
    target: &str,
) -> Option<CellPos> {
    for y in bounds.min_y..=bounds.max_y {
        let anchor = partition.anchor(y);
        for dx in 0..PARTITION_SIZE {
            for dz in 0..PARTITION_SIZE {
                let cell = anchor.offset(dx, 0, dz);
                match grid.read_cell(region, cell) {
                    Some(record) if record.cell_type == target => return Some(cell),
                    _ => {}
                }
            }
        }
    }
    None
}
