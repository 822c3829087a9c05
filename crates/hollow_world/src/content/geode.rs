//! Geode growth countdowns.
//!
//! Registering a growth puts a persisted countdown key on an anchor cell.
//! The periodic sweep walks every key: anchors that stopped holding the
//! growable type are abandoned, anchors on unresident partitions pause, and
//! anchors whose two-shell enclosure is wrong get a fresh countdown. A valid
//! anchor counts down by the sweep interval and converts to the grown type
//! the evaluation it reaches zero.

use serde::{Deserialize, Serialize};

use crate::geometry::CellPos;
use hollow_world_store::PersistentStore;

use super::config::GrowthTuning;
use super::events::{ContentEventKind, EventLog};
use super::rng::WorldRng;
use super::types;
use super::world::WorldGrid;

/// The 6 orthogonally adjacent cells that must hold the inner shell type.
pub const INNER_OFFSETS: [(i32, i32, i32); 6] = [
    (0, 1, 0),
    (0, 0, -1),
    (1, 0, 0),
    (0, 0, 1),
    (-1, 0, 0),
    (0, -1, 0),
];

/// The 18 second-shell cells that must hold the outer shell type.
pub const OUTER_OFFSETS: [(i32, i32, i32); 18] = [
    (0, 2, 0),
    (0, 1, -1),
    (1, 1, 0),
    (0, 1, 1),
    (-1, 1, 0),
    (0, 0, -2),
    (1, 0, -1),
    (2, 0, 0),
    (1, 0, 1),
    (0, 0, 2),
    (-1, 0, 1),
    (-2, 0, 0),
    (-1, 0, -1),
    (0, -2, 0),
    (0, -1, -1),
    (1, -1, 0),
    (0, -1, 1),
    (-1, -1, 0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShellCheck {
    Valid,
    Invalid,
    /// A required read landed on an unresident partition; no verdict.
    Indeterminate,
}

#[derive(Debug, Clone)]
pub struct GrowthMonitor {
    ns: String,
    tuning: GrowthTuning,
}

impl GrowthMonitor {
    pub fn new(ns: impl Into<String>, tuning: GrowthTuning) -> Self {
        Self {
            ns: ns.into(),
            tuning,
        }
    }

    pub fn tuning(&self) -> &GrowthTuning {
        &self.tuning
    }

    /// Fresh countdown: uniform over the configured range, rounded to the
    /// configured step, both ends inclusive.
    pub fn random_countdown(&self, rng: &mut WorldRng) -> i64 {
        let min = self.tuning.countdown_min;
        let max = self.tuning.countdown_max;
        let step = self.tuning.countdown_step.max(1);
        if max <= min {
            return min;
        }
        min + rng.range_i64(0, (max - min) / step) * step
    }

    /// Start (or restart) a countdown on `cell`.
    pub fn register(
        &self,
        store: &mut PersistentStore,
        region: &str,
        cell: CellPos,
        rng: &mut WorldRng,
        log: &mut EventLog,
    ) -> i64 {
        let countdown = self.random_countdown(rng);
        store.set(types::growth_key(&self.ns, region, cell), countdown);
        log.record(ContentEventKind::GrowthRegistered {
            region: region.to_string(),
            cell,
            countdown,
        });
        countdown
    }

    pub fn unregister(&self, store: &mut PersistentStore, region: &str, cell: CellPos) -> bool {
        store.remove(&types::growth_key(&self.ns, region, cell)).is_some()
    }

    pub fn is_registered(&self, store: &PersistentStore, region: &str, cell: CellPos) -> bool {
        store.contains(&types::growth_key(&self.ns, region, cell))
    }

    /// One periodic pass over every tracked countdown.
    pub fn sweep(
        &self,
        store: &mut PersistentStore,
        grid: &mut dyn WorldGrid,
        rng: &mut WorldRng,
        log: &mut EventLog,
    ) {
        let keys = store.keys_with_prefix(&types::growth_prefix(&self.ns));
        for key in keys {
            let (region, cell) = match types::parse_growth_key(&self.ns, &key) {
                Some(parsed) => parsed,
                None => {
                    store.remove(&key);
                    continue;
                }
            };
            let record = match grid.read_cell(&region, cell) {
                Some(record) => record,
                // Unresident partition: pause, no mutation.
                None => continue,
            };
            if record.cell_type != self.tuning.anchor_cell {
                store.remove(&key);
                log.record(ContentEventKind::GrowthAbandoned {
                    region: region.clone(),
                    cell,
                });
                continue;
            }
            match self.validate_shell(grid, &region, cell) {
                ShellCheck::Indeterminate => continue,
                ShellCheck::Invalid => {
                    let fresh = self.random_countdown(rng);
                    store.set(key, fresh);
                    log.record(ContentEventKind::GrowthReset {
                        region: region.clone(),
                        cell,
                        countdown: fresh,
                    });
                }
                ShellCheck::Valid => {
                    let next = (store.count(&key) - self.tuning.sweep_interval as i64).max(0);
                    if next == 0 {
                        grid.write_cell_type(&region, cell, &self.tuning.grown_cell);
                        store.remove(&key);
                        log.record(ContentEventKind::GrowthCompleted {
                            region: region.clone(),
                            cell,
                        });
                    } else {
                        store.set(key, next);
                    }
                }
            }
        }
    }

    /// Check the enclosure around `cell`: all 6 inner offsets must hold the
    /// inner type and all 18 outer offsets the outer type. The first
    /// unreadable cell makes the whole check indeterminate; the first
    /// mismatch makes it invalid.
    pub fn validate_shell(&self, grid: &dyn WorldGrid, region: &str, cell: CellPos) -> ShellCheck {
        for (dx, dy, dz) in INNER_OFFSETS {
            match grid.read_cell(region, cell.offset(dx, dy, dz)) {
                None => return ShellCheck::Indeterminate,
                Some(record) if record.cell_type != self.tuning.inner_cell => {
                    return ShellCheck::Invalid
                }
                Some(_) => {}
            }
        }
        for (dx, dy, dz) in OUTER_OFFSETS {
            match grid.read_cell(region, cell.offset(dx, dy, dz)) {
                None => return ShellCheck::Indeterminate,
                Some(record) if record.cell_type != self.tuning.outer_cell => {
                    return ShellCheck::Invalid
                }
                Some(_) => {}
            }
        }
        ShellCheck::Valid
    }
}
