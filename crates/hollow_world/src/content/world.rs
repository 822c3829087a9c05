//! The host world seam: per-cell reads and writes, biome queries, partition
//! residency, containers, and keep-alive reservations.
//!
//! A `read_cell` returning `None` means the cell is unreachable right now
//! (its partition is not resident); a resident cell always reads as some
//! concrete record, air included.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geometry::{CellBox, CellPos, PartitionPos};

use super::types::{BiomeId, CellTypeId, ItemStack};

/// Scalar cell-state value (the host's block permutation shapes).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Flag(bool),
    Count(i64),
    Text(String),
}

impl StateValue {
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        Self::Flag(value)
    }
}

impl From<i64> for StateValue {
    fn from(value: i64) -> Self {
        Self::Count(value)
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

pub type CellState = BTreeMap<String, StateValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellRecord {
    pub cell_type: CellTypeId,
    #[serde(default)]
    pub state: CellState,
}

impl CellRecord {
    pub fn new(cell_type: impl Into<String>) -> Self {
        Self {
            cell_type: cell_type.into(),
            state: CellState::new(),
        }
    }

    pub fn with_state(mut self, key: impl Into<String>, value: impl Into<StateValue>) -> Self {
        self.state.insert(key.into(), value.into());
        self
    }

    pub fn state_text(&self, key: &str) -> Option<&str> {
        self.state.get(key).and_then(StateValue::as_text)
    }
}

/// Object-safe view of the host world. All writes are best-effort against
/// resident partitions; the protocols in this crate ensure residency before
/// writing.
pub trait WorldGrid {
    fn is_partition_resident(&self, region: &str, partition: PartitionPos) -> bool;

    fn read_cell(&self, region: &str, cell: CellPos) -> Option<CellRecord>;

    fn write_cell_type(&mut self, region: &str, cell: CellPos, cell_type: &str);

    /// Merge the given state entries into the cell's state.
    fn write_cell_state(&mut self, region: &str, cell: CellPos, state: &CellState);

    fn fill_region(&mut self, region: &str, shape: CellBox, cell_type: &str);

    fn region_biome(&self, region: &str, cell: CellPos) -> Option<BiomeId>;

    /// Slot count of a container at the cell, or `None` if no container is
    /// present there.
    fn container_slots(&self, region: &str, cell: CellPos) -> Option<u32>;

    fn write_container_slot(&mut self, region: &str, cell: CellPos, slot: u32, stack: &ItemStack)
        -> bool;

    fn add_keep_alive(&mut self, region: &str, name: &str, center: CellPos, radius: i32);

    fn remove_keep_alive(&mut self, region: &str, name: &str) -> bool;

    fn default_spawn(&self, region: &str) -> CellPos;
}
