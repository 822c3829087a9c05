//! Structure templates and materialization.
//!
//! A structure is a list of cell patches applied in order relative to an
//! origin cell, plus an optional loot plan for one container cell. Patches
//! are written only after the load gate confirms the target partitions are
//! resident; the caller owns that protocol (see `loading` and the runtime).

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::geometry::{CellBox, CellPos};
use hollow_world_store::PersistentStore;

use super::config::ConfigError;
use super::events::{ContentEventKind, EventLog};
use super::loading;
use super::types::{self, ItemStack, RegionId, REGION_NETHER, REGION_OVERWORLD};
use super::world::{CellState, WorldGrid};

// === Template types =====================================================

/// Where a patch lands, relative to the structure origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum CellShape {
    Point { at: CellPos },
    Span { min: CellPos, max: CellPos },
}

impl CellShape {
    pub fn translated(&self, origin: CellPos) -> CellBox {
        match self {
            Self::Point { at } => CellBox::single(origin.offset(at.x, at.y, at.z)),
            Self::Span { min, max } => CellBox::spanning(
                origin.offset(min.x, min.y, min.z),
                origin.offset(max.x, max.y, max.z),
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellPatch {
    #[serde(flatten)]
    pub shape: CellShape,
    pub cell_type: String,
    #[serde(default)]
    pub state: CellState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootEntry {
    pub slot: u32,
    pub item: String,
    pub amount: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootPlan {
    /// Container cell, relative to the structure origin. One of the patches
    /// must have placed a container type there.
    pub container_offset: CellPos,
    pub entries: Vec<LootEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureDef {
    pub name: String,
    pub region: RegionId,
    /// Offset from the region's init origin to this structure's origin.
    pub origin_offset: CellPos,
    pub cells: Vec<CellPatch>,
    #[serde(default)]
    pub loot: Option<LootPlan>,
}

impl StructureDef {
    pub fn keep_alive_name(&self) -> String {
        loading::keep_alive_name(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructureSet {
    pub structures: Vec<StructureDef>,
}

impl StructureSet {
    pub fn for_region<'a>(&'a self, region: &'a str) -> impl Iterator<Item = &'a StructureDef> {
        self.structures
            .iter()
            .filter(move |def| def.region == region)
    }

    pub fn has_region(&self, region: &str) -> bool {
        self.structures.iter().any(|def| def.region == region)
    }

    pub fn load_json(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        let set = serde_json::from_str(&raw)?;
        Ok(set)
    }
}

impl Default for StructureSet {
    fn default() -> Self {
        default_structures()
    }
}

// === Built-in templates =================================================

fn span(min: (i32, i32, i32), max: (i32, i32, i32), cell_type: &str) -> CellPatch {
    CellPatch {
        shape: CellShape::Span {
            min: CellPos::new(min.0, min.1, min.2),
            max: CellPos::new(max.0, max.1, max.2),
        },
        cell_type: cell_type.to_string(),
        state: CellState::new(),
    }
}

fn point(at: (i32, i32, i32), cell_type: &str) -> CellPatch {
    CellPatch {
        shape: CellShape::Point {
            at: CellPos::new(at.0, at.1, at.2),
        },
        cell_type: cell_type.to_string(),
        state: CellState::new(),
    }
}

/// The shipped island templates: a grass starter island with a tree and a
/// supply chest, a sand outpost, and a netherrack foothold for the nether.
pub fn default_structures() -> StructureSet {
    let starter = StructureDef {
        name: "starter_island".to_string(),
        region: REGION_OVERWORLD.to_string(),
        origin_offset: CellPos::new(0, 0, 0),
        cells: vec![
            span((-2, -3, -2), (2, -2, 2), "dirt"),
            span((-2, -1, -2), (2, -1, 2), "grass_block"),
            span((-3, 3, -3), (-1, 5, -1), "oak_leaves"),
            span((-2, 0, -2), (-2, 3, -2), "oak_log"),
            point((2, 0, 2), "chest"),
        ],
        loot: Some(LootPlan {
            container_offset: CellPos::new(2, 0, 2),
            entries: vec![
                LootEntry {
                    slot: 11,
                    item: "ice".to_string(),
                    amount: 2,
                },
                LootEntry {
                    slot: 13,
                    item: "lava_bucket".to_string(),
                    amount: 1,
                },
                LootEntry {
                    slot: 15,
                    item: "melon_seeds".to_string(),
                    amount: 1,
                },
            ],
        }),
    };

    let sand = StructureDef {
        name: "sand_island".to_string(),
        region: REGION_OVERWORLD.to_string(),
        origin_offset: CellPos::new(14, 0, 0),
        cells: vec![
            span((-1, -2, -1), (1, -1, 1), "sand"),
            point((0, 0, 0), "cactus"),
        ],
        loot: None,
    };

    let nether = StructureDef {
        name: "nether_island".to_string(),
        region: REGION_NETHER.to_string(),
        origin_offset: CellPos::new(0, 0, 0),
        cells: vec![
            span((-2, -2, -2), (2, -1, 2), "netherrack"),
            point((2, 0, 2), "chest"),
        ],
        loot: Some(LootPlan {
            container_offset: CellPos::new(2, 0, 2),
            entries: vec![LootEntry {
                slot: 13,
                item: "obsidian".to_string(),
                amount: 4,
            }],
        }),
    };

    StructureSet {
        structures: vec![starter, sand, nether],
    }
}

// === Unlock flags =======================================================

pub fn region_unlocked(store: &PersistentStore, ns: &str, region: &str) -> bool {
    store.flag(&types::unlock_key(ns, region))
}

pub fn mark_region_unlocked(store: &mut PersistentStore, ns: &str, region: &str) {
    store.set(types::unlock_key(ns, region), true);
}

// === Materialization ====================================================

/// Apply every patch of `def` at `origin`, in template order. Later patches
/// overwrite earlier ones where they overlap.
pub fn write_structure(grid: &mut dyn WorldGrid, def: &StructureDef, origin: CellPos) {
    for patch in &def.cells {
        let shape = patch.shape.translated(origin);
        if shape.is_single_cell() {
            grid.write_cell_type(&def.region, shape.min, &patch.cell_type);
            if !patch.state.is_empty() {
                grid.write_cell_state(&def.region, shape.min, &patch.state);
            }
        } else {
            grid.fill_region(&def.region, shape, &patch.cell_type);
            if !patch.state.is_empty() {
                for cell in shape.cells() {
                    grid.write_cell_state(&def.region, cell, &patch.state);
                }
            }
        }
    }
}

/// Fill the structure's container per its loot plan. If no container is
/// present at the planned cell the loot is skipped and the skip is recorded;
/// the structure itself still stands.
pub fn fill_structure_loot(
    grid: &mut dyn WorldGrid,
    def: &StructureDef,
    origin: CellPos,
    log: &mut EventLog,
) {
    let plan = match &def.loot {
        Some(plan) => plan,
        None => return,
    };
    let at = origin.offset(
        plan.container_offset.x,
        plan.container_offset.y,
        plan.container_offset.z,
    );
    let slots = match grid.container_slots(&def.region, at) {
        Some(slots) => slots,
        None => {
            log.record(ContentEventKind::LootSkipped {
                structure: def.name.clone(),
                at,
            });
            return;
        }
    };
    for entry in &plan.entries {
        if entry.slot >= slots {
            continue;
        }
        let stack = ItemStack::new(entry.item.clone(), entry.amount);
        grid.write_container_slot(&def.region, at, entry.slot, &stack);
    }
}
