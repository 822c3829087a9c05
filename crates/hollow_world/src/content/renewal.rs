//! Terrain renewal: catalyst-splash conversion and special break drops.
//!
//! The conversion chain lets an actor throw a catalyst potion to turn a
//! small pocket of base rock into its deep variant. The break rules award
//! drops the host would otherwise never give, gated on mode, tool, and
//! enchantments.

use crate::geometry::{CellBox, Face, WorldPos};

use super::config::RenewalTuning;
use super::events::{ContentEventKind, EventLog};
use super::rng::WorldRng;
use super::types::{ActorMode, ItemStack};
use super::world::WorldGrid;

/// Center of a splash effect. Components sit on the +0.5 cell center of the
/// floored hit, except the component facing a negative direction when the
/// projectile struck the North, West, or Down face.
pub fn effect_center(hit: WorldPos, face: Option<Face>) -> WorldPos {
    let base = hit.floor_cell();
    let x = base.x as f64 + if face == Some(Face::West) { -0.5 } else { 0.5 };
    let y = base.y as f64 + if face == Some(Face::Down) { -0.5 } else { 0.5 };
    let z = base.z as f64 + if face == Some(Face::North) { -0.5 } else { 0.5 };
    WorldPos::new(x, y, z)
}

/// Rewrite every matching cell in the conversion radius around `center`.
/// Returns the number of cells changed.
pub fn convert_cells(
    grid: &mut dyn WorldGrid,
    region: &str,
    center: WorldPos,
    tuning: &RenewalTuning,
    log: &mut EventLog,
) -> usize {
    let shape = CellBox::around(center, tuning.convert_radius);
    let mut changed = 0;
    for cell in shape.cells() {
        match grid.read_cell(region, cell) {
            Some(record) if record.cell_type == tuning.from_cell => {
                grid.write_cell_type(region, cell, &tuning.to_cell);
                changed += 1;
            }
            _ => {}
        }
    }
    if changed > 0 {
        log.record(ContentEventKind::ConversionApplied {
            region: region.to_string(),
            cells_changed: changed,
        });
    }
    changed
}

/// Outcome of a break attempt: whether the break proceeds and any extra
/// drop this content awards on top of the host's own.
#[derive(Debug, Clone, PartialEq)]
pub struct BreakVerdict {
    pub allow: bool,
    pub extra_drop: Option<ItemStack>,
}

impl BreakVerdict {
    pub fn plain() -> Self {
        Self {
            allow: true,
            extra_drop: None,
        }
    }
}

/// Extra drop for breaking `cell_type`, if any.
///
/// Drops are survival-only and never awarded to the excluded tool. The
/// flowered leaves roll a blossom on a fortune-scaled chance unless silk
/// touch is present; the crystal anchor drops itself only for silk touch on
/// an allowlisted tool.
pub fn evaluate_break(
    tuning: &RenewalTuning,
    mode: ActorMode,
    held: Option<&ItemStack>,
    cell_type: &str,
    rng: &mut WorldRng,
) -> Option<ItemStack> {
    if mode != ActorMode::Survival {
        return None;
    }
    let held_id = held.map(|stack| stack.item.as_str());
    if held_id == Some(tuning.excluded_tool.as_str()) {
        return None;
    }
    let silk = held.map_or(false, |stack| stack.enchant_level("silk_touch") > 0);

    if cell_type == tuning.leaves_cell {
        if silk {
            return None;
        }
        let fortune = held.map_or(0, |stack| stack.enchant_level("fortune")).min(3);
        let chance = tuning.blossom_chance * (1 + fortune) as f64;
        if rng.chance(chance) {
            return Some(ItemStack::new(tuning.blossom_item.clone(), 1));
        }
        return None;
    }

    if cell_type == tuning.crystal_cell {
        let allowed = held_id.map_or(false, |id| {
            tuning.crystal_tools.iter().any(|tool| tool == id)
        });
        if silk && allowed {
            return Some(ItemStack::new(tuning.crystal_cell.clone(), 1));
        }
        return None;
    }

    None
}
