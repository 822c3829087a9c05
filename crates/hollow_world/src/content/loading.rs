//! Partition residency gating.
//!
//! Structure writes must not race partition loading: a write against an
//! unresident partition is silently lost on some hosts and truncated on
//! others. The gate polls a probe cell until it reads back, bounded by a
//! timeout; the reservation holds the surrounding partitions resident until
//! the writes land.

use serde::{Deserialize, Serialize};

use crate::geometry::CellPos;

use super::types::{RegionId, Tick};
use super::world::WorldGrid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatePoll {
    Ready,
    Waiting,
    TimedOut,
}

/// Polls one probe cell until its partition is resident.
#[derive(Debug, Clone)]
pub struct PartitionLoadGate {
    region: RegionId,
    probe: CellPos,
    poll_interval: Tick,
    timeout_ticks: Tick,
    waited: Tick,
}

impl PartitionLoadGate {
    pub fn new(
        region: impl Into<RegionId>,
        probe: CellPos,
        poll_interval: Tick,
        timeout_ticks: Tick,
    ) -> Self {
        Self {
            region: region.into(),
            probe,
            poll_interval: poll_interval.max(1),
            timeout_ticks,
            waited: 0,
        }
    }

    pub fn probe(&self) -> CellPos {
        self.probe
    }

    pub fn waited(&self) -> Tick {
        self.waited
    }

    /// One poll attempt. Call once per `poll_interval` ticks.
    pub fn poll(&mut self, grid: &dyn WorldGrid) -> GatePoll {
        if grid.read_cell(&self.region, self.probe).is_some() {
            return GatePoll::Ready;
        }
        self.waited += self.poll_interval;
        if self.waited >= self.timeout_ticks {
            GatePoll::TimedOut
        } else {
            GatePoll::Waiting
        }
    }
}

/// Stable keep-alive name for a structure build.
pub fn keep_alive_name(structure: &str) -> String {
    structure
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() {
                ch.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// A named keep-alive registration that pins partitions around a center cell.
/// Releasing twice is a no-op.
#[derive(Debug, Clone)]
pub struct TickingReservation {
    region: RegionId,
    name: String,
    center: CellPos,
    radius: i32,
    active: bool,
}

impl TickingReservation {
    pub fn create(
        grid: &mut dyn WorldGrid,
        region: impl Into<RegionId>,
        name: impl Into<String>,
        center: CellPos,
        radius: i32,
    ) -> Self {
        let region = region.into();
        let name = name.into();
        grid.add_keep_alive(&region, &name, center, radius);
        Self {
            region,
            name,
            center,
            radius,
            active: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn center(&self) -> CellPos {
        self.center
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn release(&mut self, grid: &mut dyn WorldGrid) -> bool {
        if !self.active {
            return false;
        }
        self.active = false;
        grid.remove_keep_alive(&self.region, &self.name)
    }
}
