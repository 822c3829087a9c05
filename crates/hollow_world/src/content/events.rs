//! Journal of externally visible side effects and lifecycle facts.
//!
//! The runtime records everything a host must render (sounds, particles,
//! item spawns, teleports) and everything an operator or test would want to
//! observe (state changes, rejections, abandoned builds) as ordered
//! [`ContentEvent`] entries. The host drains the log each tick.

use serde::{Deserialize, Serialize};

use crate::geometry::{CellPos, WorldPos, WorldVec};

use super::types::{
    ActorId, ContentError, ItemStack, ItemTypeId, ParticleId, RegionId, RejectReason, SoundId,
    Tick, VaultState, VaultVariant,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEvent {
    pub seq: u64,
    pub tick: Tick,
    pub kind: ContentEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ContentEventKind {
    // Host-rendered side effects
    SoundPlayed {
        sound: SoundId,
        at: WorldPos,
        to_actor: Option<ActorId>,
    },
    ParticleSpawned {
        particle: ParticleId,
        at: WorldPos,
    },
    ItemSpawned {
        stack: ItemStack,
        at: WorldPos,
        impulse: Option<WorldVec>,
    },
    ActorTeleported {
        actor: ActorId,
        to: WorldPos,
    },
    HeldItemConsumed {
        actor: ActorId,
        item: ItemTypeId,
    },
    EntitySummoned {
        entity: String,
        at: WorldPos,
    },
    // Lifecycle facts
    RegionUnlocked {
        region: RegionId,
    },
    StructureQueued {
        structure: String,
        origin: CellPos,
    },
    StructureMaterialized {
        structure: String,
        origin: CellPos,
    },
    StructureAbandoned {
        structure: String,
        origin: CellPos,
        error: ContentError,
    },
    LootSkipped {
        structure: String,
        at: CellPos,
    },
    VaultStateChanged {
        region: RegionId,
        cell: CellPos,
        from: VaultState,
        to: VaultState,
    },
    VariantToggled {
        region: RegionId,
        cell: CellPos,
        from: VaultVariant,
        to: VaultVariant,
    },
    InteractionRejected {
        actor: ActorId,
        at: CellPos,
        reason: RejectReason,
    },
    CooldownArmed {
        actor: ActorId,
        cell: CellPos,
        value: i64,
    },
    CellReplaced {
        region: RegionId,
        at: CellPos,
        rule: String,
    },
    GrowthRegistered {
        region: RegionId,
        cell: CellPos,
        countdown: i64,
    },
    GrowthReset {
        region: RegionId,
        cell: CellPos,
        countdown: i64,
    },
    GrowthAbandoned {
        region: RegionId,
        cell: CellPos,
    },
    GrowthCompleted {
        region: RegionId,
        cell: CellPos,
    },
    ConversionApplied {
        region: RegionId,
        cells_changed: usize,
    },
    TransientReset {
        keys_removed: usize,
    },
}

/// Append-only event log with a monotonic sequence and the current tick
/// stamped onto each record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    entries: Vec<ContentEvent>,
    next_seq: u64,
    now: Tick,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_now(&mut self, tick: Tick) {
        self.now = tick;
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    pub fn record(&mut self, kind: ContentEventKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(ContentEvent {
            seq,
            tick: self.now,
            kind,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[ContentEvent] {
        &self.entries
    }

    pub fn drain(&mut self) -> Vec<ContentEvent> {
        std::mem::take(&mut self.entries)
    }
}
