//! Hollow-world content module - region bootstrap, vault rewards, and world
//! renewal over a durable store and a tick scheduler.
//!
//! This module is organized into submodules:
//! - `types`: Core type definitions (IDs, constants, keys, errors)
//! - `world`: Cell records and the `WorldGrid` host trait
//! - `events`: The observable journal of content effects
//! - `rng`: Deterministic random draws
//! - `scheduler`: Tick-driven one-shot and periodic tasks
//! - `actors`: Actor presence tracking
//! - `config`: TOML-backed tuning for every subsystem
//! - `loading`: Partition load gating and keep-alive reservations
//! - `structures`: Region unlock flags and structure materialization
//! - `vault`: Reward vault state machine and per-actor cooldowns
//! - `scan`: Deduplicated partition scan and cell replacement
//! - `geode`: Growth countdowns with shell validation
//! - `renewal`: Terrain conversion chain and break drops
//! - `runtime`: ContentRuntime, which wires host callbacks onto all of the above

mod actors;
mod config;
mod events;
mod geode;
mod loading;
mod renewal;
mod rng;
mod runtime;
mod scan;
mod scheduler;
mod structures;
mod types;
mod vault;
mod world;

#[cfg(test)]
mod tests;

// Re-export all public types
pub use actors::{ActorRecord, ActorRegistry};
pub use config::{
    default_scan_rules, AdminTuning, BuildTuning, ConfigError, ContentConfig, GrowthTuning,
    InitTuning, RenewalTuning, ScanTuning, VaultTuning, DEFAULT_CONFIG_FILE_NAME,
};
pub use events::{ContentEvent, ContentEventKind, EventLog};
pub use geode::{GrowthMonitor, ShellCheck, INNER_OFFSETS, OUTER_OFFSETS};
pub use loading::{keep_alive_name, GatePoll, PartitionLoadGate, TickingReservation};
pub use renewal::{convert_cells, effect_center, evaluate_break, BreakVerdict};
pub use rng::WorldRng;
pub use runtime::{CellInteraction, ContentRuntime};
pub use scan::{BiomeProbe, ChunkScanner, Replacement, ReplacementRule, SearchBounds};
pub use scheduler::TickScheduler;
pub use structures::{
    default_structures, fill_structure_loot, mark_region_unlocked, region_unlocked,
    write_structure, CellPatch, CellShape, LootEntry, LootPlan, StructureDef, StructureSet,
};
pub use types::{
    cooldown_key, cooldown_prefix, growth_key, growth_prefix, parse_growth_key,
    parse_vault_instance_key, unlock_key, vault_instance_key, vault_instance_prefix, visited_key,
    ActorId, ActorMode, BiomeId, CapabilityTier, CellTypeId, ContentError, ItemStack, ItemTypeId,
    ParticleId, RegionId, RejectReason, SoundId, TaskId, Tick, VaultState, VaultVariant,
    DEFAULT_NAMESPACE, REGION_NETHER, REGION_OVERWORLD, REGION_THE_END, TICKS_PER_SECOND,
};
pub use vault::{
    default_vault_tables, init_instance, instance_state, instance_variant, interact_instance,
    set_instance_state, sweep_instance, CooldownTracker, LootSource, StaticLootTables,
    SweepOutcome, VaultInteraction, VAULT_STATE_KEY, VAULT_VARIANT_KEY,
};
pub use world::{CellRecord, CellState, StateValue, WorldGrid};
