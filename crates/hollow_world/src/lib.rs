pub mod content;
pub mod geometry;

pub use geometry::{
    distance_sq, partitions_within, CellBox, CellPos, Face, PartitionPos, WorldPos, WorldVec,
    PARTITION_SIZE,
};

pub use content::{
    ActorId, ActorMode, ActorRecord, ActorRegistry, BiomeId, CapabilityTier, CellInteraction,
    CellRecord, CellState, CellTypeId, ContentConfig, ContentError, ContentEvent, ContentEventKind,
    ContentRuntime, EventLog, ItemStack, ItemTypeId, ParticleId, RegionId, RejectReason, SoundId,
    StateValue, TaskId, Tick, VaultState, VaultVariant, WorldGrid, WorldRng, DEFAULT_NAMESPACE,
    REGION_NETHER, REGION_OVERWORLD, REGION_THE_END, TICKS_PER_SECOND,
};

// Region bootstrap and structure materialization
pub use content::{
    default_structures, keep_alive_name, mark_region_unlocked, region_unlocked, BuildTuning,
    CellPatch, CellShape, GatePoll, InitTuning, LootEntry, LootPlan, PartitionLoadGate,
    StructureDef, StructureSet, TickingReservation,
};

// Vault rewards
pub use content::{
    default_vault_tables, CooldownTracker, LootSource, StaticLootTables, VaultInteraction,
    VaultTuning,
};

// Scanning, growth, and renewal
pub use content::{
    default_scan_rules, BiomeProbe, BreakVerdict, ChunkScanner, GrowthMonitor, GrowthTuning,
    RenewalTuning, Replacement, ReplacementRule, ScanTuning, SearchBounds, ShellCheck,
};

pub use content::{AdminTuning, ConfigError, TickScheduler, DEFAULT_CONFIG_FILE_NAME};
