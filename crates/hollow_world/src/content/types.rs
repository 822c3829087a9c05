//! Shared identifiers, domain enums, store key construction, and the
//! error taxonomy used across the content layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::geometry::{CellPos, PartitionPos};

pub type ActorId = String;
pub type RegionId = String;
pub type CellTypeId = String;
pub type ItemTypeId = String;
pub type BiomeId = String;
pub type SoundId = String;
pub type ParticleId = String;
pub type Tick = u64;
pub type TaskId = u64;

pub const TICKS_PER_SECOND: u64 = 20;
pub const DEFAULT_NAMESPACE: &str = "hollow";
pub const REGION_OVERWORLD: &str = "overworld";
pub const REGION_NETHER: &str = "nether";
pub const REGION_THE_END: &str = "the_end";

// ============================================================================
// Actor vocabulary
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActorMode {
    #[default]
    Survival,
    Creative,
    Spectator,
}

/// Host-reported device capability. Drives the scan radius so low-memory
/// clients are not asked to walk a 25-partition circle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityTier {
    #[default]
    SuperLow,
    Low,
    Mid,
    High,
    SuperHigh,
}

impl CapabilityTier {
    pub fn scan_radius(self) -> i32 {
        match self {
            Self::SuperLow => 8,
            Self::Low => 10,
            Self::Mid => 12,
            Self::High => 16,
            Self::SuperHigh => 25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub item: ItemTypeId,
    pub amount: u32,
    #[serde(default)]
    pub enchants: BTreeMap<String, u32>,
}

impl ItemStack {
    pub fn new(item: impl Into<String>, amount: u32) -> Self {
        Self {
            item: item.into(),
            amount,
            enchants: BTreeMap::new(),
        }
    }

    pub fn with_enchant(mut self, name: impl Into<String>, level: u32) -> Self {
        self.enchants.insert(name.into(), level);
        self
    }

    pub fn enchant_level(&self, name: &str) -> u32 {
        self.enchants.get(name).copied().unwrap_or(0)
    }
}

// ============================================================================
// Vault vocabulary
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VaultState {
    #[default]
    Inactive,
    Active,
    Dispensing,
}

impl VaultState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::Dispensing => "dispensing",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "inactive" => Some(Self::Inactive),
            "active" => Some(Self::Active),
            "dispensing" => Some(Self::Dispensing),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VaultVariant {
    #[default]
    Normal,
    Ominous,
}

impl VaultVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Ominous => "ominous",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "normal" => Some(Self::Normal),
            "ominous" => Some(Self::Ominous),
            _ => None,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Normal => Self::Ominous,
            Self::Ominous => Self::Normal,
        }
    }
}

// ============================================================================
// Error taxonomy
// ============================================================================

/// Why an interaction was rejected. Carried inside journal events, never
/// raised as a process failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum RejectReason {
    VaultNotActive,
    CooldownActive { remaining_ticks: i64 },
    WrongKeyItem { held: Option<ItemTypeId> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ContentError {
    NotReady { partition: PartitionPos },
    Timeout { waited_ticks: u64 },
    MissingTarget { what: String, at: CellPos },
    InvalidInteraction { reason: RejectReason },
}

// ============================================================================
// Store key construction (the durable wire format)
// ============================================================================

pub fn unlock_key(ns: &str, region: &str) -> String {
    format!("{ns}:{region}_unlocked")
}

pub fn visited_key(ns: &str, partition: PartitionPos) -> String {
    format!("{ns}:visited-{}", partition.id_string())
}

pub fn growth_key(ns: &str, region: &str, cell: CellPos) -> String {
    format!("{ns}:growth-{region}-{}", cell.id_string())
}

pub fn growth_prefix(ns: &str) -> String {
    format!("{ns}:growth-")
}

/// Inverse of [`growth_key`]. Region ids may themselves contain `-`, so the
/// coordinate fragment is located from the right.
pub fn parse_growth_key(ns: &str, key: &str) -> Option<(RegionId, CellPos)> {
    let rest = key.strip_prefix(&growth_prefix(ns))?;
    let split = rest.rfind("-(")?;
    let region = &rest[..split];
    let cell = CellPos::parse_id(&rest[split + 1..])?;
    if region.is_empty() {
        return None;
    }
    Some((region.to_string(), cell))
}

/// Durable registration of a vault instance, so sweeps resume after restart.
pub fn vault_instance_key(ns: &str, region: &str, cell: CellPos) -> String {
    format!("{ns}:vault_instance-{region}-{}", cell.id_string())
}

pub fn vault_instance_prefix(ns: &str) -> String {
    format!("{ns}:vault_instance-")
}

pub fn parse_vault_instance_key(ns: &str, key: &str) -> Option<(RegionId, CellPos)> {
    let rest = key.strip_prefix(&vault_instance_prefix(ns))?;
    let split = rest.rfind("-(")?;
    let region = &rest[..split];
    let cell = CellPos::parse_id(&rest[split + 1..])?;
    if region.is_empty() {
        return None;
    }
    Some((region.to_string(), cell))
}

pub fn cooldown_key(ns: &str, variant: VaultVariant, cell: CellPos, actor: &str) -> String {
    format!("{ns}:vault-{}-{}-{actor}", variant.as_str(), cell.id_string())
}

/// Prefix covering every actor's cooldown for one (instance, variant) pair.
pub fn cooldown_prefix(ns: &str, variant: VaultVariant, cell: CellPos) -> String {
    format!("{ns}:vault-{}-{}-", variant.as_str(), cell.id_string())
}
