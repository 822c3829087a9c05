//! Content configuration.
//!
//! Every tunable lives here, grouped per subsystem, with defaults that match
//! the shipped balance. Configs deserialize from TOML with every field
//! optional; `sanitized` clamps whatever a config file supplied into ranges
//! the subsystems can run with.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::scan::{BiomeProbe, ReplacementRule, SearchBounds};
use super::types::{VaultVariant, DEFAULT_NAMESPACE, REGION_OVERWORLD};
use super::world::CellState;

pub const DEFAULT_CONFIG_FILE_NAME: &str = "hollow_world.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

// === Per-subsystem tuning ===============================================

/// Region init: join handling and the post-init actor suspension.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InitTuning {
    /// Ticks between init retry polls while no actor is registered yet.
    pub retry_interval: u64,
    /// Ticks between suspension re-anchors after an init teleport.
    pub suspend_interval: u64,
    /// How many re-anchors before the actor is released.
    pub suspend_repeats: u32,
    /// Y level actors are anchored at in the home region.
    pub spawn_height: i32,
    /// Y lift applied to init origins derived from an arrival position.
    pub origin_lift: i32,
    pub home_region: String,
}

impl Default for InitTuning {
    fn default() -> Self {
        Self {
            retry_interval: 5,
            suspend_interval: 5,
            suspend_repeats: 40,
            spawn_height: 65,
            origin_lift: 5,
            home_region: REGION_OVERWORLD.to_string(),
        }
    }
}

/// Structure materialization: load gating and keep-alive handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildTuning {
    pub poll_interval: u64,
    pub timeout_ticks: u64,
    /// Keep-alive radius around a build origin, in partitions.
    pub keep_alive_radius: i32,
    /// Ticks the keep-alive outlives the final write.
    pub release_grace: u64,
}

impl Default for BuildTuning {
    fn default() -> Self {
        Self {
            poll_interval: 20,
            timeout_ticks: 1200,
            keep_alive_radius: 2,
            release_grace: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultTuning {
    pub vault_cell: String,
    pub sweep_interval: u64,
    /// Actor distance (world units, from the cell center) that can activate
    /// an instance.
    pub activation_radius: f64,
    /// Cooldown armed after a reward, in ticks.
    pub cooldown_ticks: i64,
    /// Ticks between the shutter opening and the first ejected item.
    pub dispense_delay: u64,
    /// Ticks between ejected items.
    pub eject_interval: u64,
    /// Extra ticks after the last ejection before the cooldown arms.
    pub arm_margin: u64,
    pub key_item_normal: String,
    pub key_item_ominous: String,
    pub loot_table_normal: String,
    pub loot_table_ominous: String,
    pub activate_sound: String,
    pub deactivate_sound: String,
    pub reject_sound: String,
    pub open_sound: String,
    pub eject_sound: String,
    pub particle_normal: String,
    pub particle_ominous: String,
    /// Ejected items get a horizontal impulse drawn from ±x/±z and this
    /// fixed upward y.
    pub impulse_x: f64,
    pub impulse_y: f64,
    pub impulse_z: f64,
}

impl Default for VaultTuning {
    fn default() -> Self {
        Self {
            vault_cell: "reward_vault".to_string(),
            sweep_interval: 10,
            activation_radius: 3.5,
            cooldown_ticks: 6000,
            dispense_delay: 10,
            eject_interval: 20,
            arm_margin: 15,
            key_item_normal: "trial_key".to_string(),
            key_item_ominous: "ominous_trial_key".to_string(),
            loot_table_normal: "reward".to_string(),
            loot_table_ominous: "reward_ominous".to_string(),
            activate_sound: "vault.activate".to_string(),
            deactivate_sound: "vault.deactivate".to_string(),
            reject_sound: "vault.reject_rewarded_player".to_string(),
            open_sound: "vault.open_shutter".to_string(),
            eject_sound: "vault.eject_item".to_string(),
            particle_normal: "basic_flame".to_string(),
            particle_ominous: "blue_flame".to_string(),
            impulse_x: 0.033,
            impulse_y: 0.25,
            impulse_z: 0.025,
        }
    }
}

impl VaultTuning {
    pub fn key_item_for(&self, variant: VaultVariant) -> &str {
        match variant {
            VaultVariant::Normal => &self.key_item_normal,
            VaultVariant::Ominous => &self.key_item_ominous,
        }
    }

    pub fn loot_table_for(&self, variant: VaultVariant) -> &str {
        match variant {
            VaultVariant::Normal => &self.loot_table_normal,
            VaultVariant::Ominous => &self.loot_table_ominous,
        }
    }

    pub fn particle_for(&self, variant: VaultVariant) -> &str {
        match variant {
            VaultVariant::Normal => &self.particle_normal,
            VaultVariant::Ominous => &self.particle_ominous,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanTuning {
    pub sweep_interval: u64,
    /// Minimum ticks between two sweeps from the same partition.
    pub rescan_window: u64,
    /// Cap on the per-capability scan radius, in partitions.
    pub max_radius: i32,
    pub rules: Vec<ReplacementRule>,
}

impl Default for ScanTuning {
    fn default() -> Self {
        Self {
            sweep_interval: 20,
            rescan_window: 20,
            max_radius: 25,
            rules: default_scan_rules(),
        }
    }
}

/// The shipped rule: seed a vault site on the first deep rock cell of any
/// unvisited partition inside the deep biome.
pub fn default_scan_rules() -> Vec<ReplacementRule> {
    vec![ReplacementRule {
        name: "vault_site".to_string(),
        target_cell: "deepslate".to_string(),
        replace_with: "reward_vault".to_string(),
        state: CellState::new(),
        biome: Some(BiomeProbe {
            biome: "deep_dark".to_string(),
            probe_y: -51,
        }),
        search: SearchBounds {
            min_y: -58,
            max_y: -44,
        },
        sound: None,
        summon: None,
    }]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GrowthTuning {
    pub sweep_interval: u64,
    /// One-shot delay before the first growth sweep after world ready.
    pub start_delay: u64,
    pub countdown_min: i64,
    pub countdown_max: i64,
    pub countdown_step: i64,
    /// Cell type a countdown watches.
    pub anchor_cell: String,
    pub inner_cell: String,
    pub outer_cell: String,
    /// What the anchor becomes at countdown zero.
    pub grown_cell: String,
    /// Held item that places the anchor fluid.
    pub fluid_item: String,
    /// What the held item becomes after placing; holding it picks fluid up.
    pub empty_item: String,
}

impl Default for GrowthTuning {
    fn default() -> Self {
        Self {
            sweep_interval: 20,
            start_delay: 10,
            countdown_min: 108_000,
            countdown_max: 144_000,
            countdown_step: 20,
            anchor_cell: "water".to_string(),
            inner_cell: "amethyst_block".to_string(),
            outer_cell: "calcite".to_string(),
            grown_cell: "budding_amethyst".to_string(),
            fluid_item: "water_bucket".to_string(),
            empty_item: "bucket".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenewalTuning {
    /// Held item whose use primes the actor's next projectile.
    pub catalyst_item: String,
    /// Projectile entity type the primed throw spawns.
    pub projectile_entity: String,
    pub from_cell: String,
    pub to_cell: String,
    pub convert_radius: f64,
    pub leaves_cell: String,
    pub blossom_item: String,
    /// Base blossom chance, scaled by (1 + fortune).
    pub blossom_chance: f64,
    pub crystal_cell: String,
    pub crystal_tools: Vec<String>,
    pub excluded_tool: String,
}

impl Default for RenewalTuning {
    fn default() -> Self {
        Self {
            catalyst_item: "thick_splash_potion".to_string(),
            projectile_entity: "splash_potion".to_string(),
            from_cell: "stone".to_string(),
            to_cell: "deepslate".to_string(),
            convert_radius: 1.4,
            leaves_cell: "azalea_leaves_flowered".to_string(),
            blossom_item: "spore_blossom".to_string(),
            blossom_chance: 0.01,
            crystal_cell: "budding_amethyst".to_string(),
            crystal_tools: vec![
                "copper_pickaxe".to_string(),
                "iron_pickaxe".to_string(),
                "diamond_pickaxe".to_string(),
                "netherite_pickaxe".to_string(),
            ],
            excluded_tool: "shears".to_string(),
        }
    }
}

/// Admin tooling: the transient-state reset gesture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminTuning {
    /// Cell an elevated actor interacts with to trigger the reset.
    pub reset_cell: String,
    /// Item the actor must hold for the reset.
    pub reset_item: String,
}

impl Default for AdminTuning {
    fn default() -> Self {
        Self {
            reset_cell: "loom".to_string(),
            reset_item: "brush".to_string(),
        }
    }
}

// === Top level ==========================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub namespace: String,
    /// World seed for deterministic draws; 0 means seed from OS entropy.
    pub seed: u64,
    pub init: InitTuning,
    pub build: BuildTuning,
    pub vault: VaultTuning,
    pub scan: ScanTuning,
    pub growth: GrowthTuning,
    pub renewal: RenewalTuning,
    pub admin: AdminTuning,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            seed: 0,
            init: InitTuning::default(),
            build: BuildTuning::default(),
            vault: VaultTuning::default(),
            scan: ScanTuning::default(),
            growth: GrowthTuning::default(),
            renewal: RenewalTuning::default(),
            admin: AdminTuning::default(),
        }
    }
}

impl ContentConfig {
    pub fn load_toml(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(raw)?;
        Ok(config.sanitized())
    }

    /// Clamp whatever a config file supplied into runnable ranges.
    pub fn sanitized(mut self) -> Self {
        if self.namespace.trim().is_empty() {
            self.namespace = DEFAULT_NAMESPACE.to_string();
        }
        self.init.retry_interval = self.init.retry_interval.max(1);
        self.init.suspend_interval = self.init.suspend_interval.max(1);
        self.build.poll_interval = self.build.poll_interval.max(1);
        self.build.timeout_ticks = self.build.timeout_ticks.max(self.build.poll_interval);
        self.build.keep_alive_radius = self.build.keep_alive_radius.max(0);
        self.vault.sweep_interval = self.vault.sweep_interval.max(1);
        self.vault.activation_radius = self.vault.activation_radius.max(0.0);
        self.vault.cooldown_ticks = self.vault.cooldown_ticks.max(0);
        self.vault.eject_interval = self.vault.eject_interval.max(1);
        self.scan.sweep_interval = self.scan.sweep_interval.max(1);
        self.scan.max_radius = self.scan.max_radius.max(0);
        self.growth.sweep_interval = self.growth.sweep_interval.max(1);
        self.growth.countdown_step = self.growth.countdown_step.max(1);
        if self.growth.countdown_max < self.growth.countdown_min {
            std::mem::swap(&mut self.growth.countdown_min, &mut self.growth.countdown_max);
        }
        self.growth.countdown_min = self.growth.countdown_min.max(1);
        self.growth.countdown_max = self.growth.countdown_max.max(self.growth.countdown_min);
        self.renewal.convert_radius = self.renewal.convert_radius.max(0.0);
        self.renewal.blossom_chance = self.renewal.blossom_chance.clamp(0.0, 1.0);
        self
    }
}
