//! Interactive vault instances.
//!
//! A vault is a placed cell that cycles through `inactive`, `active`, and
//! `dispensing`. The state and the normal/ominous variant live in the cell's
//! own state map; per-(instance, variant, actor) cooldowns live in the
//! persistent store, so both survive restarts. The periodic sweep drives the
//! inactive/active transitions; interactions drive the rest.

use std::collections::BTreeMap;

use crate::geometry::{distance_sq, CellPos};
use hollow_world_store::PersistentStore;

use super::actors::{ActorRecord, ActorRegistry};
use super::config::VaultTuning;
use super::events::{ContentEventKind, EventLog};
use super::rng::WorldRng;
use super::types::{self, ActorMode, ItemStack, RejectReason, VaultState, VaultVariant};
use super::world::{CellRecord, CellState, WorldGrid};

pub const VAULT_STATE_KEY: &str = "vault_state";
pub const VAULT_VARIANT_KEY: &str = "vault_variant";

// === Cell state access ==================================================

pub fn instance_state(record: &CellRecord) -> VaultState {
    record
        .state_text(VAULT_STATE_KEY)
        .and_then(VaultState::parse)
        .unwrap_or_default()
}

pub fn instance_variant(record: &CellRecord) -> VaultVariant {
    record
        .state_text(VAULT_VARIANT_KEY)
        .and_then(VaultVariant::parse)
        .unwrap_or_default()
}

pub fn set_instance_state(grid: &mut dyn WorldGrid, region: &str, cell: CellPos, state: VaultState) {
    let mut overrides = CellState::new();
    overrides.insert(VAULT_STATE_KEY.to_string(), state.as_str().into());
    grid.write_cell_state(region, cell, &overrides);
}

fn write_variant(grid: &mut dyn WorldGrid, region: &str, cell: CellPos, variant: VaultVariant) {
    let mut overrides = CellState::new();
    overrides.insert(VAULT_VARIANT_KEY.to_string(), variant.as_str().into());
    grid.write_cell_state(region, cell, &overrides);
}

/// Seed a freshly placed instance: inactive, normal variant.
pub fn init_instance(grid: &mut dyn WorldGrid, region: &str, cell: CellPos) {
    let mut state = CellState::new();
    state.insert(VAULT_STATE_KEY.to_string(), VaultState::Inactive.as_str().into());
    state.insert(
        VAULT_VARIANT_KEY.to_string(),
        VaultVariant::Normal.as_str().into(),
    );
    grid.write_cell_state(region, cell, &state);
}

// === Cooldowns ==========================================================

/// Store-backed cooldown bookkeeping, one count per (instance, variant,
/// actor). Spent entries are removed rather than left at zero.
#[derive(Debug, Clone)]
pub struct CooldownTracker {
    ns: String,
}

impl CooldownTracker {
    pub fn new(ns: impl Into<String>) -> Self {
        Self { ns: ns.into() }
    }

    pub fn key(&self, cell: CellPos, variant: VaultVariant, actor: &str) -> String {
        types::cooldown_key(&self.ns, variant, cell, actor)
    }

    pub fn get(
        &self,
        store: &PersistentStore,
        cell: CellPos,
        variant: VaultVariant,
        actor: &str,
    ) -> i64 {
        store.count(&self.key(cell, variant, actor))
    }

    /// Decrement one cooldown, clamped at zero. Returns the new value.
    pub fn tick(
        &self,
        store: &mut PersistentStore,
        cell: CellPos,
        variant: VaultVariant,
        actor: &str,
        amount: i64,
    ) -> i64 {
        let key = self.key(cell, variant, actor);
        let current = store.count(&key);
        if current <= 0 {
            return 0;
        }
        let next = (current - amount).max(0);
        if next == 0 {
            store.remove(&key);
        } else {
            store.set(key, next);
        }
        next
    }

    pub fn set(
        &self,
        store: &mut PersistentStore,
        cell: CellPos,
        variant: VaultVariant,
        actor: &str,
        value: i64,
    ) {
        store.set(self.key(cell, variant, actor), value);
    }

    /// Drop every actor's cooldown for one (instance, variant) pair. Used on
    /// variant toggles so entries for the old variant cannot block the new
    /// one, and on instance removal.
    pub fn clear_variant(
        &self,
        store: &mut PersistentStore,
        cell: CellPos,
        variant: VaultVariant,
    ) -> usize {
        store.remove_with_prefix(&types::cooldown_prefix(&self.ns, variant, cell))
    }
}

// === Loot ===============================================================

/// Rolls the item list a dispensing vault ejects.
pub trait LootSource {
    fn roll(&mut self, table: &str, rng: &mut WorldRng) -> Vec<ItemStack>;
}

/// Fixed item lists keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct StaticLootTables {
    tables: BTreeMap<String, Vec<ItemStack>>,
}

impl StaticLootTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, table: impl Into<String>, items: Vec<ItemStack>) -> Self {
        self.tables.insert(table.into(), items);
        self
    }

    pub fn insert(&mut self, table: impl Into<String>, items: Vec<ItemStack>) {
        self.tables.insert(table.into(), items);
    }
}

impl LootSource for StaticLootTables {
    fn roll(&mut self, table: &str, _rng: &mut WorldRng) -> Vec<ItemStack> {
        self.tables.get(table).cloned().unwrap_or_default()
    }
}

/// The shipped reward tables.
pub fn default_vault_tables() -> StaticLootTables {
    StaticLootTables::new()
        .with_table(
            "reward",
            vec![
                ItemStack::new("emerald", 2),
                ItemStack::new("arrow", 8),
                ItemStack::new("golden_carrot", 4),
            ],
        )
        .with_table(
            "reward_ominous",
            vec![
                ItemStack::new("emerald_block", 1),
                ItemStack::new("diamond", 2),
                ItemStack::new("golden_apple", 1),
            ],
        )
}

// === Periodic evaluation ================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweepOutcome {
    Keep,
    Remove,
}

/// One periodic evaluation of one instance.
///
/// Order: cooldowns decrement for every registered actor first, so a count
/// reaching zero can re-activate the instance in the same evaluation. The
/// ambient particle plays while active or dispensing. The activation guard
/// is skipped entirely while dispensing. State-change sounds fire only on an
/// actual transition.
pub fn sweep_instance(
    store: &mut PersistentStore,
    grid: &mut dyn WorldGrid,
    registry: &ActorRegistry,
    tracker: &CooldownTracker,
    tuning: &VaultTuning,
    region: &str,
    cell: CellPos,
    log: &mut EventLog,
) -> SweepOutcome {
    let record = match grid.read_cell(region, cell) {
        Some(record) => record,
        None => return SweepOutcome::Keep,
    };
    if record.cell_type != tuning.vault_cell {
        return SweepOutcome::Remove;
    }
    let variant = instance_variant(&record);
    let state = instance_state(&record);

    let decrement = tuning.sweep_interval as i64;
    let center = cell.center();
    let radius_sq = tuning.activation_radius * tuning.activation_radius;
    let mut any_blocked = false;
    let mut any_eligible = false;
    for actor in registry.iter() {
        let cooldown = tracker.tick(store, cell, variant, &actor.id, decrement);
        if cooldown > 0 {
            any_blocked = true;
        } else if actor.region == region && distance_sq(actor.pos, center) <= radius_sq {
            any_eligible = true;
        }
    }

    if state != VaultState::Inactive {
        log.record(ContentEventKind::ParticleSpawned {
            particle: tuning.particle_for(variant).to_string(),
            at: center,
        });
    }
    if state == VaultState::Dispensing {
        return SweepOutcome::Keep;
    }

    let should_be_active = any_eligible && !any_blocked;
    match state {
        VaultState::Inactive if should_be_active => {
            set_instance_state(grid, region, cell, VaultState::Active);
            log.record(ContentEventKind::SoundPlayed {
                sound: tuning.activate_sound.clone(),
                at: center,
                to_actor: None,
            });
            log.record(ContentEventKind::VaultStateChanged {
                region: region.to_string(),
                cell,
                from: VaultState::Inactive,
                to: VaultState::Active,
            });
        }
        VaultState::Active if !should_be_active => {
            set_instance_state(grid, region, cell, VaultState::Inactive);
            log.record(ContentEventKind::SoundPlayed {
                sound: tuning.deactivate_sound.clone(),
                at: center,
                to_actor: None,
            });
            log.record(ContentEventKind::VaultStateChanged {
                region: region.to_string(),
                cell,
                from: VaultState::Active,
                to: VaultState::Inactive,
            });
        }
        _ => {}
    }
    SweepOutcome::Keep
}

// === Interaction ========================================================

#[derive(Debug, Clone, PartialEq)]
pub enum VaultInteraction {
    Toggled {
        from: VaultVariant,
        to: VaultVariant,
    },
    DispenseStarted {
        variant: VaultVariant,
        items: Vec<ItemStack>,
    },
    Rejected {
        reason: RejectReason,
    },
}

/// Resolve one actor interaction with an instance. Returns `None` when the
/// cell does not currently read as a vault.
///
/// Precedence: an elevated actor not holding this variant's key toggles the
/// variant; otherwise the not-active, cooldown, and wrong-key guards apply
/// in that order; a pass consumes the key and starts the dispense sequence.
pub fn interact_instance(
    store: &mut PersistentStore,
    grid: &mut dyn WorldGrid,
    tracker: &CooldownTracker,
    tuning: &VaultTuning,
    region: &str,
    cell: CellPos,
    actor: &ActorRecord,
    loot: &mut dyn LootSource,
    rng: &mut WorldRng,
    log: &mut EventLog,
) -> Option<VaultInteraction> {
    let record = grid.read_cell(region, cell)?;
    if record.cell_type != tuning.vault_cell {
        return None;
    }
    let variant = instance_variant(&record);
    let state = instance_state(&record);
    let held = actor.held_item_id();
    let key_item = tuning.key_item_for(variant);

    if actor.mode == ActorMode::Creative && held != Some(key_item) {
        let next = variant.other();
        write_variant(grid, region, cell, next);
        tracker.clear_variant(store, cell, variant);
        log.record(ContentEventKind::VariantToggled {
            region: region.to_string(),
            cell,
            from: variant,
            to: next,
        });
        return Some(VaultInteraction::Toggled {
            from: variant,
            to: next,
        });
    }

    if state != VaultState::Active {
        return Some(reject(tuning, cell, actor, RejectReason::VaultNotActive, log));
    }
    let cooldown = tracker.get(store, cell, variant, &actor.id);
    if cooldown > 0 {
        return Some(reject(
            tuning,
            cell,
            actor,
            RejectReason::CooldownActive {
                remaining_ticks: cooldown,
            },
            log,
        ));
    }
    if held != Some(key_item) {
        return Some(reject(
            tuning,
            cell,
            actor,
            RejectReason::WrongKeyItem {
                held: held.map(str::to_string),
            },
            log,
        ));
    }

    log.record(ContentEventKind::HeldItemConsumed {
        actor: actor.id.clone(),
        item: key_item.to_string(),
    });
    let items = loot.roll(tuning.loot_table_for(variant), rng);
    set_instance_state(grid, region, cell, VaultState::Dispensing);
    log.record(ContentEventKind::SoundPlayed {
        sound: tuning.open_sound.clone(),
        at: cell.center(),
        to_actor: None,
    });
    log.record(ContentEventKind::VaultStateChanged {
        region: region.to_string(),
        cell,
        from: VaultState::Active,
        to: VaultState::Dispensing,
    });
    Some(VaultInteraction::DispenseStarted { variant, items })
}

fn reject(
    tuning: &VaultTuning,
    cell: CellPos,
    actor: &ActorRecord,
    reason: RejectReason,
    log: &mut EventLog,
) -> VaultInteraction {
    log.record(ContentEventKind::SoundPlayed {
        sound: tuning.reject_sound.clone(),
        at: cell.center(),
        to_actor: Some(actor.id.clone()),
    });
    log.record(ContentEventKind::InteractionRejected {
        actor: actor.id.clone(),
        at: cell,
        reason: reason.clone(),
    });
    VaultInteraction::Rejected { reason }
}
