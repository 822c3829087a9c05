//! The content runtime.
//!
//! Owns every subsystem plus the scheduler, store, registry, and journal,
//! and maps host callbacks onto them:
//!
//! - world-ready arms the periodic sweeps
//! - actor join / region-entered trigger one-shot region initialization
//! - cell interactions route to the admin reset, vault instances, or the
//!   fluid place/pickup handling for growth anchors
//! - break attempts clean up instance bookkeeping and award extra drops
//! - item-use, entity-spawn, and projectile-hit form the conversion chain
//!
//! All work runs inside `on_tick`; host callbacks only mutate bookkeeping
//! and schedule jobs, so one tick sees one consistent world.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::geometry::{CellPos, Face, WorldPos, WorldVec};
use hollow_world_store::{PersistentStore, StoreError};

use super::actors::{ActorRecord, ActorRegistry};
use super::config::ContentConfig;
use super::events::{ContentEvent, ContentEventKind, EventLog};
use super::geode::GrowthMonitor;
use super::loading::{GatePoll, PartitionLoadGate, TickingReservation};
use super::renewal::{self, BreakVerdict};
use super::rng::WorldRng;
use super::scan::ChunkScanner;
use super::scheduler::TickScheduler;
use super::structures::{self, StructureDef, StructureSet};
use super::types::{
    self, ActorId, ActorMode, ContentError, ItemStack, RegionId, TaskId, Tick, VaultState,
    VaultVariant,
};
use super::vault::{self, CooldownTracker, LootSource, VaultInteraction};
use super::world::WorldGrid;

/// One actor interaction with a cell, as the host reports it.
#[derive(Debug, Clone)]
pub struct CellInteraction {
    pub actor: ActorId,
    pub region: RegionId,
    pub cell: CellPos,
    /// Face the interaction went through, when the host knows it.
    pub face: Option<Face>,
    /// Held item before the host resolved the interaction.
    pub held_before: Option<ItemStack>,
    /// Held item after the host resolved it.
    pub held_after: Option<ItemStack>,
}

#[derive(Debug, Clone)]
enum Job {
    InitPoll,
    ScanSweep,
    GrowthSweepStart,
    GrowthSweep,
    VaultSweep,
    GatePoll { build: u64 },
    ReleaseReservation { build: u64 },
    SuspendTick { actor: ActorId },
    DispenseStart { dispense: u64 },
    DispenseTick { dispense: u64 },
    ArmCooldown { cell: CellPos, variant: VaultVariant, actor: ActorId },
}

struct PendingBuild {
    def: StructureDef,
    origin: CellPos,
    reservation: TickingReservation,
    gate: PartitionLoadGate,
    poll_task: TaskId,
}

struct DispenseRun {
    region: RegionId,
    cell: CellPos,
    actor: ActorId,
    items: Vec<ItemStack>,
    next_index: usize,
    task: TaskId,
}

struct SuspendRun {
    anchor: WorldPos,
    repeats_left: u32,
    task: TaskId,
}

pub struct ContentRuntime {
    config: ContentConfig,
    store: PersistentStore,
    scheduler: TickScheduler<Job>,
    registry: ActorRegistry,
    structures: StructureSet,
    scanner: ChunkScanner,
    growth: GrowthMonitor,
    cooldowns: CooldownTracker,
    loot: Box<dyn LootSource>,
    rng: WorldRng,
    vaults: BTreeSet<(RegionId, CellPos)>,
    builds: BTreeMap<u64, PendingBuild>,
    next_build_id: u64,
    dispenses: BTreeMap<u64, DispenseRun>,
    next_dispense_id: u64,
    suspends: BTreeMap<ActorId, SuspendRun>,
    marked_projectiles: BTreeSet<String>,
    init_task: Option<TaskId>,
    log: EventLog,
    initialized: bool,
    started: bool,
}

impl ContentRuntime {
    pub fn new(config: ContentConfig) -> Self {
        Self::with_store(config, PersistentStore::new())
    }

    /// Build the runtime over an existing store, re-registering every vault
    /// instance the store remembers.
    pub fn with_store(config: ContentConfig, store: PersistentStore) -> Self {
        let config = config.sanitized();
        let ns = config.namespace.clone();
        let rng = if config.seed == 0 {
            WorldRng::from_entropy()
        } else {
            WorldRng::seeded(config.seed)
        };
        let scanner = ChunkScanner::new(
            ns.clone(),
            config.scan.rules.clone(),
            config.scan.rescan_window,
            config.scan.max_radius,
        );
        let growth = GrowthMonitor::new(ns.clone(), config.growth.clone());
        let cooldowns = CooldownTracker::new(ns.clone());
        let mut vaults = BTreeSet::new();
        for key in store.keys_with_prefix(&types::vault_instance_prefix(&ns)) {
            if let Some(instance) = types::parse_vault_instance_key(&ns, &key) {
                vaults.insert(instance);
            }
        }
        Self {
            config,
            store,
            scheduler: TickScheduler::new(),
            registry: ActorRegistry::new(),
            structures: StructureSet::default(),
            scanner,
            growth,
            cooldowns,
            loot: Box::new(vault::default_vault_tables()),
            rng,
            vaults,
            builds: BTreeMap::new(),
            next_build_id: 1,
            dispenses: BTreeMap::new(),
            next_dispense_id: 1,
            suspends: BTreeMap::new(),
            marked_projectiles: BTreeSet::new(),
            init_task: None,
            log: EventLog::new(),
            initialized: false,
            started: false,
        }
    }

    pub fn with_structures(mut self, structures: StructureSet) -> Self {
        self.structures = structures;
        self
    }

    pub fn with_loot_source(mut self, loot: Box<dyn LootSource>) -> Self {
        self.loot = loot;
        self
    }

    // === Introspection ==================================================

    pub fn now(&self) -> Tick {
        self.scheduler.now()
    }

    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    pub fn store(&self) -> &PersistentStore {
        &self.store
    }

    pub fn registry(&self) -> &ActorRegistry {
        &self.registry
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn pending_builds(&self) -> usize {
        self.builds.len()
    }

    pub fn pending_tasks(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn vault_instance_count(&self) -> usize {
        self.vaults.len()
    }

    pub fn has_vault_instance(&self, region: &str, cell: CellPos) -> bool {
        self.vaults.contains(&(region.to_string(), cell))
    }

    pub fn events(&self) -> &[ContentEvent] {
        self.log.entries()
    }

    pub fn drain_events(&mut self) -> Vec<ContentEvent> {
        self.log.drain()
    }

    pub fn save_store(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        self.store.save(path)
    }

    // === Lifecycle ======================================================

    /// Arm the periodic sweeps. Safe to call more than once; only the first
    /// call does anything.
    pub fn on_world_ready(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        self.init_task = Some(
            self.scheduler
                .run_every(self.config.init.retry_interval, Job::InitPoll),
        );
        self.scheduler
            .run_every(self.config.scan.sweep_interval, Job::ScanSweep);
        self.scheduler
            .run_after(self.config.growth.start_delay, Job::GrowthSweepStart);
        self.scheduler
            .run_every(self.config.vault.sweep_interval, Job::VaultSweep);
    }

    /// Advance one tick and run every job that came due.
    pub fn on_tick(&mut self, grid: &mut dyn WorldGrid) {
        let fired = self.scheduler.advance();
        self.log.set_now(self.scheduler.now());
        for (_, job) in fired {
            self.dispatch(job, grid);
        }
    }

    fn dispatch(&mut self, job: Job, grid: &mut dyn WorldGrid) {
        match job {
            Job::InitPoll => self.init_poll(),
            Job::ScanSweep => self.scan_sweep(grid),
            Job::GrowthSweepStart => {
                self.scheduler
                    .run_every(self.config.growth.sweep_interval, Job::GrowthSweep);
            }
            Job::GrowthSweep => {
                if self.initialized {
                    self.growth
                        .sweep(&mut self.store, grid, &mut self.rng, &mut self.log);
                }
            }
            Job::VaultSweep => self.vault_sweep(grid),
            Job::GatePoll { build } => self.gate_poll(build, grid),
            Job::ReleaseReservation { build } => self.release_reservation(build, grid),
            Job::SuspendTick { actor } => self.suspend_tick(&actor),
            Job::DispenseStart { dispense } => self.dispense_start(dispense, grid),
            Job::DispenseTick { dispense } => self.dispense_tick(dispense, grid),
            Job::ArmCooldown { cell, variant, actor } => self.arm_cooldown(cell, variant, &actor),
        }
    }

    fn init_poll(&mut self) {
        if self.registry.is_empty() {
            return;
        }
        self.initialized = true;
        if let Some(task) = self.init_task.take() {
            self.scheduler.cancel(task);
        }
    }

    // === Actor events ===================================================

    pub fn on_actor_join(&mut self, record: ActorRecord, grid: &mut dyn WorldGrid) {
        let id = record.id.clone();
        self.registry.register(record);
        let actor = match self.registry.get(&id) {
            Some(actor) => actor.clone(),
            None => return,
        };
        self.try_region_init(grid, &actor);
    }

    pub fn on_actor_leave(&mut self, actor: &str) {
        self.registry.deregister(actor);
        if let Some(run) = self.suspends.remove(actor) {
            self.scheduler.cancel(run.task);
        }
    }

    pub fn on_actor_moved(&mut self, actor: &str, region: &str, pos: WorldPos) {
        self.registry.update_presence(actor, region, pos);
    }

    pub fn on_actor_held_item(&mut self, actor: &str, held: Option<ItemStack>) {
        self.registry.update_held_item(actor, held);
    }

    pub fn on_actor_mode(&mut self, actor: &str, mode: ActorMode) {
        self.registry.update_mode(actor, mode);
    }

    /// The actor crossed into another region. Runs that region's one-shot
    /// initialization if it has structures and is still locked.
    pub fn on_region_entered(
        &mut self,
        actor: &str,
        region: &str,
        arrival: WorldPos,
        grid: &mut dyn WorldGrid,
    ) {
        self.registry.update_presence(actor, region, arrival);
        let record = match self.registry.get(actor) {
            Some(record) => record.clone(),
            None => return,
        };
        self.try_region_init(grid, &record);
    }

    // === Region initialization ==========================================

    fn try_region_init(&mut self, grid: &mut dyn WorldGrid, actor: &ActorRecord) {
        let region = actor.region.clone();
        if !self.structures.has_region(&region) {
            return;
        }
        if structures::region_unlocked(&self.store, &self.config.namespace, &region) {
            return;
        }
        let origin = if region == self.config.init.home_region {
            let spawn = grid.default_spawn(&region);
            CellPos::new(spawn.x, self.config.init.spawn_height, spawn.z)
        } else {
            actor
                .pos
                .floor_cell()
                .offset(0, self.config.init.origin_lift, 0)
        };
        self.start_region_init(grid, &region, origin, &actor.id);
    }

    /// Unlock the region, anchor the triggering actor over the origin, and
    /// queue every structure the region defines. The unlock flag is written
    /// first so a second trigger cannot double-queue.
    fn start_region_init(
        &mut self,
        grid: &mut dyn WorldGrid,
        region: &str,
        origin: CellPos,
        anchor_actor: &str,
    ) {
        structures::mark_region_unlocked(&mut self.store, &self.config.namespace, region);
        self.log.record(ContentEventKind::RegionUnlocked {
            region: region.to_string(),
        });

        let anchor = WorldPos::new(
            origin.x as f64 + 0.5,
            origin.y as f64,
            origin.z as f64 + 0.5,
        );
        self.suspend_actor_at(anchor_actor, anchor);

        let defs: Vec<StructureDef> = self.structures.for_region(region).cloned().collect();
        for def in defs {
            self.enqueue_build(grid, def, origin);
        }
    }

    fn suspend_actor_at(&mut self, actor: &str, anchor: WorldPos) {
        if let Some(run) = self.suspends.remove(actor) {
            self.scheduler.cancel(run.task);
        }
        self.log.record(ContentEventKind::ActorTeleported {
            actor: actor.to_string(),
            to: anchor,
        });
        if let Some(record) = self.registry.get_mut(actor) {
            record.pos = anchor;
        }
        if self.config.init.suspend_repeats == 0 {
            return;
        }
        let task = self.scheduler.run_every(
            self.config.init.suspend_interval,
            Job::SuspendTick {
                actor: actor.to_string(),
            },
        );
        self.suspends.insert(
            actor.to_string(),
            SuspendRun {
                anchor,
                repeats_left: self.config.init.suspend_repeats,
                task,
            },
        );
    }

    fn suspend_tick(&mut self, actor: &str) {
        let (anchor, done, task) = match self.suspends.get_mut(actor) {
            Some(run) => {
                run.repeats_left = run.repeats_left.saturating_sub(1);
                (run.anchor, run.repeats_left == 0, run.task)
            }
            None => return,
        };
        if !self.registry.contains(actor) {
            self.scheduler.cancel(task);
            self.suspends.remove(actor);
            return;
        }
        self.log.record(ContentEventKind::ActorTeleported {
            actor: actor.to_string(),
            to: anchor,
        });
        if let Some(record) = self.registry.get_mut(actor) {
            record.pos = anchor;
        }
        if done {
            self.scheduler.cancel(task);
            self.suspends.remove(actor);
        }
    }

    fn enqueue_build(&mut self, grid: &mut dyn WorldGrid, def: StructureDef, init_origin: CellPos) {
        let origin = init_origin.offset(
            def.origin_offset.x,
            def.origin_offset.y,
            def.origin_offset.z,
        );
        let reservation = TickingReservation::create(
            grid,
            def.region.clone(),
            def.keep_alive_name(),
            origin,
            self.config.build.keep_alive_radius,
        );
        let gate = PartitionLoadGate::new(
            def.region.clone(),
            origin,
            self.config.build.poll_interval,
            self.config.build.timeout_ticks,
        );
        let build = self.next_build_id;
        self.next_build_id += 1;
        let poll_task = self
            .scheduler
            .run_every(self.config.build.poll_interval, Job::GatePoll { build });
        self.log.record(ContentEventKind::StructureQueued {
            structure: def.name.clone(),
            origin,
        });
        self.builds.insert(
            build,
            PendingBuild {
                def,
                origin,
                reservation,
                gate,
                poll_task,
            },
        );
    }

    fn gate_poll(&mut self, build: u64, grid: &mut dyn WorldGrid) {
        let poll = match self.builds.get_mut(&build) {
            Some(pending) => pending.gate.poll(grid),
            None => return,
        };
        match poll {
            GatePoll::Waiting => {}
            GatePoll::Ready => {
                let (def, origin) = match self.builds.get_mut(&build) {
                    Some(pending) => {
                        self.scheduler.cancel(pending.poll_task);
                        (pending.def.clone(), pending.origin)
                    }
                    None => return,
                };
                structures::write_structure(grid, &def, origin);
                structures::fill_structure_loot(grid, &def, origin, &mut self.log);
                self.log.record(ContentEventKind::StructureMaterialized {
                    structure: def.name.clone(),
                    origin,
                });
                self.scheduler.run_after(
                    self.config.build.release_grace,
                    Job::ReleaseReservation { build },
                );
            }
            GatePoll::TimedOut => {
                let mut pending = match self.builds.remove(&build) {
                    Some(pending) => pending,
                    None => return,
                };
                self.scheduler.cancel(pending.poll_task);
                pending.reservation.release(grid);
                self.log.record(ContentEventKind::StructureAbandoned {
                    structure: pending.def.name.clone(),
                    origin: pending.origin,
                    error: ContentError::Timeout {
                        waited_ticks: pending.gate.waited(),
                    },
                });
            }
        }
    }

    fn release_reservation(&mut self, build: u64, grid: &mut dyn WorldGrid) {
        if let Some(mut pending) = self.builds.remove(&build) {
            pending.reservation.release(grid);
        }
    }

    // === Periodic sweeps ================================================

    fn scan_sweep(&mut self, grid: &mut dyn WorldGrid) {
        if !self.initialized {
            return;
        }
        let now = self.scheduler.now();
        for id in self.registry.ids() {
            let replacements = {
                let actor = match self.registry.get_mut(&id) {
                    Some(actor) => actor,
                    None => continue,
                };
                self.scanner
                    .sweep_actor(&mut self.store, grid, actor, now, &mut self.log)
            };
            for hit in replacements {
                if hit.cell_type == self.config.vault.vault_cell {
                    self.register_vault(grid, &hit.region, hit.cell);
                }
            }
        }
    }

    fn vault_sweep(&mut self, grid: &mut dyn WorldGrid) {
        let instances: Vec<(RegionId, CellPos)> = self.vaults.iter().cloned().collect();
        let mut gone = Vec::new();
        for (region, cell) in instances {
            let outcome = vault::sweep_instance(
                &mut self.store,
                grid,
                &self.registry,
                &self.cooldowns,
                &self.config.vault,
                &region,
                cell,
                &mut self.log,
            );
            if outcome == vault::SweepOutcome::Remove {
                gone.push((region, cell));
            }
        }
        for (region, cell) in gone {
            self.forget_vault(&region, cell);
        }
    }

    // === Vault bookkeeping ==============================================

    fn register_vault(&mut self, grid: &mut dyn WorldGrid, region: &str, cell: CellPos) {
        vault::init_instance(grid, region, cell);
        self.store.set(
            types::vault_instance_key(&self.config.namespace, region, cell),
            true,
        );
        self.vaults.insert((region.to_string(), cell));
    }

    fn forget_vault(&mut self, region: &str, cell: CellPos) {
        self.store
            .remove(&types::vault_instance_key(&self.config.namespace, region, cell));
        self.vaults.remove(&(region.to_string(), cell));
        self.cooldowns
            .clear_variant(&mut self.store, cell, VaultVariant::Normal);
        self.cooldowns
            .clear_variant(&mut self.store, cell, VaultVariant::Ominous);
        let stale: Vec<u64> = self
            .dispenses
            .iter()
            .filter(|(_, run)| run.region == region && run.cell == cell)
            .map(|(id, _)| *id)
            .collect();
        for id in stale {
            if let Some(run) = self.dispenses.remove(&id) {
                self.scheduler.cancel(run.task);
            }
        }
    }

    // === Cell events ====================================================

    pub fn on_cell_placed(
        &mut self,
        region: &str,
        cell: CellPos,
        cell_type: &str,
        grid: &mut dyn WorldGrid,
    ) {
        if cell_type == self.config.vault.vault_cell {
            self.register_vault(grid, region, cell);
        }
    }

    pub fn on_cell_interaction(&mut self, interaction: CellInteraction, grid: &mut dyn WorldGrid) {
        let record = match grid.read_cell(&interaction.region, interaction.cell) {
            Some(record) => record,
            None => return,
        };
        let mut actor = match self.registry.get(&interaction.actor) {
            Some(actor) => actor.clone(),
            None => return,
        };
        actor.held_item = interaction.held_before.clone();

        if record.cell_type == self.config.admin.reset_cell
            && actor.mode == ActorMode::Creative
            && actor.held_item_id() == Some(self.config.admin.reset_item.as_str())
        {
            self.reset_transient_state();
            return;
        }

        if record.cell_type == self.config.vault.vault_cell {
            self.vault_interaction(&actor, &interaction, grid);
            return;
        }

        self.fluid_interaction(&actor, &interaction, grid);
    }

    fn vault_interaction(
        &mut self,
        actor: &ActorRecord,
        interaction: &CellInteraction,
        grid: &mut dyn WorldGrid,
    ) {
        let instance = (interaction.region.clone(), interaction.cell);
        if !self.vaults.contains(&instance) {
            // An instance the store never saw, e.g. placed while this
            // runtime was not listening. Track it from here on.
            self.store.set(
                types::vault_instance_key(&self.config.namespace, &instance.0, instance.1),
                true,
            );
            self.vaults.insert(instance);
        }
        let outcome = vault::interact_instance(
            &mut self.store,
            grid,
            &self.cooldowns,
            &self.config.vault,
            &interaction.region,
            interaction.cell,
            actor,
            self.loot.as_mut(),
            &mut self.rng,
            &mut self.log,
        );
        if let Some(VaultInteraction::DispenseStarted { variant, items }) = outcome {
            let dispense = self.next_dispense_id;
            self.next_dispense_id += 1;
            let task = self.scheduler.run_after(
                self.config.vault.dispense_delay,
                Job::DispenseStart { dispense },
            );
            let total = items.len() as u64;
            self.dispenses.insert(
                dispense,
                DispenseRun {
                    region: interaction.region.clone(),
                    cell: interaction.cell,
                    actor: actor.id.clone(),
                    items,
                    next_index: 0,
                    task,
                },
            );
            let arm_after = total * self.config.vault.eject_interval + self.config.vault.arm_margin;
            self.scheduler.run_after(
                arm_after,
                Job::ArmCooldown {
                    cell: interaction.cell,
                    variant,
                    actor: actor.id.clone(),
                },
            );
            self.consume_held(&actor.id);
        }
    }

    /// Mirror a consumed key in the registry so guards this tick see the
    /// post-consumption hand.
    fn consume_held(&mut self, actor: &str) {
        if let Some(record) = self.registry.get_mut(actor) {
            let emptied = match record.held_item.as_mut() {
                Some(stack) if stack.amount > 1 => {
                    stack.amount -= 1;
                    false
                }
                Some(_) => true,
                None => false,
            };
            if emptied {
                record.held_item = None;
            }
        }
    }

    fn arm_cooldown(&mut self, cell: CellPos, variant: VaultVariant, actor: &str) {
        let value = self.config.vault.cooldown_ticks;
        self.cooldowns
            .set(&mut self.store, cell, variant, actor, value);
        self.log.record(ContentEventKind::CooldownArmed {
            actor: actor.to_string(),
            cell,
            value,
        });
    }

    fn dispense_start(&mut self, dispense: u64, grid: &mut dyn WorldGrid) {
        let total = match self.dispenses.get(&dispense) {
            Some(run) => run.items.len(),
            None => return,
        };
        if total == 0 {
            self.finish_dispense(dispense, grid);
            return;
        }
        self.eject_next(dispense);
        let done = self
            .dispenses
            .get(&dispense)
            .map_or(true, |run| run.next_index >= run.items.len());
        if done {
            self.finish_dispense(dispense, grid);
        } else if let Some(run) = self.dispenses.get_mut(&dispense) {
            run.task = self
                .scheduler
                .run_every(self.config.vault.eject_interval, Job::DispenseTick { dispense });
        }
    }

    fn dispense_tick(&mut self, dispense: u64, grid: &mut dyn WorldGrid) {
        if !self.dispenses.contains_key(&dispense) {
            return;
        }
        self.eject_next(dispense);
        let done = self
            .dispenses
            .get(&dispense)
            .map_or(true, |run| run.next_index >= run.items.len());
        if done {
            self.finish_dispense(dispense, grid);
        }
    }

    fn eject_next(&mut self, dispense: u64) {
        let (stack, cell) = match self.dispenses.get_mut(&dispense) {
            Some(run) if run.next_index < run.items.len() => {
                let stack = run.items[run.next_index].clone();
                run.next_index += 1;
                (stack, run.cell)
            }
            _ => return,
        };
        let center = cell.center();
        let at = WorldPos::new(center.x, center.y + 0.5, center.z);
        let impulse = WorldVec::new(
            self.rng
                .range_f64(-self.config.vault.impulse_x, self.config.vault.impulse_x),
            self.config.vault.impulse_y,
            self.rng
                .range_f64(-self.config.vault.impulse_z, self.config.vault.impulse_z),
        );
        self.log.record(ContentEventKind::SoundPlayed {
            sound: self.config.vault.eject_sound.clone(),
            at,
            to_actor: None,
        });
        self.log.record(ContentEventKind::ItemSpawned {
            stack,
            at,
            impulse: Some(impulse),
        });
    }

    fn finish_dispense(&mut self, dispense: u64, grid: &mut dyn WorldGrid) {
        let run = match self.dispenses.remove(&dispense) {
            Some(run) => run,
            None => return,
        };
        self.scheduler.cancel(run.task);
        vault::set_instance_state(grid, &run.region, run.cell, VaultState::Inactive);
        self.log.record(ContentEventKind::SoundPlayed {
            sound: self.config.vault.deactivate_sound.clone(),
            at: run.cell.center(),
            to_actor: None,
        });
        self.log.record(ContentEventKind::VaultStateChanged {
            region: run.region.clone(),
            cell: run.cell,
            from: VaultState::Dispensing,
            to: VaultState::Inactive,
        });
    }

    // === Growth anchors =================================================

    fn fluid_interaction(
        &mut self,
        actor: &ActorRecord,
        interaction: &CellInteraction,
        grid: &mut dyn WorldGrid,
    ) {
        let fluid = self.config.growth.fluid_item.as_str();
        let empty = self.config.growth.empty_item.as_str();
        let before = interaction.held_before.as_ref().map(|s| s.item.as_str());
        let after = interaction.held_after.as_ref().map(|s| s.item.as_str());
        let creative = actor.mode == ActorMode::Creative;

        // Placement empties the held container in survival; in creative the
        // container stays full, so the face-adjacent cell is checked to
        // confirm fluid actually landed.
        let place_signature =
            before == Some(fluid) && (after == Some(empty) || (creative && after == Some(fluid)));
        if place_signature {
            if let Some(face) = interaction.face {
                let target = interaction.cell.adjacent(face);
                match grid.read_cell(&interaction.region, target) {
                    Some(record) if record.cell_type == self.config.growth.anchor_cell => {
                        self.growth.register(
                            &mut self.store,
                            &interaction.region,
                            target,
                            &mut self.rng,
                            &mut self.log,
                        );
                        return;
                    }
                    _ => {}
                }
            }
        }

        // Pickup fills the container in survival; in creative the held item
        // does not change, so an existing countdown on the clicked cell is
        // the signal.
        let survival_pickup = before == Some(empty) && after == Some(fluid);
        let creative_pickup = creative
            && before == Some(fluid)
            && self
                .growth
                .is_registered(&self.store, &interaction.region, interaction.cell);
        if (survival_pickup || creative_pickup)
            && self
                .growth
                .unregister(&mut self.store, &interaction.region, interaction.cell)
        {
            self.log.record(ContentEventKind::GrowthAbandoned {
                region: interaction.region.clone(),
                cell: interaction.cell,
            });
        }
    }

    // === Break handling =================================================

    /// Pre-commit break hook. Cleans up bookkeeping tied to the cell and
    /// rolls any extra drop. Breaks are never cancelled by this content.
    pub fn on_break_attempt(
        &mut self,
        actor: &str,
        region: &str,
        cell: CellPos,
        grid: &mut dyn WorldGrid,
    ) -> BreakVerdict {
        let record = match grid.read_cell(region, cell) {
            Some(record) => record,
            None => return BreakVerdict::plain(),
        };

        if record.cell_type == self.config.vault.vault_cell {
            self.forget_vault(region, cell);
        }
        if self.growth.unregister(&mut self.store, region, cell) {
            self.log.record(ContentEventKind::GrowthAbandoned {
                region: region.to_string(),
                cell,
            });
        }

        let extra = match self.registry.get(actor).cloned() {
            Some(actor) => renewal::evaluate_break(
                &self.config.renewal,
                actor.mode,
                actor.held_item.as_ref(),
                &record.cell_type,
                &mut self.rng,
            ),
            None => None,
        };
        if let Some(stack) = extra.clone() {
            self.log.record(ContentEventKind::ItemSpawned {
                stack,
                at: cell.center(),
                impulse: None,
            });
        }
        BreakVerdict {
            allow: true,
            extra_drop: extra,
        }
    }

    // === Conversion chain ===============================================

    pub fn on_item_use(&mut self, actor: &str, item: &ItemStack) {
        if item.item == self.config.renewal.catalyst_item {
            if let Some(record) = self.registry.get_mut(actor) {
                record.conversion_primed = true;
            }
        }
    }

    pub fn on_entity_spawn(&mut self, entity_id: &str, entity_type: &str, owner: Option<&str>) {
        if entity_type != self.config.renewal.projectile_entity {
            return;
        }
        let primed = owner
            .and_then(|id| self.registry.get(id))
            .map_or(false, |record| record.conversion_primed);
        if primed {
            self.marked_projectiles.insert(entity_id.to_string());
        }
    }

    /// Projectile landed. Converts terrain around the hit when the
    /// projectile was marked at spawn, and unprimes the owner either way.
    pub fn on_projectile_hit(
        &mut self,
        entity_id: &str,
        owner: Option<&str>,
        region: &str,
        hit: WorldPos,
        face: Option<Face>,
        grid: &mut dyn WorldGrid,
    ) -> usize {
        let marked = self.marked_projectiles.remove(entity_id);
        if let Some(id) = owner {
            if let Some(record) = self.registry.get_mut(id) {
                record.conversion_primed = false;
            }
        }
        if !marked {
            return 0;
        }
        let center = renewal::effect_center(hit, face);
        renewal::convert_cells(grid, region, center, &self.config.renewal, &mut self.log)
    }

    // === Admin ==========================================================

    /// Wipe the re-derivable store state: visited flags and vault cooldowns.
    /// Unlock flags, growth countdowns, and instance registrations survive.
    /// Scan cursors reset so every actor re-sweeps immediately.
    pub fn reset_transient_state(&mut self) -> usize {
        let ns_prefix = format!("{}:", self.config.namespace);
        let growth_prefix = types::growth_prefix(&self.config.namespace);
        let instance_prefix = types::vault_instance_prefix(&self.config.namespace);
        let mut removed = 0;
        for key in self.store.keys_with_prefix(&ns_prefix) {
            if key.ends_with("_unlocked")
                || key.starts_with(&growth_prefix)
                || key.starts_with(&instance_prefix)
            {
                continue;
            }
            if self.store.remove(&key).is_some() {
                removed += 1;
            }
        }
        for actor in self.registry.iter_mut() {
            actor.last_partition = None;
            actor.last_scan_tick = None;
        }
        self.log
            .record(ContentEventKind::TransientReset { keys_removed: removed });
        removed
    }
}
