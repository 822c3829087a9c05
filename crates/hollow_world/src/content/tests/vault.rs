use super::*;

const NS: &str = "hollow";

fn vault_fixture(cell: CellPos) -> (FakeGrid, PersistentStore, CooldownTracker, VaultTuning) {
    let mut grid = FakeGrid::new();
    grid.set_cell(REGION_OVERWORLD, cell, "reward_vault");
    init_instance(&mut grid, REGION_OVERWORLD, cell);
    (
        grid,
        PersistentStore::new(),
        CooldownTracker::new(NS),
        VaultTuning::default(),
    )
}

fn state_of(grid: &FakeGrid, cell: CellPos) -> VaultState {
    instance_state(&grid.read_cell(REGION_OVERWORLD, cell).expect("vault cell"))
}

#[test]
fn nearby_actor_with_no_cooldown_activates_instance() {
    let cell = CellPos::new(10, 64, 10);
    let (mut grid, mut store, tracker, tuning) = vault_fixture(cell);
    let mut registry = ActorRegistry::new();
    registry.register(survival_actor("alice", 12.0, 64.5, 10.5));
    let mut log = EventLog::new();

    let outcome = sweep_instance(
        &mut store,
        &mut grid,
        &registry,
        &tracker,
        &tuning,
        REGION_OVERWORLD,
        cell,
        &mut log,
    );

    assert_eq!(outcome, SweepOutcome::Keep);
    assert_eq!(state_of(&grid, cell), VaultState::Active);
    assert_eq!(
        count_events(log.entries(), |kind| matches!(
            kind,
            ContentEventKind::SoundPlayed { sound, .. } if sound == &tuning.activate_sound
        )),
        1
    );
    assert_eq!(
        count_events(log.entries(), |kind| matches!(
            kind,
            ContentEventKind::VaultStateChanged {
                from: VaultState::Inactive,
                to: VaultState::Active,
                ..
            }
        )),
        1
    );

    // A second evaluation keeps the state and only plays the ambient
    // particle; the activation sound does not repeat.
    sweep_instance(
        &mut store,
        &mut grid,
        &registry,
        &tracker,
        &tuning,
        REGION_OVERWORLD,
        cell,
        &mut log,
    );
    assert_eq!(state_of(&grid, cell), VaultState::Active);
    assert_eq!(
        count_events(log.entries(), |kind| matches!(
            kind,
            ContentEventKind::SoundPlayed { sound, .. } if sound == &tuning.activate_sound
        )),
        1
    );
    assert_eq!(
        count_events(log.entries(), |kind| matches!(
            kind,
            ContentEventKind::ParticleSpawned { .. }
        )),
        1
    );
}

#[test]
fn distant_actor_does_not_activate() {
    let cell = CellPos::new(10, 64, 10);
    let (mut grid, mut store, tracker, tuning) = vault_fixture(cell);
    let mut registry = ActorRegistry::new();
    registry.register(survival_actor("alice", 20.0, 64.5, 10.5));
    let mut log = EventLog::new();

    sweep_instance(
        &mut store,
        &mut grid,
        &registry,
        &tracker,
        &tuning,
        REGION_OVERWORLD,
        cell,
        &mut log,
    );
    assert_eq!(state_of(&grid, cell), VaultState::Inactive);
    assert!(log.is_empty());
}

#[test]
fn cooldown_ticks_down_and_reactivates_at_zero() {
    let cell = CellPos::new(0, 64, 0);
    let (mut grid, mut store, tracker, tuning) = vault_fixture(cell);
    let mut registry = ActorRegistry::new();
    registry.register(survival_actor("alice", 1.5, 64.5, 0.5));
    tracker.set(&mut store, cell, VaultVariant::Normal, "alice", 20);
    let mut log = EventLog::new();

    // First evaluation: 20 -> 10, still blocked.
    sweep_instance(
        &mut store,
        &mut grid,
        &registry,
        &tracker,
        &tuning,
        REGION_OVERWORLD,
        cell,
        &mut log,
    );
    assert_eq!(state_of(&grid, cell), VaultState::Inactive);
    assert_eq!(
        tracker.get(&store, cell, VaultVariant::Normal, "alice"),
        10
    );

    // Second evaluation: the count reaches zero and the same pass
    // re-activates. Spent entries leave the store entirely.
    sweep_instance(
        &mut store,
        &mut grid,
        &registry,
        &tracker,
        &tuning,
        REGION_OVERWORLD,
        cell,
        &mut log,
    );
    assert_eq!(state_of(&grid, cell), VaultState::Active);
    assert!(!store.contains(&tracker.key(cell, VaultVariant::Normal, "alice")));
}

#[test]
fn any_pending_cooldown_blocks_activation_for_everyone() {
    let cell = CellPos::new(0, 64, 0);
    let (mut grid, mut store, tracker, tuning) = vault_fixture(cell);
    let mut registry = ActorRegistry::new();
    registry.register(survival_actor("alice", 40.0, 64.0, 0.0));
    registry.register(survival_actor("bob", 1.5, 64.5, 0.5));
    tracker.set(&mut store, cell, VaultVariant::Normal, "alice", 500);
    let mut log = EventLog::new();

    sweep_instance(
        &mut store,
        &mut grid,
        &registry,
        &tracker,
        &tuning,
        REGION_OVERWORLD,
        cell,
        &mut log,
    );
    assert_eq!(state_of(&grid, cell), VaultState::Inactive);
}

#[test]
fn active_instance_deactivates_when_actors_leave() {
    let cell = CellPos::new(0, 64, 0);
    let (mut grid, mut store, tracker, tuning) = vault_fixture(cell);
    set_instance_state(&mut grid, REGION_OVERWORLD, cell, VaultState::Active);
    let registry = ActorRegistry::new();
    let mut log = EventLog::new();

    sweep_instance(
        &mut store,
        &mut grid,
        &registry,
        &tracker,
        &tuning,
        REGION_OVERWORLD,
        cell,
        &mut log,
    );
    assert_eq!(state_of(&grid, cell), VaultState::Inactive);
    assert_eq!(
        count_events(log.entries(), |kind| matches!(
            kind,
            ContentEventKind::SoundPlayed { sound, .. } if sound == &tuning.deactivate_sound
        )),
        1
    );
}

#[test]
fn dispensing_instance_skips_the_guard() {
    let cell = CellPos::new(0, 64, 0);
    let (mut grid, mut store, tracker, tuning) = vault_fixture(cell);
    set_instance_state(&mut grid, REGION_OVERWORLD, cell, VaultState::Dispensing);
    let registry = ActorRegistry::new();
    let mut log = EventLog::new();

    let outcome = sweep_instance(
        &mut store,
        &mut grid,
        &registry,
        &tracker,
        &tuning,
        REGION_OVERWORLD,
        cell,
        &mut log,
    );

    // No actor qualifies, but a dispensing instance never transitions from
    // the periodic evaluation. The ambient particle still plays.
    assert_eq!(outcome, SweepOutcome::Keep);
    assert_eq!(state_of(&grid, cell), VaultState::Dispensing);
    assert_eq!(
        count_events(log.entries(), |kind| matches!(
            kind,
            ContentEventKind::ParticleSpawned { .. }
        )),
        1
    );
    assert_eq!(
        count_events(log.entries(), |kind| matches!(
            kind,
            ContentEventKind::VaultStateChanged { .. }
        )),
        0
    );
}

#[test]
fn replaced_cell_drops_out_of_the_sweep() {
    let cell = CellPos::new(0, 64, 0);
    let (mut grid, mut store, tracker, tuning) = vault_fixture(cell);
    grid.write_cell_type(REGION_OVERWORLD, cell, "stone");
    let registry = ActorRegistry::new();
    let mut log = EventLog::new();

    let outcome = sweep_instance(
        &mut store,
        &mut grid,
        &registry,
        &tracker,
        &tuning,
        REGION_OVERWORLD,
        cell,
        &mut log,
    );
    assert_eq!(outcome, SweepOutcome::Remove);
}

#[test]
fn unresident_instance_is_kept_untouched() {
    let cell = CellPos::new(640, 64, 640);
    let mut grid = FakeGrid::new();
    let mut store = PersistentStore::new();
    let tracker = CooldownTracker::new(NS);
    let tuning = VaultTuning::default();
    let registry = ActorRegistry::new();
    let mut log = EventLog::new();

    let outcome = sweep_instance(
        &mut store,
        &mut grid,
        &registry,
        &tracker,
        &tuning,
        REGION_OVERWORLD,
        cell,
        &mut log,
    );
    assert_eq!(outcome, SweepOutcome::Keep);
    assert!(log.is_empty());
    assert_eq!(grid.writes, 0);
}

#[test]
fn wrong_key_is_rejected_without_touching_state() {
    let cell = CellPos::new(0, 64, 0);
    let (mut grid, mut store, tracker, tuning) = vault_fixture(cell);
    set_instance_state(&mut grid, REGION_OVERWORLD, cell, VaultState::Active);
    let mut actor = survival_actor("alice", 1.5, 64.5, 0.5);
    actor.held_item = Some(ItemStack::new("stone", 1));
    let mut loot = default_vault_tables();
    let mut rng = WorldRng::seeded(1);
    let mut log = EventLog::new();

    let outcome = interact_instance(
        &mut store,
        &mut grid,
        &tracker,
        &tuning,
        REGION_OVERWORLD,
        cell,
        &actor,
        &mut loot,
        &mut rng,
        &mut log,
    );

    assert_eq!(
        outcome,
        Some(VaultInteraction::Rejected {
            reason: RejectReason::WrongKeyItem {
                held: Some("stone".to_string())
            }
        })
    );
    assert_eq!(state_of(&grid, cell), VaultState::Active);
    assert!(store.is_empty());
    // The rejection buzz goes to the interacting actor only.
    assert_eq!(
        count_events(log.entries(), |kind| matches!(
            kind,
            ContentEventKind::SoundPlayed { sound, to_actor: Some(actor), .. }
                if sound == &tuning.reject_sound && actor == "alice"
        )),
        1
    );
}

#[test]
fn inactive_instance_rejects_before_key_or_cooldown_checks() {
    let cell = CellPos::new(0, 64, 0);
    let (mut grid, mut store, tracker, tuning) = vault_fixture(cell);
    let mut actor = survival_actor("alice", 1.5, 64.5, 0.5);
    actor.held_item = Some(ItemStack::new(tuning.key_item_normal.clone(), 1));
    tracker.set(&mut store, cell, VaultVariant::Normal, "alice", 100);
    let mut loot = default_vault_tables();
    let mut rng = WorldRng::seeded(1);
    let mut log = EventLog::new();

    let outcome = interact_instance(
        &mut store,
        &mut grid,
        &tracker,
        &tuning,
        REGION_OVERWORLD,
        cell,
        &actor,
        &mut loot,
        &mut rng,
        &mut log,
    );
    assert_eq!(
        outcome,
        Some(VaultInteraction::Rejected {
            reason: RejectReason::VaultNotActive
        })
    );
}

#[test]
fn cooldown_rejection_reports_remaining_ticks() {
    let cell = CellPos::new(0, 64, 0);
    let (mut grid, mut store, tracker, tuning) = vault_fixture(cell);
    set_instance_state(&mut grid, REGION_OVERWORLD, cell, VaultState::Active);
    let mut actor = survival_actor("alice", 1.5, 64.5, 0.5);
    actor.held_item = Some(ItemStack::new(tuning.key_item_normal.clone(), 1));
    tracker.set(&mut store, cell, VaultVariant::Normal, "alice", 60);
    let mut loot = default_vault_tables();
    let mut rng = WorldRng::seeded(1);
    let mut log = EventLog::new();

    let outcome = interact_instance(
        &mut store,
        &mut grid,
        &tracker,
        &tuning,
        REGION_OVERWORLD,
        cell,
        &actor,
        &mut loot,
        &mut rng,
        &mut log,
    );
    assert_eq!(
        outcome,
        Some(VaultInteraction::Rejected {
            reason: RejectReason::CooldownActive { remaining_ticks: 60 }
        })
    );
    // Reading the count for the rejection does not decrement it.
    assert_eq!(tracker.get(&store, cell, VaultVariant::Normal, "alice"), 60);
}

#[test]
fn valid_key_consumes_and_starts_dispensing() {
    let cell = CellPos::new(0, 64, 0);
    let (mut grid, mut store, tracker, tuning) = vault_fixture(cell);
    set_instance_state(&mut grid, REGION_OVERWORLD, cell, VaultState::Active);
    let mut actor = survival_actor("alice", 1.5, 64.5, 0.5);
    actor.held_item = Some(ItemStack::new(tuning.key_item_normal.clone(), 1));
    let mut loot = default_vault_tables();
    let mut rng = WorldRng::seeded(1);
    let mut log = EventLog::new();

    let outcome = interact_instance(
        &mut store,
        &mut grid,
        &tracker,
        &tuning,
        REGION_OVERWORLD,
        cell,
        &actor,
        &mut loot,
        &mut rng,
        &mut log,
    );

    match outcome {
        Some(VaultInteraction::DispenseStarted { variant, items }) => {
            assert_eq!(variant, VaultVariant::Normal);
            assert_eq!(items.len(), 3);
        }
        other => panic!("expected dispense start, got {other:?}"),
    }
    assert_eq!(state_of(&grid, cell), VaultState::Dispensing);
    assert_eq!(
        count_events(log.entries(), |kind| matches!(
            kind,
            ContentEventKind::HeldItemConsumed { actor, item }
                if actor == "alice" && item == &tuning.key_item_normal
        )),
        1
    );
    assert_eq!(
        count_events(log.entries(), |kind| matches!(
            kind,
            ContentEventKind::SoundPlayed { sound, .. } if sound == &tuning.open_sound
        )),
        1
    );
}

#[test]
fn elevated_actor_without_key_toggles_variant() {
    let cell = CellPos::new(0, 64, 0);
    let (mut grid, mut store, tracker, tuning) = vault_fixture(cell);
    let mut actor = survival_actor("admin", 1.5, 64.5, 0.5);
    actor.mode = ActorMode::Creative;
    // A stale cooldown on the outgoing variant must not follow it back.
    tracker.set(&mut store, cell, VaultVariant::Normal, "alice", 4000);
    let mut loot = default_vault_tables();
    let mut rng = WorldRng::seeded(1);
    let mut log = EventLog::new();

    let outcome = interact_instance(
        &mut store,
        &mut grid,
        &tracker,
        &tuning,
        REGION_OVERWORLD,
        cell,
        &actor,
        &mut loot,
        &mut rng,
        &mut log,
    );

    assert_eq!(
        outcome,
        Some(VaultInteraction::Toggled {
            from: VaultVariant::Normal,
            to: VaultVariant::Ominous,
        })
    );
    let record = grid.read_cell(REGION_OVERWORLD, cell).expect("vault cell");
    assert_eq!(instance_variant(&record), VaultVariant::Ominous);
    assert!(store.is_empty());
    assert_eq!(
        count_events(log.entries(), |kind| matches!(
            kind,
            ContentEventKind::VariantToggled {
                from: VaultVariant::Normal,
                to: VaultVariant::Ominous,
                ..
            }
        )),
        1
    );

    // Holding the matching key suppresses the toggle; the ordinary guards
    // apply instead.
    actor.held_item = Some(ItemStack::new(tuning.key_item_ominous.clone(), 1));
    let outcome = interact_instance(
        &mut store,
        &mut grid,
        &tracker,
        &tuning,
        REGION_OVERWORLD,
        cell,
        &actor,
        &mut loot,
        &mut rng,
        &mut log,
    );
    assert_eq!(
        outcome,
        Some(VaultInteraction::Rejected {
            reason: RejectReason::VaultNotActive
        })
    );
    let record = grid.read_cell(REGION_OVERWORLD, cell).expect("vault cell");
    assert_eq!(instance_variant(&record), VaultVariant::Ominous);
}

#[test]
fn interaction_with_replaced_cell_is_ignored() {
    let cell = CellPos::new(0, 64, 0);
    let (mut grid, mut store, tracker, tuning) = vault_fixture(cell);
    grid.write_cell_type(REGION_OVERWORLD, cell, "stone");
    let actor = survival_actor("alice", 1.5, 64.5, 0.5);
    let mut loot = default_vault_tables();
    let mut rng = WorldRng::seeded(1);
    let mut log = EventLog::new();

    let outcome = interact_instance(
        &mut store,
        &mut grid,
        &tracker,
        &tuning,
        REGION_OVERWORLD,
        cell,
        &actor,
        &mut loot,
        &mut rng,
        &mut log,
    );
    assert_eq!(outcome, None);
    assert!(log.is_empty());
}
