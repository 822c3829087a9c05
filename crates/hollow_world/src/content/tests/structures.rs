use super::*;

fn chest_island() -> StructureDef {
    StructureDef {
        name: "chest_island".to_string(),
        region: REGION_OVERWORLD.to_string(),
        origin_offset: CellPos::new(0, 0, 0),
        cells: vec![
            CellPatch {
                shape: CellShape::Span {
                    min: CellPos::new(-1, -1, -1),
                    max: CellPos::new(1, -1, 1),
                },
                cell_type: "dirt".to_string(),
                state: CellState::new(),
            },
            CellPatch {
                shape: CellShape::Point {
                    at: CellPos::new(1, -1, 1),
                },
                cell_type: "chest".to_string(),
                state: CellState::new(),
            },
        ],
        loot: Some(LootPlan {
            container_offset: CellPos::new(1, -1, 1),
            entries: vec![
                LootEntry {
                    slot: 11,
                    item: "ice".to_string(),
                    amount: 2,
                },
                LootEntry {
                    slot: 99,
                    item: "lava_bucket".to_string(),
                    amount: 1,
                },
            ],
        }),
    }
}

#[test]
fn patches_apply_in_template_order() {
    let mut grid = FakeGrid::new();
    let def = chest_island();
    let origin = CellPos::new(100, 64, -40);

    write_structure(&mut grid, &def, origin);

    // The span landed relative to the origin.
    assert_eq!(
        grid.cell_type(REGION_OVERWORLD, CellPos::new(99, 63, -41)),
        Some("dirt".to_string())
    );
    // The later point patch overwrote the span corner.
    assert_eq!(
        grid.cell_type(REGION_OVERWORLD, CellPos::new(101, 63, -39)),
        Some("chest".to_string())
    );
}

#[test]
fn loot_fills_only_slots_the_container_has() {
    let mut grid = FakeGrid::new();
    let def = chest_island();
    let origin = CellPos::new(0, 64, 0);
    let container = CellPos::new(1, 63, 1);

    write_structure(&mut grid, &def, origin);
    grid.add_container(REGION_OVERWORLD, container, 27);

    let mut log = EventLog::new();
    fill_structure_loot(&mut grid, &def, origin, &mut log);

    // Slot 99 exceeds the container and is dropped silently.
    assert_eq!(
        grid.slots_written,
        vec![(container, 11, ItemStack::new("ice", 2))]
    );
    assert!(log.is_empty());
}

#[test]
fn missing_container_skips_loot_and_records_it() {
    let mut grid = FakeGrid::new();
    let def = chest_island();
    let origin = CellPos::new(0, 64, 0);

    write_structure(&mut grid, &def, origin);

    let mut log = EventLog::new();
    fill_structure_loot(&mut grid, &def, origin, &mut log);

    assert!(grid.slots_written.is_empty());
    assert_eq!(
        count_events(log.entries(), |kind| matches!(
            kind,
            ContentEventKind::LootSkipped { structure, .. } if structure == "chest_island"
        )),
        1
    );
}

#[test]
fn unlock_flag_round_trips_through_the_store() {
    let mut store = PersistentStore::new();
    assert!(!region_unlocked(&store, "hollow", REGION_OVERWORLD));

    mark_region_unlocked(&mut store, "hollow", REGION_OVERWORLD);
    assert!(region_unlocked(&store, "hollow", REGION_OVERWORLD));
    assert!(store.flag("hollow:overworld_unlocked"));
    assert!(!region_unlocked(&store, "hollow", REGION_NETHER));
}

#[test]
fn shipped_templates_place_their_loot_containers() {
    let set = default_structures();
    assert!(set.has_region(REGION_OVERWORLD));
    assert!(set.has_region(REGION_NETHER));

    // Every loot plan must point at a cell some patch actually covers.
    let origin = CellPos::new(0, 0, 0);
    for def in &set.structures {
        let plan = match &def.loot {
            Some(plan) => plan,
            None => continue,
        };
        let target = origin.offset(
            plan.container_offset.x,
            plan.container_offset.y,
            plan.container_offset.z,
        );
        let covered = def
            .cells
            .iter()
            .any(|patch| patch.shape.translated(origin).contains(target));
        assert!(covered, "{} loot container is not placed", def.name);
    }
}

#[test]
fn structure_set_round_trips_as_json() {
    let set = default_structures();
    let raw = serde_json::to_string(&set).expect("encode structures");
    let parsed: StructureSet = serde_json::from_str(&raw).expect("decode structures");
    assert_eq!(parsed, set);
}
