use super::*;

#[test]
fn store_keys_follow_the_wire_format() {
    let cell = CellPos::new(4, -2, 7);
    assert_eq!(unlock_key("hollow", "overworld"), "hollow:overworld_unlocked");
    assert_eq!(
        visited_key("hollow", PartitionPos::new(3, -2)),
        "hollow:visited-(3:-2)"
    );
    assert_eq!(
        growth_key("hollow", "overworld", cell),
        "hollow:growth-overworld-(4:-2:7)"
    );
    assert_eq!(
        vault_instance_key("hollow", "overworld", cell),
        "hollow:vault_instance-overworld-(4:-2:7)"
    );
    assert_eq!(
        cooldown_key("hollow", VaultVariant::Ominous, cell, "alice"),
        "hollow:vault-ominous-(4:-2:7)-alice"
    );
    assert!(cooldown_key("hollow", VaultVariant::Normal, cell, "alice")
        .starts_with(&cooldown_prefix("hollow", VaultVariant::Normal, cell)));
}

#[test]
fn growth_keys_parse_back_to_their_cell() {
    let cell = CellPos::new(-10, 64, 1000);
    let key = growth_key("hollow", "the_end", cell);
    assert_eq!(
        parse_growth_key("hollow", &key),
        Some(("the_end".to_string(), cell))
    );

    assert_eq!(parse_growth_key("hollow", "hollow:visited-(1:1)"), None);
    assert_eq!(parse_growth_key("other", &key), None);
}

#[test]
fn vault_instance_keys_parse_back_to_their_cell() {
    let cell = CellPos::new(0, -59, -16);
    let key = vault_instance_key("hollow", "overworld", cell);
    assert_eq!(
        parse_vault_instance_key("hollow", &key),
        Some(("overworld".to_string(), cell))
    );
    assert_eq!(parse_vault_instance_key("hollow", "hollow:growth-x-(1:2:3)"), None);
}

#[test]
fn cell_ids_round_trip_including_negatives() {
    for cell in [
        CellPos::new(0, 0, 0),
        CellPos::new(-1, -64, 31_000_000),
        CellPos::new(7, 319, -7),
    ] {
        assert_eq!(CellPos::parse_id(&cell.id_string()), Some(cell));
    }
    assert_eq!(CellPos::parse_id("(1:2)"), None);
    assert_eq!(CellPos::parse_id("1:2:3"), None);

    let partition = PartitionPos::new(-3, 12);
    assert_eq!(PartitionPos::parse_id(&partition.id_string()), Some(partition));
}

#[test]
fn cells_map_to_partitions_with_floor_division() {
    assert_eq!(CellPos::new(0, 0, 0).partition(), PartitionPos::new(0, 0));
    assert_eq!(CellPos::new(15, 80, 15).partition(), PartitionPos::new(0, 0));
    assert_eq!(CellPos::new(16, 80, 15).partition(), PartitionPos::new(1, 0));
    assert_eq!(CellPos::new(-1, 80, -16).partition(), PartitionPos::new(-1, -1));
    assert_eq!(CellPos::new(-17, 80, 0).partition(), PartitionPos::new(-2, 0));
}

#[test]
fn partition_disc_obeys_the_euclidean_cutoff() {
    let center = PartitionPos::new(3, -2);
    let disc = partitions_within(center, 10);

    assert!(disc.contains(&center));
    assert!(disc.contains(&PartitionPos::new(13, -2)));
    assert!(disc.contains(&PartitionPos::new(9, 6)));
    assert!(!disc.contains(&PartitionPos::new(11, 5)));
    for partition in &disc {
        let dx = partition.x - center.x;
        let dz = partition.z - center.z;
        assert!(dx * dx + dz * dz <= 100);
    }

    assert_eq!(partitions_within(center, 0), vec![center]);
    assert!(partitions_within(center, -1).is_empty());
}

#[test]
fn item_stacks_track_enchants() {
    let plain = ItemStack::new("iron_pickaxe", 1);
    assert_eq!(plain.enchant_level("silk_touch"), 0);

    let enchanted = plain.clone().with_enchant("fortune", 3);
    assert_eq!(enchanted.enchant_level("fortune"), 3);
    assert_ne!(plain, enchanted);
}

#[test]
fn vault_vocabulary_round_trips_as_text() {
    for state in [VaultState::Inactive, VaultState::Active, VaultState::Dispensing] {
        assert_eq!(VaultState::parse(state.as_str()), Some(state));
    }
    assert_eq!(VaultState::parse("broken"), None);

    for variant in [VaultVariant::Normal, VaultVariant::Ominous] {
        assert_eq!(VaultVariant::parse(variant.as_str()), Some(variant));
        assert_eq!(variant.other().other(), variant);
    }
}

#[test]
fn capability_tiers_order_their_scan_radii() {
    let radii: Vec<i32> = [
        CapabilityTier::SuperLow,
        CapabilityTier::Low,
        CapabilityTier::Mid,
        CapabilityTier::High,
        CapabilityTier::SuperHigh,
    ]
    .iter()
    .map(|tier| tier.scan_radius())
    .collect();
    assert_eq!(radii, vec![8, 10, 12, 16, 25]);
}
