//! Routing tables and core selections built over the SpiNN-5 triad geometry.

use std::collections::BTreeMap;

use spinn_machine::{
    get_board_geometry, ChipCoord, CoreSubset, CoreSubsets, Error, MulticastRoutingEntry,
    MulticastRoutingTable, RoutingField,
};

const NO_LINKS: [u32; 0] = [];

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Select the monitor core on every board root of a 24x24 machine.
#[test]
fn select_root_monitors() {
    init_tracing();
    let geometry = get_board_geometry();

    let mut monitors = CoreSubsets::new();
    for root in geometry.get_potential_ethernet_chips(24, 24) {
        monitors.add_processor(root.x, root.y, 0);
    }

    assert_eq!(monitors.n_chips(), 12);
    assert_eq!(monitors.len(), 12);
    for chip in monitors.chips() {
        assert_eq!(geometry.get_local_chip_coordinate(chip.x, chip.y), ChipCoord::ORIGIN);
        assert!(monitors.is_core(chip.x, chip.y, 0));
    }
    assert!(!monitors.is_chip(1, 1));
}

/// Every chip of a triad routes one key per board to its board root, whose
/// table merges the whole board's traffic into a single row.
#[test]
fn board_local_tables_merge() {
    init_tracing();
    let geometry = get_board_geometry();
    let mut tables: BTreeMap<ChipCoord, MulticastRoutingTable> = BTreeMap::new();

    for y in 0..12 {
        for x in 0..12 {
            let root = geometry.get_ethernet_chip_coordinates(x, y, 12, 12, 0, 0);
            let local = geometry.get_local_chip_coordinate(x, y);
            // One key per board, the root's index in the triad
            let board = geometry
                .roots()
                .iter()
                .position(|&r| r == root)
                .expect("root is in the triad") as u32;
            let entry = MulticastRoutingEntry::new(
                board << 8,
                0xff00,
                [local.x + local.y],
                NO_LINKS,
                local != ChipCoord::ORIGIN,
            )
            .unwrap();
            tables
                .entry(root)
                .or_insert_with(|| MulticastRoutingTable::new(root.x, root.y))
                .add_entry(entry)
                .unwrap();
        }
    }

    assert_eq!(tables.len(), 3);
    for table in tables.values() {
        // Each board merged into a single row
        assert_eq!(table.len(), 1);
        // The root's own entry was not defaultable, so neither is the merge
        assert_eq!(table.n_defaultable_entries(), 0);
        let row = table.entries().next().unwrap();
        // Offsets (x + y) on a SpiNN-5 board span 0..=14
        assert_eq!(row.processor_ids().len(), 15);
    }
}

#[test]
fn merge_errors_identify_field() {
    let a = MulticastRoutingEntry::new(0x100, 0xf00, [1], NO_LINKS, true).unwrap();
    let b = MulticastRoutingEntry::new(0x200, 0xf00, [2], NO_LINKS, true).unwrap();
    let err = a.merge(&b).unwrap_err();
    assert_eq!(
        err,
        Error::RoutingMismatch {
            field: RoutingField::Key,
            ours: 0x100,
            theirs: 0x200
        }
    );
    assert!(err.to_string().contains("0x00000100"));
    assert!(err.to_string().contains("0x00000200"));
}

#[test]
fn subsets_per_board() {
    let geometry = get_board_geometry();
    let mut per_board: BTreeMap<ChipCoord, CoreSubsets> = BTreeMap::new();
    for y in 0..12 {
        for x in 0..12 {
            let root = geometry.get_ethernet_chip_coordinates(x, y, 12, 12, 0, 0);
            per_board
                .entry(root)
                .or_default()
                .add_core_subset(CoreSubset::new(x, y, 1..17));
        }
    }
    for subsets in per_board.values() {
        assert_eq!(subsets.n_chips(), 48);
        assert_eq!(subsets.len(), 48 * 16);
    }
}
