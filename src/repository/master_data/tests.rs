use super::init::full_system_qty;
use super::MasterDataStore;
use crate::domain::bin::{BinEntry, BinSlot, Stack};
use crate::domain::sku::{CapacityRow, FillMetrics};
use crate::domain::types::{CompartmentSize, FitStatus};
use crate::repository::error::RepositoryError;

fn capacity_row(sku: &str, size: CompartmentSize, per_size: i64, stored: i64, min: i64) -> CapacityRow {
    let mut row = CapacityRow {
        sku: sku.to_string(),
        length_mm: 100.0,
        width_mm: 100.0,
        height_mm: 100.0,
        weight_kg: 0.1,
        volume_mm3: 1_000_000.0,
        min_qty_per_bin: min,
        qty_stored: stored,
        qty_per_bin: 0,
        qty_per_half: 0,
        qty_per_quarter: 0,
        qty_per_eighth: 0,
        compartment_size: Some(size),
        bin_count: 0.0,
        capped_bin_count: 0.0,
        fit_status: FitStatus::Fit,
        fill: FillMetrics::default(),
    };
    match size {
        CompartmentSize::Whole => row.qty_per_bin = per_size,
        CompartmentSize::Half => row.qty_per_half = per_size,
        CompartmentSize::Quarter => row.qty_per_quarter = per_size,
        CompartmentSize::Eighth => row.qty_per_eighth = per_size,
    }
    if row.qty_per_bin == 0 {
        row.qty_per_bin = per_size * size.compartments_per_bin() as i64;
    }
    row
}

fn slot(sku: &str, qty: i64, priority: i64) -> BinSlot {
    BinSlot {
        sku: sku.to_string(),
        qty,
        priority,
    }
}

/// 4 个料箱: 两个整箱 C, 一个 1/4 箱 (A, B), 一个 1/4 空箱
fn setup_store() -> MasterDataStore {
    let store = MasterDataStore::new().unwrap();

    let rows = vec![
        capacity_row("C", CompartmentSize::Whole, 100, 160, 10),
        capacity_row("A", CompartmentSize::Quarter, 50, 40, 5),
        capacity_row("B", CompartmentSize::Quarter, 50, 30, 5),
    ];
    let bins = vec![
        BinEntry {
            bin_id: 1,
            compartment_size: CompartmentSize::Whole,
            slots: vec![slot("C", 100, 1)],
        },
        BinEntry {
            bin_id: 2,
            compartment_size: CompartmentSize::Whole,
            slots: vec![slot("C", 60, 2)],
        },
        BinEntry {
            bin_id: 3,
            compartment_size: CompartmentSize::Quarter,
            slots: vec![slot("A", 40, 1), slot("B", 30, 1)],
        },
        BinEntry::empty(4, CompartmentSize::Quarter),
    ];
    let stacks = vec![
        Stack {
            stack_id: 0,
            bins: vec![1, 3],
        },
        Stack {
            stack_id: 1,
            bins: vec![2, 4],
        },
    ];

    let summary = store.initialize(&rows, &bins, &stacks, 20, 20.0).unwrap();
    assert_eq!(summary.qty_mismatches, 0);
    store
}

#[test]
fn test_initialize_builds_all_tables() {
    let store = setup_store();
    let snapshot = store.snapshot().unwrap();

    assert_eq!(snapshot.skus.len(), 3);
    assert_eq!(snapshot.capacity.len(), 4);
    assert_eq!(snapshot.compartments.len(), 1 + 1 + 4 + 4);
    assert_eq!(snapshot.stack_lookup.len(), 4);

    let c = store.get_sku("C").unwrap().unwrap();
    assert_eq!(c.qty_in_system, 160);
    assert_eq!(c.full_system_qty, 160);
    assert_eq!(c.full_bin_qty, 100);
    assert_eq!(c.restock_qty, 32);
    assert_eq!(c.prio_bin, Some(1));

    let a = store.get_sku("A").unwrap().unwrap();
    // 1/4 箱 SKU 的满载数量按整箱计
    assert_eq!(a.full_bin_qty, 200);
    assert_eq!(a.prio_bin, Some(3));
    assert_eq!(a.compartment_size, CompartmentSize::Quarter);

    let cap = store.get_capacity(3).unwrap().unwrap();
    assert_eq!(cap.num_full_compartments, 2);
    assert_eq!(store.get_capacity(4).unwrap().unwrap().num_full_compartments, 0);
}

#[test]
fn test_initialize_is_repeatable() {
    let store = setup_store();
    let rows = vec![capacity_row("A", CompartmentSize::Whole, 10, 10, 1)];
    let bins = vec![BinEntry {
        bin_id: 1,
        compartment_size: CompartmentSize::Whole,
        slots: vec![slot("A", 10, 1)],
    }];
    let stacks = vec![Stack {
        stack_id: 0,
        bins: vec![1],
    }];

    let summary = store.initialize(&rows, &bins, &stacks, 20, 20.0).unwrap();
    assert_eq!(summary.sku_count, 1);
    assert_eq!(summary.bin_count, 1);
    assert_eq!(store.list_skus().unwrap().len(), 1);
}

#[test]
fn test_full_system_qty_formula() {
    // min(存量, 每箱数量 * 最大箱数) 与最小数量取大
    let row = capacity_row("X", CompartmentSize::Whole, 10, 500, 5);
    assert_eq!(full_system_qty(&row, 20), 200);

    let row = capacity_row("X", CompartmentSize::Whole, 10, 3, 5);
    assert_eq!(full_system_qty(&row, 20), 5);
}

#[test]
fn test_find_available_bin_and_empty_compartment() {
    let store = setup_store();

    assert_eq!(store.find_available_bin(CompartmentSize::Quarter).unwrap(), Some(3));
    assert_eq!(store.find_available_bin(CompartmentSize::Whole).unwrap(), None);
    assert_eq!(store.find_empty_compartment(3).unwrap(), Some(3));
    assert_eq!(store.free_compartments(CompartmentSize::Quarter).unwrap(), 6);
}

#[test]
fn test_get_compartments_for_bin_and_sku() {
    let store = setup_store();

    let rows = store.get_compartments(3, "B").unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].compartment_id, 2);
    assert_eq!(rows[0].qty_in_bin, 30);
    assert!(store.get_compartments(3, "C").unwrap().is_empty());
    assert!(store.get_compartments(99, "A").unwrap().is_empty());
}

#[test]
fn test_mark_compartment_empty_decrements_capacity() {
    let store = setup_store();

    assert!(store.mark_compartment_empty(3, 1).unwrap());

    let rows = store.bin_compartments(3).unwrap();
    assert_eq!(rows[0].sku, None);
    assert_eq!(rows[0].priority, None);
    assert_eq!(rows[0].qty_in_bin, 0);
    assert_eq!(store.get_capacity(3).unwrap().unwrap().num_full_compartments, 1);

    // 已为空的格口再次清空不改变计数
    assert!(store.mark_compartment_empty(3, 1).unwrap());
    assert_eq!(store.get_capacity(3).unwrap().unwrap().num_full_compartments, 1);

    // 不存在的格口
    assert!(!store.mark_compartment_empty(3, 9).unwrap());
}

#[test]
fn test_assign_compartment_increments_capacity() {
    let store = setup_store();

    store.assign_compartment(4, 1, "A", 10, 2).unwrap();
    assert_eq!(store.get_capacity(4).unwrap().unwrap().num_full_compartments, 1);
    assert_eq!(store.max_priority("A").unwrap(), 2);
    assert_eq!(store.sku_stock_total("A").unwrap(), 50);

    // sku_live 不变
    assert_eq!(store.get_sku("A").unwrap().unwrap().qty_in_system, 40);

    let err = store.assign_compartment(4, 1, "B", 5, 2).unwrap_err();
    assert!(matches!(err, RepositoryError::InvariantViolation(_)));

    let err = store.assign_compartment(4, 2, "B", 0, 2).unwrap_err();
    assert!(matches!(err, RepositoryError::FieldValueError { .. }));
}

#[test]
fn test_rerank_and_refresh_priority_bin() {
    let store = setup_store();

    store.mark_compartment_empty(1, 1).unwrap();
    store.rerank_priorities("C").unwrap();
    let prio_bin = store.refresh_priority_bin("C").unwrap();

    assert_eq!(prio_bin, Some(2));
    let first = store.priority_location("C", 1).unwrap().unwrap();
    assert_eq!(first.bin_id, 2);
    assert_eq!(store.get_sku("C").unwrap().unwrap().prio_bin, Some(2));
}

#[test]
fn test_rerank_closes_gaps() {
    let store = setup_store();
    store.assign_compartment(4, 1, "A", 5, 5).unwrap();
    store.assign_compartment(4, 2, "A", 5, 9).unwrap();

    store.rerank_priorities("A").unwrap();

    let priorities: Vec<_> = store
        .sku_locations("A")
        .unwrap()
        .into_iter()
        .map(|row| row.priority)
        .collect();
    assert_eq!(priorities, vec![Some(1), Some(2), Some(3)]);
}

#[test]
fn test_adjust_quantities_rejects_negative() {
    let store = setup_store();

    assert_eq!(store.adjust_sku_qty("A", -15).unwrap(), 25);
    let err = store.adjust_sku_qty("A", -26).unwrap_err();
    assert!(matches!(err, RepositoryError::InvariantViolation(_)));
    assert_eq!(store.get_sku("A").unwrap().unwrap().qty_in_system, 25);

    assert_eq!(store.adjust_bin_qty(3, 1, -15).unwrap(), 25);
    let err = store.adjust_bin_qty(3, 1, -26).unwrap_err();
    assert!(matches!(err, RepositoryError::InvariantViolation(_)));

    // 空格口不可调整
    let err = store.adjust_bin_qty(4, 1, 5).unwrap_err();
    assert!(matches!(err, RepositoryError::InvariantViolation(_)));

    let err = store.adjust_sku_qty("MISSING", 1).unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[test]
fn test_pop_to_top() {
    let store = MasterDataStore::new().unwrap();
    let bins: Vec<BinEntry> = [5, 2, 9, 1]
        .into_iter()
        .map(|id| BinEntry::empty(id, CompartmentSize::Whole))
        .collect();
    let stacks = vec![Stack {
        stack_id: 0,
        bins: vec![5, 2, 9, 1],
    }];
    store.initialize(&[], &bins, &stacks, 20, 20.0).unwrap();

    assert_eq!(store.bins_above(9).unwrap(), Some(2));
    assert_eq!(store.pop_to_top(9).unwrap(), Some(2));
    assert_eq!(store.stack_bins(0).unwrap(), vec![9, 5, 2, 1]);

    // 已在堆顶
    assert_eq!(store.pop_to_top(9).unwrap(), Some(0));
    assert_eq!(store.stack_bins(0).unwrap(), vec![9, 5, 2, 1]);

    // 不在任何料箱堆中
    assert_eq!(store.pop_to_top(42).unwrap(), None);
    assert_eq!(store.resolve_stack(42).unwrap(), None);
}

#[test]
fn test_stacks_and_health_counts() {
    let store = setup_store();

    let stacks = store.stacks().unwrap();
    assert_eq!(stacks.len(), 2);
    assert_eq!(stacks[0].bins, vec![1, 3]);
    assert_eq!(store.resolve_stack(4).unwrap(), Some(1));

    let health = store.health_counts().unwrap();
    assert_eq!(health.sku_rows, 3);
    assert_eq!(health.content_rows, 10);
    assert_eq!(health.negative_sku_qty, 0);
    assert_eq!(health.negative_bin_qty, 0);
}

#[test]
fn test_occupied_compartments_sorted_by_sku() {
    let store = setup_store();
    store.assign_compartment(4, 1, "A", 10, 2).unwrap();

    let rows = store.occupied_compartments(CompartmentSize::Quarter).unwrap();
    let skus: Vec<_> = rows.iter().filter_map(|row| row.sku.as_deref()).collect();
    assert_eq!(skus, vec!["A", "A", "B"]);
}
