// ==========================================
// 导入层集成测试
// ==========================================
// 测试目标: 从真实文件读取 SKU 主数据与出库订单
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

use autostore_sim::config::{CsvFormat, RunConfig, SkuColumnMapping};
use autostore_sim::importer::ImportError;
use autostore_sim::{logging, OutboundImporter, SkuImporter};
use chrono::NaiveDate;
use std::collections::HashMap;
use test_helpers::{write_temp_bytes, write_temp_csv, OUTBOUND_HEADER, SKU_HEADER};

#[test]
fn test_import_csv_basic() {
    logging::init_test();
    let file = write_temp_csv(&[
        SKU_HEADER,
        "sku-1,120,80,40,0.75,5,300",
        " Sku-2 ,60,60,60,,2,10",
        "SKU-1,1,1,1,1,1,1",
        "   ,1,1,1,1,1,1",
    ]);

    let config = RunConfig::default();
    let report = SkuImporter::new(&config).import_file(file.path());

    assert!(report.is_ok());
    assert_eq!(report.total_rows, 4);
    assert_eq!(report.rows.len(), 2);
    assert_eq!(report.rows[0].sku, "SKU-1");
    assert_eq!(report.rows[0].qty_stored, 300);
    assert_eq!(report.rows[1].sku, "SKU-2");
    // 空单元格按 0 处理
    assert_eq!(report.rows[1].weight, 0.0);
    assert_eq!(report.duplicate_skus, vec!["SKU-1".to_string()]);
    assert!(!report.batch_id.is_empty());
    assert_eq!(report.summary().imported_rows, 2);
}

#[test]
fn test_import_with_column_mapping_and_locale() {
    let file = write_temp_csv(&[
        "Item;L;W;H;Kg;MinQty;OnHand",
        "x1;100,5;50;20;1,25;1;1.200",
    ]);

    let renames: HashMap<String, String> = [
        ("Item", "SKU"),
        ("L", "Length"),
        ("W", "Width"),
        ("H", "Height"),
        ("Kg", "Weight"),
        ("MinQty", "Min Qty Per Bin"),
        ("OnHand", "Qty Stored"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    let config = RunConfig {
        columns: SkuColumnMapping { renames },
        csv_format: CsvFormat {
            delimiter: ';',
            decimal: ',',
            thousands: Some('.'),
        },
        ..RunConfig::default()
    };

    let report = SkuImporter::new(&config).import_file(file.path());
    assert!(report.is_ok(), "{:?}", report.error_messages());
    let row = &report.rows[0];
    assert_eq!(row.sku, "X1");
    assert_eq!(row.length, 100.5);
    assert_eq!(row.weight, 1.25);
    assert_eq!(row.qty_stored, 1200);
}

#[test]
fn test_missing_columns_reported_per_column() {
    let file = write_temp_csv(&["SKU,Length,Width,Height,Weight", "A,1,1,1,1"]);
    let config = RunConfig::default();
    let report = SkuImporter::new(&config).import_file(file.path());

    assert!(!report.is_ok());
    assert!(report.rows.is_empty());
    assert_eq!(report.errors.len(), 2);
    assert!(matches!(&report.errors[0], ImportError::MissingColumn(c) if c == "Min Qty Per Bin"));
    assert!(matches!(&report.errors[1], ImportError::MissingColumn(c) if c == "Qty Stored"));
    assert_eq!(report.error_messages()[0], "Error: 缺少必需列 'Min Qty Per Bin'");
}

#[test]
fn test_non_numeric_reported_once_per_column() {
    let file = write_temp_csv(&[
        SKU_HEADER,
        "A,abc,1,1,1,1,1",
        "B,xyz,1,1,1,1,1",
        "C,1,1,1,heavy,1,1",
    ]);
    let config = RunConfig::default();
    let report = SkuImporter::new(&config).import_file(file.path());

    assert_eq!(report.errors.len(), 2);
    match &report.errors[0] {
        ImportError::NonNumericColumn { column, row, value } => {
            assert_eq!(column, "Length");
            assert_eq!(*row, 2);
            assert_eq!(value, "abc");
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(matches!(&report.errors[1], ImportError::NonNumericColumn { column, .. } if column == "Weight"));
}

#[test]
fn test_mac_roman_fallback() {
    let mut bytes = SKU_HEADER.as_bytes().to_vec();
    bytes.extend_from_slice(b"\ncaf\x8E,10,10,10,1,1,5");
    let file = write_temp_bytes(&bytes);

    let config = RunConfig::default();
    let report = SkuImporter::new(&config).import_file(file.path());
    assert!(report.is_ok(), "{:?}", report.error_messages());
    assert_eq!(report.rows[0].sku, "CAFÉ");
}

#[test]
fn test_file_errors_are_recorded() {
    let config = RunConfig::default();
    let report = SkuImporter::new(&config).import_file("/nonexistent/sku_master.csv");
    assert!(matches!(report.errors.as_slice(), [ImportError::FileNotFound(_)]));

    let txt = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    let report = SkuImporter::new(&config).import_file(txt.path());
    assert!(matches!(report.errors.as_slice(), [ImportError::UnsupportedFormat(_)]));
}

#[test]
fn test_outbound_import_sorted_and_filtered() {
    let file = write_temp_csv(&[
        OUTBOUND_HEADER,
        "a,2024-03-02 10:00:00,1",
        "b,02/03/2024 09:00,2",
        "c,2024-03-02T09:00:00,3",
        ",2024-03-02 08:00:00,4",
        "d,not a date,5",
        "e,2024-03-01,0",
    ]);

    let report = OutboundImporter::new(CsvFormat::default()).import_file(file.path());
    assert!(report.is_ok());
    assert_eq!(report.incomplete_rows, 3);

    let skus: Vec<&str> = report.orders.iter().map(|o| o.sku.as_str()).collect();
    // b 与 c 时间相同, 保持输入顺序
    assert_eq!(skus, vec!["B", "C", "A"]);
    assert_eq!(
        report.orders[0].timestamp,
        NaiveDate::from_ymd_opt(2024, 3, 2).unwrap().and_hms_opt(9, 0, 0).unwrap()
    );
    assert_eq!(report.orders[2].line_no, 2);
}

#[test]
fn test_outbound_missing_column() {
    let file = write_temp_csv(&["sku,qty", "A,1"]);
    let report = OutboundImporter::new(CsvFormat::default()).import_file(file.path());
    assert!(!report.is_ok());
    assert!(matches!(report.errors.as_slice(), [ImportError::MissingColumn(c)] if c == "timestamp"));
}
