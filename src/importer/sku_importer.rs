// ==========================================
// 料箱仓储仿真系统 - SKU 主数据导入器
// ==========================================
// 流程: 解析 → 列名映射 → 缺列校验 → 数值校验 → 清洗 → 去重
// 约束: 校验错误累积到 ImportReport.errors, 非空时下游拒绝计算
// ==========================================

use crate::config::RunConfig;
use crate::domain::sku::SkuMasterRow;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::ImportError;
use crate::importer::field_mapper::{sku_columns, FieldMapper};
use crate::importer::file_parser::{RawTable, UniversalFileParser};
use crate::importer::importer_trait::DataCleaner as _;
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ImportReport - 导入结果
// ==========================================
#[derive(Debug, Default)]
pub struct ImportReport {
    pub batch_id: String,
    pub rows: Vec<SkuMasterRow>,
    pub errors: Vec<ImportError>,
    pub total_rows: usize,
    pub duplicate_skus: Vec<String>,
    pub elapsed: Duration,
}

impl ImportReport {
    /// 无校验错误, 可以进入容量计算
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// 错误信息原文 (按发现顺序)
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| format!("Error: {}", e)).collect()
    }

    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            batch_id: self.batch_id.clone(),
            total_rows: self.total_rows,
            imported_rows: self.rows.len(),
            duplicate_skus: self.duplicate_skus.len(),
            error_count: self.errors.len(),
        }
    }
}

/// 可序列化的导入汇总
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub batch_id: String,
    pub total_rows: usize,
    pub imported_rows: usize,
    pub duplicate_skus: usize,
    pub error_count: usize,
}

// ==========================================
// SkuImporter - SKU 主数据导入器
// ==========================================
pub struct SkuImporter<'a> {
    config: &'a RunConfig,
    file_parser: UniversalFileParser,
    field_mapper: FieldMapper,
    data_cleaner: DataCleaner,
}

impl<'a> SkuImporter<'a> {
    pub fn new(config: &'a RunConfig) -> Self {
        Self {
            config,
            file_parser: UniversalFileParser::new(config.csv_format),
            field_mapper: FieldMapper::new(config.csv_format),
            data_cleaner: DataCleaner,
        }
    }

    /// 从文件导入 SKU 主数据
    ///
    /// 文件级错误 (不存在/格式/编码) 也记入 errors 而不是直接返回 Err
    #[instrument(skip(self, file_path), fields(batch_id))]
    pub fn import_file<P: AsRef<Path>>(&self, file_path: P) -> ImportReport {
        let path = file_path.as_ref();
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(batch_id = %batch_id, file_path = %path.display(), "开始导入 SKU 主数据");

        // === 步骤 1: 解析文件 ===
        debug!("步骤 1: 解析文件");
        let mut report = match self.file_parser.parse(path) {
            Ok(table) => self.import_table(table),
            Err(err) => {
                warn!(error = %err, "SKU 主数据文件解析失败");
                ImportReport {
                    errors: vec![err],
                    ..ImportReport::default()
                }
            }
        };

        report.batch_id = batch_id;
        report.elapsed = start_time.elapsed();
        info!(
            batch_id = %report.batch_id,
            total = report.total_rows,
            imported = report.rows.len(),
            errors = report.errors.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "SKU 主数据导入完成"
        );
        report
    }

    /// 对已解析的原始表执行映射、校验与清洗
    pub fn import_table(&self, mut table: RawTable) -> ImportReport {
        let mut report = ImportReport {
            total_rows: table.rows.len(),
            ..ImportReport::default()
        };

        // === 步骤 2: 列名映射 ===
        self.field_mapper.apply_mapping(&mut table, &self.config.columns);

        // === 步骤 3: 缺列校验 (每列一条错误) ===
        let missing = self.field_mapper.missing_columns(&table);
        if !missing.is_empty() {
            for column in &missing {
                warn!(column = %column, "SKU 主数据缺少必需列");
                report
                    .errors
                    .push(ImportError::MissingColumn(column.to_string()));
            }
            return report;
        }

        // === 步骤 4: 数值校验 (每列一条错误) ===
        let mut numeric: Vec<Vec<f64>> = Vec::with_capacity(sku_columns::NUMERIC.len());
        for column in sku_columns::NUMERIC {
            let mut values = Vec::with_capacity(table.rows.len());
            let mut first_bad: Option<(usize, String)> = None;
            for row in &table.rows {
                match self.field_mapper.numeric_cell(table.source, row, column) {
                    Ok(v) => values.push(v),
                    Err(raw) => {
                        values.push(0.0);
                        first_bad.get_or_insert((row.row_number, raw));
                    }
                }
            }
            if let Some((row, value)) = first_bad {
                warn!(column = %column, row, value = %value, "列含非数值数据");
                report.errors.push(ImportError::NonNumericColumn {
                    column: column.to_string(),
                    row,
                    value,
                });
            }
            numeric.push(values);
        }
        if !report.errors.is_empty() {
            return report;
        }

        // === 步骤 5: 清洗 + 去重 ===
        let mut seen: HashSet<String> = HashSet::new();
        for (idx, row) in table.rows.iter().enumerate() {
            let sku = self
                .data_cleaner
                .clean_text(row.get(sku_columns::SKU).unwrap_or(""), true);
            if sku.is_empty() {
                warn!(row = row.row_number, "SKU 为空, 跳过该行");
                continue;
            }
            if !seen.insert(sku.clone()) {
                warn!(sku = %sku, row = row.row_number, "SKU 重复, 保留第一次出现");
                report.duplicate_skus.push(sku);
                continue;
            }

            report.rows.push(SkuMasterRow {
                sku,
                length: numeric[0][idx],
                width: numeric[1][idx],
                height: numeric[2][idx],
                weight: numeric[3][idx],
                min_qty_per_bin: numeric[4][idx].round() as i64,
                qty_stored: numeric[5][idx].round() as i64,
            });
        }

        debug!(
            rows = report.rows.len(),
            duplicates = report.duplicate_skus.len(),
            "SKU 主数据清洗完成"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CsvFormat;
    use crate::importer::file_parser::CsvParser;

    const HEADER: &str = "SKU,Length,Width,Height,Weight,Min Qty Per Bin,Qty Stored";

    fn table(text: &str) -> RawTable {
        CsvParser::default().parse_text(text).unwrap()
    }

    #[test]
    fn test_import_valid_rows() {
        let config = RunConfig::default();
        let importer = SkuImporter::new(&config);
        let report = importer.import_table(table(&format!(
            "{}\n a-1 ,100,50,20,0.5,10,120\nb-2,,,,,5,30\n",
            HEADER
        )));

        assert!(report.is_ok());
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.rows[0].sku, "A-1");
        assert_eq!(report.rows[0].weight, 0.5);
        assert_eq!(report.rows[0].qty_stored, 120);
        // 空单元格视为 0
        assert_eq!(report.rows[1].length, 0.0);
        assert_eq!(report.rows[1].min_qty_per_bin, 5);
    }

    #[test]
    fn test_missing_columns_reported_individually() {
        let config = RunConfig::default();
        let importer = SkuImporter::new(&config);
        let report = importer.import_table(table("SKU,Length,Width\nA,1,2\n"));

        assert!(!report.is_ok());
        assert_eq!(report.errors.len(), 4);
        assert!(report.rows.is_empty());
        assert!(report.error_messages()[0].contains("Height"));
    }

    #[test]
    fn test_non_numeric_column() {
        let config = RunConfig::default();
        let importer = SkuImporter::new(&config);
        let report = importer.import_table(table(&format!(
            "{}\nA,abc,1,1,1,1,1\nB,x,1,1,1,1,zz\n",
            HEADER
        )));

        assert_eq!(report.errors.len(), 2);
        assert!(matches!(
            &report.errors[0],
            ImportError::NonNumericColumn { column, row: 2, .. } if column == "Length"
        ));
        assert!(report.rows.is_empty());
    }

    #[test]
    fn test_column_mapping_and_duplicates() {
        let mut config = RunConfig::default();
        config
            .columns
            .renames
            .insert("Item".to_string(), "SKU".to_string());
        config
            .columns
            .renames
            .insert("On Hand".to_string(), "Qty Stored".to_string());
        let importer = SkuImporter::new(&config);

        let report = importer.import_table(table(
            "Item,Length,Width,Height,Weight,Min Qty Per Bin,On Hand\nA,1,1,1,1,1,5\na,2,2,2,2,2,9\n",
        ));

        assert!(report.is_ok());
        assert_eq!(report.rows.len(), 1);
        assert_eq!(report.rows[0].qty_stored, 5);
        assert_eq!(report.duplicate_skus, vec!["A".to_string()]);
    }

    #[test]
    fn test_european_number_format() {
        let mut config = RunConfig::default();
        config.csv_format = CsvFormat {
            delimiter: ';',
            decimal: ',',
            thousands: Some('.'),
        };
        let importer = SkuImporter::new(&config);
        let parsed = CsvParser::new(config.csv_format)
            .parse_text(
                "SKU;Length;Width;Height;Weight;Min Qty Per Bin;Qty Stored\nA;100,5;50;20;0,25;10;1.200\n",
            )
            .unwrap();

        let report = importer.import_table(parsed);
        assert!(report.is_ok());
        assert_eq!(report.rows[0].length, 100.5);
        assert_eq!(report.rows[0].weight, 0.25);
        assert_eq!(report.rows[0].qty_stored, 1200);
    }

    #[test]
    fn test_missing_file_recorded_as_error() {
        let config = RunConfig::default();
        let report = SkuImporter::new(&config).import_file("does_not_exist.csv");
        assert!(matches!(report.errors[0], ImportError::FileNotFound(_)));
        assert!(!report.batch_id.is_empty());
    }
}
