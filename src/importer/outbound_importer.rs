// ==========================================
// 料箱仓储仿真系统 - 出库订单导入器
// ==========================================
// 列名: 去首尾空格并转小写, 必需 sku / timestamp / qty
// 不完整行 (时间戳、SKU、数量任一缺失或无法解析) 单独计数并剔除
// 剩余行按时间戳稳定排序 (同一时间保持原始顺序)
// ==========================================

use crate::config::CsvFormat;
use crate::domain::order::PickOrder;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::ImportError;
use crate::importer::file_parser::{RawTable, UniversalFileParser};
use crate::importer::importer_trait::DataCleaner as _;
use std::path::Path;
use tracing::{debug, info, instrument, warn};

const REQUIRED: [&str; 3] = ["sku", "timestamp", "qty"];

/// 出库订单导入结果
#[derive(Debug, Default)]
pub struct OutboundReport {
    pub orders: Vec<PickOrder>,
    pub incomplete_rows: usize,
    pub errors: Vec<ImportError>,
}

impl OutboundReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

pub struct OutboundImporter {
    file_parser: UniversalFileParser,
    data_cleaner: DataCleaner,
}

impl OutboundImporter {
    pub fn new(csv_format: CsvFormat) -> Self {
        Self {
            file_parser: UniversalFileParser::new(csv_format),
            data_cleaner: DataCleaner,
        }
    }

    #[instrument(skip(self, file_path))]
    pub fn import_file<P: AsRef<Path>>(&self, file_path: P) -> OutboundReport {
        let path = file_path.as_ref();
        info!(file_path = %path.display(), "开始导入出库订单");

        match self.file_parser.parse(path) {
            Ok(table) => self.import_table(table),
            Err(err) => {
                warn!(error = %err, "出库订单文件解析失败");
                OutboundReport {
                    errors: vec![err],
                    ..OutboundReport::default()
                }
            }
        }
    }

    pub fn import_table(&self, mut table: RawTable) -> OutboundReport {
        let mut report = OutboundReport::default();

        table.rename_columns(|header| header.trim().to_lowercase());
        for column in REQUIRED {
            if !table.has_column(column) {
                warn!(column = %column, "出库订单缺少必需列");
                report.errors.push(ImportError::MissingColumn(column.to_string()));
            }
        }
        if !report.is_ok() {
            return report;
        }

        for row in &table.rows {
            let sku = self.data_cleaner.normalize_null(row.get("sku"));
            let timestamp = row
                .get("timestamp")
                .and_then(|v| self.data_cleaner.parse_timestamp(v));
            let qty = row.get("qty").and_then(|v| self.data_cleaner.parse_qty(v));

            match (sku, timestamp, qty) {
                (Some(sku), Some(timestamp), Some(qty)) => {
                    let sku = self.data_cleaner.clean_text(&sku, true);
                    report
                        .orders
                        .push(PickOrder::new(row.row_number, sku, timestamp, qty));
                }
                _ => {
                    debug!(row = row.row_number, "出库订单行不完整, 已剔除");
                    report.incomplete_rows += 1;
                }
            }
        }

        // Vec::sort_by 为稳定排序
        report.orders.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        info!(
            complete = report.orders.len(),
            incomplete = report.incomplete_rows,
            "出库订单导入完成"
        );
        report
    }
}
