// ==========================================
// 料箱仓储仿真系统 - 导入层
// ==========================================
// 职责: SKU 主数据与出库订单导入, 生成领域记录
// 支持: Excel, CSV (UTF-8 / Mac Roman)
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod importer_trait;
pub mod outbound_importer;
pub mod sku_importer;

// 重导出核心类型
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use error::{ImportError, ImportResult};
pub use field_mapper::{sku_columns, FieldMapper};
pub use file_parser::{CsvParser, ExcelParser, RawRow, RawTable, SourceKind, UniversalFileParser};
pub use outbound_importer::{OutboundImporter, OutboundReport};
pub use sku_importer::{ImportReport, ImportSummary, SkuImporter};

// 重导出 Trait 接口
pub use importer_trait::{DataCleaner, FileParser};
