// ==========================================
// 料箱仓储仿真系统 - 配置层
// ==========================================
// 职责: 运行参数加载与校验
// 来源: JSON 文件 / key-value 表
// ==========================================

pub mod error;
pub mod run_config;

pub use error::{ConfigError, ConfigResult};
pub use run_config::{config_keys, CheckCadence, CsvFormat, RunConfig, SkuColumnMapping};
