// ==========================================
// 料箱仓储仿真系统 - 数据仓储层
// ==========================================
// 红线: 仓储不含业务逻辑, 只提供原子且经过校验的读写
// 约束: 所有查询使用参数化
// ==========================================

pub mod error;
pub mod master_data;

pub use error::{RepositoryError, RepositoryResult};
pub use master_data::{HealthCounts, InitSummary, MasterDataSnapshot, MasterDataStore};
