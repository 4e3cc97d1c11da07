// ==========================================
// 料箱仓储仿真系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑, 不含引擎逻辑
// ==========================================

pub mod bin;
pub mod order;
pub mod sku;
pub mod types;

// 重导出核心类型
pub use bin::{BinEntry, BinSlot, CapacityRecord, CompartmentRow, Stack, StackLookupRow};
pub use order::{BinVisit, PickAnnotation, PickOrder};
pub use sku::{CapacityRow, FillMetrics, SkuLive, SkuMasterRow};
pub use types::{BinId, BinType, CompartmentSize, FitStatus, LineOutcome, StackId, UnitSystem};
