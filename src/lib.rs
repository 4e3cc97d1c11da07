// ==========================================
// 料箱仓储仿真系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite (内存库)
// 系统定位: 料箱式自动仓储的容量估算与拣选回放
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 实时表访问
pub mod repository;

// 引擎层 - 容量/分箱/料箱堆/仿真/一致性
pub mod engine;

// 导入层 - SKU 主数据与出库订单
pub mod importer;

// 配置层 - 运行配置
pub mod config;

// 导出层 - CSV/JSON 结果
pub mod export;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BinId, BinType, CompartmentSize, FitStatus, LineOutcome, StackId, UnitSystem};

// 领域实体
pub use domain::{
    BinEntry, BinSlot, BinVisit, CapacityRow, PickAnnotation, PickOrder, SkuLive, SkuMasterRow, Stack,
};

// 配置
pub use config::{ConfigError, RunConfig};

// 引擎
pub use engine::{
    BinAssigner, CapacityCalculator, ConsistencyChecker, EngineError, EngineResult, RunOrchestrator,
    RunResult, SimulationControl, SimulationResult, Simulator, StackAssigner, StopReason,
};

// 导入
pub use importer::{OutboundImporter, SkuImporter};

// 仓储
pub use repository::MasterDataStore;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "料箱仓储仿真系统";
