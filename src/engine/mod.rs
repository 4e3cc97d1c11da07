// ==========================================
// 料箱仓储仿真系统 - 引擎层
// ==========================================
// 职责: 容量计算 / 分箱 / 料箱堆分配 / 仿真 / 一致性检查
// 红线: 引擎不拼 SQL, 实时表只能通过 MasterDataStore 访问
// ==========================================

pub mod bin_assigner;
pub mod capacity_calculator;
pub mod consistency;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod simulator;
pub mod stack_assigner;

// 重导出核心引擎
pub use bin_assigner::{BinAssigner, BinAssignment};
pub use capacity_calculator::{qty_per_compartment, CapacityCalculator, CompartmentGeometry, FitLookup};
pub use consistency::{CheckKind, ConsistencyChecker, ConsistencyIssue, ConsistencyReport, Severity};
pub use error::{EngineError, EngineResult};
pub use events::{
    NoOpEventPublisher, OptionalEventPublisher, SimulationCheckpoint, SimulationEventPublisher,
};
pub use orchestrator::{RunOrchestrator, RunResult};
pub use simulator::{
    LineCounts, SimulationControl, SimulationResult, SimulationStats, Simulator, StopReason,
};
pub use stack_assigner::{StackAssigner, StackLayout};
