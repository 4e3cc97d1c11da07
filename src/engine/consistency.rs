// ==========================================
// 料箱仓储仿真系统 - 一致性检查器
// ==========================================
// 职责: 对四张实时表做只读的不变量校验
// 红线: 只报告, 不修正; 是否中止由调用方决定
// ==========================================
// 分级: minimal (健康计数 + 抽样) / quick (数量 + 优先级) / full (全部)
// ==========================================

mod core;
mod report;


pub use core::ConsistencyChecker;
pub use report::{CheckKind, ConsistencyIssue, ConsistencyReport, Severity};
