// ==========================================
// 料箱仓储仿真系统 - 拣选/补货/合并仿真引擎
// ==========================================
// 职责: 按时间顺序逐行回放出库订单
// 输入: 已初始化的主数据仓储 + 适配状态 + 排序后的订单行
// 输出: 带拣选注记的订单行 + 各结局计数 + 停止原因
// ==========================================
// 红线: 一个订单行 (含其触发的补货与合并) 完整结束后才处理下一行
// 红线: 请求数量超过系统库存时不修改任何表
// 红线: 查找失败只记录日志, 该行保持 Unresolved, 不中止仿真
// ==========================================

mod consolidation;
mod core;
mod restock;
mod types;


pub use core::Simulator;
pub use types::{LineCounts, SimulationControl, SimulationResult, SimulationStats, StopReason};
