use crate::domain::order::PickOrder;
use crate::domain::types::LineOutcome;
use crate::engine::consistency::ConsistencyReport;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

// ==========================================
// LineCounts - 订单行结局计数
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineCounts {
    pub fit: usize, // 成功拣选
    pub no_fit: usize,
    pub not_found: usize,
    pub no_dims: usize,
    pub insufficient: usize,
    pub unresolved: usize,
    pub total: usize, // 输入订单行总数
}

impl LineCounts {
    pub fn record(&mut self, outcome: LineOutcome) {
        match outcome {
            LineOutcome::Resolved => self.fit += 1,
            LineOutcome::ExcludedNoFit => self.no_fit += 1,
            LineOutcome::ExcludedNotFound => self.not_found += 1,
            LineOutcome::ExcludedNoDims => self.no_dims += 1,
            LineOutcome::Insufficient => self.insufficient += 1,
            LineOutcome::Unresolved => self.unresolved += 1,
        }
    }

    /// 未找到 + 无尺寸
    pub fn excluded(&self) -> usize {
        self.not_found + self.no_dims
    }

    pub fn processed(&self) -> usize {
        self.fit + self.no_fit + self.excluded() + self.insufficient + self.unresolved
    }
}

// ==========================================
// StopReason - 停止原因
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopReason {
    Completed,
    UserRequested,
    InconsistentData,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Completed => write!(f, "Completed"),
            StopReason::UserRequested => write!(f, "Stop and Save Button Pressed"),
            StopReason::InconsistentData => write!(f, "Inconsistent Data"),
        }
    }
}

// ==========================================
// SimulationControl - 仿真控制句柄
// ==========================================
// 停止标志可克隆给外部控制方, 每个订单行开始前检查一次
// 检查点间隔只来自 RunConfig.save_interval
#[derive(Debug, Clone, Default)]
pub struct SimulationControl {
    stop: Arc<AtomicBool>,
}

impl SimulationControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// 外部控制方持有的停止句柄
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

}

/// 第 idx 个订单行前是否到达检查点 (idx 从 0 计)
pub(super) fn is_checkpoint(idx: usize, save_interval: usize) -> bool {
    save_interval > 0 && idx != 0 && idx % save_interval == 0
}

// ==========================================
// SimulationStats - 补货/合并统计
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationStats {
    pub bin_visits: usize,
    pub restocks: usize,
    pub restock_failures: usize,
    pub compartments_restocked: usize,
    pub consolidations: usize,
    pub compartments_freed: i64,
}

// ==========================================
// SimulationResult - 仿真结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    /// 全部订单行 (含结局; 未处理的行保持 Unresolved)
    pub orders: Vec<PickOrder>,
    pub counts: LineCounts,
    pub stats: SimulationStats,
    pub stop_reason: StopReason,
    pub processed: usize,
    /// 仿真过程中的周期检查报告
    pub check_reports: Vec<ConsistencyReport>,
}

impl SimulationResult {
    /// 成功拣选的订单行 (最终输出)
    pub fn resolved_orders(&self) -> impl Iterator<Item = &PickOrder> {
        self.orders.iter().filter(|o| o.is_resolved())
    }

    pub fn is_complete(&self) -> bool {
        self.stop_reason == StopReason::Completed
    }
}
