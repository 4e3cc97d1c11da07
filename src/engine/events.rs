// ==========================================
// 料箱仓储仿真系统 - 引擎层事件发布
// ==========================================
// 职责: 定义仿真进度事件发布 trait, 实现依赖倒置
// 说明: 引擎只产生检查点, 由调用方 (CLI/GUI) 决定如何展示或落盘
// ==========================================

use crate::domain::order::PickOrder;
use crate::engine::simulator::LineCounts;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

// ==========================================
// 仿真检查点
// ==========================================

/// 仿真检查点
///
/// 每处理 save_interval 个订单行发布一次, 仿真结束时再发布一次
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationCheckpoint {
    /// 本次运行 ID
    pub run_id: String,
    /// 已处理订单行数
    pub processed: usize,
    /// 订单行总数
    pub total: usize,
    /// 当前各结局计数
    pub counts: LineCounts,
    /// 截至目前成功拣选的订单行 (未配置发布者时为空)
    pub resolved_rows: Vec<PickOrder>,
    /// 是否为最终检查点
    pub is_final: bool,
}

impl SimulationCheckpoint {
    /// 进度百分比 (0-100)
    pub fn progress_pct(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.processed as f64 / self.total as f64 * 100.0
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 仿真事件发布者 Trait
///
/// 发布失败只记录日志, 不中断仿真
pub trait SimulationEventPublisher: Send + Sync {
    fn publish(&self, checkpoint: SimulationCheckpoint) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
///
/// 用于不需要事件发布的场景（如单元测试）
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl SimulationEventPublisher for NoOpEventPublisher {
    fn publish(&self, checkpoint: SimulationCheckpoint) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过检查点 - run_id={}, processed={}",
            checkpoint.run_id,
            checkpoint.processed
        );
        Ok(())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn SimulationEventPublisher>> 的使用
#[derive(Clone)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn SimulationEventPublisher>>,
}

impl OptionalEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn SimulationEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布事件）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布检查点（如果有发布者）
    pub fn publish(&self, checkpoint: SimulationCheckpoint) -> Result<(), Box<dyn Error + Send + Sync>> {
        match &self.inner {
            Some(publisher) => publisher.publish(checkpoint),
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过检查点 - processed={}",
                    checkpoint.processed
                );
                Ok(())
            }
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}
