// ==========================================
// 料箱仓储仿真系统 - 拣选订单领域模型
// ==========================================
// 出库订单行 + 仿真回填的拣选注记
// ==========================================

use crate::domain::types::{BinId, LineOutcome, StackId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// ==========================================
// BinVisit - 单次料箱访问
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinVisit {
    pub bin_id: BinId,
    pub stack_id: StackId,
    pub bins_above: i64,
    pub qty_picked: i64,
}

// ==========================================
// PickAnnotation - 拣选注记
// ==========================================
// bin_id / stack_id / bins_above 取第一次访问的料箱
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickAnnotation {
    pub bin_id: BinId,
    pub stack_id: StackId,
    pub bins_above: i64,
    pub bins_per_line: i64,
    pub total_bins_above: i64,
    pub qty_before: i64, // 拣选前系统库存
    pub visits: Vec<BinVisit>,
}

impl PickAnnotation {
    pub fn from_visits(visits: Vec<BinVisit>, qty_before: i64) -> Option<Self> {
        let first = visits.first()?.clone();
        Some(Self {
            bin_id: first.bin_id,
            stack_id: first.stack_id,
            bins_above: first.bins_above,
            bins_per_line: visits.len() as i64,
            total_bins_above: visits.iter().map(|v| v.bins_above).sum(),
            qty_before,
            visits,
        })
    }
}

// ==========================================
// PickOrder - 出库订单行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickOrder {
    pub line_no: usize, // 原始输入行号 (稳定排序依据)
    pub sku: String,
    pub timestamp: NaiveDateTime,
    pub qty: i64,

    // ===== 仿真回填 =====
    pub outcome: LineOutcome,
    pub annotation: Option<PickAnnotation>,
}

impl PickOrder {
    pub fn new(line_no: usize, sku: impl Into<String>, timestamp: NaiveDateTime, qty: i64) -> Self {
        Self {
            line_no,
            sku: sku.into(),
            timestamp,
            qty,
            outcome: LineOutcome::Unresolved,
            annotation: None,
        }
    }

    /// 已成功拣选 (进入最终输出)
    pub fn is_resolved(&self) -> bool {
        self.outcome == LineOutcome::Resolved && self.annotation.is_some()
    }
}
