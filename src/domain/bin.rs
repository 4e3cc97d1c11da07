// ==========================================
// 料箱仓储仿真系统 - 料箱/料箱堆领域模型
// ==========================================
// 分箱结果 (BinEntry/BinSlot) 与三张实时表的行结构
// ==========================================

use crate::domain::types::{BinId, CompartmentSize, StackId};
use serde::{Deserialize, Serialize};

// ==========================================
// BinSlot / BinEntry - 分箱引擎输出
// ==========================================

/// 料箱中一个 SKU 占位
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinSlot {
    pub sku: String,
    pub qty: i64,
    pub priority: i64,
}

/// 一个料箱及其内容
///
/// `slots` 可以少于格口数 (尾批未满), 空余格口在初始化时补成空行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BinEntry {
    pub bin_id: BinId,
    pub compartment_size: CompartmentSize,
    pub slots: Vec<BinSlot>,
}

impl BinEntry {
    /// 合成空箱
    pub fn empty(bin_id: BinId, compartment_size: CompartmentSize) -> Self {
        Self {
            bin_id,
            compartment_size,
            slots: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

// ==========================================
// Stack - 料箱堆
// ==========================================
// bins[0] 位于堆顶 (上方无料箱)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stack {
    pub stack_id: StackId,
    pub bins: Vec<BinId>,
}

// ==========================================
// 实时表行结构
// ==========================================

/// bin_content_live 表行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompartmentRow {
    pub bin_id: BinId,
    pub compartment_id: i64, // 1..=N, N = 1 / compartment_size
    pub compartment_size: CompartmentSize,
    pub sku: Option<String>,
    pub priority: Option<i64>,
    pub qty_in_bin: i64,
}

impl CompartmentRow {
    /// 格口是否被占用 (SKU 非空且数量 > 0)
    pub fn is_occupied(&self) -> bool {
        self.sku.is_some() && self.qty_in_bin > 0
    }
}

/// bins_capacity 表行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityRecord {
    pub bin_id: BinId,
    pub compartment_size: CompartmentSize,
    pub num_full_compartments: i64,
}

/// stacks_lookup 表行
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackLookupRow {
    pub bin_id: BinId,
    pub stack_id: StackId,
    pub position: i64, // 0 = 堆顶
}
