// ==========================================
// 料箱仓储仿真系统 - SKU 领域模型
// ==========================================
// SKU 主数据行 / 容量计算结果行 / SKU 实时库存记录
// ==========================================

use crate::domain::types::{CompartmentSize, FitStatus};
use serde::{Deserialize, Serialize};

// ==========================================
// SkuMasterRow - SKU 主数据 (导入层输出)
// ==========================================
// 用途: 导入层写入, 容量计算器只读
// 单位: 按 RunConfig.unit_system 原样保存, 计算前统一换算为 mm / kg
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuMasterRow {
    pub sku: String,          // SKU 编码 (已去空格并转大写)
    pub length: f64,          // 长
    pub width: f64,           // 宽
    pub height: f64,          // 高
    pub weight: f64,          // 单件重量
    pub min_qty_per_bin: i64, // 每箱最小存放数量
    pub qty_stored: i64,      // 需存放的总数量
}

// ==========================================
// FillMetrics - 填充率指标
// ==========================================
// 体积/重量填充率 = 格口可放数量 * 单件体积(重量) / 格口容积(限重)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FillMetrics {
    pub volume_fill: [f64; 4], // 顺序: 整箱, 1/2, 1/4, 1/8
    pub weight_fill: [f64; 4],
    pub actual_volume_fill: f64, // 最终选定格口的体积填充率
    pub actual_weight_fill: f64,
}

// ==========================================
// CapacityRow - 容量计算结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityRow {
    pub sku: String,

    // ===== 换算后的物理属性 =====
    pub length_mm: f64,
    pub width_mm: f64,
    pub height_mm: f64,
    pub weight_kg: f64,
    pub volume_mm3: f64,

    // ===== 输入数量 =====
    pub min_qty_per_bin: i64,
    pub qty_stored: i64,

    // ===== 各规格可放数量 =====
    pub qty_per_bin: i64,
    pub qty_per_half: i64,
    pub qty_per_quarter: i64,
    pub qty_per_eighth: i64,

    // ===== 分配结论 =====
    pub compartment_size: Option<CompartmentSize>, // None 表示无法放入
    pub bin_count: f64,        // 整箱: ceil(存量/每箱数量); 格口: 比例值
    pub capped_bin_count: f64, // 受 max_bins_per_sku 限制后的箱数
    pub fit_status: FitStatus,

    pub fill: FillMetrics,
}

impl CapacityRow {
    /// 指定规格下单个格口的可放数量
    pub fn qty_for(&self, size: CompartmentSize) -> i64 {
        match size {
            CompartmentSize::Whole => self.qty_per_bin,
            CompartmentSize::Half => self.qty_per_half,
            CompartmentSize::Quarter => self.qty_per_quarter,
            CompartmentSize::Eighth => self.qty_per_eighth,
        }
    }

    /// 整箱满载数量 (补货分块与合并目标都按整箱计)
    ///
    /// 无法放入的 SKU 为 0
    pub fn full_bin_qty(&self) -> i64 {
        match self.compartment_size {
            Some(_) => self.qty_per_bin,
            None => 0,
        }
    }

    pub fn is_fit(&self) -> bool {
        self.fit_status == FitStatus::Fit
    }
}

// ==========================================
// SkuLive - SKU 实时库存 (sku_live 表)
// ==========================================
// 红线: 仿真期间只能通过 MasterDataStore 修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkuLive {
    pub sku: String,
    pub qty_in_system: i64,        // 当前系统库存
    pub prio_bin: Option<i64>,     // 优先级 1 所在料箱
    pub full_bin_qty: i64,         // 整箱满载数量
    pub full_system_qty: i64,      // 目标系统库存
    pub restock_qty: i64,          // 补货触发数量
    pub compartment_size: CompartmentSize,
}
