// ==========================================
// 料箱仓储仿真系统 - 分箱引擎
// ==========================================
// 职责: 把 (格口规格, 箱数) 展开为具体料箱及其内容
// 输入: 容量计算结果 (已按箱数降序)
// 输出: 料箱列表 (bin_id 全局唯一, 从 1 开始)
// ==========================================
// 整箱 SKU: 按填充顺序占用 capped_bin_count 个料箱, 优先级 1..k
// 格口 SKU: 同规格按到达顺序每 2/4/8 个合为一箱, 优先级均为 1
// ==========================================

use crate::domain::bin::{BinEntry, BinSlot};
use crate::domain::sku::CapacityRow;
use crate::domain::types::{BinId, CompartmentSize};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// 分箱结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BinAssignment {
    pub bins: Vec<BinEntry>,
    /// 下一个可用 bin_id
    pub next_bin_id: BinId,
    /// 因箱数为 0 或规格缺失被跳过的 SKU
    pub skipped: Vec<String>,
}

/// 单次分箱的可变上下文
#[derive(Debug)]
struct AllocationContext {
    next_bin_id: BinId,
    bins: Vec<BinEntry>,
    half: Vec<BinSlot>,
    quarter: Vec<BinSlot>,
    eighth: Vec<BinSlot>,
    skipped: Vec<String>,
}

impl AllocationContext {
    fn new() -> Self {
        Self {
            next_bin_id: 1,
            bins: Vec::new(),
            half: Vec::new(),
            quarter: Vec::new(),
            eighth: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn allocate(&mut self, compartment_size: CompartmentSize, slots: Vec<BinSlot>) -> BinId {
        let bin_id = self.next_bin_id;
        self.bins.push(BinEntry {
            bin_id,
            compartment_size,
            slots,
        });
        self.next_bin_id += 1;
        bin_id
    }

    /// 格口 SKU 按批次装箱 (尾批可不满)
    fn pack_batches(&mut self, compartment_size: CompartmentSize) {
        let pending = match compartment_size {
            CompartmentSize::Half => std::mem::take(&mut self.half),
            CompartmentSize::Quarter => std::mem::take(&mut self.quarter),
            CompartmentSize::Eighth => std::mem::take(&mut self.eighth),
            CompartmentSize::Whole => return,
        };
        let batch = compartment_size.compartments_per_bin() as usize;
        for chunk in pending.chunks(batch) {
            self.allocate(compartment_size, chunk.to_vec());
        }
    }
}

// ==========================================
// BinAssigner - 分箱引擎
// ==========================================
pub struct BinAssigner {
    // 无状态引擎
}

impl Default for BinAssigner {
    fn default() -> Self {
        Self::new()
    }
}

impl BinAssigner {
    pub fn new() -> Self {
        Self {}
    }

    /// 分配料箱
    ///
    /// 只处理适配 (Fit) 且有格口规格的 SKU; 入箱数量 = max(存量, 每箱最小数量)
    #[instrument(skip(self, rows), fields(rows_count = rows.len()))]
    pub fn assign(&self, rows: &[CapacityRow]) -> BinAssignment {
        let mut ctx = AllocationContext::new();

        for row in rows.iter().filter(|r| r.is_fit()) {
            let qty = row.qty_stored.max(row.min_qty_per_bin);

            match row.compartment_size {
                Some(CompartmentSize::Whole) if row.capped_bin_count >= 1.0 => {
                    self.add_whole_bins(&mut ctx, row, qty);
                }
                Some(size) if size != CompartmentSize::Whole => {
                    let slot = BinSlot {
                        sku: row.sku.clone(),
                        qty,
                        priority: 1,
                    };
                    match size {
                        CompartmentSize::Half => ctx.half.push(slot),
                        CompartmentSize::Quarter => ctx.quarter.push(slot),
                        _ => ctx.eighth.push(slot),
                    }
                }
                _ => {
                    warn!(
                        sku = %row.sku,
                        capped_bin_count = row.capped_bin_count,
                        "箱数为 0 或格口规格缺失, 跳过分箱"
                    );
                    ctx.skipped.push(row.sku.clone());
                }
            }
        }

        ctx.pack_batches(CompartmentSize::Half);
        ctx.pack_batches(CompartmentSize::Quarter);
        ctx.pack_batches(CompartmentSize::Eighth);

        info!(
            bins = ctx.bins.len(),
            next_bin_id = ctx.next_bin_id,
            skipped = ctx.skipped.len(),
            "分箱完成"
        );
        BinAssignment {
            bins: ctx.bins,
            next_bin_id: ctx.next_bin_id,
            skipped: ctx.skipped,
        }
    }

    /// 整箱 SKU: 每箱装 min(剩余, 每箱数量), 剩余为 0 时停止
    fn add_whole_bins(&self, ctx: &mut AllocationContext, row: &CapacityRow, qty: i64) {
        let bin_count = row.capped_bin_count as i64;
        let mut remaining = qty;

        for priority in 1..=bin_count {
            let take = remaining.min(row.qty_per_bin);
            if take <= 0 {
                break;
            }
            let bin_id = ctx.allocate(
                CompartmentSize::Whole,
                vec![BinSlot {
                    sku: row.sku.clone(),
                    qty: take,
                    priority,
                }],
            );
            debug!(sku = %row.sku, bin_id, qty = take, priority, "整箱分配");
            remaining -= take;
        }

        if remaining > 0 {
            debug!(sku = %row.sku, dropped = remaining, "超出最大箱数的存量未入箱");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sku::FillMetrics;
    use crate::domain::types::FitStatus;

    fn row(sku: &str, size: Option<CompartmentSize>, per_bin: i64, stored: i64, capped: f64) -> CapacityRow {
        CapacityRow {
            sku: sku.to_string(),
            length_mm: 10.0,
            width_mm: 10.0,
            height_mm: 10.0,
            weight_kg: 0.1,
            volume_mm3: 1000.0,
            min_qty_per_bin: 1,
            qty_stored: stored,
            qty_per_bin: per_bin,
            qty_per_half: per_bin / 2,
            qty_per_quarter: per_bin / 4,
            qty_per_eighth: per_bin / 8,
            compartment_size: size,
            bin_count: capped,
            capped_bin_count: capped,
            fit_status: FitStatus::Fit,
            fill: FillMetrics::default(),
        }
    }

    #[test]
    fn test_whole_bins_fill_order() {
        let rows = vec![row("W", Some(CompartmentSize::Whole), 100, 250, 3.0)];
        let result = BinAssigner::new().assign(&rows);

        assert_eq!(result.bins.len(), 3);
        let slots: Vec<(i64, i64, i64)> = result
            .bins
            .iter()
            .map(|b| (b.bin_id, b.slots[0].qty, b.slots[0].priority))
            .collect();
        assert_eq!(slots, vec![(1, 100, 1), (2, 100, 2), (3, 50, 3)]);
        assert_eq!(result.next_bin_id, 4);
    }

    #[test]
    fn test_capped_whole_bins_never_overfill() {
        let rows = vec![row("W", Some(CompartmentSize::Whole), 100, 1_000, 2.0)];
        let result = BinAssigner::new().assign(&rows);

        assert_eq!(result.bins.len(), 2);
        assert!(result.bins.iter().all(|b| b.slots[0].qty == 100));
    }

    #[test]
    fn test_quarter_batches() {
        let rows: Vec<CapacityRow> = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|s| row(s, Some(CompartmentSize::Quarter), 400, 10, 0.25))
            .collect();
        let result = BinAssigner::new().assign(&rows);

        assert_eq!(result.bins.len(), 2);
        assert_eq!(result.bins[0].slots.len(), 4);
        assert_eq!(result.bins[1].slots.len(), 1);
        assert_eq!(result.bins[1].slots[0].sku, "E");
        assert!(result
            .bins
            .iter()
            .flat_map(|b| b.slots.iter())
            .all(|s| s.priority == 1));
    }

    #[test]
    fn test_shared_id_space_and_class_order() {
        let rows = vec![
            row("W", Some(CompartmentSize::Whole), 100, 150, 2.0),
            row("E1", Some(CompartmentSize::Eighth), 800, 5, 0.125),
            row("H1", Some(CompartmentSize::Half), 200, 5, 0.5),
            row("Q1", Some(CompartmentSize::Quarter), 400, 5, 0.25),
        ];
        let result = BinAssigner::new().assign(&rows);

        let layout: Vec<(i64, CompartmentSize)> = result
            .bins
            .iter()
            .map(|b| (b.bin_id, b.compartment_size))
            .collect();
        assert_eq!(
            layout,
            vec![
                (1, CompartmentSize::Whole),
                (2, CompartmentSize::Whole),
                (3, CompartmentSize::Half),
                (4, CompartmentSize::Quarter),
                (5, CompartmentSize::Eighth),
            ]
        );
    }

    #[test]
    fn test_skips_zero_count_and_non_fit() {
        let mut no_fit = row("NF", None, 0, 10, 0.0);
        no_fit.fit_status = FitStatus::NoFit;
        let rows = vec![row("Z", Some(CompartmentSize::Whole), 100, 0, 0.0), no_fit];
        let result = BinAssigner::new().assign(&rows);

        assert!(result.bins.is_empty());
        assert_eq!(result.skipped, vec!["Z".to_string()]);
    }

    #[test]
    fn test_min_qty_raises_stored_qty() {
        let mut r = row("Q", Some(CompartmentSize::Quarter), 400, 3, 0.25);
        r.min_qty_per_bin = 8;
        let result = BinAssigner::new().assign(&[r]);
        assert_eq!(result.bins[0].slots[0].qty, 8);
    }
}
