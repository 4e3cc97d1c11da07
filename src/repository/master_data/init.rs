// ==========================================
// 主数据仓储 - 一次性初始化
// ==========================================
// 输入: 容量计算结果 + 分箱结果 + 料箱堆
// 约束: 单个事务内清空并重建四张实时表
// ==========================================

use super::sku::refresh_priority_bin_in;
use super::MasterDataStore;
use crate::domain::bin::{BinEntry, Stack};
use crate::domain::sku::CapacityRow;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// 初始化汇总
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitSummary {
    pub sku_count: usize,
    pub bin_count: usize,
    pub compartment_count: usize,
    pub stack_count: usize,
    /// 实际入箱数量与目标系统库存不一致的 SKU 数
    pub qty_mismatches: usize,
}

impl MasterDataStore {
    /// 从三段引擎输出重建实时表
    ///
    /// 目标系统库存 = max(每箱最小数量, min(存量, 每箱数量 * 最大箱数))
    /// 系统库存取实际入箱数量之和, 与目标不一致时记录告警
    #[instrument(skip_all, fields(skus = capacity_rows.len(), bins = bins.len(), stacks = stacks.len()))]
    pub fn initialize(
        &self,
        capacity_rows: &[CapacityRow],
        bins: &[BinEntry],
        stacks: &[Stack],
        max_bins_per_sku: i64,
        restock_pct: f64,
    ) -> RepositoryResult<InitSummary> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        tx.execute_batch(
            "DELETE FROM sku_live;
             DELETE FROM bin_content_live;
             DELETE FROM bins_capacity;
             DELETE FROM stacks_lookup;",
        )?;

        let mut summary = InitSummary::default();
        let mut placed: HashMap<&str, i64> = HashMap::new();

        // ===== bin_content_live + bins_capacity =====
        {
            let mut insert_content = tx.prepare(
                "INSERT INTO bin_content_live
                 (bin_id, compartment_id, compartment_size, sku, priority, qty_in_bin)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            let mut insert_capacity = tx.prepare(
                "INSERT INTO bins_capacity (bin_id, compartment_size, num_full_compartments)
                 VALUES (?1, ?2, ?3)",
            )?;

            for bin in bins {
                let slots_per_bin = bin.compartment_size.compartments_per_bin() as usize;
                if bin.slots.len() > slots_per_bin {
                    return Err(RepositoryError::InvariantViolation(format!(
                        "料箱 {} 有 {} 个占位, 超过格口数 {}",
                        bin.bin_id,
                        bin.slots.len(),
                        slots_per_bin
                    )));
                }

                let mut occupied = 0i64;
                for idx in 0..slots_per_bin {
                    let compartment_id = idx as i64 + 1;
                    match bin.slots.get(idx).filter(|slot| slot.qty > 0) {
                        Some(slot) => {
                            insert_content.execute(params![
                                bin.bin_id,
                                compartment_id,
                                bin.compartment_size,
                                slot.sku,
                                slot.priority,
                                slot.qty
                            ])?;
                            *placed.entry(slot.sku.as_str()).or_insert(0) += slot.qty;
                            occupied += 1;
                        }
                        None => {
                            insert_content.execute(params![
                                bin.bin_id,
                                compartment_id,
                                bin.compartment_size,
                                Option::<String>::None,
                                Option::<i64>::None,
                                0i64
                            ])?;
                        }
                    }
                    summary.compartment_count += 1;
                }

                insert_capacity.execute(params![bin.bin_id, bin.compartment_size, occupied])?;
                summary.bin_count += 1;
            }
        }

        // ===== stacks_lookup =====
        {
            let mut insert_stack = tx.prepare(
                "INSERT INTO stacks_lookup (bin_id, stack_id, position) VALUES (?1, ?2, ?3)",
            )?;
            for stack in stacks {
                for (position, bin_id) in stack.bins.iter().enumerate() {
                    insert_stack.execute(params![bin_id, stack.stack_id, position as i64])?;
                }
            }
            summary.stack_count = stacks.len();
        }

        // ===== sku_live =====
        {
            let mut insert_sku = tx.prepare(
                "INSERT INTO sku_live
                 (sku, qty_in_system, prio_bin, full_bin_qty, full_system_qty, restock_qty, compartment_size)
                 VALUES (?1, ?2, NULL, ?3, ?4, ?5, ?6)",
            )?;

            for row in capacity_rows.iter().filter(|row| row.is_fit()) {
                let Some(size) = row.compartment_size else {
                    continue;
                };

                let target = full_system_qty(row, max_bins_per_sku);
                let restock_qty = (target as f64 * restock_pct / 100.0).ceil() as i64;
                let in_bins = placed.get(row.sku.as_str()).copied().unwrap_or(0);
                if in_bins != target {
                    warn!(
                        sku = %row.sku,
                        target,
                        in_bins,
                        "入箱数量与目标系统库存不一致, 以入箱数量为准"
                    );
                    summary.qty_mismatches += 1;
                }

                insert_sku.execute(params![
                    row.sku,
                    in_bins,
                    row.full_bin_qty(),
                    target,
                    restock_qty,
                    size
                ])?;
                refresh_priority_bin_in(&tx, &row.sku)?;
                summary.sku_count += 1;
            }
        }

        tx.commit()?;

        info!(
            sku_count = summary.sku_count,
            bin_count = summary.bin_count,
            compartment_count = summary.compartment_count,
            stack_count = summary.stack_count,
            qty_mismatches = summary.qty_mismatches,
            "主数据初始化完成"
        );
        Ok(summary)
    }
}

/// 目标系统库存
pub(super) fn full_system_qty(row: &CapacityRow, max_bins_per_sku: i64) -> i64 {
    let capped = row.qty_stored.min(row.qty_per_bin.saturating_mul(max_bins_per_sku));
    row.min_qty_per_bin.max(capped)
}
