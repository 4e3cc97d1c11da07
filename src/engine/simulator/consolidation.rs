// ==========================================
// 仿真引擎 - 合并
// ==========================================
// 只在补货找不到可用料箱时对该规格触发
// 候选: 占用该规格多于一个格口的 SKU, 按占用数降序处理
// 目标格口数 = ceil(总数量 / 整箱满载数量), 严格少于当前才合并
// 合并不改变 SKU 的系统库存
// ==========================================

use super::core::Simulator;
use super::types::SimulationStats;
use crate::domain::bin::CompartmentRow;
use crate::domain::types::CompartmentSize;
use crate::engine::error::{EngineError, EngineResult};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

impl<'a> Simulator<'a> {
    /// 合并指定规格, 返回净释放的格口数
    #[instrument(skip(self, stats), fields(compartment_size = %size))]
    pub(super) fn consolidate(&self, size: CompartmentSize, stats: &mut SimulationStats) -> EngineResult<i64> {
        let mut by_sku: BTreeMap<String, Vec<CompartmentRow>> = BTreeMap::new();
        for row in self.store.occupied_compartments(size)? {
            if let Some(sku) = row.sku.clone() {
                by_sku.entry(sku).or_default().push(row);
            }
        }

        let mut candidates: Vec<(String, Vec<CompartmentRow>)> =
            by_sku.into_iter().filter(|(_, rows)| rows.len() > 1).collect();
        candidates.sort_by(|a, b| b.1.len().cmp(&a.1.len()));

        let mut freed = 0;
        for (sku, rows) in candidates {
            let Some(live) = self.store.get_sku(&sku)? else {
                continue;
            };
            if live.full_bin_qty <= 0 {
                continue;
            }

            let total: i64 = rows.iter().map(|r| r.qty_in_bin).sum();
            let current = rows.len() as i64;
            let optimal = (total + live.full_bin_qty - 1) / live.full_bin_qty;
            if optimal >= current {
                continue;
            }

            for row in &rows {
                self.store.mark_compartment_empty(row.bin_id, row.compartment_id)?;
            }

            let mut remaining = total;
            let mut priority = 1;
            while remaining > 0 {
                let bin_id = self.store.find_available_bin(size)?;
                let compartment_id = match bin_id {
                    Some(bin_id) => self.store.find_empty_compartment(bin_id)?,
                    None => None,
                };
                let (Some(bin_id), Some(compartment_id)) = (bin_id, compartment_id) else {
                    return Err(EngineError::Inconsistent(format!(
                        "合并 SKU {} 时找不到空格口, 剩余 {} 件未放回",
                        sku, remaining
                    )));
                };

                let chunk = remaining.min(live.full_bin_qty);
                self.store
                    .assign_compartment(bin_id, compartment_id, &sku, chunk, priority)?;
                self.store.refresh_priority_bin(&sku)?;
                remaining -= chunk;
                priority += 1;
            }

            debug!(sku = %sku, before = current, after = optimal, "SKU 合并完成");
            freed += current - optimal;
        }

        stats.consolidations += 1;
        stats.compartments_freed += freed;
        info!(freed, "合并结束");
        Ok(freed)
    }
}
