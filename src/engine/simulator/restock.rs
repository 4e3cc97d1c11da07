// ==========================================
// 仿真引擎 - 补货
// ==========================================
// 触发: 拣选后系统库存 <= restock_qty
// 补货量: full_system_qty - 当前库存, 按整箱满载数量分块放入空格口
// 无可用料箱时先对该规格做合并, 仍无则放弃本次补货
// ==========================================

use super::core::Simulator;
use super::types::SimulationStats;
use crate::domain::sku::SkuLive;
use crate::engine::error::EngineResult;
use tracing::{debug, error, info, warn};

impl<'a> Simulator<'a> {
    /// 为 SKU 补货, 返回实际补入的数量
    pub(super) fn restock(&self, sku: &SkuLive, stats: &mut SimulationStats) -> EngineResult<i64> {
        let mut deficit = sku.full_system_qty - sku.qty_in_system;
        if deficit <= 0 {
            return Ok(0);
        }
        if sku.full_bin_qty <= 0 {
            warn!(sku = %sku.sku, full_bin_qty = sku.full_bin_qty, "整箱满载数量非正, 无法补货");
            return Ok(0);
        }

        let size = sku.compartment_size;
        let mut placed = 0;

        while deficit > 0 {
            let bin_id = match self.store.find_available_bin(size)? {
                Some(bin_id) => Some(bin_id),
                None => {
                    let freed = self.consolidate(size, stats)?;
                    if freed > 0 {
                        self.store.find_available_bin(size)?
                    } else {
                        None
                    }
                }
            };
            let Some(bin_id) = bin_id else {
                error!(
                    sku = %sku.sku,
                    compartment_size = %size,
                    deficit,
                    "合并后仍无可用料箱, 放弃本次补货"
                );
                stats.restock_failures += 1;
                break;
            };

            let Some(compartment_id) = self.store.find_empty_compartment(bin_id)? else {
                error!(sku = %sku.sku, bin_id, "料箱占用计数显示有空位但未找到空格口");
                stats.restock_failures += 1;
                break;
            };

            let amount = deficit.min(sku.full_bin_qty);
            let priority = self.store.max_priority(&sku.sku)? + 1;
            self.store
                .assign_compartment(bin_id, compartment_id, &sku.sku, amount, priority)?;
            self.store.adjust_sku_qty(&sku.sku, amount)?;
            self.store.refresh_priority_bin(&sku.sku)?;

            debug!(sku = %sku.sku, bin_id, compartment_id, amount, priority, "补货放入格口");
            stats.compartments_restocked += 1;
            deficit -= amount;
            placed += amount;
        }

        if placed > 0 {
            stats.restocks += 1;
            info!(sku = %sku.sku, placed, remaining_deficit = deficit, "补货完成");
        }
        Ok(placed)
    }
}
