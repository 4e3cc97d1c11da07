// ==========================================
// 主数据仓储 - 快照与健康计数
// ==========================================
// 快照供一致性检查器与导出层只读使用
// ==========================================

use super::capacity::map_capacity_row;
use super::content::{map_compartment_row, COMPARTMENT_COLUMNS};
use super::sku::{map_sku_row, SKU_COLUMNS};
use super::MasterDataStore;
use crate::domain::bin::{CapacityRecord, CompartmentRow, StackLookupRow};
use crate::domain::sku::SkuLive;
use crate::repository::error::RepositoryResult;
use serde::{Deserialize, Serialize};

/// 四张实时表的一致性快照 (同一把锁内读取)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MasterDataSnapshot {
    pub skus: Vec<SkuLive>,
    pub compartments: Vec<CompartmentRow>,
    pub capacity: Vec<CapacityRecord>,
    pub stack_lookup: Vec<StackLookupRow>,
}

/// 轻量健康计数 (最小检查使用)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCounts {
    pub sku_rows: i64,
    pub content_rows: i64,
    pub negative_sku_qty: i64,
    pub negative_bin_qty: i64,
}

impl MasterDataStore {
    /// 读取全部实时表
    pub fn snapshot(&self) -> RepositoryResult<MasterDataSnapshot> {
        let conn = self.get_conn()?;

        let skus = {
            let mut stmt = conn.prepare(&format!("SELECT {} FROM sku_live ORDER BY sku", SKU_COLUMNS))?;
            let rows = stmt.query_map([], map_sku_row)?.collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let compartments = {
            let mut stmt = conn.prepare(&format!(
                "SELECT {} FROM bin_content_live ORDER BY bin_id, compartment_id",
                COMPARTMENT_COLUMNS
            ))?;
            let rows = stmt
                .query_map([], map_compartment_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let capacity = {
            let mut stmt = conn.prepare(
                "SELECT bin_id, compartment_size, num_full_compartments FROM bins_capacity ORDER BY bin_id",
            )?;
            let rows = stmt
                .query_map([], map_capacity_row)?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        let stack_lookup = {
            let mut stmt = conn.prepare(
                "SELECT bin_id, stack_id, position FROM stacks_lookup ORDER BY stack_id, position",
            )?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(StackLookupRow {
                        bin_id: row.get(0)?,
                        stack_id: row.get(1)?,
                        position: row.get(2)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };

        Ok(MasterDataSnapshot {
            skus,
            compartments,
            capacity,
            stack_lookup,
        })
    }

    /// 行数与负数量计数
    pub fn health_counts(&self) -> RepositoryResult<HealthCounts> {
        let conn = self.get_conn()?;
        let count = |sql: &str| -> rusqlite::Result<i64> { conn.query_row(sql, [], |row| row.get(0)) };

        Ok(HealthCounts {
            sku_rows: count("SELECT COUNT(*) FROM sku_live")?,
            content_rows: count("SELECT COUNT(*) FROM bin_content_live")?,
            negative_sku_qty: count("SELECT COUNT(*) FROM sku_live WHERE qty_in_system < 0")?,
            negative_bin_qty: count("SELECT COUNT(*) FROM bin_content_live WHERE qty_in_bin < 0")?,
        })
    }
}
