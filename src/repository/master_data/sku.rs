// ==========================================
// 主数据仓储 - sku_live 表操作
// ==========================================

use super::MasterDataStore;
use crate::domain::sku::SkuLive;
use crate::domain::types::BinId;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, warn};

pub(super) const SKU_COLUMNS: &str =
    "sku, qty_in_system, prio_bin, full_bin_qty, full_system_qty, restock_qty, compartment_size";

pub(super) fn map_sku_row(row: &Row<'_>) -> rusqlite::Result<SkuLive> {
    Ok(SkuLive {
        sku: row.get(0)?,
        qty_in_system: row.get(1)?,
        prio_bin: row.get(2)?,
        full_bin_qty: row.get(3)?,
        full_system_qty: row.get(4)?,
        restock_qty: row.get(5)?,
        compartment_size: row.get(6)?,
    })
}

pub(super) fn query_sku(conn: &Connection, sku: &str) -> rusqlite::Result<Option<SkuLive>> {
    conn.query_row(
        &format!("SELECT {} FROM sku_live WHERE sku = ?1", SKU_COLUMNS),
        params![sku],
        map_sku_row,
    )
    .optional()
}

/// 按 bin_content_live 重新推导优先级 1 料箱并写回 sku_live
pub(super) fn refresh_priority_bin_in(
    conn: &Connection,
    sku: &str,
) -> RepositoryResult<Option<BinId>> {
    let prio_bin: Option<BinId> = conn.query_row(
        "SELECT MIN(bin_id) FROM bin_content_live WHERE sku = ?1 AND priority = 1",
        params![sku],
        |row| row.get(0),
    )?;

    let updated = conn.execute(
        "UPDATE sku_live SET prio_bin = ?2 WHERE sku = ?1",
        params![sku, prio_bin],
    )?;
    if updated == 0 {
        return Err(RepositoryError::not_found("sku_live", sku));
    }

    if prio_bin.is_none() {
        debug!(sku = %sku, "SKU 当前无优先级 1 料箱");
    }
    Ok(prio_bin)
}

impl MasterDataStore {
    /// 按 SKU 查询实时库存记录
    pub fn get_sku(&self, sku: &str) -> RepositoryResult<Option<SkuLive>> {
        let conn = self.get_conn()?;
        Ok(query_sku(&conn, sku)?)
    }

    /// 全部 SKU 记录 (按 SKU 排序)
    pub fn list_skus(&self) -> RepositoryResult<Vec<SkuLive>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM sku_live ORDER BY sku",
            SKU_COLUMNS
        ))?;
        let rows = stmt
            .query_map([], map_sku_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// 按有符号增量调整系统库存, 返回调整后的数量
    ///
    /// 调整后为负数时拒绝执行
    pub fn adjust_sku_qty(&self, sku: &str, delta: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let current = query_sku(&conn, sku)?
            .ok_or_else(|| RepositoryError::not_found("sku_live", sku))?;

        let next = current.qty_in_system + delta;
        if next < 0 {
            warn!(sku = %sku, qty = current.qty_in_system, delta, "系统库存将变为负数, 拒绝调整");
            return Err(RepositoryError::InvariantViolation(format!(
                "SKU {} 系统库存 {} 调整 {} 后为负",
                sku, current.qty_in_system, delta
            )));
        }

        conn.execute(
            "UPDATE sku_live SET qty_in_system = ?2 WHERE sku = ?1",
            params![sku, next],
        )?;
        Ok(next)
    }

    /// 重新推导并保存优先级 1 料箱
    pub fn refresh_priority_bin(&self, sku: &str) -> RepositoryResult<Option<BinId>> {
        let conn = self.get_conn()?;
        refresh_priority_bin_in(&conn, sku)
    }
}
