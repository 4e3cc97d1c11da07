// ==========================================
// 主数据仓储 - bin_content_live 表操作
// ==========================================
// 格口 "清空" = SKU 与优先级置空且数量严格为 0
// 清空/分配与 bins_capacity 计数在同一事务内完成
// ==========================================

use super::capacity::bump_capacity;
use super::MasterDataStore;
use crate::domain::bin::CompartmentRow;
use crate::domain::types::{BinId, CompartmentSize};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, warn};

pub(super) const COMPARTMENT_COLUMNS: &str =
    "bin_id, compartment_id, compartment_size, sku, priority, qty_in_bin";

pub(super) fn map_compartment_row(row: &Row<'_>) -> rusqlite::Result<CompartmentRow> {
    Ok(CompartmentRow {
        bin_id: row.get(0)?,
        compartment_id: row.get(1)?,
        compartment_size: row.get(2)?,
        sku: row.get(3)?,
        priority: row.get(4)?,
        qty_in_bin: row.get(5)?,
    })
}

fn query_compartment(
    conn: &Connection,
    bin_id: BinId,
    compartment_id: i64,
) -> rusqlite::Result<Option<CompartmentRow>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM bin_content_live WHERE bin_id = ?1 AND compartment_id = ?2",
            COMPARTMENT_COLUMNS
        ),
        params![bin_id, compartment_id],
        map_compartment_row,
    )
    .optional()
}

fn query_rows(
    conn: &Connection,
    where_clause: &str,
    params: &[&dyn rusqlite::ToSql],
) -> rusqlite::Result<Vec<CompartmentRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM bin_content_live WHERE {}",
        COMPARTMENT_COLUMNS, where_clause
    ))?;
    let rows = stmt
        .query_map(params, map_compartment_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// 清空格口 (事务内调用)
///
/// 返回 false 表示格口不存在
pub(super) fn mark_empty_in(
    conn: &Connection,
    bin_id: BinId,
    compartment_id: i64,
) -> RepositoryResult<bool> {
    let Some(current) = query_compartment(conn, bin_id, compartment_id)? else {
        warn!(bin_id, compartment_id, "清空格口失败: 格口不存在");
        return Ok(false);
    };

    conn.execute(
        "UPDATE bin_content_live SET sku = NULL, priority = NULL, qty_in_bin = 0
         WHERE bin_id = ?1 AND compartment_id = ?2",
        params![bin_id, compartment_id],
    )?;

    if current.sku.is_some() {
        bump_capacity(conn, bin_id, -1)?;
    }
    Ok(true)
}

/// 按当前顺序把 SKU 的全部库位重排为 1..k (事务内调用)
pub(super) fn rerank_in(conn: &Connection, sku: &str) -> RepositoryResult<usize> {
    let rows = query_rows(
        conn,
        "sku = ?1 ORDER BY priority, bin_id, compartment_id",
        params![sku],
    )?;

    let mut changed = 0;
    for (idx, row) in rows.iter().enumerate() {
        let rank = idx as i64 + 1;
        if row.priority != Some(rank) {
            conn.execute(
                "UPDATE bin_content_live SET priority = ?3 WHERE bin_id = ?1 AND compartment_id = ?2",
                params![row.bin_id, row.compartment_id, rank],
            )?;
            changed += 1;
        }
    }
    Ok(changed)
}

impl MasterDataStore {
    /// 查询 (料箱, SKU) 对应的格口行
    pub fn get_compartments(&self, bin_id: BinId, sku: &str) -> RepositoryResult<Vec<CompartmentRow>> {
        let conn = self.get_conn()?;
        Ok(query_rows(
            &conn,
            "bin_id = ?1 AND sku = ?2 ORDER BY compartment_id",
            params![bin_id, sku],
        )?)
    }

    /// 查询料箱的全部格口行
    pub fn bin_compartments(&self, bin_id: BinId) -> RepositoryResult<Vec<CompartmentRow>> {
        let conn = self.get_conn()?;
        Ok(query_rows(&conn, "bin_id = ?1 ORDER BY compartment_id", params![bin_id])?)
    }

    /// SKU 的全部库位 (按优先级排序)
    pub fn sku_locations(&self, sku: &str) -> RepositoryResult<Vec<CompartmentRow>> {
        let conn = self.get_conn()?;
        Ok(query_rows(
            &conn,
            "sku = ?1 ORDER BY priority, bin_id, compartment_id",
            params![sku],
        )?)
    }

    /// SKU 指定优先级的库位
    pub fn priority_location(&self, sku: &str, priority: i64) -> RepositoryResult<Option<CompartmentRow>> {
        let conn = self.get_conn()?;
        let mut rows = query_rows(
            &conn,
            "sku = ?1 AND priority = ?2 ORDER BY bin_id, compartment_id LIMIT 1",
            params![sku, priority],
        )?;
        Ok(rows.pop())
    }

    /// 指定规格下所有被占用的格口
    pub fn occupied_compartments(&self, size: CompartmentSize) -> RepositoryResult<Vec<CompartmentRow>> {
        let conn = self.get_conn()?;
        Ok(query_rows(
            &conn,
            "compartment_size = ?1 AND sku IS NOT NULL AND qty_in_bin > 0
             ORDER BY sku, priority, bin_id, compartment_id",
            params![size],
        )?)
    }

    /// 按有符号增量调整格口数量, 返回调整后的数量
    ///
    /// 只允许调整已占用格口, 结果不得为负
    pub fn adjust_bin_qty(&self, bin_id: BinId, compartment_id: i64, delta: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let current = query_compartment(&conn, bin_id, compartment_id)?.ok_or_else(|| {
            RepositoryError::not_found("bin_content_live", format!("{}/{}", bin_id, compartment_id))
        })?;

        if current.sku.is_none() {
            return Err(RepositoryError::InvariantViolation(format!(
                "料箱 {} 格口 {} 为空, 不能调整数量",
                bin_id, compartment_id
            )));
        }

        let next = current.qty_in_bin + delta;
        if next < 0 {
            return Err(RepositoryError::InvariantViolation(format!(
                "料箱 {} 格口 {} 数量 {} 调整 {} 后为负",
                bin_id, compartment_id, current.qty_in_bin, delta
            )));
        }

        conn.execute(
            "UPDATE bin_content_live SET qty_in_bin = ?3 WHERE bin_id = ?1 AND compartment_id = ?2",
            params![bin_id, compartment_id, next],
        )?;
        Ok(next)
    }

    /// 清空格口: SKU/优先级置空, 数量置 0, 占用计数减 1 (原子)
    pub fn mark_compartment_empty(&self, bin_id: BinId, compartment_id: i64) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let done = mark_empty_in(&tx, bin_id, compartment_id)?;
        tx.commit()?;
        if done {
            debug!(bin_id, compartment_id, "格口已清空");
        }
        Ok(done)
    }

    /// 重排 SKU 优先级 (递减并压缩)
    ///
    /// 剩余库位保持相对顺序, 重新编号为 1..k; 返回改动的行数
    pub fn rerank_priorities(&self, sku: &str) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let changed = rerank_in(&tx, sku)?;
        tx.commit()?;
        Ok(changed)
    }

    /// SKU 当前最大优先级 (无库位时为 0)
    pub fn max_priority(&self, sku: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let max: Option<i64> = conn.query_row(
            "SELECT MAX(priority) FROM bin_content_live WHERE sku = ?1",
            params![sku],
            |row| row.get(0),
        )?;
        Ok(max.unwrap_or(0))
    }

    /// SKU 在全部格口中的总数量
    pub fn sku_stock_total(&self, sku: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let total: i64 = conn.query_row(
            "SELECT COALESCE(SUM(qty_in_bin), 0) FROM bin_content_live WHERE sku = ?1",
            params![sku],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    /// 料箱中第一个空格口
    pub fn find_empty_compartment(&self, bin_id: BinId) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT compartment_id FROM bin_content_live
                 WHERE bin_id = ?1 AND sku IS NULL AND priority IS NULL AND qty_in_bin = 0
                 ORDER BY compartment_id LIMIT 1",
                params![bin_id],
                |row| row.get(0),
            )
            .optional()?;
        if found.is_none() {
            warn!(bin_id, "料箱中未找到空格口");
        }
        Ok(found)
    }

    /// 向空格口放入 SKU, 占用计数加 1 (原子)
    ///
    /// 不修改 sku_live 的系统库存
    pub fn assign_compartment(
        &self,
        bin_id: BinId,
        compartment_id: i64,
        sku: &str,
        qty: i64,
        priority: i64,
    ) -> RepositoryResult<()> {
        if qty <= 0 || priority < 1 {
            return Err(RepositoryError::FieldValueError {
                field: "qty/priority".to_string(),
                message: format!("放入数量 {} 与优先级 {} 必须为正", qty, priority),
            });
        }

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let current = query_compartment(&tx, bin_id, compartment_id)?.ok_or_else(|| {
            RepositoryError::not_found("bin_content_live", format!("{}/{}", bin_id, compartment_id))
        })?;
        if current.sku.is_some() || current.qty_in_bin != 0 {
            return Err(RepositoryError::InvariantViolation(format!(
                "料箱 {} 格口 {} 非空, 不能放入 {}",
                bin_id, compartment_id, sku
            )));
        }

        tx.execute(
            "UPDATE bin_content_live SET sku = ?3, priority = ?4, qty_in_bin = ?5
             WHERE bin_id = ?1 AND compartment_id = ?2",
            params![bin_id, compartment_id, sku, priority, qty],
        )?;
        bump_capacity(&tx, bin_id, 1)?;
        tx.commit()?;
        Ok(())
    }
}
