// ==========================================
// 主数据仓储 - bins_capacity 表操作
// ==========================================

use super::MasterDataStore;
use crate::domain::bin::CapacityRecord;
use crate::domain::types::{BinId, CompartmentSize};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

pub(super) fn map_capacity_row(row: &Row<'_>) -> rusqlite::Result<CapacityRecord> {
    Ok(CapacityRecord {
        bin_id: row.get(0)?,
        compartment_size: row.get(1)?,
        num_full_compartments: row.get(2)?,
    })
}

fn query_capacity(conn: &Connection, bin_id: BinId) -> rusqlite::Result<Option<CapacityRecord>> {
    conn.query_row(
        "SELECT bin_id, compartment_size, num_full_compartments FROM bins_capacity WHERE bin_id = ?1",
        params![bin_id],
        map_capacity_row,
    )
    .optional()
}

/// 调整料箱占用格口数 (事务内调用)
///
/// 结果必须落在 [0, 格口数] 内
pub(super) fn bump_capacity(conn: &Connection, bin_id: BinId, delta: i64) -> RepositoryResult<()> {
    let record = query_capacity(conn, bin_id)?
        .ok_or_else(|| RepositoryError::not_found("bins_capacity", bin_id))?;

    let next = record.num_full_compartments + delta;
    let limit = record.compartment_size.compartments_per_bin() as i64;
    if next < 0 || next > limit {
        return Err(RepositoryError::InvariantViolation(format!(
            "料箱 {} 占用格口数 {} 调整 {} 后超出 [0, {}]",
            bin_id, record.num_full_compartments, delta, limit
        )));
    }

    conn.execute(
        "UPDATE bins_capacity SET num_full_compartments = ?2 WHERE bin_id = ?1",
        params![bin_id, next],
    )?;
    Ok(())
}

impl MasterDataStore {
    /// 查询料箱占用情况
    pub fn get_capacity(&self, bin_id: BinId) -> RepositoryResult<Option<CapacityRecord>> {
        let conn = self.get_conn()?;
        Ok(query_capacity(&conn, bin_id)?)
    }

    /// 查找指定规格下仍有空格口的料箱 (bin_id 最小者)
    pub fn find_available_bin(&self, size: CompartmentSize) -> RepositoryResult<Option<BinId>> {
        let conn = self.get_conn()?;
        let found = conn
            .query_row(
                "SELECT bin_id FROM bins_capacity
                 WHERE compartment_size = ?1 AND num_full_compartments < ?2
                 ORDER BY bin_id LIMIT 1",
                params![size, size.compartments_per_bin() as i64],
                |row| row.get(0),
            )
            .optional()?;

        if found.is_none() {
            debug!(compartment_size = %size, "该规格下无可用料箱");
        }
        Ok(found)
    }

    /// 指定规格下的空格口总数
    pub fn free_compartments(&self, size: CompartmentSize) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let free: i64 = conn.query_row(
            "SELECT COALESCE(SUM(?2 - num_full_compartments), 0) FROM bins_capacity
             WHERE compartment_size = ?1",
            params![size, size.compartments_per_bin() as i64],
            |row| row.get(0),
        )?;
        Ok(free)
    }
}
