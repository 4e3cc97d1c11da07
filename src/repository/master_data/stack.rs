// ==========================================
// 主数据仓储 - stacks_lookup 表操作
// ==========================================
// position 即料箱深度 (上方料箱数), 0 为堆顶
// 料箱所属料箱堆在初始化后固定, 只有 position 会变化
// ==========================================

use super::MasterDataStore;
use crate::domain::bin::{Stack, StackLookupRow};
use crate::domain::types::{BinId, StackId};
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::error;

fn query_location(conn: &Connection, bin_id: BinId) -> rusqlite::Result<Option<(StackId, i64)>> {
    conn.query_row(
        "SELECT stack_id, position FROM stacks_lookup WHERE bin_id = ?1",
        params![bin_id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
}

impl MasterDataStore {
    /// 查询料箱所属料箱堆
    ///
    /// 初始化后料箱不应缺失, 缺失时记录错误并返回 None
    pub fn resolve_stack(&self, bin_id: BinId) -> RepositoryResult<Option<StackId>> {
        let conn = self.get_conn()?;
        let location = query_location(&conn, bin_id)?;
        if location.is_none() {
            error!(bin_id, "料箱不在 stacks_lookup 中, 数据已损坏");
        }
        Ok(location.map(|(stack_id, _)| stack_id))
    }

    /// 料箱上方的料箱数
    pub fn bins_above(&self, bin_id: BinId) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        Ok(query_location(&conn, bin_id)?.map(|(_, position)| position))
    }

    /// 把料箱移到堆顶, 返回移动前上方的料箱数
    ///
    /// 原先在其上方的料箱下移一位, 下方料箱不变
    pub fn pop_to_top(&self, bin_id: BinId) -> RepositoryResult<Option<i64>> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let Some((stack_id, position)) = query_location(&tx, bin_id)? else {
            error!(bin_id, "料箱不在 stacks_lookup 中, 无法移到堆顶");
            return Ok(None);
        };

        if position > 0 {
            tx.execute(
                "UPDATE stacks_lookup SET position = position + 1
                 WHERE stack_id = ?1 AND position < ?2",
                params![stack_id, position],
            )?;
            tx.execute(
                "UPDATE stacks_lookup SET position = 0 WHERE bin_id = ?1",
                params![bin_id],
            )?;
        }
        tx.commit()?;
        Ok(Some(position))
    }

    /// 料箱堆内的料箱 (自顶向下)
    pub fn stack_bins(&self, stack_id: StackId) -> RepositoryResult<Vec<BinId>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT bin_id FROM stacks_lookup WHERE stack_id = ?1 ORDER BY position",
        )?;
        let bins = stmt
            .query_map(params![stack_id], |row| row.get(0))?
            .collect::<Result<Vec<BinId>, _>>()?;
        Ok(bins)
    }

    /// 全部料箱堆的当前顺序
    pub fn stacks(&self) -> RepositoryResult<Vec<Stack>> {
        let rows = self.list_stack_lookup()?;
        let mut stacks: Vec<Stack> = Vec::new();
        for row in rows {
            match stacks.last_mut() {
                Some(stack) if stack.stack_id == row.stack_id => stack.bins.push(row.bin_id),
                _ => stacks.push(Stack {
                    stack_id: row.stack_id,
                    bins: vec![row.bin_id],
                }),
            }
        }
        Ok(stacks)
    }

    /// stacks_lookup 全表 (按料箱堆、深度排序)
    pub fn list_stack_lookup(&self) -> RepositoryResult<Vec<StackLookupRow>> {
        let conn = self.get_conn()?;
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
        Ok(rows)
    }
}
