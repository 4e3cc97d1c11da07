// ==========================================
// 料箱仓储仿真系统 - 主数据仓储
// ==========================================
// 职责: 独占 sku_live / bin_content_live / bins_capacity / stacks_lookup 四张实时表
// 红线: 仿真与一致性检查只能通过本仓储的原子操作访问实时表
// ==========================================
// 存储: 单次运行的 SQLite 内存库
// 约束: 公开方法只加锁一次, 内部函数接收 &Connection
// ==========================================

mod capacity;
mod content;
mod init;
mod sku;
mod snapshot;
mod stack;

#[cfg(test)]
mod tests;

pub use init::InitSummary;
pub use snapshot::{HealthCounts, MasterDataSnapshot};

use crate::db::open_in_memory_connection;
use crate::domain::types::CompartmentSize;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// CompartmentSize <-> SQLite REAL
// ==========================================
impl ToSql for CompartmentSize {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.fraction()))
    }
}

impl FromSql for CompartmentSize {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let fraction = f64::column_result(value)?;
        CompartmentSize::from_fraction(fraction)
            .ok_or_else(|| FromSqlError::Other(format!("非法格口规格: {}", fraction).into()))
    }
}

// ==========================================
// MasterDataStore - 主数据仓储
// ==========================================
pub struct MasterDataStore {
    conn: Arc<Mutex<Connection>>,
}

impl MasterDataStore {
    /// 创建基于内存库的主数据仓储
    pub fn new() -> RepositoryResult<Self> {
        let conn = open_in_memory_connection()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}
