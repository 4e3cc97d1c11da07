// ==========================================
// 料箱仓储仿真系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 主数据表只存在于单次运行的内存库中
// - 统一 PRAGMA 与建表语句
// ==========================================

use rusqlite::Connection;

/// 当前内存库 schema 版本
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 主数据四张表 + 索引
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS sku_live (
    sku              TEXT PRIMARY KEY,
    qty_in_system    INTEGER NOT NULL,
    prio_bin         INTEGER,
    full_bin_qty     INTEGER NOT NULL,
    full_system_qty  INTEGER NOT NULL,
    restock_qty      INTEGER NOT NULL,
    compartment_size REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS bin_content_live (
    bin_id           INTEGER NOT NULL,
    compartment_id   INTEGER NOT NULL,
    compartment_size REAL NOT NULL,
    sku              TEXT,
    priority         INTEGER,
    qty_in_bin       INTEGER NOT NULL DEFAULT 0,
    PRIMARY KEY (bin_id, compartment_id)
);
CREATE INDEX IF NOT EXISTS idx_content_sku_priority ON bin_content_live (sku, priority);

CREATE TABLE IF NOT EXISTS bins_capacity (
    bin_id                INTEGER PRIMARY KEY,
    compartment_size      REAL NOT NULL,
    num_full_compartments INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_capacity_size_full ON bins_capacity (compartment_size, num_full_compartments);

CREATE TABLE IF NOT EXISTS stacks_lookup (
    bin_id   INTEGER PRIMARY KEY,
    stack_id INTEGER NOT NULL,
    position INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_stack_position ON stacks_lookup (stack_id, position);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 内存库无并发写入, 关闭同步并把临时数据留在内存
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA foreign_keys = ON;
         PRAGMA synchronous = OFF;
         PRAGMA temp_store = MEMORY;",
    )?;
    Ok(())
}

/// 建表 (幂等)
pub fn create_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    let existing: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    if existing.is_none() {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [CURRENT_SCHEMA_VERSION],
        )?;
    }
    Ok(())
}

/// 打开内存库, 应用统一配置并建表
pub fn open_in_memory_connection() -> rusqlite::Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    configure_sqlite_connection(&conn)?;
    crate::perf::install_sqlite_tracing(&mut conn);
    create_schema(&conn)?;
    Ok(conn)
}

/// 读取 schema_version
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))
}
