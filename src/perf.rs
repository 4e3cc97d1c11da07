// ==========================================
// 料箱仓储仿真系统 - 性能统计
// ==========================================
// SQL 语句计数 / 慢 SQL 日志 / 阶段耗时
// ==========================================

use rusqlite::Connection;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

const ENV_PERF_SQL: &str = "AUTOSTORE_SIM_PERF_SQL";
const ENV_SLOW_SQL_MS: &str = "AUTOSTORE_SIM_SLOW_SQL_MS";

static PERF_SQL_ENABLED: AtomicBool = AtomicBool::new(false);
static SLOW_SQL_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);

thread_local! {
    static PERF_DEPTH: Cell<u32> = Cell::new(0);
    static SQL_COUNT: Cell<u64> = Cell::new(0);
    static SLOW_SQL_COUNT: Cell<u64> = Cell::new(0);
}

fn env_flag(name: &str) -> Option<bool> {
    std::env::var(name).ok().map(|v| {
        matches!(
            v.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "y" | "on"
        )
    })
}

fn shorten_sql(sql: &str, max_chars: usize) -> String {
    let flat: String = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let head: String = flat.chars().take(max_chars).collect();
    format!("{}…", head)
}

/// 安装 SQLite 语句 trace/profile
///
/// 开关：
/// - `AUTOSTORE_SIM_PERF_SQL=1` 开启（默认关闭, 仿真每单有数十条语句）
/// - `AUTOSTORE_SIM_SLOW_SQL_MS=20` 慢 SQL 阈值（毫秒, 默认 20）
pub fn install_sqlite_tracing(conn: &mut Connection) {
    let enabled = env_flag(ENV_PERF_SQL).unwrap_or(false);
    PERF_SQL_ENABLED.store(enabled, Ordering::Relaxed);

    if !enabled {
        conn.trace(None);
        conn.profile(None);
        return;
    }

    let slow_ms = std::env::var(ENV_SLOW_SQL_MS)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(20);
    SLOW_SQL_THRESHOLD_MS.store(slow_ms, Ordering::Relaxed);

    conn.trace(Some(on_sql_trace));
    conn.profile(Some(on_sql_profile));
}

fn guard_active() -> bool {
    PERF_DEPTH.with(|d| d.get() > 0)
}

fn on_sql_trace(_sql: &str) {
    if PERF_SQL_ENABLED.load(Ordering::Relaxed) && guard_active() {
        SQL_COUNT.with(|c| c.set(c.get().saturating_add(1)));
    }
}

fn on_sql_profile(sql: &str, duration: Duration) {
    if !PERF_SQL_ENABLED.load(Ordering::Relaxed) {
        return;
    }

    let ms = duration.as_millis() as u64;
    let threshold = SLOW_SQL_THRESHOLD_MS.load(Ordering::Relaxed);
    if threshold == 0 || ms < threshold {
        return;
    }

    tracing::warn!(
        target: "slow_sql",
        duration_ms = ms,
        sql = %shorten_sql(sql, 300),
        "慢 SQL"
    );
    if guard_active() {
        SLOW_SQL_COUNT.with(|c| c.set(c.get().saturating_add(1)));
    }
}

/// 阶段耗时 Guard：drop 时记录 elapsed_ms / SQL 语句数 / 慢 SQL 数 / 处理条数
///
/// ```ignore
/// let mut perf = autostore_sim::perf::PerfGuard::new("simulate");
/// perf.set_items(orders.len());
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    sql_start: u64,
    slow_sql_start: u64,
    items: Option<usize>,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        PERF_DEPTH.with(|d| d.set(d.get().saturating_add(1)));
        Self {
            op,
            start: Instant::now(),
            sql_start: SQL_COUNT.with(|c| c.get()),
            slow_sql_start: SLOW_SQL_COUNT.with(|c| c.get()),
            items: None,
        }
    }

    /// 记录本阶段处理的条数
    pub fn set_items(&mut self, items: usize) {
        self.items = Some(items);
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        let sql_count = SQL_COUNT.with(|c| c.get()).saturating_sub(self.sql_start);
        let slow_sql_count = SLOW_SQL_COUNT
            .with(|c| c.get())
            .saturating_sub(self.slow_sql_start);

        tracing::info!(
            target: "perf",
            op = self.op,
            elapsed_ms,
            sql_count,
            slow_sql_count,
            items = self.items.unwrap_or(0),
            "阶段完成"
        );

        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorten_sql() {
        assert_eq!(shorten_sql("SELECT  1\n FROM t", 100), "SELECT 1 FROM t");
        assert_eq!(shorten_sql("SELECT 1 FROM t", 6), "SELECT…");
    }

    #[test]
    fn test_guard_depth_restored() {
        {
            let mut guard = PerfGuard::new("unit");
            guard.set_items(3);
            assert!(guard_active());
        }
        assert!(!guard_active());
    }
}
