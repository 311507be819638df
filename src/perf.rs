// ==========================================
// 销售数据仓库 ETL - 阶段性能统计
// ==========================================
// 职责: 每个 ETL 阶段的耗时 + SQL 语句数 + 慢 SQL 数
// 流向: PhaseTimer::finish → PhaseStats → RunReporter 阶段记录 / JSON 报告
// 开关: SQL 计数默认关闭; 关闭时只统计耗时
// ==========================================

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// SQL 计数开关环境变量
pub const ENV_PERF_SQL: &str = "SALES_DW_ETL_PERF_SQL";

/// 慢 SQL 阈值环境变量（毫秒）
pub const ENV_SLOW_SQL_MS: &str = "SALES_DW_ETL_SLOW_SQL_MS";

pub const DEFAULT_SLOW_SQL_MS: u64 = 200;

static SLOW_SQL_THRESHOLD_MS: AtomicU64 = AtomicU64::new(DEFAULT_SLOW_SQL_MS);

thread_local! {
    static SQL_STATEMENTS: Cell<u64> = const { Cell::new(0) };
    static SLOW_STATEMENTS: Cell<u64> = const { Cell::new(0) };
}

/// 单个阶段的性能数据
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseStats {
    pub elapsed_ms: u64,
    /// SQL 计数关闭时为 0
    pub sql_statements: u64,
    pub slow_statements: u64,
}

/// SQL 计数设置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlProfiling {
    pub enabled: bool,
    pub slow_threshold_ms: u64,
}

impl Default for SqlProfiling {
    fn default() -> Self {
        Self {
            enabled: false,
            slow_threshold_ms: DEFAULT_SLOW_SQL_MS,
        }
    }
}

impl SqlProfiling {
    /// `SALES_DW_ETL_PERF_SQL=1` 开启; `SALES_DW_ETL_SLOW_SQL_MS=50` 调整阈值
    pub fn from_env() -> Self {
        Self::from_values(
            std::env::var(ENV_PERF_SQL).ok().as_deref(),
            std::env::var(ENV_SLOW_SQL_MS).ok().as_deref(),
        )
    }

    fn from_values(flag: Option<&str>, slow_ms: Option<&str>) -> Self {
        let enabled = flag
            .map(|v| {
                matches!(
                    v.trim().to_lowercase().as_str(),
                    "1" | "true" | "yes" | "on"
                )
            })
            .unwrap_or(false);
        let slow_threshold_ms = slow_ms
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_SLOW_SQL_MS);
        Self {
            enabled,
            slow_threshold_ms,
        }
    }
}

/// 在连接上挂载（或卸载）语句计数回调
pub fn install_sql_profiling(conn: &mut Connection, profiling: SqlProfiling) {
    if !profiling.enabled {
        conn.trace(None);
        conn.profile(None);
        return;
    }

    SLOW_SQL_THRESHOLD_MS.store(profiling.slow_threshold_ms, Ordering::Relaxed);
    conn.trace(Some(count_statement));
    conn.profile(Some(check_slow_statement));
}

fn count_statement(_sql: &str) {
    SQL_STATEMENTS.with(|c| c.set(c.get().saturating_add(1)));
}

fn check_slow_statement(sql: &str, duration: Duration) {
    let threshold = SLOW_SQL_THRESHOLD_MS.load(Ordering::Relaxed);
    if !is_slow(duration, threshold) {
        return;
    }
    SLOW_STATEMENTS.with(|c| c.set(c.get().saturating_add(1)));

    let statement: String = sql.split_whitespace().collect::<Vec<_>>().join(" ");
    tracing::warn!(
        target: "slow_sql",
        duration_ms = duration.as_millis() as u64,
        sql = %statement.chars().take(400).collect::<String>(),
        "慢 SQL"
    );
}

/// 阈值为 0 表示不判定慢 SQL
fn is_slow(duration: Duration, threshold_ms: u64) -> bool {
    threshold_ms > 0 && duration.as_millis() as u64 >= threshold_ms
}

/// 阶段计时器: 开始时记下计数快照, finish 时求差
///
/// ```ignore
/// let timer = PhaseTimer::start("3.1");
/// // ... 阶段工作 ...
/// reporter.record("3.1", "Carga dimension marca", n, n, timer.finish());
/// ```
pub struct PhaseTimer {
    phase: &'static str,
    start: Instant,
    statements_at_start: u64,
    slow_at_start: u64,
}

impl PhaseTimer {
    pub fn start(phase: &'static str) -> Self {
        Self {
            phase,
            start: Instant::now(),
            statements_at_start: SQL_STATEMENTS.with(|c| c.get()),
            slow_at_start: SLOW_STATEMENTS.with(|c| c.get()),
        }
    }

    pub fn finish(self) -> PhaseStats {
        let stats = PhaseStats {
            elapsed_ms: self.start.elapsed().as_millis() as u64,
            sql_statements: SQL_STATEMENTS
                .with(|c| c.get())
                .saturating_sub(self.statements_at_start),
            slow_statements: SLOW_STATEMENTS
                .with(|c| c.get())
                .saturating_sub(self.slow_at_start),
        };
        tracing::debug!(
            target: "perf",
            phase = self.phase,
            elapsed_ms = stats.elapsed_ms,
            sql_statements = stats.sql_statements,
            slow_statements = stats.slow_statements,
            "阶段结束"
        );
        stats
    }
}
