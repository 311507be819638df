// ==========================================
// 销售数据仓库 ETL - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有连接的 PRAGMA 行为（外键 / busy_timeout）
// - 挂载 staging 库, 与 analytics（主库）分属两个逻辑区
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 只用于告警, 不做自动迁移
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// staging 逻辑区的 schema 名
pub const STAGING_SCHEMA: &str = "staging";

/// 内存库路径
pub const IN_MEMORY: &str = ":memory:";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：foreign_keys / busy_timeout 均需“每个连接”单独设置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// staging 库文件路径: sales.db → sales.staging.db; 内存库仍为内存库
pub fn staging_db_path(db_path: &str) -> String {
    if db_path == IN_MEMORY {
        return IN_MEMORY.to_string();
    }
    match db_path.strip_suffix(".db") {
        Some(stem) => format!("{}.staging.db", stem),
        None => format!("{}.staging", db_path),
    }
}

/// 挂载 staging 库（已挂载则跳过）
pub fn attach_staging(conn: &Connection, staging_path: &str) -> rusqlite::Result<()> {
    let attached: bool = conn
        .query_row(
            "SELECT 1 FROM pragma_database_list WHERE name = ?1",
            [STAGING_SCHEMA],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !attached {
        conn.execute(
            &format!("ATTACH DATABASE ?1 AS {}", STAGING_SCHEMA),
            [staging_path],
        )?;
    }
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// SQL 标识符加双引号（列名来自源文件表头, 可能含空格/符号）
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
