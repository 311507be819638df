// ==========================================
// 销售数据仓库 ETL - 存储句柄
// ==========================================
// 职责: 持有唯一连接; 每个装载阶段开启一个事务
// 生命周期: 运行开始时打开, 运行结束时 Drop 释放
// ==========================================

use crate::db::{
    attach_staging, open_sqlite_connection, quote_ident, staging_db_path, IN_MEMORY,
    STAGING_SCHEMA,
};
use crate::domain::types::SourceKind;
use crate::perf::{install_sql_profiling, SqlProfiling};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::schema::{ensure_schema, ANALYTICS_TABLES};
use rusqlite::{Connection, Transaction};
use tracing::info;

pub struct Store {
    conn: Connection,
    db_path: String,
}

impl Store {
    /// 打开数据库文件（staging 库挂载在同目录下）
    pub fn open(db_path: &str) -> RepositoryResult<Self> {
        let mut conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        attach_staging(&conn, &staging_db_path(db_path))
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        install_sql_profiling(&mut conn, SqlProfiling::from_env());
        ensure_schema(&conn)?;

        info!(db_path = %db_path, "存储已打开");
        Ok(Self {
            conn,
            db_path: db_path.to_string(),
        })
    }

    /// 内存库（测试 / 演练）
    pub fn open_in_memory() -> RepositoryResult<Self> {
        Self::open(IN_MEMORY)
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// 开启阶段事务; 未 commit 即 Drop 时回滚
    pub fn phase(&mut self) -> RepositoryResult<Transaction<'_>> {
        self.conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
    }

    /// 只读访问（汇总统计 / 测试断言）
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// 统计单表行数; 表不存在时返回 None
    pub fn count_rows(&self, qualified_table: &str) -> RepositoryResult<Option<i64>> {
        let (schema, table) = match qualified_table.split_once('.') {
            Some((s, t)) => (s, t),
            None => ("main", qualified_table),
        };

        let exists: i64 = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {}.sqlite_master WHERE type='table' AND name=?1",
                quote_ident(schema)
            ),
            [table],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Ok(None);
        }

        let n: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}.{}", quote_ident(schema), quote_ident(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(Some(n))
    }

    /// 全部 staging + analytics 表的行数（按报告顺序）
    pub fn table_counts(&self) -> RepositoryResult<Vec<(String, Option<i64>)>> {
        let mut counts = Vec::new();
        for kind in SourceKind::ALL {
            let name = format!("{}.{}", STAGING_SCHEMA, kind.staging_table());
            let n = self.count_rows(&name)?;
            counts.push((name, n));
        }
        for table in ANALYTICS_TABLES {
            let n = self.count_rows(table)?;
            counts.push((table.to_string(), n));
        }
        Ok(counts)
    }
}
