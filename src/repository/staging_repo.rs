// ==========================================
// 销售数据仓库 ETL - staging 仓储
// ==========================================
// 职责: 原始数据集整表替换（DROP + CREATE + INSERT）
// 表结构: 源文件列（TEXT）+ fecha_carga
// 红线: Repository 不含业务规则
// ==========================================

use crate::db::{quote_ident, STAGING_SCHEMA};
use crate::domain::raw::RawTable;
use crate::repository::error::RepositoryResult;
use rusqlite::{params_from_iter, Connection};
use std::collections::HashSet;

/// 装载时间戳列名
pub const LOAD_TIMESTAMP_COLUMN: &str = "fecha_carga";

pub struct StagingRepository<'a> {
    conn: &'a Connection,
}

impl<'a> StagingRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// 整表替换; 返回写入行数
    pub fn replace_table(&self, raw: &RawTable) -> RepositoryResult<usize> {
        let table = format!(
            "{}.{}",
            quote_ident(STAGING_SCHEMA),
            quote_ident(raw.source.staging_table())
        );

        let columns = staging_columns(&raw.columns);

        let mut column_defs: Vec<String> = columns
            .iter()
            .map(|(_, name)| format!("{} TEXT", quote_ident(name)))
            .collect();
        column_defs.push(format!("{} TEXT NOT NULL", quote_ident(LOAD_TIMESTAMP_COLUMN)));

        self.conn
            .execute_batch(&format!("DROP TABLE IF EXISTS {};", table))?;
        self.conn.execute_batch(&format!(
            "CREATE TABLE {} ({});",
            table,
            column_defs.join(", ")
        ))?;

        let mut column_names: Vec<String> =
            columns.iter().map(|(_, name)| quote_ident(name)).collect();
        column_names.push(quote_ident(LOAD_TIMESTAMP_COLUMN));
        let placeholders: Vec<String> = (1..=column_names.len()).map(|i| format!("?{}", i)).collect();

        let mut stmt = self.conn.prepare(&format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            column_names.join(", "),
            placeholders.join(", ")
        ))?;

        let loaded_at = raw.loaded_at.format("%Y-%m-%d %H:%M:%S").to_string();
        let mut count = 0;
        for row in &raw.rows {
            let mut values: Vec<Option<String>> = columns
                .iter()
                .map(|(source, _)| row.get(source).to_staging_text())
                .collect();
            values.push(Some(loaded_at.clone()));
            stmt.execute(params_from_iter(values.iter()))?;
            count += 1;
        }

        Ok(count)
    }
}

/// 源列名 → staging 列名
///
/// SQLite 列名不区分 ASCII 大小写: 仅大小写不同的重名列追加 `.1`、`.2` 后缀;
/// 源文件自带的 fecha_carga 列让位给装载时间戳
pub(crate) fn staging_columns(source_columns: &[String]) -> Vec<(&str, String)> {
    let mut used: HashSet<String> = HashSet::new();
    used.insert(LOAD_TIMESTAMP_COLUMN.to_ascii_lowercase());

    let mut columns = Vec::with_capacity(source_columns.len());
    for source in source_columns {
        if source.eq_ignore_ascii_case(LOAD_TIMESTAMP_COLUMN) {
            continue;
        }
        let mut name = source.clone();
        let mut suffix = 1;
        while !used.insert(name.to_ascii_lowercase()) {
            name = format!("{}.{}", source, suffix);
            suffix += 1;
        }
        columns.push((source.as_str(), name));
    }
    columns
}
