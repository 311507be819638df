// ==========================================
// 销售数据仓库 ETL - 运行报告
// ==========================================
// 职责: 记录阶段进度（处理数 / 有效数 / 丢弃数 / 耗时）+ 结束时表行数汇总
// 说明: 纯观测, 不影响控制流
// ==========================================

use crate::perf::PhaseStats;
use chrono::{Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// 单个阶段的进度记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    pub stage: String,
    pub description: String,
    pub processed: usize,
    pub valid: usize,
    pub discarded: usize,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub perf: PhaseStats,
}

/// 表行数; 表不存在时为 None
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCount {
    pub table: String,
    pub rows: Option<i64>,
}

/// 机器可读的运行报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: NaiveDateTime,
    pub finished_at: Option<NaiveDateTime>,
    pub stages: Vec<StageRecord>,
    pub table_counts: Vec<TableCount>,
}

impl RunReport {
    pub fn stage(&self, stage: &str) -> Option<&StageRecord> {
        self.stages.iter().find(|s| s.stage == stage)
    }

    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }
}

pub struct RunReporter {
    report: RunReport,
}

impl Default for RunReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReporter {
    pub fn new() -> Self {
        Self {
            report: RunReport {
                run_id: Uuid::new_v4().to_string(),
                started_at: Local::now().naive_local(),
                finished_at: None,
                stages: Vec::new(),
                table_counts: Vec::new(),
            },
        }
    }

    pub fn run_id(&self) -> &str {
        &self.report.run_id
    }

    /// 记录阶段进度; processed 为 0 时丢弃数记为 0
    pub fn record(
        &mut self,
        stage: &str,
        description: &str,
        processed: usize,
        valid: usize,
        perf: PhaseStats,
    ) {
        let discarded = if processed > 0 {
            processed.saturating_sub(valid)
        } else {
            0
        };
        let record = StageRecord {
            stage: stage.to_string(),
            description: description.to_string(),
            processed,
            valid,
            discarded,
            timestamp: Local::now().naive_local(),
            perf,
        };

        info!(
            target: "etl_progress",
            run_id = %self.report.run_id,
            stage = %record.stage,
            processed,
            valid,
            discarded,
            elapsed_ms = perf.elapsed_ms,
            sql_statements = perf.sql_statements,
            timestamp = %record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            "{}",
            record.description
        );

        self.report.stages.push(record);
    }

    pub fn stages(&self) -> &[StageRecord] {
        &self.report.stages
    }

    /// 结束汇总: 输出对齐的表行数表格
    pub fn summary(&mut self, counts: Vec<(String, Option<i64>)>) {
        let width = counts
            .iter()
            .map(|(t, _)| t.chars().count())
            .max()
            .unwrap_or(0)
            .max("tabla".len());

        let mut lines = vec![
            format!("{:<width$} | {:>10}", "tabla", "filas", width = width),
            "-".repeat(width + 13),
        ];
        for (table, rows) in &counts {
            let rows_text = match rows {
                Some(n) => n.to_string(),
                None => "N/A".to_string(),
            };
            lines.push(format!("{:<width$} | {:>10}", table, rows_text, width = width));
        }

        info!(target: "etl_summary", run_id = %self.report.run_id, "运行汇总（表行数）");
        for line in &lines {
            info!(target: "etl_summary", "{}", line);
        }

        self.report.table_counts = counts
            .into_iter()
            .map(|(table, rows)| TableCount { table, rows })
            .collect();
    }

    /// 结束运行并取出报告
    pub fn finish(mut self) -> RunReport {
        self.report.finished_at = Some(Local::now().naive_local());
        self.report
    }
}
