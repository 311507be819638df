// ==========================================
// 销售数据仓库 ETL - 文件解析器实现
// ==========================================
// 职责: 源文件 → RawTable（保留单元格原生类型）
// 支持: Excel (.xlsx/.xls) / CSV (.csv)
// ==========================================

use crate::domain::raw::{RawRow, RawTable};
use crate::domain::types::{CellValue, SourceKind};
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::NaiveDateTime;
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始数据集
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - source: 数据源类型
    /// - loaded_at: 装载时间戳
    fn parse_to_raw_table(
        &self,
        file_path: &Path,
        source: SourceKind,
        loaded_at: NaiveDateTime,
    ) -> ImportResult<RawTable>;
}

/// 表头规范化; 空表头按位置命名
fn header_name(raw: &str, idx: usize) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        format!("Unnamed: {}", idx)
    } else {
        trimmed.to_string()
    }
}

/// 重复表头加序号后缀（Nombre, Nombre.1, ...）
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(headers.len());
    for header in headers {
        let mut candidate = header.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", header, n);
            n += 1;
        }
        seen.push(candidate);
    }
    seen
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_table(
        &self,
        file_path: &Path,
        source: SourceKind,
        loaded_at: NaiveDateTime,
    ) -> ImportResult<RawTable> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers = dedupe_headers(
            reader
                .headers()?
                .iter()
                .enumerate()
                .map(|(idx, h)| header_name(h, idx))
                .collect(),
        );

        let mut table = RawTable::new(source, headers.clone(), loaded_at);
        for result in reader.records() {
            let record = result?;
            let mut row = RawRow::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row.insert(header.clone(), CellValue::from(value));
                }
            }

            // 跳过完全空白的行
            if row.is_blank() {
                continue;
            }

            table.push_row(row);
        }

        Ok(table)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// calamine 单元格 → CellValue
    fn convert_cell(cell: &Data) -> CellValue {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::from(s.as_str()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
                Some(dt) => CellValue::DateTime(dt),
                None => CellValue::from(cell.to_string().as_str()),
            },
            Data::Error(_) => CellValue::Empty,
            _ => CellValue::from(cell.to_string().as_str()),
        }
    }
}

impl FileParser for ExcelParser {
    fn parse_to_raw_table(
        &self,
        file_path: &Path,
        source: SourceKind,
        loaded_at: NaiveDateTime,
    ) -> ImportResult<RawTable> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        let mut rows = range.rows();
        let header_row = rows
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无数据行".to_string()))?;

        let headers = dedupe_headers(
            header_row
                .iter()
                .enumerate()
                .map(|(idx, cell)| header_name(&cell.to_string(), idx))
                .collect(),
        );

        let mut table = RawTable::new(source, headers.clone(), loaded_at);
        for data_row in rows {
            let mut row = RawRow::new();

            for (col_idx, cell) in data_row.iter().enumerate() {
                if let Some(header) = headers.get(col_idx) {
                    row.insert(header.clone(), Self::convert_cell(cell));
                }
            }

            if row.is_blank() {
                continue;
            }

            table.push_row(row);
        }

        Ok(table)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_to_raw_table(
        &self,
        file_path: &Path,
        source: SourceKind,
        loaded_at: NaiveDateTime,
    ) -> ImportResult<RawTable> {
        match extension_of(file_path).as_str() {
            "csv" => CsvParser.parse_to_raw_table(file_path, source, loaded_at),
            "xlsx" | "xls" => ExcelParser.parse_to_raw_table(file_path, source, loaded_at),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}
