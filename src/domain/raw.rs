// ==========================================
// 销售数据仓库 ETL - 原始数据集
// ==========================================
// 职责: 抽取阶段的内存表示（列名 → 单元格 + 装载时间戳）
// 说明: 只存在于 staging, 不做任何校验
// ==========================================

use crate::domain::types::{CellValue, SourceKind};
use chrono::NaiveDateTime;
use std::collections::HashMap;

static EMPTY_CELL: CellValue = CellValue::Empty;

/// 原始行: 列名 → 单元格
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: HashMap<String, CellValue>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: CellValue) {
        self.cells.insert(column.into(), value);
    }

    /// 读取单元格; 列不存在时视为空
    pub fn get(&self, column: &str) -> &CellValue {
        self.cells.get(column).unwrap_or(&EMPTY_CELL)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(CellValue::is_blank)
    }

    /// 以 (列名, 值) 对构建, 便于测试与内存数据源
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<CellValue>,
    {
        let mut row = Self::new();
        for (k, v) in pairs {
            row.insert(k, v.into());
        }
        row
    }
}

/// 原始数据集（一个源文件 / 一张 staging 表）
#[derive(Debug, Clone)]
pub struct RawTable {
    pub source: SourceKind,
    /// 源文件中的列顺序
    pub columns: Vec<String>,
    pub rows: Vec<RawRow>,
    /// 装载时间戳（写入 staging 的 fecha_carga 列）
    pub loaded_at: NaiveDateTime,
}

impl RawTable {
    pub fn new(source: SourceKind, columns: Vec<String>, loaded_at: NaiveDateTime) -> Self {
        Self {
            source,
            columns,
            rows: Vec::new(),
            loaded_at,
        }
    }

    /// 追加一行; 未出现过的列按出现顺序补到列表末尾
    pub fn push_row(&mut self, row: RawRow) {
        for key in row.cells.keys() {
            if !self.columns.iter().any(|c| c == key) {
                self.columns.push(key.clone());
            }
        }
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 一次运行的四个原始数据集
#[derive(Debug, Clone)]
pub struct RawSources {
    pub productos: RawTable,
    pub ventas: RawTable,
    pub clientes: RawTable,
    pub detalle: RawTable,
}

impl RawSources {
    pub fn get(&self, kind: SourceKind) -> &RawTable {
        match kind {
            SourceKind::Productos => &self.productos,
            SourceKind::Ventas => &self.ventas,
            SourceKind::Clientes => &self.clientes,
            SourceKind::Detalle => &self.detalle,
        }
    }
}
