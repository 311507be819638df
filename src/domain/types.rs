// ==========================================
// 销售数据仓库 ETL - 领域类型定义
// ==========================================
// 职责: 数据源类型 / 单元格取值
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 数据源 (Source Kind)
// ==========================================
// 四个 Excel 导出, 每个对应一张 staging 原始表
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Productos,
    Ventas,
    Clientes,
    Detalle,
}

impl SourceKind {
    /// 抽取顺序
    pub const ALL: [SourceKind; 4] = [
        SourceKind::Productos,
        SourceKind::Ventas,
        SourceKind::Clientes,
        SourceKind::Detalle,
    ];

    /// staging 表名（不含 schema 前缀）
    pub fn staging_table(&self) -> &'static str {
        match self {
            SourceKind::Productos => "raw_productos",
            SourceKind::Ventas => "raw_ventas",
            SourceKind::Clientes => "raw_clientes",
            SourceKind::Detalle => "raw_detalle_venta",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Productos => write!(f, "productos"),
            SourceKind::Ventas => write!(f, "ventas"),
            SourceKind::Clientes => write!(f, "clientes"),
            SourceKind::Detalle => write!(f, "detalle"),
        }
    }
}

// ==========================================
// 单元格取值 (Cell Value)
// ==========================================
// 保留源文件中的原生类型, 不做任何校验
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// 空单元格或纯空白文本
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 写入 staging 时的文本表示（空值为 NULL）
    pub fn to_staging_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::DateTime(dt) => Some(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

/// 数值转文本: 整数值不带小数部分（12345678.0 → "12345678"）
pub fn format_number(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}
