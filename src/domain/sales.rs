// ==========================================
// 销售数据仓库 ETL - 清洗后数据 / 仓库行
// ==========================================
// 职责: 清洗输出（内存数据集）与维度/事实表行结构
// 红线: 单据号、SKU、证件号一律作为不透明文本, 不转数值
// ==========================================

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// 无名称客户的显示名
pub const CLIENT_NAME_SENTINEL: &str = "CLIENTE SIN NOMBRE";

/// 无名称商品的显示名
pub const PRODUCT_NAME_SENTINEL: &str = "SIN NOMBRE";

// ==========================================
// 清洗后数据
// ==========================================

/// 商品清单（code / name 必填）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedProduct {
    pub code: String,
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
}

/// 客户（document_id 必填, display_name 经三级回退后必有值）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedClient {
    pub document_id: String,
    pub display_name: String,
    pub surname: Option<String>,
}

/// 销售明细行（ticket / sku 必填, quantity > 0）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanedSaleLine {
    pub ticket_id: String,
    pub sku: String,
    pub product_name: Option<String>,
    pub quantity: f64,
    pub unit: Option<String>,
    pub subtotal: f64,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub employee_name: Option<String>,
    pub client_name: Option<String>,
    pub client_document: Option<String>,
    pub sale_date: Option<NaiveDateTime>,
}

impl CleanedSaleLine {
    /// 单价 = 小计 ÷ 数量; 非有限值归零
    pub fn unit_price(&self) -> f64 {
        let price = self.subtotal / self.quantity;
        if price.is_finite() {
            price
        } else {
            0.0
        }
    }
}

/// 清洗计数（处理行数, 有效行数）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanCounts {
    pub processed: usize,
    pub valid: usize,
}

impl CleanCounts {
    pub fn discarded(&self) -> usize {
        self.processed.saturating_sub(self.valid)
    }
}

/// 一次运行的清洗结果
#[derive(Debug, Clone, Default)]
pub struct CleanedData {
    pub products: Vec<CleanedProduct>,
    pub clients: Vec<CleanedClient>,
    pub sale_lines: Vec<CleanedSaleLine>,
}

// ==========================================
// 维度行
// ==========================================

/// 商品维度（SKU 即主键）
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub code: String,
    pub name: String,
    pub brand_id: Option<i64>,
    pub category_id: Option<i64>,
}

/// 时间维度: 派生属性仅在首次插入时计算
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub quarter: u32,
    pub month_name: String,
    /// 周一 = 0
    pub weekday: u32,
    pub weekday_name: String,
}

impl CalendarDay {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            date,
            year: date.year(),
            month: date.month(),
            day: date.day(),
            quarter: (date.month() - 1) / 3 + 1,
            month_name: date.format("%B").to_string(),
            weekday: date.weekday().num_days_from_monday(),
            weekday_name: date.format("%A").to_string(),
        }
    }
}

// ==========================================
// 事实行
// ==========================================

/// 销售单头（每个 ticket 一行）
#[derive(Debug, Clone, PartialEq)]
pub struct SaleHeaderRow {
    pub ticket_id: String,
    pub total: f64,
    pub client_document: Option<String>,
    pub employee_id: i64,
    pub calendar_id: i64,
    pub sale_date: NaiveDateTime,
}

/// 销售明细事实（每个清洗后明细一行, 仅追加）
#[derive(Debug, Clone, PartialEq)]
pub struct SaleLineRow {
    pub product_code: String,
    pub ticket_id: String,
    pub unit: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
    pub subtotal: f64,
}

impl SaleLineRow {
    pub fn from_cleaned(line: &CleanedSaleLine) -> Self {
        Self {
            product_code: line.sku.clone(),
            ticket_id: line.ticket_id.clone(),
            unit: line.unit.clone(),
            quantity: round2(line.quantity),
            unit_price: round2(line.unit_price()),
            subtotal: round2(line.subtotal),
        }
    }
}

/// 保留两位小数
pub fn round2(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.is_finite() {
        rounded
    } else {
        0.0
    }
}
