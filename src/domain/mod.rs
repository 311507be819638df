// ==========================================
// 销售数据仓库 ETL - 领域模型层
// ==========================================
// 职责: 原始数据集、清洗后数据、维度/事实行
// 红线: 不含数据访问逻辑
// ==========================================

pub mod raw;
pub mod sales;
pub mod types;

// 重导出核心类型
pub use raw::{RawRow, RawSources, RawTable};
pub use sales::{
    round2, CalendarDay, CleanCounts, CleanedClient, CleanedData, CleanedProduct,
    CleanedSaleLine, ProductRow, SaleHeaderRow, SaleLineRow, CLIENT_NAME_SENTINEL,
    PRODUCT_NAME_SENTINEL,
};
pub use types::{format_number, CellValue, SourceKind};
