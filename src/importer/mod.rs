// ==========================================
// 销售数据仓库 ETL - 导入层
// ==========================================
// 职责: 源文件抽取 + 字段级清洗
// 支持: Excel, CSV
// ==========================================

pub mod data_cleaner;
pub mod error;
pub mod extractor;
pub mod field_mapper;
pub mod file_parser;

// 重导出核心类型
pub use data_cleaner::DataCleaner;
pub use error::{ImportError, ImportResult};
pub use extractor::Extractor;
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, FileParser, UniversalFileParser};
