// ==========================================
// 销售数据仓库 ETL - 核心库
// ==========================================
// 技术栈: Rust + SQLite (rusqlite) + calamine/csv
// 系统定位: 批处理作业（Excel 导出 → staging → 雪花模型）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 原始数据集 / 清洗记录 / 仓库行
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 装载规则与编排
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 源文件 / 列名 / 数据库路径
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// ==========================================
// 重导出核心类型
// ==========================================

pub use config::{EtlConfig, get_default_db_path};

pub use domain::{
    CellValue, CleanedClient, CleanedData, CleanedProduct, CleanedSaleLine, RawRow, RawSources,
    RawTable, SourceKind,
};

pub use engine::{EtlError, EtlPipeline, RunReport, RunReporter};

pub use repository::Store;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "sales-dw-etl";
