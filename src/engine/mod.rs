// ==========================================
// 销售数据仓库 ETL - 引擎层
// ==========================================
// 职责: 装载规则与阶段编排
// 红线: Engine 不拼 SQL, 丢弃必须计入运行报告
// ==========================================

pub mod dimension_loader;
pub mod error;
pub mod fact_loader;
pub mod orchestrator;
pub mod run_reporter;

// 重导出核心引擎
pub use dimension_loader::{DimensionLoadSummary, DimensionLoader};
pub use error::{EtlError, EtlResult};
pub use fact_loader::{FactLoadSummary, FactLoader};
pub use orchestrator::EtlPipeline;
pub use run_reporter::{RunReport, RunReporter, StageRecord, TableCount};
