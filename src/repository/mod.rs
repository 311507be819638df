// ==========================================
// 销售数据仓库 ETL - 数据仓储层
// ==========================================
// 职责: 提供数据访问接口, 屏蔽数据库细节
// 红线: Repository 不含业务逻辑
// 约束: 所有值使用参数化; 动态表名/列名统一 quote_ident
// ==========================================

pub mod dimension_repo;
pub mod error;
pub mod fact_repo;
pub mod schema;
pub mod staging_repo;
pub mod store;

pub use dimension_repo::{DimensionRepository, NamedDimension, CALENDAR_DATE_FORMAT};
pub use error::{RepositoryError, RepositoryResult};
pub use fact_repo::{FactRepository, SALE_TIMESTAMP_FORMAT};
pub use schema::{ensure_schema, ANALYTICS_TABLES};
pub use staging_repo::{StagingRepository, LOAD_TIMESTAMP_COLUMN};
pub use store::Store;
