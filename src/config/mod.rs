// ==========================================
// 销售数据仓库 ETL - 配置层
// ==========================================
// 职责: 运行配置加载与校验
// 存储: JSON 文件 + 环境变量
// ==========================================

pub mod etl_config;

// 重导出核心配置
pub use etl_config::{
    config_path_from_args, get_default_db_path, ClientColumns, ColumnMapping, ConfigError,
    DetailColumns, EtlConfig, ProductColumns, SourceFiles, ENV_CONFIG_PATH, ENV_DB_PATH,
};
