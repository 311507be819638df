// ==========================================
// 销售数据仓库 ETL - 流水线错误类型
// ==========================================
// 说明: 仅系统性失败（源文件不可读 / 存储不可用 / 配置非法）会走到这里
//       行级与跨阶段失败只计入运行报告
// ==========================================

use crate::config::ConfigError;
use crate::importer::ImportError;
use crate::repository::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("抽取失败: {0}")]
    Import(#[from] ImportError),

    #[error("存储失败: {0}")]
    Repository(#[from] RepositoryError),

    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("运行报告写入失败: {0}")]
    Report(#[from] std::io::Error),
}

impl From<rusqlite::Error> for EtlError {
    fn from(err: rusqlite::Error) -> Self {
        EtlError::Repository(RepositoryError::from(err))
    }
}

pub type EtlResult<T> = Result<T, EtlError>;
