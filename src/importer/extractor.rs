// ==========================================
// 销售数据仓库 ETL - 抽取器
// ==========================================
// 职责: 读取四个源文件为 RawSources, 每个数据集打装载时间戳
// 红线: 不做任何校验; 文件不可读即整体失败
// ==========================================

use crate::config::SourceFiles;
use crate::domain::raw::{RawSources, RawTable};
use crate::domain::types::SourceKind;
use crate::importer::error::ImportResult;
use crate::importer::file_parser::{FileParser, UniversalFileParser};
use chrono::Local;
use tracing::info;

pub struct Extractor {
    parser: Box<dyn FileParser>,
    sources: SourceFiles,
}

impl Extractor {
    pub fn new(sources: SourceFiles) -> Self {
        Self::with_parser(sources, Box::new(UniversalFileParser))
    }

    pub fn with_parser(sources: SourceFiles, parser: Box<dyn FileParser>) -> Self {
        Self { parser, sources }
    }

    /// 读取单个数据源
    pub fn extract_one(&self, kind: SourceKind) -> ImportResult<RawTable> {
        let path = self.sources.path_for(kind);
        let loaded_at = Local::now().naive_local();
        let table = self.parser.parse_to_raw_table(path, kind, loaded_at)?;
        info!(
            source = %kind,
            file_path = %path.display(),
            rows = table.len(),
            columns = table.columns.len(),
            "源文件读取完成"
        );
        Ok(table)
    }

    /// 读取全部四个数据源
    pub fn extract_all(&self) -> ImportResult<RawSources> {
        Ok(RawSources {
            productos: self.extract_one(SourceKind::Productos)?,
            ventas: self.extract_one(SourceKind::Ventas)?,
            clientes: self.extract_one(SourceKind::Clientes)?,
            detalle: self.extract_one(SourceKind::Detalle)?,
        })
    }
}
