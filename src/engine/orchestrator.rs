// ==========================================
// 销售数据仓库 ETL - 流水线编排器
// ==========================================
// 用途: 协调各阶段的执行顺序
//   1 抽取 → staging
//   2 清洗（商品 / 客户 / 明细）
//   3 维度装载
//   4 事实装载
//   5 汇总
// 说明: 严格串行; 阶段之间不共享事务, 后续阶段失败不回滚已提交阶段
// ==========================================

use crate::config::EtlConfig;
use crate::domain::raw::RawSources;
use crate::domain::sales::CleanedData;
use crate::domain::types::SourceKind;
use crate::engine::dimension_loader::DimensionLoader;
use crate::engine::error::EtlResult;
use crate::engine::fact_loader::FactLoader;
use crate::engine::run_reporter::{RunReport, RunReporter};
use crate::importer::{DataCleaner, Extractor, FieldMapper};
use crate::perf::PhaseTimer;
use crate::repository::{StagingRepository, Store};
use tracing::info;

pub struct EtlPipeline {
    config: EtlConfig,
    mapper: FieldMapper,
    dimensions: DimensionLoader,
    facts: FactLoader,
}

impl EtlPipeline {
    pub fn new(config: EtlConfig) -> Self {
        let mapper = FieldMapper::new(
            config.columns.clone(),
            DataCleaner::new(config.date_day_first),
        );
        Self {
            config,
            mapper,
            dimensions: DimensionLoader::new(),
            facts: FactLoader::new(),
        }
    }

    pub fn config(&self) -> &EtlConfig {
        &self.config
    }

    /// 完整运行: 读取配置中的四个源文件
    pub fn run(&self, store: &mut Store) -> EtlResult<RunReport> {
        let sources = Extractor::new(self.config.sources.clone()).extract_all()?;
        self.run_with_sources(store, sources)
    }

    /// 以已读入的原始数据集运行（源文件读取之后的全部阶段）
    pub fn run_with_sources(&self, store: &mut Store, sources: RawSources) -> EtlResult<RunReport> {
        let mut reporter = RunReporter::new();
        info!(run_id = %reporter.run_id(), db_path = %store.db_path(), "ETL 开始");

        self.stage_raw(store, &sources, &mut reporter)?;
        let cleaned = self.clean(&sources, &mut reporter);
        self.dimensions.load(store, &cleaned, &mut reporter)?;
        self.facts.load(store, &cleaned.sale_lines, &mut reporter)?;

        reporter.summary(store.table_counts()?);
        let report = reporter.finish();

        if let Some(path) = &self.config.report_path {
            report.write_json(path)?;
            info!(report_path = %path.display(), "运行报告已写入");
        }

        info!(run_id = %report.run_id, "ETL 完成");
        Ok(report)
    }

    /// 阶段 1: 四个原始数据集整表替换进 staging
    fn stage_raw(
        &self,
        store: &mut Store,
        sources: &RawSources,
        reporter: &mut RunReporter,
    ) -> EtlResult<()> {
        let tx = store.phase()?;
        let repo = StagingRepository::new(&tx);

        let mut written = Vec::with_capacity(SourceKind::ALL.len());
        for kind in SourceKind::ALL {
            let timer = PhaseTimer::start(kind.staging_table());
            let raw = sources.get(kind);
            let rows = repo.replace_table(raw)?;
            written.push((kind, raw.len(), rows, timer.finish()));
        }
        tx.commit()?;

        // 四张表同一事务, 提交后才记录
        for (idx, (kind, processed, rows, perf)) in written.into_iter().enumerate() {
            reporter.record(
                &format!("1.{}", idx + 1),
                &format!("Extraccion {} → staging.{}", kind, kind.staging_table()),
                processed,
                rows,
                perf,
            );
        }
        Ok(())
    }

    /// 阶段 2: 清洗; 行级问题只计数, 不返回错误
    fn clean(&self, sources: &RawSources, reporter: &mut RunReporter) -> CleanedData {
        let timer = PhaseTimer::start("2.1");
        let (products, counts) = self.mapper.clean_products(&sources.productos);
        reporter.record(
            "2.1",
            "Limpieza productos",
            counts.processed,
            counts.valid,
            timer.finish(),
        );

        let timer = PhaseTimer::start("2.2");
        let (clients, counts) = self.mapper.clean_clients(&sources.clientes);
        reporter.record(
            "2.2",
            "Limpieza clientes",
            counts.processed,
            counts.valid,
            timer.finish(),
        );

        let timer = PhaseTimer::start("2.3");
        let (sale_lines, counts) = self.mapper.clean_sale_lines(&sources.detalle);
        reporter.record(
            "2.3",
            "Limpieza detalle de venta",
            counts.processed,
            counts.valid,
            timer.finish(),
        );

        CleanedData {
            products,
            clients,
            sale_lines,
        }
    }
}
