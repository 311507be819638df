// ==========================================
// 销售数据仓库 ETL - 主入口
// ==========================================
// 用法: sales-dw-etl [--config FILE]
// 流程: 抽取 → 清洗 → 维度 → 事实 → 汇总
// ==========================================

use anyhow::Context;
use sales_dw_etl::config::{config_path_from_args, EtlConfig};
use sales_dw_etl::{logging, EtlPipeline, Store};

fn main() -> anyhow::Result<()> {
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("销售数据仓库 ETL");
    tracing::info!("系统版本: {}", sales_dw_etl::VERSION);
    tracing::info!("==================================================");

    let config_path = config_path_from_args(std::env::args().skip(1))?;
    let config = EtlConfig::resolve(config_path.as_deref()).context("无法加载配置")?;

    let db_path = config.database_path();
    tracing::info!("使用数据库: {}", db_path);

    let mut store = Store::open(&db_path).with_context(|| format!("无法打开数据库: {}", db_path))?;
    let report = EtlPipeline::new(config)
        .run(&mut store)
        .context("ETL 运行失败")?;

    let discarded: usize = report.stages.iter().map(|s| s.discarded).sum();
    tracing::info!(
        run_id = %report.run_id,
        stages = report.stages.len(),
        discarded,
        "运行结束"
    );
    Ok(())
}
