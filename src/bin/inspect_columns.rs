// Small dev utility: print the column layout of every configured source export.
//
// Usage:
//   cargo run --bin inspect_columns -- [--config FILE]
//
// Reads the files only; nothing is written to the database.

use anyhow::Context;
use sales_dw_etl::config::{config_path_from_args, EtlConfig};
use sales_dw_etl::importer::Extractor;
use sales_dw_etl::SourceKind;

fn main() -> anyhow::Result<()> {
    sales_dw_etl::logging::init();

    let config_path = config_path_from_args(std::env::args().skip(1))?;
    let config = EtlConfig::resolve(config_path.as_deref()).context("无法加载配置")?;
    let extractor = Extractor::new(config.sources.clone());

    for kind in SourceKind::ALL {
        let path = config.sources.path_for(kind);
        let table = extractor
            .extract_one(kind)
            .with_context(|| format!("无法读取 {}", path.display()))?;

        println!("== {} ({})", kind, path.display());
        for (idx, column) in table.columns.iter().enumerate() {
            println!("  {:>3}. {}", idx + 1, column);
        }
        println!("  columns={} rows={}", table.columns.len(), table.len());
        println!();
    }

    Ok(())
}
