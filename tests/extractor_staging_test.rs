// ==========================================
// 抽取 → staging 集成测试
// ==========================================
// 测试目标: CSV 源文件经 Extractor 读入, 整表替换进 staging, 并继续装载 analytics
// ==========================================


use sales_dw_etl::config::SourceFiles;
use sales_dw_etl::engine::EtlError;
use sales_dw_etl::importer::{Extractor, ImportError};
use sales_dw_etl::{EtlConfig, EtlPipeline, SourceKind, Store};
use std::path::Path;
use test_helpers::{count, create_test_db, write_csv};

fn csv_sources(dir: &Path) -> SourceFiles {
    SourceFiles {
        productos: write_csv(
            dir,
            "productos.csv",
            &[
                "Código,Nombre,Marca,Categorias,Unidad,Precio",
                "s1,Cola,Acme,Bebidas,UND,3.5",
                "s2,Agua,Acme,Bebidas,UND,1.2",
            ],
        ),
        ventas: write_csv(
            dir,
            "ventas.csv",
            &["#-DOC,Fecha,Total", "T1,05/03/2024,12.5"],
        ),
        clientes: write_csv(
            dir,
            "clientes.csv",
            &[
                "Numero de documento,Nombres,Apellidos,Razon Social.",
                "00123,ana,perez,",
                ",,,",
            ],
        ),
        detalle: write_csv(
            dir,
            "detalle.csv",
            &[
                "#-DOC,Codigo SKU,Nombre,Unidad,Cantidad,Total,Marca,Categoría,Empleado Nombre,Cliente Nombre,Cliente Doc.,Fecha",
                "T1,S1,,und,\"2,5\",\"10,0\",acme,bebidas,ana,ana,00123,05/03/2024",
                "T1,S2,agua,und,1,2.5,acme,bebidas,ana,ana,00123,05/03/2024",
            ],
        ),
    }
}

#[test]
fn test_csv_sources_flow_into_staging_and_analytics() {
    let dir = tempfile::tempdir().unwrap();
    let (_db_dir, db_path) = create_test_db().unwrap();
    let config = EtlConfig {
        sources: csv_sources(dir.path()),
        ..EtlConfig::default()
    };

    let mut store = Store::open(&db_path).unwrap();
    let report = EtlPipeline::new(config).run(&mut store).unwrap();

    assert_eq!(count(&store, "staging.raw_productos"), 2);
    assert_eq!(count(&store, "staging.raw_ventas"), 1);
    // 完全空白的行在读取时跳过
    assert_eq!(count(&store, "staging.raw_clientes"), 1);
    assert_eq!(count(&store, "staging.raw_detalle_venta"), 2);

    let (price, loaded_at): (Option<String>, String) = store
        .connection()
        .query_row(
            "SELECT \"Precio\", fecha_carga FROM staging.raw_productos WHERE \"Código\" = 's1'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(price.as_deref(), Some("3.5"));
    assert!(!loaded_at.is_empty());

    // 明细无名称时回退到商品清单
    let name: String = store
        .connection()
        .query_row("SELECT nombre FROM producto WHERE cod_producto = 'S1'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(name, "COLA");

    let doc: String = store
        .connection()
        .query_row("SELECT doc_cliente FROM ventas WHERE cod_bolt = 'T1'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(doc, "00123");

    let total: f64 = store
        .connection()
        .query_row("SELECT total FROM ventas WHERE cod_bolt = 'T1'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(total, 12.5);

    assert_eq!(count(&store, "cliente"), 1);
    assert_eq!(report.stage("1.1").unwrap().valid, 2);
    assert_eq!(report.table_counts.len(), 12);
}

#[test]
fn test_extractor_reads_each_source() {
    let dir = tempfile::tempdir().unwrap();
    let extractor = Extractor::new(csv_sources(dir.path()));

    let productos = extractor.extract_one(SourceKind::Productos).unwrap();
    assert_eq!(productos.columns.len(), 6);
    assert_eq!(productos.len(), 2);

    let all = extractor.extract_all().unwrap();
    assert_eq!(all.get(SourceKind::Detalle).len(), 2);
}

#[test]
fn test_missing_source_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut sources = csv_sources(dir.path());
    sources.clientes = dir.path().join("no_existe.csv");
    let config = EtlConfig {
        sources,
        ..EtlConfig::default()
    };

    let mut store = Store::open_in_memory().unwrap();
    let err = EtlPipeline::new(config).run(&mut store).unwrap_err();
    assert!(matches!(err, EtlError::Import(ImportError::FileNotFound(_))));

    // 抽取失败时不写 staging
    assert_eq!(store.count_rows("staging.raw_productos").unwrap(), None);
}

#[test]
fn test_headers_differing_only_in_case_reach_staging() {
    let dir = tempfile::tempdir().unwrap();
    let mut sources = csv_sources(dir.path());
    sources.productos = write_csv(
        dir.path(),
        "productos_dup.csv",
        &[
            "Código,Nombre,NOMBRE,Marca,Categorias,Unidad,Precio",
            "s1,Cola,Cola Zero,Acme,Bebidas,UND,3.5",
        ],
    );
    let config = EtlConfig {
        sources,
        ..EtlConfig::default()
    };

    let mut store = Store::open_in_memory().unwrap();
    let report = EtlPipeline::new(config).run(&mut store).unwrap();

    assert_eq!(report.stage("1.1").unwrap().valid, 1);
    let (first, second): (String, String) = store
        .connection()
        .query_row(
            "SELECT \"Nombre\", \"NOMBRE.1\" FROM staging.raw_productos",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(first, "Cola");
    assert_eq!(second, "Cola Zero");
}
