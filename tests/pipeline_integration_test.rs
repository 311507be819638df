// ==========================================
// ETL 流水线集成测试
// ==========================================
// 测试目标: 清洗 → 维度 → 事实 全链路行为
//   单行清洗 / 多行合计 / 丢弃行隔离 / 重跑幂等 / 维度未命中
// ==========================================


use sales_dw_etl::domain::CLIENT_NAME_SENTINEL;
use sales_dw_etl::logging;
use sales_dw_etl::{EtlConfig, EtlPipeline, RawRow, SourceKind, Store};
use test_helpers::{count, create_test_db, detail_only, detail_row, raw_table, sources};

fn pipeline() -> EtlPipeline {
    EtlPipeline::new(EtlConfig::default())
}

#[test]
fn test_single_line_cleaned_and_loaded() {
    logging::init_test();
    let mut store = Store::open_in_memory().unwrap();

    let report = pipeline()
        .run_with_sources(
            &mut store,
            detail_only(vec![detail_row("T1", "S1", "2,5", "10,0", "ana", "2024-03-05")]),
        )
        .unwrap();

    let (quantity, unit_price, subtotal): (f64, f64, f64) = store
        .connection()
        .query_row(
            "SELECT cantidad, precio_unitario, subtotal FROM detalle_venta WHERE cod_bolt = 'T1'",
            [],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .unwrap();
    assert_eq!(quantity, 2.5);
    assert_eq!(unit_price, 4.0);
    assert_eq!(subtotal, 10.0);

    let employee: String = store
        .connection()
        .query_row("SELECT nombre FROM empleado", [], |r| r.get(0))
        .unwrap();
    assert_eq!(employee, "ANA");

    let (fecha, fecha_venta): (String, String) = store
        .connection()
        .query_row(
            "SELECT t.fecha, v.fecha_venta FROM ventas v JOIN tiempo t ON t.cod_time = v.cod_time",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .unwrap();
    assert_eq!(fecha, "2024-03-05");
    assert_eq!(fecha_venta, "2024-03-05 00:00:00");

    let cleaning = report.stage("2.3").unwrap();
    assert_eq!((cleaning.processed, cleaning.valid, cleaning.discarded), (1, 1, 0));
}

#[test]
fn test_header_total_is_sum_of_subtotals() {
    let mut store = Store::open_in_memory().unwrap();

    pipeline()
        .run_with_sources(
            &mut store,
            detail_only(vec![
                detail_row("T2", "S1", "1", "5.00", "luis", "2024-03-05"),
                detail_row("T2", "S2", "3", "7.50", "luis", "2024-03-05"),
            ]),
        )
        .unwrap();

    assert_eq!(count(&store, "ventas"), 1);
    let total: f64 = store
        .connection()
        .query_row("SELECT total FROM ventas WHERE cod_bolt = 'T2'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(total, 12.5);
    assert_eq!(count(&store, "detalle_venta"), 2);
}

#[test]
fn test_dropped_line_does_not_affect_other_tickets() {
    let mut store = Store::open_in_memory().unwrap();

    let report = pipeline()
        .run_with_sources(
            &mut store,
            detail_only(vec![
                detail_row("T2", "S1", "1", "5.00", "luis", "2024-03-05"),
                detail_row("T2", "S2", "3", "7.50", "luis", "2024-03-05"),
                detail_row("T3", "", "1", "100", "luis", "2024-03-05"),
                detail_row("T4", "S1", "0", "9", "luis", "2024-03-05"),
                detail_row("", "S1", "1", "9", "luis", "2024-03-05"),
            ]),
        )
        .unwrap();

    let cleaning = report.stage("2.3").unwrap();
    assert_eq!((cleaning.processed, cleaning.valid, cleaning.discarded), (5, 2, 3));

    assert_eq!(count(&store, "ventas"), 1);
    assert_eq!(count(&store, "detalle_venta"), 2);
    let other: i64 = store
        .connection()
        .query_row(
            "SELECT COUNT(*) FROM detalle_venta WHERE cod_bolt IN ('T3', 'T4')",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(other, 0);

    let total: f64 = store
        .connection()
        .query_row("SELECT total FROM ventas WHERE cod_bolt = 'T2'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(total, 12.5);
}

#[test]
fn test_rerun_keeps_dimensions_and_duplicates_lines() {
    let (_dir, db_path) = create_test_db().unwrap();
    let input = || {
        detail_only(vec![
            detail_row("T1", "S1", "1", "5", "ana", "2024-03-05"),
            detail_row("T2", "S2", "2", "8", "luis", "06/03/2024"),
        ])
    };

    let stable = [
        "marca",
        "categoria",
        "producto",
        "cliente",
        "empleado",
        "tiempo",
        "ventas",
    ];

    let first: Vec<i64> = {
        let mut store = Store::open(&db_path).unwrap();
        pipeline().run_with_sources(&mut store, input()).unwrap();
        assert_eq!(count(&store, "detalle_venta"), 2);
        stable.iter().map(|t| count(&store, t)).collect()
    };

    let mut store = Store::open(&db_path).unwrap();
    let report = pipeline().run_with_sources(&mut store, input()).unwrap();
    let second: Vec<i64> = stable.iter().map(|t| count(&store, t)).collect();

    assert_eq!(first, second);
    assert_eq!(count(&store, "tiempo"), 2);
    assert_eq!(count(&store, "detalle_venta"), 4);
    assert_eq!(count(&store, "staging.raw_detalle_venta"), 2);

    // 已存在的 ticket 仍计为已装载
    let headers = report.stage("4.1").unwrap();
    assert_eq!((headers.processed, headers.valid), (2, 2));
}

#[test]
fn test_header_without_employee_is_discarded() {
    let mut store = Store::open_in_memory().unwrap();

    let report = pipeline()
        .run_with_sources(
            &mut store,
            detail_only(vec![
                detail_row("T1", "S1", "1", "5", "ana", "2024-03-05"),
                detail_row("T9", "S1", "1", "5", "   ", "2024-03-05"),
                detail_row("T8", "S1", "1", "5", "ana", "no es fecha"),
            ]),
        )
        .unwrap();

    let headers = report.stage("4.1").unwrap();
    assert_eq!((headers.processed, headers.valid, headers.discarded), (3, 1, 2));

    let loaded: Vec<String> = {
        let conn = store.connection();
        let mut stmt = conn.prepare("SELECT cod_bolt FROM ventas ORDER BY cod_bolt").unwrap();
        let rows = stmt.query_map([], |r| r.get(0)).unwrap();
        rows.map(|r| r.unwrap()).collect()
    };
    assert_eq!(loaded, vec!["T1".to_string()]);

    // 明细不依赖单头
    assert_eq!(count(&store, "detalle_venta"), 3);
}

#[test]
fn test_client_display_name_fallbacks() {
    let mut store = Store::open_in_memory().unwrap();
    let clientes = raw_table(
        SourceKind::Clientes,
        &[
            &[("Numero de documento", "001"), ("Nombres", "ana"), ("Apellidos", "perez")],
            &[("Numero de documento", "002"), ("Razon Social.", "comercial sac")],
            &[("Numero de documento", "003")],
            &[("Nombres", "sin documento")],
        ],
    );

    let report = pipeline()
        .run_with_sources(
            &mut store,
            sources(raw_table(SourceKind::Productos, &[]), clientes, raw_table(SourceKind::Detalle, &[])),
        )
        .unwrap();

    let names: Vec<(String, String)> = {
        let conn = store.connection();
        let mut stmt = conn
            .prepare("SELECT doc_cliente, nombre FROM cliente ORDER BY doc_cliente")
            .unwrap();
        let rows = stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?))).unwrap();
        rows.map(|r| r.unwrap()).collect()
    };
    assert_eq!(
        names,
        vec![
            ("001".to_string(), "ANA".to_string()),
            ("002".to_string(), "COMERCIAL SAC".to_string()),
            ("003".to_string(), CLIENT_NAME_SENTINEL.to_string()),
        ]
    );
    assert_eq!(report.stage("2.2").unwrap().discarded, 1);
}

#[test]
fn test_product_and_client_take_latest_values() {
    let (_dir, db_path) = create_test_db().unwrap();
    let run = |product_name: &str, client_name: &str| {
        let mut row: RawRow = detail_row("T1", "S1", "1", "5", "ana", "2024-03-05");
        row.insert("Nombre", product_name.into());
        let clientes = raw_table(
            SourceKind::Clientes,
            &[&[("Numero de documento", "001"), ("Nombres", client_name)]],
        );
        let mut store = Store::open(&db_path).unwrap();
        pipeline()
            .run_with_sources(
                &mut store,
                sources(raw_table(SourceKind::Productos, &[]), clientes, test_helpers::detail_table(vec![row])),
            )
            .unwrap();
        store
    };

    run("cola", "ana");
    let store = run("cola zero", "ana maria");

    let product: String = store
        .connection()
        .query_row("SELECT nombre FROM producto WHERE cod_producto = 'S1'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(product, "COLA ZERO");

    let client: String = store
        .connection()
        .query_row("SELECT nombre FROM cliente WHERE doc_cliente = '001'", [], |r| r.get(0))
        .unwrap();
    assert_eq!(client, "ANA MARIA");
    assert_eq!(count(&store, "producto"), 1);
    assert_eq!(count(&store, "cliente"), 1);
    assert_eq!(count(&store, "marca"), 1);
}
