// ==========================================
// 销售数据仓库 ETL - analytics 建表
// ==========================================
// 职责: CREATE TABLE IF NOT EXISTS（雪花模型维度 + 事实）
// 说明: 仅建表, 不做迁移; 版本不一致只告警
// ==========================================

use crate::db::{read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Connection};
use tracing::{debug, warn};

/// analytics 表名（按装载顺序）
pub const ANALYTICS_TABLES: [&str; 8] = [
    "marca",
    "categoria",
    "producto",
    "cliente",
    "empleado",
    "tiempo",
    "ventas",
    "detalle_venta",
];

const ANALYTICS_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS marca (
    cod_marca INTEGER PRIMARY KEY AUTOINCREMENT,
    nombre TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS categoria (
    cod_cat INTEGER PRIMARY KEY AUTOINCREMENT,
    nombre TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS producto (
    cod_producto TEXT PRIMARY KEY,
    nombre TEXT NOT NULL,
    cod_marca INTEGER REFERENCES marca(cod_marca),
    cod_categoria INTEGER REFERENCES categoria(cod_cat)
);

CREATE TABLE IF NOT EXISTS cliente (
    doc_cliente TEXT PRIMARY KEY,
    nombre TEXT NOT NULL,
    apellidos TEXT
);

CREATE TABLE IF NOT EXISTS empleado (
    cod_empleado INTEGER PRIMARY KEY AUTOINCREMENT,
    nombre TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS tiempo (
    cod_time INTEGER PRIMARY KEY AUTOINCREMENT,
    fecha TEXT NOT NULL UNIQUE,
    anio INTEGER NOT NULL,
    mes INTEGER NOT NULL,
    dia INTEGER NOT NULL,
    trimestre INTEGER NOT NULL,
    nombre_mes TEXT NOT NULL,
    dia_semana INTEGER NOT NULL,
    nombre_dia_semana TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS ventas (
    cod_bolt TEXT PRIMARY KEY,
    total REAL NOT NULL,
    doc_cliente TEXT,
    doc_empleado INTEGER NOT NULL REFERENCES empleado(cod_empleado),
    cod_time INTEGER NOT NULL REFERENCES tiempo(cod_time),
    fecha_venta TEXT NOT NULL
);

-- 无自然键唯一约束: 每次运行追加
CREATE TABLE IF NOT EXISTS detalle_venta (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    cod_producto TEXT NOT NULL REFERENCES producto(cod_producto),
    cod_bolt TEXT NOT NULL,
    unidad TEXT,
    cantidad REAL NOT NULL,
    precio_unitario REAL NOT NULL,
    subtotal REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_detalle_venta_bolt ON detalle_venta(cod_bolt);
"#;

/// 建表并登记 schema_version
pub fn ensure_schema(conn: &Connection) -> RepositoryResult<()> {
    let existing = read_schema_version(conn)?;

    conn.execute_batch(ANALYTICS_DDL)?;

    match existing {
        None => {
            conn.execute(
                "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
                params![CURRENT_SCHEMA_VERSION],
            )?;
            debug!(version = CURRENT_SCHEMA_VERSION, "analytics schema 已初始化");
        }
        Some(v) if v != CURRENT_SCHEMA_VERSION => {
            warn!(
                found = v,
                expected = CURRENT_SCHEMA_VERSION,
                "schema_version 与当前代码不一致（不做自动迁移）"
            );
        }
        Some(_) => {}
    }

    Ok(())
}
