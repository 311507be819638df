// ==========================================
// 销售数据仓库 ETL - 维度仓储
// ==========================================
// 职责: 维度表写入与键查找
// 写入策略:
//   - marca / categoria / empleado / tiempo: 首次写入为准（DO NOTHING）
//   - producto / cliente: 最新写入为准（DO UPDATE）
// ==========================================

use crate::domain::sales::{CalendarDay, CleanedClient, ProductRow};
use crate::repository::error::RepositoryResult;
use chrono::NaiveDate;
use rusqlite::{params, Connection};
use std::collections::HashMap;

/// 日期维度键格式
pub const CALENDAR_DATE_FORMAT: &str = "%Y-%m-%d";

/// 仅有名称属性的维度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedDimension {
    Brand,
    Category,
    Employee,
}

impl NamedDimension {
    fn table(&self) -> &'static str {
        match self {
            NamedDimension::Brand => "marca",
            NamedDimension::Category => "categoria",
            NamedDimension::Employee => "empleado",
        }
    }

    fn key_column(&self) -> &'static str {
        match self {
            NamedDimension::Brand => "cod_marca",
            NamedDimension::Category => "cod_cat",
            NamedDimension::Employee => "cod_empleado",
        }
    }
}

pub struct DimensionRepository<'a> {
    conn: &'a Connection,
}

impl<'a> DimensionRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// 按名称插入; 已存在返回 false
    pub fn insert_if_absent(&self, dim: NamedDimension, name: &str) -> RepositoryResult<bool> {
        let sql = format!(
            "INSERT INTO {} (nombre) VALUES (?1) ON CONFLICT(nombre) DO NOTHING",
            dim.table()
        );
        let changed = self.conn.execute(&sql, params![name])?;
        Ok(changed > 0)
    }

    /// 名称 → 代理键
    pub fn load_name_ids(&self, dim: NamedDimension) -> RepositoryResult<HashMap<String, i64>> {
        let sql = format!("SELECT nombre, {} FROM {}", dim.key_column(), dim.table());
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

        let mut ids = HashMap::new();
        for row in rows {
            let (name, id) = row?;
            ids.insert(name, id);
        }
        Ok(ids)
    }

    pub fn upsert_product(&self, product: &ProductRow) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO producto (cod_producto, nombre, cod_marca, cod_categoria)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(cod_producto) DO UPDATE SET
                nombre = excluded.nombre,
                cod_marca = excluded.cod_marca,
                cod_categoria = excluded.cod_categoria
            "#,
            params![
                product.code,
                product.name,
                product.brand_id,
                product.category_id
            ],
        )?;
        Ok(())
    }

    pub fn upsert_client(&self, client: &CleanedClient) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO cliente (doc_cliente, nombre, apellidos)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(doc_cliente) DO UPDATE SET
                nombre = excluded.nombre,
                apellidos = excluded.apellidos
            "#,
            params![client.document_id, client.display_name, client.surname],
        )?;
        Ok(())
    }

    /// 插入日期; 已存在返回 false（派生属性不重算）
    pub fn insert_calendar_day(&self, day: &CalendarDay) -> RepositoryResult<bool> {
        let changed = self.conn.execute(
            r#"
            INSERT INTO tiempo (
                fecha, anio, mes, dia, trimestre,
                nombre_mes, dia_semana, nombre_dia_semana
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(fecha) DO NOTHING
            "#,
            params![
                day.date.format(CALENDAR_DATE_FORMAT).to_string(),
                day.year,
                day.month,
                day.day,
                day.quarter,
                day.month_name,
                day.weekday,
                day.weekday_name
            ],
        )?;
        Ok(changed > 0)
    }

    /// 日期 → cod_time
    pub fn load_calendar_ids(&self) -> RepositoryResult<HashMap<NaiveDate, i64>> {
        let mut stmt = self.conn.prepare("SELECT fecha, cod_time FROM tiempo")?;
        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?;

        let mut ids = HashMap::new();
        for row in rows {
            let (fecha, id) = row?;
            if let Ok(date) = NaiveDate::parse_from_str(&fecha, CALENDAR_DATE_FORMAT) {
                ids.insert(date, id);
            }
        }
        Ok(ids)
    }
}
