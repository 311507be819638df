// ==========================================
// 销售数据仓库 ETL - 事实仓储
// ==========================================
// 职责: ventas（按 cod_bolt 去重）+ detalle_venta（仅追加）
// ==========================================

use crate::domain::sales::{SaleHeaderRow, SaleLineRow};
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Connection};

/// 事实时间戳格式
pub const SALE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct FactRepository<'a> {
    conn: &'a Connection,
}

impl<'a> FactRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// 插入销售单头; cod_bolt 已存在时忽略并返回 false
    pub fn insert_sale_header(&self, header: &SaleHeaderRow) -> RepositoryResult<bool> {
        let changed = self.conn.execute(
            r#"
            INSERT INTO ventas (cod_bolt, total, doc_cliente, doc_empleado, cod_time, fecha_venta)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(cod_bolt) DO NOTHING
            "#,
            params![
                header.ticket_id,
                header.total,
                header.client_document,
                header.employee_id,
                header.calendar_id,
                header.sale_date.format(SALE_TIMESTAMP_FORMAT).to_string()
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn insert_sale_line(&self, line: &SaleLineRow) -> RepositoryResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO detalle_venta (cod_producto, cod_bolt, unidad, cantidad, precio_unitario, subtotal)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                line.product_code,
                line.ticket_id,
                line.unit,
                line.quantity,
                line.unit_price,
                line.subtotal
            ],
        )?;
        Ok(())
    }
}
