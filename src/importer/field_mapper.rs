// ==========================================
// 销售数据仓库 ETL - 字段映射器实现
// ==========================================
// 职责: 源列 → 清洗后记录 + 行准入判定
//   商品: code / name 非空
//   客户: 证件号非空; 显示名 = 名 → 公司名 → CLIENTE SIN NOMBRE
//   明细: ticket / SKU 非空且数量 > 0
// 红线: 不合格行直接丢弃, 不修补
// ==========================================

use crate::config::ColumnMapping;
use crate::domain::raw::{RawRow, RawTable};
use crate::domain::sales::{
    CleanCounts, CleanedClient, CleanedProduct, CleanedSaleLine, CLIENT_NAME_SENTINEL,
};
use crate::importer::data_cleaner::DataCleaner;
use tracing::debug;

pub struct FieldMapper {
    columns: ColumnMapping,
    cleaner: DataCleaner,
}

impl FieldMapper {
    pub fn new(columns: ColumnMapping, cleaner: DataCleaner) -> Self {
        Self { columns, cleaner }
    }

    /// 逐行映射; 返回 None 的行计为丢弃
    fn map_rows<T, F>(&self, raw: &RawTable, mut map_row: F) -> (Vec<T>, CleanCounts)
    where
        F: FnMut(&RawRow) -> Option<T>,
    {
        let mut cleaned = Vec::with_capacity(raw.len());
        for (idx, row) in raw.rows.iter().enumerate() {
            match map_row(row) {
                Some(record) => cleaned.push(record),
                None => debug!(source = %raw.source, row_number = idx + 1, "行未通过准入, 丢弃"),
            }
        }

        let counts = CleanCounts {
            processed: raw.len(),
            valid: cleaned.len(),
        };
        (cleaned, counts)
    }

    /// 清洗商品清单
    pub fn clean_products(&self, raw: &RawTable) -> (Vec<CleanedProduct>, CleanCounts) {
        let cols = &self.columns.productos;
        self.map_rows(raw, |row| {
            let code = self.cleaner.clean_text(row.get(&cols.code))?;
            let name = self.cleaner.clean_text(row.get(&cols.name))?;
            Some(CleanedProduct {
                code,
                name,
                brand: self.cleaner.clean_text(row.get(&cols.brand)),
                category: self.cleaner.clean_text(row.get(&cols.category)),
                unit: self.cleaner.clean_text(row.get(&cols.unit)),
            })
        })
    }

    /// 清洗客户
    pub fn clean_clients(&self, raw: &RawTable) -> (Vec<CleanedClient>, CleanCounts) {
        let cols = &self.columns.clientes;
        self.map_rows(raw, |row| {
            let document_id = self.cleaner.clean_key(row.get(&cols.document_id))?;
            let display_name = self
                .cleaner
                .clean_text(row.get(&cols.first_names))
                .or_else(|| self.cleaner.clean_text(row.get(&cols.legal_name)))
                .unwrap_or_else(|| CLIENT_NAME_SENTINEL.to_string());
            Some(CleanedClient {
                document_id,
                display_name,
                surname: self.cleaner.clean_text(row.get(&cols.surnames)),
            })
        })
    }

    /// 清洗销售明细
    pub fn clean_sale_lines(&self, raw: &RawTable) -> (Vec<CleanedSaleLine>, CleanCounts) {
        let cols = &self.columns.detalle;
        self.map_rows(raw, |row| {
            let ticket_id = self.cleaner.clean_key(row.get(&cols.ticket_id))?;
            let sku = self.cleaner.clean_key(row.get(&cols.sku))?;
            let quantity = self.cleaner.clean_number(row.get(&cols.quantity));
            if quantity <= 0.0 {
                return None;
            }
            Some(CleanedSaleLine {
                ticket_id,
                sku,
                product_name: self.cleaner.clean_text(row.get(&cols.product_name)),
                quantity,
                unit: self.cleaner.clean_text(row.get(&cols.unit)),
                subtotal: self.cleaner.clean_number(row.get(&cols.subtotal)),
                brand: self.cleaner.clean_text(row.get(&cols.brand)),
                category: self.cleaner.clean_text(row.get(&cols.category)),
                employee_name: self.cleaner.clean_text(row.get(&cols.employee_name)),
                client_name: self.cleaner.clean_text(row.get(&cols.client_name)),
                client_document: self.cleaner.clean_key(row.get(&cols.client_document)),
                sale_date: self.cleaner.clean_date(row.get(&cols.sale_date)),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{CellValue, SourceKind};
    use chrono::NaiveDate;

    fn mapper() -> FieldMapper {
        FieldMapper::new(ColumnMapping::default(), DataCleaner::default())
    }

    fn table(source: SourceKind, rows: Vec<RawRow>) -> RawTable {
        let ts = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut t = RawTable::new(source, Vec::new(), ts);
        for row in rows {
            t.push_row(row);
        }
        t
    }

    #[test]
    fn test_products_require_code_and_name() {
        let raw = table(
            SourceKind::Productos,
            vec![
                RawRow::from_pairs([("Código", " a1 "), ("Nombre", "arroz"), ("Marca", "")]),
                RawRow::from_pairs([("Código", ""), ("Nombre", "sin codigo")]),
                RawRow::from_pairs([("Código", "A3"), ("Nombre", "  ")]),
            ],
        );

        let (products, counts) = mapper().clean_products(&raw);

        assert_eq!(counts, CleanCounts { processed: 3, valid: 1 });
        assert_eq!(products[0].code, "A1");
        assert_eq!(products[0].name, "ARROZ");
        assert_eq!(products[0].brand, None);
    }

    #[test]
    fn test_client_display_name_fallback() {
        let raw = table(
            SourceKind::Clientes,
            vec![
                RawRow::from_pairs([
                    ("Numero de documento", "001"),
                    ("Nombres", "luis"),
                    ("Razon Social.", "ACME SAC"),
                ]),
                RawRow::from_pairs([("Numero de documento", "002"), ("Razon Social.", "acme sac")]),
                RawRow::from_pairs([("Numero de documento", "003"), ("Apellidos", "perez")]),
                RawRow::from_pairs([("Nombres", "sin documento")]),
            ],
        );

        let (clients, counts) = mapper().clean_clients(&raw);

        assert_eq!(counts, CleanCounts { processed: 4, valid: 3 });
        assert_eq!(clients[0].display_name, "LUIS");
        assert_eq!(clients[1].display_name, "ACME SAC");
        assert_eq!(clients[2].display_name, CLIENT_NAME_SENTINEL);
        assert_eq!(clients[2].surname, Some("PEREZ".to_string()));
        assert_eq!(clients[0].document_id, "001");
    }

    #[test]
    fn test_sale_line_scenario_a() {
        let raw = table(
            SourceKind::Detalle,
            vec![RawRow::from_pairs([
                ("#-DOC", "T1"),
                ("Codigo SKU", "S1"),
                ("Cantidad", "2,5"),
                ("Total", "10,0"),
                ("Empleado Nombre", "ana"),
                ("Fecha", "2024-03-05"),
            ])],
        );

        let (lines, counts) = mapper().clean_sale_lines(&raw);

        assert_eq!(counts.valid, 1);
        let line = &lines[0];
        assert_eq!(line.quantity, 2.5);
        assert_eq!(line.subtotal, 10.0);
        assert_eq!(line.employee_name, Some("ANA".to_string()));
        assert_eq!(
            line.sale_date.map(|d| d.date()),
            NaiveDate::from_ymd_opt(2024, 3, 5)
        );
        assert_eq!(line.unit_price(), 4.0);
    }

    #[test]
    fn test_sale_line_admission() {
        let raw = table(
            SourceKind::Detalle,
            vec![
                RawRow::from_pairs([("#-DOC", "T1"), ("Codigo SKU", "S1"), ("Cantidad", "0")]),
                RawRow::from_pairs([("#-DOC", "T1"), ("Codigo SKU", "S1"), ("Cantidad", "-2")]),
                RawRow::from_pairs([("#-DOC", "T1"), ("Codigo SKU", ""), ("Cantidad", "1")]),
                RawRow::from_pairs([("#-DOC", ""), ("Codigo SKU", "S1"), ("Cantidad", "1")]),
                RawRow::from_pairs([("#-DOC", "T1"), ("Codigo SKU", "S1"), ("Cantidad", "x")]),
                RawRow::from_pairs([("#-DOC", "T2"), ("Codigo SKU", "S2"), ("Cantidad", "1")]),
            ],
        );

        let (lines, counts) = mapper().clean_sale_lines(&raw);

        assert_eq!(counts, CleanCounts { processed: 6, valid: 1 });
        assert_eq!(counts.discarded(), 5);
        assert_eq!(lines[0].ticket_id, "T2");
    }

    #[test]
    fn test_sale_line_bad_number_and_date_degrade() {
        let mut row = RawRow::from_pairs([("#-DOC", "T9"), ("Codigo SKU", "S9"), ("Total", "n/a")]);
        row.insert("Cantidad", CellValue::Number(1.0));
        row.insert("Fecha", CellValue::Text("no es fecha".to_string()));
        let raw = table(SourceKind::Detalle, vec![row]);

        let (lines, _) = mapper().clean_sale_lines(&raw);

        assert_eq!(lines[0].subtotal, 0.0);
        assert_eq!(lines[0].sale_date, None);
    }
}
