// ==========================================
// 销售数据仓库 ETL - 事实装载
// ==========================================
// 职责:
//   4.1 明细按 ticket 分组 → 销售单头（合计 = 小计之和）
//   4.2 每条明细 → detalle_venta（仅追加）
// 红线: 单个 ticket / 单条明细失败只计丢弃, 不中断批次
// ==========================================

use crate::domain::sales::{round2, CleanedSaleLine, SaleHeaderRow, SaleLineRow};
use crate::engine::error::EtlResult;
use crate::engine::run_reporter::RunReporter;
use crate::perf::PhaseTimer;
use crate::repository::{DimensionRepository, FactRepository, NamedDimension, Store};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// 事实装载统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactLoadSummary {
    pub headers_processed: usize,
    pub headers_loaded: usize,
    /// 已存在而被忽略的 ticket（仍计为已装载）
    pub headers_already_present: usize,
    pub lines_processed: usize,
    pub lines_loaded: usize,
}

/// 一个 ticket 的代表属性（组内首个非空值）
#[derive(Debug, Clone, PartialEq)]
struct TicketGroup<'a> {
    ticket_id: &'a str,
    total: f64,
    client_document: Option<&'a str>,
    employee_name: Option<&'a str>,
    sale_date: Option<chrono::NaiveDateTime>,
}

fn group_by_ticket(lines: &[CleanedSaleLine]) -> Vec<TicketGroup<'_>> {
    let mut groups: BTreeMap<&str, TicketGroup<'_>> = BTreeMap::new();
    for line in lines {
        let group = groups
            .entry(line.ticket_id.as_str())
            .or_insert_with(|| TicketGroup {
                ticket_id: line.ticket_id.as_str(),
                total: 0.0,
                client_document: None,
                employee_name: None,
                sale_date: None,
            });
        group.total += line.subtotal;
        if group.client_document.is_none() {
            group.client_document = line.client_document.as_deref();
        }
        if group.employee_name.is_none() {
            group.employee_name = line.employee_name.as_deref();
        }
        if group.sale_date.is_none() {
            group.sale_date = line.sale_date;
        }
    }
    groups.into_values().collect()
}

#[derive(Debug, Default)]
pub struct FactLoader;

impl FactLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load(
        &self,
        store: &mut Store,
        lines: &[CleanedSaleLine],
        reporter: &mut RunReporter,
    ) -> EtlResult<FactLoadSummary> {
        let mut summary = FactLoadSummary::default();

        let timer = PhaseTimer::start("4.1");
        self.load_headers(store, lines, &mut summary)?;
        reporter.record(
            "4.1",
            "Carga hechos ventas",
            summary.headers_processed,
            summary.headers_loaded,
            timer.finish(),
        );

        let timer = PhaseTimer::start("4.2");
        self.load_lines(store, lines, &mut summary)?;
        reporter.record(
            "4.2",
            "Carga hechos detalle_venta",
            summary.lines_processed,
            summary.lines_loaded,
            timer.finish(),
        );

        info!(?summary, "事实装载完成");
        Ok(summary)
    }

    fn load_headers(
        &self,
        store: &mut Store,
        lines: &[CleanedSaleLine],
        summary: &mut FactLoadSummary,
    ) -> EtlResult<()> {
        let groups = group_by_ticket(lines);
        summary.headers_processed = groups.len();

        let tx = store.phase()?;
        let dims = DimensionRepository::new(&tx);
        let employee_ids = dims.load_name_ids(NamedDimension::Employee)?;
        let calendar_ids = dims.load_calendar_ids()?;
        let facts = FactRepository::new(&tx);

        for group in &groups {
            let employee_id = group
                .employee_name
                .and_then(|name| employee_ids.get(name).copied());
            let calendar_id = group
                .sale_date
                .and_then(|d| calendar_ids.get(&d.date()).copied());

            let (employee_id, calendar_id, sale_date) =
                match (employee_id, calendar_id, group.sale_date) {
                    (Some(e), Some(c), Some(d)) => (e, c, d),
                    _ => {
                        debug!(
                            ticket_id = group.ticket_id,
                            employee = ?group.employee_name,
                            sale_date = ?group.sale_date,
                            employee_resolved = employee_id.is_some(),
                            date_resolved = calendar_id.is_some(),
                            "销售单头维度未命中, 丢弃"
                        );
                        continue;
                    }
                };

            let header = SaleHeaderRow {
                ticket_id: group.ticket_id.to_string(),
                total: round2(group.total),
                client_document: group.client_document.map(str::to_string),
                employee_id,
                calendar_id,
                sale_date,
            };

            match facts.insert_sale_header(&header) {
                Ok(inserted) => {
                    summary.headers_loaded += 1;
                    if !inserted {
                        summary.headers_already_present += 1;
                    }
                }
                Err(e) => {
                    warn!(ticket_id = group.ticket_id, error = %e, "销售单头写入失败, 丢弃");
                }
            }
        }
        tx.commit()?;

        if summary.headers_already_present > 0 {
            info!(
                already_present = summary.headers_already_present,
                "部分 ticket 已存在, 保留原单头"
            );
        }
        Ok(())
    }

    fn load_lines(
        &self,
        store: &mut Store,
        lines: &[CleanedSaleLine],
        summary: &mut FactLoadSummary,
    ) -> EtlResult<()> {
        summary.lines_processed = lines.len();

        let tx = store.phase()?;
        let facts = FactRepository::new(&tx);
        for line in lines {
            let row = SaleLineRow::from_cleaned(line);
            match facts.insert_sale_line(&row) {
                Ok(()) => summary.lines_loaded += 1,
                Err(e) => warn!(
                    ticket_id = %row.ticket_id,
                    product_code = %row.product_code,
                    error = %e,
                    "销售明细写入失败, 丢弃"
                ),
            }
        }
        tx.commit()?;
        Ok(())
    }
}
