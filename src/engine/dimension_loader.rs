// ==========================================
// 销售数据仓库 ETL - 维度装载
// ==========================================
// 职责: 清洗结果 → 维度表（3.1 - 3.6）
// 顺序: 品牌 → 品类 → 商品 → 客户 → 员工 → 日期
// 事务: 每个子步骤一个事务; 提交后立即记录阶段进度
// 查找: 维度键 → 代理键 每阶段批量载入一次; 未命中 ⇒ 外键置空
// ==========================================

use crate::domain::sales::{
    CalendarDay, CleanedData, CleanedSaleLine, ProductRow, PRODUCT_NAME_SENTINEL,
};
use crate::engine::error::EtlResult;
use crate::engine::run_reporter::RunReporter;
use crate::perf::PhaseTimer;
use crate::repository::{DimensionRepository, NamedDimension, Store};
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use tracing::{debug, info};

/// 维度装载统计（新增行数）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionLoadSummary {
    pub brands_inserted: usize,
    pub categories_inserted: usize,
    pub products_upserted: usize,
    pub clients_upserted: usize,
    pub employees_inserted: usize,
    pub dates_inserted: usize,
}

#[derive(Debug, Default)]
pub struct DimensionLoader;

impl DimensionLoader {
    pub fn new() -> Self {
        Self
    }

    pub fn load(
        &self,
        store: &mut Store,
        data: &CleanedData,
        reporter: &mut RunReporter,
    ) -> EtlResult<DimensionLoadSummary> {
        let brands = distinct_in_order(data.sale_lines.iter().filter_map(|l| l.brand.as_deref()));
        let categories =
            distinct_in_order(data.sale_lines.iter().filter_map(|l| l.category.as_deref()));
        let employees = distinct_in_order(
            data.sale_lines
                .iter()
                .filter_map(|l| l.employee_name.as_deref()),
        );
        let dates = distinct_in_order(
            data.sale_lines
                .iter()
                .filter_map(|l| l.sale_date.map(|d| d.date())),
        );

        let mut summary = DimensionLoadSummary::default();

        let timer = PhaseTimer::start("3.1");
        summary.brands_inserted = self.load_named(store, NamedDimension::Brand, &brands)?;
        reporter.record(
            "3.1",
            "Carga dimension marca",
            brands.len(),
            brands.len(),
            timer.finish(),
        );

        let timer = PhaseTimer::start("3.2");
        summary.categories_inserted =
            self.load_named(store, NamedDimension::Category, &categories)?;
        reporter.record(
            "3.2",
            "Carga dimension categoria",
            categories.len(),
            categories.len(),
            timer.finish(),
        );

        let timer = PhaseTimer::start("3.3");
        summary.products_upserted = self.load_products(store, data)?;
        reporter.record(
            "3.3",
            "Carga dimension producto",
            summary.products_upserted,
            summary.products_upserted,
            timer.finish(),
        );

        let timer = PhaseTimer::start("3.4");
        summary.clients_upserted = self.load_clients(store, data)?;
        reporter.record(
            "3.4",
            "Carga dimension cliente",
            data.clients.len(),
            summary.clients_upserted,
            timer.finish(),
        );

        let timer = PhaseTimer::start("3.5");
        summary.employees_inserted =
            self.load_named(store, NamedDimension::Employee, &employees)?;
        reporter.record(
            "3.5",
            "Carga dimension empleado",
            employees.len(),
            employees.len(),
            timer.finish(),
        );

        let timer = PhaseTimer::start("3.6");
        summary.dates_inserted = self.load_calendar(store, &dates)?;
        reporter.record(
            "3.6",
            "Carga dimension tiempo",
            dates.len(),
            dates.len(),
            timer.finish(),
        );

        info!(?summary, "维度装载完成");
        Ok(summary)
    }

    /// 品牌 / 品类 / 员工: 已存在则忽略; 返回新增行数
    fn load_named(
        &self,
        store: &mut Store,
        dim: NamedDimension,
        names: &[&str],
    ) -> EtlResult<usize> {
        let tx = store.phase()?;
        let repo = DimensionRepository::new(&tx);
        let mut inserted = 0;
        for name in names {
            if repo.insert_if_absent(dim, name)? {
                inserted += 1;
            }
        }
        tx.commit()?;

        debug!(?dim, distinct = names.len(), inserted, "维度写入完成");
        Ok(inserted)
    }

    /// 商品: 每个 SKU 取首条明细为代表, 名称回退到商品清单再回退到 SIN NOMBRE
    fn load_products(&self, store: &mut Store, data: &CleanedData) -> EtlResult<usize> {
        let mut catalog: HashMap<&str, &str> = HashMap::new();
        for product in &data.products {
            catalog
                .entry(product.code.as_str())
                .or_insert(product.name.as_str());
        }

        let mut representatives: Vec<&CleanedSaleLine> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for line in &data.sale_lines {
            if seen.insert(line.sku.as_str()) {
                representatives.push(line);
            }
        }

        let tx = store.phase()?;
        let repo = DimensionRepository::new(&tx);
        let brand_ids = repo.load_name_ids(NamedDimension::Brand)?;
        let category_ids = repo.load_name_ids(NamedDimension::Category)?;

        for line in &representatives {
            let name = match &line.product_name {
                Some(name) => name.clone(),
                None => catalog
                    .get(line.sku.to_uppercase().as_str())
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| PRODUCT_NAME_SENTINEL.to_string()),
            };
            let row = ProductRow {
                code: line.sku.clone(),
                name,
                brand_id: line
                    .brand
                    .as_deref()
                    .and_then(|b| brand_ids.get(b).copied()),
                category_id: line
                    .category
                    .as_deref()
                    .and_then(|c| category_ids.get(c).copied()),
            };
            repo.upsert_product(&row)?;
        }
        tx.commit()?;

        Ok(representatives.len())
    }

    fn load_clients(&self, store: &mut Store, data: &CleanedData) -> EtlResult<usize> {
        let tx = store.phase()?;
        let repo = DimensionRepository::new(&tx);
        for client in &data.clients {
            repo.upsert_client(client)?;
        }
        tx.commit()?;
        Ok(data.clients.len())
    }

    fn load_calendar(&self, store: &mut Store, dates: &[NaiveDate]) -> EtlResult<usize> {
        let tx = store.phase()?;
        let repo = DimensionRepository::new(&tx);
        let mut inserted = 0;
        for date in dates {
            if repo.insert_calendar_day(&CalendarDay::from_date(*date))? {
                inserted += 1;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }
}

/// 去重并保持首次出现顺序
fn distinct_in_order<T, I>(values: I) -> Vec<T>
where
    T: Eq + Hash + Copy,
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    values.into_iter().filter(|v| seen.insert(*v)).collect()
}
