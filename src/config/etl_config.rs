// ==========================================
// 销售数据仓库 ETL - 运行配置
// ==========================================
// 职责: 数据库路径 / 源文件路径 / 各源列名映射
// 存储: JSON 文件（全部字段可缺省）+ 环境变量覆写
// ==========================================

use crate::domain::types::SourceKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// 配置文件路径环境变量
pub const ENV_CONFIG_PATH: &str = "SALES_DW_ETL_CONFIG";

/// 数据库路径环境变量（优先于配置文件）
pub const ENV_DB_PATH: &str = "SALES_DW_ETL_DB_PATH";

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件读取失败 ({path}): {message}")]
    ReadError { path: String, message: String },

    #[error("配置文件格式错误 ({path}): {message}")]
    ParseError { path: String, message: String },

    #[error("配置值无效 (key: {key}): {message}")]
    InvalidValue { key: String, message: String },
}

// ==========================================
// EtlConfig - 顶层配置
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EtlConfig {
    /// SQLite 数据库文件; None 时使用默认路径
    pub database_path: Option<String>,

    pub sources: SourceFiles,

    pub columns: ColumnMapping,

    /// 形如 05/03/2024 的日期按 日/月/年 解析
    pub date_day_first: bool,

    /// 机器可读运行报告（JSON）输出路径
    pub report_path: Option<PathBuf>,
}

impl Default for EtlConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            sources: SourceFiles::default(),
            columns: ColumnMapping::default(),
            date_day_first: true,
            report_path: None,
        }
    }
}

/// 四个源文件路径
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFiles {
    pub productos: PathBuf,
    pub ventas: PathBuf,
    pub clientes: PathBuf,
    pub detalle: PathBuf,
}

impl Default for SourceFiles {
    fn default() -> Self {
        Self {
            productos: PathBuf::from("data/listado_de_productos.xlsx"),
            ventas: PathBuf::from("data/listado_de_ventas.xlsx"),
            clientes: PathBuf::from("data/report_de_cliente.xlsx"),
            detalle: PathBuf::from("data/detalle_de_venta.xlsx"),
        }
    }
}

impl SourceFiles {
    pub fn path_for(&self, kind: SourceKind) -> &Path {
        match kind {
            SourceKind::Productos => &self.productos,
            SourceKind::Ventas => &self.ventas,
            SourceKind::Clientes => &self.clientes,
            SourceKind::Detalle => &self.detalle,
        }
    }
}

/// 各源列名（随部署而变, 默认值对应现行 Excel 导出表头）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub productos: ProductColumns,
    pub clientes: ClientColumns,
    pub detalle: DetailColumns,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductColumns {
    pub code: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub unit: String,
}

impl Default for ProductColumns {
    fn default() -> Self {
        Self {
            code: "Código".to_string(),
            name: "Nombre".to_string(),
            brand: "Marca".to_string(),
            category: "Categorias".to_string(),
            unit: "Unidad".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientColumns {
    pub document_id: String,
    pub first_names: String,
    pub surnames: String,
    pub legal_name: String,
}

impl Default for ClientColumns {
    fn default() -> Self {
        Self {
            document_id: "Numero de documento".to_string(),
            first_names: "Nombres".to_string(),
            surnames: "Apellidos".to_string(),
            legal_name: "Razon Social.".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailColumns {
    pub ticket_id: String,
    pub sku: String,
    pub product_name: String,
    pub unit: String,
    pub quantity: String,
    pub subtotal: String,
    pub brand: String,
    pub category: String,
    pub employee_name: String,
    pub client_name: String,
    pub client_document: String,
    pub sale_date: String,
}

impl Default for DetailColumns {
    fn default() -> Self {
        Self {
            ticket_id: "#-DOC".to_string(),
            sku: "Codigo SKU".to_string(),
            product_name: "Nombre".to_string(),
            unit: "Unidad".to_string(),
            quantity: "Cantidad".to_string(),
            subtotal: "Total".to_string(),
            brand: "Marca".to_string(),
            category: "Categoría".to_string(),
            employee_name: "Empleado Nombre".to_string(),
            client_name: "Cliente Nombre".to_string(),
            client_document: "Cliente Doc.".to_string(),
            sale_date: "Fecha".to_string(),
        }
    }
}

impl EtlConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config: EtlConfig =
            serde_json::from_str(&raw).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// 解析配置来源
    ///
    /// 优先级: 显式路径 > SALES_DW_ETL_CONFIG > 内置默认值;
    /// SALES_DW_ETL_DB_PATH 始终覆写数据库路径
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var(ENV_CONFIG_PATH)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        let mut config = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Ok(path) = std::env::var(ENV_DB_PATH) {
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                config.database_path = Some(trimmed.to_string());
            }
        }

        Ok(config)
    }

    /// 实际使用的数据库路径
    pub fn database_path(&self) -> String {
        self.database_path
            .clone()
            .unwrap_or_else(get_default_db_path)
    }

    /// 校验列名非空
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.columns.productos;
        let c = &self.columns.clientes;
        let d = &self.columns.detalle;
        let named: [(&str, &str); 21] = [
            ("columns.productos.code", p.code.as_str()),
            ("columns.productos.name", p.name.as_str()),
            ("columns.productos.brand", p.brand.as_str()),
            ("columns.productos.category", p.category.as_str()),
            ("columns.productos.unit", p.unit.as_str()),
            ("columns.clientes.document_id", c.document_id.as_str()),
            ("columns.clientes.first_names", c.first_names.as_str()),
            ("columns.clientes.surnames", c.surnames.as_str()),
            ("columns.clientes.legal_name", c.legal_name.as_str()),
            ("columns.detalle.ticket_id", d.ticket_id.as_str()),
            ("columns.detalle.sku", d.sku.as_str()),
            ("columns.detalle.product_name", d.product_name.as_str()),
            ("columns.detalle.unit", d.unit.as_str()),
            ("columns.detalle.quantity", d.quantity.as_str()),
            ("columns.detalle.subtotal", d.subtotal.as_str()),
            ("columns.detalle.brand", d.brand.as_str()),
            ("columns.detalle.category", d.category.as_str()),
            ("columns.detalle.employee_name", d.employee_name.as_str()),
            ("columns.detalle.client_name", d.client_name.as_str()),
            ("columns.detalle.client_document", d.client_document.as_str()),
            ("columns.detalle.sale_date", d.sale_date.as_str()),
        ];

        for (key, value) in named {
            if value.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "列名不能为空".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// 默认数据库路径: 用户数据目录下 sales-dw-etl/sales_dw.db
pub fn get_default_db_path() -> String {
    let mut path = PathBuf::from("./sales_dw.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("sales-dw-etl");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("sales_dw.db");
        }
    }

    path.to_string_lossy().to_string()
}

/// 解析命令行 `--config FILE` / `--config=FILE`（不含程序名）
pub fn config_path_from_args<I>(args: I) -> Result<Option<PathBuf>, ConfigError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut found = None;
    while let Some(arg) = args.next() {
        if arg == "--config" {
            match args.next() {
                Some(path) if !path.trim().is_empty() => found = Some(PathBuf::from(path)),
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "--config".to_string(),
                        message: "缺少配置文件路径".to_string(),
                    })
                }
            }
        } else if let Some(path) = arg.strip_prefix("--config=") {
            found = Some(PathBuf::from(path));
        } else {
            return Err(ConfigError::InvalidValue {
                key: arg,
                message: "未知参数; 用法: [--config FILE]".to_string(),
            });
        }
    }
    Ok(found)
}
