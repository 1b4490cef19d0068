// ==========================================
// 窗帘软装报价系统 - 网格导入器
// ==========================================
// 职责: 文件 → 解析 → 校验 → 规范化 → 落库
// 说明: 批量导入并发执行,单个文件失败不影响其他文件
// ==========================================

use crate::domain::pricing_grid::{GridData, PricingGrid};
use crate::domain::types::MeasurementUnit;
use crate::importer::error::ImportResult;
use crate::importer::file_parser::{
    CsvGridParser, ExcelGridParser, GridFileParser, UniversalGridParser,
};
use crate::importer::grid_builder::GridBuilder;
use crate::repository::grid_repo::PricingGridRepository;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ==========================================
// ImportOutcome - 导入结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub grid_id: String,
    pub name: String,
    pub unit: MeasurementUnit,
    pub unit_inferred: bool, // 单位是否由量级推断得到
    pub width_count: usize,
    pub drop_count: usize,
}

// ==========================================
// GridImporter Trait
// ==========================================
#[async_trait]
pub trait GridImporter: Send + Sync {
    /// 从 CSV 文件导入价格网格
    ///
    /// # 参数
    /// - file_path: CSV 文件路径（.csv）
    /// - name: 网格名称(人读标签,唯一)
    /// - unit: 明确声明的单位(缺省按量级推断一次)
    ///
    /// # 导入流程
    /// 1. 文件读取与解析
    /// 2. 表格校验(表头/行长/价格单元)
    /// 3. 单位定标 + 规范化
    /// 4. 落库
    async fn import_from_csv<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        name: &str,
        unit: Option<MeasurementUnit>,
    ) -> ImportResult<ImportOutcome>;

    /// 从 Excel 文件导入价格网格
    async fn import_from_excel<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        name: &str,
        unit: Option<MeasurementUnit>,
    ) -> ImportResult<ImportOutcome>;

    /// 批量导入多个文件（并发执行）
    ///
    /// 每个文件的导入相互独立,失败以字符串形式返回,不中断批次
    async fn batch_import(
        &self,
        files: Vec<(PathBuf, String)>,
    ) -> Vec<Result<ImportOutcome, String>>;
}

// ==========================================
// GridImporterImpl - 导入器实现
// ==========================================
pub struct GridImporterImpl {
    grid_repo: Arc<PricingGridRepository>,
    mm_threshold: f64,
}

impl GridImporterImpl {
    pub fn new(grid_repo: Arc<PricingGridRepository>) -> Self {
        Self {
            grid_repo,
            mm_threshold: crate::domain::types::DEFAULT_MM_THRESHOLD,
        }
    }

    /// 指定单位推断阈值(来自配置层)
    pub fn with_threshold(grid_repo: Arc<PricingGridRepository>, mm_threshold: f64) -> Self {
        Self {
            grid_repo,
            mm_threshold,
        }
    }

    /// 按扩展名自动选择解析器导入
    pub async fn import_auto<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        name: &str,
        unit: Option<MeasurementUnit>,
    ) -> ImportResult<ImportOutcome> {
        let rows = UniversalGridParser.parse(file_path.as_ref())?;
        self.import_rows(rows, name, unit)
    }

    /// 解析后的公共落库路径
    fn import_rows(
        &self,
        rows: Vec<Vec<String>>,
        name: &str,
        unit: Option<MeasurementUnit>,
    ) -> ImportResult<ImportOutcome> {
        let upload_shape = GridBuilder::build_from_rows(&rows)?;
        let (canonical, unit_inferred) =
            GridBuilder::canonicalize(&upload_shape, unit, self.mm_threshold)?;

        let outcome_unit = canonical.unit;
        let width_count = canonical.width_columns.len();
        let drop_count = canonical.drop_rows.len();

        let grid = PricingGrid::new(name, Some(outcome_unit), GridData::Canonical(canonical));
        let grid_id = grid.grid_id.clone();
        self.grid_repo.insert(&grid)?;

        tracing::info!(
            "网格导入完成: name={}, grid_id={}, unit={}, {}列×{}行",
            name,
            grid_id,
            outcome_unit,
            width_count,
            drop_count
        );

        Ok(ImportOutcome {
            grid_id,
            name: name.to_string(),
            unit: outcome_unit,
            unit_inferred,
            width_count,
            drop_count,
        })
    }
}

#[async_trait]
impl GridImporter for GridImporterImpl {
    async fn import_from_csv<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        name: &str,
        unit: Option<MeasurementUnit>,
    ) -> ImportResult<ImportOutcome> {
        let rows = CsvGridParser.parse_to_rows(file_path.as_ref())?;
        self.import_rows(rows, name, unit)
    }

    async fn import_from_excel<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        name: &str,
        unit: Option<MeasurementUnit>,
    ) -> ImportResult<ImportOutcome> {
        let rows = ExcelGridParser.parse_to_rows(file_path.as_ref())?;
        self.import_rows(rows, name, unit)
    }

    async fn batch_import(
        &self,
        files: Vec<(PathBuf, String)>,
    ) -> Vec<Result<ImportOutcome, String>> {
        let tasks = files.into_iter().map(|(path, name)| async move {
            self.import_auto(&path, &name, None)
                .await
                .map_err(|e| format!("{}: {}", path.display(), e))
        });

        futures::future::join_all(tasks).await
    }
}
