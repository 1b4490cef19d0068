// ==========================================
// 窗帘软装报价系统 - 网格 API
// ==========================================
// 职责: 网格导入、生命周期管理、定价查询
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::pricing_grid::PricingGrid;
use crate::domain::types::{MeasurementUnit, DEFAULT_MM_THRESHOLD};
use crate::engine::grid_resolver::{GridResolver, Price};
use crate::importer::grid_importer::{GridImporterImpl, ImportOutcome};
use crate::repository::grid_repo::PricingGridRepository;
use std::path::Path;
use std::sync::Arc;

// ==========================================
// GridApi - 网格 API
// ==========================================

/// 网格 API
///
/// 职责：
/// 1. 价目表文件导入(CSV/Excel)
/// 2. 网格查询与生命周期管理(软删除/硬删除)
/// 3. 定价查询(表单口径: 失败折叠为 0;严格口径: 返回失败原因)
pub struct GridApi {
    grid_repo: Arc<PricingGridRepository>,
    importer: GridImporterImpl,
}

impl GridApi {
    /// 创建 GridApi 实例
    ///
    /// 单位推断阈值从配置层读取,读取失败退回默认值并告警
    pub fn new(grid_repo: Arc<PricingGridRepository>, config: &ConfigManager) -> Self {
        let threshold = config.get_unit_inference_mm_threshold().unwrap_or_else(|e| {
            tracing::warn!("读取单位推断阈值失败，使用默认值 {}: {}", DEFAULT_MM_THRESHOLD, e);
            DEFAULT_MM_THRESHOLD
        });
        let importer = GridImporterImpl::with_threshold(grid_repo.clone(), threshold);
        Self { grid_repo, importer }
    }

    /// 导入价目表文件(按扩展名自动选择解析器)
    pub async fn import_grid<P: AsRef<Path> + Send>(
        &self,
        file_path: P,
        name: &str,
        unit: Option<MeasurementUnit>,
    ) -> ApiResult<ImportOutcome> {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidInput("网格名称不能为空".to_string()));
        }
        let outcome = self.importer.import_auto(file_path, name.trim(), unit).await?;
        Ok(outcome)
    }

    /// 列出网格
    pub fn list_grids(&self, include_inactive: bool) -> ApiResult<Vec<PricingGrid>> {
        Ok(self.grid_repo.list(include_inactive)?)
    }

    /// 按名称获取网格(仅 active)
    pub fn get_grid(&self, name: &str) -> ApiResult<PricingGrid> {
        self.grid_repo
            .find_by_name(name)?
            .ok_or_else(|| ApiError::NotFound(format!("网格 {}", name)))
    }

    /// 定价查询(表单口径)
    ///
    /// 网格存在但解析失败时折叠为 0 + 日志,保持表单可交互
    pub fn price_window(&self, grid_name: &str, width_cm: f64, drop_cm: f64) -> ApiResult<Price> {
        let grid = self.get_grid(grid_name)?;
        Ok(GridResolver::resolve_or_zero(Some(&grid), width_cm, drop_cm))
    }

    /// 定价查询(严格口径)
    ///
    /// 解析失败返回具体原因,供测试/诊断区分"合法 0 价"与"解析失败"
    pub fn price_window_strict(
        &self,
        grid_name: &str,
        width_cm: f64,
        drop_cm: f64,
    ) -> ApiResult<Price> {
        let grid = self.get_grid(grid_name)?;
        Ok(GridResolver::resolve(Some(&grid), width_cm, drop_cm)?)
    }

    /// 软删除网格
    pub fn deactivate_grid(&self, grid_id: &str) -> ApiResult<()> {
        if self.grid_repo.soft_delete(grid_id)? {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("网格 {}", grid_id)))
        }
    }

    /// 硬删除网格
    pub fn delete_grid(&self, grid_id: &str) -> ApiResult<()> {
        if self.grid_repo.hard_delete(grid_id)? {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("网格 {}", grid_id)))
        }
    }
}
