// ==========================================
// 窗帘软装报价系统 - 工作单 API
// ==========================================
// 职责: 工作单保存(派生富集 → upsert)与读取
// 红线: 富集失败不存在——缺数据降级为不派生,保存永不被阻断
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::window_summary::WindowSummary;
use crate::engine::enrichment::EnrichmentEngine;
use crate::repository::summary_repo::WindowSummaryRepository;
use std::sync::Arc;

// ==========================================
// QuoteApi - 工作单 API
// ==========================================
pub struct QuoteApi {
    summary_repo: Arc<WindowSummaryRepository>,
}

impl QuoteApi {
    /// 创建 QuoteApi 实例
    pub fn new(summary_repo: Arc<WindowSummaryRepository>) -> Self {
        Self { summary_repo }
    }

    /// 保存工作单
    ///
    /// # 流程
    /// 1. 校验 window_id
    /// 2. 测量派生富集(守卫条件见引擎层)
    /// 3. 按 window_id upsert(最后写入者胜)
    ///
    /// # 返回
    /// - 富集后的汇总记录(即落库内容)
    pub fn save_worksheet(&self, summary: WindowSummary) -> ApiResult<WindowSummary> {
        if summary.window_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("window_id 不能为空".to_string()));
        }

        let mut enriched = EnrichmentEngine::enrich(summary);
        enriched.updated_at = chrono::Utc::now();
        self.summary_repo.upsert(&enriched)?;

        tracing::debug!(window_id = %enriched.window_id, "工作单已保存");
        Ok(enriched)
    }

    /// 读取单窗汇总(报价/发票渲染)
    pub fn get_window_summary(&self, window_id: &str) -> ApiResult<WindowSummary> {
        self.summary_repo
            .find_by_window_id(window_id)?
            .ok_or_else(|| ApiError::NotFound(format!("窗户汇总 {}", window_id)))
    }

    /// 列出全部汇总记录
    pub fn list_window_summaries(&self) -> ApiResult<Vec<WindowSummary>> {
        Ok(self.summary_repo.list()?)
    }

    /// 删除单窗汇总
    pub fn delete_window_summary(&self, window_id: &str) -> ApiResult<()> {
        if self.summary_repo.delete(window_id)? {
            Ok(())
        } else {
            Err(ApiError::NotFound(format!("窗户汇总 {}", window_id)))
        }
    }
}
