// ==========================================
// 窗帘软装报价系统 - API层错误类型
// ==========================================
// 职责: 转换下层错误为用户友好的错误消息
// ==========================================

use crate::engine::grid_resolver::ResolutionFailure;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 定价错误
    // ==========================================
    #[error("价格解析失败: {0}")]
    Resolution(#[from] ResolutionFailure),

    // ==========================================
    // 下层错误
    // ==========================================
    #[error("导入失败: {0}")]
    Import(#[from] ImportError),

    #[error("数据访问失败: {0}")]
    Repository(#[from] RepositoryError),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    Internal(String),
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
