// ==========================================
// 窗帘软装报价系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 导入是本核心唯一向用户抛硬错误的环节,
// 错误信息必须点名出错的行/列。
// ==========================================

use crate::domain::pricing_grid::GridShapeError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 表格校验错误 =====
    #[error("表格为空，至少需要表头与一行数据")]
    EmptyTable,

    #[error("表头无效: 首格应为 Drop/Width，实际为 {found:?}")]
    HeaderInvalid { found: String },

    #[error("行列数不一致 (行 {row}): 表头 {expected} 列，实际 {actual} 列")]
    RowLengthMismatch {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("价格单元无效 (行 {row}, 列 {column}): {value:?} 不是非负数")]
    PriceCellInvalid {
        row: usize,
        column: usize,
        value: String,
    },

    #[error("帘高标签无效 (行 {row}): {label:?} 不含数值")]
    DropLabelInvalid { row: usize, label: String },

    // ===== 网格形态错误 =====
    #[error("网格规范化失败: {0}")]
    GridShape(#[from] GridShapeError),

    // ===== 存储错误 =====
    #[error("存储失败: {0}")]
    Storage(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<RepositoryError>
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        ImportError::Storage(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
