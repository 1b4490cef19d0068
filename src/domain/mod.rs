// ==========================================
// 窗帘软装报价系统 - 领域层
// ==========================================
// 职责: 实体与类型定义,不含 I/O
// ==========================================

pub mod pricing_grid;
pub mod types;
pub mod window_summary;

// 重导出核心实体
pub use pricing_grid::{
    CanonicalDropRow, CanonicalGrid, GridData, GridShapeError, LabeledDropRow, LegacyRangeColumn,
    LegacyRangeRow, PricingGrid,
};
pub use types::{CurtainType, MeasurementUnit, TreatmentCategory};
pub use window_summary::WindowSummary;
