// ==========================================
// 窗帘软装报价系统 - 引擎层
// ==========================================
// 职责: 实现业务规则引擎,不做 I/O
// 红线: 同步纯函数;失败降级为默认值/不派生,绝不 panic
// ==========================================

pub mod enrichment;
pub mod grid_resolver;
pub mod units;

// 重导出核心引擎
pub use enrichment::{derive_curtain_metrics, CurtainInputs, CurtainMetrics, EnrichmentEngine};
pub use grid_resolver::{GridResolver, Price, ResolutionFailure};
