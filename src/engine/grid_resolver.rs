// ==========================================
// 窗帘软装报价系统 - 网格定价引擎
// ==========================================
// 职责: (宽度, 帘高) → 加工价格
// 红线: 查询输入一律为厘米,单位换算在入口一次完成
// 红线: 交互表单热路径,任何失败折叠为 0 + 日志,绝不 panic
// ==========================================

use crate::domain::pricing_grid::{CanonicalGrid, GridData, GridShapeError, PricingGrid};
use crate::domain::types::{MeasurementUnit, DEFAULT_MM_THRESHOLD};

/// 价格(非负)
pub type Price = f64;

// ==========================================
// 解析失败类型
// ==========================================
// "合法的 0 价"与"解析失败"在类型上区分开;
// 表单调用点用 resolve_or_zero 折叠,测试用 Result 口径断言。
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ResolutionFailure {
    #[error("网格缺失")]
    MissingGrid,

    #[error("网格无数据")]
    EmptyGrid,

    #[error("无法识别的网格形态")]
    UnrecognizedShape,

    #[error("查询超出所有区间 (宽度 {width}, 帘高 {drop}, 网格单位口径)")]
    OutOfRange { width: f64, drop: f64 },

    #[error("价格单元缺失 (列键 {key})")]
    MissingPriceCell { key: String },

    #[error("网格数据损坏: {0}")]
    Malformed(#[from] GridShapeError),
}

// ==========================================
// GridResolver - 网格定价引擎
// ==========================================
pub struct GridResolver;

impl GridResolver {
    /// 解析价格(严格口径)
    ///
    /// # 参数
    /// - grid: 价格网格(可缺失)
    /// - width_cm / drop_cm: 查询宽度/帘高,厘米
    ///
    /// # 规则
    /// 1. 网格缺失/无数据 → 对应失败
    /// 2. 单位: 明确声明 > 规范形态自带 > 量级推断(仅遗留形态,debug 日志)
    /// 3. 查询值换算到网格单位,一次完成
    /// 4. 点形态 → 规范化后两轴独立最近匹配;
    ///    区间包含形态 → 闭区间包含,无最近回退
    pub fn resolve(
        grid: Option<&PricingGrid>,
        width_cm: f64,
        drop_cm: f64,
    ) -> Result<Price, ResolutionFailure> {
        Self::resolve_with_threshold(grid, width_cm, drop_cm, DEFAULT_MM_THRESHOLD)
    }

    /// 解析价格,失败折叠为 0(表单调用点口径)
    pub fn resolve_or_zero(grid: Option<&PricingGrid>, width_cm: f64, drop_cm: f64) -> Price {
        match Self::resolve(grid, width_cm, drop_cm) {
            Ok(price) => price,
            Err(failure) => {
                tracing::warn!(
                    "价格解析失败，按 0 计 (宽度 {}cm, 帘高 {}cm): {}",
                    width_cm,
                    drop_cm,
                    failure
                );
                0.0
            }
        }
    }

    /// 从动态 JSON 网格值解析(存量数据入口)
    ///
    /// null / 非对象 / 无任何已知数组字段 → 对应失败,不抛异常
    pub fn resolve_value(
        grid_value: &serde_json::Value,
        width_cm: f64,
        drop_cm: f64,
    ) -> Result<Price, ResolutionFailure> {
        if grid_value.is_null() {
            return Err(ResolutionFailure::MissingGrid);
        }
        let data = GridData::from_value(grid_value).ok_or(ResolutionFailure::UnrecognizedShape)?;
        let grid = PricingGrid::new("<dynamic>", None, data);
        Self::resolve(Some(&grid), width_cm, drop_cm)
    }

    /// 从动态 JSON 网格值解析,失败折叠为 0
    pub fn resolve_value_or_zero(grid_value: &serde_json::Value, width_cm: f64, drop_cm: f64) -> Price {
        match Self::resolve_value(grid_value, width_cm, drop_cm) {
            Ok(price) => price,
            Err(failure) => {
                tracing::warn!("价格解析失败，按 0 计: {}", failure);
                0.0
            }
        }
    }

    fn resolve_with_threshold(
        grid: Option<&PricingGrid>,
        width_cm: f64,
        drop_cm: f64,
        mm_threshold: f64,
    ) -> Result<Price, ResolutionFailure> {
        let grid = grid.ok_or(ResolutionFailure::MissingGrid)?;
        if grid.grid_data.is_empty() {
            return Err(ResolutionFailure::EmptyGrid);
        }

        // 单位裁决: 明确声明 > 形态自带 > 量级推断
        let unit = grid
            .unit
            .or_else(|| grid.grid_data.stated_unit())
            .unwrap_or_else(|| {
                let inferred = MeasurementUnit::infer_from_magnitude(
                    grid.grid_data.axis_values(),
                    mm_threshold,
                );
                tracing::debug!("网格 {} 未声明单位，按量级推断为 {}", grid.name, inferred);
                inferred
            });

        // 换算一次,此后全部在网格单位内比较
        let width = unit.from_cm(width_cm);
        let drop = unit.from_cm(drop_cm);

        match &grid.grid_data {
            GridData::LegacyRanges { rows, columns } => {
                Self::resolve_by_containment(rows, columns, width, drop)
            }
            point_shape => {
                let canonical = point_shape.normalize(Some(unit), mm_threshold)?;
                Self::lookup_nearest(&canonical, width, drop)
            }
        }
    }

    /// 规范网格上的两轴独立最近匹配
    ///
    /// 先定 drop 行,再在该行内定宽度列;两轴各取最小绝对差,
    /// 不做欧氏最近点对。
    fn lookup_nearest(
        canonical: &CanonicalGrid,
        width: f64,
        drop: f64,
    ) -> Result<Price, ResolutionFailure> {
        let drops: Vec<f64> = canonical.drop_rows.iter().map(|r| r.drop).collect();
        let row_idx = nearest_index(&drops, drop).ok_or(ResolutionFailure::EmptyGrid)?;
        let col_idx =
            nearest_index(&canonical.width_columns, width).ok_or(ResolutionFailure::EmptyGrid)?;
        Ok(canonical.drop_rows[row_idx].prices[col_idx])
    }

    /// 区间包含匹配(遗留形态)
    ///
    /// 闭区间包含: drop_min <= drop <= drop_max 的首行,
    /// 再取 width_min <= width <= width_max 的首列;
    /// 两轴任一未命中 → OutOfRange,无最近回退。
    fn resolve_by_containment(
        rows: &[crate::domain::pricing_grid::LegacyRangeRow],
        columns: &[crate::domain::pricing_grid::LegacyRangeColumn],
        width: f64,
        drop: f64,
    ) -> Result<Price, ResolutionFailure> {
        let row = rows
            .iter()
            .find(|r| r.drop_min <= drop && drop <= r.drop_max)
            .ok_or(ResolutionFailure::OutOfRange { width, drop })?;
        let column = columns
            .iter()
            .find(|c| c.width_min <= width && width <= c.width_max)
            .ok_or(ResolutionFailure::OutOfRange { width, drop })?;

        row.prices
            .get(&column.key)
            .copied()
            .ok_or_else(|| ResolutionFailure::MissingPriceCell {
                key: column.key.clone(),
            })
    }
}

/// 最近值下标
///
/// # 规则
/// - 最小绝对差
/// - 平手时取数值更小的候选(明确策略,不依赖数组顺序)
fn nearest_index(candidates: &[f64], target: f64) -> Option<usize> {
    let mut best: Option<(f64, f64, usize)> = None;
    for (i, &value) in candidates.iter().enumerate() {
        if !value.is_finite() {
            continue;
        }
        let diff = (value - target).abs();
        let better = match best {
            None => true,
            Some((best_diff, best_value, _)) => {
                diff < best_diff || (diff == best_diff && value < best_value)
            }
        };
        if better {
            best = Some((diff, value, i));
        }
    }
    best.map(|(_, _, i)| i)
}
