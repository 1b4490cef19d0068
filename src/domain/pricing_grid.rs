// ==========================================
// 窗帘软装报价系统 - 价格网格领域模型
// ==========================================
// 历史背景: 存量 grid_data 存在多种形态（多次数据迁移遗留）,
// 统一为带判别的联合类型 + 每种遗留形态一个规范化适配器。
// 规范形态(Canonical)单位为强制字段;遗留形态读取时按量级推断。
// ==========================================

use crate::domain::types::MeasurementUnit;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

// ==========================================
// 网格形态错误
// ==========================================
/// 网格数据形态错误
///
/// 查询路径上由 resolve_or_zero 折叠为 0 并记日志;
/// 导入路径上转译为用户可见的 ImportError。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridShapeError {
    #[error("网格数据为空")]
    Empty,

    #[error("行列数不一致 (行 {row}): 期望 {expected} 列, 实际 {actual} 列")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("{axis} 轴无可解析的数值标签")]
    NoNumericLabels { axis: &'static str },

    #[error("价格为负 (行 {row}, 列 {col}): {value}")]
    NegativePrice { row: usize, col: usize, value: f64 },

    #[error("区间包含形态不支持点规范化")]
    RangeShape,
}

// ==========================================
// 规范形态 (Canonical)
// ==========================================
/// 规范网格行: 数值化的 drop + 整行价格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalDropRow {
    pub drop: f64,
    pub prices: Vec<f64>,
}

/// 规范网格: 唯一的查询口径
///
/// 单位为强制字段 —— 推断只发生在导入/遗留读取时,查询路径不再猜测。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalGrid {
    pub unit: MeasurementUnit,
    #[serde(rename = "widthColumns")]
    pub width_columns: Vec<f64>,
    #[serde(rename = "dropRows")]
    pub drop_rows: Vec<CanonicalDropRow>,
}

impl CanonicalGrid {
    /// 校验结构不变量
    ///
    /// # 不变量
    /// - 至少一个宽度列、一行数据
    /// - 每行价格数与宽度列数一致
    /// - 价格非负
    pub fn validate(&self) -> Result<(), GridShapeError> {
        if self.width_columns.is_empty() || self.drop_rows.is_empty() {
            return Err(GridShapeError::Empty);
        }
        let expected = self.width_columns.len();
        for (i, row) in self.drop_rows.iter().enumerate() {
            if row.prices.len() != expected {
                return Err(GridShapeError::RaggedRow {
                    row: i + 1,
                    expected,
                    actual: row.prices.len(),
                });
            }
            for (j, price) in row.prices.iter().enumerate() {
                if *price < 0.0 {
                    return Err(GridShapeError::NegativePrice {
                        row: i + 1,
                        col: j + 1,
                        value: *price,
                    });
                }
            }
        }
        Ok(())
    }
}

// ==========================================
// 遗留形态
// ==========================================
/// CSV 上传形态的行: 字符串标签 + 整行价格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabeledDropRow {
    pub drop: String,
    pub prices: Vec<f64>,
}

/// 区间包含形态的行: [drop_min, drop_max] + 按列键取价
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyRangeRow {
    pub drop_min: f64,
    pub drop_max: f64,
    #[serde(flatten)]
    pub prices: BTreeMap<String, f64>,
}

/// 区间包含形态的列: [width_min, width_max] + 列键
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegacyRangeColumn {
    pub width_min: f64,
    pub width_max: f64,
    pub key: String,
}

/// 网格数据联合类型
///
/// 磁盘上不带标签(历史数据如此),反序列化按变体依次尝试;
/// Canonical 排最前(宽度列为数值且带 unit 字段,与 CSV 上传形态可区分)。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridData {
    /// 规范形态(新导入统一落为此形态)
    Canonical(CanonicalGrid),

    /// CSV 上传形态
    CsvUpload {
        #[serde(rename = "widthColumns")]
        width_columns: Vec<String>,
        #[serde(rename = "dropRows")]
        drop_rows: Vec<LabeledDropRow>,
    },

    /// 厂商导入形态: prices[heightIndex][widthIndex]
    Matrix {
        widths: Vec<f64>,
        heights: Vec<f64>,
        prices: Vec<Vec<f64>>,
    },

    /// 区间标签形态: 标签按数值解析后最近匹配
    RangeLabels {
        #[serde(rename = "dropRanges")]
        drop_ranges: Vec<String>,
        #[serde(rename = "widthRanges")]
        width_ranges: Vec<String>,
        prices: Vec<Vec<f64>>,
    },

    /// 区间包含形态: 仅闭区间包含,无最近匹配回退
    LegacyRanges {
        rows: Vec<LegacyRangeRow>,
        columns: Vec<LegacyRangeColumn>,
    },
}

/// 从标签中提取第一个数值
///
/// 兼容 "150" / "150-200" / "150cm" / "Up to 150" 等历史标签写法
pub fn parse_measure_label(label: &str) -> Option<f64> {
    let bytes = label.as_bytes();
    let mut start = None;
    let mut end = 0;
    for (i, b) in bytes.iter().enumerate() {
        let is_num = b.is_ascii_digit() || (*b == b'.' && start.is_some());
        match (start, is_num) {
            (None, true) => {
                start = Some(i);
                end = i + 1;
            }
            (Some(_), true) => end = i + 1,
            (Some(_), false) => break,
            (None, false) => {}
        }
    }
    let s = start?;
    label[s..end].parse::<f64>().ok()
}

impl GridData {
    /// 尝试从动态 JSON 值识别网格形态
    ///
    /// 不匹配任何已知形态时返回 None(调用方按"无法识别"处理,不报错)
    pub fn from_value(value: &serde_json::Value) -> Option<GridData> {
        if !value.is_object() {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }

    /// 形态自带的单位声明(仅规范形态有)
    pub fn stated_unit(&self) -> Option<MeasurementUnit> {
        match self {
            GridData::Canonical(grid) => Some(grid.unit),
            _ => None,
        }
    }

    /// 两轴的全部可解析数值,用于单位量级推断
    pub fn axis_values(&self) -> Vec<f64> {
        match self {
            GridData::Canonical(grid) => {
                let mut values = grid.width_columns.clone();
                values.extend(grid.drop_rows.iter().map(|r| r.drop));
                values
            }
            GridData::CsvUpload {
                width_columns,
                drop_rows,
            } => width_columns
                .iter()
                .map(String::as_str)
                .chain(drop_rows.iter().map(|r| r.drop.as_str()))
                .filter_map(parse_measure_label)
                .collect(),
            GridData::Matrix {
                widths, heights, ..
            } => widths.iter().chain(heights.iter()).copied().collect(),
            GridData::RangeLabels {
                drop_ranges,
                width_ranges,
                ..
            } => width_ranges
                .iter()
                .map(String::as_str)
                .chain(drop_ranges.iter().map(String::as_str))
                .filter_map(parse_measure_label)
                .collect(),
            GridData::LegacyRanges { rows, columns } => rows
                .iter()
                .flat_map(|r| [r.drop_min, r.drop_max])
                .chain(columns.iter().flat_map(|c| [c.width_min, c.width_max]))
                .collect(),
        }
    }

    /// 是否完全没有可匹配数据
    pub fn is_empty(&self) -> bool {
        match self {
            GridData::Canonical(grid) => {
                grid.width_columns.is_empty() || grid.drop_rows.is_empty()
            }
            GridData::CsvUpload {
                width_columns,
                drop_rows,
            } => width_columns.is_empty() || drop_rows.is_empty(),
            GridData::Matrix {
                widths,
                heights,
                prices,
            } => widths.is_empty() || heights.is_empty() || prices.is_empty(),
            GridData::RangeLabels {
                drop_ranges,
                width_ranges,
                prices,
            } => drop_ranges.is_empty() || width_ranges.is_empty() || prices.is_empty(),
            GridData::LegacyRanges { rows, columns } => rows.is_empty() || columns.is_empty(),
        }
    }

    /// 规范化适配器: 遗留点形态 → 规范形态
    ///
    /// # 参数
    /// - unit: 明确给定的单位(给定即生效,覆盖推断)
    /// - mm_threshold: 单位推断阈值
    ///
    /// # 规则
    /// - 无法解析的个别标签跳过(连同其行/列);整轴无可解析标签才报错
    /// - 行长度必须与宽度列数一致
    /// - 区间包含形态不做点规范化(查询路径走包含匹配)
    pub fn normalize(
        &self,
        unit: Option<MeasurementUnit>,
        mm_threshold: f64,
    ) -> Result<CanonicalGrid, GridShapeError> {
        if self.is_empty() {
            return Err(GridShapeError::Empty);
        }

        let effective_unit = |data: &GridData| {
            unit.or_else(|| data.stated_unit()).unwrap_or_else(|| {
                let inferred =
                    MeasurementUnit::infer_from_magnitude(data.axis_values(), mm_threshold);
                tracing::debug!("网格未声明单位，按量级推断为 {}", inferred);
                inferred
            })
        };

        match self {
            GridData::Canonical(grid) => {
                grid.validate()?;
                let mut canonical = grid.clone();
                if let Some(u) = unit {
                    canonical.unit = u;
                }
                Ok(canonical)
            }

            GridData::CsvUpload {
                width_columns,
                drop_rows,
            } => {
                // 宽度列: 保留可解析的标签及其原始列号
                let cols: Vec<(f64, usize)> = width_columns
                    .iter()
                    .enumerate()
                    .filter_map(|(i, label)| parse_measure_label(label).map(|v| (v, i)))
                    .collect();
                if cols.is_empty() {
                    return Err(GridShapeError::NoNumericLabels { axis: "width" });
                }

                let expected = width_columns.len();
                let mut rows = Vec::new();
                for (i, row) in drop_rows.iter().enumerate() {
                    if row.prices.len() != expected {
                        return Err(GridShapeError::RaggedRow {
                            row: i + 1,
                            expected,
                            actual: row.prices.len(),
                        });
                    }
                    let Some(drop) = parse_measure_label(&row.drop) else {
                        continue;
                    };
                    let prices: Vec<f64> =
                        cols.iter().map(|(_, idx)| row.prices[*idx]).collect();
                    rows.push(CanonicalDropRow { drop, prices });
                }
                if rows.is_empty() {
                    return Err(GridShapeError::NoNumericLabels { axis: "drop" });
                }

                let canonical = CanonicalGrid {
                    unit: effective_unit(self),
                    width_columns: cols.iter().map(|(v, _)| *v).collect(),
                    drop_rows: rows,
                };
                canonical.validate()?;
                Ok(canonical)
            }

            GridData::Matrix {
                widths,
                heights,
                prices,
            } => {
                if prices.len() != heights.len() {
                    return Err(GridShapeError::RaggedRow {
                        row: prices.len() + 1,
                        expected: heights.len(),
                        actual: prices.len(),
                    });
                }
                let rows = heights
                    .iter()
                    .zip(prices.iter())
                    .map(|(h, row)| CanonicalDropRow {
                        drop: *h,
                        prices: row.clone(),
                    })
                    .collect();
                let canonical = CanonicalGrid {
                    unit: effective_unit(self),
                    width_columns: widths.clone(),
                    drop_rows: rows,
                };
                canonical.validate()?;
                Ok(canonical)
            }

            GridData::RangeLabels {
                drop_ranges,
                width_ranges,
                prices,
            } => {
                let cols: Vec<(f64, usize)> = width_ranges
                    .iter()
                    .enumerate()
                    .filter_map(|(i, label)| parse_measure_label(label).map(|v| (v, i)))
                    .collect();
                if cols.is_empty() {
                    return Err(GridShapeError::NoNumericLabels { axis: "width" });
                }

                let expected = width_ranges.len();
                let mut rows = Vec::new();
                for (i, label) in drop_ranges.iter().enumerate() {
                    let Some(price_row) = prices.get(i) else {
                        return Err(GridShapeError::RaggedRow {
                            row: i + 1,
                            expected,
                            actual: 0,
                        });
                    };
                    if price_row.len() != expected {
                        return Err(GridShapeError::RaggedRow {
                            row: i + 1,
                            expected,
                            actual: price_row.len(),
                        });
                    }
                    let Some(drop) = parse_measure_label(label) else {
                        continue;
                    };
                    let prices: Vec<f64> =
                        cols.iter().map(|(_, idx)| price_row[*idx]).collect();
                    rows.push(CanonicalDropRow { drop, prices });
                }
                if rows.is_empty() {
                    return Err(GridShapeError::NoNumericLabels { axis: "drop" });
                }

                let canonical = CanonicalGrid {
                    unit: effective_unit(self),
                    width_columns: cols.iter().map(|(v, _)| *v).collect(),
                    drop_rows: rows,
                };
                canonical.validate()?;
                Ok(canonical)
            }

            GridData::LegacyRanges { .. } => Err(GridShapeError::RangeShape),
        }
    }
}

// ==========================================
// PricingGrid - 价格网格实体
// ==========================================
// 生命周期: CSV/Excel 上传创建,只读使用,软删除(active)或硬删除
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingGrid {
    // ===== 主键 =====
    pub grid_id: String, // 网格唯一标识(uuid)

    // ===== 基础信息 =====
    pub name: String,                      // 人读名称(厂商价目表名)
    pub unit: Option<MeasurementUnit>,     // 明确声明的单位(可缺失,遗留数据)
    pub grid_data: GridData,               // 网格数据

    // ===== 生命周期 =====
    pub active: bool, // 软删除标记

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PricingGrid {
    /// 创建新网格(导入路径)
    pub fn new(name: impl Into<String>, unit: Option<MeasurementUnit>, grid_data: GridData) -> Self {
        let now = Utc::now();
        Self {
            grid_id: Uuid::new_v4().to_string(),
            name: name.into(),
            unit,
            grid_data,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }
}
