// ==========================================
// 窗帘软装报价系统 - 网格表格校验与构建
// ==========================================
// 职责: 原始单元格表 → CSV 上传形态 → 规范形态
// 约定: 首行 Drop/Width,<w1>,<w2>,... ;后续行 <帘高标签>,<价格>...
// 红线: 行长不一致、价格单元非数值是致命错误,必须点名行列
// ==========================================

use crate::domain::pricing_grid::{parse_measure_label, CanonicalGrid, GridData, LabeledDropRow};
use crate::domain::types::MeasurementUnit;
use crate::importer::error::{ImportError, ImportResult};

/// 表头首格的规范写法
const HEADER_CELL: &str = "drop/width";

// ==========================================
// GridBuilder - 表格 → 网格
// ==========================================
pub struct GridBuilder;

impl GridBuilder {
    /// 原始单元格表 → CSV 上传形态
    ///
    /// # 校验
    /// - 至少表头 + 一行数据
    /// - 表头首格为 Drop/Width(大小写不敏感),其后至少一个宽度标签
    /// - 每行长度与表头一致(行号按文件行计,点名报错)
    /// - 价格单元必须解析为非负浮点数
    /// - 帘高标签必须含数值(规范化需要)
    pub fn build_from_rows(rows: &[Vec<String>]) -> ImportResult<GridData> {
        if rows.len() < 2 {
            return Err(ImportError::EmptyTable);
        }

        // ===== 表头 =====
        let header = &rows[0];
        let first_cell = header.first().map(String::as_str).unwrap_or("");
        if first_cell.trim().to_lowercase() != HEADER_CELL {
            return Err(ImportError::HeaderInvalid {
                found: first_cell.to_string(),
            });
        }
        let width_columns: Vec<String> = header[1..].iter().map(|c| c.trim().to_string()).collect();
        if width_columns.is_empty() || width_columns.iter().all(|c| c.is_empty()) {
            return Err(ImportError::HeaderInvalid {
                found: header.join(","),
            });
        }

        // ===== 数据行 =====
        let expected = header.len();
        let mut drop_rows = Vec::with_capacity(rows.len() - 1);
        for (i, row) in rows[1..].iter().enumerate() {
            let row_no = i + 2; // 文件行号(表头为第 1 行)

            if row.len() != expected {
                return Err(ImportError::RowLengthMismatch {
                    row: row_no,
                    expected,
                    actual: row.len(),
                });
            }

            let label = row[0].trim().to_string();
            if parse_measure_label(&label).is_none() {
                return Err(ImportError::DropLabelInvalid { row: row_no, label });
            }

            let mut prices = Vec::with_capacity(expected - 1);
            for (j, cell) in row[1..].iter().enumerate() {
                let price: f64 = cell.trim().parse().map_err(|_| ImportError::PriceCellInvalid {
                    row: row_no,
                    column: j + 2,
                    value: cell.clone(),
                })?;
                if !price.is_finite() || price < 0.0 {
                    return Err(ImportError::PriceCellInvalid {
                        row: row_no,
                        column: j + 2,
                        value: cell.clone(),
                    });
                }
                prices.push(price);
            }

            drop_rows.push(LabeledDropRow { drop: label, prices });
        }

        Ok(GridData::CsvUpload {
            width_columns,
            drop_rows,
        })
    }

    /// CSV 上传形态 → 规范形态(单位一次性定标)
    ///
    /// # 规则
    /// - 明确给定单位 → 直接生效
    /// - 未给定 → 按量级推断一次,并记迁移式日志(查询路径不再推断)
    ///
    /// # 返回
    /// - (CanonicalGrid, 是否推断得到单位)
    pub fn canonicalize(
        data: &GridData,
        explicit_unit: Option<MeasurementUnit>,
        mm_threshold: f64,
    ) -> ImportResult<(CanonicalGrid, bool)> {
        let inferred = explicit_unit.is_none() && data.stated_unit().is_none();
        let canonical = data.normalize(explicit_unit, mm_threshold)?;

        if inferred {
            tracing::info!(
                "导入网格未声明单位，按数值量级推断为 {}（阈值 {}）",
                canonical.unit,
                mm_threshold
            );
        }

        Ok((canonical, inferred))
    }
}
