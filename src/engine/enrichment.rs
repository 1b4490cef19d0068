// ==========================================
// 窗帘软装报价系统 - 测量派生引擎
// ==========================================
// 职责: 保存工作单前,由原始测量派生面料用量字段
// 红线1: 上游计价器已给出 cost_summary 的记录直通,绝不改写
// 红线2: 硬质帘/百叶窗/墙纸的成本字段原样保留,绝不重算
// 红线3: 必备值(轨宽/帘高/褶皱倍数/幅宽)缺一不派生,绝不猜默认值
// ==========================================

use crate::domain::types::{CurtainType, TreatmentCategory};
use crate::domain::window_summary::WindowSummary;
use crate::engine::units::{map_f64, map_str, optional_value_to_f64};
use serde_json::{json, Value};

// ==========================================
// 派生输入/输出
// ==========================================

/// 窗帘派生输入,全部厘米口径
///
/// 必备四项之外的量缺失按 0 参与计算
#[derive(Debug, Clone, PartialEq)]
pub struct CurtainInputs {
    pub rail_width_cm: f64,
    pub drop_cm: f64,
    pub fullness_ratio: f64,
    pub fabric_width_cm: f64,
    pub pooling_cm: f64,
    pub side_hem_cm: f64,
    pub seam_hem_cm: f64,
    pub header_allowance_cm: f64,
    pub bottom_hem_cm: f64,
    pub return_left_cm: f64,
    pub return_right_cm: f64,
    pub curtain_count: u32,
}

/// 窗帘派生输出
#[derive(Debug, Clone, PartialEq)]
pub struct CurtainMetrics {
    pub required_width_cm: f64,
    pub total_side_hems_cm: f64,
    pub total_width_with_allowances_cm: f64,
    pub widths_required: u32,
    pub seams_required: u32,
    pub seam_allowance_total_cm: f64,
    pub total_drop_per_width_cm: f64,
    pub fabric_capacity_width_total_cm: f64,
    pub leftover_width_total_cm: f64,
    pub leftover_per_panel_cm: f64,
}

/// 窗帘面料用量派生(纯函数)
///
/// # 公式
/// - required_width = rail_width × fullness
/// - total_side_hems = side_hem × 2 × curtain_count
/// - total_width_with_allowances = required_width + return_l + return_r + total_side_hems
/// - widths_required = max(1, ceil(total_width_with_allowances / fabric_width))
/// - seams_required = widths_required - 1
/// - seam_allowance_total = widths_required > 1 时 (widths_required-1) × seam_hem × 2,否则 0
/// - total_drop_per_width = drop + header_allowance + bottom_hem + pooling
/// - fabric_capacity_width_total = widths_required × fabric_width
/// - leftover_width_total = max(0, capacity - total_width_with_allowances)
/// - leftover_per_panel = leftover_width_total / widths_required
pub fn derive_curtain_metrics(inputs: &CurtainInputs) -> CurtainMetrics {
    let required_width_cm = inputs.rail_width_cm * inputs.fullness_ratio;
    let total_side_hems_cm = inputs.side_hem_cm * 2.0 * inputs.curtain_count as f64;
    let total_width_with_allowances_cm =
        required_width_cm + inputs.return_left_cm + inputs.return_right_cm + total_side_hems_cm;

    let widths_required =
        ((total_width_with_allowances_cm / inputs.fabric_width_cm).ceil().max(1.0)) as u32;
    let seams_required = widths_required.saturating_sub(1);
    let seam_allowance_total_cm = if widths_required > 1 {
        (widths_required - 1) as f64 * inputs.seam_hem_cm * 2.0
    } else {
        0.0
    };

    let total_drop_per_width_cm =
        inputs.drop_cm + inputs.header_allowance_cm + inputs.bottom_hem_cm + inputs.pooling_cm;

    let fabric_capacity_width_total_cm = widths_required as f64 * inputs.fabric_width_cm;
    let leftover_width_total_cm =
        (fabric_capacity_width_total_cm - total_width_with_allowances_cm).max(0.0);
    let leftover_per_panel_cm = if widths_required > 0 {
        leftover_width_total_cm / widths_required as f64
    } else {
        0.0
    };

    CurtainMetrics {
        required_width_cm,
        total_side_hems_cm,
        total_width_with_allowances_cm,
        widths_required,
        seams_required,
        seam_allowance_total_cm,
        total_drop_per_width_cm,
        fabric_capacity_width_total_cm,
        leftover_width_total_cm,
        leftover_per_panel_cm,
    }
}

// ==========================================
// EnrichmentEngine - 保存前富集
// ==========================================
pub struct EnrichmentEngine;

impl EnrichmentEngine {
    /// 富集工作单汇总记录
    ///
    /// # 守卫(按序判定,首个命中即返回)
    /// 1. cost_summary 已存在 → 直通(仅保证两个明细子对象非缺失)
    /// 2. 类别为硬质帘/百叶窗/墙纸 → 成本字段原样保留,不派生
    ///
    /// # 窗帘派生
    /// 候选字段按优先级读取;必备四项(轨宽/帘高/褶皱倍数/幅宽)
    /// 齐全才派生,否则原样返回(开发期告警)。
    pub fn enrich(summary: WindowSummary) -> WindowSummary {
        // 守卫 1: 权威成本直通
        // measurements_details / fabric_details 为非 Option 字段,
        // 反序列化缺失时已默认为空对象,无需补写
        if summary.cost_summary.is_some() {
            return summary;
        }

        // 守卫 2: 非布艺类别,成本字段防御性保留
        if let Some(label) = summary.category_label() {
            if TreatmentCategory::from_label(label).bypasses_curtain_derivation() {
                return Self::reassert_costs(summary);
            }
        }

        Self::derive_for_curtain(summary)
    }

    /// 非布艺类别: 成本字段逐一从输入重申(防御性拷贝,不重算)
    fn reassert_costs(summary: WindowSummary) -> WindowSummary {
        let mut out = summary.clone();
        out.total_cost = summary.total_cost;
        out.options_cost = summary.options_cost;
        out.selected_options = summary.selected_options;
        out.fabric_cost = summary.fabric_cost;
        out.lining_cost = summary.lining_cost;
        out.manufacturing_cost = summary.manufacturing_cost;
        out.hardware_cost = summary.hardware_cost;
        out
    }

    fn derive_for_curtain(mut summary: WindowSummary) -> WindowSummary {
        let md = &summary.measurements_details;
        let fd = &summary.fabric_details;

        // ===== 候选字段读取(第一个可解析者生效) =====
        let rail_width = map_f64(md, &["rail_width_cm", "rail_width"])
            .or_else(|| optional_value_to_f64(summary.rail_width.as_ref()));
        let drop = map_f64(md, &["drop_cm", "drop"])
            .or_else(|| optional_value_to_f64(summary.drop.as_ref()));
        let fullness = map_f64(md, &["fullness_ratio", "fullness"])
            .or_else(|| optional_value_to_f64(summary.fullness_ratio.as_ref()));
        let fabric_width = map_f64(md, &["fabric_width_cm", "fabric_width"])
            .or_else(|| map_f64(fd, &["width_cm", "width", "fabric_width_cm"]))
            .or_else(|| optional_value_to_f64(summary.fabric_width.as_ref()));

        let pooling = map_f64(md, &["pooling_cm", "pooling_amount", "pooling"]).unwrap_or(0.0);
        let side_hem = map_f64(md, &["side_hem_cm", "side_hem", "side_hems"]).unwrap_or(0.0);
        let seam_hem = map_f64(md, &["seam_hem_cm", "seam_hem"]).unwrap_or(0.0);
        let header_allowance =
            map_f64(md, &["header_allowance_cm", "header_allowance"]).unwrap_or(0.0);
        let bottom_hem = map_f64(md, &["bottom_hem_cm", "bottom_hem"]).unwrap_or(0.0);
        let return_left = map_f64(md, &["return_left_cm", "return_left"]).unwrap_or(0.0);
        let return_right = map_f64(md, &["return_right_cm", "return_right"]).unwrap_or(0.0);

        let curtain_type = map_str(md, &["curtain_type"])
            .or_else(|| summary.curtain_type.clone())
            .map(|label| CurtainType::from_label(&label))
            .unwrap_or(CurtainType::Single);
        let curtain_count = map_f64(md, &["curtain_count"])
            .filter(|v| *v >= 1.0)
            .map(|v| v as u32)
            .unwrap_or_else(|| curtain_type.panel_count());

        // ===== 必备值闸门 =====
        // 缺一不派生;幅宽非正同样视为缺失(除零保护)
        let (Some(rail_width), Some(drop), Some(fullness), Some(fabric_width)) = (
            rail_width,
            drop,
            fullness,
            fabric_width.filter(|w| *w > 0.0),
        ) else {
            if cfg!(debug_assertions) {
                tracing::warn!(
                    window_id = %summary.window_id,
                    "必备测量缺失（轨宽/帘高/褶皱倍数/幅宽），跳过派生"
                );
            }
            return summary;
        };

        let inputs = CurtainInputs {
            rail_width_cm: rail_width,
            drop_cm: drop,
            fullness_ratio: fullness,
            fabric_width_cm: fabric_width,
            pooling_cm: pooling,
            side_hem_cm: side_hem,
            seam_hem_cm: seam_hem,
            header_allowance_cm: header_allowance,
            bottom_hem_cm: bottom_hem,
            return_left_cm: return_left,
            return_right_cm: return_right,
            curtain_count,
        };
        let metrics = derive_curtain_metrics(&inputs);

        // 调用方已给定的 widths_required 优先(顶层或明细内)
        let widths_required = map_f64(&summary.measurements_details, &["widths_required"])
            .or(summary.widths_required)
            .unwrap_or(metrics.widths_required as f64);

        // ===== 回写: 原始量 + 派生量统一落入测量明细(_cm 口径) =====
        let md = &mut summary.measurements_details;
        insert_num(md, "rail_width_cm", rail_width);
        insert_num(md, "drop_cm", drop);
        insert_num(md, "pooling_cm", pooling);
        insert_num(md, "side_hem_cm", side_hem);
        insert_num(md, "seam_hem_cm", seam_hem);
        insert_num(md, "header_allowance_cm", header_allowance);
        insert_num(md, "bottom_hem_cm", bottom_hem);
        insert_num(md, "return_left_cm", return_left);
        insert_num(md, "return_right_cm", return_right);
        insert_num(md, "fullness_ratio", fullness);
        insert_num(md, "fabric_width_cm", fabric_width);
        md.insert(
            "curtain_type".to_string(),
            Value::String(curtain_type.to_string()),
        );
        md.insert("curtain_count".to_string(), json!(curtain_count));

        insert_num(md, "required_width_cm", metrics.required_width_cm);
        insert_num(md, "total_side_hems_cm", metrics.total_side_hems_cm);
        insert_num(
            md,
            "total_width_with_allowances_cm",
            metrics.total_width_with_allowances_cm,
        );
        md.insert("widths_required".to_string(), json!(widths_required));
        md.insert("seams_required".to_string(), json!(metrics.seams_required));
        insert_num(md, "seam_allowance_total_cm", metrics.seam_allowance_total_cm);
        insert_num(md, "total_drop_per_width_cm", metrics.total_drop_per_width_cm);
        insert_num(
            md,
            "fabric_capacity_width_total_cm",
            metrics.fabric_capacity_width_total_cm,
        );
        insert_num(md, "leftover_width_total_cm", metrics.leftover_width_total_cm);
        insert_num(md, "leftover_per_panel_cm", metrics.leftover_per_panel_cm);

        summary.widths_required = Some(widths_required);

        // 面料明细归一: 幅宽字段统一回填生效值,下游渲染不再重复解析
        summary
            .fabric_details
            .insert("width_cm".to_string(), json!(fabric_width));

        summary
    }
}

/// 有限浮点写入(NaN/Inf 不落盘)
fn insert_num(map: &mut serde_json::Map<String, Value>, key: &str, value: f64) {
    if let Some(number) = serde_json::Number::from_f64(value) {
        map.insert(key.to_string(), Value::Number(number));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn curtain_inputs() -> CurtainInputs {
        CurtainInputs {
            rail_width_cm: 200.0,
            drop_cm: 220.0,
            fullness_ratio: 2.0,
            fabric_width_cm: 137.0,
            pooling_cm: 0.0,
            side_hem_cm: 0.0,
            seam_hem_cm: 0.0,
            header_allowance_cm: 10.0,
            bottom_hem_cm: 15.0,
            return_left_cm: 0.0,
            return_right_cm: 0.0,
            curtain_count: 1,
        }
    }

    // ==========================================
    // 测试 1: 派生公式
    // ==========================================

    #[test]
    fn test_derive_reference_case() {
        // 轨宽 200 × 褶皱 2.0,幅宽 137,无侧边/回折
        let metrics = derive_curtain_metrics(&curtain_inputs());
        assert_eq!(metrics.required_width_cm, 400.0);
        assert_eq!(metrics.total_width_with_allowances_cm, 400.0);
        assert_eq!(metrics.widths_required, 3); // ceil(400/137)
        assert_eq!(metrics.seams_required, 2);
        assert_eq!(metrics.total_drop_per_width_cm, 245.0); // 220+10+15+0
        assert_eq!(metrics.fabric_capacity_width_total_cm, 411.0);
        assert_eq!(metrics.leftover_width_total_cm, 11.0);
        assert!((metrics.leftover_per_panel_cm - 11.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_derive_single_width_no_seams() {
        let mut inputs = curtain_inputs();
        inputs.rail_width_cm = 60.0; // 120 需求宽 < 137 幅宽
        inputs.seam_hem_cm = 1.5;
        let metrics = derive_curtain_metrics(&inputs);
        assert_eq!(metrics.widths_required, 1);
        assert_eq!(metrics.seams_required, 0);
        assert_eq!(metrics.seam_allowance_total_cm, 0.0); // 单幅无拼缝
    }

    #[test]
    fn test_derive_pair_side_hems() {
        let mut inputs = curtain_inputs();
        inputs.side_hem_cm = 2.5;
        inputs.curtain_count = 2;
        let metrics = derive_curtain_metrics(&inputs);
        assert_eq!(metrics.total_side_hems_cm, 10.0); // 2.5 × 2 × 2
        assert_eq!(metrics.total_width_with_allowances_cm, 410.0);
    }

    #[test]
    fn test_derive_seam_allowance() {
        let mut inputs = curtain_inputs();
        inputs.seam_hem_cm = 1.5;
        let metrics = derive_curtain_metrics(&inputs);
        // 3 幅 2 缝,每缝两侧
        assert_eq!(metrics.seam_allowance_total_cm, 2.0 * 1.5 * 2.0);
    }

    #[test]
    fn test_derive_widths_floor_at_one() {
        let mut inputs = curtain_inputs();
        inputs.rail_width_cm = 0.0;
        let metrics = derive_curtain_metrics(&inputs);
        assert_eq!(metrics.widths_required, 1);
    }

    // ==========================================
    // 测试 2: 守卫条件
    // ==========================================

    #[test]
    fn test_guard_cost_summary_passthrough() {
        let mut summary = WindowSummary::new("w-1");
        summary.cost_summary = Some(json!({ "total": 1280.0 }));
        summary.total_cost = Some(1280.0);
        summary.rail_width = Some(json!(200));
        summary.drop = Some(json!(220));
        summary.fullness_ratio = Some(json!(2.0));
        summary.fabric_width = Some(json!(137));

        let out = EnrichmentEngine::enrich(summary);
        // 权威成本直通: 即使测量齐全也不派生
        assert!(out.measurements_details.get("widths_required").is_none());
        assert_eq!(out.total_cost, Some(1280.0));
    }

    #[test]
    fn test_guard_hard_treatment_costs_preserved() {
        for label in ["roller_blind", "shutters", "wallpaper", "venetian blind"] {
            let mut summary = WindowSummary::new("w-1");
            summary.treatment_category = Some(label.to_string());
            summary.total_cost = Some(640.0);
            summary.options_cost = Some(40.0);
            summary.fabric_cost = Some(100.0);
            summary.lining_cost = Some(0.0);
            summary.manufacturing_cost = Some(400.0);
            summary.hardware_cost = Some(100.0);
            summary.selected_options = Some(json!([{ "name": "motor" }]));
            // 即使测量齐全,也不得触发窗帘派生
            summary.rail_width = Some(json!(200));
            summary.drop = Some(json!(220));
            summary.fullness_ratio = Some(json!(2.0));
            summary.fabric_width = Some(json!(137));

            let out = EnrichmentEngine::enrich(summary);
            assert_eq!(out.total_cost, Some(640.0), "类别 {label}");
            assert_eq!(out.options_cost, Some(40.0));
            assert_eq!(out.manufacturing_cost, Some(400.0));
            assert_eq!(out.selected_options, Some(json!([{ "name": "motor" }])));
            assert!(out.measurements_details.get("widths_required").is_none());
        }
    }

    #[test]
    fn test_guard_essential_value_missing_skips_derivation() {
        // 四个必备值逐一缺失,均不派生
        let base = |skip: &str| {
            let mut summary = WindowSummary::new("w-1");
            summary.treatment_category = Some("curtains".into());
            if skip != "rail_width" {
                summary.rail_width = Some(json!(200));
            }
            if skip != "drop" {
                summary.drop = Some(json!(220));
            }
            if skip != "fullness_ratio" {
                summary.fullness_ratio = Some(json!(2.0));
            }
            if skip != "fabric_width" {
                summary.fabric_width = Some(json!(137));
            }
            summary
        };

        for skip in ["rail_width", "drop", "fullness_ratio", "fabric_width"] {
            let out = EnrichmentEngine::enrich(base(skip));
            assert!(
                out.measurements_details.is_empty(),
                "缺 {skip} 时不应派生"
            );
        }
    }

    #[test]
    fn test_unparseable_fabric_width_skips_derivation() {
        let mut summary = WindowSummary::new("w-1");
        summary.rail_width = Some(json!(200));
        summary.drop = Some(json!(220));
        summary.fullness_ratio = Some(json!(2.0));
        summary.fabric_width = Some(json!("one thirty seven"));

        let out = EnrichmentEngine::enrich(summary);
        assert!(out.measurements_details.is_empty());
    }

    // ==========================================
    // 测试 3: 派生回写
    // ==========================================

    #[test]
    fn test_enrich_writes_cm_fields() {
        let mut summary = WindowSummary::new("w-1");
        summary.treatment_category = Some("curtains".into());
        summary.rail_width = Some(json!("200")); // 数字字符串
        summary.drop = Some(json!(220));
        summary.fullness_ratio = Some(json!(2.0));
        summary.fabric_width = Some(json!(137));
        summary
            .measurements_details
            .insert("header_allowance_cm".into(), json!(10));
        summary
            .measurements_details
            .insert("bottom_hem_cm".into(), json!(15));

        let out = EnrichmentEngine::enrich(summary);
        let md = &out.measurements_details;
        assert_eq!(md.get("rail_width_cm"), Some(&json!(200.0)));
        assert_eq!(md.get("required_width_cm"), Some(&json!(400.0)));
        assert_eq!(md.get("widths_required"), Some(&json!(3.0)));
        assert_eq!(md.get("seams_required"), Some(&json!(2)));
        assert_eq!(md.get("total_drop_per_width_cm"), Some(&json!(245.0)));
        assert_eq!(out.widths_required, Some(3.0));
        // 面料明细归一
        assert_eq!(out.fabric_details.get("width_cm"), Some(&json!(137.0)));
    }

    #[test]
    fn test_caller_supplied_widths_required_wins() {
        let mut summary = WindowSummary::new("w-1");
        summary.rail_width = Some(json!(200));
        summary.drop = Some(json!(220));
        summary.fullness_ratio = Some(json!(2.0));
        summary.fabric_width = Some(json!(137));
        summary.widths_required = Some(4.0); // 调用方给定,派生值为 3

        let out = EnrichmentEngine::enrich(summary);
        assert_eq!(out.widths_required, Some(4.0));
        assert_eq!(
            out.measurements_details.get("widths_required"),
            Some(&json!(4.0))
        );
    }

    #[test]
    fn test_enrich_idempotent() {
        let mut summary = WindowSummary::new("w-1");
        summary.treatment_category = Some("curtains".into());
        summary.rail_width = Some(json!(200));
        summary.drop = Some(json!(220));
        summary.fullness_ratio = Some(json!(2.0));
        summary.fabric_width = Some(json!(137));
        summary
            .measurements_details
            .insert("pooling_cm".into(), json!(5));

        let once = EnrichmentEngine::enrich(summary);
        let twice = EnrichmentEngine::enrich(once.clone());
        assert_eq!(once.measurements_details, twice.measurements_details);
        assert_eq!(once.fabric_details, twice.fabric_details);
        assert_eq!(once.widths_required, twice.widths_required);
    }
}
