// ==========================================
// 窗帘软装报价系统 - 窗户报价汇总领域模型
// ==========================================
// 红线: 非布艺类别的成本字段由调用方给定,此实体只承载不推算
// 说明: 工作单是分步录入的,字段天然残缺;明细子对象保持松散
// JSON 结构(数值可能以数字或数字字符串出现),由引擎层容错读取。
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ==========================================
// WindowSummary - 单窗制品成本记录
// ==========================================
// 生命周期: 每次保存工作单时创建/更新,按 window_id upsert,
// 报价/发票渲染读取。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowSummary {
    // ===== 主键 =====
    pub window_id: String, // 窗户唯一标识(upsert 键)

    // ===== 基础信息 =====
    #[serde(default)]
    pub room: Option<String>, // 房间名
    #[serde(default)]
    pub window_label: Option<String>, // 窗户标签

    // ===== 制品信息 =====
    #[serde(default)]
    pub treatment_category: Option<String>, // 制品类别(自由文本标签)
    #[serde(default)]
    pub treatment_type: Option<String>, // 制品类型(类别缺失时的回退判定源)
    #[serde(default)]
    pub product_name: Option<String>, // 产品名称
    #[serde(default)]
    pub template_id: Option<String>, // 选用模板
    #[serde(default)]
    pub curtain_type: Option<String>, // 窗帘形式(single/pair)

    // ===== 成本分解 =====
    #[serde(default)]
    pub fabric_cost: Option<f64>, // 面料成本
    #[serde(default)]
    pub lining_cost: Option<f64>, // 里布成本
    #[serde(default)]
    pub manufacturing_cost: Option<f64>, // 加工成本(网格定价输出)
    #[serde(default)]
    pub options_cost: Option<f64>, // 选配项成本
    #[serde(default)]
    pub hardware_cost: Option<f64>, // 五金成本
    #[serde(default)]
    pub heading_cost: Option<f64>, // 帘头成本
    #[serde(default)]
    pub total_cost: Option<f64>, // 成本合计
    #[serde(default)]
    pub total_selling: Option<f64>, // 售价合计

    // ===== 上游计价器输出 =====
    // 存在即视为权威成本,富集步骤直通不改写
    #[serde(default)]
    pub cost_summary: Option<Value>,
    #[serde(default)]
    pub selected_options: Option<Value>,

    // ===== 顶层测量候选字段 =====
    // 明细子对象缺失对应键时的回退来源(数字或数字字符串)
    #[serde(default)]
    pub rail_width: Option<Value>, // 轨道宽度
    #[serde(default)]
    pub drop: Option<Value>, // 帘高
    #[serde(default)]
    pub fullness_ratio: Option<Value>, // 褶皱倍数
    #[serde(default)]
    pub fabric_width: Option<Value>, // 面料幅宽

    // ===== 顶层已有派生值 =====
    // 调用方已给定时保留,不被派生值覆盖
    #[serde(default)]
    pub widths_required: Option<f64>,

    // ===== 明细子对象 =====
    #[serde(default)]
    pub measurements_details: Map<String, Value>, // 测量明细(_cm 后缀口径)
    #[serde(default)]
    pub fabric_details: Map<String, Value>, // 面料明细
    #[serde(default)]
    pub lining_details: Map<String, Value>, // 里布明细
    #[serde(default)]
    pub heading_details: Map<String, Value>, // 帘头明细

    // ===== 审计字段 =====
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Default for WindowSummary {
    fn default() -> Self {
        Self {
            window_id: String::new(),
            room: None,
            window_label: None,
            treatment_category: None,
            treatment_type: None,
            product_name: None,
            template_id: None,
            curtain_type: None,
            fabric_cost: None,
            lining_cost: None,
            manufacturing_cost: None,
            options_cost: None,
            hardware_cost: None,
            heading_cost: None,
            total_cost: None,
            total_selling: None,
            cost_summary: None,
            selected_options: None,
            rail_width: None,
            drop: None,
            fullness_ratio: None,
            fabric_width: None,
            widths_required: None,
            measurements_details: Map::new(),
            fabric_details: Map::new(),
            lining_details: Map::new(),
            heading_details: Map::new(),
            updated_at: Utc::now(),
        }
    }
}

impl WindowSummary {
    /// 创建空白工作单记录
    pub fn new(window_id: impl Into<String>) -> Self {
        Self {
            window_id: window_id.into(),
            ..Default::default()
        }
    }

    /// 类别判定的有效标签: treatment_category 优先,缺失回退 treatment_type
    pub fn category_label(&self) -> Option<&str> {
        self.treatment_category
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| {
                self.treatment_type
                    .as_deref()
                    .filter(|s| !s.trim().is_empty())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_partial_worksheet() {
        // 分步录入的残缺工作单必须可反序列化
        let value = json!({
            "window_id": "w-1",
            "rail_width": "220",
            "measurements_details": { "drop_cm": 210 }
        });
        let summary: WindowSummary = serde_json::from_value(value).unwrap();
        assert_eq!(summary.window_id, "w-1");
        assert!(summary.fabric_cost.is_none());
        assert_eq!(
            summary.measurements_details.get("drop_cm"),
            Some(&json!(210))
        );
    }

    #[test]
    fn test_category_label_fallback() {
        let mut summary = WindowSummary::new("w-1");
        assert_eq!(summary.category_label(), None);

        summary.treatment_type = Some("roller_blind".into());
        assert_eq!(summary.category_label(), Some("roller_blind"));

        summary.treatment_category = Some("curtains".into());
        assert_eq!(summary.category_label(), Some("curtains"));
    }
}
