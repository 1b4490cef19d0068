// ==========================================
// 窗帘软装报价系统 - 领域类型定义
// ==========================================
// 序列化格式: snake_case (与存量数据一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 测量单位 (Measurement Unit)
// ==========================================
// 红线: 规范网格的单位是强制字段,推断只发生在导入/遗留读取时
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementUnit {
    Mm, // 毫米
    Cm, // 厘米
}

/// 幅值推断阈值: 轴数值达到该值按毫米口径读取
pub const DEFAULT_MM_THRESHOLD: f64 = 1000.0;

impl MeasurementUnit {
    /// 从字符串解析单位
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "mm" | "millimeter" | "millimeters" => Some(MeasurementUnit::Mm),
            "cm" | "centimeter" | "centimeters" => Some(MeasurementUnit::Cm),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            MeasurementUnit::Mm => "mm",
            MeasurementUnit::Cm => "cm",
        }
    }

    /// 把以厘米表示的查询值换算到本单位
    pub fn from_cm(&self, value_cm: f64) -> f64 {
        match self {
            MeasurementUnit::Mm => value_cm * 10.0,
            MeasurementUnit::Cm => value_cm,
        }
    }

    /// 把本单位的数值换算为厘米
    pub fn to_cm(&self, value: f64) -> f64 {
        match self {
            MeasurementUnit::Mm => value / 10.0,
            MeasurementUnit::Cm => value,
        }
    }

    /// 按数值量级推断单位（尽力而为的启发式）
    ///
    /// # 规则
    /// - 任一轴数值 >= threshold → 毫米口径
    /// - 否则 → 厘米口径
    /// - 空输入 → 厘米口径（安全默认）
    pub fn infer_from_magnitude(values: impl IntoIterator<Item = f64>, threshold: f64) -> Self {
        let max = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(f64::NEG_INFINITY, f64::max);
        if max >= threshold {
            MeasurementUnit::Mm
        } else {
            MeasurementUnit::Cm
        }
    }
}

impl fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 制品类别 (Treatment Category)
// ==========================================
// 红线: 硬质帘/百叶/墙纸的成本字段由上游给定,派生逻辑绝不触碰
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreatmentCategory {
    Curtains,     // 布艺窗帘
    RomanBlind,   // 罗马帘（布艺）
    RollerBlind,  // 卷帘（硬质）
    VenetianBlind, // 百叶帘（硬质）
    Shutters,     // 百叶窗
    Wallpaper,    // 墙纸
}

impl TreatmentCategory {
    /// 从自由文本标签解析类别
    ///
    /// 未识别的标签按布艺窗帘处理（派生仍受必备值闸门约束）
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "curtain" | "curtains" => TreatmentCategory::Curtains,
            "roman_blind" | "roman_blinds" => TreatmentCategory::RomanBlind,
            "roller_blind" | "roller_blinds" => TreatmentCategory::RollerBlind,
            "venetian_blind" | "venetian_blinds" => TreatmentCategory::VenetianBlind,
            "shutter" | "shutters" => TreatmentCategory::Shutters,
            "wallpaper" | "wallcovering" => TreatmentCategory::Wallpaper,
            _ => TreatmentCategory::Curtains,
        }
    }

    /// 是否绕过窗帘测量派生
    ///
    /// # 规则
    /// - 硬质帘（卷帘/百叶帘）、百叶窗、墙纸 → true（成本字段原样保留）
    /// - 布艺制品（窗帘/罗马帘）→ false
    pub fn bypasses_curtain_derivation(&self) -> bool {
        matches!(
            self,
            TreatmentCategory::RollerBlind
                | TreatmentCategory::VenetianBlind
                | TreatmentCategory::Shutters
                | TreatmentCategory::Wallpaper
        )
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            TreatmentCategory::Curtains => "curtains",
            TreatmentCategory::RomanBlind => "roman_blind",
            TreatmentCategory::RollerBlind => "roller_blind",
            TreatmentCategory::VenetianBlind => "venetian_blind",
            TreatmentCategory::Shutters => "shutters",
            TreatmentCategory::Wallpaper => "wallpaper",
        }
    }
}

impl fmt::Display for TreatmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 窗帘形式 (Curtain Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurtainType {
    Single, // 单幅
    Pair,   // 对开
}

impl CurtainType {
    /// 从自由文本标签解析,未识别按单幅处理
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "pair" | "pairs" | "double" => CurtainType::Pair,
            _ => CurtainType::Single,
        }
    }

    /// 默认帘片数量
    pub fn panel_count(&self) -> u32 {
        match self {
            CurtainType::Single => 1,
            CurtainType::Pair => 2,
        }
    }
}

impl fmt::Display for CurtainType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CurtainType::Single => write!(f, "single"),
            CurtainType::Pair => write!(f, "pair"),
        }
    }
}
