// ==========================================
// 窗帘软装报价系统 - 数值容错读取工具
// ==========================================
// 职责: 松散 JSON 字段的数值/文本提取
// 背景: 工作单数值可能以数字或数字字符串出现,
// 解析失败一律返回 None(缺数据是常态,不是错误)。
// ==========================================

use serde_json::{Map, Value};

/// 从 JSON 值提取有限浮点数
///
/// - 数字 → 原值
/// - 字符串 → trim 后解析
/// - 其他/不可解析/非有限 → None
pub fn value_to_f64(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// 从可选 JSON 值提取有限浮点数
pub fn optional_value_to_f64(value: Option<&Value>) -> Option<f64> {
    value.and_then(value_to_f64)
}

/// 按优先级候选键从明细子对象提取数值,第一个可解析者生效
///
/// # 示例
/// ```
/// use curtain_quote::engine::units::map_f64;
/// use serde_json::json;
///
/// let md = json!({ "rail_width": "220" });
/// let md = md.as_object().unwrap();
/// assert_eq!(map_f64(md, &["rail_width_cm", "rail_width"]), Some(220.0));
/// ```
pub fn map_f64(map: &Map<String, Value>, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .find_map(|key| map.get(*key).and_then(value_to_f64))
}

/// 按优先级候选键提取非空文本
pub fn map_str(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        map.get(*key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_to_f64_accepts_numbers_and_numeric_strings() {
        assert_eq!(value_to_f64(&json!(137)), Some(137.0));
        assert_eq!(value_to_f64(&json!(137.5)), Some(137.5));
        assert_eq!(value_to_f64(&json!(" 137.5 ")), Some(137.5));
    }

    #[test]
    fn test_value_to_f64_rejects_garbage() {
        assert_eq!(value_to_f64(&json!("wide")), None);
        assert_eq!(value_to_f64(&json!(null)), None);
        assert_eq!(value_to_f64(&json!(true)), None);
        assert_eq!(value_to_f64(&json!({ "v": 1 })), None);
    }

    #[test]
    fn test_map_f64_priority_order() {
        let value = json!({ "rail_width_cm": 200, "rail_width": 999 });
        let map = value.as_object().unwrap();
        // _cm 口径优先
        assert_eq!(map_f64(map, &["rail_width_cm", "rail_width"]), Some(200.0));
    }

    #[test]
    fn test_map_f64_skips_unparseable_candidate() {
        let value = json!({ "rail_width_cm": "n/a", "rail_width": "210" });
        let map = value.as_object().unwrap();
        assert_eq!(map_f64(map, &["rail_width_cm", "rail_width"]), Some(210.0));
    }

    #[test]
    fn test_map_str_skips_blank() {
        let value = json!({ "curtain_type": "  ", "fallback": "pair" });
        let map = value.as_object().unwrap();
        assert_eq!(
            map_str(map, &["curtain_type", "fallback"]),
            Some("pair".to_string())
        );
    }
}
