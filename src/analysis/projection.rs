// 结果投影 - 把远程服务的弱类型响应转换为 AnalysisResult
//
// 所有"字段缺失"的默认值策略都集中在这里

use super::state::AnalysisResult;
use crate::error::AnalysisError;
use serde_json::{Map, Value};

/// 缺少类别时的默认值
pub const UNKNOWN_CLASS: &str = "Unknown";

/// 解析响应体为 JSON
///
/// 空响应或非 JSON 视为数据格式错误
pub fn parse_body(body: &[u8]) -> Result<Value, AnalysisError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(AnalysisError::MalformedPayload("响应体为空".to_string()));
    }
    serde_json::from_slice(body)
        .map_err(|e| AnalysisError::MalformedPayload(format!("响应不是合法 JSON: {}", e)))
}

/// 把响应投影为分析结果
///
/// 缺失或类型不符的字段使用默认值，只有整体不是对象时才报错
pub fn project_result(payload: &Value) -> Result<AnalysisResult, AnalysisError> {
    let map = payload.as_object().ok_or_else(|| {
        AnalysisError::MalformedPayload(format!("期望 JSON 对象，实际为 {}", json_kind(payload)))
    })?;

    Ok(AnalysisResult {
        predicted_class: string_field(map, "predicted_class")
            .unwrap_or_else(|| UNKNOWN_CLASS.to_string()),
        healthy_percent: number_field(map, "healthy_percent").unwrap_or(0.0),
        infected_percent: number_field(map, "infected_percent").unwrap_or(0.0),
        original_image: string_field(map, "original_image"),
        mask_image: string_field(map, "mask_image"),
        highlighted_image: string_field(map, "highlighted_image"),
    })
}

// 空字符串等同于缺失
fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.clone()),
        _ => None,
    }
}

fn number_field(map: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match map.get(key)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "布尔值",
        Value::Number(_) => "数字",
        Value::String(_) => "字符串",
        Value::Array(_) => "数组",
        Value::Object(_) => "对象",
    }
}
