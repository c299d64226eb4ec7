//! JSON Parsing Utilities
//!
//! Safe JSON parsing with proper error handling. Exchange payloads mix
//! numbers and numeric strings freely, so the numeric readers accept both.

use crate::error::{ChartsError, ChartsResult};
use serde::de::DeserializeOwned;

/// Safely parse JSON string into a type
pub fn parse_json<T: DeserializeOwned>(json_str: &str) -> ChartsResult<T> {
    serde_json::from_str(json_str)
        .map_err(|e| ChartsError::parse_error(format!("JSON parse error: {}", e)))
}

/// Read a JSON number or numeric string as f64
pub fn as_json_f64(value: &serde_json::Value) -> Option<f64> {
    if let Some(n) = value.as_f64() {
        Some(n)
    } else if let Some(s) = value.as_str() {
        s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
    } else {
        None
    }
}

/// Read a JSON number or numeric string as i64 (epoch milliseconds)
///
/// Float timestamps are accepted when they carry no fractional part.
pub fn as_json_i64(value: &serde_json::Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    if let Some(f) = value.as_f64() {
        return float_to_i64(f);
    }
    let s = value.as_str()?.trim();
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(float_to_i64))
}

fn float_to_i64(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_json() {
        let result: ChartsResult<serde_json::Value> = parse_json(r#"{"code": 0}"#);
        assert!(result.is_ok());

        let result: ChartsResult<serde_json::Value> = parse_json("not json");
        assert!(result.is_err());
    }

    #[test]
    fn test_as_json_f64() {
        assert_eq!(as_json_f64(&json!(100.5)), Some(100.5));
        assert_eq!(as_json_f64(&json!("102.25")), Some(102.25));
        assert_eq!(as_json_f64(&json!(" 7 ")), Some(7.0));
        assert_eq!(as_json_f64(&json!("abc")), None);
        assert_eq!(as_json_f64(&json!("NaN")), None);
        assert_eq!(as_json_f64(&json!(null)), None);
    }

    #[test]
    fn test_as_json_i64() {
        assert_eq!(as_json_i64(&json!(1700000000000_i64)), Some(1700000000000));
        assert_eq!(as_json_i64(&json!(1700000000000.0)), Some(1700000000000));
        assert_eq!(as_json_i64(&json!("86400000")), Some(86400000));
        assert_eq!(as_json_i64(&json!(1.5)), None);
        assert_eq!(as_json_i64(&json!([1])), None);
    }
}
