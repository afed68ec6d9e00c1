//! Lenient numeric coercion for simulation input.
//!
//! Malformed numbers never fail a request: they fall back to zero (or a caller-supplied default).

use serde_json::Value;

/// Parses a user-typed amount such as `"1,500,000"` or `"$2,000.50"`.
///
/// Non-numeric, non-finite and negative input all yield 0.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '_') && !c.is_whitespace())
        .collect();

    match cleaned.parse::<f64>() {
        Ok(value) if value.is_finite() => value.max(0.0),
        _ => 0.0,
    }
}

/// Reads a JSON number or numeric string, returning `default` for anything else.
pub fn coerce_f64(value: Option<&Value>, default: f64) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(Value::Bool(b)) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => v,
        _ => default,
    }
}

/// Integer variant of [`coerce_f64`]; fractional values are truncated.
pub fn coerce_i64(value: Option<&Value>, default: i64) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|v| v.is_finite()).map(|v| v.trunc() as i64))
            .unwrap_or(default),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|v| v.is_finite())
                        .map(|v| v.trunc() as i64)
                })
                .unwrap_or(default)
        }
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_amount_strips_separators() {
        assert_eq!(parse_amount("1,500,000"), 1_500_000.0);
        assert_eq!(parse_amount(" $2,000.50 "), 2_000.5);
        assert_eq!(parse_amount("42"), 42.0);
    }

    #[test]
    fn test_parse_amount_malformed_is_zero() {
        assert_eq!(parse_amount("lots"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("12abc"), 0.0);
        assert_eq!(parse_amount("inf"), 0.0);
        assert_eq!(parse_amount("NaN"), 0.0);
    }

    #[test]
    fn test_parse_amount_negative_is_zero() {
        assert_eq!(parse_amount("-500"), 0.0);
    }

    #[test]
    fn test_coerce_f64() {
        let data = json!({"a": 12.5, "b": "7", "c": "seven", "d": null, "e": [1]});
        assert_eq!(coerce_f64(data.get("a"), 0.0), 12.5);
        assert_eq!(coerce_f64(data.get("b"), 0.0), 7.0);
        assert_eq!(coerce_f64(data.get("c"), 3.0), 3.0);
        assert_eq!(coerce_f64(data.get("d"), 50.0), 50.0);
        assert_eq!(coerce_f64(data.get("e"), 0.0), 0.0);
        assert_eq!(coerce_f64(data.get("missing"), 9.0), 9.0);
    }

    #[test]
    fn test_coerce_i64() {
        let data = json!({"a": 4, "b": 4.9, "c": "12", "d": "3.7", "e": "x"});
        assert_eq!(coerce_i64(data.get("a"), 1), 4);
        assert_eq!(coerce_i64(data.get("b"), 1), 4);
        assert_eq!(coerce_i64(data.get("c"), 1), 12);
        assert_eq!(coerce_i64(data.get("d"), 1), 3);
        assert_eq!(coerce_i64(data.get("e"), 1), 1);
        assert_eq!(coerce_i64(None, 1), 1);
    }
}
