//! Lenient field parsing for records coming from the backend
//!
//! Backend payloads are loosely typed: amounts arrive as decimal strings,
//! numbers or null, and dates come in several formats. Everything here is
//! total; malformed input degrades to NaN or `None` instead of failing.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Parse a decimal amount string, yielding NaN for missing or malformed values
pub fn parse_amount(raw: Option<&str>) -> f64 {
    match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s.parse::<f64>().unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}

/// Parse a timestamp in RFC 3339, naive date-time, or plain date form
pub fn parse_timestamp(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let s = raw?.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parse a timestamp and keep only its calendar date
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    parse_timestamp(raw).map(|dt| dt.date_naive())
}

/// Deserialize a string field that the backend may send as a string, a
/// number, a boolean, or null
pub fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Deserialize a required text field; null or a non-scalar value becomes ""
pub fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_string(deserializer)?.unwrap_or_default())
}

/// Deserialize any field, falling back to its default when the value is
/// null or has the wrong shape
pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Deserialize an integer field that may arrive as a number, a numeric
/// string, or garbage (which becomes `None`)
pub fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .and_then(|v| u32::try_from(v).ok()),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Deserialize a boolean that may arrive as `true`, `"true"`, `1`, or null
pub fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => b,
        Some(serde_json::Value::Number(n)) => n.as_i64().is_some_and(|v| v != 0),
        Some(serde_json::Value::String(s)) => {
            matches!(s.trim().to_lowercase().as_str(), "true" | "1" | "yes")
        }
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(Some("2500")), 2500.0);
        assert_eq!(parse_amount(Some(" 10000.50 ")), 10000.5);
        assert!(parse_amount(Some("ten")).is_nan());
        assert!(parse_amount(Some("")).is_nan());
        assert!(parse_amount(None).is_nan());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let a = parse_timestamp(Some("2024-06-01")).unwrap();
        assert_eq!((a.year(), a.month(), a.day()), (2024, 6, 1));

        let b = parse_timestamp(Some("2024-06-01T10:30:00Z")).unwrap();
        assert!(b > a);

        let c = parse_timestamp(Some("2024-06-01T10:30:00.123")).unwrap();
        assert!(c > b);

        assert!(parse_timestamp(Some("not a date")).is_none());
        assert!(parse_timestamp(Some("  ")).is_none());
        assert!(parse_timestamp(None).is_none());
    }

    #[test]
    fn test_lenient_deserializers() {
        #[derive(Deserialize)]
        struct Probe {
            #[serde(default, deserialize_with = "lenient_string")]
            amount: Option<String>,
            #[serde(default, deserialize_with = "lenient_u32")]
            score: Option<u32>,
            #[serde(default, deserialize_with = "lenient_bool")]
            flag: bool,
        }

        let p: Probe =
            serde_json::from_str(r#"{"amount": 1500, "score": "42", "flag": 1}"#).unwrap();
        assert_eq!(p.amount.as_deref(), Some("1500"));
        assert_eq!(p.score, Some(42));
        assert!(p.flag);

        let p: Probe =
            serde_json::from_str(r#"{"amount": null, "score": "high", "flag": "no"}"#).unwrap();
        assert_eq!(p.amount, None);
        assert_eq!(p.score, None);
        assert!(!p.flag);

        let p: Probe = serde_json::from_str("{}").unwrap();
        assert_eq!(p.amount, None);
        assert!(!p.flag);
    }
}
