//! Lenient caller input
//!
//! Callers (HTTP bodies, CLI flags) send loosely typed values. Anything that
//! cannot be interpreted is treated as missing rather than rejected.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Search request as received from a caller
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchRequest {
    #[serde(deserialize_with = "lenient_string")]
    pub keywords: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub current_company: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub industry: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub school: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub connection_degree: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub years_of_experience: Option<String>,
    #[serde(deserialize_with = "lenient_int")]
    pub max_results: Option<i64>,
    #[serde(deserialize_with = "lenient_bool")]
    pub get_detailed_info: Option<bool>,
    #[serde(deserialize_with = "lenient_int")]
    pub max_detailed_profiles: Option<i64>,
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => Some(b),
        Value::String(s) => parse_flag(&s),
        Value::Number(n) => n.as_i64().map(|v| v != 0),
        _ => None,
    })
}

/// Parses yes/no style flags as typed at a prompt or in a form
pub(crate) fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "y" | "yes" | "1" | "on" => Some(true),
        "false" | "n" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}
