//! Lenient field decoders for editor-provided configuration.
//!
//! Node configuration comes from a canvas editor and is loosely typed: numbers
//! arrive as strings, lists as comma separated text, flags as `"true"`. These
//! helpers are used with `#[serde(default, deserialize_with = "...")]` so a
//! mistyped field decodes to its default instead of rejecting the whole graph.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Decode a non-empty, trimmed string. Numbers are accepted and formatted.
pub fn string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_string))
}

/// Decode an unsigned integer from a JSON number or a numeric string.
pub fn unsigned<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_u32))
}

/// Decode a flag. Only `true` and the string `"true"` are truthy.
pub fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    })
}

/// Decode a list of strings from an array or a comma separated string.
pub fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items.iter().filter_map(value_to_string).collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    })
}

/// Decode environment variables as `KEY=VALUE` pairs from either a map or a list.
pub fn environment<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Object(map)) => map
            .iter()
            .map(|(key, v)| format!("{}={}", key, value_to_string(v).unwrap_or_default()))
            .collect(),
        Some(Value::Array(items)) => items.iter().filter_map(value_to_string).collect(),
        _ => Vec::new(),
    })
}

/// Decode a list of structured items, silently skipping entries that do not fit `T`.
pub fn items<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: serde::de::DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Decode a JSON object, treating `null` and non-objects as empty.
pub fn object<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    })
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn value_to_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "string")]
        name: Option<String>,
        #[serde(default, deserialize_with = "unsigned")]
        cpu: Option<u32>,
        #[serde(default, deserialize_with = "flag")]
        dhcp: bool,
        #[serde(default, deserialize_with = "string_list")]
        ports: Vec<String>,
        #[serde(default, deserialize_with = "environment")]
        env: Vec<String>,
    }

    #[test]
    fn test_mistyped_fields_fall_back() {
        let sample: Sample = serde_json::from_value(json!({
            "name": "  ",
            "cpu": "four",
            "dhcp": "yes",
            "ports": {"a": 1},
            "env": 12
        }))
        .unwrap();

        assert_eq!(sample.name, None);
        assert_eq!(sample.cpu, None);
        assert!(!sample.dhcp);
        assert!(sample.ports.is_empty());
        assert!(sample.env.is_empty());
    }

    #[test]
    fn test_loose_representations_are_accepted() {
        let sample: Sample = serde_json::from_value(json!({
            "name": 42,
            "cpu": "4",
            "dhcp": "true",
            "ports": "80:80, 443:443",
            "env": {"MODE": "prod", "WORKERS": 3}
        }))
        .unwrap();

        assert_eq!(sample.name.as_deref(), Some("42"));
        assert_eq!(sample.cpu, Some(4));
        assert!(sample.dhcp);
        assert_eq!(sample.ports, vec!["80:80", "443:443"]);
        assert_eq!(sample.env, vec!["MODE=prod", "WORKERS=3"]);
    }

    #[test]
    fn test_null_fields_decode_to_defaults() {
        let sample: Sample = serde_json::from_value(json!({
            "name": null,
            "cpu": null,
            "dhcp": null
        }))
        .unwrap();

        assert_eq!(sample.name, None);
        assert_eq!(sample.cpu, None);
        assert!(!sample.dhcp);
    }
}
