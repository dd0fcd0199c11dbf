//! Structure-to-text rendering shared by every YAML generator.
//!
//! Generated documents are built as `serde_yaml::Value` trees (mappings keep
//! insertion order) and rendered here. Nested mappings and sequences are
//! indented by two spaces per level, and list items under a key are indented
//! as well, which is the layout Ansible and Compose users expect:
//!
//! ```yaml
//! - name: Provision
//!   tasks:
//!     - name: Create VM
//! ```

use serde::Serialize;
use serde_yaml::{Mapping, Value};

const INDENT: &str = "  ";

/// Render any serializable structure as YAML text.
pub fn to_yaml<T: Serialize>(document: &T) -> Result<String, serde_yaml::Error> {
    let value = serde_yaml::to_value(document)?;
    Ok(render_yaml(&value))
}

/// Render a YAML value tree as text, preserving key order.
pub fn render_yaml(value: &Value) -> String {
    let mut out = String::new();
    match value {
        Value::Mapping(map) if !map.is_empty() => render_mapping(map, 0, &mut out),
        Value::Sequence(items) if !items.is_empty() => render_sequence(items, 0, &mut out),
        Value::Tagged(tagged) => return render_yaml(&tagged.value),
        other => {
            out.push_str(&render_scalar(other));
            out.push('\n');
        }
    }
    out
}

fn render_mapping(map: &Mapping, depth: usize, out: &mut String) {
    let pad = INDENT.repeat(depth);
    for (key, value) in map {
        let key = render_key(key);
        match untag(value) {
            Value::Mapping(inner) if !inner.is_empty() => {
                out.push_str(&format!("{}{}:\n", pad, key));
                render_mapping(inner, depth + 1, out);
            }
            Value::Sequence(items) if !items.is_empty() => {
                out.push_str(&format!("{}{}:\n", pad, key));
                render_sequence(items, depth + 1, out);
            }
            scalar => {
                out.push_str(&format!("{}{}: {}\n", pad, key, render_scalar(scalar)));
            }
        }
    }
}

fn render_sequence(items: &[Value], depth: usize, out: &mut String) {
    let pad = INDENT.repeat(depth);
    for item in items {
        match untag(item) {
            Value::Mapping(inner) if !inner.is_empty() => {
                // Render the mapping one level deeper, then fold its first line onto the dash
                let mut nested = String::new();
                render_mapping(inner, depth + 1, &mut nested);
                let inner_pad = INDENT.repeat(depth + 1);
                let folded = nested
                    .strip_prefix(inner_pad.as_str())
                    .unwrap_or(nested.as_str());
                out.push_str(&format!("{}- {}", pad, folded));
            }
            Value::Sequence(inner) if !inner.is_empty() => {
                out.push_str(&format!("{}-\n", pad));
                render_sequence(inner, depth + 1, out);
            }
            scalar => {
                out.push_str(&format!("{}- {}\n", pad, render_scalar(scalar)));
            }
        }
    }
}

fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn render_key(key: &Value) -> String {
    match key {
        Value::String(s) => quote_if_needed(s),
        other => render_scalar(other),
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote_if_needed(s),
        Value::Mapping(_) => "{}".to_string(),
        Value::Sequence(_) => "[]".to_string(),
        Value::Tagged(tagged) => render_scalar(&tagged.value),
    }
}

/// Quote a string when plain YAML would read it as something else.
pub fn quote_if_needed(s: &str) -> String {
    if needs_quotes(s) {
        let escaped = s
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
            .replace('\t', "\\t");
        format!("\"{}\"", escaped)
    } else {
        s.to_string()
    }
}

fn needs_quotes(s: &str) -> bool {
    if s.is_empty() || s.trim() != s {
        return true;
    }

    let lowered = s.to_ascii_lowercase();
    if matches!(
        lowered.as_str(),
        "true" | "false" | "yes" | "no" | "on" | "off" | "y" | "n" | "null" | "~"
    ) {
        return true;
    }

    if s.parse::<f64>().is_ok() || looks_like_sexagesimal(s) {
        return true;
    }

    let first = s.chars().next().unwrap_or(' ');
    if "-?:,[]{}#&*!|>'\"%@`".contains(first) {
        return true;
    }

    s.contains(": ")
        || s.contains(" #")
        || s.ends_with(':')
        || s.chars().any(|c| c.is_control())
}

// Values like 80:80 are read as base-60 integers by YAML 1.1 parsers
fn looks_like_sexagesimal(s: &str) -> bool {
    s.contains(':') && s.split(':').all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()))
}
