//! Attribute normalization.
//!
//! The framework marshals attribute values loosely: booleans and numbers may
//! arrive as strings, a style object may arrive serialized. Values are coerced
//! here, before the bridge sees them, so repeated partial merges never trip
//! over a wrong shape.

use serde_json::{Map, Number, Value};

/// Attributes carrying a boolean.
const BOOLEAN_ATTRS: &[&str] = &[
    "hidden",
    "visible",
    "scrollable",
    "mouse",
    "keys",
    "focusable",
    "clickable",
    "alwaysScroll",
    "inputOnFocus",
];

/// Attributes carrying a plain number.
const NUMERIC_ATTRS: &[&str] = &["filled", "tabIndex", "selected"];

/// Attributes carrying a position constraint.
const POSITION_ATTRS: &[&str] = &["top", "left", "right", "bottom", "width", "height"];

/// Coerce an attribute value to the shape the bridge expects for `name`.
///
/// Values that cannot be coerced pass through unchanged.
pub fn normalize_attribute(name: &str, value: Value) -> Value {
    if BOOLEAN_ATTRS.contains(&name) {
        return coerce_bool(&value).map(Value::Bool).unwrap_or(value);
    }
    if NUMERIC_ATTRS.contains(&name) {
        return coerce_number(&value).unwrap_or(value);
    }
    if POSITION_ATTRS.contains(&name) {
        return coerce_integer_string(value);
    }
    match name {
        "style" => normalize_style_value(value),
        "items" => coerce_items(&value).map(Value::from).unwrap_or(value),
        _ => value,
    }
}

/// Boolean from its possible encodings.
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Null => Some(false),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim() {
            // A present-but-empty attribute reads as set, as in HTML.
            "" | "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Number from a number or a numeric string.
pub fn coerce_number(value: &Value) -> Option<Value> {
    match value {
        Value::Number(_) => Some(value.clone()),
        Value::String(s) => {
            let s = s.trim();
            if let Ok(n) = s.parse::<i64>() {
                return Some(Value::from(n));
            }
            s.parse::<f64>().ok().and_then(Number::from_f64).map(Value::Number)
        }
        _ => None,
    }
}

/// A position given as an integer string (`"10"`) becomes a number.
///
/// Anything with `%`, a keyword, or an offset stays textual.
fn coerce_integer_string(value: Value) -> Value {
    match &value {
        Value::String(s) => s.trim().parse::<i64>().map(Value::from).unwrap_or(value),
        _ => value,
    }
}

/// Missing style becomes `{}`; a serialized object is decoded.
///
/// Strings that do not decode are left for the bridge to repair and report.
fn normalize_style_value(value: Value) -> Value {
    match value {
        Value::Null => Value::Object(Map::new()),
        Value::String(s) => match serde_json::from_str::<Value>(&s) {
            Ok(decoded @ Value::Object(_)) => decoded,
            _ => Value::String(s),
        },
        other => other,
    }
}

/// List items from an array, a serialized array, or a comma-separated string.
pub fn coerce_items(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(items.iter().map(display_string).collect()),
        Value::String(s) => {
            if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(s) {
                return Some(items.iter().map(display_string).collect());
            }
            if s.is_empty() {
                return Some(Vec::new());
            }
            Some(s.split(',').map(|i| i.trim().to_string()).collect())
        }
        Value::Null => Some(Vec::new()),
        _ => None,
    }
}

/// Render a value as display text: strings verbatim, others as JSON.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Text of an attribute that should be a string, if it is one (or a number).
pub fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_boolean_strings() {
        assert_eq!(normalize_attribute("hidden", json!("true")), json!(true));
        assert_eq!(normalize_attribute("hidden", json!("false")), json!(false));
        assert_eq!(normalize_attribute("mouse", json!("")), json!(true));
        assert_eq!(normalize_attribute("keys", json!(0)), json!(false));
        assert_eq!(normalize_attribute("focusable", json!("maybe")), json!("maybe"));
    }

    #[test]
    fn test_numeric_strings() {
        assert_eq!(normalize_attribute("filled", json!("40")), json!(40));
        assert_eq!(normalize_attribute("filled", json!("12.5")), json!(12.5));
        assert_eq!(normalize_attribute("filled", json!(7)), json!(7));
    }

    #[test]
    fn test_position_strings() {
        assert_eq!(normalize_attribute("width", json!("10")), json!(10));
        assert_eq!(normalize_attribute("width", json!("50%")), json!("50%"));
        assert_eq!(normalize_attribute("left", json!("center")), json!("center"));
        assert_eq!(normalize_attribute("left", json!("-3")), json!(-3));
    }

    #[test]
    fn test_style_defaults_and_decoding() {
        assert_eq!(normalize_attribute("style", Value::Null), json!({}));
        assert_eq!(
            normalize_attribute("style", json!(r#"{"fg":"red"}"#)),
            json!({"fg": "red"})
        );
        assert_eq!(
            normalize_attribute("style", json!("[object Object]")),
            json!("[object Object]")
        );
    }

    #[test]
    fn test_items() {
        assert_eq!(coerce_items(&json!(["a", 1])), Some(vec!["a".to_string(), "1".to_string()]));
        assert_eq!(coerce_items(&json!(r#"["x","y"]"#)), Some(vec!["x".to_string(), "y".to_string()]));
        assert_eq!(coerce_items(&json!("one, two")), Some(vec!["one".to_string(), "two".to_string()]));
        assert_eq!(coerce_items(&json!(5)), None);
    }

    #[test]
    fn test_other_attributes_pass_through() {
        assert_eq!(normalize_attribute("content", json!("true")), json!("true"));
        assert_eq!(normalize_attribute("label", json!(3)), json!(3));
    }
}
