//! Style/border merge policy.
//!
//! A style object may carry its own `border` sub-object. When a top-level
//! border is also present the two are merged field by field, the style-level
//! fields winning, and the sub-object is removed from the style so the host
//! never receives a duplicate border key.
//!
//! A border that arrives as the stringified-object placeholder (or any other
//! undecodable string) is replaced by a single-line border on all four edges.
//! The style-level fragment still merges on top of that default.

use serde_json::{Map, Value};

use crate::sync::normalize::{coerce_bool, display_string};
use crate::types::{Border, BorderKind, BorderSides, Style, CORRUPTED_PLACEHOLDER};

/// A corrupted encoding that was repaired rather than applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Repair {
    /// Top-level border was the placeholder.
    BorderPlaceholder,
    /// Top-level border was a string that is neither a border type nor JSON.
    BorderUnparseable,
    /// Style was not an object.
    StyleNotObject,
    /// `style.border` was not an object.
    StyleBorderNotObject,
    /// A nested style entry was the placeholder and was dropped.
    StyleEntryPlaceholder,
}

impl Repair {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BorderPlaceholder => "border placeholder",
            Self::BorderUnparseable => "unparseable border",
            Self::StyleNotObject => "style not an object",
            Self::StyleBorderNotObject => "style.border not an object",
            Self::StyleEntryPlaceholder => "style entry placeholder",
        }
    }
}

/// Style and border ready for the host, plus what had to be repaired.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Composed {
    pub style: Style,
    pub border: Option<Border>,
    pub repairs: Vec<Repair>,
    /// A `style.border` fragment arrived without a top-level border and was dropped.
    pub orphan_fragment: bool,
}

/// Apply the merge policy to a `style` and a `border` attribute.
pub fn compose(style: Option<&Value>, border: Option<&Value>) -> Composed {
    let mut repairs = Vec::new();

    let mut style = match style {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(s) {
            Ok(Value::Object(map)) => map,
            _ => {
                repairs.push(Repair::StyleNotObject);
                Map::new()
            }
        },
        Some(_) => {
            repairs.push(Repair::StyleNotObject);
            Map::new()
        }
    };

    let before = style.len();
    style.retain(|_, v| v.as_str() != Some(CORRUPTED_PLACEHOLDER));
    if style.len() != before {
        repairs.push(Repair::StyleEntryPlaceholder);
    }

    let fragment = match style.remove("border") {
        None | Some(Value::Null) => None,
        Some(Value::Object(map)) => Some(map),
        Some(_) => {
            repairs.push(Repair::StyleBorderNotObject);
            None
        }
    };

    let base = border.and_then(|b| border_base(b, &mut repairs));
    let orphan_fragment = base.is_none() && fragment.is_some();
    let border = base.map(|mut base| {
        if let Some(fragment) = fragment {
            base.extend(fragment);
        }
        border_from_map(&base)
    });

    Composed { style, border, repairs, orphan_fragment }
}

/// Border fields of a single-line border on every edge.
fn default_border_map() -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("type".into(), Value::from("line"));
    for (name, _) in BorderSides::NAMED {
        map.insert(name.into(), Value::Bool(true));
    }
    map
}

/// Decode a top-level border value into a field map (`None` = no border).
fn border_base(value: &Value, repairs: &mut Vec<Repair>) -> Option<Map<String, Value>> {
    match value {
        Value::Null | Value::Bool(false) => None,
        Value::Bool(true) => Some(default_border_map()),
        Value::Object(map) => Some(map.clone()),
        Value::String(s) if s == CORRUPTED_PLACEHOLDER => {
            repairs.push(Repair::BorderPlaceholder);
            Some(default_border_map())
        }
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() || s == "none" || s == "false" {
                return None;
            }
            if let Some(kind) = BorderKind::parse(s) {
                let mut map = default_border_map();
                map.insert("type".into(), Value::from(kind.as_str()));
                return Some(map);
            }
            match serde_json::from_str::<Value>(s) {
                Ok(Value::Object(map)) => Some(map),
                _ => {
                    repairs.push(Repair::BorderUnparseable);
                    Some(default_border_map())
                }
            }
        }
        _ => {
            repairs.push(Repair::BorderUnparseable);
            Some(default_border_map())
        }
    }
}

/// Build a typed border from merged fields. Unset edges default to drawn.
fn border_from_map(map: &Map<String, Value>) -> Border {
    let kind = map
        .get("type")
        .and_then(Value::as_str)
        .and_then(BorderKind::parse)
        .unwrap_or_default();

    let mut sides = BorderSides::ALL;
    for (name, flag) in BorderSides::NAMED {
        if map.get(name).and_then(coerce_bool) == Some(false) {
            sides.remove(flag);
        }
    }

    let color = |key: &str| map.get(key).filter(|v| !v.is_null()).map(display_string);

    Border {
        kind,
        sides,
        fg: color("fg"),
        bg: color("bg"),
        ch: map.get("ch").and_then(Value::as_str).and_then(|s| s.chars().next()),
    }
}
