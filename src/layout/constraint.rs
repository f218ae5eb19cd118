//! Position constraint values.
//!
//! A constraint is one of: an absolute cell count, a percentage of the
//! parent, `"center"`, `"shrink"`, or any base followed by a signed integer
//! offset (`"50%-10"`, `"center+2"`, `"10+2"`).
//!
//! Parsing is purely syntactic. A value is a percentage only when its text
//! contains `%`, and the offset is split off at the first unescaped `+`/`-`
//! after the base token. There is no operator precedence and no nesting.

use serde_json::Value;

/// A declarative position or size constraint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Constraint {
    /// Absolute cell count, offset already folded in.
    Cells(i32),
    /// `floor(parent * percent / 100) + offset`.
    Percent { percent: f64, offset: i32 },
    /// Centered within the parent, then shifted by `offset`.
    Center { offset: i32 },
    /// Sized from content.
    Shrink,
}

impl Constraint {
    /// Parse the textual form of a constraint.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let (base, offset) = split_offset(text)?;
        let base = base.trim();

        match base {
            "center" => Some(Self::Center { offset }),
            "shrink" => Some(Self::Shrink),
            _ if base.contains('%') => {
                let percent = base.strip_suffix('%')?.trim().parse::<f64>().ok()?;
                percent.is_finite().then_some(Self::Percent { percent, offset })
            }
            _ => {
                let cells = base.parse::<f64>().ok()?;
                cells
                    .is_finite()
                    .then(|| Self::Cells((cells.floor() as i32).saturating_add(offset)))
            }
        }
    }

    /// Read a constraint from an attribute value (number or string).
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).map(|v| Self::Cells(v.floor() as i32)),
            Value::String(s) => Self::parse(s),
            _ => None,
        }
    }

    #[inline]
    pub fn is_percent(&self) -> bool {
        matches!(self, Self::Percent { .. })
    }

    /// Resolve as a length along an axis of `parent` cells. Saturates at the
/// `i32` bounds.
    ///
    /// A lone `"center"` means half the parent. `"shrink"` has no length of
    /// its own and resolves to zero here; callers handle it before this point.
    pub fn length(&self, parent: i32) -> i32 {
        match *self {
            Self::Cells(n) => n,
            Self::Percent { percent, offset } => percent_of(parent, percent).saturating_add(offset),
            Self::Center { offset } => parent.div_euclid(2).saturating_add(offset),
            Self::Shrink => 0,
        }
    }
}

/// `floor(parent * percent / 100)`.
#[inline]
pub(crate) fn percent_of(parent: i32, percent: f64) -> i32 {
    (parent as f64 * percent / 100.0).floor() as i32
}

/// Split `"<base><+|-><offset>"` at the first unescaped sign after the base.
///
/// Returns `None` when an offset is present but is not an integer.
fn split_offset(text: &str) -> Option<(&str, i32)> {
    let mut prev = None;
    for (i, ch) in text.char_indices() {
        if i > 0 && (ch == '+' || ch == '-') && prev != Some('\\') {
            let offset: String = text[i..].chars().filter(|c| !c.is_whitespace()).collect();
            let offset = offset.parse::<i32>().ok()?;
            return Some((&text[..i], offset));
        }
        prev = Some(ch);
    }
    Some((text, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_absolute() {
        assert_eq!(Constraint::parse("10"), Some(Constraint::Cells(10)));
        assert_eq!(Constraint::parse("-5"), Some(Constraint::Cells(-5)));
        assert_eq!(Constraint::parse("10+2"), Some(Constraint::Cells(12)));
        assert_eq!(Constraint::parse(" 7 - 3 "), Some(Constraint::Cells(4)));
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(
            Constraint::parse("50%"),
            Some(Constraint::Percent { percent: 50.0, offset: 0 })
        );
        assert_eq!(
            Constraint::parse("50%-10"),
            Some(Constraint::Percent { percent: 50.0, offset: -10 })
        );
        assert_eq!(
            Constraint::parse("100%+4"),
            Some(Constraint::Percent { percent: 100.0, offset: 4 })
        );
    }

    #[test]
    fn test_parse_keywords() {
        assert_eq!(Constraint::parse("center"), Some(Constraint::Center { offset: 0 }));
        assert_eq!(Constraint::parse("center-3"), Some(Constraint::Center { offset: -3 }));
        assert_eq!(Constraint::parse("shrink"), Some(Constraint::Shrink));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(Constraint::parse(""), None);
        assert_eq!(Constraint::parse("wide"), None);
        assert_eq!(Constraint::parse("50%-x"), None);
        assert_eq!(Constraint::parse("50%px"), None);
    }

    #[test]
    fn test_percent_is_syntactic() {
        // A bare number is always absolute, even when it happens to be < 1.
        assert_eq!(Constraint::from_value(&json!(0.5)), Some(Constraint::Cells(0)));
        assert!(Constraint::parse("0.5%").is_some_and(|c| c.is_percent()));
    }

    #[test]
    fn test_length() {
        assert_eq!(Constraint::parse("50%+2").map(|c| c.length(100)), Some(52));
        assert_eq!(Constraint::parse("75%").map(|c| c.length(40)), Some(30));
        assert_eq!(Constraint::parse("33%").map(|c| c.length(10)), Some(3));
        assert_eq!(Constraint::parse("center").map(|c| c.length(81)), Some(40));
    }

    #[test]
    fn test_from_value() {
        assert_eq!(Constraint::from_value(&json!(12)), Some(Constraint::Cells(12)));
        assert_eq!(Constraint::from_value(&json!("12")), Some(Constraint::Cells(12)));
        assert_eq!(Constraint::from_value(&json!(true)), None);
        assert_eq!(Constraint::from_value(&Value::Null), None);
    }

    #[test]
    fn test_offsets_saturate() {
        assert_eq!(Constraint::parse("2147483647+1"), Some(Constraint::Cells(i32::MAX)));
        assert_eq!(Constraint::parse("-2147483648-1"), Some(Constraint::Cells(i32::MIN)));
        assert_eq!(Constraint::parse("100%+2147483647").map(|c| c.length(10)), Some(i32::MAX));
        assert_eq!(Constraint::parse("center+2147483647").map(|c| c.length(10)), Some(i32::MAX));
        assert_eq!(Constraint::parse("99999999999"), Some(Constraint::Cells(i32::MAX)));
    }
}
