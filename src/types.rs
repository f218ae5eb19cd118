//! Core types for spark-dom.
//!
//! These types cross the boundary between the node tree, the widget bridge
//! and the host widget library.

use serde_json::{Map, Value};

// =============================================================================
// Attribute Values
// =============================================================================

/// An attribute value as the framework hands it over.
///
/// The framework marshals attributes as loosely typed values (strings,
/// numbers, booleans, nested objects), so they are stored as JSON values.
pub type AttrValue = Value;

/// A style object passed through to the host widget library.
pub type Style = Map<String, Value>;

/// Placeholder that an object degrades to when upstream marshalling
/// stringifies it.
pub const CORRUPTED_PLACEHOLDER: &str = "[object Object]";

// =============================================================================
// Border
// =============================================================================

/// How a border is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BorderKind {
    /// Box-drawing line characters.
    #[default]
    Line,
    /// A solid background-colored frame.
    Bg,
}

impl BorderKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "line" => Some(Self::Line),
            "bg" => Some(Self::Bg),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Bg => "bg",
        }
    }
}

bitflags::bitflags! {
    /// Which edges of a widget carry a border.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BorderSides: u8 {
        const TOP = 1 << 0;
        const RIGHT = 1 << 1;
        const BOTTOM = 1 << 2;
        const LEFT = 1 << 3;
        const ALL = Self::TOP.bits() | Self::RIGHT.bits() | Self::BOTTOM.bits() | Self::LEFT.bits();
    }
}

impl BorderSides {
    /// Edge flags keyed by the attribute names the framework uses.
    pub const NAMED: [(&'static str, BorderSides); 4] = [
        ("top", BorderSides::TOP),
        ("right", BorderSides::RIGHT),
        ("bottom", BorderSides::BOTTOM),
        ("left", BorderSides::LEFT),
    ];
}

/// A fully normalized border, ready for the host library.
#[derive(Debug, Clone, PartialEq)]
pub struct Border {
    pub kind: BorderKind,
    pub sides: BorderSides,
    pub fg: Option<String>,
    pub bg: Option<String>,
    pub ch: Option<char>,
}

impl Border {
    /// Single-line border on all four edges.
    pub fn line() -> Self {
        Self {
            kind: BorderKind::Line,
            sides: BorderSides::ALL,
            fg: None,
            bg: None,
            ch: None,
        }
    }

    /// Cells the border takes horizontally (left + right edge).
    pub fn horizontal(&self) -> i32 {
        self.sides.contains(BorderSides::LEFT) as i32 + self.sides.contains(BorderSides::RIGHT) as i32
    }

    /// Cells the border takes vertically (top + bottom edge).
    pub fn vertical(&self) -> i32 {
        self.sides.contains(BorderSides::TOP) as i32 + self.sides.contains(BorderSides::BOTTOM) as i32
    }
}

impl Default for Border {
    fn default() -> Self {
        Self::line()
    }
}

// =============================================================================
// Widget Flags
// =============================================================================

bitflags::bitflags! {
    /// Boolean widget options.
    ///
    /// Combine with bitwise OR: `WidgetFlags::MOUSE | WidgetFlags::KEYS`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct WidgetFlags: u8 {
        const NONE = 0;
        const SCROLLABLE = 1 << 0;
        const MOUSE = 1 << 1;
        const KEYS = 1 << 2;
        const FOCUSABLE = 1 << 3;
    }
}

impl WidgetFlags {
    /// Flags keyed by the attribute that toggles them.
    pub const NAMED: [(&'static str, WidgetFlags); 4] = [
        ("scrollable", WidgetFlags::SCROLLABLE),
        ("mouse", WidgetFlags::MOUSE),
        ("keys", WidgetFlags::KEYS),
        ("focusable", WidgetFlags::FOCUSABLE),
    ];
}
