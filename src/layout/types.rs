//! Layout types - constraint inputs and resolved outputs.

use std::fmt;

use serde_json::{Map, Value};

use super::constraint::Constraint;

// =============================================================================
// Extent
// =============================================================================

/// A resolved width or height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extent {
    /// A concrete number of cells.
    Cells(i32),
    /// Size from content, deferred to the host library's autosize.
    Shrink,
}

impl Extent {
    /// Cell count, if concrete.
    #[inline]
    pub fn cells(self) -> Option<i32> {
        match self {
            Self::Cells(n) => Some(n),
            Self::Shrink => None,
        }
    }

    /// Cell count, treating a deferred size as zero.
    #[inline]
    pub fn or_zero(self) -> i32 {
        self.cells().unwrap_or(0)
    }

    #[inline]
    pub fn is_shrink(self) -> bool {
        matches!(self, Self::Shrink)
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cells(n) => write!(f, "{n}"),
            Self::Shrink => f.write_str("shrink"),
        }
    }
}

// =============================================================================
// Context Inputs
// =============================================================================

/// The parent's resolved dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PositionContext {
    pub width: i32,
    pub height: i32,
}

impl PositionContext {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// An element's intrinsic content size in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ContentSize {
    pub width: i32,
    pub height: i32,
}

impl ContentSize {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Grow by a fixed allowance on each axis (border edges).
    pub fn grow(self, width: i32, height: i32) -> Self {
        Self {
            width: self.width.saturating_add(width),
            height: self.height.saturating_add(height),
        }
    }
}

// =============================================================================
// Constraints
// =============================================================================

/// Declarative position/size constraints of one element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Constraints {
    pub top: Option<Constraint>,
    pub left: Option<Constraint>,
    pub right: Option<Constraint>,
    pub bottom: Option<Constraint>,
    pub width: Option<Constraint>,
    pub height: Option<Constraint>,
}

impl Constraints {
    /// Read constraints from an attribute map.
    ///
    /// Values that do not parse as a constraint are treated as absent.
    pub fn from_props(props: &Map<String, Value>) -> Self {
        let get = |key: &str| props.get(key).and_then(Constraint::from_value);
        Self {
            top: get("top"),
            left: get("left"),
            right: get("right"),
            bottom: get("bottom"),
            width: get("width"),
            height: get("height"),
        }
    }
}

// =============================================================================
// Resolved Position
// =============================================================================

/// Concrete geometry handed to the host library.
///
/// `right`/`bottom` are present only when the input supplied them: the host
/// anchors differently when they are set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedPosition {
    pub top: i32,
    pub left: i32,
    pub width: Extent,
    pub height: Extent,
    pub right: Option<i32>,
    pub bottom: Option<i32>,
}

impl ResolvedPosition {
    /// Dimensions this position offers to its children.
    ///
    /// Deferred extents fall back to `measured` (what the host computed), then zero.
    pub fn context(&self, measured: Option<(i32, i32)>) -> PositionContext {
        let (mw, mh) = measured.unwrap_or((0, 0));
        PositionContext {
            width: self.width.cells().unwrap_or(mw),
            height: self.height.cells().unwrap_or(mh),
        }
    }
}

impl Default for ResolvedPosition {
    fn default() -> Self {
        Self {
            top: 0,
            left: 0,
            width: Extent::Shrink,
            height: Extent::Shrink,
            right: None,
            bottom: None,
        }
    }
}
