//! Position Resolver
//!
//! Turns declarative constraints into concrete geometry relative to the
//! parent's resolved dimensions. Pure: no state, no side effects.
//!
//! The order matters, later steps consume earlier results:
//!
//! ```text
//! width → height → left (may center on width) → top (may center on height)
//! ```

use super::constraint::Constraint;
use super::types::{Constraints, ContentSize, Extent, PositionContext, ResolvedPosition};

/// Resolve `constraints` against the parent context.
///
/// A missing parent resolves against a zero-sized context rather than failing;
/// a later layout pass is expected to correct the result.
///
/// # Example
///
/// ```ignore
/// let c = Constraints { left: Constraint::parse("center"), width: Some(Constraint::Cells(10)), ..Default::default() };
/// let pos = resolve(&c, Some(PositionContext::new(100, 20)), None);
/// assert_eq!(pos.left, 45);
/// ```
pub fn resolve(
    constraints: &Constraints,
    parent: Option<PositionContext>,
    content: Option<ContentSize>,
) -> ResolvedPosition {
    let parent = parent.unwrap_or_default();

    let width = resolve_extent(
        constraints.width,
        constraints.left,
        constraints.right,
        parent.width,
        content.map(|c| c.width),
    );
    let height = resolve_extent(
        constraints.height,
        constraints.top,
        constraints.bottom,
        parent.height,
        content.map(|c| c.height),
    );

    let left = resolve_start(constraints.left, constraints.right, parent.width, width);
    let top = resolve_start(constraints.top, constraints.bottom, parent.height, height);

    ResolvedPosition {
        top,
        left,
        width,
        height,
        right: constraints.right.map(|r| r.length(parent.width)),
        bottom: constraints.bottom.map(|b| b.length(parent.height)),
    }
}

/// Width or height along one axis.
///
/// Explicit size wins, then opposite-edge constraints, then content.
fn resolve_extent(
    explicit: Option<Constraint>,
    start: Option<Constraint>,
    end: Option<Constraint>,
    parent: i32,
    content: Option<i32>,
) -> Extent {
    match (explicit, start, end) {
        (Some(Constraint::Shrink), _, _) => shrink(content),
        (Some(size), _, _) => Extent::Cells(size.length(parent)),
        (None, Some(start), Some(end)) => {
            Extent::Cells(parent.saturating_sub(start.length(parent)).saturating_sub(end.length(parent)))
        }
        _ => shrink(content),
    }
}

#[inline]
fn shrink(content: Option<i32>) -> Extent {
    content.map_or(Extent::Shrink, Extent::Cells)
}

/// Left or top offset along one axis.
///
/// A deferred extent counts as zero cells for centering and end anchoring.
fn resolve_start(
    start: Option<Constraint>,
    end: Option<Constraint>,
    parent: i32,
    extent: Extent,
) -> i32 {
    match (start, end) {
        (Some(Constraint::Center { offset }), _) => {
            parent.saturating_sub(extent.or_zero()).div_euclid(2).saturating_add(offset)
        }
        (Some(start), _) => start.length(parent),
        (None, Some(end)) => parent.saturating_sub(extent.or_zero()).saturating_sub(end.length(parent)),
        (None, None) => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(text: &str) -> Option<Constraint> {
        Constraint::parse(text)
    }

    fn ctx(width: i32, height: i32) -> Option<PositionContext> {
        Some(PositionContext::new(width, height))
    }

    #[test]
    fn test_center_left() {
        let cons = Constraints { left: c("center"), width: c("10"), ..Default::default() };
        let pos = resolve(&cons, ctx(100, 20), None);
        assert_eq!(pos.left, 45);
        assert_eq!(pos.width, Extent::Cells(10));
    }

    #[test]
    fn test_percent_with_offset() {
        let cons = Constraints { left: c("50%-10"), ..Default::default() };
        let pos = resolve(&cons, ctx(100, 20), None);
        assert_eq!(pos.left, 40);
    }

    #[test]
    fn test_width_from_opposite_edges() {
        let cons = Constraints {
            left: c("2"),
            right: c("50%+2"),
            top: c("75%"),
            height: c("4"),
            ..Default::default()
        };
        let pos = resolve(&cons, ctx(100, 40), None);
        assert_eq!(pos.left, 2);
        assert_eq!(pos.width, Extent::Cells(46));
        assert_eq!(pos.top, 30);
        assert_eq!(pos.height, Extent::Cells(4));
        assert_eq!(pos.right, Some(52));
        assert_eq!(pos.bottom, None);
    }

    #[test]
    fn test_full_width_minus_offset() {
        let cons = Constraints { width: c("100%-4"), ..Default::default() };
        assert_eq!(resolve(&cons, ctx(100, 10), None).width, Extent::Cells(96));
        assert_eq!(resolve(&cons, ctx(80, 10), None).width, Extent::Cells(76));
    }

    #[test]
    fn test_right_anchor() {
        let cons = Constraints { right: c("1"), width: c("10"), ..Default::default() };
        let pos = resolve(&cons, ctx(50, 10), None);
        assert_eq!(pos.left, 39);
        assert_eq!(pos.right, Some(1));
    }

    #[test]
    fn test_shrink_uses_content() {
        let cons = Constraints { width: c("shrink"), ..Default::default() };
        let pos = resolve(&cons, ctx(50, 10), Some(ContentSize::new(7, 3)));
        assert_eq!(pos.width, Extent::Cells(7));
        assert_eq!(pos.height, Extent::Cells(3));
    }

    #[test]
    fn test_shrink_without_content_defers() {
        let cons = Constraints { width: c("shrink"), left: c("center"), ..Default::default() };
        let pos = resolve(&cons, ctx(50, 10), None);
        assert_eq!(pos.width, Extent::Shrink);
        assert_eq!(pos.height, Extent::Shrink);
        assert_eq!(pos.left, 25);
    }

    #[test]
    fn test_missing_parent_is_zero() {
        let cons = Constraints { width: c("50%"), left: c("center"), top: c("100%"), ..Default::default() };
        let pos = resolve(&cons, None, None);
        assert_eq!(pos.width, Extent::Cells(0));
        assert_eq!(pos.left, 0);
        assert_eq!(pos.top, 0);
    }

    #[test]
    fn test_explicit_width_beats_edges() {
        let cons = Constraints { left: c("5"), right: c("5"), width: c("20"), ..Default::default() };
        let pos = resolve(&cons, ctx(100, 10), None);
        assert_eq!(pos.width, Extent::Cells(20));
        assert_eq!(pos.left, 5);
    }

    #[test]
    fn test_center_top_with_offset() {
        let cons = Constraints { top: c("center+1"), height: c("4"), ..Default::default() };
        let pos = resolve(&cons, ctx(10, 11), None);
        // floor((11 - 4) / 2) + 1
        assert_eq!(pos.top, 4);
    }

    #[test]
    fn test_extreme_offsets_saturate() {
        let cons = Constraints {
            width: c("2147483647+1"),
            left: c("center-2147483647"),
            top: c("-2147483648"),
            bottom: c("2147483647"),
            ..Default::default()
        };
        let pos = resolve(&cons, ctx(80, 24), None);
        assert_eq!(pos.width, Extent::Cells(i32::MAX));
        assert_eq!(pos.left, i32::MIN);
        assert_eq!(pos.top, i32::MIN);

        let edges = Constraints { left: c("-2147483647"), right: c("2147483647"), ..Default::default() };
        // 80 + i32::MAX saturates before the right edge comes off
        assert_eq!(resolve(&edges, ctx(80, 24), None).width, Extent::Cells(0));
    }
}
