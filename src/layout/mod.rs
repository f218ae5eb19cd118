//! Layout Module
//!
//! Reproduces the terminal-widget library's constraint semantics:
//! percentages, centering, relative offsets, content-driven shrink sizing,
//! and deriving a missing dimension from opposite-edge constraints.
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::layout::{resolve, Constraint, Constraints, PositionContext};
//!
//! let constraints = Constraints {
//!     left: Constraint::parse("50%-10"),
//!     width: Constraint::parse("20"),
//!     ..Default::default()
//! };
//! let pos = resolve(&constraints, Some(PositionContext::new(100, 30)), None);
//! assert_eq!(pos.left, 40);
//! ```

mod constraint;
mod resolve;
mod text_measure;
mod types;

pub use constraint::Constraint;
pub use resolve::resolve;
pub use text_measure::{measure_content, measure_items, string_width};
pub use types::*;
