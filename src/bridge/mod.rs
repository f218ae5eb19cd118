//! Widget Lifecycle Bridge
//!
//! Keeps exactly one backing widget per attached virtual element and pushes
//! attribute changes to it.
//!
//! # Architecture
//!
//! ```text
//! Element node ──(NodeId)──► Wrapper ──(WidgetHandle)──► Host widget
//!      attrs ─► normalize ─► props ─► resolve + compose ─► option deltas
//! ```
//!
//! Nodes and wrappers never point at each other; [`Bridge`] keeps the id
//! maps, so teardown is removing an id from each map.

mod kind;
mod registry;
pub mod style;
mod wrapper;

pub use kind::{TagMatch, WidgetKind};
pub use registry::Bridge;
pub use style::{compose, Composed, Repair};
pub use wrapper::{Wrapper, WrapperId};
