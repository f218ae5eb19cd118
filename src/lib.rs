//! # spark-dom
//!
//! Retained virtual DOM for terminal UIs.
//!
//! A declarative UI framework drives the browser-shaped tree API of
//! [`Document`]; the document mirrors every attached element onto exactly one
//! widget of a terminal-widget library behind the [`Host`] trait.
//!
//! ## Architecture
//!
//! ```text
//! framework ops → Document (NodeTree) → Bridge (wrappers) → Host widgets
//!                                         │
//!                          layout::resolve + style::compose
//! ```
//!
//! Widget updates mark the screen dirty; [`Document::flush`] paints it once
//! per scheduling turn.
//!
//! ## Modules
//!
//! - [`dom`] - Virtual node tree and the document API
//! - [`layout`] - Position resolver (percentages, centering, offsets, shrink)
//! - [`bridge`] - Widget wrappers, lifecycle, style/border merge
//! - [`sync`] - Attribute normalization, repaint batching, event forwarding
//! - [`host`] - Host widget library boundary and a headless recording host
//! - [`screen`] - Reactive screen size

pub mod bridge;
pub mod config;
pub mod dom;
pub mod error;
pub mod host;
pub mod layout;
pub mod screen;
pub mod sync;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use bridge::{Bridge, TagMatch, WidgetKind, Wrapper, WrapperId};
pub use config::{DomConfig, RepaintMode};
pub use dom::{Document, Node, NodeData, NodeId, NodeTree, NodeType};
pub use error::{DomError, Result};
pub use host::{Host, HostCall, MemoryHost, WidgetHandle, WidgetOptions};
pub use layout::{resolve, Constraint, Constraints, ContentSize, Extent, PositionContext, ResolvedPosition};
pub use screen::Screen;
pub use sync::{native_from_crossterm, Event, EventData, EventKind, ListenerId, NativeEvent};
