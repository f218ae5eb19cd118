//! Virtual Node Tree
//!
//! A retained, DOM-shaped tree standing in for the browser document.
//!
//! - [`NodeTree`]: arena of nodes with parent/sibling links
//! - [`Document`]: the framework-facing API, mirroring elements onto widgets

mod document;
mod node;
mod tree;

pub use document::Document;
pub use node::{ElementData, Node, NodeData, NodeId, NodeType};
pub use tree::{Children, NodeTree};
