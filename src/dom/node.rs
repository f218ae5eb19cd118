//! Virtual Node - arena-resident node data.
//!
//! Nodes refer to each other by [`NodeId`] instead of pointers, so the
//! parent/sibling links can be rewritten without reference cycles.

use std::fmt;

use serde_json::{Map, Value};

/// Node identifier (index into the tree arena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// The document root.
    pub const ROOT: NodeId = NodeId(0);

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The five node flavours the framework creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Element,
    Text,
    Comment,
    Document,
    Fragment,
}

/// Element-specific data.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    /// Tag name; selects the widget wrapper type.
    pub tag_name: String,
    /// Attributes as the framework set them. Last write wins.
    pub attributes: Map<String, Value>,
}

impl ElementData {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            attributes: Map::new(),
        }
    }
}

/// Node-specific data.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Document,
    Fragment,
    Element(ElementData),
    Text(Option<String>),
    Comment(String),
}

/// A node in the virtual tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) prev_sibling: Option<NodeId>,
    pub(crate) next_sibling: Option<NodeId>,
    pub(crate) data: NodeData,
}

impl Node {
    pub(crate) fn new(data: NodeData) -> Self {
        Self {
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
            data,
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self.data {
            NodeData::Document => NodeType::Document,
            NodeData::Fragment => NodeType::Fragment,
            NodeData::Element(_) => NodeType::Element,
            NodeData::Text(_) => NodeType::Text,
            NodeData::Comment(_) => NodeType::Comment,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn first_child(&self) -> Option<NodeId> {
        self.first_child
    }

    pub fn last_child(&self) -> Option<NodeId> {
        self.last_child
    }

    pub fn previous_sibling(&self) -> Option<NodeId> {
        self.prev_sibling
    }

    pub fn next_sibling(&self) -> Option<NodeId> {
        self.next_sibling
    }

    pub fn data(&self) -> &NodeData {
        &self.data
    }

    /// Text and comment nodes cannot own children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.data, NodeData::Text(_) | NodeData::Comment(_))
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    pub fn tag_name(&self) -> Option<&str> {
        self.as_element().map(|e| e.tag_name.as_str())
    }

    /// Text of a text node, data of a comment; `None` otherwise.
    pub fn node_value(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(value) => value.as_deref(),
            NodeData::Comment(data) => Some(data),
            _ => None,
        }
    }
}
