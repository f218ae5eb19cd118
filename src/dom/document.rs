//! Document - the tree API the framework drives.
//!
//! Every structural mutator validates first, then rewrites the node links,
//! then mirrors the change onto the wrapper tree: a node leaving an attached
//! parent has its widget subtree destroyed, a node arriving under one has its
//! widget subtree created. Both trees agree before any repaint can flush.
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::{Document, MemoryHost, Screen};
//!
//! let mut doc = Document::new(MemoryHost::new(80, 24), Screen::new(80, 24));
//! let root = doc.root();
//! let panel = doc.create_element("box");
//! doc.set_attribute(panel, "width", "50%")?;
//! doc.set_attribute(panel, "border", "line")?;
//! let text = doc.create_text_node("hello");
//! doc.append_child(panel, text)?;
//! doc.append_child(root, panel)?;
//! doc.flush(); // one repaint
//! ```

use std::cell::Cell;
use std::rc::Rc;

use serde_json::{Map, Value};
use spark_signals::effect;

use crate::bridge::{Bridge, Wrapper, WrapperId};
use crate::config::DomConfig;
use crate::error::{DomError, Result};
use crate::host::{Host, WidgetHandle};
use crate::screen::Screen;
use crate::sync::events::{Event, EventKind, ListenerId, NativeEvent};
use crate::sync::normalize::normalize_attribute;

use super::node::{ElementData, Node, NodeData, NodeId, NodeType};
use super::tree::NodeTree;

/// A virtual document mirrored onto a [`Host`].
pub struct Document<H: Host> {
    tree: NodeTree,
    bridge: Bridge,
    host: H,
    screen: Screen,
    config: DomConfig,
    /// Set by the screen watch when the size changed since the last flush.
    stale: Rc<Cell<bool>>,
    stop_watch: Option<Box<dyn FnOnce()>>,
    torn_down: bool,
}

impl<H: Host> Document<H> {
    pub fn new(host: H, screen: Screen) -> Self {
        Self::with_config(host, screen, DomConfig::default())
    }

    pub fn with_config(host: H, screen: Screen, config: DomConfig) -> Self {
        let stale = Rc::new(Cell::new(false));
        let stop_watch = config.reactive.then(|| watch_screen(&screen, stale.clone()));
        Self {
            tree: NodeTree::new(),
            bridge: Bridge::new(&config, screen.context()),
            host,
            screen,
            config,
            stale,
            stop_watch,
            torn_down: false,
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The document node.
    pub fn root(&self) -> NodeId {
        self.tree.root()
    }

    pub fn tree(&self) -> &NodeTree {
        &self.tree
    }

    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.tree.node(id)
    }

    pub fn child_nodes(&self, id: NodeId) -> Vec<NodeId> {
        self.tree.child_nodes(id)
    }

    pub fn parent_node(&self, id: NodeId) -> Option<NodeId> {
        self.tree.parent(id)
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn config(&self) -> &DomConfig {
        &self.config
    }

    /// Wrapper mirroring `node`, if it has one.
    pub fn wrapper(&self, node: NodeId) -> Option<&Wrapper> {
        self.bridge.wrapper_of(node).and_then(|id| self.bridge.wrapper(id))
    }

    /// Backing widget of `node`, present while it is attached.
    pub fn handle_of(&self, node: NodeId) -> Option<WidgetHandle> {
        self.bridge.handle_of(node)
    }

    // =========================================================================
    // Node Creation
    // =========================================================================

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.tree.create(NodeData::Element(ElementData::new(tag)))
    }

    pub fn create_text_node(&mut self, text: impl Into<String>) -> NodeId {
        self.tree.create(NodeData::Text(Some(text.into())))
    }

    pub fn create_comment(&mut self, data: impl Into<String>) -> NodeId {
        self.tree.create(NodeData::Comment(data.into()))
    }

    pub fn create_document_fragment(&mut self) -> NodeId {
        self.tree.create(NodeData::Fragment)
    }

    // =========================================================================
    // Attributes
    // =========================================================================

    /// Set an attribute. The raw value is stored on the node; the wrapper gets
    /// the normalized one.
    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        let element = element_mut(&mut self.tree, node)?;
        element.attributes.insert(name.to_string(), value.clone());
        let tag = element.tag_name.clone();

        let id = self.bridge.ensure_wrapper(node, &tag);
        let mut partial = Map::new();
        partial.insert(name.to_string(), normalize_attribute(name, value));
        self.bridge.set_props(&mut self.host, id, partial);
        Ok(())
    }

    pub fn get_attribute(&self, node: NodeId, name: &str) -> Option<&Value> {
        self.tree.get(node)?.as_element()?.attributes.get(name)
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.get_attribute(node, name).is_some()
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<()> {
        let element = element_mut(&mut self.tree, node)?;
        if element.attributes.remove(name).is_none() {
            return Ok(());
        }
        if let Some(id) = self.bridge.wrapper_of(node) {
            self.bridge.remove_prop(&mut self.host, id, name);
        }
        Ok(())
    }

    // =========================================================================
    // Structural Mutators
    // =========================================================================

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference`; `None` appends.
    ///
    /// A fragment contributes its children, in order.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<()> {
        self.tree.validate_insert(parent, child, reference)?;

        for node in self.tree.insertion_set(child) {
            if reference == Some(node) {
                continue;
            }
            let old_parent = self.tree.parent(node);
            self.unmount(node);
            self.tree.link_before(parent, node, reference);
            if let Some(old) = old_parent.filter(|&old| old != parent) {
                self.refresh_text(old);
            }
            self.mount(node)?;
        }
        self.refresh_text(parent);
        Ok(())
    }

    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.tree.node(parent)?.is_leaf() {
            return Err(DomError::structural(parent, "leaf nodes have no children"));
        }
        if self.tree.node(child)?.parent() != Some(parent) {
            return Err(DomError::NotFound { node: child, parent });
        }
        self.unmount(child);
        self.tree.remove_child(parent, child)?;
        self.refresh_text(parent);
        Ok(())
    }

    /// Put `new` where `old` is, removing `old`.
    pub fn replace_child(&mut self, parent: NodeId, new: NodeId, old: NodeId) -> Result<()> {
        if self.tree.node(old)?.parent() != Some(parent) {
            return Err(DomError::NotFound { node: old, parent });
        }
        if new == old {
            return Ok(());
        }
        self.insert_before(parent, new, Some(old))?;
        self.remove_child(parent, old)
    }

    /// Copy a node, and its subtree when `deep`. The copy is detached and has no widget.
    pub fn clone_node(&mut self, node: NodeId, deep: bool) -> Result<NodeId> {
        self.tree.clone_node(node, deep)
    }

    /// Set the value of a text or comment node. Other nodes ignore it.
    pub fn set_node_value(&mut self, node: NodeId, value: Option<String>) -> Result<()> {
        let entry = self.tree.node_mut(node)?;
        match &mut entry.data {
            NodeData::Text(text) => *text = value,
            NodeData::Comment(data) => *data = value.unwrap_or_default(),
            _ => return Ok(()),
        }
        if let Some(parent) = self.tree.parent(node) {
            self.refresh_text(parent);
        }
        Ok(())
    }

    /// Replace the children of `node` with a single text node (none for "").
    ///
    /// Leaves behave like [`set_node_value`](Self::set_node_value).
    pub fn set_text_content(&mut self, node: NodeId, text: &str) -> Result<()> {
        if self.tree.node(node)?.is_leaf() {
            return self.set_node_value(node, Some(text.to_string()));
        }
        for child in self.tree.child_nodes(node) {
            self.remove_child(node, child)?;
        }
        if !text.is_empty() {
            let text = self.create_text_node(text);
            self.append_child(node, text)?;
        }
        Ok(())
    }

    /// Free a detached subtree along with its wrappers and listeners.
    pub fn release(&mut self, node: NodeId) -> Result<()> {
        let nodes = self.tree.descendants(node);
        self.tree.release(node)?;
        for node in nodes {
            self.bridge.forget(&mut self.host, node);
        }
        Ok(())
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    /// End of a scheduling turn: apply pending screen changes, then repaint
    /// each dirty surface once. Returns the number of surfaces painted.
    pub fn flush(&mut self) -> usize {
        if self.stop_watch.is_some() {
            spark_signals::flush_sync();
            if self.stale.replace(false) {
                self.bridge.set_screen(&mut self.host, self.screen.context());
            }
        }
        self.bridge.flush(&mut self.host)
    }

    /// Resize the screen and relayout every attached widget.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.screen.set_size(width, height);
        self.stale.set(false);
        tracing::debug!(width, height, "screen resized");
        self.bridge.set_screen(&mut self.host, self.screen.context());
    }

    /// Destroy every widget. Runs on drop as well; repeated calls are no-ops.
    ///
    /// The node tree stays usable afterwards, but attaching no longer creates
    /// widgets.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.bridge.teardown(&mut self.host);
        if let Some(stop) = self.stop_watch.take() {
            stop();
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Register `callback` for normalized `kind` events on `node`.
    ///
    /// Listeners belong to the node and outlive re-creation of its widget.
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        kind: EventKind,
        callback: impl Fn(&Event) + 'static,
    ) -> Result<ListenerId> {
        self.tree.node(node)?;
        Ok(self.bridge.add_listener(&mut self.host, node, kind, Rc::new(callback)))
    }

    pub fn remove_event_listener(&mut self, id: ListenerId) -> bool {
        self.bridge.remove_listener(&mut self.host, id)
    }

    /// Deliver a native event emitted for `handle`.
    ///
    /// Returns the normalized record, or `None` when the handle is unknown or
    /// the event is not in the translation table.
    pub fn dispatch_native(&mut self, handle: WidgetHandle, native: &NativeEvent) -> Option<Event> {
        self.bridge.dispatch(&self.host, handle, native)
    }

    // =========================================================================
    // Widget Mirroring
    // =========================================================================

    /// Destroy the widget subtree of an attached node.
    fn unmount(&mut self, node: NodeId) {
        if !self.tree.is_attached(node) {
            return;
        }
        if let Some(id) = self.bridge.wrapper_of(node) {
            self.bridge.destroy(&mut self.host, id);
        }
    }

    /// Create the widget subtree of a node that just became attached.
    ///
    /// After teardown nothing is mounted, so no widget outlives the document.
    fn mount(&mut self, node: NodeId) -> Result<()> {
        if self.torn_down {
            tracing::debug!(%node, "document torn down, widget not created");
            return Ok(());
        }
        if !self.tree.is_attached(node) || !self.tree.node(node)?.is_element() {
            return Ok(());
        }
        let Some(parent) = self.tree.parent(node) else { return Ok(()) };

        let id = self.build_wrappers(node)?;
        let parent_wrapper = self
            .tree
            .parent_element(node)
            .and_then(|p| self.bridge.wrapper_of(p));
        let index = self.tree.element_position(parent, node);
        self.bridge.link(parent_wrapper, id, index);

        let parent_handle = match parent_wrapper {
            Some(p) => self.bridge.wrapper(p).and_then(Wrapper::handle),
            None => Some(self.host.root()),
        };
        match parent_handle {
            Some(handle) => self.bridge.create(&mut self.host, id, handle),
            None => Err(DomError::InvalidParent { wrapper: id }),
        }
    }

    /// Ensure wrappers for `node` and its element descendants, linked in order.
    fn build_wrappers(&mut self, node: NodeId) -> Result<WrapperId> {
        let element = self
            .tree
            .node(node)?
            .as_element()
            .ok_or_else(|| DomError::structural(node, "only elements have widgets"))?;
        let tag = element.tag_name.clone();
        let attributes = element.attributes.clone();

        // A wrapper made while detached only holds the attributes set since;
        // anything not yet created is re-seeded from the node.
        let id = self.bridge.ensure_wrapper(node, &tag);
        if !self.bridge.wrapper(id).is_some_and(Wrapper::is_created) {
            let props = attributes
                .into_iter()
                .map(|(name, value)| {
                    let value = normalize_attribute(&name, value);
                    (name, value)
                })
                .collect();
            self.bridge.set_props(&mut self.host, id, props);
        }
        let text = self.text_of(node);
        self.bridge.set_text(&mut self.host, id, text);

        let mut index = 0;
        for child in self.tree.child_nodes(node) {
            if self.tree.get(child).is_some_and(Node::is_element) {
                let child_id = self.build_wrappers(child)?;
                self.bridge.link(Some(id), child_id, index);
                index += 1;
            }
        }
        Ok(id)
    }

    /// Concatenated direct text children; `None` without any.
    fn text_of(&self, node: NodeId) -> Option<String> {
        let mut text: Option<String> = None;
        for child in self.tree.children(node) {
            if let Some(NodeData::Text(value)) = self.tree.get(child).map(Node::data) {
                text.get_or_insert_with(String::new)
                    .push_str(value.as_deref().unwrap_or(""));
            }
        }
        text
    }

    fn refresh_text(&mut self, node: NodeId) {
        if self.tree.get(node).map(Node::node_type) != Some(NodeType::Element) {
            return;
        }
        if let Some(id) = self.bridge.wrapper_of(node) {
            let text = self.text_of(node);
            self.bridge.set_text(&mut self.host, id, text);
        }
    }
}

impl<H: Host> Drop for Document<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<H: Host + std::fmt::Debug> std::fmt::Debug for Document<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.tree.len())
            .field("bridge", &self.bridge)
            .field("screen", &self.screen)
            .field("host", &self.host)
            .finish()
    }
}

fn element_mut(tree: &mut NodeTree, node: NodeId) -> Result<&mut ElementData> {
    tree.node_mut(node)?
        .as_element_mut()
        .ok_or_else(|| DomError::structural(node, "attributes live on element nodes"))
}

/// Flag `stale` whenever the screen signals change.
fn watch_screen(screen: &Screen, stale: Rc<Cell<bool>>) -> Box<dyn FnOnce()> {
    let width = screen.width_signal();
    let height = screen.height_signal();
    let mut last = (screen.width(), screen.height());
    let stop = effect(move || {
        let size = (width.get(), height.get());
        if size != last {
            last = size;
            stale.set(true);
        }
    });
    Box::new(stop)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::layout::Extent;
    use serde_json::json;

    fn document() -> Document<MemoryHost> {
        Document::new(MemoryHost::new(100, 40), Screen::new(100, 40))
    }

    #[test]
    fn test_widget_created_on_attach() {
        let mut doc = document();
        let root = doc.root();
        let panel = doc.create_element("box");
        doc.set_attribute(panel, "width", 20).unwrap();
        assert!(doc.wrapper(panel).is_some());
        assert_eq!(doc.handle_of(panel), None);

        doc.append_child(root, panel).unwrap();
        let handle = doc.handle_of(panel).unwrap();
        assert_eq!(doc.host().widget(handle).unwrap().position.width, Extent::Cells(20));
    }

    #[test]
    fn test_text_children_become_content() {
        let mut doc = document();
        let root = doc.root();
        let label = doc.create_element("text");
        let a = doc.create_text_node("hello ");
        let b = doc.create_text_node("world");
        doc.append_child(label, a).unwrap();
        doc.append_child(root, label).unwrap();
        doc.append_child(label, b).unwrap();

        let handle = doc.handle_of(label).unwrap();
        assert_eq!(doc.host().widget(handle).unwrap().content, "hello world");
        assert_eq!(doc.host().widget(handle).unwrap().position.width, Extent::Cells(11));

        doc.set_node_value(b, Some("there".into())).unwrap();
        assert_eq!(doc.host().widget(handle).unwrap().content, "hello there");

        doc.remove_child(label, a).unwrap();
        assert_eq!(doc.host().widget(handle).unwrap().content, "there");
    }

    #[test]
    fn test_attribute_api() {
        let mut doc = document();
        let el = doc.create_element("box");
        doc.set_attribute(el, "hidden", "true").unwrap();
        assert_eq!(doc.get_attribute(el, "hidden"), Some(&json!("true")));
        assert!(doc.has_attribute(el, "hidden"));
        assert!(doc.wrapper(el).unwrap().hidden());

        doc.remove_attribute(el, "hidden").unwrap();
        assert!(!doc.has_attribute(el, "hidden"));
        assert!(!doc.wrapper(el).unwrap().hidden());

        let text = doc.create_text_node("x");
        assert!(doc.set_attribute(text, "a", 1).unwrap_err().is_structural());
    }

    #[test]
    fn test_replace_child() {
        let mut doc = document();
        let root = doc.root();
        let old = doc.create_element("box");
        let new = doc.create_element("text");
        doc.append_child(root, old).unwrap();
        let old_handle = doc.handle_of(old).unwrap();

        doc.replace_child(root, new, old).unwrap();
        assert_eq!(doc.child_nodes(root), vec![new]);
        assert!(!doc.host().contains(old_handle));
        assert!(doc.handle_of(new).is_some());

        let stray = doc.create_element("box");
        assert!(doc.replace_child(root, stray, old).unwrap_err().is_not_found());
    }

    #[test]
    fn test_insert_keeps_widget_order() {
        let mut doc = document();
        let root = doc.root();
        let a = doc.create_element("box");
        let b = doc.create_element("box");
        let c = doc.create_element("box");
        doc.append_child(root, a).unwrap();
        doc.append_child(root, c).unwrap();
        doc.insert_before(root, b, Some(c)).unwrap();

        let handles: Vec<_> = [a, b, c].iter().map(|n| doc.handle_of(*n).unwrap()).collect();
        assert_eq!(doc.host().children(MemoryHost::ROOT), handles.as_slice());
    }

    #[test]
    fn test_text_node_rejects_children() {
        let mut doc = document();
        let text = doc.create_text_node("leaf");
        let el = doc.create_element("box");
        assert!(doc.append_child(text, el).unwrap_err().is_structural());
        assert!(doc.remove_child(text, el).unwrap_err().is_structural());
    }

    #[test]
    fn test_release_forgets_wrappers() {
        let mut doc = document();
        let el = doc.create_element("box");
        doc.set_attribute(el, "width", 3).unwrap();
        doc.release(el).unwrap();
        assert!(doc.wrapper(el).is_none());
        assert!(doc.node(el).is_err());
    }

    #[test]
    fn test_teardown_destroys_everything() {
        let mut doc = document();
        let root = doc.root();
        let outer = doc.create_element("box");
        let inner = doc.create_element("button");
        doc.append_child(outer, inner).unwrap();
        doc.append_child(root, outer).unwrap();
        assert_eq!(doc.host().live_widgets(), 2);

        doc.teardown();
        assert_eq!(doc.host().live_widgets(), 0);
        assert_eq!(doc.flush(), 0);
        doc.teardown();
    }

    #[test]
    fn test_no_widgets_after_teardown() {
        let mut doc = document();
        let root = doc.root();
        doc.teardown();

        let panel = doc.create_element("box");
        doc.set_attribute(panel, "width", 10).unwrap();
        doc.append_child(root, panel).unwrap();
        assert_eq!(doc.child_nodes(root), vec![panel]);
        assert_eq!(doc.handle_of(panel), None);
        assert_eq!(doc.host().live_widgets(), 0);
        assert_eq!(doc.flush(), 0);
    }

    #[test]
    fn test_detached_attribute_keeps_earlier_ones() {
        let mut doc = document();
        let root = doc.root();
        let panel = doc.create_element("box");
        doc.set_attribute(panel, "width", 20).unwrap();
        doc.append_child(root, panel).unwrap();
        doc.remove_child(root, panel).unwrap();

        doc.set_attribute(panel, "label", "x").unwrap();
        doc.append_child(root, panel).unwrap();
        let widget = doc.host().widget(doc.handle_of(panel).unwrap()).unwrap();
        assert_eq!(widget.position.width, Extent::Cells(20));
        assert_eq!(widget.label.as_deref(), Some("x"));
    }
}
