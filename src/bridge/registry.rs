//! Wrapper Registry - lifecycle of wrappers and their backing widgets.
//!
//! Manages:
//! - Node ↔ wrapper and handle ↔ wrapper mappings (no back-pointers)
//! - The wrapper tree, kept isomorphic to the element tree
//! - create / update / destroy against the [`Host`]
//! - Repaint requests and event listener subscriptions
//!
//! A wrapper is linked into the wrapper tree exactly while its element is
//! attached. Destroying removes it from every map, so any later call naming it
//! is a no-op.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

use serde_json::{Map, Value};

use crate::config::DomConfig;
use crate::dom::NodeId;
use crate::error::{DomError, Result};
use crate::host::{Host, WidgetHandle};
use crate::layout::{resolve, Constraints, PositionContext, ResolvedPosition};
use crate::sync::events::{normalize, Event, EventKind, Listener, ListenerId, ListenerRegistry, NativeEvent};
use crate::sync::repaint::RepaintScheduler;

use super::kind::{TagMatch, WidgetKind};
use super::style::Composed;
use super::wrapper::{AppliedState, Wrapper, WrapperId};

/// Owns every wrapper of a document.
pub struct Bridge {
    wrappers: HashMap<WrapperId, Wrapper>,
    by_node: HashMap<NodeId, WrapperId>,
    by_handle: HashMap<WidgetHandle, WrapperId>,
    /// Top-level wrappers in screen order.
    roots: Vec<WrapperId>,
    next_id: u32,
    screen: PositionContext,
    scheduler: RepaintScheduler,
    listeners: ListenerRegistry,
    warned_tags: HashSet<String>,
    shrink_includes_border: bool,
}

impl Bridge {
    pub fn new(config: &DomConfig, screen: PositionContext) -> Self {
        Self {
            wrappers: HashMap::new(),
            by_node: HashMap::new(),
            by_handle: HashMap::new(),
            roots: Vec::new(),
            next_id: 0,
            screen,
            scheduler: RepaintScheduler::new(config.repaint),
            listeners: ListenerRegistry::new(),
            warned_tags: HashSet::new(),
            shrink_includes_border: config.shrink_includes_border,
        }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn wrapper(&self, id: WrapperId) -> Option<&Wrapper> {
        self.wrappers.get(&id)
    }

    pub fn wrapper_of(&self, node: NodeId) -> Option<WrapperId> {
        self.by_node.get(&node).copied()
    }

    pub fn wrapper_by_handle(&self, handle: WidgetHandle) -> Option<WrapperId> {
        self.by_handle.get(&handle).copied()
    }

    /// Backing widget of `node`, if it has a created wrapper.
    pub fn handle_of(&self, node: NodeId) -> Option<WidgetHandle> {
        self.wrapper_of(node)
            .and_then(|id| self.wrappers.get(&id))
            .and_then(Wrapper::handle)
    }

    pub fn roots(&self) -> &[WrapperId] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.wrappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wrappers.is_empty()
    }

    pub fn pending_repaints(&self) -> usize {
        self.scheduler.pending()
    }

    // =========================================================================
    // Snapshot Updates
    // =========================================================================

    /// Wrapper for `node`, creating an uncreated one on first use.
    pub fn ensure_wrapper(&mut self, node: NodeId, tag: &str) -> WrapperId {
        if let Some(id) = self.by_node.get(&node) {
            return *id;
        }

        let kind = match WidgetKind::from_tag(tag) {
            TagMatch::Known(kind) => kind,
            TagMatch::Fallback(kind) => {
                if self.warned_tags.insert(tag.to_ascii_lowercase()) {
                    tracing::warn!(tag, fallback = kind.as_str(), "unknown tag, using fallback widget");
                }
                kind
            }
        };

        let id = WrapperId(self.next_id);
        self.next_id += 1;
        self.wrappers.insert(id, Wrapper::new(id, node, tag, kind));
        self.by_node.insert(node, id);
        id
    }

    /// Merge attributes into the snapshot; a created widget is updated.
    pub fn set_props<H: Host>(&mut self, host: &mut H, id: WrapperId, partial: Map<String, Value>) {
        let Some(wrapper) = self.wrappers.get_mut(&id) else { return };
        wrapper.merge_props(partial);
        if wrapper.is_created() {
            self.update(host, id);
        }
    }

    pub fn remove_prop<H: Host>(&mut self, host: &mut H, id: WrapperId, name: &str) {
        let Some(wrapper) = self.wrappers.get_mut(&id) else { return };
        if wrapper.remove_prop(name) && wrapper.is_created() {
            self.update(host, id);
        }
    }

    /// Replace the text gathered from child text nodes.
    pub fn set_text<H: Host>(&mut self, host: &mut H, id: WrapperId, text: Option<String>) {
        let Some(wrapper) = self.wrappers.get_mut(&id) else { return };
        if wrapper.set_text(text) && wrapper.is_created() {
            self.update(host, id);
        }
    }

    // =========================================================================
    // Wrapper Tree
    // =========================================================================

    /// Place `child` at `index` under `parent` (top level when `None`).
    pub fn link(&mut self, parent: Option<WrapperId>, child: WrapperId, index: usize) {
        self.unlink(child);
        let siblings = match parent {
            Some(p) => match self.wrappers.get_mut(&p) {
                Some(w) => &mut w.children,
                None => return,
            },
            None => &mut self.roots,
        };
        let index = index.min(siblings.len());
        siblings.insert(index, child);
        if let Some(w) = self.wrappers.get_mut(&child) {
            w.parent = parent;
        }
    }

    fn unlink(&mut self, child: WrapperId) {
        let parent = self.wrappers.get_mut(&child).and_then(|w| w.parent.take());
        match parent {
            Some(p) => {
                if let Some(w) = self.wrappers.get_mut(&p) {
                    w.children.retain(|c| *c != child);
                }
            }
            None => self.roots.retain(|c| *c != child),
        }
    }

    fn siblings(&self, parent: Option<WrapperId>) -> &[WrapperId] {
        match parent {
            Some(p) => self.wrappers.get(&p).map(|w| w.children.as_slice()).unwrap_or(&[]),
            None => &self.roots,
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Instantiate the backing widget of `id` under `parent_handle`, then its children.
    ///
    /// Fails with [`DomError::InvalidParent`] when the host does not know
    /// `parent_handle`. Already-created and destroyed wrappers are left alone.
    pub fn create<H: Host>(&mut self, host: &mut H, id: WrapperId, parent_handle: WidgetHandle) -> Result<()> {
        if !host.contains(parent_handle) {
            return Err(DomError::InvalidParent { wrapper: id });
        }
        let Some(wrapper) = self.wrappers.get(&id) else { return Ok(()) };
        if wrapper.is_created() {
            return Ok(());
        }

        let kind = wrapper.kind();
        let (state, composed) = self.layout_of(host, wrapper);
        let handle = host.create_widget(kind, &state.options(parent_handle));

        // The host appends; move the widget to its slot among created siblings.
        let parent = wrapper.parent;
        let created: Vec<WrapperId> = self
            .siblings(parent)
            .iter()
            .copied()
            .filter(|s| *s == id || self.wrappers.get(s).is_some_and(Wrapper::is_created))
            .collect();
        if let Some(index) = created.iter().position(|s| *s == id) {
            if index + 1 < created.len() {
                host.set_index(handle, index);
            }
        }

        let node = wrapper.node();
        let children = wrapper.children.clone();
        if let Some(wrapper) = self.wrappers.get_mut(&id) {
            wrapper.handle = Some(handle);
            wrapper.layout = state.position;
            wrapper.applied = Some(state);
            wrapper.report(&composed);
        }
        self.by_handle.insert(handle, id);

        for event in self.listeners.kinds(node) {
            for name in event.native_names() {
                host.on(handle, name);
            }
        }
        tracing::debug!(wrapper = %id, %node, %handle, kind = kind.as_str(), "widget created");
        self.request_repaint(host);

        for child in children {
            self.create(host, child, handle)?;
        }
        Ok(())
    }

    /// Re-apply layout and option deltas to an existing backing widget.
    ///
    /// Only changed options reach the host. Children are updated when this
    /// widget's geometry changed.
    pub fn update<H: Host>(&mut self, host: &mut H, id: WrapperId) {
        let Some(wrapper) = self.wrappers.get(&id) else { return };
        let Some(handle) = wrapper.handle else { return };

        let (next, composed) = self.layout_of(host, wrapper);
        let prev = wrapper.applied.clone();
        let children = wrapper.children.clone();

        let geometry_changed = apply_delta(host, handle, prev.as_ref(), &next);

        if let Some(wrapper) = self.wrappers.get_mut(&id) {
            wrapper.layout = next.position;
            wrapper.applied = Some(next);
            wrapper.report(&composed);
        }
        self.request_repaint(host);

        if geometry_changed {
            for child in children {
                self.update(host, child);
            }
        }
    }

    /// Tear down `id`: children first, then its backing widget.
    ///
    /// Destroying twice is a no-op.
    pub fn destroy<H: Host>(&mut self, host: &mut H, id: WrapperId) {
        let Some(children) = self.wrappers.get(&id).map(|w| w.children.clone()) else { return };
        for child in children {
            self.destroy(host, child);
        }

        self.unlink(id);
        let Some(wrapper) = self.wrappers.remove(&id) else { return };
        if self.by_node.get(&wrapper.node()) == Some(&id) {
            self.by_node.remove(&wrapper.node());
        }

        if let Some(handle) = wrapper.handle {
            self.by_handle.remove(&handle);
            if host.contains(handle) {
                host.detach(handle);
                host.destroy(handle);
            }
            tracing::debug!(wrapper = %id, node = %wrapper.node(), %handle, "widget destroyed");
            self.request_repaint(host);
        }
    }

    /// Forget the wrapper and listeners of a node that is being released.
    pub fn forget<H: Host>(&mut self, host: &mut H, node: NodeId) {
        if let Some(id) = self.wrapper_of(node) {
            self.destroy(host, id);
        }
        self.listeners.clear(node);
    }

    /// Resize the screen and update every top-level widget.
    pub fn set_screen<H: Host>(&mut self, host: &mut H, screen: PositionContext) {
        if self.screen == screen {
            return;
        }
        self.screen = screen;
        for root in self.roots.clone() {
            self.update(host, root);
        }
    }

    /// Destroy every wrapper and drop the pending screen repaint.
    pub fn teardown<H: Host>(&mut self, host: &mut H) {
        for root in self.roots.clone() {
            self.destroy(host, root);
        }
        self.wrappers.clear();
        self.by_node.clear();
        self.by_handle.clear();
        self.scheduler.discard(host.root());
    }

    // =========================================================================
    // Repaint
    // =========================================================================

    fn request_repaint<H: Host>(&mut self, host: &mut H) {
        let surface = host.root();
        if self.scheduler.request(surface) {
            host.render(surface);
        }
    }

    /// Paint every dirty surface. Returns how many were painted.
    pub fn flush<H: Host>(&mut self, host: &mut H) -> usize {
        self.scheduler.flush(host)
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn add_listener<H: Host>(&mut self, host: &mut H, node: NodeId, kind: EventKind, callback: Listener) -> ListenerId {
        let (id, first) = self.listeners.add(node, kind, callback);
        if first {
            if let Some(handle) = self.handle_of(node) {
                for name in kind.native_names() {
                    host.on(handle, name);
                }
            }
        }
        id
    }

    /// Unregister a listener. Returns false if it was not registered.
    pub fn remove_listener<H: Host>(&mut self, host: &mut H, id: ListenerId) -> bool {
        let Some((node, kind, last)) = self.listeners.remove(id) else { return false };
        if last {
            if let Some(handle) = self.handle_of(node) {
                for name in kind.native_names() {
                    host.off(handle, name);
                }
            }
        }
        true
    }

    /// Normalize a native event from `handle` and run its listeners.
    pub fn dispatch<H: Host>(&self, host: &H, handle: WidgetHandle, native: &NativeEvent) -> Option<Event> {
        let target = self.wrapper_by_handle(handle)?;
        let node = self.wrappers.get(&target)?.node();
        let (kind, data) = normalize(native, host.dimensions(handle))?;
        let event = Event {
            kind,
            timestamp: Instant::now(),
            data,
            target,
            node,
        };
        for listener in self.listeners.listeners(node, kind) {
            listener(&event);
        }
        Some(event)
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Context `wrapper` resolves against: its parent's geometry, or the screen.
    fn context_of<H: Host>(&self, host: &H, wrapper: &Wrapper) -> PositionContext {
        let parent = wrapper.parent.and_then(|p| self.wrappers.get(&p));
        match parent.and_then(|p| p.handle.map(|h| (p, h))) {
            Some((parent, handle)) => parent.layout.context(host.dimensions(handle)),
            None => self.screen,
        }
    }

    fn layout_of<H: Host>(&self, host: &H, wrapper: &Wrapper) -> (AppliedState, Composed) {
        let composed = wrapper.compose();
        let content = wrapper.content_size(composed.border.as_ref(), self.shrink_includes_border);
        let context = self.context_of(host, wrapper);
        let position = resolve(&Constraints::from_props(wrapper.props()), Some(context), content);
        let state = wrapper.desired(position, composed.clone());
        (state, composed)
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("wrappers", &self.wrappers.len())
            .field("roots", &self.roots)
            .field("screen", &self.screen)
            .finish()
    }
}

/// Push changed options to the host. Returns true if geometry changed.
fn apply_delta<H: Host>(host: &mut H, handle: WidgetHandle, prev: Option<&AppliedState>, next: &AppliedState) -> bool {
    let position_changed = prev.is_none_or(|p| p.position != next.position);
    if position_changed {
        set_position(host, handle, &next.position);
    }
    let content_changed = prev.is_none_or(|p| p.content != next.content);
    if content_changed {
        tracing::trace!(%handle, "set_content");
        host.set_content(handle, next.content.as_deref().unwrap_or(""));
    }
    if prev.is_none_or(|p| p.label != next.label) {
        tracing::trace!(%handle, "set_label");
        host.set_label(handle, next.label.as_deref());
    }
    if prev.is_none_or(|p| p.style != next.style) {
        tracing::trace!(%handle, "set_style");
        host.set_style(handle, &next.style);
    }
    let border_changed = prev.is_none_or(|p| p.border != next.border);
    if border_changed {
        tracing::trace!(%handle, "set_border");
        host.set_border(handle, next.border.as_ref());
    }
    if let Some(items) = &next.items {
        if prev.is_none_or(|p| p.items.as_ref() != Some(items)) {
            tracing::trace!(%handle, count = items.len(), "set_items");
            host.set_items(handle, items);
        }
    }
    if let Some(filled) = next.filled {
        if prev.is_none_or(|p| p.filled != Some(filled)) {
            tracing::trace!(%handle, filled, "set_progress");
            host.set_progress(handle, filled);
        }
    }
    if prev.is_none_or(|p| p.hidden != next.hidden) {
        tracing::trace!(%handle, hidden = next.hidden, "visibility");
        if next.hidden {
            host.hide(handle);
        } else {
            host.show(handle);
        }
    }

    let items_changed = prev.is_none_or(|p| p.items != next.items);
    position_changed || content_changed || border_changed || items_changed
}

fn set_position<H: Host>(host: &mut H, handle: WidgetHandle, position: &ResolvedPosition) {
    tracing::trace!(
        %handle,
        top = position.top,
        left = position.left,
        width = %position.width,
        height = %position.height,
        "set_position"
    );
    host.set_position(handle, position);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostCall, MemoryHost};
    use crate::layout::Extent;
    use serde_json::json;

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn bridge() -> Bridge {
        Bridge::new(&DomConfig::default(), PositionContext::new(100, 40))
    }

    fn root_box(bridge: &mut Bridge, host: &mut MemoryHost, node: u32, attrs: Value) -> WrapperId {
        let id = bridge.ensure_wrapper(NodeId(node), "box");
        bridge.set_props(host, id, props(attrs));
        bridge.link(None, id, usize::MAX);
        id
    }

    #[test]
    fn test_create_resolves_against_screen() {
        let mut host = MemoryHost::new(100, 40);
        let mut bridge = bridge();
        let id = root_box(&mut bridge, &mut host, 1, json!({"left": "center", "width": 10}));

        bridge.create(&mut host, id, MemoryHost::ROOT).unwrap();
        let handle = bridge.wrapper(id).unwrap().handle().unwrap();
        let widget = host.widget(handle).unwrap();
        assert_eq!(widget.position.left, 45);
        assert_eq!(widget.position.width, Extent::Cells(10));
    }

    #[test]
    fn test_create_requires_valid_parent() {
        let mut host = MemoryHost::new(80, 24);
        let mut bridge = bridge();
        let id = root_box(&mut bridge, &mut host, 1, json!({}));

        let err = bridge.create(&mut host, id, WidgetHandle(99)).unwrap_err();
        assert!(matches!(err, DomError::InvalidParent { wrapper } if wrapper == id));
        assert_eq!(host.live_widgets(), 0);
    }

    #[test]
    fn test_children_use_parent_geometry() {
        let mut host = MemoryHost::new(100, 40);
        let mut bridge = bridge();
        let parent = root_box(&mut bridge, &mut host, 1, json!({"width": 50, "height": 20}));
        let child = bridge.ensure_wrapper(NodeId(2), "box");
        bridge.set_props(&mut host, child, props(json!({"width": "50%", "top": "center", "height": 4})));
        bridge.link(Some(parent), child, 0);

        bridge.create(&mut host, parent, MemoryHost::ROOT).unwrap();
        let handle = bridge.wrapper(child).unwrap().handle().unwrap();
        let widget = host.widget(handle).unwrap();
        assert_eq!(widget.position.width, Extent::Cells(25));
        assert_eq!(widget.position.top, 8);
    }

    #[test]
    fn test_same_props_twice_is_idempotent() {
        let mut host = MemoryHost::new(80, 24);
        let mut bridge = bridge();
        let id = root_box(&mut bridge, &mut host, 1, json!({"width": 10}));
        bridge.create(&mut host, id, MemoryHost::ROOT).unwrap();

        bridge.set_props(&mut host, id, props(json!({"label": "a", "width": 12})));
        host.clear_calls();
        bridge.set_props(&mut host, id, props(json!({"label": "a", "width": 12})));
        assert_eq!(host.mutation_count(), 0);
    }

    #[test]
    fn test_update_cascades_on_geometry_change() {
        let mut host = MemoryHost::new(100, 40);
        let mut bridge = bridge();
        let parent = root_box(&mut bridge, &mut host, 1, json!({"width": 40}));
        let child = bridge.ensure_wrapper(NodeId(2), "box");
        bridge.set_props(&mut host, child, props(json!({"width": "50%"})));
        bridge.link(Some(parent), child, 0);
        bridge.create(&mut host, parent, MemoryHost::ROOT).unwrap();

        bridge.set_props(&mut host, parent, props(json!({"width": 60})));
        let handle = bridge.wrapper(child).unwrap().handle().unwrap();
        assert_eq!(host.widget(handle).unwrap().position.width, Extent::Cells(30));
    }

    #[test]
    fn test_destroy_twice() {
        let mut host = MemoryHost::new(80, 24);
        let mut bridge = bridge();
        let parent = root_box(&mut bridge, &mut host, 1, json!({}));
        let child = bridge.ensure_wrapper(NodeId(2), "text");
        bridge.link(Some(parent), child, 0);
        bridge.create(&mut host, parent, MemoryHost::ROOT).unwrap();
        assert_eq!(host.live_widgets(), 2);

        bridge.destroy(&mut host, parent);
        host.clear_calls();
        bridge.destroy(&mut host, parent);
        bridge.set_props(&mut host, parent, props(json!({"width": 3})));
        bridge.update(&mut host, child);

        assert!(host.calls().is_empty());
        assert_eq!(host.live_widgets(), 0);
        assert!(bridge.is_empty());
    }

    #[test]
    fn test_destroy_children_first() {
        let mut host = MemoryHost::new(80, 24);
        let mut bridge = bridge();
        let parent = root_box(&mut bridge, &mut host, 1, json!({}));
        let child = bridge.ensure_wrapper(NodeId(2), "box");
        bridge.link(Some(parent), child, 0);
        bridge.create(&mut host, parent, MemoryHost::ROOT).unwrap();
        let parent_handle = bridge.handle_of(NodeId(1)).unwrap();
        let child_handle = bridge.handle_of(NodeId(2)).unwrap();
        host.clear_calls();

        bridge.destroy(&mut host, parent);
        let destroys: Vec<_> = host
            .calls()
            .iter()
            .filter_map(|c| match c {
                HostCall::Destroy(h) => Some(*h),
                _ => None,
            })
            .collect();
        assert_eq!(destroys, vec![child_handle, parent_handle]);
    }

    #[test]
    fn test_batched_updates_render_once() {
        let mut host = MemoryHost::new(80, 24);
        let mut bridge = bridge();
        let id = root_box(&mut bridge, &mut host, 1, json!({}));
        bridge.create(&mut host, id, MemoryHost::ROOT).unwrap();
        bridge.flush(&mut host);
        host.clear_calls();

        for n in 0..5 {
            bridge.set_props(&mut host, id, props(json!({"width": n})));
        }
        assert_eq!(host.render_count(), 0);
        assert_eq!(bridge.flush(&mut host), 1);
        assert_eq!(host.render_count(), 1);
    }

    #[test]
    fn test_unknown_tag_falls_back() {
        let mut bridge = bridge();
        let a = bridge.ensure_wrapper(NodeId(1), "marquee");
        let b = bridge.ensure_wrapper(NodeId(2), "span");
        assert_eq!(bridge.wrapper(a).unwrap().kind(), WidgetKind::Box);
        assert_eq!(bridge.wrapper(b).unwrap().kind(), WidgetKind::Text);
        assert_eq!(bridge.ensure_wrapper(NodeId(1), "marquee"), a);
    }
}
