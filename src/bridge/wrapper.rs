//! Widget Wrapper - one per virtual element.
//!
//! A wrapper holds the last-applied attribute snapshot of its element and, once
//! created, the single backing widget handle it owns. Everything the host is
//! told is derived from the snapshot here; the registry decides when.

use std::collections::HashSet;
use std::fmt;

use serde_json::{Map, Value};

use crate::dom::NodeId;
use crate::host::{WidgetHandle, WidgetOptions};
use crate::layout::{measure_content, measure_items, ContentSize, ResolvedPosition};
use crate::sync::normalize::{coerce_bool, coerce_items, display_string, text_value};
use crate::types::{Border, Style, WidgetFlags};

use super::kind::WidgetKind;
use super::style::{compose, Composed, Repair};

/// Stable wrapper identity, never reused within a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WrapperId(pub(crate) u32);

impl fmt::Display for WrapperId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// What the backing widget was last told.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AppliedState {
    pub position: ResolvedPosition,
    pub content: Option<String>,
    pub label: Option<String>,
    pub style: Style,
    pub border: Option<Border>,
    pub hidden: bool,
    pub items: Option<Vec<String>>,
    pub filled: Option<u8>,
    pub flags: WidgetFlags,
}

impl AppliedState {
    pub fn options(&self, parent: WidgetHandle) -> WidgetOptions {
        WidgetOptions {
            parent,
            position: self.position,
            content: self.content.clone(),
            style: self.style.clone(),
            border: self.border.clone(),
            label: self.label.clone(),
            hidden: self.hidden,
            items: self.items.clone(),
            filled: self.filled,
            flags: self.flags,
        }
    }
}

/// Bridge-side mirror of one element.
#[derive(Debug)]
pub struct Wrapper {
    id: WrapperId,
    node: NodeId,
    tag: String,
    kind: WidgetKind,
    props: Map<String, Value>,
    /// Concatenated text-node children; `None` without any.
    text: Option<String>,
    pub(crate) handle: Option<WidgetHandle>,
    pub(crate) parent: Option<WrapperId>,
    pub(crate) children: Vec<WrapperId>,
    pub(crate) layout: ResolvedPosition,
    pub(crate) applied: Option<AppliedState>,
    reported: HashSet<Repair>,
    noted_orphan_fragment: bool,
}

impl Wrapper {
    pub(crate) fn new(id: WrapperId, node: NodeId, tag: &str, kind: WidgetKind) -> Self {
        Self {
            id,
            node,
            tag: tag.to_string(),
            kind,
            props: Map::new(),
            text: None,
            handle: None,
            parent: None,
            children: Vec::new(),
            layout: ResolvedPosition::default(),
            applied: None,
            reported: HashSet::new(),
            noted_orphan_fragment: false,
        }
    }

    pub fn id(&self) -> WrapperId {
        self.id
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn kind(&self) -> WidgetKind {
        self.kind
    }

    pub fn props(&self) -> &Map<String, Value> {
        &self.props
    }

    /// Backing widget, present between create and destroy.
    pub fn handle(&self) -> Option<WidgetHandle> {
        self.handle
    }

    pub fn parent(&self) -> Option<WrapperId> {
        self.parent
    }

    pub fn children(&self) -> &[WrapperId] {
        &self.children
    }

    /// Geometry last resolved for this wrapper.
    pub fn layout(&self) -> &ResolvedPosition {
        &self.layout
    }

    #[inline]
    pub fn is_created(&self) -> bool {
        self.handle.is_some()
    }

    // =========================================================================
    // Snapshot
    // =========================================================================

    /// Merge `partial` into the snapshot. Returns true if anything changed.
    pub(crate) fn merge_props(&mut self, partial: Map<String, Value>) -> bool {
        let mut changed = false;
        for (name, value) in partial {
            if self.props.get(&name) != Some(&value) {
                self.props.insert(name, value);
                changed = true;
            }
        }
        changed
    }

    pub(crate) fn remove_prop(&mut self, name: &str) -> bool {
        self.props.remove(name).is_some()
    }

    pub(crate) fn set_text(&mut self, text: Option<String>) -> bool {
        if self.text == text {
            return false;
        }
        self.text = text;
        true
    }

    // =========================================================================
    // Derived Options
    // =========================================================================

    /// Display content: the `content` attribute, else the child text.
    ///
    /// Inputs read `value` first. Lists carry items instead.
    pub fn content(&self) -> Option<String> {
        if !self.kind.has_text_content() {
            return None;
        }
        if self.kind == WidgetKind::Input {
            if let Some(value) = self.props.get("value").filter(|v| !v.is_null()) {
                return Some(display_string(value));
            }
        }
        match self.props.get("content").filter(|v| !v.is_null()) {
            Some(content) => Some(display_string(content)),
            None => self.text.clone(),
        }
    }

    pub fn label(&self) -> Option<String> {
        self.props.get("label").and_then(text_value)
    }

    pub fn hidden(&self) -> bool {
        let flag = |name: &str| self.props.get(name).and_then(coerce_bool);
        flag("hidden") == Some(true) || flag("visible") == Some(false)
    }

    pub fn items(&self) -> Option<Vec<String>> {
        if self.kind != WidgetKind::List {
            return None;
        }
        Some(self.props.get("items").and_then(coerce_items).unwrap_or_default())
    }

    /// Progress percentage, clamped to 0..=100.
    pub fn filled(&self) -> Option<u8> {
        if self.kind != WidgetKind::Progress {
            return None;
        }
        let filled = self.props.get("filled").and_then(Value::as_f64).unwrap_or(0.0);
        Some(filled.clamp(0.0, 100.0).round() as u8)
    }

    /// Kind defaults, overridden by boolean attributes.
    pub fn flags(&self) -> WidgetFlags {
        let mut flags = self.kind.default_flags();
        for (name, flag) in WidgetFlags::NAMED {
            match self.props.get(name).and_then(coerce_bool) {
                Some(true) => flags.insert(flag),
                Some(false) => flags.remove(flag),
                None => {}
            }
        }
        flags
    }

    /// Style and border after the merge policy.
    pub fn compose(&self) -> Composed {
        compose(self.props.get("style"), self.props.get("border"))
    }

    /// Intrinsic size for shrink sizing; `None` defers to the host.
    pub(crate) fn content_size(&self, border: Option<&Border>, include_border: bool) -> Option<ContentSize> {
        let size = match self.items() {
            Some(items) => measure_items(&items),
            None => measure_content(&self.content()?),
        };
        Some(match border {
            Some(border) if include_border => size.grow(border.horizontal(), border.vertical()),
            _ => size,
        })
    }

    /// Everything the backing widget should currently show.
    pub(crate) fn desired(&self, position: ResolvedPosition, composed: Composed) -> AppliedState {
        AppliedState {
            position,
            content: self.content(),
            label: self.label(),
            style: composed.style,
            border: composed.border,
            hidden: self.hidden(),
            items: self.items(),
            filled: self.filled(),
            flags: self.flags(),
        }
    }

    /// Log each repair kind the first time this wrapper needs it.
    pub(crate) fn report(&mut self, composed: &Composed) {
        for &repair in &composed.repairs {
            if self.reported.insert(repair) {
                tracing::warn!(
                    node = %self.node,
                    tag = %self.tag,
                    repair = repair.as_str(),
                    "repaired corrupted style encoding"
                );
            }
        }
        if composed.orphan_fragment && !self.noted_orphan_fragment {
            self.noted_orphan_fragment = true;
            tracing::debug!(node = %self.node, tag = %self.tag, "style.border ignored without a border attribute");
        }
    }
}
