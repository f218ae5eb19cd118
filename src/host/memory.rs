//! Memory Host - headless widget library.
//!
//! Keeps a widget graph in memory and logs every call it receives, so a
//! document can be driven without a terminal and its traffic inspected.

use std::collections::{BTreeMap, BTreeSet};

use crate::bridge::WidgetKind;
use crate::layout::{measure_content, measure_items, Extent, ResolvedPosition};
use crate::types::{Border, Style, WidgetFlags};

use super::{Host, WidgetHandle, WidgetOptions};

// =============================================================================
// Types
// =============================================================================

/// One call received by the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Create { handle: WidgetHandle, kind: WidgetKind, parent: WidgetHandle },
    SetIndex { handle: WidgetHandle, index: usize },
    Position(WidgetHandle),
    Content(WidgetHandle, String),
    Label(WidgetHandle, Option<String>),
    Style(WidgetHandle),
    Border(WidgetHandle),
    Items(WidgetHandle),
    Progress(WidgetHandle, u8),
    Show(WidgetHandle),
    Hide(WidgetHandle),
    Detach(WidgetHandle),
    Destroy(WidgetHandle),
    Render(WidgetHandle),
    On(WidgetHandle, String),
    Off(WidgetHandle, String),
}

impl HostCall {
    #[inline]
    pub fn is_render(&self) -> bool {
        matches!(self, Self::Render(_))
    }

    /// Calls that change a widget (everything but paints and subscriptions).
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Render(_) | Self::On(..) | Self::Off(..))
    }
}

/// State of one widget as last set by the bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryWidget {
    /// `None` for the screen.
    pub kind: Option<WidgetKind>,
    pub parent: Option<WidgetHandle>,
    pub children: Vec<WidgetHandle>,
    pub position: ResolvedPosition,
    pub content: String,
    pub label: Option<String>,
    pub style: Style,
    pub border: Option<Border>,
    pub hidden: bool,
    pub items: Vec<String>,
    pub filled: u8,
    pub flags: WidgetFlags,
    pub subscriptions: BTreeSet<String>,
}

impl MemoryWidget {
    fn screen(width: i32, height: i32) -> Self {
        Self {
            kind: None,
            parent: None,
            children: Vec::new(),
            position: ResolvedPosition {
                width: Extent::Cells(width),
                height: Extent::Cells(height),
                ..Default::default()
            },
            content: String::new(),
            label: None,
            style: Style::new(),
            border: None,
            hidden: false,
            items: Vec::new(),
            filled: 0,
            flags: WidgetFlags::NONE,
            subscriptions: BTreeSet::new(),
        }
    }

    fn from_options(kind: WidgetKind, options: &WidgetOptions) -> Self {
        Self {
            kind: Some(kind),
            parent: Some(options.parent),
            children: Vec::new(),
            position: options.position,
            content: options.content.clone().unwrap_or_default(),
            label: options.label.clone(),
            style: options.style.clone(),
            border: options.border.clone(),
            hidden: options.hidden,
            items: options.items.clone().unwrap_or_default(),
            filled: options.filled.unwrap_or(0),
            flags: options.flags,
            subscriptions: BTreeSet::new(),
        }
    }

    /// Autosized dimensions, the way a host would measure a shrink widget.
    fn measured(&self) -> (i32, i32) {
        let content = if self.kind == Some(WidgetKind::List) {
            measure_items(&self.items)
        } else {
            measure_content(&self.content)
        };
        let content = match &self.border {
            Some(border) => content.grow(border.horizontal(), border.vertical()),
            None => content,
        };
        (
            self.position.width.cells().unwrap_or(content.width),
            self.position.height.cells().unwrap_or(content.height),
        )
    }
}

// =============================================================================
// Memory Host
// =============================================================================

/// Headless [`Host`] that records its traffic.
#[derive(Debug)]
pub struct MemoryHost {
    widgets: BTreeMap<WidgetHandle, MemoryWidget>,
    next: u64,
    calls: Vec<HostCall>,
}

impl MemoryHost {
    /// Handle of the screen surface.
    pub const ROOT: WidgetHandle = WidgetHandle(0);

    /// Create a host with a `width` x `height` screen.
    pub fn new(width: u16, height: u16) -> Self {
        let mut widgets = BTreeMap::new();
        widgets.insert(Self::ROOT, MemoryWidget::screen(width as i32, height as i32));
        Self {
            widgets,
            next: 1,
            calls: Vec::new(),
        }
    }

    /// Resize the screen surface.
    pub fn set_screen_size(&mut self, width: u16, height: u16) {
        if let Some(screen) = self.widgets.get_mut(&Self::ROOT) {
            screen.position.width = Extent::Cells(width as i32);
            screen.position.height = Extent::Cells(height as i32);
        }
    }

    /// All calls received so far.
    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    /// Drain the call log.
    pub fn take_calls(&mut self) -> Vec<HostCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Number of `render` calls in the log.
    pub fn render_count(&self) -> usize {
        self.calls.iter().filter(|c| c.is_render()).count()
    }

    /// Number of widget-changing calls in the log.
    pub fn mutation_count(&self) -> usize {
        self.calls.iter().filter(|c| c.is_mutation()).count()
    }

    pub fn widget(&self, handle: WidgetHandle) -> Option<&MemoryWidget> {
        self.widgets.get(&handle)
    }

    /// Children of `handle` in paint order.
    pub fn children(&self, handle: WidgetHandle) -> &[WidgetHandle] {
        self.widgets.get(&handle).map(|w| w.children.as_slice()).unwrap_or(&[])
    }

    /// Number of live widgets, the screen excluded.
    pub fn live_widgets(&self) -> usize {
        self.widgets.len() - 1
    }

    /// Live widgets that are not attached to any parent.
    pub fn orphans(&self) -> Vec<WidgetHandle> {
        self.widgets
            .iter()
            .filter(|(h, w)| **h != Self::ROOT && w.parent.is_none_or(|p| !self.widgets.contains_key(&p)))
            .map(|(h, _)| *h)
            .collect()
    }

    /// First widget (in handle order) whose content equals `content`.
    pub fn find_by_content(&self, content: &str) -> Option<WidgetHandle> {
        self.widgets
            .iter()
            .find(|(_, w)| w.kind.is_some() && w.content == content)
            .map(|(h, _)| *h)
    }

    fn unlink(&mut self, handle: WidgetHandle) {
        let parent = self.widgets.get_mut(&handle).and_then(|w| w.parent.take());
        if let Some(parent) = parent.and_then(|p| self.widgets.get_mut(&p)) {
            parent.children.retain(|c| *c != handle);
        }
    }

    fn with_widget(&mut self, handle: WidgetHandle, f: impl FnOnce(&mut MemoryWidget)) {
        if let Some(widget) = self.widgets.get_mut(&handle) {
            f(widget);
        }
    }
}

impl Host for MemoryHost {
    fn root(&self) -> WidgetHandle {
        Self::ROOT
    }

    fn contains(&self, handle: WidgetHandle) -> bool {
        self.widgets.contains_key(&handle)
    }

    fn create_widget(&mut self, kind: WidgetKind, options: &WidgetOptions) -> WidgetHandle {
        let handle = WidgetHandle(self.next);
        self.next += 1;

        let mut widget = MemoryWidget::from_options(kind, options);
        match self.widgets.get_mut(&options.parent) {
            Some(parent) => parent.children.push(handle),
            None => widget.parent = None,
        }
        self.widgets.insert(handle, widget);
        self.calls.push(HostCall::Create { handle, kind, parent: options.parent });
        handle
    }

    fn set_index(&mut self, handle: WidgetHandle, index: usize) {
        self.calls.push(HostCall::SetIndex { handle, index });
        let Some(parent) = self.widgets.get(&handle).and_then(|w| w.parent) else { return };
        if let Some(parent) = self.widgets.get_mut(&parent) {
            parent.children.retain(|c| *c != handle);
            let index = index.min(parent.children.len());
            parent.children.insert(index, handle);
        }
    }

    fn set_position(&mut self, handle: WidgetHandle, position: &ResolvedPosition) {
        self.calls.push(HostCall::Position(handle));
        self.with_widget(handle, |w| w.position = *position);
    }

    fn set_content(&mut self, handle: WidgetHandle, content: &str) {
        self.calls.push(HostCall::Content(handle, content.to_string()));
        self.with_widget(handle, |w| w.content = content.to_string());
    }

    fn set_label(&mut self, handle: WidgetHandle, label: Option<&str>) {
        self.calls.push(HostCall::Label(handle, label.map(str::to_string)));
        self.with_widget(handle, |w| w.label = label.map(str::to_string));
    }

    fn set_style(&mut self, handle: WidgetHandle, style: &Style) {
        self.calls.push(HostCall::Style(handle));
        self.with_widget(handle, |w| w.style = style.clone());
    }

    fn set_border(&mut self, handle: WidgetHandle, border: Option<&Border>) {
        self.calls.push(HostCall::Border(handle));
        self.with_widget(handle, |w| w.border = border.cloned());
    }

    fn set_items(&mut self, handle: WidgetHandle, items: &[String]) {
        self.calls.push(HostCall::Items(handle));
        self.with_widget(handle, |w| w.items = items.to_vec());
    }

    fn set_progress(&mut self, handle: WidgetHandle, filled: u8) {
        self.calls.push(HostCall::Progress(handle, filled));
        self.with_widget(handle, |w| w.filled = filled);
    }

    fn show(&mut self, handle: WidgetHandle) {
        self.calls.push(HostCall::Show(handle));
        self.with_widget(handle, |w| w.hidden = false);
    }

    fn hide(&mut self, handle: WidgetHandle) {
        self.calls.push(HostCall::Hide(handle));
        self.with_widget(handle, |w| w.hidden = true);
    }

    fn detach(&mut self, handle: WidgetHandle) {
        self.calls.push(HostCall::Detach(handle));
        self.unlink(handle);
    }

    fn destroy(&mut self, handle: WidgetHandle) {
        self.calls.push(HostCall::Destroy(handle));
        if handle == Self::ROOT {
            return;
        }
        self.unlink(handle);
        if let Some(widget) = self.widgets.remove(&handle) {
            for child in widget.children {
                self.with_widget(child, |w| w.parent = None);
            }
        }
    }

    fn render(&mut self, surface: WidgetHandle) {
        self.calls.push(HostCall::Render(surface));
    }

    fn on(&mut self, handle: WidgetHandle, event: &str) {
        self.calls.push(HostCall::On(handle, event.to_string()));
        self.with_widget(handle, |w| {
            w.subscriptions.insert(event.to_string());
        });
    }

    fn off(&mut self, handle: WidgetHandle, event: &str) {
        self.calls.push(HostCall::Off(handle, event.to_string()));
        self.with_widget(handle, |w| {
            w.subscriptions.remove(event);
        });
    }

    fn dimensions(&self, handle: WidgetHandle) -> Option<(i32, i32)> {
        self.widgets.get(&handle).map(MemoryWidget::measured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::Extent;

    fn options(parent: WidgetHandle) -> WidgetOptions {
        WidgetOptions {
            parent,
            position: ResolvedPosition::default(),
            content: Some("hi there".into()),
            style: Style::new(),
            border: None,
            hidden: false,
            label: None,
            items: None,
            filled: None,
            flags: WidgetFlags::NONE,
        }
    }

    #[test]
    fn test_create_and_index() {
        let mut host = MemoryHost::new(80, 24);
        let a = host.create_widget(WidgetKind::Box, &options(MemoryHost::ROOT));
        let b = host.create_widget(WidgetKind::Box, &options(MemoryHost::ROOT));
        assert_eq!(host.children(MemoryHost::ROOT), &[a, b]);

        host.set_index(b, 0);
        assert_eq!(host.children(MemoryHost::ROOT), &[b, a]);
    }

    #[test]
    fn test_detach_and_destroy() {
        let mut host = MemoryHost::new(80, 24);
        let a = host.create_widget(WidgetKind::Box, &options(MemoryHost::ROOT));
        host.detach(a);
        assert_eq!(host.orphans(), vec![a]);
        host.destroy(a);
        assert!(!host.contains(a));
        assert_eq!(host.live_widgets(), 0);
    }

    #[test]
    fn test_shrink_dimensions_measure_content() {
        let mut host = MemoryHost::new(80, 24);
        let a = host.create_widget(WidgetKind::Text, &options(MemoryHost::ROOT));
        assert_eq!(host.dimensions(a), Some((8, 1)));
        assert_eq!(host.dimensions(MemoryHost::ROOT), Some((80, 24)));

        let fixed = ResolvedPosition { width: Extent::Cells(3), ..Default::default() };
        host.set_position(a, &fixed);
        assert_eq!(host.dimensions(a), Some((3, 1)));
    }
}
