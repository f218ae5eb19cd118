//! Host widget library boundary.
//!
//! The host is a sink: it accepts widget-creation options, exposes imperative
//! mutators, paints on `render`, and emits native events for the widgets it
//! was asked to subscribe. Painting itself is the host's business.
//!
//! [`MemoryHost`] is a headless implementation that records every call.

mod memory;

pub use memory::{HostCall, MemoryHost, MemoryWidget};

use std::fmt;

use crate::bridge::WidgetKind;
use crate::layout::ResolvedPosition;
use crate::types::{Border, Style, WidgetFlags};

/// Opaque handle to a backing widget (or to the screen surface).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WidgetHandle(pub u64);

impl fmt::Display for WidgetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

/// Everything a backing widget is constructed with.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetOptions {
    pub parent: WidgetHandle,
    pub position: ResolvedPosition,
    pub content: Option<String>,
    pub style: Style,
    pub border: Option<Border>,
    pub label: Option<String>,
    pub hidden: bool,
    pub items: Option<Vec<String>>,
    pub filled: Option<u8>,
    pub flags: WidgetFlags,
}

impl WidgetOptions {
    pub fn scrollable(&self) -> bool {
        self.flags.contains(WidgetFlags::SCROLLABLE)
    }

    pub fn mouse(&self) -> bool {
        self.flags.contains(WidgetFlags::MOUSE)
    }

    pub fn keys(&self) -> bool {
        self.flags.contains(WidgetFlags::KEYS)
    }

    pub fn focusable(&self) -> bool {
        self.flags.contains(WidgetFlags::FOCUSABLE)
    }
}

/// The terminal-widget library the bridge drives.
pub trait Host {
    /// Handle of the screen surface; top-level widgets attach here.
    fn root(&self) -> WidgetHandle;

    /// Whether `handle` names a live widget (or the screen).
    fn contains(&self, handle: WidgetHandle) -> bool;

    /// Construct a widget, appended as the last child of `options.parent`.
    fn create_widget(&mut self, kind: WidgetKind, options: &WidgetOptions) -> WidgetHandle;

    /// Move a widget to `index` among its parent's children.
    fn set_index(&mut self, handle: WidgetHandle, index: usize);

    fn set_position(&mut self, handle: WidgetHandle, position: &ResolvedPosition);
    fn set_content(&mut self, handle: WidgetHandle, content: &str);
    fn set_label(&mut self, handle: WidgetHandle, label: Option<&str>);
    fn set_style(&mut self, handle: WidgetHandle, style: &Style);
    fn set_border(&mut self, handle: WidgetHandle, border: Option<&Border>);
    fn set_items(&mut self, handle: WidgetHandle, items: &[String]);
    fn set_progress(&mut self, handle: WidgetHandle, filled: u8);
    fn show(&mut self, handle: WidgetHandle);
    fn hide(&mut self, handle: WidgetHandle);

    /// Detach a widget from its host parent.
    fn detach(&mut self, handle: WidgetHandle);

    /// Release a detached widget.
    fn destroy(&mut self, handle: WidgetHandle);

    /// Paint the surface.
    fn render(&mut self, surface: WidgetHandle);

    /// Start emitting the native event `event` for `handle`.
    fn on(&mut self, handle: WidgetHandle, event: &str);

    /// Stop emitting the native event `event` for `handle`.
    fn off(&mut self, handle: WidgetHandle, event: &str);

    /// Dimensions the host actually laid the widget out at, if known.
    ///
    /// Used when a widget's own size was deferred to host autosizing.
    fn dimensions(&self, _handle: WidgetHandle) -> Option<(i32, i32)> {
        None
    }
}
