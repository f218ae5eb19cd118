//! Event forwarding.
//!
//! Native widget events are translated through a small fixed table into
//! normalized [`Event`] records, so callers never see host-specific payload
//! shapes.
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::sync::{EventKind, NativeEvent};
//! use serde_json::json;
//!
//! doc.add_event_listener(button, EventKind::Click, Rc::new(|event| {
//!     println!("clicked at {:?}", event.data);
//! }));
//!
//! // Host side: a click arrived for the button's widget.
//! doc.dispatch_native(handle, NativeEvent::new("click", json!({"x": 3, "y": 1})));
//! ```

use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;
use std::time::Instant;

use crossterm::event::{
    Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton as TermButton,
    MouseEventKind,
};
use serde_json::{json, Value};

use crate::bridge::WrapperId;
use crate::dom::NodeId;

// =============================================================================
// TYPES
// =============================================================================

/// Normalized event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    PointerDown,
    PointerUp,
    PointerMove,
    HoverEnter,
    HoverLeave,
    Click,
    Scroll,
    KeyDown,
    Focus,
    Blur,
    Resize,
    ListSelect,
    FormSubmit,
}

/// Native event name → normalized type.
pub const TRANSLATION_TABLE: &[(&str, EventKind)] = &[
    ("mousedown", EventKind::PointerDown),
    ("mouseup", EventKind::PointerUp),
    ("mousemove", EventKind::PointerMove),
    ("mouseover", EventKind::HoverEnter),
    ("mouseout", EventKind::HoverLeave),
    ("click", EventKind::Click),
    ("wheelup", EventKind::Scroll),
    ("wheeldown", EventKind::Scroll),
    ("keypress", EventKind::KeyDown),
    ("focus", EventKind::Focus),
    ("blur", EventKind::Blur),
    ("resize", EventKind::Resize),
    ("select", EventKind::ListSelect),
    ("submit", EventKind::FormSubmit),
];

impl EventKind {
    /// Look up the normalized type of a native event.
    pub fn from_native(name: &str) -> Option<Self> {
        TRANSLATION_TABLE
            .iter()
            .find(|(native, _)| *native == name)
            .map(|(_, kind)| *kind)
    }

    /// Native names that translate to this type.
    pub fn native_names(self) -> impl Iterator<Item = &'static str> {
        TRANSLATION_TABLE
            .iter()
            .filter(move |(_, kind)| *kind == self)
            .map(|(native, _)| *native)
    }

    pub fn is_pointer(self) -> bool {
        matches!(
            self,
            Self::PointerDown
                | Self::PointerUp
                | Self::PointerMove
                | Self::HoverEnter
                | Self::HoverLeave
                | Self::Click
                | Self::Scroll
        )
    }
}

/// An event as the host emits it.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeEvent {
    pub name: String,
    pub payload: Value,
}

impl NativeEvent {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }
}

/// Pointer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
    #[default]
    None,
}

impl PointerButton {
    fn parse(s: &str) -> Self {
        match s {
            "left" => Self::Left,
            "middle" => Self::Middle,
            "right" => Self::Right,
            _ => Self::None,
        }
    }
}

/// Keyboard modifier state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

/// Normalized payload.
#[derive(Debug, Clone, PartialEq)]
pub enum EventData {
    None,
    Pointer { x: i32, y: i32, button: PointerButton },
    /// Negative delta scrolls up.
    Scroll { x: i32, y: i32, delta: i32 },
    Key { key: String, ch: Option<char>, modifiers: Modifiers },
    Resize { width: i32, height: i32 },
    Select { index: usize, item: Option<String> },
    Submit { value: Option<String> },
}

/// A normalized event record.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub kind: EventKind,
    pub timestamp: Instant,
    pub data: EventData,
    pub target: WrapperId,
    pub node: NodeId,
}

// =============================================================================
// TRANSLATION
// =============================================================================

/// Translate a native event into a normalized type and payload.
///
/// `dimensions` backs resize events whose payload carries no size.
pub fn normalize(native: &NativeEvent, dimensions: Option<(i32, i32)>) -> Option<(EventKind, EventData)> {
    let kind = EventKind::from_native(&native.name)?;
    let p = &native.payload;
    let int = |key: &str| p.get(key).and_then(Value::as_i64).unwrap_or(0) as i32;

    let data = match kind {
        EventKind::PointerDown
        | EventKind::PointerUp
        | EventKind::PointerMove
        | EventKind::HoverEnter
        | EventKind::HoverLeave
        | EventKind::Click => EventData::Pointer {
            x: int("x"),
            y: int("y"),
            button: p
                .get("button")
                .and_then(Value::as_str)
                .map(PointerButton::parse)
                .unwrap_or_default(),
        },
        EventKind::Scroll => EventData::Scroll {
            x: int("x"),
            y: int("y"),
            delta: if native.name == "wheelup" { -1 } else { 1 },
        },
        EventKind::KeyDown => {
            let key = p.get("key");
            let flag = |name: &str| key.and_then(|k| k.get(name)).and_then(Value::as_bool).unwrap_or(false);
            let ch = p.get("ch").and_then(Value::as_str).and_then(|s| s.chars().next());
            let name = key
                .and_then(|k| k.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| ch.map(String::from))
                .unwrap_or_default();
            EventData::Key {
                key: name,
                ch,
                modifiers: Modifiers {
                    ctrl: flag("ctrl"),
                    alt: flag("alt"),
                    shift: flag("shift"),
                    meta: flag("meta"),
                },
            }
        }
        EventKind::Focus | EventKind::Blur => EventData::None,
        EventKind::Resize => {
            let (w, h) = dimensions.unwrap_or((0, 0));
            EventData::Resize {
                width: p.get("width").and_then(Value::as_i64).map_or(w, |v| v as i32),
                height: p.get("height").and_then(Value::as_i64).map_or(h, |v| v as i32),
            }
        }
        EventKind::ListSelect => EventData::Select {
            index: p.get("index").and_then(Value::as_u64).unwrap_or(0) as usize,
            item: p.get("item").and_then(Value::as_str).map(str::to_string),
        },
        EventKind::FormSubmit => EventData::Submit {
            value: p.get("value").and_then(Value::as_str).map(str::to_string),
        },
    };
    Some((kind, data))
}

/// Translate a raw terminal event into the native event a host would emit.
pub fn native_from_crossterm(event: &TermEvent) -> Option<NativeEvent> {
    match event {
        TermEvent::Key(key) => key_to_native(key),
        TermEvent::Mouse(mouse) => {
            let (x, y) = (mouse.column, mouse.row);
            let (name, button) = match mouse.kind {
                MouseEventKind::Down(b) => ("mousedown", button_name(b)),
                MouseEventKind::Up(b) => ("mouseup", button_name(b)),
                MouseEventKind::Drag(b) => ("mousemove", button_name(b)),
                MouseEventKind::Moved => ("mousemove", "none"),
                MouseEventKind::ScrollUp => ("wheelup", "none"),
                MouseEventKind::ScrollDown => ("wheeldown", "none"),
                _ => return None,
            };
            Some(NativeEvent::new(name, json!({ "x": x, "y": y, "button": button })))
        }
        TermEvent::Resize(width, height) => {
            Some(NativeEvent::new("resize", json!({ "width": width, "height": height })))
        }
        TermEvent::FocusGained => Some(NativeEvent::new("focus", Value::Null)),
        TermEvent::FocusLost => Some(NativeEvent::new("blur", Value::Null)),
        _ => None,
    }
}

fn key_to_native(key: &KeyEvent) -> Option<NativeEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    let (name, ch) = match key.code {
        KeyCode::Char(c) => (c.to_string(), Some(c)),
        KeyCode::Enter => ("enter".to_string(), None),
        KeyCode::Esc => ("escape".to_string(), None),
        KeyCode::Backspace => ("backspace".to_string(), None),
        KeyCode::Tab => ("tab".to_string(), None),
        KeyCode::BackTab => ("backtab".to_string(), None),
        KeyCode::Delete => ("delete".to_string(), None),
        KeyCode::Insert => ("insert".to_string(), None),
        KeyCode::Up => ("up".to_string(), None),
        KeyCode::Down => ("down".to_string(), None),
        KeyCode::Left => ("left".to_string(), None),
        KeyCode::Right => ("right".to_string(), None),
        KeyCode::Home => ("home".to_string(), None),
        KeyCode::End => ("end".to_string(), None),
        KeyCode::PageUp => ("pageup".to_string(), None),
        KeyCode::PageDown => ("pagedown".to_string(), None),
        KeyCode::F(n) => (format!("f{n}"), None),
        _ => return None,
    };
    let m = key.modifiers;
    Some(NativeEvent::new(
        "keypress",
        json!({
            "ch": ch.map(String::from),
            "key": {
                "name": name,
                "ctrl": m.contains(KeyModifiers::CONTROL),
                "alt": m.contains(KeyModifiers::ALT),
                "shift": m.contains(KeyModifiers::SHIFT),
                "meta": m.contains(KeyModifiers::META),
            }
        }),
    ))
}

fn button_name(button: TermButton) -> &'static str {
    match button {
        TermButton::Left => "left",
        TermButton::Middle => "middle",
        TermButton::Right => "right",
    }
}

// =============================================================================
// LISTENERS
// =============================================================================

/// Event listener callback (Rc so a callback can be shared across nodes).
pub type Listener = Rc<dyn Fn(&Event)>;

/// Identifies a registered listener for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Entry {
    id: ListenerId,
    kind: EventKind,
    callback: Listener,
}

/// Listeners keyed by node, so they outlive wrapper re-creation.
#[derive(Default)]
pub struct ListenerRegistry {
    next: u64,
    by_node: HashMap<NodeId, Vec<Entry>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. The flag is true when it is the node's first for `kind`.
    pub fn add(&mut self, node: NodeId, kind: EventKind, callback: Listener) -> (ListenerId, bool) {
        let id = ListenerId(self.next);
        self.next += 1;
        let entries = self.by_node.entry(node).or_default();
        let first = !entries.iter().any(|e| e.kind == kind);
        entries.push(Entry { id, kind, callback });
        (id, first)
    }

    /// Unregister a listener. The flag is true when it was the node's last for its kind.
    pub fn remove(&mut self, id: ListenerId) -> Option<(NodeId, EventKind, bool)> {
        let (node, entries) = self
            .by_node
            .iter_mut()
            .find(|(_, entries)| entries.iter().any(|e| e.id == id))?;
        let node = *node;
        let pos = entries.iter().position(|e| e.id == id)?;
        let kind = entries.remove(pos).kind;
        let last = !entries.iter().any(|e| e.kind == kind);
        if entries.is_empty() {
            self.by_node.remove(&node);
        }
        Some((node, kind, last))
    }

    /// Event types with at least one listener on `node`.
    pub fn kinds(&self, node: NodeId) -> BTreeSet<EventKind> {
        self.by_node
            .get(&node)
            .map(|entries| entries.iter().map(|e| e.kind).collect())
            .unwrap_or_default()
    }

    /// Snapshot of the callbacks for `node` and `kind`, in registration order.
    pub fn listeners(&self, node: NodeId, kind: EventKind) -> Vec<Listener> {
        self.by_node
            .get(&node)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.kind == kind)
                    .map(|e| e.callback.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Forget every listener of `node`.
    pub fn clear(&mut self, node: NodeId) {
        self.by_node.remove(&node);
    }
}
