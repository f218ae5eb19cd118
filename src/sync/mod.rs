//! Attribute/Event Synchronization Glue
//!
//! - [`normalize`]: coerce inbound attribute values before the bridge sees them
//! - [`repaint`]: coalesce repaint requests per surface until a flush
//! - [`events`]: translate native widget events into normalized records

pub mod events;
pub mod normalize;
pub mod repaint;

pub use events::{
    native_from_crossterm, Event, EventData, EventKind, Listener, ListenerId, Modifiers, NativeEvent,
    PointerButton,
};
pub use normalize::normalize_attribute;
pub use repaint::RepaintScheduler;
