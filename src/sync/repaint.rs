//! Repaint batching.
//!
//! Widget updates mark their surface dirty instead of painting. The dirty set
//! is drained once per scheduling turn by [`RepaintScheduler::flush`], so N
//! updates in one turn cost one host repaint per surface.
//!
//! A scheduled repaint is never cancelled, except when its surface is torn
//! down first ([`RepaintScheduler::discard`]).

use std::collections::BTreeSet;

use crate::config::RepaintMode;
use crate::host::{Host, WidgetHandle};

/// Dirty-surface set drained at the flush boundary.
#[derive(Debug, Default)]
pub struct RepaintScheduler {
    mode: RepaintMode,
    dirty: BTreeSet<WidgetHandle>,
}

impl RepaintScheduler {
    pub fn new(mode: RepaintMode) -> Self {
        Self {
            mode,
            dirty: BTreeSet::new(),
        }
    }

    /// Request a repaint of `surface`.
    ///
    /// Returns true when the caller must paint right away
    /// ([`RepaintMode::Immediate`]); batched requests only mark the surface.
    pub fn request(&mut self, surface: WidgetHandle) -> bool {
        match self.mode {
            RepaintMode::Immediate => true,
            RepaintMode::Batched => {
                self.dirty.insert(surface);
                false
            }
        }
    }

    pub fn is_pending(&self, surface: WidgetHandle) -> bool {
        self.dirty.contains(&surface)
    }

    pub fn pending(&self) -> usize {
        self.dirty.len()
    }

    /// Drop the pending repaint of a surface that is going away.
    pub fn discard(&mut self, surface: WidgetHandle) {
        self.dirty.remove(&surface);
    }

    /// Paint every dirty surface once. Returns how many were painted.
    pub fn flush<H: Host>(&mut self, host: &mut H) -> usize {
        let dirty = std::mem::take(&mut self.dirty);
        let count = dirty.len();
        for surface in dirty {
            if host.contains(surface) {
                host.render(surface);
            }
        }
        if count > 0 {
            tracing::debug!(surfaces = count, "repaint flushed");
        }
        count
    }
}
