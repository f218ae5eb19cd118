//! Screen size signals.
//!
//! The screen is the root surface every top-level widget is laid out against.
//! Its size lives in reactive signals so a document built with
//! `reactive: true` can follow resizes without being told.

use spark_signals::{signal, Signal};

use crate::layout::PositionContext;

/// Fallback when the terminal size cannot be queried.
const DEFAULT_SIZE: (u16, u16) = (80, 24);

/// Reactive screen dimensions. Clones share the same signals.
#[derive(Clone)]
pub struct Screen {
    width: Signal<u16>,
    height: Signal<u16>,
}

impl Screen {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width: signal(width),
            height: signal(height),
        }
    }

    /// Query the real terminal size through crossterm.
    pub fn detect() -> Self {
        let (width, height) = crossterm::terminal::size().unwrap_or(DEFAULT_SIZE);
        Self::new(width, height)
    }

    pub fn width(&self) -> u16 {
        self.width.get()
    }

    pub fn height(&self) -> u16 {
        self.height.get()
    }

    /// Set the screen size (called on resize events).
    pub fn set_size(&self, width: u16, height: u16) {
        self.width.set(width);
        self.height.set(height);
    }

    /// Width signal for reactive tracking.
    pub fn width_signal(&self) -> Signal<u16> {
        self.width.clone()
    }

    /// Height signal for reactive tracking.
    pub fn height_signal(&self) -> Signal<u16> {
        self.height.clone()
    }

    /// Layout context top-level widgets resolve against.
    pub fn context(&self) -> PositionContext {
        PositionContext::new(self.width() as i32, self.height() as i32)
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE.0, DEFAULT_SIZE.1)
    }
}

impl std::fmt::Debug for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_screen_size() {
        let screen = Screen::new(120, 40);
        assert_eq!(screen.width(), 120);
        assert_eq!(screen.height(), 40);
        assert_eq!(screen.context(), PositionContext::new(120, 40));
    }

    #[test]
    fn test_clones_share_signals() {
        let screen = Screen::new(80, 24);
        let other = screen.clone();
        other.set_size(100, 30);
        assert_eq!(screen.width(), 100);
        assert_eq!(screen.width_signal().get(), 100);
    }
}
