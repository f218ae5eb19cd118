//! Widget kinds - the closed set of wrapper types, keyed by tag.

use crate::types::WidgetFlags;

/// One wrapper type per supported tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WidgetKind {
    /// Generic container.
    Box,
    /// Inline text.
    Text,
    /// Selectable list of items.
    List,
    /// Single-line text input.
    Input,
    Button,
    /// Progress indicator.
    Progress,
}

/// Result of looking up a tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMatch {
    Known(WidgetKind),
    /// Unrecognized tag, degraded to a generic kind.
    Fallback(WidgetKind),
}

impl TagMatch {
    pub fn kind(self) -> WidgetKind {
        match self {
            Self::Known(kind) | Self::Fallback(kind) => kind,
        }
    }
}

/// Unknown tags that read as inline text degrade to `Text` instead of `Box`.
const INLINE_HINTS: &[&str] = &[
    "span", "label", "p", "b", "i", "u", "em", "strong", "small", "code", "a", "string",
];

impl WidgetKind {
    /// Look up the wrapper type for a tag name (case-insensitive).
    pub fn from_tag(tag: &str) -> TagMatch {
        let tag = tag.to_ascii_lowercase();
        match tag.as_str() {
            "box" | "element" | "layout" => TagMatch::Known(Self::Box),
            "text" => TagMatch::Known(Self::Text),
            "list" => TagMatch::Known(Self::List),
            "input" | "textbox" => TagMatch::Known(Self::Input),
            "button" => TagMatch::Known(Self::Button),
            "progress" | "progressbar" => TagMatch::Known(Self::Progress),
            other if INLINE_HINTS.contains(&other) => TagMatch::Fallback(Self::Text),
            _ => TagMatch::Fallback(Self::Box),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Text => "text",
            Self::List => "list",
            Self::Input => "input",
            Self::Button => "button",
            Self::Progress => "progress",
        }
    }

    /// Flags the kind gets before attributes override them.
    pub fn default_flags(&self) -> WidgetFlags {
        match self {
            Self::Box | Self::Text | Self::Progress => WidgetFlags::NONE,
            Self::List => WidgetFlags::MOUSE | WidgetFlags::KEYS | WidgetFlags::FOCUSABLE | WidgetFlags::SCROLLABLE,
            Self::Input | Self::Button => WidgetFlags::MOUSE | WidgetFlags::KEYS | WidgetFlags::FOCUSABLE,
        }
    }

    /// Whether the kind displays a text content string.
    pub fn has_text_content(&self) -> bool {
        !matches!(self, Self::List)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tags() {
        assert_eq!(WidgetKind::from_tag("box"), TagMatch::Known(WidgetKind::Box));
        assert_eq!(WidgetKind::from_tag("Text"), TagMatch::Known(WidgetKind::Text));
        assert_eq!(WidgetKind::from_tag("textbox"), TagMatch::Known(WidgetKind::Input));
        assert_eq!(WidgetKind::from_tag("progressbar"), TagMatch::Known(WidgetKind::Progress));
    }

    #[test]
    fn test_fallback_tags() {
        assert_eq!(WidgetKind::from_tag("span"), TagMatch::Fallback(WidgetKind::Text));
        assert_eq!(WidgetKind::from_tag("div"), TagMatch::Fallback(WidgetKind::Box));
        assert_eq!(WidgetKind::from_tag("my-widget").kind(), WidgetKind::Box);
    }

    #[test]
    fn test_default_flags() {
        assert!(WidgetKind::Button.default_flags().contains(WidgetFlags::FOCUSABLE));
        assert!(WidgetKind::Box.default_flags().is_empty());
    }
}
