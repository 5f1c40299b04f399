//! Node kind identifiers.

use std::borrow::Cow;
use std::fmt;

/// The kind of a rendered node.
///
/// Built-in kinds are a closed set of variants; applications add their own
/// kinds through [`NodeKind::Custom`], which is matched by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Rectangle,
    Line,
    Text,
    Translate,
    Scale,
    Rotate,
    Opacity,
    Image,
    BufferedSurface,
    Custom(Cow<'static, str>),
}

impl NodeKind {
    pub(crate) const BUILTIN_COUNT: usize = 9;

    /// All built-in kinds, in registry slot order.
    pub const BUILTIN: [NodeKind; Self::BUILTIN_COUNT] = [
        NodeKind::Rectangle,
        NodeKind::Line,
        NodeKind::Text,
        NodeKind::Translate,
        NodeKind::Scale,
        NodeKind::Rotate,
        NodeKind::Opacity,
        NodeKind::Image,
        NodeKind::BufferedSurface,
    ];

    pub fn custom(name: impl Into<Cow<'static, str>>) -> Self {
        let name = name.into();
        match Self::builtin_from_name(&name) {
            Some(kind) => kind,
            None => NodeKind::Custom(name),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            NodeKind::Rectangle => "Rectangle",
            NodeKind::Line => "Line",
            NodeKind::Text => "Text",
            NodeKind::Translate => "Translate",
            NodeKind::Scale => "Scale",
            NodeKind::Rotate => "Rotate",
            NodeKind::Opacity => "Opacity",
            NodeKind::Image => "Image",
            NodeKind::BufferedSurface => "BufferedSurface",
            NodeKind::Custom(name) => name,
        }
    }

    /// Index into the built-in slot table, `None` for custom kinds.
    pub(crate) fn builtin_slot(&self) -> Option<usize> {
        Some(match self {
            NodeKind::Rectangle => 0,
            NodeKind::Line => 1,
            NodeKind::Text => 2,
            NodeKind::Translate => 3,
            NodeKind::Scale => 4,
            NodeKind::Rotate => 5,
            NodeKind::Opacity => 6,
            NodeKind::Image => 7,
            NodeKind::BufferedSurface => 8,
            NodeKind::Custom(_) => return None,
        })
    }

    fn builtin_from_name(name: &str) -> Option<Self> {
        Self::BUILTIN.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl From<&'static str> for NodeKind {
    fn from(name: &'static str) -> Self {
        NodeKind::custom(name)
    }
}

impl From<String> for NodeKind {
    fn from(name: String) -> Self {
        NodeKind::custom(name)
    }
}
