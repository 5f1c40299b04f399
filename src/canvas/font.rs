//! Font description and text alignment for canvas text drawing.
//!
//! These mirror the pieces of a CSS font shorthand that the `Text` node kind
//! accepts as separate props.

use cosmic_text::{Family, Style, Weight};

/// Font family to shape text with.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum FontFamily {
    #[default]
    SansSerif,
    Serif,
    Monospace,
    Cursive,
    Fantasy,
    /// Custom font by name
    Name(String),
}

impl FontFamily {
    /// Parse a CSS family name. Generic keywords map to their variants,
    /// anything else is looked up by name.
    pub fn parse(name: &str) -> Self {
        let trimmed = name.trim().trim_matches(|c| c == '"' || c == '\'');
        match trimmed.to_ascii_lowercase().as_str() {
            "sans-serif" | "system-ui" => FontFamily::SansSerif,
            "serif" => FontFamily::Serif,
            "monospace" => FontFamily::Monospace,
            "cursive" => FontFamily::Cursive,
            "fantasy" => FontFamily::Fantasy,
            _ => FontFamily::Name(trimmed.to_string()),
        }
    }

    pub fn to_cosmic(&self) -> Family<'_> {
        match self {
            FontFamily::SansSerif => Family::SansSerif,
            FontFamily::Serif => Family::Serif,
            FontFamily::Monospace => Family::Monospace,
            FontFamily::Cursive => Family::Cursive,
            FontFamily::Fantasy => Family::Fantasy,
            FontFamily::Name(name) => Family::Name(name),
        }
    }

    fn css_name(&self) -> &str {
        match self {
            FontFamily::SansSerif => "sans-serif",
            FontFamily::Serif => "serif",
            FontFamily::Monospace => "monospace",
            FontFamily::Cursive => "cursive",
            FontFamily::Fantasy => "fantasy",
            FontFamily::Name(name) => name,
        }
    }
}

/// Font weight on a 100-900 scale, matching CSS font-weight values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const THIN: Self = Self(100);
    pub const LIGHT: Self = Self(300);
    pub const NORMAL: Self = Self(400);
    pub const MEDIUM: Self = Self(500);
    pub const BOLD: Self = Self(700);
    pub const BLACK: Self = Self(900);

    /// Parse `normal`, `bold`, `lighter`, `bolder` or a number.
    ///
    /// Relative keywords resolve against the normal weight.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(Self::NORMAL),
            "bold" | "bolder" => Some(Self::BOLD),
            "lighter" => Some(Self(100)),
            other => other
                .parse::<u16>()
                .ok()
                .filter(|w| (1..=1000).contains(w))
                .map(Self),
        }
    }

    pub fn to_cosmic(self) -> Weight {
        Weight(self.0)
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FontStyle {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "italic" => Some(Self::Italic),
            "oblique" => Some(Self::Oblique),
            _ => None,
        }
    }

    pub fn to_cosmic(self) -> Style {
        match self {
            FontStyle::Normal => Style::Normal,
            FontStyle::Italic => Style::Italic,
            FontStyle::Oblique => Style::Oblique,
        }
    }
}

/// Carried through to the font description; small caps are not synthesised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FontVariant {
    #[default]
    Normal,
    SmallCaps,
}

impl FontVariant {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" => Some(Self::Normal),
            "small-caps" => Some(Self::SmallCaps),
            _ => None,
        }
    }
}

/// A complete font selection.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    pub family: FontFamily,
    pub size: f32,
    pub style: FontStyle,
    pub variant: FontVariant,
    pub weight: FontWeight,
}

impl Font {
    pub fn new(family: FontFamily, size: f32) -> Self {
        Self {
            family,
            size,
            ..Self::default()
        }
    }

    /// CSS font shorthand, e.g. `normal normal 400 12px sans-serif`.
    pub fn to_css(&self) -> String {
        let style = match self.style {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
            FontStyle::Oblique => "oblique",
        };
        let variant = match self.variant {
            FontVariant::Normal => "normal",
            FontVariant::SmallCaps => "small-caps",
        };
        format!(
            "{style} {variant} {} {}px {}",
            self.weight.0,
            self.size,
            self.family.css_name()
        )
    }
}

impl Default for Font {
    /// 10px sans-serif, the initial font of a 2D context.
    fn default() -> Self {
        Self {
            family: FontFamily::SansSerif,
            size: 10.0,
            style: FontStyle::Normal,
            variant: FontVariant::Normal,
            weight: FontWeight::NORMAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Start,
    End,
    Left,
    Right,
    Center,
}

impl TextAlign {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "end" => Some(Self::End),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "center" => Some(Self::Center),
            _ => None,
        }
    }

    /// Fraction of the text width to shift left by. Left-to-right only.
    pub(crate) fn offset_factor(self) -> f32 {
        match self {
            TextAlign::Start | TextAlign::Left => 0.0,
            TextAlign::Center => 0.5,
            TextAlign::End | TextAlign::Right => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextBaseline {
    Top,
    Hanging,
    Middle,
    #[default]
    Alphabetic,
    Ideographic,
    Bottom,
}

impl TextBaseline {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "top" => Some(Self::Top),
            "hanging" => Some(Self::Hanging),
            "middle" => Some(Self::Middle),
            "alphabetic" => Some(Self::Alphabetic),
            "ideographic" => Some(Self::Ideographic),
            "bottom" => Some(Self::Bottom),
            _ => None,
        }
    }
}
