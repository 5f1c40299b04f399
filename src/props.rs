//! Property bags attached to nodes.
//!
//! A [`Props`] is an ordered list of `(name, value)` pairs. Order is kept as
//! declared, but equality and lookups are by name, so two bags with the same
//! entries in a different order compare equal.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::rc::Rc;

use crate::canvas::ImageData;
use crate::color::Color;
use crate::error::ColorParseError;
use crate::renderers::RendererRegistry;

pub type PropName = Cow<'static, str>;

/// A single property value.
///
/// Scalars compare by value. Images, registries and opaque values compare by
/// identity (the same shared allocation), never by content.
#[derive(Clone)]
pub enum PropValue {
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
    Color(Color),
    Image(ImageData),
    Renderers(RendererRegistry),
    Opaque(Rc<dyn Any>),
}

impl PropValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropValue::Str(s) => Some(s),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            PropValue::Bool(_) => "bool",
            PropValue::Number(_) => "number",
            PropValue::Str(_) => "string",
            PropValue::Color(_) => "color",
            PropValue::Image(_) => "image",
            PropValue::Renderers(_) => "renderers",
            PropValue::Opaque(_) => "opaque",
        }
    }
}

impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropValue::Bool(a), PropValue::Bool(b)) => a == b,
            (PropValue::Number(a), PropValue::Number(b)) => a == b,
            (PropValue::Str(a), PropValue::Str(b)) => a == b,
            (PropValue::Color(a), PropValue::Color(b)) => a == b,
            (PropValue::Image(a), PropValue::Image(b)) => a.ptr_eq(b),
            (PropValue::Renderers(a), PropValue::Renderers(b)) => a.ptr_eq(b),
            (PropValue::Opaque(a), PropValue::Opaque(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Bool(b) => write!(f, "{b}"),
            PropValue::Number(n) => write!(f, "{n}"),
            PropValue::Str(s) => write!(f, "{s:?}"),
            PropValue::Color(c) => write!(f, "{c:?}"),
            PropValue::Image(img) => write!(f, "Image({}x{})", img.width(), img.height()),
            other => write!(f, "<{}>", other.type_name()),
        }
    }
}

macro_rules! number_from {
    ($($t:ty),*) => {
        $(impl From<$t> for PropValue {
            fn from(value: $t) -> Self {
                PropValue::Number(value as f64)
            }
        })*
    };
}

number_from!(f64, f32, i32, i64, u32, u8, usize);

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Str(value.into())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Str(value.into())
    }
}

impl From<Color> for PropValue {
    fn from(value: Color) -> Self {
        PropValue::Color(value)
    }
}

impl From<ImageData> for PropValue {
    fn from(value: ImageData) -> Self {
        PropValue::Image(value)
    }
}

impl From<RendererRegistry> for PropValue {
    fn from(value: RendererRegistry) -> Self {
        PropValue::Renderers(value)
    }
}

/// Ordered mapping from property name to value.
#[derive(Clone, Default)]
pub struct Props {
    entries: Vec<(PropName, PropValue)>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<PropName>, value: impl Into<PropValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Insert or replace a value. A replaced value keeps its position.
    pub fn set(&mut self, name: impl Into<PropName>, value: impl Into<PropValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<PropValue> {
        let pos = self.entries.iter().position(|(n, _)| n == name)?;
        Some(self.entries.remove(pos).1)
    }

    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.entries.iter().map(|(n, v)| (n.as_ref(), v))
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(PropValue::as_number)
    }

    pub fn number_or(&self, name: &str, default: f64) -> f64 {
        self.number(name).unwrap_or(default)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(PropValue::as_bool)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropValue::as_str)
    }

    /// Read a colour prop, parsing string values.
    ///
    /// Returns `Ok(None)` when the prop is absent and an error when it holds
    /// something other than a colour or a string.
    pub fn color(&self, name: &str) -> Result<Option<Color>, ColorParseError> {
        match self.get(name) {
            None => Ok(None),
            Some(PropValue::Color(c)) => Ok(Some(*c)),
            Some(PropValue::Str(s)) => Color::parse(s).map(Some),
            Some(other) => Err(ColorParseError::WrongType(other.type_name())),
        }
    }

    pub fn image(&self, name: &str) -> Option<&ImageData> {
        match self.get(name) {
            Some(PropValue::Image(img)) => Some(img),
            _ => None,
        }
    }

    pub fn renderers(&self, name: &str) -> Option<&RendererRegistry> {
        match self.get(name) {
            Some(PropValue::Renderers(r)) => Some(r),
            _ => None,
        }
    }

    pub fn opaque<T: 'static>(&self, name: &str) -> Option<&T> {
        match self.get(name) {
            Some(PropValue::Opaque(v)) => v.downcast_ref(),
            _ => None,
        }
    }

    /// The `restore` flag that asks the walker to save and restore drawing
    /// state around this node. Defaults to false.
    pub fn restore(&self) -> bool {
        self.bool("restore").unwrap_or(false)
    }
}

impl PartialEq for Props {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .entries
                .iter()
                .all(|(name, value)| other.get(name) == Some(value))
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> FromIterator<(K, V)> for Props
where
    K: Into<PropName>,
    V: Into<PropValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Props::new();
        for (k, v) in iter {
            props.set(k, v);
        }
        props
    }
}

/// Build a [`Props`] from `name => value` pairs.
///
/// ```ignore
/// let p = props! { "x" => 10, "fill" => "red" };
/// ```
#[macro_export]
macro_rules! props {
    () => { $crate::props::Props::new() };
    ($($name:expr => $value:expr),+ $(,)?) => {
        $crate::props::Props::new()$(.with($name, $value))+
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_in_place() {
        let mut p = Props::new().with("x", 1).with("y", 2);
        p.set("x", 5);
        let names: Vec<_> = p.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(names, ["x", "y"]);
        assert_eq!(p.number("x"), Some(5.0));
    }

    #[test]
    fn test_equality_ignores_order() {
        let a = Props::new().with("x", 1).with("y", 2);
        let b = Props::new().with("y", 2).with("x", 1);
        assert_eq!(a, b);
        assert_ne!(a, Props::new().with("x", 1));
    }

    #[test]
    fn test_opaque_values_compare_by_identity() {
        let shared: Rc<dyn Any> = Rc::new(7u32);
        let a = Props::new().with("data", PropValue::Opaque(shared.clone()));
        let b = Props::new().with("data", PropValue::Opaque(shared));
        let c = Props::new().with("data", PropValue::Opaque(Rc::new(7u32)));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.opaque::<u32>("data"), Some(&7));
    }

    #[test]
    fn test_color_accessor_parses_strings() {
        let p = Props::new().with("fill", "blue").with("stroke", "nope");
        assert_eq!(p.color("fill").unwrap(), Some(Color::from_hex(0x0000ff)));
        assert!(p.color("stroke").is_err());
        assert_eq!(p.color("missing").unwrap(), None);
    }

    #[test]
    fn test_color_accessor_rejects_other_types() {
        let p = Props::new().with("fill", 5).with("stroke", true);
        assert_eq!(p.color("fill"), Err(ColorParseError::WrongType("number")));
        assert_eq!(p.color("stroke"), Err(ColorParseError::WrongType("bool")));
    }

    #[test]
    fn test_restore_defaults_false() {
        assert!(!Props::new().restore());
        assert!(props! { "restore" => true }.restore());
    }
}
