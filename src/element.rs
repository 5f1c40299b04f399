//! Declarative tree descriptions.
//!
//! An [`Element`] describes what the committed graph should look like. It is
//! cheap to build and is thrown away after each commit; the reconciler
//! compares it against the previous description to decide which nodes to
//! create, update, move or remove.
//!
//! ```ignore
//! let scene = fragment([
//!     rectangle().prop("x", 0).prop("y", 0).prop("width", 50).prop("height", 50).prop("fill", "red"),
//!     text("Hello").prop("x", 10).prop("y", 10).prop("fill", "black"),
//! ]);
//! ```

use std::fmt;
use std::rc::Rc;

use crate::canvas::ImageData;
use crate::error::DescriptionError;
use crate::kind::NodeKind;
use crate::props::{PropName, PropValue, Props};

/// Identity of a child among its siblings, stable across reorders.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Index(u64),
    Name(Rc<str>),
}

impl From<u64> for Key {
    fn from(value: u64) -> Self {
        Key::Index(value)
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Key::Index(value as u64)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Index(value as u64)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Name(value.into())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Name(value.into())
    }
}

/// A typed node description: kind, props and nested children.
#[derive(Clone, Debug)]
pub struct NodeElement {
    pub kind: NodeKind,
    pub key: Option<Key>,
    pub props: Props,
    pub children: Vec<Element>,
}

impl NodeElement {
    pub fn new(kind: impl Into<NodeKind>) -> Self {
        Self {
            kind: kind.into(),
            key: None,
            props: Props::new(),
            children: Vec::new(),
        }
    }

    pub fn prop(mut self, name: impl Into<PropName>, value: impl Into<PropValue>) -> Self {
        self.props.set(name, value);
        self
    }

    pub fn props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Shorthand for `prop("restore", true)`.
    pub fn restore(self) -> Self {
        self.prop("restore", true)
    }

    pub fn child(mut self, child: impl Into<Element>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Element>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// The literal text this node's children reduce to, if they are exactly
    /// one string or number after flattening a single fragment level.
    pub fn text_content(&self) -> Option<&str> {
        let mut flat = self.children.iter().flat_map(|child| match child {
            Element::Fragment(fragment) if fragment.key.is_none() => {
                fragment.children.iter().collect::<Vec<_>>()
            }
            other => vec![other],
        });

        match (flat.next(), flat.next()) {
            (Some(Element::Text(text)), None) => Some(text.as_str()),
            _ => None,
        }
    }
}

/// A list of siblings without a node of its own.
#[derive(Clone, Debug, Default)]
pub struct Fragment {
    pub key: Option<Key>,
    pub children: Vec<Element>,
}

pub type RenderFn = Rc<dyn Fn(&Props) -> Result<Element, DescriptionError>>;

/// A function of props evaluated during commit.
///
/// Components with the same name are the same component type: an update
/// re-evaluates the existing instance instead of remounting it.
#[derive(Clone)]
pub struct Component {
    name: Rc<str>,
    key: Option<Key>,
    props: Props,
    render: RenderFn,
}

impl Component {
    pub fn new<F>(name: &str, render: F) -> Self
    where
        F: Fn(&Props) -> Result<Element, DescriptionError> + 'static,
    {
        Self {
            name: name.into(),
            key: None,
            props: Props::new(),
            render: Rc::new(render),
        }
    }

    pub fn prop(mut self, name: impl Into<PropName>, value: impl Into<PropValue>) -> Self {
        self.props.set(name, value);
        self
    }

    pub fn props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn get_props(&self) -> &Props {
        &self.props
    }

    pub(crate) fn evaluate(&self) -> Result<Element, DescriptionError> {
        (self.render)(&self.props)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("props", &self.props)
            .finish_non_exhaustive()
    }
}

/// A tree description node.
#[derive(Clone, Debug, Default)]
pub enum Element {
    /// Renders nothing but holds its position among siblings.
    #[default]
    Empty,
    /// A string or number.
    Text(String),
    Node(NodeElement),
    Fragment(Fragment),
    Component(Component),
}

impl Element {
    pub fn key(&self) -> Option<&Key> {
        match self {
            Element::Node(node) => node.key.as_ref(),
            Element::Fragment(fragment) => fragment.key.as_ref(),
            Element::Component(component) => component.key.as_ref(),
            Element::Empty | Element::Text(_) => None,
        }
    }
}

impl From<NodeElement> for Element {
    fn from(node: NodeElement) -> Self {
        Element::Node(node)
    }
}

impl From<Component> for Element {
    fn from(component: Component) -> Self {
        Element::Component(component)
    }
}

impl From<Fragment> for Element {
    fn from(fragment: Fragment) -> Self {
        Element::Fragment(fragment)
    }
}

impl From<&str> for Element {
    fn from(text: &str) -> Self {
        Element::Text(text.to_string())
    }
}

impl From<String> for Element {
    fn from(text: String) -> Self {
        Element::Text(text)
    }
}

macro_rules! element_from_number {
    ($($t:ty),*) => {
        $(impl From<$t> for Element {
            fn from(value: $t) -> Self {
                Element::Text(value.to_string())
            }
        })*
    };
}

element_from_number!(i32, i64, u32, u64, usize, f32, f64);

impl<T: Into<Element>> From<Vec<T>> for Element {
    fn from(children: Vec<T>) -> Self {
        fragment(children)
    }
}

impl<T: Into<Element>> From<Option<T>> for Element {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Element::Empty)
    }
}

// -- Builders --

pub fn node(kind: impl Into<NodeKind>) -> NodeElement {
    NodeElement::new(kind)
}

pub fn rectangle() -> NodeElement {
    NodeElement::new(NodeKind::Rectangle)
}

pub fn line() -> NodeElement {
    NodeElement::new(NodeKind::Line)
}

/// A text node whose only child is `content`.
pub fn text(content: impl Into<Element>) -> NodeElement {
    NodeElement::new(NodeKind::Text).child(content)
}

pub fn translate(x: f64, y: f64) -> NodeElement {
    NodeElement::new(NodeKind::Translate)
        .prop("x", x)
        .prop("y", y)
}

pub fn scale(x: f64, y: f64) -> NodeElement {
    NodeElement::new(NodeKind::Scale).prop("x", x).prop("y", y)
}

pub fn rotate(radians: f64) -> NodeElement {
    NodeElement::new(NodeKind::Rotate).prop("radians", radians)
}

pub fn opacity(opacity: f64) -> NodeElement {
    NodeElement::new(NodeKind::Opacity).prop("opacity", opacity)
}

pub fn image(src: ImageData) -> NodeElement {
    NodeElement::new(NodeKind::Image).prop("src", src)
}

/// An off-screen surface of `width` x `height` logical units.
pub fn buffered_surface(width: f64, height: f64) -> NodeElement {
    NodeElement::new(NodeKind::BufferedSurface)
        .prop("width", width)
        .prop("height", height)
}

pub fn fragment<I>(children: I) -> Element
where
    I: IntoIterator,
    I::Item: Into<Element>,
{
    Element::Fragment(Fragment {
        key: None,
        children: children.into_iter().map(Into::into).collect(),
    })
}

pub fn component<F>(name: &str, render: F) -> Component
where
    F: Fn(&Props) -> Result<Element, DescriptionError> + 'static,
{
    Component::new(name, render)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_content_single_primitive() {
        assert_eq!(text("5").text_content(), Some("5"));
        assert_eq!(text(5).text_content(), Some("5"));
        assert_eq!(text(1.5).text_content(), Some("1.5"));
    }

    #[test]
    fn test_text_content_flattens_one_fragment_level() {
        let wrapped = node(NodeKind::Text).child(fragment(["hi"]));
        assert_eq!(wrapped.text_content(), Some("hi"));

        let nested = node(NodeKind::Text).child(fragment([fragment(["hi"])]));
        assert_eq!(nested.text_content(), None);
    }

    #[test]
    fn test_text_content_rejects_mixed_children() {
        let mixed = node(NodeKind::Text).child("Count: ").child(5);
        assert_eq!(mixed.text_content(), None);

        let with_node = node(NodeKind::Text).child(rectangle());
        assert_eq!(with_node.text_content(), None);
    }

    #[test]
    fn test_option_into_element() {
        let none: Option<&str> = None;
        assert!(matches!(Element::from(none), Element::Empty));
        assert!(matches!(Element::from(Some("x")), Element::Text(_)));
    }
}
