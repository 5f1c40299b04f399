//! Per-kind draw procedures and the registry that maps kinds to them.
//!
//! A [`Renderer`] is up to two procedures, run before and after a node's
//! children, plus a flag saying whether the renderer draws the children
//! itself. [`RendererRegistry`] is an immutable, cheaply cloned table of
//! renderers; adding or overriding entries returns a new registry and leaves
//! the receiver untouched.

mod buffered;
mod shapes;
mod transforms;

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::canvas::Canvas;
use crate::color::Color;
use crate::error::DrawError;
use crate::graph::{NodeGraph, NodeId, RenderedNode};
use crate::kind::NodeKind;

/// A draw procedure.
pub type DrawFn = Rc<dyn Fn(&mut DrawContext<'_>, &RenderedNode) -> Result<(), DrawError>>;

/// Draw procedures for one node kind.
#[derive(Clone, Default)]
pub struct Renderer {
    before: Option<DrawFn>,
    after: Option<DrawFn>,
    handles_children: bool,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` before the node's children are drawn.
    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut DrawContext<'_>, &RenderedNode) -> Result<(), DrawError> + 'static,
    {
        self.before = Some(Rc::new(f));
        self
    }

    /// Run `f` after the node's children are drawn.
    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut DrawContext<'_>, &RenderedNode) -> Result<(), DrawError> + 'static,
    {
        self.after = Some(Rc::new(f));
        self
    }

    /// When set, the walker does not recurse into the node's children; the
    /// renderer draws them itself (or not at all).
    pub fn handles_children(mut self, handles: bool) -> Self {
        self.handles_children = handles;
        self
    }

    pub fn is_handling_children(&self) -> bool {
        self.handles_children
    }

    pub fn draw_before(&self, ctx: &mut DrawContext<'_>, node: &RenderedNode) -> Result<(), DrawError> {
        match &self.before {
            Some(f) => {
                crate::stats::record_renderer_invoked();
                f(ctx, node)
            }
            None => Ok(()),
        }
    }

    pub fn draw_after(&self, ctx: &mut DrawContext<'_>, node: &RenderedNode) -> Result<(), DrawError> {
        match &self.after {
            Some(f) => {
                crate::stats::record_renderer_invoked();
                f(ctx, node)
            }
            None => Ok(()),
        }
    }
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Renderer")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .field("handles_children", &self.handles_children)
            .finish()
    }
}

/// What the walker does with a node whose kind has no renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownKindPolicy {
    /// Draw nothing for the node and do not visit its children.
    #[default]
    Skip,
    /// Draw nothing for the node itself but still draw its children.
    DrawChildren,
}

#[derive(Clone, Default)]
struct Table {
    builtin: [Option<Renderer>; NodeKind::BUILTIN_COUNT],
    custom: HashMap<NodeKind, Renderer>,
    unknown: UnknownKindPolicy,
}

impl Table {
    fn insert(&mut self, kind: NodeKind, renderer: Renderer) {
        match kind.builtin_slot() {
            Some(slot) => self.builtin[slot] = Some(renderer),
            None => {
                self.custom.insert(kind, renderer);
            }
        }
    }

    fn entries(&self) -> impl Iterator<Item = (NodeKind, &Renderer)> {
        NodeKind::BUILTIN
            .into_iter()
            .zip(self.builtin.iter())
            .filter_map(|(kind, r)| r.as_ref().map(|r| (kind, r)))
            .chain(self.custom.iter().map(|(kind, r)| (kind.clone(), r)))
    }
}

/// Immutable mapping from node kind to [`Renderer`].
#[derive(Clone)]
pub struct RendererRegistry {
    table: Rc<Table>,
}

impl RendererRegistry {
    /// A registry with no renderers at all.
    pub fn empty() -> Self {
        Self {
            table: Rc::new(Table::default()),
        }
    }

    /// The built-in renderers for every built-in kind.
    pub fn defaults() -> Self {
        Self::empty()
            .with(NodeKind::Rectangle, shapes::rectangle())
            .with(NodeKind::Line, shapes::line())
            .with(NodeKind::Text, shapes::text())
            .with(NodeKind::Image, shapes::image())
            .with(NodeKind::Translate, transforms::translate())
            .with(NodeKind::Scale, transforms::scale())
            .with(NodeKind::Rotate, transforms::rotate())
            .with(NodeKind::Opacity, transforms::opacity())
            .with(NodeKind::BufferedSurface, buffered::buffered_surface())
    }

    /// Add or replace the renderer for `kind`.
    pub fn with(mut self, kind: impl Into<NodeKind>, renderer: Renderer) -> Self {
        Rc::make_mut(&mut self.table).insert(kind.into(), renderer);
        self
    }

    pub fn with_unknown_kind_policy(mut self, policy: UnknownKindPolicy) -> Self {
        Rc::make_mut(&mut self.table).unknown = policy;
        self
    }

    /// A new registry holding this one's renderers with `overrides` added on
    /// top. `self` is not modified.
    pub fn register_renderers<I, K>(&self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, Renderer)>,
        K: Into<NodeKind>,
    {
        overrides
            .into_iter()
            .fold(self.clone(), |registry, (kind, renderer)| registry.with(kind, renderer))
    }

    /// A new registry with every renderer of `overrides` replacing or adding
    /// to this one's. The unknown-kind policy of `self` is kept.
    pub fn merged(&self, overrides: &RendererRegistry) -> Self {
        if self.ptr_eq(overrides) {
            return self.clone();
        }
        let mut table = (*self.table).clone();
        for (kind, renderer) in overrides.table.entries() {
            table.insert(kind, renderer.clone());
        }
        Self {
            table: Rc::new(table),
        }
    }

    pub fn get(&self, kind: &NodeKind) -> Option<&Renderer> {
        match kind.builtin_slot() {
            Some(slot) => self.table.builtin[slot].as_ref(),
            None => self.table.custom.get(kind),
        }
    }

    pub fn contains(&self, kind: &NodeKind) -> bool {
        self.get(kind).is_some()
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.table.entries().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn unknown_kind_policy(&self) -> UnknownKindPolicy {
        self.table.unknown
    }

    /// Whether both handles share the same table.
    pub fn ptr_eq(&self, other: &RendererRegistry) -> bool {
        Rc::ptr_eq(&self.table, &other.table)
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::defaults()
    }
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RendererRegistry")
            .field(
                "kinds",
                &self.table.entries().map(|(k, _)| k).collect::<Vec<_>>(),
            )
            .field("unknown", &self.table.unknown)
            .finish()
    }
}

/// The built-in renderers with `overrides` added on top.
pub fn register_renderers<I, K>(overrides: I) -> RendererRegistry
where
    I: IntoIterator<Item = (K, Renderer)>,
    K: Into<NodeKind>,
{
    RendererRegistry::defaults().register_renderers(overrides)
}

/// Everything a draw procedure may touch during a pass.
pub struct DrawContext<'a> {
    pub canvas: &'a mut Canvas,
    /// Logical size of the surface being drawn.
    pub width: f32,
    pub height: f32,
    pub pixel_ratio: f32,
    pub graph: &'a NodeGraph,
    pub registry: &'a RendererRegistry,
}

impl DrawContext<'_> {
    /// Draw one node and its subtree with the walker's usual rules.
    pub fn draw_child(&mut self, id: NodeId) {
        crate::walker::draw_node(self, id);
    }

    pub fn draw_children(&mut self, ids: &[NodeId]) {
        for &id in ids {
            self.draw_child(id);
        }
    }

    pub fn stringify_children(&self, node: &RenderedNode) -> String {
        stringify_children(self.graph, node)
    }
}

/// Concatenate the literal text among `node`'s children, in order.
pub fn stringify_children(graph: &NodeGraph, node: &RenderedNode) -> String {
    node.children()
        .iter()
        .filter_map(|&id| graph.text(id))
        .map(|leaf| leaf.text())
        .collect()
}

// -- Prop helpers shared by the built-in renderers --

fn invalid(node: &RenderedNode, prop: &'static str, expected: &'static str) -> DrawError {
    DrawError::InvalidProp {
        kind: node.kind().clone(),
        prop,
        expected,
    }
}

/// Read an optional numeric prop. A present value of another type is an
/// error rather than a silent default.
fn number(node: &RenderedNode, prop: &'static str) -> Result<Option<f32>, DrawError> {
    match node.props().get(prop) {
        None => Ok(None),
        Some(value) => value
            .as_number()
            .map(|n| Some(n as f32))
            .ok_or_else(|| invalid(node, prop, "number")),
    }
}

fn number_or(node: &RenderedNode, prop: &'static str, default: f32) -> Result<f32, DrawError> {
    Ok(number(node, prop)?.unwrap_or(default))
}

fn color(node: &RenderedNode, prop: &'static str) -> Result<Option<Color>, DrawError> {
    node.props()
        .color(prop)
        .map_err(|_| invalid(node, prop, "color"))
}

fn string<'n>(node: &'n RenderedNode, prop: &'static str) -> Result<Option<&'n str>, DrawError> {
    match node.props().get(prop) {
        None => Ok(None),
        Some(value) => value
            .as_str()
            .map(Some)
            .ok_or_else(|| invalid(node, prop, "string")),
    }
}
