//! Arena storage for the committed node graph.
//!
//! Every rendered node and text leaf lives in a slot of [`NodeGraph`] and is
//! addressed by a generational [`NodeId`]. Parents hold ordered lists of child
//! ids; the top-level list belongs to the root [`Container`].
//!
//! ## Ownership
//!
//! A node is owned by exactly one parent (or the container). Detaching a node
//! with [`NodeGraph::remove_child`] only unlinks it; [`NodeGraph::release`]
//! frees the node and its whole subtree, dropping any off-screen surface a
//! node holds.
//!
//! ## Generational indices
//!
//! A freed slot is reused with an incremented generation, so a stale id held
//! across a release never resolves to the new occupant.

use std::cell::{Cell, RefCell};

use crate::canvas::Canvas;
use crate::kind::NodeKind;
use crate::props::Props;

/// Handle to a node or text leaf in a [`NodeGraph`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    /// Combines generation (high bits) with index (low bits).
    pub fn as_u64(self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }
}

/// The persistent unit of the graph.
pub struct RenderedNode {
    pub(crate) kind: NodeKind,
    pub(crate) props: Props,
    pub(crate) children: Vec<NodeId>,
    pub(crate) dirty: Cell<bool>,
    /// Children are a single synthetic leaf built from literal text.
    pub(crate) text_content: bool,
    /// Private off-screen surface of caching kinds.
    pub(crate) buffer: RefCell<Option<Canvas>>,
}

impl RenderedNode {
    fn new(kind: NodeKind, props: Props) -> Self {
        Self {
            kind,
            props,
            children: Vec::new(),
            dirty: Cell::new(true),
            text_content: false,
            buffer: RefCell::new(None),
        }
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    pub fn clear_dirty(&self) {
        self.dirty.set(false);
    }

    pub fn is_text_content(&self) -> bool {
        self.text_content
    }

    /// Borrow the node's off-screen surface slot.
    pub fn buffer(&self) -> &RefCell<Option<Canvas>> {
        &self.buffer
    }
}

/// Literal text content. Carries no props and no children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLeaf {
    pub(crate) text: String,
}

impl TextLeaf {
    pub fn text(&self) -> &str {
        &self.text
    }
}

pub enum Instance {
    Node(RenderedNode),
    Text(TextLeaf),
}

/// Top-level ordered child list of a root.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Container {
    children: Vec<NodeId>,
}

impl Container {
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

struct Slot {
    generation: u32,
    instance: Option<Instance>,
}

#[derive(Default)]
pub struct NodeGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    container: Container,
    live: usize,
}

impl NodeGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self, instance: Instance) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.generation = slot.generation.wrapping_add(1);
            slot.instance = Some(instance);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }

        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            instance: Some(instance),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    /// Create a detached node. New nodes start dirty.
    pub fn create_node(&mut self, kind: NodeKind, props: Props) -> NodeId {
        self.allocate(Instance::Node(RenderedNode::new(kind, props)))
    }

    /// Create a detached text leaf.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.allocate(Instance::Text(TextLeaf { text: text.into() }))
    }

    pub fn get(&self, id: NodeId) -> Option<&Instance> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.instance.as_ref())
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Instance> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.instance.as_mut())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn node(&self, id: NodeId) -> Option<&RenderedNode> {
        match self.get(id)? {
            Instance::Node(node) => Some(node),
            Instance::Text(_) => None,
        }
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut RenderedNode> {
        match self.get_mut(id)? {
            Instance::Node(node) => Some(node),
            Instance::Text(_) => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&TextLeaf> {
        match self.get(id)? {
            Instance::Text(leaf) => Some(leaf),
            Instance::Node(_) => None,
        }
    }

    pub fn text_mut(&mut self, id: NodeId) -> Option<&mut TextLeaf> {
        match self.get_mut(id)? {
            Instance::Text(leaf) => Some(leaf),
            Instance::Node(_) => None,
        }
    }

    /// Children of a node; empty for leaves and stale ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(RenderedNode::children).unwrap_or(&[])
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    /// Number of live nodes and leaves.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    // -- Tree surgery --

    fn children_mut(&mut self, parent: NodeId) -> Option<&mut Vec<NodeId>> {
        self.node_mut(parent).map(|n| &mut n.children)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(children) = self.children_mut(parent) {
            children.push(child);
        }
    }

    /// Insert `child` immediately before `before`. No-op if `before` is not
    /// currently a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, before: NodeId) {
        if let Some(children) = self.children_mut(parent) {
            insert_before(children, child, before);
        }
    }

    /// Remove the first occurrence of `child`. No-op if absent.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(children) = self.children_mut(parent) {
            remove_first(children, child);
        }
    }

    pub fn append_child_to_container(&mut self, child: NodeId) {
        self.container.children.push(child);
    }

    pub fn insert_in_container_before(&mut self, child: NodeId, before: NodeId) {
        insert_before(&mut self.container.children, child, before);
    }

    pub fn remove_child_from_container(&mut self, child: NodeId) {
        remove_first(&mut self.container.children, child);
    }

    /// Empty the container, returning the detached top-level ids.
    pub fn clear_container(&mut self) -> Vec<NodeId> {
        std::mem::take(&mut self.container.children)
    }

    /// Free `id` and every descendant.
    pub fn release(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(id) = pending.pop() {
            let Some(slot) = self
                .slots
                .get_mut(id.index as usize)
                .filter(|s| s.generation == id.generation)
            else {
                continue;
            };
            let Some(instance) = slot.instance.take() else {
                continue;
            };
            self.free.push(id.index);
            self.live -= 1;
            if let Instance::Node(node) = instance {
                pending.extend(node.children);
            }
        }
    }

    /// Free everything, including the container's children.
    pub fn release_all(&mut self) {
        for id in self.clear_container() {
            self.release(id);
        }
    }
}

fn insert_before(children: &mut Vec<NodeId>, child: NodeId, before: NodeId) {
    if let Some(index) = children.iter().position(|&c| c == before) {
        children.insert(index, child);
    }
}

fn remove_first(children: &mut Vec<NodeId>, child: NodeId) {
    if let Some(index) = children.iter().position(|&c| c == child) {
        children.remove(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(graph: &mut NodeGraph) -> NodeId {
        graph.create_node(NodeKind::Rectangle, Props::new())
    }

    #[test]
    fn test_append_and_insert_before_preserve_order() {
        let mut g = NodeGraph::new();
        let parent = rect(&mut g);
        let a = rect(&mut g);
        let b = rect(&mut g);
        let c = rect(&mut g);

        g.append_child(parent, a);
        g.append_child(parent, c);
        g.insert_before(parent, b, c);
        assert_eq!(g.children(parent), &[a, b, c]);
    }

    #[test]
    fn test_insert_before_missing_anchor_is_noop() {
        let mut g = NodeGraph::new();
        let parent = rect(&mut g);
        let a = rect(&mut g);
        let b = rect(&mut g);
        let stranger = rect(&mut g);

        g.append_child(parent, a);
        g.insert_before(parent, b, stranger);
        assert_eq!(g.children(parent), &[a]);

        g.insert_in_container_before(b, stranger);
        assert!(g.container().children().is_empty());
    }

    #[test]
    fn test_remove_child_first_occurrence_only() {
        let mut g = NodeGraph::new();
        let parent = rect(&mut g);
        let a = rect(&mut g);
        let b = rect(&mut g);

        g.append_child(parent, a);
        g.append_child(parent, b);
        g.append_child(parent, a);
        g.remove_child(parent, a);
        assert_eq!(g.children(parent), &[b, a]);

        g.remove_child(parent, NodeId { index: 99, generation: 0 });
        assert_eq!(g.children(parent), &[b, a]);
    }

    #[test]
    fn test_clear_container() {
        let mut g = NodeGraph::new();
        let a = rect(&mut g);
        let b = rect(&mut g);
        g.append_child_to_container(a);
        g.append_child_to_container(b);

        assert_eq!(g.clear_container(), vec![a, b]);
        assert!(g.container().children().is_empty());
    }

    #[test]
    fn test_release_frees_subtree_and_bumps_generation() {
        let mut g = NodeGraph::new();
        let parent = rect(&mut g);
        let leaf = g.create_text("hi");
        g.append_child(parent, leaf);
        assert_eq!(g.len(), 2);

        g.release(parent);
        assert!(g.is_empty());
        assert!(!g.contains(leaf));

        let reused = rect(&mut g);
        assert_ne!(reused, parent);
        assert!(g.node(parent).is_none());
    }

    #[test]
    fn test_new_nodes_are_dirty() {
        let mut g = NodeGraph::new();
        let id = rect(&mut g);
        assert!(g.node(id).unwrap().is_dirty());
        assert!(g.text(id).is_none());
    }
}
