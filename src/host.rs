//! The host side of reconciliation.
//!
//! [`HostConfig`] is the set of primitives a reconciliation engine drives to
//! materialise a description: create instances, splice child lists, and
//! commit updates. [`CanvasHost`] implements it over a [`NodeGraph`].

use crate::diff::UpdateChecks;
use crate::element::NodeElement;
use crate::graph::{NodeGraph, NodeId};

/// Result of [`HostConfig::prepare_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdatePayload {
    pub has_updates: bool,
}

/// Primitives a reconciliation engine needs from its host.
///
/// Instances are handles; the host owns the storage. All calls are made
/// synchronously during a commit.
pub trait HostConfig {
    type Instance: Copy + Eq + std::hash::Hash + std::fmt::Debug;

    /// Whether `element`'s children are literal text handled by the host
    /// itself rather than reconciled as child instances.
    fn should_set_text_content(&self, element: &NodeElement) -> bool;

    fn create_instance(&mut self, element: &NodeElement) -> Self::Instance;
    fn create_text_instance(&mut self, text: &str) -> Self::Instance;

    /// Append to a parent that is not yet attached.
    fn append_initial_child(&mut self, parent: Self::Instance, child: Self::Instance);
    fn append_child(&mut self, parent: Self::Instance, child: Self::Instance);
    fn insert_before(&mut self, parent: Self::Instance, child: Self::Instance, before: Self::Instance);
    fn remove_child(&mut self, parent: Self::Instance, child: Self::Instance);

    fn append_child_to_container(&mut self, child: Self::Instance);
    fn insert_in_container_before(&mut self, child: Self::Instance, before: Self::Instance);
    fn remove_child_from_container(&mut self, child: Self::Instance);
    fn clear_container(&mut self);

    fn prepare_update(
        &self,
        instance: Self::Instance,
        old: &NodeElement,
        new: &NodeElement,
    ) -> UpdatePayload;
    fn commit_update(
        &mut self,
        instance: Self::Instance,
        payload: UpdatePayload,
        old: &NodeElement,
        new: &NodeElement,
    );
    fn commit_text_update(&mut self, instance: Self::Instance, old_text: &str, new_text: &str);

    /// Whether the engine must keep `element`'s child descriptions so a later
    /// [`HostConfig::prepare_update`] can compare them.
    fn retains_child_descriptions(&self, _element: &NodeElement) -> bool {
        true
    }

    /// Drop literal text content before the instance gets real children.
    fn reset_text_content(&mut self, instance: Self::Instance);

    /// Release an instance that was removed and will not be reused.
    fn detach_deleted_instance(&mut self, instance: Self::Instance);
}

/// Host config building the committed [`NodeGraph`].
pub struct CanvasHost {
    graph: NodeGraph,
    checks: UpdateChecks,
}

impl CanvasHost {
    pub fn new(checks: UpdateChecks) -> Self {
        Self {
            graph: NodeGraph::new(),
            checks,
        }
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut NodeGraph {
        &mut self.graph
    }

    pub fn update_checks(&self) -> &UpdateChecks {
        &self.checks
    }

    /// Make `id`'s children exactly one leaf holding `text`, reusing an
    /// existing synthetic leaf.
    fn set_text_content(&mut self, id: NodeId, text: &str) {
        let existing = match self.graph.node(id) {
            Some(node) if node.text_content && node.children.len() == 1 => Some(node.children[0]),
            Some(_) => None,
            None => return,
        };

        if let Some(leaf) = existing.and_then(|leaf| self.graph.text_mut(leaf)) {
            if leaf.text != text {
                leaf.text = text.to_string();
            }
            return;
        }

        let old_children = match self.graph.node_mut(id) {
            Some(node) => std::mem::take(&mut node.children),
            None => return,
        };
        for child in old_children {
            self.graph.release(child);
        }

        let leaf = self.graph.create_text(text);
        if let Some(node) = self.graph.node_mut(id) {
            node.children.push(leaf);
            node.text_content = true;
        }
    }
}

impl Default for CanvasHost {
    fn default() -> Self {
        Self::new(UpdateChecks::default())
    }
}

impl HostConfig for CanvasHost {
    type Instance = NodeId;

    fn should_set_text_content(&self, element: &NodeElement) -> bool {
        element.text_content().is_some()
    }

    fn create_instance(&mut self, element: &NodeElement) -> NodeId {
        let id = self
            .graph
            .create_node(element.kind.clone(), element.props.clone());
        if let Some(text) = element.text_content() {
            self.set_text_content(id, text);
        }
        log::trace!("created {} {:?}", element.kind, id);
        id
    }

    fn create_text_instance(&mut self, text: &str) -> NodeId {
        self.graph.create_text(text)
    }

    fn append_initial_child(&mut self, parent: NodeId, child: NodeId) {
        self.graph.append_child(parent, child);
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.graph.append_child(parent, child);
    }

    fn insert_before(&mut self, parent: NodeId, child: NodeId, before: NodeId) {
        self.graph.insert_before(parent, child, before);
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        self.graph.remove_child(parent, child);
    }

    fn append_child_to_container(&mut self, child: NodeId) {
        self.graph.append_child_to_container(child);
    }

    fn insert_in_container_before(&mut self, child: NodeId, before: NodeId) {
        self.graph.insert_in_container_before(child, before);
    }

    fn remove_child_from_container(&mut self, child: NodeId) {
        self.graph.remove_child_from_container(child);
    }

    fn clear_container(&mut self) {
        self.graph.clear_container();
    }

    fn prepare_update(&self, _instance: NodeId, old: &NodeElement, new: &NodeElement) -> UpdatePayload {
        UpdatePayload {
            has_updates: self.checks.has_changed(old, new),
        }
    }

    fn commit_update(
        &mut self,
        instance: NodeId,
        payload: UpdatePayload,
        _old: &NodeElement,
        new: &NodeElement,
    ) {
        let Some(node) = self.graph.node_mut(instance) else {
            return;
        };
        node.props = new.props.clone();
        // A pending change survives until the node is drawn.
        if payload.has_updates {
            node.mark_dirty();
        }

        if let Some(text) = new.text_content() {
            self.set_text_content(instance, text);
        }
    }

    fn commit_text_update(&mut self, instance: NodeId, _old_text: &str, new_text: &str) {
        if let Some(leaf) = self.graph.text_mut(instance) {
            leaf.text = new_text.to_string();
        }
    }

    fn retains_child_descriptions(&self, element: &NodeElement) -> bool {
        self.checks.contains(&element.kind)
    }

    fn reset_text_content(&mut self, instance: NodeId) {
        let children = match self.graph.node_mut(instance) {
            Some(node) if node.text_content => {
                node.text_content = false;
                std::mem::take(&mut node.children)
            }
            _ => return,
        };
        for child in children {
            self.graph.release(child);
        }
    }

    fn detach_deleted_instance(&mut self, instance: NodeId) {
        self.graph.release(instance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{buffered_surface, rectangle, text};

    #[test]
    fn test_create_instance_synthesizes_text_leaf() {
        let mut host = CanvasHost::default();
        let id = host.create_instance(&text(5));
        let node = host.graph().node(id).unwrap();
        assert!(node.is_dirty());
        assert_eq!(node.children().len(), 1);
        assert_eq!(host.graph().text(node.children()[0]).unwrap().text(), "5");
    }

    #[test]
    fn test_commit_update_reuses_text_leaf() {
        let mut host = CanvasHost::default();
        let old = text("a");
        let new = text("b");
        let id = host.create_instance(&old);
        let leaf = host.graph().children(id)[0];

        let payload = host.prepare_update(id, &old, &new);
        host.commit_update(id, payload, &old, &new);

        assert_eq!(host.graph().children(id), &[leaf]);
        assert_eq!(host.graph().text(leaf).unwrap().text(), "b");
    }

    #[test]
    fn test_prepare_update_default_and_deep() {
        let mut host = CanvasHost::default();
        let r = rectangle().prop("x", 1).prop("y", 2);
        let rid = host.create_instance(&r);
        assert!(host.prepare_update(rid, &r, &r.clone()).has_updates);

        let b = buffered_surface(10.0, 10.0).child(text("1").prop("fontSize", 10));
        let bid = host.create_instance(&b);
        assert!(!host.prepare_update(bid, &b, &b.clone()).has_updates);
    }

    #[test]
    fn test_dirty_flag_survives_unchanged_commit() {
        let mut host = CanvasHost::default();
        let b = buffered_surface(10.0, 10.0);
        let id = host.create_instance(&b);
        let payload = host.prepare_update(id, &b, &b);
        host.commit_update(id, payload, &b, &b);
        assert!(host.graph().node(id).unwrap().is_dirty());

        host.graph().node(id).unwrap().clear_dirty();
        host.commit_update(id, payload, &b, &b);
        assert!(!host.graph().node(id).unwrap().is_dirty());
    }

    #[test]
    fn test_reset_text_content_releases_leaf() {
        let mut host = CanvasHost::default();
        let id = host.create_instance(&text("x"));
        let leaf = host.graph().children(id)[0];
        host.reset_text_content(id);
        assert!(host.graph().children(id).is_empty());
        assert!(!host.graph().contains(leaf));
    }
}
