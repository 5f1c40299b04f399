//! Update diffing: deciding whether a committed node must be redrawn.
//!
//! Every update runs a per-kind check from an [`UpdateChecks`] table. Kinds
//! without an entry are always treated as changed. Caching kinds (by default
//! only `BufferedSurface`) register [`deep_children_changed`], which compares
//! the flattened child descriptions so that a rebuilt but identical subtree
//! does not invalidate the cache.

use std::collections::HashMap;
use std::fmt;

use crate::element::{Component, Element, NodeElement};
use crate::kind::NodeKind;
use crate::props::Props;

/// Returns `true` when `new` differs from `old` in a way that needs a redraw.
pub type UpdateCheck = fn(old: &NodeElement, new: &NodeElement) -> bool;

/// Any non-children prop changed value, or a prop was added or removed.
pub fn props_changed(old: &Props, new: &Props) -> bool {
    old.len() != new.len() || new.iter().any(|(name, value)| old.get(name) != Some(value))
}

/// One entry of a flattened child description.
#[derive(Debug, Clone, Copy)]
pub enum FlatChild<'a> {
    Node(&'a NodeElement),
    Component(&'a Component),
    Text(&'a str),
}

impl FlatChild<'_> {
    fn same_kind(&self, other: &FlatChild<'_>) -> bool {
        match (self, other) {
            (FlatChild::Node(a), FlatChild::Node(b)) => a.kind == b.kind,
            (FlatChild::Component(a), FlatChild::Component(b)) => a.name() == b.name(),
            (FlatChild::Text(_), FlatChild::Text(_)) => true,
            _ => false,
        }
    }

    fn content_changed(&self, other: &FlatChild<'_>) -> bool {
        match (self, other) {
            (FlatChild::Node(a), FlatChild::Node(b)) => props_changed(&a.props, &b.props),
            (FlatChild::Component(a), FlatChild::Component(b)) => {
                props_changed(a.get_props(), b.get_props())
            }
            (FlatChild::Text(a), FlatChild::Text(b)) => a != b,
            _ => true,
        }
    }
}

/// Depth-first, pre-order list of every descendant description.
///
/// Fragments are containment only and do not appear; empty slots are
/// dropped.
pub fn flatten_children(children: &[Element]) -> Vec<FlatChild<'_>> {
    let mut out = Vec::new();
    flatten_into(children, &mut out);
    out
}

fn flatten_into<'a>(children: &'a [Element], out: &mut Vec<FlatChild<'a>>) {
    for child in children {
        match child {
            Element::Empty => {}
            Element::Text(text) => out.push(FlatChild::Text(text)),
            Element::Node(node) => {
                out.push(FlatChild::Node(node));
                flatten_into(&node.children, out);
            }
            Element::Fragment(fragment) => flatten_into(&fragment.children, out),
            Element::Component(component) => out.push(FlatChild::Component(component)),
        }
    }
}

/// Never skip a redraw.
pub fn always_changed(_old: &NodeElement, _new: &NodeElement) -> bool {
    true
}

/// Compare own props plus the flattened child descriptions pairwise.
pub fn deep_children_changed(old: &NodeElement, new: &NodeElement) -> bool {
    if props_changed(&old.props, &new.props) {
        return true;
    }

    let old_flat = flatten_children(&old.children);
    let new_flat = flatten_children(&new.children);
    old_flat.len() != new_flat.len()
        || old_flat
            .iter()
            .zip(&new_flat)
            .any(|(a, b)| !a.same_kind(b) || a.content_changed(b))
}

/// Per-kind update checks.
#[derive(Clone)]
pub struct UpdateChecks {
    checks: HashMap<NodeKind, UpdateCheck>,
    fallback: UpdateCheck,
}

impl UpdateChecks {
    /// An empty table: every kind is always treated as changed.
    pub fn empty() -> Self {
        Self {
            checks: HashMap::new(),
            fallback: always_changed,
        }
    }

    /// Register a check for `kind`, replacing any existing one.
    pub fn with(mut self, kind: impl Into<NodeKind>, check: UpdateCheck) -> Self {
        self.checks.insert(kind.into(), check);
        self
    }

    /// Whether `kind` has its own check rather than the fallback.
    pub fn contains(&self, kind: &NodeKind) -> bool {
        self.checks.contains_key(kind)
    }

    pub fn get(&self, kind: &NodeKind) -> UpdateCheck {
        self.checks.get(kind).copied().unwrap_or(self.fallback)
    }

    /// Run the check registered for `new.kind`.
    pub fn has_changed(&self, old: &NodeElement, new: &NodeElement) -> bool {
        (self.get(&new.kind))(old, new)
    }
}

impl Default for UpdateChecks {
    fn default() -> Self {
        Self::empty().with(NodeKind::BufferedSurface, deep_children_changed)
    }
}

impl fmt::Debug for UpdateChecks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateChecks")
            .field("kinds", &self.checks.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
