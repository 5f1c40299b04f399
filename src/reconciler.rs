//! Generic reconciliation engine.
//!
//! The engine keeps a fiber tree mirroring the last committed description.
//! Each commit walks the new description against it:
//!
//! - Children are matched by explicit key, or by position when unkeyed.
//!   A match of the same type (node kind, text, fragment, component name)
//!   is updated in place and keeps its host instance; anything else is
//!   created fresh and the unmatched old fiber is deleted.
//! - Fragments and components own no host instance. Their output is spliced
//!   into the nearest host parent, so placement is computed per host parent
//!   over the flattened list of its host children.
//! - Moves are minimal: children on the longest run that kept its relative
//!   order stay put, the rest are re-inserted before their next sibling.
//!
//! Component evaluation failures, including panics, are reported to the
//! error handler and leave that component's previous output committed.

use std::collections::{HashMap, HashSet};
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::element::{Component, Element, Key, NodeElement};
use crate::error::{panic_message, DescriptionError};
use crate::host::HostConfig;

/// Receives description errors caught during a commit.
pub type ErrorHandler = Box<dyn FnMut(&DescriptionError)>;

enum Fiber<I> {
    Empty,
    Text {
        text: String,
        instance: I,
    },
    Host {
        element: NodeElement,
        instance: I,
        text_content: bool,
        children: Vec<Fiber<I>>,
    },
    Fragment {
        key: Option<Key>,
        children: Vec<Fiber<I>>,
    },
    Component {
        component: Component,
        children: Vec<Fiber<I>>,
    },
}

impl<I: Copy> Fiber<I> {
    fn key(&self) -> Option<&Key> {
        match self {
            Fiber::Host { element, .. } => element.key.as_ref(),
            Fiber::Fragment { key, .. } => key.as_ref(),
            Fiber::Component { component, .. } => component.get_key(),
            Fiber::Empty | Fiber::Text { .. } => None,
        }
    }

    fn same_type(&self, element: &Element) -> bool {
        match (self, element) {
            (Fiber::Empty, Element::Empty) => true,
            (Fiber::Text { .. }, Element::Text(_)) => true,
            (Fiber::Host { element: old, .. }, Element::Node(new)) => old.kind == new.kind,
            (Fiber::Fragment { .. }, Element::Fragment(_)) => true,
            (Fiber::Component { component, .. }, Element::Component(new)) => {
                component.name() == new.name()
            }
            _ => false,
        }
    }

    /// Top-level host instances of this fiber, in order.
    fn collect_hosts(&self, out: &mut Vec<I>) {
        match self {
            Fiber::Empty => {}
            Fiber::Text { instance, .. } | Fiber::Host { instance, .. } => out.push(*instance),
            Fiber::Fragment { children, .. } | Fiber::Component { children, .. } => {
                for child in children {
                    child.collect_hosts(out);
                }
            }
        }
    }
}

fn hosts_of<I: Copy>(fibers: &[Fiber<I>]) -> Vec<I> {
    let mut out = Vec::new();
    for fiber in fibers {
        fiber.collect_hosts(&mut out);
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum SlotKey {
    Explicit(Key),
    Position(usize),
}

fn slot_key(key: Option<&Key>, position: usize) -> SlotKey {
    match key {
        Some(key) => SlotKey::Explicit(key.clone()),
        None => SlotKey::Position(position),
    }
}

#[derive(Debug, Clone, Copy)]
enum Parent<I> {
    Container,
    Instance(I),
}

/// Drives a [`HostConfig`] from successive descriptions of one root.
pub struct Reconciler<H: HostConfig> {
    host: H,
    roots: Vec<Fiber<H::Instance>>,
    on_error: ErrorHandler,
}

impl<H: HostConfig> Reconciler<H> {
    pub fn new(host: H, on_error: ErrorHandler) -> Self {
        Self {
            host,
            roots: Vec::new(),
            on_error,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Commit `element` as the root's content, or tear everything down for
    /// `None`.
    pub fn update_container(&mut self, element: Option<Element>) {
        let old = std::mem::take(&mut self.roots);
        match element {
            Some(element) => {
                self.roots = self.reconcile_children(Parent::Container, old, vec![element]);
            }
            None => {
                for fiber in old {
                    self.delete_fiber(Parent::Container, fiber);
                }
                self.host.clear_container();
            }
        }
    }

    fn report(&mut self, error: DescriptionError) {
        (self.on_error)(&error);
    }

    /// Reconcile the children of one host parent and fix up its child order.
    fn reconcile_children(
        &mut self,
        parent: Parent<H::Instance>,
        old: Vec<Fiber<H::Instance>>,
        new: Vec<Element>,
    ) -> Vec<Fiber<H::Instance>> {
        let before = hosts_of(&old);
        let fibers = self.reconcile_list(parent, old, new);
        let after = hosts_of(&fibers);
        self.place(parent, &before, &after);
        fibers
    }

    /// Match `new` against `old` without touching the parent's child order.
    fn reconcile_list(
        &mut self,
        parent: Parent<H::Instance>,
        old: Vec<Fiber<H::Instance>>,
        new: Vec<Element>,
    ) -> Vec<Fiber<H::Instance>> {
        let mut existing: HashMap<SlotKey, Fiber<H::Instance>> = HashMap::with_capacity(old.len());
        for (position, fiber) in old.into_iter().enumerate() {
            let key = slot_key(fiber.key(), position);
            if let Some(duplicate) = existing.insert(key, fiber) {
                self.delete_fiber(parent, duplicate);
            }
        }

        let mut fibers = Vec::with_capacity(new.len());
        let mut seen = HashSet::new();
        for (position, element) in new.into_iter().enumerate() {
            let key = slot_key(element.key(), position);
            if !seen.insert(key.clone()) {
                log::warn!("duplicate key {key:?} among siblings; the later child is remounted");
            }
            let fiber = match existing.remove(&key) {
                Some(old) if old.same_type(&element) => self.update_fiber(parent, old, element),
                Some(old) => {
                    self.delete_fiber(parent, old);
                    self.create_fiber(element)
                }
                None => self.create_fiber(element),
            };
            fibers.push(fiber);
        }

        for (_, fiber) in existing {
            self.delete_fiber(parent, fiber);
        }
        fibers
    }

    fn create_fiber(&mut self, element: Element) -> Fiber<H::Instance> {
        match element {
            Element::Empty => Fiber::Empty,
            Element::Text(text) => {
                let instance = self.host.create_text_instance(&text);
                Fiber::Text { text, instance }
            }
            Element::Node(mut element) => {
                let instance = self.host.create_instance(&element);
                let text_content = self.host.should_set_text_content(&element);
                let children = if text_content {
                    Vec::new()
                } else {
                    let descriptions = self.take_children(&mut element);
                    let children: Vec<_> = descriptions
                        .into_iter()
                        .map(|child| self.create_fiber(child))
                        .collect();
                    for child in hosts_of(&children) {
                        self.host.append_initial_child(instance, child);
                    }
                    children
                };
                Fiber::Host {
                    element,
                    instance,
                    text_content,
                    children,
                }
            }
            Element::Fragment(fragment) => Fiber::Fragment {
                key: fragment.key,
                children: fragment
                    .children
                    .into_iter()
                    .map(|child| self.create_fiber(child))
                    .collect(),
            },
            Element::Component(component) => {
                let children = match self.evaluate(&component) {
                    Some(output) => vec![self.create_fiber(output)],
                    None => Vec::new(),
                };
                Fiber::Component {
                    component,
                    children,
                }
            }
        }
    }

    fn update_fiber(
        &mut self,
        parent: Parent<H::Instance>,
        old: Fiber<H::Instance>,
        element: Element,
    ) -> Fiber<H::Instance> {
        match (old, element) {
            (Fiber::Text { text, instance }, Element::Text(new_text)) => {
                if text != new_text {
                    self.host.commit_text_update(instance, &text, &new_text);
                }
                Fiber::Text {
                    text: new_text,
                    instance,
                }
            }
            (
                Fiber::Host {
                    element: old_element,
                    instance,
                    text_content: was_text,
                    children,
                },
                Element::Node(mut element),
            ) => {
                let payload = self.host.prepare_update(instance, &old_element, &element);
                let text_content = self.host.should_set_text_content(&element);

                let children = if text_content {
                    for child in children {
                        self.delete_fiber(Parent::Instance(instance), child);
                    }
                    Vec::new()
                } else {
                    if was_text {
                        self.host.reset_text_content(instance);
                    }
                    let descriptions = self.take_children(&mut element);
                    self.reconcile_children(Parent::Instance(instance), children, descriptions)
                };

                self.host
                    .commit_update(instance, payload, &old_element, &element);
                Fiber::Host {
                    element,
                    instance,
                    text_content,
                    children,
                }
            }
            (Fiber::Fragment { children, .. }, Element::Fragment(fragment)) => Fiber::Fragment {
                key: fragment.key,
                children: self.reconcile_list(parent, children, fragment.children),
            },
            (Fiber::Component { children, .. }, Element::Component(component)) => {
                let children = match self.evaluate(&component) {
                    Some(output) => self.reconcile_list(parent, children, vec![output]),
                    None => children,
                };
                Fiber::Component {
                    component,
                    children,
                }
            }
            (old, element) => {
                // Empty slots have nothing to update.
                self.delete_fiber(parent, old);
                self.create_fiber(element)
            }
        }
    }

    /// Move child descriptions out of `element`, leaving a copy behind only
    /// when the host needs them for the next update check.
    fn take_children(&self, element: &mut NodeElement) -> Vec<Element> {
        if self.host.retains_child_descriptions(element) {
            element.children.clone()
        } else {
            std::mem::take(&mut element.children)
        }
    }

    fn evaluate(&mut self, component: &Component) -> Option<Element> {
        let result = catch_unwind(AssertUnwindSafe(|| component.evaluate()));
        let error = match result {
            Ok(Ok(output)) => return Some(output),
            Ok(Err(error)) => error,
            Err(panic) => DescriptionError::Panicked {
                name: component.name().to_string(),
                message: panic_message(panic.as_ref()),
            },
        };
        self.report(error);
        None
    }

    fn delete_fiber(&mut self, parent: Parent<H::Instance>, fiber: Fiber<H::Instance>) {
        let mut hosts = Vec::new();
        fiber.collect_hosts(&mut hosts);
        for instance in hosts {
            match parent {
                Parent::Container => self.host.remove_child_from_container(instance),
                Parent::Instance(p) => self.host.remove_child(p, instance),
            }
            self.host.detach_deleted_instance(instance);
        }
    }

    /// Reorder `parent`'s host children from `before` (old order, may
    /// include deleted instances) to `after`.
    fn place(&mut self, parent: Parent<H::Instance>, before: &[H::Instance], after: &[H::Instance]) {
        let wanted: HashSet<H::Instance> = after.iter().copied().collect();
        let current: HashMap<H::Instance, usize> = before
            .iter()
            .copied()
            .filter(|i| wanted.contains(i))
            .enumerate()
            .map(|(index, instance)| (instance, index))
            .collect();

        let positions: Vec<Option<usize>> = after.iter().map(|i| current.get(i).copied()).collect();
        let stable = longest_increasing_run(&positions);

        let mut anchor: Option<H::Instance> = None;
        for (index, &instance) in after.iter().enumerate().rev() {
            if stable.contains(&index) {
                anchor = Some(instance);
                continue;
            }
            let moved = positions[index].is_some();
            match parent {
                Parent::Container => {
                    if moved {
                        self.host.remove_child_from_container(instance);
                    }
                    match anchor {
                        Some(before) => self.host.insert_in_container_before(instance, before),
                        None => self.host.append_child_to_container(instance),
                    }
                }
                Parent::Instance(p) => {
                    if moved {
                        self.host.remove_child(p, instance);
                    }
                    match anchor {
                        Some(before) => self.host.insert_before(p, instance, before),
                        None => self.host.append_child(p, instance),
                    }
                }
            }
            anchor = Some(instance);
        }
    }
}

/// Indices into `positions` forming a longest strictly increasing
/// subsequence of the `Some` values.
fn longest_increasing_run(positions: &[Option<usize>]) -> HashSet<usize> {
    // tails[k] = index into `positions` of the smallest tail of a run of length k + 1
    let mut tails: Vec<usize> = Vec::new();
    let mut prev: Vec<Option<usize>> = vec![None; positions.len()];

    for (index, value) in positions.iter().enumerate() {
        let Some(value) = *value else {
            continue;
        };
        let slot = tails.partition_point(|&t| positions[t].is_some_and(|v| v < value));
        if slot > 0 {
            prev[index] = Some(tails[slot - 1]);
        }
        if slot == tails.len() {
            tails.push(index);
        } else {
            tails[slot] = index;
        }
    }

    let mut run = HashSet::with_capacity(tails.len());
    let mut cursor = tails.last().copied();
    while let Some(index) = cursor {
        run.insert(index);
        cursor = prev[index];
    }
    run
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_increasing_run() {
        let run = longest_increasing_run(&[Some(2), Some(0), None, Some(1), Some(3)]);
        let mut run: Vec<_> = run.into_iter().collect();
        run.sort();
        assert_eq!(run, vec![1, 3, 4]);
    }

    #[test]
    fn test_longest_increasing_run_all_new() {
        assert!(longest_increasing_run(&[None, None]).is_empty());
    }
}
