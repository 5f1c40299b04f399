use std::cell::RefCell;
use std::rc::Rc;

use retained_canvas::prelude::*;
use retained_canvas::{DescriptionError, NodeGraph, NodeId};

fn xs(graph: &NodeGraph, ids: &[NodeId]) -> Vec<f64> {
    ids.iter()
        .filter_map(|id| graph.node(*id))
        .map(|node| node.props().number("x").unwrap_or(f64::NAN))
        .collect()
}

fn column(keys: &[u64]) -> Element {
    fragment(
        keys.iter()
            .map(|k| rectangle().key(*k).prop("x", *k as f64)),
    )
}

#[test]
fn sibling_order_follows_the_latest_description() {
    let mut root = render(fragment([
        rectangle().prop("x", 1),
        rectangle().prop("x", 2),
        rectangle().prop("x", 3),
    ]));
    assert_eq!(xs(root.graph(), root.children()), [1.0, 2.0, 3.0]);

    root.update(fragment([rectangle().prop("x", 1), rectangle().prop("x", 3)]));
    assert_eq!(xs(root.graph(), root.children()), [1.0, 3.0]);

    root.update(fragment([
        rectangle().prop("x", 0),
        rectangle().prop("x", 1),
        rectangle().prop("x", 3),
        rectangle().prop("x", 4),
    ]));
    assert_eq!(xs(root.graph(), root.children()), [0.0, 1.0, 3.0, 4.0]);
}

#[test]
fn keyed_children_keep_their_nodes_across_reorders() {
    let mut root = render(column(&[1, 2, 3]));
    let before: Vec<NodeId> = root.children().to_vec();

    root.update(column(&[3, 1, 2]));
    let after = root.children();
    assert_eq!(after, [before[2], before[0], before[1]]);
    assert_eq!(xs(root.graph(), after), [3.0, 1.0, 2.0]);
}

#[test]
fn removed_children_are_released() {
    let mut root = render(column(&[1, 2, 3]));
    let removed = root.children()[1];

    root.update(column(&[1, 3]));
    assert!(!root.graph().contains(removed));
    assert_eq!(root.graph().len(), 2);
}

#[test]
fn text_leaf_is_reused_when_content_changes() {
    let mut root = render(text("before"));
    let node = root.children()[0];
    let leaf = root.graph().children(node)[0];

    root.update(text("after"));
    assert_eq!(root.children(), [node]);
    assert_eq!(root.graph().children(node), [leaf]);
    assert_eq!(root.graph().text(leaf).map(|l| l.text()), Some("after"));
}

#[test]
fn mixed_text_children_become_separate_leaves() {
    let root = render(text("Count: ").child(5));
    let node = root.children()[0];
    let leaves: Vec<&str> = root
        .graph()
        .children(node)
        .iter()
        .filter_map(|id| root.graph().text(*id))
        .map(|leaf| leaf.text())
        .collect();
    assert_eq!(leaves, ["Count: ", "5"]);
    assert!(!root.graph().node(node).unwrap().is_text_content());
}

#[test]
fn insert_before_missing_reference_is_a_no_op() {
    let mut graph = NodeGraph::new();
    let parent = graph.create_node(NodeKind::Translate, Props::new());
    let a = graph.create_node(NodeKind::Rectangle, Props::new());
    let b = graph.create_node(NodeKind::Rectangle, Props::new());
    let stranger = graph.create_node(NodeKind::Rectangle, Props::new());
    graph.append_child(parent, a);

    graph.insert_before(parent, b, stranger);
    assert_eq!(graph.children(parent), [a]);

    graph.insert_before(parent, b, a);
    assert_eq!(graph.children(parent), [b, a]);
}

#[test]
fn failing_component_is_reported_and_keeps_its_output() {
    let errors = Rc::new(RefCell::new(Vec::new()));
    let sink = errors.clone();

    let counter = |fail: bool| {
        component("Counter", move |props| {
            if fail {
                return Err(DescriptionError::component("Counter", "no count"));
            }
            Ok(text(props.number_or("count", 0.0)).into())
        })
        .prop("count", 1)
    };

    let mut root = RootConfig::new()
        .on_error(move |error| sink.borrow_mut().push(error.clone()))
        .render(counter(false));
    let node = root.children()[0];

    root.update(counter(true));
    assert_eq!(
        errors.borrow().as_slice(),
        [DescriptionError::component("Counter", "no count")]
    );
    assert_eq!(root.children(), [node]);
    let leaf = root.graph().children(node)[0];
    assert_eq!(root.graph().text(leaf).map(|l| l.text()), Some("1"));
}

#[test]
fn unmount_releases_everything() {
    let mut root = render(column(&[1, 2]));
    root.unmount();
    assert!(root.is_unmounted());
    assert!(root.children().is_empty());
    assert!(root.graph().is_empty());

    root.update(column(&[1]));
    assert!(root.children().is_empty());
}
