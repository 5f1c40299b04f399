//! Translate, scale, rotate and opacity renderers.
//!
//! Each changes the current drawing state. With children, the change is
//! scoped to them by saving before and restoring after, unless the node sets
//! `restore: false`. Without children it carries over to later siblings.

use super::{number_or, DrawContext, Renderer};
use crate::error::DrawError;
use crate::graph::RenderedNode;

fn scopes_children(node: &RenderedNode) -> bool {
    node.has_children() && node.props().bool("restore") != Some(false)
}

fn restore_after(ctx: &mut DrawContext<'_>, node: &RenderedNode) -> Result<(), DrawError> {
    if scopes_children(node) {
        ctx.canvas.restore();
    }
    Ok(())
}

fn scoped<F>(apply: F) -> Renderer
where
    F: Fn(&mut DrawContext<'_>, &RenderedNode) -> Result<(), DrawError> + 'static,
{
    Renderer::new()
        .before(move |ctx, node| {
            if scopes_children(node) {
                ctx.canvas.save();
            }
            apply(ctx, node)
        })
        .after(restore_after)
}

pub(super) fn translate() -> Renderer {
    scoped(|ctx, node| {
        let x = number_or(node, "x", 0.0)?;
        let y = number_or(node, "y", 0.0)?;
        ctx.canvas.translate(x, y);
        Ok(())
    })
}

pub(super) fn scale() -> Renderer {
    scoped(|ctx, node| {
        let x = number_or(node, "x", 1.0)?;
        let y = number_or(node, "y", 1.0)?;
        ctx.canvas.scale(x, y);
        Ok(())
    })
}

pub(super) fn rotate() -> Renderer {
    scoped(|ctx, node| {
        let radians = number_or(node, "radians", 0.0)?;
        ctx.canvas.rotate(radians);
        Ok(())
    })
}

pub(super) fn opacity() -> Renderer {
    scoped(|ctx, node| {
        let opacity = number_or(node, "opacity", 1.0)?;
        ctx.canvas.set_global_alpha(opacity);
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::graph::NodeGraph;
    use crate::kind::NodeKind;
    use crate::props::Props;
    use crate::renderers::RendererRegistry;

    fn with_ctx(graph: &NodeGraph, f: impl FnOnce(&mut DrawContext<'_>)) -> Canvas {
        let mut canvas = Canvas::new(10, 10).unwrap();
        let registry = RendererRegistry::empty();
        f(&mut DrawContext {
            canvas: &mut canvas,
            width: 10.0,
            height: 10.0,
            pixel_ratio: 1.0,
            graph,
            registry: &registry,
        });
        canvas
    }

    #[test]
    fn test_translate_without_children_carries_over() {
        let mut graph = NodeGraph::new();
        let id = graph.create_node(NodeKind::Translate, Props::new().with("x", 4).with("y", 2));
        let node = graph.node(id).unwrap();

        let canvas = with_ctx(&graph, |ctx| {
            let r = translate();
            r.draw_before(ctx, node).unwrap();
            r.draw_after(ctx, node).unwrap();
        });
        assert_eq!((canvas.transform().tx, canvas.transform().ty), (4.0, 2.0));
        assert_eq!(canvas.save_count(), 0);
    }

    #[test]
    fn test_scale_with_children_is_scoped() {
        let mut graph = NodeGraph::new();
        let id = graph.create_node(NodeKind::Scale, Props::new().with("x", 2));
        let child = graph.create_node(NodeKind::Rectangle, Props::new());
        graph.append_child(id, child);
        let node = graph.node(id).unwrap();

        let canvas = with_ctx(&graph, |ctx| {
            let r = scale();
            r.draw_before(ctx, node).unwrap();
            assert_eq!(ctx.canvas.transform().sx, 2.0);
            assert_eq!(ctx.canvas.transform().sy, 1.0);
            r.draw_after(ctx, node).unwrap();
        });
        assert_eq!(canvas.transform().sx, 1.0);
        assert_eq!((canvas.save_count(), canvas.restore_count()), (1, 1));
    }

    #[test]
    fn test_restore_false_leaks_state_to_siblings() {
        let mut graph = NodeGraph::new();
        let id = graph.create_node(
            NodeKind::Opacity,
            Props::new().with("opacity", 0.25).with("restore", false),
        );
        let child = graph.create_node(NodeKind::Rectangle, Props::new());
        graph.append_child(id, child);
        let node = graph.node(id).unwrap();

        let canvas = with_ctx(&graph, |ctx| {
            let r = opacity();
            r.draw_before(ctx, node).unwrap();
            r.draw_after(ctx, node).unwrap();
        });
        assert_eq!(canvas.state().global_alpha, 0.25);
        assert_eq!(canvas.save_count(), 0);
    }

    #[test]
    fn test_rotate_defaults_to_identity() {
        let mut graph = NodeGraph::new();
        let id = graph.create_node(NodeKind::Rotate, Props::new());
        let node = graph.node(id).unwrap();
        let canvas = with_ctx(&graph, |ctx| rotate().draw_before(ctx, node).unwrap());
        assert!(canvas.transform().is_identity());
    }
}
