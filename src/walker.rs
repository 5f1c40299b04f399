//! Depth-first draw pass over a committed node graph.
//!
//! For every node the walker:
//!
//! 1. saves the drawing state if the node sets `restore: true`,
//! 2. looks up the node's renderer (unknown kinds follow the registry's
//!    [`UnknownKindPolicy`]),
//! 3. runs the before-children procedure, the children in order unless the
//!    renderer handles them itself, then the after-children procedure,
//! 4. unwinds the state stack back to where it was before the node whenever
//!    it saved, or when drawing the node failed.
//!
//! A failing procedure (an `Err` or a panic) is logged and ends that node's
//! subtree for this pass. Siblings and ancestors still draw.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::canvas::Canvas;
use crate::color::Color;
use crate::error::{panic_message, DrawError, SurfaceError};
use crate::graph::{NodeGraph, NodeId, RenderedNode};
use crate::renderers::{DrawContext, RendererRegistry, UnknownKindPolicy};
use crate::stats;

/// Device pixel size of a `width` x `height` logical surface.
pub(crate) fn device_size(
    width: f32,
    height: f32,
    pixel_ratio: f32,
) -> Result<(u32, u32), SurfaceError> {
    let device_width = (width * pixel_ratio).round();
    let device_height = (height * pixel_ratio).round();
    let valid = |v: f32| v.is_finite() && v >= 1.0 && v <= u32::MAX as f32;
    if !valid(device_width) || !valid(device_height) {
        return Err(SurfaceError::Empty {
            width,
            height,
            pixel_ratio,
        });
    }
    Ok((device_width as u32, device_height as u32))
}

/// Paint `children` onto `canvas` in one full pass.
///
/// The canvas is resized (and so cleared) to the logical size times
/// `pixel_ratio`, filled with `background` if given, and scaled by the pixel
/// ratio once before any node draws.
#[allow(clippy::too_many_arguments)]
pub fn draw_to_canvas(
    canvas: &mut Canvas,
    width: f32,
    height: f32,
    pixel_ratio: f32,
    background: Option<Color>,
    children: &[NodeId],
    graph: &NodeGraph,
    registry: &RendererRegistry,
) -> Result<(), SurfaceError> {
    let (device_width, device_height) = device_size(width, height, pixel_ratio)?;
    canvas.resize(device_width, device_height)?;
    if let Some(background) = background {
        canvas.clear(background);
    }
    canvas.scale(pixel_ratio, pixel_ratio);

    let mut ctx = DrawContext {
        canvas,
        width,
        height,
        pixel_ratio,
        graph,
        registry,
    };
    ctx.draw_children(children);
    Ok(())
}

/// Draw one node and its subtree. Text leaves and stale ids draw nothing.
pub(crate) fn draw_node(ctx: &mut DrawContext<'_>, id: NodeId) {
    let graph = ctx.graph;
    let Some(node) = graph.node(id) else {
        return;
    };
    stats::record_node_visited();

    let depth = ctx.canvas.save_depth();
    let restore = node.props().restore();
    if restore {
        ctx.canvas.save();
    }

    let result = catch_unwind(AssertUnwindSafe(|| draw_contents(ctx, node)))
        .unwrap_or_else(|panic| {
            Err(DrawError::Custom(format!(
                "renderer panicked: {}",
                panic_message(panic.as_ref())
            )))
        });

    match result {
        Ok(()) if restore => ctx.canvas.restore_to_depth(depth),
        Ok(()) => {}
        Err(error) => {
            stats::record_draw_error();
            log::error!("failed to draw {} node: {error}", node.kind());
            ctx.canvas.restore_to_depth(depth);
        }
    }
}

fn draw_contents(ctx: &mut DrawContext<'_>, node: &RenderedNode) -> Result<(), DrawError> {
    let registry = ctx.registry;
    let Some(renderer) = registry.get(node.kind()) else {
        match registry.unknown_kind_policy() {
            UnknownKindPolicy::Skip => {
                log::trace!("no renderer for {}, skipping its subtree", node.kind());
            }
            UnknownKindPolicy::DrawChildren => ctx.draw_children(node.children()),
        }
        return Ok(());
    };

    renderer.draw_before(ctx, node)?;
    if !renderer.is_handling_children() {
        ctx.draw_children(node.children());
    }
    renderer.draw_after(ctx, node)
}
