//! The `BufferedSurface` renderer.
//!
//! Children are drawn onto the node's private canvas, in the node's own
//! coordinate space and pixel ratio, and the result is blitted into the
//! parent as one image. The private canvas is only redrawn when the node is
//! dirty or its backing size changed, so unchanged expensive content such as
//! large amounts of text costs a single image draw per pass.

use super::{color, number, number_or, DrawContext, Renderer};
use crate::canvas::Canvas;
use crate::error::DrawError;
use crate::graph::RenderedNode;
use crate::{stats, walker};

pub(super) fn buffered_surface() -> Renderer {
    Renderer::new()
        .before(draw_buffered)
        .handles_children(true)
}

fn draw_buffered(ctx: &mut DrawContext<'_>, node: &RenderedNode) -> Result<(), DrawError> {
    let width = number_or(node, "width", ctx.width)?;
    let height = number_or(node, "height", ctx.height)?;
    let pixel_ratio = number(node, "pixelRatio")?.unwrap_or(ctx.pixel_ratio);
    let background = color(node, "backgroundColor")?;
    let draw_x = number_or(node, "drawX", 0.0)?;
    let draw_y = number_or(node, "drawY", 0.0)?;
    let draw_width = number_or(node, "drawWidth", width)?;
    let draw_height = number_or(node, "drawHeight", height)?;
    let (device_width, device_height) = walker::device_size(width, height, pixel_ratio)?;

    let mut buffer = node.buffer().borrow_mut();
    let resized = match buffer.as_ref() {
        Some(canvas) => canvas.width() != device_width || canvas.height() != device_height,
        None => true,
    };

    if node.is_dirty() || resized {
        if buffer.is_none() {
            *buffer = Some(Canvas::new(device_width, device_height)?);
        }
        if let Some(canvas) = buffer.as_mut() {
            let merged = node
                .props()
                .renderers("renderers")
                .map(|overrides| ctx.registry.merged(overrides));
            let registry = merged.as_ref().unwrap_or(ctx.registry);
            walker::draw_to_canvas(
                canvas,
                width,
                height,
                pixel_ratio,
                background,
                node.children(),
                ctx.graph,
                registry,
            )?;
        }
        node.clear_dirty();
        stats::record_buffered_rerender();
        log::debug!(
            "re-rendered buffered surface {device_width}x{device_height} ({} children)",
            node.children().len()
        );
    } else {
        stats::record_buffered_cache_hit();
        log::trace!("buffered surface unchanged, reusing cached pixels");
    }

    if let Some(canvas) = buffer.as_ref() {
        ctx.canvas
            .draw_canvas(canvas, draw_x, draw_y, draw_width, draw_height);
    }
    Ok(())
}
