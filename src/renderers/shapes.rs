//! Rectangle, line, text and image renderers.

use super::{color, invalid, number, number_or, string, DrawContext, Renderer};
use crate::canvas::{Font, FontFamily, FontStyle, FontVariant, FontWeight, TextAlign, TextBaseline};
use crate::error::DrawError;
use crate::graph::RenderedNode;
use crate::props::PropValue;

const DEFAULT_FONT_SIZE: f32 = 12.0;

pub(super) fn rectangle() -> Renderer {
    Renderer::new().before(draw_rectangle)
}

pub(super) fn line() -> Renderer {
    Renderer::new().before(draw_line)
}

pub(super) fn text() -> Renderer {
    Renderer::new().before(draw_text)
}

pub(super) fn image() -> Renderer {
    Renderer::new().before(draw_image)
}

/// Fill and/or stroke an axis-aligned rectangle. With neither style set the
/// rectangle is only added to the current path.
fn draw_rectangle(ctx: &mut DrawContext<'_>, node: &RenderedNode) -> Result<(), DrawError> {
    let x = number_or(node, "x", 0.0)?;
    let y = number_or(node, "y", 0.0)?;
    let width = number_or(node, "width", 0.0)?;
    let height = number_or(node, "height", 0.0)?;
    let fill = color(node, "fill")?;
    let stroke = color(node, "stroke")?;
    let stroke_width = number_or(node, "strokeWidth", 1.0)?;

    if fill.is_none() && stroke.is_none() {
        ctx.canvas.rect(x, y, width, height);
    }

    if let Some(fill) = fill {
        ctx.canvas.set_fill_style(fill);
        ctx.canvas.fill_rect(x, y, width, height);
    }

    if let Some(stroke) = stroke {
        if stroke_width != 0.0 {
            ctx.canvas.set_stroke_style(stroke);
            ctx.canvas.set_line_width(stroke_width);
            ctx.canvas.stroke_rect(x, y, width, height);
        }
    }
    Ok(())
}

/// A segment from `(startX, startY)` to `(endX, endY)`. `continuePath` keeps
/// appending to the current path so runs of segments can share one stroke.
fn draw_line(ctx: &mut DrawContext<'_>, node: &RenderedNode) -> Result<(), DrawError> {
    let start_x = number_or(node, "startX", 0.0)?;
    let start_y = number_or(node, "startY", 0.0)?;
    let end_x = number_or(node, "endX", 0.0)?;
    let end_y = number_or(node, "endY", 0.0)?;
    let stroke = color(node, "stroke")?;
    let stroke_width = number_or(node, "strokeWidth", 1.0)?;

    if node.props().bool("continuePath") != Some(true) {
        ctx.canvas.begin_path();
    }
    ctx.canvas.move_to(start_x, start_y);
    ctx.canvas.line_to(end_x, end_y);

    if let Some(stroke) = stroke {
        if stroke_width != 0.0 {
            ctx.canvas.set_stroke_style(stroke);
            ctx.canvas.set_line_width(stroke_width);
            ctx.canvas.stroke();
        }
    }
    Ok(())
}

fn font_of(node: &RenderedNode) -> Result<Font, DrawError> {
    let family = string(node, "fontFamily")?
        .map(FontFamily::parse)
        .unwrap_or_default();
    let size = number_or(node, "fontSize", DEFAULT_FONT_SIZE)?;

    let style = match string(node, "fontStyle")? {
        Some(value) => FontStyle::parse(value).ok_or_else(|| invalid(node, "fontStyle", "font style"))?,
        None => FontStyle::Normal,
    };
    let variant = match string(node, "fontVariant")? {
        Some(value) => {
            FontVariant::parse(value).ok_or_else(|| invalid(node, "fontVariant", "font variant"))?
        }
        None => FontVariant::Normal,
    };
    let weight = match node.props().get("fontWeight") {
        None => FontWeight::NORMAL,
        Some(PropValue::Number(n)) if (1.0..=1000.0).contains(n) => FontWeight(*n as u16),
        Some(PropValue::Str(s)) => {
            FontWeight::parse(s).ok_or_else(|| invalid(node, "fontWeight", "font weight"))?
        }
        Some(_) => return Err(invalid(node, "fontWeight", "font weight")),
    };

    Ok(Font {
        family,
        size,
        style,
        variant,
        weight,
    })
}

/// Fill and/or stroke the node's literal text at `(x, y)`.
fn draw_text(ctx: &mut DrawContext<'_>, node: &RenderedNode) -> Result<(), DrawError> {
    let x = number_or(node, "x", 0.0)?;
    let y = number_or(node, "y", 0.0)?;
    let fill = color(node, "fill")?;
    let stroke = color(node, "stroke")?;
    let stroke_width = number_or(node, "strokeWidth", 1.0)?;

    let align = match string(node, "textAlign")? {
        Some(value) => TextAlign::parse(value).ok_or_else(|| invalid(node, "textAlign", "text alignment"))?,
        None => TextAlign::Left,
    };
    let baseline = match string(node, "verticalAlign")? {
        Some(value) => {
            TextBaseline::parse(value).ok_or_else(|| invalid(node, "verticalAlign", "text baseline"))?
        }
        None => TextBaseline::Top,
    };

    ctx.canvas.set_text_baseline(baseline);
    ctx.canvas.set_text_align(align);
    ctx.canvas.set_font(font_of(node)?);

    let content = ctx.stringify_children(node);

    if let Some(fill) = fill {
        ctx.canvas.set_fill_style(fill);
        ctx.canvas.fill_text(&content, x, y);
    }

    if let Some(stroke) = stroke {
        if stroke_width != 0.0 {
            ctx.canvas.set_stroke_style(stroke);
            ctx.canvas.set_line_width(stroke_width);
            ctx.canvas.stroke_text(&content, x, y);
        }
    }
    Ok(())
}

/// Draw the `src` image into `(x, y, width, height)`. Width and height
/// default to the image's own size.
fn draw_image(ctx: &mut DrawContext<'_>, node: &RenderedNode) -> Result<(), DrawError> {
    let image = match node.props().get("src") {
        Some(PropValue::Image(image)) => image,
        Some(_) => return Err(invalid(node, "src", "image")),
        None => {
            return Err(DrawError::MissingProp {
                kind: node.kind().clone(),
                prop: "src",
            })
        }
    };
    let x = number_or(node, "x", 0.0)?;
    let y = number_or(node, "y", 0.0)?;
    let width = number(node, "width")?.unwrap_or(image.width() as f32);
    let height = number(node, "height")?.unwrap_or(image.height() as f32);

    ctx.canvas.draw_image(image, x, y, width, height);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::color::Color;
    use crate::graph::{NodeGraph, NodeId};
    use crate::kind::NodeKind;
    use crate::props::Props;
    use crate::renderers::RendererRegistry;

    fn run(
        graph: &NodeGraph,
        id: NodeId,
        f: fn(&mut DrawContext<'_>, &RenderedNode) -> Result<(), DrawError>,
    ) -> (Canvas, Result<(), DrawError>) {
        let mut canvas = Canvas::new(20, 20).unwrap();
        let registry = RendererRegistry::defaults();
        let result = {
            let mut ctx = DrawContext {
                canvas: &mut canvas,
                width: 20.0,
                height: 20.0,
                pixel_ratio: 1.0,
                graph,
                registry: &registry,
            };
            f(&mut ctx, graph.node(id).unwrap())
        };
        (canvas, result)
    }

    #[test]
    fn test_rectangle_fill_and_stroke() {
        let mut graph = NodeGraph::new();
        let id = graph.create_node(
            NodeKind::Rectangle,
            Props::new()
                .with("x", 2)
                .with("y", 2)
                .with("width", 10)
                .with("height", 10)
                .with("fill", "red")
                .with("stroke", "#0000ff")
                .with("strokeWidth", 2),
        );
        let (canvas, result) = run(&graph, id, draw_rectangle);
        result.unwrap();
        assert_eq!(canvas.pixel(7, 7), Some(Color::RED));
        assert_eq!(canvas.pixel(2, 7), Some(Color::BLUE));
        assert_eq!(canvas.pixel(16, 16), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_rectangle_without_style_only_adds_path() {
        let mut graph = NodeGraph::new();
        let id = graph.create_node(
            NodeKind::Rectangle,
            Props::new().with("width", 10).with("height", 10),
        );
        let (canvas, result) = run(&graph, id, draw_rectangle);
        result.unwrap();
        assert_eq!(canvas.pixel(5, 5), Some(Color::TRANSPARENT));
        assert_eq!(canvas.path_len(), 5);
    }

    #[test]
    fn test_rectangle_bad_colour() {
        let mut graph = NodeGraph::new();
        let id = graph.create_node(NodeKind::Rectangle, Props::new().with("fill", "not-a-colour"));
        let (_, result) = run(&graph, id, draw_rectangle);
        assert!(matches!(
            result,
            Err(DrawError::InvalidProp { prop: "fill", .. })
        ));
    }

    #[test]
    fn test_rectangle_non_colour_fill() {
        let mut graph = NodeGraph::new();
        let id = graph.create_node(
            NodeKind::Rectangle,
            Props::new().with("width", 10).with("height", 10).with("fill", 5),
        );
        let (canvas, result) = run(&graph, id, draw_rectangle);
        assert!(matches!(
            result,
            Err(DrawError::InvalidProp { prop: "fill", expected: "color", .. })
        ));
        assert_eq!(canvas.pixel(5, 5), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_line_strokes_segment() {
        let mut graph = NodeGraph::new();
        let id = graph.create_node(
            NodeKind::Line,
            Props::new()
                .with("startX", 0)
                .with("startY", 10)
                .with("endX", 20)
                .with("endY", 10)
                .with("stroke", "black")
                .with("strokeWidth", 4),
        );
        let (canvas, result) = run(&graph, id, draw_line);
        result.unwrap();
        assert_eq!(canvas.pixel(10, 10), Some(Color::BLACK));
        assert_eq!(canvas.pixel(10, 2), Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_line_continue_path_keeps_segments() {
        let mut graph = NodeGraph::new();
        let first = graph.create_node(NodeKind::Line, Props::new().with("endX", 5));
        let second = graph.create_node(
            NodeKind::Line,
            Props::new().with("endX", 9).with("continuePath", true),
        );

        let mut canvas = Canvas::new(20, 20).unwrap();
        let registry = RendererRegistry::defaults();
        let mut ctx = DrawContext {
            canvas: &mut canvas,
            width: 20.0,
            height: 20.0,
            pixel_ratio: 1.0,
            graph: &graph,
            registry: &registry,
        };
        draw_line(&mut ctx, graph.node(first).unwrap()).unwrap();
        draw_line(&mut ctx, graph.node(second).unwrap()).unwrap();
        assert_eq!(ctx.canvas.path_len(), 4);

        draw_line(&mut ctx, graph.node(first).unwrap()).unwrap();
        assert_eq!(ctx.canvas.path_len(), 2);
    }

    #[test]
    fn test_font_from_props() {
        let mut graph = NodeGraph::new();
        let id = graph.create_node(
            NodeKind::Text,
            Props::new()
                .with("fontFamily", "monospace")
                .with("fontSize", 20)
                .with("fontStyle", "italic")
                .with("fontVariant", "small-caps")
                .with("fontWeight", "bold"),
        );
        let font = font_of(graph.node(id).unwrap()).unwrap();
        assert_eq!(font.family, FontFamily::Monospace);
        assert_eq!(font.size, 20.0);
        assert_eq!(font.style, FontStyle::Italic);
        assert_eq!(font.variant, FontVariant::SmallCaps);
        assert_eq!(font.weight, FontWeight::BOLD);
    }

    #[test]
    fn test_font_defaults() {
        let mut graph = NodeGraph::new();
        let id = graph.create_node(NodeKind::Text, Props::new().with("fontWeight", 300));
        let font = font_of(graph.node(id).unwrap()).unwrap();
        assert_eq!(font.family, FontFamily::SansSerif);
        assert_eq!(font.size, DEFAULT_FONT_SIZE);
        assert_eq!(font.weight, FontWeight(300));
    }

    #[test]
    fn test_zero_font_size_draws_nothing() {
        let mut graph = NodeGraph::new();
        let id = graph.create_node(
            NodeKind::Text,
            Props::new().with("fontSize", 0).with("fill", "red"),
        );
        let leaf = graph.create_text("hi");
        graph.append_child(id, leaf);

        let (canvas, result) = run(&graph, id, draw_text);
        result.unwrap();
        assert_eq!(canvas.state().font.size, 0.0);
        assert_eq!(canvas.measure_text("hi").width, 0.0);
        assert!(canvas.pixmap().pixels().iter().all(|px| px.alpha() == 0));
    }

    #[test]
    fn test_text_sets_alignment_state() {
        let mut graph = NodeGraph::new();
        let id = graph.create_node(
            NodeKind::Text,
            Props::new()
                .with("textAlign", "center")
                .with("verticalAlign", "middle"),
        );
        let leaf = graph.create_text("hi");
        graph.append_child(id, leaf);

        let (canvas, result) = run(&graph, id, draw_text);
        result.unwrap();
        assert_eq!(canvas.state().text_align, TextAlign::Center);
        assert_eq!(canvas.state().text_baseline, TextBaseline::Middle);
        assert_eq!(canvas.state().font.size, DEFAULT_FONT_SIZE);
    }

    #[test]
    fn test_image_requires_src() {
        let mut graph = NodeGraph::new();
        let id = graph.create_node(NodeKind::Image, Props::new());
        let (_, result) = run(&graph, id, draw_image);
        assert!(matches!(
            result,
            Err(DrawError::MissingProp { prop: "src", .. })
        ));
    }

    #[test]
    fn test_image_defaults_to_natural_size() {
        let src = crate::canvas::ImageData::from_rgba8(2, 2, &[0u8, 0, 255, 255].repeat(4)).unwrap();
        let mut graph = NodeGraph::new();
        let id = graph.create_node(
            NodeKind::Image,
            Props::new().with("src", src).with("x", 3).with("y", 3),
        );
        let (canvas, result) = run(&graph, id, draw_image);
        result.unwrap();
        assert_eq!(canvas.pixel(4, 4), Some(Color::BLUE));
        assert_eq!(canvas.pixel(6, 6), Some(Color::TRANSPARENT));
    }
}
