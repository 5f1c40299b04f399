//! Text shaping and glyph rasterisation on top of cosmic-text.
//!
//! A single font system and glyph cache live in a thread local, shared by
//! every canvas on the thread. Loading the system font database is expensive
//! so it happens once, on first use.

use std::cell::RefCell;

use cosmic_text::{Attrs, Buffer, FontSystem, Metrics, Shaping, SwashCache};
use resvg::tiny_skia::{Pixmap, PremultipliedColorU8};

use super::font::Font;
use crate::color::Color;

/// Line height as a multiple of the font size.
const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Sizes cosmic-text can lay out. Anything else shapes to nothing.
fn is_drawable_size(size: f32) -> bool {
    size.is_finite() && size > 0.0
}

/// Measured extent of a single shaped string, in the units it was shaped at.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextMetrics {
    pub width: f32,
    pub height: f32,
    /// Distance from the top of the line box to the alphabetic baseline.
    pub ascent: f32,
}

/// Coloured glyph coverage for a shaped string.
///
/// `left`/`top` locate the pixmap relative to the top-left corner of the
/// line box.
pub(crate) struct GlyphMask {
    pub pixmap: Pixmap,
    pub left: i32,
    pub top: i32,
    pub metrics: TextMetrics,
}

struct TextRasterizer {
    font_system: FontSystem,
    swash_cache: SwashCache,
}

impl TextRasterizer {
    fn new() -> Self {
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
        }
    }

    fn shape(&mut self, text: &str, font: &Font, size: f32) -> Buffer {
        let metrics = Metrics::new(size, size * LINE_HEIGHT_FACTOR);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);

        buffer.set_size(&mut self.font_system, None, None);
        let attrs = Attrs::new()
            .family(font.family.to_cosmic())
            .weight(font.weight.to_cosmic())
            .style(font.style.to_cosmic());
        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(&mut self.font_system, true);
        buffer
    }

    fn metrics_of(buffer: &Buffer, size: f32) -> TextMetrics {
        let mut metrics = TextMetrics::default();
        for run in buffer.layout_runs() {
            if metrics.height == 0.0 {
                metrics.ascent = run.line_y - run.line_top;
            }
            metrics.width = metrics.width.max(run.line_w);
            metrics.height += run.line_height;
        }

        if metrics.height == 0.0 {
            metrics.height = size * LINE_HEIGHT_FACTOR;
            metrics.ascent = size;
        }
        metrics
    }

    fn measure(&mut self, text: &str, font: &Font) -> TextMetrics {
        if !is_drawable_size(font.size) {
            return TextMetrics::default();
        }
        let buffer = self.shape(text, font, font.size);
        Self::metrics_of(&buffer, font.size)
    }

    fn rasterize(&mut self, text: &str, font: &Font, scale: f32, color: Color) -> Option<GlyphMask> {
        let size = font.size * scale;
        if !is_drawable_size(size) {
            return None;
        }
        let buffer = self.shape(text, font, size);
        let metrics = Self::metrics_of(&buffer, size);

        let mut spans: Vec<(i32, i32, u32, u32, u8)> = Vec::new();
        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            cosmic_text::Color::rgba(255, 255, 255, 255),
            |x, y, w, h, coverage| {
                if coverage.a() > 0 && w > 0 && h > 0 {
                    spans.push((x, y, w, h, coverage.a()));
                }
            },
        );

        let left = spans.iter().map(|s| s.0).min()?;
        let top = spans.iter().map(|s| s.1).min()?;
        let right = spans.iter().map(|s| s.0 + s.2 as i32).max()?;
        let bottom = spans.iter().map(|s| s.1 + s.3 as i32).max()?;

        let width = (right - left) as u32;
        let height = (bottom - top) as u32;
        let mut pixmap = Pixmap::new(width, height)?;

        let [r, g, b, a] = color.to_rgba8();
        let stride = width as usize;
        let pixels = pixmap.pixels_mut();
        for (x, y, w, h, coverage) in spans {
            let alpha = (coverage as u32 * a as u32 / 255) as u8;
            let premul = |c: u8| (c as u32 * alpha as u32 / 255) as u8;
            let Some(px) = PremultipliedColorU8::from_rgba(premul(r), premul(g), premul(b), alpha)
            else {
                continue;
            };

            for row in 0..h as i32 {
                for col in 0..w as i32 {
                    let idx = (y + row - top) as usize * stride + (x + col - left) as usize;
                    if pixels[idx].alpha() < alpha {
                        pixels[idx] = px;
                    }
                }
            }
        }

        Some(GlyphMask {
            pixmap,
            left,
            top,
            metrics,
        })
    }
}

thread_local! {
    static RASTERIZER: RefCell<TextRasterizer> = RefCell::new(TextRasterizer::new());
}

/// Measure `text` in `font`, in logical units.
pub fn measure_text(text: &str, font: &Font) -> TextMetrics {
    RASTERIZER.with_borrow_mut(|r| r.measure(text, font))
}

/// Rasterise `text` at `scale` device pixels per logical unit.
///
/// Returns `None` for text with no visible glyphs.
pub(crate) fn rasterize_text(
    text: &str,
    font: &Font,
    scale: f32,
    color: Color,
) -> Option<GlyphMask> {
    RASTERIZER.with_borrow_mut(|r| r.rasterize(text, font, scale, color))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::font::FontFamily;

    #[test]
    fn test_empty_text_has_line_height() {
        let m = measure_text("", &Font::new(FontFamily::SansSerif, 10.0));
        assert_eq!(m.width, 0.0);
        assert!((m.height - 12.0).abs() < 0.01);
    }

    #[test]
    fn test_whitespace_rasterizes_to_nothing() {
        let font = Font::new(FontFamily::SansSerif, 12.0);
        assert!(rasterize_text("   ", &font, 1.0, Color::BLACK).is_none());
    }

    #[test]
    fn test_zero_or_negative_size_shapes_nothing() {
        for size in [0.0, -4.0, f32::NAN, f32::INFINITY] {
            let font = Font::new(FontFamily::SansSerif, size);
            assert_eq!(measure_text("hi", &font), TextMetrics::default());
            assert!(rasterize_text("hi", &font, 1.0, Color::BLACK).is_none());
        }
        let font = Font::new(FontFamily::SansSerif, 12.0);
        assert!(rasterize_text("hi", &font, 0.0, Color::BLACK).is_none());
    }
}
