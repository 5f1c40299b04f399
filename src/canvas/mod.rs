//! Immediate-mode 2D drawing context over a CPU pixel buffer.
//!
//! [`Canvas`] follows the familiar canvas 2D model: a current drawing state
//! (transform, global alpha, fill and stroke styles, line width, font and
//! text alignment) that can be pushed with [`Canvas::save`] and popped with
//! [`Canvas::restore`], a current path built from `begin_path`/`move_to`/
//! `line_to`/`rect`, and direct rectangle, text and image operations.
//!
//! Path points are transformed when they are added, so changing the
//! transform between `line_to` and `stroke` does not move earlier points.

mod font;
mod image;
mod text;

pub use font::{Font, FontFamily, FontStyle, FontVariant, FontWeight, TextAlign, TextBaseline};
pub use image::ImageData;
pub use text::{measure_text, TextMetrics};

use std::io::Cursor;

use resvg::tiny_skia::{
    BlendMode, FillRule, FilterQuality, Paint, PathBuilder, Pixmap, PixmapPaint, Point, Rect,
    Stroke, Transform,
};

use crate::color::Color;
use crate::error::{ImageError, SurfaceError};

/// The pushable part of a canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawState {
    pub transform: Transform,
    pub global_alpha: f32,
    pub fill_style: Color,
    pub stroke_style: Color,
    pub line_width: f32,
    pub font: Font,
    pub text_align: TextAlign,
    pub text_baseline: TextBaseline,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Transform::identity(),
            global_alpha: 1.0,
            fill_style: Color::BLACK,
            stroke_style: Color::BLACK,
            line_width: 1.0,
            font: Font::default(),
            text_align: TextAlign::default(),
            text_baseline: TextBaseline::default(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    Close,
}

pub struct Canvas {
    pixmap: Pixmap,
    state: DrawState,
    stack: Vec<DrawState>,
    path: Vec<PathSegment>,
    saves: u64,
    restores: u64,
}

impl Canvas {
    /// Create a transparent canvas of `width` x `height` device pixels.
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        let pixmap = Pixmap::new(width, height).ok_or(SurfaceError::Allocation { width, height })?;
        Ok(Self {
            pixmap,
            state: DrawState::default(),
            stack: Vec::new(),
            path: Vec::new(),
            saves: 0,
            restores: 0,
        })
    }

    /// Resize the backing store. Like assigning a canvas element's width,
    /// this clears the pixels and resets the drawing state, the state stack
    /// and the current path, even when the size is unchanged.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        if width == self.width() && height == self.height() {
            self.pixmap.fill(resvg::tiny_skia::Color::TRANSPARENT);
        } else {
            self.pixmap =
                Pixmap::new(width, height).ok_or(SurfaceError::Allocation { width, height })?;
        }
        self.state = DrawState::default();
        self.stack.clear();
        self.path.clear();
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn state(&self) -> &DrawState {
        &self.state
    }

    // -- State stack --

    pub fn save(&mut self) {
        self.stack.push(self.state.clone());
        self.saves += 1;
    }

    /// Pop the most recently saved state. Does nothing when nothing is saved.
    pub fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
            self.restores += 1;
        }
    }

    /// Number of states currently on the stack.
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    /// Restore until at most `depth` states remain on the stack.
    pub fn restore_to_depth(&mut self, depth: usize) {
        while self.stack.len() > depth {
            self.restore();
        }
    }

    /// Total saves issued since creation.
    pub fn save_count(&self) -> u64 {
        self.saves
    }

    /// Total restores that popped a state since creation.
    pub fn restore_count(&self) -> u64 {
        self.restores
    }

    // -- Transform --

    pub fn transform(&self) -> Transform {
        self.state.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.state.transform = transform;
    }

    pub fn translate(&mut self, x: f32, y: f32) {
        self.state.transform = self.state.transform.pre_translate(x, y);
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.state.transform = self.state.transform.pre_scale(x, y);
    }

    /// Rotate clockwise by `radians`.
    pub fn rotate(&mut self, radians: f32) {
        self.state.transform = self
            .state
            .transform
            .pre_concat(Transform::from_rotate(radians.to_degrees()));
    }

    /// Device pixels per logical unit under the current transform.
    fn device_scale(&self) -> f32 {
        let ts = self.state.transform;
        (ts.sx * ts.sy - ts.kx * ts.ky).abs().sqrt().max(f32::EPSILON)
    }

    // -- Style --

    pub fn set_global_alpha(&mut self, alpha: f32) {
        if alpha.is_finite() && (0.0..=1.0).contains(&alpha) {
            self.state.global_alpha = alpha;
        }
    }

    pub fn set_fill_style(&mut self, color: Color) {
        self.state.fill_style = color;
    }

    pub fn set_stroke_style(&mut self, color: Color) {
        self.state.stroke_style = color;
    }

    pub fn set_line_width(&mut self, width: f32) {
        if width.is_finite() && width > 0.0 {
            self.state.line_width = width;
        }
    }

    pub fn set_font(&mut self, font: Font) {
        self.state.font = font;
    }

    pub fn set_text_align(&mut self, align: TextAlign) {
        self.state.text_align = align;
    }

    pub fn set_text_baseline(&mut self, baseline: TextBaseline) {
        self.state.text_baseline = baseline;
    }

    fn paint(&self, color: Color) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(color.with_opacity(self.state.global_alpha).to_skia());
        paint.anti_alias = true;
        paint
    }

    // -- Pixels --

    /// Fill every device pixel with `color`, ignoring transform and alpha.
    pub fn clear(&mut self, color: Color) {
        self.pixmap.fill(color.to_skia());
    }

    /// Read back a device pixel as straight-alpha colour.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        let c = self.pixmap.pixel(x, y)?.demultiply();
        Some(Color::rgba8(c.red(), c.green(), c.blue(), c.alpha()))
    }

    /// Encode the current pixels as PNG.
    pub fn encode_png(&self) -> Result<Vec<u8>, ImageError> {
        let mut rgba = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        let img = ::image::RgbaImage::from_raw(self.width(), self.height(), rgba).ok_or(
            ImageError::InvalidSize {
                width: self.width(),
                height: self.height(),
            },
        )?;

        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ::image::ImageFormat::Png)?;
        Ok(out.into_inner())
    }

    // -- Rectangles --

    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let Some(rect) = normalized_rect(x, y, width, height) else {
            return;
        };
        let paint = self.paint(self.state.fill_style);
        self.pixmap
            .fill_rect(rect, &paint, self.state.transform, None);
    }

    pub fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let Some(rect) = normalized_rect(x, y, width, height) else {
            return;
        };
        let path = PathBuilder::from_rect(rect);
        let paint = self.paint(self.state.stroke_style);
        let stroke = Stroke {
            width: self.state.line_width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, self.state.transform, None);
    }

    // -- Paths --

    pub fn begin_path(&mut self) {
        self.path.clear();
    }

    fn map(&self, x: f32, y: f32) -> Point {
        let mut p = Point::from_xy(x, y);
        self.state.transform.map_point(&mut p);
        p
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        let p = self.map(x, y);
        self.path.push(PathSegment::MoveTo(p));
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        let p = self.map(x, y);
        if self.path.is_empty() {
            self.path.push(PathSegment::MoveTo(p));
        } else {
            self.path.push(PathSegment::LineTo(p));
        }
    }

    pub fn close_path(&mut self) {
        if !self.path.is_empty() {
            self.path.push(PathSegment::Close);
        }
    }

    /// Add a closed rectangular subpath to the current path.
    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.move_to(x, y);
        self.line_to(x + width, y);
        self.line_to(x + width, y + height);
        self.line_to(x, y + height);
        self.close_path();
    }

    /// Number of segments in the current path.
    pub fn path_len(&self) -> usize {
        self.path.len()
    }

    fn build_path(&self) -> Option<resvg::tiny_skia::Path> {
        let mut pb = PathBuilder::new();
        for segment in &self.path {
            match *segment {
                PathSegment::MoveTo(p) => pb.move_to(p.x, p.y),
                PathSegment::LineTo(p) => pb.line_to(p.x, p.y),
                PathSegment::Close => pb.close(),
            }
        }
        pb.finish()
    }

    /// Stroke the current path with the stroke style and line width.
    pub fn stroke(&mut self) {
        let Some(path) = self.build_path() else {
            return;
        };
        let paint = self.paint(self.state.stroke_style);
        let stroke = Stroke {
            width: self.state.line_width * self.device_scale(),
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    /// Fill the current path with the fill style (non-zero winding).
    pub fn fill(&mut self) {
        let Some(path) = self.build_path() else {
            return;
        };
        let paint = self.paint(self.state.fill_style);
        self.pixmap
            .fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }

    // -- Text --

    pub fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        self.draw_text(text, x, y, self.state.fill_style);
    }

    /// Stroked text is drawn as glyph coverage in the stroke style.
    pub fn stroke_text(&mut self, text: &str, x: f32, y: f32) {
        self.draw_text(text, x, y, self.state.stroke_style);
    }

    pub fn measure_text(&self, text: &str) -> TextMetrics {
        measure_text(text, &self.state.font)
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, color: Color) {
        if text.is_empty() || color.is_transparent() {
            return;
        }
        let scale = self.device_scale();
        let Some(mask) = text::rasterize_text(text, &self.state.font, scale, color) else {
            return;
        };

        let metrics = mask.metrics;
        let dx = -self.state.text_align.offset_factor() * metrics.width;
        let dy = match self.state.text_baseline {
            TextBaseline::Top => 0.0,
            TextBaseline::Hanging => -metrics.ascent * 0.2,
            TextBaseline::Middle => -metrics.height / 2.0,
            TextBaseline::Alphabetic => -metrics.ascent,
            TextBaseline::Ideographic | TextBaseline::Bottom => -metrics.height,
        };

        let transform = self
            .state
            .transform
            .pre_translate(x, y)
            .pre_scale(1.0 / scale, 1.0 / scale)
            .pre_translate(dx, dy);
        let paint = PixmapPaint {
            opacity: self.state.global_alpha,
            blend_mode: BlendMode::SourceOver,
            quality: quality_for(transform),
        };
        self.pixmap.draw_pixmap(
            mask.left,
            mask.top,
            mask.pixmap.as_ref(),
            &paint,
            transform,
            None,
        );
    }

    // -- Images --

    pub fn draw_image(&mut self, image: &ImageData, x: f32, y: f32, width: f32, height: f32) {
        self.draw_pixmap(image.pixmap(), x, y, width, height);
    }

    /// Draw `source` scaled into the destination rectangle.
    pub fn draw_pixmap(&mut self, source: &Pixmap, x: f32, y: f32, width: f32, height: f32) {
        if width == 0.0 || height == 0.0 || !width.is_finite() || !height.is_finite() {
            return;
        }
        let transform = self.state.transform.pre_translate(x, y).pre_scale(
            width / source.width() as f32,
            height / source.height() as f32,
        );
        let paint = PixmapPaint {
            opacity: self.state.global_alpha,
            blend_mode: BlendMode::SourceOver,
            quality: quality_for(transform),
        };
        self.pixmap
            .draw_pixmap(0, 0, source.as_ref(), &paint, transform, None);
    }

    /// Draw another canvas's pixels scaled into the destination rectangle.
    pub fn draw_canvas(&mut self, source: &Canvas, x: f32, y: f32, width: f32, height: f32) {
        self.draw_pixmap(&source.pixmap, x, y, width, height);
    }
}

fn normalized_rect(x: f32, y: f32, width: f32, height: f32) -> Option<Rect> {
    let (x, width) = if width < 0.0 { (x + width, -width) } else { (x, width) };
    let (y, height) = if height < 0.0 { (y + height, -height) } else { (y, height) };
    Rect::from_xywh(x, y, width, height)
}

/// Nearest sampling for pixel-aligned unscaled blits, bilinear otherwise.
fn quality_for(ts: Transform) -> FilterQuality {
    let unscaled = ts.sx == 1.0 && ts.sy == 1.0 && ts.kx == 0.0 && ts.ky == 0.0;
    if unscaled && ts.tx.fract() == 0.0 && ts.ty.fract() == 0.0 {
        FilterQuality::Nearest
    } else {
        FilterQuality::Bilinear
    }
}
