//! Drawing surfaces.
//!
//! A [`CanvasSurface`] binds one root, one renderer registry and one canvas.
//! Its logical size and pixel ratio decide the size of the backing pixel
//! buffer; every [`CanvasSurface::draw`] repaints the whole committed graph.
//!
//! ```ignore
//! let mut surface = CanvasSurface::render(
//!     SurfaceConfig::new()
//!         .width(200.0)
//!         .height(200.0)
//!         .pixel_ratio(2.0)
//!         .background_color(Color::WHITE),
//!     rectangle().prop("width", 50).prop("height", 50).prop("fill", "red"),
//! )?;
//! surface.draw()?;
//! let png = surface.canvas().encode_png()?;
//! ```

use std::sync::atomic::{AtomicU64, Ordering};

use crate::canvas::Canvas;
use crate::color::Color;
use crate::element::Element;
use crate::error::SurfaceError;
use crate::renderers::RendererRegistry;
use crate::root::{self, RootHandle};
use crate::{stats, walker};

/// Unique identifier for each surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(u64);

impl SurfaceId {
    /// Create a new unique surface ID.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        SurfaceId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value (for debugging/logging).
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Size and appearance of a surface.
///
/// ```ignore
/// SurfaceConfig::new()
///     .width(300.0)
///     .height(200.0)
///     .pixel_ratio(2.0)
///     .background_color(Color::rgb(0.2, 0.2, 0.3))
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceConfig {
    /// Width of the surface in logical pixels.
    pub width: f32,
    /// Height of the surface in logical pixels.
    pub height: f32,
    /// Device pixels per logical pixel.
    pub pixel_ratio: f32,
    /// Filled over the whole surface before each pass. `None` leaves it
    /// transparent.
    pub background_color: Option<Color>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            width: 300.0,
            height: 150.0,
            pixel_ratio: 1.0,
            background_color: None,
        }
    }
}

impl SurfaceConfig {
    /// Create a new surface configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(mut self, width: f32) -> Self {
        self.width = width;
        self
    }

    pub fn height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    pub fn pixel_ratio(mut self, pixel_ratio: f32) -> Self {
        self.pixel_ratio = pixel_ratio;
        self
    }

    pub fn background_color(mut self, color: Color) -> Self {
        self.background_color = Some(color);
        self
    }

    /// Backing buffer size in device pixels.
    pub fn device_size(&self) -> Result<(u32, u32), SurfaceError> {
        walker::device_size(self.width, self.height, self.pixel_ratio)
    }
}

/// A root drawn onto its own canvas.
pub struct CanvasSurface {
    id: SurfaceId,
    config: SurfaceConfig,
    canvas: Canvas,
    root: RootHandle,
    registry: RendererRegistry,
}

impl CanvasSurface {
    /// Bind `root` to a new canvas sized by `config`, using the built-in
    /// renderers.
    pub fn new(config: SurfaceConfig, root: RootHandle) -> Result<Self, SurfaceError> {
        let (width, height) = config.device_size()?;
        let canvas = Canvas::new(width, height)?;
        let id = SurfaceId::next();
        log::debug!("created surface {} ({width}x{height} device pixels)", id.raw());
        Ok(Self {
            id,
            config,
            canvas,
            root,
            registry: RendererRegistry::defaults(),
        })
    }

    /// Commit `description` into a fresh root and bind it to a new surface.
    pub fn render(config: SurfaceConfig, description: impl Into<Element>) -> Result<Self, SurfaceError> {
        Self::new(config, root::render(description))
    }

    /// Replace the renderer registry used by [`CanvasSurface::draw`].
    pub fn with_registry(mut self, registry: RendererRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn set_registry(&mut self, registry: RendererRegistry) {
        self.registry = registry;
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn config(&self) -> &SurfaceConfig {
        &self.config
    }

    pub fn registry(&self) -> &RendererRegistry {
        &self.registry
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn root(&self) -> &RootHandle {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut RootHandle {
        &mut self.root
    }

    /// Reconcile `description` into the surface's root. Takes effect on the
    /// next [`CanvasSurface::draw`].
    pub fn update(&mut self, description: impl Into<Element>) {
        self.root.update(description);
    }

    /// Change the logical size. Rejected sizes leave the surface unchanged.
    pub fn resize(&mut self, width: f32, height: f32) -> Result<(), SurfaceError> {
        let config = self.config.clone().width(width).height(height);
        config.device_size()?;
        self.config = config;
        Ok(())
    }

    /// Change the pixel ratio. Rejected ratios leave the surface unchanged.
    pub fn set_pixel_ratio(&mut self, pixel_ratio: f32) -> Result<(), SurfaceError> {
        let config = self.config.clone().pixel_ratio(pixel_ratio);
        config.device_size()?;
        self.config = config;
        Ok(())
    }

    pub fn set_background_color(&mut self, color: Option<Color>) {
        self.config.background_color = color;
    }

    /// Repaint the whole committed graph.
    pub fn draw(&mut self) -> Result<(), SurfaceError> {
        walker::draw_to_canvas(
            &mut self.canvas,
            self.config.width,
            self.config.height,
            self.config.pixel_ratio,
            self.config.background_color,
            self.root.children(),
            self.root.graph(),
            &self.registry,
        )?;
        stats::end_pass();
        Ok(())
    }

    /// Tear down the root. The canvas keeps its last pixels.
    pub fn unmount(&mut self) {
        self.root.unmount();
    }
}
