//! A retained-mode 2D scene graph.
//!
//! Scenes are written as declarative [`Element`] descriptions. A root
//! reconciles each new description against the previous one into a
//! committed [`NodeGraph`] of typed nodes, and a [`CanvasSurface`] paints
//! that graph depth-first onto a raster canvas through a
//! [`RendererRegistry`] of per-kind draw procedures.
//!
//! ```ignore
//! use retained_canvas::prelude::*;
//!
//! let mut surface = CanvasSurface::render(
//!     SurfaceConfig::new().width(200.0).height(100.0),
//!     fragment([
//!         rectangle()
//!             .prop("width", 200)
//!             .prop("height", 100)
//!             .prop("fill", "white"),
//!         translate(20.0, 20.0).child(
//!             text("Hello").prop("fill", "black").prop("fontSize", 16),
//!         ),
//!     ]),
//! )?;
//! surface.draw()?;
//! ```
//!
//! `BufferedSurface` nodes draw their children onto a private canvas that
//! is only repainted when something beneath them changed, which keeps
//! large static content cheap to redraw.

pub mod canvas;
pub mod color;
pub mod diff;
pub mod element;
pub mod error;
pub mod graph;
pub mod host;
pub mod kind;
pub mod loops;
pub mod math;
pub mod props;
pub mod reconciler;
pub mod renderers;
pub mod root;
pub mod scheduler;
pub mod stats;
pub mod surface;
pub mod walker;

pub use canvas::{Canvas, ImageData};
pub use color::Color;
pub use element::{
    buffered_surface, component, fragment, image, line, node, opacity, rectangle, rotate, scale,
    text, translate, Component, Element, Fragment, Key, NodeElement,
};
pub use error::{ColorParseError, DescriptionError, DrawError, ImageError, SurfaceError};
pub use graph::{NodeGraph, NodeId, RenderedNode};
pub use kind::NodeKind;
pub use props::{PropValue, Props};
pub use renderers::{
    register_renderers, DrawContext, Renderer, RendererRegistry, UnknownKindPolicy,
};
pub use root::{render, RootConfig, RootHandle};
pub use surface::{CanvasSurface, SurfaceConfig, SurfaceId};
pub use walker::draw_to_canvas;

pub mod prelude {
    pub use crate::canvas::{Canvas, ImageData};
    pub use crate::color::Color;
    pub use crate::element::{
        buffered_surface, component, fragment, image, line, node, opacity, rectangle, rotate,
        scale, text, translate, Element, NodeElement,
    };
    pub use crate::error::DescriptionError;
    pub use crate::kind::NodeKind;
    pub use crate::loops::{for_each, while_loop, ForRange};
    pub use crate::props::{PropValue, Props};
    pub use crate::renderers::{
        register_renderers, DrawContext, Renderer, RendererRegistry, UnknownKindPolicy,
    };
    pub use crate::root::{render, RootConfig, RootHandle};
    pub use crate::surface::{CanvasSurface, SurfaceConfig};
    pub use crate::props;
}
