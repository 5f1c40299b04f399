//! Error types.

use std::any::Any;

use thiserror::Error;

use crate::kind::NodeKind;

/// Failure while evaluating a tree description during a commit.
///
/// These never reach the caller of `render`/`update`; they are handed to the
/// root's error callback.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DescriptionError {
    #[error("component `{name}` failed: {message}")]
    Component { name: String, message: String },
    #[error("component `{name}` panicked: {message}")]
    Panicked { name: String, message: String },
}

impl DescriptionError {
    /// Shorthand used by component closures to report a failure.
    pub fn component(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Component {
            name: name.into(),
            message: message.into(),
        }
    }
}

/// Failure raised by a renderer procedure.
#[derive(Debug, Error)]
pub enum DrawError {
    #[error("{kind} is missing required prop `{prop}`")]
    MissingProp { kind: NodeKind, prop: &'static str },
    #[error("{kind} prop `{prop}` is not a valid {expected}")]
    InvalidProp {
        kind: NodeKind,
        prop: &'static str,
        expected: &'static str,
    },
    #[error(transparent)]
    Surface(#[from] SurfaceError),
    #[error("{0}")]
    Custom(String),
}

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("image codec error: {0}")]
    Codec(#[from] image::ImageError),
    #[error("failed to parse svg: {0}")]
    Svg(#[from] resvg::usvg::Error),
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("image has an empty or oversized area ({width}x{height})")]
    InvalidSize { width: u32, height: u32 },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ColorParseError {
    #[error("empty colour string")]
    Empty,
    #[error("invalid hex colour `{0}`")]
    InvalidHex(String),
    #[error("invalid colour function `{0}`")]
    InvalidFunction(String),
    #[error("unknown colour name `{0}`")]
    UnknownName(String),
    #[error("expected a colour, found a {0} value")]
    WrongType(&'static str),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("surface size {width}x{height} at pixel ratio {pixel_ratio} has no pixels")]
    Empty {
        width: f32,
        height: f32,
        pixel_ratio: f32,
    },
    #[error("could not allocate a {width}x{height} pixel buffer")]
    Allocation { width: u32, height: u32 },
}

/// Best-effort text of a caught panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
