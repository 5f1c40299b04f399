//! Bitmap sources for the `Image` node kind and `Canvas::draw_image`.

use std::path::Path;
use std::rc::Rc;

use resvg::tiny_skia::{ColorU8, IntSize, Pixmap, Transform};

use crate::error::ImageError;

/// A decoded, premultiplied RGBA bitmap shared by reference.
///
/// Cloning is cheap. Two `ImageData` values are the same image only if they
/// share the same allocation (see [`ImageData::ptr_eq`]).
#[derive(Clone)]
pub struct ImageData {
    pixmap: Rc<Pixmap>,
}

impl ImageData {
    pub fn from_pixmap(pixmap: Pixmap) -> Self {
        Self {
            pixmap: Rc::new(pixmap),
        }
    }

    /// Build an image from straight-alpha RGBA8 rows.
    pub fn from_rgba8(width: u32, height: u32, rgba: &[u8]) -> Result<Self, ImageError> {
        let expected = (width as usize) * (height as usize) * 4;
        let size = IntSize::from_wh(width, height)
            .filter(|_| rgba.len() == expected)
            .ok_or(ImageError::InvalidSize { width, height })?;

        let mut data = Vec::with_capacity(expected);
        for px in rgba.chunks_exact(4) {
            let c = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
            data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }

        let pixmap = Pixmap::from_vec(data, size).ok_or(ImageError::InvalidSize { width, height })?;
        Ok(Self::from_pixmap(pixmap))
    }

    /// Decode an encoded raster image (PNG, JPEG, GIF, WebP).
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageError> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        Self::from_rgba8(rgba.width(), rgba.height(), rgba.as_raw())
    }

    /// Rasterise SVG data at `scale` times its intrinsic size.
    pub fn from_svg(bytes: &[u8], scale: f32) -> Result<Self, ImageError> {
        let tree = resvg::usvg::Tree::from_data(bytes, &resvg::usvg::Options::default())?;
        let size = tree.size();

        let width = (size.width() * scale).ceil() as u32;
        let height = (size.height() * scale).ceil() as u32;
        let mut pixmap =
            Pixmap::new(width, height).ok_or(ImageError::InvalidSize { width, height })?;

        resvg::render(&tree, Transform::from_scale(scale, scale), &mut pixmap.as_mut());
        Ok(Self::from_pixmap(pixmap))
    }

    /// Load an image file. Files with an `.svg` extension are rasterised at
    /// their intrinsic size.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImageError> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let is_svg = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("svg"));

        if is_svg {
            Self::from_svg(&data, 1.0)
        } else {
            Self::decode(&data)
        }
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

    pub fn ptr_eq(&self, other: &ImageData) -> bool {
        Rc::ptr_eq(&self.pixmap, &other.pixmap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba8_premultiplies() {
        let img = ImageData::from_rgba8(1, 1, &[255, 0, 0, 128]).unwrap();
        let px = img.pixmap().pixel(0, 0).unwrap();
        assert_eq!(px.alpha(), 128);
        assert_eq!(px.red(), 128);
    }

    #[test]
    fn test_from_rgba8_rejects_wrong_length() {
        assert!(matches!(
            ImageData::from_rgba8(2, 2, &[0; 4]),
            Err(ImageError::InvalidSize { .. })
        ));
        assert!(ImageData::from_rgba8(0, 0, &[]).is_err());
    }

    #[test]
    fn test_svg_rasterises_at_scale() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="4" height="2">
            <rect width="4" height="2" fill="blue"/></svg>"#;
        let img = ImageData::from_svg(svg, 2.0).unwrap();
        assert_eq!((img.width(), img.height()), (8, 4));
        assert_eq!(img.pixmap().pixel(3, 3).unwrap().blue(), 255);
    }

    #[test]
    fn test_clones_share_identity() {
        let a = ImageData::from_rgba8(1, 1, &[0, 0, 0, 255]).unwrap();
        let b = a.clone();
        let c = ImageData::from_rgba8(1, 1, &[0, 0, 0, 255]).unwrap();
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }
}
