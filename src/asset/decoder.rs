//! Vector document decoding and rasterization

use resvg::{tiny_skia, usvg};

use super::types::{AssetError, LayerType, RasterImage};

/// A parsed SVG document, ready to be rasterized at any size
pub struct VectorDocument {
    tree: usvg::Tree,
}

impl VectorDocument {
    /// Parse SVG (or gzip-compressed SVGZ) bytes
    pub fn decode(bytes: &[u8], uri: &str) -> Result<Self, AssetError> {
        let options = usvg::Options::default();
        let tree = usvg::Tree::from_data(bytes, &options).map_err(|e| AssetError::Decode {
            uri: uri.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { tree })
    }

    /// Intrinsic size in user units
    pub fn size(&self) -> (f32, f32) {
        let size = self.tree.size();
        (size.width(), size.height())
    }

    /// Render into a `width` x `height` bitmap.
    ///
    /// The document is scaled to fit while keeping its aspect ratio and centred;
    /// uncovered pixels stay transparent. Rendering is done on the CPU, so the
    /// result is marked for a software layer.
    pub fn rasterize(&self, width: u32, height: u32, uri: &str) -> Result<RasterImage, AssetError> {
        let error = |reason: String| AssetError::Rasterize {
            uri: uri.to_string(),
            reason,
        };

        let (source_width, source_height) = self.size();
        if source_width <= 0.0 || source_height <= 0.0 {
            return Err(error(format!(
                "empty document size {}x{}",
                source_width, source_height
            )));
        }

        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or_else(|| error(format!("cannot allocate {}x{} bitmap", width, height)))?;

        let scale = (width as f32 / source_width).min(height as f32 / source_height);
        let offset_x = (width as f32 - source_width * scale) / 2.0;
        let offset_y = (height as f32 - source_height * scale) / 2.0;
        let transform =
            tiny_skia::Transform::from_scale(scale, scale).post_translate(offset_x, offset_y);

        resvg::render(&self.tree, transform, &mut pixmap.as_mut());

        Ok(RasterImage {
            width,
            height,
            pixels: pixmap.take(),
            layer: LayerType::Software,
        })
    }
}
