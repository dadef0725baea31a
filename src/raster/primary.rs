//! Primary rasterizer: decode the serialized SVG snapshot and paint it onto
//! a pixel surface at the requested magnification.

use std::sync::Arc;

use futures::future::BoxFuture;

use crate::error::{Error, Result};
use crate::snapshot::SerializedDocument;

use super::{scaled_px, Bitmap, DocumentRasterizer};

/// Rasterizes snapshot documents with usvg/resvg onto a tiny-skia pixmap.
pub struct SnapshotRasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl Default for SnapshotRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotRasterizer {
    /// Create a rasterizer with system fonts loaded for text nodes.
    pub fn new() -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        if fontdb.is_empty() {
            log::warn!("no system fonts found; text may not render in exports");
        }
        Self {
            fontdb: Arc::new(fontdb),
        }
    }

    /// Decode and paint synchronously. Failure at any step is a decode
    /// error: it must reach the dispatcher so the fallback can engage.
    pub fn rasterize_document(&self, doc: &SerializedDocument, scale: f32) -> Result<Bitmap> {
        if scale <= 0.0 {
            return Err(Error::Decode(format!("invalid scale factor {scale}")));
        }

        let mut options = usvg::Options::default();
        options.fontdb = self.fontdb.clone();
        let tree = usvg::Tree::from_str(&doc.svg, &options)
            .map_err(|e| Error::Decode(format!("SVG parsing failed: {e}")))?;

        let width = scaled_px(doc.width, scale);
        let height = scaled_px(doc.height, scale);
        if width == 0 || height == 0 {
            return Err(Error::Decode(format!(
                "snapshot rasterizes to an empty surface ({width}x{height})"
            )));
        }

        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
            Error::Decode(format!("failed to allocate a {width}x{height} surface"))
        })?;

        // pre-scale the context so the document paints in logical units
        let transform = tiny_skia::Transform::from_scale(scale, scale);
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        let png = pixmap
            .encode_png()
            .map_err(|e| Error::Decode(format!("PNG encoding failed: {e}")))?;

        Ok(Bitmap { width, height, png })
    }
}

impl DocumentRasterizer for SnapshotRasterizer {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    fn rasterize<'a>(
        &'a self,
        doc: &'a SerializedDocument,
        scale: f32,
    ) -> BoxFuture<'a, Result<Bitmap>> {
        Box::pin(async move { self.rasterize_document(doc, scale) })
    }
}
