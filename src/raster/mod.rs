//! Rasterization: serialized snapshot (primary) or live tree (fallback)
//! to a PNG bitmap at a fixed magnification factor.

mod fallback;
mod primary;

pub use fallback::DirectPainter;
pub use primary::SnapshotRasterizer;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures::future::BoxFuture;

use crate::error::Result;
use crate::snapshot::SerializedDocument;
use crate::view::ViewTree;

/// A finished raster image.
#[derive(Debug, Clone, PartialEq)]
pub struct Bitmap {
    /// Output width in physical pixels.
    pub width: u32,
    /// Output height in physical pixels.
    pub height: u32,
    /// PNG-encoded pixels.
    pub png: Vec<u8>,
}

impl Bitmap {
    /// The bitmap as a `data:image/png;base64,...` URI.
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", BASE64.encode(&self.png))
    }
}

/// Which rendering strategy produced an export.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    Primary,
    Fallback,
}

/// The primary strategy: rasterize a serialized snapshot document.
/// Dyn-safe so the dispatcher can take injected implementations in tests.
pub trait DocumentRasterizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// Decode the document and paint it at `scale`; the output bitmap is
    /// `(round(width * scale), round(height * scale))` pixels.
    fn rasterize<'a>(
        &'a self,
        doc: &'a SerializedDocument,
        scale: f32,
    ) -> BoxFuture<'a, Result<Bitmap>>;
}

/// The fallback strategy: measure and paint the live tree directly,
/// trading fidelity for robustness.
pub trait TreeRasterizer: Send + Sync {
    fn name(&self) -> &'static str;

    fn rasterize<'a>(&'a self, tree: &'a ViewTree, scale: f32) -> BoxFuture<'a, Result<Bitmap>>;
}

/// Scale a logical dimension to output pixels.
pub(crate) fn scaled_px(logical: f32, scale: f32) -> u32 {
    (logical * scale).round().max(0.0) as u32
}
