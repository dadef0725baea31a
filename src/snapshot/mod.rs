//! Style snapshot serialization.
//!
//! Converts a live, styled view tree into a self-contained SVG document:
//! a structural clone is walked in lockstep with the live tree, every
//! resolved presentation property is inlined onto the clone, referenced
//! raster images are embedded as data URIs, and the result is serialized
//! with the global style text as a defensive fallback.

mod clone;
mod embed;
mod serializer;

pub use clone::{inline_resolved_styles, structural_clone, SnapshotNode};
pub use embed::{data_uri, sniff_image_mime, FetchedImage, HttpImageFetcher, ImageFetcher, NullFetcher};
pub use serializer::StyleSnapshotSerializer;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use sha2::{Digest, Sha256};

/// A self-contained vector document produced by one serialization pass.
/// Ephemeral: created per export call and discarded after rasterization.
#[derive(Debug, Clone, PartialEq)]
pub struct SerializedDocument {
    pub svg: String,
    /// Canvas width in device-independent pixels.
    pub width: f32,
    /// Canvas height in device-independent pixels.
    pub height: f32,
}

impl SerializedDocument {
    /// The document as a `data:image/svg+xml;base64,...` URI.
    pub fn as_data_uri(&self) -> String {
        format!(
            "data:image/svg+xml;base64,{}",
            BASE64.encode(self.svg.as_bytes())
        )
    }

    /// Hex SHA-256 of the document text. Logged per export and used by the
    /// determinism tests.
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.svg.as_bytes());
        hex::encode(hasher.finalize())
    }
}
