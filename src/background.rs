//! Background resolution: named preset gradients and user photos with a
//! pan/zoom transform.
//!
//! Presets are procedural and deterministic; the same id always yields the
//! same stops. Photos carry an affine transform derived here as an SVG
//! `transform` attribute that scales about the frame centre and then pans,
//! and parses back to the same three values within float tolerance.

use serde::{Deserialize, Serialize};

use crate::view::{GradientSpec, ImageSource};

/// Lower bound the input layer clamps photo zoom against.
pub const MIN_PHOTO_ZOOM: f32 = 0.2;
/// Upper bound the input layer clamps photo zoom against.
pub const MAX_PHOTO_ZOOM: f32 = 3.0;

/// Named procedural backgrounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PresetBackground {
    #[default]
    StadiumDusk,
    MidnightPitch,
    GoldenHour,
    Chalkboard,
}

impl PresetBackground {
    /// Fixed gradient stops for this preset. No randomness: the same preset
    /// always resolves to the same visual.
    pub fn gradient(&self) -> GradientSpec {
        let stops = match self {
            PresetBackground::StadiumDusk => vec![
                (0.0, "#1d2b53".to_string()),
                (0.55, "#4a3b78".to_string()),
                (1.0, "#12131f".to_string()),
            ],
            PresetBackground::MidnightPitch => vec![
                (0.0, "#0b132b".to_string()),
                (1.0, "#1c2541".to_string()),
            ],
            PresetBackground::GoldenHour => vec![
                (0.0, "#f7b267".to_string()),
                (0.6, "#f4845f".to_string()),
                (1.0, "#7d387d".to_string()),
            ],
            PresetBackground::Chalkboard => vec![
                (0.0, "#2f3e46".to_string()),
                (1.0, "#354f52".to_string()),
            ],
        };
        GradientSpec {
            id: "card-bg".to_string(),
            stops,
        }
    }
}

/// Pan/zoom state for a photo background. Mutated only by the input layer;
/// reset to identity whenever the photo source changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotoTransform {
    /// Zoom factor, `> 0`. The input control keeps it within
    /// [`MIN_PHOTO_ZOOM`, `MAX_PHOTO_ZOOM`]; this component does not defend.
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for PhotoTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl PhotoTransform {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

/// The active background choice.
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundSource {
    Preset { id: PresetBackground },
    Photo {
        source: ImageSource,
        transform: PhotoTransform,
    },
}

impl Default for BackgroundSource {
    fn default() -> Self {
        BackgroundSource::Preset {
            id: PresetBackground::default(),
        }
    }
}

/// A drawable surface descriptor resolved from a [`BackgroundSource`].
#[derive(Debug, Clone, PartialEq)]
pub enum BackgroundPaint {
    Gradient(GradientSpec),
    Photo {
        source: ImageSource,
        /// SVG `transform` attribute applying the pan/zoom.
        transform_attr: String,
    },
}

/// Derive the SVG transform attribute for a pan/zoom over a frame of the
/// given size: scale about the frame centre `(w/2, h/2)`, then translate by
/// `(offset_x, offset_y)`. Folded to the canonical two-op form
/// `translate(tx ty) scale(s)` with `tx = offset_x + (w/2)(1 - s)`.
pub fn transform_attr(t: &PhotoTransform, frame_w: f32, frame_h: f32) -> String {
    let tx = t.offset_x + frame_w / 2.0 * (1.0 - t.scale);
    let ty = t.offset_y + frame_h / 2.0 * (1.0 - t.scale);
    format!("translate({} {}) scale({})", tx, ty, t.scale)
}

/// Parse a transform attribute produced by [`transform_attr`] back into the
/// pan/zoom values, given the same frame size.
pub fn parse_transform_attr(attr: &str, frame_w: f32, frame_h: f32) -> Option<PhotoTransform> {
    let attr = attr.trim();
    let rest = attr.strip_prefix("translate(")?;
    let (pair, rest) = rest.split_once(')')?;
    let mut parts = pair.split_whitespace();
    let tx: f32 = parts.next()?.parse().ok()?;
    let ty: f32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let rest = rest.trim().strip_prefix("scale(")?;
    let (scale_str, tail) = rest.split_once(')')?;
    if !tail.trim().is_empty() {
        return None;
    }
    let scale: f32 = scale_str.trim().parse().ok()?;
    if scale <= 0.0 {
        return None;
    }
    Some(PhotoTransform {
        scale,
        offset_x: tx - frame_w / 2.0 * (1.0 - scale),
        offset_y: ty - frame_h / 2.0 * (1.0 - scale),
    })
}

/// Owns the active background and the binary handle behind a photo source.
///
/// Ownership contract: assigning a new photo transfers the handle here and
/// drops the previous one; nothing else is allowed to release it.
#[derive(Debug, Default)]
pub struct BackgroundResolver {
    source: BackgroundSource,
}

impl BackgroundResolver {
    pub fn new(source: BackgroundSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &BackgroundSource {
        &self.source
    }

    /// Switch to a named preset. Any held photo handle is released.
    pub fn set_preset(&mut self, id: PresetBackground) {
        self.release_photo();
        self.source = BackgroundSource::Preset { id };
    }

    /// Supply a new photo. The previous handle (if any) is released and the
    /// transform resets to identity.
    pub fn set_photo(&mut self, source: ImageSource) {
        self.release_photo();
        self.source = BackgroundSource::Photo {
            source,
            transform: PhotoTransform::default(),
        };
    }

    /// Update the pan/zoom. No-op unless a photo is active.
    pub fn set_transform(&mut self, t: PhotoTransform) {
        if let BackgroundSource::Photo { transform, .. } = &mut self.source {
            *transform = t;
        }
    }

    fn release_photo(&mut self) {
        if let BackgroundSource::Photo { source, .. } = &self.source {
            if let ImageSource::Data { bytes, .. } = source {
                log::debug!("releasing previous photo buffer ({} bytes)", bytes.len());
            }
        }
    }

    /// Resolve the active source against a target frame.
    pub fn resolve(&self, frame_w: f32, frame_h: f32) -> BackgroundPaint {
        Self::resolve_source(&self.source, frame_w, frame_h)
    }

    /// Resolve any source against a target frame. Deterministic.
    pub fn resolve_source(
        source: &BackgroundSource,
        frame_w: f32,
        frame_h: f32,
    ) -> BackgroundPaint {
        match source {
            BackgroundSource::Preset { id } => BackgroundPaint::Gradient(id.gradient()),
            BackgroundSource::Photo { source, transform } => BackgroundPaint::Photo {
                source: source.clone(),
                transform_attr: transform_attr(transform, frame_w, frame_h),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_round_trip() {
        let cases = [
            PhotoTransform { scale: 1.0, offset_x: 0.0, offset_y: 0.0 },
            PhotoTransform { scale: 2.5, offset_x: -31.25, offset_y: 14.5 },
            PhotoTransform { scale: 0.2, offset_x: 120.0, offset_y: -48.75 },
        ];
        for t in cases {
            let attr = transform_attr(&t, 400.0, 500.0);
            let back = parse_transform_attr(&attr, 400.0, 500.0).expect("parse");
            assert!((back.scale - t.scale).abs() < 1e-3, "{attr}");
            assert!((back.offset_x - t.offset_x).abs() < 1e-3, "{attr}");
            assert!((back.offset_y - t.offset_y).abs() < 1e-3, "{attr}");
        }
    }

    #[test]
    fn identity_transform_is_plain() {
        let attr = transform_attr(&PhotoTransform::default(), 400.0, 500.0);
        assert_eq!(attr, "translate(0 0) scale(1)");
    }

    #[test]
    fn malformed_attr_rejected() {
        assert!(parse_transform_attr("rotate(45)", 400.0, 500.0).is_none());
        assert!(parse_transform_attr("translate(1 2) scale(0)", 400.0, 500.0).is_none());
    }

    #[test]
    fn presets_are_deterministic() {
        let a = PresetBackground::StadiumDusk.gradient();
        let b = PresetBackground::StadiumDusk.gradient();
        assert_eq!(a, b);
        assert_ne!(a, PresetBackground::GoldenHour.gradient());
    }

    #[test]
    fn new_photo_resets_transform() {
        let mut resolver = BackgroundResolver::default();
        resolver.set_photo(ImageSource::Remote("https://example.com/a.jpg".into()));
        resolver.set_transform(PhotoTransform { scale: 2.0, offset_x: 10.0, offset_y: -5.0 });
        resolver.set_photo(ImageSource::Remote("https://example.com/b.jpg".into()));
        match resolver.source() {
            BackgroundSource::Photo { transform, .. } => {
                assert!(transform.is_identity());
            }
            other => panic!("expected photo source, got {other:?}"),
        }
    }

    #[test]
    fn transform_ignored_without_photo() {
        let mut resolver = BackgroundResolver::default();
        resolver.set_transform(PhotoTransform { scale: 2.0, offset_x: 1.0, offset_y: 1.0 });
        assert!(matches!(resolver.source(), BackgroundSource::Preset { .. }));
    }
}
