//! Fallback rasterizer: paints the live tree directly, without the SVG
//! round trip.
//!
//! Robustness over fidelity: unparseable style values and undecodable
//! images are skipped rather than failing the export, and text runs are
//! approximated as tinted bars instead of shaped glyphs.

use futures::future::BoxFuture;

use crate::error::{Error, Result};
use crate::view::{ImageSource, NodeKind, StyleMap, ViewTree};

use super::{scaled_px, Bitmap, TreeRasterizer};

/// Direct tree painter used when the snapshot path fails.
#[derive(Debug, Default)]
pub struct DirectPainter;

impl DirectPainter {
    pub fn new() -> Self {
        DirectPainter
    }

    fn paint_tree(&self, tree: &ViewTree, scale: f32) -> Result<Bitmap> {
        let (logical_w, logical_h) = tree.measure();
        let width = scaled_px(logical_w, scale);
        let height = scaled_px(logical_h, scale);
        if width == 0 || height == 0 {
            return Err(Error::Fallback(format!(
                "cannot paint a {width}x{height} surface"
            )));
        }

        let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
            Error::Fallback(format!("failed to allocate a {width}x{height} surface"))
        })?;
        pixmap.fill(tiny_skia::Color::WHITE);

        for id in tree.preorder() {
            let node = match tree.node(id) {
                Some(n) => n,
                None => continue,
            };
            let style = tree.style(id).cloned().unwrap_or_default();
            let opacity = style
                .get("opacity")
                .and_then(|v| v.parse::<f32>().ok())
                .unwrap_or(1.0)
                .clamp(0.0, 1.0);
            match &node.kind {
                NodeKind::Block => {
                    self.paint_block(&mut pixmap, tree, &style, node.frame, scale, opacity);
                }
                NodeKind::Text(content) => {
                    self.paint_text_bar(&mut pixmap, &style, node.frame, content, scale, opacity);
                }
                NodeKind::Image(source) => {
                    self.paint_image(&mut pixmap, source, node.frame, scale, opacity);
                }
            }
        }

        let png = pixmap
            .encode_png()
            .map_err(|e| Error::Fallback(format!("PNG encoding failed: {e}")))?;
        Ok(Bitmap { width, height, png })
    }

    fn paint_block(
        &self,
        pixmap: &mut tiny_skia::Pixmap,
        tree: &ViewTree,
        style: &StyleMap,
        frame: crate::view::Rect,
        scale: f32,
        opacity: f32,
    ) {
        let fill = match style.get("fill") {
            Some(f) if f != "none" => f,
            _ => return,
        };
        let rect = match tiny_skia::Rect::from_xywh(
            frame.x * scale,
            frame.y * scale,
            frame.width * scale,
            frame.height * scale,
        ) {
            Some(r) => r,
            None => return,
        };

        let mut paint = tiny_skia::Paint::default();
        paint.anti_alias = true;

        if let Some(id) = fill.strip_prefix("url(#").and_then(|s| s.strip_suffix(')')) {
            let spec = tree.gradients().iter().find(|g| g.id == id);
            let stops: Vec<tiny_skia::GradientStop> = spec
                .map(|g| {
                    g.stops
                        .iter()
                        .filter_map(|(offset, color)| {
                            parse_color(color)
                                .map(|c| tiny_skia::GradientStop::new(*offset, with_opacity(c, opacity)))
                        })
                        .collect()
                })
                .unwrap_or_default();
            if stops.len() >= 2 {
                if let Some(shader) = tiny_skia::LinearGradient::new(
                    tiny_skia::Point::from_xy(rect.x(), rect.y()),
                    tiny_skia::Point::from_xy(rect.x(), rect.y() + rect.height()),
                    stops,
                    tiny_skia::SpreadMode::Pad,
                    tiny_skia::Transform::identity(),
                ) {
                    paint.shader = shader;
                    pixmap.fill_rect(rect, &paint, tiny_skia::Transform::identity(), None);
                }
            } else {
                log::debug!("gradient '{id}' unresolved; skipping block fill");
            }
            return;
        }

        match parse_color(fill) {
            Some(color) => {
                paint.set_color(with_opacity(color, opacity));
                pixmap.fill_rect(rect, &paint, tiny_skia::Transform::identity(), None);
            }
            None => log::debug!("unparseable fill '{fill}'; skipping block"),
        }
    }

    /// Text is approximated as a bar in the text color; this is the fidelity
    /// trade that keeps the fallback independent of font shaping.
    fn paint_text_bar(
        &self,
        pixmap: &mut tiny_skia::Pixmap,
        style: &StyleMap,
        frame: crate::view::Rect,
        content: &str,
        scale: f32,
        opacity: f32,
    ) {
        let color = style
            .get("fill")
            .and_then(|f| parse_color(f))
            .unwrap_or(tiny_skia::Color::BLACK);
        let font_size = style
            .get("font-size")
            .and_then(|v| v.parse::<f32>().ok())
            .unwrap_or(14.0);
        let est_width = (content.chars().count() as f32 * font_size * 0.55).min(frame.width);
        let bar_height = (font_size * 0.62).min(frame.height);
        let bar_y = frame.y + (frame.height - bar_height) * 0.5;
        if let Some(rect) = tiny_skia::Rect::from_xywh(
            frame.x * scale,
            bar_y * scale,
            (est_width * scale).max(1.0),
            (bar_height * scale).max(1.0),
        ) {
            let mut paint = tiny_skia::Paint::default();
            paint.anti_alias = true;
            paint.set_color(with_opacity(color, opacity * 0.85));
            pixmap.fill_rect(rect, &paint, tiny_skia::Transform::identity(), None);
        }
    }

    fn paint_image(
        &self,
        pixmap: &mut tiny_skia::Pixmap,
        source: &ImageSource,
        frame: crate::view::Rect,
        scale: f32,
        opacity: f32,
    ) {
        if let ImageSource::Data { bytes, .. } = source {
            if let Ok(image) = tiny_skia::Pixmap::decode_png(bytes) {
                let sx = frame.width * scale / image.width() as f32;
                let sy = frame.height * scale / image.height() as f32;
                if sx.is_finite() && sy.is_finite() {
                    let transform = tiny_skia::Transform::from_row(
                        sx,
                        0.0,
                        0.0,
                        sy,
                        frame.x * scale,
                        frame.y * scale,
                    );
                    pixmap.draw_pixmap(
                        0,
                        0,
                        image.as_ref(),
                        &tiny_skia::PixmapPaint::default(),
                        transform,
                        None,
                    );
                    return;
                }
            }
            log::debug!("photo payload not paintable directly; using placeholder");
        }
        // remote or undecodable image: neutral placeholder
        if let Some(rect) = tiny_skia::Rect::from_xywh(
            frame.x * scale,
            frame.y * scale,
            frame.width * scale,
            frame.height * scale,
        ) {
            let mut paint = tiny_skia::Paint::default();
            paint.set_color(with_opacity(
                tiny_skia::Color::from_rgba8(0x9a, 0xa0, 0xb0, 0xff),
                opacity * 0.4,
            ));
            pixmap.fill_rect(rect, &paint, tiny_skia::Transform::identity(), None);
        }
    }
}

impl TreeRasterizer for DirectPainter {
    fn name(&self) -> &'static str {
        "direct-paint"
    }

    fn rasterize<'a>(&'a self, tree: &'a ViewTree, scale: f32) -> BoxFuture<'a, Result<Bitmap>> {
        Box::pin(async move { self.paint_tree(tree, scale) })
    }
}

fn with_opacity(color: tiny_skia::Color, opacity: f32) -> tiny_skia::Color {
    if opacity >= 1.0 {
        return color;
    }
    let alpha = color.alpha() * opacity.clamp(0.0, 1.0);
    tiny_skia::Color::from_rgba(color.red(), color.green(), color.blue(), alpha).unwrap_or(color)
}

/// Parse the color syntax composition emits: named keywords and hex forms.
fn parse_color(value: &str) -> Option<tiny_skia::Color> {
    let value = value.trim().to_lowercase();
    match value.as_str() {
        "white" => return Some(tiny_skia::Color::WHITE),
        "black" => return Some(tiny_skia::Color::BLACK),
        "transparent" | "none" => return None,
        _ => {}
    }
    let hex = value.strip_prefix('#')?;
    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).ok()?;
            Some(tiny_skia::Color::from_rgba8(r, g, b, 255))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(tiny_skia::Color::from_rgba8(r, g, b, 255))
        }
        8 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            let a = u8::from_str_radix(&hex[6..8], 16).ok()?;
            Some(tiny_skia::Color::from_rgba8(r, g, b, a))
        }
        _ => None,
    }
}
