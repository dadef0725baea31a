//! Region layout for the fixed card aspect ratios.
//!
//! Regions stack top to bottom: header, content, highlights, stats strip,
//! footer line. All frames are absolute card coordinates.

use crate::config::LayoutVariant;
use crate::view::Rect;

/// Outer margin around every region.
pub const MARGIN: f32 = 24.0;

/// Computed region frames for one card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionPlan {
    pub canvas: Rect,
    pub header: Rect,
    pub content: Rect,
    pub highlights: Rect,
    pub stats: Rect,
    pub footer: Rect,
}

/// Plan the regions for a layout variant. Pure arithmetic over the fixed
/// canvas size; identical inputs always yield identical frames.
pub fn plan(variant: LayoutVariant) -> RegionPlan {
    let (w, h) = variant.canvas();
    let inner_w = w - 2.0 * MARGIN;

    let header_h = 96.0;
    let footer_h = 18.0;
    let stats_h = 64.0;
    let highlights_h = match variant {
        LayoutVariant::Standard => 88.0,
        LayoutVariant::Story => 150.0,
    };

    let header = Rect::new(MARGIN, MARGIN, inner_w, header_h);
    let footer = Rect::new(MARGIN, h - MARGIN - footer_h, inner_w, footer_h);
    let stats = Rect::new(MARGIN, footer.y - 12.0 - stats_h, inner_w, stats_h);
    let highlights = Rect::new(MARGIN, stats.y - 12.0 - highlights_h, inner_w, highlights_h);
    let content_top = header.y + header.height + 12.0;
    let content = Rect::new(
        MARGIN,
        content_top,
        inner_w,
        highlights.y - 12.0 - content_top,
    );

    RegionPlan {
        canvas: Rect::new(0.0, 0.0, w, h),
        header,
        content,
        highlights,
        stats,
        footer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regions_stack_without_overlap() {
        for variant in [LayoutVariant::Standard, LayoutVariant::Story] {
            let plan = plan(variant);
            assert!(plan.header.y + plan.header.height <= plan.content.y);
            assert!(plan.content.y + plan.content.height <= plan.highlights.y);
            assert!(plan.highlights.y + plan.highlights.height <= plan.stats.y);
            assert!(plan.stats.y + plan.stats.height <= plan.footer.y);
            assert!(plan.footer.y + plan.footer.height <= plan.canvas.height);
            assert!(plan.content.height > 0.0);
        }
    }

    #[test]
    fn planning_is_deterministic() {
        assert_eq!(plan(LayoutVariant::Standard), plan(LayoutVariant::Standard));
    }
}
