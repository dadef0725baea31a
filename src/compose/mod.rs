//! Card composition: domain data + configuration + clock → live view tree.
//!
//! Composition is deterministic: identical inputs produce structurally
//! identical trees. The only time dependency is the injected [`Clock`] used
//! for the footer timestamp. Exactly the fields whose visibility flag is on
//! are rendered; a disabled region is absent from the tree entirely.

pub mod layout;
pub mod theme;

use crate::background::{BackgroundPaint, BackgroundResolver};
use crate::card::{CardData, Clock, MatchRecord, SeasonSummary, StatLine};
use crate::config::CardConfiguration;
use crate::error::{Error, Result};
use crate::view::{style_map, NodeId, NodeKind, Rect, StyleMap, ViewTree};

use layout::RegionPlan;
use theme::Palette;

/// Builds a [`ViewTree`] from domain data and an immutable configuration.
/// Produces the tree only; raster and export concerns live downstream.
pub struct CardComposer;

impl Default for CardComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl CardComposer {
    pub fn new() -> Self {
        CardComposer
    }

    pub fn compose(
        &self,
        data: &CardData,
        config: &CardConfiguration,
        clock: &dyn Clock,
    ) -> Result<ViewTree> {
        config.validate()?;
        if data.mode() != config.mode {
            return Err(Error::Config(format!(
                "configuration mode {} does not match the supplied data",
                config.mode
            )));
        }

        let plan = layout::plan(config.layout);
        let palette = config.theme.palette();
        let mut tree = ViewTree::new();
        tree.set_style_sources(config.theme.style_sources());

        let root = tree.push_node(
            None,
            "card",
            NodeKind::Block,
            plan.canvas,
            style_map(&[
                ("fill", palette.base),
                ("font-family", palette.font_family),
            ]),
        );

        self.push_background(&mut tree, root, config, plan.canvas);

        match data {
            CardData::Match(record) => {
                self.push_match_header(&mut tree, root, record, config, &plan, &palette);
                self.push_match_content(&mut tree, root, record, config, &plan, &palette);
                self.push_highlights(&mut tree, root, &record.highlights, config, &plan, &palette);
                self.push_stats(&mut tree, root, &record.stats, config, &plan, &palette);
            }
            CardData::Season(summary) => {
                self.push_season_header(&mut tree, root, summary, &plan, &palette);
                self.push_season_content(&mut tree, root, summary, config, &plan, &palette);
                self.push_highlights(&mut tree, root, &summary.highlights, config, &plan, &palette);
                self.push_stats(&mut tree, root, &summary.stats, config, &plan, &palette);
            }
        }

        if config.visibility.show_timestamp {
            let date = clock.today().format("%Y-%m-%d").to_string();
            self.push_text(
                &mut tree,
                root,
                "timestamp",
                format!("Generated {date}"),
                plan.footer,
                11.0,
                palette.muted,
                &palette,
            );
        }

        log::debug!(
            "composed {} card: {} nodes, {}x{}",
            config.mode,
            tree.len(),
            plan.canvas.width,
            plan.canvas.height
        );
        Ok(tree)
    }

    fn push_background(
        &self,
        tree: &mut ViewTree,
        root: NodeId,
        config: &CardConfiguration,
        canvas: Rect,
    ) {
        match BackgroundResolver::resolve_source(&config.background, canvas.width, canvas.height) {
            BackgroundPaint::Gradient(spec) => {
                let fill = format!("url(#{})", spec.id);
                tree.add_gradient(spec);
                tree.push_node(
                    Some(root),
                    "background",
                    NodeKind::Block,
                    canvas,
                    style_map(&[("fill", fill.as_str())]),
                );
            }
            BackgroundPaint::Photo {
                source,
                transform_attr,
            } => {
                tree.push_node(
                    Some(root),
                    "background",
                    NodeKind::Image(source),
                    canvas,
                    style_map(&[
                        ("transform", transform_attr.as_str()),
                        ("preserveAspectRatio", "xMidYMid slice"),
                    ]),
                );
                // keep text legible over arbitrary photos
                tree.push_node(
                    Some(root),
                    "background-scrim",
                    NodeKind::Block,
                    canvas,
                    style_map(&[("fill", "#000000"), ("opacity", "0.35")]),
                );
            }
        }
    }

    fn push_match_header(
        &self,
        tree: &mut ViewTree,
        root: NodeId,
        record: &MatchRecord,
        config: &CardConfiguration,
        plan: &RegionPlan,
        palette: &Palette,
    ) {
        let header = self.push_region(tree, root, "header", plan.header);
        let h = plan.header;
        if config.visibility.show_opponent {
            self.push_text(
                tree,
                header,
                "opponent",
                format!("vs {}", record.opponent),
                Rect::new(h.x, h.y + 4.0, h.width, 32.0),
                28.0,
                palette.text,
                palette,
            );
        } else {
            self.push_text(
                tree,
                header,
                "title",
                "Match Day".to_string(),
                Rect::new(h.x, h.y + 4.0, h.width, 32.0),
                28.0,
                palette.text,
                palette,
            );
        }
        if config.visibility.show_competition {
            if let Some(competition) = &record.competition {
                self.push_text(
                    tree,
                    header,
                    "competition",
                    competition.clone(),
                    Rect::new(h.x, h.y + 44.0, h.width, 18.0),
                    14.0,
                    palette.muted,
                    palette,
                );
            }
        }
        self.push_text(
            tree,
            header,
            "match-date",
            record.date.format("%Y-%m-%d").to_string(),
            Rect::new(h.x, h.y + 68.0, h.width, 16.0),
            12.0,
            palette.muted,
            palette,
        );
    }

    fn push_season_header(
        &self,
        tree: &mut ViewTree,
        root: NodeId,
        summary: &SeasonSummary,
        plan: &RegionPlan,
        palette: &Palette,
    ) {
        let header = self.push_region(tree, root, "header", plan.header);
        let h = plan.header;
        self.push_text(
            tree,
            header,
            "title",
            summary.title.clone(),
            Rect::new(h.x, h.y + 4.0, h.width, 32.0),
            28.0,
            palette.text,
            palette,
        );
        self.push_text(
            tree,
            header,
            "played-line",
            format!("{} matches played", summary.played),
            Rect::new(h.x, h.y + 48.0, h.width, 18.0),
            14.0,
            palette.muted,
            palette,
        );
    }

    fn push_match_content(
        &self,
        tree: &mut ViewTree,
        root: NodeId,
        record: &MatchRecord,
        config: &CardConfiguration,
        plan: &RegionPlan,
        palette: &Palette,
    ) {
        let content = self.push_region(tree, root, "content", plan.content);
        let c = plan.content;
        let mut cursor = c.y + 6.0;

        if config.visibility.show_score {
            self.push_text(
                tree,
                content,
                "score",
                record.score_line(),
                Rect::new(c.x, cursor, c.width, 58.0),
                52.0,
                palette.text,
                palette,
            );
            cursor += 64.0;
        }

        // the outcome badge has no toggle: it is the point of a match card
        let outcome = record.outcome();
        let badge_fill = match outcome {
            crate::card::MatchOutcome::Win => palette.outcome_win,
            crate::card::MatchOutcome::Draw => palette.outcome_draw,
            crate::card::MatchOutcome::Loss => palette.outcome_loss,
        };
        let badge = tree.push_node(
            Some(content),
            "result-badge",
            NodeKind::Block,
            Rect::new(c.x, cursor, 92.0, 30.0),
            style_map(&[("fill", badge_fill), ("rx", "15")]),
        );
        self.push_text(
            tree,
            badge,
            "result-badge-label",
            outcome.label().to_string(),
            Rect::new(c.x + 16.0, cursor + 5.0, 60.0, 20.0),
            15.0,
            "#ffffff",
            palette,
        );

        let mut x = c.x + 104.0;
        if config.visibility.show_rating {
            if let Some(rating) = record.rating {
                let pill = tree.push_node(
                    Some(content),
                    "rating-pill",
                    NodeKind::Block,
                    Rect::new(x, cursor, 64.0, 30.0),
                    style_map(&[("fill", palette.accent), ("rx", "15")]),
                );
                self.push_text(
                    tree,
                    pill,
                    "rating-value",
                    format!("{rating:.1}"),
                    Rect::new(x + 16.0, cursor + 5.0, 40.0, 20.0),
                    15.0,
                    "#ffffff",
                    palette,
                );
                x += 76.0;
            }
        }
        if config.visibility.show_motm && record.man_of_the_match {
            self.push_text(
                tree,
                content,
                "motm-marker",
                "★ MOTM".to_string(),
                Rect::new(x, cursor + 5.0, 90.0, 20.0),
                15.0,
                palette.motm,
                palette,
            );
        }
    }

    fn push_season_content(
        &self,
        tree: &mut ViewTree,
        root: NodeId,
        summary: &SeasonSummary,
        config: &CardConfiguration,
        plan: &RegionPlan,
        palette: &Palette,
    ) {
        let content = self.push_region(tree, root, "content", plan.content);
        let c = plan.content;
        let mut cursor = c.y + 6.0;

        if config.visibility.show_score {
            self.push_text(
                tree,
                content,
                "record-line",
                summary.record_line(),
                Rect::new(c.x, cursor, c.width, 48.0),
                40.0,
                palette.text,
                palette,
            );
            cursor += 56.0;
        }

        if config.visibility.show_rating {
            if let Some(avg) = summary.average_rating {
                let pill = tree.push_node(
                    Some(content),
                    "rating-pill",
                    NodeKind::Block,
                    Rect::new(c.x, cursor, 110.0, 30.0),
                    style_map(&[("fill", palette.accent), ("rx", "15")]),
                );
                self.push_text(
                    tree,
                    pill,
                    "rating-value",
                    format!("{avg:.1} avg"),
                    Rect::new(c.x + 14.0, cursor + 5.0, 90.0, 20.0),
                    15.0,
                    "#ffffff",
                    palette,
                );
            }
        }
    }

    fn push_highlights(
        &self,
        tree: &mut ViewTree,
        root: NodeId,
        highlights: &[String],
        config: &CardConfiguration,
        plan: &RegionPlan,
        palette: &Palette,
    ) {
        if !config.visibility.show_highlights || highlights.is_empty() {
            return;
        }
        let region = self.push_region(tree, root, "highlights", plan.highlights);
        let r = plan.highlights;
        self.push_text(
            tree,
            region,
            "highlights-title",
            "Highlights".to_string(),
            Rect::new(r.x, r.y, r.width, 18.0),
            14.0,
            palette.muted,
            palette,
        );
        let row_h = 18.0;
        let max_rows = (((r.height - 24.0) / row_h).floor() as usize).max(1);
        for (i, item) in highlights.iter().take(max_rows).enumerate() {
            self.push_text(
                tree,
                region,
                "highlight-item",
                format!("• {item}"),
                Rect::new(r.x, r.y + 24.0 + i as f32 * row_h, r.width, row_h),
                13.0,
                palette.text,
                palette,
            );
        }
        if highlights.len() > max_rows {
            log::debug!(
                "highlights truncated to {max_rows} of {}",
                highlights.len()
            );
        }
    }

    fn push_stats(
        &self,
        tree: &mut ViewTree,
        root: NodeId,
        stats: &[StatLine],
        config: &CardConfiguration,
        plan: &RegionPlan,
        palette: &Palette,
    ) {
        if !config.visibility.show_stats || stats.is_empty() {
            return;
        }
        let strip = tree.push_node(
            Some(root),
            "stats-strip",
            NodeKind::Block,
            plan.stats,
            style_map(&[("fill", palette.surface), ("rx", "12"), ("opacity", "0.9")]),
        );
        let s = plan.stats;
        let columns = stats.len().min(4);
        let col_w = s.width / columns as f32;
        for (i, stat) in stats.iter().take(columns).enumerate() {
            let x = s.x + i as f32 * col_w + 12.0;
            self.push_text(
                tree,
                strip,
                "stat-value",
                stat.value.clone(),
                Rect::new(x, s.y + 10.0, col_w - 16.0, 22.0),
                18.0,
                palette.text,
                palette,
            );
            self.push_text(
                tree,
                strip,
                "stat-label",
                stat.label.clone(),
                Rect::new(x, s.y + 38.0, col_w - 16.0, 14.0),
                11.0,
                palette.muted,
                palette,
            );
        }
    }

    fn push_region(&self, tree: &mut ViewTree, parent: NodeId, role: &str, frame: Rect) -> NodeId {
        tree.push_node(
            Some(parent),
            role,
            NodeKind::Block,
            frame,
            style_map(&[("fill", "none")]),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn push_text(
        &self,
        tree: &mut ViewTree,
        parent: NodeId,
        role: &str,
        content: String,
        frame: Rect,
        font_size: f32,
        color: &str,
        palette: &Palette,
    ) -> NodeId {
        let mut style: StyleMap = style_map(&[
            ("fill", color),
            ("font-family", palette.font_family),
        ]);
        style.insert("font-size".to_string(), format!("{font_size}"));
        if font_size >= 28.0 {
            style.insert("font-weight".to_string(), "700".to_string());
        }
        tree.push_node(Some(parent), role, NodeKind::Text(content), frame, style)
    }
}
