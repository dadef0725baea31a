//! Card configuration: visibility toggles, layout variants, and the
//! immutable per-export configuration bundle.

use serde::{Deserialize, Serialize};

use crate::background::BackgroundSource;
use crate::card::CardMode;
use crate::compose::theme::Theme;
use crate::error::{Error, Result};

/// Which optional fields the composed card renders. Every key has a stable
/// default and toggling one never implicitly changes another; only the two
/// coupled presets overwrite a subset atomically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityOptions {
    pub show_score: bool,
    pub show_rating: bool,
    pub show_motm: bool,
    pub show_opponent: bool,
    pub show_competition: bool,
    pub show_highlights: bool,
    pub show_stats: bool,
    pub show_timestamp: bool,
}

impl Default for VisibilityOptions {
    fn default() -> Self {
        Self {
            show_score: true,
            show_rating: true,
            show_motm: true,
            show_opponent: true,
            show_competition: true,
            show_highlights: true,
            show_stats: true,
            show_timestamp: true,
        }
    }
}

/// The two coupled visibility presets. Applying one atomically overwrites
/// the personal-metric subset (`show_rating`, `show_motm`, `show_stats`)
/// and leaves every other key untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewPreset {
    /// Spotlight the player: rating, MOTM and the stats strip are shown.
    Personal,
    /// Team-first view: personal metrics are hidden.
    Team,
}

impl ViewPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewPreset::Personal => "personal",
            ViewPreset::Team => "team",
        }
    }
}

impl VisibilityOptions {
    /// Overwrite the coupled subset for the given preset.
    pub fn apply_preset(&mut self, preset: ViewPreset) {
        let personal = matches!(preset, ViewPreset::Personal);
        self.show_rating = personal;
        self.show_motm = personal;
        self.show_stats = personal;
    }
}

/// Fixed-aspect layout variants. Aggregate cards are 4:5 only; single-match
/// cards may also use the taller story format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutVariant {
    /// 4:5, 400×500 logical pixels.
    #[default]
    Standard,
    /// 9:16, 360×640 logical pixels.
    Story,
}

impl LayoutVariant {
    /// Logical canvas size in device-independent pixels.
    pub fn canvas(&self) -> (f32, f32) {
        match self {
            LayoutVariant::Standard => (400.0, 500.0),
            LayoutVariant::Story => (360.0, 640.0),
        }
    }
}

/// Immutable configuration for one export attempt. Rebuilt whenever the user
/// changes a control; read-only to the exporters.
#[derive(Debug, Clone, PartialEq)]
pub struct CardConfiguration {
    pub mode: CardMode,
    pub theme: Theme,
    pub visibility: VisibilityOptions,
    pub background: BackgroundSource,
    pub layout: LayoutVariant,
}

impl CardConfiguration {
    /// Check mode/layout legality once, up front.
    pub fn validate(&self) -> Result<()> {
        if self.mode == CardMode::Season && self.layout == LayoutVariant::Story {
            return Err(Error::Config(
                "story layout is only available for single-match cards".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_show_everything() {
        let vis = VisibilityOptions::default();
        assert!(vis.show_score && vis.show_rating && vis.show_highlights);
    }

    #[test]
    fn presets_touch_only_the_coupled_subset() {
        let mut vis = VisibilityOptions::default();
        vis.show_highlights = false;
        vis.apply_preset(ViewPreset::Team);
        assert!(!vis.show_rating);
        assert!(!vis.show_motm);
        assert!(!vis.show_stats);
        // untouched keys keep their values
        assert!(!vis.show_highlights);
        assert!(vis.show_score);
        assert!(vis.show_opponent);

        vis.apply_preset(ViewPreset::Personal);
        assert!(vis.show_rating && vis.show_motm && vis.show_stats);
        assert!(!vis.show_highlights);
    }

    #[test]
    fn story_layout_rejected_for_aggregate_cards() {
        let cfg = CardConfiguration {
            mode: CardMode::Season,
            theme: Theme::default(),
            visibility: VisibilityOptions::default(),
            background: BackgroundSource::default(),
            layout: LayoutVariant::Story,
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn canvas_aspect_ratios() {
        let (w, h) = LayoutVariant::Standard.canvas();
        assert!((w / h - 0.8).abs() < 1e-6);
        let (w, h) = LayoutVariant::Story.canvas();
        assert!((w / h - 9.0 / 16.0).abs() < 1e-6);
    }
}
