//! Theme presets: a finite set of palette/typography choices, never
//! arbitrary user CSS.

use serde::{Deserialize, Serialize};

use crate::view::StyleRuleSource;

/// Visual theme preset applied to the whole card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Classic,
    Midnight,
    Ember,
}

/// Colors and typography a theme resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Card base color behind the background layer.
    pub base: &'static str,
    /// Raised surface color (pills, strips).
    pub surface: &'static str,
    pub accent: &'static str,
    pub text: &'static str,
    pub muted: &'static str,
    pub outcome_win: &'static str,
    pub outcome_draw: &'static str,
    pub outcome_loss: &'static str,
    pub motm: &'static str,
    pub font_family: &'static str,
}

impl Theme {
    pub fn palette(&self) -> Palette {
        match self {
            Theme::Classic => Palette {
                base: "#f5f6fa",
                surface: "#ffffff",
                accent: "#2563eb",
                text: "#15182b",
                muted: "#5b6070",
                outcome_win: "#2f9e44",
                outcome_draw: "#e8a33d",
                outcome_loss: "#d64545",
                motm: "#f6c026",
                font_family: "Inter, 'Segoe UI', sans-serif",
            },
            Theme::Midnight => Palette {
                base: "#0d1022",
                surface: "#1a1f3a",
                accent: "#7aa2ff",
                text: "#eef1ff",
                muted: "#8b91b0",
                outcome_win: "#4ade80",
                outcome_draw: "#fbbf24",
                outcome_loss: "#f87171",
                motm: "#fde047",
                font_family: "Inter, 'Segoe UI', sans-serif",
            },
            Theme::Ember => Palette {
                base: "#1f1410",
                surface: "#33201a",
                accent: "#ff8a5c",
                text: "#fff4ec",
                muted: "#c2a093",
                outcome_win: "#7bd389",
                outcome_draw: "#ffc971",
                outcome_loss: "#ff6b6b",
                motm: "#ffd166",
                font_family: "Inter, 'Segoe UI', sans-serif",
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Classic => "classic",
            Theme::Midnight => "midnight",
            Theme::Ember => "ember",
        }
    }

    /// The theme's contribution to the document-wide style text. Embedded in
    /// the snapshot as a defensive fallback next to the per-node inlined
    /// properties; the rasterizer works even if it ignores this blob.
    pub fn style_sources(&self) -> Vec<StyleRuleSource> {
        let p = self.palette();
        vec![
            StyleRuleSource {
                name: format!("theme-{}", self.as_str()),
                text: Ok(format!(
                    ".card {{ font-family: {}; color: {}; }}\n\
                     .rating-pill {{ background: {}; }}\n\
                     .stats-strip {{ background: {}; }}",
                    p.font_family, p.text, p.accent, p.surface
                )),
            },
            StyleRuleSource {
                name: "card-base".to_string(),
                text: Ok(".highlight-item { opacity: 0.92; }".to_string()),
            },
        ]
    }
}

/// Concatenate every readable style-rule source into one text blob.
/// Unreadable sources are skipped silently (logged at debug), mirroring how
/// cross-origin stylesheets behave in the original environment.
pub fn collect_global_style_text(sources: &[StyleRuleSource]) -> String {
    let mut blob = String::new();
    for source in sources {
        match &source.text {
            Ok(text) => {
                if !blob.is_empty() {
                    blob.push('\n');
                }
                blob.push_str(text);
            }
            Err(reason) => {
                log::debug!("skipping unreadable style source {}: {}", source.name, reason);
            }
        }
    }
    blob
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreadable_sources_are_skipped() {
        let sources = vec![
            StyleRuleSource {
                name: "a".into(),
                text: Ok(".x { color: red; }".into()),
            },
            StyleRuleSource {
                name: "cross-origin".into(),
                text: Err("security error".into()),
            },
            StyleRuleSource {
                name: "b".into(),
                text: Ok(".y { color: blue; }".into()),
            },
        ];
        let blob = collect_global_style_text(&sources);
        assert!(blob.contains(".x"));
        assert!(blob.contains(".y"));
        assert!(!blob.contains("security"));
    }

    #[test]
    fn themes_resolve_to_distinct_palettes() {
        assert_ne!(Theme::Classic.palette().base, Theme::Midnight.palette().base);
        assert_ne!(Theme::Midnight.palette().base, Theme::Ember.palette().base);
    }
}
