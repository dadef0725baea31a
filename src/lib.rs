//! Cardshot
//!
//! Composes visually themed match/season cards from structured data and
//! exports them as shareable PNG images, entirely in-process.
//!
//! The core is the export pipeline: a live, styled view tree is serialized
//! into a self-contained SVG snapshot (every resolved presentation property
//! inlined, referenced images embedded as data URIs), decoded and painted at
//! a fixed magnification by the primary rasterizer, with a direct-paint
//! fallback when the snapshot path fails.
//!
//! # Example
//!
//! ```no_run
//! use cardshot::{
//!     CardComposer, CardConfiguration, CardData, CardMetadata, CardMode,
//!     ExportConfig, ExportDispatcher, FixedClock, MatchRecord,
//! };
//!
//! # async fn demo() -> cardshot::Result<()> {
//! let record = MatchRecord {
//!     opponent: "Rangers".to_string(),
//!     competition: Some("League Cup".to_string()),
//!     date: chrono::NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
//!     goals_for: 3,
//!     goals_against: 1,
//!     rating: Some(8.5),
//!     man_of_the_match: true,
//!     highlights: vec!["Opened the scoring".to_string()],
//!     stats: Vec::new(),
//! };
//! let config = CardConfiguration {
//!     mode: CardMode::Match,
//!     theme: Default::default(),
//!     visibility: Default::default(),
//!     background: Default::default(),
//!     layout: Default::default(),
//! };
//! let clock = FixedClock(record.date);
//! let tree = CardComposer::new().compose(&CardData::Match(record.clone()), &config, &clock)?;
//!
//! let dispatcher = ExportDispatcher::new(ExportConfig::default())?;
//! let metadata = CardMetadata { date: record.date, title: record.opponent, view: None };
//! let result = dispatcher.export_card(&tree, CardMode::Match, &metadata).await?;
//! println!("{} ({}x{})", result.filename, result.bitmap.width, result.bitmap.height);
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;

pub mod error;
pub use error::{Error, Result, SoftFetchFailure};

pub mod background;
pub mod card;
pub mod compose;
pub mod config;
pub mod export;
pub mod raster;
pub mod snapshot;
pub mod view;

pub use background::{
    BackgroundResolver, BackgroundSource, PhotoTransform, PresetBackground, MAX_PHOTO_ZOOM,
    MIN_PHOTO_ZOOM,
};
pub use card::{
    CardData, CardMetadata, CardMode, Clock, FixedClock, MatchRecord, SeasonSummary, StatLine,
    SystemClock,
};
pub use compose::theme::Theme;
pub use compose::CardComposer;
pub use config::{CardConfiguration, LayoutVariant, ViewPreset, VisibilityOptions};
pub use export::{ExportDispatcher, ExportPhase, ExportResult};
pub use raster::{Bitmap, RendererKind};
pub use snapshot::{SerializedDocument, StyleSnapshotSerializer};
pub use view::{ImageSource, ViewTree};

/// Configuration for the export pipeline.
///
/// Defaults are conservative: ×2 output resolution, a short settle delay so
/// just-applied layout changes are measured correctly, and a bounded image
/// fetch timeout.
///
/// # Examples
///
/// ```
/// let cfg = cardshot::ExportConfig::default();
/// assert_eq!(cfg.scale_factor, 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct ExportConfig {
    /// Multiplier between logical pixels and output bitmap pixels.
    pub scale_factor: f32,
    /// Delay before measuring, letting layout changes settle.
    pub settle_delay_ms: u64,
    /// Timeout for each best-effort image embed fetch.
    pub fetch_timeout_ms: u64,
    /// Directory the disk sink writes exports into.
    pub output_dir: PathBuf,
    /// User agent sent with embed fetches.
    pub user_agent: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale_factor: 2.0,
            settle_delay_ms: 40,
            fetch_timeout_ms: 8000,
            output_dir: PathBuf::from("."),
            user_agent: format!("cardshot/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}
