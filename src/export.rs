//! Export orchestration: settle, serialize, rasterize (primary then
//! fallback), name the file and hand it to the sink.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::card::{CardMetadata, CardMode};
use crate::compose::theme::collect_global_style_text;
use crate::error::{Error, Result};
use crate::raster::{
    Bitmap, DirectPainter, DocumentRasterizer, RendererKind, SnapshotRasterizer, TreeRasterizer,
};
use crate::snapshot::{HttpImageFetcher, StyleSnapshotSerializer};
use crate::view::ViewTree;
use crate::ExportConfig;

/// Where one export currently is. `Done`/`Failed` persist until the next
/// export begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportPhase {
    Idle,
    Measuring,
    Serializing,
    RasterizingPrimary,
    RasterizingFallback,
    Done,
    Failed,
}

/// The outcome of a successful export.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportResult {
    pub bitmap: Bitmap,
    pub renderer_used: RendererKind,
    pub filename: String,
}

/// Final file emission. Delivery is a side effect with no recoverable
/// failure mode for the pipeline; implementations log their own errors.
pub trait FileSink: Send + Sync {
    fn deliver(&self, filename: &str, bytes: &[u8]);
}

/// Writes exports into a directory.
pub struct DiskSink {
    dir: PathBuf,
}

impl DiskSink {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

/// Lets a sink be shared (e.g. wrapped in `Arc`) while still satisfying
/// `Box<dyn FileSink>`; delivery forwards to the inner sink.
impl<T: FileSink + ?Sized> FileSink for Arc<T> {
    fn deliver(&self, filename: &str, bytes: &[u8]) {
        (**self).deliver(filename, bytes)
    }
}

impl FileSink for DiskSink {
    fn deliver(&self, filename: &str, bytes: &[u8]) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            log::error!("failed to create {}: {e}", self.dir.display());
            return;
        }
        let path = self.dir.join(filename);
        if let Err(e) = std::fs::write(&path, bytes) {
            log::error!("failed to write {}: {e}", path.display());
        }
    }
}

/// Orchestrates one export at a time through the primary → fallback chain.
pub struct ExportDispatcher {
    serializer: StyleSnapshotSerializer,
    primary: Box<dyn DocumentRasterizer>,
    fallback: Box<dyn TreeRasterizer>,
    sink: Box<dyn FileSink>,
    config: ExportConfig,
    in_flight: AtomicBool,
    phase: Mutex<ExportPhase>,
}

impl ExportDispatcher {
    /// Wire the default pipeline: HTTP embedding, snapshot rasterizer,
    /// direct-paint fallback, disk delivery.
    pub fn new(config: ExportConfig) -> Result<Self> {
        let fetcher = HttpImageFetcher::new(&config)?;
        let sink = DiskSink::new(config.output_dir.clone());
        Ok(Self::with_parts(
            config,
            StyleSnapshotSerializer::new(Box::new(fetcher)),
            Box::new(SnapshotRasterizer::new()),
            Box::new(DirectPainter::new()),
            Box::new(sink),
        ))
    }

    /// Assemble a dispatcher from explicit parts. Tests use this to inject
    /// failing rasterizers and capturing sinks.
    pub fn with_parts(
        config: ExportConfig,
        serializer: StyleSnapshotSerializer,
        primary: Box<dyn DocumentRasterizer>,
        fallback: Box<dyn TreeRasterizer>,
        sink: Box<dyn FileSink>,
    ) -> Self {
        Self {
            serializer,
            primary,
            fallback,
            sink,
            config,
            in_flight: AtomicBool::new(false),
            phase: Mutex::new(ExportPhase::Idle),
        }
    }

    pub fn phase(&self) -> ExportPhase {
        self.phase.lock().map(|p| *p).unwrap_or(ExportPhase::Idle)
    }

    fn set_phase(&self, phase: ExportPhase) {
        if let Ok(mut guard) = self.phase.lock() {
            *guard = phase;
        }
    }

    /// Export one card. Fails fast with [`Error::ExportInFlight`] if another
    /// export is still running; otherwise errors only when both
    /// rasterization paths fail.
    pub async fn export_card(
        &self,
        tree: &ViewTree,
        mode: CardMode,
        metadata: &CardMetadata,
    ) -> Result<ExportResult> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            log::warn!("export requested while another is in flight; refusing");
            return Err(Error::ExportInFlight);
        }
        let outcome = self.run(tree, mode, metadata).await;
        self.set_phase(match outcome {
            Ok(_) => ExportPhase::Done,
            Err(_) => ExportPhase::Failed,
        });
        self.in_flight.store(false, Ordering::SeqCst);
        outcome
    }

    async fn run(
        &self,
        tree: &ViewTree,
        mode: CardMode,
        metadata: &CardMetadata,
    ) -> Result<ExportResult> {
        // let just-applied layout changes settle before measuring
        self.set_phase(ExportPhase::Measuring);
        tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;

        let scale = self.config.scale_factor;
        let (bitmap, renderer_used) = match self.primary_path(tree, scale).await {
            Ok(bitmap) => (bitmap, RendererKind::Primary),
            Err(e) if e.triggers_fallback() => {
                log::warn!("primary export path failed, engaging fallback: {e}");
                self.set_phase(ExportPhase::RasterizingFallback);
                match self.fallback.rasterize(tree, scale).await {
                    Ok(bitmap) => (bitmap, RendererKind::Fallback),
                    Err(fe) => {
                        log::error!("fallback renderer '{}' failed: {fe}", self.fallback.name());
                        return Err(Error::ExportFailed);
                    }
                }
            }
            Err(other) => return Err(other),
        };

        let filename = export_filename(mode, metadata);
        self.sink.deliver(&filename, &bitmap.png);
        log::info!(
            "exported {filename} ({}x{}) via {} renderer",
            bitmap.width,
            bitmap.height,
            match renderer_used {
                RendererKind::Primary => self.primary.name(),
                RendererKind::Fallback => self.fallback.name(),
            }
        );
        Ok(ExportResult {
            bitmap,
            renderer_used,
            filename,
        })
    }

    async fn primary_path(&self, tree: &ViewTree, scale: f32) -> Result<Bitmap> {
        self.set_phase(ExportPhase::Serializing);
        let collect = || collect_global_style_text(tree.style_sources());
        let doc = self.serializer.serialize(tree, &collect).await?;
        log::debug!(
            "serialized snapshot {} ({} bytes)",
            doc.content_hash(),
            doc.svg.len()
        );
        self.set_phase(ExportPhase::RasterizingPrimary);
        self.primary.rasterize(&doc, scale).await
    }
}

/// Deterministic export filename: `{mode}-{key}{-personal|-team|""}.png`,
/// where `key` is the ISO match date or the slugified aggregate title.
pub fn export_filename(mode: CardMode, metadata: &CardMetadata) -> String {
    let key = match mode {
        CardMode::Match => metadata.date.format("%Y-%m-%d").to_string(),
        CardMode::Season => slugify(&metadata.title),
    };
    let suffix = metadata.view.map(|v| v.as_str()).unwrap_or("");
    let sep = if suffix.is_empty() { "" } else { "-" };
    format!("{}-{}{}{}.png", mode.as_str(), key, sep, suffix)
}

/// ASCII slug: transliterate, lowercase, collapse runs of other characters
/// into single dashes.
pub fn slugify(title: &str) -> String {
    let ascii = deunicode::deunicode(title);
    let mut slug = String::with_capacity(ascii.len());
    let mut pending_dash = false;
    for ch in ascii.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "card".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewPreset;
    use chrono::NaiveDate;

    fn metadata(view: Option<ViewPreset>) -> CardMetadata {
        CardMetadata {
            date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            title: "Spring Cup — Golden Boot!".into(),
            view,
        }
    }

    #[test]
    fn slugify_collapses_and_transliterates() {
        assert_eq!(slugify("Spring Cup — Golden Boot!"), "spring-cup-golden-boot");
        assert_eq!(slugify("Überliga '25/26"), "uberliga-25-26");
        assert_eq!(slugify("***"), "card");
    }

    #[test]
    fn filename_patterns() {
        assert_eq!(
            export_filename(CardMode::Match, &metadata(Some(ViewPreset::Personal))),
            "match-2026-03-14-personal.png"
        );
        assert_eq!(
            export_filename(CardMode::Match, &metadata(None)),
            "match-2026-03-14.png"
        );
        assert_eq!(
            export_filename(CardMode::Season, &metadata(Some(ViewPreset::Team))),
            "season-spring-cup-golden-boot-team.png"
        );
    }

    #[test]
    fn filename_is_byte_identical_across_calls() {
        let meta = metadata(Some(ViewPreset::Personal));
        let a = export_filename(CardMode::Match, &meta);
        let b = export_filename(CardMode::Match, &meta);
        assert_eq!(a, b);
    }
}
