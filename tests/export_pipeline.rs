use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;

use cardshot::card::{CardData, CardMetadata, FixedClock, MatchRecord};
use cardshot::config::ViewPreset;
use cardshot::export::{ExportDispatcher, ExportPhase, FileSink};
use cardshot::raster::{Bitmap, DirectPainter, DocumentRasterizer, RendererKind, SnapshotRasterizer, TreeRasterizer};
use cardshot::snapshot::{NullFetcher, SerializedDocument, StyleSnapshotSerializer};
use cardshot::view::ViewTree;
use cardshot::{
    CardComposer, CardConfiguration, CardMode, Error, ExportConfig, LayoutVariant, Theme,
    VisibilityOptions,
};
use chrono::NaiveDate;

fn match_record() -> MatchRecord {
    MatchRecord {
        opponent: "Rangers".into(),
        competition: Some("League Cup".into()),
        date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        goals_for: 3,
        goals_against: 1,
        rating: Some(8.5),
        man_of_the_match: true,
        highlights: vec!["Opened the scoring".into()],
        stats: Vec::new(),
    }
}

fn composed_tree() -> ViewTree {
    let config = CardConfiguration {
        mode: CardMode::Match,
        theme: Theme::Classic,
        visibility: VisibilityOptions::default(),
        background: Default::default(),
        layout: LayoutVariant::Standard,
    };
    let clock = FixedClock(NaiveDate::from_ymd_opt(2026, 8, 6).unwrap());
    CardComposer::new()
        .compose(&CardData::Match(match_record()), &config, &clock)
        .expect("compose failed")
}

fn metadata() -> CardMetadata {
    CardMetadata {
        date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        title: "Rangers".into(),
        view: Some(ViewPreset::Personal),
    }
}

fn test_export_config() -> ExportConfig {
    ExportConfig {
        settle_delay_ms: 1,
        ..Default::default()
    }
}

/// Sink that captures deliveries in memory.
#[derive(Default)]
struct MemorySink {
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl FileSink for MemorySink {
    fn deliver(&self, filename: &str, bytes: &[u8]) {
        if let Ok(mut files) = self.files.lock() {
            files.push((filename.to_string(), bytes.to_vec()));
        }
    }
}

/// Primary rasterizer that always reports a decode failure.
struct FailingPrimary;

impl DocumentRasterizer for FailingPrimary {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn rasterize<'a>(
        &'a self,
        _doc: &'a SerializedDocument,
        _scale: f32,
    ) -> BoxFuture<'a, cardshot::Result<Bitmap>> {
        Box::pin(async { Err(Error::Decode("injected decode failure".into())) })
    }
}

/// Fallback wrapper counting invocations.
struct CountingFallback {
    inner: DirectPainter,
    calls: Arc<AtomicUsize>,
}

impl TreeRasterizer for CountingFallback {
    fn name(&self) -> &'static str {
        "counting-fallback"
    }

    fn rasterize<'a>(&'a self, tree: &'a ViewTree, scale: f32) -> BoxFuture<'a, cardshot::Result<Bitmap>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.rasterize(tree, scale)
    }
}

/// Fallback that always fails, for the total-failure path.
struct FailingFallback;

impl TreeRasterizer for FailingFallback {
    fn name(&self) -> &'static str {
        "failing-fallback"
    }

    fn rasterize<'a>(&'a self, _tree: &'a ViewTree, _scale: f32) -> BoxFuture<'a, cardshot::Result<Bitmap>> {
        Box::pin(async { Err(Error::Fallback("injected paint failure".into())) })
    }
}

fn decode_dimensions(png: &[u8]) -> (u32, u32) {
    let pixmap = tiny_skia::Pixmap::decode_png(png).expect("valid PNG");
    (pixmap.width(), pixmap.height())
}

#[test]
fn rasterize_scales_dimensions_consistently() {
    let tree = composed_tree();
    let serializer = StyleSnapshotSerializer::new(Box::new(NullFetcher));
    let rt = tokio::runtime::Runtime::new().unwrap();
    let doc = rt
        .block_on(serializer.serialize(&tree, &String::new))
        .expect("serialize failed");
    assert_eq!((doc.width, doc.height), (400.0, 500.0));

    let rasterizer = SnapshotRasterizer::new();
    for k in [1.0f32, 2.0, 3.0] {
        let bitmap = rasterizer.rasterize_document(&doc, k).expect("rasterize");
        let expected = ((400.0 * k).round() as u32, (500.0 * k).round() as u32);
        assert_eq!((bitmap.width, bitmap.height), expected, "scale {k}");
        assert_eq!(decode_dimensions(&bitmap.png), expected, "scale {k}");
    }
}

#[tokio::test]
async fn primary_path_exports_at_double_resolution() {
    let sink = Arc::new(MemorySink::default());
    let dispatcher = ExportDispatcher::with_parts(
        test_export_config(),
        StyleSnapshotSerializer::new(Box::new(NullFetcher)),
        Box::new(SnapshotRasterizer::new()),
        Box::new(DirectPainter::new()),
        Box::new(sink.clone()),
    );

    let tree = composed_tree();
    let result = dispatcher
        .export_card(&tree, CardMode::Match, &metadata())
        .await
        .expect("export failed");

    assert_eq!(result.renderer_used, RendererKind::Primary);
    assert_eq!((result.bitmap.width, result.bitmap.height), (800, 1000));
    assert_eq!(result.filename, "match-2026-03-14-personal.png");
    assert_eq!(dispatcher.phase(), ExportPhase::Done);

    let files = sink.files.lock().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].0, "match-2026-03-14-personal.png");
    assert_eq!(&files[0].1[0..8], b"\x89PNG\r\n\x1a\n");
}

#[tokio::test]
async fn injected_decode_failure_engages_fallback_exactly_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let sink = Arc::new(MemorySink::default());
    let dispatcher = ExportDispatcher::with_parts(
        test_export_config(),
        StyleSnapshotSerializer::new(Box::new(NullFetcher)),
        Box::new(FailingPrimary),
        Box::new(CountingFallback {
            inner: DirectPainter::new(),
            calls: calls.clone(),
        }),
        Box::new(sink.clone()),
    );

    let tree = composed_tree();
    let result = dispatcher
        .export_card(&tree, CardMode::Match, &metadata())
        .await
        .expect("fallback should still succeed");

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.renderer_used, RendererKind::Fallback);
    assert_eq!((result.bitmap.width, result.bitmap.height), (800, 1000));
    assert_eq!(dispatcher.phase(), ExportPhase::Done);
    assert_eq!(sink.files.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn both_paths_failing_surfaces_a_generic_error() {
    let sink = Arc::new(MemorySink::default());
    let dispatcher = ExportDispatcher::with_parts(
        test_export_config(),
        StyleSnapshotSerializer::new(Box::new(NullFetcher)),
        Box::new(FailingPrimary),
        Box::new(FailingFallback),
        Box::new(sink.clone()),
    );

    let tree = composed_tree();
    let err = dispatcher
        .export_card(&tree, CardMode::Match, &metadata())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::ExportFailed));
    assert_eq!(err.to_string(), "Could not generate image");
    assert_eq!(dispatcher.phase(), ExportPhase::Failed);
    // no file on total failure
    assert!(sink.files.lock().unwrap().is_empty());
}

#[tokio::test]
async fn second_export_while_in_flight_is_refused() {
    let sink = Arc::new(MemorySink::default());
    let dispatcher = Arc::new(ExportDispatcher::with_parts(
        ExportConfig {
            settle_delay_ms: 200,
            ..Default::default()
        },
        StyleSnapshotSerializer::new(Box::new(NullFetcher)),
        Box::new(SnapshotRasterizer::new()),
        Box::new(DirectPainter::new()),
        Box::new(sink),
    ));

    let tree = composed_tree();
    let first = tokio::spawn({
        let dispatcher = dispatcher.clone();
        let tree = tree.clone();
        async move {
            dispatcher
                .export_card(&tree, CardMode::Match, &metadata())
                .await
        }
    });

    // let the first export enter its settle delay
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    let second = dispatcher
        .export_card(&tree, CardMode::Match, &metadata())
        .await;
    assert!(matches!(second, Err(Error::ExportInFlight)));

    let first = first.await.expect("join failed");
    assert!(first.is_ok());

    // once the flight lands, a retry is allowed again
    let retry = dispatcher
        .export_card(&tree, CardMode::Match, &metadata())
        .await;
    assert!(retry.is_ok());
}

#[test]
fn serialized_snapshot_inlines_card_styling() {
    let tree = composed_tree();
    let serializer = StyleSnapshotSerializer::new(Box::new(NullFetcher));
    let rt = tokio::runtime::Runtime::new().unwrap();
    let collect = || cardshot::compose::theme::collect_global_style_text(tree.style_sources());
    let doc = rt.block_on(serializer.serialize(&tree, &collect)).unwrap();

    // per-node inlined declarations
    assert!(doc.svg.contains("data-role=\"result-badge\""));
    assert!(doc.svg.contains("fill=\"#2f9e44\""));
    assert!(doc.svg.contains(">WIN</text>"));
    assert!(doc.svg.contains(">8.5</text>"));
    // gradient background definition
    assert!(doc.svg.contains("linearGradient id=\"card-bg\""));
    // the defensive global style blob rides along
    assert!(doc.svg.contains("<style>"));
    assert!(doc.svg.contains("font-family"));
}
