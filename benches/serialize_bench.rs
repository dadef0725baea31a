use criterion::{criterion_group, criterion_main, Criterion};

use cardshot::card::{CardData, FixedClock, MatchRecord, StatLine};
use cardshot::raster::SnapshotRasterizer;
use cardshot::snapshot::{NullFetcher, StyleSnapshotSerializer};
use cardshot::{CardComposer, CardConfiguration, CardMode, LayoutVariant, Theme, VisibilityOptions};
use chrono::NaiveDate;

fn bench_tree() -> cardshot::ViewTree {
    let record = MatchRecord {
        opponent: "Rangers".into(),
        competition: Some("League Cup".into()),
        date: NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
        goals_for: 3,
        goals_against: 1,
        rating: Some(8.5),
        man_of_the_match: true,
        highlights: vec![
            "Opened the scoring".into(),
            "Hit the post twice".into(),
            "Assisted the third".into(),
        ],
        stats: vec![
            StatLine { label: "Shots".into(), value: "5".into() },
            StatLine { label: "Passes".into(), value: "41".into() },
            StatLine { label: "Tackles".into(), value: "3".into() },
        ],
    };
    let config = CardConfiguration {
        mode: CardMode::Match,
        theme: Theme::Classic,
        visibility: VisibilityOptions::default(),
        background: Default::default(),
        layout: LayoutVariant::Standard,
    };
    let clock = FixedClock(record.date);
    CardComposer::new()
        .compose(&CardData::Match(record), &config, &clock)
        .expect("compose failed")
}

fn bench_serialize(c: &mut Criterion) {
    let tree = bench_tree();
    let serializer = StyleSnapshotSerializer::new(Box::new(NullFetcher));
    let rt = tokio::runtime::Runtime::new().expect("runtime");

    c.bench_function("serialize_snapshot", |b| {
        b.iter(|| {
            rt.block_on(serializer.serialize(&tree, &String::new))
                .expect("serialize failed")
        })
    });
}

fn bench_rasterize(c: &mut Criterion) {
    let tree = bench_tree();
    let serializer = StyleSnapshotSerializer::new(Box::new(NullFetcher));
    let rt = tokio::runtime::Runtime::new().expect("runtime");
    let doc = rt
        .block_on(serializer.serialize(&tree, &String::new))
        .expect("serialize failed");
    let rasterizer = SnapshotRasterizer::new();

    c.bench_function("rasterize_snapshot_2x", |b| {
        b.iter(|| {
            rasterizer
                .rasterize_document(&doc, 2.0)
                .expect("rasterize failed")
        })
    });
}

criterion_group!(benches, bench_serialize, bench_rasterize);
criterion_main!(benches);
