//! cardshot CLI: compose a card from a JSON description and export it.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Deserialize;

use cardshot::{
    BackgroundSource, CardComposer, CardConfiguration, CardData, CardMetadata, Clock,
    ExportConfig, ExportDispatcher, ImageSource, LayoutVariant, MatchRecord, PhotoTransform,
    PresetBackground, SeasonSummary, SystemClock, Theme, ViewPreset, VisibilityOptions,
    MAX_PHOTO_ZOOM, MIN_PHOTO_ZOOM,
};

#[derive(Parser)]
#[command(name = "cardshot", version, about = "Export themed match cards as PNG images")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compose a card from a JSON file and export it as a PNG
    Export {
        /// Path to the card description (JSON)
        #[arg(long)]
        input: PathBuf,
        /// Directory to write the PNG into
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Output magnification factor
        #[arg(long, default_value_t = 2.0)]
        scale: f32,
        /// Apply a coupled visibility preset: personal or team
        #[arg(long)]
        view: Option<String>,
        /// Also print the exported bitmap as a data URI
        #[arg(long)]
        emit_data_uri: bool,
    },
}

/// On-disk card description. Background photos may be local paths or URLs.
#[derive(Deserialize)]
struct CardFile {
    #[serde(default)]
    theme: Theme,
    #[serde(default)]
    layout: LayoutVariant,
    #[serde(default)]
    visibility: VisibilityOptions,
    #[serde(default)]
    background: BackgroundSpec,
    #[serde(flatten)]
    data: CardDataSpec,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum CardDataSpec {
    Match(MatchRecord),
    Season(SeasonSummary),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum BackgroundSpec {
    Preset {
        preset: PresetBackground,
    },
    Photo {
        photo: String,
        #[serde(default = "default_zoom")]
        zoom: f32,
        #[serde(default)]
        offset_x: f32,
        #[serde(default)]
        offset_y: f32,
    },
}

fn default_zoom() -> f32 {
    1.0
}

impl Default for BackgroundSpec {
    fn default() -> Self {
        BackgroundSpec::Preset {
            preset: PresetBackground::default(),
        }
    }
}

impl BackgroundSpec {
    /// Resolve to a background source; the zoom clamp lives here, at the
    /// input layer, not in the resolver.
    fn into_source(self) -> anyhow::Result<BackgroundSource> {
        match self {
            BackgroundSpec::Preset { preset } => Ok(BackgroundSource::Preset { id: preset }),
            BackgroundSpec::Photo {
                photo,
                zoom,
                offset_x,
                offset_y,
            } => {
                let source = if photo.starts_with("http://") || photo.starts_with("https://") {
                    ImageSource::Remote(photo)
                } else {
                    let bytes = std::fs::read(&photo)
                        .with_context(|| format!("failed to read photo {photo}"))?;
                    let mime = cardshot::snapshot::sniff_image_mime(&bytes)
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    ImageSource::Data { mime, bytes }
                };
                Ok(BackgroundSource::Photo {
                    source,
                    transform: PhotoTransform {
                        scale: zoom.clamp(MIN_PHOTO_ZOOM, MAX_PHOTO_ZOOM),
                        offset_x,
                        offset_y,
                    },
                })
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Export {
            input,
            out_dir,
            scale,
            view,
            emit_data_uri,
        } => export(input, out_dir, scale, view, emit_data_uri).await,
    }
}

async fn export(
    input: PathBuf,
    out_dir: PathBuf,
    scale: f32,
    view: Option<String>,
    emit_data_uri: bool,
) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let file: CardFile = serde_json::from_str(&text).context("invalid card description")?;

    let view = match view.as_deref() {
        None => None,
        Some("personal") => Some(ViewPreset::Personal),
        Some("team") => Some(ViewPreset::Team),
        Some(other) => bail!("unknown view preset '{other}' (expected personal or team)"),
    };

    let mut visibility = file.visibility;
    if let Some(preset) = view {
        visibility.apply_preset(preset);
    }

    let (data, metadata) = match file.data {
        CardDataSpec::Match(record) => {
            let metadata = CardMetadata {
                date: record.date,
                title: record.opponent.clone(),
                view,
            };
            (CardData::Match(record), metadata)
        }
        CardDataSpec::Season(summary) => {
            let metadata = CardMetadata {
                date: SystemClock.today(),
                title: summary.title.clone(),
                view,
            };
            (CardData::Season(summary), metadata)
        }
    };

    let mode = data.mode();
    let config = CardConfiguration {
        mode,
        theme: file.theme,
        visibility,
        background: file.background.into_source()?,
        layout: file.layout,
    };

    let tree = CardComposer::new().compose(&data, &config, &SystemClock)?;

    let export_config = ExportConfig {
        scale_factor: scale,
        output_dir: out_dir,
        ..Default::default()
    };
    let dispatcher = ExportDispatcher::new(export_config)?;
    let result = dispatcher.export_card(&tree, mode, &metadata).await?;

    println!(
        "wrote {} ({}x{})",
        result.filename, result.bitmap.width, result.bitmap.height
    );
    if emit_data_uri {
        println!("{}", result.bitmap.data_uri());
    }
    Ok(())
}
