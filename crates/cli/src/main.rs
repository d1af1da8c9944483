//! Command-line interface for comic archives.
//!
//! Probes archives, loads them into pages and writes cover thumbnails,
//! using the same pipeline a viewer would.

use clap::{Parser, Subcommand};
use comic::{
    classify, Capabilities, CollectionBuilder, ComicError, ComicSession, LoadOptions, LoadStage,
    MediaKind, UnknownFormatPolicy, VideoSourcePreference,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "cbx")]
#[command(version, about = "Read comic archives from the command line", long_about = None)]
struct Cli {
    /// JSON file with load options
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Reject files with an unrecognized signature instead of trying ZIP
    #[arg(long, global = true)]
    reject_unknown: bool,

    /// Show HEIC/HEIF pages without transcoding
    #[arg(long, global = true)]
    no_transcode: bool,

    /// Inline videos as data URIs instead of blob handles
    #[arg(long, global = true)]
    inline_video: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the detected format and how each entry is classified
    Probe {
        /// Archive file to probe
        archive: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load an archive and list its pages in reading order
    Pages {
        /// Archive file to load
        archive: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the first image page of an archive to a file
    Thumbnail {
        /// Archive file to read
        src: PathBuf,

        /// Destination image file
        dest: PathBuf,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProbeReport {
    source: String,
    format: comic::ArchiveFormat,
    entries: Vec<ProbeEntry>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ProbeEntry {
    path: String,
    directory: bool,
    size: Option<u64>,
    kind: Option<MediaKind>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let builder = match builder_from(&cli) {
        Ok(builder) => builder,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Probe { archive, json } => handle_probe(&builder, &archive, json),
        Commands::Pages { archive, json } => handle_pages(builder, &archive, json).await,
        Commands::Thumbnail { src, dest } => handle_thumbnail(builder, src, dest).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e.user_message());
        process::exit(1);
    }
}

fn builder_from(cli: &Cli) -> Result<CollectionBuilder, Box<dyn std::error::Error>> {
    let mut options = match &cli.config {
        Some(path) => LoadOptions::from_json_file(path)
            .map_err(|e| format!("failed to read config {:?}: {}", path, e))?,
        None => LoadOptions::default(),
    };
    if cli.reject_unknown {
        options.unknown_format = UnknownFormatPolicy::Reject;
    }
    if cli.inline_video {
        options.video_source = VideoSourcePreference::DataUri;
    }

    let mut capabilities = Capabilities::detect();
    if cli.no_transcode {
        capabilities = capabilities.without_transcoder();
    }
    tracing::debug!("Using {:?} with {:?}", options, capabilities);

    Ok(CollectionBuilder::new(options, capabilities))
}

fn handle_probe(
    builder: &CollectionBuilder,
    archive: &Path,
    json: bool,
) -> Result<(), ComicError> {
    let detected = comic::detect(archive);
    let format = builder.resolve_format(archive)?;
    let entries = comic::list_entries(archive, format)?;

    let report = ProbeReport {
        source: archive.display().to_string(),
        format: detected,
        entries: entries
            .iter()
            .map(|entry| ProbeEntry {
                path: classify::normalize_path(entry.path()),
                directory: classify::is_directory(entry),
                size: entry.size(),
                kind: classify::media_kind(entry),
            })
            .collect(),
    };

    if json {
        print_json(&report)?;
        return Ok(());
    }

    println!("{} ({}, read as {})", report.source, detected, format);
    for entry in &report.entries {
        let label = match (entry.directory, entry.kind) {
            (true, _) => "dir",
            (false, Some(MediaKind::Image)) => "image",
            (false, Some(MediaKind::Video)) => "video",
            (false, None) => "-",
        };
        let size = entry.size.map_or_else(|| "?".to_string(), |s| s.to_string());
        println!("  {:<6} {:>10}  {}", label, size, entry.path);
    }
    Ok(())
}

async fn handle_pages(
    builder: CollectionBuilder,
    archive: &Path,
    json: bool,
) -> Result<(), ComicError> {
    let session = ComicSession::new(builder);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));

    let observed = spinner.clone();
    let result = session
        .load_with_progress(archive, move |stage| observed.set_message(stage_message(stage)))
        .await;
    spinner.finish_and_clear();

    let collection = result?;
    let summary = collection.summary();

    if json {
        print_json(&summary)?;
    } else {
        println!(
            "{} ({}): {} pages, {} skipped",
            summary.source, summary.format, summary.page_count, summary.skipped
        );
        for page in &summary.pages {
            let note = page
                .degradation
                .as_deref()
                .map(|d| format!("  [{}]", d))
                .unwrap_or_default();
            println!("  {:>4}  {:<16} {}{}", page.number, page.mime, page.entry_path, note);
        }
    }

    session.close();
    Ok(())
}

async fn handle_thumbnail(
    builder: CollectionBuilder,
    src: PathBuf,
    dest: PathBuf,
) -> Result<(), ComicError> {
    let info =
        tokio::task::spawn_blocking(move || comic::generate_thumbnail(&builder, &src, &dest))
            .await??;

    println!(
        "Wrote {} ({}, {} bytes) from {}",
        info.dest.display(),
        info.mime,
        info.bytes_written,
        info.entry_path
    );
    Ok(())
}

fn stage_message(stage: LoadStage) -> String {
    match stage {
        LoadStage::Detecting => "Detecting format...".to_string(),
        LoadStage::Listing(format) => format!("Reading {} entries...", format),
        LoadStage::Filtering => "Sorting pages...".to_string(),
        LoadStage::Materializing { index, total } => format!("Loading page {}/{}", index, total),
        LoadStage::Ready => "Ready".to_string(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), ComicError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| ComicError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    println!("{}", text);
    Ok(())
}
