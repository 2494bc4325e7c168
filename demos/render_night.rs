//! Compute the overlay geometry of a night of all-sky images.
//!
//! ```text
//! cargo run --example render_night -- "2020-03-16 02:30:05" --end "2020-03-16 05:30:05" --all
//! cargo run --example render_night -- "2020-03-16 06:00:00" --image --survey --file frame.jpg
//! ```
//!
//! Each frame is written as one JSON line: the index, the capture of the base image and the
//! frame geometry (label, pointing marker, clipped overlay points).
use std::{
    fs::File,
    io::{self, BufWriter, Write},
};

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use serde_json::json;

use desipoint::{
    config::RunConfig,
    curves::JsonCurveDirectory,
    env_state::DesipointEnv,
    images::{ImageSource, LocalImageDirectory, SingleImageFile},
    overlays::{build_overlays, OverlaySelection},
    remote::{AllSkyArchive, Credentials, TelemetryReplicator},
    sequencer::{FrameSequencer, SequenceRequest},
    telemetry::{CsvTelemetryFile, TelemetrySource},
    time::{display_timestamp, parse_utc_timestamp, seconds},
};

#[derive(Parser)]
#[command(author, version, about = "All-sky camera overlay geometry")]
struct Args {
    /// Start of the range (or the image time with --image), UTC
    start: String,
    /// End of the range, UTC; three hours after the start by default
    #[arg(long)]
    end: Option<String>,
    /// Produce a single annotated image instead of an animation
    #[arg(long, default_value_t = false)]
    image: bool,
    #[arg(long, default_value_t = false)]
    milkyway: bool,
    #[arg(long, default_value_t = false)]
    ecliptic: bool,
    #[arg(long, default_value_t = false)]
    survey: bool,
    #[arg(long, default_value_t = false)]
    pointing: bool,
    /// Enable every overlay
    #[arg(long, default_value_t = false)]
    all: bool,
    /// Use this image file instead of the archive (single image mode)
    #[arg(long)]
    file: Option<Utf8PathBuf>,
    /// YAML run configuration
    #[arg(long)]
    config: Option<Utf8PathBuf>,
    /// Local mirror of the image archive
    #[arg(long)]
    images_dir: Option<Utf8PathBuf>,
    /// Telemetry CSV export, instead of the replicator
    #[arg(long)]
    telemetry_csv: Option<Utf8PathBuf>,
    /// Output file, standard output by default
    #[arg(long)]
    out: Option<Utf8PathBuf>,
}

impl Args {
    fn selection(&self) -> OverlaySelection {
        if self.all {
            return OverlaySelection::all();
        }
        OverlaySelection {
            survey: self.survey,
            milky_way: self.milkyway,
            ecliptic: self.ecliptic,
            pointing: self.pointing,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RunConfig::load(path)?,
        None => RunConfig::default(),
    };
    let selection = args.selection();
    let env = DesipointEnv::new()?;

    let images: Box<dyn ImageSource> = match (&args.file, &args.images_dir) {
        (Some(file), _) => Box::new(SingleImageFile::new(file)),
        (None, Some(dir)) => Box::new(LocalImageDirectory::new(dir.clone())),
        (None, None) => Box::new(AllSkyArchive::new(env.clone(), &config.image_base_url)),
    };

    let telemetry: Option<Box<dyn TelemetrySource>> = if !selection.pointing {
        None
    } else if let Some(csv) = &args.telemetry_csv {
        Some(Box::new(CsvTelemetryFile::new(csv)))
    } else {
        match Credentials::load(&config.credentials_file) {
            Ok(credentials) => Some(Box::new(TelemetryReplicator::new(
                env.clone(),
                &config.telemetry_query_url,
                credentials,
            ))),
            Err(err) => {
                log::warn!("Loading authentication failed: {err}");
                None
            }
        }
    };

    let overlays = build_overlays(&selection, &JsonCurveDirectory::new(config.curve_dir.clone()));
    let sequencer = FrameSequencer::from_config(&config, overlays)?;

    let mut out: Box<dyn Write> = match &args.out {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let start = parse_utc_timestamp(&args.start)?;
    if args.image {
        let snapshot = sequencer.snapshot(start, images.as_ref(), telemetry.as_deref())?;
        let line = json!({
            "index": 0,
            "capture": display_timestamp(snapshot.image.capture),
            "geometry": snapshot.geometry,
        });
        writeln!(out, "{line}")?;
    } else {
        let end = match &args.end {
            Some(end) => parse_utc_timestamp(end)?,
            None => start + seconds(3 * 3600),
        };
        let request = SequenceRequest::from_config(start, end, &config)?;
        let run = sequencer.prepare(&request, images.as_ref(), telemetry.as_deref())?;

        for frame in run.frames() {
            let line = json!({
                "index": frame.index,
                "capture": display_timestamp(frame.image.capture),
                "geometry": frame.geometry,
            });
            writeln!(out, "{line}")?;
        }
        info!(
            "Wrote {} frames, {} image slots skipped",
            run.frame_count(),
            run.skipped().len()
        );
    }

    out.flush()?;
    Ok(())
}
