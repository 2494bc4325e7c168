//! # Telescope telemetry
//!
//! The mount position of the telescope is recorded irregularly, roughly every 4.3 s, while
//! the animation needs one pointing per output frame (every 60 s). This module holds the
//! sample type, the [`TelemetrySource`] seam with a file-backed implementation, the CSV
//! reader for the telemetry database export, and the
//! [`TelemetryAligner`](crate::telemetry::aligner::TelemetryAligner) that resolves one
//! sample per frame with a bounded forward search.
//!
//! ## Layout
//!
//! ```text
//! telemetry
//! ├── aligner     (windowed forward-only nearest-preceding search)
//! └── csv_reader  (time_recorded,mount_el,mount_az export)
//! ```
pub mod aligner;
pub mod csv_reader;

use camino::{Utf8Path, Utf8PathBuf};
use hifitime::Epoch;
use log::debug;

use crate::{
    constants::Degree, coordinates::SkyAngle, desipoint_errors::DesipointError,
    time::{display_timestamp, seconds},
};

/// How far back [`TelemetrySource::fetch_latest_before`] looks by default.
const LATEST_LOOKBACK_SECONDS: i64 = 3600;

/// One mount position record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetrySample {
    pub recorded: Epoch,
    pub mount_altitude: Degree,
    pub mount_azimuth: Degree,
}

impl TelemetrySample {
    pub fn new(recorded: Epoch, mount_altitude: Degree, mount_azimuth: Degree) -> Self {
        TelemetrySample {
            recorded,
            mount_altitude,
            mount_azimuth,
        }
    }

    /// Pointing of the mount as a horizon position.
    pub fn sky_angle(&self) -> SkyAngle {
        SkyAngle::new(self.mount_altitude, self.mount_azimuth)
    }
}

/// Last sample recorded strictly before `instant`, in a time-ordered slice.
///
/// This is the lookup used when a single frame is produced: the pointing shown is the
/// latest one the telescope reported before the image was taken.
pub fn latest_before(samples: &[TelemetrySample], instant: Epoch) -> Option<&TelemetrySample> {
    let idx = samples.partition_point(|s| s.recorded < instant);
    idx.checked_sub(1).map(|i| &samples[i])
}

/// Provider of mount telemetry.
pub trait TelemetrySource {
    /// All samples recorded in `[start, end)`, time-ordered.
    ///
    /// An unreachable or failing backend yields [`DesipointError::TelemetryUnavailable`]
    /// (or [`DesipointError::Unauthorized`] for rejected credentials).
    fn fetch_telemetry_range(
        &self,
        start: Epoch,
        end: Epoch,
    ) -> Result<Vec<TelemetrySample>, DesipointError>;

    /// Latest sample recorded strictly before `instant`, `None` if there is none in the
    /// preceding hour.
    fn fetch_latest_before(
        &self,
        instant: Epoch,
    ) -> Result<Option<TelemetrySample>, DesipointError> {
        let samples =
            self.fetch_telemetry_range(instant - seconds(LATEST_LOOKBACK_SECONDS), instant)?;
        Ok(latest_before(&samples, instant).copied())
    }
}

/// A telemetry export stored on disk.
#[derive(Debug, Clone)]
pub struct CsvTelemetryFile {
    path: Utf8PathBuf,
}

impl CsvTelemetryFile {
    pub fn new(path: &Utf8Path) -> Self {
        CsvTelemetryFile {
            path: path.to_path_buf(),
        }
    }
}

impl TelemetrySource for CsvTelemetryFile {
    fn fetch_telemetry_range(
        &self,
        start: Epoch,
        end: Epoch,
    ) -> Result<Vec<TelemetrySample>, DesipointError> {
        let file = std::fs::File::open(&self.path).map_err(|err| {
            DesipointError::TelemetryUnavailable(format!("{}: {err}", self.path))
        })?;
        let samples: Vec<TelemetrySample> = csv_reader::parse_telemetry_csv(file)?
            .into_iter()
            .filter(|s| s.recorded >= start && s.recorded < end)
            .collect();
        debug!(
            "{} telemetry samples in [{}, {}) from {}",
            samples.len(),
            display_timestamp(start),
            display_timestamp(end),
            self.path
        );
        Ok(samples)
    }
}

impl TelemetrySource for Vec<TelemetrySample> {
    fn fetch_telemetry_range(
        &self,
        start: Epoch,
        end: Epoch,
    ) -> Result<Vec<TelemetrySample>, DesipointError> {
        Ok(self
            .iter()
            .filter(|s| s.recorded >= start && s.recorded < end)
            .copied()
            .collect())
    }
}
