//! # Run configuration
//!
//! Everything that parameterizes a run but is not a per-invocation argument: camera
//! calibration, observing site, data endpoints and cadences. The defaults describe the
//! Spacewatch all-sky camera at Kitt Peak and the DESI data services, so an empty YAML file
//! is a valid configuration.
//!
//! ```yaml
//! site:
//!   utc_offset_hours: -7
//! curve_dir: data/curves
//! frame_interval_s: 60
//! alignment_window:
//!   start_offset: 10
//!   end_offset: 30
//! ```
use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::{
    calibration::CameraCalibration,
    constants::{
        DEFAULT_IMAGE_BASE_URL, DEFAULT_TELEMETRY_QUERY_URL, FRAME_INTERVAL_SECONDS,
        IMAGE_INTERVAL_SECONDS,
    },
    desipoint_errors::DesipointError,
    observer_site::ObserverSite,
    telemetry::aligner::AlignmentWindow,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub camera: CameraCalibration,
    pub site: ObserverSite,
    /// Root of the image archive, the date path and file name are appended.
    pub image_base_url: String,
    pub telemetry_query_url: String,
    /// JSON file with the telemetry credentials, `{"usr": .., "pass": ..}`.
    pub credentials_file: Utf8PathBuf,
    /// Directory holding the `<name>.json` reference curves.
    pub curve_dir: Utf8PathBuf,
    pub image_interval_s: i64,
    pub frame_interval_s: i64,
    pub alignment_window: AlignmentWindow,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            camera: CameraCalibration::default(),
            site: ObserverSite::default(),
            image_base_url: DEFAULT_IMAGE_BASE_URL.to_string(),
            telemetry_query_url: DEFAULT_TELEMETRY_QUERY_URL.to_string(),
            credentials_file: Utf8PathBuf::from("auth.txt"),
            curve_dir: Utf8PathBuf::from("data"),
            image_interval_s: IMAGE_INTERVAL_SECONDS,
            frame_interval_s: FRAME_INTERVAL_SECONDS,
            alignment_window: AlignmentWindow::default(),
        }
    }
}

impl RunConfig {
    /// Read a configuration from a YAML file.
    ///
    /// Missing fields take their default value. The camera table is validated and the
    /// cadences must be positive, with the image interval a multiple of the frame interval.
    pub fn load(path: &Utf8Path) -> Result<Self, DesipointError> {
        let contents = std::fs::read_to_string(path)?;
        let config: RunConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DesipointError> {
        self.camera.table()?;
        if self.frame_interval_s <= 0
            || self.image_interval_s <= 0
            || self.image_interval_s % self.frame_interval_s != 0
        {
            return Err(DesipointError::InvalidTimeRange(format!(
                "image interval {}s is not a positive multiple of frame interval {}s",
                self.image_interval_s, self.frame_interval_s
            )));
        }
        self.alignment_window.validate()
    }
}
