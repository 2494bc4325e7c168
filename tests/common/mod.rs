#![allow(dead_code)]

use std::collections::HashMap;

use desipoint::{
    coordinates::RaDec,
    curves::{ECLIPTIC, SURVEY_LEFT, SURVEY_RIGHT},
    desipoint_errors::DesipointError,
    images::{ImageSample, ImageSource},
    telemetry::{TelemetrySample, TelemetrySource},
};
use hifitime::{Duration, Epoch};
use image::{GrayImage, Luma};

pub fn utc(h: u8, m: u8, s: u8) -> Epoch {
    Epoch::from_gregorian_utc_hms(2020, 3, 16, h, m, s)
}

/// In-memory archive serving a small uniform raster for every slot not listed as missing.
pub struct SyntheticArchive {
    pub missing: Vec<Epoch>,
}

impl SyntheticArchive {
    pub fn complete() -> Self {
        SyntheticArchive {
            missing: Vec::new(),
        }
    }

    pub fn without(missing: Vec<Epoch>) -> Self {
        SyntheticArchive { missing }
    }
}

impl ImageSource for SyntheticArchive {
    fn fetch_image(&self, capture: Epoch) -> Result<ImageSample, DesipointError> {
        if self.missing.contains(&capture) {
            return Err(DesipointError::ImageNotFound(format!("{capture}")));
        }
        let (_, _, _, _, minute, _, _) = capture.to_gregorian_utc();
        Ok(ImageSample::new(
            capture,
            GrayImage::from_pixel(16, 16, Luma([minute])),
        ))
    }
}

/// Telemetry source that is always down.
pub struct OfflineTelemetry;

impl TelemetrySource for OfflineTelemetry {
    fn fetch_telemetry_range(
        &self,
        _start: Epoch,
        _end: Epoch,
    ) -> Result<Vec<TelemetrySample>, DesipointError> {
        Err(DesipointError::TelemetryUnavailable(
            "replicator unreachable".into(),
        ))
    }
}

/// `n` mount positions every `cadence_ms`, starting at `first`, slowly slewing in azimuth.
pub fn telemetry_stream(first: Epoch, n: usize, cadence_ms: f64) -> Vec<TelemetrySample> {
    (0..n)
        .map(|i| {
            TelemetrySample::new(
                first + Duration::from_milliseconds(cadence_ms * i as f64),
                60.,
                (i as f64 * 0.05) % 360.,
            )
        })
        .collect()
}

/// Survey halves as parallels of declination and an ecliptic-like great circle; no
/// Milky Way.
pub fn reference_curves() -> HashMap<String, Vec<RaDec>> {
    let parallel = |dec: f64| -> Vec<RaDec> {
        (0..72).map(|i| RaDec::new(i as f64 * 5., dec)).collect()
    };
    let ecliptic: Vec<RaDec> = (0..360)
        .map(|i| {
            let lon = (i as f64).to_radians();
            let eps = 23.44_f64.to_radians();
            let ra = (lon.sin() * eps.cos()).atan2(lon.cos()).to_degrees();
            let dec = (lon.sin() * eps.sin()).asin().to_degrees();
            RaDec::new(ra.rem_euclid(360.), dec)
        })
        .collect();

    HashMap::from([
        (SURVEY_LEFT.to_string(), parallel(10.)),
        (SURVEY_RIGHT.to_string(), parallel(50.)),
        (ECLIPTIC.to_string(), ecliptic),
    ])
}
