//! # Camera calibration
//!
//! The radial lens model of a fisheye all-sky camera is an empirical table mapping the
//! **zenith angle** of a sky position to its **pixel radius** from the optical center.
//! Between breakpoints the radius is interpolated linearly; outside the table it saturates
//! at the nearest edge, never extrapolating.
//!
//! [`CameraCalibration`] gathers that table with the rest of the fixed mounting geometry
//! (rotation, center, optical-center correction, usable field radius). It is an immutable
//! value built once and handed to [`LensProjectionModel`](crate::projection::LensProjectionModel)
//! and [`FrameClipper`](crate::clipping::FrameClipper).
//!
//! ## Configuration file
//!
//! ```yaml
//! zenith_breakpoints: [0, 10, 20, 30, 40, 50, 60, 70, 80, 90, 95]
//! radius_breakpoints: [0, 55, 110, 165, 220, 275, 330, 385, 435, 480, 510]
//! rotation_offset_deg: 0.1
//! center_px: [512, 512]
//! center_offset_px: [2, 3]
//! validity_radius_px: 504
//! frame_size_px: 1024
//! ```
//!
//! Missing keys fall back to the Spacewatch camera defaults.
use camino::Utf8Path;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        Degree, Pixel, SPACEWATCH_CENTER, SPACEWATCH_CENTER_OFFSET, SPACEWATCH_FRAME_SIZE,
        SPACEWATCH_RADIUS_BREAKPOINTS, SPACEWATCH_ROTATION_OFFSET, SPACEWATCH_VALIDITY_RADIUS,
        SPACEWATCH_ZENITH_BREAKPOINTS,
    },
    desipoint_errors::DesipointError,
};

/// Validated (zenith angle → pixel radius) breakpoints.
///
/// Invariants
/// ----------
/// * at least two breakpoints, same number of zenith angles and radii
/// * first breakpoint at the zenith: 0° maps to a radius of 0 px
/// * zenith angles strictly increasing and finite
/// * radii non-decreasing and finite
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    zenith: Vec<Degree>,
    radius: Vec<Pixel>,
}

impl CalibrationTable {
    /// Build a table from its breakpoints.
    ///
    /// Arguments
    /// ---------
    /// * `zenith`: breakpoint zenith angles in degrees
    /// * `radius`: pixel radius at each breakpoint
    ///
    /// Return
    /// ------
    /// * the table, or [`DesipointError::InvalidCalibrationTable`] if an invariant is violated
    pub fn new(zenith: Vec<Degree>, radius: Vec<Pixel>) -> Result<Self, DesipointError> {
        if zenith.len() != radius.len() {
            return Err(DesipointError::InvalidCalibrationTable(format!(
                "{} zenith breakpoints for {} radii",
                zenith.len(),
                radius.len()
            )));
        }
        if zenith.len() < 2 {
            return Err(DesipointError::InvalidCalibrationTable(
                "at least two breakpoints are required".into(),
            ));
        }
        if zenith.iter().chain(radius.iter()).any(|v| !v.is_finite()) {
            return Err(DesipointError::InvalidCalibrationTable(
                "breakpoints must be finite".into(),
            ));
        }
        if zenith[0] != 0. || radius[0] != 0. {
            return Err(DesipointError::InvalidCalibrationTable(format!(
                "first breakpoint must be (0°, 0 px), got ({}°, {} px)",
                zenith[0], radius[0]
            )));
        }
        if !zenith.iter().tuple_windows().all(|(a, b)| a < b) {
            return Err(DesipointError::InvalidCalibrationTable(
                "zenith breakpoints must be strictly increasing".into(),
            ));
        }
        if !radius.iter().tuple_windows().all(|(a, b)| a <= b) {
            return Err(DesipointError::InvalidCalibrationTable(
                "radius breakpoints must be non-decreasing".into(),
            ));
        }
        Ok(CalibrationTable { zenith, radius })
    }

    pub fn zenith_breakpoints(&self) -> &[Degree] {
        &self.zenith
    }

    pub fn radius_breakpoints(&self) -> &[Pixel] {
        &self.radius
    }

    /// Pixel radius at the given zenith angle.
    ///
    /// Piecewise-linear interpolation between breakpoints, clamped to the edge radii outside
    /// the calibrated domain. A NaN zenith angle yields a NaN radius.
    pub fn radius_at(&self, zenith: Degree) -> Pixel {
        if zenith.is_nan() {
            return Pixel::NAN;
        }
        let last = self.zenith.len() - 1;
        if zenith <= self.zenith[0] {
            return self.radius[0];
        }
        if zenith >= self.zenith[last] {
            return self.radius[last];
        }

        // first breakpoint strictly above `zenith`, always in 1..=last here
        let upper = self.zenith.partition_point(|z| *z <= zenith);
        let lower = upper - 1;
        let (z0, z1) = (self.zenith[lower], self.zenith[upper]);
        let (r0, r1) = (self.radius[lower], self.radius[upper]);
        r0 + (zenith - z0) * (r1 - r0) / (z1 - z0)
    }
}

/// Fixed mounting geometry and lens calibration of one all-sky camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraCalibration {
    pub zenith_breakpoints: Vec<Degree>,
    pub radius_breakpoints: Vec<Pixel>,
    /// Added to every azimuth before projection.
    pub rotation_offset_deg: Degree,
    /// Geometric center of the frame, (x, y).
    pub center_px: (Pixel, Pixel),
    /// Measured offset of the true zenith from `center_px`, (right, down).
    pub center_offset_px: (Pixel, Pixel),
    /// Radius of the usable circular field around `center_px`.
    pub validity_radius_px: Pixel,
    pub frame_size_px: u32,
}

impl Default for CameraCalibration {
    fn default() -> Self {
        CameraCalibration {
            zenith_breakpoints: SPACEWATCH_ZENITH_BREAKPOINTS.to_vec(),
            radius_breakpoints: SPACEWATCH_RADIUS_BREAKPOINTS.to_vec(),
            rotation_offset_deg: SPACEWATCH_ROTATION_OFFSET,
            center_px: SPACEWATCH_CENTER,
            center_offset_px: SPACEWATCH_CENTER_OFFSET,
            validity_radius_px: SPACEWATCH_VALIDITY_RADIUS,
            frame_size_px: SPACEWATCH_FRAME_SIZE,
        }
    }
}

impl CameraCalibration {
    /// Calibration with a custom radial table and no rotation or center correction.
    ///
    /// Mostly useful to exercise the projection geometry with round numbers.
    pub fn synthetic(zenith: Vec<Degree>, radius: Vec<Pixel>, center: (Pixel, Pixel)) -> Self {
        CameraCalibration {
            zenith_breakpoints: zenith,
            radius_breakpoints: radius,
            rotation_offset_deg: 0.,
            center_px: center,
            center_offset_px: (0., 0.),
            ..CameraCalibration::default()
        }
    }

    /// Validated radial table of this camera.
    pub fn table(&self) -> Result<CalibrationTable, DesipointError> {
        CalibrationTable::new(
            self.zenith_breakpoints.clone(),
            self.radius_breakpoints.clone(),
        )
    }

    /// Load a calibration from a YAML file, validating its radial table.
    pub fn load(path: &Utf8Path) -> Result<Self, DesipointError> {
        let contents = std::fs::read_to_string(path)?;
        let calibration: CameraCalibration = serde_yaml::from_str(&contents)?;
        calibration.table()?;
        Ok(calibration)
    }
}
