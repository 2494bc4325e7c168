//! # Lens projection model
//!
//! Maps a local sky position to a pixel of the fisheye sensor:
//!
//! ```text
//! z   = 90° − altitude
//! r   = table(z)                       (clamped piecewise-linear)
//! az' = azimuth + rotation_offset
//! dx  = −r·sin(az'),  dy = r·cos(az')   (angle measured from vertical, mirrored)
//! x   = center_x + dx + offset_x
//! y   = center_y − dy + offset_y       (pixel rows grow downward)
//! ```
//!
//! The swapped sine/cosine and the negative `dx` encode the camera's mirror orientation:
//! north is up and east is to the left, as seen looking up at the sky.
//!
//! The model is total: any altitude and azimuth, including values outside the calibrated
//! domain, produce a pixel (saturated at the table edge). Only a NaN input produces an
//! invalid point.
use hifitime::Epoch;

use crate::{
    calibration::{CalibrationTable, CameraCalibration},
    constants::{Degree, Pixel, RADEG},
    coordinates::{LocalSkyTransform, PixelPoint, RaDec, SkyAngle},
    desipoint_errors::DesipointError,
};

#[derive(Debug, Clone)]
pub struct LensProjectionModel {
    table: CalibrationTable,
    rotation_offset: Degree,
    center: (Pixel, Pixel),
    center_offset: (Pixel, Pixel),
}

impl LensProjectionModel {
    /// Build the model from a camera calibration.
    ///
    /// Return
    /// ------
    /// * the model, or [`DesipointError::InvalidCalibrationTable`] if the radial table is invalid
    pub fn new(calibration: &CameraCalibration) -> Result<Self, DesipointError> {
        Ok(LensProjectionModel {
            table: calibration.table()?,
            rotation_offset: calibration.rotation_offset_deg,
            center: calibration.center_px,
            center_offset: calibration.center_offset_px,
        })
    }

    pub fn table(&self) -> &CalibrationTable {
        &self.table
    }

    /// Pixel of the true zenith: geometric center plus the optical-center correction.
    pub fn optical_center(&self) -> PixelPoint {
        PixelPoint::new(
            self.center.0 + self.center_offset.0,
            self.center.1 + self.center_offset.1,
        )
    }

    /// Project one sky position onto the sensor.
    pub fn project(&self, angle: SkyAngle) -> PixelPoint {
        let r = self.table.radius_at(angle.zenith_angle());
        let (sin_az, cos_az) = ((angle.azimuth + self.rotation_offset) * RADEG).sin_cos();

        let dx = -r * sin_az;
        let dy = r * cos_az;

        PixelPoint::new(
            dx + self.center.0 + self.center_offset.0,
            self.center.1 - dy + self.center_offset.1,
        )
    }

    /// Element-wise [`project`](LensProjectionModel::project), preserving order.
    pub fn project_all(&self, angles: &[SkyAngle]) -> Vec<PixelPoint> {
        angles.iter().map(|a| self.project(*a)).collect()
    }

    /// Resolve equatorial positions at `epoch` and project them.
    ///
    /// Arguments
    /// ---------
    /// * `transform`: the celestial-to-local conversion of the camera site
    /// * `points`: equatorial positions in degrees
    /// * `epoch`: observation instant
    ///
    /// Return
    /// ------
    /// * one pixel per input point, unclipped
    pub fn project_radec<T: LocalSkyTransform + ?Sized>(
        &self,
        transform: &T,
        points: &[RaDec],
        epoch: Epoch,
    ) -> Vec<PixelPoint> {
        points
            .iter()
            .map(|p| self.project(transform.resolve_local_angle(p.ra, p.dec, epoch)))
            .collect()
    }
}
