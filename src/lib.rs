pub mod calibration;
pub mod clipping;
pub mod config;
pub mod constants;
pub mod coordinates;
pub mod curves;
pub mod desipoint_errors;
#[cfg(feature = "download")]
pub mod env_state;
pub mod images;
pub mod observer_site;
pub mod overlays;
pub mod projection;
#[cfg(feature = "download")]
pub mod remote;
pub mod sequencer;
pub mod telemetry;
pub mod time;

#[cfg(test)]
pub(crate) mod unit_test_global {
    use std::sync::LazyLock;

    use crate::{
        calibration::CameraCalibration, clipping::FrameClipper, projection::LensProjectionModel,
    };

    pub(crate) static SPACEWATCH_MODEL: LazyLock<LensProjectionModel> = LazyLock::new(|| {
        LensProjectionModel::new(&CameraCalibration::default()).unwrap()
    });

    pub(crate) static SPACEWATCH_CLIPPER: LazyLock<FrameClipper> =
        LazyLock::new(|| FrameClipper::from_calibration(&CameraCalibration::default()));
}
