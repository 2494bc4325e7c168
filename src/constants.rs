//! # Constants and type definitions for desipoint
//!
//! This module centralizes the **unit conversions**, **camera defaults** and **common type
//! aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - Unit conversions (degrees ↔ radians) and the J2000 reference epoch
//! - Calibration of the Spacewatch all-sky camera at Kitt Peak
//! - Geodetic position of the camera
//! - Cadence of the image archive and of the produced animation
//!
//! The camera values are only **defaults**: every consumer receives them through
//! [`CameraCalibration`](crate::calibration::CameraCalibration) and
//! [`ObserverSite`](crate::observer_site::ObserverSite), so synthetic calibrations can be
//! injected in tests.

// -------------------------------------------------------------------------------------------------
// Unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// MJD epoch of J2000.0 (2000-01-01 12:00:00 TT)
pub const T2000: f64 = 51544.5;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Distance in sensor pixels
pub type Pixel = f64;
/// Distance in meters
pub type Meter = f64;
/// Modified Julian Date (days)
pub type MJD = f64;

// -------------------------------------------------------------------------------------------------
// Spacewatch all-sky camera (Kitt Peak)
// -------------------------------------------------------------------------------------------------

/// Zenith angles of the radial calibration breakpoints, in degrees.
pub const SPACEWATCH_ZENITH_BREAKPOINTS: [Degree; 11] =
    [0., 10., 20., 30., 40., 50., 60., 70., 80., 90., 95.];

/// Pixel radius measured at each of [`SPACEWATCH_ZENITH_BREAKPOINTS`].
pub const SPACEWATCH_RADIUS_BREAKPOINTS: [Pixel; 11] =
    [0., 55., 110., 165., 220., 275., 330., 385., 435., 480., 510.];

/// The camera is mounted rotated by 0.1° in azimuth.
pub const SPACEWATCH_ROTATION_OFFSET: Degree = 0.1;

/// Geometric center of the 1024×1024 frame.
pub const SPACEWATCH_CENTER: (Pixel, Pixel) = (512., 512.);

/// True zenith sits 2 px right and 3 px down from the geometric center.
pub const SPACEWATCH_CENTER_OFFSET: (Pixel, Pixel) = (2., 3.);

/// Radius of the usable circular field of view.
pub const SPACEWATCH_VALIDITY_RADIUS: Pixel = 504.;

/// Side of the square sensor frame.
pub const SPACEWATCH_FRAME_SIZE: u32 = 1024;

/// Camera geodetic latitude (degrees, north positive)
pub const KITT_PEAK_LATITUDE: Degree = 31.959417;

/// Camera geodetic longitude (degrees, east positive)
pub const KITT_PEAK_LONGITUDE: Degree = -111.598583;

/// Camera height above the ellipsoid
pub const KITT_PEAK_HEIGHT: Meter = 2120.;

/// Arizona does not observe daylight saving time.
pub const KITT_PEAK_UTC_OFFSET_HOURS: i64 = -7;

// -------------------------------------------------------------------------------------------------
// Archive and animation cadence
// -------------------------------------------------------------------------------------------------

/// The archive stores one image every two minutes.
pub const IMAGE_INTERVAL_SECONDS: i64 = 120;

/// One output frame per minute, i.e. two frames per image.
pub const FRAME_INTERVAL_SECONDS: i64 = 60;

/// Images are captured 5 s past an even minute.
pub const CAPTURE_SECOND_OFFSET: u8 = 5;

/// Cropped image archive of the Kitt Peak all-sky cameras.
pub const DEFAULT_IMAGE_BASE_URL: &str =
    "http://varuna.kpno.noirlab.edu/allsky-all/images/cropped/";

/// Query endpoint of the DESI telemetry replicator.
pub const DEFAULT_TELEMETRY_QUERY_URL: &str = "https://replicator.desi.lbl.gov/TV3/app/Q/query";
