//! # Sky and sensor coordinates
//!
//! Value types shared by the projection pipeline:
//!
//! ```text
//! RaDec (ICRS, degrees) --LocalSkyTransform--> SkyAngle (alt/az) --LensProjectionModel--> PixelPoint
//! ```
//!
//! [`LocalSkyTransform`] is the seam where the celestial-to-horizon conversion is injected,
//! so the lens geometry can be exercised without any ephemeris machinery.
use hifitime::Epoch;
use serde::{Deserialize, Serialize};

use crate::constants::{Degree, Pixel};

/// Equatorial position, right ascension and declination in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RaDec {
    pub ra: Degree,
    pub dec: Degree,
}

impl RaDec {
    pub fn new(ra: Degree, dec: Degree) -> Self {
        RaDec { ra, dec }
    }
}

impl From<(Degree, Degree)> for RaDec {
    fn from((ra, dec): (Degree, Degree)) -> Self {
        RaDec { ra, dec }
    }
}

/// Local horizon position for one observer and one instant.
///
/// Altitude is measured above the horizon, azimuth from north through east, both in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SkyAngle {
    pub altitude: Degree,
    pub azimuth: Degree,
}

impl SkyAngle {
    pub fn new(altitude: Degree, azimuth: Degree) -> Self {
        SkyAngle { altitude, azimuth }
    }

    /// Angular distance from the zenith.
    pub fn zenith_angle(&self) -> Degree {
        90. - self.altitude
    }
}

/// Position on the sensor, origin at the top-left corner, rows increasing downward.
///
/// A point falling outside the usable field is replaced by [`PixelPoint::INVALID`] so that
/// its slot in a polyline is kept as a gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: Pixel,
    pub y: Pixel,
}

impl PixelPoint {
    pub const INVALID: PixelPoint = PixelPoint {
        x: Pixel::NAN,
        y: Pixel::NAN,
    };

    pub fn new(x: Pixel, y: Pixel) -> Self {
        PixelPoint { x, y }
    }

    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean distance to `other`, NaN if either point is invalid.
    pub fn distance_to(&self, other: &PixelPoint) -> Pixel {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Celestial-to-local conversion for a fixed observer.
pub trait LocalSkyTransform {
    /// Horizon position of `(ra, dec)` as seen at `epoch`.
    fn resolve_local_angle(&self, ra: Degree, dec: Degree, epoch: Epoch) -> SkyAngle;
}

impl<T: LocalSkyTransform + ?Sized> LocalSkyTransform for &T {
    fn resolve_local_angle(&self, ra: Degree, dec: Degree, epoch: Epoch) -> SkyAngle {
        (**self).resolve_local_angle(ra, dec, epoch)
    }
}

#[cfg(test)]
mod coordinates_test {
    use super::*;

    #[test]
    fn test_invalid_point() {
        assert!(!PixelPoint::INVALID.is_valid());
        assert!(PixelPoint::new(0., 1023.).is_valid());
        assert!(PixelPoint::INVALID
            .distance_to(&PixelPoint::new(0., 0.))
            .is_nan());
    }

    #[test]
    fn test_distance() {
        let a = PixelPoint::new(512., 512.);
        assert_eq!(a.distance_to(&PixelPoint::new(515., 516.)), 5.);
    }

    #[test]
    fn test_zenith_angle() {
        assert_eq!(SkyAngle::new(90., 12.).zenith_angle(), 0.);
        assert_eq!(SkyAngle::new(0., 12.).zenith_angle(), 90.);
        assert_eq!(SkyAngle::new(-5., 12.).zenith_angle(), 95.);
    }
}
