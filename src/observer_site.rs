//! # Observer site and horizon transform
//!
//! [`ObserverSite`] holds the geodetic position of the camera and implements
//! [`LocalSkyTransform`] with the textbook equatorial → horizon rotation:
//!
//! 1. Local sidereal time = [`gmst`] (UTC taken as UT1) + east longitude.
//! 2. Hour angle `H = LST − α`.
//! 3. The unit vector `(cos δ cos H, −cos δ sin H, sin δ)` of the hour-angle frame is rotated
//!    into the local (north, east, zenith) frame, a rotation about the east axis by the
//!    colatitude.
//!
//! Precession, nutation, aberration and atmospheric refraction are ignored. The resulting
//! error is a fraction of a degree, a few pixels at most on a 1024 px fisheye frame, which is
//! negligible for overlay curves. A more rigorous transform can be injected through the
//! [`LocalSkyTransform`] trait.
use hifitime::Epoch;
use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::{
    constants::{
        Degree, Meter, KITT_PEAK_HEIGHT, KITT_PEAK_LATITUDE, KITT_PEAK_LONGITUDE,
        KITT_PEAK_UTC_OFFSET_HOURS, RADEG,
    },
    coordinates::{LocalSkyTransform, SkyAngle},
    time::gmst,
};

/// Geodetic position of the camera and its civil time zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverSite {
    /// Geodetic latitude, degrees north.
    pub latitude_deg: Degree,
    /// Longitude, degrees east of Greenwich.
    pub longitude_deg: Degree,
    pub height_m: Meter,
    /// Fixed offset of the local clock from UTC, used for frame labels.
    pub utc_offset_hours: i64,
}

impl Default for ObserverSite {
    fn default() -> Self {
        ObserverSite {
            latitude_deg: KITT_PEAK_LATITUDE,
            longitude_deg: KITT_PEAK_LONGITUDE,
            height_m: KITT_PEAK_HEIGHT,
            utc_offset_hours: KITT_PEAK_UTC_OFFSET_HOURS,
        }
    }
}

impl ObserverSite {
    pub fn new(latitude_deg: Degree, longitude_deg: Degree, height_m: Meter) -> Self {
        ObserverSite {
            latitude_deg,
            longitude_deg,
            height_m,
            utc_offset_hours: 0,
        }
    }

    /// Local mean sidereal time in radians, in [0, 2π).
    pub fn local_sidereal_time(&self, epoch: Epoch) -> f64 {
        (gmst(epoch.to_mjd_utc_days()) + self.longitude_deg * RADEG)
            .rem_euclid(std::f64::consts::TAU)
    }

    /// Rotation from the hour-angle frame (x to the meridian on the equator, y to the east,
    /// z to the celestial pole) to the local (north, east, zenith) frame.
    fn hour_angle_to_horizon(&self) -> Matrix3<f64> {
        let (sin_lat, cos_lat) = (self.latitude_deg * RADEG).sin_cos();
        Matrix3::new(
            -sin_lat, 0., cos_lat, //
            0., 1., 0., //
            cos_lat, 0., sin_lat,
        )
    }
}

impl LocalSkyTransform for ObserverSite {
    fn resolve_local_angle(&self, ra: Degree, dec: Degree, epoch: Epoch) -> SkyAngle {
        let hour_angle = self.local_sidereal_time(epoch) - ra * RADEG;
        let (sin_h, cos_h) = hour_angle.sin_cos();
        let (sin_dec, cos_dec) = (dec * RADEG).sin_cos();

        let equatorial = Vector3::new(cos_dec * cos_h, -cos_dec * sin_h, sin_dec);
        let local = self.hour_angle_to_horizon() * equatorial;

        let altitude = local.z.clamp(-1., 1.).asin() / RADEG;
        let azimuth = (local.y.atan2(local.x) / RADEG).rem_euclid(360.);
        SkyAngle::new(altitude, azimuth)
    }
}

#[cfg(test)]
mod observer_site_test {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn epoch() -> Epoch {
        Epoch::from_gregorian_utc_hms(2021, 10, 9, 8, 45, 0)
    }

    #[test]
    fn test_meridian_star_at_zenith() {
        let site = ObserverSite::default();
        let lst = site.local_sidereal_time(epoch()) / RADEG;
        let angle = site.resolve_local_angle(lst, site.latitude_deg, epoch());
        assert_abs_diff_eq!(angle.altitude, 90., epsilon = 1e-4);
    }

    #[test]
    fn test_celestial_pole_altitude_is_latitude() {
        let site = ObserverSite::default();
        let angle = site.resolve_local_angle(0., 90., epoch());
        assert_abs_diff_eq!(angle.altitude, site.latitude_deg, epsilon = 1e-9);
        // due north
        let az = if angle.azimuth > 180. {
            angle.azimuth - 360.
        } else {
            angle.azimuth
        };
        assert_abs_diff_eq!(az, 0., epsilon = 1e-6);
    }

    #[test]
    fn test_polaris_close_to_pole() {
        let site = ObserverSite::default();
        let angle = site.resolve_local_angle(37.95456, 89.26411, epoch());
        assert!((angle.altitude - site.latitude_deg).abs() < 1.0);
    }

    #[test]
    fn test_rising_star_in_the_east() {
        // A star on the celestial equator six hours east of the meridian sits on the
        // horizon due east.
        let site = ObserverSite::default();
        let lst = site.local_sidereal_time(epoch()) / RADEG;
        let angle = site.resolve_local_angle(lst + 90., 0., epoch());
        assert_abs_diff_eq!(angle.altitude, 0., epsilon = 1e-9);
        assert_abs_diff_eq!(angle.azimuth, 90., epsilon = 1e-9);
    }

    #[test]
    fn test_sky_drifts_with_time() {
        let site = ObserverSite::default();
        let t0 = epoch();
        let t1 = t0 + hifitime::Duration::from_seconds(60.);
        let a0 = site.resolve_local_angle(150., 20., t0);
        let a1 = site.resolve_local_angle(150., 20., t1);
        assert!(a0 != a1);
    }
}
