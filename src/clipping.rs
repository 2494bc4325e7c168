use crate::{
    calibration::CameraCalibration,
    constants::Pixel,
    coordinates::PixelPoint,
};

/// Masks the points falling outside the usable circular field of the sensor.
///
/// Clipped points are replaced by [`PixelPoint::INVALID`] rather than removed, so a
/// polyline keeps its vertex indices and renders a gap where it leaves the field.
/// Clipping is idempotent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameClipper {
    center: PixelPoint,
    validity_radius: Pixel,
}

impl FrameClipper {
    pub fn new(center: PixelPoint, validity_radius: Pixel) -> Self {
        FrameClipper {
            center,
            validity_radius,
        }
    }

    /// Clipper centered on the geometric frame center of the camera.
    pub fn from_calibration(calibration: &CameraCalibration) -> Self {
        FrameClipper::new(
            PixelPoint::new(calibration.center_px.0, calibration.center_px.1),
            calibration.validity_radius_px,
        )
    }

    /// `true` if `point` is valid and lies within the validity radius (boundary included).
    pub fn contains(&self, point: &PixelPoint) -> bool {
        point.is_valid() && point.distance_to(&self.center) <= self.validity_radius
    }

    /// Invalidate, in place, every point outside the field.
    pub fn clip_in_place(&self, points: &mut [PixelPoint]) {
        for point in points.iter_mut() {
            if !self.contains(point) {
                *point = PixelPoint::INVALID;
            }
        }
    }

    /// Owned variant of [`clip_in_place`](FrameClipper::clip_in_place).
    pub fn clip(&self, mut points: Vec<PixelPoint>) -> Vec<PixelPoint> {
        self.clip_in_place(&mut points);
        points
    }
}

#[cfg(test)]
mod clipping_test {
    use super::*;

    fn clipper() -> FrameClipper {
        FrameClipper::from_calibration(&CameraCalibration::default())
    }

    fn ring(radius: Pixel, n: usize) -> Vec<PixelPoint> {
        (0..n)
            .map(|i| {
                let a = i as f64 * std::f64::consts::TAU / n as f64;
                PixelPoint::new(512. + radius * a.cos(), 512. + radius * a.sin())
            })
            .collect()
    }

    #[test]
    fn test_keeps_length_and_order() {
        let points = vec![
            PixelPoint::new(512., 512.),
            PixelPoint::new(0., 0.),
            PixelPoint::new(600., 400.),
            PixelPoint::new(1020., 512.),
            PixelPoint::new(512., 1015.),
        ];
        let clipped = clipper().clip(points.clone());
        assert_eq!(clipped.len(), points.len());
        assert_eq!(clipped[0], points[0]);
        assert!(!clipped[1].is_valid());
        assert_eq!(clipped[2], points[2]);
        assert!(!clipped[3].is_valid());
        assert_eq!(clipped[4], points[4]);
    }

    #[test]
    fn test_boundary_is_inside() {
        assert!(clipper().contains(&PixelPoint::new(512. + 504., 512.)));
        assert!(!clipper().contains(&PixelPoint::new(512. + 504.001, 512.)));
    }

    #[test]
    fn test_idempotent() {
        let mut points = ring(400., 50);
        points.extend(ring(510., 50));
        points.push(PixelPoint::INVALID);

        let once = clipper().clip(points);
        let twice = clipper().clip(once.clone());
        assert_eq!(once.len(), twice.len());
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_eq!(a.is_valid(), b.is_valid());
            if a.is_valid() {
                assert_eq!(a, b);
            }
        }
    }

    #[test]
    fn test_survivors_are_never_shifted() {
        let mut points = ring(300., 120);
        points.extend(ring(503.9, 120));
        points.extend(ring(504.5, 120));
        points.extend(ring(800., 120));

        let clipped = clipper().clip(points.clone());
        let center = PixelPoint::new(512., 512.);
        for (before, after) in points.iter().zip(clipped.iter()) {
            if after.is_valid() {
                assert_eq!(before, after);
                assert!(after.distance_to(&center) <= 504.);
            } else {
                assert!(before.distance_to(&center) > 504.);
            }
        }
        assert_eq!(clipped.iter().filter(|p| p.is_valid()).count(), 240);
    }
}
