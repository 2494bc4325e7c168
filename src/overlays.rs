//! # Overlay producers
//!
//! Each reference curve drawn on a frame is an independent [`OverlayProducer`]. The set of
//! producers for a run is assembled once by [`build_overlays`] from an [`OverlaySelection`],
//! so frame generation only iterates over whatever producers were selected and successfully
//! loaded.
//!
//! The telescope pointing is selected the same way but is not a curve: a [`PointingOverlay`]
//! turns the telemetry sample aligned with a frame into a [`PointingMarker`], and the
//! sequencer only asks for telemetry when the set holds one.
use hifitime::Epoch;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    clipping::FrameClipper,
    constants::Pixel,
    coordinates::{LocalSkyTransform, PixelPoint, RaDec},
    curves::{decimate, CurveSource, ECLIPTIC, MILKY_WAY, SURVEY_LEFT, SURVEY_RIGHT},
    desipoint_errors::DesipointError,
    projection::LensProjectionModel,
    telemetry::TelemetrySample,
};

/// RGBA, components in `[0, 1]`.
pub type Color = [f32; 4];

pub const SURVEY_EDGE_COLOR: Color = [1., 0., 0., 1.];
pub const SURVEY_FILL_COLOR: Color = [1., 0., 0., 0.05];
pub const MILKY_WAY_COLOR: Color = [1., 0., 1., 1.];
pub const ECLIPTIC_COLOR: Color = [0., 1., 1., 1.];
pub const POINTING_COLOR: Color = [0., 1., 0., 1.];

/// Radius of the ring drawn around the telescope pointing.
pub const POINTING_MARKER_RADIUS_PX: Pixel = 10.;

/// Which overlays a run draws.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlaySelection {
    pub survey: bool,
    pub milky_way: bool,
    pub ecliptic: bool,
    pub pointing: bool,
}

impl OverlaySelection {
    pub fn all() -> Self {
        OverlaySelection {
            survey: true,
            milky_way: true,
            ecliptic: true,
            pointing: true,
        }
    }

    pub fn none() -> Self {
        OverlaySelection::default()
    }

    /// Names of the static curves this selection needs, in drawing order.
    pub fn curve_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.survey {
            names.extend([SURVEY_LEFT, SURVEY_RIGHT]);
        }
        if self.milky_way {
            names.push(MILKY_WAY);
        }
        if self.ecliptic {
            names.push(ECLIPTIC);
        }
        names
    }
}

/// How a renderer should draw an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayStyle {
    /// Closed polygon with an outline and a translucent fill.
    Polygon { edge: Color, fill: Color },
    /// Unconnected dots.
    Dotted { color: Color },
}

impl OverlayStyle {
    /// Style used for a named static curve.
    pub fn for_curve(name: &str) -> Self {
        match name {
            MILKY_WAY => OverlayStyle::Dotted {
                color: MILKY_WAY_COLOR,
            },
            ECLIPTIC => OverlayStyle::Dotted {
                color: ECLIPTIC_COLOR,
            },
            _ => OverlayStyle::Polygon {
                edge: SURVEY_EDGE_COLOR,
                fill: SURVEY_FILL_COLOR,
            },
        }
    }
}

/// A source of per-frame overlay geometry.
pub trait OverlayProducer {
    fn name(&self) -> &str;

    fn style(&self) -> OverlayStyle;

    /// Clipped pixel geometry of the overlay at `epoch`.
    ///
    /// The output has one entry per vertex of the overlay, in order; vertices outside the
    /// field are [`PixelPoint::INVALID`].
    fn pixels(
        &self,
        model: &LensProjectionModel,
        transform: &dyn LocalSkyTransform,
        clipper: &FrameClipper,
        epoch: Epoch,
    ) -> Vec<PixelPoint>;
}

/// A fixed equatorial curve, reprojected at every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveOverlay {
    name: String,
    style: OverlayStyle,
    points: Vec<RaDec>,
}

impl CurveOverlay {
    pub fn new(name: impl Into<String>, style: OverlayStyle, points: Vec<RaDec>) -> Self {
        CurveOverlay {
            name: name.into(),
            style,
            points,
        }
    }

    /// Load and decimate the curve `name` from `source`.
    pub fn load(name: &str, source: &dyn CurveSource) -> Result<Self, DesipointError> {
        let raw = source.load_static_curve(name)?;
        let points = decimate(name, raw);
        debug!("Loaded curve {name} with {} points", points.len());
        Ok(CurveOverlay::new(name, OverlayStyle::for_curve(name), points))
    }

    pub fn points(&self) -> &[RaDec] {
        &self.points
    }
}

impl OverlayProducer for CurveOverlay {
    fn name(&self) -> &str {
        &self.name
    }

    fn style(&self) -> OverlayStyle {
        self.style
    }

    fn pixels(
        &self,
        model: &LensProjectionModel,
        transform: &dyn LocalSkyTransform,
        clipper: &FrameClipper,
        epoch: Epoch,
    ) -> Vec<PixelPoint> {
        clipper.clip(model.project_radec(transform, &self.points, epoch))
    }
}

/// Telescope pointing drawn on a frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PointingMarker {
    pub pixel: PixelPoint,
    /// Radius of the ring drawn around `pixel`.
    pub radius: Pixel,
    pub color: Color,
    /// The telemetry sample may not be the latest one preceding the frame time.
    pub approximate: bool,
}

/// Ring around the projected mount position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointingOverlay {
    radius: Pixel,
    color: Color,
}

impl Default for PointingOverlay {
    fn default() -> Self {
        PointingOverlay {
            radius: POINTING_MARKER_RADIUS_PX,
            color: POINTING_COLOR,
        }
    }
}

impl PointingOverlay {
    pub fn new(radius: Pixel, color: Color) -> Self {
        PointingOverlay { radius, color }
    }

    /// Marker of the mount position recorded in `sample`.
    ///
    /// The marker is not clipped: the telescope may point outside the usable field.
    pub fn marker(
        &self,
        model: &LensProjectionModel,
        sample: &TelemetrySample,
        approximate: bool,
    ) -> PointingMarker {
        PointingMarker {
            pixel: model.project(sample.sky_angle()),
            radius: self.radius,
            color: self.color,
            approximate,
        }
    }
}

/// The overlays of one run.
#[derive(Default)]
pub struct OverlaySet {
    producers: Vec<Box<dyn OverlayProducer>>,
    pointing: Option<PointingOverlay>,
    /// Overlays that were requested but could not be loaded.
    pub dropped: Vec<(String, DesipointError)>,
}

impl OverlaySet {
    pub fn new() -> Self {
        OverlaySet::default()
    }

    pub fn push(&mut self, producer: Box<dyn OverlayProducer>) {
        self.producers.push(producer);
    }

    pub fn set_pointing(&mut self, pointing: PointingOverlay) {
        self.pointing = Some(pointing);
    }

    /// The pointing overlay, if selected.
    pub fn pointing(&self) -> Option<&PointingOverlay> {
        self.pointing.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn OverlayProducer> {
        self.producers.iter().map(|p| p.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.producers.iter().map(|p| p.name()).collect()
    }

    /// Number of curve overlays.
    pub fn len(&self) -> usize {
        self.producers.len()
    }

    /// No curve overlay and no pointing.
    pub fn is_empty(&self) -> bool {
        self.producers.is_empty() && self.pointing.is_none()
    }
}

/// Load every overlay requested by `selection`.
///
/// A curve that fails to load is dropped with a warning and recorded in
/// [`OverlaySet::dropped`]; the other overlays are unaffected.
///
/// Arguments
/// ---------
/// * `selection`: requested overlays
/// * `source`: where the static curves are read from
///
/// Return
/// ------
/// * the loaded producers, in drawing order, with the pointing overlay when selected
pub fn build_overlays(selection: &OverlaySelection, source: &dyn CurveSource) -> OverlaySet {
    let mut set = OverlaySet::new();
    if selection.pointing {
        set.set_pointing(PointingOverlay::default());
    }
    for name in selection.curve_names() {
        match CurveOverlay::load(name, source) {
            Ok(overlay) => set.push(Box::new(overlay)),
            Err(err) => {
                warn!("Dropping overlay {name}: {err}");
                set.dropped.push((name.to_string(), err));
            }
        }
    }
    set
}
