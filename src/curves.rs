//! # Static reference curves
//!
//! The overlays are drawn from fixed equatorial curves: the two halves of the DESI survey
//! footprint, the Milky Way and the ecliptic. Each curve is a list of `[ra, dec]` pairs in
//! degrees, stored as `<name>.json`.
//!
//! Dense curves are decimated after loading so that they render as dotted lines:
//!
//! | name          | kept points                         |
//! |---------------|-------------------------------------|
//! | `survey_left` | all (polygon)                       |
//! | `survey_right`| all (polygon)                       |
//! | `mw`          | every 6th                           |
//! | `ecliptic`    | indices with `i % 10` in `2..=5`    |
use std::collections::HashMap;

use camino::Utf8PathBuf;

use crate::{coordinates::RaDec, desipoint_errors::DesipointError};

pub const SURVEY_LEFT: &str = "survey_left";
pub const SURVEY_RIGHT: &str = "survey_right";
pub const MILKY_WAY: &str = "mw";
pub const ECLIPTIC: &str = "ecliptic";

/// Loader of named equatorial curves.
pub trait CurveSource {
    /// Load the raw (undecimated) curve called `name`.
    fn load_static_curve(&self, name: &str) -> Result<Vec<RaDec>, DesipointError>;
}

/// Directory holding one `<name>.json` file per curve.
#[derive(Debug, Clone)]
pub struct JsonCurveDirectory {
    root: Utf8PathBuf,
}

impl JsonCurveDirectory {
    pub fn new(root: impl Into<Utf8PathBuf>) -> Self {
        JsonCurveDirectory { root: root.into() }
    }
}

impl CurveSource for JsonCurveDirectory {
    fn load_static_curve(&self, name: &str) -> Result<Vec<RaDec>, DesipointError> {
        let path = self.root.join(format!("{name}.json"));
        let contents = std::fs::read_to_string(&path)?;
        parse_curve(name, &contents)
    }
}

impl CurveSource for HashMap<String, Vec<RaDec>> {
    fn load_static_curve(&self, name: &str) -> Result<Vec<RaDec>, DesipointError> {
        self.get(name)
            .cloned()
            .ok_or_else(|| DesipointError::MalformedStaticCurve {
                name: name.to_string(),
                reason: "no such curve".into(),
            })
    }
}

/// Parse a JSON array of `[ra, dec]` pairs.
///
/// Extra elements after the first two of a pair are ignored. An empty curve, a pair with
/// fewer than two elements or a non-finite coordinate is rejected with
/// [`DesipointError::MalformedStaticCurve`].
pub fn parse_curve(name: &str, json: &str) -> Result<Vec<RaDec>, DesipointError> {
    let malformed = |reason: String| DesipointError::MalformedStaticCurve {
        name: name.to_string(),
        reason,
    };

    let raw: Vec<Vec<f64>> = serde_json::from_str(json).map_err(|e| malformed(e.to_string()))?;
    if raw.is_empty() {
        return Err(malformed("curve is empty".into()));
    }

    raw.iter()
        .enumerate()
        .map(|(i, pair)| match pair.as_slice() {
            [ra, dec, ..] if ra.is_finite() && dec.is_finite() => Ok(RaDec::new(*ra, *dec)),
            _ => Err(malformed(format!("invalid point at index {i}: {pair:?}"))),
        })
        .collect()
}

/// Apply the per-curve decimation rule.
pub fn decimate(name: &str, points: Vec<RaDec>) -> Vec<RaDec> {
    match name {
        MILKY_WAY => points.into_iter().step_by(6).collect(),
        ECLIPTIC => points
            .into_iter()
            .enumerate()
            .filter(|(i, _)| (2..=5).contains(&(i % 10)))
            .map(|(_, p)| p)
            .collect(),
        _ => points,
    }
}
