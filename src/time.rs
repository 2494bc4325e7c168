//! # Time helpers
//!
//! Capture-slot arithmetic for the all-sky archive, the string forms used by the archive,
//! the telemetry database and the frame labels, and Greenwich mean sidereal time.
//!
//! All instants are [`hifitime::Epoch`] values expressed in UTC.
use std::sync::LazyLock;

use hifitime::{Duration, Epoch};
use regex::Regex;

use crate::{
    constants::{CAPTURE_SECOND_OFFSET, DPI, IMAGE_INTERVAL_SECONDS, MJD, T2000},
    desipoint_errors::DesipointError,
};

static TIMESTAMP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(\d{4})-(\d{2})-(\d{2})[T ](\d{2}):(\d{2}):(\d{2})(?:\.(\d{1,9}))?\s*(Z|UTC|[+-]\d{2}:?\d{2})?$",
    )
    .expect("timestamp regex is valid")
});

/// Build a [`Duration`] from a whole number of seconds.
pub fn seconds(secs: i64) -> Duration {
    Duration::from_seconds(secs as f64)
}

/// Parse a UTC timestamp as written by the telemetry database or given on the command line.
///
/// Accepted forms are `YYYY-MM-DD HH:MM:SS`, optionally with a `T` separator, a fractional
/// second of up to nine digits and a trailing `Z`, `UTC` or `±HH:MM` offset. A numeric offset
/// is removed so the returned epoch is in UTC.
///
/// Arguments
/// ---------
/// * `timestamp`: the text to parse
///
/// Return
/// ------
/// * the parsed epoch, or [`DesipointError::InvalidTimestamp`]
pub fn parse_utc_timestamp(timestamp: &str) -> Result<Epoch, DesipointError> {
    let invalid = || DesipointError::InvalidTimestamp(timestamp.to_string());
    let caps = TIMESTAMP_REGEX
        .captures(timestamp.trim())
        .ok_or_else(invalid)?;

    let field = |i: usize| -> Result<u32, DesipointError> {
        caps[i].parse::<u32>().map_err(|_| invalid())
    };
    let year = caps[1].parse::<i32>().map_err(|_| invalid())?;
    let (month, day) = (field(2)?, field(3)?);
    let (hour, minute, second) = (field(4)?, field(5)?, field(6)?);
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) || hour > 23 || minute > 59 {
        return Err(invalid());
    }

    let nanos = match caps.get(7) {
        Some(frac) => format!("{:0<9}", frac.as_str())
            .parse::<u32>()
            .map_err(|_| invalid())?,
        None => 0,
    };

    let epoch = Epoch::maybe_from_gregorian_utc(
        year,
        month as u8,
        day as u8,
        hour as u8,
        minute as u8,
        second as u8,
        nanos,
    )
    .map_err(|_| invalid())?;

    let offset_seconds = match caps.get(8).map(|m| m.as_str()) {
        None | Some("Z") | Some("UTC") => 0,
        Some(offset) => {
            let sign = if offset.starts_with('-') { -1 } else { 1 };
            let digits: String = offset[1..].chars().filter(|c| *c != ':').collect();
            let hours = digits[..2].parse::<i64>().map_err(|_| invalid())?;
            let minutes = digits[2..].parse::<i64>().map_err(|_| invalid())?;
            sign * (hours * 3600 + minutes * 60)
        }
    };

    Ok(epoch - seconds(offset_seconds))
}

/// Smallest capture slot at or after `epoch`.
///
/// Capture slots lie on even UTC minutes, [`CAPTURE_SECOND_OFFSET`] seconds past the minute.
/// An odd minute is pushed forward to the next even minute, and a slot that would fall
/// before `epoch` is moved one image interval later.
pub fn next_capture_slot(epoch: Epoch) -> Epoch {
    let (y, m, d, h, mi, _, _) = epoch.to_gregorian_utc();
    let minute_start = Epoch::from_gregorian_utc(y, m, d, h, mi, 0, 0);

    let mut slot = minute_start + seconds(CAPTURE_SECOND_OFFSET as i64);
    if mi % 2 == 1 {
        slot += seconds(60);
    }
    if slot < epoch {
        slot += seconds(IMAGE_INTERVAL_SECONDS);
    }
    slot
}

/// `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn display_timestamp(epoch: Epoch) -> String {
    let (y, m, d, h, mi, s, _) = epoch.to_gregorian_utc();
    format!("{y:04}-{m:02}-{d:02} {h:02}:{mi:02}:{s:02}")
}

/// Wall-clock label drawn in the corner of each frame, e.g. `"01:45 Local"`.
///
/// Arguments
/// ---------
/// * `epoch`: the instant to label
/// * `utc_offset_hours`: fixed offset of the site's local time from UTC
pub fn local_clock_label(epoch: Epoch, utc_offset_hours: i64) -> String {
    let local = epoch + seconds(utc_offset_hours * 3600);
    let (_, _, _, h, mi, _, _) = local.to_gregorian_utc();
    format!("{h:02}:{mi:02} Local")
}

/// Archive file stem of the image captured at `epoch`: `YYYYMMDD_HHMMSS`.
pub fn image_file_stem(epoch: Epoch) -> String {
    let (y, m, d, h, mi, s, _) = epoch.to_gregorian_utc();
    format!("{y:04}{m:02}{d:02}_{h:02}{mi:02}{s:02}")
}

/// Archive directory of the image captured at `epoch`: `YYYY/MM/DD`.
pub fn image_date_path(epoch: Epoch) -> String {
    let (y, m, d, _, _, _, _) = epoch.to_gregorian_utc();
    format!("{y:04}/{m:02}/{d:02}")
}

/// Compute the Greenwich Mean Sidereal Time (GMST) in radians
/// for a given Modified Julian Date (UT1 time scale).
///
/// This function implements the IAU 1982 polynomial formula
/// for the mean sidereal time at 0h UT1, plus the fractional-day
/// correction term due to Earth's rotation rate.
///
/// # Arguments
/// * `tjm` - Modified Julian Date (MJD, UT1 time scale)
///
/// # Returns
/// * GMST angle in radians, normalized to the interval [0, 2π).
pub fn gmst(tjm: MJD) -> f64 {
    // Polynomial coefficients for GMST at 0h UT1 (in seconds)
    const C0: f64 = 24110.54841;
    const C1: f64 = 8640184.812866;
    const C2: f64 = 9.3104e-2;
    const C3: f64 = -6.2e-6;

    // Ratio of sidereal day to solar day
    const RAP: f64 = 1.00273790934;

    let itjm = tjm.floor();
    let t = (itjm - T2000) / 36525.0;

    let mut gmst0 = ((C3 * t + C2) * t + C1) * t + C0;
    gmst0 *= DPI / 86400.0;

    let h = tjm.fract() * DPI;
    (gmst0 + h * RAP).rem_euclid(DPI)
}
