use std::io::Read;

use hifitime::Epoch;
use log::{debug, warn};
use serde::{Deserialize, Deserializer};

use super::TelemetrySample;
use crate::{constants::Degree, desipoint_errors::DesipointError, time::parse_utc_timestamp};

/// One row of the `telemetry.tcs_info` export.
#[derive(Debug, Deserialize)]
struct TcsInfoRecord {
    #[serde(rename = "time_recorded", deserialize_with = "deserialize_epoch")]
    recorded: Epoch,
    #[serde(rename = "mount_el")]
    mount_altitude: Option<Degree>,
    #[serde(rename = "mount_az")]
    mount_azimuth: Option<Degree>,
}

fn deserialize_epoch<'de, D>(deserializer: D) -> Result<Epoch, D::Error>
where
    D: Deserializer<'de>,
{
    let date_str = String::deserialize(deserializer)?;
    parse_utc_timestamp(&date_str).map_err(serde::de::Error::custom)
}

/// Parse a telemetry CSV export into a time-ordered sample stream.
///
/// The export has a header row `time_recorded,mount_el,mount_az`, timestamps such as
/// `2020-03-16 02:30:09.347120+00:00` and may contain rows with an empty mount position,
/// which are skipped. The result is sorted by time and rows repeating an earlier timestamp
/// are dropped, so the stream is strictly increasing.
///
/// Arguments
/// ---------
/// * `reader`: the CSV text
///
/// Return
/// ------
/// * the samples, or a [`DesipointError::CsvError`] on a malformed row
pub fn parse_telemetry_csv<R: Read>(reader: R) -> Result<Vec<TelemetrySample>, DesipointError> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut samples = Vec::new();
    let mut incomplete = 0usize;
    for record in csv_reader.deserialize::<TcsInfoRecord>() {
        let record = record?;
        match (record.mount_altitude, record.mount_azimuth) {
            (Some(alt), Some(az)) => samples.push(TelemetrySample::new(record.recorded, alt, az)),
            _ => incomplete += 1,
        }
    }
    if incomplete > 0 {
        warn!("Skipped {incomplete} telemetry rows without a mount position");
    }

    samples.sort_by(|a, b| {
        a.recorded
            .partial_cmp(&b.recorded)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    samples.dedup_by(|later, earlier| later.recorded == earlier.recorded);

    debug!("Parsed {} telemetry samples", samples.len());
    Ok(samples)
}
