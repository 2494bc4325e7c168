use thiserror::Error;

#[derive(Error, Debug)]
pub enum DesipointError {
    #[error("Image not found for capture slot: {0}")]
    ImageNotFound(String),

    #[error("Unable to decode image {slot}: {reason}")]
    ImageDecode { slot: String, reason: String },

    #[error("Telemetry unavailable: {0}")]
    TelemetryUnavailable(String),

    #[error("Malformed static curve '{name}': {reason}")]
    MalformedStaticCurve { name: String, reason: String },

    #[error("No image could be retrieved between {start} and {end}")]
    NoImagesInRange { start: String, end: String },

    #[error("Invalid calibration table: {0}")]
    InvalidCalibrationTable(String),

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("Invalid authentication for {0}")]
    Unauthorized(String),

    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("YAML configuration error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[cfg(feature = "download")]
    #[error("HTTP reqwest error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl PartialEq for DesipointError {
    fn eq(&self, other: &Self) -> bool {
        use DesipointError::*;
        match (self, other) {
            (ImageNotFound(a), ImageNotFound(b)) => a == b,
            (
                ImageDecode {
                    slot: s1,
                    reason: r1,
                },
                ImageDecode {
                    slot: s2,
                    reason: r2,
                },
            ) => s1 == s2 && r1 == r2,
            (TelemetryUnavailable(a), TelemetryUnavailable(b)) => a == b,
            (
                MalformedStaticCurve {
                    name: n1,
                    reason: r1,
                },
                MalformedStaticCurve {
                    name: n2,
                    reason: r2,
                },
            ) => n1 == n2 && r1 == r2,
            (NoImagesInRange { start: s1, end: e1 }, NoImagesInRange { start: s2, end: e2 }) => {
                s1 == s2 && e1 == e2
            }
            (InvalidCalibrationTable(a), InvalidCalibrationTable(b)) => a == b,
            (InvalidTimestamp(a), InvalidTimestamp(b)) => a == b,
            (InvalidTimeRange(a), InvalidTimeRange(b)) => a == b,
            (Unauthorized(a), Unauthorized(b)) => a == b,

            // Wrapped foreign errors are not comparable: same variant is enough
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,
            (JsonError(_), JsonError(_)) => true,
            (YamlError(_), YamlError(_)) => true,
            #[cfg(feature = "download")]
            (HttpError(_), HttpError(_)) => true,

            _ => false,
        }
    }
}
