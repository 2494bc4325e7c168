//! Windowed nearest-preceding search over a dense telemetry stream.
//!
//! For each target instant the aligner only inspects the samples
//! `[cursor + start_offset, cursor + end_offset)` after its previous match. With a cadence
//! of ~4.3 s, the sample preceding a target 60 s later falls reliably around 14 samples
//! ahead, so the default window `[10, 30)` brackets it while costing O(20) per frame
//! instead of a scan over the thousands of samples of a night.
//!
//! This is an approximation. If the cadence slows down (gaps, outages) the true nearest
//! sample may lie beyond the window; the aligner then returns the best in-window match
//! with [`AlignedSample::approximate`] set, never an error.
use hifitime::Epoch;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::TelemetrySample;
use crate::{desipoint_errors::DesipointError, time::display_timestamp};

/// Delta assigned to samples recorded after the target, so they can never win the minimum
/// unless no sample in the window precedes the target.
const FUTURE_SAMPLE_DELTA: f64 = f64::INFINITY;

/// Offsets, relative to the previous match, of the samples inspected for the next target.
/// `end_offset` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignmentWindow {
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Default for AlignmentWindow {
    fn default() -> Self {
        AlignmentWindow {
            start_offset: 10,
            end_offset: 30,
        }
    }
}

impl AlignmentWindow {
    /// Window `[start_offset, end_offset)`, rejected with [`DesipointError::InvalidTimeRange`]
    /// when empty.
    pub fn new(start_offset: usize, end_offset: usize) -> Result<Self, DesipointError> {
        let window = AlignmentWindow {
            start_offset,
            end_offset,
        };
        window.validate()?;
        Ok(window)
    }

    pub fn validate(&self) -> Result<(), DesipointError> {
        if self.start_offset >= self.end_offset {
            return Err(DesipointError::InvalidTimeRange(format!(
                "empty telemetry alignment window {self:?}"
            )));
        }
        Ok(())
    }
}

/// Result of one alignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedSample {
    pub sample: TelemetrySample,
    /// Absolute index of `sample` in the stream.
    pub index: usize,
    /// The window could not guarantee this is the latest sample preceding the target.
    pub approximate: bool,
}

/// Forward-only cursor resolving one telemetry sample per target instant.
///
/// One aligner serves one sequencing run. Targets must be passed in strictly increasing
/// order; the cursor never moves backward, so returned samples have non-decreasing
/// timestamps.
#[derive(Debug)]
pub struct TelemetryAligner<'a> {
    samples: &'a [TelemetrySample],
    window: AlignmentWindow,
    cursor: Option<usize>,
    seeded: bool,
    last_target: Option<Epoch>,
}

impl<'a> TelemetryAligner<'a> {
    /// Create an aligner over a time-ordered stream.
    ///
    /// Arguments
    /// ---------
    /// * `samples`: telemetry sorted by `recorded`
    /// * `run_start`: first instant of the run; the cursor starts at the first sample
    ///   recorded at or after it
    /// * `window`: search offsets
    pub fn new(samples: &'a [TelemetrySample], run_start: Epoch, window: AlignmentWindow) -> Self {
        let first = samples.partition_point(|s| s.recorded < run_start);
        TelemetryAligner {
            samples,
            window,
            cursor: (first < samples.len()).then_some(first),
            seeded: false,
            last_target: None,
        }
    }

    /// Index of the last match, `None` if the stream has no sample after the run start.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    /// Resolve the telemetry sample for `target`.
    ///
    /// The first call returns the sample under the cursor. Every later call searches the
    /// window after the previous match for the sample with the smallest non-negative
    /// `target − recorded` and moves the cursor there.
    ///
    /// Return
    /// ------
    /// * `None` when no sample is available: the stream has nothing after the run start or
    ///   the window lies entirely past its end
    /// * otherwise the match, flagged approximate when the window was truncated by the end of
    ///   the stream, held no sample preceding the target, or matched on its last element
    pub fn align(&mut self, target: Epoch) -> Option<AlignedSample> {
        let pre = self.cursor?;

        if let Some(last) = self.last_target {
            if target <= last {
                warn!(
                    "Telemetry alignment targets must increase: {} after {}",
                    display_timestamp(target),
                    display_timestamp(last)
                );
            }
        }
        self.last_target = Some(target);

        if !self.seeded {
            self.seeded = true;
            return Some(AlignedSample {
                sample: self.samples[pre],
                index: pre,
                approximate: false,
            });
        }

        let start = pre.saturating_add(self.window.start_offset);
        let window_end = pre.saturating_add(self.window.end_offset);
        let end = window_end.min(self.samples.len());
        if start >= end {
            debug!(
                "Telemetry window [{start}, {end}) is empty for {}",
                display_timestamp(target)
            );
            return None;
        }

        let (offset, delta) = self.samples[start..end]
            .iter()
            .map(|s| {
                let delta = (target - s.recorded).to_seconds();
                if delta < 0. {
                    FUTURE_SAMPLE_DELTA
                } else {
                    delta
                }
            })
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(&b.1))?;

        let truncated = window_end > self.samples.len();
        let approximate = truncated || delta.is_infinite() || offset == end - start - 1;

        let index = start + offset;
        self.cursor = Some(index);

        if approximate {
            debug!(
                "Approximate telemetry match for {}: sample {} recorded at {}",
                display_timestamp(target),
                index,
                display_timestamp(self.samples[index].recorded)
            );
        }

        Some(AlignedSample {
            sample: self.samples[index],
            index,
            approximate,
        })
    }
}
