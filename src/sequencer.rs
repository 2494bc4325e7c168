//! # Frame sequencing
//!
//! Turns a time range into the ordered list of animation frames drawn over all-sky images.
//!
//! Three clocks are reconciled here:
//!
//! * images, one every `image_interval` (120 s) on fixed capture slots,
//! * telemetry, irregular, roughly every 4.3 s,
//! * output frames, one every `frame_interval` (60 s).
//!
//! ## Pipeline
//!
//! 1. [`FrameSequencer::prepare`] normalizes the start to the next capture slot, retrieves
//!    every image of the range and the telemetry stream, eagerly and in timestamp order.
//!    A slot whose image cannot be retrieved is skipped and recorded in
//!    [`PreparedRun::skipped`]; the run only fails when no image at all was retrieved.
//! 2. [`PreparedRun::frames`] then yields the frames lazily. Frame `n` shows image
//!    `n / m` (with `m = image_interval / frame_interval`, so 2 by default) and is labelled
//!    `capture + (n % m) * frame_interval`. Every overlay is reprojected at that label time
//!    and clipped to the usable field; the pointing marker comes from a
//!    [`TelemetryAligner`] private to the iterator.
//!
//! With `k` retrieved images a run has `(k - 1) * m` frames: the last image only closes the
//! range and is never displayed.
//!
//! ## Failures
//!
//! | failure                        | effect                                  |
//! |--------------------------------|-----------------------------------------|
//! | image missing or undecodable   | slot skipped, fewer frames              |
//! | telemetry unavailable          | no pointing marker on any frame         |
//! | alignment window exhausted     | no pointing marker on remaining frames  |
//! | no image in the whole range    | [`DesipointError::NoImagesInRange`]     |
use std::collections::BTreeMap;

use hifitime::{Duration, Epoch};
use log::{debug, info, warn};
use serde::Serialize;

use crate::{
    calibration::CameraCalibration,
    clipping::FrameClipper,
    config::RunConfig,
    constants::{FRAME_INTERVAL_SECONDS, IMAGE_INTERVAL_SECONDS, KITT_PEAK_UTC_OFFSET_HOURS},
    coordinates::{LocalSkyTransform, PixelPoint},
    desipoint_errors::DesipointError,
    images::{ImageSample, ImageSource},
    observer_site::ObserverSite,
    overlays::{OverlaySet, OverlayStyle, PointingMarker},
    projection::LensProjectionModel,
    telemetry::{
        aligner::{AlignmentWindow, TelemetryAligner},
        TelemetrySample, TelemetrySource,
    },
    time::{display_timestamp, local_clock_label, next_capture_slot, seconds},
};

#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

/// Time range and cadences of one run.
///
/// Only built through its validating constructors: the image interval is a positive whole
/// multiple of the frame interval and `start < end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceRequest {
    start: Epoch,
    end: Epoch,
    image_interval: Duration,
    frame_interval: Duration,
}

impl SequenceRequest {
    /// Request over `[start, end)` with the camera's cadences (120 s images, 60 s frames).
    pub fn new(start: Epoch, end: Epoch) -> Result<Self, DesipointError> {
        SequenceRequest::with_intervals(
            start,
            end,
            seconds(IMAGE_INTERVAL_SECONDS),
            seconds(FRAME_INTERVAL_SECONDS),
        )
    }

    /// Request with explicit cadences.
    ///
    /// The image interval must be a positive whole multiple of the frame interval and the
    /// range must not be empty, otherwise [`DesipointError::InvalidTimeRange`] is returned.
    pub fn with_intervals(
        start: Epoch,
        end: Epoch,
        image_interval: Duration,
        frame_interval: Duration,
    ) -> Result<Self, DesipointError> {
        if end <= start {
            return Err(DesipointError::InvalidTimeRange(format!(
                "end {} is not after start {}",
                display_timestamp(end),
                display_timestamp(start)
            )));
        }
        let (image_s, frame_s) = (image_interval.to_seconds(), frame_interval.to_seconds());
        if !(frame_s > 0. && image_s >= frame_s && (image_s / frame_s).fract() == 0.) {
            return Err(DesipointError::InvalidTimeRange(format!(
                "image interval {image_s}s is not a positive multiple of frame interval {frame_s}s"
            )));
        }
        Ok(SequenceRequest {
            start,
            end,
            image_interval,
            frame_interval,
        })
    }

    /// Cadences taken from a run configuration.
    pub fn from_config(
        start: Epoch,
        end: Epoch,
        config: &RunConfig,
    ) -> Result<Self, DesipointError> {
        SequenceRequest::with_intervals(
            start,
            end,
            seconds(config.image_interval_s),
            seconds(config.frame_interval_s),
        )
    }

    pub fn start(&self) -> Epoch {
        self.start
    }

    /// Exclusive end of the range.
    pub fn end(&self) -> Epoch {
        self.end
    }

    pub fn image_interval(&self) -> Duration {
        self.image_interval
    }

    pub fn frame_interval(&self) -> Duration {
        self.frame_interval
    }

    /// First capture slot at or after `start`.
    pub fn normalized_start(&self) -> Epoch {
        next_capture_slot(self.start)
    }

    /// Capture instants of the images of the range, `normalized_start + i * image_interval`
    /// strictly before `end`.
    pub fn image_slots(&self) -> Vec<Epoch> {
        let mut slots = Vec::new();
        let mut slot = self.normalized_start();
        while slot < self.end {
            slots.push(slot);
            slot += self.image_interval;
        }
        slots
    }

    /// Number of output frames sharing one image.
    pub fn frames_per_image(&self) -> usize {
        (self.image_interval.to_seconds() / self.frame_interval.to_seconds()).round() as usize
    }
}

/// Clipped geometry of one overlay on one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlayPixels {
    pub style: OverlayStyle,
    /// One entry per curve vertex; clipped vertices serialize as `null` coordinates.
    pub points: Vec<PixelPoint>,
}

/// Everything a renderer needs to draw on top of the base image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameGeometry {
    #[serde(skip)]
    pub display_time: Epoch,
    /// `YYYY-MM-DD HH:MM:SS`, UTC.
    pub timestamp: String,
    /// Local clock, e.g. `"19:30 Local"`.
    pub label: String,
    pub pointing: Option<PointingMarker>,
    pub overlays: BTreeMap<String, OverlayPixels>,
}

/// One output frame. The image is borrowed from the [`PreparedRun`].
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationFrame<'a> {
    pub index: usize,
    pub image: &'a ImageSample,
    pub geometry: FrameGeometry,
}

/// A capture slot whose image could not be retrieved.
#[derive(Debug)]
pub struct SkippedSlot {
    pub slot: Epoch,
    pub error: DesipointError,
}

/// A single annotated image, outside of any animation.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub image: ImageSample,
    pub geometry: FrameGeometry,
}

/// Builds animation frames for one camera and one overlay selection.
pub struct FrameSequencer<T: LocalSkyTransform> {
    model: LensProjectionModel,
    clipper: FrameClipper,
    frame_size: u32,
    transform: T,
    overlays: OverlaySet,
    utc_offset_hours: i64,
    window: AlignmentWindow,
}

impl<T: LocalSkyTransform> FrameSequencer<T> {
    /// Arguments
    /// ---------
    /// * `calibration`: camera geometry, used for both projection and clipping
    /// * `transform`: celestial-to-local conversion of the camera site
    /// * `overlays`: overlays to draw, the pointing marker included when the set holds one
    ///
    /// Return
    /// ------
    /// * the sequencer, labelling frames in Kitt Peak local time with the default
    ///   alignment window, or [`DesipointError::InvalidCalibrationTable`]
    pub fn new(
        calibration: &CameraCalibration,
        transform: T,
        overlays: OverlaySet,
    ) -> Result<Self, DesipointError> {
        Ok(FrameSequencer {
            model: LensProjectionModel::new(calibration)?,
            clipper: FrameClipper::from_calibration(calibration),
            frame_size: calibration.frame_size_px,
            transform,
            overlays,
            utc_offset_hours: KITT_PEAK_UTC_OFFSET_HOURS,
            window: AlignmentWindow::default(),
        })
    }

    pub fn with_utc_offset(mut self, hours: i64) -> Self {
        self.utc_offset_hours = hours;
        self
    }

    /// Replace the telemetry alignment window, rejecting an empty one.
    pub fn with_alignment_window(
        mut self,
        window: AlignmentWindow,
    ) -> Result<Self, DesipointError> {
        window.validate()?;
        self.window = window;
        Ok(self)
    }

    pub fn overlays(&self) -> &OverlaySet {
        &self.overlays
    }

    /// Retrieve the images and telemetry of a run.
    ///
    /// Arguments
    /// ---------
    /// * `request`: time range and cadences
    /// * `images`: image retrieval
    /// * `telemetry`: telemetry retrieval, only queried when the overlays include pointing
    ///
    /// Return
    /// ------
    /// * the prepared run, or [`DesipointError::NoImagesInRange`] when not a single image of
    ///   the range could be retrieved
    pub fn prepare(
        &self,
        request: &SequenceRequest,
        images: &dyn ImageSource,
        telemetry: Option<&dyn TelemetrySource>,
    ) -> Result<PreparedRun<'_, T>, DesipointError> {
        let slots = request.image_slots();
        info!(
            "Sequencing {} to {}: {} image slots",
            display_timestamp(request.normalized_start()),
            display_timestamp(request.end()),
            slots.len()
        );

        let (retrieved, skipped) = fetch_images(&slots, images);
        if retrieved.is_empty() {
            return Err(DesipointError::NoImagesInRange {
                start: display_timestamp(request.start()),
                end: display_timestamp(request.end()),
            });
        }

        let mismatched = retrieved
            .iter()
            .filter(|image| !image.has_frame_size(self.frame_size))
            .count();
        if mismatched > 0 {
            warn!(
                "{mismatched} images are not {0}x{0} px, overlays will not line up with them",
                self.frame_size
            );
        }

        let telemetry = if self.overlays.pointing().is_some() {
            self.fetch_telemetry(request, telemetry)
        } else {
            None
        };

        let run = PreparedRun {
            sequencer: self,
            images: retrieved,
            telemetry,
            skipped,
            frame_interval: request.frame_interval(),
            frames_per_image: request.frames_per_image(),
        };
        info!(
            "Retrieved {} images ({} skipped), {} frames",
            run.images.len(),
            run.skipped.len(),
            run.frame_count()
        );
        Ok(run)
    }

    fn fetch_telemetry(
        &self,
        request: &SequenceRequest,
        source: Option<&dyn TelemetrySource>,
    ) -> Option<Vec<TelemetrySample>> {
        let Some(source) = source else {
            warn!("Pointing requested without a telemetry source, marker omitted");
            return None;
        };
        match source.fetch_telemetry_range(request.normalized_start(), request.end()) {
            Ok(samples) if samples.is_empty() => {
                warn!("No telemetry recorded in range, pointing marker omitted");
                None
            }
            Ok(samples) => {
                debug!("Retrieved {} telemetry samples", samples.len());
                Some(samples)
            }
            Err(err) => {
                warn!("Telemetry unavailable, pointing marker omitted: {err}");
                None
            }
        }
    }

    /// Annotate the single image captured at the first slot at or after `time`.
    ///
    /// The pointing marker uses the latest telemetry record strictly before the capture.
    /// A failure to retrieve the image is returned as is; a telemetry failure only omits the
    /// marker.
    pub fn snapshot(
        &self,
        time: Epoch,
        images: &dyn ImageSource,
        telemetry: Option<&dyn TelemetrySource>,
    ) -> Result<Snapshot, DesipointError> {
        let slot = next_capture_slot(time);
        let image = images.fetch_image(slot)?;

        let pointing = match (self.overlays.pointing(), telemetry) {
            (Some(overlay), Some(source)) => match source.fetch_latest_before(slot) {
                Ok(Some(sample)) => Some(overlay.marker(&self.model, &sample, false)),
                Ok(None) => {
                    warn!("No telemetry before {}", display_timestamp(slot));
                    None
                }
                Err(err) => {
                    warn!("Telemetry unavailable, pointing marker omitted: {err}");
                    None
                }
            },
            (Some(_), None) => {
                warn!("Pointing requested without a telemetry source, marker omitted");
                None
            }
            (None, _) => None,
        };

        Ok(Snapshot {
            geometry: self.geometry(slot, pointing),
            image,
        })
    }

    /// Reproject every overlay at `display_time`.
    fn geometry(&self, display_time: Epoch, pointing: Option<PointingMarker>) -> FrameGeometry {
        let overlays = self
            .overlays
            .iter()
            .map(|producer| {
                let points =
                    producer.pixels(&self.model, &self.transform, &self.clipper, display_time);
                (
                    producer.name().to_string(),
                    OverlayPixels {
                        style: producer.style(),
                        points,
                    },
                )
            })
            .collect();

        FrameGeometry {
            display_time,
            timestamp: display_timestamp(display_time),
            label: local_clock_label(display_time, self.utc_offset_hours),
            pointing,
            overlays,
        }
    }
}

impl FrameSequencer<ObserverSite> {
    /// Sequencer for the camera, site and alignment window of a run configuration.
    pub fn from_config(
        config: &RunConfig,
        overlays: OverlaySet,
    ) -> Result<Self, DesipointError> {
        FrameSequencer::new(&config.camera, config.site.clone(), overlays)?
            .with_utc_offset(config.site.utc_offset_hours)
            .with_alignment_window(config.alignment_window)
    }
}

fn fetch_images(slots: &[Epoch], source: &dyn ImageSource) -> (Vec<ImageSample>, Vec<SkippedSlot>) {
    #[cfg(feature = "progress")]
    let pb = {
        let pb = ProgressBar::new(slots.len() as u64);
        pb.set_style(
            ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} images | ETA {eta} | {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        pb
    };

    let mut images = Vec::with_capacity(slots.len());
    let mut skipped = Vec::new();
    for &slot in slots {
        match source.fetch_image(slot) {
            Ok(image) => images.push(image),
            Err(error) => {
                warn!("Skipping image slot {}: {error}", display_timestamp(slot));
                skipped.push(SkippedSlot { slot, error });
            }
        }
        #[cfg(feature = "progress")]
        {
            pb.set_message(display_timestamp(slot));
            pb.inc(1);
        }
    }

    #[cfg(feature = "progress")]
    pb.finish_and_clear();

    (images, skipped)
}

/// Images and telemetry of one run, ready to be turned into frames.
pub struct PreparedRun<'s, T: LocalSkyTransform> {
    sequencer: &'s FrameSequencer<T>,
    images: Vec<ImageSample>,
    telemetry: Option<Vec<TelemetrySample>>,
    skipped: Vec<SkippedSlot>,
    frame_interval: Duration,
    frames_per_image: usize,
}

impl<'s, T: LocalSkyTransform> PreparedRun<'s, T> {
    /// `(images - 1) * frames_per_image`.
    pub fn frame_count(&self) -> usize {
        self.images.len().saturating_sub(1) * self.frames_per_image
    }

    pub fn images(&self) -> &[ImageSample] {
        &self.images
    }

    pub fn skipped(&self) -> &[SkippedSlot] {
        &self.skipped
    }

    pub fn has_telemetry(&self) -> bool {
        self.telemetry.is_some()
    }

    /// Lazy, forward-only iterator over the frames of the run.
    ///
    /// Each call starts a fresh telemetry alignment, so the run can be iterated again.
    pub fn frames(&self) -> Frames<'_, 's, T> {
        let aligner = match (&self.telemetry, self.images.first()) {
            (Some(samples), Some(first)) => Some(TelemetryAligner::new(
                samples,
                first.capture,
                self.sequencer.window,
            )),
            _ => None,
        };
        Frames {
            run: self,
            aligner,
            next_index: 0,
            exhausted_reported: false,
        }
    }
}

/// Iterator returned by [`PreparedRun::frames`].
pub struct Frames<'r, 's, T: LocalSkyTransform> {
    run: &'r PreparedRun<'s, T>,
    aligner: Option<TelemetryAligner<'r>>,
    next_index: usize,
    exhausted_reported: bool,
}

impl<'r, 's, T: LocalSkyTransform> Frames<'r, 's, T> {
    fn pointing(&mut self, display_time: Epoch) -> Option<PointingMarker> {
        let overlay = self.run.sequencer.overlays.pointing()?;
        let aligned = self.aligner.as_mut()?.align(display_time);
        match aligned {
            Some(aligned) => Some(overlay.marker(
                &self.run.sequencer.model,
                &aligned.sample,
                aligned.approximate,
            )),
            None => {
                if !self.exhausted_reported {
                    warn!(
                        "Telemetry exhausted at {}, pointing marker omitted",
                        display_timestamp(display_time)
                    );
                    self.exhausted_reported = true;
                }
                None
            }
        }
    }
}

impl<'r, 's, T: LocalSkyTransform> Iterator for Frames<'r, 's, T> {
    type Item = AnimationFrame<'r>;

    fn next(&mut self) -> Option<Self::Item> {
        let run = self.run;
        let index = self.next_index;
        if index >= run.frame_count() {
            return None;
        }
        self.next_index += 1;

        let image = &run.images[index / run.frames_per_image];
        let step = (index % run.frames_per_image) as f64;
        let display_time =
            image.capture + Duration::from_seconds(run.frame_interval.to_seconds() * step);

        let pointing = self.pointing(display_time);
        let geometry = run.sequencer.geometry(display_time, pointing);
        debug!("Frame {index}: {}", geometry.timestamp);

        Some(AnimationFrame {
            index,
            image,
            geometry,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.run.frame_count().saturating_sub(self.next_index);
        (remaining, Some(remaining))
    }
}

impl<'r, 's, T: LocalSkyTransform> ExactSizeIterator for Frames<'r, 's, T> {}
