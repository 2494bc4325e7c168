mod common;

use common::{reference_curves, telemetry_stream, utc, OfflineTelemetry, SyntheticArchive};
use desipoint::{
    calibration::CameraCalibration,
    constants::SPACEWATCH_VALIDITY_RADIUS,
    coordinates::PixelPoint,
    curves::{ECLIPTIC, MILKY_WAY, SURVEY_LEFT, SURVEY_RIGHT},
    desipoint_errors::DesipointError,
    observer_site::ObserverSite,
    overlays::{build_overlays, OverlaySelection, POINTING_COLOR},
    sequencer::{FrameSequencer, SequenceRequest},
    telemetry::{aligner::AlignmentWindow, TelemetrySource},
    time::seconds,
};

fn sequencer(selection: OverlaySelection) -> FrameSequencer<ObserverSite> {
    FrameSequencer::new(
        &CameraCalibration::default(),
        ObserverSite::default(),
        build_overlays(&selection, &reference_curves()),
    )
    .unwrap()
}

fn three_hours() -> SequenceRequest {
    SequenceRequest::new(utc(2, 30, 5), utc(5, 30, 5)).unwrap()
}

#[test]
fn test_three_hour_run_frame_layout() {
    let sequencer = sequencer(OverlaySelection::none());
    let run = sequencer
        .prepare(&three_hours(), &SyntheticArchive::complete(), None)
        .unwrap();

    assert_eq!(run.images().len(), 90);
    assert!(run.skipped().is_empty());
    assert_eq!(run.frame_count(), (90 - 1) * 2);

    let frames: Vec<_> = run.frames().collect();
    assert_eq!(frames.len(), run.frame_count());

    for (n, frame) in frames.iter().enumerate() {
        assert_eq!(frame.index, n);
        let image = &run.images()[n / 2];
        assert!(std::ptr::eq(frame.image, image));
        assert_eq!(
            frame.geometry.display_time,
            image.capture + seconds(60 * (n as i64 % 2))
        );
        assert!(frame.geometry.pointing.is_none());
        assert!(frame.geometry.overlays.is_empty());
    }

    assert_eq!(frames[0].geometry.timestamp, "2020-03-16 02:30:05");
    assert_eq!(frames[0].geometry.label, "19:30 Local");
    assert_eq!(frames[1].geometry.timestamp, "2020-03-16 02:31:05");
    assert_eq!(frames[177].geometry.timestamp, "2020-03-16 05:27:05");
}

#[test]
fn test_start_is_rounded_forward() {
    let request = SequenceRequest::new(utc(2, 31, 0), utc(2, 40, 0)).unwrap();
    let sequencer = sequencer(OverlaySelection::none());
    let run = sequencer
        .prepare(&request, &SyntheticArchive::complete(), None)
        .unwrap();

    let captures: Vec<_> = run.images().iter().map(|i| i.capture).collect();
    assert_eq!(
        captures,
        vec![utc(2, 32, 5), utc(2, 34, 5), utc(2, 36, 5), utc(2, 38, 5)]
    );
}

#[test]
fn test_missing_images_are_skipped() {
    let missing = vec![utc(2, 34, 5), utc(3, 0, 5), utc(4, 10, 5)];
    let sequencer = sequencer(OverlaySelection::none());
    let run = sequencer
        .prepare(&three_hours(), &SyntheticArchive::without(missing.clone()), None)
        .unwrap();

    assert_eq!(run.images().len(), 87);
    assert_eq!(run.frame_count(), (87 - 1) * 2);

    let skipped: Vec<_> = run.skipped().iter().map(|s| s.slot).collect();
    assert_eq!(skipped, missing);
    assert!(run
        .skipped()
        .iter()
        .all(|s| matches!(s.error, DesipointError::ImageNotFound(_))));

    for frame in run.frames() {
        assert!(!missing.contains(&frame.image.capture));
    }
}

#[test]
fn test_no_image_at_all_is_fatal() {
    let request = SequenceRequest::new(utc(2, 30, 5), utc(2, 36, 5)).unwrap();
    let archive = SyntheticArchive::without(vec![utc(2, 30, 5), utc(2, 32, 5), utc(2, 34, 5)]);

    let sequencer = sequencer(OverlaySelection::none());
    let result = sequencer.prepare(&request, &archive, None);
    assert!(matches!(
        result.err(),
        Some(DesipointError::NoImagesInRange { .. })
    ));
}

#[test]
fn test_single_image_has_no_frame() {
    let request = SequenceRequest::new(utc(2, 30, 5), utc(2, 31, 0)).unwrap();
    let sequencer = sequencer(OverlaySelection::none());
    let run = sequencer
        .prepare(&request, &SyntheticArchive::complete(), None)
        .unwrap();

    assert_eq!(run.images().len(), 1);
    assert_eq!(run.frame_count(), 0);
    assert_eq!(run.frames().count(), 0);
}

#[test]
fn test_pointing_follows_telemetry() {
    let selection = OverlaySelection {
        pointing: true,
        ..OverlaySelection::none()
    };
    let sequencer = sequencer(selection);
    let telemetry = telemetry_stream(utc(2, 25, 0), 3000, 4300.);

    let run = sequencer
        .prepare(
            &three_hours(),
            &SyntheticArchive::complete(),
            Some(&telemetry as &dyn TelemetrySource),
        )
        .unwrap();
    assert!(run.has_telemetry());

    let center = PixelPoint::new(512., 512.);
    for frame in run.frames() {
        let marker = frame
            .geometry
            .pointing
            .unwrap_or_else(|| panic!("no pointing on frame {}", frame.index));
        assert!(!marker.approximate, "frame {}", frame.index);
        assert_eq!(marker.color, POINTING_COLOR);
        // altitude 60° is 165 px from the zenith
        let r = marker.pixel.distance_to(&center);
        assert!((r - 165.).abs() < 5., "frame {}: r = {r}", frame.index);
    }
}

#[test]
fn test_unselected_pointing_ignores_telemetry() {
    let sequencer = sequencer(OverlaySelection {
        pointing: false,
        ..OverlaySelection::all()
    });
    assert!(sequencer.overlays().pointing().is_none());

    let telemetry = telemetry_stream(utc(2, 25, 0), 3000, 4300.);
    let run = sequencer
        .prepare(
            &three_hours(),
            &SyntheticArchive::complete(),
            Some(&telemetry as &dyn TelemetrySource),
        )
        .unwrap();

    assert!(!run.has_telemetry());
    assert!(run.frames().all(|frame| frame.geometry.pointing.is_none()));
}

#[test]
fn test_empty_alignment_window_is_rejected() {
    let result = sequencer(OverlaySelection::all()).with_alignment_window(AlignmentWindow {
        start_offset: 30,
        end_offset: 10,
    });
    assert!(matches!(
        result.err(),
        Some(DesipointError::InvalidTimeRange(_))
    ));

    let window = AlignmentWindow::new(5, 40).unwrap();
    assert!(sequencer(OverlaySelection::all())
        .with_alignment_window(window)
        .is_ok());
}

#[test]
fn test_unavailable_telemetry_omits_pointing() {
    let sequencer = sequencer(OverlaySelection::all());
    let run = sequencer
        .prepare(
            &three_hours(),
            &SyntheticArchive::complete(),
            Some(&OfflineTelemetry as &dyn TelemetrySource),
        )
        .unwrap();

    assert!(!run.has_telemetry());
    assert_eq!(run.frame_count(), 178);
    for frame in run.frames() {
        assert!(frame.geometry.pointing.is_none());
        assert!(!frame.geometry.overlays.is_empty());
    }
}

#[test]
fn test_malformed_curve_drops_only_that_overlay() {
    let sequencer = sequencer(OverlaySelection::all());
    assert_eq!(sequencer.overlays().dropped.len(), 1);
    assert_eq!(sequencer.overlays().dropped[0].0, MILKY_WAY);

    let request = SequenceRequest::new(utc(2, 30, 5), utc(2, 40, 5)).unwrap();
    let run = sequencer
        .prepare(&request, &SyntheticArchive::complete(), None)
        .unwrap();

    for frame in run.frames() {
        let names: Vec<&str> = frame.geometry.overlays.keys().map(|k| k.as_str()).collect();
        assert_eq!(names, vec![ECLIPTIC, SURVEY_LEFT, SURVEY_RIGHT]);
    }
}

#[test]
fn test_overlays_are_clipped_and_drift() {
    let sequencer = sequencer(OverlaySelection {
        survey: true,
        ..OverlaySelection::none()
    });
    let request = SequenceRequest::new(utc(2, 30, 5), utc(2, 34, 5)).unwrap();
    let run = sequencer
        .prepare(&request, &SyntheticArchive::complete(), None)
        .unwrap();
    let frames: Vec<_> = run.frames().collect();
    assert_eq!(frames.len(), 2);

    let center = PixelPoint::new(512., 512.);
    for frame in &frames {
        for overlay in frame.geometry.overlays.values() {
            assert_eq!(overlay.points.len(), 72);
            assert!(overlay
                .points
                .iter()
                .filter(|p| p.is_valid())
                .all(|p| p.distance_to(&center) <= SPACEWATCH_VALIDITY_RADIUS));
        }
        // the southern parallel dips below the horizon
        assert!(frame.geometry.overlays[SURVEY_LEFT]
            .points
            .iter()
            .any(|p| !p.is_valid()));
    }

    // same image, different geometry
    assert!(std::ptr::eq(frames[0].image, frames[1].image));
    assert_ne!(
        frames[0].geometry.overlays[SURVEY_RIGHT].points,
        frames[1].geometry.overlays[SURVEY_RIGHT].points
    );
}

#[test]
fn test_frames_can_be_replayed() {
    let selection = OverlaySelection::all();
    let sequencer = sequencer(selection);
    let telemetry = telemetry_stream(utc(2, 25, 0), 400, 4300.);
    let request = SequenceRequest::new(utc(2, 30, 5), utc(2, 50, 5)).unwrap();
    let run = sequencer
        .prepare(
            &request,
            &SyntheticArchive::complete(),
            Some(&telemetry as &dyn TelemetrySource),
        )
        .unwrap();

    let first: Vec<_> = run.frames().map(|f| f.geometry.pointing).collect();
    let second: Vec<_> = run.frames().map(|f| f.geometry.pointing).collect();
    assert_eq!(first, second);
    assert_eq!(run.frames().len(), 18);
}

#[test]
fn test_snapshot() {
    let sequencer = sequencer(OverlaySelection::all());
    let telemetry = telemetry_stream(utc(2, 25, 0), 200, 4300.);

    let snapshot = sequencer
        .snapshot(
            utc(2, 31, 0),
            &SyntheticArchive::complete(),
            Some(&telemetry as &dyn TelemetrySource),
        )
        .unwrap();

    assert_eq!(snapshot.image.capture, utc(2, 32, 5));
    assert_eq!(snapshot.geometry.timestamp, "2020-03-16 02:32:05");
    assert_eq!(snapshot.geometry.label, "19:32 Local");
    let marker = snapshot.geometry.pointing.unwrap();
    assert!(!marker.approximate);
    assert_eq!(snapshot.geometry.overlays.len(), 3);

    let missing = SyntheticArchive::without(vec![utc(2, 32, 5)]);
    assert!(matches!(
        sequencer.snapshot(utc(2, 31, 0), &missing, None),
        Err(DesipointError::ImageNotFound(_))
    ));
}

#[test]
fn test_geometry_serializes_clipped_points_as_null() {
    let sequencer = sequencer(OverlaySelection {
        survey: true,
        ..OverlaySelection::none()
    });
    let snapshot = sequencer
        .snapshot(utc(2, 30, 5), &SyntheticArchive::complete(), None)
        .unwrap();

    let json = serde_json::to_value(&snapshot.geometry).unwrap();
    assert_eq!(json["timestamp"], "2020-03-16 02:30:05");
    assert!(json.get("display_time").is_none());
    assert_eq!(json["overlays"][SURVEY_LEFT]["style"]["kind"], "polygon");

    let points = json["overlays"][SURVEY_LEFT]["points"].as_array().unwrap();
    assert!(points.iter().any(|p| p["x"].is_null() && p["y"].is_null()));
    assert!(points.iter().any(|p| p["x"].is_f64()));
}
