use pastekit_core::{Pad, PadShape, PadSource, Point2D};
use pastekit_motion::{
    profile, sequence_flat, sequence_safe, AxisLimits, ComponentHeightMap, ProfileKind,
    ProfileOptions, SafePathConfig, SegmentKind,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn pads_from(coords: &[(f64, f64)]) -> Vec<Pad> {
    coords
        .iter()
        .enumerate()
        .map(|(i, &(x, y))| {
            Pad::new(
                format!("S{}", i + 1),
                x,
                y,
                1.0,
                1.0,
                PadShape::Rect,
                PadSource::Fused,
            )
        })
        .collect()
}

fn heights_from(obstacles: &[(f64, f64, f64)]) -> ComponentHeightMap {
    let mut map = ComponentHeightMap::default();
    for (i, &(x, y, h)) in obstacles.iter().enumerate() {
        map.insert(format!("U{}", i + 1), Point2D::new(x, y), h);
    }
    map
}

proptest! {
    #[test]
    fn flat_sequence_visits_every_pad_once(
        coords in prop::collection::vec((0.0f64..100.0, 0.0f64..100.0), 0..25),
    ) {
        let pads = pads_from(&coords);
        let seq = sequence_flat(&Point2D::origin(), &pads);
        prop_assert_eq!(seq.len(), pads.len());
        let ids: HashSet<&str> = seq.iter().map(|e| e.pad.id.as_str()).collect();
        prop_assert_eq!(ids.len(), pads.len());
    }

    #[test]
    fn safe_sequence_visits_every_pad_once(
        coords in prop::collection::vec((0.0f64..60.0, 0.0f64..60.0), 0..20),
        obstacles in prop::collection::vec((0.0f64..60.0, 0.0f64..60.0, 0.5f64..15.0), 0..6),
    ) {
        let pads = pads_from(&coords);
        let heights = heights_from(&obstacles);
        let seq = sequence_safe(&Point2D::origin(), &pads, &heights, &SafePathConfig::default()).unwrap();
        prop_assert_eq!(seq.len(), pads.len());
        let ids: HashSet<&str> = seq.iter().map(|e| e.pad.id.as_str()).collect();
        prop_assert_eq!(ids.len(), pads.len());
        for (i, e) in seq.iter().enumerate() {
            prop_assert_eq!(e.sequence_order, i + 1);
        }
    }

    #[test]
    fn forced_paths_stay_above_clearance(
        coords in prop::collection::vec((0.0f64..40.0, 0.0f64..40.0), 1..12),
        obstacles in prop::collection::vec((0.0f64..40.0, 0.0f64..40.0, 3.0f64..20.0), 1..6),
    ) {
        let pads = pads_from(&coords);
        let heights = heights_from(&obstacles);
        let config = SafePathConfig::default();
        let seq = sequence_safe(&Point2D::origin(), &pads, &heights, &config).unwrap();

        for entry in seq.iter().filter(|e| e.requires_high_clearance) {
            let path = entry.safe_path.as_ref().unwrap();
            prop_assert!(path.safe_height >= heights.max_height() + config.obstacle_margin - 1e-12);
            let (descent, rest) = path.segments.split_last().unwrap();
            prop_assert_eq!(descent.kind, SegmentKind::Lower);
            for segment in rest {
                prop_assert!(segment.to.z >= config.clearance_height);
            }
            prop_assert!(rest[1].from.z >= config.clearance_height);
            prop_assert!((entry.path_distance - path.length()).abs() < 1e-9);
        }
    }

    #[test]
    fn profile_conserves_distance(
        x in -200.0f64..200.0,
        y in -200.0f64..200.0,
        vx in 5.0f64..300.0,
        vy in 5.0f64..300.0,
        ax in 50.0f64..5000.0,
        ay in 50.0f64..5000.0,
    ) {
        prop_assume!(x.hypot(y) > 0.01);
        let limits = AxisLimits { vx, vy, ax, ay, ..AxisLimits::default() };
        let a = Point2D::origin();
        let b = Point2D::new(x, y);
        let p = profile(&a, &b, &limits, &ProfileOptions::default()).unwrap();

        let sampled = p.sampled_length();
        prop_assert!((sampled - p.lxy).abs() / p.lxy < 0.01);

        let last = p.waypoints.last().unwrap();
        prop_assert_eq!(last.t, p.total_time);
        prop_assert_eq!((last.x, last.y), (x, y));
        prop_assert!(p.waypoints.windows(2).all(|w| w[0].t < w[1].t));
        prop_assert!(p.v_peak <= p.v_line + 1e-9);
    }
}

#[test]
fn example_flat_tie_break() {
    let pads = pads_from(&[(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
    let seq = sequence_flat(&Point2D::origin(), &pads);
    let visited: Vec<(f64, f64)> = seq.iter().map(|e| (e.pad.x, e.pad.y)).collect();
    assert_eq!(visited, vec![(0.0, 0.0), (10.0, 0.0), (0.0, 10.0)]);
}

#[test]
fn example_trapezoidal_profile() {
    let limits = AxisLimits {
        vx: 50.0,
        ax: 500.0,
        ..AxisLimits::default()
    };
    let p = profile(
        &Point2D::new(0.0, 0.0),
        &Point2D::new(100.0, 0.0),
        &limits,
        &ProfileOptions::default(),
    )
    .unwrap();
    assert_eq!(p.kind, ProfileKind::Trapezoidal);
    assert!((p.v_peak - 50.0).abs() < 1e-12);
    assert!((p.distance_at(p.t_accel) - 2.5).abs() < 1e-9);
}

#[test]
fn example_sequence_entries_serialize() {
    let pads = pads_from(&[(0.0, 0.0), (10.0, 0.0)]);
    let heights = heights_from(&[(5.0, 0.0, 8.0)]);
    let seq = sequence_safe(&Point2D::origin(), &pads, &heights, &SafePathConfig::default()).unwrap();

    let value = serde_json::to_value(&seq).unwrap();
    let entries = value.as_array().unwrap();
    assert_eq!(entries[0]["sequence_order"], 1);
    assert_eq!(entries[0]["requires_high_clearance"], false);
    assert!(entries[0].get("safe_path").is_none());
    assert_eq!(entries[1]["requires_high_clearance"], true);
    let segments = entries[1]["safe_path"]["segments"].as_array().unwrap();
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[0]["kind"], "lift");

    let back: Vec<pastekit_motion::DispensingSequenceEntry> =
        serde_json::from_value(value).unwrap();
    assert_eq!(back.len(), 2);
    assert!(back[1].safe_path.is_some());
    assert_eq!(back[1].pad.id, "S2");
}
