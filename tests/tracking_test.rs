use scenewatch_rs::tracker::{LifecycleEvent, RemovalReason};
use scenewatch_rs::{Detection, IouTracker, TrackState, TrackerConfig};

fn det(x: f32, y: f32) -> Detection {
    Detection::new(x, y, x + 100.0, y + 100.0, 0, 0.9)
}

#[test]
fn test_basic_tracking() {
    let mut tracker = IouTracker::new(TrackerConfig::default()).unwrap();

    // Frame 1: one detection starts a tentative track
    let out1 = tracker.update(1, &[det(100.0, 100.0)]).unwrap();
    assert_eq!(out1.tracks.len(), 1);
    assert_eq!(out1.tracks[0].state, TrackState::Tentative);
    let id1 = out1.tracks[0].id;

    // Frame 2: same object moved slightly, confirmed
    let out2 = tracker.update(2, &[det(105.0, 105.0)]).unwrap();
    assert_eq!(out2.tracks.len(), 1);
    assert_eq!(out2.tracks[0].id, id1);
    assert_eq!(out2.tracks[0].state, TrackState::Confirmed);

    // Frame 3: object occluded, track stays alive as lost
    let out3 = tracker.update(3, &[]).unwrap();
    assert_eq!(out3.tracks.len(), 1);
    assert_eq!(out3.tracks[0].state, TrackState::Lost);

    // Frame 4: object reappears near the predicted position
    let out4 = tracker.update(4, &[det(115.0, 115.0)]).unwrap();
    assert_eq!(out4.tracks.len(), 1);
    assert_eq!(out4.tracks[0].id, id1);
    assert_eq!(out4.tracks[0].state, TrackState::Confirmed);
    assert!(matches!(
        out4.events.as_slice(),
        [LifecycleEvent::Updated { .. }]
    ));
}

#[test]
fn test_multiple_objects_keep_ids() {
    let mut tracker = IouTracker::new(TrackerConfig::default()).unwrap();
    let first = tracker
        .update(0, &[det(0.0, 0.0), det(500.0, 0.0), det(0.0, 500.0)])
        .unwrap();
    let ids: Vec<u64> = first.tracks.iter().map(|t| t.id).collect();
    assert_eq!(ids.len(), 3);

    for frame in 1..10u64 {
        let shift = frame as f32 * 3.0;
        // Input order shuffled every frame; identities must not follow it.
        let output = tracker
            .update(
                frame,
                &[det(0.0, 500.0 + shift), det(shift, 0.0), det(500.0 - shift, 0.0)],
            )
            .unwrap();
        let live: Vec<u64> = output.tracks.iter().map(|t| t.id).collect();
        assert_eq!(live, ids);
    }
}

#[test]
fn test_match_threshold_gate() {
    let config = TrackerConfig {
        match_thresh: 0.5,
        ..Default::default()
    };
    let mut tracker = IouTracker::new(config).unwrap();
    tracker.update(0, &[det(0.0, 0.0)]).unwrap();

    // Shifted by 40: IoU = 60*100 / (2*10000 - 6000) ~ 0.43, under the gate.
    let output = tracker.update(1, &[det(40.0, 0.0)]).unwrap();
    assert_eq!(output.tracks.len(), 2);
    assert_eq!(output.tracks[0].hits, 1);
    assert_eq!(output.tracks[1].hits, 1);
    assert_ne!(output.tracks[0].id, output.tracks[1].id);
}

#[test]
fn test_flicker_accumulates_hits() {
    let mut tracker = IouTracker::new(TrackerConfig::default()).unwrap();
    let mut confirmed_at = Vec::new();
    let mut appearances = 0;

    // Present on even frames, absent on odd frames, five cycles.
    for frame in 0..10u64 {
        let dets = if frame % 2 == 0 {
            appearances += 1;
            vec![det(200.0, 200.0)]
        } else {
            vec![]
        };
        let output = tracker.update(frame, &dets).unwrap();
        for event in &output.events {
            match event {
                LifecycleEvent::Confirmed { frame_index, .. } => confirmed_at.push(*frame_index),
                LifecycleEvent::Removed { .. } => panic!("flickering track removed"),
                LifecycleEvent::Updated { .. } => {}
            }
        }
    }

    // Second sighting confirms despite the gap before it.
    assert_eq!(confirmed_at, vec![2]);
    let tracks = tracker.tracks();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].id, 1);
    assert_eq!(tracks[0].hits, appearances);
    assert_eq!(tracks[0].state, TrackState::Lost);
    assert_eq!(tracks[0].time_since_update, 1);
}

#[test]
fn test_continuously_matched_track_stays_confirmed() {
    let mut tracker = IouTracker::new(TrackerConfig::default()).unwrap();
    for frame in 0..100u64 {
        let output = tracker.update(frame, &[det(300.0, 300.0)]).unwrap();
        assert!(
            output
                .events
                .iter()
                .all(|e| !matches!(e, LifecycleEvent::Removed { .. }))
        );
        if frame >= 1 {
            assert_eq!(output.tracks[0].state, TrackState::Confirmed);
        }
    }
    assert_eq!(tracker.tracks()[0].hits, 100);
}

#[test]
fn test_lost_track_expires_after_max_lost_age() {
    let config = TrackerConfig {
        max_lost_age: 30,
        ..Default::default()
    };
    let mut tracker = IouTracker::new(config).unwrap();
    for frame in 0..5u64 {
        tracker.update(frame, &[det(0.0, 0.0)]).unwrap();
    }

    // Unmatched on frames 5..=35: removed when time_since_update reaches 31.
    let mut removal = None;
    for frame in 5..=40u64 {
        let output = tracker.update(frame, &[]).unwrap();
        for event in output.events {
            if let LifecycleEvent::Removed {
                track,
                frame_index,
                reason,
            } = event
            {
                assert!(removal.is_none(), "removed twice");
                assert_eq!(track.time_since_update, 31);
                removal = Some((frame_index, reason));
            }
        }
    }
    assert_eq!(removal, Some((35, RemovalReason::Expired)));
    assert!(tracker.tracks().is_empty());
}

#[test]
fn test_independent_trackers_do_not_share_ids() {
    let mut a = IouTracker::new(TrackerConfig::default()).unwrap();
    let mut b = IouTracker::new(TrackerConfig::default()).unwrap();
    let out_a = a.update(0, &[det(0.0, 0.0)]).unwrap();
    let out_b = b.update(0, &[det(0.0, 0.0)]).unwrap();
    assert_eq!(out_a.tracks[0].id, 1);
    assert_eq!(out_b.tracks[0].id, 1);
}
