use std::time::Duration;

use neonroom::animation::{AnimationClip, Keyframes, MixerRegistry};
use neonroom::camera::Projection;
use neonroom::context::FrameClock;
use neonroom::viewer::{FrameStats, LoopState};

#[test]
fn should_walk_the_loop_lifecycle() {
    let mut state = LoopState::Constructed;
    assert!(!state.is_looping());

    assert!(state.start());
    assert!(state.is_looping());
    // Starting twice is a no-op.
    assert!(!state.start());

    assert!(state.stop());
    assert_eq!(state, LoopState::Stopped);
    assert!(!state.stop());

    assert!(state.start());
    assert!(state.is_looping());
}

#[test]
fn should_resume_exactly_once_after_occlusion() {
    let mut state = LoopState::Looping;
    assert!(state.stop());
    // A stopped loop runs no frames and schedules no redraws.
    assert!(!state.is_looping());
    // Becoming visible restarts the loop once; repeat events do not.
    assert!(state.start());
    assert!(!state.start());
    assert!(state.is_looping());
}

#[test]
fn should_never_leave_the_disposed_state() {
    let mut state = LoopState::Looping;
    state.dispose();
    assert!(state.is_disposed());

    assert!(!state.start());
    assert!(!state.stop());
    assert!(state.is_disposed());
}

#[test]
fn should_dispose_from_any_state() {
    for mut state in [
        LoopState::Constructed,
        LoopState::Looping,
        LoopState::Stopped,
        LoopState::Disposed,
    ] {
        state.dispose();
        assert!(state.is_disposed());
    }
}

fn dummy_clip(target: &str) -> AnimationClip {
    AnimationClip {
        name: "spin".into(),
        target: target.into(),
        keyframes: Keyframes::Other,
        timestamps: vec![0.0, 1.0],
    }
}

#[test]
fn should_look_up_mixers_by_name() {
    let mut registry = MixerRegistry::new();
    assert!(registry.is_empty());

    registry.create("room", vec![dummy_clip("fan")]);
    assert_eq!(registry.len(), 1);

    let mixer = registry.get_mut("room").unwrap();
    mixer.update(Duration::from_millis(500));
    assert_eq!(mixer.elapsed(), Duration::from_millis(500));
}

#[test]
fn should_error_on_a_missing_mixer_name() {
    let mut registry = MixerRegistry::new();
    registry.create("room", vec![dummy_clip("fan")]);

    let err = registry.get_mut("fan").unwrap_err();
    assert!(err.to_string().contains("fan"));
}

#[test]
fn should_advance_every_mixer_together() {
    let mut registry = MixerRegistry::new();
    registry.create("a", vec![dummy_clip("x")]);
    registry.create("b", vec![dummy_clip("y")]);

    registry.update_all(Duration::from_millis(16));
    assert_eq!(registry.get_mut("a").unwrap().elapsed(), Duration::from_millis(16));
    assert_eq!(registry.get_mut("b").unwrap().elapsed(), Duration::from_millis(16));
}

#[test]
fn should_track_aspect_ratio_through_resizes() {
    let mut projection = Projection::new(800, 600, neonroom::Deg(50.0), 0.01, 100.0);
    assert!((projection.aspect - 800.0 / 600.0).abs() < 1e-6);

    projection.resize(1920, 1080);
    assert!((projection.aspect - 1920.0 / 1080.0).abs() < 1e-6);

    projection.resize(400, 400);
    assert!((projection.aspect - 1.0).abs() < 1e-6);
}

#[test]
fn should_measure_frame_deltas() {
    let mut clock = FrameClock::new();
    std::thread::sleep(Duration::from_millis(5));
    let first = clock.tick();
    assert!(first >= Duration::from_millis(5));

    let second = clock.tick();
    // Back-to-back ticks report only the gap between them.
    assert!(second < first);
    assert!(clock.elapsed() >= first);
}

#[test]
fn should_report_fps_once_per_second() {
    let mut stats = FrameStats::new();
    assert!(stats.record_frame().is_none());
    assert!(stats.record_frame().is_none());
}
