//! Integration tests for the position controller.
//!
//! Covers the timing model, boundary handling, hold, and the relay interlock
//! using mock hardware and a manually driven timer.

use gpio_accessory::{
    hal::{MockActuator, MockPublisher, MockScheduler},
    BoundaryEdge, CoverEvent, Direction, MotionState, MoveOutcome, PositionController,
    TargetPosition, TravelProfile,
};

type TestCover = PositionController<MockActuator, MockScheduler, MockPublisher>;

fn cover(time_open_ms: u64, time_close_ms: u64) -> TestCover {
    let mut cover = PositionController::new(
        MockActuator::new(),
        MockScheduler::new(),
        MockPublisher::new(),
        TravelProfile::new(time_open_ms, time_close_ms).unwrap(),
    );
    cover.start(0).unwrap();
    cover
}

/// Deliver the armed timer fire, as the runtime would after `duration_ms`.
fn fire(cover: &mut TestCover, started_ms: u64) -> bool {
    let (duration_ms, generation) = cover.scheduler().armed.expect("no timer armed");
    cover
        .on_timer_fired(generation, started_ms + duration_ms)
        .unwrap()
}

/// Move to `position` and let the move complete.
fn settle_at(cover: &mut TestCover, position: f32) {
    cover.request_target_position(position, 0).unwrap();
    assert!(fire(cover, 0));
    assert_eq!(cover.current_position(), position);
}

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 0.01,
        "expected {expected}, got {actual}"
    );
}

// ============================================================================
// Timing
// ============================================================================

#[test]
fn full_close_from_open_uses_close_time() {
    let mut cover = cover(12_000, 10_000);
    cover.on_boundary_edge(BoundaryEdge::Open, 0).unwrap();
    assert_eq!(cover.current_position(), 100.0);

    let outcome = cover.request_target_position(0.0, 1_000).unwrap();
    assert_eq!(
        outcome,
        MoveOutcome::Started {
            direction: Direction::Decreasing,
            duration_ms: 10_000
        }
    );
    assert_eq!(cover.motion_state(), MotionState::Decreasing);
    assert!(cover.actuator().retract);
    assert!(!cover.actuator().extend);

    assert!(fire(&mut cover, 1_000));
    assert_eq!(cover.current_position(), 0.0);
    assert_eq!(cover.target_position(), 0.0);
    assert_eq!(cover.motion_state(), MotionState::Stopped);
    assert!(!cover.actuator().retract);
    assert_eq!(cover.publisher().current_position, Some(0.0));
    assert_eq!(cover.publisher().motion_state, Some(MotionState::Stopped));
}

#[test]
fn full_open_uses_open_time_even_from_estimate() {
    let mut cover = cover(12_000, 10_000);
    settle_at(&mut cover, 90.0);

    // An end stop is always a full run, so a drifted estimate gets corrected
    let outcome = cover.request_target_position(100.0, 0).unwrap();
    assert_eq!(
        outcome,
        MoveOutcome::Started {
            direction: Direction::Increasing,
            duration_ms: 12_000
        }
    );
}

#[test]
fn partial_close_scales_close_time() {
    let mut cover = cover(10_000, 10_000);
    settle_at(&mut cover, 80.0);

    let outcome = cover.request_target_position(30.0, 0).unwrap();
    assert_eq!(
        outcome,
        MoveOutcome::Started {
            direction: Direction::Decreasing,
            duration_ms: 5_000
        }
    );
    assert_eq!(cover.scheduler().armed.map(|(ms, _)| ms), Some(5_000));
}

#[test]
fn partial_open_scales_open_time() {
    let mut cover = cover(20_000, 5_000);
    let outcome = cover.request_target_position(75.0, 0).unwrap();
    assert_eq!(
        outcome,
        MoveOutcome::Started {
            direction: Direction::Increasing,
            duration_ms: 5_000
        }
    );
}

#[test]
fn handle_routes_host_requests() {
    let mut cover = cover(10_000, 10_000);
    let target = TargetPosition::new(70).unwrap();
    cover
        .handle(CoverEvent::SetTargetPosition(target), 0)
        .unwrap();
    assert_eq!(cover.target_position(), 70.0);

    let (_, generation) = cover.scheduler().armed.unwrap();
    cover
        .handle(CoverEvent::TimerFired(generation), 2_000)
        .unwrap();
    assert_eq!(cover.current_position(), 70.0);
    assert_eq!(cover.motion_state(), MotionState::Stopped);
}

// ============================================================================
// Boundary contacts
// ============================================================================

#[test]
fn boundary_edge_overrides_timer() {
    let mut cover = cover(10_000, 10_000);
    cover.request_target_position(100.0, 0).unwrap();
    let (_, generation) = cover.scheduler().armed.unwrap();

    cover
        .handle(CoverEvent::Boundary(BoundaryEdge::Open), 4_000)
        .unwrap();
    assert_eq!(cover.current_position(), 100.0);
    assert_eq!(cover.motion_state(), MotionState::Stopped);
    assert!(cover.scheduler().armed.is_none());
    assert!(!cover.actuator().extend);

    // The cancelled timer's fire arrives anyway
    assert!(!cover.on_timer_fired(generation, 10_000).unwrap());
    assert_eq!(cover.current_position(), 100.0);
}

#[test]
fn close_edge_snaps_to_zero_mid_travel() {
    let mut cover = cover(10_000, 10_000);
    cover.request_target_position(20.0, 0).unwrap();

    cover.on_boundary_edge(BoundaryEdge::Close, 1_000).unwrap();
    assert_eq!(cover.current_position(), 0.0);
    assert_eq!(cover.motion_state(), MotionState::Stopped);
}

#[test]
fn redundant_open_edge_is_idempotent() {
    let mut cover = cover(10_000, 10_000);
    cover.request_target_position(100.0, 0).unwrap();
    cover.on_boundary_edge(BoundaryEdge::Open, 5_000).unwrap();

    let target = cover.target_position();
    let writes = cover.actuator().history.len();
    cover.on_boundary_edge(BoundaryEdge::Open, 6_000).unwrap();

    assert_eq!(cover.current_position(), 100.0);
    assert_eq!(cover.target_position(), target);
    assert_eq!(cover.motion_state(), MotionState::Stopped);
    assert!(cover.session().is_none());
    // Outputs are released again, never energized
    assert!(cover.actuator().history[writes..]
        .iter()
        .all(|&(extend, retract)| !extend && !retract));
}

// ============================================================================
// Interruption and hold
// ============================================================================

#[test]
fn hold_extrapolates_and_freezes_target() {
    let mut cover = cover(10_000, 10_000);
    settle_at(&mut cover, 20.0);

    cover.request_target_position(90.0, 1_000).unwrap();
    assert_eq!(cover.motion_state(), MotionState::Increasing);

    cover.set_hold(true, 4_000).unwrap();
    assert_close(cover.current_position(), 50.0);
    assert_close(cover.target_position(), 50.0);
    assert_eq!(cover.motion_state(), MotionState::Stopped);
    assert!(cover.is_held());
    assert_eq!(cover.publisher().hold, Some(true));
    assert_close(cover.publisher().target_position.unwrap(), 50.0);
}

#[test]
fn retarget_mid_travel_starts_from_estimate() {
    let mut cover = cover(10_000, 8_000);
    cover.request_target_position(100.0, 0).unwrap();
    let first_generation = cover.scheduler().armed.unwrap().1;

    // 2.5 s of a 10 s open: 50 + 25
    let outcome = cover.request_target_position(45.0, 2_500).unwrap();
    assert_close(cover.current_position(), 75.0);
    assert_eq!(
        outcome,
        MoveOutcome::Started {
            direction: Direction::Decreasing,
            duration_ms: 2_400
        }
    );

    let (_, generation) = cover.scheduler().armed.unwrap();
    assert_ne!(generation, first_generation);
    assert!(!cover.on_timer_fired(first_generation, 10_000).unwrap());
    assert_eq!(cover.motion_state(), MotionState::Decreasing);
}

#[test]
fn extrapolation_clamps_at_limits() {
    let mut cover = cover(10_000, 10_000);
    cover.request_target_position(0.0, 0).unwrap();

    // Stopped long after the planned run ended
    cover.stop(None, 60_000).unwrap();
    assert_eq!(cover.current_position(), 0.0);
}

#[test]
fn equal_target_does_not_move() {
    let mut cover = cover(10_000, 10_000);
    let arms = cover.scheduler().arm_count;

    let outcome = cover.request_target_position(50.0, 0).unwrap();
    assert_eq!(outcome, MoveOutcome::AlreadyThere);
    assert_eq!(cover.scheduler().arm_count, arms);
    assert!(cover.scheduler().armed.is_none());
    assert!(!cover.actuator().history.iter().any(|&(e, r)| e || r));
    assert_eq!(cover.publisher().target_position, Some(50.0));
}

// ============================================================================
// Interlock
// ============================================================================

#[test]
fn outputs_never_active_together() {
    let mut cover = cover(10_000, 10_000);
    let mut now = 0;
    for target in [100.0, 10.0, 90.0, 0.0, 60.0, 40.0] {
        cover.request_target_position(target, now).unwrap();
        now += 700;
    }
    cover.on_boundary_edge(BoundaryEdge::Close, now).unwrap();

    assert!(!cover.actuator().both_active_seen);
}

#[test]
fn reversal_releases_before_energizing() {
    let mut cover = cover(10_000, 10_000);
    cover.request_target_position(100.0, 0).unwrap();
    let before = cover.actuator().history.len();

    cover.request_target_position(0.0, 1_000).unwrap();
    let writes = &cover.actuator().history[before..];

    let energized = writes
        .iter()
        .position(|&(_, retract)| retract)
        .expect("retract never energized");
    assert!(energized > 0);
    assert!(writes[..energized].iter().any(|&(extend, _)| !extend));
    assert_eq!(writes.last(), Some(&(false, true)));
}

#[test]
fn motion_transitions_are_published_in_order() {
    let mut cover = cover(10_000, 10_000);
    cover.request_target_position(80.0, 0).unwrap();
    fire(&mut cover, 0);
    cover.request_target_position(10.0, 0).unwrap();
    cover.set_hold(true, 1_000).unwrap();

    assert_eq!(
        cover.publisher().motion_transitions(),
        vec![
            MotionState::Stopped,
            MotionState::Increasing,
            MotionState::Stopped,
            MotionState::Decreasing,
            MotionState::Stopped,
        ]
    );
}

#[test]
fn hardware_error_propagates() {
    let mut cover = PositionController::new(
        MockActuator::failing(),
        MockScheduler::new(),
        MockPublisher::new(),
        TravelProfile::new(1_000, 1_000).unwrap(),
    );
    assert!(cover.start(0).is_err());
    assert!(cover.request_target_position(80.0, 0).is_err());
}
