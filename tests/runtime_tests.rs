//! Integration tests for the tokio event loop.
//!
//! Time is paused, so timers and sleeps advance instantly and
//! deterministically.

#![cfg(feature = "runtime")]

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use embedded_hal::digital::{ErrorType, InputPin};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use gpio_accessory::hal::{ContactSensor, MockActuator, MockOutput};
use gpio_accessory::services::{
    spawn_contact_poller, AccessoryRuntime, CoverHandle, CoverSnapshot, RuntimeChannel,
    TokioScheduler, WatchPublisher, WatchSwitchPublisher,
};
use gpio_accessory::{
    BoundaryEdge, CoverEvent, Error, MotionState, Polarity, PositionController, PushButton,
    SwitchEvent, TravelProfile,
};

type Cover = PositionController<MockActuator, TokioScheduler<CoverEvent>, WatchPublisher>;

fn cover_runtime(
    time_open_ms: u64,
    time_close_ms: u64,
) -> (AccessoryRuntime<Cover>, CoverHandle, watch::Receiver<CoverSnapshot>) {
    let channel = RuntimeChannel::new();
    let (publisher, state) = WatchPublisher::new();
    let cover = PositionController::new(
        MockActuator::new(),
        channel.scheduler(CoverEvent::TimerFired),
        publisher,
        TravelProfile::new(time_open_ms, time_close_ms).unwrap(),
    );
    let (runtime, handle) = channel.into_runtime(cover);
    (runtime, handle, state)
}

fn spawn_cover(
    time_open_ms: u64,
    time_close_ms: u64,
) -> (JoinHandle<Cover>, CoverHandle, watch::Receiver<CoverSnapshot>) {
    let (runtime, handle, state) = cover_runtime(time_open_ms, time_close_ms);
    (tokio::spawn(runtime.run()), handle, state)
}

async fn wait_until(
    state: &mut watch::Receiver<CoverSnapshot>,
    done: impl FnMut(&CoverSnapshot) -> bool,
) -> CoverSnapshot {
    let snapshot = tokio::time::timeout(Duration::from_secs(120), state.wait_for(done))
        .await
        .expect("state never reached")
        .expect("publisher dropped");
    *snapshot
}

#[tokio::test(start_paused = true)]
async fn move_completes_when_timer_fires() {
    let (task, handle, mut state) = spawn_cover(10_000, 10_000);

    handle.set_target_position(80).unwrap();
    let started = tokio::time::Instant::now();
    let snapshot = wait_until(&mut state, |s| {
        s.motion_state == MotionState::Stopped && s.current_position == 80.0
    })
    .await;

    assert_eq!(snapshot.target_position, 80.0);
    assert!(started.elapsed() >= Duration::from_millis(3_000));

    handle.shutdown().unwrap();
    let cover = task.await.unwrap();
    assert!(!cover.actuator().both_active_seen);
    assert_eq!(cover.current_position(), 80.0);
}

#[tokio::test(start_paused = true)]
async fn hold_interrupts_and_stale_timer_is_ignored() {
    let (task, handle, mut state) = spawn_cover(10_000, 10_000);

    handle.set_target_position(100).unwrap();
    tokio::time::sleep(Duration::from_millis(2_000)).await;
    handle.set_hold(true).unwrap();

    let snapshot = wait_until(&mut state, |s| s.hold).await;
    assert_eq!(snapshot.motion_state, MotionState::Stopped);
    assert!((snapshot.current_position - 70.0).abs() < 0.5);
    assert_eq!(snapshot.target_position, snapshot.current_position);

    // Well past the original 10 s run
    tokio::time::sleep(Duration::from_secs(20)).await;
    let later = *state.borrow();
    assert_eq!(later.current_position, snapshot.current_position);
    assert_eq!(later.motion_state, MotionState::Stopped);

    handle.shutdown().unwrap();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn boundary_edge_beats_timer() {
    let (task, handle, mut state) = spawn_cover(10_000, 10_000);

    handle.set_target_position(0).unwrap();
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    handle.boundary_edge(BoundaryEdge::Close).unwrap();

    let snapshot = wait_until(&mut state, |s| s.current_position == 0.0).await;
    assert_eq!(snapshot.motion_state, MotionState::Stopped);

    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(state.borrow().current_position, 0.0);

    handle.shutdown().unwrap();
    let cover = task.await.unwrap();
    assert!(cover.session().is_none());
}

#[tokio::test(start_paused = true)]
async fn out_of_range_target_is_rejected_at_the_handle() {
    let (task, handle, state) = spawn_cover(10_000, 10_000);

    assert!(matches!(
        handle.set_target_position(101),
        Err(Error::PositionOutOfRange(101))
    ));
    assert!(matches!(
        handle.set_target_position(-1),
        Err(Error::PositionOutOfRange(-1))
    ));

    handle.shutdown().unwrap();
    let cover = task.await.unwrap();
    assert_eq!(cover.target_position(), 50.0);
    assert_eq!(state.borrow().motion_state, MotionState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_motor_and_closes_handle() {
    let (task, handle, _state) = spawn_cover(10_000, 10_000);

    handle.set_target_position(100).unwrap();
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    handle.shutdown().unwrap();

    let cover = task.await.unwrap();
    assert_eq!(cover.motion_state(), MotionState::Stopped);
    assert!(!cover.actuator().extend);
    assert!(handle.is_closed());
    assert!(matches!(handle.set_hold(true), Err(Error::RuntimeClosed)));
}

#[tokio::test(start_paused = true)]
async fn dropping_every_handle_ends_the_runtime() {
    let (task, handle, _state) = spawn_cover(10_000, 10_000);
    handle.set_target_position(90).unwrap();
    drop(handle);

    let cover = tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("runtime kept running")
        .unwrap();
    assert_eq!(cover.motion_state(), MotionState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn push_button_releases_itself() {
    let channel = RuntimeChannel::new();
    let (publisher, state) = WatchSwitchPublisher::new();
    let button = PushButton::new(
        MockOutput::new(),
        channel.scheduler(SwitchEvent::TimerFired),
        publisher,
        500,
    );
    let (runtime, handle) = channel.into_runtime(button);
    let task = tokio::spawn(runtime.run());

    handle.set_on(true).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(state.borrow().on);

    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert!(!state.borrow().on);

    handle.shutdown().unwrap();
    let button = task.await.unwrap();
    assert!(!button.output().active);
}

/// Input pin whose level the test sets through a shared flag.
#[derive(Clone, Default)]
struct SharedPin(Arc<AtomicBool>);

impl ErrorType for SharedPin {
    type Error = Infallible;
}

impl InputPin for SharedPin {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.load(Ordering::SeqCst))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        Ok(!self.0.load(Ordering::SeqCst))
    }
}

#[tokio::test(start_paused = true)]
async fn contact_poller_stops_cover_at_limit() {
    let (task, handle, mut state) = spawn_cover(10_000, 10_000);
    let pin = SharedPin::default();
    let sensor = ContactSensor::new(pin.clone(), Polarity::ActiveHigh, BoundaryEdge::Open);
    let poller = spawn_contact_poller(sensor, handle.clone(), Duration::from_millis(10));

    handle.set_target_position(100).unwrap();
    tokio::time::sleep(Duration::from_millis(3_000)).await;
    assert_eq!(state.borrow().motion_state, MotionState::Increasing);

    pin.0.store(true, Ordering::SeqCst);
    let snapshot = wait_until(&mut state, |s| s.motion_state == MotionState::Stopped).await;
    assert_eq!(snapshot.current_position, 100.0);

    handle.shutdown().unwrap();
    task.await.unwrap();
    tokio::time::timeout(Duration::from_secs(1), poller)
        .await
        .expect("poller kept running")
        .unwrap();
}
