//! Single-shot cancellable timer used to end timed moves.
//!
//! A [`MotionScheduler`] does not call back into the controller directly.
//! Instead, when the armed duration elapses it delivers a "timer fired" event
//! tagged with the generation it was armed with, through whatever event loop
//! the accessory runs in. The accessory compares that generation with its own
//! and ignores stale fires, which closes the race between a cancel and a
//! timer that is already on its way.
//!
//! # Example
//!
//! ```rust
//! use gpio_accessory::traits::MotionScheduler;
//! use gpio_accessory::hal::MockScheduler;
//!
//! let mut scheduler = MockScheduler::new();
//! scheduler.arm(5_000, 3);
//! assert_eq!(scheduler.armed, Some((5_000, 3)));
//!
//! scheduler.cancel();
//! scheduler.cancel(); // idempotent
//! assert_eq!(scheduler.armed, None);
//! ```

/// At most one outstanding delayed delivery.
///
/// # Contract
///
/// - `arm` schedules exactly one delivery of `generation` after `duration_ms`,
///   superseding any previously armed timer.
/// - `cancel` is idempotent and safe to call when nothing is armed.
/// - After `cancel`, the previous timer should not fire; if the underlying
///   primitive cannot guarantee that, the generation check on the receiving
///   side makes the late delivery a no-op.
pub trait MotionScheduler {
    /// Schedule one delivery of `generation` after `duration_ms`.
    fn arm(&mut self, duration_ms: u64, generation: u64);

    /// Cancel the pending delivery, if any.
    fn cancel(&mut self);
}
