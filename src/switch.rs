//! On/off accessories: a plain switch and a momentary push-button.
//!
//! Both drive a single [`DigitalOutput`] and publish the On characteristic.
//! The push-button additionally uses a [`MotionScheduler`] to release itself
//! after `invoke_timeout_ms`, with the same generation check the position
//! controller uses for its timer.
//!
//! # Example
//!
//! ```rust
//! use gpio_accessory::{PushButton, SwitchEvent};
//! use gpio_accessory::hal::{MockOutput, MockScheduler, MockSwitchPublisher};
//!
//! let mut button = PushButton::new(
//!     MockOutput::new(),
//!     MockScheduler::new(),
//!     MockSwitchPublisher::new(),
//!     500,
//! );
//! button.start(0).unwrap();
//!
//! button.handle(SwitchEvent::SetOn(true), 0).unwrap();
//! assert!(button.output().active);
//!
//! let (duration, generation) = button.scheduler().armed.unwrap();
//! assert_eq!(duration, 500);
//! button.handle(SwitchEvent::TimerFired(generation), 500).unwrap();
//! assert!(!button.output().active);
//! assert_eq!(button.publisher().on, Some(false));
//! ```

use tracing::{debug, info};

use crate::accessory::{AccessoryInformation, AccessoryLifecycle, ServiceKind};
use crate::commands::SwitchEvent;
use crate::traits::{DigitalOutput, MotionScheduler, SwitchPublisher};

/// Push-button release delay when none is configured.
pub const DEFAULT_INVOKE_TIMEOUT_MS: u64 = 500;

/// A GPIO output exposed as an on/off switch.
pub struct GpioSwitch<O, P>
where
    O: DigitalOutput,
    P: SwitchPublisher,
{
    output: O,
    publisher: P,
    information: AccessoryInformation,
    on: bool,
}

impl<O, P> GpioSwitch<O, P>
where
    O: DigitalOutput,
    P: SwitchPublisher,
{
    /// Create a switch; it starts off.
    pub fn new(output: O, publisher: P) -> Self {
        Self {
            output,
            publisher,
            information: AccessoryInformation::new("switch", ServiceKind::Switch, None),
            on: false,
        }
    }

    /// Set the accessory information reported to the host.
    pub fn with_information(mut self, information: AccessoryInformation) -> Self {
        self.information = information;
        self
    }

    /// Drive the output inactive and publish On = false.
    pub fn start(&mut self, _now_ms: u64) -> Result<(), O::Error> {
        self.output.set_active(false)?;
        self.on = false;
        self.publisher.on(false);
        info!("{} service initialized", self.information.model.as_str());
        Ok(())
    }

    /// Switch the output on or off.
    pub fn set_on(&mut self, on: bool) -> Result<(), O::Error> {
        debug!("switching {}", if on { "on" } else { "off" });
        self.output.set_active(on)?;
        self.on = on;
        self.publisher.on(on);
        Ok(())
    }

    /// Dispatch one event. Timer fires are ignored; a switch arms none.
    pub fn handle(&mut self, event: SwitchEvent, _now_ms: u64) -> Result<(), O::Error> {
        match event {
            SwitchEvent::SetOn(on) => self.set_on(on),
            SwitchEvent::TimerFired(_) => Ok(()),
        }
    }

    /// Whether the switch is on.
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// The output.
    pub fn output(&self) -> &O {
        &self.output
    }

    /// The publisher.
    pub fn publisher(&self) -> &P {
        &self.publisher
    }
}

impl<O, P> AccessoryLifecycle for GpioSwitch<O, P>
where
    O: DigitalOutput,
    P: SwitchPublisher,
{
    type Event = SwitchEvent;
    type Error = O::Error;

    fn information(&self) -> &AccessoryInformation {
        &self.information
    }

    fn start(&mut self, now_ms: u64) -> Result<(), O::Error> {
        GpioSwitch::start(self, now_ms)
    }

    fn handle(&mut self, event: SwitchEvent, now_ms: u64) -> Result<(), O::Error> {
        GpioSwitch::handle(self, event, now_ms)
    }

    // The output keeps its last state when the process exits.
    fn shutdown(&mut self, _now_ms: u64) -> Result<(), O::Error> {
        Ok(())
    }
}

/// A GPIO output that switches itself off after a timeout.
pub struct PushButton<O, S, P>
where
    O: DigitalOutput,
    S: MotionScheduler,
    P: SwitchPublisher,
{
    output: O,
    scheduler: S,
    publisher: P,
    information: AccessoryInformation,
    invoke_timeout_ms: u64,
    on: bool,
    generation: u64,
}

impl<O, S, P> PushButton<O, S, P>
where
    O: DigitalOutput,
    S: MotionScheduler,
    P: SwitchPublisher,
{
    /// Create a push-button released `invoke_timeout_ms` after each press.
    pub fn new(output: O, scheduler: S, publisher: P, invoke_timeout_ms: u64) -> Self {
        Self {
            output,
            scheduler,
            publisher,
            information: AccessoryInformation::new("push button", ServiceKind::PushButton, None),
            invoke_timeout_ms,
            on: false,
            generation: 0,
        }
    }

    /// Set the accessory information reported to the host.
    pub fn with_information(mut self, information: AccessoryInformation) -> Self {
        self.information = information;
        self
    }

    /// Drive the output inactive and publish On = false.
    pub fn start(&mut self, _now_ms: u64) -> Result<(), O::Error> {
        self.output.set_active(false)?;
        self.on = false;
        self.publisher.on(false);
        info!("{} service initialized", self.information.model.as_str());
        Ok(())
    }

    /// Press or release.
    ///
    /// Pressing while already pressed restarts the release timer.
    pub fn set_on(&mut self, on: bool) -> Result<(), O::Error> {
        if on {
            self.retire_timer();
            self.output.set_active(true)?;
            self.on = true;
            self.publisher.on(true);
            self.scheduler.arm(self.invoke_timeout_ms, self.generation);
            Ok(())
        } else {
            self.release()
        }
    }

    /// The release timer armed with `generation` elapsed.
    ///
    /// Returns `false` when the fire is stale.
    pub fn on_timer_fired(&mut self, generation: u64) -> Result<bool, O::Error> {
        if !self.on || generation != self.generation {
            debug!("Stale release timer {}, ignoring", generation);
            return Ok(false);
        }
        self.release()?;
        Ok(true)
    }

    /// Dispatch one event.
    pub fn handle(&mut self, event: SwitchEvent, _now_ms: u64) -> Result<(), O::Error> {
        match event {
            SwitchEvent::SetOn(on) => self.set_on(on),
            SwitchEvent::TimerFired(generation) => self.on_timer_fired(generation).map(drop),
        }
    }

    fn release(&mut self) -> Result<(), O::Error> {
        self.retire_timer();
        self.output.set_active(false)?;
        self.on = false;
        self.publisher.on(false);
        info!("triggered");
        Ok(())
    }

    fn retire_timer(&mut self) {
        self.scheduler.cancel();
        self.generation = self.generation.wrapping_add(1);
    }

    /// Whether the button is currently pressed.
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Release delay.
    pub fn invoke_timeout_ms(&self) -> u64 {
        self.invoke_timeout_ms
    }

    /// The output.
    pub fn output(&self) -> &O {
        &self.output
    }

    /// The scheduler.
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    /// The publisher.
    pub fn publisher(&self) -> &P {
        &self.publisher
    }
}

impl<O, S, P> AccessoryLifecycle for PushButton<O, S, P>
where
    O: DigitalOutput,
    S: MotionScheduler,
    P: SwitchPublisher,
{
    type Event = SwitchEvent;
    type Error = O::Error;

    fn information(&self) -> &AccessoryInformation {
        &self.information
    }

    fn start(&mut self, now_ms: u64) -> Result<(), O::Error> {
        PushButton::start(self, now_ms)
    }

    fn handle(&mut self, event: SwitchEvent, now_ms: u64) -> Result<(), O::Error> {
        PushButton::handle(self, event, now_ms)
    }

    fn shutdown(&mut self, _now_ms: u64) -> Result<(), O::Error> {
        if self.on {
            self.release()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::{MockOutput, MockScheduler, MockSwitchPublisher};

    #[test]
    fn switch_starts_off() {
        let mut switch = GpioSwitch::new(MockOutput::new(), MockSwitchPublisher::new());
        switch.start(0).unwrap();
        assert!(!switch.is_on());
        assert!(!switch.output().active);
        assert_eq!(switch.publisher().on, Some(false));
    }

    #[test]
    fn switch_follows_set_on() {
        let mut switch = GpioSwitch::new(MockOutput::new(), MockSwitchPublisher::new());
        switch.start(0).unwrap();

        switch.handle(SwitchEvent::SetOn(true), 0).unwrap();
        assert!(switch.output().active);
        assert_eq!(switch.publisher().on, Some(true));

        switch.handle(SwitchEvent::TimerFired(0), 10).unwrap();
        assert!(switch.is_on());

        switch.handle(SwitchEvent::SetOn(false), 20).unwrap();
        assert!(!switch.output().active);
    }

    fn button() -> PushButton<MockOutput, MockScheduler, MockSwitchPublisher> {
        let mut button = PushButton::new(
            MockOutput::new(),
            MockScheduler::new(),
            MockSwitchPublisher::new(),
            DEFAULT_INVOKE_TIMEOUT_MS,
        );
        button.start(0).unwrap();
        button
    }

    #[test]
    fn button_releases_on_timer() {
        let mut button = button();
        button.set_on(true).unwrap();
        let (duration, generation) = button.scheduler().armed.unwrap();
        assert_eq!(duration, 500);

        assert!(button.on_timer_fired(generation).unwrap());
        assert!(!button.is_on());
        assert!(!button.output().active);
    }

    #[test]
    fn button_manual_release_cancels_timer() {
        let mut button = button();
        button.set_on(true).unwrap();
        let (_, generation) = button.scheduler().armed.unwrap();

        button.set_on(false).unwrap();
        assert_eq!(button.scheduler().armed, None);
        assert!(!button.on_timer_fired(generation).unwrap());
    }

    #[test]
    fn button_repress_rearms() {
        let mut button = button();
        button.set_on(true).unwrap();
        let (_, first) = button.scheduler().armed.unwrap();
        button.set_on(true).unwrap();
        let (_, second) = button.scheduler().armed.unwrap();
        assert_ne!(first, second);

        assert!(!button.on_timer_fired(first).unwrap());
        assert!(button.is_on());
        assert!(button.on_timer_fired(second).unwrap());
    }

    #[test]
    fn button_shutdown_releases() {
        let mut button = button();
        button.set_on(true).unwrap();
        AccessoryLifecycle::shutdown(&mut button, 100).unwrap();
        assert!(!button.output().active);
    }
}
