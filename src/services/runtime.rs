//! Single-threaded event loop for one accessory.
//!
//! Every input to an accessory (host requests, contact edges, timer fires)
//! is a message on one unbounded tokio channel. [`AccessoryRuntime`] drains
//! that channel and runs each message to completion before taking the next,
//! so the accessory never sees two operations at once and needs no locking.
//!
//! # Wiring
//!
//! The scheduler has to exist before the accessory (it is a constructor
//! argument), and the runtime needs the accessory. [`RuntimeChannel`] breaks
//! that cycle: create it first, take a scheduler from it, build the
//! accessory, then turn the channel into a runtime.
//!
//! ```rust,no_run
//! use gpio_accessory::{CoverEvent, PositionController, TravelProfile};
//! use gpio_accessory::hal::MockActuator;
//! use gpio_accessory::services::{RuntimeChannel, WatchPublisher};
//!
//! # async fn run() -> gpio_accessory::Result<()> {
//! let channel = RuntimeChannel::new();
//! let scheduler = channel.scheduler(CoverEvent::TimerFired);
//! let (publisher, _state) = WatchPublisher::new();
//! let cover = PositionController::new(
//!     MockActuator::new(),
//!     scheduler,
//!     publisher,
//!     TravelProfile::new(20_000, 20_000)?,
//! );
//!
//! let (runtime, handle) = channel.into_runtime(cover);
//! let task = tokio::spawn(runtime.run());
//!
//! handle.set_target_position(75)?;
//! handle.shutdown()?;
//! let _cover = task.await.expect("runtime task panicked");
//! # Ok(())
//! # }
//! ```
//!
//! The scheduler only holds a weak sender, so once every [`AccessoryHandle`]
//! is dropped the channel closes and the runtime shuts the accessory down.

use core::fmt::Debug;
use std::time::Duration;

use embedded_hal::digital::InputPin;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::accessory::AccessoryLifecycle;
use crate::commands::{CoverEvent, SwitchEvent, TargetPosition};
use crate::error::{Error, Result};
use crate::hal::gpio::ContactSensor;
use crate::motion::BoundaryEdge;
use crate::traits::{Clock, MotionScheduler};

/// A message for the event loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuntimeMessage<E> {
    /// Deliver an event to the accessory.
    Event(E),
    /// Shut the accessory down and stop the loop.
    Shutdown,
}

/// Milliseconds since the runtime was created, from `tokio::time::Instant`.
///
/// Follows tokio's clock, so paused time in tests drives it too.
#[derive(Clone, Copy, Debug)]
pub struct TokioClock {
    origin: Instant,
}

impl TokioClock {
    /// Start a clock at zero.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// [`MotionScheduler`] backed by a spawned tokio sleep.
///
/// When the sleep completes the task sends `make_event(generation)` to the
/// runtime. `cancel` aborts the task; a fire that was already queued is
/// discarded by the accessory's generation check.
pub struct TokioScheduler<E> {
    sender: WeakUnboundedSender<RuntimeMessage<E>>,
    make_event: fn(u64) -> E,
    task: Option<JoinHandle<()>>,
}

impl<E: Send + 'static> MotionScheduler for TokioScheduler<E> {
    fn arm(&mut self, duration_ms: u64, generation: u64) {
        self.cancel();
        let sender = self.sender.clone();
        let make_event = self.make_event;
        self.task = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
            if let Some(sender) = sender.upgrade() {
                let _ = sender.send(RuntimeMessage::Event(make_event(generation)));
            }
        }));
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<E> Drop for TokioScheduler<E> {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// The channel an accessory's runtime will drain.
pub struct RuntimeChannel<E> {
    sender: UnboundedSender<RuntimeMessage<E>>,
    receiver: UnboundedReceiver<RuntimeMessage<E>>,
}

impl<E> RuntimeChannel<E> {
    /// Create an empty channel.
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self { sender, receiver }
    }

    /// A scheduler delivering `make_event(generation)` into this channel.
    pub fn scheduler(&self, make_event: fn(u64) -> E) -> TokioScheduler<E> {
        TokioScheduler {
            sender: self.sender.downgrade(),
            make_event,
            task: None,
        }
    }

    /// A handle for sending into this channel.
    pub fn handle(&self) -> AccessoryHandle<E> {
        AccessoryHandle {
            sender: self.sender.clone(),
        }
    }

    /// Bind the accessory to the channel.
    pub fn into_runtime<L>(self, accessory: L) -> (AccessoryRuntime<L>, AccessoryHandle<E>)
    where
        L: AccessoryLifecycle<Event = E>,
    {
        let handle = AccessoryHandle {
            sender: self.sender,
        };
        let runtime = AccessoryRuntime {
            accessory,
            receiver: self.receiver,
            clock: TokioClock::new(),
        };
        (runtime, handle)
    }
}

impl<E> Default for RuntimeChannel<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns one accessory and processes its messages in arrival order.
pub struct AccessoryRuntime<L: AccessoryLifecycle> {
    accessory: L,
    receiver: UnboundedReceiver<RuntimeMessage<L::Event>>,
    clock: TokioClock,
}

impl<L> AccessoryRuntime<L>
where
    L: AccessoryLifecycle,
    L::Error: Debug,
    L::Event: Debug,
{
    /// Run until [`RuntimeMessage::Shutdown`] arrives or every handle is
    /// dropped, then shut the accessory down and hand it back.
    ///
    /// Hardware errors are logged and the loop keeps going.
    pub async fn run(mut self) -> L {
        let name = self.accessory.information().name.clone();
        if let Err(err) = self.accessory.start(self.clock.now_ms()) {
            error!("{}: start failed: {:?}", name, err);
        }

        while let Some(message) = self.receiver.recv().await {
            match message {
                RuntimeMessage::Event(event) => {
                    debug!("{}: {:?}", name, event);
                    let now_ms = self.clock.now_ms();
                    if let Err(err) = self.accessory.handle(event, now_ms) {
                        error!("{}: hardware error: {:?}", name, err);
                    }
                }
                RuntimeMessage::Shutdown => break,
            }
        }

        info!("{}: shutting down", name);
        if let Err(err) = self.accessory.shutdown(self.clock.now_ms()) {
            error!("{}: shutdown failed: {:?}", name, err);
        }
        self.accessory
    }

    /// The accessory, before the loop starts.
    pub fn accessory(&self) -> &L {
        &self.accessory
    }
}

/// Cloneable sender for an accessory's runtime.
///
/// Sends never block; they fail only with [`Error::RuntimeClosed`].
#[derive(Debug)]
pub struct AccessoryHandle<E> {
    sender: UnboundedSender<RuntimeMessage<E>>,
}

impl<E> Clone for AccessoryHandle<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<E> AccessoryHandle<E> {
    /// Queue an event.
    pub fn send(&self, event: E) -> Result<()> {
        self.sender
            .send(RuntimeMessage::Event(event))
            .map_err(|_| Error::RuntimeClosed)
    }

    /// Ask the runtime to shut the accessory down.
    pub fn shutdown(&self) -> Result<()> {
        self.sender
            .send(RuntimeMessage::Shutdown)
            .map_err(|_| Error::RuntimeClosed)
    }

    /// Whether the runtime has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Handle to a door, window or window covering.
pub type CoverHandle = AccessoryHandle<CoverEvent>;

/// Handle to a switch or push-button.
pub type SwitchHandle = AccessoryHandle<SwitchEvent>;

impl AccessoryHandle<CoverEvent> {
    /// Validate and queue a target position.
    ///
    /// # Errors
    ///
    /// [`Error::PositionOutOfRange`] outside `0..=100`; nothing is queued.
    pub fn set_target_position(&self, position: i64) -> Result<()> {
        let target = TargetPosition::new(position)?;
        self.send(CoverEvent::SetTargetPosition(target))
    }

    /// Queue a hold request.
    pub fn set_hold(&self, hold: bool) -> Result<()> {
        self.send(CoverEvent::SetHold(hold))
    }

    /// Queue a boundary contact edge.
    pub fn boundary_edge(&self, edge: BoundaryEdge) -> Result<()> {
        self.send(CoverEvent::Boundary(edge))
    }
}

impl AccessoryHandle<SwitchEvent> {
    /// Queue an On request.
    pub fn set_on(&self, on: bool) -> Result<()> {
        self.send(SwitchEvent::SetOn(on))
    }
}

/// Sample `sensor` every `interval` and forward each made contact.
///
/// For HALs without edge interrupts. The task ends when the runtime closes.
pub fn spawn_contact_poller<P>(
    mut sensor: ContactSensor<P>,
    handle: CoverHandle,
    interval: Duration,
) -> JoinHandle<()>
where
    P: InputPin + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            match sensor.poll() {
                Ok(Some(edge)) => {
                    if handle.boundary_edge(edge).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    if handle.is_closed() {
                        break;
                    }
                }
                Err(err) => warn!("{:?} contact read failed: {:?}", sensor.edge(), err),
            }
        }
    })
}
