//! Raspberry Pi daemon driving one GPIO accessory.
//!
//! Reads `gpio-accessory.toml` (or the file named by
//! `GPIO_ACCESSORY_CONFIG`), claims the configured pins and runs the
//! accessory's event loop. The HTTP API and the MQTT bridge are started when
//! their features are compiled in and enabled in the config.
//!
//! # Build
//!
//! ```bash
//! cargo build --release --bin gpio-accessoryd --features rpi,web,mqtt
//! ```
//!
//! # Example config
//!
//! ```toml
//! [accessory]
//! name = "Garage Door"
//! kind = "door"
//! pin = 5
//! pin_close = 6
//! invert_high_low = true
//! invert_high_low_close = true
//! pin_contact_open = 20
//! pin_contact_close = 21
//! time_open_ms = 18000
//! time_close_ms = 16000
//!
//! [web]
//! port = 8080
//!
//! [mqtt]
//! enabled = true
//! host = "192.168.1.10"
//! topic_prefix = "garage"
//! ```

use core::fmt::Debug;

use anyhow::{Context, Result};
use rppal::gpio::Gpio;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use gpio_accessory::hal::rpi;
use gpio_accessory::services::{
    AccessoryHandle, CoverSnapshot, RuntimeChannel, SwitchSnapshot, WatchPublisher,
    WatchSwitchPublisher,
};
use gpio_accessory::{
    AccessoryInformation, AccessoryLifecycle, BoundaryEdge, CoverEvent, DaemonConfig, GpioSwitch,
    PositionController, PushButton, ServiceKind, SwitchEvent,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config = DaemonConfig::load().context("failed to load configuration")?;

    let filter = EnvFilter::try_new(&config.logging.filter)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        "gpio-accessoryd {} starting `{}` ({})",
        env!("CARGO_PKG_VERSION"),
        config.accessory.name,
        config.accessory.kind.identifier()
    );

    let gpio = Gpio::new().context("failed to open GPIO")?;

    match config.accessory.kind {
        ServiceKind::Switch | ServiceKind::PushButton => run_switch(&config, &gpio).await,
        ServiceKind::Door | ServiceKind::Window | ServiceKind::WindowCovering => {
            run_cover(&config, &gpio).await
        }
    }
}

async fn run_cover(config: &DaemonConfig, gpio: &Gpio) -> Result<()> {
    let accessory = &config.accessory;
    let pin = accessory.pin.context("`pin` is not configured")?;
    let pin_close = accessory.pin_close.context("`pin_close` is not configured")?;

    let actuator = rpi::open_actuator(
        gpio,
        (pin, accessory.polarity()),
        (pin_close, accessory.polarity_close()),
    )?;
    info!("adding motor on GPIO{} (open) and GPIO{} (close)", pin, pin_close);

    let channel = RuntimeChannel::new();
    let (publisher, state) = WatchPublisher::new();
    let information = accessory.information();
    let cover = PositionController::new(
        actuator,
        channel.scheduler(CoverEvent::TimerFired),
        publisher,
        accessory.travel_profile()?,
    )
    .with_information(information.clone());
    let (runtime, handle) = channel.into_runtime(cover);

    // Interrupt registrations live as long as these pins
    let mut contacts = Vec::new();
    let sensors = [
        (
            accessory.pin_contact_open,
            accessory.polarity_contact_open(),
            BoundaryEdge::Open,
        ),
        (
            accessory.pin_contact_close,
            accessory.polarity_contact_close(),
            BoundaryEdge::Close,
        ),
    ];
    for (pin, polarity, edge) in sensors {
        if let Some(pin) = pin {
            contacts.push(rpi::watch_contact(gpio, pin, polarity, edge, handle.clone())?);
        }
    }

    start_cover_bridges(config, &handle, state, information);
    let task = tokio::spawn(runtime.run());

    wait_for_signal().await;
    handle.shutdown()?;
    let cover = task.await.context("accessory runtime panicked")?;
    drop(contacts);

    info!("stopped at position {}", cover.current_position());
    Ok(())
}

async fn run_switch(config: &DaemonConfig, gpio: &Gpio) -> Result<()> {
    let accessory = &config.accessory;
    let pin = accessory.pin.context("`pin` is not configured")?;
    let output = rpi::open_output(gpio, pin, accessory.polarity())?;
    info!("adding {} on GPIO{}", accessory.kind.as_str(), pin);

    let channel = RuntimeChannel::new();
    let (publisher, state) = WatchSwitchPublisher::new();
    let information = accessory.information();

    if accessory.kind == ServiceKind::PushButton {
        let button = PushButton::new(
            output,
            channel.scheduler(SwitchEvent::TimerFired),
            publisher,
            accessory.invoke_timeout_ms,
        )
        .with_information(information.clone());
        drive_switch(config, channel, button, state, information).await
    } else {
        let switch = GpioSwitch::new(output, publisher).with_information(information.clone());
        drive_switch(config, channel, switch, state, information).await
    }
}

async fn drive_switch<L>(
    config: &DaemonConfig,
    channel: RuntimeChannel<SwitchEvent>,
    accessory: L,
    state: watch::Receiver<SwitchSnapshot>,
    information: AccessoryInformation,
) -> Result<()>
where
    L: AccessoryLifecycle<Event = SwitchEvent> + Send + 'static,
    L::Error: Debug + Send,
{
    let (runtime, handle) = channel.into_runtime(accessory);

    start_switch_bridges(config, &handle, state, information);
    let task = tokio::spawn(runtime.run());

    wait_for_signal().await;
    handle.shutdown()?;
    task.await.context("accessory runtime panicked")?;
    Ok(())
}

#[allow(unused_variables)]
fn start_cover_bridges(
    config: &DaemonConfig,
    handle: &AccessoryHandle<CoverEvent>,
    state: watch::Receiver<CoverSnapshot>,
    information: AccessoryInformation,
) {
    #[cfg(feature = "mqtt")]
    {
        if config.mqtt.enabled {
            let bridge = gpio_accessory::services::CoverBridge::new(handle.clone(), state.clone());
            start_mqtt(bridge, config);
        }
    }

    #[cfg(feature = "web")]
    {
        if config.web.enabled {
            let app = gpio_accessory::services::CoverApp {
                handle: handle.clone(),
                state,
                information,
            };
            let router = gpio_accessory::services::cover_router(app, &config.web);
            start_web(router, config);
        }
    }
}

#[allow(unused_variables)]
fn start_switch_bridges(
    config: &DaemonConfig,
    handle: &AccessoryHandle<SwitchEvent>,
    state: watch::Receiver<SwitchSnapshot>,
    information: AccessoryInformation,
) {
    #[cfg(feature = "mqtt")]
    {
        if config.mqtt.enabled {
            let bridge = gpio_accessory::services::SwitchBridge::new(handle.clone(), state.clone());
            start_mqtt(bridge, config);
        }
    }

    #[cfg(feature = "web")]
    {
        if config.web.enabled {
            let app = gpio_accessory::services::SwitchApp {
                handle: handle.clone(),
                state,
                information,
            };
            let router = gpio_accessory::services::switch_router(app, &config.web);
            start_web(router, config);
        }
    }
}

#[cfg(feature = "web")]
fn start_web(router: axum::Router, config: &DaemonConfig) {
    let web = config.web.clone();
    tokio::spawn(async move {
        if let Err(err) = gpio_accessory::services::serve(router, &web).await {
            error!("HTTP API stopped: {}", err);
        }
    });
}

#[cfg(feature = "mqtt")]
fn start_mqtt<B: gpio_accessory::services::MqttBridge>(bridge: B, config: &DaemonConfig) {
    let mqtt = gpio_accessory::services::MqttRuntimeConfig::from_config(&config.mqtt);
    tokio::spawn(async move {
        if let Err(err) = gpio_accessory::services::run_mqtt(bridge, mqtt).await {
            error!("MQTT bridge stopped: {}", err);
        }
    });
}

async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(terminate) => terminate,
        Err(err) => {
            warn!("cannot listen for SIGTERM: {}", err);
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("cannot listen for Ctrl+C: {}", err);
            }
            return;
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(err) = result {
                error!("cannot listen for Ctrl+C: {}", err);
            }
        }
        _ = terminate.recv() => {}
    }
    info!("shutdown requested");
}
