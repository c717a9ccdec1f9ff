//! Desktop demo: a window covering on mock hardware.
//!
//! Runs the same event loop as the Raspberry Pi daemon, with a mock motor in
//! place of the relays, so the HTTP API and MQTT bridge can be tried on any
//! machine:
//! - `GET http://localhost:8080/api/state`
//! - `POST http://localhost:8080/api/target` with `{"position": 20}`
//! - `POST http://localhost:8080/api/hold` with `{"hold": true}`
//!
//! Without `web` or `mqtt` the demo drives the covering itself and logs each
//! state change.
//!
//! # Usage
//!
//! ```sh
//! cargo run --example desktop_server --features runtime
//! cargo run --example desktop_server --features web
//! cargo run --example desktop_server --features web,mqtt
//! ```
//!
//! Settings come from `gpio-accessory.toml` when present; the travel times
//! default to 10 s each way.

use gpio_accessory::config::{CONFIG_ENV, DEFAULT_CONFIG_PATH};
use gpio_accessory::hal::MockActuator;
use gpio_accessory::services::{RuntimeChannel, WatchPublisher};
use gpio_accessory::{CoverEvent, DaemonConfig, PositionController, TravelProfile};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // No pins are claimed, so the accessory section is not validated
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = DaemonConfig::from_file(&path)?;
    config.accessory.time_open_ms.get_or_insert(10_000);
    config.accessory.time_close_ms.get_or_insert(10_000);

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    let profile: TravelProfile = config.accessory.travel_profile()?;
    let information = config.accessory.information();

    let channel = RuntimeChannel::new();
    let (publisher, mut state) = WatchPublisher::new();
    let cover = PositionController::new(
        MockActuator::new(),
        channel.scheduler(CoverEvent::TimerFired),
        publisher,
        profile,
    )
    .with_information(information.clone());
    let (runtime, handle) = channel.into_runtime(cover);
    let task = tokio::spawn(runtime.run());

    #[cfg(feature = "mqtt")]
    {
        if config.mqtt.enabled {
            let bridge = gpio_accessory::services::CoverBridge::new(handle.clone(), state.clone());
            let mqtt = gpio_accessory::services::MqttRuntimeConfig::from_config(&config.mqtt);
            info!("MQTT commands under {}/", mqtt.topic_prefix);
            tokio::spawn(gpio_accessory::services::run_mqtt(bridge, mqtt));
        }
    }

    #[cfg(feature = "web")]
    {
        let app = gpio_accessory::services::CoverApp {
            handle: handle.clone(),
            state: state.clone(),
            information,
        };
        let router = gpio_accessory::services::cover_router(app, &config.web);
        let web = config.web.clone();
        tokio::spawn(async move { gpio_accessory::services::serve(router, &web).await });
    }

    #[cfg(not(feature = "web"))]
    {
        let _ = information;
        let script = handle.clone();
        tokio::spawn(async move {
            for (position, pause) in [(100, 4), (20, 12), (60, 3)] {
                info!("requesting {}", position);
                if script.set_target_position(position).is_err() {
                    return;
                }
                tokio::time::sleep(std::time::Duration::from_secs(pause)).await;
            }
            let _ = script.set_hold(true);
        });
    }

    info!("Press Ctrl+C to stop.");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = *state.borrow_and_update();
                info!(
                    "position {:.1} -> {:.1}, {:?}{}",
                    snapshot.current_position,
                    snapshot.target_position,
                    snapshot.motion_state,
                    if snapshot.hold { " (held)" } else { "" }
                );
            }
        }
    }

    handle.shutdown()?;
    let cover = task.await?;
    info!("stopped at {:.1}", cover.current_position());
    Ok(())
}
