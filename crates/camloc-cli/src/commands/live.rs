//! `camloc run`: the live service against an MQTT broker.

use camloc_middleware::{EventBus, Lane, LocatorService, MqttBridge};
use camloc_types::{CamlocError, EventPayload};
use colored::Colorize;
use tokio::sync::broadcast;
use tracing::{info, warn};

use super::{bridge_options, print_outbound, shutdown_on_ctrlc};
use crate::cli::RunArgs;
use crate::config::Config;

pub async fn run_live(args: &RunArgs, cfg: &Config) -> Result<(), CamlocError> {
    let options = cfg.service_options()?;
    let bridge_opts = bridge_options(&args.broker);
    println!(
        "  Connecting to {} (Ctrl-C to stop)",
        format!("{}:{}", bridge_opts.host, bridge_opts.port).bold()
    );

    let bus = EventBus::new(cfg.bus_capacity);
    let mut outbound = bus.subscribe_to(Lane::Outbound);
    let (shutdown_tx, mut shutdown_rx) = shutdown_on_ctrlc("shutting down");

    let bridge = tokio::spawn(MqttBridge::new(bus.clone(), bridge_opts).run(shutdown_tx.subscribe()));
    let service = tokio::spawn(LocatorService::new(bus.clone(), options).run(shutdown_tx.subscribe()));

    let printer = tokio::spawn(async move {
        loop {
            match outbound.recv().await {
                Ok(event) => {
                    if let EventPayload::Wire(msg) = event.payload {
                        print_outbound(&msg);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(lagged_by = n, "outbound printer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    while !*shutdown_rx.borrow_and_update() {
        if shutdown_rx.changed().await.is_err() {
            break;
        }
    }

    bridge
        .await
        .map_err(|e| CamlocError::Channel(format!("mqtt bridge task failed: {e}")))?;
    let service = service
        .await
        .map_err(|e| CamlocError::Channel(format!("locator service task failed: {e}")))?;
    info!(sensors = service.registry().len(), "live session ended");
    drop(service);
    drop(bus);
    printer
        .await
        .map_err(|e| CamlocError::Channel(format!("outbound printer task failed: {e}")))?;

    println!("  {} Disconnected.", "✓".green());
    Ok(())
}
