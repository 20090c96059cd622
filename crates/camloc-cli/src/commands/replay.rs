//! `camloc replay`: run the locator service over a captured message stream.

use std::sync::Arc;
use std::time::Duration;

use camloc_middleware::{EventBus, Lane, LocatorService};
use camloc_types::{CamlocError, Event, EventPayload, TimedSample};
use colored::Colorize;
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tracing::{info, warn};

use super::{print_outbound, shutdown_on_ctrlc};
use crate::capture::{self, CaptureRecord};
use crate::cli::ReplayArgs;
use crate::config::Config;

const SOURCE: &str = "camloc-cli::replay";

/// What a replay left behind.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ReplaySummary {
    /// Capture messages fed to the service.
    pub fed: usize,
    /// Messages the service sent out.
    pub sent: usize,
    /// Sensors still registered at the end.
    pub sensors: usize,
    pub latest: Option<TimedSample>,
}

pub async fn run_replay(args: &ReplayArgs, cfg: &Config) -> Result<(), CamlocError> {
    let records = capture::load(&args.capture)?;
    info!(messages = records.len(), realtime = args.realtime, "replaying capture");

    let (shutdown_tx, _) = shutdown_on_ctrlc("stopping replay");
    let summary = replay(records, cfg, args.realtime, shutdown_tx).await?;

    println!();
    println!(
        "  {} messages replayed, {} sent, {} sensor(s) registered",
        summary.fed, summary.sent, summary.sensors
    );
    match summary.latest {
        Some(sample) => println!(
            "  last fix  {}",
            format!("({:.4}, {:.4})", sample.position.x, sample.position.y)
                .bold()
                .green()
        ),
        None => println!("  last fix  {}", "none".yellow()),
    }
    Ok(())
}

/// Feed `records` through a fresh [`LocatorService`], printing every
/// outbound message.  Stops early once `shutdown` is set; sets it itself at
/// the end of the capture.
pub(crate) async fn replay(
    records: Vec<CaptureRecord>,
    cfg: &Config,
    realtime: bool,
    shutdown: Arc<watch::Sender<bool>>,
) -> Result<ReplaySummary, CamlocError> {
    let options = cfg.service_options()?;

    // Large enough that a full-speed replay never laps the service.
    let bus = EventBus::new(cfg.bus_capacity.max(records.len() + 16));
    let mut outbound = bus.subscribe_to(Lane::Outbound);

    let service = tokio::spawn(LocatorService::new(bus.clone(), options).run(shutdown.subscribe()));

    let printer = tokio::spawn(async move {
        let mut printed = 0usize;
        loop {
            match outbound.recv().await {
                Ok(event) => {
                    if let EventPayload::Wire(msg) = event.payload {
                        print_outbound(&msg);
                        printed += 1;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(lagged_by = n, "outbound printer lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        printed
    });

    // The service subscribes to the inbound lane once its task starts.
    while bus.subscriber_count(Lane::Inbound) == 0 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let started = Instant::now();
    let mut fed = 0usize;
    for record in records {
        if *shutdown.borrow() {
            break;
        }
        if realtime {
            tokio::time::sleep_until(started + record.offset).await;
        }
        let event = Event::now(SOURCE, EventPayload::Wire(record.message));
        bus.publish_to(Lane::Inbound, event)?;
        fed += 1;
    }

    shutdown.send_replace(true);
    let service = service
        .await
        .map_err(|e| CamlocError::Channel(format!("locator service task failed: {e}")))?;
    let latest = service.latest();
    let sensors = service.registry().len();
    drop(service);
    drop(bus);

    let sent = printer
        .await
        .map_err(|e| CamlocError::Channel(format!("outbound printer task failed: {e}")))?;

    Ok(ReplaySummary {
        fed,
        sent,
        sensors,
        latest,
    })
}
