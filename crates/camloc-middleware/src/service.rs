//! Locator service.
//!
//! Glues the transport boundary to the engine.  The service owns the
//! [`SensorRegistry`] and serialises every mutation of it; the engine only
//! ever sees immutable snapshots.
//!
//! For each inbound wire message:
//!
//! - **config** → create/update the sensor, then (optionally) run the setup
//!   check against every other registered sensor;
//! - **detection** → record `last_x`, estimate from a fresh snapshot, publish
//!   the fused position;
//! - **disconnect** → drop the sensor;
//! - **state** → logged only.
//!
//! While [`LocatorService::run`] is active a ticker additionally publishes a
//! position extrapolated from the last two fused samples.

use std::time::Duration;

use camloc_angulation::{PositionEstimator, extrapolate, validate_setup};
use camloc_registry::{ConfigOutcome, SensorRegistry};
use camloc_types::{
    CamlocError, Coordinates, Event, EventPayload, SensorId, TimedSample, WireMessage,
};
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, trace, warn};

use crate::bus::{EventBus, Lane, LaneReceiver};
use crate::message::{Command, Inbound};

const SOURCE: &str = "camloc-middleware::service";

/// Tunables for [`LocatorService`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ServiceOptions {
    pub estimator: PositionEstimator,
    /// Period of the extrapolated-position ticker; `None` or zero disables
    /// it.
    pub predict_interval: Option<Duration>,
    /// No prediction is made once the latest fix is older than this.
    /// `None` extrapolates without limit.
    pub max_prediction_age: Option<Duration>,
    /// Check each reconfigured sensor against all others.
    pub validate_setup: bool,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            estimator: PositionEstimator::default(),
            predict_interval: Some(Duration::from_millis(100)),
            max_prediction_age: Some(Duration::from_secs(1)),
            validate_setup: true,
        }
    }
}

/// The two most recent fused samples.
#[derive(Debug, Clone, Copy, Default)]
struct Track {
    previous: Option<TimedSample>,
    latest: Option<TimedSample>,
}

impl Track {
    fn push(&mut self, sample: TimedSample) {
        self.previous = self.latest.replace(sample);
    }
}

/// Applies inbound traffic to the registry and publishes positions.
pub struct LocatorService {
    bus: EventBus,
    registry: SensorRegistry,
    options: ServiceOptions,
    track: Track,
}

impl LocatorService {
    pub fn new(bus: EventBus, options: ServiceOptions) -> Self {
        Self {
            bus,
            registry: SensorRegistry::new(),
            options,
            track: Track::default(),
        }
    }

    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    /// Most recent fused sample, if any.
    pub fn latest(&self) -> Option<TimedSample> {
        self.track.latest
    }

    /// Apply one inbound wire message received at `received_at`.
    ///
    /// Returns the new fused sample when the message was a detection that
    /// produced an estimate.
    ///
    /// # Errors
    ///
    /// Propagates parse and registry errors; the registry is unchanged when
    /// an error is returned.
    pub fn handle(
        &mut self,
        msg: &WireMessage,
        received_at: DateTime<Utc>,
    ) -> Result<Option<TimedSample>, CamlocError> {
        match Inbound::parse(msg)? {
            Inbound::Config { id, pose, fov_deg } => {
                let outcome = self.registry.apply_config(id.clone(), pose, fov_deg)?;
                if outcome == ConfigOutcome::Created {
                    info!(sensor = %id, total = self.registry.len(), "new sensor online");
                }
                if self.options.validate_setup {
                    self.check_setup(&id);
                }
                Ok(None)
            }
            Inbound::Detection { id, last_x } => {
                self.registry.update_detection(&id, last_x)?;
                Ok(self.estimate(received_at))
            }
            Inbound::Disconnect { id } => {
                if self.registry.remove(&id).is_none() {
                    debug!(sensor = %id, "disconnect for unregistered sensor");
                }
                Ok(None)
            }
            Inbound::State { id, on } => {
                debug!(sensor = %id, on, "state report");
                Ok(None)
            }
        }
    }

    /// Run the setup check between `id` and every other registered sensor,
    /// in id order.
    pub fn check_setup(&self, id: &SensorId) -> Vec<(SensorId, bool)> {
        let snapshot = self.registry.snapshot();
        let Some(sensor) = snapshot.get(id) else {
            return Vec::new();
        };

        snapshot
            .iter()
            .filter(|(other_id, _)| *other_id != id)
            .map(|(other_id, other)| {
                let valid = validate_setup(sensor, other);
                if !valid {
                    warn!(a = %id, b = %other_id, "sensor pair fails setup check");
                }
                (other_id.clone(), valid)
            })
            .collect()
    }

    /// Position extrapolated to `now` from the last two fused samples.
    ///
    /// `None` with fewer than two samples, equal sample timestamps, or a
    /// latest fix older than [`ServiceOptions::max_prediction_age`].
    pub fn predict(&self, now: DateTime<Utc>) -> Option<Coordinates> {
        let (previous, latest) = (self.track.previous?, self.track.latest?);
        if let Some(limit) = self.options.max_prediction_age
            && let Ok(limit) = TimeDelta::from_std(limit)
            && now - latest.timestamp > limit
        {
            trace!(age_ms = (now - latest.timestamp).num_milliseconds(), "latest fix too old to extrapolate");
            return None;
        }
        match extrapolate(&previous, &latest, now) {
            Ok(position) => Some(position),
            Err(e) => {
                trace!(error = %e, "no prediction");
                None
            }
        }
    }

    /// Consume the inbound lane until the bus closes or `shutdown` flips to
    /// `true`.  Events already buffered when shutdown is requested are still
    /// applied.  Returns the service so callers can inspect its final state.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Self {
        let mut inbound = self.bus.subscribe_to(Lane::Inbound);
        let interval = self.options.predict_interval.filter(|d| !d.is_zero());
        let predicting = interval.is_some();
        let mut ticker = tokio::time::interval(interval.unwrap_or(Duration::from_secs(3600)));

        self.send(Command::AskForConfig);
        info!("locator service started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        self.drain(&mut inbound);
                        break;
                    }
                }
                received = inbound.recv() => match received {
                    Ok(event) => self.apply_event(event),
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(lagged_by = n, "locator service lagged behind inbound traffic");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = ticker.tick(), if predicting => {
                    if let Some(position) = self.predict(Utc::now()) {
                        self.send(Command::PredictedPosition(position));
                    }
                }
            }
        }

        info!(sensors = self.registry.len(), "locator service stopped");
        self
    }

    fn drain(&mut self, inbound: &mut LaneReceiver) {
        loop {
            match inbound.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    warn!(lagged_by = n, "locator service lagged behind inbound traffic");
                }
                Err(_) => break,
            }
        }
    }

    fn apply_event(&mut self, event: Event) {
        let EventPayload::Wire(msg) = event.payload else {
            return;
        };
        match self.handle(&msg, event.timestamp) {
            Ok(_) => {}
            Err(CamlocError::UnroutableTopic(topic)) => {
                trace!(%topic, "ignoring unroutable topic");
            }
            Err(e) => {
                warn!(topic = %msg.topic, error = %e, "inbound message rejected");
                self.emit(
                    Lane::Faults,
                    EventPayload::Fault {
                        component: msg.topic.clone(),
                        message: e.to_string(),
                    },
                );
            }
        }
    }

    fn estimate(&mut self, at: DateTime<Utc>) -> Option<TimedSample> {
        let snapshot = self.registry.snapshot();
        let position = self.options.estimator.estimate(&snapshot)?;
        let sample = TimedSample::new(position, at);
        debug!(x = position.x, y = position.y, "fused position");

        self.track.push(sample);
        self.send(Command::Position(position));
        self.emit(Lane::Positions, EventPayload::Position(sample));
        Some(sample)
    }

    fn send(&self, command: Command) {
        self.emit(Lane::Outbound, EventPayload::Wire(command.to_wire()));
    }

    fn emit(&self, lane: Lane, payload: EventPayload) {
        if let Err(e) = self.bus.publish_to(lane, Event::now(SOURCE, payload)) {
            trace!(?lane, error = %e, "event dropped");
        }
    }
}
