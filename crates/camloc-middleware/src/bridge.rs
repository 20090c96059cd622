//! MQTT broker bridge.
//!
//! [`MqttBridge`] connects the internal [`EventBus`] to the sensors' MQTT
//! broker:
//!
//! * **Inbound** – on every (re)connect it subscribes to the sensor report
//!   topics ([`SUBSCRIPTIONS`]) and asks every sensor for its configuration.
//!   Each received publish is placed on [`Lane::Inbound`] as a
//!   [`WireMessage`].
//! * **Outbound** – every [`WireMessage`] on [`Lane::Outbound`] is published
//!   to the broker unchanged.
//!
//! A last-will on `camloc/<client-id>/dc` tells sensors when the service
//! disappears.  Connection errors are reported on [`Lane::Faults`] and the
//! connection is retried after [`BridgeOptions::reconnect_delay`].

use std::time::Duration;

use camloc_types::{CamlocError, Event, EventPayload, SensorId, WireMessage};
use rumqttc::{AsyncClient, EventLoop, LastWill, MqttOptions, Outgoing, Packet, QoS};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, trace, warn};

use crate::bus::{EventBus, Lane};
use crate::message::Command;
use crate::topics;

const SOURCE: &str = "camloc-middleware::bridge";

/// Topics the bridge subscribes to on every connect.
pub const SUBSCRIPTIONS: [&str; 4] = [
    topics::CONFIG,
    topics::LOCATE,
    topics::DISCONNECT,
    topics::STATE,
];

/// Payload of the bridge's last-will message.
pub const LAST_WILL_PAYLOAD: &[u8] = b"goodbye cruel world";

/// Requests buffered between the client handle and the event loop.
const REQUEST_CAPACITY: usize = 64;

/// Time allowed for a clean DISCONNECT on shutdown.
const DISCONNECT_GRACE: Duration = Duration::from_millis(500);

/// Broker connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeOptions {
    pub host: String,
    pub port: u16,
    /// MQTT client id; also the id segment of the last-will topic.
    pub client_id: String,
    pub keep_alive: Duration,
    pub reconnect_delay: Duration,
}

impl Default for BridgeOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1883,
            client_id: "camlocservice".to_string(),
            keep_alive: Duration::from_secs(5),
            reconnect_delay: Duration::from_secs(1),
        }
    }
}

impl BridgeOptions {
    /// `rumqttc` options with the last-will set.
    pub fn mqtt_options(&self) -> MqttOptions {
        let mut opts = MqttOptions::new(self.client_id.clone(), self.host.clone(), self.port);
        opts.set_keep_alive(self.keep_alive);
        opts.set_last_will(LastWill::new(
            self.last_will_topic(),
            LAST_WILL_PAYLOAD.to_vec(),
            QoS::AtMostOnce,
            false,
        ));
        opts
    }

    pub fn last_will_topic(&self) -> String {
        topics::with_id(topics::DISCONNECT, &SensorId::new(self.client_id.clone()))
    }
}

/// Forwards traffic between the broker and the event bus.
pub struct MqttBridge {
    bus: EventBus,
    options: BridgeOptions,
}

impl MqttBridge {
    pub fn new(bus: EventBus, options: BridgeOptions) -> Self {
        Self { bus, options }
    }

    /// Run until `shutdown` flips to `true` or the outbound lane closes.
    ///
    /// Subscribes to the outbound lane before the first connection attempt,
    /// so commands published while connecting are not lost.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut outbound = self.bus.subscribe_to(Lane::Outbound);
        let (client, mut eventloop) = AsyncClient::new(self.options.mqtt_options(), REQUEST_CAPACITY);
        info!(host = %self.options.host, port = self.options.port, "mqtt bridge started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                polled = eventloop.poll() => match polled {
                    Ok(rumqttc::Event::Incoming(Packet::ConnAck(_))) => self.on_connect(&client),
                    Ok(rumqttc::Event::Incoming(Packet::Publish(publish))) => {
                        self.forward_inbound(WireMessage::new(publish.topic, publish.payload.to_vec()));
                    }
                    Ok(other) => trace!(event = ?other, "mqtt event"),
                    Err(e) => {
                        warn!(error = %e, "mqtt connection error; retrying");
                        self.emit(
                            Lane::Faults,
                            EventPayload::Fault {
                                component: "mqtt".to_string(),
                                message: e.to_string(),
                            },
                        );
                        tokio::time::sleep(self.options.reconnect_delay).await;
                    }
                },
                received = outbound.recv() => match received {
                    Ok(event) => {
                        if let EventPayload::Wire(msg) = event.payload {
                            publish(&client, msg);
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(lagged_by = n, "mqtt bridge lagged behind outbound traffic");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }

        if let Err(e) = client.try_disconnect() {
            debug!(error = %e, "disconnect request not queued");
        }
        drain_disconnect(&mut eventloop).await;
        info!("mqtt bridge stopped");
    }

    fn on_connect(&self, client: &AsyncClient) {
        info!(host = %self.options.host, port = self.options.port, "connected to broker");
        for topic in SUBSCRIPTIONS {
            match client.try_subscribe(topic, QoS::AtMostOnce) {
                Ok(()) => info!(%topic, "subscribed"),
                Err(e) => warn!(%topic, error = %e, "subscribe failed"),
            }
        }
        publish(client, Command::AskForConfig.to_wire());
    }

    fn forward_inbound(&self, msg: WireMessage) {
        debug!(topic = %msg.topic, bytes = msg.payload.len(), "received from broker");
        self.emit(Lane::Inbound, EventPayload::Wire(msg));
    }

    fn emit(&self, lane: Lane, payload: EventPayload) {
        if let Err(e) = self.bus.publish_to(lane, Event::now(SOURCE, payload)) {
            trace!(?lane, error = %e, "event dropped");
        }
    }
}

/// Connect, publish `messages` in order, and disconnect.
///
/// # Errors
///
/// [`CamlocError::Channel`] when the broker cannot be reached or does not
/// accept the messages within `timeout`.
pub async fn send_once(
    options: &BridgeOptions,
    messages: &[WireMessage],
    timeout: Duration,
) -> Result<(), CamlocError> {
    let mut opts = options.mqtt_options();
    opts.set_clean_session(true);
    let (client, mut eventloop) = AsyncClient::new(opts, REQUEST_CAPACITY.max(messages.len() + 1));

    for msg in messages {
        client
            .try_publish(msg.topic.as_str(), QoS::AtMostOnce, false, msg.payload.clone())
            .map_err(|e| CamlocError::Channel(format!("Failed to queue {}: {}", msg.topic, e)))?;
    }
    client
        .try_disconnect()
        .map_err(|e| CamlocError::Channel(format!("Failed to queue disconnect: {}", e)))?;

    let flushed = tokio::time::timeout(timeout, async {
        loop {
            match eventloop.poll().await {
                Ok(rumqttc::Event::Outgoing(Outgoing::Publish(_))) => trace!("published"),
                Ok(rumqttc::Event::Outgoing(Outgoing::Disconnect)) => return Ok(()),
                Ok(_) => {}
                Err(e) => return Err(CamlocError::Channel(format!("MQTT connection failed: {}", e))),
            }
        }
    })
    .await;

    match flushed {
        Ok(result) => result,
        Err(_) => Err(CamlocError::Channel(format!(
            "Timed out talking to broker at {}:{}",
            options.host, options.port
        ))),
    }
}

fn publish(client: &AsyncClient, msg: WireMessage) {
    let topic = msg.topic;
    match client.try_publish(topic.as_str(), QoS::AtMostOnce, false, msg.payload) {
        Ok(()) => debug!(%topic, "published to broker"),
        Err(e) => warn!(%topic, error = %e, "publish dropped"),
    }
}

async fn drain_disconnect(eventloop: &mut EventLoop) {
    let _ = tokio::time::timeout(DISCONNECT_GRACE, async {
        loop {
            match eventloop.poll().await {
                Ok(rumqttc::Event::Outgoing(Outgoing::Disconnect)) | Err(_) => break,
                Ok(_) => {}
            }
        }
    })
    .await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscriptions_cover_every_sensor_report() {
        assert_eq!(
            SUBSCRIPTIONS,
            ["camloc/+/config", "camloc/+/locate", "camloc/+/dc", "camloc/+/state"]
        );
    }

    #[test]
    fn mqtt_options_carry_broker_and_last_will() {
        let options = BridgeOptions {
            host: "10.0.0.7".to_string(),
            port: 1884,
            ..BridgeOptions::default()
        };
        let mqtt = options.mqtt_options();
        assert_eq!(mqtt.broker_address(), ("10.0.0.7".to_string(), 1884));
        assert_eq!(mqtt.client_id(), "camlocservice");

        let will = mqtt.last_will().expect("last will set");
        assert_eq!(will.topic, "camloc/camlocservice/dc");
        assert_eq!(will.message.as_ref(), LAST_WILL_PAYLOAD);
    }

    #[test]
    fn last_will_is_a_disconnect_report() {
        let options = BridgeOptions::default();
        let topic = options.last_will_topic();
        assert_eq!(
            topics::extract_id(topics::DISCONNECT, &topic),
            Some(SensorId::from("camlocservice"))
        );
    }

    /// Nothing listens on port 1, so every connection attempt fails fast.
    fn unreachable() -> BridgeOptions {
        BridgeOptions {
            port: 1,
            reconnect_delay: Duration::from_millis(20),
            ..BridgeOptions::default()
        }
    }

    #[tokio::test]
    async fn unreachable_broker_reports_fault_and_stops_on_shutdown() {
        let bus = EventBus::default();
        let mut faults = bus.subscribe_to(Lane::Faults);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(MqttBridge::new(bus.clone(), unreachable()).run(shutdown_rx));

        let fault = tokio::time::timeout(Duration::from_secs(5), faults.recv())
            .await
            .expect("fault within timeout")
            .expect("fault event");
        assert!(matches!(
            fault.payload,
            EventPayload::Fault { ref component, .. } if component == "mqtt"
        ));

        shutdown_tx.send(true).unwrap();
        let joined = tokio::time::timeout(Duration::from_secs(5), handle).await;
        assert!(matches!(joined, Ok(Ok(()))), "bridge must stop after shutdown");
    }

    #[tokio::test]
    async fn send_once_to_unreachable_broker_is_channel_error() {
        let msgs = [Command::AskForState.to_wire()];
        let err = send_once(&unreachable(), &msgs, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, CamlocError::Channel(_)), "{err:?}");
    }
}
