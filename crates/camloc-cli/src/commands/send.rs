//! `camloc send`: publish one command to the sensors and exit.

use std::time::Duration;

use camloc_middleware::Command;
use camloc_middleware::bridge::send_once;
use camloc_types::{CamlocError, Pose, SensorId};
use colored::Colorize;
use tracing::info;

use super::bridge_options;
use crate::cli::{SendAction, SendArgs, Switch};

const SEND_TIMEOUT: Duration = Duration::from_secs(5);

pub async fn run_send(args: &SendArgs) -> Result<(), CamlocError> {
    let msg = command_for(&args.action).to_wire();
    info!(topic = %msg.topic, broker = %args.broker.broker, port = args.broker.port, "sending");

    send_once(&bridge_options(&args.broker), std::slice::from_ref(&msg), SEND_TIMEOUT).await?;
    println!("  {} sent {}", "✓".green().bold(), msg.topic.bold());
    Ok(())
}

fn command_for(action: &SendAction) -> Command {
    match action {
        SendAction::AskConfig => Command::AskForConfig,
        SendAction::AskState => Command::AskForState,
        SendAction::Flash { id } => Command::Flash {
            id: SensorId::new(id.clone()),
        },
        SendAction::SetConfig { id, x, y, rotation } => Command::SetConfig {
            id: SensorId::new(id.clone()),
            pose: Pose::new(*x, *y, *rotation),
        },
        SendAction::State { switch, id } => {
            let on = *switch == Switch::On;
            match id {
                Some(id) => Command::SetState {
                    id: SensorId::new(id.clone()),
                    on,
                },
                None => Command::SetAllState { on },
            }
        }
    }
}
