//! Subcommand implementations.

mod geometry;
mod live;
mod replay;
mod send;

pub use geometry::{run_check, run_estimate};
pub use live::run_live;
pub use replay::run_replay;
pub use send::run_send;

use std::path::Path;
use std::sync::Arc;

use camloc_middleware::BridgeOptions;
use camloc_middleware::topics;
use camloc_middleware::wire::read_f32s;
use camloc_types::{CamlocError, WireMessage};
use colored::Colorize;
use tokio::sync::watch;
use tracing::warn;

use crate::cli::BrokerArgs;
use crate::config::{self, Config};

/// `camloc init`: write the default configuration.
pub fn run_init(path: Option<&Path>, force: bool) -> Result<(), CamlocError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config::config_path);
    if path.exists() && !force {
        println!(
            "  Config already exists at {} (use {} to overwrite)",
            path.display().to_string().bold(),
            "--force".bold()
        );
        return Ok(());
    }
    config::save_to(&Config::default(), &path)?;
    println!(
        "  {} Config saved to {}",
        "✓".green().bold(),
        path.display().to_string().bold()
    );
    Ok(())
}

/// Shutdown channel whose sender flips to `true` on Ctrl-C.
fn shutdown_on_ctrlc(action: &'static str) -> (Arc<watch::Sender<bool>>, watch::Receiver<bool>) {
    let (tx, rx) = watch::channel(false);
    let tx = Arc::new(tx);
    let ctrlc_tx = tx.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", format!("⚠  Ctrl-C received – {action} …").yellow().bold());
        ctrlc_tx.send_replace(true);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; graceful shutdown on Ctrl-C will not be available");
    }
    (tx, rx)
}

fn bridge_options(args: &BrokerArgs) -> BridgeOptions {
    BridgeOptions {
        host: args.broker.clone(),
        port: args.port,
        client_id: args.client_id.clone(),
        ..BridgeOptions::default()
    }
}

/// One line per outbound message; positions are decoded.
fn print_outbound(msg: &WireMessage) {
    let topic = msg.topic.as_str();
    if topic == topics::POSITION || topic == topics::PREDICTED_POSITION {
        match read_f32s::<2>(topic, &msg.payload) {
            Ok([x, y]) => println!("  {} {:>10.4} {:>10.4}", topic.cyan(), x, y),
            Err(e) => warn!(error = %e, "undecodable position"),
        }
    } else {
        println!("  {} {:?}", topic.dimmed(), msg.payload);
    }
}
