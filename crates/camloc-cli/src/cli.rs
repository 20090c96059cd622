//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// camloc – locate a target from the bearings reported by fixed cameras
#[derive(Parser, Debug)]
#[command(name = "camloc", author, version, about = "Camera angulation service")]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log output format
    #[arg(long, value_enum, default_value = "compact", global = true, env = "CAMLOC_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Path to configuration file (defaults to ~/.camloc/config.toml)
    #[arg(short, long, global = true, env = "CAMLOC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to the MQTT broker and locate the target live
    Run(RunArgs),

    /// Send a single command to the sensors through the broker
    Send(SendArgs),

    /// Feed captured wire traffic through the locator service
    Replay(ReplayArgs),

    /// Estimate the target position from a static sensor file
    Estimate(EstimateArgs),

    /// Check the installation geometry of every sensor pair
    Check(CheckArgs),

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Broker connection flags shared by `run` and `send`.
#[derive(Args, Debug, Clone)]
pub struct BrokerArgs {
    /// Broker host name or IP address
    #[arg(long, default_value = "127.0.0.1", env = "CAMLOC_BROKER")]
    pub broker: String,

    /// Broker port
    #[arg(long, default_value_t = 1883, env = "CAMLOC_PORT")]
    pub port: u16,

    /// MQTT client id (letters and digits; also names the last-will topic)
    #[arg(long, default_value = "camlocservice")]
    pub client_id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub broker: BrokerArgs,
}

#[derive(Parser, Debug, Clone)]
pub struct SendArgs {
    #[command(flatten)]
    pub broker: BrokerArgs,

    #[command(subcommand)]
    pub action: SendAction,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum SendAction {
    /// Ask every sensor to report its configuration
    AskConfig,

    /// Ask every sensor to report its on/off state
    AskState,

    /// Flash a sensor's lights
    Flash {
        /// Sensor id
        id: String,
    },

    /// Push a new pose to a sensor
    SetConfig {
        /// Sensor id
        id: String,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
        /// Facing angle in degrees
        #[arg(allow_negative_numbers = true)]
        rotation: f64,
    },

    /// Switch one sensor, or all of them, on or off
    State {
        #[arg(value_enum)]
        switch: Switch,

        /// Sensor id; every sensor when omitted
        id: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

#[derive(Parser, Debug, Clone)]
pub struct ReplayArgs {
    /// JSON-lines capture: one {"at_ms", "topic", "payload" | "floats"} object per line
    pub capture: PathBuf,

    /// Honour the capture's `at_ms` offsets instead of replaying at full speed
    #[arg(long)]
    pub realtime: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct EstimateArgs {
    /// TOML file with one [[sensor]] table per sensor
    pub sensors: PathBuf,

    /// Override the near-parallel threshold (degrees)
    #[arg(long)]
    pub threshold: Option<f64>,
}

#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    /// TOML file with one [[sensor]] table per sensor
    pub sensors: PathBuf,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Compact single-line format
    #[default]
    Compact,
}
