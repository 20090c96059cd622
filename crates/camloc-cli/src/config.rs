//! Configuration – reads/writes `~/.camloc/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use camloc_angulation::{DEFAULT_MIN_ANGULAR_DIFFERENCE_DEG, PositionEstimator};
use camloc_middleware::ServiceOptions;
use camloc_middleware::bus::DEFAULT_CAPACITY;
use camloc_types::CamlocError;
use serde::{Deserialize, Serialize};

/// Persisted service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Sensor pairs whose rotations (mod 180°) differ by less than this many
    /// degrees are skipped as near-parallel.
    #[serde(default = "default_min_angular_difference")]
    pub min_angular_difference_deg: f64,

    /// Capacity of every event-bus lane.
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,

    /// Period of extrapolated position updates in milliseconds; 0 disables.
    #[serde(default = "default_predict_interval_ms")]
    pub predict_interval_ms: u64,

    /// Stop extrapolating once the latest fix is this many milliseconds old;
    /// 0 removes the limit.
    #[serde(default = "default_predict_max_age_ms")]
    pub predict_max_age_ms: u64,

    /// Check installation geometry whenever a sensor reports a new config.
    #[serde(default = "default_validate_setup")]
    pub validate_setup: bool,
}

fn default_min_angular_difference() -> f64 {
    DEFAULT_MIN_ANGULAR_DIFFERENCE_DEG
}
fn default_bus_capacity() -> usize {
    DEFAULT_CAPACITY
}
fn default_predict_interval_ms() -> u64 {
    100
}
fn default_predict_max_age_ms() -> u64 {
    1000
}
fn default_validate_setup() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_angular_difference_deg: default_min_angular_difference(),
            bus_capacity: default_bus_capacity(),
            predict_interval_ms: default_predict_interval_ms(),
            predict_max_age_ms: default_predict_max_age_ms(),
            validate_setup: default_validate_setup(),
        }
    }
}

impl Config {
    /// Build the estimator, rejecting a non-positive threshold.
    pub fn estimator(&self) -> Result<PositionEstimator, CamlocError> {
        PositionEstimator::new(self.min_angular_difference_deg)
    }

    pub fn service_options(&self) -> Result<ServiceOptions, CamlocError> {
        Ok(ServiceOptions {
            estimator: self.estimator()?,
            predict_interval: (self.predict_interval_ms > 0)
                .then(|| Duration::from_millis(self.predict_interval_ms)),
            max_prediction_age: (self.predict_max_age_ms > 0)
                .then(|| Duration::from_millis(self.predict_max_age_ms)),
            validate_setup: self.validate_setup,
        })
    }
}

/// Return the path to `~/.camloc/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".camloc").join("config.toml")
}

/// Load the config from `path`, or from the default location when `None`.
///
/// A missing file yields the defaults.  Environment overrides are applied
/// in both cases.
pub fn load(path: Option<&Path>) -> Result<Config, CamlocError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);
    let mut cfg = load_from(&path)?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Load the config from a specific path.  Returns `None` if the file does
/// not exist.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, CamlocError> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| CamlocError::Config(format!("Failed to read config at {}: {}", path.display(), e)))?;
    let cfg: Config = toml::from_str(&raw)
        .map_err(|e| CamlocError::Config(format!("Failed to parse config: {}", e)))?;
    Ok(Some(cfg))
}

/// Apply `CAMLOC_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `CAMLOC_MIN_ANGULAR_DIFFERENCE` | `min_angular_difference_deg` |
/// | `CAMLOC_BUS_CAPACITY` | `bus_capacity` |
///
/// Values that do not parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("CAMLOC_MIN_ANGULAR_DIFFERENCE")
        && let Ok(deg) = v.parse::<f64>()
    {
        cfg.min_angular_difference_deg = deg;
    }
    if let Ok(v) = std::env::var("CAMLOC_BUS_CAPACITY")
        && let Ok(capacity) = v.parse::<usize>()
        && capacity > 0
    {
        cfg.bus_capacity = capacity;
    }
}

/// Save the config to a specific path, creating parent directories.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), CamlocError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| CamlocError::Config(format!("Failed to create config directory: {}", e)))?;
    }
    let raw = toml::to_string_pretty(cfg)
        .map_err(|e| CamlocError::Config(format!("Failed to serialize config: {}", e)))?;
    fs::write(path, raw)
        .map_err(|e| CamlocError::Config(format!("Failed to write config at {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded, Config::default());
        assert_eq!(loaded.bus_capacity, 256);
        assert_eq!(loaded.predict_interval_ms, 100);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "min_angular_difference_deg = 2.5\n").unwrap();

        let loaded = load_from(&path).unwrap().unwrap();
        assert_eq!(loaded.min_angular_difference_deg, 2.5);
        assert!(loaded.validate_setup);
        assert_eq!(loaded.bus_capacity, DEFAULT_CAPACITY);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "bus_capacity = \"lots\"\n").unwrap();
        assert!(matches!(load_from(&path), Err(CamlocError::Config(_))));
    }

    #[test]
    fn config_path_points_to_camloc_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".camloc"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn zero_threshold_is_rejected_when_building_service() {
        let cfg = Config {
            min_angular_difference_deg: 0.0,
            ..Config::default()
        };
        assert!(cfg.service_options().is_err());
    }

    #[test]
    fn zero_interval_disables_prediction() {
        let cfg = Config {
            predict_interval_ms: 0,
            ..Config::default()
        };
        assert!(cfg.service_options().unwrap().predict_interval.is_none());
        assert_eq!(
            Config::default().service_options().unwrap().predict_interval,
            Some(Duration::from_millis(100))
        );
    }

    #[test]
    fn zero_max_age_removes_prediction_limit() {
        let cfg = Config {
            predict_max_age_ms: 0,
            ..Config::default()
        };
        assert!(cfg.service_options().unwrap().max_prediction_age.is_none());
        assert_eq!(
            Config::default().service_options().unwrap().max_prediction_age,
            Some(Duration::from_secs(1))
        );
    }

    #[test]
    fn apply_env_overrides_changes_threshold() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("CAMLOC_MIN_ANGULAR_DIFFERENCE", "3.5") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.min_angular_difference_deg, 3.5);
        unsafe { std::env::remove_var("CAMLOC_MIN_ANGULAR_DIFFERENCE") };
    }

    #[test]
    fn apply_env_overrides_ignores_invalid_capacity() {
        // SAFETY: single-threaded test; no data races on env vars.
        unsafe { std::env::set_var("CAMLOC_BUS_CAPACITY", "not-a-number") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.bus_capacity, DEFAULT_CAPACITY);
        unsafe { std::env::remove_var("CAMLOC_BUS_CAPACITY") };
    }
}
