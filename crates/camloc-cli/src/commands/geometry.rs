//! One-shot `estimate` and `check` commands over a static sensor file.

use camloc_angulation::{EstimateReport, PositionEstimator, validate_setup};
use camloc_types::{CamlocError, SensorId, SensorSnapshot};
use colored::Colorize;
use tracing::info;

use crate::cli::{CheckArgs, EstimateArgs};
use crate::config::Config;
use crate::sensors;

pub fn run_estimate(args: &EstimateArgs, cfg: &Config) -> Result<(), CamlocError> {
    let report = estimate(args, cfg)?;
    match report.position {
        Some(p) => println!("  position  {}", format!("({:.4}, {:.4})", p.x, p.y).bold().green()),
        None => println!("  position  {}", "no estimate".yellow()),
    }
    println!(
        "  pairs     {} considered, {} used, {} near-parallel, {} degenerate",
        report.pairs_considered, report.pairs_used, report.pairs_near_parallel, report.pairs_degenerate
    );
    Ok(())
}

pub fn run_check(args: &CheckArgs) -> Result<(), CamlocError> {
    let snapshot = sensors::load(&args.sensors)?;

    let mut failures = 0usize;
    for (a, b, valid) in check_pairs(&snapshot) {
        if valid {
            println!("  {} {a} ↔ {b}", "✓".green().bold());
        } else {
            failures += 1;
            println!("  {} {a} ↔ {b}", "✗".red().bold());
        }
    }

    if failures > 0 {
        println!("\n  {} pair(s) fail the setup check", failures.to_string().red().bold());
    }
    Ok(())
}

/// `--threshold` wins over the configured gate.
fn estimate(args: &EstimateArgs, cfg: &Config) -> Result<EstimateReport, CamlocError> {
    let snapshot = sensors::load(&args.sensors)?;
    let estimator = match args.threshold {
        Some(threshold) => PositionEstimator::new(threshold)?,
        None => cfg.estimator()?,
    };
    info!(
        sensors = snapshot.len(),
        threshold = estimator.min_angular_difference_deg(),
        "estimating"
    );
    Ok(estimator.report(&snapshot))
}

/// Setup check for every unordered pair, in id order.
fn check_pairs(snapshot: &SensorSnapshot) -> Vec<(SensorId, SensorId, bool)> {
    let sensors: Vec<_> = snapshot.iter().collect();
    let mut results = Vec::new();
    for (i, (id_a, a)) in sensors.iter().enumerate() {
        for (id_b, b) in &sensors[i + 1..] {
            results.push(((*id_a).clone(), (*id_b).clone(), validate_setup(a, b)));
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::{Path, PathBuf};

    fn demo(name: &str) -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos").join(name)
    }

    #[test]
    fn estimates_demo_sensors() {
        let args = EstimateArgs {
            sensors: demo("sensors.toml"),
            threshold: None,
        };
        let report = estimate(&args, &Config::default()).unwrap();

        // cam1 and cam3 both face 0°, so that pair is gated.
        assert_eq!(report.pairs_considered, 3);
        assert_eq!(report.pairs_used, 2);
        assert_eq!(report.pairs_near_parallel, 1);

        // Mean of (3, 3) and cam2 × cam3 at (3, 2.2371).
        let p = report.position.unwrap();
        assert!((p.x - 3.0).abs() < 1e-6, "x={}", p.x);
        assert!((p.y - 2.6185).abs() < 1e-3, "y={}", p.y);
    }

    #[test]
    fn threshold_flag_overrides_config() {
        let args = EstimateArgs {
            sensors: demo("sensors.toml"),
            threshold: Some(0.0),
        };
        assert!(matches!(
            estimate(&args, &Config::default()),
            Err(CamlocError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn checks_every_demo_pair() {
        let snapshot = sensors::load(&demo("sensors.toml")).unwrap();
        let results = check_pairs(&snapshot);
        let id = |s: &str| SensorId::from(s);
        assert_eq!(
            results,
            vec![
                (id("cam1"), id("cam2"), true),
                (id("cam1"), id("cam3"), false),
                (id("cam2"), id("cam3"), false),
            ]
        );
    }

    #[test]
    fn run_check_and_estimate_succeed_on_demo_files() {
        run_check(&CheckArgs {
            sensors: demo("sensors.toml"),
        })
        .unwrap();
        run_estimate(
            &EstimateArgs {
                sensors: demo("sensors.toml"),
                threshold: Some(2.0),
            },
            &Config::default(),
        )
        .unwrap();
    }
}
