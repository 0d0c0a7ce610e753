#![cfg(test)]
//! Load Testing Suite for the fleet simulation
//!
//! Exercises fleets well beyond the reference size:
//! - Parallel runs over many machines
//! - Long horizons with many maintenance cycles
//!
//! Key Performance Requirements:
//! - 1000 machines × 365 days × 5 cycles completes within a minute in release builds
//! - Parallel and sequential runs agree at scale

use std::time::{Duration, Instant};

use machine_failure_sim::config::SimulationConfig;
use machine_failure_sim::dataset;
use machine_failure_sim::simulation::SimulationDriver;

fn large_fleet(machines: u32, days_per_cycle: u32, cycles: u32) -> SimulationConfig {
    SimulationConfig {
        machines,
        days_per_cycle,
        cycles,
        seed: Some(99),
        parallel: true,
        ..Default::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Ignore by default as this is a slow test
async fn test_large_fleet_throughput() {
    let config = large_fleet(1000, 365, 5);
    let expected = config.total_records();
    let driver = SimulationDriver::new(config).unwrap();

    let start = Instant::now();
    let run = driver.run_parallel().await.unwrap();
    let elapsed = start.elapsed();

    println!(
        "Simulated {} records in {:?} ({:.0} records/s), {} failures",
        run.records.len(),
        elapsed,
        run.records.len() as f64 / elapsed.as_secs_f64(),
        run.failure_count()
    );

    assert_eq!(run.records.len(), expected);
    assert!(run.failure_count() <= 1000 * 5);
    assert!(
        elapsed < Duration::from_secs(60),
        "large fleet took {elapsed:?}"
    );
}

#[tokio::test(flavor = "multi_thread")]
#[ignore] // Ignore by default as this is a slow test
async fn test_parallel_matches_sequential_at_scale() {
    let driver = SimulationDriver::new(large_fleet(200, 180, 10)).unwrap();

    let parallel = driver.run_parallel().await.unwrap();
    let sequential = driver.run();

    let mut parallel_csv = Vec::new();
    let mut sequential_csv = Vec::new();
    dataset::write_csv(&mut parallel_csv, &parallel.records).unwrap();
    dataset::write_csv(&mut sequential_csv, &sequential.records).unwrap();

    assert!(parallel_csv == sequential_csv);
}

#[test]
#[ignore] // Ignore by default as this is a slow test
fn test_long_horizon_keeps_state_bounded() {
    let driver = SimulationDriver::new(SimulationConfig {
        parallel: false,
        ..large_fleet(20, 365, 50)
    })
    .unwrap();

    let run = driver.run();

    assert!(run.machines.iter().all(|m| m.hidden_state_in_bounds()));
    assert!(run.machines.iter().all(|m| m.cycles_since_service == 50));
}
