use anyhow::{Context, Result};
use machine_failure_sim::{config, dataset, simulation, telemetry};
use config::Config;
use dataset::FailureReport;
use simulation::SimulationDriver;
use telemetry::init_tracing;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cfg = Config::load()?;
    let driver = SimulationDriver::new(cfg.simulation.clone())?;

    let run = if driver.config().parallel {
        driver.run_parallel().await?
    } else {
        driver.run()
    };

    dataset::write(&cfg.output.path, cfg.output.format, &run.records)
        .with_context(|| format!("writing dataset to {}", cfg.output.path.display()))?;

    let report = FailureReport::from_records(&run.records);
    info!(
        path = %cfg.output.path.display(),
        format = %cfg.output.format,
        seed = run.seed,
        records = report.total_records,
        failures = report.total_failures(),
        failure_rate = report.failure_rate(),
        "dataset written"
    );

    if cfg.output.print_failures {
        print!("{report}");
    }

    Ok(())
}
