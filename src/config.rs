use crate::simulation::{FailureRiskConfig, LoadPatternConfig, SensorNoiseConfig};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::borrow::Cow;
use strum::{Display, EnumString};
use thiserror::Error;
use validator::{Validate, ValidationError};

pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
pub const ENV_PREFIX: &str = "MFS__";
/// Largest dataset a single run may produce (machines × cycles × days_per_cycle)
pub const MAX_TOTAL_RECORDS: usize = 20_000_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub simulation: SimulationConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "bounded_run_size"))]
pub struct SimulationConfig {
    #[validate(range(min = 1, max = 100_000))]
    pub machines: u32,
    #[validate(range(min = 1, max = 100_000))]
    pub days_per_cycle: u32,
    #[validate(range(min = 1, max = 10_000))]
    pub cycles: u32,
    /// Base RNG seed; drawn from OS entropy when absent
    pub seed: Option<u64>,
    /// Simulate machines on worker threads
    pub parallel: bool,
    #[serde(default)]
    #[validate(nested)]
    pub models: ModelConfig,
}

/// Tuning for the stochastic terms of the daily models
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ModelConfig {
    #[serde(default)]
    #[validate(nested)]
    pub load: LoadPatternConfig,
    #[serde(default)]
    #[validate(nested)]
    pub sensors: SensorNoiseConfig,
    #[serde(default)]
    #[validate(nested)]
    pub risk: FailureRiskConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            machines: 10,
            days_per_cycle: 180,
            cycles: 10,
            seed: None,
            parallel: true,
            models: ModelConfig::default(),
        }
    }
}

impl SimulationConfig {
    /// Rows the run will emit: one per machine-day
    pub fn total_records(&self) -> usize {
        self.machines as usize * self.cycles as usize * self.days_per_cycle as usize
    }
}

fn bounded_run_size(config: &SimulationConfig) -> Result<(), ValidationError> {
    let total = config.total_records();
    if total > MAX_TOTAL_RECORDS {
        let mut error = ValidationError::new("too_many_records");
        error.message = Some(Cow::Owned(format!(
            "run would produce {total} records, limit is {MAX_TOTAL_RECORDS}"
        )));
        return Err(error);
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Csv,
    Jsonl,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: PathBuf,
    pub format: OutputFormat,
    /// Print the failure report to stdout after generation
    pub print_failures: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("machine_sensor_data.csv"),
            format: OutputFormat::Csv,
            print_failures: true,
        }
    }
}

impl Config {
    /// Defaults, then `config/default.toml`, then `MFS__`-prefixed environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(DEFAULT_CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Config = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::SimulationDriver;
    use rstest::rstest;

    fn figment_with(toml: &str) -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Toml::string(toml))
    }

    #[test]
    fn test_defaults_match_reference_fleet() {
        let config = Config::from_figment(figment_with("")).unwrap();

        assert_eq!(config.simulation.machines, 10);
        assert_eq!(config.simulation.days_per_cycle, 180);
        assert_eq!(config.simulation.cycles, 10);
        assert_eq!(config.simulation.total_records(), 18_000);
        assert_eq!(config.output.format, OutputFormat::Csv);
    }

    #[test]
    fn test_toml_overrides() {
        let config = Config::from_figment(figment_with(
            r#"
            [simulation]
            machines = 4
            seed = 7
            parallel = false

            [output]
            path = "out.jsonl"
            format = "jsonl"
            "#,
        ))
        .unwrap();

        assert_eq!(config.simulation.machines, 4);
        assert_eq!(config.simulation.seed, Some(7));
        assert!(!config.simulation.parallel);
        assert_eq!(config.simulation.cycles, 10);
        assert_eq!(config.output.format, OutputFormat::Jsonl);
        assert_eq!(config.output.path, PathBuf::from("out.jsonl"));
    }

    #[test]
    fn test_zero_machines_rejected() {
        let err = Config::from_figment(figment_with("[simulation]\nmachines = 0")).unwrap_err();
        match err {
            ConfigError::Invalid(errors) => assert!(errors.errors().contains_key("simulation")),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_zero_days_and_cycles_rejected() {
        let config = SimulationConfig {
            days_per_cycle: 0,
            cycles: 0,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("days_per_cycle"));
        assert!(fields.contains_key("cycles"));
    }

    #[test]
    fn test_model_probabilities_validated() {
        let err = Config::from_figment(figment_with(
            "[simulation.models.risk]\nrandom_failure_probability = 1.5",
        ))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let config = Config::from_figment(figment_with(
            "[simulation.models.load]\nenable_anomalies = false",
        ))
        .unwrap();
        assert!(!config.simulation.models.load.enable_anomalies);
        assert_eq!(config.simulation.models.load.surge_probability, 0.10);
    }

    #[rstest]
    #[case("sensors", "temperature_std_dev = nan")]
    #[case("sensors", "rpm_std_dev = inf")]
    #[case("sensors", "vibration_glitch_probability = nan")]
    #[case("load", "surge_probability = nan")]
    #[case("load", "dip_probability = nan")]
    #[case("risk", "random_failure_probability = nan")]
    #[case("risk", "fault_activation_probability = nan")]
    fn test_non_finite_model_parameters_rejected(#[case] model: &str, #[case] line: &str) {
        let toml = format!("[simulation.models.{model}]\n{line}");
        let err = Config::from_figment(figment_with(&toml)).unwrap_err();

        match err {
            ConfigError::Invalid(errors) => assert!(errors.errors().contains_key("simulation")),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_driver_rejects_non_finite_parameters() {
        let mut config = SimulationConfig {
            seed: Some(1),
            ..Default::default()
        };
        config.models.sensors.temperature_std_dev = f64::NAN;
        assert!(SimulationDriver::new(config).is_err());
    }

    #[test]
    fn test_oversized_run_rejected() {
        let config = SimulationConfig {
            machines: 100_000,
            days_per_cycle: 100_000,
            cycles: 10_000,
            ..Default::default()
        };
        let errors = config.validate().unwrap_err();
        assert!(errors.errors().contains_key("__all__"));

        let at_limit = SimulationConfig {
            machines: 1_000,
            days_per_cycle: 2_000,
            cycles: 10,
            ..Default::default()
        };
        assert_eq!(at_limit.total_records(), MAX_TOTAL_RECORDS);
        assert!(at_limit.validate().is_ok());
    }

    #[test]
    fn test_negative_value_is_a_load_error() {
        let err = Config::from_figment(figment_with("[simulation]\ncycles = -3")).unwrap_err();
        assert!(matches!(err, ConfigError::Load(_)));
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert_eq!("jsonl".parse::<OutputFormat>().unwrap(), OutputFormat::Jsonl);
        assert_eq!(OutputFormat::Jsonl.to_string(), "jsonl");
        assert!("xml".parse::<OutputFormat>().is_err());
    }
}
