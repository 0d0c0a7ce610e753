//! # Machine Degradation Simulation Module
//!
//! Simulates a fleet of industrial machines whose hidden wear state drives both the
//! sensor readings they report and their daily probability of catastrophic failure.
//!
//! ## Components
//!
//! - **Load**: Daily production load from weekly, monthly and seasonal patterns plus
//!   random surges/dips
//! - **Sensors**: Maps hidden state + load to temperature, vibration, rpm with noise,
//!   fault bursts and glitches
//! - **Degradation**: Advances bearing wear, motor decay, lubrication breakdown and
//!   fatigue for one day
//! - **Risk**: Five failure modes plus age risk, combined by probabilistic OR, with
//!   hard-failure overrides
//! - **Maintenance**: Imperfect repair applied at every cycle boundary after the first
//! - **Driver**: Iterates cycles, machines and days and emits one labeled record per machine-day
//!
//! ## Usage
//!
//! ```rust
//! use machine_failure_sim::config::SimulationConfig;
//! use machine_failure_sim::simulation::SimulationDriver;
//!
//! let config = SimulationConfig {
//!     machines: 3,
//!     days_per_cycle: 30,
//!     cycles: 2,
//!     seed: Some(42),
//!     ..Default::default()
//! };
//!
//! let driver = SimulationDriver::new(config).expect("valid config");
//! let run = driver.run();
//!
//! assert_eq!(run.records.len(), 3 * 30 * 2);
//! ```

pub mod degradation;
pub mod driver;
pub mod load;
pub mod machine;
pub mod maintenance;
pub mod risk;
pub mod sensors;

pub use degradation::DegradationModel;
pub use driver::{
    CycleTracker, MachineSimulation, SimulationDriver, SimulationRecord, SimulationRun,
};
pub use load::{LoadPatternConfig, LoadPatternModel};
pub use machine::MachineState;
pub use maintenance::MaintenanceModel;
pub use risk::{
    FailureMode, FailureRiskConfig, FailureRiskModel, HardFailureCause, RiskAssessment,
    RiskBreakdown,
};
pub use sensors::{SensorNoiseConfig, SensorReading, SensorSynthesizer};

use rand::Rng;
use rand_distr::StandardNormal;
use std::borrow::Cow;
use std::f64::consts::PI;
use validator::ValidationError;

/// Draw from Normal(mean, std_dev). A zero `std_dev` returns `mean` exactly.
pub(crate) fn normal<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    let z: f64 = rng.sample(StandardNormal);
    mean + z * std_dev
}

/// Annual sine wave in [-1, 1] indexed by day of year.
pub(crate) fn annual_wave(day: u32) -> f64 {
    let day_of_year = (day % 365) as f64;
    (2.0 * PI * day_of_year / 365.0).sin()
}

/// Round half away from zero to `decimals` places.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// Reject NaN and infinite model parameters, which `range` checks let through
pub(crate) fn require_finite(fields: &[(&'static str, f64)]) -> Result<(), ValidationError> {
    match fields.iter().find(|(_, value)| !value.is_finite()) {
        Some((name, value)) => {
            let mut error = ValidationError::new("non_finite");
            error.message = Some(Cow::Owned(format!("{name} must be finite, got {value}")));
            error.add_param(Cow::Borrowed("field"), name);
            Err(error)
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_annual_wave_quarters() {
        assert_relative_eq!(annual_wave(0), 0.0, epsilon = 1e-12);
        assert!(annual_wave(91) > 0.99);
        assert!(annual_wave(274) < -0.99);
        assert_relative_eq!(annual_wave(365), annual_wave(0), epsilon = 1e-12);
    }

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(63.456, 2), 63.46);
        assert_eq!(round_to(0.081_249, 4), 0.0812);
        assert_eq!(round_to(1452.25, 1), 1452.3);
    }

    #[test]
    fn test_require_finite() {
        assert!(require_finite(&[("a", 0.5), ("b", 0.0)]).is_ok());

        let error = require_finite(&[("a", 0.5), ("b", f64::NAN)]).unwrap_err();
        assert_eq!(error.code, "non_finite");
        assert!(error.message.unwrap().contains('b'));

        assert!(require_finite(&[("c", f64::INFINITY)]).is_err());
    }

    #[test]
    fn test_normal_with_zero_spread_is_mean() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(normal(&mut rng, 68.0, 0.0), 68.0);
    }
}
