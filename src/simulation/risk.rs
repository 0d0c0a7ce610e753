//! # Failure Risk Model
//!
//! Computes the instantaneous daily failure probability from hidden state and today's
//! readings. Five failure modes and an age term are evaluated independently, combined by
//! probabilistic union, scaled by age, and finally overridden to certainty by hard-failure
//! conditions or an unmodeled random failure.
//!
//! Each mode is an ordered ladder: the first matching branch wins, even if a later branch
//! would yield a higher risk.

use super::machine::MachineState;
use super::require_finite;
use super::sensors::SensorReading;
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};
use tracing::trace;
use validator::{Validate, ValidationError};

/// Risk above which an intermittent fault may start
pub const FAULT_ACTIVATION_RISK: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Vibration-driven bearing failure
    Bearing,
    /// Motor overheating / overspeed
    Motor,
    /// Lubricant breakdown
    Lubrication,
    /// Cumulative fatigue late in a cycle
    Stress,
    /// Several moderate issues under high load
    Combined,
    /// General wear-out of old machines
    Age,
}

/// Condition that forces today's risk to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum HardFailureCause {
    /// Temperature above 85 °C
    Overheat,
    /// Vibration above 0.35 g
    Vibration,
    /// Bearing wear above 0.95
    BearingSeizure,
    /// Lubricant condition below 0.05
    LubricationLoss,
    /// Unmodeled random component failure
    Random,
}

/// Per-mode risks before combination
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub bearing: f64,
    pub motor: f64,
    pub lubrication: f64,
    pub stress: f64,
    pub combined: f64,
    pub age: f64,
}

impl RiskBreakdown {
    pub fn get(&self, mode: FailureMode) -> f64 {
        match mode {
            FailureMode::Bearing => self.bearing,
            FailureMode::Motor => self.motor,
            FailureMode::Lubrication => self.lubrication,
            FailureMode::Stress => self.stress,
            FailureMode::Combined => self.combined,
            FailureMode::Age => self.age,
        }
    }

    /// Probabilistic OR: 1 - Π(1 - rᵢ)
    pub fn union(&self) -> f64 {
        1.0 - FailureMode::iter().map(|mode| 1.0 - self.get(mode)).product::<f64>()
    }

    /// Mode with the highest individual risk, if any is non-zero
    pub fn dominant_mode(&self) -> Option<FailureMode> {
        FailureMode::iter()
            .filter(|mode| self.get(*mode) > 0.0)
            .max_by(|a, b| self.get(*a).total_cmp(&self.get(*b)))
    }
}

/// Result of one day's risk assessment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub breakdown: RiskBreakdown,
    /// Union of mode risks scaled by the age risk factor, before overrides
    pub modeled_risk: f64,
    /// Set when a hard-failure condition forced certainty
    pub override_cause: Option<HardFailureCause>,
    /// Final daily risk in [0, 1]
    pub risk: f64,
}

/// Risk model configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "finite_risk_config"))]
pub struct FailureRiskConfig {
    /// Daily probability of an unmodeled random failure
    #[validate(range(min = 0.0, max = 1.0))]
    pub random_failure_probability: f64,
    /// Probability of entering the intermittent fault mode once risk exceeds 0.4
    #[validate(range(min = 0.0, max = 1.0))]
    pub fault_activation_probability: f64,
}

impl Default for FailureRiskConfig {
    fn default() -> Self {
        Self {
            random_failure_probability: 0.0002,
            fault_activation_probability: 0.3,
        }
    }
}

fn finite_risk_config(config: &FailureRiskConfig) -> Result<(), ValidationError> {
    require_finite(&[
        ("random_failure_probability", config.random_failure_probability),
        ("fault_activation_probability", config.fault_activation_probability),
    ])
}

#[derive(Debug, Clone, Default)]
pub struct FailureRiskModel {
    config: FailureRiskConfig,
}

impl FailureRiskModel {
    pub fn new(config: FailureRiskConfig) -> Self {
        Self { config }
    }

    pub fn bearing_risk(state: &MachineState, reading: &SensorReading) -> f64 {
        if reading.vibration > 0.18 && state.bearing_wear > 0.5 {
            0.6
        } else if reading.vibration > 0.25 {
            0.8
        } else if state.bearing_wear > 0.8 {
            0.7
        } else {
            0.0
        }
    }

    pub fn motor_risk(state: &MachineState, reading: &SensorReading) -> f64 {
        if reading.temperature > 78.0 && reading.rpm > state.base_rpm + 20.0 {
            0.5
        } else if reading.temperature > 82.0 {
            0.7
        } else if state.motor_degradation > 0.6 && reading.temperature > 70.0 {
            0.4
        } else {
            0.0
        }
    }

    pub fn lubrication_risk(state: &MachineState, reading: &SensorReading) -> f64 {
        if state.lubrication_quality < 0.3 && reading.temperature > 70.0 {
            0.5
        } else if state.lubrication_quality < 0.1 {
            0.8
        } else {
            0.0
        }
    }

    pub fn stress_risk(state: &MachineState, day_in_cycle: u32) -> f64 {
        if state.stress_accumulation > 30.0 && day_in_cycle > 100 {
            (state.stress_accumulation / 60.0).min(0.6)
        } else {
            0.0
        }
    }

    pub fn combined_risk(state: &MachineState, reading: &SensorReading) -> f64 {
        let score = state.degradation_score();
        if score > 1.2 && reading.load > 70.0 {
            (score / 2.0).min(0.9)
        } else {
            0.0
        }
    }

    pub fn age_risk(state: &MachineState) -> f64 {
        if state.age_years > 5.0 {
            ((state.age_years - 5.0) * 0.06).min(0.3)
        } else {
            0.0
        }
    }

    /// Older machines carry up to twice the modeled risk
    pub fn age_risk_factor(state: &MachineState) -> f64 {
        (1.0 + state.age_years / 15.0).min(2.0)
    }

    pub fn breakdown(
        state: &MachineState,
        reading: &SensorReading,
        day_in_cycle: u32,
    ) -> RiskBreakdown {
        RiskBreakdown {
            bearing: Self::bearing_risk(state, reading),
            motor: Self::motor_risk(state, reading),
            lubrication: Self::lubrication_risk(state, reading),
            stress: Self::stress_risk(state, day_in_cycle),
            combined: Self::combined_risk(state, reading),
            age: Self::age_risk(state),
        }
    }

    /// Deterministic hard-failure check, in priority order
    pub fn hard_failure(state: &MachineState, reading: &SensorReading) -> Option<HardFailureCause> {
        if reading.temperature > 85.0 {
            Some(HardFailureCause::Overheat)
        } else if reading.vibration > 0.35 {
            Some(HardFailureCause::Vibration)
        } else if state.bearing_wear > 0.95 {
            Some(HardFailureCause::BearingSeizure)
        } else if state.lubrication_quality < 0.05 {
            Some(HardFailureCause::LubricationLoss)
        } else {
            None
        }
    }

    /// Assess today's risk. May switch the machine into intermittent-fault mode.
    pub fn assess<R: Rng + ?Sized>(
        &self,
        state: &mut MachineState,
        reading: &SensorReading,
        day_in_cycle: u32,
        rng: &mut R,
    ) -> RiskAssessment {
        let breakdown = Self::breakdown(state, reading, day_in_cycle);
        let modeled_risk = breakdown.union() * Self::age_risk_factor(state);

        if modeled_risk > FAULT_ACTIVATION_RISK
            && !state.intermittent_fault_active
            && rng.gen_bool(self.config.fault_activation_probability)
        {
            state.intermittent_fault_active = true;
            trace!(
                machine_id = state.machine_id,
                risk = modeled_risk,
                "intermittent fault activated"
            );
        }

        let mut override_cause = Self::hard_failure(state, reading);
        if rng.gen_bool(self.config.random_failure_probability) && override_cause.is_none() {
            override_cause = Some(HardFailureCause::Random);
        }

        let risk = match override_cause {
            Some(_) => 1.0,
            None => modeled_risk.min(1.0),
        };

        RiskAssessment {
            breakdown,
            modeled_risk,
            override_cause,
            risk,
        }
    }
}
