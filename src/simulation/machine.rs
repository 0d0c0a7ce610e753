//! # Machine State
//!
//! Per-machine manufacturing characteristics and hidden degradation state. Characteristics
//! are drawn once at creation; degradation fields evolve daily and are partially restored
//! by maintenance.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Hidden state of one simulated machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineState {
    /// Machine identifier (1-based)
    pub machine_id: u32,

    /// Years in service (0.1-8.0)
    pub age_years: f64,
    /// Build quality factor (0.7-1.0)
    pub quality: f64,
    /// Wear resistance factor (0.5-1.5), divides the bearing wear rate
    pub wear_resistance: f64,

    /// Idle baseline temperature in °C
    pub base_temperature: f64,
    /// Idle baseline vibration in g
    pub base_vibration: f64,
    /// Nominal operating speed in rpm
    pub base_rpm: f64,

    /// Bearing degradation (0 = new, 1 = failed)
    pub bearing_wear: f64,
    /// Motor winding/insulation degradation (0-1)
    pub motor_degradation: f64,
    /// Lubricant condition (1 = perfect, floored at 0.1)
    pub lubrication_quality: f64,
    /// Combined mechanical/thermal fatigue accumulator
    pub stress_accumulation: f64,

    /// Cycles started since the machine entered the simulation
    pub cycles_since_service: u32,
    /// Cumulative runtime in hours
    pub total_operating_hours: u64,
    /// Historical failure count
    pub previous_failures: u32,

    /// Per-machine repair skill (0.7-1.0)
    pub maintenance_quality: f64,
    /// Effectiveness of the most recent maintenance (1.0 before the first one)
    pub last_maintenance_effectiveness: f64,

    /// Pre-failure instability mode, cleared by maintenance
    pub intermittent_fault_active: bool,
}

impl MachineState {
    /// Create a new machine with randomly drawn characteristics and pristine hidden state
    pub fn new<R: Rng + ?Sized>(machine_id: u32, rng: &mut R) -> Self {
        let age_years = rng.gen_range(0.1..8.0);
        let quality = rng.gen_range(0.7..1.0);
        let wear_resistance = rng.gen_range(0.5..1.5);

        let base_temperature = rng.gen_range(58.0..68.0);
        let base_vibration = rng.gen_range(0.04..0.12);
        let base_rpm = rng.gen_range(1420.0..1480.0);

        let maintenance_quality = rng.gen_range(0.7..1.0);

        Self {
            machine_id,
            age_years,
            quality,
            wear_resistance,
            base_temperature,
            base_vibration,
            base_rpm,
            bearing_wear: 0.0,
            motor_degradation: 0.0,
            lubrication_quality: 1.0,
            stress_accumulation: 0.0,
            cycles_since_service: 0,
            total_operating_hours: 0,
            previous_failures: 0,
            maintenance_quality,
            last_maintenance_effectiveness: 1.0,
            intermittent_fault_active: false,
        }
    }

    /// Older machines degrade faster, up to twice the nominal rate
    pub fn age_factor(&self) -> f64 {
        (1.0 + self.age_years / 10.0).min(2.0)
    }

    /// Sum of bearing wear, motor degradation and lost lubrication
    pub fn degradation_score(&self) -> f64 {
        self.bearing_wear + self.motor_degradation + (1.0 - self.lubrication_quality)
    }

    /// Whether every hidden degradation variable is inside its physical range
    pub fn hidden_state_in_bounds(&self) -> bool {
        (0.0..=1.0).contains(&self.bearing_wear)
            && (0.0..=1.0).contains(&self.motor_degradation)
            && (0.1..=1.0).contains(&self.lubrication_quality)
            && self.stress_accumulation >= 0.0
    }
}
