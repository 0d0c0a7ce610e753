//! # Degradation Model
//!
//! Advances the hidden wear state by one simulated day of continuous operation,
//! driven by that day's sensor readings.

use super::machine::MachineState;
use super::sensors::SensorReading;

/// Hours of operation represented by one simulated day
pub const HOURS_PER_DAY: u64 = 24;

/// Lower bound for lubricant condition
pub const LUBRICATION_FLOOR: f64 = 0.1;

#[derive(Debug, Clone, Copy, Default)]
pub struct DegradationModel;

impl DegradationModel {
    pub fn new() -> Self {
        Self
    }

    /// Apply one day of wear. `_day_in_cycle` does not influence the rates.
    pub fn apply(&self, state: &mut MachineState, reading: &SensorReading, _day_in_cycle: u32) {
        let age_factor = state.age_factor();
        let load_factor = reading.load / 100.0;

        // Bearing wear: vibration and load driven
        let bearing_rate = (reading.vibration * 0.5 + load_factor * 0.1) / state.wear_resistance;
        state.bearing_wear = (state.bearing_wear + bearing_rate * 0.001 * age_factor).min(1.0);

        // Motor: speed instability and thermal cycling
        let rpm_variation = (reading.rpm - state.base_rpm).abs() / state.base_rpm;
        let thermal_cycles = ((reading.temperature - 65.0) / 20.0).max(0.0);
        state.motor_degradation =
            (state.motor_degradation + (rpm_variation + thermal_cycles) * 0.0005).min(1.0);

        // Lubricant breaks down faster when hot
        let retention = if reading.temperature > 75.0 { 0.998 } else { 0.9995 };
        state.lubrication_quality = (state.lubrication_quality * retention).max(LUBRICATION_FLOOR);

        state.stress_accumulation += load_factor * 0.1
            + reading.vibration * 0.5
            + (reading.temperature - 65.0).max(0.0) / 50.0;

        state.total_operating_hours += HOURS_PER_DAY;
    }
}
