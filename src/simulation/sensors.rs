//! # Sensor Synthesis
//!
//! Maps a machine's hidden degradation state and the day's load onto observable readings.
//!
//! Sensor ranges (supervisor guidance):
//!
//! | Sensor      | Normal        | Warning          | Critical          |
//! |-------------|---------------|------------------|-------------------|
//! | Temperature | 60-75 °C      | 75-82 °C         | > 82 °C           |
//! | Vibration   | 0.04-0.18 g   | 0.18-0.25 g      | > 0.25 g          |
//! | RPM         | 1420-1480     | ±20 from base    | > 1500 or < 1380  |
//! | Load        | 35-85 %       | 85-95 %          | > 95 %            |
//!
//! Effects are applied in a fixed order: deterministic base terms, intermittent-fault
//! bursts, measurement noise, transient glitches, then clamping and rounding.

use super::machine::MachineState;
use super::{annual_wave, normal, require_finite, round_to};
use rand::Rng;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub const MIN_TEMPERATURE_C: f64 = 40.0;
pub const MAX_TEMPERATURE_C: f64 = 95.0;
pub const MIN_VIBRATION_G: f64 = 0.02;
pub const MAX_VIBRATION_G: f64 = 0.5;
pub const MIN_RPM: f64 = 1380.0;

/// One day's observable measurements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Temperature in °C (40-95, 2 decimals)
    pub temperature: f64,
    /// Vibration in g (0.02-0.5, 4 decimals)
    pub vibration: f64,
    /// Shaft speed in rpm (>= 1380, 1 decimal)
    pub rpm: f64,
    /// Load in % of full capacity (1 decimal)
    pub load: f64,
}

/// Noise and glitch configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "finite_noise_config"))]
pub struct SensorNoiseConfig {
    /// Temperature measurement noise standard deviation (°C)
    #[validate(range(min = 0.0))]
    pub temperature_std_dev: f64,
    /// Vibration measurement noise standard deviation (g)
    #[validate(range(min = 0.0))]
    pub vibration_std_dev: f64,
    /// RPM measurement noise standard deviation
    #[validate(range(min = 0.0))]
    pub rpm_std_dev: f64,
    /// Enable transient sensor glitches
    pub enable_glitches: bool,
    /// Daily probability of a temperature sensor glitch
    #[validate(range(min = 0.0, max = 1.0))]
    pub temperature_glitch_probability: f64,
    /// Daily probability of a vibration sensor glitch
    #[validate(range(min = 0.0, max = 1.0))]
    pub vibration_glitch_probability: f64,
}

impl Default for SensorNoiseConfig {
    fn default() -> Self {
        Self {
            temperature_std_dev: 0.7,
            vibration_std_dev: 0.012,
            rpm_std_dev: 1.5,
            enable_glitches: true,
            temperature_glitch_probability: 0.008,
            vibration_glitch_probability: 0.006,
        }
    }
}

impl SensorNoiseConfig {
    /// No measurement noise and no glitches. Base RPM jitter still applies.
    pub fn noiseless() -> Self {
        Self {
            temperature_std_dev: 0.0,
            vibration_std_dev: 0.0,
            rpm_std_dev: 0.0,
            enable_glitches: false,
            ..Default::default()
        }
    }
}

fn finite_noise_config(config: &SensorNoiseConfig) -> Result<(), ValidationError> {
    require_finite(&[
        ("temperature_std_dev", config.temperature_std_dev),
        ("vibration_std_dev", config.vibration_std_dev),
        ("rpm_std_dev", config.rpm_std_dev),
        ("temperature_glitch_probability", config.temperature_glitch_probability),
        ("vibration_glitch_probability", config.vibration_glitch_probability),
    ])
}

#[derive(Debug, Clone, Default)]
pub struct SensorSynthesizer {
    config: SensorNoiseConfig,
}

impl SensorSynthesizer {
    pub fn new(config: SensorNoiseConfig) -> Self {
        Self { config }
    }

    /// Temperature rise from load, with a steeper ramp above 75% load
    pub fn load_heating(load: f64) -> f64 {
        let load_factor = load / 100.0;
        let mut heating = load_factor * 8.0;
        if load_factor > 0.75 {
            heating += (load_factor - 0.75) * 15.0;
        }
        heating
    }

    /// RPM jitter spread, widening as the motor and bearings degrade
    pub fn rpm_spread(state: &MachineState) -> f64 {
        2.0 + state.motor_degradation * 5.0 + state.bearing_wear * 4.0
    }

    /// Synthesize the day's readings. Seasonal ambient variation is indexed by `day_in_cycle`.
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        state: &MachineState,
        day_in_cycle: u32,
        load: f64,
        rng: &mut R,
    ) -> SensorReading {
        let load_factor = load / 100.0;

        let mut temperature = state.base_temperature
            + Self::load_heating(load)
            + state.bearing_wear * 3.0
            + (1.0 - state.lubrication_quality) * 8.0
            + 3.0 * annual_wave(day_in_cycle);

        let mut vibration = state.base_vibration
            + load_factor * 0.05
            + state.bearing_wear * 0.15
            + state.motor_degradation * 0.1;

        let mut rpm = normal(rng, state.base_rpm, Self::rpm_spread(state));
        if load > 80.0 && (state.motor_degradation > 0.3 || state.bearing_wear > 0.4) {
            rpm -= (load - 80.0) * 0.4;
        }

        if state.intermittent_fault_active {
            if rng.gen_bool(0.6) {
                vibration *= rng.gen_range(1.1..1.8);
            }
            if rng.gen_bool(0.4) {
                temperature += rng.gen_range(1.0..6.0);
            }
            if rng.gen_bool(0.3) {
                rpm += rng.gen_range(-10.0..10.0);
            }
        }

        temperature += normal(rng, 0.0, self.config.temperature_std_dev);
        vibration += normal(rng, 0.0, self.config.vibration_std_dev);
        rpm += normal(rng, 0.0, self.config.rpm_std_dev);

        if self.config.enable_glitches {
            if rng.gen_bool(self.config.temperature_glitch_probability) {
                temperature += rng.gen_range(3.0..10.0);
            }
            if rng.gen_bool(self.config.vibration_glitch_probability) {
                vibration += rng.gen_range(0.05..0.15);
            }
        }

        SensorReading {
            temperature: round_to(temperature, 2).clamp(MIN_TEMPERATURE_C, MAX_TEMPERATURE_C),
            vibration: round_to(vibration, 4).clamp(MIN_VIBRATION_G, MAX_VIBRATION_G),
            rpm: round_to(rpm, 1).max(MIN_RPM),
            load: round_to(load, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn machine(rng: &mut StdRng) -> MachineState {
        let mut state = MachineState::new(1, rng);
        state.base_temperature = 62.0;
        state.base_vibration = 0.08;
        state.base_rpm = 1450.0;
        state
    }

    #[test]
    fn test_load_heating_knee() {
        assert_relative_eq!(SensorSynthesizer::load_heating(50.0), 4.0);
        assert_relative_eq!(SensorSynthesizer::load_heating(75.0), 6.0);
        // 0.9 * 8 + 0.15 * 15
        assert_relative_eq!(SensorSynthesizer::load_heating(90.0), 9.45, epsilon = 1e-9);
    }

    #[test]
    fn test_noiseless_pristine_machine_reading() {
        let mut rng = StdRng::seed_from_u64(3);
        let state = machine(&mut rng);
        let synth = SensorSynthesizer::new(SensorNoiseConfig::noiseless());

        // day_in_cycle 0 puts the seasonal term at zero
        let reading = synth.synthesize(&state, 0, 60.0, &mut rng);

        assert_relative_eq!(reading.temperature, 62.0 + 4.8, epsilon = 1e-9);
        assert_relative_eq!(reading.vibration, 0.08 + 0.03, epsilon = 1e-9);
        assert_eq!(reading.load, 60.0);
        // Base jitter only: 2 rpm spread
        assert!((reading.rpm - 1450.0).abs() < 12.0);
    }

    #[test]
    fn test_wear_raises_temperature_and_vibration() {
        let mut rng = StdRng::seed_from_u64(5);
        let pristine = machine(&mut rng);
        let mut worn = pristine.clone();
        worn.bearing_wear = 0.6;
        worn.motor_degradation = 0.4;
        worn.lubrication_quality = 0.5;

        let synth = SensorSynthesizer::new(SensorNoiseConfig::noiseless());
        let fresh = synth.synthesize(&pristine, 0, 60.0, &mut rng);
        let degraded = synth.synthesize(&worn, 0, 60.0, &mut rng);

        // 0.6 * 3 + 0.5 * 8
        assert_relative_eq!(degraded.temperature - fresh.temperature, 5.8, epsilon = 1e-6);
        // 0.6 * 0.15 + 0.4 * 0.1
        assert_relative_eq!(degraded.vibration - fresh.vibration, 0.13, epsilon = 1e-6);
    }

    #[test]
    fn test_rpm_sags_under_high_load_when_degraded() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut state = machine(&mut rng);
        state.motor_degradation = 0.5;

        let synth = SensorSynthesizer::new(SensorNoiseConfig::noiseless());
        let samples = 2000;
        let mean_rpm = (0..samples)
            .map(|_| synth.synthesize(&state, 0, 95.0, &mut rng).rpm)
            .sum::<f64>()
            / samples as f64;

        // Expected sag (95 - 80) * 0.4 = 6 rpm
        assert!((mean_rpm - 1444.0).abs() < 1.0, "mean rpm {mean_rpm}");
    }

    #[test]
    fn test_intermittent_fault_inflates_vibration() {
        let mut rng = StdRng::seed_from_u64(13);
        let healthy = machine(&mut rng);
        let mut faulty = healthy.clone();
        faulty.intermittent_fault_active = true;

        let synth = SensorSynthesizer::new(SensorNoiseConfig::noiseless());
        let samples = 2000;
        let mean_vibration = |state: &MachineState, rng: &mut StdRng| {
            (0..samples)
                .map(|_| synth.synthesize(state, 0, 60.0, rng).vibration)
                .sum::<f64>()
                / samples as f64
        };

        let healthy_mean = mean_vibration(&healthy, &mut rng);
        let faulty_mean = mean_vibration(&faulty, &mut rng);

        // 60% of days scale by ~1.45 on average
        assert!(faulty_mean > healthy_mean * 1.15);
    }

    #[test]
    fn test_glitches_offset_temperature_and_vibration() {
        let mut rng = StdRng::seed_from_u64(19);
        let state = machine(&mut rng);

        let clean = SensorSynthesizer::new(SensorNoiseConfig::noiseless());
        let glitchy = SensorSynthesizer::new(SensorNoiseConfig {
            enable_glitches: true,
            temperature_glitch_probability: 1.0,
            vibration_glitch_probability: 1.0,
            ..SensorNoiseConfig::noiseless()
        });

        for seed in 0..50 {
            let mut clean_rng = StdRng::seed_from_u64(seed);
            let mut glitchy_rng = clean_rng.clone();

            let base = clean.synthesize(&state, 0, 60.0, &mut clean_rng);
            let reading = glitchy.synthesize(&state, 0, 60.0, &mut glitchy_rng);

            // Certain glitches consume no draw, so the next two draws are the glitch sizes
            let temperature_glitch = clean_rng.gen_range(3.0..10.0);
            let vibration_glitch = clean_rng.gen_range(0.05..0.15);

            // Each reading is rounded independently
            assert_relative_eq!(
                reading.temperature,
                base.temperature + temperature_glitch,
                epsilon = 0.011
            );
            assert_relative_eq!(
                reading.vibration,
                base.vibration + vibration_glitch,
                epsilon = 0.000_11
            );
            assert_eq!(reading.rpm, base.rpm);
            assert_eq!(reading.load, base.load);
        }
    }

    #[test]
    fn test_readings_clamped_for_extreme_state() {
        let mut rng = StdRng::seed_from_u64(17);
        let mut state = machine(&mut rng);
        state.base_temperature = 68.0;
        state.bearing_wear = 1.0;
        state.motor_degradation = 1.0;
        state.lubrication_quality = 0.1;
        state.intermittent_fault_active = true;

        let synth = SensorSynthesizer::default();
        for day in 1..=365 {
            let reading = synth.synthesize(&state, day, 98.0, &mut rng);
            assert!(reading.temperature <= MAX_TEMPERATURE_C);
            assert!(reading.vibration <= MAX_VIBRATION_G);
            assert!(reading.rpm >= MIN_RPM);
        }
    }

    proptest! {
        #[test]
        fn prop_readings_within_physical_limits(
            seed in any::<u64>(),
            bearing in 0.0f64..=1.0,
            motor in 0.0f64..=1.0,
            lubrication in 0.1f64..=1.0,
            load in 35.0f64..=98.0,
            day in 0u32..2000,
            fault in any::<bool>(),
        ) {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut state = MachineState::new(1, &mut rng);
            state.bearing_wear = bearing;
            state.motor_degradation = motor;
            state.lubrication_quality = lubrication;
            state.intermittent_fault_active = fault;

            let reading = SensorSynthesizer::default().synthesize(&state, day, load, &mut rng);

            prop_assert!((MIN_TEMPERATURE_C..=MAX_TEMPERATURE_C).contains(&reading.temperature));
            prop_assert!((MIN_VIBRATION_G..=MAX_VIBRATION_G).contains(&reading.vibration));
            prop_assert!(reading.rpm >= MIN_RPM);
            prop_assert!((35.0..=98.0).contains(&reading.load));
            prop_assert!(reading.rpm.is_finite());
        }
    }
}
