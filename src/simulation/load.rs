//! # Production Load Pattern
//!
//! Models daily production load (% of full capacity) from weekly schedules, month-start
//! rushes, month-end wind-downs, an annual seasonal swing, and random unplanned surges/dips.

use super::{annual_wave, normal, require_finite};
use rand::Rng;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Lowest sustainable load in %
pub const MIN_LOAD_PERCENT: f64 = 35.0;
/// Highest sustainable load in %
pub const MAX_LOAD_PERCENT: f64 = 98.0;

/// Load pattern configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
#[validate(schema(function = "finite_load_config"))]
pub struct LoadPatternConfig {
    /// Enable random production surges and dips
    pub enable_anomalies: bool,
    /// Daily probability of an unplanned surge (emergency order)
    #[validate(range(min = 0.0, max = 1.0))]
    pub surge_probability: f64,
    /// Daily probability of an unplanned dip (material shortage)
    #[validate(range(min = 0.0, max = 1.0))]
    pub dip_probability: f64,
}

impl Default for LoadPatternConfig {
    fn default() -> Self {
        Self {
            enable_anomalies: true,
            surge_probability: 0.10,
            dip_probability: 0.08,
        }
    }
}

fn finite_load_config(config: &LoadPatternConfig) -> Result<(), ValidationError> {
    require_finite(&[
        ("surge_probability", config.surge_probability),
        ("dip_probability", config.dip_probability),
    ])
}

/// Produces the daily load percentage. Independent of machine state.
#[derive(Debug, Clone, Default)]
pub struct LoadPatternModel {
    config: LoadPatternConfig,
}

impl LoadPatternModel {
    pub fn new(config: LoadPatternConfig) -> Self {
        Self { config }
    }

    /// Seasonal production multiplier (±10% annual cycle)
    pub fn seasonal_factor(day: u32) -> f64 {
        1.0 + 0.1 * annual_wave(day)
    }

    /// Days 5 and 6 of each week run the reduced weekend schedule
    pub fn is_weekend(day: u32) -> bool {
        matches!(day % 7, 5 | 6)
    }

    /// Sample the load for absolute `day`. `_day_in_cycle` is accepted for call-site symmetry
    /// with the other daily models.
    pub fn sample<R: Rng + ?Sized>(&self, day: u32, _day_in_cycle: u32, rng: &mut R) -> f64 {
        let mut load = if Self::is_weekend(day) {
            normal(rng, 50.0, 5.0)
        } else {
            normal(rng, 68.0, 8.0)
        };

        // Month-start rush / month-end wind-down
        let day_of_month = day % 30;
        if day_of_month < 5 {
            load += rng.gen_range(10.0..20.0);
        } else if day_of_month > 25 {
            load -= rng.gen_range(5.0..15.0);
        }

        load *= Self::seasonal_factor(day);

        if self.config.enable_anomalies {
            if rng.gen_bool(self.config.surge_probability) {
                load += rng.gen_range(15.0..30.0);
            }
            if rng.gen_bool(self.config.dip_probability) {
                load -= rng.gen_range(10.0..25.0);
            }
        }

        load.clamp(MIN_LOAD_PERCENT, MAX_LOAD_PERCENT)
    }
}
