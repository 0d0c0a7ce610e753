//! # Maintenance Model
//!
//! Imperfect repair at a cycle boundary. Effectiveness combines the machine's fixed repair
//! quality with per-visit workmanship; a more effective visit reverses more degradation.

use super::machine::MachineState;
use rand::Rng;

#[derive(Debug, Clone, Copy, Default)]
pub struct MaintenanceModel;

impl MaintenanceModel {
    pub fn new() -> Self {
        Self
    }

    /// Service the machine, returning the effectiveness achieved
    pub fn apply<R: Rng + ?Sized>(&self, state: &mut MachineState, rng: &mut R) -> f64 {
        let effectiveness = state.maintenance_quality * rng.gen_range(0.8..=1.0);
        self.apply_with_effectiveness(state, effectiveness);
        effectiveness
    }

    /// Service the machine with a known effectiveness in [0, 1]
    pub fn apply_with_effectiveness(&self, state: &mut MachineState, effectiveness: f64) {
        let residual = 1.0 - effectiveness;

        state.bearing_wear *= 0.2 + 0.5 * residual;
        state.motor_degradation *= 0.3 + 0.5 * residual;
        state.lubrication_quality = (state.lubrication_quality + 0.6 * effectiveness).min(1.0);
        state.stress_accumulation *= 0.1 + 0.3 * residual;

        state.intermittent_fault_active = false;
        state.last_maintenance_effectiveness = effectiveness;
    }
}
