//! # Simulation Driver
//!
//! Owns the machine population and runs cycles → machines → days, calling the daily models
//! in fixed order (load → sensors → degradation → risk → failure decision) and emitting one
//! record per machine-day.
//!
//! Every machine owns an independent RNG stream seeded with `seed + machine_id`, so the
//! sequential and parallel runners produce identical records for the same seed.

use super::degradation::DegradationModel;
use super::load::LoadPatternModel;
use super::machine::MachineState;
use super::maintenance::MaintenanceModel;
use super::risk::FailureRiskModel;
use super::sensors::SensorSynthesizer;
use crate::config::{ConfigError, ModelConfig, SimulationConfig};
use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};
use validator::Validate;

/// Daily risk above which a high-risk streak builds up
pub const HIGH_RISK_THRESHOLD: f64 = 0.6;
/// Effective risk above which failure is certain
pub const DETERMINISTIC_FAILURE_RISK: f64 = 0.85;
/// Scale applied to effective risk for the daily failure draw
pub const FAILURE_PROBABILITY_SCALE: f64 = 0.1;

/// One machine-day of output. Field order is the dataset column order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub machine_id: u32,
    pub cycle: u32,
    pub day: u32,
    pub day_in_cycle: u32,
    pub temperature: f64,
    pub vibration: f64,
    pub rpm: f64,
    pub load: f64,
    pub service_flag: u8,
    pub failure_event: u8,
}

impl SimulationRecord {
    pub fn is_failure(&self) -> bool {
        self.failure_event == 1
    }

    pub fn is_service(&self) -> bool {
        self.service_flag == 1
    }
}

/// Failure-decision state for one machine within one cycle
///
/// Starts not-yet-failed; the first failure moves it to failed-this-cycle, after which no
/// further failure is recorded until the next cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleTracker {
    failed: bool,
    consecutive_high_risk_days: u32,
    intermittent_fault_days: u32,
}

impl CycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_failed(&self) -> bool {
        self.failed
    }

    pub fn consecutive_high_risk_days(&self) -> u32 {
        self.consecutive_high_risk_days
    }

    pub fn intermittent_fault_days(&self) -> u32 {
        self.intermittent_fault_days
    }

    /// Update the streak counters with today's risk and fault flag
    pub fn observe(&mut self, risk: f64, fault_active: bool) {
        if risk > HIGH_RISK_THRESHOLD {
            self.consecutive_high_risk_days += 1;
        } else {
            self.consecutive_high_risk_days = 0;
        }

        if fault_active {
            self.intermittent_fault_days += 1;
        } else {
            self.intermittent_fault_days = 0;
        }
    }

    /// Risk amplified by sustained high risk and prolonged intermittent faults
    pub fn effective_risk(&self, risk: f64) -> f64 {
        let mut multiplier = 1.0 + self.consecutive_high_risk_days as f64 * 0.2;
        if self.intermittent_fault_days > 5 {
            multiplier *= 1.5;
        }
        risk * multiplier
    }

    /// Decide whether the machine fails today. Returns true only on the transition.
    pub fn decide<R: Rng + ?Sized>(&mut self, risk: f64, rng: &mut R) -> bool {
        if self.failed {
            return false;
        }

        let effective_risk = self.effective_risk(risk);
        let fails = effective_risk > DETERMINISTIC_FAILURE_RISK
            || rng.gen_bool(effective_risk * FAILURE_PROBABILITY_SCALE);

        self.failed = fails;
        fails
    }
}

/// One machine's models, state and RNG stream
pub struct MachineSimulation {
    state: MachineState,
    rng: StdRng,
    days_per_cycle: u32,
    load_model: LoadPatternModel,
    sensors: SensorSynthesizer,
    degradation: DegradationModel,
    risk_model: FailureRiskModel,
    maintenance: MaintenanceModel,
}

impl MachineSimulation {
    /// Create a machine whose characteristics are drawn from `rng`
    pub fn new(
        machine_id: u32,
        days_per_cycle: u32,
        models: &ModelConfig,
        mut rng: StdRng,
    ) -> Self {
        let state = MachineState::new(machine_id, &mut rng);
        Self::with_state(state, days_per_cycle, models, rng)
    }

    pub fn with_state(
        state: MachineState,
        days_per_cycle: u32,
        models: &ModelConfig,
        rng: StdRng,
    ) -> Self {
        Self {
            state,
            rng,
            days_per_cycle,
            load_model: LoadPatternModel::new(models.load.clone()),
            sensors: SensorSynthesizer::new(models.sensors.clone()),
            degradation: DegradationModel::new(),
            risk_model: FailureRiskModel::new(models.risk.clone()),
            maintenance: MaintenanceModel::new(),
        }
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn into_state(self) -> MachineState {
        self.state
    }

    /// Service the machine before every cycle except the first.
    /// Returns the maintenance effectiveness when service happened.
    pub fn begin_cycle(&mut self, cycle: u32) -> Option<f64> {
        let effectiveness = (cycle > 1).then(|| {
            let effectiveness = self.maintenance.apply(&mut self.state, &mut self.rng);
            debug!(
                machine_id = self.state.machine_id,
                cycle,
                effectiveness,
                bearing_wear = self.state.bearing_wear,
                motor_degradation = self.state.motor_degradation,
                "maintenance applied"
            );
            effectiveness
        });

        self.state.cycles_since_service += 1;
        effectiveness
    }

    /// Simulate one day and produce its record
    pub fn simulate_day(
        &mut self,
        cycle: u32,
        day_in_cycle: u32,
        tracker: &mut CycleTracker,
    ) -> SimulationRecord {
        let day = (cycle - 1) * self.days_per_cycle + day_in_cycle;

        let load = self.load_model.sample(day, day_in_cycle, &mut self.rng);
        let reading = self
            .sensors
            .synthesize(&self.state, day_in_cycle, load, &mut self.rng);
        self.degradation.apply(&mut self.state, &reading, day_in_cycle);
        let assessment = self
            .risk_model
            .assess(&mut self.state, &reading, day_in_cycle, &mut self.rng);

        tracker.observe(assessment.risk, self.state.intermittent_fault_active);
        let failed = tracker.decide(assessment.risk, &mut self.rng);
        if failed {
            self.state.previous_failures += 1;
            debug!(
                machine_id = self.state.machine_id,
                cycle,
                day,
                risk = assessment.risk,
                effective_risk = tracker.effective_risk(assessment.risk),
                dominant_mode = ?assessment.breakdown.dominant_mode(),
                override_cause = ?assessment.override_cause,
                "machine failed"
            );
        }

        SimulationRecord {
            machine_id: self.state.machine_id,
            cycle,
            day,
            day_in_cycle,
            temperature: reading.temperature,
            vibration: reading.vibration,
            rpm: reading.rpm,
            load: reading.load,
            service_flag: u8::from(day_in_cycle == 1 && cycle > 1),
            failure_event: u8::from(failed),
        }
    }

    /// Run a whole cycle, maintenance included
    pub fn run_cycle(&mut self, cycle: u32) -> Vec<SimulationRecord> {
        self.begin_cycle(cycle);

        let mut tracker = CycleTracker::new();
        (1..=self.days_per_cycle)
            .map(|day_in_cycle| self.simulate_day(cycle, day_in_cycle, &mut tracker))
            .collect()
    }
}

/// Everything one machine produced over the run
struct MachineHistory {
    cycles: Vec<Vec<SimulationRecord>>,
    state: MachineState,
}

/// Output of a complete run
#[derive(Debug, Clone)]
pub struct SimulationRun {
    /// Base seed the machine streams were derived from
    pub seed: u64,
    /// Records in cycle → machine → day order
    pub records: Vec<SimulationRecord>,
    /// Final hidden state of every machine, by machine id
    pub machines: Vec<MachineState>,
}

impl SimulationRun {
    pub fn failures(&self) -> impl Iterator<Item = &SimulationRecord> {
        self.records.iter().filter(|record| record.is_failure())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }
}

pub struct SimulationDriver {
    config: SimulationConfig,
    seed: u64,
}

impl SimulationDriver {
    /// Validate the configuration and fix the base seed
    pub fn new(config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(|| StdRng::from_entropy().gen());
        Ok(Self { config, seed })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    fn machine_rng(&self, machine_id: u32) -> StdRng {
        StdRng::seed_from_u64(self.seed.wrapping_add(machine_id as u64))
    }

    fn simulate_machine(config: &SimulationConfig, machine_id: u32, rng: StdRng) -> MachineHistory {
        let mut machine =
            MachineSimulation::new(machine_id, config.days_per_cycle, &config.models, rng);
        let cycles = (1..=config.cycles).map(|cycle| machine.run_cycle(cycle)).collect();

        MachineHistory {
            cycles,
            state: machine.into_state(),
        }
    }

    /// Run every machine sequentially on the calling thread
    pub fn run(&self) -> SimulationRun {
        self.log_start(false);

        let histories = (1..=self.config.machines)
            .map(|machine_id| {
                Self::simulate_machine(&self.config, machine_id, self.machine_rng(machine_id))
            })
            .collect();

        self.assemble(histories)
    }

    /// Run one blocking worker per machine, then merge in the sequential order
    pub async fn run_parallel(&self) -> Result<SimulationRun> {
        self.log_start(true);

        let mut workers = JoinSet::new();
        for machine_id in 1..=self.config.machines {
            let config = self.config.clone();
            let rng = self.machine_rng(machine_id);
            workers.spawn_blocking(move || Self::simulate_machine(&config, machine_id, rng));
        }

        let mut histories = Vec::with_capacity(self.config.machines as usize);
        while let Some(joined) = workers.join_next().await {
            histories.push(joined.context("machine simulation worker failed")?);
        }
        histories.sort_by_key(|history| history.state.machine_id);

        Ok(self.assemble(histories))
    }

    fn log_start(&self, parallel: bool) {
        info!(
            machines = self.config.machines,
            cycles = self.config.cycles,
            days_per_cycle = self.config.days_per_cycle,
            seed = self.seed,
            parallel,
            "starting fleet simulation"
        );
    }

    fn assemble(&self, mut histories: Vec<MachineHistory>) -> SimulationRun {
        let mut records = Vec::with_capacity(self.config.total_records());

        for cycle_index in 0..self.config.cycles as usize {
            for history in histories.iter_mut() {
                records.append(&mut history.cycles[cycle_index]);
            }
        }

        let machines: Vec<MachineState> = histories
            .into_iter()
            .map(|history| history.state)
            .collect();
        for machine in machines.iter().filter(|m| m.previous_failures == self.config.cycles) {
            warn!(
                machine_id = machine.machine_id,
                failures = machine.previous_failures,
                "machine failed in every cycle"
            );
        }

        let run = SimulationRun {
            seed: self.seed,
            records,
            machines,
        };
        info!(
            records = run.records.len(),
            failures = run.failure_count(),
            "fleet simulation complete"
        );
        run
    }
}
