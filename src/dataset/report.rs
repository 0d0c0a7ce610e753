//! Failure report over a generated dataset: every failure row, in dataset order, plus
//! per-machine and per-cycle counts.

use super::COLUMNS;
use crate::simulation::SimulationRecord;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub total_records: usize,
    /// Distinct (machine, cycle) pairs: the ceiling on failures
    pub machine_cycles: usize,
    pub by_machine: BTreeMap<u32, usize>,
    pub by_cycle: BTreeMap<u32, usize>,
    pub failures: Vec<SimulationRecord>,
}

impl FailureReport {
    pub fn from_records(records: &[SimulationRecord]) -> Self {
        let failures: Vec<SimulationRecord> = records
            .iter()
            .filter(|r| r.is_failure())
            .copied()
            .collect();

        let mut by_machine = BTreeMap::new();
        let mut by_cycle = BTreeMap::new();
        for failure in &failures {
            *by_machine.entry(failure.machine_id).or_insert(0) += 1;
            *by_cycle.entry(failure.cycle).or_insert(0) += 1;
        }

        let machine_cycles = records
            .iter()
            .map(|r| (r.machine_id, r.cycle))
            .collect::<BTreeSet<_>>()
            .len();

        Self {
            total_records: records.len(),
            machine_cycles,
            by_machine,
            by_cycle,
            failures,
        }
    }

    pub fn total_failures(&self) -> usize {
        self.failures.len()
    }

    /// Share of machine-cycles that ended in a failure
    pub fn failure_rate(&self) -> f64 {
        if self.machine_cycles == 0 {
            return 0.0;
        }
        self.total_failures() as f64 / self.machine_cycles as f64
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total failures in dataset: {}", self.total_failures())?;
        writeln!(
            f,
            "Records: {}  Machine-cycles: {}  Failure rate: {:.1}%",
            self.total_records,
            self.machine_cycles,
            self.failure_rate() * 100.0
        )?;
        writeln!(f)?;

        writeln!(
            f,
            "{:>10} {:>6} {:>6} {:>12} {:>11} {:>9} {:>8} {:>6} {:>12} {:>13}",
            COLUMNS[0],
            COLUMNS[1],
            COLUMNS[2],
            COLUMNS[3],
            COLUMNS[4],
            COLUMNS[5],
            COLUMNS[6],
            COLUMNS[7],
            COLUMNS[8],
            COLUMNS[9]
        )?;
        for r in &self.failures {
            writeln!(
                f,
                "{:>10} {:>6} {:>6} {:>12} {:>11.2} {:>9.4} {:>8.1} {:>6.1} {:>12} {:>13}",
                r.machine_id,
                r.cycle,
                r.day,
                r.day_in_cycle,
                r.temperature,
                r.vibration,
                r.rpm,
                r.load,
                r.service_flag,
                r.failure_event
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Failures by machine:")?;
        for (machine_id, count) in &self.by_machine {
            writeln!(f, "  machine {machine_id:>4}: {count}")?;
        }

        writeln!(f, "Failures by cycle:")?;
        for (cycle, count) in &self.by_cycle {
            writeln!(f, "  cycle {cycle:>4}: {count}")?;
        }
        Ok(())
    }
}
