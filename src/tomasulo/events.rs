// events.rs - Per-cycle event records and end-of-run statistics

use serde::Serialize;
use std::fmt;

/// What a single `step()` call reports back to collaborators. Events are
/// human-readable strings (branch prediction, resolution, issue/commit
/// activity); collaborators treat them as opaque.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CycleSummary {
    pub cycle: usize,
    pub issued_count: usize,
    pub committed_count: usize,
    pub total_stalls: usize,
    pub total_committed: usize,
    pub events: Vec<String>,
}

impl CycleSummary {
    pub fn is_empty(&self) -> bool {
        self.cycle == 0 && self.events.is_empty()
    }
}

/// Aggregate statistics over a whole run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationStats {
    pub cycles: usize,
    pub instructions: usize,
    pub instructions_issued: usize,
    pub instructions_committed: usize,
    pub stalls: usize,
    pub branch_mispredictions: usize,
    pub predictor_accuracy: f32,
    pub ipc: f32,
    pub avg_rob_occupancy: f32,
    pub avg_rs_occupancy: f32,
    pub avg_lsb_occupancy: f32,
}

impl fmt::Display for SimulationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tomasulo Simulation Statistics:")?;
        writeln!(f, "  Cycles: {}", self.cycles)?;
        writeln!(f, "  Instructions: {}", self.instructions)?;
        writeln!(f, "  Instructions Issued: {}", self.instructions_issued)?;
        writeln!(f, "  Instructions Committed: {}", self.instructions_committed)?;
        writeln!(f, "  Instructions Per Cycle (IPC): {:.2}", self.ipc)?;
        writeln!(f, "  Stalls: {}", self.stalls)?;
        writeln!(f, "  Branch Mispredictions: {}", self.branch_mispredictions)?;
        writeln!(
            f,
            "  Predictor Accuracy: {:.2}%",
            self.predictor_accuracy * 100.0
        )?;
        writeln!(f, "  Avg ROB Occupancy: {:.2}", self.avg_rob_occupancy)?;
        writeln!(f, "  Avg RS Occupancy: {:.2}", self.avg_rs_occupancy)?;
        write!(f, "  Avg LSB Occupancy: {:.2}", self.avg_lsb_occupancy)
    }
}
