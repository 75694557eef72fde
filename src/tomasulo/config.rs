// Copyright (c) 2024 Mudit Bhargava
//
// Permission is hereby granted, free of charge, to any person obtaining a copy
// of this software and associated documentation files (the "Software"), to deal
// in the Software without restriction, including without limitation the rights
// to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
// copies of the Software, and to permit persons to whom the Software is
// furnished to do so, subject to the following conditions:
//
// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.
//
// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
// FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
// AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
// LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
// OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
// SOFTWARE.
//

// config.rs
//
// This file contains the configuration structs for the Tomasulo simulator.
// It defines the architecture and multithreading presets, the per-opcode
// latency table, and the SimulatorConfig builder.

use super::instruction::Opcode;
use std::collections::HashMap;

/// Base machine width and structure sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchitectureMode {
    /// Width 1; ROB 16, RS 8, LSB 8.
    Scalar,
    /// Width 2; ROB 32, RS 16, LSB 16.
    Superscalar,
}

/// Multithreading flavor. SMT doubles the fetch/issue/commit width; the
/// interleaved and blocked flavors keep the base width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadingMode {
    Imt,
    Bmt,
    Smt,
}

/// Execution latencies per opcode, in cycles.
#[derive(Debug, Clone)]
pub struct LatencyTable {
    latencies: HashMap<Opcode, usize>,
}

impl Default for LatencyTable {
    fn default() -> Self {
        let mut latencies = HashMap::new();
        latencies.insert(Opcode::Add, 2);
        latencies.insert(Opcode::Sub, 2);
        latencies.insert(Opcode::Mul, 4);
        latencies.insert(Opcode::Div, 8);
        latencies.insert(Opcode::Lw, 3);
        latencies.insert(Opcode::Sw, 2);
        latencies.insert(Opcode::Beq, 1);
        latencies.insert(Opcode::Nop, 1);
        Self { latencies }
    }
}

impl LatencyTable {
    pub fn get(&self, op: Opcode) -> usize {
        self.latencies.get(&op).copied().unwrap_or(1)
    }

    pub fn set(&mut self, op: Opcode, cycles: usize) {
        assert!(cycles > 0, "Latency must be at least one cycle");
        self.latencies.insert(op, cycles);
    }
}

/// Configuration for the simulator, built in the usual `with_*` style.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub arch_mode: ArchitectureMode,
    pub threading_mode: ThreadingMode,
    pub fetch_width: usize,
    pub issue_width: usize,
    pub commit_width: usize,
    pub rob_size: usize,
    pub rs_count: usize,
    pub lsb_count: usize,
    pub register_count: usize,
    pub latencies: LatencyTable,
    /// Safety bound for the run-to-completion driver.
    pub max_cycles: usize,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::scalar()
    }
}

impl SimulatorConfig {
    pub fn new(arch_mode: ArchitectureMode, threading_mode: ThreadingMode) -> Self {
        let (base_width, rob_size, rs_count, lsb_count) = match arch_mode {
            ArchitectureMode::Scalar => (1, 16, 8, 8),
            ArchitectureMode::Superscalar => (2, 32, 16, 16),
        };
        let width_factor = match threading_mode {
            ThreadingMode::Smt => 2,
            ThreadingMode::Imt | ThreadingMode::Bmt => 1,
        };
        let width = base_width * width_factor;

        Self {
            arch_mode,
            threading_mode,
            fetch_width: width,
            issue_width: width,
            commit_width: width,
            rob_size,
            rs_count,
            lsb_count,
            register_count: 32,
            latencies: LatencyTable::default(),
            max_cycles: 10_000,
        }
    }

    pub fn scalar() -> Self {
        Self::new(ArchitectureMode::Scalar, ThreadingMode::Imt)
    }

    pub fn superscalar() -> Self {
        Self::new(ArchitectureMode::Superscalar, ThreadingMode::Imt)
    }

    pub fn with_issue_width(mut self, width: usize) -> Self {
        assert!(width > 0, "Issue width must be positive");
        self.issue_width = width;
        self
    }

    pub fn with_commit_width(mut self, width: usize) -> Self {
        assert!(width > 0, "Commit width must be positive");
        self.commit_width = width;
        self
    }

    pub fn with_fetch_width(mut self, width: usize) -> Self {
        assert!(width > 0, "Fetch width must be positive");
        self.fetch_width = width;
        self
    }

    pub fn with_rob_size(mut self, size: usize) -> Self {
        assert!(size > 0, "ROB size must be positive");
        self.rob_size = size;
        self
    }

    pub fn with_rs_count(mut self, count: usize) -> Self {
        assert!(count > 0, "Reservation station count must be positive");
        self.rs_count = count;
        self
    }

    pub fn with_lsb_count(mut self, count: usize) -> Self {
        assert!(count > 0, "Load/store buffer count must be positive");
        self.lsb_count = count;
        self
    }

    pub fn with_latency(mut self, op: Opcode, cycles: usize) -> Self {
        self.latencies.set(op, cycles);
        self
    }

    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.max_cycles = max_cycles;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_match_architecture_modes() {
        let scalar = SimulatorConfig::scalar();
        assert_eq!(scalar.issue_width, 1);
        assert_eq!(scalar.rob_size, 16);
        assert_eq!(scalar.rs_count, 8);
        assert_eq!(scalar.lsb_count, 8);

        let superscalar = SimulatorConfig::superscalar();
        assert_eq!(superscalar.issue_width, 2);
        assert_eq!(superscalar.rob_size, 32);
    }

    #[test]
    fn smt_doubles_the_width() {
        let config = SimulatorConfig::new(ArchitectureMode::Superscalar, ThreadingMode::Smt);
        assert_eq!(config.fetch_width, 4);
        assert_eq!(config.issue_width, 4);
        assert_eq!(config.commit_width, 4);
    }

    #[test]
    fn default_latencies_follow_the_table() {
        let table = LatencyTable::default();
        assert_eq!(table.get(Opcode::Add), 2);
        assert_eq!(table.get(Opcode::Mul), 4);
        assert_eq!(table.get(Opcode::Div), 8);
        assert_eq!(table.get(Opcode::Lw), 3);
        assert_eq!(table.get(Opcode::Sw), 2);
        assert_eq!(table.get(Opcode::Beq), 1);
    }
}
