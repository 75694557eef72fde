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

// visualization.rs
//
// This file contains the machine-state rendering for the Tomasulo simulator.
// It renders the instruction, ROB, RS, LSB, and register tables either as
// colored text for the terminal or as a JSON snapshot.

use colored::Colorize;

use super::instruction::Stage;
use super::simulator::Simulator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct StateVisualization {
    pub colorize_output: bool,
    pub output_format: OutputFormat,
}

impl Default for StateVisualization {
    fn default() -> Self {
        Self::new()
    }
}

impl StateVisualization {
    pub fn new() -> Self {
        Self {
            colorize_output: true,
            output_format: OutputFormat::Text,
        }
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    pub fn with_colors(mut self, enabled: bool) -> Self {
        self.colorize_output = enabled;
        self
    }

    pub fn render(&self, simulator: &Simulator) -> String {
        match self.output_format {
            OutputFormat::Text => self.render_text(simulator),
            OutputFormat::Json => self.render_json(simulator),
        }
    }

    fn render_text(&self, simulator: &Simulator) -> String {
        let mut result = String::new();

        result.push_str(&format!(
            "=== Machine State at Cycle {} (PC 0x{:x}{}) ===\n",
            simulator.cycle,
            simulator.pc,
            if simulator.halted { ", halted" } else { "" }
        ));

        result.push_str("\n--- Instructions ---\n");
        for instruction in &simulator.program {
            let rob = instruction
                .rob_id
                .map(|id| id.to_string())
                .unwrap_or_default();
            result.push_str(&format!(
                "0x{:04x}  {:<24} {:<10} ROB:{:<3} {}\n",
                instruction.pc,
                instruction.text,
                self.stage_label(instruction.stage),
                rob,
                if instruction.speculative { "spec" } else { "" }
            ));
        }

        result.push_str("\n--- Reorder Buffer ---\n");
        for entry in simulator.rob.entries() {
            if !entry.busy {
                continue;
            }
            result.push_str(&format!(
                "[{:>2}] pc=0x{:04x} {:?} dest={:?} value={:?} ready={} spec={} seq={:?}\n",
                entry.id,
                entry.pc.unwrap_or(0),
                entry.kind,
                entry.dest,
                entry.value,
                entry.ready,
                entry.speculative,
                entry.enqueue_seq
            ));
        }

        result.push_str("\n--- Reservation Stations ---\n");
        for station in &simulator.stations {
            if !station.busy {
                continue;
            }
            result.push_str(&format!(
                "[{:>2}] {:?} Vj={:?} Vk={:?} Qj={:?} Qk={:?} ROB={:?} left={}\n",
                station.id,
                station.op,
                station.vj,
                station.vk,
                station.qj,
                station.qk,
                station.rob_id,
                station.cycles_left
            ));
        }

        result.push_str("\n--- Load/Store Buffer ---\n");
        for slot in &simulator.lsb {
            if !slot.busy {
                continue;
            }
            result.push_str(&format!(
                "[{:>2}] {:?} addr={:?} Vt={:?} Qt={:?} ROB={:?} left={}\n",
                slot.id, slot.op, slot.address, slot.vt, slot.qt, slot.rob_id, slot.cycles_left
            ));
        }

        result.push_str("\n--- Register Alias Table ---\n");
        for (reg, rob_id) in simulator.rat.renamed() {
            result.push_str(&format!("R{} -> ROB[{}]\n", reg, rob_id));
        }

        result.push_str("\n--- Registers ---\n");
        result.push_str(&simulator.registers.dump());

        let memory_entries = simulator.memory.entries();
        if !memory_entries.is_empty() {
            result.push_str("\n--- Memory ---\n");
            for (address, value) in memory_entries {
                result.push_str(&format!("[0x{:04x}] = {}\n", address, value));
            }
        }

        result
    }

    fn render_json(&self, simulator: &Simulator) -> String {
        let snapshot = serde_json::json!({
            "cycle": simulator.cycle,
            "pc": simulator.pc,
            "halted": simulator.halted,
            "program": &simulator.program,
            "rob": simulator.rob.entries(),
            "reservation_stations": &simulator.stations,
            "load_store_buffer": &simulator.lsb,
            "rat": simulator.rat.renamed(),
            "registers": simulator.registers.values(),
            "memory": simulator.memory.entries(),
            "stats": simulator.stats(),
        });
        serde_json::to_string_pretty(&snapshot).unwrap_or_else(|_| String::from("{}"))
    }

    fn stage_label(&self, stage: Stage) -> String {
        let label = stage.to_string();
        if !self.colorize_output {
            return label;
        }
        match stage {
            Stage::Committed => label.green().to_string(),
            Stage::Flushed => label.red().to_string(),
            Stage::Executing => label.yellow().to_string(),
            Stage::WriteBack => label.cyan().to_string(),
            Stage::Issued => label.blue().to_string(),
            Stage::NotFetched => label.dimmed().to_string(),
        }
    }
}
