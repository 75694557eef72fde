// simulator.rs - The Tomasulo cycle engine
//
// One `step()` call advances the machine one clock. The five stages run in
// a fixed order chosen so that a result produced in cycle c becomes visible
// to dependents no earlier than cycle c+1:
//
//   Commit -> WriteResult -> ResolveBranches -> Execute -> Issue
//
// Issue reads the RAT after WriteResult has broadcast this cycle's results,
// so a newly issued station either captures a tag that will still be
// broadcast later, or the ready value itself.

use log::debug;

use super::config::SimulatorConfig;
use super::events::{CycleSummary, SimulationStats};
use super::instruction::{Instruction, Opcode, Stage};
use super::memory::DataMemory;
use super::predictor::{CheckpointStore, OneBitPredictor};
use super::registers::{RegisterAliasTable, RegisterFile};
use super::rob::{ReorderBuffer, RobEntryKind, RobValue};
use super::stations::{LoadStoreSlot, ReservationStation};

pub struct Simulator {
    pub config: SimulatorConfig,

    pub program: Vec<Instruction>,
    pub pc: i64,
    pub cycle: usize,
    pub halted: bool,

    pub registers: RegisterFile,
    pub rat: RegisterAliasTable,
    pub memory: DataMemory,
    pub rob: ReorderBuffer,
    pub stations: Vec<ReservationStation>,
    pub lsb: Vec<LoadStoreSlot>,
    pub predictor: OneBitPredictor,
    pub checkpoints: CheckpointStore,

    pub committed_count: usize,
    pub total_issued: usize,
    pub total_stalls: usize,
    pub branch_mispredictions: usize,
    cumulative_rob_occupancy: usize,
    cumulative_rs_occupancy: usize,
    cumulative_lsb_occupancy: usize,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Self {
        let registers = RegisterFile::new(config.register_count);
        let rat = RegisterAliasTable::new(config.register_count);
        let rob = ReorderBuffer::new(config.rob_size);
        let stations = (0..config.rs_count).map(ReservationStation::new).collect();
        let lsb = (0..config.lsb_count).map(LoadStoreSlot::new).collect();

        Self {
            config,
            program: Vec::new(),
            pc: 0,
            cycle: 0,
            halted: false,
            registers,
            rat,
            memory: DataMemory::new(),
            rob,
            stations,
            lsb,
            predictor: OneBitPredictor::new(),
            checkpoints: CheckpointStore::new(),
            committed_count: 0,
            total_issued: 0,
            total_stalls: 0,
            branch_mispredictions: 0,
            cumulative_rob_occupancy: 0,
            cumulative_rs_occupancy: 0,
            cumulative_lsb_occupancy: 0,
        }
    }

    /// Parse program text and install it, clearing all dynamic state.
    pub fn load_program(&mut self, text: &str) {
        self.load(crate::utils::parser::parse_program(text));
    }

    /// Install an already-parsed program, clearing all dynamic state.
    pub fn load(&mut self, program: Vec<Instruction>) {
        self.clear_dynamic_state();
        self.program = program;
        debug!("loaded program with {} instruction(s)", self.program.len());
    }

    /// Restore the just-after-load state: the program survives, everything
    /// dynamic (registers, memory, predictor, counters) is cleared.
    pub fn reset(&mut self) {
        self.clear_dynamic_state();
        for instruction in &mut self.program {
            instruction.reset_annotations();
        }
    }

    fn clear_dynamic_state(&mut self) {
        self.pc = 0;
        self.cycle = 0;
        self.halted = false;
        self.registers = RegisterFile::new(self.config.register_count);
        self.rat = RegisterAliasTable::new(self.config.register_count);
        self.memory.clear();
        self.rob.reset();
        for station in &mut self.stations {
            station.clear();
        }
        for slot in &mut self.lsb {
            slot.clear();
        }
        self.predictor.reset();
        self.checkpoints.reset();
        self.committed_count = 0;
        self.total_issued = 0;
        self.total_stalls = 0;
        self.branch_mispredictions = 0;
        self.cumulative_rob_occupancy = 0;
        self.cumulative_rs_occupancy = 0;
        self.cumulative_lsb_occupancy = 0;
    }

    /// Advance the machine one clock cycle. After halt this is a no-op that
    /// returns an empty summary.
    pub fn step(&mut self) -> CycleSummary {
        if self.halted {
            return CycleSummary::default();
        }

        self.cycle += 1;
        self.cumulative_rob_occupancy += self.rob.occupancy();
        self.cumulative_rs_occupancy += self.rs_occupancy();
        self.cumulative_lsb_occupancy += self.lsb_occupancy();

        let mut events = Vec::new();
        let committed = self.commit_stage(&mut events);
        self.write_result_stage();
        self.resolve_branches(&mut events);
        self.execute_stage();
        let issued = self.issue_stage(&mut events);
        self.check_halt();
        if self.halted {
            events.push("Simulation halted".to_string());
        }

        for event in &events {
            debug!("cycle {}: {}", self.cycle, event);
        }

        CycleSummary {
            cycle: self.cycle,
            issued_count: issued,
            committed_count: committed,
            total_stalls: self.total_stalls,
            total_committed: self.committed_count,
            events,
        }
    }

    /// Step until halt or the configured cycle bound.
    pub fn run(&mut self) -> SimulationStats {
        while !self.halted && self.cycle < self.config.max_cycles {
            let _ = self.step();
        }
        self.stats()
    }

    pub fn stats(&self) -> SimulationStats {
        let cycles = self.cycle;
        let per_cycle = |total: usize| {
            if cycles > 0 {
                total as f32 / cycles as f32
            } else {
                0.0
            }
        };
        SimulationStats {
            cycles,
            instructions: self.program.len(),
            instructions_issued: self.total_issued,
            instructions_committed: self.committed_count,
            stalls: self.total_stalls,
            branch_mispredictions: self.branch_mispredictions,
            predictor_accuracy: self.predictor.accuracy(),
            ipc: per_cycle(self.committed_count),
            avg_rob_occupancy: per_cycle(self.cumulative_rob_occupancy),
            avg_rs_occupancy: per_cycle(self.cumulative_rs_occupancy),
            avg_lsb_occupancy: per_cycle(self.cumulative_lsb_occupancy),
        }
    }

    pub fn rs_occupancy(&self) -> usize {
        self.stations.iter().filter(|station| station.busy).count()
    }

    pub fn lsb_occupancy(&self) -> usize {
        self.lsb.iter().filter(|slot| slot.busy).count()
    }

    // ----- Commit ---------------------------------------------------------

    /// Retire up to `commit_width` oldest ready entries, in enqueue order.
    /// The first not-ready entry stops the whole batch.
    fn commit_stage(&mut self, events: &mut Vec<String>) -> usize {
        let mut committed = 0;
        let order = self.rob.commit_order();
        for rob_id in order.into_iter().take(self.config.commit_width) {
            if !self.rob.entry(rob_id).ready {
                break;
            }
            let (kind, dest, value, pc) = {
                let entry = self.rob.entry(rob_id);
                (entry.kind, entry.dest, entry.value.clone(), entry.pc)
            };
            match kind {
                Some(RobEntryKind::Register) => {
                    if let Some(dest_reg) = dest {
                        // A later rename of the same register takes
                        // precedence; only the current renamer writes
                        // through to the architectural file.
                        if self.rat.get(dest_reg) == Some(rob_id) {
                            let scalar = value.as_ref().map(RobValue::scalar).unwrap_or(0);
                            self.registers.write(dest_reg, scalar);
                            self.rat.clear(dest_reg);
                        }
                    }
                }
                Some(RobEntryKind::Store) => {
                    if let Some(RobValue::Store { address, data }) = value {
                        self.memory.write_word(address, data);
                    }
                }
                Some(RobEntryKind::Branch) | None => {}
            }
            self.rob.entry_mut(rob_id).retire();
            if let Some(pc) = pc {
                if let Some(instruction) = instruction_at(&mut self.program, pc) {
                    instruction.stage = Stage::Committed;
                    instruction.commit_cycle = Some(self.cycle);
                }
            }
            self.committed_count += 1;
            committed += 1;
        }
        if committed > 0 {
            events.push(format!("Committed {} instruction(s)", committed));
        }
        committed
    }

    // ----- Write-result / CDB ---------------------------------------------

    /// Stations that finished draining publish their results. All results of
    /// a cycle share the same broadcast phase; order within the phase is not
    /// observable because no two stations share a destination ROB entry.
    fn write_result_stage(&mut self) {
        let mut results: Vec<(usize, RobValue)> = Vec::new();

        for idx in 0..self.stations.len() {
            if !self.stations[idx].is_complete() {
                continue;
            }
            let (op, vj, vk, rob_id, pc) = {
                let station = &self.stations[idx];
                (station.op, station.vj, station.vk, station.rob_id, station.pc)
            };
            let (Some(op), Some(rob_id)) = (op, rob_id) else {
                continue;
            };

            if op.is_branch() {
                // Branches produce no CDB value; the outcome lands in the
                // ROB entry for the resolution stage.
                let taken = vj.unwrap_or(0) == vk.unwrap_or(0);
                let entry = self.rob.entry_mut(rob_id);
                entry.branch_taken = Some(taken);
                entry.ready = true;
            } else {
                let value = if op.is_arithmetic() {
                    op.evaluate(vj.unwrap_or(0), vk.unwrap_or(0))
                } else {
                    vj.unwrap_or(0)
                };
                results.push((rob_id, RobValue::Int(value)));
            }
            self.stations[idx].clear();
            self.mark_writeback(pc);
        }

        for idx in 0..self.lsb.len() {
            if !self.lsb[idx].is_complete() {
                continue;
            }
            let (op, address, vt, rob_id, pc) = {
                let slot = &self.lsb[idx];
                (slot.op, slot.address, slot.vt, slot.rob_id, slot.pc)
            };
            let (Some(op), Some(rob_id)) = (op, rob_id) else {
                continue;
            };

            match op {
                Opcode::Lw => {
                    let value = self.memory.read_word(address.unwrap_or(0));
                    results.push((rob_id, RobValue::Int(value)));
                }
                Opcode::Sw => {
                    // Stores write memory only at commit; until then the
                    // (address, data) pair rides in the ROB entry.
                    results.push((
                        rob_id,
                        RobValue::Store {
                            address: address.unwrap_or(0),
                            data: vt.unwrap_or(0),
                        },
                    ));
                }
                _ => {}
            }
            self.lsb[idx].clear();
            self.mark_writeback(pc);
        }

        for (rob_id, value) in results {
            let scalar = value.scalar();
            {
                let entry = self.rob.entry_mut(rob_id);
                entry.value = Some(value);
                entry.ready = true;
            }
            for station in &mut self.stations {
                if !station.busy {
                    continue;
                }
                if station.qj == Some(rob_id) {
                    station.vj = Some(scalar);
                    station.qj = None;
                }
                if station.qk == Some(rob_id) {
                    station.vk = Some(scalar);
                    station.qk = None;
                }
            }
            for slot in &mut self.lsb {
                if slot.busy && slot.qt == Some(rob_id) {
                    slot.vt = Some(scalar);
                    slot.qt = None;
                }
            }
        }
    }

    fn mark_writeback(&mut self, pc: Option<i64>) {
        if let Some(pc) = pc {
            if let Some(instruction) = instruction_at(&mut self.program, pc) {
                instruction.stage = Stage::WriteBack;
                instruction.wb_cycle = Some(self.cycle);
            }
        }
    }

    // ----- Branch resolution ----------------------------------------------

    fn resolve_branches(&mut self, events: &mut Vec<String>) {
        for rob_id in 0..self.rob.len() {
            let (busy, kind, ready, pc, taken, checkpoint_id) = {
                let entry = self.rob.entry(rob_id);
                (
                    entry.busy,
                    entry.kind,
                    entry.ready,
                    entry.pc,
                    entry.branch_taken,
                    entry.checkpoint_id,
                )
            };
            if !busy || kind != Some(RobEntryKind::Branch) || !ready {
                continue;
            }
            let Some(pc) = pc else {
                continue;
            };

            let predicted = self.predictor.lookup(pc);
            let actual = taken.unwrap_or(false);
            self.predictor.update(pc, actual);

            if predicted == actual {
                self.rob.entry_mut(rob_id).speculative = false;
                if let Some(cp_id) = checkpoint_id {
                    for entry in self.rob.entries_mut() {
                        if entry.busy && entry.id != rob_id && entry.checkpoint_id == Some(cp_id) {
                            entry.speculative = false;
                            entry.checkpoint_id = None;
                        }
                    }
                    for instruction in &mut self.program {
                        instruction.speculative = false;
                    }
                    self.checkpoints.discard(cp_id);
                }
                events.push(format!(
                    "BRANCH @0x{:x}: {} as predicted",
                    pc,
                    outcome_name(actual)
                ));
            } else {
                self.branch_mispredictions += 1;
                self.flush_speculative(rob_id);
                if let Some(cp_id) = checkpoint_id {
                    if let Some(checkpoint) = self.checkpoints.get(cp_id) {
                        let snapshot = checkpoint.rat.clone();
                        self.rat.restore(&snapshot);
                        self.drop_stale_rat_tags();
                    }
                }
                let target = self
                    .program
                    .iter()
                    .find(|instruction| instruction.pc == pc)
                    .and_then(|instruction| instruction.imm);
                self.pc = if actual {
                    target.unwrap_or(pc + 4)
                } else {
                    pc + 4
                };
                // Flushed is terminal: a flushed instruction is never
                // refetched, even when the new PC points back at it.
                for instruction in &mut self.program {
                    if instruction.speculative {
                        instruction.stage = Stage::Flushed;
                        instruction.speculative = false;
                    }
                }
                if let Some(cp_id) = checkpoint_id {
                    self.checkpoints.discard(cp_id);
                }
                events.push(format!(
                    "BRANCH @0x{:x}: mispredicted ({} predicted, {} actual), redirect to PC 0x{:x}",
                    pc,
                    outcome_name(predicted),
                    outcome_name(actual),
                    self.pc
                ));
            }
        }
    }

    /// A snapshot can name producers that committed (or were flushed) while
    /// the branch was in flight; their slots are free by the time the RAT is
    /// restored, and a tag pointing at a free slot would never be satisfied.
    /// The architectural register file already holds those values.
    fn drop_stale_rat_tags(&mut self) {
        let stale: Vec<usize> = self
            .rat
            .renamed()
            .into_iter()
            .filter(|&(_, rob_id)| {
                let entry = self.rob.entry(rob_id);
                !entry.busy || entry.kind != Some(RobEntryKind::Register)
            })
            .map(|(reg, _)| reg)
            .collect();
        for reg in stale {
            self.rat.clear(reg);
        }
    }

    /// Reclaim every speculative ROB entry except the resolving branch,
    /// together with the station or buffer slot it owns.
    fn flush_speculative(&mut self, branch_rob_id: usize) {
        for rob_id in 0..self.rob.len() {
            let (busy, speculative, kind, seq, cp_id) = {
                let entry = self.rob.entry(rob_id);
                (
                    entry.busy,
                    entry.speculative,
                    entry.kind,
                    entry.enqueue_seq,
                    entry.checkpoint_id,
                )
            };
            if !busy || !speculative || rob_id == branch_rob_id {
                continue;
            }
            for station in &mut self.stations {
                if station.busy && station.rob_id == Some(rob_id) {
                    station.clear();
                }
            }
            for slot in &mut self.lsb {
                if slot.busy && slot.rob_id == Some(rob_id) {
                    slot.clear();
                }
            }
            if let Some(checkpoint) = cp_id.and_then(|id| self.checkpoints.get(id)) {
                // Window members are always younger than the snapshot point.
                debug_assert!(seq.unwrap_or(u64::MAX) >= checkpoint.enqueue_mark);
            }
            // A flushed branch takes its own checkpoint down with it, so a
            // dead window can never stay active.
            if kind == Some(RobEntryKind::Branch) {
                if let Some(id) = cp_id {
                    self.checkpoints.discard(id);
                }
            }
            self.rob.entry_mut(rob_id).clear();
        }
    }

    // ----- Execute --------------------------------------------------------

    /// Drain one latency cycle from every busy station whose operands are
    /// ready. A station with an outstanding tag does not count down. The
    /// result becomes visible only in the next cycle's write-result stage.
    fn execute_stage(&mut self) {
        for idx in 0..self.stations.len() {
            let (ticked, finished, pc) = {
                let station = &mut self.stations[idx];
                if station.busy && station.cycles_left > 0 && station.operands_ready() {
                    station.cycles_left -= 1;
                    (true, station.cycles_left == 0, station.pc)
                } else {
                    (false, false, None)
                }
            };
            if ticked {
                self.mark_executing(pc, finished);
            }
        }
        for idx in 0..self.lsb.len() {
            let (ticked, finished, pc) = {
                let slot = &mut self.lsb[idx];
                if slot.busy && slot.cycles_left > 0 && slot.operands_ready() {
                    slot.cycles_left -= 1;
                    (true, slot.cycles_left == 0, slot.pc)
                } else {
                    (false, false, None)
                }
            };
            if ticked {
                self.mark_executing(pc, finished);
            }
        }
    }

    fn mark_executing(&mut self, pc: Option<i64>, finished: bool) {
        if let Some(pc) = pc {
            if let Some(instruction) = instruction_at(&mut self.program, pc) {
                instruction.stage = Stage::Executing;
                if finished {
                    instruction.exec_end_cycle = Some(self.cycle);
                }
            }
        }
    }

    // ----- Issue / dispatch -----------------------------------------------

    /// Fetch, rename, and allocate up to `issue_width` instructions. A
    /// missing ROB or station slot records a stall and ends the cycle's
    /// issue; there is no partial allocation.
    fn issue_stage(&mut self, events: &mut Vec<String>) -> usize {
        let mut issued = 0;
        for _ in 0..self.config.issue_width {
            let Some(program_idx) = self
                .program
                .iter()
                .position(|ins| ins.pc == self.pc && ins.stage == Stage::NotFetched)
            else {
                // Taken branches can leave never-fetched holes behind; only
                // skip forward toward work that lies ahead of the PC.
                if self
                    .program
                    .iter()
                    .any(|ins| ins.stage == Stage::NotFetched && ins.pc > self.pc)
                {
                    self.pc += 4;
                    continue;
                }
                break;
            };

            let op = self.program[program_idx].op;
            let Some(rob_id) = self.rob.find_free() else {
                self.total_stalls += 1;
                break;
            };
            let slot_id = if op.is_memory() {
                self.find_free_lsb()
            } else {
                self.find_free_station()
            };
            let Some(slot_id) = slot_id else {
                self.total_stalls += 1;
                break;
            };

            let instr_pc = self.program[program_idx].pc;
            let rs = self.program[program_idx].rs;
            let rt = self.program[program_idx].rt;
            let imm = self.program[program_idx].imm;
            let dest = self.program[program_idx].destination();

            let kind = match op {
                Opcode::Sw => RobEntryKind::Store,
                Opcode::Beq => RobEntryKind::Branch,
                _ => RobEntryKind::Register,
            };
            self.rob.allocate(rob_id, instr_pc, op, kind).dest = dest;

            let mut speculative = false;
            if op.is_branch() {
                let checkpoint_id = self
                    .checkpoints
                    .take(self.rat.snapshot(), self.rob.next_seq());
                {
                    let entry = self.rob.entry_mut(rob_id);
                    entry.checkpoint_id = Some(checkpoint_id);
                    entry.speculative = true;
                }
                speculative = true;
                let predicted = self.predictor.predict(instr_pc);
                let next_pc = if predicted {
                    imm.unwrap_or(instr_pc + 4)
                } else {
                    instr_pc + 4
                };
                events.push(format!(
                    "PRED @0x{:x}: {} -> next PC 0x{:x}",
                    instr_pc,
                    outcome_name(predicted),
                    next_pc
                ));
                self.pc = next_pc;
            } else {
                if let Some(active) = self.checkpoints.active() {
                    // Issued under an unresolved branch: part of the same
                    // speculation window.
                    let entry = self.rob.entry_mut(rob_id);
                    entry.speculative = true;
                    entry.checkpoint_id = Some(active);
                    speculative = true;
                }
                self.pc = instr_pc + 4;
            }

            let latency = self.config.latencies.get(op);
            if op.is_memory() {
                let address = if let Some(base) = rs {
                    let (value, _tag) = self.operand_lookup(base);
                    // The buffer has no rename tag for the base register,
                    // so the address is fixed at issue.
                    let base_value = value.unwrap_or_else(|| self.registers.read(base));
                    Some(base_value + imm.unwrap_or(0))
                } else {
                    imm
                };
                let (vt, qt) = if op == Opcode::Sw {
                    match rt {
                        Some(src) => self.operand_lookup(src),
                        None => (Some(0), None),
                    }
                } else {
                    (None, None)
                };

                let slot = &mut self.lsb[slot_id];
                slot.busy = true;
                slot.op = Some(op);
                slot.address = address;
                slot.vt = vt;
                slot.qt = qt;
                slot.rob_id = Some(rob_id);
                slot.pc = Some(instr_pc);
                slot.cycles_left = latency;
            } else {
                let (vj, qj) = match rs {
                    Some(reg) => self.operand_lookup(reg),
                    None => (None, None),
                };
                let (vk, qk) = match rt {
                    Some(reg) => self.operand_lookup(reg),
                    None => (None, None),
                };

                let station = &mut self.stations[slot_id];
                station.busy = true;
                station.op = Some(op);
                station.vj = vj;
                station.vk = vk;
                station.qj = qj;
                station.qk = qk;
                station.rob_id = Some(rob_id);
                station.pc = Some(instr_pc);
                station.cycles_left = latency;
            }

            // Rename after the source operands were read, so an instruction
            // can consume the old mapping of its own destination.
            if let Some(dest_reg) = dest {
                self.rat.set(dest_reg, rob_id);
            }

            let instruction = &mut self.program[program_idx];
            instruction.stage = Stage::Issued;
            instruction.rob_id = Some(rob_id);
            if op.is_memory() {
                instruction.lsb_id = Some(slot_id);
            } else {
                instruction.rs_id = Some(slot_id);
            }
            instruction.speculative = speculative;
            instruction.issue_cycle = Some(self.cycle);

            issued += 1;
            self.total_issued += 1;
        }
        issued
    }

    /// Resolve a source register to either a value or a pending ROB tag.
    /// A tag whose entry already broadcast is taken by value here: its
    /// broadcast will not recur, only commit will clear the RAT mapping.
    fn operand_lookup(&self, reg: usize) -> (Option<i64>, Option<usize>) {
        match self.rat.get(reg) {
            Some(rob_id) => {
                let entry = self.rob.entry(rob_id);
                if entry.ready {
                    let value = entry.value.as_ref().map(RobValue::scalar).unwrap_or(0);
                    (Some(value), None)
                } else {
                    (None, Some(rob_id))
                }
            }
            None => (Some(self.registers.read(reg)), None),
        }
    }

    fn find_free_station(&self) -> Option<usize> {
        self.stations.iter().position(|station| !station.busy)
    }

    fn find_free_lsb(&self) -> Option<usize> {
        self.lsb.iter().position(|slot| !slot.busy)
    }

    // ----- Halt -----------------------------------------------------------

    fn check_halt(&mut self) {
        let structures_empty = self.rob.no_busy_entries()
            && self.stations.iter().all(|station| !station.busy)
            && self.lsb.iter().all(|slot| !slot.busy);
        let program_drained = self
            .program
            .iter()
            .all(|ins| matches!(ins.stage, Stage::Committed | Stage::Flushed));
        if structures_empty && program_drained {
            self.halted = true;
        }
    }
}

fn instruction_at(program: &mut [Instruction], pc: i64) -> Option<&mut Instruction> {
    program.iter_mut().find(|instruction| instruction.pc == pc)
}

fn outcome_name(taken: bool) -> &'static str {
    if taken {
        "taken"
    } else {
        "not-taken"
    }
}
