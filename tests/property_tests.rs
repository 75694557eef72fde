use proptest::prelude::*;
use quickcheck::TestResult;
use tomasulo_rust::parse_program;
use tomasulo_rust::tomasulo::instruction::Opcode;
use tomasulo_rust::tomasulo::memory::DataMemory;
use tomasulo_rust::tomasulo::predictor::OneBitPredictor;
use tomasulo_rust::tomasulo::rob::RobEntryKind;
use tomasulo_rust::{SimulatorConfig, TomasuloSimulator};

// Property-based tests using proptest

const OPS: [&str; 4] = ["ADD", "SUB", "MUL", "DIV"];

/// Render a random arithmetic program over registers R0..R7.
fn program_text(instructions: &[(usize, usize, usize, usize)]) -> String {
    instructions
        .iter()
        .map(|&(op, rd, rs, rt)| format!("{} R{}, R{}, R{}\n", OPS[op % 4], rd, rs, rt))
        .collect()
}

/// Straight-line reference model: execute the program sequentially against
/// the architectural registers alone.
fn reference_registers(text: &str, init: &[i64]) -> Vec<i64> {
    let mut registers = init.to_vec();
    for instruction in parse_program(text) {
        if let (Some(rd), Some(rs), Some(rt)) = (instruction.rd, instruction.rs, instruction.rt) {
            if instruction.op.is_arithmetic() {
                registers[rd] = instruction.op.evaluate(registers[rs], registers[rt]);
            }
        }
    }
    registers
}

fn setup(text: &str, init: &[i64]) -> TomasuloSimulator {
    let mut simulator =
        TomasuloSimulator::new(SimulatorConfig::scalar().with_max_cycles(20_000));
    simulator.load_program(text);
    for (reg, &value) in init.iter().enumerate() {
        simulator.registers.write(reg, value);
    }
    simulator
}

fn arb_program() -> impl Strategy<Value = Vec<(usize, usize, usize, usize)>> {
    prop::collection::vec((0usize..4, 0usize..8, 0usize..8, 0usize..8), 1..12)
}

fn arb_registers() -> impl Strategy<Value = Vec<i64>> {
    prop::collection::vec(-1000i64..1000, 8)
}

proptest! {
    /// Out-of-order execution must be invisible: the final architectural
    /// registers match a plain sequential interpretation.
    #[test]
    fn test_out_of_order_matches_sequential_semantics(
        instructions in arb_program(),
        init in arb_registers()
    ) {
        let text = program_text(&instructions);
        let mut simulator = setup(&text, &init);
        let _ = simulator.run();
        prop_assert!(simulator.halted, "arithmetic programs always drain");

        let expected = reference_registers(&text, &init);
        for reg in 0..8 {
            prop_assert_eq!(
                simulator.registers.read(reg),
                expected[reg],
                "R{} diverged for program:\n{}", reg, text
            );
        }
    }

    /// Two runs with the same program and preloads are identical, cycle
    /// count included.
    #[test]
    fn test_deterministic_replay(
        instructions in arb_program(),
        init in arb_registers()
    ) {
        let text = program_text(&instructions);
        let mut first = setup(&text, &init);
        let mut second = setup(&text, &init);
        let stats_first = first.run();
        let stats_second = second.run();

        prop_assert_eq!(stats_first.cycles, stats_second.cycles);
        prop_assert_eq!(stats_first.stalls, stats_second.stalls);
        prop_assert_eq!(first.registers.values(), second.registers.values());
    }

    /// Between cycles, every RAT tag names a busy register-producing ROB
    /// entry, and every complete station still has its ROB entry pending.
    #[test]
    fn test_rename_and_station_invariants_hold_every_cycle(
        instructions in arb_program(),
        init in arb_registers()
    ) {
        let text = program_text(&instructions);
        let mut simulator = setup(&text, &init);

        while !simulator.halted && simulator.cycle < 20_000 {
            let _ = simulator.step();

            for (reg, rob_id) in simulator.rat.renamed() {
                let entry = simulator.rob.entry(rob_id);
                prop_assert!(
                    entry.busy && entry.kind == Some(RobEntryKind::Register),
                    "RAT tag R{} -> ROB[{}] points at a non-producing slot",
                    reg, rob_id
                );
            }

            for station in &simulator.stations {
                if station.is_complete() {
                    let rob_id = station.rob_id.expect("busy station owns a ROB entry");
                    let entry = simulator.rob.entry(rob_id);
                    prop_assert!(
                        entry.busy && !entry.ready,
                        "a finished station was left behind by the broadcast"
                    );
                }
            }
        }
        prop_assert!(simulator.halted);
    }

    /// Architectural state moves only when something commits.
    #[test]
    fn test_architectural_state_changes_only_at_commit(
        instructions in arb_program(),
        init in arb_registers()
    ) {
        let text = program_text(&instructions);
        let mut simulator = setup(&text, &init);

        let mut registers_before = simulator.registers.values().to_vec();
        let mut memory_before = simulator.memory.entries();
        while !simulator.halted && simulator.cycle < 20_000 {
            let summary = simulator.step();
            if summary.committed_count == 0 {
                prop_assert_eq!(simulator.registers.values(), &registers_before[..]);
                prop_assert_eq!(simulator.memory.entries(), memory_before.clone());
            }
            registers_before = simulator.registers.values().to_vec();
            memory_before = simulator.memory.entries();
        }
    }

    /// Straight-line programs retire strictly in program order.
    #[test]
    fn test_commit_cycles_follow_program_order(
        instructions in arb_program(),
        init in arb_registers()
    ) {
        let text = program_text(&instructions);
        let mut simulator = setup(&text, &init);
        let _ = simulator.run();

        let mut last_commit = 0;
        for instruction in &simulator.program {
            let commit = instruction.commit_cycle.expect("everything commits");
            prop_assert!(
                commit >= last_commit,
                "instruction {} committed at {} before an older one at {}",
                instruction.seq, commit, last_commit
            );
            last_commit = commit;
        }
    }
}

// QuickCheck-based tests

fn qc_memory_defaults_to_zero(address: i64) -> bool {
    let memory = DataMemory::new();
    memory.read_word(address) == 0
}

fn qc_memory_read_back(address: i64, value: i64) -> bool {
    let mut memory = DataMemory::new();
    memory.write_word(address, value);
    memory.read_word(address) == value
}

fn qc_division_semantics(a: i32, b: i32) -> TestResult {
    let (a, b) = (a as i64, b as i64);
    let quotient = Opcode::Div.evaluate(a, b);
    if b == 0 {
        return TestResult::from_bool(quotient == 0);
    }
    // Floor division: the remainder a - q*b carries the divisor's sign and
    // is smaller than it in magnitude.
    let remainder = a - quotient * b;
    let sign_ok = remainder == 0 || (remainder < 0) == (b < 0);
    TestResult::from_bool(sign_ok && remainder.abs() < b.abs())
}

fn qc_predictor_remembers_last_outcome(pc: i16, outcomes: Vec<bool>) -> TestResult {
    if outcomes.is_empty() {
        return TestResult::discard();
    }
    let pc = pc as i64;
    let mut predictor = OneBitPredictor::new();
    for &taken in &outcomes {
        predictor.update(pc, taken);
    }
    TestResult::from_bool(predictor.lookup(pc) == *outcomes.last().unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_quickcheck_tests() {
        quickcheck::QuickCheck::new()
            .tests(100)
            .quickcheck(qc_memory_defaults_to_zero as fn(i64) -> bool);

        quickcheck::QuickCheck::new()
            .tests(100)
            .quickcheck(qc_memory_read_back as fn(i64, i64) -> bool);

        quickcheck::QuickCheck::new()
            .tests(100)
            .quickcheck(qc_division_semantics as fn(i32, i32) -> TestResult);

        quickcheck::QuickCheck::new()
            .tests(100)
            .quickcheck(qc_predictor_remembers_last_outcome as fn(i16, Vec<bool>) -> TestResult);
    }
}
