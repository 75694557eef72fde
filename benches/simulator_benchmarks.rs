use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tomasulo_rust::{SimulatorConfig, TomasuloSimulator};

fn dependency_chain_program() -> String {
    let mut program = String::from("ADD R1, R2, R3\n");
    for i in 2..32 {
        program.push_str(&format!("ADD R{}, R{}, R2\n", i, i - 1));
    }
    program
}

fn independent_adds_program(count: usize) -> String {
    let mut program = String::new();
    for i in 0..count {
        program.push_str(&format!("ADD R{}, R30, R31\n", (i % 28) + 1));
    }
    program
}

fn mixed_workload_program() -> String {
    String::from(
        "\
SW R2, 0(R3)
LW R1, 0(R3)
MUL R4, R1, R2
DIV R5, R4, R2
ADD R6, R5, R1
BEQ R6, R7, 36
ADD R8, R6, R6
ADD R9, R6, R6
SUB R10, R8, R9
",
    )
}

fn run_program(config: SimulatorConfig, program: &str) -> usize {
    let mut simulator = TomasuloSimulator::new(config);
    simulator.load_program(program);
    simulator.registers.write(2, 42);
    simulator.registers.write(3, 100);
    simulator.registers.write(30, 5);
    simulator.registers.write(31, 7);
    let stats = simulator.run();
    stats.cycles
}

fn dependency_chain_benchmark(c: &mut Criterion) {
    let program = dependency_chain_program();
    c.bench_function("scalar_dependency_chain", |b| {
        b.iter(|| black_box(run_program(SimulatorConfig::scalar(), &program)));
    });
}

fn independent_adds_benchmark(c: &mut Criterion) {
    let program = independent_adds_program(100);
    c.bench_function("scalar_independent_adds", |b| {
        b.iter(|| black_box(run_program(SimulatorConfig::scalar(), &program)));
    });
    c.bench_function("superscalar_independent_adds", |b| {
        b.iter(|| black_box(run_program(SimulatorConfig::superscalar(), &program)));
    });
}

fn mixed_workload_benchmark(c: &mut Criterion) {
    let program = mixed_workload_program();
    c.bench_function("scalar_mixed_workload", |b| {
        b.iter(|| black_box(run_program(SimulatorConfig::scalar(), &program)));
    });
}

criterion_group!(
    benches,
    dependency_chain_benchmark,
    independent_adds_benchmark,
    mixed_workload_benchmark
);
criterion_main!(benches);
