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

// main.rs
//
// This file contains the main entry point for the Tomasulo simulator.
// It provides a command-line interface for running a program to completion
// or tracing it cycle by cycle.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tomasulo_rust::errors::SimulatorError;
use tomasulo_rust::tomasulo::visualization::{OutputFormat, StateVisualization};
use tomasulo_rust::{ArchitectureMode, SimulatorConfig, ThreadingMode, TomasuloSimulator};

#[derive(Parser)]
#[command(name = "tomasulo_rust")]
#[command(about = "A cycle-accurate Tomasulo out-of-order execution simulator")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ArchArg {
    Scalar,
    Superscalar,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ThreadingArg {
    Imt,
    Bmt,
    Smt,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program to completion and print the final state
    Run {
        /// Input program file (MIPS-like assembly, one instruction per line)
        #[arg(short, long)]
        input: PathBuf,

        /// Architecture preset
        #[arg(short, long, value_enum, default_value = "scalar")]
        arch: ArchArg,

        /// Multithreading preset (SMT doubles the machine width)
        #[arg(short, long, value_enum, default_value = "imt")]
        threading: ThreadingArg,

        /// Maximum cycles to simulate
        #[arg(long, default_value = "10000")]
        max_cycles: usize,

        /// Preload a register before the run, e.g. --reg R2=5
        #[arg(long = "reg")]
        registers: Vec<String>,

        /// Preload a memory word before the run, e.g. --mem 100=42
        #[arg(long = "mem")]
        memory: Vec<String>,

        /// Emit the final state as JSON instead of text tables
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Step a program cycle by cycle, printing the event log
    Trace {
        /// Input program file (MIPS-like assembly, one instruction per line)
        #[arg(short, long)]
        input: PathBuf,

        /// Architecture preset
        #[arg(short, long, value_enum, default_value = "scalar")]
        arch: ArchArg,

        /// Multithreading preset (SMT doubles the machine width)
        #[arg(short, long, value_enum, default_value = "imt")]
        threading: ThreadingArg,

        /// Maximum cycles to simulate
        #[arg(long, default_value = "10000")]
        max_cycles: usize,

        /// Preload a register before the run, e.g. --reg R2=5
        #[arg(long = "reg")]
        registers: Vec<String>,

        /// Preload a memory word before the run, e.g. --mem 100=42
        #[arg(long = "mem")]
        memory: Vec<String>,

        /// Print the full state tables every N cycles (0 = never)
        #[arg(long, default_value = "0")]
        every: usize,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            arch,
            threading,
            max_cycles,
            registers,
            memory,
            json,
            no_color,
        } => run_to_completion(
            &input, arch, threading, max_cycles, &registers, &memory, json, no_color,
        ),
        Commands::Trace {
            input,
            arch,
            threading,
            max_cycles,
            registers,
            memory,
            every,
            no_color,
        } => trace_cycles(
            &input, arch, threading, max_cycles, &registers, &memory, every, no_color,
        ),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

fn build_simulator(
    input: &PathBuf,
    arch: ArchArg,
    threading: ThreadingArg,
    max_cycles: usize,
    registers: &[String],
    memory: &[String],
) -> Result<TomasuloSimulator, SimulatorError> {
    let arch_mode = match arch {
        ArchArg::Scalar => ArchitectureMode::Scalar,
        ArchArg::Superscalar => ArchitectureMode::Superscalar,
    };
    let threading_mode = match threading {
        ThreadingArg::Imt => ThreadingMode::Imt,
        ThreadingArg::Bmt => ThreadingMode::Bmt,
        ThreadingArg::Smt => ThreadingMode::Smt,
    };
    let config = SimulatorConfig::new(arch_mode, threading_mode).with_max_cycles(max_cycles);

    let program_text = std::fs::read_to_string(input)?;
    let mut simulator = TomasuloSimulator::new(config);
    simulator.load_program(&program_text);

    for spec in registers {
        let (register, value) = parse_register_preload(spec)?;
        simulator.registers.write(register, value);
    }
    for spec in memory {
        let (address, value) = parse_memory_preload(spec)?;
        simulator.memory.write_word(address, value);
    }

    Ok(simulator)
}

#[allow(clippy::too_many_arguments)]
fn run_to_completion(
    input: &PathBuf,
    arch: ArchArg,
    threading: ThreadingArg,
    max_cycles: usize,
    registers: &[String],
    memory: &[String],
    json: bool,
    no_color: bool,
) -> Result<(), SimulatorError> {
    let mut simulator = build_simulator(input, arch, threading, max_cycles, registers, memory)?;
    let stats = simulator.run();

    let format = if json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let visualization = StateVisualization::new()
        .with_format(format)
        .with_colors(!no_color);
    println!("{}", visualization.render(&simulator));

    if !json {
        println!("{}", stats);
        if !simulator.halted {
            println!("(stopped at the {}-cycle bound before halting)", max_cycles);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn trace_cycles(
    input: &PathBuf,
    arch: ArchArg,
    threading: ThreadingArg,
    max_cycles: usize,
    registers: &[String],
    memory: &[String],
    every: usize,
    no_color: bool,
) -> Result<(), SimulatorError> {
    let mut simulator = build_simulator(input, arch, threading, max_cycles, registers, memory)?;
    let visualization = StateVisualization::new().with_colors(!no_color);

    while !simulator.halted && simulator.cycle < max_cycles {
        let summary = simulator.step();
        for event in &summary.events {
            println!("[C{}] {}", summary.cycle, event);
        }
        if every > 0 && summary.cycle % every == 0 {
            println!("{}", visualization.render(&simulator));
        }
    }

    println!("{}", visualization.render(&simulator));
    println!("{}", simulator.stats());
    Ok(())
}

fn parse_register_preload(spec: &str) -> Result<(usize, i64), SimulatorError> {
    let parse = || {
        let (name, value) = spec.split_once('=')?;
        let name = name.trim();
        let digits = name
            .strip_prefix('R')
            .or_else(|| name.strip_prefix('r'))?;
        let register: usize = digits.parse().ok().filter(|&r| r < 32)?;
        let value: i64 = value.trim().parse().ok()?;
        Some((register, value))
    };
    parse().ok_or_else(|| SimulatorError::InvalidPreload(spec.to_string()))
}

fn parse_memory_preload(spec: &str) -> Result<(i64, i64), SimulatorError> {
    let parse = || {
        let (address, value) = spec.split_once('=')?;
        let address: i64 = address.trim().parse().ok()?;
        let value: i64 = value.trim().parse().ok()?;
        Some((address, value))
    };
    parse().ok_or_else(|| SimulatorError::InvalidPreload(spec.to_string()))
}
