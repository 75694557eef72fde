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

// instruction.rs
//
// This file contains the instruction model for the Tomasulo simulator.
// It defines the Opcode and Stage enums and the Instruction struct, which
// carries both the parsed fields and the mutable pipeline annotations
// (current stage, assigned slots, per-stage cycle timestamps).

use serde::Serialize;
use std::fmt;

/// Supported operations. Unknown opcodes degrade to `Nop` at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Opcode {
    Add,
    Sub,
    Mul,
    Div,
    Lw,
    Sw,
    Beq,
    Nop,
}

impl Opcode {
    pub fn is_memory(&self) -> bool {
        matches!(self, Opcode::Lw | Opcode::Sw)
    }

    pub fn is_arithmetic(&self) -> bool {
        matches!(self, Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div)
    }

    pub fn is_branch(&self) -> bool {
        matches!(self, Opcode::Beq)
    }

    /// Evaluate an arithmetic opcode with signed integer semantics.
    /// Division is floor division; a zero divisor yields 0 instead of a trap.
    pub fn evaluate(&self, a: i64, b: i64) -> i64 {
        match self {
            Opcode::Add => a.wrapping_add(b),
            Opcode::Sub => a.wrapping_sub(b),
            Opcode::Mul => a.wrapping_mul(b),
            Opcode::Div => floor_div(a, b),
            // Non-arithmetic opcodes pass the first operand through.
            _ => a,
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Lw => "LW",
            Opcode::Sw => "SW",
            Opcode::Beq => "BEQ",
            Opcode::Nop => "NOP",
        };
        write!(f, "{}", name)
    }
}

fn floor_div(a: i64, b: i64) -> i64 {
    if b == 0 {
        return 0;
    }
    let quotient = a.wrapping_div(b);
    if a.wrapping_rem(b) != 0 && (a < 0) != (b < 0) {
        quotient - 1
    } else {
        quotient
    }
}

/// Lifecycle of an instruction through the pipeline. `Flushed` is terminal:
/// a flushed instruction is never refetched, even when the redirected PC
/// points back at it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    NotFetched,
    Issued,
    Executing,
    WriteBack,
    Committed,
    Flushed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::NotFetched => "NotFetched",
            Stage::Issued => "Issued",
            Stage::Executing => "Executing",
            Stage::WriteBack => "WB",
            Stage::Committed => "Committed",
            Stage::Flushed => "Flushed",
        };
        write!(f, "{}", name)
    }
}

/// A parsed instruction plus its pipeline annotations. The parsed fields
/// (pc, text, op, registers, immediate) are immutable after parsing; the
/// remaining fields track the instruction's progress through the machine.
#[derive(Debug, Clone, Serialize)]
pub struct Instruction {
    pub pc: i64,
    pub text: String,
    /// 1-based position in the program listing.
    pub seq: usize,
    pub op: Opcode,
    pub rd: Option<usize>,
    pub rs: Option<usize>,
    pub rt: Option<usize>,
    /// Immediate operand; for BEQ this is the absolute target PC.
    pub imm: Option<i64>,

    pub stage: Stage,
    pub rob_id: Option<usize>,
    pub rs_id: Option<usize>,
    pub lsb_id: Option<usize>,
    pub speculative: bool,
    pub issue_cycle: Option<usize>,
    pub exec_end_cycle: Option<usize>,
    pub wb_cycle: Option<usize>,
    pub commit_cycle: Option<usize>,
}

impl Instruction {
    pub fn new(pc: i64, seq: usize, text: &str) -> Self {
        Self {
            pc,
            text: text.to_string(),
            seq,
            op: Opcode::Nop,
            rd: None,
            rs: None,
            rt: None,
            imm: None,
            stage: Stage::NotFetched,
            rob_id: None,
            rs_id: None,
            lsb_id: None,
            speculative: false,
            issue_cycle: None,
            exec_end_cycle: None,
            wb_cycle: None,
            commit_cycle: None,
        }
    }

    /// Clear every pipeline annotation, returning the instruction to its
    /// just-after-parse state.
    pub fn reset_annotations(&mut self) {
        self.stage = Stage::NotFetched;
        self.rob_id = None;
        self.rs_id = None;
        self.lsb_id = None;
        self.speculative = false;
        self.issue_cycle = None;
        self.exec_end_cycle = None;
        self.wb_cycle = None;
        self.commit_cycle = None;
    }

    /// Destination register written at commit: rd for arithmetic, rt for LW.
    pub fn destination(&self) -> Option<usize> {
        match self.op {
            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div => self.rd,
            Opcode::Lw => self.rt,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_is_floor_and_absorbs_zero() {
        assert_eq!(Opcode::Div.evaluate(7, 2), 3);
        assert_eq!(Opcode::Div.evaluate(-7, 2), -4);
        assert_eq!(Opcode::Div.evaluate(7, -2), -4);
        assert_eq!(Opcode::Div.evaluate(-7, -2), 3);
        assert_eq!(Opcode::Div.evaluate(42, 0), 0);
    }

    #[test]
    fn arithmetic_wraps_instead_of_panicking() {
        assert_eq!(Opcode::Add.evaluate(i64::MAX, 1), i64::MIN);
        assert_eq!(Opcode::Sub.evaluate(i64::MIN, 1), i64::MAX);
    }
}
