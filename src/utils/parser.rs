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

// parser.rs
//
// This file contains the program-text parser. Lines are instructions, `#`
// introduces a comment, and commas and whitespace are interchangeable
// separators. Parsing never fails: a malformed line or unknown opcode
// degrades to NOP, and the pipeline carries it like any other instruction.

use crate::tomasulo::instruction::{Instruction, Opcode};

/// Parse a whole program. Instructions receive sequential PCs (0, 4, 8, ...)
/// and 1-based sequence indices.
pub fn parse_program(text: &str) -> Vec<Instruction> {
    let mut program = Vec::new();
    let mut pc = 0;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let seq = program.len() + 1;
        program.push(parse_line(pc, seq, line));
        pc += 4;
    }
    program
}

fn parse_line(pc: i64, seq: usize, line: &str) -> Instruction {
    let mut instruction = Instruction::new(pc, seq, line);
    let normalized = line.replace(',', " ");
    let parts: Vec<&str> = normalized.split_whitespace().collect();
    let Some(mnemonic) = parts.first() else {
        return instruction;
    };

    match mnemonic.to_uppercase().as_str() {
        op @ ("ADD" | "SUB" | "MUL" | "DIV") => {
            let fields = (
                parts.get(1).and_then(|s| parse_register(s)),
                parts.get(2).and_then(|s| parse_register(s)),
                parts.get(3).and_then(|s| parse_register(s)),
            );
            if let (Some(rd), Some(rs), Some(rt)) = fields {
                instruction.op = match op {
                    "ADD" => Opcode::Add,
                    "SUB" => Opcode::Sub,
                    "MUL" => Opcode::Mul,
                    _ => Opcode::Div,
                };
                instruction.rd = Some(rd);
                instruction.rs = Some(rs);
                instruction.rt = Some(rt);
            }
        }
        op @ ("LW" | "SW") => {
            let rt = parts.get(1).and_then(|s| parse_register(s));
            let operand = parts.get(2).map(|s| parse_memory_operand(s));
            if let (Some(rt), Some(Some((imm, base)))) = (rt, operand) {
                instruction.op = if op == "LW" { Opcode::Lw } else { Opcode::Sw };
                instruction.rt = Some(rt);
                instruction.imm = Some(imm);
                instruction.rs = base;
            }
        }
        "BEQ" => {
            let fields = (
                parts.get(1).and_then(|s| parse_register(s)),
                parts.get(2).and_then(|s| parse_register(s)),
                parts.get(3).and_then(|s| s.parse::<i64>().ok()),
            );
            if let (Some(rs), Some(rt), Some(target)) = fields {
                instruction.op = Opcode::Beq;
                instruction.rs = Some(rs);
                instruction.rt = Some(rt);
                // The immediate is the absolute target PC, not an offset.
                instruction.imm = Some(target);
            }
        }
        _ => {}
    }
    instruction
}

/// Accepts `R0`..`R31`, case-insensitive.
fn parse_register(token: &str) -> Option<usize> {
    let rest = token.strip_prefix('R').or_else(|| token.strip_prefix('r'))?;
    let number: usize = rest.parse().ok()?;
    if number < 32 {
        Some(number)
    } else {
        None
    }
}

/// Accepts `imm(Rs)` or a bare `imm`. Returns the immediate and the
/// optional base register.
fn parse_memory_operand(token: &str) -> Option<(i64, Option<usize>)> {
    if let Some(open) = token.find('(') {
        let imm: i64 = token[..open].parse().ok()?;
        let base = token[open + 1..].trim_end_matches(')');
        Some((imm, Some(parse_register(base)?)))
    } else {
        let imm: i64 = token.parse().ok()?;
        Some((imm, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_are_case_insensitive_and_bounded() {
        assert_eq!(parse_register("R5"), Some(5));
        assert_eq!(parse_register("r31"), Some(31));
        assert_eq!(parse_register("R32"), None);
        assert_eq!(parse_register("X5"), None);
    }

    #[test]
    fn memory_operands_take_both_forms() {
        assert_eq!(parse_memory_operand("0(R3)"), Some((0, Some(3))));
        assert_eq!(parse_memory_operand("-8(r1)"), Some((-8, Some(1))));
        assert_eq!(parse_memory_operand("100"), Some((100, None)));
        assert_eq!(parse_memory_operand("abc"), None);
    }
}
