// tests/parser_tests.rs
use tomasulo_rust::parse_program;
use tomasulo_rust::tomasulo::instruction::Opcode;

#[test]
fn test_program_gets_sequential_pcs_and_indices() {
    let program = parse_program("ADD R1, R2, R3\nSUB R4, R5, R6\nMUL R7, R8, R9\n");
    assert_eq!(program.len(), 3);
    for (i, instruction) in program.iter().enumerate() {
        assert_eq!(instruction.pc, (i as i64) * 4);
        assert_eq!(instruction.seq, i + 1);
    }
}

#[test]
fn test_comments_and_blank_lines_are_skipped() {
    let text = "\
# a program with commentary

ADD R1, R2, R3
   # indented comment

SUB R4, R5, R6
";
    let program = parse_program(text);
    assert_eq!(program.len(), 2);
    assert_eq!(program[0].op, Opcode::Add);
    assert_eq!(program[1].op, Opcode::Sub);
    assert_eq!(program[1].pc, 4, "skipped lines consume no PC");
}

#[test]
fn test_commas_and_whitespace_are_interchangeable() {
    let with_commas = parse_program("ADD R1, R2, R3\n");
    let without = parse_program("ADD R1 R2 R3\n");
    assert_eq!(with_commas[0].op, Opcode::Add);
    assert_eq!(with_commas[0].rd, without[0].rd);
    assert_eq!(with_commas[0].rs, without[0].rs);
    assert_eq!(with_commas[0].rt, without[0].rt);
}

#[test]
fn test_mnemonics_and_registers_are_case_insensitive() {
    let program = parse_program("add r1, r2, r3\nlw r4, 8(r5)\n");
    assert_eq!(program[0].op, Opcode::Add);
    assert_eq!(program[0].rd, Some(1));
    assert_eq!(program[1].op, Opcode::Lw);
    assert_eq!(program[1].rt, Some(4));
    assert_eq!(program[1].rs, Some(5));
    assert_eq!(program[1].imm, Some(8));
}

#[test]
fn test_load_store_forms() {
    let program = parse_program("LW R1, 0(R3)\nLW R2, 100\nSW R4, -8(R5)\nSW R6, 200\n");

    assert_eq!(program[0].op, Opcode::Lw);
    assert_eq!(program[0].imm, Some(0));
    assert_eq!(program[0].rs, Some(3));

    assert_eq!(program[1].imm, Some(100));
    assert_eq!(program[1].rs, None, "bare immediate form has no base");

    assert_eq!(program[2].op, Opcode::Sw);
    assert_eq!(program[2].imm, Some(-8));
    assert_eq!(program[2].rs, Some(5));

    assert_eq!(program[3].imm, Some(200));
    assert_eq!(program[3].rs, None);
}

#[test]
fn test_beq_target_is_absolute() {
    let program = parse_program("BEQ R1, R2, 20\n");
    assert_eq!(program[0].op, Opcode::Beq);
    assert_eq!(program[0].rs, Some(1));
    assert_eq!(program[0].rt, Some(2));
    assert_eq!(program[0].imm, Some(20));
    assert_eq!(program[0].rd, None);
}

#[test]
fn test_malformed_lines_degrade_to_nop() {
    let cases = [
        "JMP R1, R2",        // unknown opcode
        "ADD R1, R2",        // missing operand
        "ADD R1, R2, R99",   // register out of range
        "LW R1, xyz(R2)",    // bad immediate
        "BEQ R1, R2, later", // non-numeric target
    ];
    for text in cases {
        let program = parse_program(text);
        assert_eq!(
            program[0].op,
            Opcode::Nop,
            "{:?} should degrade to NOP",
            text
        );
        assert_eq!(program[0].text, text, "the original text is preserved");
    }
}

#[test]
fn test_nop_lines_still_occupy_a_pc() {
    let program = parse_program("NOP\nADD R1, R2, R3\n");
    assert_eq!(program[0].op, Opcode::Nop);
    assert_eq!(program[1].pc, 4);
}
