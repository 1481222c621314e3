//! End-to-end assembler tests: encoding round trips, symbol resolution
//! properties and the file-system driver.

use hack_assembler::{AssembleError, assemble, assemble_path, code};
use std::fs;

const DESTS: [&str; 8] = ["", "M", "D", "MD", "A", "AM", "AD", "AMD"];
const JUMPS: [&str; 8] = ["", "JGT", "JEQ", "JGE", "JLT", "JNE", "JLE", "JMP"];
const COMPS: [&str; 34] = [
    "0", "1", "-1", "D", "A", "!D", "!A", "-D", "-A", "D+1", "A+1", "D-1", "A-1", "D+A", "D-A",
    "A-D", "D&A", "D|A", "M", "!M", "-M", "M+1", "M-1", "D+M", "D-M", "M-D", "D&M", "D|M", "A<<",
    "D<<", "M<<", "A>>", "D>>", "M>>",
];

/// Decodes one `.hack` line back to instruction text by searching the
/// encoding tables (labels cannot appear in binary output)
fn disassemble(line: &str) -> String {
    if line.starts_with('0') {
        let address = u16::from_str_radix(line, 2).unwrap();
        return format!("@{address}");
    }

    for comp in COMPS {
        for dest in DESTS {
            for jump in JUMPS {
                if code::encode_c_instruction(dest, comp, jump).unwrap() == line {
                    let mut text = String::new();
                    if !dest.is_empty() {
                        text.push_str(dest);
                        text.push('=');
                    }
                    text.push_str(comp);
                    if !jump.is_empty() {
                        text.push(';');
                        text.push_str(jump);
                    }
                    return text;
                }
            }
        }
    }
    panic!("no decoding for {line}");
}

#[test]
fn assembles_the_add_program() {
    let binary = assemble("@2\nD=A\n@3\nD=D+A\n@0\nM=D\n").unwrap();
    assert_eq!(
        binary,
        "0000000000000010\n\
         1110110000010000\n\
         0000000000000011\n\
         1110000010010000\n\
         0000000000000000\n\
         1110001100001000\n"
    );
}

#[test]
fn assembles_a_loop_with_a_leading_label() {
    let binary = assemble("(LOOP)\n@LOOP\n0;JMP\n").unwrap();
    assert_eq!(binary, "0000000000000000\n1110101010000111\n");
}

#[test]
fn label_free_programs_round_trip() {
    let source = "@2\nD=A\n@SP\nAM=M+1\nD=D<<\n@100\nD;JLE\nM=M-D\nA=D|M;JMP\n";
    let binary = assemble(source).unwrap();

    let mut expected: Vec<String> = Vec::new();
    for line in source.lines() {
        // symbols resolve before encoding; rewrite @SP to its address
        expected.push(if line == "@SP" {
            "@0".to_string()
        } else {
            line.to_string()
        });
    }

    let decoded: Vec<String> = binary.lines().map(disassemble).collect();
    assert_eq!(decoded, expected);
}

#[test]
fn every_comp_dest_jump_combination_is_distinct() {
    let mut seen = std::collections::HashSet::new();
    for comp in COMPS {
        for dest in DESTS {
            for jump in JUMPS {
                let encoded = code::encode_c_instruction(dest, comp, jump).unwrap();
                assert_eq!(encoded.len(), 16);
                assert!(seen.insert(encoded), "collision at {dest}={comp};{jump}");
            }
        }
    }
}

#[test]
fn rom_addresses_count_only_real_instructions() {
    // every label names the encoding of the instruction that follows it
    let source = "@1\n(A1)\n@2\n(A2)\n(A3)\nD=A\n@A1\n@A2\n@A3\n";
    let binary = assemble(source).unwrap();
    let lines: Vec<&str> = binary.lines().collect();

    assert_eq!(lines[3], code::encode_a_instruction(1)); // @A1
    assert_eq!(lines[4], code::encode_a_instruction(2)); // @A2
    assert_eq!(lines[5], code::encode_a_instruction(2)); // @A3
}

#[test]
fn kth_new_variable_lands_at_16_plus_k() {
    let source = "@x\n@R5\n@y\n(SKIP)\n@SKIP\n@x\n@z\n";
    let binary = assemble(source).unwrap();
    let lines: Vec<&str> = binary.lines().collect();

    assert_eq!(lines[0], code::encode_a_instruction(16)); // x
    assert_eq!(lines[1], code::encode_a_instruction(5)); // predefined R5
    assert_eq!(lines[2], code::encode_a_instruction(17)); // y
    assert_eq!(lines[3], code::encode_a_instruction(3)); // label SKIP
    assert_eq!(lines[4], code::encode_a_instruction(16)); // x again
    assert_eq!(lines[5], code::encode_a_instruction(18)); // z
}

#[test]
fn malformed_sources_abort() {
    assert!(matches!(
        assemble("(X)\nD=A\n(X)\n").unwrap_err(),
        AssembleError::DuplicateLabel { .. }
    ));
    assert!(matches!(
        assemble("D=W\n").unwrap_err(),
        AssembleError::Encoding { .. }
    ));
    assert!(matches!(
        assemble("@99999\n").unwrap_err(),
        AssembleError::AddressOutOfRange { .. }
    ));
}

#[test]
fn driver_assembles_a_directory_in_sorted_order() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("b.asm"), "@1\n").unwrap();
    fs::write(dir.path().join("a.asm"), "@2\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "not assembly\n").unwrap();

    let outputs = assemble_path(dir.path()).unwrap();
    assert_eq!(outputs.len(), 2);
    assert!(outputs[0].ends_with("a.hack"));
    assert!(outputs[1].ends_with("b.hack"));

    assert_eq!(
        fs::read_to_string(dir.path().join("a.hack")).unwrap(),
        "0000000000000010\n"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("b.hack")).unwrap(),
        "0000000000000001\n"
    );
}

#[test]
fn driver_accepts_case_insensitive_extension_and_skips_others() {
    let dir = tempfile::tempdir().unwrap();
    let upper = dir.path().join("Upper.ASM");
    fs::write(&upper, "@7\n").unwrap();
    let other = dir.path().join("skip.vm");
    fs::write(&other, "push constant 1\n").unwrap();

    assert_eq!(assemble_path(&upper).unwrap().len(), 1);
    assert!(assemble_path(&other).unwrap().is_empty());
}
