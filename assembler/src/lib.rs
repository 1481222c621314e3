//! Two-pass assembler for the Hack assembly language
//!
//! Translates symbolic Hack assembly into 16-bit binary machine code, one
//! `0`/`1` string per line.
//!
//! # Architecture
//!
//! - [`parser`]: mostly zero-copy instruction classification and field access
//! - [`code`]: binary encoding through `phf` perfect-hash tables, including
//!   the `101`-prefixed shift extension (`D<<`, `M>>`, ...)
//! - [`symbol_table`]: predefined symbols, labels and variable allocation
//!
//! The first pass records each `(LABEL)` at the running ROM address; the
//! second pass encodes instructions and allocates variables from RAM[16]
//! upward. All failures are fatal: duplicate labels, unknown mnemonics and
//! out-of-range address literals abort the assembly.
//!
//! # Example
//!
//! ```
//! let binary = hack_assembler::assemble("@2\nD=A\n@3\nD=D+A\n@0\nM=D\n").unwrap();
//! assert_eq!(binary.lines().next(), Some("0000000000000010"));
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

pub mod code;
pub mod parser;
pub mod symbol_table;

pub use code::EncodingError;
pub use parser::{InstructionKind, Parser, ParserError};
pub use symbol_table::{SymbolError, SymbolTable};

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Largest value an A-instruction can carry (15-bit address field)
const MAX_A_VALUE: u16 = 32767;

/// Input extension accepted by the driver (matched case-insensitively)
const SOURCE_EXTENSION: &str = "asm";
const OUTPUT_EXTENSION: &str = "hack";

#[derive(Debug)]
pub enum AssembleError {
    Io(io::Error),
    Parser(ParserError),
    DuplicateLabel { line: usize, name: String },
    AddressOutOfRange { line: usize, literal: String },
    Encoding { line: usize, source: EncodingError },
}

impl std::error::Error for AssembleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parser(e) => Some(e),
            Self::Encoding { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Parser(e) => write!(f, "{e}"),
            Self::DuplicateLabel { line, name } => {
                write!(f, "line {line}: duplicate label: {name}")
            }
            Self::AddressOutOfRange { line, literal } => {
                write!(f, "line {line}: address literal out of range: @{literal}")
            }
            Self::Encoding { line, source } => write!(f, "line {line}: {source}"),
        }
    }
}

impl From<io::Error> for AssembleError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<ParserError> for AssembleError {
    fn from(error: ParserError) -> Self {
        Self::Parser(error)
    }
}

/// Assembles one `.asm` source into `.hack` binary text
///
/// The returned string holds one 16-character binary line per instruction,
/// each terminated by `\n`.
pub fn assemble(source: &str) -> Result<String, AssembleError> {
    let mut symbols = SymbolTable::new();
    first_pass(source, &mut symbols)?;
    second_pass(source, &mut symbols)
}

/// First pass: define every `(LABEL)` at its ROM address
///
/// The running ROM address increments for A- and C-instructions only; a
/// label definition occupies no address and names the next instruction.
fn first_pass(source: &str, symbols: &mut SymbolTable) -> Result<(), AssembleError> {
    let mut rom_address = 0u16;
    let mut parser = Parser::new(source);

    while parser.advance() {
        match parser.kind()? {
            InstructionKind::Label => {
                let name = parser.symbol()?;
                symbols
                    .define_label(name, rom_address)
                    .map_err(|SymbolError::DuplicateLabel(name)| AssembleError::DuplicateLabel {
                        line: parser.line_number(),
                        name,
                    })?;
            }
            InstructionKind::AInstruction | InstructionKind::CInstruction => {
                rom_address += 1;
            }
        }
    }

    Ok(())
}

/// Second pass: encode instructions, allocating variables on first use
fn second_pass(source: &str, symbols: &mut SymbolTable) -> Result<String, AssembleError> {
    let mut output = String::new();
    let mut parser = Parser::new(source);

    while parser.advance() {
        match parser.kind()? {
            InstructionKind::AInstruction => {
                let symbol = parser.symbol()?;
                let address = resolve_a_value(symbol, symbols, parser.line_number())?;
                output.push_str(&code::encode_a_instruction(address));
                output.push('\n');
            }
            InstructionKind::CInstruction => {
                let encoded =
                    code::encode_c_instruction(parser.dest()?, parser.comp()?, parser.jump()?)
                        .map_err(|source| AssembleError::Encoding {
                            line: parser.line_number(),
                            source,
                        })?;
                output.push_str(&encoded);
                output.push('\n');
            }
            InstructionKind::Label => {}
        }
    }

    Ok(output)
}

/// Resolves the value of `@X`: decimal literal, known symbol, or new variable
fn resolve_a_value(
    symbol: &str,
    symbols: &mut SymbolTable,
    line: usize,
) -> Result<u16, AssembleError> {
    if symbol.as_bytes().first().is_some_and(u8::is_ascii_digit) {
        return match symbol.parse::<u16>() {
            Ok(value) if value <= MAX_A_VALUE => Ok(value),
            _ => Err(AssembleError::AddressOutOfRange {
                line,
                literal: symbol.to_string(),
            }),
        };
    }
    Ok(symbols.resolve_or_allocate(symbol))
}

/// Assembles a single file, writing `<input-without-ext>.hack` next to it
pub fn assemble_file(input: &Path) -> Result<PathBuf, AssembleError> {
    let source = fs::read_to_string(input)?;
    let binary = assemble(&source)?;
    let output = input.with_extension(OUTPUT_EXTENSION);
    fs::write(&output, binary)?;
    Ok(output)
}

/// Assembles a file or every `.asm` file in a directory (sorted order)
///
/// Files whose extension does not match (case-insensitively) are skipped;
/// the returned list names the files written.
pub fn assemble_path(path: &Path) -> Result<Vec<PathBuf>, AssembleError> {
    let mut outputs = Vec::new();
    for input in source_files(path, SOURCE_EXTENSION)? {
        outputs.push(assemble_file(&input)?);
    }
    Ok(outputs)
}

/// Expands a path argument into the matching source files
///
/// Shared driver convention: a directory yields its matching entries in
/// sorted order, a single file yields itself only if the extension matches.
pub fn source_files(path: &Path, extension: &str) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if path.is_dir() {
        for entry in fs::read_dir(path)? {
            let candidate = entry?.path();
            if candidate.is_file() && extension_matches(&candidate, extension) {
                files.push(candidate);
            }
        }
        files.sort();
    } else if extension_matches(path, extension) {
        files.push(path.to_path_buf());
    }

    Ok(files)
}

fn extension_matches(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembles_add_program() {
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
    fn label_resolves_to_rom_address_zero() {
        let binary = assemble("(LOOP)\n@LOOP\n0;JMP\n").unwrap();
        assert_eq!(binary, "0000000000000000\n1110101010000111\n");
    }

    #[test]
    fn label_addresses_skip_label_lines() {
        // (END) names ROM address 2: two real instructions precede it
        let binary = assemble("@0\nD=M\n(END)\n@END\n0;JMP\n").unwrap();
        let lines: Vec<&str> = binary.lines().collect();
        assert_eq!(lines[2], &code::encode_a_instruction(2));
    }

    #[test]
    fn variables_allocate_in_first_appearance_order() {
        let binary = assemble("@first\n@second\n@first\n@third\n").unwrap();
        assert_eq!(
            binary,
            "0000000000010000\n\
             0000000000010001\n\
             0000000000010000\n\
             0000000000010010\n"
        );
    }

    #[test]
    fn label_reference_is_not_a_variable() {
        // forward reference to a label must resolve to its ROM address
        let binary = assemble("@END\n0;JMP\n(END)\n@var\n").unwrap();
        let lines: Vec<&str> = binary.lines().collect();
        assert_eq!(lines[0], code::encode_a_instruction(2));
        assert_eq!(lines[2], code::encode_a_instruction(16));
    }

    #[test]
    fn comments_and_whitespace_are_ignored() {
        let noisy = "// top comment\n\n   @2   // inline\n  D = A \n";
        let clean = "@2\nD=A\n";
        assert_eq!(assemble(noisy).unwrap(), assemble(clean).unwrap());
    }

    #[test]
    fn duplicate_label_is_fatal() {
        let err = assemble("(X)\n@1\n(X)\n").unwrap_err();
        assert!(matches!(err, AssembleError::DuplicateLabel { line: 3, .. }));
    }

    #[test]
    fn unknown_comp_is_fatal() {
        let err = assemble("D=Q+1\n").unwrap_err();
        assert!(matches!(
            err,
            AssembleError::Encoding {
                line: 1,
                source: EncodingError::UnknownComp(_)
            }
        ));
    }

    #[test]
    fn oversized_address_literal_is_fatal() {
        let err = assemble("@32768\n").unwrap_err();
        assert!(matches!(err, AssembleError::AddressOutOfRange { .. }));
        assert!(assemble("@32767\n").is_ok());
    }

    #[test]
    fn shift_instruction_round_trips_through_assemble() {
        let binary = assemble("D=D<<\nM=M>>\n").unwrap();
        assert_eq!(binary, "1010110000010000\n1011000000001000\n");
    }
}
