//! Jack-to-VM compiler
//!
//! Compiles Jack classes into stack-VM command files, one `.vm` per `.jack`
//! source. The pipeline is a single pass: the tokenizer scans the whole
//! input, the compilation engine parses it by recursive descent and emits VM
//! commands as it parses.
//!
//! # Architecture
//!
//! - [`tokenizer`]: comment-stripping scanner, keywords through a `phf` map
//! - [`symbol_table`]: class and subroutine scopes with per-kind indices
//! - [`vm_writer`]: typed VM command emission
//! - [`engine`]: grammar rules and code generation in one walk
//!
//! # Example
//!
//! ```
//! let vm = jack_compiler::compile(
//!     "class Main { function int f() { return 1 + 2; } }",
//! )
//! .unwrap();
//! assert!(vm.starts_with("function Main.f 0\n"));
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

pub mod engine;
pub mod symbol_table;
pub mod tokenizer;
pub mod vm_writer;

pub use engine::{CompilationEngine, CompileError};
pub use symbol_table::{SymbolEntry, SymbolTable, VarKind};
pub use tokenizer::{Keyword, LexError, Token, TokenKind};
pub use vm_writer::{Segment, VmOp, VmWriter};

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const SOURCE_EXTENSION: &str = "jack";
const OUTPUT_EXTENSION: &str = "vm";

#[derive(Debug)]
pub enum JackError {
    Io(io::Error),
    Lex(LexError),
    Compile(CompileError),
}

impl std::error::Error for JackError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Lex(e) => Some(e),
            Self::Compile(e) => Some(e),
        }
    }
}

impl fmt::Display for JackError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Lex(e) => write!(f, "{e}"),
            Self::Compile(e) => write!(f, "{e}"),
        }
    }
}

impl From<io::Error> for JackError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

impl From<LexError> for JackError {
    fn from(error: LexError) -> Self {
        Self::Lex(error)
    }
}

impl From<CompileError> for JackError {
    fn from(error: CompileError) -> Self {
        Self::Compile(error)
    }
}

/// Compiles one Jack class source into VM command text
pub fn compile(source: &str) -> Result<String, JackError> {
    let tokens = tokenizer::tokenize(source)?;
    let mut engine = CompilationEngine::new(tokens, Vec::new());
    engine.compile_class()?;
    let bytes = engine.finish().map_err(CompileError::Io)?;
    Ok(String::from_utf8(bytes).expect("emitted VM text is UTF-8"))
}

/// Compiles a single file, writing `<stem>.vm` next to it
pub fn compile_file(input: &Path) -> Result<PathBuf, JackError> {
    let source = fs::read_to_string(input)?;
    let vm = compile(&source)?;
    let output = input.with_extension(OUTPUT_EXTENSION);
    fs::write(&output, vm)?;
    Ok(output)
}

/// Compiles a `.jack` file or every `.jack` file in a directory
///
/// Extension matching is case-insensitive; non-matching files are skipped.
pub fn compile_path(path: &Path) -> Result<Vec<PathBuf>, JackError> {
    let mut outputs = Vec::new();

    if path.is_dir() {
        let mut inputs = Vec::new();
        for entry in fs::read_dir(path)? {
            let candidate = entry?.path();
            if candidate.is_file() && extension_matches(&candidate, SOURCE_EXTENSION) {
                inputs.push(candidate);
            }
        }
        inputs.sort();
        for input in inputs {
            outputs.push(compile_file(&input)?);
        }
    } else if extension_matches(path, SOURCE_EXTENSION) {
        outputs.push(compile_file(path)?);
    }

    Ok(outputs)
}

fn extension_matches(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
