//! VM-to-Hack translator
//!
//! Translates stack-VM command files into one Hack assembly file. Invoked on
//! a directory it concatenates every `.vm` file (sorted) behind a bootstrap
//! sequence; invoked on a single file it omits the bootstrap.
//!
//! # Architecture
//!
//! - [`parser`]: lines to [`parser::VmCommand`] tagged variants
//! - [`code_writer`]: per-command assembly emission; comparison labels,
//!   return labels and static prefixes are state of the writer
//!
//! # Example
//!
//! ```
//! let asm = hack_vm_translator::translate_to_string(
//!     &[("Main", "push constant 7\npush constant 8\nadd\n")],
//!     false,
//! )
//! .unwrap();
//! assert!(asm.contains("@7"));
//! ```

#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::module_name_repetitions)]

pub mod code_writer;
pub mod parser;

pub use code_writer::CodeWriter;
pub use parser::{ArithmeticOp, ParseError, Segment, VmCommand};

use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

const SOURCE_EXTENSION: &str = "vm";
const OUTPUT_EXTENSION: &str = "asm";

#[derive(Debug)]
pub enum TranslateError {
    Io(io::Error),
    Parse { file: String, source: ParseError },
    /// The path names neither a `.vm` file nor a directory containing any
    NoInput(PathBuf),
}

impl std::error::Error for TranslateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse { source, .. } => Some(source),
            Self::NoInput(_) => None,
        }
    }
}

impl fmt::Display for TranslateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {e}"),
            Self::Parse { file, source } => write!(f, "{file}: {source}"),
            Self::NoInput(path) => write!(f, "no .vm input at {}", path.display()),
        }
    }
}

impl From<io::Error> for TranslateError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

/// Translates one file's commands into the writer under the given scope
pub fn translate_file<W: io::Write>(
    writer: &mut CodeWriter<W>,
    file_stem: &str,
    source: &str,
) -> Result<(), TranslateError> {
    let commands = parser::parse_source(source).map_err(|source| TranslateError::Parse {
        file: file_stem.to_string(),
        source,
    })?;

    writer.set_file_scope(file_stem);
    for command in &commands {
        writer.write_command(command)?;
    }
    Ok(())
}

/// Translates in-memory sources, in order, to one assembly string
///
/// Each entry pairs a file stem (the static-variable scope) with its text.
pub fn translate_to_string(
    files: &[(&str, &str)],
    bootstrap: bool,
) -> Result<String, TranslateError> {
    let mut writer = CodeWriter::new(Vec::new());
    if bootstrap {
        writer.write_bootstrap()?;
    }
    for (stem, source) in files {
        translate_file(&mut writer, stem, source)?;
    }
    let bytes = writer.finish()?;
    Ok(String::from_utf8(bytes).expect("emitted assembly is ASCII"))
}

/// Translates a `.vm` file or a directory of them; returns the output path
///
/// Directory mode writes `<dir>/<basename>.asm` and prepends the bootstrap;
/// file mode writes `<input-without-ext>.asm` without it.
pub fn translate_path(path: &Path) -> Result<PathBuf, TranslateError> {
    let (inputs, output, bootstrap) = plan_translation(path)?;

    let mut writer = CodeWriter::new(BufWriter::new(File::create(&output)?));
    if bootstrap {
        writer.write_bootstrap()?;
    }
    for input in &inputs {
        let source = fs::read_to_string(input)?;
        translate_file(&mut writer, &file_stem(input), &source)?;
    }
    writer.finish()?;
    Ok(output)
}

/// Decides inputs, output name and bootstrap from the path argument
fn plan_translation(path: &Path) -> Result<(Vec<PathBuf>, PathBuf, bool), TranslateError> {
    if path.is_dir() {
        let mut inputs = Vec::new();
        for entry in fs::read_dir(path)? {
            let candidate = entry?.path();
            if candidate.is_file() && extension_matches(&candidate, SOURCE_EXTENSION) {
                inputs.push(candidate);
            }
        }
        inputs.sort();
        if inputs.is_empty() {
            return Err(TranslateError::NoInput(path.to_path_buf()));
        }

        let basename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = path.join(format!("{basename}.{OUTPUT_EXTENSION}"));
        Ok((inputs, output, true))
    } else if extension_matches(path, SOURCE_EXTENSION) {
        let output = path.with_extension(OUTPUT_EXTENSION);
        Ok((vec![path.to_path_buf()], output, false))
    } else {
        Err(TranslateError::NoInput(path.to_path_buf()))
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .or_else(|| path.file_name())
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
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
    fn single_file_mode_has_no_bootstrap() {
        let asm = translate_to_string(&[("Main", "push constant 1\n")], false).unwrap();
        assert!(!asm.contains("Sys.init"));
    }

    #[test]
    fn directory_mode_bootstrap_comes_first() {
        let asm = translate_to_string(&[("Main", "push constant 1\n")], true).unwrap();
        let init = asm.find("@Sys.init").unwrap();
        let body = asm.find("// push constant 1").unwrap();
        assert!(init < body);
        assert!(asm.starts_with("// bootstrap\n@256\nD=A\n@SP\nM=D\n"));
    }

    #[test]
    fn static_scopes_follow_the_file() {
        let asm = translate_to_string(
            &[("A", "pop static 0\n"), ("B", "pop static 0\n")],
            false,
        )
        .unwrap();
        assert!(asm.contains("@A.0"));
        assert!(asm.contains("@B.0"));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let err = translate_to_string(&[("Broken", "push nowhere 0\n")], false).unwrap_err();
        assert!(matches!(err, TranslateError::Parse { file, .. } if file == "Broken"));
    }
}
