//! Parser module for Hack assembly language
//!
//! Provides mostly zero-copy parsing: a line is only reallocated when it
//! carries whitespace inside the instruction (`D = M ; JMP`), which is rare.

use std::borrow::Cow;
use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum InstructionKind {
    /// @Xxx where Xxx is either a symbol or a decimal number
    AInstruction,
    /// dest=comp;jump
    CInstruction,
    /// (Xxx) where Xxx is a symbol; occupies no ROM address
    Label,
}

#[derive(Debug)]
pub enum ParserError {
    InvalidAccess(&'static str),
    MalformedLabel(String),
}

impl std::error::Error for ParserError {}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidAccess(msg) => write!(f, "invalid access: {msg}"),
            Self::MalformedLabel(label) => write!(f, "malformed label definition: {label}"),
        }
    }
}

/// Streaming cursor over the instructions of one `.asm` source
///
/// Comments and blank lines are skipped by [`Parser::advance`]; the field
/// accessors slice the current cleaned line.
pub struct Parser<'a> {
    lines: std::iter::Enumerate<std::str::Lines<'a>>,
    current: Cow<'a, str>,
    line_number: usize,
    kind: Option<InstructionKind>,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().enumerate(),
            current: Cow::Borrowed(""),
            line_number: 0,
            kind: None,
        }
    }

    /// Advances to the next instruction, skipping comments and blank lines
    ///
    /// Returns `false` once the input is exhausted.
    pub fn advance(&mut self) -> bool {
        for (index, line) in self.lines.by_ref() {
            let cleaned = clean_line(line);
            if cleaned.is_empty() {
                continue;
            }

            self.kind = Some(classify(&cleaned));
            self.current = cleaned;
            self.line_number = index + 1;
            return true;
        }

        self.kind = None;
        false
    }

    /// 1-based source line of the current instruction
    #[inline]
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    #[inline]
    pub fn kind(&self) -> Result<InstructionKind, ParserError> {
        self.kind
            .ok_or(ParserError::InvalidAccess("no current instruction"))
    }

    /// Returns the symbol of an A-instruction or a label definition
    pub fn symbol(&self) -> Result<&str, ParserError> {
        match self.kind {
            Some(InstructionKind::AInstruction) => Ok(&self.current[1..]),
            Some(InstructionKind::Label) => {
                let inner = self.current[1..]
                    .strip_suffix(')')
                    .ok_or_else(|| ParserError::MalformedLabel(self.current.to_string()))?;
                if inner.is_empty() {
                    return Err(ParserError::MalformedLabel(self.current.to_string()));
                }
                Ok(inner)
            }
            Some(InstructionKind::CInstruction) => {
                Err(ParserError::InvalidAccess("symbol() on a C-instruction"))
            }
            None => Err(ParserError::InvalidAccess("no current instruction")),
        }
    }

    /// Returns the dest field of a C-instruction, `""` when absent
    pub fn dest(&self) -> Result<&str, ParserError> {
        let line = self.c_instruction()?;
        Ok(line.find('=').map_or("", |pos| &line[..pos]))
    }

    /// Returns the comp field of a C-instruction
    pub fn comp(&self) -> Result<&str, ParserError> {
        let line = self.c_instruction()?;
        let start = line.find('=').map_or(0, |pos| pos + 1);
        let end = line.find(';').unwrap_or(line.len());
        Ok(&line[start..end])
    }

    /// Returns the jump field of a C-instruction, `""` when absent
    pub fn jump(&self) -> Result<&str, ParserError> {
        let line = self.c_instruction()?;
        Ok(line.find(';').map_or("", |pos| &line[pos + 1..]))
    }

    fn c_instruction(&self) -> Result<&str, ParserError> {
        match self.kind {
            Some(InstructionKind::CInstruction) => Ok(&self.current),
            Some(_) => Err(ParserError::InvalidAccess(
                "field accessor on a non-C-instruction",
            )),
            None => Err(ParserError::InvalidAccess("no current instruction")),
        }
    }
}

/// Strips the `//` comment and all whitespace from a line
///
/// Stays borrowed unless whitespace is embedded inside the instruction.
fn clean_line(line: &str) -> Cow<'_, str> {
    let code = line.find("//").map_or(line, |pos| &line[..pos]);
    let trimmed = code.trim();

    if trimmed.bytes().any(|b| b.is_ascii_whitespace()) {
        Cow::Owned(trimmed.chars().filter(|c| !c.is_whitespace()).collect())
    } else {
        Cow::Borrowed(trimmed)
    }
}

fn classify(line: &str) -> InstructionKind {
    match line.as_bytes()[0] {
        b'@' => InstructionKind::AInstruction,
        b'(' => InstructionKind::Label,
        _ => InstructionKind::CInstruction,
    }
}
