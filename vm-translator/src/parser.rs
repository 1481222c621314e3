//! Parsing of VM commands
//!
//! Each line becomes a [`VmCommand`] tagged variant so that translation can
//! match exhaustively; segment and index validation happens here, not in the
//! code writer.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Local,
    Argument,
    This,
    That,
    Pointer,
    Static,
    Temp,
}

impl Segment {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "constant" => Some(Self::Constant),
            "local" => Some(Self::Local),
            "argument" => Some(Self::Argument),
            "this" => Some(Self::This),
            "that" => Some(Self::That),
            "pointer" => Some(Self::Pointer),
            "static" => Some(Self::Static),
            "temp" => Some(Self::Temp),
            _ => None,
        }
    }

    /// Base register symbol of an indirect segment
    pub(crate) fn base_symbol(self) -> Option<&'static str> {
        match self {
            Self::Local => Some("LCL"),
            Self::Argument => Some("ARG"),
            Self::This => Some("THIS"),
            Self::That => Some("THAT"),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Local => "local",
            Self::Argument => "argument",
            Self::This => "this",
            Self::That => "that",
            Self::Pointer => "pointer",
            Self::Static => "static",
            Self::Temp => "temp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticOp {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
    ShiftLeft,
    ShiftRight,
}

impl ArithmeticOp {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "add" => Some(Self::Add),
            "sub" => Some(Self::Sub),
            "neg" => Some(Self::Neg),
            "eq" => Some(Self::Eq),
            "gt" => Some(Self::Gt),
            "lt" => Some(Self::Lt),
            "and" => Some(Self::And),
            "or" => Some(Self::Or),
            "not" => Some(Self::Not),
            "shiftleft" => Some(Self::ShiftLeft),
            "shiftright" => Some(Self::ShiftRight),
            _ => None,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Neg => "neg",
            Self::Eq => "eq",
            Self::Gt => "gt",
            Self::Lt => "lt",
            Self::And => "and",
            Self::Or => "or",
            Self::Not => "not",
            Self::ShiftLeft => "shiftleft",
            Self::ShiftRight => "shiftright",
        }
    }
}

/// One VM command in canonical form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmCommand {
    Arithmetic(ArithmeticOp),
    Push { segment: Segment, index: i16 },
    Pop { segment: Segment, index: i16 },
    Label(String),
    Goto(String),
    IfGoto(String),
    Function { name: String, locals: u16 },
    Call { name: String, args: u16 },
    Return,
}

impl fmt::Display for VmCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Arithmetic(op) => f.write_str(op.name()),
            Self::Push { segment, index } => write!(f, "push {} {index}", segment.name()),
            Self::Pop { segment, index } => write!(f, "pop {} {index}", segment.name()),
            Self::Label(label) => write!(f, "label {label}"),
            Self::Goto(label) => write!(f, "goto {label}"),
            Self::IfGoto(label) => write!(f, "if-goto {label}"),
            Self::Function { name, locals } => write!(f, "function {name} {locals}"),
            Self::Call { name, args } => write!(f, "call {name} {args}"),
            Self::Return => f.write_str("return"),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ParseError {
    UnknownCommand { line: usize, text: String },
    UnknownSegment { line: usize, text: String },
    MissingArgument { line: usize, command: String },
    InvalidIndex { line: usize, text: String },
    PopFromConstant { line: usize },
}

impl std::error::Error for ParseError {}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnknownCommand { line, text } => {
                write!(f, "line {line}: unknown command: {text}")
            }
            Self::UnknownSegment { line, text } => {
                write!(f, "line {line}: unknown segment: {text}")
            }
            Self::MissingArgument { line, command } => {
                write!(f, "line {line}: missing argument for {command}")
            }
            Self::InvalidIndex { line, text } => {
                write!(f, "line {line}: invalid index: {text}")
            }
            Self::PopFromConstant { line } => {
                write!(f, "line {line}: cannot pop to the constant segment")
            }
        }
    }
}

/// Parses a whole `.vm` source into commands, skipping comments and blanks
pub fn parse_source(source: &str) -> Result<Vec<VmCommand>, ParseError> {
    let mut commands = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let code = raw.find("//").map_or(raw, |pos| &raw[..pos]).trim();
        if code.is_empty() {
            continue;
        }
        commands.push(parse_line(code, line)?);
    }
    Ok(commands)
}

fn parse_line(code: &str, line: usize) -> Result<VmCommand, ParseError> {
    let mut parts = code.split_whitespace();
    let head = parts.next().expect("caller skips blank lines");

    if let Some(op) = ArithmeticOp::parse(head) {
        return Ok(VmCommand::Arithmetic(op));
    }

    match head {
        "push" | "pop" => {
            let segment_text = expect_arg(&mut parts, head, line)?;
            let segment = Segment::parse(segment_text).ok_or_else(|| ParseError::UnknownSegment {
                line,
                text: segment_text.to_string(),
            })?;
            let index = parse_index(expect_arg(&mut parts, head, line)?, segment, line)?;
            if head == "push" {
                Ok(VmCommand::Push { segment, index })
            } else if segment == Segment::Constant {
                Err(ParseError::PopFromConstant { line })
            } else {
                Ok(VmCommand::Pop { segment, index })
            }
        }
        "label" => Ok(VmCommand::Label(expect_arg(&mut parts, head, line)?.to_string())),
        "goto" => Ok(VmCommand::Goto(expect_arg(&mut parts, head, line)?.to_string())),
        "if-goto" => Ok(VmCommand::IfGoto(
            expect_arg(&mut parts, head, line)?.to_string(),
        )),
        "function" | "call" => {
            let name = expect_arg(&mut parts, head, line)?.to_string();
            let count_text = expect_arg(&mut parts, head, line)?;
            let count = count_text
                .parse::<u16>()
                .map_err(|_| ParseError::InvalidIndex {
                    line,
                    text: count_text.to_string(),
                })?;
            if head == "function" {
                Ok(VmCommand::Function { name, locals: count })
            } else {
                Ok(VmCommand::Call { name, args: count })
            }
        }
        "return" => Ok(VmCommand::Return),
        _ => Err(ParseError::UnknownCommand {
            line,
            text: head.to_string(),
        }),
    }
}

fn expect_arg<'a>(
    parts: &mut impl Iterator<Item = &'a str>,
    command: &str,
    line: usize,
) -> Result<&'a str, ParseError> {
    parts.next().ok_or_else(|| ParseError::MissingArgument {
        line,
        command: command.to_string(),
    })
}

/// Validates the index against the segment it addresses
///
/// `constant` accepts the full signed 16-bit range; `temp` spans RAM[5..=12]
/// and `pointer` selects THIS or THAT; everything else must be non-negative.
fn parse_index(text: &str, segment: Segment, line: usize) -> Result<i16, ParseError> {
    let invalid = || ParseError::InvalidIndex {
        line,
        text: text.to_string(),
    };
    let index = text.parse::<i16>().map_err(|_| invalid())?;

    let valid = match segment {
        Segment::Constant => true,
        Segment::Temp => (0..=7).contains(&index),
        Segment::Pointer => index == 0 || index == 1,
        _ => index >= 0,
    };
    if valid { Ok(index) } else { Err(invalid()) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arithmetic_commands() {
        let commands = parse_source("add\nsub\nneg\neq\ngt\nlt\nand\nor\nnot\n").unwrap();
        assert_eq!(commands.len(), 9);
        assert_eq!(commands[0], VmCommand::Arithmetic(ArithmeticOp::Add));
        assert_eq!(commands[8], VmCommand::Arithmetic(ArithmeticOp::Not));
    }

    #[test]
    fn parses_shift_commands() {
        let commands = parse_source("shiftleft\nshiftright\n").unwrap();
        assert_eq!(commands[0], VmCommand::Arithmetic(ArithmeticOp::ShiftLeft));
        assert_eq!(commands[1], VmCommand::Arithmetic(ArithmeticOp::ShiftRight));
    }

    #[test]
    fn parses_push_and_pop() {
        let commands = parse_source("push constant 7\npop local 3\npush static 0\n").unwrap();
        assert_eq!(
            commands[0],
            VmCommand::Push {
                segment: Segment::Constant,
                index: 7
            }
        );
        assert_eq!(
            commands[1],
            VmCommand::Pop {
                segment: Segment::Local,
                index: 3
            }
        );
        assert_eq!(
            commands[2],
            VmCommand::Push {
                segment: Segment::Static,
                index: 0
            }
        );
    }

    #[test]
    fn negative_constant_is_accepted() {
        let commands = parse_source("push constant -1\n").unwrap();
        assert_eq!(
            commands[0],
            VmCommand::Push {
                segment: Segment::Constant,
                index: -1
            }
        );
    }

    #[test]
    fn negative_index_is_rejected_outside_constant() {
        assert!(matches!(
            parse_source("push local -1\n").unwrap_err(),
            ParseError::InvalidIndex { line: 1, .. }
        ));
    }

    #[test]
    fn temp_and_pointer_ranges_are_enforced() {
        assert!(parse_source("push temp 7\n").is_ok());
        assert!(parse_source("push temp 8\n").is_err());
        assert!(parse_source("push pointer 1\n").is_ok());
        assert!(parse_source("push pointer 2\n").is_err());
    }

    #[test]
    fn pop_constant_is_rejected() {
        assert_eq!(
            parse_source("pop constant 1\n").unwrap_err(),
            ParseError::PopFromConstant { line: 1 }
        );
    }

    #[test]
    fn parses_branching_and_functions() {
        let source = "label LOOP\ngoto LOOP\nif-goto END\nfunction Foo.bar 2\ncall Foo.bar 0\nreturn\n";
        let commands = parse_source(source).unwrap();
        assert_eq!(commands[0], VmCommand::Label("LOOP".to_string()));
        assert_eq!(commands[1], VmCommand::Goto("LOOP".to_string()));
        assert_eq!(commands[2], VmCommand::IfGoto("END".to_string()));
        assert_eq!(
            commands[3],
            VmCommand::Function {
                name: "Foo.bar".to_string(),
                locals: 2
            }
        );
        assert_eq!(
            commands[4],
            VmCommand::Call {
                name: "Foo.bar".to_string(),
                args: 0
            }
        );
        assert_eq!(commands[5], VmCommand::Return);
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let source = "// header\n\n  push constant 1  // inline\n\n";
        assert_eq!(parse_source(source).unwrap().len(), 1);
    }

    #[test]
    fn unknown_command_reports_its_line() {
        assert_eq!(
            parse_source("add\nfrobnicate\n").unwrap_err(),
            ParseError::UnknownCommand {
                line: 2,
                text: "frobnicate".to_string()
            }
        );
    }

    #[test]
    fn display_reprints_canonical_text() {
        let source = "push argument 2\nif-goto END\nfunction F 1\nshiftleft\n";
        let reprinted: Vec<String> = parse_source(source)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            reprinted,
            vec!["push argument 2", "if-goto END", "function F 1", "shiftleft"]
        );
    }
}
