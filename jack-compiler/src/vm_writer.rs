//! Emission of VM commands
//!
//! A thin typed layer over the output stream; the compilation engine never
//! formats VM text itself.

use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl Segment {
    fn name(self) -> &'static str {
        match self {
            Self::Constant => "constant",
            Self::Argument => "argument",
            Self::Local => "local",
            Self::Static => "static",
            Self::This => "this",
            Self::That => "that",
            Self::Pointer => "pointer",
            Self::Temp => "temp",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VmOp {
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

impl VmOp {
    fn name(self) -> &'static str {
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

pub struct VmWriter<W: Write> {
    writer: W,
}

impl<W: Write> VmWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn push(&mut self, segment: Segment, index: u16) -> io::Result<()> {
        writeln!(self.writer, "push {} {index}", segment.name())
    }

    pub fn pop(&mut self, segment: Segment, index: u16) -> io::Result<()> {
        writeln!(self.writer, "pop {} {index}", segment.name())
    }

    pub fn arithmetic(&mut self, op: VmOp) -> io::Result<()> {
        writeln!(self.writer, "{}", op.name())
    }

    pub fn label(&mut self, label: &str) -> io::Result<()> {
        writeln!(self.writer, "label {label}")
    }

    pub fn goto(&mut self, label: &str) -> io::Result<()> {
        writeln!(self.writer, "goto {label}")
    }

    pub fn if_goto(&mut self, label: &str) -> io::Result<()> {
        writeln!(self.writer, "if-goto {label}")
    }

    pub fn call(&mut self, name: &str, args: u16) -> io::Result<()> {
        writeln!(self.writer, "call {name} {args}")
    }

    pub fn function(&mut self, name: &str, locals: u16) -> io::Result<()> {
        writeln!(self.writer, "function {name} {locals}")
    }

    pub fn ret(&mut self) -> io::Result<()> {
        writeln!(self.writer, "return")
    }

    /// Flushes and hands back the underlying writer
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_print_in_vm_syntax() {
        let mut writer = VmWriter::new(Vec::new());
        writer.push(Segment::Constant, 7).unwrap();
        writer.pop(Segment::This, 2).unwrap();
        writer.arithmetic(VmOp::Add).unwrap();
        writer.arithmetic(VmOp::ShiftLeft).unwrap();
        writer.label("WHILE0").unwrap();
        writer.if_goto("WHILE_END0").unwrap();
        writer.goto("WHILE0").unwrap();
        writer.call("Math.multiply", 2).unwrap();
        writer.function("Foo.bar", 3).unwrap();
        writer.ret().unwrap();

        let text = String::from_utf8(writer.finish().unwrap()).unwrap();
        assert_eq!(
            text,
            "push constant 7\n\
             pop this 2\n\
             add\n\
             shiftleft\n\
             label WHILE0\n\
             if-goto WHILE_END0\n\
             goto WHILE0\n\
             call Math.multiply 2\n\
             function Foo.bar 3\n\
             return\n"
        );
    }
}
