//! Translation of VM commands into Hack assembly
//!
//! The writer is generic over `io::Write`; translation state (current file
//! scope, current function, label counters) lives in explicit fields.

use crate::parser::{ArithmeticOp, Segment, VmCommand};
use std::io::{self, Write};

// Writes a fixed sequence of assembly lines.
macro_rules! write_asm {
    ($writer:expr, $($line:literal)*) => {
        $writer.write_all(concat!($($line, "\n"),*).as_bytes())
    };
}

/// RAM base of the `temp` segment
const TEMP_BASE: i16 = 5;
/// Words occupied by a saved call frame
const FRAME_SIZE: u16 = 5;

pub struct CodeWriter<W: Write> {
    writer: W,
    /// Stem of the `.vm` file currently translated; qualifies static symbols
    file_scope: String,
    /// Enclosing `function` command, if any; qualifies flow labels
    function: Option<String>,
    /// Monotonic counter making comparison labels unique
    compare_count: usize,
    /// Monotonic counter making return-address labels unique
    return_count: usize,
}

impl<W: Write> CodeWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            file_scope: String::new(),
            function: None,
            compare_count: 0,
            return_count: 0,
        }
    }

    /// Starts the translation of a new `.vm` file
    ///
    /// Static references in different files must not alias, so the file stem
    /// becomes part of every static symbol.
    pub fn set_file_scope(&mut self, stem: &str) {
        self.file_scope.clear();
        self.file_scope.push_str(stem);
        self.function = None;
    }

    /// Emits `SP = 256` followed by `call Sys.init 0` (directory mode only)
    pub fn write_bootstrap(&mut self) -> io::Result<()> {
        self.set_file_scope("Bootstrap");
        writeln!(self.writer, "// bootstrap")?;
        write_asm!(self.writer,
            "@256"
            "D=A"
            "@SP"
            "M=D"
        )?;
        self.write_call("Sys.init", 0)
    }

    /// Translates one command, preceded by a comment banner naming it
    pub fn write_command(&mut self, command: &VmCommand) -> io::Result<()> {
        writeln!(self.writer, "// {command}")?;
        match command {
            VmCommand::Arithmetic(op) => self.write_arithmetic(*op),
            VmCommand::Push { segment, index } => self.write_push(*segment, *index),
            VmCommand::Pop { segment, index } => self.write_pop(*segment, *index),
            VmCommand::Label(label) => {
                let qualified = self.qualify(label);
                writeln!(self.writer, "({qualified})")
            }
            VmCommand::Goto(label) => {
                let qualified = self.qualify(label);
                writeln!(self.writer, "@{qualified}\n0;JMP")
            }
            VmCommand::IfGoto(label) => {
                let qualified = self.qualify(label);
                self.pop_to_d()?;
                writeln!(self.writer, "@{qualified}\nD;JNE")
            }
            VmCommand::Function { name, locals } => self.write_function(name, *locals),
            VmCommand::Call { name, args } => self.write_call(name, *args),
            VmCommand::Return => self.write_return(),
        }
    }

    /// Flushes and hands back the underlying writer
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn write_arithmetic(&mut self, op: ArithmeticOp) -> io::Result<()> {
        match op {
            ArithmeticOp::Add => self.write_binary_op("D+M"),
            ArithmeticOp::Sub => self.write_binary_op("M-D"),
            ArithmeticOp::And => self.write_binary_op("D&M"),
            ArithmeticOp::Or => self.write_binary_op("D|M"),
            ArithmeticOp::Neg => self.write_unary_op("-M"),
            ArithmeticOp::Not => self.write_unary_op("!M"),
            ArithmeticOp::ShiftLeft => self.write_shift("D<<"),
            ArithmeticOp::ShiftRight => self.write_shift("D>>"),
            ArithmeticOp::Eq => self.write_equality(),
            ArithmeticOp::Lt => self.write_ordering("JLT", false),
            ArithmeticOp::Gt => self.write_ordering("JGT", true),
        }
    }

    /// Pops y, combines with x in place: one net SP decrement
    fn write_binary_op(&mut self, comp: &str) -> io::Result<()> {
        self.pop_to_d()?;
        writeln!(self.writer, "@SP\nA=M-1\nM={comp}")
    }

    fn write_unary_op(&mut self, comp: &str) -> io::Result<()> {
        writeln!(self.writer, "@SP\nA=M-1\nM={comp}")
    }

    /// Shifts the top of the stack in place through the extended ALU
    fn write_shift(&mut self, comp: &str) -> io::Result<()> {
        writeln!(self.writer, "@SP\nA=M-1\nD=M\nD={comp}\nM=D")
    }

    /// `eq`: wrap-around subtraction is zero exactly when x == y
    fn write_equality(&mut self) -> io::Result<()> {
        let n = self.compare_count;
        self.compare_count += 1;

        self.pop_to_d()?;
        writeln!(
            self.writer,
            "@SP\n\
             AM=M-1\n\
             D=M-D\n\
             @CMP_TRUE_{n}\n\
             D;JEQ"
        )?;
        self.write_compare_tail(n)
    }

    /// `lt`/`gt` without 16-bit overflow
    ///
    /// With operands of opposite sign `x - y` may overflow, but then the
    /// sign of x alone decides. Only same-sign operands are subtracted.
    fn write_ordering(&mut self, jump: &str, true_when_y_negative: bool) -> io::Result<()> {
        let n = self.compare_count;
        self.compare_count += 1;

        let (opposite_pos, opposite_neg) = if true_when_y_negative {
            ("TRUE", "FALSE") // gt: x>=0,y<0 -> true; x<0,y>=0 -> false
        } else {
            ("FALSE", "TRUE") // lt: the mirror image
        };

        // R14 = y, R13 = x; D holds x afterwards
        writeln!(
            self.writer,
            "@SP\n\
             AM=M-1\n\
             D=M\n\
             @R14\n\
             M=D\n\
             @SP\n\
             AM=M-1\n\
             D=M\n\
             @R13\n\
             M=D\n\
             @CMP_XNEG_{n}\n\
             D;JLT\n\
             @R14\n\
             D=M\n\
             @CMP_{opposite_pos}_{n}\n\
             D;JLT\n\
             @CMP_SAME_{n}\n\
             0;JMP\n\
             (CMP_XNEG_{n})\n\
             @R14\n\
             D=M\n\
             @CMP_{opposite_neg}_{n}\n\
             D;JGE\n\
             (CMP_SAME_{n})\n\
             @R13\n\
             D=M\n\
             @R14\n\
             D=D-M\n\
             @CMP_TRUE_{n}\n\
             D;{jump}"
        )?;
        self.write_compare_tail(n)
    }

    /// Shared comparison epilogue: fall-through pushes false, the true
    /// label pushes -1
    fn write_compare_tail(&mut self, n: usize) -> io::Result<()> {
        writeln!(
            self.writer,
            "(CMP_FALSE_{n})\n\
             @SP\n\
             A=M\n\
             M=0\n\
             @SP\n\
             M=M+1\n\
             @CMP_END_{n}\n\
             0;JMP\n\
             (CMP_TRUE_{n})\n\
             @SP\n\
             A=M\n\
             M=-1\n\
             @SP\n\
             M=M+1\n\
             (CMP_END_{n})"
        )
    }

    fn write_push(&mut self, segment: Segment, index: i16) -> io::Result<()> {
        match segment {
            Segment::Constant => {
                if index == i16::MIN {
                    // -32768 has no A-instruction representation
                    write_asm!(self.writer,
                        "@32767"
                        "D=-A"
                        "D=D-1"
                    )?;
                } else if index < 0 {
                    writeln!(self.writer, "@{}\nD=-A", -index)?;
                } else {
                    writeln!(self.writer, "@{index}\nD=A")?;
                }
            }
            Segment::Local | Segment::Argument | Segment::This | Segment::That => {
                let base = segment.base_symbol().expect("indirect segment");
                writeln!(self.writer, "@{base}\nD=M\n@{index}\nA=D+A\nD=M")?;
            }
            Segment::Temp => writeln!(self.writer, "@{}\nD=M", TEMP_BASE + index)?,
            Segment::Pointer => {
                let register = if index == 0 { "THIS" } else { "THAT" };
                writeln!(self.writer, "@{register}\nD=M")?;
            }
            Segment::Static => {
                writeln!(self.writer, "@{}.{index}\nD=M", self.file_scope)?;
            }
        }
        self.push_d()
    }

    fn write_pop(&mut self, segment: Segment, index: i16) -> io::Result<()> {
        match segment {
            Segment::Local | Segment::Argument | Segment::This | Segment::That => {
                // the effective address goes to R13 before the stack shrinks
                let base = segment.base_symbol().expect("indirect segment");
                writeln!(self.writer, "@{base}\nD=M\n@{index}\nD=D+A\n@R13\nM=D")?;
                self.pop_to_d()?;
                write_asm!(self.writer,
                    "@R13"
                    "A=M"
                    "M=D"
                )
            }
            Segment::Temp => {
                self.pop_to_d()?;
                writeln!(self.writer, "@{}\nM=D", TEMP_BASE + index)
            }
            Segment::Pointer => {
                let register = if index == 0 { "THIS" } else { "THAT" };
                self.pop_to_d()?;
                writeln!(self.writer, "@{register}\nM=D")
            }
            Segment::Static => {
                self.pop_to_d()?;
                writeln!(self.writer, "@{}.{index}\nM=D", self.file_scope)
            }
            Segment::Constant => unreachable!("rejected by the parser"),
        }
    }

    /// `(F)` followed by `locals` zero-initialized stack slots
    fn write_function(&mut self, name: &str, locals: u16) -> io::Result<()> {
        self.function = Some(name.to_string());
        writeln!(self.writer, "({name})")?;
        for _ in 0..locals {
            write_asm!(self.writer,
                "@SP"
                "A=M"
                "M=0"
                "@SP"
                "M=M+1"
            )?;
        }
        Ok(())
    }

    /// Saves the caller frame, repositions ARG/LCL and jumps to the callee
    fn write_call(&mut self, name: &str, args: u16) -> io::Result<()> {
        let return_label = format!("{}$ret.{}", self.scope(), self.return_count);
        self.return_count += 1;

        writeln!(self.writer, "@{return_label}\nD=A")?;
        self.push_d()?;
        for saved in ["LCL", "ARG", "THIS", "THAT"] {
            writeln!(self.writer, "@{saved}\nD=M")?;
            self.push_d()?;
        }
        writeln!(
            self.writer,
            "@SP\n\
             D=M\n\
             @{}\n\
             D=D-A\n\
             @ARG\n\
             M=D\n\
             @SP\n\
             D=M\n\
             @LCL\n\
             M=D\n\
             @{name}\n\
             0;JMP\n\
             ({return_label})",
            FRAME_SIZE + args
        )
    }

    /// Restores the caller frame and jumps to the saved return address
    ///
    /// The return address is parked in R14 before LCL is restored: with zero
    /// arguments `*ARG` and the saved address share a slot.
    fn write_return(&mut self) -> io::Result<()> {
        write_asm!(self.writer,
            "@LCL"
            "D=M"
            "@R13"
            "M=D"
            "@5"
            "A=D-A"
            "D=M"
            "@R14"
            "M=D"
            "@SP"
            "AM=M-1"
            "D=M"
            "@ARG"
            "A=M"
            "M=D"
            "@ARG"
            "D=M+1"
            "@SP"
            "M=D"
            "@R13"
            "AM=M-1"
            "D=M"
            "@THAT"
            "M=D"
            "@R13"
            "AM=M-1"
            "D=M"
            "@THIS"
            "M=D"
            "@R13"
            "AM=M-1"
            "D=M"
            "@ARG"
            "M=D"
            "@R13"
            "AM=M-1"
            "D=M"
            "@LCL"
            "M=D"
            "@R14"
            "A=M"
            "0;JMP"
        )
    }

    fn push_d(&mut self) -> io::Result<()> {
        write_asm!(self.writer,
            "@SP"
            "A=M"
            "M=D"
            "@SP"
            "M=M+1"
        )
    }

    fn pop_to_d(&mut self) -> io::Result<()> {
        write_asm!(self.writer,
            "@SP"
            "AM=M-1"
            "D=M"
        )
    }

    /// Label scope: the enclosing function, or the file outside functions
    fn scope(&self) -> &str {
        self.function.as_deref().unwrap_or(&self.file_scope)
    }

    fn qualify(&self, label: &str) -> String {
        format!("{}${label}", self.scope())
    }
}
