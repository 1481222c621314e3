//! Compilation engine: recursive-descent parsing with inline code generation
//!
//! One pass over the token stream; there is no syntax tree. Each grammar
//! rule consumes its tokens and emits VM commands through [`VmWriter`] as it
//! goes, consulting the two-scope symbol table for every identifier.

use crate::symbol_table::{SymbolTable, VarKind};
use crate::tokenizer::{Keyword, Token, TokenKind};
use crate::vm_writer::{Segment, VmOp, VmWriter};
use std::fmt;
use std::io::{self, Write};

const UNARY_OPS: [char; 4] = ['-', '~', '^', '#'];
const BINARY_OPS: [char; 9] = ['+', '-', '*', '/', '&', '|', '<', '>', '='];

#[derive(Debug)]
pub enum CompileError {
    Syntax {
        line: usize,
        expected: String,
        found: String,
    },
    UndeclaredIdentifier {
        line: usize,
        name: String,
    },
    Io(io::Error),
}

impl std::error::Error for CompileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Syntax {
                line,
                expected,
                found,
            } => write!(f, "line {line}: expected {expected}, found {found}"),
            Self::UndeclaredIdentifier { line, name } => {
                write!(f, "line {line}: undeclared identifier: {name}")
            }
            Self::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl From<io::Error> for CompileError {
    fn from(error: io::Error) -> Self {
        Self::Io(error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubroutineKind {
    Constructor,
    Function,
    Method,
}

pub struct CompilationEngine<W: Write> {
    tokens: Vec<Token>,
    pos: usize,
    table: SymbolTable,
    vm: VmWriter<W>,
    class_name: String,
    /// Monotonic per-class counter behind `if`/`while` labels
    label_count: usize,
}

impl<W: Write> CompilationEngine<W> {
    pub fn new(tokens: Vec<Token>, writer: W) -> Self {
        Self {
            tokens,
            pos: 0,
            table: SymbolTable::new(),
            vm: VmWriter::new(writer),
            class_name: String::new(),
            label_count: 0,
        }
    }

    /// Compiles the single class this token stream must contain
    pub fn compile_class(&mut self) -> Result<(), CompileError> {
        self.take_keyword(Keyword::Class)?;
        self.class_name = self.take_identifier()?;
        self.take_symbol('{')?;

        while self.at_keyword(Keyword::Static) || self.at_keyword(Keyword::Field) {
            self.compile_class_var_dec()?;
        }
        while self.at_keyword(Keyword::Constructor)
            || self.at_keyword(Keyword::Function)
            || self.at_keyword(Keyword::Method)
        {
            self.compile_subroutine()?;
        }

        self.take_symbol('}')?;
        if let Some(token) = self.tokens.get(self.pos) {
            return Err(CompileError::Syntax {
                line: token.line,
                expected: "end of class".to_string(),
                found: token.kind.to_string(),
            });
        }
        Ok(())
    }

    /// Flushes and hands back the output writer
    pub fn finish(self) -> io::Result<W> {
        self.vm.finish()
    }

    // --- declarations ---

    fn compile_class_var_dec(&mut self) -> Result<(), CompileError> {
        let kind = if self.at_keyword(Keyword::Static) {
            self.take_keyword(Keyword::Static)?;
            VarKind::Static
        } else {
            self.take_keyword(Keyword::Field)?;
            VarKind::Field
        };
        self.compile_var_names(kind)
    }

    fn compile_var_dec(&mut self) -> Result<(), CompileError> {
        self.take_keyword(Keyword::Var)?;
        self.compile_var_names(VarKind::Var)
    }

    /// `type name (, name)* ;` shared by class-var and var declarations
    fn compile_var_names(&mut self, kind: VarKind) -> Result<(), CompileError> {
        let var_type = self.parse_type()?;
        loop {
            let name = self.take_identifier()?;
            self.table.define(&name, &var_type, kind);
            if !self.take_symbol_if(',') {
                break;
            }
        }
        self.take_symbol(';')
    }

    fn compile_subroutine(&mut self) -> Result<(), CompileError> {
        let kind = if self.at_keyword(Keyword::Constructor) {
            self.take_keyword(Keyword::Constructor)?;
            SubroutineKind::Constructor
        } else if self.at_keyword(Keyword::Function) {
            self.take_keyword(Keyword::Function)?;
            SubroutineKind::Function
        } else {
            self.take_keyword(Keyword::Method)?;
            SubroutineKind::Method
        };

        let _return_type = self.parse_return_type()?;
        let name = self.take_identifier()?;

        self.table.start_subroutine();
        if kind == SubroutineKind::Method {
            // ARG slot 0 is the implicit receiver
            let class_name = self.class_name.clone();
            self.table.define("this", &class_name, VarKind::Arg);
        }

        self.take_symbol('(')?;
        self.compile_parameter_list()?;
        self.take_symbol(')')?;
        self.take_symbol('{')?;
        while self.at_keyword(Keyword::Var) {
            self.compile_var_dec()?;
        }

        let full_name = format!("{}.{name}", self.class_name);
        self.vm
            .function(&full_name, self.table.var_count(VarKind::Var))?;
        match kind {
            SubroutineKind::Method => {
                self.vm.push(Segment::Argument, 0)?;
                self.vm.pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Constructor => {
                let fields = self.table.var_count(VarKind::Field);
                self.vm.push(Segment::Constant, fields)?;
                self.vm.call("Memory.alloc", 1)?;
                self.vm.pop(Segment::Pointer, 0)?;
            }
            SubroutineKind::Function => {}
        }

        self.compile_statements()?;
        self.take_symbol('}')
    }

    fn compile_parameter_list(&mut self) -> Result<(), CompileError> {
        if self.at_symbol(')') {
            return Ok(());
        }
        loop {
            let var_type = self.parse_type()?;
            let name = self.take_identifier()?;
            self.table.define(&name, &var_type, VarKind::Arg);
            if !self.take_symbol_if(',') {
                return Ok(());
            }
        }
    }

    // --- statements ---

    fn compile_statements(&mut self) -> Result<(), CompileError> {
        loop {
            if self.at_keyword(Keyword::Let) {
                self.compile_let()?;
            } else if self.at_keyword(Keyword::If) {
                self.compile_if()?;
            } else if self.at_keyword(Keyword::While) {
                self.compile_while()?;
            } else if self.at_keyword(Keyword::Do) {
                self.compile_do()?;
            } else if self.at_keyword(Keyword::Return) {
                self.compile_return()?;
            } else {
                return Ok(());
            }
        }
    }

    fn compile_let(&mut self) -> Result<(), CompileError> {
        self.take_keyword(Keyword::Let)?;
        let line = self.line();
        let name = self.take_identifier()?;

        if self.take_symbol_if('[') {
            // destination address first; the right-hand side may itself use
            // `that`, so the address waits on the stack, not in pointer 1
            let (segment, index) = self.variable(&name, line)?;
            self.vm.push(segment, index)?;
            self.compile_expression()?;
            self.take_symbol(']')?;
            self.vm.arithmetic(VmOp::Add)?;

            self.take_symbol('=')?;
            self.compile_expression()?;
            self.take_symbol(';')?;

            self.vm.pop(Segment::Temp, 0)?;
            self.vm.pop(Segment::Pointer, 1)?;
            self.vm.push(Segment::Temp, 0)?;
            Ok(self.vm.pop(Segment::That, 0)?)
        } else {
            self.take_symbol('=')?;
            self.compile_expression()?;
            self.take_symbol(';')?;

            let (segment, index) = self.variable(&name, line)?;
            Ok(self.vm.pop(segment, index)?)
        }
    }

    fn compile_if(&mut self) -> Result<(), CompileError> {
        let n = self.next_label();
        let else_label = format!("IF_ELSE{n}");
        let end_label = format!("IF_END{n}");

        self.take_keyword(Keyword::If)?;
        self.take_symbol('(')?;
        self.compile_expression()?;
        self.take_symbol(')')?;
        self.vm.arithmetic(VmOp::Not)?;
        self.vm.if_goto(&else_label)?;

        self.take_symbol('{')?;
        self.compile_statements()?;
        self.take_symbol('}')?;
        self.vm.goto(&end_label)?;
        self.vm.label(&else_label)?;

        if self.at_keyword(Keyword::Else) {
            self.take_keyword(Keyword::Else)?;
            self.take_symbol('{')?;
            self.compile_statements()?;
            self.take_symbol('}')?;
        }
        Ok(self.vm.label(&end_label)?)
    }

    fn compile_while(&mut self) -> Result<(), CompileError> {
        let n = self.next_label();
        let top_label = format!("WHILE{n}");
        let end_label = format!("WHILE_END{n}");

        self.take_keyword(Keyword::While)?;
        self.vm.label(&top_label)?;
        self.take_symbol('(')?;
        self.compile_expression()?;
        self.take_symbol(')')?;
        self.vm.arithmetic(VmOp::Not)?;
        self.vm.if_goto(&end_label)?;

        self.take_symbol('{')?;
        self.compile_statements()?;
        self.take_symbol('}')?;
        self.vm.goto(&top_label)?;
        Ok(self.vm.label(&end_label)?)
    }

    fn compile_do(&mut self) -> Result<(), CompileError> {
        self.take_keyword(Keyword::Do)?;
        let name = self.take_identifier()?;
        self.compile_subroutine_call(&name)?;
        self.take_symbol(';')?;
        // discard the (possibly void) result
        Ok(self.vm.pop(Segment::Temp, 0)?)
    }

    fn compile_return(&mut self) -> Result<(), CompileError> {
        self.take_keyword(Keyword::Return)?;
        if self.at_symbol(';') {
            // void subroutines still return one word
            self.vm.push(Segment::Constant, 0)?;
        } else {
            self.compile_expression()?;
        }
        self.take_symbol(';')?;
        Ok(self.vm.ret()?)
    }

    // --- expressions ---

    /// `term (op term)*`, left-associative, no precedence
    fn compile_expression(&mut self) -> Result<(), CompileError> {
        self.compile_term()?;
        while let Some(op) = self.current_binary_op() {
            self.pos += 1;
            self.compile_term()?;
            match op {
                '+' => self.vm.arithmetic(VmOp::Add)?,
                '-' => self.vm.arithmetic(VmOp::Sub)?,
                '&' => self.vm.arithmetic(VmOp::And)?,
                '|' => self.vm.arithmetic(VmOp::Or)?,
                '<' => self.vm.arithmetic(VmOp::Lt)?,
                '>' => self.vm.arithmetic(VmOp::Gt)?,
                '=' => self.vm.arithmetic(VmOp::Eq)?,
                '*' => self.vm.call("Math.multiply", 2)?,
                '/' => self.vm.call("Math.divide", 2)?,
                _ => unreachable!("current_binary_op filters"),
            }
        }
        Ok(())
    }

    fn compile_term(&mut self) -> Result<(), CompileError> {
        let line = self.line();
        let Some(token) = self.tokens.get(self.pos) else {
            return Err(self.unexpected_end("a term"));
        };

        match token.kind.clone() {
            TokenKind::IntConst(value) => {
                self.pos += 1;
                Ok(self.vm.push(Segment::Constant, value)?)
            }
            TokenKind::StringConst(text) => {
                self.pos += 1;
                self.compile_string(&text)
            }
            TokenKind::Keyword(Keyword::True) => {
                self.pos += 1;
                self.vm.push(Segment::Constant, 1)?;
                Ok(self.vm.arithmetic(VmOp::Neg)?)
            }
            TokenKind::Keyword(Keyword::False) | TokenKind::Keyword(Keyword::Null) => {
                self.pos += 1;
                Ok(self.vm.push(Segment::Constant, 0)?)
            }
            TokenKind::Keyword(Keyword::This) => {
                self.pos += 1;
                Ok(self.vm.push(Segment::Pointer, 0)?)
            }
            TokenKind::Symbol('(') => {
                self.pos += 1;
                self.compile_expression()?;
                self.take_symbol(')')
            }
            TokenKind::Symbol(op) if UNARY_OPS.contains(&op) => {
                self.pos += 1;
                self.compile_term()?;
                match op {
                    '-' => Ok(self.vm.arithmetic(VmOp::Neg)?),
                    '~' => Ok(self.vm.arithmetic(VmOp::Not)?),
                    '^' => Ok(self.vm.arithmetic(VmOp::ShiftLeft)?),
                    _ => Ok(self.vm.arithmetic(VmOp::ShiftRight)?),
                }
            }
            TokenKind::Identifier(name) => {
                self.pos += 1;
                if self.take_symbol_if('[') {
                    // a[e]: *(a + e) through pointer 1
                    let (segment, index) = self.variable(&name, line)?;
                    self.vm.push(segment, index)?;
                    self.compile_expression()?;
                    self.take_symbol(']')?;
                    self.vm.arithmetic(VmOp::Add)?;
                    self.vm.pop(Segment::Pointer, 1)?;
                    Ok(self.vm.push(Segment::That, 0)?)
                } else if self.at_symbol('(') || self.at_symbol('.') {
                    self.compile_subroutine_call(&name)
                } else {
                    let (segment, index) = self.variable(&name, line)?;
                    Ok(self.vm.push(segment, index)?)
                }
            }
            other => Err(CompileError::Syntax {
                line,
                expected: "a term".to_string(),
                found: other.to_string(),
            }),
        }
    }

    /// Call forms, after the leading identifier has been consumed:
    /// `f(args)` is a method on `this`; `x.f(args)` is a method when `x`
    /// is a variable and a function/constructor call when it is a class name
    fn compile_subroutine_call(&mut self, name: &str) -> Result<(), CompileError> {
        let line = self.line();

        if self.take_symbol_if('.') {
            let subroutine = self.take_identifier()?;
            if let Some(entry) = self.table.resolve(name) {
                let receiver_type = entry.var_type.clone();
                let (segment, index) = (entry.kind.segment(), entry.index);
                self.vm.push(segment, index)?;
                let args = self.compile_argument_list()?;
                Ok(self
                    .vm
                    .call(&format!("{receiver_type}.{subroutine}"), args + 1)?)
            } else {
                let args = self.compile_argument_list()?;
                Ok(self.vm.call(&format!("{name}.{subroutine}"), args)?)
            }
        } else if self.at_symbol('(') {
            self.vm.push(Segment::Pointer, 0)?;
            let args = self.compile_argument_list()?;
            Ok(self
                .vm
                .call(&format!("{}.{name}", self.class_name), args + 1)?)
        } else {
            Err(CompileError::Syntax {
                line,
                expected: "`(` or `.`".to_string(),
                found: self.found_text(),
            })
        }
    }

    /// `( expression (, expression)* )`, returns the argument count
    fn compile_argument_list(&mut self) -> Result<u16, CompileError> {
        self.take_symbol('(')?;
        let mut count = 0;
        if !self.at_symbol(')') {
            self.compile_expression()?;
            count = 1;
            while self.take_symbol_if(',') {
                self.compile_expression()?;
                count += 1;
            }
        }
        self.take_symbol(')')?;
        Ok(count)
    }

    /// `String.new` plus one `appendChar` per Unicode scalar value
    fn compile_string(&mut self, text: &str) -> Result<(), CompileError> {
        let length = u16::try_from(text.chars().count()).unwrap_or(u16::MAX);
        self.vm.push(Segment::Constant, length)?;
        self.vm.call("String.new", 1)?;
        for ch in text.chars() {
            self.vm.push(Segment::Constant, u32::from(ch) as u16)?;
            self.vm.call("String.appendChar", 2)?;
        }
        Ok(())
    }

    // --- token plumbing ---

    fn parse_type(&mut self) -> Result<String, CompileError> {
        let line = self.line();
        match self.tokens.get(self.pos).map(|t| t.kind.clone()) {
            Some(TokenKind::Keyword(Keyword::Int)) => {
                self.pos += 1;
                Ok("int".to_string())
            }
            Some(TokenKind::Keyword(Keyword::Char)) => {
                self.pos += 1;
                Ok("char".to_string())
            }
            Some(TokenKind::Keyword(Keyword::Boolean)) => {
                self.pos += 1;
                Ok("boolean".to_string())
            }
            Some(TokenKind::Identifier(name)) => {
                self.pos += 1;
                Ok(name)
            }
            _ => Err(CompileError::Syntax {
                line,
                expected: "a type".to_string(),
                found: self.found_text(),
            }),
        }
    }

    fn parse_return_type(&mut self) -> Result<String, CompileError> {
        if self.at_keyword(Keyword::Void) {
            self.pos += 1;
            return Ok("void".to_string());
        }
        self.parse_type()
    }

    fn variable(&self, name: &str, line: usize) -> Result<(Segment, u16), CompileError> {
        self.table
            .resolve(name)
            .map(|entry| (entry.kind.segment(), entry.index))
            .ok_or_else(|| CompileError::UndeclaredIdentifier {
                line,
                name: name.to_string(),
            })
    }

    fn next_label(&mut self) -> usize {
        let n = self.label_count;
        self.label_count += 1;
        n
    }

    fn at_symbol(&self, symbol: char) -> bool {
        matches!(
            self.tokens.get(self.pos),
            Some(Token { kind: TokenKind::Symbol(found), .. }) if *found == symbol
        )
    }

    fn at_keyword(&self, keyword: Keyword) -> bool {
        matches!(
            self.tokens.get(self.pos),
            Some(Token { kind: TokenKind::Keyword(found), .. }) if *found == keyword
        )
    }

    fn current_binary_op(&self) -> Option<char> {
        match self.tokens.get(self.pos) {
            Some(Token {
                kind: TokenKind::Symbol(op),
                ..
            }) if BINARY_OPS.contains(op) => Some(*op),
            _ => None,
        }
    }

    fn take_symbol(&mut self, symbol: char) -> Result<(), CompileError> {
        if self.at_symbol(symbol) {
            self.pos += 1;
            Ok(())
        } else {
            Err(CompileError::Syntax {
                line: self.line(),
                expected: format!("`{symbol}`"),
                found: self.found_text(),
            })
        }
    }

    fn take_symbol_if(&mut self, symbol: char) -> bool {
        if self.at_symbol(symbol) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn take_keyword(&mut self, keyword: Keyword) -> Result<(), CompileError> {
        if self.at_keyword(keyword) {
            self.pos += 1;
            Ok(())
        } else {
            Err(CompileError::Syntax {
                line: self.line(),
                expected: format!("keyword `{keyword:?}`"),
                found: self.found_text(),
            })
        }
    }

    fn take_identifier(&mut self) -> Result<String, CompileError> {
        match self.tokens.get(self.pos) {
            Some(Token {
                kind: TokenKind::Identifier(name),
                ..
            }) => {
                let name = name.clone();
                self.pos += 1;
                Ok(name)
            }
            _ => Err(CompileError::Syntax {
                line: self.line(),
                expected: "an identifier".to_string(),
                found: self.found_text(),
            }),
        }
    }

    /// Line of the current token, or of the last one at end of input
    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |token| token.line)
    }

    fn found_text(&self) -> String {
        self.tokens
            .get(self.pos)
            .map_or_else(|| "end of input".to_string(), |token| token.kind.to_string())
    }

    fn unexpected_end(&self, expected: &str) -> CompileError {
        CompileError::Syntax {
            line: self.line(),
            expected: expected.to_string(),
            found: "end of input".to_string(),
        }
    }
}
