//! Jack tokenizer
//!
//! Scans the whole input into a token vector: comments (`//`, `/* */`,
//! `/** */`) and whitespace separate tokens, a symbol character always
//! terminates the current token (maximal munch), string literals run to the
//! closing quote on the same line.

use phf::phf_map;
use std::fmt;

/// Largest Jack integer constant
const MAX_INT: u32 = 32767;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Class,
    Constructor,
    Function,
    Method,
    Field,
    Static,
    Var,
    Int,
    Char,
    Boolean,
    Void,
    True,
    False,
    Null,
    This,
    Let,
    Do,
    If,
    Else,
    While,
    Return,
}

/// The 21 Jack keywords, matched case-sensitively
static KEYWORDS: phf::Map<&'static str, Keyword> = phf_map! {
    "class" => Keyword::Class,
    "constructor" => Keyword::Constructor,
    "function" => Keyword::Function,
    "method" => Keyword::Method,
    "field" => Keyword::Field,
    "static" => Keyword::Static,
    "var" => Keyword::Var,
    "int" => Keyword::Int,
    "char" => Keyword::Char,
    "boolean" => Keyword::Boolean,
    "void" => Keyword::Void,
    "true" => Keyword::True,
    "false" => Keyword::False,
    "null" => Keyword::Null,
    "this" => Keyword::This,
    "let" => Keyword::Let,
    "do" => Keyword::Do,
    "if" => Keyword::If,
    "else" => Keyword::Else,
    "while" => Keyword::While,
    "return" => Keyword::Return,
};

const SYMBOLS: &str = "{}()[].,;+-*/&|<>=~^#";

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Keyword(Keyword),
    Symbol(char),
    IntConst(u16),
    StringConst(String),
    Identifier(String),
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Keyword(keyword) => write!(f, "keyword `{keyword:?}`"),
            Self::Symbol(symbol) => write!(f, "`{symbol}`"),
            Self::IntConst(value) => write!(f, "integer {value}"),
            Self::StringConst(text) => write!(f, "string \"{text}\""),
            Self::Identifier(name) => write!(f, "identifier `{name}`"),
        }
    }
}

/// A token with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, PartialEq, Eq)]
pub enum LexError {
    UnterminatedString { line: usize },
    UnterminatedComment { line: usize },
    IntOutOfRange { line: usize, literal: String },
    UnexpectedCharacter { line: usize, character: char },
}

impl std::error::Error for LexError {}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnterminatedString { line } => {
                write!(f, "line {line}: unterminated string literal")
            }
            Self::UnterminatedComment { line } => {
                write!(f, "line {line}: unterminated block comment")
            }
            Self::IntOutOfRange { line, literal } => {
                write!(f, "line {line}: integer constant out of range: {literal}")
            }
            Self::UnexpectedCharacter { line, character } => {
                write!(f, "line {line}: unexpected character: {character}")
            }
        }
    }
}

/// Tokenizes a whole Jack source
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).scan_tokens()
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    fn scan_tokens(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;
            let (line, column) = (self.line, self.column);

            let Some(&ch) = self.chars.peek() else {
                return Ok(tokens);
            };

            let kind = if SYMBOLS.contains(ch) {
                self.advance();
                TokenKind::Symbol(ch)
            } else if ch == '"' {
                self.string_literal()?
            } else if ch.is_ascii_digit() {
                self.int_literal()?
            } else if is_identifier_char(ch) {
                self.word()
            } else {
                return Err(LexError::UnexpectedCharacter {
                    line,
                    character: ch,
                });
            };

            tokens.push(Token { kind, line, column });
        }
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
                self.advance();
            }

            if self.chars.peek() != Some(&'/') {
                return Ok(());
            }

            // a lone '/' is the division symbol, not a comment
            let mut lookahead = self.chars.clone();
            lookahead.next();
            match lookahead.peek() {
                Some('/') => self.skip_line_comment(),
                Some('*') => self.skip_block_comment()?,
                _ => return Ok(()),
            }
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            self.advance();
            if ch == '\n' {
                break;
            }
        }
    }

    /// Skips `/* ... */`, which also covers `/** ... */` API comments
    fn skip_block_comment(&mut self) -> Result<(), LexError> {
        let start_line = self.line;
        self.advance(); // '/'
        self.advance(); // '*'

        let mut previous = '\0';
        while let Some(&ch) = self.chars.peek() {
            self.advance();
            if previous == '*' && ch == '/' {
                return Ok(());
            }
            previous = ch;
        }
        Err(LexError::UnterminatedComment { line: start_line })
    }

    fn string_literal(&mut self) -> Result<TokenKind, LexError> {
        let start_line = self.line;
        self.advance(); // opening quote

        let mut text = String::new();
        loop {
            match self.chars.peek() {
                Some('"') => {
                    self.advance();
                    return Ok(TokenKind::StringConst(text));
                }
                Some('\n') | None => {
                    return Err(LexError::UnterminatedString { line: start_line });
                }
                Some(&ch) => {
                    text.push(ch);
                    self.advance();
                }
            }
        }
    }

    fn int_literal(&mut self) -> Result<TokenKind, LexError> {
        let line = self.line;
        let mut literal = String::new();
        while self.chars.peek().is_some_and(char::is_ascii_digit) {
            literal.push(self.advance());
        }

        match literal.parse::<u32>() {
            Ok(value) if value <= MAX_INT => Ok(TokenKind::IntConst(value as u16)),
            _ => Err(LexError::IntOutOfRange { line, literal }),
        }
    }

    fn word(&mut self) -> TokenKind {
        let mut word = String::new();
        while self.chars.peek().copied().is_some_and(is_identifier_char) {
            word.push(self.advance());
        }

        KEYWORDS
            .get(word.as_str())
            .copied()
            .map_or(TokenKind::Identifier(word), TokenKind::Keyword)
    }

    fn advance(&mut self) -> char {
        let ch = self.chars.next().unwrap_or('\0');
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        ch
    }
}

fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}
