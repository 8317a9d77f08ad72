//! Tokenizer for OpenQASM 2.0 source.

use crate::error::Diagnostic;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Keywords
    OpenQasm,
    Include,
    QReg,
    CReg,
    Gate,
    Opaque,
    Measure,
    Barrier,
    Reset,
    If,
    Pi,

    Ident(String),
    Int(u64),
    Real(f64),
    Str(String),

    Semicolon,
    Comma,
    Arrow,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    LParen,
    RParen,
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    EqEq,
    Eq,

    Eof,
}

impl TokenKind {
    /// Short human-readable description used in parser diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier '{}'", name),
            TokenKind::Int(v) => format!("integer '{}'", v),
            TokenKind::Real(v) => format!("number '{}'", v),
            TokenKind::Str(s) => format!("string \"{}\"", s),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("'{}'", other.lexeme()),
        }
    }

    fn lexeme(&self) -> &'static str {
        match self {
            TokenKind::OpenQasm => "OPENQASM",
            TokenKind::Include => "include",
            TokenKind::QReg => "qreg",
            TokenKind::CReg => "creg",
            TokenKind::Gate => "gate",
            TokenKind::Opaque => "opaque",
            TokenKind::Measure => "measure",
            TokenKind::Barrier => "barrier",
            TokenKind::Reset => "reset",
            TokenKind::If => "if",
            TokenKind::Pi => "pi",
            TokenKind::Semicolon => ";",
            TokenKind::Comma => ",",
            TokenKind::Arrow => "->",
            TokenKind::LBracket => "[",
            TokenKind::RBracket => "]",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::Caret => "^",
            TokenKind::EqEq => "==",
            TokenKind::Eq => "=",
            _ => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub col: usize,
}

/// Tokenizes the source. Unknown characters are reported as diagnostics and
/// skipped so the parser still sees the rest of the input.
pub fn tokenize(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    Lexer::new(source).run()
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    col: usize,
}

impl<'a> Lexer<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            col: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn run(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        let mut diagnostics = Vec::new();

        while let Some(c) = self.peek() {
            let (line, col) = (self.line, self.col);
            match c {
                ' ' | '\t' | '\r' | '\n' => {
                    self.bump();
                }
                '/' => {
                    self.bump();
                    if self.peek() == Some('/') {
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.bump();
                        }
                    } else {
                        tokens.push(Token { kind: TokenKind::Slash, line, col });
                    }
                }
                '-' => {
                    self.bump();
                    if self.peek() == Some('>') {
                        self.bump();
                        tokens.push(Token { kind: TokenKind::Arrow, line, col });
                    } else {
                        tokens.push(Token { kind: TokenKind::Minus, line, col });
                    }
                }
                '=' => {
                    self.bump();
                    if self.peek() == Some('=') {
                        self.bump();
                        tokens.push(Token { kind: TokenKind::EqEq, line, col });
                    } else {
                        tokens.push(Token { kind: TokenKind::Eq, line, col });
                    }
                }
                '"' => {
                    self.bump();
                    let mut text = String::new();
                    let mut closed = false;
                    while let Some(c) = self.bump() {
                        if c == '"' {
                            closed = true;
                            break;
                        }
                        text.push(c);
                    }
                    if closed {
                        tokens.push(Token { kind: TokenKind::Str(text), line, col });
                    } else {
                        diagnostics.push(Diagnostic::new(line, col, "unterminated string literal"));
                    }
                }
                c if c.is_ascii_digit() || c == '.' => {
                    match self.lex_number() {
                        Ok(kind) => tokens.push(Token { kind, line, col }),
                        Err(text) => diagnostics.push(Diagnostic::new(
                            line,
                            col,
                            format!("malformed numeric literal '{}'", text),
                        )),
                    }
                }
                c if c.is_ascii_alphabetic() || c == '_' => {
                    let mut word = String::new();
                    while let Some(c) = self.peek() {
                        if c.is_ascii_alphanumeric() || c == '_' {
                            word.push(c);
                            self.bump();
                        } else {
                            break;
                        }
                    }
                    let kind = match word.as_str() {
                        "OPENQASM" => TokenKind::OpenQasm,
                        "include" => TokenKind::Include,
                        "qreg" => TokenKind::QReg,
                        "creg" => TokenKind::CReg,
                        "gate" => TokenKind::Gate,
                        "opaque" => TokenKind::Opaque,
                        "measure" => TokenKind::Measure,
                        "barrier" => TokenKind::Barrier,
                        "reset" => TokenKind::Reset,
                        "if" => TokenKind::If,
                        "pi" => TokenKind::Pi,
                        _ => TokenKind::Ident(word),
                    };
                    tokens.push(Token { kind, line, col });
                }
                other => {
                    self.bump();
                    diagnostics.push(Diagnostic::new(
                        line,
                        col,
                        format!("unknown character '{}'", other),
                    ));
                }
            }
        }

        tokens.push(Token {
            kind: TokenKind::Eof,
            line: self.line,
            col: self.col,
        });
        (tokens, diagnostics)
    }

    /// Integer, decimal, or scientific literal. The leading character is
    /// still in the stream.
    fn lex_number(&mut self) -> Result<TokenKind, String> {
        let mut text = String::new();
        let mut is_real = false;

        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                text.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if self.peek() == Some('.') {
            is_real = true;
            text.push('.');
            self.bump();
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.bump();
                } else {
                    break;
                }
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            is_real = true;
            text.push('e');
            self.bump();
            if matches!(self.peek(), Some('+') | Some('-'))
                && let Some(sign) = self.bump()
            {
                text.push(sign);
            }
            let mut saw_digit = false;
            while let Some(c) = self.peek() {
                if c.is_ascii_digit() {
                    text.push(c);
                    self.bump();
                    saw_digit = true;
                } else {
                    break;
                }
            }
            if !saw_digit {
                return Err(text);
            }
        }

        if text == "." || text.is_empty() {
            return Err(text);
        }
        if is_real {
            text.parse::<f64>().map(TokenKind::Real).map_err(|_| text)
        } else {
            text.parse::<u64>().map(TokenKind::Int).map_err(|_| text)
        }
    }
}
