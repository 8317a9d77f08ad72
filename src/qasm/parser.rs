//! Recursive-descent parser producing a [`Program`].
//!
//! On a malformed statement the parser records a diagnostic and resumes at
//! the next statement boundary (`;` or `}`), so one call surfaces every
//! error in the source.

use super::ast::*;
use super::lexer::{Token, TokenKind, tokenize};
use crate::error::{Diagnostic, ParseErrors};

/// Parses OpenQASM 2.0 source into an AST.
///
/// The `OPENQASM 2.0;` header is optional so that included files, which
/// conventionally omit it, parse with the same entry point.
pub fn parse_program(source: &str) -> Result<Program, ParseErrors> {
    let (tokens, mut diagnostics) = tokenize(source);
    let mut parser = Parser { tokens, pos: 0 };
    let (program, parse_diags) = parser.run();
    diagnostics.extend(parse_diags);
    if diagnostics.is_empty() {
        Ok(program)
    } else {
        Err(ParseErrors { diagnostics })
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

type ParseResult<T> = Result<T, Diagnostic>;

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn at(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek_kind()) == std::mem::discriminant(kind)
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.at(&kind) {
            Ok(self.advance())
        } else {
            let expected = match &kind {
                TokenKind::Ident(_) => "an identifier".to_string(),
                TokenKind::Int(_) => "an integer".to_string(),
                TokenKind::Real(_) => "a number".to_string(),
                TokenKind::Str(_) => "a string".to_string(),
                other => other.describe(),
            };
            let found = self.peek();
            Err(Diagnostic::new(
                found.line,
                found.col,
                format!("expected {}, found {}", expected, found.kind.describe()),
            ))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        let token = self.expect(TokenKind::Ident(String::new()))?;
        match token.kind {
            TokenKind::Ident(name) => Ok(name),
            _ => unreachable!(),
        }
    }

    fn expect_int(&mut self) -> ParseResult<u64> {
        let token = self.expect(TokenKind::Int(0))?;
        match token.kind {
            TokenKind::Int(value) => Ok(value),
            _ => unreachable!(),
        }
    }

    /// Skip to just past the next `;`, or stop before `}` / end of input.
    fn synchronize(&mut self) {
        loop {
            match self.peek_kind() {
                TokenKind::Eof | TokenKind::RBrace => return,
                TokenKind::Semicolon => {
                    self.advance();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn run(&mut self) -> (Program, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let version = match self.parse_header() {
            Ok(v) => v,
            Err(diag) => {
                diagnostics.push(diag);
                self.synchronize();
                "2.0".to_string()
            }
        };

        let mut items = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Eof => break,
                _ => match self.parse_item() {
                    Ok(item) => items.push(item),
                    Err(diag) => {
                        diagnostics.push(diag);
                        self.synchronize();
                    }
                },
            }
        }
        (Program { version, items }, diagnostics)
    }

    fn parse_header(&mut self) -> ParseResult<String> {
        if !self.at(&TokenKind::OpenQasm) {
            return Ok("2.0".to_string());
        }
        self.advance();
        let token = self.advance();
        let version = match token.kind {
            TokenKind::Real(v) => v,
            TokenKind::Int(v) => v as f64,
            other => {
                return Err(Diagnostic::new(
                    token.line,
                    token.col,
                    format!("expected version number, found {}", other.describe()),
                ));
            }
        };
        if (version - 2.0).abs() > f64::EPSILON {
            return Err(Diagnostic::new(
                token.line,
                token.col,
                format!("unsupported OpenQASM version {}", version),
            ));
        }
        self.expect(TokenKind::Semicolon)?;
        Ok("2.0".to_string())
    }

    fn parse_item(&mut self) -> ParseResult<Item> {
        match self.peek_kind() {
            TokenKind::Include => self.parse_include(),
            TokenKind::QReg => self.parse_reg(true),
            TokenKind::CReg => self.parse_reg(false),
            TokenKind::Gate => self.parse_gatedef(),
            TokenKind::Opaque => self.parse_opaque(),
            TokenKind::Measure
            | TokenKind::Barrier
            | TokenKind::Reset
            | TokenKind::If
            | TokenKind::Ident(_) => Ok(Item::Statement(self.parse_statement()?)),
            other => {
                let token = self.peek();
                Err(Diagnostic::new(
                    token.line,
                    token.col,
                    format!("unexpected {}", other.describe()),
                ))
            }
        }
    }

    fn parse_include(&mut self) -> ParseResult<Item> {
        let keyword = self.expect(TokenKind::Include)?;
        let token = self.expect(TokenKind::Str(String::new()))?;
        let file = match token.kind {
            TokenKind::Str(s) => s,
            _ => unreachable!(),
        };
        self.expect(TokenKind::Semicolon)?;
        Ok(Item::Include(IncludeDirective {
            file,
            line: keyword.line,
            col: keyword.col,
        }))
    }

    fn parse_reg(&mut self, quantum: bool) -> ParseResult<Item> {
        let keyword = self.advance();
        let name = self.expect_ident()?;
        self.expect(TokenKind::LBracket)?;
        let size = self.expect_int()?;
        self.expect(TokenKind::RBracket)?;
        self.expect(TokenKind::Semicolon)?;
        let decl = RegDecl {
            name,
            size: size as usize,
            line: keyword.line,
            col: keyword.col,
        };
        Ok(if quantum { Item::QReg(decl) } else { Item::CReg(decl) })
    }

    fn parse_ident_list(&mut self) -> ParseResult<Vec<String>> {
        let mut names = vec![self.expect_ident()?];
        while self.at(&TokenKind::Comma) {
            self.advance();
            names.push(self.expect_ident()?);
        }
        Ok(names)
    }

    fn parse_gatedef(&mut self) -> ParseResult<Item> {
        let keyword = self.expect(TokenKind::Gate)?;
        let name = self.expect_ident()?;
        let params = if self.at(&TokenKind::LParen) {
            self.advance();
            let params = if self.at(&TokenKind::RParen) {
                Vec::new()
            } else {
                self.parse_ident_list()?
            };
            self.expect(TokenKind::RParen)?;
            params
        } else {
            Vec::new()
        };
        let qubits = self.parse_ident_list()?;
        self.expect(TokenKind::LBrace)?;

        let mut body = Vec::new();
        let mut body_diag: Option<Diagnostic> = None;
        while !self.at(&TokenKind::RBrace) && !self.at(&TokenKind::Eof) {
            match self.parse_statement() {
                Ok(stmt) => body.push(stmt),
                Err(diag) => {
                    // Keep the first body error; recovery continues so the
                    // closing brace is still consumed.
                    body_diag.get_or_insert(diag);
                    self.synchronize();
                }
            }
        }
        self.expect(TokenKind::RBrace)?;
        if let Some(diag) = body_diag {
            return Err(diag);
        }
        Ok(Item::GateDef(GateDef {
            name,
            params,
            qubits,
            body,
            line: keyword.line,
            col: keyword.col,
        }))
    }

    fn parse_opaque(&mut self) -> ParseResult<Item> {
        let keyword = self.expect(TokenKind::Opaque)?;
        let name = self.expect_ident()?;
        let params = if self.at(&TokenKind::LParen) {
            self.advance();
            let params = if self.at(&TokenKind::RParen) {
                Vec::new()
            } else {
                self.parse_ident_list()?
            };
            self.expect(TokenKind::RParen)?;
            params
        } else {
            Vec::new()
        };
        let qubits = self.parse_ident_list()?;
        self.expect(TokenKind::Semicolon)?;
        Ok(Item::Opaque(OpaqueDecl {
            name,
            params,
            qubits,
            line: keyword.line,
            col: keyword.col,
        }))
    }

    fn parse_statement(&mut self) -> ParseResult<Statement> {
        match self.peek_kind() {
            TokenKind::Measure => {
                let keyword = self.advance();
                let qubit = self.parse_qubit_ref()?;
                self.expect(TokenKind::Arrow)?;
                let cbit = self.parse_qubit_ref()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Statement::Measure {
                    qubit,
                    cbit,
                    line: keyword.line,
                    col: keyword.col,
                })
            }
            TokenKind::Barrier => {
                let keyword = self.advance();
                let mut args = vec![self.parse_qubit_ref()?];
                while self.at(&TokenKind::Comma) {
                    self.advance();
                    args.push(self.parse_qubit_ref()?);
                }
                self.expect(TokenKind::Semicolon)?;
                Ok(Statement::Barrier {
                    args,
                    line: keyword.line,
                    col: keyword.col,
                })
            }
            TokenKind::Reset => {
                let keyword = self.advance();
                let qubit = self.parse_qubit_ref()?;
                self.expect(TokenKind::Semicolon)?;
                Ok(Statement::Reset {
                    qubit,
                    line: keyword.line,
                    col: keyword.col,
                })
            }
            TokenKind::If => {
                let keyword = self.advance();
                self.expect(TokenKind::LParen)?;
                let creg = self.expect_ident()?;
                self.expect(TokenKind::EqEq)?;
                let value = self.expect_int()?;
                self.expect(TokenKind::RParen)?;
                let call = self.parse_gate_call()?;
                Ok(Statement::If {
                    creg,
                    value,
                    call,
                    line: keyword.line,
                    col: keyword.col,
                })
            }
            _ => Ok(Statement::GateCall(self.parse_gate_call()?)),
        }
    }

    fn parse_gate_call(&mut self) -> ParseResult<GateCall> {
        let start = self.peek().clone();
        let name = self.expect_ident()?;
        let params = if self.at(&TokenKind::LParen) {
            self.advance();
            let mut params = Vec::new();
            if !self.at(&TokenKind::RParen) {
                params.push(self.parse_expr()?);
                while self.at(&TokenKind::Comma) {
                    self.advance();
                    params.push(self.parse_expr()?);
                }
            }
            self.expect(TokenKind::RParen)?;
            params
        } else {
            Vec::new()
        };
        let mut qubits = vec![self.parse_qubit_ref()?];
        while self.at(&TokenKind::Comma) {
            self.advance();
            qubits.push(self.parse_qubit_ref()?);
        }
        self.expect(TokenKind::Semicolon)?;
        Ok(GateCall {
            name,
            params,
            qubits,
            line: start.line,
            col: start.col,
        })
    }

    fn parse_qubit_ref(&mut self) -> ParseResult<QubitRef> {
        let name = self.expect_ident()?;
        let index = if self.at(&TokenKind::LBracket) {
            self.advance();
            let index = self.expect_int()?;
            self.expect(TokenKind::RBracket)?;
            Some(index as usize)
        } else {
            None
        };
        Ok(QubitRef { name, index })
    }

    // Expression grammar: additive < multiplicative < power < unary.

    fn parse_expr(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_term()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_term(&mut self) -> ParseResult<Expr> {
        let mut lhs = self.parse_power()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_power()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_power(&mut self) -> ParseResult<Expr> {
        let base = self.parse_unary()?;
        if self.at(&TokenKind::Caret) {
            self.advance();
            let exp = self.parse_power()?;
            return Ok(Expr::Binary(BinOp::Pow, Box::new(base), Box::new(exp)));
        }
        Ok(base)
    }

    fn parse_unary(&mut self) -> ParseResult<Expr> {
        if self.at(&TokenKind::Minus) {
            self.advance();
            let inner = self.parse_unary()?;
            return Ok(Expr::Neg(Box::new(inner)));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let token = self.advance();
        match token.kind {
            TokenKind::Int(v) => Ok(Expr::Number(v as f64)),
            TokenKind::Real(v) => Ok(Expr::Number(v)),
            TokenKind::Pi => Ok(Expr::Pi),
            TokenKind::Ident(name) => {
                if self.at(&TokenKind::LParen) {
                    self.advance();
                    let mut args = Vec::new();
                    if !self.at(&TokenKind::RParen) {
                        args.push(self.parse_expr()?);
                        while self.at(&TokenKind::Comma) {
                            self.advance();
                            args.push(self.parse_expr()?);
                        }
                    }
                    self.expect(TokenKind::RParen)?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Ident(name))
                }
            }
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            other => Err(Diagnostic::new(
                token.line,
                token.col,
                format!("expected expression, found {}", other.describe()),
            )),
        }
    }
}
