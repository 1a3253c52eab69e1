//! Lexical analyzer

use tracing::debug;

use crate::ctx::Context;
use crate::diag::{Diagnostic, ParseError, Position};
use crate::token::{Token, TokenKind};

/// Turns source text into tokens.
///
/// Scanning never stops early: faults are recorded and the scanner moves on, so the
/// returned token list always ends with `TokenKind::Eof`.
pub fn scan(source: &str, ctx: &Context) -> (Vec<Token>, Vec<Diagnostic>) {
    let mut scanner = Scanner::new(source, ctx);
    scanner.scan_tokens();
    debug!(
        tokens = scanner.tokens.len(),
        diagnostics = scanner.diagnostics.len(),
        "scanned source"
    );
    (scanner.tokens, scanner.diagnostics)
}

struct Scanner<'a> {
    src: &'a str,
    ctx: &'a Context,

    // Byte offsets of the lexeme being scanned.
    start: usize,
    current: usize,
    line: Position,

    tokens: Vec<Token>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> Scanner<'a> {
    fn new(src: &'a str, ctx: &'a Context) -> Scanner<'a> {
        Scanner {
            src,
            ctx,
            start: 0,
            current: 0,
            line: 1,
            tokens: vec![],
            diagnostics: vec![],
        }
    }

    fn scan_tokens(&mut self) {
        while let Some(ch) = self.advance() {
            self.scan_token(ch);
            self.start = self.current;
        }
        self.tokens.push(Token::new(TokenKind::Eof, "", self.line));
    }

    fn scan_token(&mut self, ch: char) {
        match ch {
            '\n' => self.line += 1,
            ' ' | '\t' | '\r' => (),
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftCurly),
            '}' => self.add_token(TokenKind::RightCurly),
            ',' => self.add_token(TokenKind::Comma),
            '.' => self.add_token(TokenKind::Dot),
            '-' => self.add_token(TokenKind::Minus),
            '+' => self.add_token(TokenKind::Plus),
            ';' => self.add_token(TokenKind::Semicolon),
            '*' => self.add_token(TokenKind::Star),
            '?' => self.add_token(TokenKind::Question),
            ':' => self.add_token(TokenKind::Colon),
            '!' => self.add_either('=', TokenKind::BangEqual, TokenKind::Bang),
            '=' => self.add_either('=', TokenKind::EqualEqual, TokenKind::Equal),
            '<' => self.add_either('=', TokenKind::LessEqual, TokenKind::Less),
            '>' => self.add_either('=', TokenKind::GreaterEqual, TokenKind::Greater),
            '/' => {
                if self.eat('/') {
                    self.skip_line_comment();
                } else if self.eat('*') {
                    self.skip_block_comment();
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }
            '"' => self.scan_string(),
            '0'..='9' => self.scan_number(),
            'a'..='z' | 'A'..='Z' | '_' => self.scan_identifier(),
            _ => self.error(ParseError::BadChar(ch)),
        }
    }

    fn scan_number(&mut self) {
        self.eat_while(|ch| ch.is_ascii_digit());

        // A '.' belongs to the number only when a digit follows it.
        if self.peek() == Some('.') && self.peek_next().map_or(false, |ch| ch.is_ascii_digit()) {
            self.advance();
            self.eat_while(|ch| ch.is_ascii_digit());
        }

        // Only ASCII digits and at most one inner '.' were consumed.
        let value = self.lexeme().parse::<f64>().unwrap_or_default();
        self.add_token(TokenKind::Number(value));
    }

    fn scan_string(&mut self) {
        loop {
            match self.peek() {
                None => {
                    self.error(ParseError::UnterminatedString);
                    return;
                }
                Some('"') => break,
                Some(ch) => {
                    if ch == '\n' {
                        self.line += 1;
                    }
                    self.advance();
                }
            }
        }
        // closing quote
        self.advance();

        let lexeme = self.lexeme();
        let value = &lexeme[1..lexeme.len() - 1];
        self.add_token(TokenKind::String(value.into()));
    }

    fn scan_identifier(&mut self) {
        self.eat_while(|ch| ch.is_ascii_alphanumeric() || ch == '_');

        let sym = self.ctx.symbol(self.lexeme());
        match self.ctx.keyword(&sym) {
            Some(kind) => self.add_token(kind),
            None => self.add_token(TokenKind::Identifier(sym)),
        }
    }

    fn skip_line_comment(&mut self) {
        self.eat_while(|ch| ch != '\n');
    }

    /// Skips a possibly nested `/* ... */` comment whose opening delimiter was consumed.
    fn skip_block_comment(&mut self) {
        let mut depth = 1;
        while depth > 0 {
            match (self.peek(), self.peek_next()) {
                (None, _) => {
                    self.error(ParseError::UnterminatedComment);
                    return;
                }
                (Some('/'), Some('*')) => {
                    self.advance();
                    self.advance();
                    depth += 1;
                }
                (Some('*'), Some('/')) => {
                    self.advance();
                    self.advance();
                    depth -= 1;
                }
                (Some(ch), _) => {
                    if ch == '\n' {
                        self.line += 1;
                    }
                    self.advance();
                }
            }
        }
    }

    fn add_either(&mut self, next: char, matched: TokenKind, otherwise: TokenKind) {
        let kind = if self.eat(next) { matched } else { otherwise };
        self.add_token(kind);
    }

    fn add_token(&mut self, kind: TokenKind) {
        let token = Token::new(kind, self.lexeme(), self.line);
        self.tokens.push(token);
    }

    fn error(&mut self, error: ParseError) {
        self.diagnostics.push(Diagnostic::at_line(self.line, error));
    }

    fn lexeme(&self) -> &'a str {
        let src = self.src;
        &src[self.start..self.current]
    }

    fn peek(&self) -> Option<char> {
        self.src[self.current..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        self.src[self.current..].chars().nth(1)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.current += ch.len_utf8();
        Some(ch)
    }

    /// Consumes the next character if it is `expected`.
    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().map_or(false, &pred) {
            self.advance();
        }
    }
}
