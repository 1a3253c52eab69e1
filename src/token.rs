use std::fmt;
use std::rc::Rc;

use crate::diag::Position;
use crate::interner::Symbol;

/// Lexical category of a token.  Literal-bearing kinds carry their value.
#[derive(Debug, PartialEq, Clone)]
pub enum TokenKind {
    Eof,

    // Punctuation and operators
    LeftParen,
    RightParen,
    LeftCurly,
    RightCurly,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,
    Question,
    Colon,
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Keywords
    And,
    Break,
    Class,
    Else,
    False,
    For,
    Fun,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    Identifier(Symbol),
    String(Rc<str>),
    Number(f64),
}

impl TokenKind {
    /// Whether this token may start a statement.  Used by the parser when resynchronizing.
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Eof => "EOF",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::LeftCurly => "{",
            TokenKind::RightCurly => "}",
            TokenKind::Comma => ",",
            TokenKind::Dot => ".",
            TokenKind::Minus => "-",
            TokenKind::Plus => "+",
            TokenKind::Semicolon => ";",
            TokenKind::Slash => "/",
            TokenKind::Star => "*",
            TokenKind::Question => "?",
            TokenKind::Colon => ":",
            TokenKind::Bang => "!",
            TokenKind::BangEqual => "!=",
            TokenKind::Equal => "=",
            TokenKind::EqualEqual => "==",
            TokenKind::Greater => ">",
            TokenKind::GreaterEqual => ">=",
            TokenKind::Less => "<",
            TokenKind::LessEqual => "<=",
            TokenKind::And => "and",
            TokenKind::Break => "break",
            TokenKind::Class => "class",
            TokenKind::Else => "else",
            TokenKind::False => "false",
            TokenKind::For => "for",
            TokenKind::Fun => "fun",
            TokenKind::If => "if",
            TokenKind::Nil => "nil",
            TokenKind::Or => "or",
            TokenKind::Print => "print",
            TokenKind::Return => "return",
            TokenKind::Super => "super",
            TokenKind::This => "this",
            TokenKind::True => "true",
            TokenKind::Var => "var",
            TokenKind::While => "while",
            TokenKind::Identifier(sym) => return write!(f, "{}", sym),
            TokenKind::String(s) => return write!(f, "\"{}\"", s),
            TokenKind::Number(n) => return write!(f, "{}", n),
        };
        f.write_str(text)
    }
}

/// "Words" produced by the scanner.
#[derive(Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text the token was scanned from.
    pub lexeme: String,
    pub line: Position,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: Position) -> Token {
        Token {
            kind,
            lexeme: lexeme.into(),
            line,
        }
    }
}
