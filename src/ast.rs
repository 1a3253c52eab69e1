use std::rc::Rc;

use crate::diag::Position;
use crate::interner::Symbol;

#[derive(Debug, PartialEq, Clone)]
pub enum Stmt {
    Expr(Expr),
    Print(Expr),
    Var(Symbol, Option<Expr>),
    Block(Vec<Stmt>),
    If(Expr, Box<Stmt>, Option<Box<Stmt>>),
    While(Expr, Box<Stmt>),
    Break,
    /// Shared with the function values created when the declaration runs.
    Function(Rc<FunDecl>),
    Return(Option<Expr>),
}

#[derive(Debug, PartialEq)]
pub struct FunDecl {
    pub name: Symbol,
    pub params: Vec<Symbol>,
    pub body: Vec<Stmt>,
}

/// Expressions that can fail at run time record the line of their operator (or, for
/// calls, of the closing parenthesis) so faults can be reported.
#[derive(Debug, PartialEq, Clone)]
pub enum Expr {
    Literal(Literal),
    Group(Box<Expr>),
    Unary(UnaryOp, Box<Expr>, Position),
    Binary(Box<Expr>, BinaryOp, Box<Expr>, Position),
    Logical(Box<Expr>, LogicalOp, Box<Expr>),
    Conditional(Box<Expr>, Box<Expr>, Box<Expr>),
    Assign(Symbol, Box<Expr>, Position),
    Var(Symbol, Position),
    Call(Box<Expr>, Vec<Expr>, Position),
}

#[derive(Debug, PartialEq, Clone)]
pub enum Literal {
    Nil,
    Bool(bool),
    Number(f64),
    Str(Rc<str>),
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum BinaryOp {
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum LogicalOp {
    And,
    Or,
}
