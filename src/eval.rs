use std::io;
use std::io::prelude::*;
use std::rc::Rc;

use thiserror::Error;
use tracing::{trace, warn};

use crate::ast::{BinaryOp, Expr, LogicalOp, Stmt, UnaryOp};
use crate::callable::{self, Function};
use crate::ctx::Context;
use crate::diag::Position;
use crate::env::Env;
use crate::value::Value;

/// Error aborting evaluation.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("{fault}\n[line {pos}]")]
    Fault { pos: Position, fault: Fault },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl RuntimeError {
    fn at(pos: Position, fault: Fault) -> RuntimeError {
        RuntimeError::Fault { pos, fault }
    }

    /// The fault, unless evaluation stopped because output could not be written.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            RuntimeError::Fault { fault, .. } => Some(fault),
            RuntimeError::Io(_) => None,
        }
    }
}

/// Language-level runtime faults.
#[derive(Debug, PartialEq, Clone, Error)]
pub enum Fault {
    #[error("division by zero")]
    DivByZero,
    #[error("operand must be a number")]
    NumberOperand,
    #[error("operands must be numbers")]
    NumberOperands,
    #[error("operands must be two numbers or include a string")]
    AddOperands,
    #[error("undefined variable '{0}'")]
    UndefinedVariable(String),
    #[error("can only call functions")]
    NotCallable,
    #[error("expected {expected} arguments but got {actual}")]
    BadNumberOfArguments { expected: usize, actual: usize },
}

/// How a statement finished.
///
/// `Break` stops the innermost enclosing `while`; `Return` unwinds to the enclosing
/// function call.  Neither travels on the error channel.
#[derive(Debug, PartialEq)]
pub enum Flow {
    Normal,
    Break,
    Return(Value),
}

#[derive(Debug)]
pub struct Evaluator<'t, W: Write> {
    output: &'t mut W,
    globals: Rc<Env>,
}

impl<'a, W: Write> Evaluator<'a, W> {
    pub fn new(output: &'a mut W, ctx: &Context) -> Evaluator<'a, W> {
        let globals = Env::new();
        let clock = ctx.symbol("clock");
        globals.define(
            &clock,
            Value::Function(Rc::new(Function::native(clock.clone(), 0, callable::clock))),
        );
        Evaluator { output, globals }
    }

    /// Runs a program in the global frame.  Stops at the first fault.
    pub fn eval_stmts_in_global_env(&mut self, stmts: &[Stmt]) -> Result<(), RuntimeError> {
        let globals = self.globals.clone();
        for stmt in stmts {
            match self.exec(stmt, &globals)? {
                Flow::Normal => (),
                // The parser rejects top-level `break` and `return`.
                flow => {
                    warn!(?flow, "control flow escaped to top level");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Runs `stmts` in `env`.  The caller's frame is untouched whatever the outcome.
    pub(crate) fn exec_block(&mut self, stmts: &[Stmt], env: Rc<Env>) -> Result<Flow, RuntimeError> {
        for stmt in stmts {
            match self.exec(stmt, &env)? {
                Flow::Normal => (),
                flow => return Ok(flow),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec(&mut self, stmt: &Stmt, env: &Rc<Env>) -> Result<Flow, RuntimeError> {
        trace!(?stmt, "exec");
        match stmt {
            Stmt::Expr(e) => {
                self.eval_expr(e, env)?;
            }
            Stmt::Print(e) => {
                let v = self.eval_expr(e, env)?;
                writeln!(self.output, "{}", v)?;
            }
            Stmt::Var(sym, init) => {
                let v = match init {
                    Some(e) => self.eval_expr(e, env)?,
                    None => Value::Nil,
                };
                env.define(sym, v);
            }
            Stmt::Block(stmts) => return self.exec_block(stmts, Env::with_parent(env.clone())),
            Stmt::If(cond, then_branch, else_branch) => {
                if self.eval_expr(cond, env)?.is_truthy() {
                    return self.exec(then_branch, env);
                } else if let Some(else_branch) = else_branch {
                    return self.exec(else_branch, env);
                }
            }
            Stmt::While(cond, body) => {
                while self.eval_expr(cond, env)?.is_truthy() {
                    match self.exec(body, env)? {
                        Flow::Normal => (),
                        Flow::Break => break,
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
            }
            Stmt::Break => return Ok(Flow::Break),
            Stmt::Function(decl) => {
                // The closure is the current frame, which is also where the name is bound:
                // the body can refer to the function itself.
                let f = Function::user(decl.clone(), env.clone());
                env.define(&decl.name, Value::Function(Rc::new(f)));
            }
            Stmt::Return(e) => {
                let v = match e {
                    Some(e) => self.eval_expr(e, env)?,
                    None => Value::Nil,
                };
                return Ok(Flow::Return(v));
            }
        }
        Ok(Flow::Normal)
    }

    fn eval_expr(&mut self, expr: &Expr, env: &Rc<Env>) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(lit) => Ok(Value::from(lit)),
            Expr::Group(e) => self.eval_expr(e, env),
            Expr::Var(sym, pos) => env.get(sym).map_err(|f| RuntimeError::at(*pos, f)),
            Expr::Assign(sym, rhs, pos) => {
                let v = self.eval_expr(rhs, env)?;
                env.assign(sym, v.clone())
                    .map_err(|f| RuntimeError::at(*pos, f))?;
                Ok(v)
            }
            Expr::Unary(op, operand, pos) => {
                let v = self.eval_expr(operand, env)?;
                match (op, v) {
                    (UnaryOp::Not, v) => Ok(Value::Bool(!v.is_truthy())),
                    (UnaryOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
                    (UnaryOp::Neg, _) => Err(RuntimeError::at(*pos, Fault::NumberOperand)),
                }
            }
            Expr::Binary(lhs, op, rhs, pos) => {
                let l = self.eval_expr(lhs, env)?;
                let r = self.eval_expr(rhs, env)?;
                binary(*op, l, r).map_err(|f| RuntimeError::at(*pos, f))
            }
            Expr::Logical(lhs, op, rhs) => {
                let l = self.eval_expr(lhs, env)?;
                match (op, l.is_truthy()) {
                    (LogicalOp::Or, true) | (LogicalOp::And, false) => Ok(l),
                    _ => self.eval_expr(rhs, env),
                }
            }
            Expr::Conditional(cond, then_branch, else_branch) => {
                if self.eval_expr(cond, env)?.is_truthy() {
                    self.eval_expr(then_branch, env)
                } else {
                    self.eval_expr(else_branch, env)
                }
            }
            Expr::Call(callee, args, pos) => {
                let callee = self.eval_expr(callee, env)?;
                let args = args
                    .iter()
                    .map(|a| self.eval_expr(a, env))
                    .collect::<Result<Vec<Value>, RuntimeError>>()?;
                let f = match callee {
                    Value::Function(f) => f,
                    _ => return Err(RuntimeError::at(*pos, Fault::NotCallable)),
                };
                if args.len() != f.arity() {
                    return Err(RuntimeError::at(
                        *pos,
                        Fault::BadNumberOfArguments {
                            expected: f.arity(),
                            actual: args.len(),
                        },
                    ));
                }
                f.call(self, args)
            }
        }
    }
}

fn binary(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, Fault> {
    use Value::{Bool, Number, Str};

    match (op, lhs, rhs) {
        (BinaryOp::Equal, l, r) => Ok(Bool(l == r)),
        (BinaryOp::NotEqual, l, r) => Ok(Bool(l != r)),
        (BinaryOp::Add, Number(l), Number(r)) => Ok(Number(l + r)),
        (BinaryOp::Add, l @ Str(_), r) | (BinaryOp::Add, l, r @ Str(_)) => {
            Ok(Str(format!("{}{}", l, r).into()))
        }
        (BinaryOp::Add, _, _) => Err(Fault::AddOperands),
        (BinaryOp::Sub, Number(l), Number(r)) => Ok(Number(l - r)),
        (BinaryOp::Mul, Number(l), Number(r)) => Ok(Number(l * r)),
        (BinaryOp::Div, Number(_), Number(r)) if r == 0.0 => Err(Fault::DivByZero),
        (BinaryOp::Div, Number(l), Number(r)) => Ok(Number(l / r)),
        (BinaryOp::Less, Number(l), Number(r)) => Ok(Bool(l < r)),
        (BinaryOp::LessEqual, Number(l), Number(r)) => Ok(Bool(l <= r)),
        (BinaryOp::Greater, Number(l), Number(r)) => Ok(Bool(l > r)),
        (BinaryOp::GreaterEqual, Number(l), Number(r)) => Ok(Bool(l >= r)),
        _ => Err(Fault::NumberOperands),
    }
}
