use std::fmt;
use std::io::prelude::*;
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::debug;

use crate::ast::FunDecl;
use crate::env::Env;
use crate::eval::{Evaluator, Flow, RuntimeError};
use crate::interner::Symbol;
use crate::value::Value;

/// Host function.  Arity is checked by the caller, so `args` has the declared length.
pub type NativeFn = fn(&[Value]) -> Value;

/// A value that can be called: either a native function or a user-defined one.
pub struct Function {
    name: Symbol,
    arity: usize,
    body: FunctionBody,
}

enum FunctionBody {
    Native(NativeFn),
    User { decl: Rc<FunDecl>, closure: Rc<Env> },
}

impl Function {
    pub fn native(name: Symbol, arity: usize, f: NativeFn) -> Function {
        Function {
            name,
            arity,
            body: FunctionBody::Native(f),
        }
    }

    /// User function closing over `closure`, the frame active where `decl` was executed.
    pub fn user(decl: Rc<FunDecl>, closure: Rc<Env>) -> Function {
        Function {
            name: decl.name.clone(),
            arity: decl.params.len(),
            body: FunctionBody::User { decl, closure },
        }
    }

    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Calls the function with already evaluated arguments whose count matches the arity.
    pub fn call<W: Write>(
        &self,
        evaluator: &mut Evaluator<'_, W>,
        args: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        debug_assert_eq!(args.len(), self.arity);
        match &self.body {
            FunctionBody::Native(f) => Ok(f(&args)),
            FunctionBody::User { decl, closure } => {
                debug!(function = %self.name, arity = self.arity, "calling user function");
                // Parameters live in a fresh frame whose parent is the closure, not the
                // caller's frame.
                let frame = Env::with_parent(closure.clone());
                for (param, arg) in decl.params.iter().zip(args) {
                    frame.define(param, arg);
                }
                match evaluator.exec_block(&decl.body, frame)? {
                    Flow::Return(value) => Ok(value),
                    // The parser rejects a `break` that is not inside a loop of this body.
                    Flow::Normal | Flow::Break => Ok(Value::Nil),
                }
            }
        }
    }
}

// Dumping the closure could recurse forever: a function's frame usually holds the function.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.body {
            FunctionBody::Native(_) => "native",
            FunctionBody::User { .. } => "user",
        };
        f.debug_struct("Function")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .field("kind", &kind)
            .finish()
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.body {
            FunctionBody::Native(_) => write!(f, "<native fn>"),
            FunctionBody::User { .. } => write!(f, "<fn {}>", self.name),
        }
    }
}

/// Seconds elapsed since the Unix epoch.
pub fn clock(_args: &[Value]) -> Value {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();
    Value::Number(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctx::Context;

    #[test]
    fn clock_is_positive_and_monotonic_enough() {
        match (clock(&[]), clock(&[])) {
            (Value::Number(first), Value::Number(second)) => {
                assert!(first > 0.0);
                assert!(second >= first);
            }
            r => panic!("unexpected output: {:?}", r),
        }
    }

    #[test]
    fn native_display_and_arity() {
        let ctx = Context::new();
        let f = Function::native(ctx.symbol("clock"), 0, clock);
        assert_eq!(f.arity(), 0);
        assert_eq!(f.to_string(), "<native fn>");
    }

    #[test]
    fn user_function_takes_arity_from_params() {
        let ctx = Context::new();
        let decl = Rc::new(FunDecl {
            name: ctx.symbol("add"),
            params: vec![ctx.symbol("a"), ctx.symbol("b")],
            body: vec![],
        });
        let f = Function::user(decl, Env::new());
        assert_eq!(f.arity(), 2);
        assert_eq!(f.to_string(), "<fn add>");
    }
}
