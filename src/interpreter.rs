//! API to control the interpreter.

use std::io::prelude::*;
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::ctx::Context;
use crate::eval::Evaluator;
use crate::parser::parse;
use crate::scanner::scan;

pub use crate::diag::{Diagnostic, Diagnostics, Location, ParseError, Position};
pub use crate::eval::{Fault, RuntimeError};

/// Tree-walk interpreter.
///
/// Globals survive from one call to [`Interpreter::eval`] to the next, which is what the
/// interactive prompt relies on.
///
/// # Example
///
/// Invoke the interpreter a first time to define a function then additional times to call this
/// function:
///
/// ```
/// # use tlox::interpreter::{Interpreter, LoxError};
///
/// let mut output: Vec<u8> = Vec::new();
/// let mut interp = Interpreter::new(&mut output);
///
/// let func_def = r#"
///     fun max(x, y) {
///         return x > y ? x : y;
///     }
/// "#;
/// interp.eval(func_def)?;
///
/// interp.eval("print max(10,20);").expect("interpreter error");
/// interp.eval("print max(5,4);").expect("interpreter error");
///
/// assert_eq!(output, b"20\n5\n");
/// # Ok::<(), LoxError>(())
/// ```
#[derive(Debug)]
pub struct Interpreter<'t, W: Write> {
    ctx: Rc<Context>,
    evaluator: Evaluator<'t, W>,
}

/// Errors the interpreter can raise.
#[derive(Debug, Error)]
pub enum LoxError {
    /// Errors found during lexical or syntactic analysis.  Nothing was evaluated.
    #[error("{0}")]
    Syntax(Diagnostics),

    /// Error that stopped evaluation.  Output written before it stays written.
    #[error("{0}")]
    Runtime(#[from] RuntimeError),
}

impl From<Diagnostics> for LoxError {
    fn from(d: Diagnostics) -> LoxError {
        LoxError::Syntax(d)
    }
}

impl<W: Write> Interpreter<'_, W> {
    pub fn new(output: &mut W) -> Interpreter<'_, W> {
        let ctx = Context::new();
        let evaluator = Evaluator::new(output, &ctx);
        Interpreter { ctx, evaluator }
    }

    /// Scans, parses and, if no diagnostic was raised, runs `source`.
    pub fn eval(&mut self, source: &str) -> Result<(), LoxError> {
        let (tokens, mut diagnostics) = scan(source, &self.ctx);
        let (prg, parse_diagnostics) = parse(&tokens);
        diagnostics.extend(parse_diagnostics);
        if !diagnostics.is_empty() {
            // Both passes report in source order; merge them.
            diagnostics.sort_by_key(|d| d.pos);
            debug!(count = diagnostics.len(), "rejecting program");
            return Err(Diagnostics(diagnostics).into());
        }
        self.evaluator.eval_stmts_in_global_env(&prg)?;
        Ok(())
    }
}
