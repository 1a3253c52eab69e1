//! Lox interpreter command-line.
//!
//! When called without argument it drops into an interactive read-evaluate-print loop whose
//! globals persist from one line to the next.
//!
//! When called with a path, it runs that script and exits with status 65 on syntax errors and
//! 70 on runtime errors.  Set `RUST_LOG` to get interpreter traces on stderr.

use std::env;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::process;

use anyhow::{self, Context};

use tlox::interpreter::{Interpreter, LoxError};

const EX_USAGE: i32 = 64;
const EX_DATAERR: i32 = 65;
const EX_SOFTWARE: i32 = 70;

fn main() -> Result<(), anyhow::Error> {
    init_tracing();

    let args = env::args().skip(1).collect::<Vec<_>>();
    match args.as_slice() {
        [] => run_prompt()?,
        [path] => run_file(path)?,
        _ => {
            eprintln!("Usage: tlox [script]");
            process::exit(EX_USAGE);
        }
    }
    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if env::var("RUST_LOG").is_ok() {
        let filter = EnvFilter::from_default_env();
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(io::stderr)
                    .with_target(true)
                    .with_level(true),
            )
            .with(filter)
            .init();
    }
}

fn run_file(path: &str) -> Result<(), anyhow::Error> {
    let source = fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?;

    let mut interp_stdout = io::stdout();
    let mut interp = Interpreter::new(&mut interp_stdout);
    let result = interp.eval(&source);
    drop(interp);
    interp_stdout.flush()?;

    match result {
        Ok(()) => Ok(()),
        Err(e @ LoxError::Syntax(_)) => {
            eprintln!("{}", e);
            process::exit(EX_DATAERR);
        }
        Err(LoxError::Runtime(e)) if e.fault().is_some() => {
            eprintln!("{}", e);
            process::exit(EX_SOFTWARE);
        }
        Err(e) => Err(e.into()),
    }
}

fn run_prompt() -> Result<(), io::Error> {
    let stdin = io::stdin();
    let mut repl_stdout = io::stdout();
    let mut interp_stdout = io::stdout();

    let mut interp = Interpreter::new(&mut interp_stdout);

    let mut input = String::new();
    loop {
        repl_stdout.write_all(b"> ")?;
        repl_stdout.flush()?;

        input.clear();
        let nbytes = stdin.read_line(&mut input)?;
        if nbytes == 0 {
            break;
        }

        if let Err(e) = interp.eval(&input) {
            eprintln!("{}", e);
        }
    }

    Ok(())
}
