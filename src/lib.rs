//! A tree-walk interpreter for the Lox language.
//!
//! See [Crafting Interpreters](https://craftinginterpreters.com/).  On top of the core
//! language (no classes), this dialect has `break`, the `?:` conditional operator, nested
//! `/* */` comments and string concatenation with any value on the other side of `+`.
//!
//! # Examples
//!
//! See [`crate::interpreter::Interpreter`].
//!
//! # Limitations
//!
//! - `class`, `this` and `super` are reserved but not implemented.
//! - Variables are looked up by name at run time; there is no resolver pass.

#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]

pub mod interpreter;

mod ast;
mod callable;
mod ctx;
mod diag;
mod env;
mod eval;
mod interner;
mod parser;
mod scanner;
mod token;
mod value;
