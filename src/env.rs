//! Lexical scopes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::eval::Fault;
use crate::interner::Symbol;
use crate::value::Value;

/// One frame of the scope chain.
///
/// Frames are reference counted: a closure keeps the frame it was declared in alive after
/// the block or call that created it has returned.  Only the bindings of a frame change
/// after creation, never its parent link.
#[derive(Debug, Default)]
pub struct Env {
    parent: Option<Rc<Env>>,
    bindings: RefCell<HashMap<Symbol, Value>>,
}

impl Env {
    pub fn new() -> Rc<Env> {
        Rc::new(Env::default())
    }

    pub fn with_parent(parent: Rc<Env>) -> Rc<Env> {
        Rc::new(Env {
            parent: Some(parent),
            bindings: RefCell::default(),
        })
    }

    /// Binds `sym` in this frame, replacing any previous binding of this frame.
    pub fn define(&self, sym: &Symbol, val: Value) {
        self.bindings.borrow_mut().insert(sym.clone(), val);
    }

    /// Looks `sym` up in this frame, then in the enclosing ones.
    pub fn get(&self, sym: &Symbol) -> Result<Value, Fault> {
        let mut env = self;
        loop {
            if let Some(val) = env.bindings.borrow().get(sym) {
                return Ok(val.clone());
            }
            match &env.parent {
                Some(parent) => env = &**parent,
                None => return Err(Fault::UndefinedVariable(sym.name().to_owned())),
            }
        }
    }

    /// Rebinds the innermost existing binding of `sym`.  Never creates a binding.
    pub fn assign(&self, sym: &Symbol, val: Value) -> Result<(), Fault> {
        let mut env = self;
        loop {
            if let Some(slot) = env.bindings.borrow_mut().get_mut(sym) {
                *slot = val;
                return Ok(());
            }
            match &env.parent {
                Some(parent) => env = &**parent,
                None => return Err(Fault::UndefinedVariable(sym.name().to_owned())),
            }
        }
    }
}
