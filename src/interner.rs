//! Identifier interning.
//!
//! Every identifier the scanner meets is mapped to a `Symbol`.  Two symbols with the same
//! spelling share the same allocation, so environments can hash and compare them cheaply.

use std::borrow::Borrow;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// Set of all spellings seen so far.
#[derive(Debug, Default)]
pub struct Interner(HashSet<Symbol>);

impl Interner {
    pub fn new() -> Interner {
        Interner::default()
    }

    /// Returns the symbol spelled `name`, allocating it on first sight.
    pub fn symbol(&mut self, name: &str) -> Symbol {
        if let Some(sym) = self.0.get(name) {
            return sym.clone();
        }
        let sym = Symbol(Rc::from(name));
        self.0.insert(sym.clone());
        sym
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// An interned identifier.  Equality is by address.
#[derive(Debug, Clone)]
pub struct Symbol(Rc<str>);

impl Symbol {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Symbol {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// Must agree with `Borrow<str>`: hash the spelling, not the pointer.
impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Symbol {}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
