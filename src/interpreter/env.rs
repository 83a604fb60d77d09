//! Lexical scope chain (SPEC_FULL.md "Environments and scoping").
//!
//! Variable names are interned through a shared [`lasso::Rodeo`] so lookups
//! hash a small `Spur` key rather than re-hashing the raw identifier string
//! on every access — the same role `Rodeo` plays for runtime symbols in this
//! codebase's lineage.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use lasso::{Rodeo, Spur};

use crate::value::Value;

type Interner = Rc<RefCell<Rodeo<Spur>>>;

struct Scope {
    vars: HashMap<Spur, Value>,
    parent: Option<Environment>,
}

#[derive(Clone)]
pub struct Environment {
    scope: Rc<RefCell<Scope>>,
    interner: Interner,
}

impl Environment {
    pub fn new_root() -> Self {
        Self { scope: Rc::new(RefCell::new(Scope { vars: HashMap::new(), parent: None })), interner: Rc::new(RefCell::new(Rodeo::new())) }
    }

    pub fn child(&self) -> Self {
        Self {
            scope: Rc::new(RefCell::new(Scope { vars: HashMap::new(), parent: Some(self.clone()) })),
            interner: self.interner.clone(),
        }
    }

    fn intern(&self, name: &str) -> Spur {
        self.interner.borrow_mut().get_or_intern(name)
    }

    pub fn define(&self, name: &str, value: Value) {
        let key = self.intern(name);
        self.scope.borrow_mut().vars.insert(key, value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        let key = self.interner.borrow().get(name)?;
        self.get_by_key(key)
    }

    fn get_by_key(&self, key: Spur) -> Option<Value> {
        let scope = self.scope.borrow();
        if let Some(value) = scope.vars.get(&key) {
            return Some(value.clone());
        }
        scope.parent.as_ref()?.get_by_key(key)
    }

    /// Rebinds an existing variable anywhere up the scope chain. Returns
    /// `false` if `name` is not bound anywhere (caller should raise a
    /// reference error).
    pub fn assign(&self, name: &str, value: Value) -> bool {
        let key = self.intern(name);
        self.assign_by_key(key, value)
    }

    fn assign_by_key(&self, key: Spur, value: Value) -> bool {
        let mut scope = self.scope.borrow_mut();
        if scope.vars.contains_key(&key) {
            scope.vars.insert(key, value);
            return true;
        }
        match scope.parent.clone() {
            Some(parent) => {
                drop(scope);
                parent.assign_by_key(key, value)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_scope_shadows_and_falls_back() {
        let root = Environment::new_root();
        root.define("x", Value::Number(1.0));
        let child = root.child();
        assert!(matches!(child.get("x"), Some(Value::Number(n)) if n == 1.0));
        child.define("x", Value::Number(2.0));
        assert!(matches!(child.get("x"), Some(Value::Number(n)) if n == 2.0));
        assert!(matches!(root.get("x"), Some(Value::Number(n)) if n == 1.0));
    }

    #[test]
    fn assign_rebinds_in_defining_scope() {
        let root = Environment::new_root();
        root.define("x", Value::Number(1.0));
        let child = root.child();
        assert!(child.assign("x", Value::Number(5.0)));
        assert!(matches!(root.get("x"), Some(Value::Number(n)) if n == 5.0));
    }

    #[test]
    fn assign_to_undefined_name_fails() {
        let root = Environment::new_root();
        assert!(!root.assign("missing", Value::Null));
    }
}
