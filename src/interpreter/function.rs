use std::rc::Rc;

use crate::ast::Stmt;

use super::env::Environment;

/// A closure: captures the environment in which `fn` was declared (SPEC_FULL.md
/// "Functions and callables"). Never stored in a heap object field or array
/// slot — see [`crate::value::Value::into_heap_value`].
pub struct Function {
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<[Stmt]>,
    pub closure: Environment,
}
