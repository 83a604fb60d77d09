//! Tree-walking interpreter: the evaluator binding surface (§4.5) plus the
//! ambient control-flow machinery (environments, functions, built-ins)
//! SPEC_FULL.md supplements around it.

pub mod env;
pub mod function;

use std::rc::Rc;

use crate::ast::{AssignTarget, BinaryOp, Expr, Program, Stmt, UnaryOp};
use crate::error::{CascadeError, Location};
use crate::heap::{Heap, HeapValue, ObjectId};
use crate::value::Value;

use env::Environment;
use function::Function;

/// Non-local control flow produced while executing a block of statements.
enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter {
    pub heap: Heap,
    globals: Environment,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self { heap: Heap::new(), globals: Environment::new_root() }
    }

    pub fn run(&mut self, program: &Program) -> Result<(), CascadeError> {
        let globals = self.globals.clone();
        self.exec_block(&program.statements, &globals)?;
        Ok(())
    }

    /// Looks up a top-level binding after a run, for embedding and tests.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name)
    }

    fn exec_block(&mut self, stmts: &[Stmt], env: &Environment) -> Result<Flow, CascadeError> {
        for stmt in stmts {
            if let Flow::Return(v) = self.exec_stmt(stmt, env)? {
                return Ok(Flow::Return(v));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, stmt: &Stmt, env: &Environment) -> Result<Flow, CascadeError> {
        match stmt {
            Stmt::Let { name, value } => {
                let v = self.eval(value, env)?;
                env.define(name, v);
                Ok(Flow::Normal)
            }
            Stmt::Assign { target, value, loc } => {
                let v = self.eval(value, env)?;
                self.assign(target, v, env, *loc)?;
                Ok(Flow::Normal)
            }
            Stmt::ExprStmt(expr) => {
                self.eval(expr, env)?;
                Ok(Flow::Normal)
            }
            Stmt::StructDecl(decl) => {
                let fields = decl.fields.iter().map(|f| (f.name.clone(), f.mandatory)).collect();
                self.heap.define_type(decl.name.clone(), fields);
                Ok(Flow::Normal)
            }
            Stmt::FnDecl { name, params, body } => {
                let function =
                    Function { name: name.clone(), params: params.clone(), body: Rc::from(body.clone()), closure: env.clone() };
                env.define(name, Value::Callable(Rc::new(function)));
                Ok(Flow::Normal)
            }
            Stmt::If { cond, then_branch, else_branch } => {
                if self.eval(cond, env)?.truthy() {
                    self.exec_block(then_branch, &env.child())
                } else if let Some(else_branch) = else_branch {
                    self.exec_block(else_branch, &env.child())
                } else {
                    Ok(Flow::Normal)
                }
            }
            Stmt::While { cond, body } => {
                while self.eval(cond, env)?.truthy() {
                    if let Flow::Return(v) = self.exec_block(body, &env.child())? {
                        return Ok(Flow::Return(v));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::Return { value, .. } => {
                let v = match value {
                    Some(expr) => self.eval(expr, env)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(v))
            }
            Stmt::Print { args, .. } => {
                let mut rendered = Vec::with_capacity(args.len());
                for arg in args {
                    rendered.push(self.eval(arg, env)?.to_string());
                }
                println!("{}", rendered.join(" "));
                Ok(Flow::Normal)
            }
        }
    }

    fn assign(&mut self, target: &AssignTarget, value: Value, env: &Environment, loc: Location) -> Result<(), CascadeError> {
        match target {
            AssignTarget::Ident(name) => {
                if !env.assign(name, value) {
                    return Err(CascadeError::reference(name.clone(), loc));
                }
                Ok(())
            }
            AssignTarget::Field(target_expr, field) => {
                let target_val = self.eval(target_expr, env)?;
                let id = self.expect_object(&target_val, loc)?;
                let type_name = self.heap.get_object(id).and_then(|o| o.type_name.clone());
                let mandatory = self.heap.is_field_mandatory(type_name.as_deref(), field);
                let heap_value = value.into_heap_value(loc)?;
                self.heap.set_field(id, field, heap_value, mandatory);
                Ok(())
            }
            AssignTarget::Index(target_expr, index_expr) => {
                let target_val = self.eval(target_expr, env)?;
                let id = self.expect_array(&target_val, loc)?;
                let index_val = self.eval(index_expr, env)?;
                let index = self.expect_index(&index_val, loc)?;
                let heap_value = value.into_heap_value(loc)?;
                self.heap.array_set_index(id, index, heap_value);
                Ok(())
            }
        }
    }

    fn eval(&mut self, expr: &Expr, env: &Environment) -> Result<Value, CascadeError> {
        match expr {
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::Bool(b) => Ok(Value::Bool(*b)),
            Expr::Str(s) => Ok(Value::str(s.clone())),
            Expr::Null => Ok(Value::Null),
            Expr::Ident(name, loc) => env.get(name).ok_or_else(|| CascadeError::reference(name.clone(), *loc)),
            Expr::New { type_name, fields, loc } => {
                let heap_fields = self.eval_field_list(fields, env, *loc)?;
                Ok(Value::Object(self.heap.create_object(Some(type_name.clone()), heap_fields)))
            }
            Expr::ObjectLit { fields, loc } => {
                let heap_fields = self.eval_field_list(fields, env, *loc)?;
                Ok(Value::Object(self.heap.create_object(None, heap_fields)))
            }
            Expr::ArrayLit { elements, loc } => {
                let mut values = Vec::with_capacity(elements.len());
                for e in elements {
                    let v = self.eval(e, env)?;
                    values.push(v.into_heap_value(*loc)?);
                }
                Ok(Value::Object(self.heap.create_array(values)))
            }
            Expr::Field { target, name, loc } => {
                let target_val = self.eval(target, env)?;
                let id = self.expect_object(&target_val, *loc)?;
                Ok(Value::from(self.heap.get_field(id, name)))
            }
            Expr::Index { target, index, loc } => {
                let target_val = self.eval(target, env)?;
                let id = self.expect_array(&target_val, *loc)?;
                let index_val = self.eval(index, env)?;
                let idx = self.expect_index(&index_val, *loc)?;
                Ok(Value::from(self.heap.get_field(id, &idx.to_string())))
            }
            Expr::Call { callee, args, loc } => self.eval_call(callee, args, env, *loc),
            Expr::Unary { op, expr, loc } => self.eval_unary(*op, expr, env, *loc),
            Expr::Binary { op, left, right, loc } => self.eval_binary(*op, left, right, env, *loc),
        }
    }

    fn eval_field_list(
        &mut self,
        fields: &[(String, Expr)],
        env: &Environment,
        loc: Location,
    ) -> Result<Vec<(String, HeapValue)>, CascadeError> {
        let mut heap_fields = Vec::with_capacity(fields.len());
        for (name, expr) in fields {
            let v = self.eval(expr, env)?;
            heap_fields.push((name.clone(), v.into_heap_value(loc)?));
        }
        Ok(heap_fields)
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], env: &Environment, loc: Location) -> Result<Value, CascadeError> {
        // `assert` is a built-in, not a user-bindable value (SPEC_FULL.md "Built-ins").
        if let Expr::Ident(name, _) = callee {
            if name == "assert" {
                return self.eval_assert(args, env, loc);
            }
        }

        let callee_val = self.eval(callee, env)?;
        let function = match callee_val {
            Value::Callable(f) => f,
            other => return Err(CascadeError::type_error(format!("cannot call a value of type {}", other.type_name()), loc)),
        };

        let mut arg_values = Vec::with_capacity(args.len());
        for arg in args {
            arg_values.push(self.eval(arg, env)?);
        }

        let call_env = function.closure.child();
        for (i, param) in function.params.iter().enumerate() {
            call_env.define(param, arg_values.get(i).cloned().unwrap_or(Value::Null));
        }

        match self.exec_block(&function.body, &call_env)? {
            Flow::Return(v) => Ok(v),
            Flow::Normal => Ok(Value::Null),
        }
    }

    fn eval_assert(&mut self, args: &[Expr], env: &Environment, loc: Location) -> Result<Value, CascadeError> {
        if args.is_empty() {
            return Err(CascadeError::type_error("assert expects at least 1 argument", loc));
        }
        let cond = self.eval(&args[0], env)?;
        if cond.truthy() {
            return Ok(Value::Null);
        }
        let message = match args.get(1) {
            Some(expr) => self.eval(expr, env)?.concat_str(),
            None => "assertion failed".to_string(),
        };
        Err(CascadeError::assertion(message, loc))
    }

    fn eval_unary(&mut self, op: UnaryOp, expr: &Expr, env: &Environment, loc: Location) -> Result<Value, CascadeError> {
        let v = self.eval(expr, env)?;
        match op {
            UnaryOp::Not => Ok(Value::Bool(!v.truthy())),
            UnaryOp::Neg => match v {
                Value::Number(n) => Ok(Value::Number(-n)),
                other => Err(CascadeError::type_error(format!("cannot negate a value of type {}", other.type_name()), loc)),
            },
        }
    }

    fn eval_binary(&mut self, op: BinaryOp, left: &Expr, right: &Expr, env: &Environment, loc: Location) -> Result<Value, CascadeError> {
        match op {
            BinaryOp::And => {
                let l = self.eval(left, env)?;
                if !l.truthy() {
                    return Ok(l);
                }
                self.eval(right, env)
            }
            BinaryOp::Or => {
                let l = self.eval(left, env)?;
                if l.truthy() {
                    return Ok(l);
                }
                self.eval(right, env)
            }
            _ => {
                let l = self.eval(left, env)?;
                let r = self.eval(right, env)?;
                match op {
                    BinaryOp::Add => match (&l, &r) {
                        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                        (Value::Str(_), _) | (_, Value::Str(_)) => Ok(Value::str(format!("{}{}", l.concat_str(), r.concat_str()))),
                        _ => Err(CascadeError::type_error(format!("cannot add {} and {}", l.type_name(), r.type_name()), loc)),
                    },
                    BinaryOp::Sub => numeric(l, r, loc, |a, b| a - b),
                    BinaryOp::Mul => numeric(l, r, loc, |a, b| a * b),
                    BinaryOp::Div => numeric(l, r, loc, |a, b| a / b),
                    BinaryOp::Eq => Ok(Value::Bool(values_equal(&l, &r))),
                    BinaryOp::Ne => Ok(Value::Bool(!values_equal(&l, &r))),
                    BinaryOp::Lt => compare(l, r, loc, |a, b| a < b),
                    BinaryOp::Gt => compare(l, r, loc, |a, b| a > b),
                    BinaryOp::Le => compare(l, r, loc, |a, b| a <= b),
                    BinaryOp::Ge => compare(l, r, loc, |a, b| a >= b),
                    BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
                }
            }
        }
    }

    fn expect_object(&self, value: &Value, loc: Location) -> Result<ObjectId, CascadeError> {
        match value {
            Value::Object(id) => Ok(*id),
            other => Err(CascadeError::type_error(format!("field access on a value of type {}", other.type_name()), loc)),
        }
    }

    fn expect_array(&self, value: &Value, loc: Location) -> Result<ObjectId, CascadeError> {
        let id = match value {
            Value::Object(id) => *id,
            other => return Err(CascadeError::type_error(format!("cannot index a value of type {}", other.type_name()), loc)),
        };
        match self.heap.get_object(id) {
            Some(obj) if !obj.is_array() => Err(CascadeError::type_error("cannot index a non-array object", loc)),
            _ => Ok(id),
        }
    }

    fn expect_index(&self, value: &Value, loc: Location) -> Result<u64, CascadeError> {
        match value {
            Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Ok(*n as u64),
            other => Err(CascadeError::type_error(format!("array index must be a non-negative integer, found {}", other.type_name()), loc)),
        }
    }
}

fn numeric(l: Value, r: Value, loc: Location, f: impl Fn(f64, f64) -> f64) -> Result<Value, CascadeError> {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Number(f(a, b))),
        (a, b) => Err(CascadeError::type_error(format!("expected numbers, found {} and {}", a.type_name(), b.type_name()), loc)),
    }
}

fn compare(l: Value, r: Value, loc: Location, f: impl Fn(f64, f64) -> bool) -> Result<Value, CascadeError> {
    match (l, r) {
        (Value::Number(a), Value::Number(b)) => Ok(Value::Bool(f(a, b))),
        (a, b) => Err(CascadeError::type_error(format!("expected numbers, found {} and {}", a.type_name(), b.type_name()), loc)),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Str(x), Value::Str(y)) => x == y,
        (Value::Null, Value::Null) => true,
        (Value::Object(x), Value::Object(y)) => x == y,
        (Value::Callable(x), Value::Callable(y)) => Rc::ptr_eq(x, y),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::Parser;

    fn run(src: &str) -> Interpreter {
        let program = Parser::new(lex(src).unwrap()).parse_program().unwrap();
        let mut interp = Interpreter::new();
        interp.run(&program).unwrap();
        interp
    }

    fn run_err(src: &str) -> CascadeError {
        let program = Parser::new(lex(src).unwrap()).parse_program().unwrap();
        let mut interp = Interpreter::new();
        interp.run(&program).unwrap_err()
    }

    #[test]
    fn scenario_optional_cascade() {
        let interp = run(
            r#"
            struct N { mandatory id, optional next, }
            let a = new N { id: 1 };
            let b = new N { id: 2 };
            a.next = b;
            b.id = null;
            "#,
        );
        let a_id = interp.globals_lookup("a");
        let b_id = interp.globals_lookup("b");
        assert!(interp.heap.is_live(a_id));
        assert!(!interp.heap.is_live(b_id));
    }

    #[test]
    fn scenario_local_rebind_does_not_cascade() {
        let interp = run(
            r#"
            struct N { mandatory head, }
            let a = new N { };
            let b = new N { };
            a.head = b;
            b = null;
            "#,
        );
        let a_id = interp.globals_lookup("a");
        assert!(interp.heap.is_live(a_id));
    }

    #[test]
    fn scenario_mandatory_cascade_propagates() {
        let interp = run(
            r#"
            struct N { mandatory id, mandatory next, }
            let a = new N { id: 1 };
            let b = new N { id: 2 };
            a.next = b;
            b.id = null;
            "#,
        );
        let a_id = interp.globals_lookup("a");
        let b_id = interp.globals_lookup("b");
        assert!(!interp.heap.is_live(b_id));
        assert!(!interp.heap.is_live(a_id));
    }

    #[test]
    fn functions_and_recursion() {
        let interp = run(
            r#"
            fn fact(n) {
                if n <= 1 {
                    return 1;
                }
                return n * fact(n - 1);
            }
            let r = fact(5);
            "#,
        );
        match interp.global("r") {
            Some(Value::Number(n)) => assert_eq!(n, 120.0),
            other => panic!("unexpected result: {:?}", other.map(|v| v.to_string())),
        }
    }

    #[test]
    fn assert_failure_raises_error() {
        let err = run_err("assert(1 == 2, \"nope\");");
        match err {
            CascadeError::Assertion { message, .. } => assert_eq!(message, "nope"),
            other => panic!("expected assertion error, got {:?}", other),
        }
    }

    #[test]
    fn undefined_variable_is_reference_error() {
        let err = run_err("print missing;");
        assert!(matches!(err, CascadeError::Reference { .. }));
    }

    #[test]
    fn field_access_on_non_object_is_type_error() {
        let err = run_err("let a = 1; a.x = 2;");
        assert!(matches!(err, CascadeError::Type { .. }));
    }

    impl Interpreter {
        fn globals_lookup(&self, name: &str) -> ObjectId {
            match self.global(name) {
                Some(Value::Object(id)) => id,
                other => panic!("expected object for `{}`, found {:?}", name, other.map(|v| v.to_string())),
            }
        }
    }
}
