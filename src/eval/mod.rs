mod builtin;
mod value;

pub use builtin::BuiltinKind;
pub use value::{Closure, Native, Value};

use crate::context::Context;
use crate::error::{Error, Result};
use crate::parse::{parse_chunk, BinOp, Expr, Program, Stmt, UnOp};

use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;

pub(crate) type Scope = Rc<RefCell<HashMap<String, Value>>>;

const MAX_CALL_DEPTH: usize = 256;

/// Parses `source` and runs it against `context`.
pub fn run(source: &str, context: &mut Context) -> Result<Value> {
    let program = parse_chunk(source)?;
    Interpreter::new(context).exec(&program)
}

/// Leaves the normal flow of a block.
enum Unwind {
    Break,
    Continue,
    Return(Value),
    Error(Error),
}

impl From<Error> for Unwind {
    fn from(err: Error) -> Self {
        Self::Error(err)
    }
}

type Exec<T> = std::result::Result<T, Unwind>;

/// Runs programs against a context.
///
/// Block and function scopes live here and are dropped with the
/// interpreter, so only top-level bindings reach the context.
pub struct Interpreter<'a> {
    context: &'a mut Context,
    scopes: Vec<Scope>,
    depth: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(context: &'a mut Context) -> Self {
        Self {
            context,
            scopes: Vec::new(),
            depth: 0,
        }
    }

    pub fn exec(&mut self, program: &Program) -> Result<Value> {
        match self.exec_stmts(&program.0) {
            Ok(value) => Ok(value),
            Err(Unwind::Error(err)) => Err(err),
            Err(Unwind::Break) => Err(Error::syntax("Illegal break statement")),
            Err(Unwind::Continue) => Err(Error::syntax(
                "Illegal continue statement: no surrounding iteration statement",
            )),
            Err(Unwind::Return(_)) => Err(Error::syntax("Illegal return statement")),
        }
    }

    fn exec_stmts(&mut self, stmts: &[Stmt]) -> Exec<Value> {
        let mut last = Value::Null;
        for stmt in stmts {
            last = self.exec_stmt(stmt)?;
        }
        Ok(last)
    }

    fn exec_scoped(&mut self, stmts: &[Stmt]) -> Exec<Value> {
        self.scopes.push(Scope::default());
        let res = self.exec_stmts(stmts);
        self.scopes.pop();
        res
    }

    fn exec_stmt(&mut self, stmt: &Stmt) -> Exec<Value> {
        match stmt {
            Stmt::Let(name, init) => {
                let value = match init {
                    Some(e) => self.eval(e)?,
                    None => Value::Null,
                };
                self.declare(name, value);
                Ok(Value::Null)
            }
            Stmt::While(cond, body) => {
                while self.eval(cond)?.truthy() {
                    match self.exec_scoped(body) {
                        Ok(_) | Err(Unwind::Continue) => continue,
                        Err(Unwind::Break) => break,
                        Err(other) => return Err(other),
                    }
                }
                Ok(Value::Null)
            }
            Stmt::Break => Err(Unwind::Break),
            Stmt::Continue => Err(Unwind::Continue),
            Stmt::Return(value) => {
                let value = match value {
                    Some(e) => self.eval(e)?,
                    None => Value::Null,
                };
                Err(Unwind::Return(value))
            }
            Stmt::Throw(e) => {
                let value = self.eval(e)?;
                Err(Error::Thrown(value).into())
            }
            Stmt::Expr(e) => self.eval(e),
        }
    }

    fn declare(&mut self, name: &str, value: Value) {
        match self.scopes.last() {
            Some(scope) => {
                scope.borrow_mut().insert(name.to_string(), value);
            }
            None => {
                self.context.set(name, value);
            }
        }
    }

    fn lookup(&self, name: &str) -> Result<Value> {
        for scope in self.scopes.iter().rev() {
            if let Some(value) = scope.borrow().get(name) {
                return Ok(value.clone());
            }
        }

        if let Some(value) = self.context.get(name) {
            return Ok(value.clone());
        }

        match BuiltinKind::new(name) {
            Some(kind) => Ok(Value::Native(kind.into())),
            None => Err(Error::reference(format!("{} is not defined", name))),
        }
    }

    fn assign(&mut self, name: &str, value: Value) {
        for scope in self.scopes.iter().rev() {
            let mut scope = scope.borrow_mut();
            if let Some(slot) = scope.get_mut(name) {
                *slot = value;
                return;
            }
        }
        self.context.set(name, value);
    }

    fn eval(&mut self, expr: &Expr) -> Exec<Value> {
        Ok(match expr {
            Expr::Null => Value::Null,
            Expr::Bool(b) => Value::Bool(*b),
            Expr::Number(n) => Value::Number(*n),
            Expr::Str(s) => Value::Str(s.clone()),
            Expr::List(items) => {
                let items = items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Exec<Vec<_>>>()?;
                Value::list(items)
            }
            Expr::Var(name) => self.lookup(name)?,
            Expr::Assign(name, value) => {
                let value = self.eval(value)?;
                self.assign(name, value.clone());
                value
            }
            Expr::Unary(op, operand) => {
                let operand = self.eval(operand)?;
                unary(*op, operand)?
            }
            Expr::Binary(BinOp::And, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                if lhs.truthy() {
                    self.eval(rhs)?
                } else {
                    lhs
                }
            }
            Expr::Binary(BinOp::Or, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                if lhs.truthy() {
                    lhs
                } else {
                    self.eval(rhs)?
                }
            }
            Expr::Binary(op, lhs, rhs) => {
                let lhs = self.eval(lhs)?;
                let rhs = self.eval(rhs)?;
                binary(*op, lhs, rhs)?
            }
            Expr::Call(callee, args) => {
                let func = self.eval(callee)?;
                let args = args
                    .iter()
                    .map(|arg| self.eval(arg))
                    .collect::<Exec<Vec<_>>>()?;
                self.call(callee, func, &args)?
            }
            Expr::Index(target, index) => {
                let target = self.eval(target)?;
                let index = self.eval(index)?;
                index_of(&target, &index)?
            }
            Expr::Block(body) => self.exec_scoped(body)?,
            Expr::If(cond, then, other) => {
                if self.eval(cond)?.truthy() {
                    self.exec_scoped(then)?
                } else if let Some(other) = other {
                    self.eval(other)?
                } else {
                    Value::Null
                }
            }
            Expr::Fn(def) => Value::Function(Rc::new(Closure {
                def: Rc::clone(def),
                captured: self.scopes.clone(),
            })),
        })
    }

    fn call(&mut self, callee: &Expr, func: Value, args: &[Value]) -> Result<Value> {
        match func {
            Value::Function(closure) => self.call_closure(&closure, args),
            Value::Native(native) => {
                trace!(name = native.name(), "calling native function");
                native.call(args)
            }
            other => {
                let shown = match callee {
                    Expr::Var(name) => name.clone(),
                    _ => other.inspect(),
                };
                Err(Error::type_(format!("{} is not a function", shown)))
            }
        }
    }

    fn call_closure(&mut self, closure: &Closure, args: &[Value]) -> Result<Value> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(Error::range("Maximum call stack size exceeded"));
        }

        let frame = closure
            .def
            .params
            .iter()
            .enumerate()
            .map(|(i, param)| (param.clone(), args.get(i).cloned().unwrap_or(Value::Null)))
            .collect::<HashMap<_, _>>();

        let mut scopes = closure.captured.clone();
        scopes.push(Rc::new(RefCell::new(frame)));
        let saved = std::mem::replace(&mut self.scopes, scopes);
        self.depth += 1;
        let res = self.exec_stmts(&closure.def.body);
        self.depth -= 1;
        self.scopes = saved;

        match res {
            Ok(value) | Err(Unwind::Return(value)) => Ok(value),
            Err(Unwind::Error(err)) => Err(err),
            Err(Unwind::Break) | Err(Unwind::Continue) => {
                Err(Error::syntax("Illegal break statement"))
            }
        }
    }
}

fn unary(op: UnOp, operand: Value) -> Result<Value> {
    match (op, operand) {
        (UnOp::Not, v) => Ok(Value::Bool(!v.truthy())),
        (UnOp::Neg, Value::Number(n)) => Ok(Value::Number(-n)),
        (UnOp::Neg, v) => Err(Error::type_(format!(
            "cannot negate a {}",
            v.type_name()
        ))),
    }
}

fn binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Value> {
    use Value::*;

    Ok(match (op, lhs, rhs) {
        (BinOp::Eq, l, r) => Bool(l == r),
        (BinOp::Ne, l, r) => Bool(l != r),
        (BinOp::Add, Number(l), Number(r)) => Number(l + r),
        (BinOp::Add, Str(l), r) => Str(format!("{}{}", l, r)),
        (BinOp::Add, l, Str(r)) => Str(format!("{}{}", l, r)),
        (BinOp::Add, List(l), List(r)) => {
            let mut items = l.borrow().clone();
            items.extend(r.borrow().iter().cloned());
            Value::list(items)
        }
        (BinOp::Sub, Number(l), Number(r)) => Number(l - r),
        (BinOp::Mul, Number(l), Number(r)) => Number(l * r),
        (BinOp::Div, Number(l), Number(r)) => Number(l / r),
        (BinOp::Rem, Number(l), Number(r)) => Number(l % r),
        (op @ (BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge), l, r) => {
            let ord = match (&l, &r) {
                (Number(a), Number(b)) => a.partial_cmp(b),
                (Str(a), Str(b)) => Some(a.cmp(b)),
                _ => {
                    return Err(Error::type_(format!(
                        "cannot compare {} with {}",
                        l.type_name(),
                        r.type_name()
                    )))
                }
            };
            Bool(match (op, ord) {
                (_, None) => false,
                (BinOp::Lt, Some(ord)) => ord == Ordering::Less,
                (BinOp::Le, Some(ord)) => ord != Ordering::Greater,
                (BinOp::Gt, Some(ord)) => ord == Ordering::Greater,
                (_, Some(ord)) => ord != Ordering::Less,
            })
        }
        (op, l, r) => {
            return Err(Error::type_(format!(
                "unsupported operand types for {:?}: {} and {}",
                op,
                l.type_name(),
                r.type_name()
            )))
        }
    })
}

fn index_of(target: &Value, index: &Value) -> Result<Value> {
    let i = match index {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => *n as usize,
        Value::Number(_) => return Ok(Value::Null),
        other => {
            return Err(Error::type_(format!(
                "cannot index with a {}",
                other.type_name()
            )))
        }
    };

    match target {
        Value::List(items) => Ok(items.borrow().get(i).cloned().unwrap_or(Value::Null)),
        Value::Str(s) => Ok(s
            .chars()
            .nth(i)
            .map(|c| Value::Str(c.to_string()))
            .unwrap_or(Value::Null)),
        other => Err(Error::type_(format!("cannot index a {}", other.type_name()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn eval(src: &str) -> Result<Value> {
        run(src, &mut Context::new())
    }

    #[test]
    fn arithmetic() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), Value::from(7));
        assert_eq!(eval("(1 + 2) * 3 % 4").unwrap(), Value::from(1));
        assert_eq!(eval("-2 - -3").unwrap(), Value::from(1));
        assert_eq!(eval("\"n=\" + 4").unwrap(), Value::from("n=4"));
        assert_eq!(eval("1 < 2 && \"a\" <= \"b\"").unwrap(), Value::from(true));
        assert_eq!(eval("null || 0 || \"x\"").unwrap(), Value::from("x"));
    }

    #[test]
    fn top_level_bindings_persist() {
        let mut context = Context::new();
        run("let x = 1", &mut context).unwrap();
        assert_eq!(run("x + 1", &mut context).unwrap(), Value::from(2));
        run("y = x * 10", &mut context).unwrap();
        assert_eq!(context.get("y"), Some(&Value::from(10)));
    }

    #[test]
    fn block_scopes_stay_inside() {
        let mut context = Context::new();
        let value = run("let a = 1; { let b = 2; a = a + b }", &mut context).unwrap();
        assert_eq!(value, Value::from(3));
        assert_eq!(context.get("a"), Some(&Value::from(3)));
        assert!(!context.contains("b"));
    }

    #[test]
    fn loops() {
        let src = "let i = 0; let acc = []
            while true {
                i = i + 1
                if i > 5 { break }
                if i % 2 == 0 { continue }
                push(acc, i)
            }
            acc";
        assert_eq!(
            eval(src).unwrap(),
            Value::from(vec![Value::from(1), Value::from(3), Value::from(5)])
        );
    }

    #[test]
    fn closures() {
        let src = "let counter = fn() { let n = 0; fn() { n = n + 1 } }
            let next = counter()
            next(); next(); next()";
        assert_eq!(eval(src).unwrap(), Value::from(3));

        let src = "let fact = fn(n) { if n <= 1 { return 1 }; n * fact(n - 1) }; fact(5)";
        assert_eq!(eval(src).unwrap(), Value::from(120));
    }

    #[test]
    fn runaway_recursion() {
        let res = std::thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(|| {
                eval("let f = fn() { f() }; f()")
                    .map(|v| v.to_string())
                    .map_err(|e| e.to_string())
            })
            .unwrap()
            .join()
            .unwrap();
        assert_eq!(res, Err("RangeError: Maximum call stack size exceeded".to_string()));
    }

    #[test]
    fn runtime_errors() {
        assert_eq!(eval("nope"), Err(Error::reference("nope is not defined")));
        assert_eq!(eval("let x = 1; x()"), Err(Error::type_("x is not a function")));
        assert_eq!(eval("throw \"boom\""), Err(Error::Thrown(Value::from("boom"))));
        assert!(matches!(eval("1 - \"a\""), Err(Error::Type(_))));
    }

    #[test]
    fn side_effects_survive_a_throw() {
        let mut context = Context::new();
        run("let xs = []", &mut context).unwrap();
        let err = run("push(xs, 1); let y = 2; missing", &mut context).unwrap_err();
        assert_eq!(err, Error::reference("missing is not defined"));
        assert_eq!(
            context.get("xs"),
            Some(&Value::from(vec![Value::from(1)]))
        );
        assert_eq!(context.get("y"), Some(&Value::from(2)));
    }

    #[test]
    fn indexing() {
        assert_eq!(eval("[10, 20][1]").unwrap(), Value::from(20));
        assert_eq!(eval("[10, 20][5]").unwrap(), Value::Null);
        assert_eq!(eval("\"abc\"[2]").unwrap(), Value::from("c"));
    }

    #[test]
    fn builtins_do_not_land_in_the_context() {
        let mut context = Context::new();
        assert_eq!(run("len([1, 2])", &mut context).unwrap(), Value::from(2));
        assert!(!context.contains("len"));
    }
}
