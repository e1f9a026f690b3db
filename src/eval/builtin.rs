use super::{Native, Value};
use crate::error::{Error, Result};
use crate::promise::Promise;

/// Functions every chunk can call without them living in the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuiltinKind {
    Print,
    Len,
    Push,
    Str,
    Type,
    Resolve,
    Reject,
}

impl BuiltinKind {
    pub fn new<T: AsRef<str>>(name: T) -> Option<Self> {
        Some(match name.as_ref() {
            "print" => Self::Print,
            "len" => Self::Len,
            "push" => Self::Push,
            "str" => Self::Str,
            "type" => Self::Type,
            "resolve" => Self::Resolve,
            "reject" => Self::Reject,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Len => "len",
            Self::Push => "push",
            Self::Str => "str",
            Self::Type => "type",
            Self::Resolve => "resolve",
            Self::Reject => "reject",
        }
    }

    pub fn call(self, args: &[Value]) -> Result<Value> {
        match self {
            Self::Print => print(args),
            Self::Len => len(args),
            Self::Push => push(args),
            Self::Str => Ok(Value::Str(arg(args, 0).to_string())),
            Self::Type => Ok(Value::from(arg(args, 0).type_name())),
            Self::Resolve => Ok(Promise::resolved(arg(args, 0)).into()),
            Self::Reject => Ok(Promise::rejected(Error::Thrown(arg(args, 0))).into()),
        }
    }
}

impl From<BuiltinKind> for Native {
    fn from(kind: BuiltinKind) -> Self {
        Native::new(kind.name(), move |args| kind.call(args))
    }
}

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).cloned().unwrap_or(Value::Null)
}

fn print(args: &[Value]) -> Result<Value> {
    let line = args
        .iter()
        .map(Value::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    println!("{}", line);
    Ok(Value::Null)
}

fn len(args: &[Value]) -> Result<Value> {
    let n = match arg(args, 0) {
        Value::Str(s) => s.chars().count(),
        Value::List(items) => items.borrow().len(),
        other => {
            return Err(Error::type_(format!(
                "len() expects a string or a list, got {}",
                other.type_name()
            )))
        }
    };
    Ok(Value::Number(n as f64))
}

fn push(args: &[Value]) -> Result<Value> {
    match args {
        [Value::List(items), rest @ ..] => {
            let mut items = items.borrow_mut();
            items.extend(rest.iter().cloned());
            Ok(Value::Number(items.len() as f64))
        }
        _ => Err(Error::type_("push() expects a list")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[Value]) -> Result<Value> {
        BuiltinKind::new(name).unwrap().call(args)
    }

    #[test]
    fn lookup() {
        assert_eq!(BuiltinKind::new("len"), Some(BuiltinKind::Len));
        assert_eq!(BuiltinKind::new("sleep"), None);
        assert_eq!(Native::from(BuiltinKind::Push).name(), "push");
    }

    #[test]
    fn lists_and_strings() {
        let xs = Value::from(vec![Value::from(1)]);
        assert_eq!(call("push", &[xs.clone(), Value::from(2)]), Ok(Value::from(2)));
        assert_eq!(call("len", &[xs]), Ok(Value::from(2)));
        assert_eq!(call("len", &[Value::from("héllo")]), Ok(Value::from(5)));
        assert!(matches!(call("len", &[Value::Null]), Err(Error::Type(_))));
        assert!(matches!(call("push", &[]), Err(Error::Type(_))));
    }

    #[test]
    fn conversions() {
        assert_eq!(call("str", &[Value::from(1.5)]), Ok(Value::from("1.5")));
        assert_eq!(call("type", &[Value::from("x")]), Ok(Value::from("string")));
        assert_eq!(call("type", &[]), Ok(Value::from("null")));
    }

    #[test]
    fn promises() {
        let value = call("resolve", &[Value::from(3)]).unwrap();
        assert_eq!(value.to_string(), "Promise { 3 }");
        let value = call("reject", &[Value::from("no")]).unwrap();
        assert_eq!(value.to_string(), "Promise { <rejected> no }");
    }
}
