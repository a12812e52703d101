use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::fmt::Formatter;
use std::rc::Rc;

use crate::ast::Statement;
use crate::env::Environment;
use crate::error::RuntimeError;

pub type Properties = HashMap<String, Value>;

pub type NativeCall = dyn Fn(&[Value], &Rc<RefCell<Environment>>) -> Result<Value, RuntimeError>;

/// A callable supplied by the host rather than by source code.
#[derive(Clone)]
pub struct NativeFunction {
  pub name: String,
  call: Rc<NativeCall>,
}

impl NativeFunction {
  pub fn new<F>(name: impl Into<String>, call: F) -> Self
  where
    F: Fn(&[Value], &Rc<RefCell<Environment>>) -> Result<Value, RuntimeError> + 'static,
  {
    Self {
      name: name.into(),
      call: Rc::new(call),
    }
  }

  pub fn call(&self, args: &[Value], env: &Rc<RefCell<Environment>>) -> Result<Value, RuntimeError> {
    (self.call)(args, env)
  }
}

/// A user function. `env` is the scope the declaration was evaluated in and
/// stays alive for as long as the function value does.
#[derive(Clone)]
pub struct Function {
  pub name: String,
  pub parameters: Vec<String>,
  pub body: Rc<[Statement]>,
  pub env: Rc<RefCell<Environment>>,
}

#[derive(Clone)]
pub enum Value {
  Null,
  Number(f64),
  Boolean(bool),
  Object(Rc<RefCell<Properties>>),
  NativeFunction(NativeFunction),
  Function(Function),
}

impl Value {
  pub fn object(properties: Properties) -> Value {
    Value::Object(Rc::new(RefCell::new(properties)))
  }

  pub fn type_name(&self) -> &'static str {
    match self {
      Value::Null => "null",
      Value::Number(_) => "number",
      Value::Boolean(_) => "boolean",
      Value::Object(_) => "object",
      Value::NativeFunction(_) => "native-function",
      Value::Function(_) => "function",
    }
  }

  pub fn as_number(&self) -> Option<f64> {
    match self {
      Value::Number(n) => Some(*n),
      _ => None,
    }
  }

  pub fn is_null(&self) -> bool {
    matches!(self, Value::Null)
  }

  /// Reads a property, `None` when this is not an object.
  pub fn get(&self, key: &str) -> Option<Value> {
    match self {
      Value::Object(properties) => Some(properties.borrow().get(key).cloned().unwrap_or(Value::Null)),
      _ => None,
    }
  }
}

impl PartialEq for Value {
  fn eq(&self, other: &Self) -> bool {
    match (self, other) {
      (Value::Null, Value::Null) => true,
      (Value::Number(a), Value::Number(b)) => a == b,
      (Value::Boolean(a), Value::Boolean(b)) => a == b,
      (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
      (Value::NativeFunction(a), Value::NativeFunction(b)) => Rc::ptr_eq(&a.call, &b.call),
      (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(&a.body, &b.body) && Rc::ptr_eq(&a.env, &b.env),
      _ => false,
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Value::Null => f.write_str("null"),
      Value::Number(n) => write!(f, "{}", n),
      Value::Boolean(b) => write!(f, "{}", b),
      Value::Object(properties) => {
        let properties = properties.borrow();
        if properties.is_empty() {
          return f.write_str("{}");
        }

        let mut keys = properties.keys().collect::<Vec<_>>();
        keys.sort();

        f.write_str("{ ")?;
        for (i, key) in keys.into_iter().enumerate() {
          if i > 0 {
            f.write_str(", ")?;
          }
          write!(f, "{}: {}", key, properties[key])?;
        }
        f.write_str(" }")
      }
      Value::NativeFunction(native) => write!(f, "{}() {{ [native code] }}", native.name),
      Value::Function(function) => write!(f, "fn {}({}) {{ ... }}", function.name, function.parameters.join(", ")),
    }
  }
}

impl fmt::Debug for NativeFunction {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.debug_struct("NativeFunction").field("name", &self.name).finish_non_exhaustive()
  }
}

// The captured environment usually contains this function again, so it is
// left out to keep the output finite.
impl fmt::Debug for Function {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    f.debug_struct("Function")
      .field("name", &self.name)
      .field("parameters", &self.parameters)
      .finish_non_exhaustive()
  }
}

impl fmt::Debug for Value {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    match self {
      Value::Null => f.write_str("Null"),
      Value::Number(n) => f.debug_tuple("Number").field(n).finish(),
      Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
      Value::Object(properties) => f.debug_tuple("Object").field(&properties.borrow()).finish(),
      Value::NativeFunction(native) => native.fmt(f),
      Value::Function(function) => function.fmt(f),
    }
  }
}
