use std::cell::RefCell;
use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use crate::env::Environment;
use crate::object::{NativeFunction, Value};

/// Where `print` sends its output.
pub type Output = Rc<RefCell<dyn Write>>;

/// Builds the root scope: `true`, `false`, `null` and the native functions,
/// all bound as constants.
pub fn global_env(output: Output) -> Rc<RefCell<Environment>> {
  let mut builtins = HashMap::new();
  builtins.insert(String::from("true"), Value::Boolean(true));
  builtins.insert(String::from("false"), Value::Boolean(false));
  builtins.insert(String::from("null"), Value::Null);

  for native in natives(output) {
    builtins.insert(native.name.clone(), Value::NativeFunction(native));
  }

  Rc::new(RefCell::new(Environment::from(builtins)))
}

pub fn global_env_stdout() -> Rc<RefCell<Environment>> {
  global_env(Rc::new(RefCell::new(std::io::stdout())))
}

fn natives(output: Output) -> Vec<NativeFunction> {
  vec![
    NativeFunction::new("print", move |args, _| {
      let line = args.iter().map(|arg| arg.to_string()).collect::<Vec<_>>().join(" ");
      writeln!(output.borrow_mut(), "{}", line)?;

      Ok(Value::Null)
    }),
  ]
}
