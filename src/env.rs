use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::object::Value;

type Values = HashMap<String, Value>;

#[derive(Debug, Default)]
pub struct Environment {
  values: Values,
  constants: HashSet<String>,
  parent: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
  pub fn new() -> Self {
    Self::default()
  }

  /// A root scope whose bindings are all constant.
  pub fn from(constants: Values) -> Self {
    Self {
      constants: constants.keys().cloned().collect(),
      values: constants,
      parent: None,
    }
  }

  pub fn new_with_parent(parent: Rc<RefCell<Environment>>) -> Self {
    Self {
      values: HashMap::new(),
      constants: HashSet::new(),
      parent: Some(parent),
    }
  }

  /// Whether `name` is bound in this scope, ignoring parents.
  pub fn contains(&self, name: &str) -> bool {
    self.values.contains_key(name)
  }

  pub fn is_constant(&self, name: &str) -> bool {
    self.constants.contains(name)
  }

  pub fn declare(&mut self, name: &str, value: Value, constant: bool) -> Result<Value, RuntimeError> {
    if self.contains(name) {
      return Err(RuntimeError::Redeclaration { name: name.to_owned() });
    }

    self.values.insert(name.to_owned(), value.clone());
    if constant {
      self.constants.insert(name.to_owned());
    }

    Ok(value)
  }

  pub fn assign(&mut self, name: &str, value: Value) -> Result<Value, RuntimeError> {
    if self.contains(name) {
      if self.is_constant(name) {
        return Err(RuntimeError::ConstantReassignment { name: name.to_owned() });
      }

      self.values.insert(name.to_owned(), value.clone());
      return Ok(value);
    }

    match self.parent {
      Some(ref parent) => parent.borrow_mut().assign(name, value),
      None => Err(RuntimeError::UndefinedVariable { name: name.to_owned() }),
    }
  }

  pub fn lookup(&self, name: &str) -> Result<Value, RuntimeError> {
    if let Some(value) = self.values.get(name) {
      return Ok(value.clone());
    }

    match self.parent {
      Some(ref parent) => parent.borrow().lookup(name),
      None => Err(RuntimeError::UndefinedVariable { name: name.to_owned() }),
    }
  }

  /// Returns the nearest scope, starting at `env`, that binds `name`.
  pub fn resolve(env: &Rc<RefCell<Environment>>, name: &str) -> Result<Rc<RefCell<Environment>>, RuntimeError> {
    let mut current = Rc::clone(env);

    loop {
      let parent = {
        let scope = current.borrow();
        if scope.contains(name) {
          break;
        }
        scope.parent.clone()
      };

      match parent {
        Some(parent) => current = parent,
        None => return Err(RuntimeError::UndefinedVariable { name: name.to_owned() }),
      }
    }

    Ok(current)
  }
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::collections::HashMap;
  use std::rc::Rc;

  use pretty_assertions::assert_eq;

  use super::Environment;
  use crate::error::RuntimeError;
  use crate::object::Value;

  fn child_of(parent: &Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
    Rc::new(RefCell::new(Environment::new_with_parent(Rc::clone(parent))))
  }

  #[test]
  fn declare_and_lookup() {
    let mut env = Environment::new();
    env.declare("x", Value::Number(1.0), false).unwrap();

    assert_eq!(env.lookup("x").unwrap(), Value::Number(1.0));
  }

  #[test]
  fn redeclaration_in_same_scope_fails() {
    let mut env = Environment::new();
    env.declare("x", Value::Number(1.0), false).unwrap();

    assert!(matches!(
      env.declare("x", Value::Number(2.0), false),
      Err(RuntimeError::Redeclaration { .. })
    ));
  }

  #[test]
  fn shadowing_across_scopes() {
    let root = Rc::new(RefCell::new(Environment::new()));
    root.borrow_mut().declare("x", Value::Number(1.0), true).unwrap();

    let child = child_of(&root);
    child.borrow_mut().declare("x", Value::Number(2.0), false).unwrap();

    assert_eq!(child.borrow().lookup("x").unwrap(), Value::Number(2.0));
    assert_eq!(root.borrow().lookup("x").unwrap(), Value::Number(1.0));
  }

  #[test]
  fn assign_walks_parents() {
    let root = Rc::new(RefCell::new(Environment::new()));
    root.borrow_mut().declare("x", Value::Number(1.0), false).unwrap();

    let child = child_of(&root);
    child.borrow_mut().assign("x", Value::Number(3.0)).unwrap();

    assert_eq!(root.borrow().lookup("x").unwrap(), Value::Number(3.0));
    assert!(!child.borrow().contains("x"));
  }

  #[test]
  fn assign_to_constant_fails() {
    let root = Rc::new(RefCell::new(Environment::new()));
    root.borrow_mut().declare("x", Value::Number(1.0), true).unwrap();
    let child = child_of(&root);

    let error = child.borrow_mut().assign("x", Value::Number(2.0)).unwrap_err();

    assert!(matches!(error, RuntimeError::ConstantReassignment { .. }));
    assert!(error.is_resolution_error());
    assert_eq!(root.borrow().lookup("x").unwrap(), Value::Number(1.0));
  }

  #[test]
  fn undefined_names() {
    let mut env = Environment::new();

    assert!(matches!(env.lookup("x"), Err(RuntimeError::UndefinedVariable { .. })));
    assert!(matches!(
      env.assign("x", Value::Null),
      Err(RuntimeError::UndefinedVariable { .. })
    ));
  }

  #[test]
  fn resolve_finds_nearest_owner() {
    let root = Rc::new(RefCell::new(Environment::new()));
    root.borrow_mut().declare("x", Value::Null, false).unwrap();
    let middle = child_of(&root);
    let leaf = child_of(&middle);

    let owner = Environment::resolve(&leaf, "x").unwrap();
    assert!(Rc::ptr_eq(&owner, &root));

    middle.borrow_mut().declare("x", Value::Null, false).unwrap();
    let owner = Environment::resolve(&leaf, "x").unwrap();
    assert!(Rc::ptr_eq(&owner, &middle));

    assert!(Environment::resolve(&leaf, "y").is_err());
  }

  #[test]
  fn from_marks_everything_constant() {
    let mut values = HashMap::new();
    values.insert("true".to_owned(), Value::Boolean(true));
    let mut env = Environment::from(values);

    assert!(env.is_constant("true"));
    assert!(env.assign("true", Value::Boolean(false)).is_err());
  }
}
