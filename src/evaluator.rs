use std::cell::RefCell;
use std::rc::Rc;

use tracing::trace;

use crate::ast::{BinaryOperator, Expression, FunctionDeclaration, Program, Property, Statement};
use crate::env::Environment;
use crate::error::RuntimeError;
use crate::object::{Function, Properties, Value};

type Scope = Rc<RefCell<Environment>>;

/// Runs programs against one root environment, so declarations made by an
/// earlier program stay visible to later ones.
#[derive(Debug)]
pub struct Evaluator {
  pub env: Scope,
}

impl Evaluator {
  pub fn new(env: Scope) -> Self {
    Evaluator { env }
  }

  pub fn eval(&mut self, program: &Program) -> Result<Value, RuntimeError> {
    evaluate(program, &self.env)
  }
}

/// Evaluates every statement in order and returns the value of the last
/// one, or null for an empty program.
pub fn evaluate(program: &Program, env: &Scope) -> Result<Value, RuntimeError> {
  evaluate_block(&program.body, env)
}

fn evaluate_block(statements: &[Statement], env: &Scope) -> Result<Value, RuntimeError> {
  let mut result = Value::Null;

  for statement in statements {
    result = evaluate_statement(statement, env)?;
  }

  Ok(result)
}

pub fn evaluate_statement(statement: &Statement, env: &Scope) -> Result<Value, RuntimeError> {
  match statement {
    Statement::VariableDeclaration { name, value, constant } => {
      let value = match value {
        Some(expression) => evaluate_expression(expression, env)?,
        None => Value::Null,
      };

      env.borrow_mut().declare(name, value, *constant)
    }
    Statement::Expression(expression) => evaluate_expression(expression, env),
  }
}

pub fn evaluate_expression(expression: &Expression, env: &Scope) -> Result<Value, RuntimeError> {
  match expression {
    Expression::NumericLiteral(value) => Ok(Value::Number(*value)),
    Expression::Identifier(name) => env.borrow().lookup(name),
    Expression::Binary { left, operator, right } => {
      let left = evaluate_expression(left, env)?;
      let right = evaluate_expression(right, env)?;

      Ok(eval_binary_expression(left, *operator, right))
    }
    Expression::Assignment { target, value } => eval_assignment(target, value, env),
    Expression::Call { callee, arguments } => eval_call_expression(callee, arguments, env),
    Expression::Member { object, property, computed } => eval_member_expression(object, property, *computed, env),
    Expression::Object(properties) => eval_object_expression(properties, env),
    Expression::FunctionDeclaration(declaration) => eval_function_declaration(declaration, env),
  }
}

// Anything other than two numbers silently produces null.
fn eval_binary_expression(left: Value, operator: BinaryOperator, right: Value) -> Value {
  match (left, right) {
    (Value::Number(left), Value::Number(right)) => Value::Number(operator.apply(left, right)),
    _ => Value::Null,
  }
}

fn eval_assignment(target: &Expression, value: &Expression, env: &Scope) -> Result<Value, RuntimeError> {
  let name = match target {
    Expression::Identifier(name) => name,
    other => {
      return Err(RuntimeError::InvalidAssignmentTarget {
        target: other.kind().to_owned(),
      })
    }
  };

  let value = evaluate_expression(value, env)?;
  let owner = Environment::resolve(env, name)?;
  let assigned = owner.borrow_mut().assign(name, value);
  assigned
}

fn eval_object_expression(properties: &[Property], env: &Scope) -> Result<Value, RuntimeError> {
  let mut object = Properties::new();

  for property in properties {
    let value = match &property.value {
      Some(expression) => evaluate_expression(expression, env)?,
      None => env.borrow().lookup(&property.key)?,
    };

    object.insert(property.key.clone(), value);
  }

  Ok(Value::object(object))
}

fn eval_member_expression(object: &Expression, property: &Expression, computed: bool, env: &Scope) -> Result<Value, RuntimeError> {
  let object = evaluate_expression(object, env)?;

  let key = match (computed, property) {
    (false, Expression::Identifier(name)) => name.clone(),
    (false, other) => {
      return Err(RuntimeError::InvalidMemberAccess {
        message: format!("expected identifier after '.', found {}", other.kind()),
      })
    }
    (true, expression) => match evaluate_expression(expression, env)? {
      Value::Number(n) => n.to_string(),
      other => {
        return Err(RuntimeError::InvalidMemberAccess {
          message: format!("cannot use {} as a property key", other.type_name()),
        })
      }
    },
  };

  object.get(&key).ok_or_else(|| RuntimeError::InvalidMemberAccess {
    message: format!("cannot read property '{}' of {}", key, object.type_name()),
  })
}

fn eval_call_expression(callee: &Expression, arguments: &[Expression], env: &Scope) -> Result<Value, RuntimeError> {
  let callee = evaluate_expression(callee, env)?;
  let args = arguments
    .iter()
    .map(|argument| evaluate_expression(argument, env))
    .collect::<Result<Vec<_>, _>>()?;

  match callee {
    Value::NativeFunction(native) => {
      trace!(name = %native.name, args = args.len(), "calling native function");
      native.call(&args, env)
    }
    Value::Function(function) => call_function(&function, args),
    other => Err(RuntimeError::NotCallable { value: other.to_string() }),
  }
}

/// Runs a user function in a fresh scope whose parent is the scope the
/// function was declared in. Missing arguments are bound to null.
pub fn call_function(function: &Function, args: Vec<Value>) -> Result<Value, RuntimeError> {
  trace!(name = %function.name, args = args.len(), "calling function");

  let scope = Rc::new(RefCell::new(Environment::new_with_parent(Rc::clone(&function.env))));
  let mut args = args.into_iter();

  for parameter in &function.parameters {
    let value = args.next().unwrap_or(Value::Null);
    scope.borrow_mut().declare(parameter, value, false)?;
  }

  evaluate_block(&function.body, &scope)
}

fn eval_function_declaration(declaration: &Rc<FunctionDeclaration>, env: &Scope) -> Result<Value, RuntimeError> {
  let function = Value::Function(Function {
    name: declaration.name.clone(),
    parameters: declaration.parameters.clone(),
    body: Rc::clone(&declaration.body),
    env: Rc::clone(env),
  });

  env.borrow_mut().declare(&declaration.name, function, true)
}

#[cfg(test)]
mod tests {
  use std::cell::RefCell;
  use std::rc::{Rc, Weak};

  use pretty_assertions::assert_eq;

  use crate::builtin::global_env;
  use crate::env::Environment;
  use crate::error::RuntimeError;
  use crate::evaluator::Evaluator;
  use crate::object::{NativeFunction, Value};
  use crate::parser::parse;

  fn evaluator() -> Evaluator {
    Evaluator::new(global_env(Rc::new(RefCell::new(std::io::sink()))))
  }

  fn eval(input: &str) -> Result<Value, RuntimeError> {
    let program = parse(input).expect("source should parse");
    evaluator().eval(&program)
  }

  #[test]
  fn numeric_literal() {
    assert_eq!(eval("42;").unwrap(), Value::Number(42.0));
  }

  #[test]
  fn empty_program_is_null() {
    assert_eq!(eval("").unwrap(), Value::Null);
  }

  #[test]
  fn arithmetic() {
    assert_eq!(eval("2 + 3 * 4;").unwrap(), Value::Number(14.0));
    assert_eq!(eval("(2 + 3) * 4;").unwrap(), Value::Number(20.0));
    assert_eq!(eval("7 % 3;").unwrap(), Value::Number(1.0));
    assert_eq!(eval("7 / 2;").unwrap(), Value::Number(3.5));
    assert_eq!(eval("1 - 2;").unwrap(), Value::Number(-1.0));
  }

  #[test]
  fn division_by_zero_follows_floats() {
    assert_eq!(eval("1 / 0;").unwrap(), Value::Number(f64::INFINITY));
    assert!(eval("0 / 0;").unwrap().as_number().unwrap().is_nan());
    assert!(eval("5 % 0;").unwrap().as_number().unwrap().is_nan());
  }

  #[test]
  fn mixed_operands_are_null() {
    assert_eq!(eval("true + 1;").unwrap(), Value::Null);
    assert_eq!(eval("let o = {}; o * 2;").unwrap(), Value::Null);
  }

  #[test]
  fn declarations_return_their_value() {
    assert_eq!(eval("let x = 3;").unwrap(), Value::Number(3.0));
    assert_eq!(eval("let x;").unwrap(), Value::Null);
  }

  #[test]
  fn redeclaration_fails() {
    let error = eval("let x = 1; let x = 2;").unwrap_err();
    assert!(matches!(error, RuntimeError::Redeclaration { .. }));
  }

  #[test]
  fn builtin_constants_cannot_be_reassigned() {
    let error = eval("true = false;").unwrap_err();
    assert!(matches!(error, RuntimeError::ConstantReassignment { .. }));
  }

  #[test]
  fn assignment_returns_value() {
    assert_eq!(eval("let x = 1; x = 5;").unwrap(), Value::Number(5.0));
  }

  #[test]
  fn assignment_requires_identifier_target() {
    let error = eval("let o = { a: 1 }; o.a = 2;").unwrap_err();
    assert!(matches!(error, RuntimeError::InvalidAssignmentTarget { .. }));

    let error = eval("{ a: 1 } = 2;").unwrap_err();
    assert!(matches!(error, RuntimeError::InvalidAssignmentTarget { .. }));
  }

  #[test]
  fn undefined_identifier() {
    let error = eval("missing;").unwrap_err();
    assert!(matches!(error, RuntimeError::UndefinedVariable { .. }));
    assert!(error.is_resolution_error());
  }

  #[test]
  fn calling_non_function() {
    let error = eval("let x = 1; x();").unwrap_err();
    assert!(matches!(error, RuntimeError::NotCallable { .. }));
    assert!(!error.is_resolution_error());
  }

  #[test]
  fn function_returns_last_statement() {
    assert_eq!(eval("fn add(a, b) { a + b; } add(2, 3);").unwrap(), Value::Number(5.0));
    assert_eq!(eval("fn nothing() { } nothing();").unwrap(), Value::Null);
  }

  #[test]
  fn missing_arguments_are_null() {
    assert_eq!(eval("fn second(a, b) { b; } second(1);").unwrap(), Value::Null);
    assert_eq!(eval("fn first(a) { a; } first(1, 2, 3);").unwrap(), Value::Number(1.0));
  }

  #[test]
  fn function_names_are_constant() {
    let error = eval("fn f() { 1; } f = 2;").unwrap_err();
    assert!(matches!(error, RuntimeError::ConstantReassignment { .. }));
  }

  #[test]
  fn duplicate_parameters_fail_on_call() {
    let error = eval("fn f(a, a) { a; } f(1, 2);").unwrap_err();
    assert!(matches!(error, RuntimeError::Redeclaration { .. }));
  }

  #[test]
  fn chained_calls() {
    assert_eq!(
      eval("fn outer() { fn inner() { 7; } inner; } outer()();").unwrap(),
      Value::Number(7.0)
    );
  }

  #[test]
  fn closures_write_captured_scope() {
    let source = "
      fn counter() {
        let count = 0;
        fn next() { count = count + 1; }
        next;
      }
      const tick = counter();
      tick();
      tick();
      tick();
    ";

    assert_eq!(eval(source).unwrap(), Value::Number(3.0));
  }

  #[test]
  fn object_literal_and_member_access() {
    assert_eq!(eval("let a = 5; let o = { a, b: a * 2 }; o.b;").unwrap(), Value::Number(10.0));
    assert_eq!(eval("let o = { a: 1 }; o.missing;").unwrap(), Value::Null);
    assert_eq!(eval("let o = { a: { b: 4 } }; o.a.b;").unwrap(), Value::Number(4.0));
  }

  #[test]
  fn computed_member_access() {
    assert_eq!(eval("let o = { a: 1 }; let k = 2; o[k];").unwrap(), Value::Null);
    assert_eq!(eval("let o = { a: 1 }; o[1 + 1];").unwrap(), Value::Null);
    assert_eq!(eval("let o = { a: 1 }; o[(3)];").unwrap(), Value::Null);

    let error = eval("let o = { a: 1 }; o[true + 1];").unwrap_err();
    assert!(matches!(error, RuntimeError::InvalidMemberAccess { .. }));

    let error = eval("let o = { a: 1 }; o[o];").unwrap_err();
    assert!(matches!(error, RuntimeError::InvalidMemberAccess { .. }));
  }

  #[test]
  fn member_access_on_non_object() {
    let error = eval("let x = 1; x.y;").unwrap_err();
    assert!(matches!(error, RuntimeError::InvalidMemberAccess { .. }));
  }

  #[test]
  fn shorthand_property_requires_variable() {
    let error = eval("{ missing };").unwrap_err();
    assert!(matches!(error, RuntimeError::UndefinedVariable { .. }));
  }

  #[test]
  fn evaluator_keeps_root_scope_between_programs() {
    let mut evaluator = evaluator();

    evaluator.eval(&parse("let x = 2;").unwrap()).unwrap();
    assert_eq!(evaluator.eval(&parse("x * 21;").unwrap()).unwrap(), Value::Number(42.0));
    assert!(evaluator.env.borrow().contains("x"));
  }

  type Watched = Rc<RefCell<Vec<Weak<RefCell<Environment>>>>>;

  /// A root scope with a `watch()` native that records the scope it is called from.
  fn watched_env() -> (Rc<RefCell<Environment>>, Watched) {
    let watched: Watched = Rc::new(RefCell::new(Vec::new()));
    let recorder = Rc::clone(&watched);
    let watch = NativeFunction::new("watch", move |_, env| {
      recorder.borrow_mut().push(Rc::downgrade(env));
      Ok(Value::Null)
    });

    let env = Rc::new(RefCell::new(Environment::new()));
    env.borrow_mut().declare("watch", Value::NativeFunction(watch), true).unwrap();
    (env, watched)
  }

  #[test]
  fn call_scope_is_freed_after_return() {
    let (env, watched) = watched_env();

    super::evaluate(&parse("fn f(a) { watch(); a; } f(1);").unwrap(), &env).unwrap();

    assert_eq!(watched.borrow().len(), 1);
    assert!(watched.borrow()[0].upgrade().is_none());
  }

  #[test]
  fn escaping_closure_keeps_call_scope_alive() {
    let (env, watched) = watched_env();
    let source = "fn make() { let n = 7; fn get() { n; } watch(); get; } const got = make();";

    super::evaluate(&parse(source).unwrap(), &env).unwrap();

    let scope = watched.borrow()[0].upgrade().expect("closure scope should be alive");
    assert_eq!(scope.borrow().lookup("n").unwrap(), Value::Number(7.0));
  }

  #[test]
  fn nested_function_keeps_its_declaring_scope() {
    let (env, watched) = watched_env();

    // `inner` is bound in the call scope and captures it, so the pair outlives the call.
    super::evaluate(&parse("fn outer() { fn inner() { 1; } watch(); 0; } outer();").unwrap(), &env).unwrap();

    let scope = watched.borrow()[0].upgrade().expect("declaring scope should be alive");
    assert!(scope.borrow().contains("inner"));
  }

  #[test]
  fn call_scope_is_discarded_after_return() {
    let env = Rc::new(RefCell::new(Environment::new()));
    let program = parse("fn f(a) { let b = a; b; } f(1);").unwrap();

    assert_eq!(super::evaluate(&program, &env).unwrap(), Value::Number(1.0));
    assert!(!env.borrow().contains("a"));
    assert!(!env.borrow().contains("b"));
  }
}
