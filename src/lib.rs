pub mod ast;
pub mod token;
pub mod lexer;
pub mod parser;
pub mod object;
pub mod evaluator;
pub mod env;
pub mod builtin;
pub mod error;

use std::cell::RefCell;
use std::rc::Rc;

pub use builtin::{global_env, global_env_stdout};
pub use env::Environment;
pub use error::{Error, ParseError, Result, RuntimeError};
pub use evaluator::{evaluate, Evaluator};
pub use lexer::tokenize;
pub use object::Value;
pub use parser::parse;

/// Parses `source` and evaluates it in `env`, returning the value of the
/// last statement.
pub fn run(source: &str, env: &Rc<RefCell<Environment>>) -> Result<Value> {
    let program = parse(source)?;
    Ok(evaluate(&program, env)?)
}
