use thiserror::Error;

use crate::token::Span;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The first structural violation found while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {span}{}", describe_context(.found, .expected))]
pub struct ParseError {
  pub message: String,
  /// Description of the offending token, `None` at end of input.
  pub found: Option<String>,
  pub expected: Vec<String>,
  pub span: Span,
}

fn describe_context(found: &Option<String>, expected: &[String]) -> String {
  let found = found.as_deref().unwrap_or("end of input");

  match expected {
    [] => format!(", found {}", found),
    _ => format!(", found {}, expecting {}", found, expected.join(" or ")),
  }
}

#[derive(Debug, Error)]
pub enum RuntimeError {
  #[error("cannot declare variable '{name}' as it already exists in this scope")]
  Redeclaration { name: String },

  #[error("cannot resolve '{name}' as it does not exist")]
  UndefinedVariable { name: String },

  #[error("cannot reassign to variable '{name}' declared constant")]
  ConstantReassignment { name: String },

  #[error("cannot call value that is not a function: {value}")]
  NotCallable { value: String },

  #[error("invalid left-hand side in assignment expression: {target}")]
  InvalidAssignmentTarget { target: String },

  #[error("invalid member access: {message}")]
  InvalidMemberAccess { message: String },

  #[error("failed to write output: {0}")]
  Io(#[from] std::io::Error),
}

impl RuntimeError {
  /// Failures to find, declare or overwrite a binding.
  pub fn is_resolution_error(&self) -> bool {
    matches!(
      self,
      RuntimeError::Redeclaration { .. }
        | RuntimeError::UndefinedVariable { .. }
        | RuntimeError::ConstantReassignment { .. }
    )
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("parse error: {0}")]
  Parse(#[from] ParseError),

  #[error("runtime error: {0}")]
  Runtime(#[from] RuntimeError),
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::{Error, ParseError};
  use crate::token::Span;

  fn parse_error(found: Option<&str>, expected: &[&str]) -> ParseError {
    ParseError {
      message: String::from("unexpected token"),
      found: found.map(String::from),
      expected: expected.iter().map(|e| e.to_string()).collect(),
      span: Span(4, 5),
    }
  }

  #[test]
  fn parse_error_display() {
    assert_eq!(
      parse_error(Some("';'"), &["')'", "','"]).to_string(),
      "unexpected token at 4..5, found ';', expecting ')' or ','"
    );
    assert_eq!(
      parse_error(None, &[]).to_string(),
      "unexpected token at 4..5, found end of input"
    );
  }

  #[test]
  fn parse_error_is_a_std_error() {
    let error: Box<dyn std::error::Error> = Box::new(parse_error(None, &["';'"]));

    assert_eq!(error.to_string(), "unexpected token at 4..5, found end of input, expecting ';'");
    assert_eq!(
      Error::from(parse_error(None, &[])).to_string(),
      "parse error: unexpected token at 4..5, found end of input"
    );
  }
}
