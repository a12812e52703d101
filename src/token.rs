use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
  Number,
  Identifier,

  Equals,
  Comma,
  Colon,
  OpenParen,
  CloseParen,
  Semicolon,
  BinaryOperator,
  OpenBrace,
  CloseBrace,
  OpenBracket,
  CloseBracket,
  Dot,

  Let,
  Const,
  Fn,

  EndOfInput,
}

impl TokenKind {
  /// Keywords are lexed as identifiers first and reclassified here.
  pub fn keyword(word: &str) -> Option<TokenKind> {
    match word {
      "let" => Some(TokenKind::Let),
      "const" => Some(TokenKind::Const),
      "fn" => Some(TokenKind::Fn),
      _ => None,
    }
  }
}

impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      TokenKind::Number => "number",
      TokenKind::Identifier => "identifier",
      TokenKind::Equals => "'='",
      TokenKind::Comma => "','",
      TokenKind::Colon => "':'",
      TokenKind::OpenParen => "'('",
      TokenKind::CloseParen => "')'",
      TokenKind::Semicolon => "';'",
      TokenKind::BinaryOperator => "operator",
      TokenKind::OpenBrace => "'{'",
      TokenKind::CloseBrace => "'}'",
      TokenKind::OpenBracket => "'['",
      TokenKind::CloseBracket => "']'",
      TokenKind::Dot => "'.'",
      TokenKind::Let => "'let'",
      TokenKind::Const => "'const'",
      TokenKind::Fn => "'fn'",
      TokenKind::EndOfInput => "end of input",
    };

    f.write_str(text)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span(pub usize, pub usize);

impl Span {
  pub fn range(&self) -> Range<usize> {
    self.0..self.1
  }
}

impl fmt::Display for Span {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}..{}", self.0, self.1)
  }
}

impl From<Range<usize>> for Span {
  fn from(range: Range<usize>) -> Self {
    Span(range.start, range.end)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
  pub kind: TokenKind,
  pub value: String,
  pub span: Span,
}

impl Token {
  pub fn new(kind: TokenKind, value: impl Into<String>, span: Span) -> Token {
    Token {
      kind,
      value: value.into(),
      span,
    }
  }

  pub fn is_operator(&self, symbol: &str) -> bool {
    self.kind == TokenKind::BinaryOperator && self.value == symbol
  }
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.kind {
      TokenKind::EndOfInput => write!(f, "end of input"),
      TokenKind::Number | TokenKind::Identifier => write!(f, "{} '{}'", self.kind, self.value),
      _ => write!(f, "'{}'", self.value),
    }
  }
}
