use logos::Logos;
use tracing::{debug, warn};

use crate::token::{Span, Token, TokenKind};

#[derive(Logos, Clone, Copy, Debug, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum RawToken {
    #[token("(")]
    OpenParen,

    #[token(")")]
    CloseParen,

    #[token("{")]
    OpenBrace,

    #[token("}")]
    CloseBrace,

    #[token("[")]
    OpenBracket,

    #[token("]")]
    CloseBracket,

    #[token("=")]
    Equals,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[regex(r"[+\-*/%]")]
    BinaryOperator,

    #[regex(r"[0-9]+")]
    Number,

    // Candidate letters. Runs are narrowed to cased characters in `push_words`.
    #[regex(r"[\p{Alphabetic}\p{So}]+")]
    Word,
}

impl RawToken {
    fn classify(self, slice: &str) -> TokenKind {
        match self {
            RawToken::OpenParen => TokenKind::OpenParen,
            RawToken::CloseParen => TokenKind::CloseParen,
            RawToken::OpenBrace => TokenKind::OpenBrace,
            RawToken::CloseBrace => TokenKind::CloseBrace,
            RawToken::OpenBracket => TokenKind::OpenBracket,
            RawToken::CloseBracket => TokenKind::CloseBracket,
            RawToken::Equals => TokenKind::Equals,
            RawToken::Semicolon => TokenKind::Semicolon,
            RawToken::Colon => TokenKind::Colon,
            RawToken::Comma => TokenKind::Comma,
            RawToken::Dot => TokenKind::Dot,
            RawToken::BinaryOperator => TokenKind::BinaryOperator,
            RawToken::Number => TokenKind::Number,
            RawToken::Word => TokenKind::keyword(slice).unwrap_or(TokenKind::Identifier),
        }
    }
}

/// Identifier characters are those with distinct upper and lower case forms.
fn is_identifier_char(c: char) -> bool {
    c.to_uppercase().ne(c.to_lowercase())
}

/// Splits a candidate word at caseless characters, which are skipped.
fn push_words(tokens: &mut Vec<Token>, word: &str, start: usize) {
    let mut run = None;

    for (offset, c) in word.char_indices() {
        if is_identifier_char(c) {
            run.get_or_insert(offset);
            continue;
        }

        if let Some(begin) = run.take() {
            push_word(tokens, &word[begin..offset], start + begin);
        }
        warn!(character = ?c, offset = start + offset, "unrecognized character found in source");
    }

    if let Some(begin) = run {
        push_word(tokens, &word[begin..], start + begin);
    }
}

fn push_word(tokens: &mut Vec<Token>, word: &str, start: usize) {
    let kind = RawToken::Word.classify(word);
    tokens.push(Token::new(kind, word, Span(start, start + word.len())));
}

/// Splits `source` into tokens, always ending with a single
/// [`TokenKind::EndOfInput`]. Never fails: characters that start no token
/// are reported through `tracing` and skipped.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();

    for (raw, range) in RawToken::lexer(source).spanned() {
        let slice = &source[range.clone()];

        match raw {
            Ok(RawToken::Word) => push_words(&mut tokens, slice, range.start),
            Ok(raw) => tokens.push(Token::new(raw.classify(slice), slice, Span::from(range))),
            Err(()) => {
                for (offset, c) in slice.char_indices() {
                    warn!(character = ?c, offset = range.start + offset, "unrecognized character found in source");
                }
            }
        }
    }

    tokens.push(Token::new(TokenKind::EndOfInput, "", Span(source.len(), source.len())));
    debug!(count = tokens.len(), "tokenized source");

    tokens
}
