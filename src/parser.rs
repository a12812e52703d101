use std::ops::Range;
use std::rc::Rc;

use chumsky::error::{Error as _, Simple, SimpleReason};
use chumsky::prelude::{choice, end, filter_map, recursive};
use chumsky::{Parser, Stream};
use tracing::debug;

use crate::ast::{BinaryOperator, Expression, FunctionDeclaration, Program, Property, Statement};
use crate::error::ParseError;
use crate::lexer::tokenize;
use crate::token::{Span, Token, TokenKind};

/// Tokenizes and parses `source`. The first structural error aborts parsing.
pub fn parse(source: &str) -> Result<Program, ParseError> {
    parse_tokens(tokenize(source))
}

/// Parses a token sequence as produced by [`tokenize`], which must end with
/// a [`TokenKind::EndOfInput`] token.
pub fn parse_tokens(tokens: Vec<Token>) -> Result<Program, ParseError> {
    let eoi = tokens.last().map(|token| token.span.1).unwrap_or(0);
    let stream = Stream::from_iter(
        eoi..eoi,
        tokens.into_iter().map(|token| {
            let range = token.span.range();
            (token, range)
        }),
    );

    match parser().parse(stream) {
        Ok(program) => {
            debug!(statements = program.body.len(), "parsed program");
            Ok(program)
        }
        Err(errors) => Err(errors
            .into_iter()
            .next()
            .map(convert_error)
            .unwrap_or_else(|| ParseError {
                message: "unknown parse failure".to_owned(),
                found: None,
                expected: Vec::new(),
                span: Span(eoi, eoi),
            })),
    }
}

fn convert_error(error: Simple<Token>) -> ParseError {
    let message = match error.reason() {
        SimpleReason::Custom(message) => message.clone(),
        SimpleReason::Unclosed { delimiter, .. } => format!("unclosed delimiter {}", delimiter),
        SimpleReason::Unexpected => "unexpected token".to_owned(),
    };

    let mut expected = error
        .expected()
        .filter_map(|token| token.as_ref().map(describe_expected))
        .collect::<Vec<_>>();
    expected.sort();
    expected.dedup();

    ParseError {
        message,
        found: error.found().map(|token| token.to_string()),
        expected,
        span: Span::from(error.span()),
    }
}

fn describe_expected(token: &Token) -> String {
    match token.kind {
        TokenKind::BinaryOperator => format!("'{}'", token.value),
        kind => kind.to_string(),
    }
}

fn token(kind: TokenKind) -> impl Parser<Token, Token, Error = Simple<Token>> + Clone {
    filter_map(move |span: Range<usize>, token: Token| {
        if token.kind == kind {
            Ok(token)
        } else {
            let expected = Token::new(kind, "", Span(span.start, span.start));
            Err(Simple::expected_input_found(span, [Some(expected)], Some(token)))
        }
    })
}

fn operator(
    allowed: &'static [BinaryOperator],
) -> impl Parser<Token, BinaryOperator, Error = Simple<Token>> + Clone {
    filter_map(move |span: Range<usize>, token: Token| {
        match BinaryOperator::from_symbol(&token.value) {
            Some(operator) if token.kind == TokenKind::BinaryOperator && allowed.contains(&operator) => {
                Ok(operator)
            }
            _ => {
                let expected = allowed
                    .iter()
                    .map(|operator| {
                        Some(Token::new(
                            TokenKind::BinaryOperator,
                            operator.symbol(),
                            Span(span.start, span.start),
                        ))
                    })
                    .collect::<Vec<_>>();
                Err(Simple::expected_input_found(span, expected, Some(token)))
            }
        }
    })
}

fn parser() -> impl Parser<Token, Program, Error = Simple<Token>> {
    let identifier = token(TokenKind::Identifier).map(|token| token.value);

    let statement = recursive(|statement| {
        let expression = recursive(|expression| {
            let arguments = expression
                .clone()
                .separated_by(token(TokenKind::Comma))
                .delimited_by(token(TokenKind::OpenParen), token(TokenKind::CloseParen));

            let parameters = arguments.clone().try_map(|arguments: Vec<Expression>, span| {
                arguments
                    .into_iter()
                    .map(|argument| match argument {
                        Expression::Identifier(name) => Ok(name),
                        other => Err(Simple::custom(
                            span.clone(),
                            format!("function parameters must be identifiers, found {}", other.kind()),
                        )),
                    })
                    .collect::<Result<Vec<_>, _>>()
            });

            let block = statement
                .clone()
                .repeated()
                .delimited_by(token(TokenKind::OpenBrace), token(TokenKind::CloseBrace));

            let function_declaration = token(TokenKind::Fn)
                .ignore_then(identifier.clone())
                .then(parameters)
                .then(block)
                .map(|((name, parameters), body): ((String, Vec<String>), Vec<Statement>)| {
                    Expression::FunctionDeclaration(Rc::new(FunctionDeclaration {
                        name,
                        parameters,
                        body: body.into(),
                    }))
                });

            let number = token(TokenKind::Number).try_map(|token, span| {
                token
                    .value
                    .parse::<f64>()
                    .map(Expression::NumericLiteral)
                    .map_err(|_| Simple::custom(span, format!("invalid numeric literal '{}'", token.value)))
            });

            let primary = choice((
                identifier.clone().map(Expression::Identifier),
                number,
                expression
                    .clone()
                    .delimited_by(token(TokenKind::OpenParen), token(TokenKind::CloseParen)),
                function_declaration,
            ))
            .boxed();

            let dot_property = token(TokenKind::Dot)
                .ignore_then(primary.clone())
                .try_map(|property: Expression, span| {
                    if matches!(property, Expression::Identifier(_)) {
                        Ok((property, false))
                    } else {
                        Err(Simple::custom(
                            span,
                            format!(
                                "cannot use dot operator without right hand side being an identifier, found {}",
                                property.kind()
                            ),
                        ))
                    }
                });

            let computed_property = expression
                .clone()
                .delimited_by(token(TokenKind::OpenBracket), token(TokenKind::CloseBracket))
                .map(|property| (property, true));

            let member = primary
                .then(dot_property.or(computed_property).repeated())
                .foldl(|object, (property, computed)| Expression::Member {
                    object: Box::new(object),
                    property: Box::new(property),
                    computed,
                });

            let call = member
                .then(arguments.repeated())
                .foldl(|callee, arguments| Expression::Call {
                    callee: Box::new(callee),
                    arguments,
                })
                .boxed();

            let product = call
                .clone()
                .then(
                    operator(&[BinaryOperator::Multiply, BinaryOperator::Divide, BinaryOperator::Modulo])
                        .then(call)
                        .repeated(),
                )
                .foldl(|left, (operator, right)| Expression::binary(left, operator, right))
                .boxed();

            let sum = product
                .clone()
                .then(
                    operator(&[BinaryOperator::Add, BinaryOperator::Subtract])
                        .then(product)
                        .repeated(),
                )
                .foldl(|left, (operator, right)| Expression::binary(left, operator, right));

            let property = identifier
                .clone()
                .then(token(TokenKind::Colon).ignore_then(expression.clone()).or_not())
                .map(|(key, value)| Property { key, value });

            let object = property
                .separated_by(token(TokenKind::Comma))
                .allow_trailing()
                .delimited_by(token(TokenKind::OpenBrace), token(TokenKind::CloseBrace))
                .map(Expression::Object);

            let object_or_sum = object.or(sum).boxed();

            recursive(|assignment| {
                object_or_sum
                    .then(token(TokenKind::Equals).ignore_then(assignment).or_not())
                    .map(|(target, value)| match value {
                        Some(value) => Expression::Assignment {
                            target: Box::new(target),
                            value: Box::new(value),
                        },
                        None => target,
                    })
            })
        });

        let let_declaration = token(TokenKind::Let)
            .ignore_then(identifier.clone())
            .then(token(TokenKind::Equals).ignore_then(expression.clone()).or_not())
            .then_ignore(token(TokenKind::Semicolon))
            .map(|(name, value)| Statement::VariableDeclaration {
                name,
                value,
                constant: false,
            });

        let const_declaration = token(TokenKind::Const)
            .ignore_then(identifier.clone())
            .then_ignore(token(TokenKind::Equals))
            .then(expression.clone())
            .then_ignore(token(TokenKind::Semicolon))
            .map(|(name, value)| Statement::VariableDeclaration {
                name,
                value: Some(value),
                constant: true,
            });

        let expression_statement = expression
            .then_ignore(token(TokenKind::Semicolon).or_not())
            .map(Statement::Expression);

        choice((let_declaration, const_declaration, expression_statement))
    });

    statement
        .repeated()
        .then_ignore(token(TokenKind::EndOfInput))
        .then_ignore(end())
        .map(|body| Program { body })
}
