//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;
use serde_json::{Number, Value};

use crate::parser::ast::*;
use crate::parser::lexer::Token;

/// Parse one directive occurrence for the given tag
///
/// Accepts the bare body (`render "@card" only`) or the body wrapped in block
/// delimiters (`{% render "@card" only %}`).
pub fn parse_directive(input: &str, tag: &str) -> Result<DirectiveNode, Vec<crate::ParseError>> {
    parse_directive_at(input, tag, 0)
}

/// Parse a directive cut out of a larger source
///
/// `offset` is the byte position of `input` within that source; every span in
/// the result or the errors is relative to the larger source.
pub fn parse_directive_at(
    input: &str,
    tag: &str,
    offset: usize,
) -> Result<DirectiveNode, Vec<crate::ParseError>> {
    reject_invalid(input, offset)?;

    let end = offset + input.len();

    // Create a logos lexer and convert to token stream
    let token_iter = crate::parser::lexer::lex(input)
        .map(move |(tok, span)| (tok, (span.start + offset..span.end + offset).into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((end..end).into(), |(t, s): (_, _)| (t, s));

    directive_parser(tag.to_string())
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Parse a standalone expression, e.g. a `with` clause supplied by a host
pub fn parse_expr(input: &str) -> Result<Expr, Vec<crate::ParseError>> {
    reject_invalid(input, 0)?;

    let len = input.len();
    let token_iter = crate::parser::lexer::lex(input).map(|(tok, span)| (tok, span.into()));
    let token_stream = Stream::from_iter(token_iter).map((len..len).into(), |(t, s): (_, _)| (t, s));

    expr_parser()
        .then_ignore(end())
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Report characters the lexer cannot tokenize before parsing
fn reject_invalid(input: &str, offset: usize) -> Result<(), Vec<crate::ParseError>> {
    match crate::parser::lexer::first_invalid(input) {
        Some(span) => Err(vec![crate::ParseError::Syntax {
            message: format!("Unexpected character '{}'", &input[span.clone()]),
            span: span.start + offset..span.end + offset,
            expected: Vec::new(),
        }]),
        None => Ok(()),
    }
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

/// Convert a lexed float into a JSON number, falling back to null for NaN
fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn expr_parser<'a, I>() -> impl Parser<'a, I, Expr, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    recursive(|expr| {
        let number = select! {
            Token::Integer(n) => Value::from(n),
            Token::Float(f) => float_value(f),
        };

        let literal = choice((
            select! {
                Token::String(s) => Value::String(s),
                Token::True => Value::Bool(true),
                Token::False => Value::Bool(false),
                Token::Null => Value::Null,
            },
            number.clone(),
            // Negative numbers
            just(Token::Minus).ignore_then(number).map(|v| match v {
                Value::Number(n) => match n.as_i64() {
                    Some(i) => Value::from(-i),
                    None => float_value(-n.as_f64().unwrap_or_default()),
                },
                other => other,
            }),
        ))
        .map(Expr::Literal)
        .labelled("literal");

        // Clause keywords only mean something in clause position; elsewhere
        // they are ordinary names
        let word = select! {
            Token::Ident(s) => s,
            Token::Ignore => "ignore".to_string(),
            Token::Missing => "missing".to_string(),
            Token::With => "with".to_string(),
            Token::Only => "only".to_string(),
        };

        let name = word
            .clone()
            .map(Identifier::new)
            .separated_by(just(Token::Dot))
            .at_least(1)
            .collect::<Vec<_>>()
            .map(Expr::Name)
            .labelled("variable");

        // Keys may be bare words or quoted strings
        let key = word
            .or(select! { Token::String(s) => s })
            .labelled("map key");

        let map = key
            .then_ignore(just(Token::Colon))
            .then(expr.clone())
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::BraceOpen), just(Token::BraceClose))
            .map(Expr::Map);

        let list = expr
            .clone()
            .separated_by(just(Token::Comma))
            .allow_trailing()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::BracketOpen), just(Token::BracketClose))
            .map(Expr::List);

        let atom = choice((
            literal,
            map,
            list,
            name,
            expr.delimited_by(just(Token::ParenOpen), just(Token::ParenClose)),
        ));

        atom.clone()
            .foldl(just(Token::Tilde).ignore_then(atom).repeated(), |left, right| {
                Expr::Concat(Box::new(left), Box::new(right))
            })
            .boxed()
    })
}

fn directive_parser<'a, I>(
    tag: String,
) -> impl Parser<'a, I, DirectiveNode, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let spanned_expr = expr_parser().map_with(|e, x| Spanned::new(e, span_range(&x.span())));

    // Clauses are optional but fixed in order: ignore missing, with, only
    let ignore_missing = just(Token::Ignore)
        .ignore_then(just(Token::Missing))
        .or_not()
        .map(|clause| clause.is_some());

    let with_clause = just(Token::With).ignore_then(spanned_expr.clone()).or_not();

    let only = just(Token::Only).or_not().map(|clause| clause.is_some());

    let body = just(Token::Ident(tag.clone()))
        .ignore_then(spanned_expr)
        .then(ignore_missing)
        .then(with_clause)
        .then(only)
        .map_with(move |(((component, ignore_missing), variables), only), e| DirectiveNode {
            tag: tag.clone(),
            component,
            variables,
            only,
            ignore_missing,
            span: span_range(&e.span()),
        });

    choice((
        body.clone()
            .delimited_by(just(Token::BlockOpen), just(Token::BlockClose))
            .map_with(|mut node, e| {
                node.span = span_range(&e.span());
                node
            }),
        body,
    ))
    .then_ignore(end())
}
