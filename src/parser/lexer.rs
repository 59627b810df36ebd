//! Lexer for directive bodies using logos

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // Block delimiters, with or without whitespace control
    #[token("{%")]
    #[token("{%-")]
    #[token("{%~")]
    BlockOpen,
    #[token("%}")]
    #[token("-%}")]
    #[token("~%}")]
    BlockClose,

    // Clause keywords
    #[token("ignore")]
    Ignore,
    #[token("missing")]
    Missing,
    #[token("with")]
    With,
    #[token("only")]
    Only,

    // Literal keywords
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    #[token("none")]
    Null,

    // Delimiters
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(".")]
    Dot,
    // String concatenation
    #[token("~")]
    Tilde,
    #[token("-")]
    Minus,

    // Literals - identifiers must come after keywords
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", |lex| lex.slice().to_string(), priority = 1)]
    Ident(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unescape(lex.slice()))]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| unescape(lex.slice()))]
    String(String),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),

    #[regex(r"[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    // Comments (skip)
    #[regex(r"\{#([^#]|#[^}])*#\}", logos::skip)]
    Comment,
}

/// Strip the surrounding quotes and resolve backslash escapes
fn unescape(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Lex input string into tokens with spans
///
/// Unrecognized characters are dropped here; the grammar reports the gap as an
/// unexpected token or end of input.
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input)
        .spanned()
        .filter_map(|(tok, span)| tok.ok().map(|t| (t, span)))
}

/// Span of the first input the lexer rejects, if any
pub fn first_invalid(input: &str) -> Option<Span> {
    Token::lexer(input)
        .spanned()
        .find_map(|(tok, span)| tok.is_err().then_some(span))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clause_keywords() {
        let tokens: Vec<_> = lex("ignore missing with only").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![Token::Ignore, Token::Missing, Token::With, Token::Only]
        );
    }

    #[test]
    fn test_block_delimiters() {
        let tokens: Vec<_> = lex(r#"{% render "@card" %}"#).map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::BlockOpen,
                Token::Ident("render".to_string()),
                Token::String("@card".to_string()),
                Token::BlockClose,
            ]
        );
    }

    #[test]
    fn test_whitespace_control_delimiters() {
        let tokens: Vec<_> = lex(r#"{%- render "@card" -%}{%~ render x ~%}"#)
            .map(|(t, _)| t)
            .collect();
        assert_eq!(
            tokens,
            vec![
                Token::BlockOpen,
                Token::Ident("render".to_string()),
                Token::String("@card".to_string()),
                Token::BlockClose,
                Token::BlockOpen,
                Token::Ident("render".to_string()),
                Token::Ident("x".to_string()),
                Token::BlockClose,
            ]
        );
    }

    #[test]
    fn test_minus_before_block_close_with_space() {
        let tokens: Vec<_> = lex("{x: -1} %}").map(|(t, _)| t).collect();
        assert_eq!(tokens.last(), Some(&Token::BlockClose));
        assert!(tokens.contains(&Token::Integer(1)));
        assert!(tokens.contains(&Token::Minus));
    }

    #[test]
    fn test_single_and_double_quoted_strings() {
        let tokens: Vec<_> = lex(r#"'@hero--compact' "it\"s""#).map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::String("@hero--compact".to_string()),
                Token::String("it\"s".to_string()),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let tokens: Vec<_> = lex("42 3.5 -7").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Integer(42),
                Token::Float(3.5),
                Token::Minus,
                Token::Integer(7)
            ]
        );
    }

    #[test]
    fn test_map_literal() {
        let tokens: Vec<_> = lex("{title: 'Hi', n: 1}").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::BraceOpen,
                Token::Ident("title".to_string()),
                Token::Colon,
                Token::String("Hi".to_string()),
                Token::Comma,
                Token::Ident("n".to_string()),
                Token::Colon,
                Token::Integer(1),
                Token::BraceClose,
            ]
        );
    }

    #[test]
    fn test_nested_map_before_block_close() {
        let tokens: Vec<_> = lex("{a: {b: 1}}%}").map(|(t, _)| t).collect();
        assert_eq!(tokens.last(), Some(&Token::BlockClose));
        assert_eq!(tokens[tokens.len() - 2], Token::BraceClose);
    }

    #[test]
    fn test_literal_keywords() {
        let tokens: Vec<_> = lex("true false null none").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![Token::True, Token::False, Token::Null, Token::Null]
        );
    }

    #[test]
    fn test_dotted_name_and_concat() {
        let tokens: Vec<_> = lex("user.name ~ 'x'").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("user".to_string()),
                Token::Dot,
                Token::Ident("name".to_string()),
                Token::Tilde,
                Token::String("x".to_string()),
            ]
        );
    }

    #[test]
    fn test_comments_skipped() {
        let tokens: Vec<_> = lex("only {# note #} with").map(|(t, _)| t).collect();
        assert_eq!(tokens, vec![Token::Only, Token::With]);
    }

    #[test]
    fn test_keyword_prefix_is_identifier() {
        let tokens: Vec<_> = lex("onlyone without").map(|(t, _)| t).collect();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("onlyone".to_string()),
                Token::Ident("without".to_string())
            ]
        );
    }

    #[test]
    fn test_first_invalid_reports_span() {
        assert_eq!(first_invalid("only $"), Some(5..6));
        assert_eq!(first_invalid("only"), None);
    }
}
