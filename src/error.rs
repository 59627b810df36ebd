//! Error types for parsing and compiling directives

use std::path::PathBuf;

use ariadne::{Color, Label, Report, ReportKind, Source};
use thiserror::Error;

use crate::component::{ConfigError, RegistryError};

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Parse error at {span:?}: {message}")]
    Syntax {
        span: Span,
        message: String,
        expected: Vec<String>,
    },
}

impl ParseError {
    /// Format the error with source context using ariadne
    pub fn format(&self, source: &str, filename: &str) -> String {
        match self {
            ParseError::Syntax {
                span,
                message,
                expected,
            } => {
                let expected_str = if expected.is_empty() {
                    String::new()
                } else {
                    format!("\nExpected: {}", expected.join(", "))
                };
                report(
                    source,
                    filename,
                    span.clone(),
                    message,
                    &format!("{}{}", message, expected_str),
                )
            }
        }
    }

    pub fn span(&self) -> &Span {
        match self {
            ParseError::Syntax { span, .. } => span,
        }
    }
}

/// Render a single-label ariadne report to a string
fn report(source: &str, filename: &str, span: Span, message: &str, label: &str) -> String {
    let mut buf = Vec::new();
    let written = Report::build(ReportKind::Error, filename, span.start)
        .with_message(message)
        .with_label(
            Label::new((filename, span))
                .with_message(label)
                .with_color(Color::Red),
        )
        .finish()
        .write((filename, Source::from(source)), &mut buf);
    match written {
        Ok(()) => String::from_utf8_lossy(&buf).into_owned(),
        Err(_) => format!("{}: {}", filename, message),
    }
}

impl<'a> From<chumsky::error::Rich<'a, crate::parser::lexer::Token>> for ParseError {
    fn from(err: chumsky::error::Rich<'a, crate::parser::lexer::Token>) -> Self {
        use chumsky::error::RichReason;

        let message = match err.reason() {
            RichReason::ExpectedFound { found, .. } => {
                let found_str = match found {
                    Some(tok) => format_token(tok),
                    None => "end of input".to_string(),
                };
                format!("Unexpected {}", found_str)
            }
            RichReason::Custom(msg) => msg.to_string(),
        };

        // Format expected tokens nicely
        let expected: Vec<String> = err
            .expected()
            .filter_map(|e| match e {
                chumsky::error::RichPattern::Token(tok) => Some(format_token(tok)),
                chumsky::error::RichPattern::Label(label) => Some(label.to_string()),
                chumsky::error::RichPattern::EndOfInput => Some("end of input".to_string()),
                chumsky::error::RichPattern::Identifier(s) => Some(format!("identifier '{}'", s)),
                chumsky::error::RichPattern::Any => Some("any token".to_string()),
                chumsky::error::RichPattern::SomethingElse => None,
            })
            .collect();

        ParseError::Syntax {
            span: err.span().into_range(),
            message,
            expected,
        }
    }
}

/// Format a token for human-readable error messages
fn format_token(tok: &crate::parser::lexer::Token) -> String {
    use crate::parser::lexer::Token;
    match tok {
        Token::Ident(s) => format!("identifier '{}'", s),
        Token::String(s) => format!("string \"{}\"", s),
        Token::Integer(n) => format!("number {}", n),
        Token::Float(n) => format!("number {}", n),
        Token::BlockOpen => "'{%'".to_string(),
        Token::BlockClose => "'%}'".to_string(),
        Token::BraceOpen => "'{'".to_string(),
        Token::BraceClose => "'}'".to_string(),
        Token::BracketOpen => "'['".to_string(),
        Token::BracketClose => "']'".to_string(),
        Token::ParenOpen => "'('".to_string(),
        Token::ParenClose => "')'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Colon => "':'".to_string(),
        Token::Dot => "'.'".to_string(),
        Token::Tilde => "'~'".to_string(),
        Token::Minus => "'-'".to_string(),
        // Clause keywords
        Token::Ignore => "keyword 'ignore'".to_string(),
        Token::Missing => "keyword 'missing'".to_string(),
        Token::With => "keyword 'with'".to_string(),
        Token::Only => "keyword 'only'".to_string(),
        Token::True => "keyword 'true'".to_string(),
        Token::False => "keyword 'false'".to_string(),
        Token::Null => "keyword 'null'".to_string(),
        Token::Comment => "comment".to_string(),
    }
}

/// Category of a compile failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    RegistryMisconfigured,
    UnknownComponent,
    DuplicateComponent,
    DirectiveSyntax,
    ConfigNotFound,
    ConfigParse,
    Io,
}

/// Errors that abort compilation of a directive
#[derive(Debug, Error)]
pub enum CompileError {
    /// Malformed directive, unexpected token, or non-constant component
    #[error("{}", format_parse_errors(.0))]
    Syntax(Vec<ParseError>),

    /// Registry could not be built or the component is not in it
    #[error("{source}")]
    Registry {
        #[source]
        source: RegistryError,
        span: Option<Span>,
    },

    /// Component config could not be loaded
    #[error("{source}")]
    Config {
        #[source]
        source: ConfigError,
        span: Option<Span>,
    },

    /// No directive kind is registered for the tag
    #[error("unknown directive tag '{tag}'")]
    UnknownTag { tag: String, span: Span },
}

impl From<Vec<ParseError>> for CompileError {
    fn from(errors: Vec<ParseError>) -> Self {
        CompileError::Syntax(errors)
    }
}

impl From<ParseError> for CompileError {
    fn from(error: ParseError) -> Self {
        CompileError::Syntax(vec![error])
    }
}

impl From<RegistryError> for CompileError {
    fn from(source: RegistryError) -> Self {
        CompileError::Registry { source, span: None }
    }
}

impl From<ConfigError> for CompileError {
    fn from(source: ConfigError) -> Self {
        CompileError::Config { source, span: None }
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl CompileError {
    /// Create a syntax error at a span
    pub fn syntax(span: Span, message: impl Into<String>) -> Self {
        CompileError::Syntax(vec![ParseError::Syntax {
            span,
            message: message.into(),
            expected: Vec::new(),
        }])
    }

    /// Attach the directive location to an error that lacks one
    pub fn at(self, location: Span) -> Self {
        match self {
            CompileError::Registry { source, span } => CompileError::Registry {
                source,
                span: span.or(Some(location)),
            },
            CompileError::Config { source, span } => CompileError::Config {
                source,
                span: span.or(Some(location)),
            },
            other => other,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::Syntax(_) | CompileError::UnknownTag { .. } => ErrorKind::DirectiveSyntax,
            CompileError::Registry { source, .. } => match source {
                RegistryError::Misconfigured { .. } => ErrorKind::RegistryMisconfigured,
                RegistryError::UnknownComponent { .. } => ErrorKind::UnknownComponent,
                RegistryError::Duplicate { .. } => ErrorKind::DuplicateComponent,
                RegistryError::Walk { .. } => ErrorKind::Io,
            },
            CompileError::Config { source, .. } => match source {
                ConfigError::NotFound { .. } => ErrorKind::ConfigNotFound,
                ConfigError::Parse { .. } => ErrorKind::ConfigParse,
                ConfigError::Read { .. } => ErrorKind::Io,
            },
        }
    }

    /// Get the source span if available
    pub fn span(&self) -> Option<Span> {
        match self {
            CompileError::Syntax(errors) => errors.first().map(|e| e.span().clone()),
            CompileError::Registry { span, .. } | CompileError::Config { span, .. } => span.clone(),
            CompileError::UnknownTag { span, .. } => Some(span.clone()),
        }
    }

    /// Path of the config document involved, if any
    pub fn config_path(&self) -> Option<&PathBuf> {
        match self {
            CompileError::Config { source, .. } => Some(source.path()),
            _ => None,
        }
    }

    /// Format the error with source context using ariadne
    ///
    /// Errors without a location fall back to their plain message.
    pub fn format(&self, source: &str, filename: &str) -> String {
        match self {
            CompileError::Syntax(errors) => errors
                .iter()
                .map(|e| e.format(source, filename))
                .collect::<Vec<_>>()
                .join("\n"),
            other => match other.span() {
                Some(span) => {
                    let message = other.to_string();
                    report(source, filename, span, &message, &message)
                }
                None => format!("{}: {}", filename, other),
            },
        }
    }
}
