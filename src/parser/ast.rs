//! Abstract Syntax Tree types for directive bodies

use serde::Serialize;
use serde_json::Value;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// Valid identifier (alphanumeric + underscore, starts with letter/_)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Identifier(pub String);

impl Identifier {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Expression subset understood inside directives
///
/// This covers what the `render` directive needs: a constant component
/// reference and a variable map. Composition adds [`Expr::Ambient`] and
/// [`Expr::Merge`], which never come out of the parser.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Expr {
    /// String, number, boolean or null
    Literal(Value),
    /// Variable lookup: `card` or `page.hero.title`
    Name(Vec<Identifier>),
    /// Map literal `{key: expr, ...}`, keys in source order
    Map(Vec<(String, Expr)>),
    /// List literal `[expr, ...]`
    List(Vec<Expr>),
    /// String concatenation `a ~ b`
    Concat(Box<Expr>, Box<Expr>),
    /// The calling scope at render time
    Ambient,
    /// Shallow merge; keys of the overlay replace keys of the base
    Merge { base: Box<Expr>, overlay: Box<Expr> },
}

impl Expr {
    /// Empty map literal `{}`
    pub fn empty_map() -> Self {
        Expr::Map(Vec::new())
    }

    /// Fold the expression to a string if it is known at compile time
    ///
    /// String and number literals, and concatenations of them, are constant.
    pub fn as_constant_str(&self) -> Option<String> {
        match self {
            Expr::Literal(Value::String(s)) => Some(s.clone()),
            Expr::Literal(Value::Number(n)) => Some(n.to_string()),
            Expr::Concat(left, right) => {
                let mut s = left.as_constant_str()?;
                s.push_str(&right.as_constant_str()?);
                Some(s)
            }
            _ => None,
        }
    }

    /// Lift a decoded value into an equivalent literal expression
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Array(items) => Expr::List(items.iter().map(Expr::from_value).collect()),
            Value::Object(map) => Expr::Map(
                map.iter()
                    .map(|(k, v)| (k.clone(), Expr::from_value(v)))
                    .collect(),
            ),
            scalar => Expr::Literal(scalar.clone()),
        }
    }

    /// Whether this is a map literal with no entries
    pub fn is_empty_map(&self) -> bool {
        matches!(self, Expr::Map(entries) if entries.is_empty())
    }
}

/// One parsed directive occurrence
///
/// Produced once by the parser and only read afterwards; compilation results
/// are returned separately.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DirectiveNode {
    /// Tag the directive was written with (`render`)
    pub tag: String,
    /// Expression naming the component and optional variant
    pub component: Spanned<Expr>,
    /// Variables from the `with` clause
    pub variables: Option<Spanned<Expr>>,
    /// `only` was given
    pub only: bool,
    /// `ignore missing` was given
    pub ignore_missing: bool,
    /// Span of the whole directive
    pub span: Span,
}
