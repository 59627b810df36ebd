//! Evaluation of directive expressions against an ambient scope

use serde_json::{Map, Value};
use thiserror::Error;

use crate::parser::ast::Expr;

/// Errors that can occur while evaluating an expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("cannot merge {found}: expected a map")]
    NotAMap { found: &'static str },

    #[error("cannot concatenate {found}")]
    NotConcatenable { found: &'static str },
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

/// Display form used by `~`; null and false are empty, true is `1`
fn display(value: &Value) -> Result<String, EvalError> {
    match value {
        Value::Null | Value::Bool(false) => Ok(String::new()),
        Value::Bool(true) => Ok("1".to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => Ok(s.clone()),
        other => Err(EvalError::NotConcatenable {
            found: type_name(other),
        }),
    }
}

impl Expr {
    /// Materialize the expression with `scope` as the calling scope
    ///
    /// Unknown names evaluate to `null`.
    pub fn evaluate(&self, scope: &Map<String, Value>) -> Result<Value, EvalError> {
        match self {
            Expr::Literal(value) => Ok(value.clone()),
            Expr::Name(path) => {
                let mut current = match path.first() {
                    Some(head) => scope.get(head.as_str()),
                    None => None,
                };
                for segment in path.iter().skip(1) {
                    current = current
                        .and_then(Value::as_object)
                        .and_then(|map| map.get(segment.as_str()));
                }
                Ok(current.cloned().unwrap_or(Value::Null))
            }
            Expr::Map(entries) => {
                let mut map = Map::new();
                for (key, value) in entries {
                    map.insert(key.clone(), value.evaluate(scope)?);
                }
                Ok(Value::Object(map))
            }
            Expr::List(items) => items
                .iter()
                .map(|item| item.evaluate(scope))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            Expr::Concat(left, right) => {
                let mut s = display(&left.evaluate(scope)?)?;
                s.push_str(&display(&right.evaluate(scope)?)?);
                Ok(Value::String(s))
            }
            Expr::Ambient => Ok(Value::Object(scope.clone())),
            Expr::Merge { base, overlay } => {
                let mut merged = into_map(base.evaluate(scope)?)?;
                for (key, value) in into_map(overlay.evaluate(scope)?)? {
                    merged.insert(key, value);
                }
                Ok(Value::Object(merged))
            }
        }
    }
}

fn into_map(value: Value) -> Result<Map<String, Value>, EvalError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(EvalError::NotAMap {
            found: type_name(&other),
        }),
    }
}
