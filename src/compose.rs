//! Composition of the variable set passed to an included component
//!
//! Three layers take part, lowest precedence first:
//!
//! 1. the resolved variant context
//! 2. the directive's `with` variables
//! 3. the calling scope, unless `only` is set
//!
//! Each layer shallowly overrides the keys of the ones below it.

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::component::ResolvedContext;
use crate::eval::EvalError;
use crate::parser::ast::{Expr, Span};

/// One source of variables
#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    /// Defaults from the component config
    Variant(ResolvedContext),
    /// The `with` expression, evaluated at render time
    Explicit(Expr),
    /// The calling scope
    Ambient,
}

impl Layer {
    fn into_expr(self) -> Expr {
        match self {
            Layer::Variant(context) => context.to_expr(),
            Layer::Explicit(expr) => expr,
            Layer::Ambient => Expr::Ambient,
        }
    }
}

/// Layers present for a directive, in precedence order
///
/// `only` without explicit variables yields no layers at all.
pub fn layers(context: Option<&ResolvedContext>, explicit: Option<&Expr>, only: bool) -> Vec<Layer> {
    if only && explicit.is_none() {
        return Vec::new();
    }

    let mut layers = Vec::with_capacity(3);
    if let Some(context) = context {
        layers.push(Layer::Variant(context.clone()));
    }
    if let Some(explicit) = explicit {
        layers.push(Layer::Explicit(explicit.clone()));
    }
    if !only {
        layers.push(Layer::Ambient);
    }
    layers
}

/// Fold layers into one expression; later layers override earlier ones
///
/// No layers gives the empty map and a single layer is returned as is, so an
/// ambient-only composition forwards the calling scope untouched.
pub fn compose(layers: Vec<Layer>) -> Expr {
    let mut layers = layers.into_iter();
    let Some(first) = layers.next() else {
        return Expr::empty_map();
    };

    layers.fold(first.into_expr(), |base, layer| Expr::Merge {
        base: Box::new(base),
        overlay: Box::new(layer.into_expr()),
    })
}

/// Include operation handed to the host engine
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncludeCall {
    /// Namespaced template path
    pub template_id: String,
    /// Composed variable expression
    pub variables: Expr,
    pub only: bool,
    pub ignore_missing: bool,
    /// Span of the directive that produced the call
    pub span: Span,
}

impl IncludeCall {
    pub fn new(
        template_id: impl Into<String>,
        layers: Vec<Layer>,
        only: bool,
        ignore_missing: bool,
        span: Span,
    ) -> Self {
        let template_id = template_id.into();
        debug!(
            template = %template_id,
            layers = layers.len(),
            only,
            "Composed include variables"
        );
        Self {
            template_id,
            variables: compose(layers),
            only,
            ignore_missing,
            span,
        }
    }

    /// Variables the included template would see, given the calling scope
    pub fn evaluate(&self, scope: &Map<String, Value>) -> Result<Value, EvalError> {
        self.variables.evaluate(scope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ConfigFormat, VariantConfig};
    use crate::parser::parse_expr;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn context(yaml: &str, variant: Option<&str>) -> ResolvedContext {
        VariantConfig::decode(yaml, ConfigFormat::Yaml)
            .expect("Should decode")
            .resolve(variant)
    }

    fn scope(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("scope must be a map"),
        }
    }

    #[test]
    fn test_only_without_with_is_empty_map() {
        let ctx = context("context:\n  x: 1\n", None);
        let expr = compose(layers(Some(&ctx), None, true));
        assert_eq!(expr, Expr::empty_map());
        assert_eq!(expr.evaluate(&scope(json!({"x": 5}))), Ok(json!({})));
    }

    #[test]
    fn test_ambient_alone_is_forwarded() {
        assert_eq!(compose(layers(None, None, false)), Expr::Ambient);
    }

    #[test]
    fn test_precedence_variant_then_with_then_ambient() {
        let ctx = context("context:\n  x: 1\n  z: 2\n", None);
        let explicit = parse_expr("{x: 9}").unwrap();
        let expr = compose(layers(Some(&ctx), Some(&explicit), false));

        let value = expr.evaluate(&scope(json!({"x": 5, "w": 7}))).unwrap();
        assert_eq!(value, json!({"variant": null, "x": 5, "z": 2, "w": 7}));
    }

    #[test]
    fn test_only_with_with_excludes_ambient() {
        let ctx = context("context:\n  x: 1\n  z: 2\n", None);
        let explicit = parse_expr("{x: 9}").unwrap();
        let found = layers(Some(&ctx), Some(&explicit), true);
        assert!(!found.contains(&Layer::Ambient));

        let value = compose(found).evaluate(&scope(json!({"w": 7}))).unwrap();
        assert_eq!(value, json!({"variant": null, "x": 9, "z": 2}));
    }

    #[test]
    fn test_merge_is_shallow() {
        let ctx = context("context:\n  card: {title: T, size: s}\n", None);
        let explicit = parse_expr("{card: {title: 'U'}}").unwrap();
        let value = compose(layers(Some(&ctx), Some(&explicit), true))
            .evaluate(&Map::new())
            .unwrap();
        assert_eq!(value["card"], json!({"title": "U"}));
    }
}
