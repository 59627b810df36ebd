//! Component Directive - compile-time resolution of `render` directives
//!
//! This library compiles `{% render "@card--compact" with {...} only %}`
//! directives found in templates into include calls for a host engine. The
//! component name is looked up in a registry built from the template search
//! roots, the variant picks defaults from the component's config document,
//! and the variables are composed from the config, the `with` clause and the
//! calling scope.
//!
//! # Example
//!
//! ```rust,no_run
//! use component_directive::{compile_template, CompilerConfig};
//!
//! let config = CompilerConfig::new().with_root("templates/components");
//! let calls = compile_template(r#"<main>{% render "@card" only %}</main>"#, &config).unwrap();
//! assert_eq!(calls[0].template_id, "@FrctlTwig/card.twig");
//! ```

pub mod component;
pub mod compose;
pub mod config;
pub mod directive;
pub mod error;
pub mod eval;
pub mod parser;

pub use component::{
    ComponentEntry, ComponentReference, ComponentRegistry, ConfigError, DecodeError,
    FilesystemLoader, RegistryError, ResolvedContext, SearchPaths, VariantConfig, VariantResolver,
};
pub use compose::{IncludeCall, Layer};
pub use config::{CompilerConfig, CompilerConfigError, DuplicatePolicy};
pub use directive::{DirectiveKind, Extension, RenderDirective, ResolvedDirective};
pub use error::{CompileError, ErrorKind, ParseError};
pub use eval::EvalError;
pub use parser::{find_directives, parse_directive, DirectiveNode, Expr};

/// Compile every `render` directive in a template
///
/// Builds a fresh [`Extension`] from the configuration; hosts compiling many
/// templates should keep one extension so the registry is scanned once.
pub fn compile_template(
    source: &str,
    config: &CompilerConfig,
) -> Result<Vec<IncludeCall>, CompileError> {
    Extension::from_config(config).compile_template(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_compile_template_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("atoms")).unwrap();
        fs::write(dir.path().join("atoms/card.twig"), "<div>{{ title }}</div>").unwrap();
        fs::write(
            dir.path().join("atoms/card.config.yml"),
            "default: plain\ncontext:\n  title: Card\n",
        )
        .unwrap();

        let config = CompilerConfig::new().with_root(dir.path());
        let source = r#"<main>{% render "@card" with {title: "Hi"} %}</main>"#;
        let calls = compile_template(source, &config).unwrap();

        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].template_id, "@FrctlTwig/atoms/card.twig");
        assert_eq!(&source[calls[0].span.clone()], r#"{% render "@card" with {title: "Hi"} %}"#);

        let value = calls[0].evaluate(&serde_json::Map::new()).unwrap();
        assert_eq!(value, serde_json::json!({"variant": "plain", "title": "Hi"}));
    }

    #[test]
    fn test_compile_template_without_roots() {
        let err = compile_template(r#"{% render "@card" %}"#, &CompilerConfig::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RegistryMisconfigured);
    }

    #[test]
    fn test_compile_template_without_directives_skips_scan() {
        let calls = compile_template("<p>{{ plain }}</p>", &CompilerConfig::new()).unwrap();
        assert!(calls.is_empty());
    }
}
