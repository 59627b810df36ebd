//! Compiler configuration
//!
//! Settings can be built in code or read from a TOML file:
//!
//! ```toml
//! [registry]
//! namespace = "FrctlTwig"
//! roots = ["templates/components"]
//! template_extension = "twig"
//! config_extension = "yml"
//! duplicates = "last-wins"
//!
//! [compiler]
//! cache_configs = false
//! ```
//!
//! Relative roots are taken relative to the file's directory.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::component::FilesystemLoader;

/// Loader namespace the component roots are registered under by default
pub const DEFAULT_NAMESPACE: &str = "FrctlTwig";

/// Errors that can occur when loading a configuration file
#[derive(Error, Debug)]
pub enum CompilerConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// What to do when two templates share a base name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Keep the template enumerated last and log a warning
    #[default]
    LastWins,
    /// Fail the registry build
    Reject,
}

/// Configuration for the directive compiler
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerConfig {
    /// Loader namespace whose roots hold the components
    pub namespace: String,
    /// Template file extension without the leading dot
    pub template_extension: String,
    /// Config document extension without the leading dot
    pub config_extension: String,
    /// Collision handling during the registry scan
    pub duplicates: DuplicatePolicy,
    /// Keep decoded config documents for the compiler's lifetime
    pub cache_configs: bool,
    /// Search roots for `namespace`, used by [`CompilerConfig::loader`]
    pub roots: Vec<PathBuf>,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            template_extension: "twig".to_string(),
            config_extension: "yml".to_string(),
            duplicates: DuplicatePolicy::LastWins,
            cache_configs: false,
            roots: Vec::new(),
        }
    }
}

#[derive(Deserialize, Default)]
struct TomlConfig {
    #[serde(default)]
    registry: TomlRegistry,
    #[serde(default)]
    compiler: TomlCompiler,
}

#[derive(Deserialize, Default)]
struct TomlRegistry {
    namespace: Option<String>,
    #[serde(default)]
    roots: Vec<PathBuf>,
    template_extension: Option<String>,
    config_extension: Option<String>,
    duplicates: Option<DuplicatePolicy>,
}

#[derive(Deserialize, Default)]
struct TomlCompiler {
    cache_configs: Option<bool>,
}

impl CompilerConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, CompilerConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = content.parse()?;
        if let Some(base) = path.parent() {
            config.roots = config
                .roots
                .into_iter()
                .map(|root| if root.is_relative() { base.join(root) } else { root })
                .collect();
        }
        Ok(config)
    }

    /// Set the component namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the template extension (`twig`, `html.twig`, ...)
    pub fn with_template_extension(mut self, extension: impl Into<String>) -> Self {
        self.template_extension = extension.into();
        self
    }

    /// Set the config document extension (`yml`, `json`, `toml`)
    pub fn with_config_extension(mut self, extension: impl Into<String>) -> Self {
        self.config_extension = extension.into();
        self
    }

    /// Set the duplicate name policy
    pub fn with_duplicates(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicates = policy;
        self
    }

    /// Enable or disable the config document cache
    pub fn with_cache_configs(mut self, cache: bool) -> Self {
        self.cache_configs = cache;
        self
    }

    /// Add a search root
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.push(root.into());
        self
    }

    /// Filesystem loader with `roots` registered under `namespace`
    pub fn loader(&self) -> FilesystemLoader {
        self.roots
            .iter()
            .fold(FilesystemLoader::new(), |loader, root| {
                loader.with_path(self.namespace.clone(), root.clone())
            })
    }
}

/// Parse configuration from a TOML string
///
/// Missing keys keep their defaults.
impl FromStr for CompilerConfig {
    type Err = CompilerConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let defaults = Self::default();

        Ok(Self {
            namespace: parsed.registry.namespace.unwrap_or(defaults.namespace),
            template_extension: parsed
                .registry
                .template_extension
                .unwrap_or(defaults.template_extension),
            config_extension: parsed
                .registry
                .config_extension
                .unwrap_or(defaults.config_extension),
            duplicates: parsed.registry.duplicates.unwrap_or(defaults.duplicates),
            cache_configs: parsed.compiler.cache_configs.unwrap_or(defaults.cache_configs),
            roots: parsed.registry.roots,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::SearchPaths;

    #[test]
    fn test_defaults() {
        let config = CompilerConfig::new();
        assert_eq!(config.namespace, "FrctlTwig");
        assert_eq!(config.template_extension, "twig");
        assert_eq!(config.config_extension, "yml");
        assert_eq!(config.duplicates, DuplicatePolicy::LastWins);
        assert!(!config.cache_configs);
    }

    #[test]
    fn test_from_str_partial() {
        let config: CompilerConfig = r#"
[registry]
namespace = "ui"
duplicates = "reject"
"#
        .parse()
        .unwrap();
        assert_eq!(config.namespace, "ui");
        assert_eq!(config.duplicates, DuplicatePolicy::Reject);
        assert_eq!(config.template_extension, "twig");
    }

    #[test]
    fn test_from_str_empty() {
        assert_eq!("".parse::<CompilerConfig>().unwrap(), CompilerConfig::default());
    }

    #[test]
    fn test_from_str_invalid_policy() {
        let result = "[registry]\nduplicates = \"first-wins\"\n".parse::<CompilerConfig>();
        assert!(matches!(result, Err(CompilerConfigError::ParseError(_))));
    }

    #[test]
    fn test_from_file_resolves_relative_roots() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("compiler.toml");
        std::fs::write(
            &path,
            "[registry]\nroots = [\"components\", \"/abs/root\"]\n\n[compiler]\ncache_configs = true\n",
        )
        .unwrap();

        let config = CompilerConfig::from_file(&path).unwrap();
        assert_eq!(
            config.roots,
            vec![dir.path().join("components"), PathBuf::from("/abs/root")]
        );
        assert!(config.cache_configs);
    }

    #[test]
    fn test_loader_uses_namespace() {
        let config = CompilerConfig::new()
            .with_namespace("ui")
            .with_root("/a")
            .with_root("/b");
        let loader = config.loader();
        assert_eq!(
            loader.paths("ui"),
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
        assert!(loader.paths(DEFAULT_NAMESPACE).is_empty());
    }
}
