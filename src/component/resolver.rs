//! Variant context resolution from component config documents
//!
//! A config document sits next to its template and may declare:
//!
//! ```yaml
//! default: compact          # variant used when the directive names none
//! context:                  # base variables
//!   title: Card
//! variants:                 # ordered presets
//!   - name: compact
//!     context:
//!       dense: true
//! ```
//!
//! Sources are applied in a fixed order and never overwrite a key that is
//! already set, so the explicit variant beats the base context, which beats
//! the variant's own context.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::parser::ast::Expr;

/// Errors that can occur while loading a config document
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config document does not exist
    #[error("component config not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The config document exists but could not be read
    #[error("failed to read component config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document is malformed or has the wrong shape
    #[error("failed to parse component config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },
}

/// Decoder failure for one of the supported document formats
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

impl ConfigError {
    /// Path of the config document
    pub fn path(&self) -> &PathBuf {
        match self {
            ConfigError::NotFound { path }
            | ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. } => path,
        }
    }
}

/// Document syntax, chosen from the config file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Json,
    Toml,
}

impl ConfigFormat {
    /// Pick the format for a path; unknown extensions are read as YAML
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => ConfigFormat::Json,
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// One named preset in the `variants` list
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VariantSpec {
    pub name: String,
    #[serde(default)]
    pub context: Option<Map<String, Value>>,
}

/// Decoded config document for one component
///
/// Keys other than `default`, `context` and `variants` are ignored.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct VariantConfig {
    #[serde(rename = "default", default)]
    pub default_variant: Option<String>,
    #[serde(default)]
    pub context: Option<Map<String, Value>>,
    #[serde(default)]
    pub variants: Option<Vec<VariantSpec>>,
}

impl VariantConfig {
    /// Decode a document in the given format
    ///
    /// An empty or null document decodes to the default config.
    pub fn decode(content: &str, format: ConfigFormat) -> Result<Self, DecodeError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Option<Self> = match format {
            ConfigFormat::Yaml => serde_yaml::from_str(content)?,
            ConfigFormat::Json => serde_json::from_str(content)?,
            ConfigFormat::Toml => Some(toml::from_str(content)?),
        };
        Ok(config.unwrap_or_default())
    }

    /// Read and decode the document at `path`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        Self::decode(&content, ConfigFormat::for_path(path)).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Find the first variant with this name, in document order
    pub fn variant(&self, name: &str) -> Option<&VariantSpec> {
        self.variants.as_ref()?.iter().find(|v| v.name == name)
    }

    /// Build the context for an optional explicit variant
    pub fn resolve(&self, variant: Option<&str>) -> ResolvedContext {
        let mut context = ResolvedContext::seeded(variant);

        if context.variant().is_none() {
            if let Some(default) = &self.default_variant {
                context.set_variant(default);
            }
        }

        if let Some(base) = &self.context {
            context.fill(base);
        }

        // Only an explicitly requested variant pulls in variant context
        if let Some(name) = variant.filter(|v| !v.is_empty()) {
            match self.variant(name) {
                Some(preset) => {
                    if let Some(extra) = &preset.context {
                        context.fill(extra);
                    }
                }
                None => debug!(variant = name, "No matching variant in config"),
            }
        }

        context
    }
}

/// Variables injected into an included component
///
/// Always holds the reserved `variant` key, `null` when no variant applies.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ResolvedContext {
    values: Map<String, Value>,
}

impl ResolvedContext {
    /// Reserved key holding the effective variant name
    pub const VARIANT_KEY: &'static str = "variant";

    fn seeded(variant: Option<&str>) -> Self {
        let mut values = Map::new();
        values.insert(
            Self::VARIANT_KEY.to_string(),
            variant.map_or(Value::Null, |v| Value::String(v.to_string())),
        );
        Self { values }
    }

    fn set_variant(&mut self, variant: &str) {
        self.values.insert(
            Self::VARIANT_KEY.to_string(),
            Value::String(variant.to_string()),
        );
    }

    /// Insert keys from `source` that are not present yet
    fn fill(&mut self, source: &Map<String, Value>) {
        for (key, value) in source {
            if !self.values.contains_key(key) {
                self.values.insert(key.clone(), value.clone());
            }
        }
    }

    /// Effective variant name
    pub fn variant(&self) -> Option<&str> {
        self.values.get(Self::VARIANT_KEY).and_then(Value::as_str)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }

    /// Map literal carrying the same keys and values, in order
    pub fn to_expr(&self) -> Expr {
        Expr::from_value(&Value::Object(self.values.clone()))
    }
}

/// Loads config documents and resolves variant contexts
///
/// With caching enabled each document is decoded once and treated as
/// immutable afterwards, the same assumption the registry makes about
/// templates.
#[derive(Debug, Default)]
pub struct VariantResolver {
    cache: Option<Mutex<HashMap<PathBuf, Arc<VariantConfig>>>>,
}

impl VariantResolver {
    /// Resolver that re-reads documents on every call
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver that keeps decoded documents by path
    pub fn cached() -> Self {
        Self {
            cache: Some(Mutex::new(HashMap::new())),
        }
    }

    /// Load and decode the document at `config_id`
    pub fn load_config(&self, config_id: &Path) -> Result<Arc<VariantConfig>, ConfigError> {
        let Some(cache) = &self.cache else {
            return VariantConfig::from_file(config_id).map(Arc::new);
        };

        if let Some(config) = cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(config_id)
        {
            return Ok(Arc::clone(config));
        }

        let config = Arc::new(VariantConfig::from_file(config_id)?);
        cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(config_id.to_path_buf(), Arc::clone(&config));
        Ok(config)
    }

    /// Resolve the context for `variant` from the document at `config_id`
    pub fn load_context(
        &self,
        config_id: &Path,
        variant: Option<&str>,
    ) -> Result<ResolvedContext, ConfigError> {
        let config = self.load_config(config_id)?;
        let context = config.resolve(variant);
        debug!(
            config = %config_id.display(),
            variant = context.variant(),
            keys = context.len(),
            "Resolved variant context"
        );
        Ok(context)
    }
}

/// Resolve a context without caching
pub fn load_context(config_id: &Path, variant: Option<&str>) -> Result<ResolvedContext, ConfigError> {
    VariantResolver::new().load_context(config_id, variant)
}
