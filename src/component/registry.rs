//! Component registry built from a scan of the template search roots

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use once_cell::sync::OnceCell;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::loader::SearchPaths;
use crate::config::{CompilerConfig, DuplicatePolicy};

/// Errors that can occur while building or querying the registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The loader has no roots for the component namespace
    #[error("there are no registered paths for namespace '{namespace}'")]
    Misconfigured { namespace: String },

    /// No template with this base name was found
    #[error("no component named '{name}' found")]
    UnknownComponent { name: String },

    /// Two templates share a base name and duplicates are rejected
    #[error("duplicate component '{name}': {first} and {second}")]
    Duplicate {
        name: String,
        first: String,
        second: String,
    },

    /// A search root could not be walked
    #[error("failed to scan {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// A template found under a search root, with its sibling config location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentEntry {
    /// Base name of the template file
    pub name: String,
    /// Namespaced include path, e.g. `@FrctlTwig/atoms/card.twig`
    pub template_id: String,
    /// `<dir>/<name>.config.<ext>`; not checked for existence
    pub config_id: PathBuf,
}

/// Name → entry index, built on first use and kept for the registry's lifetime
///
/// Templates added to the roots after the first lookup are not seen.
pub struct ComponentRegistry {
    loader: Box<dyn SearchPaths>,
    namespace: String,
    template_extension: String,
    config_extension: String,
    duplicates: DuplicatePolicy,
    index: OnceCell<HashMap<String, ComponentEntry>>,
    builds: AtomicUsize,
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("namespace", &self.namespace)
            .field("template_extension", &self.template_extension)
            .field("config_extension", &self.config_extension)
            .field("duplicates", &self.duplicates)
            .field("built", &self.is_built())
            .finish()
    }
}

impl ComponentRegistry {
    /// Create an unbuilt registry over the loader's roots for `config.namespace`
    pub fn new(loader: impl SearchPaths + 'static, config: &CompilerConfig) -> Self {
        Self {
            loader: Box::new(loader),
            namespace: config.namespace.clone(),
            template_extension: config.template_extension.clone(),
            config_extension: config.config_extension.clone(),
            duplicates: config.duplicates,
            index: OnceCell::new(),
            builds: AtomicUsize::new(0),
        }
    }

    /// Create a registry that is already built from known entries
    pub fn from_entries(entries: impl IntoIterator<Item = ComponentEntry>) -> Self {
        let config = CompilerConfig::default();
        let index = entries
            .into_iter()
            .map(|entry| (entry.name.clone(), entry))
            .collect();
        Self {
            loader: Box::new(Vec::<PathBuf>::new()),
            namespace: config.namespace,
            template_extension: config.template_extension,
            config_extension: config.config_extension,
            duplicates: config.duplicates,
            index: OnceCell::with_value(index),
            builds: AtomicUsize::new(0),
        }
    }

    /// Look up a component by name, building the index on first use
    pub fn resolve(&self, name: &str) -> Result<&ComponentEntry, RegistryError> {
        self.index()?
            .get(name)
            .ok_or_else(|| RegistryError::UnknownComponent {
                name: name.to_string(),
            })
    }

    /// Check if a component exists
    pub fn contains(&self, name: &str) -> Result<bool, RegistryError> {
        Ok(self.index()?.contains_key(name))
    }

    /// All component names, sorted
    pub fn names(&self) -> Result<Vec<&str>, RegistryError> {
        let mut names: Vec<_> = self.index()?.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        Ok(names)
    }

    /// Whether the scan has completed
    pub fn is_built(&self) -> bool {
        self.index.get().is_some()
    }

    /// Number of completed filesystem scans
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// A failed build leaves the cell empty so the next call scans again
    fn index(&self) -> Result<&HashMap<String, ComponentEntry>, RegistryError> {
        self.index.get_or_try_init(|| self.build())
    }

    fn build(&self) -> Result<HashMap<String, ComponentEntry>, RegistryError> {
        let roots = self.loader.paths(&self.namespace);
        if roots.is_empty() {
            return Err(RegistryError::Misconfigured {
                namespace: self.namespace.clone(),
            });
        }

        let mut index = HashMap::new();
        for root in &roots {
            self.scan_root(root, &mut index)?;
        }

        self.builds.fetch_add(1, Ordering::SeqCst);
        info!(
            namespace = %self.namespace,
            roots = roots.len(),
            components = index.len(),
            "Built component registry"
        );
        Ok(index)
    }

    fn scan_root(
        &self,
        root: &Path,
        index: &mut HashMap<String, ComponentEntry>,
    ) -> Result<(), RegistryError> {
        let suffix = format!(".{}", self.template_extension);
        let walker = WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !is_hidden(e));

        for entry in walker {
            let entry = entry.map_err(|source| RegistryError::Walk {
                path: root.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(name) = file_name.strip_suffix(suffix.as_str()) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }

            let component = ComponentEntry {
                name: name.to_string(),
                template_id: self.template_id(root, path),
                config_id: path.with_file_name(format!("{}.config.{}", name, self.config_extension)),
            };
            debug!(name, template = %component.template_id, "Discovered component");

            match index.entry(name.to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(component);
                }
                Entry::Occupied(mut slot) => match self.duplicates {
                    DuplicatePolicy::Reject => {
                        return Err(RegistryError::Duplicate {
                            name: name.to_string(),
                            first: slot.get().template_id.clone(),
                            second: component.template_id,
                        });
                    }
                    DuplicatePolicy::LastWins => {
                        warn!(
                            name,
                            replaced = %slot.get().template_id,
                            by = %component.template_id,
                            "Duplicate component name, keeping the later template"
                        );
                        slot.insert(component);
                    }
                },
            }
        }
        Ok(())
    }

    /// `@<namespace>/<path relative to root>` with forward slashes
    fn template_id(&self, root: &Path, path: &Path) -> String {
        let relative = path.strip_prefix(root).unwrap_or(path);
        let segments: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect();
        format!("@{}/{}", self.namespace, segments.join("/"))
    }
}

/// Skip dotfiles and dot-directories below the root
fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}
