//! Template search paths supplied by the host loader

use std::collections::HashMap;
use std::path::PathBuf;

/// Source of template search roots, keyed by namespace
///
/// The registry only needs the roots for its own namespace; everything else a
/// host loader does is out of reach here.
pub trait SearchPaths: Send + Sync {
    /// Root directories registered for `namespace`, in lookup order
    fn paths(&self, namespace: &str) -> Vec<PathBuf>;
}

/// Filesystem loader mapping namespaces to root directories
#[derive(Debug, Clone, Default)]
pub struct FilesystemLoader {
    paths: HashMap<String, Vec<PathBuf>>,
}

impl FilesystemLoader {
    /// Create a loader with no registered paths
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a root directory to a namespace
    pub fn add_path(&mut self, namespace: impl Into<String>, path: impl Into<PathBuf>) {
        self.paths
            .entry(namespace.into())
            .or_default()
            .push(path.into());
    }

    /// Insert a root directory ahead of the existing ones
    pub fn prepend_path(&mut self, namespace: impl Into<String>, path: impl Into<PathBuf>) {
        self.paths
            .entry(namespace.into())
            .or_default()
            .insert(0, path.into());
    }

    /// Builder form of [`FilesystemLoader::add_path`]
    pub fn with_path(mut self, namespace: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.add_path(namespace, path);
        self
    }

    /// All namespaces with at least one root
    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.paths.keys().map(|s| s.as_str())
    }
}

impl SearchPaths for FilesystemLoader {
    fn paths(&self, namespace: &str) -> Vec<PathBuf> {
        self.paths.get(namespace).cloned().unwrap_or_default()
    }
}

impl SearchPaths for Vec<PathBuf> {
    fn paths(&self, _namespace: &str) -> Vec<PathBuf> {
        self.clone()
    }
}
