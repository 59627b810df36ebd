//! Component lookup and variant context resolution
//!
//! Components are templates found under the search roots of one loader
//! namespace. Each may have a sibling config document describing a base
//! context and named variants.

mod loader;
mod reference;
mod registry;
mod resolver;

pub use loader::{FilesystemLoader, SearchPaths};
pub use reference::{ComponentReference, VARIANT_SEPARATOR};
pub use registry::{ComponentEntry, ComponentRegistry, RegistryError};
pub use resolver::{
    load_context, ConfigError, ConfigFormat, DecodeError, ResolvedContext, VariantConfig,
    VariantResolver, VariantSpec,
};
