//! Shape catalogs translate logical node types into catalog keys.

use std::collections::HashMap;

use limn_core::{metadata, template::ShapeDescriptor};

/// Looks up shape descriptors by key.
pub trait ShapeCatalog {
    /// Returns the descriptor for `shape_key`, or `None` when the catalog has
    /// no entry for it.
    fn resolve(&self, shape_key: &str) -> Option<ShapeDescriptor>;
}

/// In-memory catalog with case-insensitive keys.
///
/// # Examples
///
/// ```
/// use limn::catalog::{MapCatalog, ShapeCatalog};
/// use limn_core::template::ShapeDescriptor;
///
/// let catalog = MapCatalog::new().with_entry("Service", ShapeDescriptor::new("process"));
/// assert_eq!(catalog.resolve("service").unwrap().key(), "process");
/// assert!(catalog.resolve("queue").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct MapCatalog {
    entries: HashMap<String, ShapeDescriptor>,
}

impl MapCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces the descriptor of `shape_key`.
    pub fn with_entry(mut self, shape_key: &str, descriptor: ShapeDescriptor) -> Self {
        self.insert(shape_key, descriptor);
        self
    }

    pub fn insert(&mut self, shape_key: &str, descriptor: ShapeDescriptor) -> Option<ShapeDescriptor> {
        self.entries.insert(metadata::fold(shape_key), descriptor)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ShapeCatalog for MapCatalog {
    fn resolve(&self, shape_key: &str) -> Option<ShapeDescriptor> {
        self.entries.get(&metadata::fold(shape_key)).cloned()
    }
}
