// Inventory lookup capability used by query-backed variables
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

/// One inventory record, reduced to its string attribute set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    pub attrs: HashMap<String, String>,
}

impl EntityRecord {
    pub fn new(attrs: HashMap<String, String>) -> Self {
        Self { attrs }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.attrs.get(field).map(String::as_str)
    }

    /// Menu display label: the record's `name` attribute when present,
    /// otherwise the value of the given fallback field.
    pub fn display_name(&self, fallback_field: &str) -> String {
        self.get("name")
            .or_else(|| self.get(fallback_field))
            .unwrap_or_default()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    #[error("unknown entity type {0}")]
    UnknownEntityType(String),
    #[error("entity type {entity_type} has no field {field}")]
    UnknownField { entity_type: String, field: String },
}

/// Abstracted inventory lookup. Concrete catalogs (in-process store, remote
/// API, database) implement this without the resolver knowing their
/// representation.
#[async_trait]
pub trait EntityCatalog: Send + Sync {
    /// Return the records of `entity_type` matching `filter` (field equality
    /// on every pair). An empty filter returns all records of the type.
    async fn find(
        &self,
        entity_type: &str,
        filter: &BTreeMap<String, String>,
    ) -> Result<Vec<EntityRecord>, CatalogError>;
}
