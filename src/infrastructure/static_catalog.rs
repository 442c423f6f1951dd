// In-process entity catalog backed by a YAML inventory file
use crate::application::catalog::{CatalogError, EntityCatalog, EntityRecord};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

/// An `EntityCatalog` over a static inventory loaded at startup: a mapping
/// of entity type to records of string attributes. Useful for the CLI and
/// anywhere a live inventory backend is not wired in.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    entities: HashMap<String, Vec<EntityRecord>>,
}

impl StaticCatalog {
    pub fn new(entities: HashMap<String, Vec<HashMap<String, String>>>) -> Self {
        let entities = entities
            .into_iter()
            .map(|(entity_type, records)| {
                (
                    entity_type,
                    records.into_iter().map(EntityRecord::new).collect(),
                )
            })
            .collect();
        Self { entities }
    }

    /// Load `config/inventory` (entity type -> list of attribute maps).
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("config/inventory"))
            .build()?;
        Ok(Self::new(settings.try_deserialize()?))
    }
}

#[async_trait]
impl EntityCatalog for StaticCatalog {
    async fn find(
        &self,
        entity_type: &str,
        filter: &BTreeMap<String, String>,
    ) -> Result<Vec<EntityRecord>, CatalogError> {
        let records = self
            .entities
            .get(entity_type)
            .ok_or_else(|| CatalogError::UnknownEntityType(entity_type.to_string()))?;

        // A filter field no record of this type carries is a definition
        // error, not an empty result.
        for field in filter.keys() {
            if !records.iter().any(|record| record.attrs.contains_key(field)) {
                return Err(CatalogError::UnknownField {
                    entity_type: entity_type.to_string(),
                    field: field.clone(),
                });
            }
        }

        Ok(records
            .iter()
            .filter(|record| {
                filter
                    .iter()
                    .all(|(field, value)| record.get(field) == Some(value.as_str()))
            })
            .cloned()
            .collect())
    }
}
