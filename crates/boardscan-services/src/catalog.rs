//! Component information lookup.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// A specification entry: a single value or a list of alternatives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpecValue {
    Text(String),
    List(Vec<String>),
}

/// Reference information about one component type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    #[serde(default)]
    pub symbol: Option<String>,
    pub definition: String,
    pub application: String,
    pub why_used: String,
    #[serde(default)]
    pub specifications: Option<BTreeMap<String, SpecValue>>,
    #[serde(default)]
    pub common_values: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<String>,
}

/// Key lookup by canonical component name, case-insensitive.
pub trait ComponentCatalog {
    fn lookup(&self, name: &str) -> Result<Option<ComponentRecord>, CatalogError>;

    /// All records ordered by name.
    fn list(&self) -> Result<Vec<ComponentRecord>, CatalogError>;
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryCatalog {
    records: BTreeMap<String, ComponentRecord>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later records replace earlier ones with the same (case-folded) name.
    pub fn from_records(records: impl IntoIterator<Item = ComponentRecord>) -> Self {
        let mut catalog = Self::new();
        for r in records {
            catalog.insert(r);
        }
        catalog
    }

    /// Parse a JSON array of records.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let records: Vec<ComponentRecord> = serde_json::from_str(json)?;
        Ok(Self::from_records(records))
    }

    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&raw)?;
        log::debug!("loaded {} component record(s) from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn insert(&mut self, record: ComponentRecord) -> Option<ComponentRecord> {
        self.records.insert(record.name.to_lowercase(), record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ComponentCatalog for InMemoryCatalog {
    fn lookup(&self, name: &str) -> Result<Option<ComponentRecord>, CatalogError> {
        Ok(self.records.get(&name.trim().to_lowercase()).cloned())
    }

    fn list(&self) -> Result<Vec<ComponentRecord>, CatalogError> {
        let mut all: Vec<_> = self.records.values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }
}
