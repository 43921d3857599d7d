use crate::models::ItemMetadata;
use anyhow::Result;
use dashmap::DashMap;
use std::collections::HashMap;

/// Catalog metadata collaborator. The real catalog lives in the platform's
/// relational store; this trait is its read interface for diversity
/// tagging and popularity scoring.
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    async fn item_metadata(&self) -> Result<HashMap<i64, ItemMetadata>>;
}

/// Process-local catalog, populated by whatever loads hotel facts into the
/// service (fixtures, sync jobs, tests).
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    items: DashMap<i64, ItemMetadata>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, metadata: ItemMetadata) {
        self.items.insert(metadata.item_id, metadata);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait::async_trait]
impl CatalogProvider for InMemoryCatalog {
    async fn item_metadata(&self) -> Result<HashMap<i64, ItemMetadata>> {
        Ok(self
            .items
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect())
    }
}
