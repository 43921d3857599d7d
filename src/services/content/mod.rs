use crate::engine::{IndexMap, SparseMatrix};
use crate::models::ScoredItem;
use anyhow::Result;
use parking_lot::RwLock;
use std::sync::Arc;

/// Item-to-item similarity built elsewhere from catalog text and
/// attributes (descriptions, amenities, location terms). Opaque here: only
/// the matrix and its id map cross the boundary.
#[derive(Debug, Clone)]
pub struct ContentModel {
    items: IndexMap,
    similarity: SparseMatrix,
}

impl ContentModel {
    /// `triples` are (row, col, similarity) in the index space of `items`
    /// after ascending-id assignment.
    pub fn new(item_ids: Vec<i64>, triples: Vec<(usize, usize, f64)>) -> Self {
        let items = IndexMap::from_ids(item_ids);
        let n = items.len();
        Self {
            items,
            similarity: SparseMatrix::from_triples(n, n, triples),
        }
    }

    pub fn items(&self) -> &IndexMap {
        &self.items
    }

    pub fn contains(&self, item_id: i64) -> bool {
        self.items.position(item_id).is_some()
    }

    /// Content neighbors of a seed, best first, diagonal excluded.
    pub fn similar_to(&self, item_id: i64, limit: usize) -> Vec<ScoredItem> {
        let Some(idx) = self.items.position(item_id) else {
            return Vec::new();
        };
        let (peers, sims) = self.similarity.row(idx);
        let mut scored: Vec<ScoredItem> = peers
            .iter()
            .zip(sims)
            .filter(|&(&j, &sim)| j != idx && sim > 0.0)
            .map(|(&j, &sim)| ScoredItem {
                item_id: self.items.id_at(j),
                score: sim,
            })
            .collect();
        crate::utils::sort_scored_desc(&mut scored);
        scored.truncate(limit);
        scored
    }
}

/// Source of the content model. Production wires this to the text-feature
/// pipeline; `build` returning `Ok(None)` means the pipeline has nothing
/// to offer yet, which is not an error.
#[async_trait::async_trait]
pub trait ContentProvider: Send + Sync {
    async fn build(&self) -> Result<Option<ContentModel>>;
}

/// Holds an externally supplied content model verbatim.
#[derive(Default)]
pub struct StaticContentProvider {
    model: RwLock<Option<Arc<ContentModel>>>,
}

impl StaticContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(model: ContentModel) -> Self {
        Self {
            model: RwLock::new(Some(Arc::new(model))),
        }
    }

    pub fn replace(&self, model: ContentModel) {
        *self.model.write() = Some(Arc::new(model));
    }
}

#[async_trait::async_trait]
impl ContentProvider for StaticContentProvider {
    async fn build(&self) -> Result<Option<ContentModel>> {
        Ok(self.model.read().as_ref().map(|m| m.as_ref().clone()))
    }
}
