use crate::engine::matrix::{cosine_similarity, IndexMap, SparseMatrix};
use crate::models::RatingEntry;
use chrono::{DateTime, Utc};

/// Deduplicated ratings together with the id/index maps of one model
/// generation. Both maps are always rebuilt together.
#[derive(Debug, Clone, Default)]
pub struct RatingTable {
    entries: Vec<RatingEntry>,
    users: IndexMap,
    items: IndexMap,
}

impl RatingTable {
    pub fn from_entries(mut entries: Vec<RatingEntry>) -> Self {
        let users = IndexMap::from_ids(entries.iter().map(|e| e.user_id).collect());
        let items = IndexMap::from_ids(entries.iter().map(|e| e.item_id).collect());
        entries.sort_unstable_by_key(|e| (e.user_id, e.item_id));
        Self {
            entries,
            users,
            items,
        }
    }

    pub fn entries(&self) -> &[RatingEntry] {
        &self.entries
    }

    pub fn users(&self) -> &IndexMap {
        &self.users
    }

    pub fn items(&self) -> &IndexMap {
        &self.items
    }

    pub fn to_matrix(&self) -> SparseMatrix {
        let triples = self
            .entries
            .iter()
            .map(|e| {
                (
                    self.users.position(e.user_id).unwrap(),
                    self.items.position(e.item_id).unwrap(),
                    e.score,
                )
            })
            .collect();
        SparseMatrix::from_triples(self.users.len(), self.items.len(), triples)
    }
}

/// One immutable generation of the collaborative model: the rating matrix,
/// both similarity matrices, and the index maps they were built against.
/// Published behind an `Arc` and replaced wholesale on retrain; the only
/// mutation between retrains is `apply_rating`, performed on a
/// copy-on-write clone so concurrent readers keep their snapshot.
#[derive(Debug, Clone)]
pub struct CollaborativeModel {
    users: IndexMap,
    items: IndexMap,
    ratings: SparseMatrix,
    user_similarity: SparseMatrix,
    item_similarity: SparseMatrix,
    trained_at: DateTime<Utc>,
    patches: usize,
}

impl CollaborativeModel {
    /// Full build: sparse rating matrix from the table, then row-wise
    /// cosine over users and over the transpose for items. With fewer than
    /// two users or items the similarity matrices degenerate to their
    /// diagonal, which is a valid (trivial) model.
    pub fn train(table: &RatingTable) -> Self {
        let ratings = table.to_matrix();
        let user_similarity = cosine_similarity(&ratings);
        let item_similarity = cosine_similarity(&ratings.transpose());
        Self {
            users: table.users().clone(),
            items: table.items().clone(),
            ratings,
            user_similarity,
            item_similarity,
            trained_at: Utc::now(),
            patches: 0,
        }
    }

    pub fn users(&self) -> &IndexMap {
        &self.users
    }

    pub fn items(&self) -> &IndexMap {
        &self.items
    }

    pub fn ratings(&self) -> &SparseMatrix {
        &self.ratings
    }

    pub fn user_similarity(&self) -> &SparseMatrix {
        &self.user_similarity
    }

    pub fn item_similarity(&self) -> &SparseMatrix {
        &self.item_similarity
    }

    pub fn trained_at(&self) -> DateTime<Utc> {
        self.trained_at
    }

    /// Cell patches applied since the last full build. The similarity
    /// matrices do not see these, so the counter doubles as a staleness
    /// measure.
    pub fn patches(&self) -> usize {
        self.patches
    }

    /// Apply a single new rating without rebuilding: the cell is raised to
    /// `max(current, score)`. Ids unknown to this generation's index maps
    /// are a no-op; the entities will appear after the next full build.
    /// Returns whether the matrix was touched.
    pub fn apply_rating(&mut self, user_id: i64, item_id: i64, score: f64) -> bool {
        let (Some(u), Some(i)) = (self.users.position(user_id), self.items.position(item_id))
        else {
            return false;
        };
        self.ratings.set_max(u, i, score);
        self.patches += 1;
        true
    }
}
