use crate::models::HybridScoreRecord;
use std::collections::{HashMap, HashSet};

/// Min-max scale a score set to [0, 1] in place. An empty set stays empty;
/// a zero-variance set falls back to a unit range, which maps every entry
/// to 0 instead of dividing by zero.
pub fn min_max_normalize(scores: &mut HashMap<i64, f64>) {
    if scores.is_empty() {
        return;
    }
    let max = scores.values().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = scores.values().copied().fold(f64::INFINITY, f64::min);
    let range = if max > min { max - min } else { 1.0 };
    for value in scores.values_mut() {
        *value = (*value - min) / range;
    }
}

/// Blend a content-similarity score set and a collaborative score set into
/// one ranking: both sets are independently min-max normalized, candidates
/// missing from a source default to 0 for it, and the final score is
/// `content_weight * content + collab_weight * collab` (weights need not
/// sum to 1). The seed item is always excluded. Sorted by hybrid score
/// descending, ties by item id ascending.
pub fn fuse(
    seed_item: i64,
    mut content: HashMap<i64, f64>,
    mut collab: HashMap<i64, f64>,
    content_weight: f64,
    collab_weight: f64,
) -> Vec<HybridScoreRecord> {
    min_max_normalize(&mut content);
    min_max_normalize(&mut collab);

    let candidates: HashSet<i64> = content
        .keys()
        .chain(collab.keys())
        .copied()
        .filter(|&id| id != seed_item)
        .collect();

    let mut records: Vec<HybridScoreRecord> = candidates
        .into_iter()
        .map(|item_id| {
            let content_score = content.get(&item_id).copied().unwrap_or(0.0);
            let collab_score = collab.get(&item_id).copied().unwrap_or(0.0);
            HybridScoreRecord {
                item_id,
                hybrid_score: content_weight * content_score + collab_weight * collab_score,
                content_score,
                collab_score,
            }
        })
        .collect();

    records.sort_unstable_by(|a, b| {
        b.hybrid_score
            .partial_cmp(&a.hybrid_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.item_id.cmp(&b.item_id))
    });
    records
}
