pub mod metrics;
pub mod validation;

use crate::models::ScoredItem;

/// Sort scored items descending, breaking score ties by item id ascending
/// so equal-scored results always come back in the same order.
pub fn sort_scored_desc(items: &mut [ScoredItem]) {
    items.sort_unstable_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.item_id.cmp(&b.item_id))
    });
}
