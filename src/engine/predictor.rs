use crate::engine::model::CollaborativeModel;
use crate::models::ScoredItem;
use std::collections::HashMap;

/// Neighbor-weighted rating prediction for one user.
///
/// The user's similarity row is ranked (self excluded, positive entries
/// only) and the `top_k` strongest neighbors vote on every item the user
/// has not rated: `sum(sim * rating) / sum(|sim|)` over the neighbors that
/// rated the item. Items no neighbor rated are omitted rather than scored
/// zero. Already-rated items never appear. Unknown users yield an empty
/// list.
pub fn user_based(
    model: &CollaborativeModel,
    user_id: i64,
    top_k: usize,
    limit: usize,
) -> Vec<ScoredItem> {
    let Some(user_idx) = model.users().position(user_id) else {
        return Vec::new();
    };

    let (neighbor_idx, neighbor_sim) = model.user_similarity().row(user_idx);
    let mut neighbors: Vec<(usize, f64)> = neighbor_idx
        .iter()
        .zip(neighbor_sim)
        .filter(|&(&v, &sim)| v != user_idx && sim > 0.0)
        .map(|(&v, &sim)| (v, sim))
        .collect();
    neighbors.sort_unstable_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    neighbors.truncate(top_k);

    let (rated, _) = model.ratings().row(user_idx);

    // numerator and |weight| denominator per unrated item
    let mut votes: HashMap<usize, (f64, f64)> = HashMap::new();
    for (v, sim) in neighbors {
        let (items, scores) = model.ratings().row(v);
        for (&i, &rating) in items.iter().zip(scores) {
            if rated.binary_search(&i).is_ok() {
                continue;
            }
            let slot = votes.entry(i).or_insert((0.0, 0.0));
            slot.0 += sim * rating;
            slot.1 += sim.abs();
        }
    }

    let mut predictions: Vec<(usize, f64)> = votes
        .into_iter()
        .filter(|&(_, (_, denominator))| denominator > 0.0)
        .map(|(i, (numerator, denominator))| (i, numerator / denominator))
        .collect();
    predictions.sort_unstable_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    predictions.truncate(limit);

    predictions
        .into_iter()
        .map(|(i, score)| ScoredItem {
            item_id: model.items().id_at(i),
            score,
        })
        .collect()
}

/// Similar items for a seed, ranked by raw cosine similarity.
///
/// Deliberately not renormalized the way the user-based path is: this is a
/// similarity ranking, not a rating prediction. Diagonal excluded, positive
/// similarities only, ties broken by item index for determinism. Unknown
/// seeds yield an empty list.
pub fn item_based(model: &CollaborativeModel, item_id: i64, limit: usize) -> Vec<ScoredItem> {
    let Some(item_idx) = model.items().position(item_id) else {
        return Vec::new();
    };

    let (peer_idx, peer_sim) = model.item_similarity().row(item_idx);
    let mut peers: Vec<(usize, f64)> = peer_idx
        .iter()
        .zip(peer_sim)
        .filter(|&(&j, &sim)| j != item_idx && sim > 0.0)
        .map(|(&j, &sim)| (j, sim))
        .collect();
    peers.sort_unstable_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    peers.truncate(limit);

    peers
        .into_iter()
        .map(|(j, score)| ScoredItem {
            item_id: model.items().id_at(j),
            score,
        })
        .collect()
}
