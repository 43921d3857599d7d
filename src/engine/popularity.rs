use crate::engine::model::CollaborativeModel;
use crate::models::{ItemMetadata, ItemStats, ScoredItem};
use std::collections::{HashMap, HashSet};

const COLLAB_WEIGHT: f64 = 3.0;
const BOOKING_WEIGHT: f64 = 5.0;
const VIEW_WEIGHT: f64 = 1.0;
const FAVORITE_WEIGHT: f64 = 3.0;
const RATING_WEIGHT: f64 = 2.0;
const REVIEW_WEIGHT: f64 = 1.5;
const REVIEW_COUNT_CAP: u32 = 100;

/// Non-personalized ranking served to cold users: a weighted sum of six
/// signals, each normalized to [0, 1] against its own maximum across the
/// catalog so no single scale dominates. Works with or without a trained
/// collaborative model (the matrix column-sum signal just drops out).
pub fn fallback_ranking(
    model: Option<&CollaborativeModel>,
    stats: &HashMap<i64, ItemStats>,
    metadata: &HashMap<i64, ItemMetadata>,
    limit: usize,
) -> Vec<ScoredItem> {
    let mut collab_mass: HashMap<i64, f64> = HashMap::new();
    if let Some(model) = model {
        let sums = model.ratings().column_sums();
        for (index, sum) in sums.into_iter().enumerate() {
            collab_mass.insert(model.items().id_at(index), sum);
        }
    }

    let max_collab = max_of(collab_mass.values().copied());
    let max_bookings = max_of(stats.values().map(|s| s.bookings as f64));
    let max_views = max_of(stats.values().map(|s| s.views as f64));
    let max_favorites = max_of(stats.values().map(|s| s.favorites as f64));

    let candidates: HashSet<i64> = metadata
        .keys()
        .chain(stats.keys())
        .chain(collab_mass.keys())
        .copied()
        .collect();

    let mut ranked: Vec<ScoredItem> = candidates
        .into_iter()
        .map(|item_id| {
            let item_stats = stats.get(&item_id).copied().unwrap_or_default();
            let meta = metadata.get(&item_id);

            let collab = collab_mass.get(&item_id).copied().unwrap_or(0.0) / max_collab;
            let bookings = item_stats.bookings as f64 / max_bookings;
            let views = item_stats.views as f64 / max_views;
            let favorites = item_stats.favorites as f64 / max_favorites;
            let rating = meta
                .and_then(|m| m.average_rating)
                .map(|r| r / 5.0)
                .unwrap_or(0.0);
            let reviews =
                meta.map(|m| m.review_count.min(REVIEW_COUNT_CAP) as f64 / REVIEW_COUNT_CAP as f64)
                    .unwrap_or(0.0);

            let score = collab * COLLAB_WEIGHT
                + bookings * BOOKING_WEIGHT
                + views * VIEW_WEIGHT
                + favorites * FAVORITE_WEIGHT
                + rating * RATING_WEIGHT
                + reviews * REVIEW_WEIGHT;

            ScoredItem { item_id, score }
        })
        .collect();

    crate::utils::sort_scored_desc(&mut ranked);
    ranked.truncate(limit);
    ranked
}

fn max_of(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0f64, f64::max);
    if max > 0.0 {
        max
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(views: u32, favorites: u32, bookings: u32) -> ItemStats {
        ItemStats {
            views,
            favorites,
            bookings,
        }
    }

    #[test]
    fn heavily_booked_items_outrank_heavily_viewed_ones() {
        let stats_by_item: HashMap<i64, ItemStats> =
            [(1, stats(100, 0, 0)), (2, stats(0, 0, 10))].into();
        let ranked = fallback_ranking(None, &stats_by_item, &HashMap::new(), 10);

        assert_eq!(ranked[0].item_id, 2);
        // both signals are at their own max: 5.0 vs 1.0
        assert!((ranked[0].score - 5.0).abs() < 1e-9);
        assert!((ranked[1].score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn catalog_rating_and_reviews_contribute_without_interactions() {
        let metadata: HashMap<i64, ItemMetadata> = [
            (1, ItemMetadata::new(1).with_rating(5.0, 200)),
            (2, ItemMetadata::new(2).with_rating(2.5, 50)),
        ]
        .into();
        let ranked = fallback_ranking(None, &HashMap::new(), &metadata, 10);

        assert_eq!(ranked[0].item_id, 1);
        // rating 5.0/5 * 2.0 plus capped reviews 100/100 * 1.5
        assert!((ranked[0].score - 3.5).abs() < 1e-9);
        assert!((ranked[1].score - (0.5 * 2.0 + 0.5 * 1.5)).abs() < 1e-9);
    }

    #[test]
    fn empty_inputs_produce_an_empty_ranking() {
        assert!(fallback_ranking(None, &HashMap::new(), &HashMap::new(), 10).is_empty());
    }

    #[test]
    fn ties_resolve_by_item_id() {
        let metadata: HashMap<i64, ItemMetadata> = [
            (9, ItemMetadata::new(9).with_rating(4.0, 10)),
            (3, ItemMetadata::new(3).with_rating(4.0, 10)),
        ]
        .into();
        let ranked = fallback_ranking(None, &HashMap::new(), &metadata, 10);
        assert_eq!(ranked[0].item_id, 3);
        assert_eq!(ranked[1].item_id, 9);
    }

    #[test]
    fn limit_is_honored() {
        let stats_by_item: HashMap<i64, ItemStats> =
            (1..=20).map(|i| (i, stats(i as u32, 0, 0))).collect();
        let ranked = fallback_ranking(None, &stats_by_item, &HashMap::new(), 5);
        assert_eq!(ranked.len(), 5);
        assert_eq!(ranked[0].item_id, 20);
    }
}
