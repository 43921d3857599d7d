use crate::config::DiversityConfig;
use crate::models::{HybridScoreRecord, ItemMetadata};
use std::collections::HashMap;

const UNKNOWN_CATEGORY: &str = "Unknown";

/// Single greedy pass over a score-sorted candidate list, admitting an
/// item only while its location and hotel-type counts are under their
/// caps. Rejected candidates are skipped for good, never revisited, so the
/// result may be shorter than `limit` when the pool lacks variety. Items
/// without catalog metadata count against a shared "Unknown" bucket.
pub fn rerank(
    candidates: &[HybridScoreRecord],
    metadata: &HashMap<i64, ItemMetadata>,
    config: &DiversityConfig,
    limit: usize,
) -> Vec<HybridScoreRecord> {
    let mut location_counts: HashMap<&str, usize> = HashMap::new();
    let mut type_counts: HashMap<&str, usize> = HashMap::new();
    let mut selected = Vec::with_capacity(limit.min(candidates.len()));

    for candidate in candidates {
        if selected.len() >= limit {
            break;
        }

        let meta = metadata.get(&candidate.item_id);
        let location = meta
            .and_then(|m| m.location.as_deref())
            .unwrap_or(UNKNOWN_CATEGORY);
        let kind = meta
            .and_then(|m| m.kind.as_deref())
            .unwrap_or(UNKNOWN_CATEGORY);

        let location_count = location_counts.get(location).copied().unwrap_or(0);
        let type_count = type_counts.get(kind).copied().unwrap_or(0);
        if location_count >= config.max_per_location || type_count >= config.max_per_type {
            continue;
        }

        *location_counts.entry(location).or_insert(0) += 1;
        *type_counts.entry(kind).or_insert(0) += 1;
        selected.push(*candidate);
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(item_id: i64, score: f64) -> HybridScoreRecord {
        HybridScoreRecord {
            item_id,
            hybrid_score: score,
            content_score: 0.0,
            collab_score: 0.0,
        }
    }

    fn meta(item_id: i64, location: &str, kind: &str) -> (i64, ItemMetadata) {
        (
            item_id,
            ItemMetadata::new(item_id)
                .with_location(location)
                .with_kind(kind),
        )
    }

    #[test]
    fn caps_repetition_per_location() {
        let candidates: Vec<_> = (1..=6).map(|i| record(i, 1.0 - i as f64 * 0.1)).collect();
        let metadata: HashMap<_, _> = (1..=6).map(|i| meta(i, "Hanoi", "HOTEL")).collect();
        let config = DiversityConfig {
            max_per_location: 3,
            max_per_type: 10,
        };

        let result = rerank(&candidates, &metadata, &config, 6);
        assert_eq!(result.len(), 3);
        // greedy keeps the best-scored prefix
        assert_eq!(
            result.iter().map(|r| r.item_id).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn caps_repetition_per_type_across_locations() {
        let candidates: Vec<_> = (1..=6).map(|i| record(i, 1.0 - i as f64 * 0.1)).collect();
        let metadata: HashMap<_, _> = (1..=6)
            .map(|i| meta(i, ["Hanoi", "Hue", "Hoi An"][(i % 3) as usize], "RESORT"))
            .collect();
        let config = DiversityConfig {
            max_per_location: 10,
            max_per_type: 4,
        };

        let result = rerank(&candidates, &metadata, &config, 6);
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn skipped_candidates_are_not_deferred() {
        let candidates = vec![
            record(1, 0.9),
            record(2, 0.8),
            record(3, 0.7), // blocked by location cap
            record(4, 0.6),
        ];
        let mut metadata = HashMap::new();
        metadata.extend([meta(1, "Hanoi", "HOTEL"), meta(2, "Hanoi", "VILLA")]);
        metadata.extend([meta(3, "Hanoi", "HOMESTAY"), meta(4, "Hue", "HOTEL")]);
        let config = DiversityConfig {
            max_per_location: 2,
            max_per_type: 4,
        };

        let result = rerank(&candidates, &metadata, &config, 4);
        let ids: Vec<i64> = result.iter().map(|r| r.item_id).collect();
        assert_eq!(ids, vec![1, 2, 4]);
    }

    #[test]
    fn missing_metadata_shares_the_unknown_bucket() {
        let candidates: Vec<_> = (1..=5).map(|i| record(i, 1.0)).collect();
        let metadata = HashMap::new();
        let config = DiversityConfig {
            max_per_location: 3,
            max_per_type: 4,
        };

        // all five fall into Unknown/Unknown; the location cap bites first
        let result = rerank(&candidates, &metadata, &config, 5);
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn stops_at_the_requested_limit() {
        let candidates: Vec<_> = (1..=10).map(|i| record(i, 1.0)).collect();
        let metadata: HashMap<_, _> = (1..=10)
            .map(|i| meta(i, &format!("loc-{i}"), &format!("type-{i}")))
            .collect();
        let result = rerank(&candidates, &metadata, &DiversityConfig::default(), 4);
        assert_eq!(result.len(), 4);
    }
}
