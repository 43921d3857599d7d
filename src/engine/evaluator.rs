use crate::engine::model::CollaborativeModel;
use crate::engine::predictor;
use crate::models::{EvaluationReport, RatingEntry};
use crate::utils::metrics::MetricsCalculator;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use tracing::info;

/// Ratings at or above this count as "liked" ground truth.
const LIKED_THRESHOLD: f64 = 3.5;

/// Deterministically shuffle the rating table with a fixed seed and split
/// it into train/test partitions. The same seed and input always produce
/// the same split.
pub fn split_train_test(
    entries: &[RatingEntry],
    test_ratio: f64,
    seed: u64,
) -> (Vec<RatingEntry>, Vec<RatingEntry>) {
    let mut shuffled = entries.to_vec();
    let mut rng = StdRng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);

    let split = (shuffled.len() as f64 * (1.0 - test_ratio)) as usize;
    let test = shuffled.split_off(split);
    (shuffled, test)
}

/// Precision@K / Recall@K of `model` against a held-out test split.
///
/// For every test user with at least one liked item (score >= 3.5), the
/// model's top-K user-based recommendations are compared against the liked
/// set; both metrics are arithmetic means over those users only. Users
/// with no liked test item are excluded entirely, not averaged in as
/// zeros.
///
/// Callers that evaluate the production model trained on the *full* table
/// are measuring memorization, since the test interactions were visible at
/// training time. Train a throwaway model on the train split alone for an
/// unbiased estimate, and say which one was done via `biased`.
pub fn precision_recall_at_k(
    model: &CollaborativeModel,
    test: &[RatingEntry],
    k: usize,
    top_k_neighbors: usize,
    biased: bool,
) -> EvaluationReport {
    let mut liked_by_user: HashMap<i64, Vec<i64>> = HashMap::new();
    for entry in test {
        if entry.score >= LIKED_THRESHOLD {
            liked_by_user.entry(entry.user_id).or_default().push(entry.item_id);
        }
    }

    let calculator = MetricsCalculator::new(k);
    let mut precision_sum = 0.0;
    let mut recall_sum = 0.0;
    let mut evaluated = 0usize;

    for (user_id, liked) in &liked_by_user {
        let recommended: Vec<i64> = predictor::user_based(model, *user_id, top_k_neighbors, k)
            .into_iter()
            .map(|r| r.item_id)
            .collect();

        precision_sum += calculator.precision_at_k(&recommended, liked);
        recall_sum += calculator.recall_at_k(&recommended, liked);
        evaluated += 1;
    }

    info!(users = evaluated, k, "evaluated ranking quality");

    EvaluationReport {
        k,
        precision_at_k: if evaluated > 0 {
            precision_sum / evaluated as f64
        } else {
            0.0
        },
        recall_at_k: if evaluated > 0 {
            recall_sum / evaluated as f64
        } else {
            0.0
        },
        users_evaluated: evaluated,
        biased,
    }
}
