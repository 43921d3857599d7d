use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::collections::HashMap;
use stayrec::config::{DecayConfig, DiversityConfig};
use stayrec::engine::model::RatingTable;
use stayrec::engine::{
    aggregator, cosine_similarity, diversity, hybrid, popularity, predictor, CollaborativeModel,
};
use stayrec::{HybridScoreRecord, InteractionEvent, InteractionKind, ItemMetadata, RatingEntry};

fn synthetic_events(n: usize) -> Vec<InteractionEvent> {
    (0..n)
        .map(|i| {
            let user = (i % 100 + 1) as i64;
            let item = (i % 53 + 1) as i64;
            match i % 3 {
                0 => InteractionEvent::new(user, item, InteractionKind::View)
                    .with_view_duration((i % 400) as u32),
                1 => InteractionEvent::new(user, item, InteractionKind::Favorite),
                _ => InteractionEvent::new(user, item, InteractionKind::Review)
                    .with_rating((i % 5) as f64 + 1.0),
            }
        })
        .collect()
}

fn synthetic_table(users: i64, items: i64) -> RatingTable {
    let mut entries = Vec::new();
    for user in 1..=users {
        for item in 1..=items {
            if (user * 7 + item * 3) % 5 != 0 {
                continue;
            }
            entries.push(RatingEntry {
                user_id: user,
                item_id: item,
                score: ((user + item) % 5) as f64 + 1.0,
            });
        }
    }
    RatingTable::from_entries(entries)
}

fn benchmark_aggregation(c: &mut Criterion) {
    let events = synthetic_events(10_000);
    let config = DecayConfig::default();

    c.bench_function("aggregate_10k_events", |b| {
        b.iter(|| {
            black_box(aggregator::aggregate(&events, Utc::now(), &config).unwrap());
        });
    });
}

fn benchmark_similarity_build(c: &mut Criterion) {
    let table = synthetic_table(200, 100);
    let matrix = table.to_matrix();

    c.bench_function("user_cosine_200x100", |b| {
        b.iter(|| {
            black_box(cosine_similarity(&matrix));
        });
    });

    c.bench_function("full_model_train_200x100", |b| {
        b.iter(|| {
            black_box(CollaborativeModel::train(&table));
        });
    });
}

fn benchmark_prediction(c: &mut Criterion) {
    let model = CollaborativeModel::train(&synthetic_table(200, 100));

    c.bench_function("user_based_predict", |b| {
        b.iter(|| {
            black_box(predictor::user_based(&model, 7, 20, 10));
        });
    });

    c.bench_function("item_based_neighbors", |b| {
        b.iter(|| {
            black_box(predictor::item_based(&model, 7, 10));
        });
    });
}

fn benchmark_fusion_and_rerank(c: &mut Criterion) {
    let content: HashMap<i64, f64> = (1..200).map(|i| (i, (i % 17) as f64 / 17.0)).collect();
    let collab: HashMap<i64, f64> = (100..300).map(|i| (i, (i % 23) as f64 / 23.0)).collect();

    c.bench_function("hybrid_fuse_300_candidates", |b| {
        b.iter(|| {
            black_box(hybrid::fuse(
                1,
                content.clone(),
                collab.clone(),
                0.5,
                0.5,
            ));
        });
    });

    let candidates: Vec<HybridScoreRecord> = (1..300)
        .map(|i| HybridScoreRecord {
            item_id: i,
            hybrid_score: 1.0 - (i as f64 / 300.0),
            content_score: 0.0,
            collab_score: 0.0,
        })
        .collect();
    let metadata: HashMap<i64, ItemMetadata> = (1..300)
        .map(|i| {
            (
                i,
                ItemMetadata::new(i)
                    .with_location(&format!("loc-{}", i % 12))
                    .with_kind(["HOTEL", "RESORT", "HOMESTAY", "VILLA"][(i % 4) as usize]),
            )
        })
        .collect();

    c.bench_function("diversity_rerank_300", |b| {
        b.iter(|| {
            black_box(diversity::rerank(
                &candidates,
                &metadata,
                &DiversityConfig::default(),
                10,
            ));
        });
    });

    let model = CollaborativeModel::train(&synthetic_table(200, 100));
    let stats: HashMap<i64, stayrec::ItemStats> = (1..=100)
        .map(|i| {
            (
                i,
                stayrec::ItemStats {
                    views: (i % 40) as u32,
                    favorites: (i % 11) as u32,
                    bookings: (i % 7) as u32,
                },
            )
        })
        .collect();

    c.bench_function("popularity_fallback_100_items", |b| {
        b.iter(|| {
            black_box(popularity::fallback_ranking(
                Some(&model),
                &stats,
                &metadata,
                10,
            ));
        });
    });
}

criterion_group!(
    benches,
    benchmark_aggregation,
    benchmark_similarity_build,
    benchmark_prediction,
    benchmark_fusion_and_rerank
);
criterion_main!(benches);
