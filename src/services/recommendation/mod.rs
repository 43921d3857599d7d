use crate::config::Config;
use crate::engine::model::RatingTable;
use crate::engine::{aggregator, diversity, evaluator, hybrid, popularity, predictor};
use crate::engine::CollaborativeModel;
use crate::error::EngineError;
use crate::models::{
    EvaluationReport, EventPayload, ModelStatus, Recommendations, RetrainReport,
};
use crate::services::catalog::CatalogProvider;
use crate::services::coldstart::ColdStartStore;
use crate::services::content::{ContentModel, ContentProvider};
use crate::services::events::EventStore;
use crate::utils::validation;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Serves recommendation queries from a cached model that is rebuilt
/// wholesale on retrain and patched cell-wise as events arrive.
///
/// Both sub-models live behind an `Arc` that readers clone, so a query
/// always works against one consistent generation. A rebuild constructs
/// the replacement completely before a single pointer swap publishes it; a
/// cell patch clones-on-write via `Arc::make_mut`, leaving in-flight
/// readers on the pre-patch snapshot. The two writer paths are serialized
/// by one async mutex so a patch can neither interleave with a rebuild nor
/// be lost under it.
pub struct RecommendationService {
    config: Arc<Config>,
    events: Arc<EventStore>,
    catalog: Arc<dyn CatalogProvider>,
    content_source: Arc<dyn ContentProvider>,
    cold_start: Arc<dyn ColdStartStore>,
    collaborative: RwLock<Option<Arc<CollaborativeModel>>>,
    content: RwLock<Option<Arc<ContentModel>>>,
    writer: Mutex<()>,
}

impl RecommendationService {
    pub fn new(
        config: Arc<Config>,
        events: Arc<EventStore>,
        catalog: Arc<dyn CatalogProvider>,
        content_source: Arc<dyn ContentProvider>,
        cold_start: Arc<dyn ColdStartStore>,
    ) -> Self {
        Self {
            config,
            events,
            catalog,
            content_source,
            cold_start,
            collaborative: RwLock::new(None),
            content: RwLock::new(None),
            writer: Mutex::new(()),
        }
    }

    fn collaborative_snapshot(&self) -> Option<Arc<CollaborativeModel>> {
        self.collaborative.read().clone()
    }

    fn content_snapshot(&self) -> Option<Arc<ContentModel>> {
        self.content.read().clone()
    }

    /// Rebuild both sub-models from scratch. Idempotent; each sub-model
    /// reports success independently and a failed rebuild leaves the
    /// previously published model of that kind untouched.
    pub async fn retrain(&self) -> RetrainReport {
        let _writer = self.writer.lock().await;

        let collaborative =
            match aggregator::aggregate(&self.events.snapshot(), Utc::now(), &self.config.decay) {
                Ok(table) => {
                    let model = CollaborativeModel::train(&table);
                    info!(
                        users = model.users().len(),
                        items = model.items().len(),
                        interactions = model.ratings().nnz(),
                        "collaborative model rebuilt"
                    );
                    *self.collaborative.write() = Some(Arc::new(model));
                    true
                }
                Err(error) => {
                    warn!(%error, "collaborative rebuild failed; previous model kept");
                    false
                }
            };

        let content = match self.content_source.build().await {
            Ok(Some(model)) => {
                info!(items = model.items().len(), "content model refreshed");
                *self.content.write() = Some(Arc::new(model));
                true
            }
            Ok(None) => {
                info!("content provider has no model yet");
                false
            }
            Err(error) => {
                warn!(%error, "content rebuild failed; previous model kept");
                false
            }
        };

        RetrainReport {
            collaborative,
            content,
        }
    }

    /// Validate and store a new event, patch the live rating matrix, and
    /// warm the user's cold-start flag. The similarity matrices are left
    /// as trained; only the next full rebuild refreshes them.
    pub async fn record_event(&self, payload: EventPayload) -> Result<(), EngineError> {
        let event = validation::validate_event(payload)?;
        self.events.record(event.clone());

        let Some(score) = aggregator::decayed_score(&event, Utc::now(), &self.config.decay) else {
            // no rating signal (e.g. cancelled booking): stored for the
            // record but neither patches the matrix nor warms the user
            return Ok(());
        };

        {
            let _writer = self.writer.lock().await;
            let mut slot = self.collaborative.write();
            if let Some(model_arc) = slot.as_mut() {
                let model = Arc::make_mut(model_arc);
                if model.apply_rating(event.user_id, event.item_id, score) {
                    let patches = model.patches();
                    if patches == self.config.recommendation.max_stale_patches {
                        warn!(
                            patches,
                            "similarity matrices have gone stale; schedule a retrain"
                        );
                    }
                }
            }
        }

        self.cold_start.mark_active(event.user_id).await?;
        Ok(())
    }

    /// Item-seeded query: hotels whose interaction pattern is closest to
    /// the seed's, ranked by raw cosine similarity.
    pub async fn similar_items(
        &self,
        item_id: i64,
        limit: usize,
    ) -> Result<Recommendations, EngineError> {
        let limit = validation::validate_limit(limit)?;
        let model = self.collaborative_snapshot().ok_or(EngineError::Untrained)?;
        if model.items().position(item_id).is_none() {
            return Err(EngineError::item_not_found(item_id));
        }
        Ok(Recommendations::ItemBased {
            items: predictor::item_based(&model, item_id, limit),
        })
    }

    /// User-seeded query. Cold or unknown users get the popularity
    /// fallback; everyone else gets the personalized path, which fuses
    /// content and collaborative scores around the user's strongest-rated
    /// hotel and diversity-reranks the result.
    pub async fn recommend_for_user(
        &self,
        user_id: i64,
        limit: usize,
        content_weight: f64,
        collab_weight: f64,
    ) -> Result<Recommendations, EngineError> {
        let limit = validation::validate_limit(limit)?;
        let content_weight = validation::validate_weight(content_weight)?;
        let collab_weight = validation::validate_weight(collab_weight)?;

        if self.cold_start.is_cold(user_id).await? {
            info!(user_id, "cold user, serving popularity fallback");
            return self.popularity_fallback(limit).await;
        }

        let model = self.collaborative_snapshot().ok_or(EngineError::Untrained)?;
        let Some(user_idx) = model.users().position(user_id) else {
            // warm flag but not yet in the trained generation
            info!(user_id, "user unknown to current model, serving fallback");
            return self.popularity_fallback(limit).await;
        };

        let Some(seed_item) = Self::strongest_rated_item(&model, user_idx) else {
            return self.popularity_fallback(limit).await;
        };

        // gather over a wider pool so fusion and diversity have slack
        let pool = limit * 2;
        let top_k = self.config.recommendation.top_k_neighbors;

        let Some(content_model) = self.content_snapshot() else {
            // no content signal: fusing one source would only rescale it
            return Ok(Recommendations::UserBased {
                items: predictor::user_based(&model, user_id, top_k, limit),
            });
        };

        let content_scores: HashMap<i64, f64> = content_model
            .similar_to(seed_item, pool)
            .into_iter()
            .map(|s| (s.item_id, s.score))
            .collect();

        let mut collab_scores: HashMap<i64, f64> = predictor::item_based(&model, seed_item, pool)
            .into_iter()
            .map(|s| (s.item_id, s.score))
            .collect();
        for scored in predictor::user_based(&model, user_id, top_k, pool) {
            let slot = collab_scores.entry(scored.item_id).or_insert(scored.score);
            if scored.score > *slot {
                *slot = scored.score;
            }
        }

        let mut fused = hybrid::fuse(
            seed_item,
            content_scores,
            collab_scores,
            content_weight,
            collab_weight,
        );
        fused.truncate(pool);

        let metadata = self.catalog.item_metadata().await?;
        let items = diversity::rerank(&fused, &metadata, &self.config.diversity, limit);
        Ok(Recommendations::Hybrid { items })
    }

    async fn popularity_fallback(&self, limit: usize) -> Result<Recommendations, EngineError> {
        let metadata = self.catalog.item_metadata().await?;
        let stats = self.events.item_stats();
        let model = self.collaborative_snapshot();
        Ok(Recommendations::PopularityFallback {
            items: popularity::fallback_ranking(model.as_deref(), &stats, &metadata, limit),
        })
    }

    /// Offline Precision/Recall@K over a deterministic holdout split.
    /// With `retrain_on_train` a throwaway model is trained on the train
    /// partition only (it never replaces the serving cache); otherwise the
    /// cached full-data model is measured and the report is flagged as
    /// biased.
    pub async fn evaluate(
        &self,
        k: usize,
        retrain_on_train: bool,
    ) -> Result<EvaluationReport, EngineError> {
        let k = validation::validate_limit(k)?;
        let table =
            aggregator::aggregate(&self.events.snapshot(), Utc::now(), &self.config.decay)?;
        let (train, test) = evaluator::split_train_test(
            table.entries(),
            self.config.evaluation.test_ratio,
            self.config.evaluation.seed,
        );
        let top_k = self.config.recommendation.top_k_neighbors;

        if retrain_on_train {
            let model = CollaborativeModel::train(&RatingTable::from_entries(train));
            Ok(evaluator::precision_recall_at_k(&model, &test, k, top_k, false))
        } else {
            let model = self.collaborative_snapshot().ok_or(EngineError::Untrained)?;
            Ok(evaluator::precision_recall_at_k(&model, &test, k, top_k, true))
        }
    }

    pub fn status(&self) -> ModelStatus {
        let model = self.collaborative_snapshot();
        let patches = model.as_ref().map(|m| m.patches()).unwrap_or(0);
        ModelStatus {
            collaborative_trained: model.is_some(),
            content_trained: self.content_snapshot().is_some(),
            users: model.as_ref().map(|m| m.users().len()).unwrap_or(0),
            items: model.as_ref().map(|m| m.items().len()).unwrap_or(0),
            interactions: model.as_ref().map(|m| m.ratings().nnz()).unwrap_or(0),
            patches_since_train: patches,
            stale: patches >= self.config.recommendation.max_stale_patches,
            trained_at: model.as_ref().map(|m| m.trained_at()),
        }
    }

    fn strongest_rated_item(model: &CollaborativeModel, user_idx: usize) -> Option<i64> {
        let (items, scores) = model.ratings().row(user_idx);
        let mut best: Option<(usize, f64)> = None;
        for (&i, &score) in items.iter().zip(scores) {
            match best {
                Some((_, top)) if score <= top => {}
                _ => best = Some((i, score)),
            }
        }
        best.map(|(i, _)| model.items().id_at(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{InteractionEvent, InteractionKind};
    use crate::services::catalog::InMemoryCatalog;
    use crate::services::coldstart::InMemoryColdStartStore;
    use crate::services::content::StaticContentProvider;

    fn service_with_events(events: Vec<InteractionEvent>) -> RecommendationService {
        RecommendationService::new(
            Arc::new(Config::default()),
            Arc::new(EventStore::with_events(events)),
            Arc::new(InMemoryCatalog::new()),
            Arc::new(StaticContentProvider::new()),
            Arc::new(InMemoryColdStartStore::new()),
        )
    }

    fn favorite(user_id: i64, item_id: i64) -> InteractionEvent {
        InteractionEvent::new(user_id, item_id, InteractionKind::Favorite)
    }

    #[tokio::test]
    async fn queries_before_training_report_untrained() {
        let service = service_with_events(vec![favorite(1, 1)]);
        assert!(matches!(
            service.similar_items(1, 10).await,
            Err(EngineError::Untrained)
        ));
    }

    #[tokio::test]
    async fn retrain_with_no_data_keeps_nothing_and_reports_failure() {
        let service = service_with_events(vec![]);
        let report = service.retrain().await;
        assert!(!report.collaborative);
        assert!(!report.content);
        assert!(!service.status().collaborative_trained);
    }

    #[tokio::test]
    async fn failed_rebuild_leaves_the_previous_model_serving() {
        let store = Arc::new(EventStore::with_events(vec![
            favorite(1, 1),
            favorite(1, 2),
            favorite(2, 1),
        ]));
        let service = RecommendationService::new(
            Arc::new(Config::default()),
            store.clone(),
            Arc::new(InMemoryCatalog::new()),
            Arc::new(StaticContentProvider::new()),
            Arc::new(InMemoryColdStartStore::new()),
        );
        assert!(service.retrain().await.collaborative);
        let trained_at = service.status().trained_at;

        store.clear();
        assert!(!service.retrain().await.collaborative);

        // the previous generation is still published and still answers
        assert!(service.similar_items(1, 10).await.is_ok());
        assert_eq!(service.status().trained_at, trained_at);
    }

    #[tokio::test]
    async fn unknown_seed_is_not_found_after_training() {
        let service = service_with_events(vec![favorite(1, 1), favorite(2, 1)]);
        service.retrain().await;
        assert!(matches!(
            service.similar_items(999, 10).await,
            Err(EngineError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn incremental_patch_applies_only_to_known_pairs() {
        let service = service_with_events(vec![favorite(1, 1), favorite(1, 2), favorite(2, 1)]);
        service.retrain().await;

        // both ids are in the current index maps, so the cell is written
        let payload = EventPayload {
            user_id: Some(2),
            item_id: Some(2),
            kind: Some("favorite".to_string()),
            ..Default::default()
        };
        service.record_event(payload).await.unwrap();
        assert_eq!(service.status().patches_since_train, 1);

        // unknown item: stored but no patch
        let payload = EventPayload {
            user_id: Some(2),
            item_id: Some(777),
            kind: Some("favorite".to_string()),
            ..Default::default()
        };
        service.record_event(payload).await.unwrap();
        assert_eq!(service.status().patches_since_train, 1);
    }

    #[tokio::test]
    async fn first_qualifying_event_warms_the_user() {
        let service = service_with_events(vec![]);
        assert!(service.cold_start.is_cold(9).await.unwrap());

        let payload = EventPayload {
            user_id: Some(9),
            item_id: Some(1),
            kind: Some("view".to_string()),
            ..Default::default()
        };
        service.record_event(payload).await.unwrap();
        assert!(!service.cold_start.is_cold(9).await.unwrap());
    }

    #[tokio::test]
    async fn cold_users_receive_the_popularity_fallback() {
        let service = service_with_events(vec![favorite(1, 1), favorite(2, 1), favorite(2, 2)]);
        service.retrain().await;

        let recs = service.recommend_for_user(42, 10, 0.5, 0.5).await.unwrap();
        assert!(matches!(recs, Recommendations::PopularityFallback { .. }));
    }

    #[tokio::test]
    async fn warm_user_without_content_model_gets_user_based_path() {
        let service = service_with_events(vec![
            favorite(1, 1),
            favorite(1, 2),
            favorite(2, 1),
            favorite(2, 3),
        ]);
        service.retrain().await;
        service.cold_start.mark_active(1).await.unwrap();

        let recs = service.recommend_for_user(1, 10, 0.5, 0.5).await.unwrap();
        match recs {
            Recommendations::UserBased { items } => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].item_id, 3);
            }
            other => panic!("expected user-based path, got {other:?}"),
        }
    }
}
