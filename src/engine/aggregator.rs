use crate::config::DecayConfig;
use crate::engine::model::RatingTable;
use crate::error::EngineError;
use crate::models::{
    BookedProduct, BookingStatus, InteractionEvent, InteractionKind, RatingEntry,
};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

const MAX_SCORE: f64 = 5.0;
const REVIEW_DEFAULT_RATING: f64 = 3.0;

/// Multiplicative age penalty: `1 / (1 + rate * days)`, never below the
/// configured floor. Whole elapsed days, so anything younger than 24h
/// decays by exactly 1.0.
pub fn decay_factor(occurred_at: DateTime<Utc>, now: DateTime<Utc>, config: &DecayConfig) -> f64 {
    let days = now.signed_duration_since(occurred_at).num_days().max(0) as f64;
    (1.0 / (1.0 + config.rate * days)).max(config.min_factor)
}

/// Behavioral score of a single event before decay, capped at 5.0.
/// Returns `None` for events that carry no rating signal (bookings that
/// were cancelled, or for a flight or tour rather than a lodging).
pub fn base_score(event: &InteractionEvent) -> Option<f64> {
    let attrs = &event.attributes;
    let score = match event.kind {
        InteractionKind::View => {
            let mut score = 2.0;
            let duration = attrs.view_duration_seconds.unwrap_or(0);
            if duration > 180 {
                score += 1.0;
            } else if duration > 60 {
                score += 0.5;
            }
            if attrs.clicked_booking {
                score += 1.0;
            }
            if attrs.clicked_favorite {
                score += 1.0;
            }
            score
        }
        InteractionKind::Favorite => 4.0,
        InteractionKind::Booking => {
            let confirmed = matches!(
                attrs.booking_status,
                Some(BookingStatus::Confirmed) | Some(BookingStatus::Completed)
            );
            let lodging = matches!(attrs.product, Some(BookedProduct::Lodging));
            if !(confirmed && lodging) {
                return None;
            }
            5.0
        }
        InteractionKind::Review => attrs.rating.unwrap_or(REVIEW_DEFAULT_RATING),
    };
    Some(score.min(MAX_SCORE))
}

/// Capped base score with time decay applied.
pub fn decayed_score(
    event: &InteractionEvent,
    now: DateTime<Utc>,
    config: &DecayConfig,
) -> Option<f64> {
    base_score(event).map(|score| score * decay_factor(event.occurred_at, now, config))
}

/// Collapse raw events into at most one rating per `(user, item)` pair,
/// keeping the maximum decayed score across all contributing events
/// regardless of kind. Events without usable ids are dropped; an input
/// that yields no ratings at all is an explicit no-data outcome.
pub fn aggregate(
    events: &[InteractionEvent],
    now: DateTime<Utc>,
    config: &DecayConfig,
) -> Result<RatingTable, EngineError> {
    let mut best: HashMap<(i64, i64), f64> = HashMap::new();
    let mut dropped = 0usize;

    for event in events {
        if event.user_id <= 0 || event.item_id <= 0 {
            dropped += 1;
            continue;
        }
        let Some(score) = decayed_score(event, now, config) else {
            continue;
        };
        let slot = best.entry((event.user_id, event.item_id)).or_insert(score);
        if score > *slot {
            *slot = score;
        }
    }

    if dropped > 0 {
        debug!(dropped, "skipped events without usable ids");
    }

    if best.is_empty() {
        return Err(EngineError::NoData);
    }

    let entries = best
        .into_iter()
        .map(|((user_id, item_id), score)| RatingEntry {
            user_id,
            item_id,
            score,
        })
        .collect();

    Ok(RatingTable::from_entries(entries))
}
