use crate::error::EngineError;
use crate::models::{EventPayload, InteractionEvent, InteractionKind};
use chrono::Utc;

/// Turn a raw ingress payload into a validated event, or reject it naming
/// every missing or unrecognized field at once.
pub fn validate_event(payload: EventPayload) -> Result<InteractionEvent, EngineError> {
    let mut fields = Vec::new();

    if payload.user_id.map_or(true, |id| id <= 0) {
        fields.push("user_id");
    }
    if payload.item_id.map_or(true, |id| id <= 0) {
        fields.push("item_id");
    }

    let kind = match payload.kind.as_deref() {
        Some("view") => Some(InteractionKind::View),
        Some("favorite") => Some(InteractionKind::Favorite),
        Some("booking") => Some(InteractionKind::Booking),
        Some("review") => Some(InteractionKind::Review),
        _ => {
            fields.push("kind");
            None
        }
    };

    if let Some(rating) = payload.attributes.rating {
        if !rating.is_finite() || !(0.0..=5.0).contains(&rating) {
            fields.push("attributes.rating");
        }
    }

    if !fields.is_empty() {
        return Err(EngineError::InvalidEvent { fields });
    }

    Ok(InteractionEvent {
        user_id: payload.user_id.unwrap(),
        item_id: payload.item_id.unwrap(),
        kind: kind.unwrap(),
        occurred_at: payload.occurred_at.unwrap_or_else(Utc::now),
        attributes: payload.attributes,
    })
}

/// Result-list sizes are bounded to keep a single query from walking the
/// whole catalog.
pub fn validate_limit(limit: usize) -> Result<usize, EngineError> {
    if limit == 0 || limit > 1000 {
        return Err(EngineError::InvalidQuery("limit must be in 1..=1000"));
    }
    Ok(limit)
}

pub fn validate_weight(weight: f64) -> Result<f64, EngineError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(EngineError::InvalidQuery(
            "weights must be finite and non-negative",
        ));
    }
    Ok(weight)
}
