use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single behavioral signal tying a user to a hotel.
///
/// Events are immutable once recorded; the external booking platform is the
/// source of truth and this engine only consumes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionEvent {
    pub user_id: i64,
    pub item_id: i64,
    pub kind: InteractionKind,
    pub occurred_at: DateTime<Utc>,
    #[serde(default)]
    pub attributes: EventAttributes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    View,
    Favorite,
    Booking,
    Review,
}

/// Kind-specific payload fields. Absent fields take their defaults, so a
/// bare favorite event deserializes without an attributes object at all.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventAttributes {
    pub view_duration_seconds: Option<u32>,
    pub clicked_booking: bool,
    pub clicked_favorite: bool,
    pub rating: Option<f64>,
    pub booking_status: Option<BookingStatus>,
    pub product: Option<BookedProduct>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Completed,
    Cancelled,
}

/// What a booking was for. Only lodging bookings rate a hotel; the booking
/// table on the platform also records flights and tours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookedProduct {
    Lodging,
    Flight,
    Tour,
}

/// Raw ingress shape for `POST /events`: everything optional so validation
/// can name exactly which fields are missing or unrecognized.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventPayload {
    pub user_id: Option<i64>,
    pub item_id: Option<i64>,
    pub kind: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub attributes: EventAttributes,
}

/// One aggregated `(user, item)` rating in `[0, 5]`. At most one entry per
/// pair; when several events rate the same pair the maximum decayed score
/// wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatingEntry {
    pub user_id: i64,
    pub item_id: i64,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item_id: i64,
    pub score: f64,
}

/// Per-request fusion record; never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HybridScoreRecord {
    pub item_id: i64,
    pub hybrid_score: f64,
    pub content_score: f64,
    pub collab_score: f64,
}

/// Catalog facts used for diversity tagging and popularity scoring,
/// supplied by the external catalog service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemMetadata {
    pub item_id: i64,
    pub location: Option<String>,
    pub kind: Option<String>,
    pub average_rating: Option<f64>,
    pub review_count: u32,
    pub price_from: Option<f64>,
}

impl ItemMetadata {
    pub fn new(item_id: i64) -> Self {
        Self {
            item_id,
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = Some(kind.to_string());
        self
    }

    pub fn with_rating(mut self, average_rating: f64, review_count: u32) -> Self {
        self.average_rating = Some(average_rating);
        self.review_count = review_count;
        self
    }
}

/// Per-item interaction counters feeding the popularity fallback.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ItemStats {
    pub views: u32,
    pub favorites: u32,
    pub bookings: u32,
}

/// Which path produced a recommendation list, with the fields that path
/// actually computes. Keeps user-based, item-based, hybrid, and fallback
/// responses structurally distinct instead of overloading one shape.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Recommendations {
    UserBased { items: Vec<ScoredItem> },
    ItemBased { items: Vec<ScoredItem> },
    Hybrid { items: Vec<HybridScoreRecord> },
    PopularityFallback { items: Vec<ScoredItem> },
}

impl Recommendations {
    pub fn len(&self) -> usize {
        match self {
            Recommendations::UserBased { items } => items.len(),
            Recommendations::ItemBased { items } => items.len(),
            Recommendations::Hybrid { items } => items.len(),
            Recommendations::PopularityFallback { items } => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of a full rebuild, reported per sub-model. A failed sub-model
/// leaves its previously cached predecessor untouched.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RetrainReport {
    pub collaborative: bool,
    pub content: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub collaborative_trained: bool,
    pub content_trained: bool,
    pub users: usize,
    pub items: usize,
    pub interactions: usize,
    pub patches_since_train: usize,
    pub stale: bool,
    pub trained_at: Option<DateTime<Utc>>,
}

/// Offline ranking-quality estimate. `biased` is true when the evaluated
/// model was trained on data that includes the test split, in which case
/// the numbers measure memorization rather than generalization.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub k: usize,
    pub precision_at_k: f64,
    pub recall_at_k: f64,
    pub users_evaluated: usize,
    pub biased: bool,
}

impl InteractionEvent {
    pub fn new(user_id: i64, item_id: i64, kind: InteractionKind) -> Self {
        Self {
            user_id,
            item_id,
            kind,
            occurred_at: Utc::now(),
            attributes: EventAttributes::default(),
        }
    }

    pub fn at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = occurred_at;
        self
    }

    pub fn with_view_duration(mut self, seconds: u32) -> Self {
        self.attributes.view_duration_seconds = Some(seconds);
        self
    }

    pub fn with_clicked_booking(mut self) -> Self {
        self.attributes.clicked_booking = true;
        self
    }

    pub fn with_clicked_favorite(mut self) -> Self {
        self.attributes.clicked_favorite = true;
        self
    }

    pub fn with_rating(mut self, rating: f64) -> Self {
        self.attributes.rating = Some(rating);
        self
    }

    pub fn with_booking(mut self, status: BookingStatus, product: BookedProduct) -> Self {
        self.attributes.booking_status = Some(status);
        self.attributes.product = Some(product);
        self
    }
}
