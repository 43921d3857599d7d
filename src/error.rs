use thiserror::Error;

/// Failure taxonomy for the recommendation engine.
///
/// Query-time misses are explicit variants rather than panics or empty
/// sentinels: an unknown seed is distinguishable from an untrained model,
/// which is distinguishable from "trained, but nothing to recommend"
/// (the latter is a successful result with an empty list).
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid event: missing or invalid field(s): {}", fields.join(", "))]
    InvalidEvent { fields: Vec<&'static str> },

    #[error("invalid query parameter: {0}")]
    InvalidQuery(&'static str),

    #[error("{entity} {id} not found in the current model")]
    NotFound { entity: &'static str, id: i64 },

    #[error("no trained model is available yet")]
    Untrained,

    #[error("no interaction data available")]
    NoData,

    #[error("collaborator failure: {0}")]
    Provider(#[from] anyhow::Error),
}

impl EngineError {
    pub fn item_not_found(id: i64) -> Self {
        EngineError::NotFound { entity: "item", id }
    }
}
