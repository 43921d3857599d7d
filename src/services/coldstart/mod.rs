use anyhow::Result;
use dashmap::DashMap;

/// Per-user cold-start flag, persisted by the platform's user store. A
/// user is cold until their first qualifying interaction; the flip is
/// one-way and unknown users are cold by definition.
#[async_trait::async_trait]
pub trait ColdStartStore: Send + Sync {
    async fn is_cold(&self, user_id: i64) -> Result<bool>;
    async fn mark_active(&self, user_id: i64) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct InMemoryColdStartStore {
    warm: DashMap<i64, ()>,
}

impl InMemoryColdStartStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ColdStartStore for InMemoryColdStartStore {
    async fn is_cold(&self, user_id: i64) -> Result<bool> {
        Ok(!self.warm.contains_key(&user_id))
    }

    async fn mark_active(&self, user_id: i64) -> Result<()> {
        self.warm.insert(user_id, ());
        Ok(())
    }
}
