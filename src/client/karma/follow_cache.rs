//! Session cache of follow awards.
//!
//! Following the same user twice in a day must not pay out twice. The cache
//! answers that locally so repeat follows skip the remote audit lookup.

use std::collections::HashSet;
use tokio::sync::RwLock;

/// `(user, target, date)` triples already awarded this session
#[derive(Debug, Default)]
pub struct FollowAwardCache {
    awarded: RwLock<HashSet<(String, String, String)>>,
}

impl FollowAwardCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, user_id: &str, target_id: &str, date: &str) -> bool {
        self.awarded
            .read()
            .await
            .contains(&(user_id.to_string(), target_id.to_string(), date.to_string()))
    }

    /// Remember an award; returns false if it was already cached
    pub async fn insert(&self, user_id: &str, target_id: &str, date: &str) -> bool {
        self.awarded
            .write()
            .await
            .insert((user_id.to_string(), target_id.to_string(), date.to_string()))
    }

    pub async fn len(&self) -> usize {
        self.awarded.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.awarded.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.awarded.write().await.clear();
    }
}
