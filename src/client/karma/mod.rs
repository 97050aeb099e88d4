//! # Karma and Daily Progress
//!
//! Turns activity events into daily progress counters and karma points,
//! applying each logical award exactly once.
//!
//! An award is identified by a deterministic key built from the user, the
//! canonical action, the related object and the local date. The key is the
//! id of an `audit` document: if that document exists the award has already
//! been counted, on this device or another.
//!
//! ## Award flow
//!
//! 1. Normalize the action; unknown actions award nothing.
//! 2. Skip keys already applied in this session.
//! 3. Update the in-memory progress record so the UI reflects the award now.
//! 4. Settle the award remotely (see [`ledger`]): check the audit document,
//!    merge into the stored progress record, upsert it, write the audit
//!    document and a karma trace entry.
//! 5. If the store cannot be reached, queue the award itself. The queue
//!    settles it against the stored record on delivery, so an offline award
//!    only ever adds to what is already there.

pub mod actions;
pub mod follow_cache;
pub mod ledger;

pub use actions::{normalize_action, KarmaAction};
pub use follow_cache::FollowAwardCache;
pub use ledger::{PendingAward, Settlement};

use crate::client::clock::Clock;
use crate::client::offline::queue::UnsyncedQueue;
use crate::client::remote::DocumentStore;
use crate::shared::{award_key, AwardAuditRecord, DailyProgressRecord, DocumentType, SyncError};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// One activity event to award karma for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwardRequest {
    pub user_id: String,
    /// Raw action name, normalized before use
    pub action: String,
    pub related_id: Option<String>,
    /// Local date `YYYY-MM-DD`; today when absent
    pub date: Option<String>,
}

impl AwardRequest {
    pub fn new(user_id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            action: action.into(),
            related_id: None,
            date: None,
        }
    }

    pub fn related(mut self, related_id: impl Into<String>) -> Self {
        self.related_id = Some(related_id.into());
        self
    }

    pub fn on(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }
}

/// Result of an award
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AwardOutcome {
    /// Counted and written to the remote store
    Applied { points: u64, key: String },
    /// Already counted earlier; nothing changed
    AlreadyApplied { key: String },
    /// Unknown action or zero points
    NotAwarded,
    /// Counted locally; the award waits in the unsynced queue
    Queued { key: String },
}

impl AwardOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, AwardOutcome::NotAwarded)
    }

    pub fn key(&self) -> Option<&str> {
        match self {
            AwardOutcome::Applied { key, .. }
            | AwardOutcome::AlreadyApplied { key }
            | AwardOutcome::Queued { key } => Some(key),
            AwardOutcome::NotAwarded => None,
        }
    }
}

/// Idempotent karma and daily progress aggregation
pub struct KarmaAggregator {
    store: Arc<dyn DocumentStore>,
    queue: Arc<UnsyncedQueue>,
    clock: Arc<dyn Clock>,
    follow_cache: Arc<FollowAwardCache>,
    applied: RwLock<HashSet<String>>,
    local: RwLock<HashMap<(String, String), DailyProgressRecord>>,
}

impl KarmaAggregator {
    pub fn new(store: Arc<dyn DocumentStore>, queue: Arc<UnsyncedQueue>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            queue,
            clock,
            follow_cache: Arc::new(FollowAwardCache::new()),
            applied: RwLock::new(HashSet::new()),
            local: RwLock::new(HashMap::new()),
        }
    }

    /// Share a follow cache with other components
    pub fn with_follow_cache(mut self, cache: Arc<FollowAwardCache>) -> Self {
        self.follow_cache = cache;
        self
    }

    /// Award karma for one activity event
    pub async fn award(&self, request: AwardRequest) -> AwardOutcome {
        let Some(action) = normalize_action(&request.action) else {
            tracing::debug!("[Karma] No karma for unknown action {:?}", request.action);
            return AwardOutcome::NotAwarded;
        };
        let points = action.points();
        if points == 0 {
            return AwardOutcome::NotAwarded;
        }

        let user_id = request.user_id.as_str();
        let date = request.date.clone().unwrap_or_else(|| self.clock.today());
        let related_id = request.related_id.filter(|r| !r.is_empty());
        let key = award_key(user_id, action.as_str(), related_id.as_deref(), &date);

        if !self.applied.write().await.insert(key.clone()) {
            tracing::debug!("[Karma] {} already applied this session", key);
            return AwardOutcome::AlreadyApplied { key };
        }

        let now = self.clock.now_ms();
        self.apply_local(user_id, &date, action, now).await;

        let award = PendingAward::new(AwardAuditRecord {
            user_id: user_id.to_string(),
            action: action.as_str().to_string(),
            related_id,
            date: date.clone(),
            points,
            created_at: now,
        });

        match ledger::settle(self.store.as_ref(), &award, now).await {
            Ok(Settlement::Applied) => {
                tracing::info!("[Karma] Awarded {} points to {} for {}", points, user_id, action);
                AwardOutcome::Applied { points, key }
            }
            Ok(Settlement::AlreadyApplied) => {
                self.retract_local(user_id, &date, action).await;
                tracing::debug!("[Karma] {} already recorded remotely", key);
                AwardOutcome::AlreadyApplied { key }
            }
            Err(e) => {
                tracing::warn!("[Karma] Store unavailable for {}: {}; queueing", key, e);
                self.queue_award(&award).await;
                AwardOutcome::Queued { key }
            }
        }
    }

    /// Award a follow, at most once per (user, target, day)
    pub async fn record_follow(&self, user_id: &str, target_id: &str) -> AwardOutcome {
        let date = self.clock.today();
        if self.follow_cache.contains(user_id, target_id, &date).await {
            let key = award_key(user_id, KarmaAction::UserFollowed.as_str(), Some(target_id), &date);
            return AwardOutcome::AlreadyApplied { key };
        }

        let outcome = self
            .award(
                AwardRequest::new(user_id, KarmaAction::UserFollowed.as_str())
                    .related(target_id)
                    .on(date.clone()),
            )
            .await;
        if outcome.is_success() {
            self.follow_cache.insert(user_id, target_id, &date).await;
        }
        outcome
    }

    /// This session's view of a user's progress for a day
    pub async fn daily_progress(&self, user_id: &str, date: &str) -> Option<DailyProgressRecord> {
        self.local
            .read()
            .await
            .get(&(user_id.to_string(), date.to_string()))
            .cloned()
    }

    /// Karma score: the sum of `karmaEarned` over the user's remote records
    pub async fn total_karma(&self, user_id: &str) -> Result<u64, SyncError> {
        let documents = self
            .store
            .query_by_type(DocumentType::DailyProgress.as_str())
            .await?;

        let total = documents
            .iter()
            .filter_map(|doc| match doc.decode::<DailyProgressRecord>() {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("[Karma] Skipping unreadable progress record {}: {}", doc.id, e);
                    None
                }
            })
            .filter(|record| record.user_id == user_id)
            .fold(0u64, |sum, record| sum.saturating_add(record.karma_earned));
        Ok(total)
    }

    async fn apply_local(
        &self,
        user_id: &str,
        date: &str,
        action: KarmaAction,
        now: u64,
    ) {
        let mut local = self.local.write().await;
        local
            .entry((user_id.to_string(), date.to_string()))
            .or_insert_with(|| DailyProgressRecord::new(user_id, date, now))
            .apply(action.counter(), action.points(), now);
    }

    async fn retract_local(&self, user_id: &str, date: &str, action: KarmaAction) {
        let now = self.clock.now_ms();
        let mut local = self.local.write().await;
        if let Some(record) = local.get_mut(&(user_id.to_string(), date.to_string())) {
            record.retract(action.counter(), action.points(), now);
        }
    }

    async fn queue_award(&self, award: &PendingAward) {
        match award.to_payload() {
            Ok(payload) => {
                self.queue.add(payload).await;
            }
            Err(e) => tracing::error!("[Karma] Could not queue award {}: {}", award.key(), e),
        }
    }
}
