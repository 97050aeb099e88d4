//! Daily Progress and Award Records
//!
//! Records written by the karma aggregator. A [`DailyProgressRecord`] holds
//! one user's counters for one local calendar day; an [`AwardAuditRecord`]
//! marks a single karma award as applied under a deterministic key so a
//! repeated award is detected instead of counted twice.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Counters tracked per user per day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProgressCounter {
    Posts,
    Comments,
    Likes,
    Mentions,
    Follows,
    GroupsJoined,
}

impl ProgressCounter {
    /// Field name in the stored record
    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressCounter::Posts => "posts",
            ProgressCounter::Comments => "comments",
            ProgressCounter::Likes => "likes",
            ProgressCounter::Mentions => "mentions",
            ProgressCounter::Follows => "follows",
            ProgressCounter::GroupsJoined => "groupsJoined",
        }
    }
}

impl fmt::Display for ProgressCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Document id of a user's progress record for a day
pub fn progress_id(user_id: &str, date: &str) -> String {
    format!("progress-{}-{}", user_id, date)
}

/// Deterministic key identifying one karma award
pub fn award_key(user_id: &str, action: &str, related_id: Option<&str>, date: &str) -> String {
    format!(
        "award-{}-{}-{}-{}",
        user_id,
        action,
        related_id.filter(|r| !r.is_empty()).unwrap_or("none"),
        date
    )
}

/// One user's activity counters for one calendar day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyProgressRecord {
    pub user_id: String,
    /// Local date, `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub posts: u64,
    #[serde(default)]
    pub comments: u64,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub mentions: u64,
    #[serde(default)]
    pub follows: u64,
    #[serde(default)]
    pub groups_joined: u64,
    #[serde(default)]
    pub karma_earned: u64,
    pub created_at: u64,
    pub updated_at: u64,
    /// Award keys already merged into this record
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub applied_awards: Vec<String>,
}

impl DailyProgressRecord {
    /// Empty record for a user and day
    pub fn new(user_id: impl Into<String>, date: impl Into<String>, now_ms: u64) -> Self {
        Self {
            user_id: user_id.into(),
            date: date.into(),
            posts: 0,
            comments: 0,
            likes: 0,
            mentions: 0,
            follows: 0,
            groups_joined: 0,
            karma_earned: 0,
            created_at: now_ms,
            updated_at: now_ms,
            applied_awards: Vec::new(),
        }
    }

    /// Document id of this record
    pub fn id(&self) -> String {
        progress_id(&self.user_id, &self.date)
    }

    /// Current value of a counter
    pub fn counter(&self, counter: ProgressCounter) -> u64 {
        match counter {
            ProgressCounter::Posts => self.posts,
            ProgressCounter::Comments => self.comments,
            ProgressCounter::Likes => self.likes,
            ProgressCounter::Mentions => self.mentions,
            ProgressCounter::Follows => self.follows,
            ProgressCounter::GroupsJoined => self.groups_joined,
        }
    }

    fn counter_mut(&mut self, counter: ProgressCounter) -> &mut u64 {
        match counter {
            ProgressCounter::Posts => &mut self.posts,
            ProgressCounter::Comments => &mut self.comments,
            ProgressCounter::Likes => &mut self.likes,
            ProgressCounter::Mentions => &mut self.mentions,
            ProgressCounter::Follows => &mut self.follows,
            ProgressCounter::GroupsJoined => &mut self.groups_joined,
        }
    }

    /// Merge one event into the record
    pub fn apply(&mut self, counter: Option<ProgressCounter>, points: u64, now_ms: u64) {
        if let Some(counter) = counter {
            let value = self.counter_mut(counter);
            *value = value.saturating_add(1);
        }
        self.karma_earned = self.karma_earned.saturating_add(points);
        self.updated_at = now_ms;
    }

    /// Whether the award with `key` is already part of the record
    pub fn has_award(&self, key: &str) -> bool {
        self.applied_awards.iter().any(|k| k == key)
    }

    /// Merge one keyed award; a key seen before leaves the record untouched.
    /// Returns whether the award was merged.
    pub fn apply_award(
        &mut self,
        key: &str,
        counter: Option<ProgressCounter>,
        points: u64,
        now_ms: u64,
    ) -> bool {
        if self.has_award(key) {
            return false;
        }
        self.apply(counter, points, now_ms);
        self.applied_awards.push(key.to_string());
        true
    }

    /// Undo one event previously merged with [`apply`](Self::apply)
    pub fn retract(&mut self, counter: Option<ProgressCounter>, points: u64, now_ms: u64) {
        if let Some(counter) = counter {
            let value = self.counter_mut(counter);
            *value = value.saturating_sub(1);
        }
        self.karma_earned = self.karma_earned.saturating_sub(points);
        self.updated_at = now_ms;
    }
}

/// Marker that an award with a given key has been applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardAuditRecord {
    pub user_id: String,
    /// Canonical action name
    pub action: String,
    pub related_id: Option<String>,
    pub date: String,
    pub points: u64,
    pub created_at: u64,
}

impl AwardAuditRecord {
    /// Deterministic key of this award
    pub fn key(&self) -> String {
        award_key(&self.user_id, &self.action, self.related_id.as_deref(), &self.date)
    }
}

/// History entry for an award, one per application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KarmaTraceRecord {
    pub award_key: String,
    pub user_id: String,
    pub action: String,
    pub related_id: Option<String>,
    pub date: String,
    pub points: u64,
    pub created_at: u64,
}
