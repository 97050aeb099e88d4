//! Karma actions and their aliases.
//!
//! Activity events arrive under many spellings (`create_post`, `new-post`,
//! `Like`). They are normalized to one canonical [`KarmaAction`], which
//! fixes the points awarded and the daily counter bumped.

use crate::shared::ProgressCounter;
use std::fmt;

/// Canonical karma-earning action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KarmaAction {
    PostCreated,
    CommentCreated,
    PostLiked,
    MentionReceived,
    UserFollowed,
    GroupJoined,
    DailyLogin,
    AchievementUnlocked,
}

impl KarmaAction {
    pub const ALL: [KarmaAction; 8] = [
        KarmaAction::PostCreated,
        KarmaAction::CommentCreated,
        KarmaAction::PostLiked,
        KarmaAction::MentionReceived,
        KarmaAction::UserFollowed,
        KarmaAction::GroupJoined,
        KarmaAction::DailyLogin,
        KarmaAction::AchievementUnlocked,
    ];

    /// Canonical name, used in award keys
    pub fn as_str(&self) -> &'static str {
        match self {
            KarmaAction::PostCreated => "post_created",
            KarmaAction::CommentCreated => "comment_created",
            KarmaAction::PostLiked => "post_liked",
            KarmaAction::MentionReceived => "mention_received",
            KarmaAction::UserFollowed => "user_followed",
            KarmaAction::GroupJoined => "group_joined",
            KarmaAction::DailyLogin => "daily_login",
            KarmaAction::AchievementUnlocked => "achievement_unlocked",
        }
    }

    /// Karma points awarded
    pub fn points(&self) -> u64 {
        match self {
            KarmaAction::PostCreated => 5,
            KarmaAction::CommentCreated => 2,
            KarmaAction::PostLiked => 1,
            KarmaAction::MentionReceived => 1,
            KarmaAction::UserFollowed => 2,
            KarmaAction::GroupJoined => 3,
            KarmaAction::DailyLogin => 1,
            KarmaAction::AchievementUnlocked => 10,
        }
    }

    /// Daily counter bumped, if any
    pub fn counter(&self) -> Option<ProgressCounter> {
        match self {
            KarmaAction::PostCreated => Some(ProgressCounter::Posts),
            KarmaAction::CommentCreated => Some(ProgressCounter::Comments),
            KarmaAction::PostLiked => Some(ProgressCounter::Likes),
            KarmaAction::MentionReceived => Some(ProgressCounter::Mentions),
            KarmaAction::UserFollowed => Some(ProgressCounter::Follows),
            KarmaAction::GroupJoined => Some(ProgressCounter::GroupsJoined),
            KarmaAction::DailyLogin | KarmaAction::AchievementUnlocked => None,
        }
    }

    fn aliases(&self) -> &'static [&'static str] {
        match self {
            KarmaAction::PostCreated => &["post_created", "create_post", "post", "new_post"],
            KarmaAction::CommentCreated => &[
                "comment_created",
                "comment_added",
                "comment",
                "comment_replied",
                "reply",
                "discussion_participation",
            ],
            KarmaAction::PostLiked => &[
                "post_liked",
                "like",
                "liked",
                "upvote",
                "upvoted",
                "comment_liked",
            ],
            KarmaAction::MentionReceived => {
                &["mention_received", "mention", "mentioned", "user_mentioned"]
            }
            KarmaAction::UserFollowed => &["user_followed", "follow", "followed", "follower_gained"],
            KarmaAction::GroupJoined => &["group_joined", "join_group", "joined_group"],
            KarmaAction::DailyLogin => &["daily_login", "login"],
            KarmaAction::AchievementUnlocked => &["achievement_unlocked", "achievement"],
        }
    }
}

impl fmt::Display for KarmaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a raw action name to its canonical action
pub fn normalize_action(raw: &str) -> Option<KarmaAction> {
    let name: String = raw
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect();
    if name.is_empty() {
        return None;
    }

    KarmaAction::ALL
        .iter()
        .copied()
        .find(|action| action.aliases().contains(&name.as_str()))
}
