//! Notification type definitions

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    CommentHidden, // A moderator hid one of your comments
    ActorBanned,   // You were banned
}

impl NotificationType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::CommentHidden => "comment_hidden",
            Self::ActorBanned => "actor_banned",
        }
    }
}

/// A moderation event the engine hands to the notification sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModerationNotice {
    pub notification_type: NotificationType,
    /// Actor the notice is about and who should eventually receive it
    pub recipient_id: i32,
    /// Moderator who acted
    pub source_actor_id: i32,
    pub target_type: String,
    pub target_id: i32,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_str_matches_serialized_name() {
        for t in [NotificationType::CommentHidden, NotificationType::ActorBanned] {
            assert_eq!(serde_json::to_value(t).unwrap(), t.as_str());
        }
    }
}
