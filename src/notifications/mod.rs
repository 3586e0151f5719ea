//! Outbound moderation notices
//!
//! The engine emits a notice after a hide or ban commits. Delivery (in-app,
//! email, push) belongs to whatever implements [`NotificationSink`].

pub mod types;

use chrono::NaiveDateTime;

pub use types::{ModerationNotice, NotificationType};

/// Receiver for moderation notices.
///
/// Called after the triggering change has committed. Implementations must not
/// block for long; queue the notice if delivery is slow.
pub trait NotificationSink: Send + Sync {
    fn dispatch(&self, notice: ModerationNotice);
}

/// Sink that writes every notice to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn dispatch(&self, notice: ModerationNotice) {
        log::info!(
            "Notice {} for actor {} from moderator {} on {} #{}: {}",
            notice.notification_type.as_str(),
            notice.recipient_id,
            notice.source_actor_id,
            notice.target_type,
            notice.target_id,
            notice.message
        );
    }
}

/// Notice telling an author one of their comments was hidden.
pub fn comment_hidden(author_id: i32, comment_id: i32, moderator_id: i32) -> ModerationNotice {
    ModerationNotice {
        notification_type: NotificationType::CommentHidden,
        recipient_id: author_id,
        source_actor_id: moderator_id,
        target_type: "comment".to_string(),
        target_id: comment_id,
        message: format!("Your comment #{} was hidden by a moderator", comment_id),
    }
}

/// Notice telling an actor they were banned.
pub fn actor_banned(
    actor_id: i32,
    ban_id: i32,
    moderator_id: i32,
    expires_at: NaiveDateTime,
) -> ModerationNotice {
    ModerationNotice {
        notification_type: NotificationType::ActorBanned,
        recipient_id: actor_id,
        source_actor_id: moderator_id,
        target_type: "ban".to_string(),
        target_id: ban_id,
        message: format!("You are banned until {}", expires_at.format("%Y-%m-%d %H:%M UTC")),
    }
}
