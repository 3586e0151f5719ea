pub mod actors;
pub mod bans;
pub mod comments;
pub mod moderation_events;
pub mod role_assignments;
