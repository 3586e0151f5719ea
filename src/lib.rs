//! Role-gated comment moderation
//!
//! Any actor may flag a comment. Moderators, identified by their role
//! assignments, hide, restore and dismiss comments in atomic batches, rank
//! repeat offenders and issue bans. Every moderator transition leaves an
//! audit event.

pub mod app_config;
pub mod constants;
pub mod db;
pub mod error;
pub mod middleware;
pub mod moderation;
pub mod notifications;
pub mod orm;
pub mod permission;
pub mod web;

pub use error::ModerationError;
pub use moderation::ModerationEngine;
pub use permission::{Capabilities, Capability};
