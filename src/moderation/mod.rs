//! Moderation engine
//!
//! [`ModerationEngine`] is the entry point for every operation: capability
//! lookups, flagging, batch transitions, the moderation queue, offender
//! ranking and bans. It holds no mutable state of its own; every call reads
//! the store afresh.

pub mod batch;
pub mod offenders;
pub mod queue;
pub mod state;

pub use batch::BatchOutcome;
pub use offenders::Offender;
pub use queue::{QueueFilter, QueueItem};
pub use state::{BatchAction, PolicyViolation};

use crate::app_config::ModerationConfig;
use crate::error::ModerationError;
use crate::notifications::{LogSink, ModerationNotice, NotificationSink};
use crate::orm::{actors, comments, moderation_events};
use crate::permission::{self, Capabilities, Capability};
use sea_orm::{entity::*, query::*, ConnectionTrait, DatabaseConnection, DbErr};
use std::sync::Arc;

#[derive(Clone)]
pub struct ModerationEngine {
    db: DatabaseConnection,
    config: ModerationConfig,
    sink: Arc<dyn NotificationSink>,
}

impl ModerationEngine {
    /// Create an engine that logs its notices.
    pub fn new(db: DatabaseConnection, config: ModerationConfig) -> Self {
        Self {
            db,
            config,
            sink: Arc::new(LogSink),
        }
    }

    /// Replace the notification sink.
    pub fn with_sink(mut self, sink: Arc<dyn NotificationSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn config(&self) -> &ModerationConfig {
        &self.config
    }

    /// GetCapabilities: resolve what an actor may do right now.
    pub async fn get_capabilities(&self, actor_id: i32) -> Result<Capabilities, DbErr> {
        permission::capabilities_for(&self.db, actor_id, &self.config.moderator_roles).await
    }

    /// Resolve capabilities and fail unless `capability` is among them.
    pub async fn require_capability(
        &self,
        actor_id: i32,
        capability: Capability,
        operation: &str,
    ) -> Result<Capabilities, ModerationError> {
        self.require_capability_on(&self.db, actor_id, capability, operation)
            .await
    }

    /// Same as [`Self::require_capability`], reading roles through `db`.
    ///
    /// Writers pass their open transaction so the roles are the ones in force
    /// when the change commits.
    pub(crate) async fn require_capability_on<C>(
        &self,
        db: &C,
        actor_id: i32,
        capability: Capability,
        operation: &str,
    ) -> Result<Capabilities, ModerationError>
    where
        C: ConnectionTrait,
    {
        let capabilities =
            permission::capabilities_for(db, actor_id, &self.config.moderator_roles).await?;

        if !capabilities.has(capability) {
            log::warn!(
                "Actor {} refused {}: missing {} capability",
                actor_id,
                operation,
                capability
            );
            return Err(PolicyViolation::MissingCapability {
                operation: operation.to_string(),
                required: capability,
            }
            .into());
        }

        Ok(capabilities)
    }

    /// Audit trail of a comment, oldest first.
    pub async fn comment_history(
        &self,
        comment_id: i32,
    ) -> Result<Vec<moderation_events::Model>, ModerationError> {
        find_comment(&self.db, comment_id).await?;

        let events = moderation_events::Entity::find()
            .filter(moderation_events::Column::CommentId.eq(comment_id))
            .order_by_asc(moderation_events::Column::Id)
            .all(&self.db)
            .await?;

        Ok(events)
    }

    fn notify(&self, notice: ModerationNotice) {
        self.sink.dispatch(notice);
    }

    /// Trim a free-text reason and enforce the configured bounds.
    fn validate_reason(&self, reason: &str) -> Result<String, ModerationError> {
        let reason = reason.trim();

        if reason.is_empty() {
            return Err(ModerationError::InvalidInput(
                "A reason is required".to_string(),
            ));
        }

        if reason.chars().count() > self.config.max_reason_length {
            return Err(ModerationError::InvalidInput(format!(
                "Reason must be at most {} characters",
                self.config.max_reason_length
            )));
        }

        Ok(reason.to_string())
    }
}

async fn find_actor<C>(db: &C, actor_id: i32) -> Result<actors::Model, ModerationError>
where
    C: ConnectionTrait,
{
    actors::Entity::find_by_id(actor_id)
        .one(db)
        .await?
        .ok_or_else(|| ModerationError::NotFound(format!("actor {}", actor_id)))
}

async fn find_comment<C>(db: &C, comment_id: i32) -> Result<comments::Model, ModerationError>
where
    C: ConnectionTrait,
{
    comments::Entity::find_by_id(comment_id)
        .one(db)
        .await?
        .ok_or_else(|| ModerationError::NotFound(format!("comment {}", comment_id)))
}
