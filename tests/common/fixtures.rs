//! Test fixtures for creating test data
#![allow(dead_code)]
#![allow(clippy::needless_update)]

use chrono::Utc;
use modgate::app_config::ModerationConfig;
use modgate::moderation::{BatchAction, ModerationEngine};
use modgate::notifications::{ModerationNotice, NotificationSink};
use modgate::orm::comments::{self, CommentState};
use modgate::orm::{actors, role_assignments};
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};
use std::sync::{Arc, Mutex};

/// Sink that keeps every notice for later inspection
#[derive(Default)]
pub struct RecordingSink {
    notices: Mutex<Vec<ModerationNotice>>,
}

impl RecordingSink {
    pub fn notices(&self) -> Vec<ModerationNotice> {
        self.notices.lock().expect("sink poisoned").clone()
    }
}

impl NotificationSink for RecordingSink {
    fn dispatch(&self, notice: ModerationNotice) {
        self.notices.lock().expect("sink poisoned").push(notice);
    }
}

/// Engine over `db` with default moderation settings
pub fn test_engine(db: &DatabaseConnection) -> ModerationEngine {
    ModerationEngine::new(db.clone(), ModerationConfig::default())
}

/// Engine over `db` that records its notices
pub fn recording_engine(db: &DatabaseConnection) -> (ModerationEngine, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let engine = test_engine(db).with_sink(sink.clone());
    (engine, sink)
}

/// Create an actor with no roles
pub async fn create_test_actor(
    db: &DatabaseConnection,
    display_name: &str,
) -> Result<actors::Model, DbErr> {
    actors::ActiveModel {
        display_name: Set(display_name.to_string()),
        email: Set(Some(format!(
            "{}@test.com",
            display_name.to_lowercase().replace(' ', ".")
        ))),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Assign a role to an actor
pub async fn grant_role(
    db: &DatabaseConnection,
    actor_id: i32,
    role: &str,
) -> Result<role_assignments::Model, DbErr> {
    role_assignments::ActiveModel {
        actor_id: Set(actor_id),
        role: Set(role.to_string()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Create an actor holding the school_admin role
pub async fn create_test_moderator(
    db: &DatabaseConnection,
    display_name: &str,
) -> Result<actors::Model, DbErr> {
    let actor = create_test_actor(db, display_name).await?;
    grant_role(db, actor.id, "school_admin").await?;
    Ok(actor)
}

/// Create an active comment
pub async fn create_test_comment(
    db: &DatabaseConnection,
    author_id: i32,
    content: &str,
) -> Result<comments::Model, DbErr> {
    comments::ActiveModel {
        content: Set(content.to_string()),
        author_id: Set(author_id),
        resource_id: Set("lesson-1".to_string()),
        parent_id: Set(None),
        state: Set(CommentState::Active),
        flag_reason: Set(None),
        flagged_by: Set(None),
        flagged_at: Set(None),
        hidden_by: Set(None),
        hidden_at: Set(None),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Create a comment and flag it through the engine
pub async fn create_flagged_comment(
    engine: &ModerationEngine,
    author_id: i32,
    reporter_id: i32,
    content: &str,
) -> comments::Model {
    let comment = create_test_comment(engine.db(), author_id, content)
        .await
        .expect("Failed to create comment");
    engine
        .flag(comment.id, reporter_id, "spam")
        .await
        .expect("Failed to flag comment")
}

/// Create a comment, flag it, then hide it
pub async fn create_hidden_comment(
    engine: &ModerationEngine,
    author_id: i32,
    reporter_id: i32,
    moderator_id: i32,
    content: &str,
) -> comments::Model {
    let comment = create_flagged_comment(engine, author_id, reporter_id, content).await;
    let outcome = engine
        .apply_batch(BatchAction::Hide, &[comment.id], moderator_id)
        .await
        .expect("Failed to hide comment");
    outcome.updated[0].clone()
}

/// Reload a comment from the database
pub async fn reload_comment(db: &DatabaseConnection, id: i32) -> comments::Model {
    comments::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("Failed to load comment")
        .expect("Comment missing")
}
