//! SeaORM Entity for moderation_events table
//!
//! Append-only audit log. Rows are inserted alongside the comment update they
//! describe and are never updated or deleted.

use super::comments::CommentState;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of transition applied to a comment
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    #[sea_orm(string_value = "flag")]
    Flag,
    #[sea_orm(string_value = "hide")]
    Hide,
    #[sea_orm(string_value = "restore")]
    Restore,
    #[sea_orm(string_value = "dismiss")]
    Dismiss,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Hide => "hide",
            Self::Restore => "restore",
            Self::Dismiss => "dismiss",
        }
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "moderation_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub comment_id: i32,
    pub kind: TransitionKind,
    pub actor_id: i32,
    pub resulting_state: CommentState,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::comments::Entity",
        from = "Column::CommentId",
        to = "super::comments::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Comment,
}

impl Related<super::comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
