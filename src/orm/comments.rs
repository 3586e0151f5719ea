//! SeaORM Entity for comments table
//!
//! Flag metadata (`flag_reason`, `flagged_by`, `flagged_at`) and hide metadata
//! (`hidden_by`, `hidden_at`) are each written and cleared as a unit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a comment
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
#[derive(Default)]
pub enum CommentState {
    /// Visible, no outstanding flag
    #[sea_orm(string_value = "active")]
    #[default]
    Active,
    /// Visible, reported by someone and awaiting a moderator
    #[sea_orm(string_value = "flagged")]
    Flagged,
    /// Removed from display by a moderator, can be restored
    #[sea_orm(string_value = "hidden")]
    Hidden,
}

impl CommentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Flagged => "flagged",
            Self::Hidden => "hidden",
        }
    }
}

impl std::fmt::Display for CommentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "comments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub author_id: i32,
    /// Opaque reference to the resource the comment is attached to
    pub resource_id: String,
    pub parent_id: Option<i32>,
    pub state: CommentState,
    #[sea_orm(column_type = "Text", nullable)]
    pub flag_reason: Option<String>,
    pub flagged_by: Option<i32>,
    pub flagged_at: Option<DateTime>,
    pub hidden_by: Option<i32>,
    pub hidden_at: Option<DateTime>,
    pub created_at: DateTime,
}

impl Model {
    pub fn has_flag_metadata(&self) -> bool {
        self.flagged_by.is_some()
    }

    pub fn has_hide_metadata(&self) -> bool {
        self.hidden_by.is_some()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::actors::Entity",
        from = "Column::AuthorId",
        to = "super::actors::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Author,
    #[sea_orm(has_many = "super::moderation_events::Entity")]
    ModerationEvents,
}

impl Related<super::actors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::moderation_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ModerationEvents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
