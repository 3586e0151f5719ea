//! Offender ranking and bans
//!
//! The ranking is derived from comment flag metadata on every call. Bans are a
//! separate write path and never touch comments.

use super::{find_actor, ModerationEngine, PolicyViolation};
use crate::error::ModerationError;
use crate::notifications;
use crate::orm::{actors, bans, comments};
use crate::permission::Capability;
use chrono::Duration;
use sea_orm::{
    entity::*, query::*, sea_query::Expr, ActiveValue::Set, ConnectionTrait, DbErr,
    FromQueryResult, PaginatorTrait, TransactionTrait,
};
use serde::Serialize;
use std::collections::HashMap;

/// An author ranked by how many of their comments carry a flag.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Offender {
    pub actor_id: i32,
    pub display_name: String,
    pub flagged_count: u64,
}

/// Per-author flagged comment count as aggregated by the database.
#[derive(Debug, FromQueryResult)]
struct FlaggedTally {
    author_id: i32,
    flagged_count: i64,
}

/// Clamp a requested ban length to `1..=max_days`.
pub fn ban_duration_days(requested: Option<i64>, default_days: i64, max_days: i64) -> i64 {
    requested.unwrap_or(default_days).clamp(1, max_days.max(1))
}

/// Number of comments by `author_id` that carry flag metadata.
pub async fn flagged_count<C>(db: &C, author_id: i32) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    comments::Entity::find()
        .filter(comments::Column::AuthorId.eq(author_id))
        .filter(comments::Column::FlaggedBy.is_not_null())
        .count(db)
        .await
        .map(|n| n as u64)
}

impl ModerationEngine {
    /// TopOffenders: authors with the most flagged comments.
    pub async fn top_offenders(&self, limit: u64) -> Result<Vec<Offender>, ModerationError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        // Highest count first; ties go to the lower actor id.
        let ranked = comments::Entity::find()
            .select_only()
            .column(comments::Column::AuthorId)
            .column_as(Expr::col(comments::Column::Id).count(), "flagged_count")
            .filter(comments::Column::FlaggedBy.is_not_null())
            .group_by(comments::Column::AuthorId)
            .order_by_desc(Expr::col(comments::Column::Id).count())
            .order_by_asc(comments::Column::AuthorId)
            .limit(limit)
            .into_model::<FlaggedTally>()
            .all(self.db())
            .await?;

        if ranked.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = ranked.iter().map(|t| t.author_id).collect();
        let names: HashMap<i32, String> = actors::Entity::find()
            .filter(actors::Column::Id.is_in(ids))
            .all(self.db())
            .await?
            .into_iter()
            .map(|a| (a.id, a.display_name))
            .collect();

        Ok(ranked
            .into_iter()
            .map(|tally| Offender {
                actor_id: tally.author_id,
                display_name: names.get(&tally.author_id).cloned().unwrap_or_default(),
                flagged_count: tally.flagged_count.max(0) as u64,
            })
            .collect())
    }

    /// Ban: record a time-boxed ban against an actor.
    ///
    /// The flagged count at this moment is copied into the record so later
    /// dismissals do not change the ban's justification. Comments are left
    /// alone; hiding them is a separate batch.
    pub async fn ban(
        &self,
        actor_id: i32,
        moderator_id: i32,
        reason: &str,
        duration_days: Option<i64>,
    ) -> Result<bans::Model, ModerationError> {
        let txn = self.db().begin().await?;

        self.require_capability_on(&txn, moderator_id, Capability::Ban, "ban")
            .await?;

        if actor_id == moderator_id {
            log::warn!("Moderator {} tried to ban themself", moderator_id);
            return Err(PolicyViolation::SelfBan.into());
        }

        let reason = self.validate_reason(reason)?;
        let days = ban_duration_days(
            duration_days,
            self.config().ban_duration_days,
            self.config().max_ban_duration_days,
        );

        find_actor(&txn, actor_id).await?;
        let snapshot = flagged_count(&txn, actor_id).await?;

        let now = chrono::Utc::now().naive_utc();
        let ban = bans::ActiveModel {
            actor_id: Set(actor_id),
            banned_by: Set(moderator_id),
            reason: Set(reason),
            flagged_count_snapshot: Set(snapshot as i64),
            expires_at: Set(now + Duration::days(days)),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        log::info!(
            "Moderator {} banned actor {} for {} day(s) ({} flagged comment(s))",
            moderator_id,
            actor_id,
            days,
            snapshot
        );

        self.notify(notifications::actor_banned(
            actor_id,
            ban.id,
            moderator_id,
            ban.expires_at,
        ));

        Ok(ban)
    }

    /// Latest ban on an actor that has not yet expired.
    pub async fn active_ban(&self, actor_id: i32) -> Result<Option<bans::Model>, ModerationError> {
        let now = chrono::Utc::now().naive_utc();

        let ban = bans::Entity::find()
            .filter(bans::Column::ActorId.eq(actor_id))
            .filter(bans::Column::ExpiresAt.gt(now))
            .order_by_desc(bans::Column::ExpiresAt)
            .order_by_desc(bans::Column::Id)
            .one(self.db())
            .await?;

        Ok(ban)
    }
}
