//! Batch transitions and flagging
//!
//! Every write follows the same shape: open a transaction, load the comments,
//! run the pure state machine, then persist each change with a compare-and-swap
//! on the state that was loaded. A row whose state moved underneath us fails
//! the swap and the whole transaction is rolled back.

use super::state::{self, BatchAction, Outcome, PolicyViolation, Transition};
use super::{find_actor, find_comment, ModerationEngine};
use crate::error::{BatchItemFailure, ItemFailure, ModerationError};
use crate::notifications;
use crate::orm::comments;
use crate::orm::moderation_events;
use crate::permission::Capability;
use sea_orm::{
    entity::*, query::*, sea_query::Expr, ActiveEnum, ActiveValue::Set, DatabaseTransaction, DbErr,
    TransactionTrait,
};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Result of a committed batch.
#[derive(Clone, Debug, Serialize)]
pub struct BatchOutcome {
    pub action: BatchAction,
    /// Comments as stored after the batch, in request order
    pub updated: Vec<comments::Model>,
    /// One audit event per updated comment, in the same order
    pub events: Vec<moderation_events::Model>,
}

impl BatchOutcome {
    pub fn succeeded_ids(&self) -> Vec<i32> {
        self.updated.iter().map(|c| c.id).collect()
    }
}

/// Drop repeated ids, keeping the first occurrence of each.
pub fn dedupe_ids(ids: &[i32]) -> Vec<i32> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

impl ModerationEngine {
    /// ApplyBatch: transition every listed comment or none of them.
    pub async fn apply_batch(
        &self,
        action: BatchAction,
        comment_ids: &[i32],
        actor_id: i32,
    ) -> Result<BatchOutcome, ModerationError> {
        let ids = dedupe_ids(comment_ids);

        if ids.is_empty() {
            return Err(ModerationError::InvalidInput(
                "At least one comment id is required".to_string(),
            ));
        }
        if ids.len() > self.config().max_batch_size {
            return Err(ModerationError::InvalidInput(format!(
                "A batch may contain at most {} comments",
                self.config().max_batch_size
            )));
        }

        let txn = self.db().begin().await?;

        // Read through the transaction so a role revoked before commit is seen.
        // An actor without the capability is refused whatever the comments look like.
        let capabilities = self
            .require_capability_on(
                &txn,
                actor_id,
                Capability::Moderate,
                action.transition().as_str(),
            )
            .await?;

        let now = chrono::Utc::now().naive_utc();
        let transition = Transition::moderate(action, actor_id, capabilities, now);

        let loaded: HashMap<i32, comments::Model> = comments::Entity::find()
            .filter(comments::Column::Id.is_in(ids.clone()))
            .all(&txn)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut planned = Vec::with_capacity(ids.len());
        let mut failures = Vec::new();

        for id in &ids {
            let comment = match loaded.get(id) {
                Some(comment) => comment,
                None => {
                    failures.push(BatchItemFailure {
                        comment_id: *id,
                        failure: ItemFailure::NotFound,
                    });
                    continue;
                }
            };

            match planned_change(comment, &transition) {
                Ok(next) => planned.push((comment, next)),
                Err(failure) => failures.push(BatchItemFailure {
                    comment_id: *id,
                    failure,
                }),
            }
        }

        if !failures.is_empty() {
            txn.rollback().await?;
            log::warn!(
                "Actor {} batch {} rejected: {} of {} comment(s) failed",
                actor_id,
                action,
                failures.len(),
                ids.len()
            );
            return Err(ModerationError::BatchFailure(failures));
        }

        let (updated, events) = commit_batch(txn, &transition, planned).await?;

        log::info!(
            "Actor {} applied {} to comments {:?}",
            actor_id,
            action,
            ids
        );

        if action == BatchAction::Hide {
            for comment in &updated {
                self.notify(notifications::comment_hidden(
                    comment.author_id,
                    comment.id,
                    actor_id,
                ));
            }
        }

        Ok(BatchOutcome {
            action,
            updated,
            events,
        })
    }

    /// Flag: report a comment for review.
    ///
    /// Open to any existing actor. Flagging a comment that is already flagged
    /// or hidden returns it unchanged, keeping the first reason.
    pub async fn flag(
        &self,
        comment_id: i32,
        actor_id: i32,
        reason: &str,
    ) -> Result<comments::Model, ModerationError> {
        let reason = self.validate_reason(reason)?;
        find_actor(self.db(), actor_id).await?;

        let now = chrono::Utc::now().naive_utc();
        let transition = Transition::flag(actor_id, &reason, now);

        let txn = self.db().begin().await?;
        let comment = find_comment(&txn, comment_id).await?;

        let next = match state::apply(&comment, &transition)? {
            Outcome::Changed(next) => next,
            Outcome::Unchanged => {
                txn.rollback().await?;
                log::debug!(
                    "Comment {} already {}, flag by actor {} ignored",
                    comment_id,
                    comment.state,
                    actor_id
                );
                return Ok(comment);
            }
        };

        commit_flag(txn, &comment, next, actor_id).await
    }
}

/// The change a moderator transition makes to one batch member.
///
/// A transition that would leave the comment as it is counts as illegal.
fn planned_change(
    comment: &comments::Model,
    transition: &Transition,
) -> Result<comments::Model, ItemFailure> {
    member_change(comment, transition, state::apply(comment, transition))
}

fn member_change(
    comment: &comments::Model,
    transition: &Transition,
    outcome: Result<Outcome, PolicyViolation>,
) -> Result<comments::Model, ItemFailure> {
    match outcome {
        Ok(Outcome::Changed(next)) => Ok(next),
        Ok(Outcome::Unchanged) => Err(ItemFailure::Rejected {
            violation: PolicyViolation::IllegalTransition {
                action: transition.kind,
                from: comment.state,
            },
        }),
        Err(violation) => Err(ItemFailure::Rejected { violation }),
    }
}

/// Swap every planned change in, record one event per comment and commit.
///
/// A lost swap rolls back everything written so far and names that comment.
async fn commit_batch(
    txn: DatabaseTransaction,
    transition: &Transition,
    planned: Vec<(&comments::Model, comments::Model)>,
) -> Result<(Vec<comments::Model>, Vec<moderation_events::Model>), ModerationError> {
    let mut updated = Vec::with_capacity(planned.len());
    let mut events = Vec::with_capacity(planned.len());

    for (current, next) in planned {
        if !swap_comment(&txn, current, &next).await? {
            txn.rollback().await?;
            log::warn!(
                "Actor {} batch {} lost a race on comment {}",
                transition.actor_id,
                transition.kind,
                current.id
            );
            return Err(ModerationError::BatchFailure(vec![BatchItemFailure {
                comment_id: current.id,
                failure: ItemFailure::StateChanged {
                    expected: current.state,
                },
            }]));
        }

        let event = moderation_events::ActiveModel {
            comment_id: Set(next.id),
            kind: Set(transition.kind),
            actor_id: Set(transition.actor_id),
            resulting_state: Set(next.state),
            created_at: Set(transition.at),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        updated.push(next);
        events.push(event);
    }

    txn.commit().await?;

    Ok((updated, events))
}

/// Persist a flag. If another writer got there first, report what is stored now.
async fn commit_flag(
    txn: DatabaseTransaction,
    comment: &comments::Model,
    next: comments::Model,
    actor_id: i32,
) -> Result<comments::Model, ModerationError> {
    if !swap_comment(&txn, comment, &next).await? {
        let current = find_comment(&txn, comment.id).await?;
        txn.rollback().await?;
        log::debug!(
            "Comment {} changed during flag by actor {}, now {}",
            comment.id,
            actor_id,
            current.state
        );
        return Ok(current);
    }

    txn.commit().await?;

    log::info!("Actor {} flagged comment {}", actor_id, comment.id);

    Ok(next)
}

/// Write `next` over `current` only if the stored state still matches.
///
/// Returns false when another writer got there first.
async fn swap_comment(
    txn: &DatabaseTransaction,
    current: &comments::Model,
    next: &comments::Model,
) -> Result<bool, DbErr> {
    let result = comments::Entity::update_many()
        .col_expr(comments::Column::State, Expr::value(next.state.to_value()))
        .col_expr(
            comments::Column::FlagReason,
            Expr::value(next.flag_reason.clone()),
        )
        .col_expr(comments::Column::FlaggedBy, Expr::value(next.flagged_by))
        .col_expr(comments::Column::FlaggedAt, Expr::value(next.flagged_at))
        .col_expr(comments::Column::HiddenBy, Expr::value(next.hidden_by))
        .col_expr(comments::Column::HiddenAt, Expr::value(next.hidden_at))
        .filter(comments::Column::Id.eq(current.id))
        .filter(comments::Column::State.eq(current.state.to_value()))
        .exec(txn)
        .await?;

    Ok(result.rows_affected == 1)
}
