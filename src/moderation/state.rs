//! Comment lifecycle state machine
//!
//! ```text
//!            flag                hide
//!   Active ---------> Flagged ---------> Hidden
//!     ^  \              |                  |
//!     |   \  dismiss    |                  |
//!     |    `------------'                  |
//!     |              hide                  |
//!     |   `------------------------------> |
//!     |               restore              |
//!     `------------------------------------'
//! ```
//!
//! Flagging is open to any authenticated actor and is a no-op on a comment that
//! is already flagged or hidden. Every transition that changes visibility
//! requires the moderate capability. Everything here is pure; persistence lives
//! in the batch executor.

use crate::orm::comments::{self, CommentState};
use crate::orm::moderation_events::TransitionKind;
use crate::permission::{Capabilities, Capability};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Actions a moderator may apply to a batch of comments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchAction {
    Hide,
    Restore,
    Dismiss,
}

impl BatchAction {
    pub fn transition(&self) -> TransitionKind {
        match self {
            Self::Hide => TransitionKind::Hide,
            Self::Restore => TransitionKind::Restore,
            Self::Dismiss => TransitionKind::Dismiss,
        }
    }
}

impl std::fmt::Display for BatchAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.transition().as_str())
    }
}

/// Why an action was refused.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "violation", rename_all = "snake_case")]
pub enum PolicyViolation {
    /// The actor lacks the capability the operation requires
    MissingCapability {
        operation: String,
        required: Capability,
    },
    /// The action is not legal from the comment's current state
    IllegalTransition {
        action: TransitionKind,
        from: CommentState,
    },
    /// A moderator tried to ban themself
    SelfBan,
}

impl std::fmt::Display for PolicyViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyViolation::MissingCapability {
                operation,
                required,
            } => write!(f, "{} requires the {} capability", operation, required),
            PolicyViolation::IllegalTransition { action, from } => {
                write!(f, "cannot {} a comment that is {}", action, from)
            }
            PolicyViolation::SelfBan => write!(f, "moderators cannot ban themselves"),
        }
    }
}

/// Capability a transition requires, if any.
pub fn required_capability(kind: TransitionKind) -> Option<Capability> {
    match kind {
        TransitionKind::Flag => None,
        TransitionKind::Hide | TransitionKind::Restore | TransitionKind::Dismiss => {
            Some(Capability::Moderate)
        }
    }
}

pub fn check_capability(
    kind: TransitionKind,
    capabilities: Capabilities,
) -> Result<(), PolicyViolation> {
    match required_capability(kind) {
        Some(required) if !capabilities.has(required) => Err(PolicyViolation::MissingCapability {
            operation: kind.as_str().to_string(),
            required,
        }),
        _ => Ok(()),
    }
}

/// State a comment moves to, or `None` when the action is an idempotent no-op.
pub fn target_state(
    from: CommentState,
    kind: TransitionKind,
) -> Result<Option<CommentState>, PolicyViolation> {
    use CommentState::*;
    use TransitionKind as T;

    match (from, kind) {
        (Active, T::Flag) => Ok(Some(Flagged)),
        (Flagged | Hidden, T::Flag) => Ok(None),
        (Active | Flagged, T::Hide) => Ok(Some(Hidden)),
        (Flagged, T::Dismiss) => Ok(Some(Active)),
        (Hidden, T::Restore) => Ok(Some(Active)),
        (from, action) => Err(PolicyViolation::IllegalTransition { action, from }),
    }
}

/// A requested transition together with who asks for it and when.
#[derive(Clone, Debug)]
pub struct Transition {
    pub kind: TransitionKind,
    pub actor_id: i32,
    pub capabilities: Capabilities,
    pub at: NaiveDateTime,
    reason: Option<String>,
}

impl Transition {
    /// A flag raised by any authenticated actor.
    pub fn flag(actor_id: i32, reason: &str, at: NaiveDateTime) -> Self {
        Self {
            kind: TransitionKind::Flag,
            actor_id,
            capabilities: Capabilities::none(),
            at,
            reason: Some(reason.to_string()),
        }
    }

    /// A moderator action from a batch.
    pub fn moderate(
        action: BatchAction,
        actor_id: i32,
        capabilities: Capabilities,
        at: NaiveDateTime,
    ) -> Self {
        Self {
            kind: action.transition(),
            actor_id,
            capabilities,
            at,
            reason: None,
        }
    }
}

/// Result of applying a transition to one comment.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    Changed(comments::Model),
    Unchanged,
}

/// Apply a transition to a comment, returning the comment as it should be stored.
///
/// The capability guard is evaluated before the state guard, so an actor
/// without capability is refused whatever the comment's state.
pub fn apply(comment: &comments::Model, transition: &Transition) -> Result<Outcome, PolicyViolation> {
    check_capability(transition.kind, transition.capabilities)?;

    let next_state = match target_state(comment.state, transition.kind)? {
        Some(state) => state,
        None => return Ok(Outcome::Unchanged),
    };

    let mut next = comment.clone();
    next.state = next_state;

    match transition.kind {
        TransitionKind::Flag => {
            next.flag_reason = Some(transition.reason.clone().unwrap_or_default());
            next.flagged_by = Some(transition.actor_id);
            next.flagged_at = Some(transition.at);
        }
        TransitionKind::Hide => {
            next.hidden_by = Some(transition.actor_id);
            next.hidden_at = Some(transition.at);
        }
        TransitionKind::Dismiss => clear_flag(&mut next),
        TransitionKind::Restore => {
            clear_flag(&mut next);
            next.hidden_by = None;
            next.hidden_at = None;
        }
    }

    debug_assert!(metadata_consistent(&next));

    Ok(Outcome::Changed(next))
}

fn clear_flag(comment: &mut comments::Model) {
    comment.flag_reason = None;
    comment.flagged_by = None;
    comment.flagged_at = None;
}

/// Hide metadata is present iff the comment is hidden, and each metadata
/// group is either fully present or fully absent.
pub fn metadata_consistent(comment: &comments::Model) -> bool {
    let flag_fields = [
        comment.flag_reason.is_some(),
        comment.flagged_by.is_some(),
        comment.flagged_at.is_some(),
    ];
    let flag_whole = flag_fields.iter().all(|f| *f) || flag_fields.iter().all(|f| !*f);

    let hide_whole = comment.hidden_by.is_some() == comment.hidden_at.is_some();
    let hide_matches_state = comment.has_hide_metadata() == (comment.state == CommentState::Hidden);
    let flagged_has_flag = comment.state != CommentState::Flagged || comment.has_flag_metadata();

    flag_whole && hide_whole && hide_matches_state && flagged_has_flag
}
