//! Moderation queue read path

use super::ModerationEngine;
use crate::error::ModerationError;
use crate::orm::actors;
use crate::orm::comments::{self, CommentState};
use sea_orm::sea_query::{Expr, Func, IntoIden, SimpleExpr};
use sea_orm::{entity::*, query::*, ActiveEnum};
use serde::{Deserialize, Serialize};

/// Which comments the queue shows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueFilter {
    #[default]
    Flagged,
    Hidden,
    /// Flagged and hidden together
    All,
}

impl QueueFilter {
    pub fn states(&self) -> &'static [CommentState] {
        match self {
            Self::Flagged => &[CommentState::Flagged],
            Self::Hidden => &[CommentState::Hidden],
            Self::All => &[CommentState::Flagged, CommentState::Hidden],
        }
    }
}

impl std::str::FromStr for QueueFilter {
    type Err = ModerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flagged" => Ok(Self::Flagged),
            "hidden" => Ok(Self::Hidden),
            "all" => Ok(Self::All),
            other => Err(ModerationError::InvalidInput(format!(
                "Unknown queue status '{}'",
                other
            ))),
        }
    }
}

/// A queued comment with its author's display name.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QueueItem {
    #[serde(flatten)]
    pub comment: comments::Model,
    pub author_name: String,
}

/// LIKE pattern for a free-text search, or None when there is nothing to match.
///
/// The needle is lowercased and compared against lowercased columns so the
/// match is case-insensitive on every backend. `%` and `_` keep their LIKE meaning.
pub fn search_pattern(search: Option<&str>) -> Option<String> {
    let needle = search.map(str::trim).unwrap_or_default();
    if needle.is_empty() {
        return None;
    }

    Some(format!("%{}%", needle.to_lowercase()))
}

fn lower_like<T, C>(table: T, column: C, pattern: &str) -> SimpleExpr
where
    T: IntoIden + 'static,
    C: IntoIden + 'static,
{
    Expr::expr(Func::lower(Expr::col((table, column)))).like(pattern)
}

impl ModerationEngine {
    /// ListModerationQueue: comments awaiting or under moderation, newest first.
    ///
    /// Search covers content, flag reason and author name.
    pub async fn list_moderation_queue(
        &self,
        filter: QueueFilter,
        search: Option<&str>,
    ) -> Result<Vec<QueueItem>, ModerationError> {
        let states: Vec<String> = filter.states().iter().map(|s| s.to_value()).collect();
        let pattern = search_pattern(search);

        let mut query = comments::Entity::find()
            .filter(comments::Column::State.is_in(states))
            .find_also_related(actors::Entity);

        if let Some(pattern) = &pattern {
            query = query.filter(
                Condition::any()
                    .add(lower_like(comments::Entity, comments::Column::Content, pattern))
                    .add(lower_like(comments::Entity, comments::Column::FlagReason, pattern))
                    .add(lower_like(actors::Entity, actors::Column::DisplayName, pattern)),
            );
        }

        let items: Vec<QueueItem> = query
            .order_by_desc(comments::Column::CreatedAt)
            .order_by_desc(comments::Column::Id)
            .limit(self.config().queue_limit)
            .all(self.db())
            .await?
            .into_iter()
            .map(|(comment, author)| QueueItem {
                author_name: author.map(|a| a.display_name).unwrap_or_default(),
                comment,
            })
            .collect();

        log::debug!(
            "Queue {:?} (search {:?}): {} item(s)",
            filter,
            pattern,
            items.len()
        );

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_pattern_is_lowercased_and_wrapped() {
        assert_eq!(
            search_pattern(Some("  Cheap WATCHES ")),
            Some("%cheap watches%".to_string())
        );
    }

    #[test]
    fn test_blank_search_has_no_pattern() {
        assert_eq!(search_pattern(None), None);
        assert_eq!(search_pattern(Some("")), None);
        assert_eq!(search_pattern(Some("   ")), None);
    }

    #[test]
    fn test_filter_states() {
        assert_eq!(QueueFilter::Flagged.states(), &[CommentState::Flagged]);
        assert_eq!(QueueFilter::Hidden.states(), &[CommentState::Hidden]);
        assert_eq!(
            QueueFilter::All.states(),
            &[CommentState::Flagged, CommentState::Hidden]
        );
        assert_eq!(QueueFilter::default(), QueueFilter::Flagged);
    }

    #[test]
    fn test_filter_from_str() {
        assert_eq!("all".parse::<QueueFilter>().unwrap(), QueueFilter::All);
        assert!("active".parse::<QueueFilter>().is_err());
    }
}
