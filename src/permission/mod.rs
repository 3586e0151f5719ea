//! Role resolution and capability checks
//!
//! Roles are an unordered set per actor with no hierarchy. A capability is the
//! logical OR of a fixed allow-list of roles. Capabilities are looked up from
//! the store on every call; nothing here is cached between requests.

use crate::orm::{actors, role_assignments};
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};
use serde::{Deserialize, Serialize};

/// A single boolean permission derived from role assignments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Hide, restore and dismiss comments; read the moderation queue
    Moderate,
    /// Issue bans
    Ban,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Moderate => "moderate",
            Self::Ban => "ban",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability set of one actor at the time of the lookup.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub can_moderate: bool,
    /// Same roles as `can_moderate` today, kept separate so call sites can
    /// diverge later without changing shape.
    pub can_ban: bool,
}

impl Capabilities {
    /// No capabilities. Returned for unknown actors.
    pub fn none() -> Self {
        Self::default()
    }

    /// Derive capabilities from the roles an actor holds.
    pub fn from_roles<I, S>(roles: I, moderator_roles: &[String]) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let is_moderator = roles
            .into_iter()
            .any(|role| moderator_roles.iter().any(|m| m == role.as_ref()));

        Self {
            can_moderate: is_moderator,
            can_ban: is_moderator,
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        match capability {
            Capability::Moderate => self.can_moderate,
            Capability::Ban => self.can_ban,
        }
    }
}

/// Load the role names assigned to an actor.
pub async fn roles_for<C>(db: &C, actor_id: i32) -> Result<Vec<String>, DbErr>
where
    C: ConnectionTrait,
{
    let assignments = role_assignments::Entity::find()
        .filter(role_assignments::Column::ActorId.eq(actor_id))
        .all(db)
        .await?;

    Ok(assignments.into_iter().map(|a| a.role).collect())
}

/// Resolve the capabilities of an actor.
///
/// Unknown actors get no capabilities rather than an error.
pub async fn capabilities_for<C>(
    db: &C,
    actor_id: i32,
    moderator_roles: &[String],
) -> Result<Capabilities, DbErr>
where
    C: ConnectionTrait,
{
    if actors::Entity::find_by_id(actor_id).one(db).await?.is_none() {
        log::debug!("Capability lookup for unknown actor {}", actor_id);
        return Ok(Capabilities::none());
    }

    let roles = roles_for(db, actor_id).await?;
    let capabilities = Capabilities::from_roles(&roles, moderator_roles);

    log::debug!(
        "Actor {} holds roles {:?} -> {:?}",
        actor_id,
        roles,
        capabilities
    );

    Ok(capabilities)
}
