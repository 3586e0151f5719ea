//! Application-wide constants
//!
//! Defaults used when no configuration overrides them.

/// Roles whose holders may moderate and ban.
/// No hierarchy: holding any one of these is enough.
pub const DEFAULT_MODERATOR_ROLES: &[&str] = &["super_admin", "school_admin"];

/// Header carrying the actor id established by the upstream identity provider
pub const DEFAULT_IDENTITY_HEADER: &str = "X-Actor-Id";

/// Maximum number of comment ids accepted in one batch action
pub const DEFAULT_MAX_BATCH_SIZE: usize = 200;

/// Maximum length for flag and ban reasons in characters
pub const DEFAULT_MAX_REASON_LENGTH: usize = 500;

/// Number of comments returned by one moderation queue listing
pub const DEFAULT_QUEUE_LIMIT: u64 = 100;

/// Number of offenders returned when the caller does not ask for a limit
pub const DEFAULT_OFFENDER_LIMIT: u64 = 10;

/// Length of a ban in days when the moderator does not pick one
pub const DEFAULT_BAN_DURATION_DAYS: i64 = 7;

/// Upper bound for a ban length in days
pub const MAX_BAN_DURATION_DAYS: i64 = 365;
