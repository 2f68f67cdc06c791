//! Blacklist entry storage.
//!
//! Each entry is a substring pattern scoped to one of three kinds. Matching
//! semantics live in the filter engine; this module only persists the sets.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Sqlite};

/// Which field of a candidate a blacklist pattern applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlacklistKind {
    /// Matches against the company name.
    Company,
    /// Matches against the job title.
    Job,
    /// Matches against the recruiter's title.
    Recruiter,
}

impl BlacklistKind {
    /// Storage representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Company => "company",
            Self::Job => "job",
            Self::Recruiter => "recruiter",
        }
    }
}

/// Add a pattern to a blacklist. Adding an existing pattern is a no-op.
///
/// # Errors
/// Returns `sqlx::Error` if the database write fails.
pub async fn add_entry(
    pool: &Pool<Sqlite>,
    kind: BlacklistKind,
    pattern: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO blacklist_entries (kind, pattern, created_at) VALUES (?, ?, ?)
         ON CONFLICT (kind, pattern) DO NOTHING",
    )
    .bind(kind.as_str())
    .bind(pattern)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Remove a pattern from a blacklist.
///
/// Returns `true` if an entry was removed.
///
/// # Errors
/// Returns `sqlx::Error` if the database delete fails.
pub async fn remove_entry(
    pool: &Pool<Sqlite>,
    kind: BlacklistKind,
    pattern: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM blacklist_entries WHERE kind = ? AND pattern = ?")
        .bind(kind.as_str())
        .bind(pattern)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// All patterns of one kind, in insertion order.
///
/// # Errors
/// Returns `sqlx::Error` if the database query fails.
pub async fn list_entries(
    pool: &Pool<Sqlite>,
    kind: BlacklistKind,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar("SELECT pattern FROM blacklist_entries WHERE kind = ? ORDER BY id")
        .bind(kind.as_str())
        .fetch_all(pool)
        .await
}
