//! Search configuration persistence.
//!
//! One row per platform holding the serialized `SearchConfig`, so edits made
//! through the control surface survive restarts independently of the config
//! file on disk.

use crate::error::{DatabaseError, Result};
use chrono::Utc;
use jobpilot_core::{Platform, SearchConfig};
use sqlx::{Pool, Sqlite};

/// Save (or replace) the search configuration for a platform.
///
/// # Errors
/// Returns `DatabaseError` if serialization or the database write fails.
pub async fn save_search_config(
    pool: &Pool<Sqlite>,
    platform: Platform,
    config: &SearchConfig,
) -> Result<()> {
    let serialized = serde_json::to_string(config)
        .map_err(|e| DatabaseError::Decode(format!("failed to serialize search config: {e}")))?;

    sqlx::query(
        "INSERT INTO search_configs (platform, config, updated_at) VALUES (?, ?, ?)
         ON CONFLICT (platform) DO UPDATE SET
             config = excluded.config,
             updated_at = excluded.updated_at",
    )
    .bind(platform.as_str())
    .bind(&serialized)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the stored search configuration for a platform, if any.
///
/// # Errors
/// Returns `DatabaseError` if the query fails or the stored value does not
/// deserialize.
pub async fn load_search_config(
    pool: &Pool<Sqlite>,
    platform: Platform,
) -> Result<Option<SearchConfig>> {
    let row: Option<String> =
        sqlx::query_scalar("SELECT config FROM search_configs WHERE platform = ?")
            .bind(platform.as_str())
            .fetch_optional(pool)
            .await?;

    row.map(|serialized| {
        serde_json::from_str(&serialized)
            .map_err(|e| DatabaseError::Decode(format!("corrupt stored search config: {e}")))
    })
    .transpose()
}
