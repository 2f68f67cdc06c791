//! Session cookie persistence.
//!
//! One row per platform holding the JSON cookie snapshot captured after a
//! successful login, so the next run can restore the session without a
//! fresh scan-to-login.

use chrono::{DateTime, Utc};
use jobpilot_core::Platform;
use sqlx::{Pool, Row, Sqlite};

/// A persisted session snapshot.
#[derive(Debug, Clone)]
pub struct StoredSession {
    /// Platform the cookies belong to.
    pub platform: Platform,
    /// Cookie snapshot as a JSON array.
    pub cookies: String,
    /// When the snapshot was taken.
    pub saved_at: DateTime<Utc>,
}

/// Save (or replace) the cookie snapshot for a platform.
///
/// # Errors
/// Returns `sqlx::Error` if the database write fails.
pub async fn save_session(
    pool: &Pool<Sqlite>,
    platform: Platform,
    cookies: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO sessions (platform, cookies, saved_at) VALUES (?, ?, ?)
         ON CONFLICT (platform) DO UPDATE SET
             cookies = excluded.cookies,
             saved_at = excluded.saved_at",
    )
    .bind(platform.as_str())
    .bind(cookies)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load the stored session for a platform, if any.
///
/// # Errors
/// Returns `sqlx::Error` if the database query fails.
pub async fn load_session(
    pool: &Pool<Sqlite>,
    platform: Platform,
) -> Result<Option<StoredSession>, sqlx::Error> {
    let row = sqlx::query("SELECT cookies, saved_at FROM sessions WHERE platform = ?")
        .bind(platform.as_str())
        .fetch_optional(pool)
        .await?;

    row.map(|r| {
        let saved_at_str: String = r.try_get("saved_at")?;
        let saved_at = DateTime::parse_from_rfc3339(&saved_at_str)
            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc));
        Ok(StoredSession {
            platform,
            cookies: r.try_get("cookies")?,
            saved_at,
        })
    })
    .transpose()
}

/// Drop the stored session for a platform.
///
/// # Errors
/// Returns `sqlx::Error` if the database delete fails.
pub async fn clear_session(pool: &Pool<Sqlite>, platform: Platform) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM sessions WHERE platform = ?")
        .bind(platform.as_str())
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_save_load_roundtrip() {
        let db = Database::in_memory().await.expect("create database");

        assert!(load_session(db.pool(), Platform::Boss)
            .await
            .expect("load empty")
            .is_none());

        save_session(db.pool(), Platform::Boss, r#"[{"name":"wt2","value":"abc"}]"#)
            .await
            .expect("save");

        let session = load_session(db.pool(), Platform::Boss)
            .await
            .expect("load")
            .expect("session present");
        assert!(session.cookies.contains("wt2"));
    }

    #[tokio::test]
    async fn test_save_replaces_previous_snapshot() {
        let db = Database::in_memory().await.expect("create database");

        save_session(db.pool(), Platform::Boss, "[1]")
            .await
            .expect("save first");
        save_session(db.pool(), Platform::Boss, "[2]")
            .await
            .expect("save second");

        let session = load_session(db.pool(), Platform::Boss)
            .await
            .expect("load")
            .expect("session present");
        assert_eq!(session.cookies, "[2]");

        clear_session(db.pool(), Platform::Boss)
            .await
            .expect("clear");
        assert!(load_session(db.pool(), Platform::Boss)
            .await
            .expect("load cleared")
            .is_none());
    }
}
