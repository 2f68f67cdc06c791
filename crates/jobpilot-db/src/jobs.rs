//! Job record operations.
//!
//! Discovered listings are keyed by the `(encrypt_job_id,
//! encrypt_recruiter_id)` pair: the same listing seen again is an update of
//! descriptive fields, never a second row. Delivery status only ever moves
//! from `NotDelivered` to a terminal state; the guard lives in the SQL so
//! concurrent writers cannot regress it.

use chrono::Utc;
use jobpilot_core::{DeliveryOutcome, DeliveryStatus, JobIdentity, JobRecord, Platform};
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Row, Sqlite};

/// Insert a discovered job, or refresh its descriptive fields if the
/// identity pair is already known.
///
/// Returns `true` if the row was newly inserted.
///
/// # Errors
/// Returns `sqlx::Error` if the database write fails.
pub async fn upsert_job(
    pool: &Pool<Sqlite>,
    platform: Platform,
    record: &JobRecord,
) -> Result<bool, sqlx::Error> {
    let existed = job_exists(pool, &record.identity).await?;
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO jobs (platform, encrypt_job_id, encrypt_recruiter_id, title, company,
                           salary, location, experience, degree, recruiter_name,
                           recruiter_title, recruiter_activity, description,
                           delivery_status, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
         ON CONFLICT (encrypt_job_id, encrypt_recruiter_id) DO UPDATE SET
             title = excluded.title,
             company = excluded.company,
             salary = excluded.salary,
             location = excluded.location,
             experience = excluded.experience,
             degree = excluded.degree,
             recruiter_name = excluded.recruiter_name,
             recruiter_title = excluded.recruiter_title,
             recruiter_activity = excluded.recruiter_activity,
             description = excluded.description,
             updated_at = excluded.updated_at",
    )
    .bind(platform.as_str())
    .bind(&record.identity.encrypt_job_id)
    .bind(&record.identity.encrypt_recruiter_id)
    .bind(&record.title)
    .bind(&record.company)
    .bind(&record.salary)
    .bind(&record.location)
    .bind(&record.experience)
    .bind(&record.degree)
    .bind(&record.recruiter_name)
    .bind(&record.recruiter_title)
    .bind(&record.recruiter_activity)
    .bind(&record.description)
    .bind(record.status.to_string())
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(!existed)
}

/// Whether a job with this identity pair is already stored.
///
/// # Errors
/// Returns `sqlx::Error` if the database query fails.
pub async fn job_exists(pool: &Pool<Sqlite>, identity: &JobIdentity) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM jobs WHERE encrypt_job_id = ? AND encrypt_recruiter_id = ?",
    )
    .bind(&identity.encrypt_job_id)
    .bind(&identity.encrypt_recruiter_id)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Fetch a stored job by its identity pair.
///
/// # Errors
/// Returns `sqlx::Error` if the database query fails.
pub async fn get_job(
    pool: &Pool<Sqlite>,
    identity: &JobIdentity,
) -> Result<Option<JobRecord>, sqlx::Error> {
    let row = sqlx::query(
        "SELECT encrypt_job_id, encrypt_recruiter_id, title, company, salary, location,
                experience, degree, recruiter_name, recruiter_title, recruiter_activity,
                description, delivery_status
         FROM jobs WHERE encrypt_job_id = ? AND encrypt_recruiter_id = ?",
    )
    .bind(&identity.encrypt_job_id)
    .bind(&identity.encrypt_recruiter_id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| parse_job_row(&r)).transpose()
}

/// Move a job's delivery status from `NotDelivered` to a terminal state.
///
/// Returns `true` if the transition happened; `false` means the job was
/// missing or already in a terminal state. Terminal states never change.
///
/// # Errors
/// Returns `sqlx::Error` if the database update fails.
pub async fn update_delivery_status(
    pool: &Pool<Sqlite>,
    identity: &JobIdentity,
    status: DeliveryStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE jobs SET delivery_status = ?, updated_at = ?
         WHERE encrypt_job_id = ? AND encrypt_recruiter_id = ?
           AND delivery_status = ?",
    )
    .bind(status.to_string())
    .bind(Utc::now().to_rfc3339())
    .bind(&identity.encrypt_job_id)
    .bind(&identity.encrypt_recruiter_id)
    .bind(DeliveryStatus::NotDelivered.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Record one delivery attempt and apply its status to the job row.
///
/// # Errors
/// Returns `sqlx::Error` if either write fails.
pub async fn record_outcome(
    pool: &Pool<Sqlite>,
    outcome: &DeliveryOutcome,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO deliveries (encrypt_job_id, encrypt_recruiter_id, status, message,
                                 attachment_sent, attempted_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&outcome.identity.encrypt_job_id)
    .bind(&outcome.identity.encrypt_recruiter_id)
    .bind(outcome.status.to_string())
    .bind(&outcome.message)
    .bind(outcome.attachment_sent)
    .bind(outcome.timestamp.to_rfc3339())
    .execute(pool)
    .await?;

    update_delivery_status(pool, &outcome.identity, outcome.status).await?;

    Ok(())
}

/// One page of stored jobs, newest first.
///
/// # Errors
/// Returns `sqlx::Error` if the database query fails.
pub async fn list_page(
    pool: &Pool<Sqlite>,
    limit: u32,
    offset: u32,
) -> Result<Vec<JobRecord>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT encrypt_job_id, encrypt_recruiter_id, title, company, salary, location,
                experience, degree, recruiter_name, recruiter_title, recruiter_activity,
                description, delivery_status
         FROM jobs ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(parse_job_row).collect()
}

/// Aggregate delivery counters across all stored jobs.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DeliveryStats {
    /// Total stored jobs.
    pub total: i64,
    /// Jobs with status `Delivered`.
    pub delivered: i64,
    /// Jobs with status `Filtered`.
    pub filtered: i64,
    /// Jobs with status `Failed`.
    pub failed: i64,
    /// Jobs still awaiting delivery.
    pub not_delivered: i64,
}

/// Compute delivery counters in one pass over the jobs table.
///
/// # Errors
/// Returns `sqlx::Error` if the database query fails.
pub async fn delivery_stats(pool: &Pool<Sqlite>) -> Result<DeliveryStats, sqlx::Error> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS total,
                SUM(delivery_status = 'Delivered') AS delivered,
                SUM(delivery_status = 'Filtered') AS filtered,
                SUM(delivery_status = 'Failed') AS failed,
                SUM(delivery_status = 'NotDelivered') AS not_delivered
         FROM jobs",
    )
    .fetch_one(pool)
    .await?;

    Ok(DeliveryStats {
        total: row.try_get("total")?,
        delivered: row.try_get::<Option<i64>, _>("delivered")?.unwrap_or(0),
        filtered: row.try_get::<Option<i64>, _>("filtered")?.unwrap_or(0),
        failed: row.try_get::<Option<i64>, _>("failed")?.unwrap_or(0),
        not_delivered: row
            .try_get::<Option<i64>, _>("not_delivered")?
            .unwrap_or(0),
    })
}

fn parse_job_row(row: &sqlx::sqlite::SqliteRow) -> Result<JobRecord, sqlx::Error> {
    let status_str: String = row.try_get("delivery_status")?;

    Ok(JobRecord {
        identity: JobIdentity::new(
            row.try_get::<String, _>("encrypt_job_id")?,
            row.try_get::<String, _>("encrypt_recruiter_id")?,
        ),
        title: row.try_get("title")?,
        company: row.try_get("company")?,
        salary: row.try_get("salary")?,
        location: row.try_get("location")?,
        experience: row.try_get("experience")?,
        degree: row.try_get("degree")?,
        recruiter_name: row.try_get("recruiter_name")?,
        recruiter_title: row.try_get("recruiter_title")?,
        recruiter_activity: row.try_get("recruiter_activity")?,
        description: row.try_get("description")?,
        status: DeliveryStatus::parse(&status_str),
    })
}
