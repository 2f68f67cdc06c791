//! Shared domain types used across the JobPilot application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Recruiting platform a session belongs to.
///
/// Only Boss is automated today; the enum exists so session state, cookies
/// and progress reports stay keyed per platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Boss Zhipin (zhipin.com)
    Boss,
    /// Zhilian Zhaopin
    Zhilian,
}

impl Platform {
    /// Stable string key used in the database and in progress reports.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boss => "boss",
            Self::Zhilian => "zhilian",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Composite identity of a job listing.
///
/// Both halves are opaque encrypted tokens issued by the platform; together
/// they uniquely identify a (listing, recruiter) pair and key every upsert.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobIdentity {
    /// Encrypted listing identifier.
    pub encrypt_job_id: String,
    /// Encrypted recruiter identifier.
    pub encrypt_recruiter_id: String,
}

impl JobIdentity {
    /// Create a new identity from the two encrypted tokens.
    #[must_use]
    pub fn new(encrypt_job_id: impl Into<String>, encrypt_recruiter_id: impl Into<String>) -> Self {
        Self {
            encrypt_job_id: encrypt_job_id.into(),
            encrypt_recruiter_id: encrypt_recruiter_id.into(),
        }
    }
}

impl fmt::Display for JobIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.encrypt_job_id, self.encrypt_recruiter_id)
    }
}

/// Delivery state of a stored job listing.
///
/// The status only ever advances from `NotDelivered` to one of the terminal
/// states; it never regresses once terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryStatus {
    /// Discovered but not yet contacted.
    NotDelivered,
    /// Greeting sent successfully.
    Delivered,
    /// Rejected by the filter pipeline.
    Filtered,
    /// Delivery was attempted and aborted.
    Failed,
}

impl DeliveryStatus {
    /// Whether this status is terminal (no further transitions allowed).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::NotDelivered)
    }

    /// Parse from the string representation stored in the database.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "Delivered" => Self::Delivered,
            "Filtered" => Self::Filtered,
            "Failed" => Self::Failed,
            _ => Self::NotDelivered,
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotDelivered => "NotDelivered",
            Self::Delivered => "Delivered",
            Self::Filtered => "Filtered",
            Self::Failed => "Failed",
        };
        write!(f, "{s}")
    }
}

/// Structured detail of one discovered job listing.
///
/// Field set mirrors what the platform's detail response exposes; everything
/// except the identity is best-effort and may be empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Composite listing identity.
    pub identity: JobIdentity,
    /// Job title.
    pub title: String,
    /// Company name.
    pub company: String,
    /// Raw salary text as displayed (e.g. "15-25K·13薪").
    pub salary: String,
    /// City / district text.
    pub location: String,
    /// Required experience text.
    pub experience: String,
    /// Required degree text.
    pub degree: String,
    /// Recruiter display name.
    pub recruiter_name: String,
    /// Recruiter title (e.g. "HR", "猎头顾问").
    pub recruiter_title: String,
    /// Recruiter activity descriptor (e.g. "刚刚活跃", "半年前活跃").
    pub recruiter_activity: String,
    /// Full job description text.
    pub description: String,
    /// Current delivery state.
    pub status: DeliveryStatus,
}

impl JobRecord {
    /// Short human-readable context string for logs and progress reports.
    #[must_use]
    pub fn context(&self) -> String {
        format!("{} / {}", self.company, self.title)
    }
}

/// Outcome of one delivery attempt, persisted for auditing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    /// Identity of the listing the attempt targeted.
    pub identity: JobIdentity,
    /// When the attempt finished.
    pub timestamp: DateTime<Utc>,
    /// Resulting status (`Delivered` or `Failed`).
    pub status: DeliveryStatus,
    /// The greeting message that was sent (empty on failure).
    pub message: String,
    /// Whether an image resume was attached.
    pub attachment_sent: bool,
}
