//! Candidate filtering.
//!
//! Checks run cheapest first and short-circuit on the first hit: job title
//! blacklist, company blacklist, recruiter blacklist, recruiter inactivity,
//! then salary. Blacklist matching is plain substring containment.

use crate::salary::parse_salary;
use jobpilot_core::{JobRecord, SearchConfig};
use jobpilot_db::blacklists::{self, BlacklistKind};
use sqlx::{Pool, Sqlite};
use std::fmt;

/// The three substring blacklists, loaded once per run.
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    company: Vec<String>,
    job: Vec<String>,
    recruiter: Vec<String>,
}

impl Blacklist {
    /// Load all blacklist entries from the database.
    ///
    /// # Errors
    /// Returns `sqlx::Error` if any of the three queries fails.
    pub async fn load(pool: &Pool<Sqlite>) -> Result<Self, sqlx::Error> {
        Ok(Self {
            company: blacklists::list_entries(pool, BlacklistKind::Company).await?,
            job: blacklists::list_entries(pool, BlacklistKind::Job).await?,
            recruiter: blacklists::list_entries(pool, BlacklistKind::Recruiter).await?,
        })
    }

    /// Build from in-memory pattern lists.
    #[must_use]
    pub fn from_patterns(
        job: Vec<String>,
        company: Vec<String>,
        recruiter: Vec<String>,
    ) -> Self {
        Self {
            company,
            job,
            recruiter,
        }
    }

    fn hit<'a>(patterns: &'a [String], text: &str) -> Option<&'a str> {
        patterns
            .iter()
            .find(|p| !p.is_empty() && text.contains(p.as_str()))
            .map(String::as_str)
    }
}

/// Why a candidate was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    /// Job title matched a blacklist pattern.
    JobBlacklist(String),
    /// Company name matched a blacklist pattern.
    CompanyBlacklist(String),
    /// Recruiter title matched a blacklist pattern.
    RecruiterBlacklist(String),
    /// Recruiter activity descriptor marks them as long-inactive.
    InactiveRecruiter,
    /// Listing salary band does not overlap the expected range, or the
    /// salary text is unreadable while a range is configured.
    SalaryMismatch,
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JobBlacklist(p) => write!(f, "job title matches blacklist entry '{p}'"),
            Self::CompanyBlacklist(p) => write!(f, "company matches blacklist entry '{p}'"),
            Self::RecruiterBlacklist(p) => {
                write!(f, "recruiter title matches blacklist entry '{p}'")
            }
            Self::InactiveRecruiter => write!(f, "recruiter looks long-inactive"),
            Self::SalaryMismatch => write!(f, "salary outside expected range"),
        }
    }
}

/// Verdict for one candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    /// Deliver to this candidate.
    Accept,
    /// Skip this candidate.
    Reject(RejectReason),
}

/// Applies the configured filters to extracted candidates.
#[derive(Debug, Clone)]
pub struct FilterEngine {
    blacklist: Blacklist,
    expected_salary: Option<(u32, u32)>,
    filter_inactive: bool,
    inactive_markers: Vec<String>,
}

impl FilterEngine {
    /// Build a filter engine from the run config and loaded blacklists.
    #[must_use]
    pub fn new(config: &SearchConfig, blacklist: Blacklist) -> Self {
        Self {
            blacklist,
            expected_salary: config.expected_range(),
            filter_inactive: config.filter_inactive_recruiter,
            inactive_markers: config.inactive_markers.clone(),
        }
    }

    /// Evaluate one candidate.
    #[must_use]
    pub fn evaluate(&self, job: &JobRecord) -> FilterDecision {
        if let Some(p) = Blacklist::hit(&self.blacklist.job, &job.title) {
            return FilterDecision::Reject(RejectReason::JobBlacklist(p.to_string()));
        }

        if let Some(p) = Blacklist::hit(&self.blacklist.company, &job.company) {
            return FilterDecision::Reject(RejectReason::CompanyBlacklist(p.to_string()));
        }

        if let Some(p) = Blacklist::hit(&self.blacklist.recruiter, &job.recruiter_title) {
            return FilterDecision::Reject(RejectReason::RecruiterBlacklist(p.to_string()));
        }

        if self.filter_inactive
            && self
                .inactive_markers
                .iter()
                .any(|m| !m.is_empty() && job.recruiter_activity.contains(m.as_str()))
        {
            return FilterDecision::Reject(RejectReason::InactiveRecruiter);
        }

        // Unreadable salary text with a configured range fails closed.
        if let Some(expected) = self.expected_salary {
            match parse_salary(&job.salary) {
                Some(parsed) if parsed.matches_expectation(expected) => {}
                _ => return FilterDecision::Reject(RejectReason::SalaryMismatch),
            }
        }

        FilterDecision::Accept
    }
}
