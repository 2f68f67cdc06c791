//! Salary text parsing.
//!
//! Listing salaries come as free text in a handful of shapes: monthly
//! ranges (`15-25K`), single values (`20K`), a months-per-year suffix
//! (`·13薪`), and day rates (`300元/天`). "面议" (negotiable) and anything
//! else unrecognized parse to nothing.

use once_cell::sync::Lazy;
use regex::Regex;

/// Working days per month used to normalize day rates.
const WORKDAYS_PER_MONTH: f64 = 21.75;

static MONTHS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[·\.\-]?([0-9]+)薪").expect("months regex"));
static RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)-([0-9]+)[Kk]").expect("range regex"));
static SINGLE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^([0-9]+)[Kk]").expect("single regex"));
static DAILY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)元/天").expect("daily regex"));

/// A normalized monthly salary band in K-units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedSalary {
    /// Lower bound, in thousands per month.
    pub min_k: f64,
    /// Upper bound, in thousands per month.
    pub max_k: f64,
    /// Salary months per year (12 unless the listing says otherwise).
    pub months: u32,
}

impl ParsedSalary {
    /// Whether this band overlaps the expected `[min, max]` range.
    #[must_use]
    pub fn matches_expectation(&self, expected: (u32, u32)) -> bool {
        let (min, max) = expected;
        self.max_k >= f64::from(min) && self.min_k <= f64::from(max)
    }
}

/// Parse a salary descriptor. Returns `None` for negotiable or
/// unrecognized text.
#[must_use]
pub fn parse_salary(text: &str) -> Option<ParsedSalary> {
    let text = text.trim();
    if text.is_empty() || text.contains("面议") {
        return None;
    }

    let months = MONTHS_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(12);

    if let Some(caps) = RANGE_RE.captures(text) {
        let min_k: f64 = caps.get(1)?.as_str().parse().ok()?;
        let max_k: f64 = caps.get(2)?.as_str().parse().ok()?;
        return Some(ParsedSalary { min_k, max_k, months });
    }

    if let Some(caps) = DAILY_RE.captures(text) {
        let per_day: f64 = caps.get(1)?.as_str().parse().ok()?;
        let monthly_k = per_day * WORKDAYS_PER_MONTH / 1000.0;
        return Some(ParsedSalary {
            min_k: monthly_k,
            max_k: monthly_k,
            months,
        });
    }

    if let Some(caps) = SINGLE_RE.captures(text) {
        let k: f64 = caps.get(1)?.as_str().parse().ok()?;
        return Some(ParsedSalary {
            min_k: k,
            max_k: k,
            months,
        });
    }

    None
}
