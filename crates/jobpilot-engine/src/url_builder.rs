//! Search URL construction.
//!
//! Every multi-valued dimension is joined with commas into one query
//! parameter. The platform's "unlimited" option code is `"0"`; dimensions
//! set to it (or left empty) are omitted entirely, which is how the site
//! itself encodes an unconstrained search.

use crate::error::{EngineError, Result};
use crate::selectors::SITE_ORIGIN;
use jobpilot_core::SearchConfig;
use url::Url;

/// Option code meaning "no constraint".
const UNLIMITED: &str = "0";

/// Build the recommendation-list URL for one keyword and city.
///
/// # Errors
/// Returns `EngineError::Parse` if the origin fails to parse, which would
/// mean a broken build.
pub fn build_search_url(config: &SearchConfig, keyword: &str, city: &str) -> Result<String> {
    let mut url = Url::parse(SITE_ORIGIN)
        .map_err(|e| EngineError::Parse(format!("bad site origin: {e}")))?;
    url.set_path("/web/geek/job");

    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("query", keyword);
        if city != UNLIMITED && !city.is_empty() {
            pairs.append_pair("city", city);
        }

        append_dimension(&mut pairs, "experience", &config.experience);
        append_dimension(&mut pairs, "degree", &config.degree);
        append_dimension(&mut pairs, "salary", &config.salary);
        append_dimension(&mut pairs, "scale", &config.scale);
        append_dimension(&mut pairs, "stage", &config.stage);
        append_dimension(&mut pairs, "industry", &config.industry);

        if !config.job_type.is_empty() && config.job_type != UNLIMITED {
            pairs.append_pair("jobType", &config.job_type);
        }
    }

    Ok(url.to_string())
}

fn append_dimension(
    pairs: &mut url::form_urlencoded::Serializer<'_, url::UrlQuery<'_>>,
    name: &str,
    codes: &[String],
) {
    let kept: Vec<&str> = codes
        .iter()
        .map(String::as_str)
        .filter(|c| !c.is_empty() && *c != UNLIMITED)
        .collect();

    if !kept.is_empty() {
        pairs.append_pair(name, &kept.join(","));
    }
}
