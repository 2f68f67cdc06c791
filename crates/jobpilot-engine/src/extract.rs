//! Candidate detail extraction.
//!
//! The detail endpoint answers with an envelope (`code`, `message`,
//! `zpData`); the interesting parts are the job, recruiter and company
//! blocks inside `zpData`. Anything outside those blocks is ignored.

use crate::error::{EngineError, Result};
use jobpilot_core::{DeliveryStatus, JobIdentity, JobRecord};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct DetailResponse {
    code: i64,
    message: Option<String>,
    #[serde(rename = "zpData")]
    zp_data: Option<ZpData>,
}

#[derive(Debug, Deserialize)]
struct ZpData {
    #[serde(rename = "jobInfo")]
    job_info: JobInfo,
    #[serde(rename = "bossInfo")]
    boss_info: Option<BossInfo>,
    #[serde(rename = "brandComInfo")]
    brand_com_info: Option<BrandComInfo>,
}

#[derive(Debug, Deserialize)]
struct JobInfo {
    #[serde(rename = "encryptId")]
    encrypt_id: String,
    #[serde(rename = "encryptUserId")]
    encrypt_user_id: String,
    #[serde(rename = "jobName", default)]
    job_name: String,
    #[serde(rename = "salaryDesc", default)]
    salary_desc: String,
    #[serde(rename = "locationName", default)]
    location_name: String,
    #[serde(rename = "experienceName", default)]
    experience_name: String,
    #[serde(rename = "degreeName", default)]
    degree_name: String,
    #[serde(rename = "postDescription", default)]
    post_description: String,
}

#[derive(Debug, Default, Deserialize)]
struct BossInfo {
    #[serde(default)]
    name: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "activeTimeDesc", default)]
    active_time_desc: String,
}

#[derive(Debug, Default, Deserialize)]
struct BrandComInfo {
    #[serde(rename = "brandName", default)]
    brand_name: String,
}

/// Parse a captured detail response body into a job record.
///
/// # Errors
/// Returns `EngineError::Parse` for malformed JSON, a non-zero envelope
/// code, or a missing payload.
pub fn parse_detail(body: &str) -> Result<JobRecord> {
    let response: DetailResponse = serde_json::from_str(body)
        .map_err(|e| EngineError::Parse(format!("malformed detail response: {e}")))?;

    if response.code != 0 {
        return Err(EngineError::Parse(format!(
            "detail response code {}: {}",
            response.code,
            response.message.unwrap_or_default()
        )));
    }

    let data = response
        .zp_data
        .ok_or_else(|| EngineError::Parse("detail response missing zpData".to_string()))?;

    let job = data.job_info;
    if job.encrypt_id.is_empty() || job.encrypt_user_id.is_empty() {
        return Err(EngineError::Parse(
            "detail response missing identity fields".to_string(),
        ));
    }

    let boss = data.boss_info.unwrap_or_default();
    let company = data.brand_com_info.unwrap_or_default();

    Ok(JobRecord {
        identity: JobIdentity::new(job.encrypt_id, job.encrypt_user_id),
        title: job.job_name,
        company: company.brand_name,
        salary: job.salary_desc,
        location: job.location_name,
        experience: job.experience_name,
        degree: job.degree_name,
        recruiter_name: boss.name,
        recruiter_title: boss.title,
        recruiter_activity: boss.active_time_desc,
        description: job.post_description,
        status: DeliveryStatus::NotDelivered,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "code": 0,
        "message": "Success",
        "zpData": {
            "jobInfo": {
                "encryptId": "abc123",
                "encryptUserId": "user456",
                "jobName": "Rust开发工程师",
                "salaryDesc": "20-35K·14薪",
                "locationName": "上海·浦东新区",
                "experienceName": "3-5年",
                "degreeName": "本科",
                "postDescription": "负责核心交易服务"
            },
            "bossInfo": {
                "name": "王女士",
                "title": "招聘经理",
                "activeTimeDesc": "刚刚活跃"
            },
            "brandComInfo": {
                "brandName": "示例科技"
            }
        }
    }"#;

    #[test]
    fn test_parse_full_detail() {
        let record = parse_detail(SAMPLE).expect("parse detail");

        assert_eq!(record.identity.encrypt_job_id, "abc123");
        assert_eq!(record.identity.encrypt_recruiter_id, "user456");
        assert_eq!(record.title, "Rust开发工程师");
        assert_eq!(record.company, "示例科技");
        assert_eq!(record.salary, "20-35K·14薪");
        assert_eq!(record.recruiter_activity, "刚刚活跃");
        assert_eq!(record.status, DeliveryStatus::NotDelivered);
    }

    #[test]
    fn test_nonzero_code_is_an_error() {
        let body = r#"{"code": 37, "message": "请稍后再试", "zpData": null}"#;
        let err = parse_detail(body).expect_err("should fail");
        assert!(err.to_string().contains("37"));
    }

    #[test]
    fn test_missing_payload_is_an_error() {
        let body = r#"{"code": 0, "message": "Success"}"#;
        assert!(parse_detail(body).is_err());
    }

    #[test]
    fn test_missing_identity_is_an_error() {
        let body = r#"{
            "code": 0,
            "zpData": {"jobInfo": {"encryptId": "", "encryptUserId": "u"}}
        }"#;
        assert!(parse_detail(body).is_err());
    }

    #[test]
    fn test_optional_blocks_default() {
        let body = r#"{
            "code": 0,
            "zpData": {"jobInfo": {"encryptId": "a", "encryptUserId": "b"}}
        }"#;
        let record = parse_detail(body).expect("parse minimal detail");
        assert!(record.company.is_empty());
        assert!(record.recruiter_name.is_empty());
    }
}
