//! # Test Case Management Client / 测试用例管理客户端
//!
//! Pushes nightly results to TestRail: one run per build, one result per
//! tracked case.
//!
//! 将夜间结果推送到 TestRail：每个构建一次运行，每个被跟踪的用例一条结果。

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::models::{Outcome, TestRecord};

pub const TESTRAIL_USER_VAR: &str = "TESTRAIL_USER";
pub const TESTRAIL_PASSWORD_VAR: &str = "TESTRAIL_PASSWORD";

pub const STATUS_PASSED: u8 = 1;
pub const STATUS_FAILED: u8 = 5;

#[async_trait]
pub trait CaseManagement: Send + Sync {
    /// Creates a run named `name` covering `case_ids` and returns its id.
    async fn add_run(&self, name: &str, case_ids: &[u64]) -> Result<u64>;

    /// Adds one result per record that carries a case id.
    async fn add_results(&self, run_id: u64, records: &[TestRecord]) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaseResult {
    pub case_id: u64,
    pub status_id: u8,
    pub comment: String,
}

/// Converts finished records into TestRail results. Records without a case id
/// or without a final outcome are skipped.
///
/// 将已完成的记录转换为 TestRail 结果。没有用例 id 或没有最终结果的记录会被跳过。
pub fn case_results(records: &[TestRecord], job_url: &str) -> Vec<CaseResult> {
    records
        .iter()
        .filter_map(|record| {
            let case_id = record.testrail_case_id?;
            let outcome = record.final_outcome()?;
            let status_id = match outcome {
                Outcome::Passed => STATUS_PASSED,
                Outcome::Failed => STATUS_FAILED,
            };
            Some(CaseResult {
                case_id,
                status_id,
                comment: result_comment(record, job_url),
            })
        })
        .collect()
}

fn result_comment(record: &TestRecord, job_url: &str) -> String {
    let mut comment = String::new();
    if let Some(error) = record.last_error() {
        comment.push_str(error.trim());
        comment.push('\n');
    }
    if let Some(run) = record.last_run() {
        for (i, job) in run.jobs().iter().enumerate() {
            comment.push_str(&format!(
                "Device {}: {}/{}\n",
                i + 1,
                job_url.trim_end_matches('/'),
                job
            ));
        }
    }
    comment.trim_end().to_string()
}

#[derive(Debug, Deserialize)]
struct CreatedRun {
    id: u64,
}

#[derive(Debug, Clone)]
pub struct TestRailClient {
    http: Client,
    base_url: String,
    project_id: u64,
    user: String,
    password: String,
    job_url: String,
}

impl TestRailClient {
    pub fn new(
        base_url: impl Into<String>,
        project_id: u64,
        user: impl Into<String>,
        password: impl Into<String>,
        job_url: impl Into<String>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            project_id,
            user: user.into(),
            password: password.into(),
            job_url: job_url.into(),
        })
    }

    pub fn from_env(base_url: impl Into<String>, project_id: u64, job_url: impl Into<String>) -> Result<Self> {
        let user = std::env::var(TESTRAIL_USER_VAR)
            .with_context(|| format!("{} is not set", TESTRAIL_USER_VAR))?;
        let password = std::env::var(TESTRAIL_PASSWORD_VAR)
            .with_context(|| format!("{} is not set", TESTRAIL_PASSWORD_VAR))?;
        Self::new(base_url, project_id, user, password, job_url)
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/index.php?/api/v2/{}", self.base_url, method)
    }
}

#[async_trait]
impl CaseManagement for TestRailClient {
    async fn add_run(&self, name: &str, case_ids: &[u64]) -> Result<u64> {
        let url = self.endpoint(&format!("add_run/{}", self.project_id));
        let body = serde_json::json!({
            "name": name,
            "include_all": false,
            "case_ids": case_ids,
        });
        let created: CreatedRun = self
            .http
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&body)
            .send()
            .await
            .context("Failed to create TestRail run")?
            .error_for_status()?
            .json()
            .await
            .context("Failed to decode TestRail run")?;
        Ok(created.id)
    }

    async fn add_results(&self, run_id: u64, records: &[TestRecord]) -> Result<()> {
        let results = case_results(records, &self.job_url);
        if results.is_empty() {
            tracing::info!(run_id, "no tracked cases to report");
            return Ok(());
        }
        let url = self.endpoint(&format!("add_results_for_cases/{}", run_id));
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.user, Some(&self.password))
            .json(&serde_json::json!({ "results": results }))
            .send()
            .await
            .context("Failed to push TestRail results")?;
        if !response.status().is_success() {
            bail!("TestRail rejected the results with status {}", response.status());
        }
        Ok(())
    }
}
