//! # Pull Request Comment Client / 拉取请求评论客户端
//!
//! Posts the HTML report as a comment on a source-hosting pull request.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

pub const GITHUB_TOKEN_VAR: &str = "GIT_HUB_TOKEN";

#[async_trait]
pub trait PullRequestCommenter: Send + Sync {
    async fn post_comment(&self, pr_number: u64, body: &str) -> Result<()>;
}

/// GitHub REST client for one repository.
/// 针对单个仓库的 GitHub REST 客户端。
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: Client,
    api_url: String,
    owner: String,
    repo: String,
    token: String,
}

impl GithubClient {
    pub fn new(
        api_url: impl Into<String>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(60))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            owner: owner.into(),
            repo: repo.into(),
            token: token.into(),
        })
    }
}

#[async_trait]
impl PullRequestCommenter for GithubClient {
    async fn post_comment(&self, pr_number: u64, body: &str) -> Result<()> {
        // Pull request comments go through the issues API.
        let url = format!(
            "{}/repos/{}/{}/issues/{}/comments",
            self.api_url, self.owner, self.repo, pr_number
        );
        self.http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, format!("token {}", self.token))
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .json(&json!({ "body": body }))
            .send()
            .await
            .with_context(|| format!("Failed to post comment on pull request #{}", pr_number))?
            .error_for_status()?;
        Ok(())
    }
}
