//! # Device Farm Client Module / 设备农场客户端模块
//!
//! A thin client for the Sauce Labs REST API: the storage listing and upload
//! used for the application artifact, and the job update pushed after every
//! attempt.
//!
//! Sauce Labs REST API 的轻量客户端：用于应用产物的存储列表和上传，
//! 以及每次尝试之后推送的作业更新。

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use std::time::Duration;

pub const SAUCE_USERNAME_VAR: &str = "SAUCE_USERNAME";
pub const SAUCE_ACCESS_KEY_VAR: &str = "SAUCE_ACCESS_KEY";

#[async_trait]
pub trait DeviceFarm: Send + Sync {
    /// Names of the files held in the farm's storage.
    async fn stored_files(&self) -> Result<Vec<String>>;

    async fn upload_artifact(&self, name: &str, content: Vec<u8>) -> Result<()>;

    /// Sets the display name and pass/fail status of a remote job.
    async fn update_job(&self, job_id: &str, name: &str, passed: bool) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct StoredFiles {
    #[serde(default)]
    files: Vec<StoredFile>,
}

#[derive(Debug, Deserialize)]
struct StoredFile {
    name: String,
}

/// Sauce Labs REST client authenticated with username and access key.
/// 使用用户名和访问密钥认证的 Sauce Labs REST 客户端。
#[derive(Debug, Clone)]
pub struct SauceLabsClient {
    http: Client,
    base_url: String,
    username: String,
    access_key: String,
}

impl SauceLabsClient {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        access_key: impl Into<String>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            username: username.into(),
            access_key: access_key.into(),
        })
    }

    /// Reads the credentials from `SAUCE_USERNAME` and `SAUCE_ACCESS_KEY`.
    /// 从 `SAUCE_USERNAME` 和 `SAUCE_ACCESS_KEY` 读取凭据。
    pub fn from_env(base_url: impl Into<String>) -> Result<Self> {
        let username = std::env::var(SAUCE_USERNAME_VAR)
            .with_context(|| format!("{} is not set", SAUCE_USERNAME_VAR))?;
        let access_key = std::env::var(SAUCE_ACCESS_KEY_VAR)
            .with_context(|| format!("{} is not set", SAUCE_ACCESS_KEY_VAR))?;
        Self::new(base_url, username, access_key)
    }
}

#[async_trait]
impl DeviceFarm for SauceLabsClient {
    async fn stored_files(&self) -> Result<Vec<String>> {
        let url = format!("{}/storage/{}", self.base_url, self.username);
        let files: StoredFiles = self
            .http
            .get(&url)
            .basic_auth(&self.username, Some(&self.access_key))
            .send()
            .await
            .with_context(|| format!("Failed to list device-farm storage at {}", url))?
            .error_for_status()?
            .json()
            .await
            .context("Failed to decode device-farm storage listing")?;
        Ok(files.files.into_iter().map(|f| f.name).collect())
    }

    async fn upload_artifact(&self, name: &str, content: Vec<u8>) -> Result<()> {
        let url = format!("{}/storage/{}/{}", self.base_url, self.username, name);
        self.http
            .post(&url)
            .query(&[("overwrite", "true")])
            .basic_auth(&self.username, Some(&self.access_key))
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(content)
            .send()
            .await
            .with_context(|| format!("Failed to upload {} to device-farm storage", name))?
            .error_for_status()?;
        Ok(())
    }

    async fn update_job(&self, job_id: &str, name: &str, passed: bool) -> Result<()> {
        let url = format!("{}/{}/jobs/{}", self.base_url, self.username, job_id);
        self.http
            .put(&url)
            .basic_auth(&self.username, Some(&self.access_key))
            .json(&json!({ "name": name, "passed": passed }))
            .send()
            .await
            .with_context(|| format!("Failed to update job {}", job_id))?
            .error_for_status()?;
        Ok(())
    }
}

/// The artifact name: the first path segment mentioning `.apk`, otherwise the
/// last non-empty segment. Works for local paths and URLs alike.
///
/// 产物名称：第一个包含 `.apk` 的路径段，否则为最后一个非空段。适用于本地路径和 URL。
pub fn artifact_name(source: &str) -> Result<String> {
    let without_query = source.split(['?', '#']).next().unwrap_or_default();
    let segments: Vec<&str> = without_query
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .collect();

    segments
        .iter()
        .find(|s| s.contains(".apk"))
        .or_else(|| segments.last())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow!("Cannot derive an artifact name from '{}'", source))
}

fn is_remote_source(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Whether the artifact had to be transferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    AlreadyStored,
    Uploaded { bytes: usize },
}

/// Makes sure the farm storage holds the artifact `name`.
///
/// Nothing is transferred when a file of that name is already stored.
/// Otherwise a URL source is downloaded first (a non-success status is an
/// error) and a local source is read from disk. Every error is fatal to the
/// caller; there is no retry.
///
/// 确保农场存储中存在名为 `name` 的产物。
/// 当已存在同名文件时不传输任何内容。否则先下载 URL 来源（非成功状态视为错误），
/// 或从磁盘读取本地来源。所有错误对调用者都是致命的；不会重试。
pub async fn ensure_artifact_uploaded(
    farm: &dyn DeviceFarm,
    http: &Client,
    source: &str,
    name: &str,
) -> Result<UploadStatus> {
    let stored = farm.stored_files().await?;
    if stored.iter().any(|f| f == name) {
        tracing::info!(artifact = name, "artifact already stored");
        return Ok(UploadStatus::AlreadyStored);
    }

    let content = if is_remote_source(source) {
        let response = http
            .get(source)
            .send()
            .await
            .with_context(|| format!("Failed to download artifact from {}", source))?;
        let status = response.status();
        if !status.is_success() {
            bail!("Downloading artifact from {} failed with status {}", source, status);
        }
        response.bytes().await?.to_vec()
    } else {
        tokio::fs::read(Path::new(source))
            .await
            .with_context(|| format!("Failed to read artifact: {}", source))?
    };

    let bytes = content.len();
    farm.upload_artifact(name, content).await?;
    tracing::info!(artifact = name, bytes, "artifact uploaded");
    Ok(UploadStatus::Uploaded { bytes })
}
