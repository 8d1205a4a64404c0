//! # Configuration Module / 配置模块
//!
//! The suite configuration (`FarmSuite.toml`) and the per-invocation run options
//! parsed from the command line.
//!
//! 套件配置（`FarmSuite.toml`）以及从命令行解析的每次调用的运行选项。

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::core::models::CaseMetadata;
use crate::core::rerun::{TransientClassifier, default_patterns};

pub const DEFAULT_CONFIG_FILE: &str = "FarmSuite.toml";
pub const DEFAULT_JOB_MARKER: &str = "FARM_JOB_ID=";
pub const NIGHTLY_MARK: &str = "nightly";

/// Represents a single UI test registered with the suite.
/// 代表向套件注册的单个 UI 测试。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TestCase {
    /// The unique name of the test, used in reports and device-farm jobs.
    /// 测试的唯一名称，用于报告和设备农场作业。
    pub name: String,
    /// The command line driving the test. Environment variables are expanded
    /// before it is split into program and arguments.
    /// 驱动测试的命令行。在拆分为程序和参数之前会展开环境变量。
    pub command: String,
    /// The TestRail case id, if the test is tracked there.
    /// TestRail 用例 id（如果测试在其中被跟踪）。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testrail_case_id: Option<u64>,
    /// Marks such as `smoke_1`, `transaction` or `nightly`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<String>,
    /// An optional timeout in seconds for one attempt.
    /// 单次尝试的可选超时时间（秒）。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl TestCase {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            testrail_case_id: None,
            marks: vec![],
            timeout_secs: None,
        }
    }

    pub fn metadata(&self) -> CaseMetadata {
        CaseMetadata {
            name: self.name.clone(),
            testrail_case_id: self.testrail_case_id,
            marks: self.marks.clone(),
        }
    }

    pub fn has_mark(&self, mark: &str) -> bool {
        self.marks.iter().any(|m| m == mark)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RerunSettings {
    /// Regular expressions identifying transient failures.
    /// 识别瞬态失败的正则表达式。
    #[serde(default = "default_patterns")]
    pub transient_patterns: Vec<String>,
}

impl Default for RerunSettings {
    fn default() -> Self {
        Self {
            transient_patterns: default_patterns(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FarmSettings {
    /// Base URL of the device farm REST API / 设备农场 REST API 的基础 URL
    #[serde(default = "default_farm_api")]
    pub base_url: String,
    /// Base URL of job pages, used for report links / 作业页面的基础 URL，用于报告链接
    #[serde(default = "default_farm_jobs")]
    pub job_url: String,
}

impl Default for FarmSettings {
    fn default() -> Self {
        Self {
            base_url: default_farm_api(),
            job_url: default_farm_jobs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GithubSettings {
    #[serde(default = "default_github_api")]
    pub api_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
}

impl Default for GithubSettings {
    fn default() -> Self {
        Self {
            api_url: default_github_api(),
            owner: None,
            repo: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TestRailSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
}

/// The complete suite configuration loaded from a TOML file.
/// 从 TOML 文件加载的完整套件配置。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SuiteConfig {
    /// The language for the runner's output messages (e.g., "en", "zh-CN").
    /// 运行器输出消息的语言（例如 "en", "zh-CN"）。
    #[serde(default = "default_language")]
    pub language: String,
    /// Working directory of the test commands; defaults to the config file's directory.
    /// 测试命令的工作目录；默认为配置文件所在目录。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<PathBuf>,
    /// Output prefix announcing a device-farm job id.
    /// 宣告设备农场作业 id 的输出前缀。
    #[serde(default = "default_job_marker")]
    pub job_marker: String,
    /// Directory receiving one JSON file per test.
    /// 存放每个测试一个 JSON 文件的目录。
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,
    #[serde(default)]
    pub rerun: RerunSettings,
    #[serde(default)]
    pub farm: FarmSettings,
    #[serde(default)]
    pub github: GithubSettings,
    #[serde(default)]
    pub testrail: TestRailSettings,
    #[serde(default)]
    pub cases: Vec<TestCase>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            working_dir: None,
            job_marker: default_job_marker(),
            report_dir: default_report_dir(),
            rerun: RerunSettings::default(),
            farm: FarmSettings::default(),
            github: GithubSettings::default(),
            testrail: TestRailSettings::default(),
            cases: vec![],
        }
    }
}

impl SuiteConfig {
    /// Compiles the configured transient patterns.
    /// 编译配置的瞬态模式。
    pub fn classifier(&self) -> Result<TransientClassifier> {
        TransientClassifier::new(&self.rerun.transient_patterns)
            .context("Failed to compile rerun.transient_patterns")
    }

    /// Checks constraints serde cannot express.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for case in &self.cases {
            if case.name.trim().is_empty() {
                bail!("A test case has an empty name.");
            }
            if case.command.trim().is_empty() {
                bail!("Test case '{}' has an empty command.", case.name);
            }
            if !seen.insert(case.name.as_str()) {
                bail!("Duplicate test case name: '{}'.", case.name);
            }
        }
        if self.job_marker.trim().is_empty() {
            bail!("job_marker must not be empty.");
        }
        self.classifier()?;
        Ok(())
    }
}

/// Parses and validates a suite configuration from TOML text.
/// 从 TOML 文本解析并验证套件配置。
pub fn parse_suite_config(content: &str) -> Result<SuiteConfig> {
    let config: SuiteConfig = toml::from_str(content)?;
    config.validate()?;
    Ok(config)
}

/// Loads a suite configuration file. A relative `working_dir` (or none) is
/// resolved against the directory holding the file.
///
/// 加载套件配置文件。相对的 `working_dir`（或未设置）会相对于该文件所在目录解析。
pub fn load_suite_config(path: &Path) -> Result<SuiteConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let mut config = parse_suite_config(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    if config.report_dir.is_relative() {
        config.report_dir = base.join(&config.report_dir);
    }
    config.working_dir = Some(match config.working_dir.take() {
        Some(dir) if dir.is_absolute() => dir,
        Some(dir) => base.join(dir),
        None => base,
    });
    Ok(config)
}

/// Where the devices come from.
/// 设备的来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    Local,
    #[default]
    Sauce,
}

impl Environment {
    pub fn is_remote(self) -> bool {
        self == Environment::Sauce
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(Environment::Local),
            "sauce" => Ok(Environment::Sauce),
            other => bail!("Unknown environment '{}'; expected 'local' or 'sauce'.", other),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Local => write!(f, "local"),
            Environment::Sauce => write!(f, "sauce"),
        }
    }
}

/// Options consumed at process start.
/// 进程启动时使用的选项。
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub config: PathBuf,
    pub build_name: String,
    pub apk: String,
    pub env: Environment,
    pub log: bool,
    pub pr_number: Option<u64>,
    pub nightly: bool,
    pub rerun_count: u32,
    pub mark: Option<String>,
    pub html: Option<PathBuf>,
}

/// The default build name: the current local time, minute precision.
/// 默认构建名称：当前本地时间，精确到分钟。
pub fn default_build_name() -> String {
    chrono::Local::now().format("%Y-%m-%d-%H-%M").to_string()
}

fn default_language() -> String {
    "en".to_string()
}

fn default_job_marker() -> String {
    DEFAULT_JOB_MARKER.to_string()
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("reports")
}

fn default_farm_api() -> String {
    "https://saucelabs.com/rest/v1".to_string()
}

fn default_farm_jobs() -> String {
    "https://saucelabs.com/jobs".to_string()
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}
