//! # Data Models Module / 数据模型模块
//!
//! This module defines the session data recorded while the suite runs: the
//! suite-wide data, one record per logical test and one run per attempt.
//!
//! 此模块定义了套件运行期间记录的会话数据：套件级数据、
//! 每个逻辑测试一条记录，以及每次尝试一次运行。

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The final outcome of a single attempt.
/// 单次尝试的最终结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
}

impl Outcome {
    pub fn is_passed(self) -> bool {
        self == Outcome::Passed
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Passed => write!(f, "passed"),
            Outcome::Failed => write!(f, "failed"),
        }
    }
}

/// Violations of the session invariants.
/// 违反会话不变量的错误。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no test is currently active")]
    NoCurrentTest,
    #[error("test '{0}' has no run in progress")]
    NoRunInProgress(String),
    #[error("the outcome of the current run of '{0}' is already set")]
    RunAlreadyFinished(String),
}

/// Typed per-test metadata, populated when a case is registered.
/// 每个测试的类型化元数据，在注册用例时填充。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaseMetadata {
    /// The unique test name / 唯一的测试名称
    pub name: String,
    /// The case id in the external test-case-management system, if any.
    /// 外部测试用例管理系统中的用例 id（如果有）。
    pub testrail_case_id: Option<u64>,
    /// Marks attached to the case, e.g. `smoke_1` or `nightly`.
    /// 附加到用例的标记，例如 `smoke_1` 或 `nightly`。
    pub marks: Vec<String>,
}

impl CaseMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_case_id(mut self, case_id: u64) -> Self {
        self.testrail_case_id = Some(case_id);
        self
    }

    pub fn has_mark(&self, mark: &str) -> bool {
        self.marks.iter().any(|m| m == mark)
    }
}

/// One execution attempt of a single test.
///
/// The outcome is written once. The error text is present if and only if the
/// outcome is [`Outcome::Failed`]. Job ids can only be added while the run is
/// in progress.
///
/// 单个测试的一次执行尝试。
/// 结果只写入一次。当且仅当结果为失败时才存在错误文本。
/// 只能在运行进行中时添加作业 id。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRun {
    outcome: Option<Outcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(default)]
    jobs: Vec<String>,
}

impl TestRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Remote job ids in the order the device sessions were opened.
    /// 按设备会话打开顺序排列的远程作业 id。
    pub fn jobs(&self) -> &[String] {
        &self.jobs
    }

    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Registers a device-farm job for this attempt. Duplicate ids are ignored.
    /// Returns `false` when the run is already finished.
    pub(crate) fn add_job(&mut self, job_id: &str) -> bool {
        if self.is_finished() {
            return false;
        }
        if !self.jobs.iter().any(|j| j == job_id) {
            self.jobs.push(job_id.to_string());
        }
        true
    }

    pub(crate) fn finish_passed(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.outcome = Some(Outcome::Passed);
        true
    }

    pub(crate) fn finish_failed(&mut self, error: impl Into<String>) -> bool {
        if self.is_finished() {
            return false;
        }
        self.outcome = Some(Outcome::Failed);
        self.error = Some(error.into());
        true
    }
}

/// The logical test case, owning every attempt made for it.
/// The run sequence is append-only; its order is the chronological attempt order.
///
/// 逻辑测试用例，拥有为其进行的所有尝试。
/// 运行序列只追加；其顺序即尝试的时间顺序。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecord {
    pub name: String,
    #[serde(default)]
    pub testrail_case_id: Option<u64>,
    testruns: Vec<TestRun>,
}

impl TestRecord {
    pub fn new(name: impl Into<String>, testrail_case_id: Option<u64>) -> Self {
        Self {
            name: name.into(),
            testrail_case_id,
            testruns: Vec::new(),
        }
    }

    /// Appends a fresh attempt and returns it.
    /// 追加一次新的尝试并返回它。
    pub fn create_new_testrun(&mut self) -> &mut TestRun {
        self.testruns.push(TestRun::new());
        let last = self.testruns.len() - 1;
        &mut self.testruns[last]
    }

    pub fn testruns(&self) -> &[TestRun] {
        &self.testruns
    }

    pub fn last_run(&self) -> Option<&TestRun> {
        self.testruns.last()
    }

    /// Only the last run is ever handed out mutably; earlier runs are history.
    pub(crate) fn last_run_mut(&mut self) -> Option<&mut TestRun> {
        self.testruns.last_mut()
    }

    pub fn attempts(&self) -> usize {
        self.testruns.len()
    }

    /// The outcome reported for the test: that of its latest attempt.
    /// 测试的报告结果：即其最近一次尝试的结果。
    pub fn final_outcome(&self) -> Option<Outcome> {
        self.last_run().and_then(TestRun::outcome)
    }

    pub fn is_passed(&self) -> bool {
        self.final_outcome() == Some(Outcome::Passed)
    }

    /// The error text of the latest failed attempt, if the test ended failed.
    pub fn last_error(&self) -> Option<&str> {
        match self.final_outcome() {
            Some(Outcome::Failed) => self.last_run().and_then(TestRun::error),
            _ => None,
        }
    }
}

/// Suite-wide data, alive for one run of the suite.
/// 套件级数据，在套件的一次运行期间存在。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TestSuiteData {
    /// Build name shown in the device farm and reports / 在设备农场和报告中显示的构建名称
    pub build_name: String,
    /// File name of the application artifact under test / 被测应用产物的文件名
    pub apk_name: String,
    /// Every test seen so far, in first-seen order / 迄今为止见过的所有测试，按首次出现顺序
    pub tests: Vec<TestRecord>,
    #[serde(skip)]
    pub(crate) current: Option<usize>,
}

impl TestSuiteData {
    pub fn new(build_name: impl Into<String>, apk_name: impl Into<String>) -> Self {
        Self {
            build_name: build_name.into(),
            apk_name: apk_name.into(),
            tests: Vec::new(),
            current: None,
        }
    }

    pub fn find(&self, name: &str) -> Option<&TestRecord> {
        self.tests.iter().find(|t| t.name == name)
    }
}
