//! # Test Execution Module / 测试执行模块
//!
//! Runs a single attempt of a test case. The default [`CommandExecutor`]
//! spawns the case's command line, enforces the optional timeout and collects
//! the device-farm job ids the command announces on its output.
//!
//! 运行测试用例的单次尝试。默认的 [`CommandExecutor`] 派生用例的命令行，
//! 执行可选的超时，并收集命令在其输出中宣告的设备农场作业 id。

use anyhow::Result;
use async_trait::async_trait;
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::{
    core::config::{Environment, TestCase},
    infra::{command, t},
};

/// What a test command needs to know about the attempt it is running in.
/// 测试命令需要了解的、关于其所在尝试的信息。
#[derive(Debug, Clone)]
pub struct AttemptContext {
    pub build_name: String,
    pub app_name: String,
    pub env: Environment,
    /// 1-based attempt number / 从 1 开始的尝试编号
    pub attempt: u32,
    /// Cancelled when the run is shutting down. Executors return the output
    /// captured so far instead of waiting for the test to finish.
    /// 运行关闭时被取消。执行器返回目前已捕获的输出，而不是等待测试结束。
    pub cancel: CancellationToken,
}

/// The observable result of one attempt.
/// 一次尝试的可观察结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptOutput {
    pub passed: bool,
    /// The complete captured output; the failure text when `passed` is false.
    /// 完整的捕获输出；当 `passed` 为 false 时即为失败文本。
    pub output: String,
    /// Device-farm jobs opened during the attempt, in announcement order.
    /// 尝试期间打开的设备农场作业，按宣告顺序排列。
    pub job_ids: Vec<String>,
    pub duration: Duration,
}

impl AttemptOutput {
    pub fn passed(output: impl Into<String>) -> Self {
        Self {
            passed: true,
            output: output.into(),
            job_ids: vec![],
            duration: Duration::default(),
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            passed: false,
            output: output.into(),
            job_ids: vec![],
            duration: Duration::default(),
        }
    }

    pub fn with_jobs<I, S>(mut self, jobs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.job_ids = jobs.into_iter().map(Into::into).collect();
        self
    }

    pub fn failure_text(&self) -> Option<&str> {
        (!self.passed).then_some(self.output.as_str())
    }
}

/// Executes one attempt of a test case.
///
/// An `Err` is a critical error of the executor itself; the runner records it
/// as a failed attempt.
///
/// 执行测试用例的一次尝试。`Err` 表示执行器自身的严重错误；运行器会将其记录为失败的尝试。
#[async_trait]
pub trait TestExecutor: Send + Sync {
    async fn execute(&self, case: &TestCase, ctx: &AttemptContext) -> Result<AttemptOutput>;
}

/// Runs test cases as child processes.
/// 以子进程方式运行测试用例。
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    working_dir: PathBuf,
    job_marker: String,
}

impl CommandExecutor {
    pub fn new(working_dir: impl Into<PathBuf>, job_marker: impl Into<String>) -> Self {
        Self {
            working_dir: working_dir.into(),
            job_marker: job_marker.into(),
        }
    }
}

#[async_trait]
impl TestExecutor for CommandExecutor {
    async fn execute(&self, case: &TestCase, ctx: &AttemptContext) -> Result<AttemptOutput> {
        let vars = [
            ("FARM_BUILD_NAME", ctx.build_name.clone()),
            ("FARM_APP_NAME", ctx.app_name.clone()),
            ("FARM_ENV", ctx.env.to_string()),
            ("FARM_TEST_NAME", case.name.clone()),
            ("FARM_ATTEMPT", ctx.attempt.to_string()),
        ];
        let (program, args) = command::parse_command_line_with(&case.command, &vars)?;

        let mut cmd = tokio::process::Command::new(&program);
        cmd.args(&args)
            .envs(vars.iter().map(|(key, value)| (*key, value.as_str())))
            .kill_on_drop(true);
        if !self.working_dir.as_os_str().is_empty() {
            cmd.current_dir(&self.working_dir);
        }

        tracing::info!(test = %case.name, attempt = ctx.attempt, command = %case.command, "starting attempt");

        let start_time = Instant::now();
        let buffer = Arc::new(tokio::sync::Mutex::new(String::new()));
        let capture = command::spawn_and_capture_into(cmd, Arc::clone(&buffer));
        let limit = case.timeout_secs.map(Duration::from_secs);
        let deadline = async {
            match limit {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        };

        // Dropping `capture` kills the child; the buffer keeps what was read.
        let interrupted = tokio::select! {
            status = capture => Ok(status),
            _ = deadline => Err(limit.map(|l| l.as_secs())),
            _ = ctx.cancel.cancelled() => Err(None),
        };
        let duration = start_time.elapsed();
        let output = buffer.lock().await.clone();
        let job_ids = extract_job_ids(&output, &self.job_marker);
        for line in output.lines() {
            tracing::info!(test = %case.name, "{}", line);
        }

        let status_res = match interrupted {
            Ok(status_res) => status_res,
            Err(timed_out) => {
                let message = match timed_out {
                    Some(secs) => {
                        println!("{}", t!("run.test_timeout", name = &case.name, timeout = secs).red());
                        t!("run.test_timeout_message", timeout = secs).to_string()
                    }
                    None => t!("run.attempt_cancelled").to_string(),
                };
                return Ok(AttemptOutput {
                    passed: false,
                    output: format!("{}\n{}", message, output),
                    job_ids,
                    duration,
                });
            }
        };

        let passed = match status_res {
            Ok(status) => status.success(),
            Err(e) => {
                let message = format!("Failed to run '{}': {}\n{}", program, e, output);
                return Ok(AttemptOutput {
                    passed: false,
                    output: message,
                    job_ids,
                    duration,
                });
            }
        };

        Ok(AttemptOutput {
            passed,
            output,
            job_ids,
            duration,
        })
    }
}

/// Collects the job ids announced with `marker` at the start of an output line.
/// Ids are returned in order of first appearance, without duplicates.
///
/// 收集在输出行开头以 `marker` 宣告的作业 id。按首次出现顺序返回，不含重复项。
pub fn extract_job_ids(output: &str, marker: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for line in output.lines() {
        let Some(rest) = line.trim_start().strip_prefix(marker) else {
            continue;
        };
        let id = rest.trim();
        if !id.is_empty() && !ids.iter().any(|known| known == id) {
            ids.push(id.to_string());
        }
    }
    ids
}
