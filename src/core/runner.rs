//! # Suite Runner Module / 套件运行器模块
//!
//! Drives every planned test through setup, call and teardown, one test at a
//! time, and re-executes a test while the [`RerunPolicy`] asks for it.
//!
//! 逐个驱动每个计划中的测试经历 setup、call 和 teardown，
//! 并在 [`RerunPolicy`] 要求时重新执行测试。

use anyhow::{Context, Result};
use colored::*;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        config::{Environment, TestCase},
        execution::{AttemptContext, AttemptOutput, TestExecutor},
        hooks::{CallReport, LifecycleHooks},
        models::Outcome,
        rerun::{RerunDecision, RerunPolicy, StopReason},
        session::SuiteContext,
    },
    infra::t,
};

/// How long a cancelled attempt may take to hand back its partial output.
const CANCEL_GRACE: Duration = Duration::from_secs(5);

/// Aggregate result of a suite run.
/// 套件运行的汇总结果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub passed: Vec<String>,
    pub failed: Vec<String>,
    /// Cases never started because the run was cancelled.
    /// 因运行被取消而从未开始的用例。
    pub not_run: Vec<String>,
}

impl RunSummary {
    pub fn executed(&self) -> usize {
        self.passed.len() + self.failed.len()
    }

    pub fn all_passed(&self) -> bool {
        self.failed.is_empty() && self.not_run.is_empty()
    }
}

pub struct SuiteRunner<'a> {
    executor: &'a dyn TestExecutor,
    hooks: &'a dyn LifecycleHooks,
    policy: &'a RerunPolicy,
    env: Environment,
    stop: CancellationToken,
}

impl<'a> SuiteRunner<'a> {
    pub fn new(
        executor: &'a dyn TestExecutor,
        hooks: &'a dyn LifecycleHooks,
        policy: &'a RerunPolicy,
        env: Environment,
    ) -> Self {
        Self {
            executor,
            hooks,
            policy,
            env,
            stop: CancellationToken::new(),
        }
    }

    /// Stops the run when `token` is cancelled: the attempt in progress is
    /// recorded as failed and later cases are not started.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.stop = token;
        self
    }

    /// Runs `cases` in order.
    /// 按顺序运行 `cases`。
    pub async fn run_all(&self, ctx: &mut SuiteContext, cases: &[TestCase]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for case in cases {
            if self.stop.is_cancelled() {
                summary.not_run.push(case.name.clone());
                continue;
            }
            match self.run_case(ctx, case).await? {
                Some(Outcome::Passed) => summary.passed.push(case.name.clone()),
                Some(Outcome::Failed) => summary.failed.push(case.name.clone()),
                None => summary.not_run.push(case.name.clone()),
            }
        }
        Ok(summary)
    }

    /// Runs one test, rerunning transient failures while the budget allows.
    /// Returns the final outcome, or `None` when the run was cancelled before
    /// the first attempt.
    ///
    /// 运行一个测试，在预算允许时重跑瞬态失败。
    /// 返回最终结果；如果运行在第一次尝试之前被取消，则返回 `None`。
    pub async fn run_case(&self, ctx: &mut SuiteContext, case: &TestCase) -> Result<Option<Outcome>> {
        let meta = case.metadata();
        let mut attempt: u32 = 0;

        loop {
            if self.stop.is_cancelled() {
                return Ok(ctx
                    .records()
                    .iter()
                    .find(|r| r.name == case.name)
                    .and_then(|r| r.final_outcome()));
            }
            attempt += 1;

            self.hooks
                .on_setup(ctx, &meta)
                .await
                .with_context(|| format!("Setup failed for test '{}'", case.name))?;

            let attempt_ctx = AttemptContext {
                build_name: ctx.data().build_name.clone(),
                app_name: ctx.data().apk_name.clone(),
                env: self.env,
                attempt,
                cancel: self.stop.clone(),
            };

            println!("{}", t!("run.running_test", name = &case.name, attempt = attempt).blue());

            let execution = self.executor.execute(case, &attempt_ctx);
            tokio::pin!(execution);
            let output = tokio::select! {
                biased;
                _ = self.stop.cancelled() => {
                    match tokio::time::timeout(CANCEL_GRACE, &mut execution).await {
                        Ok(Ok(partial)) if !partial.passed => cancelled_output(partial),
                        Ok(Ok(output)) => output,
                        Ok(Err(e)) => {
                            tracing::warn!(test = %case.name, error = %e, "executor error after cancellation");
                            AttemptOutput::failed(t!("run.attempt_cancelled").to_string())
                        }
                        Err(_) => AttemptOutput::failed(t!("run.attempt_cancelled").to_string()),
                    }
                }
                result = &mut execution => match result {
                    Ok(output) => output,
                    Err(e) => {
                        tracing::warn!(test = %case.name, error = %e, "executor error");
                        AttemptOutput::failed(format!("{:#}", e))
                    }
                },
            };

            for job_id in &output.job_ids {
                ctx.record_job(job_id)?;
            }

            let report = if output.passed {
                CallReport::passed()
            } else {
                CallReport::failed(output.output.clone())
            };
            self.hooks
                .on_call_complete(ctx, &report)
                .await
                .with_context(|| format!("Failed to report results of test '{}'", case.name))?;
            self.hooks
                .on_teardown(ctx)
                .await
                .with_context(|| format!("Teardown failed for test '{}'", case.name))?;

            let secs = output.duration.as_secs_f64();
            if output.passed {
                println!("{}", t!("run.test_passed", name = &case.name, duration = format!("{:.2}", secs)).green());
            } else {
                println!("{}", t!("run.test_failed", name = &case.name, duration = format!("{:.2}", secs)).red());
            }

            let decision = if self.stop.is_cancelled() && !output.passed {
                RerunDecision::Stop(StopReason::Cancelled)
            } else {
                self.policy.should_rerun(attempt, output.failure_text())
            };
            match decision {
                RerunDecision::Rerun => {
                    let pattern = self
                        .policy
                        .classifier()
                        .matched_pattern(&output.output)
                        .unwrap_or_default();
                    tracing::info!(test = %case.name, attempt, pattern, "transient failure");
                    println!(
                        "{}",
                        t!(
                            "run.test_retrying",
                            name = &case.name,
                            attempt = attempt,
                            retries = self.policy.max_reruns()
                        )
                        .yellow()
                    );
                }
                RerunDecision::Stop(reason) => {
                    if attempt > 1 {
                        match reason {
                            StopReason::Passed => println!(
                                "{}",
                                t!("run.test_passed_on_retry", name = &case.name, retries = attempt - 1).green()
                            ),
                            _ => println!(
                                "{}",
                                t!("run.test_failed_after_retries", name = &case.name, retries = attempt - 1).red()
                            ),
                        }
                    }
                    let outcome = if output.passed {
                        Outcome::Passed
                    } else {
                        Outcome::Failed
                    };
                    return Ok(Some(outcome));
                }
            }
        }
    }
}

/// Makes sure a cancelled attempt's failure text starts with the cancellation
/// message, keeping whatever the executor captured after it.
fn cancelled_output(partial: AttemptOutput) -> AttemptOutput {
    let message = t!("run.attempt_cancelled").to_string();
    if partial.output.starts_with(&message) {
        return partial;
    }
    AttemptOutput {
        output: format!("{}\n{}", message, partial.output),
        ..partial
    }
}
