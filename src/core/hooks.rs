//! # Lifecycle Hooks Module / 生命周期钩子模块
//!
//! Hooks called around every attempt of a test: setup, completion of the
//! call phase and teardown. [`SuiteHooks`] is the implementation used by the
//! CLI; other drivers can provide their own.
//!
//! 围绕测试每次尝试调用的钩子：setup、call 阶段完成和 teardown。
//! [`SuiteHooks`] 是 CLI 使用的实现；其他驱动可以提供自己的实现。

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;

use crate::{
    core::{models::CaseMetadata, session::SuiteContext},
    infra::farm::DeviceFarm,
    reporting::store::ReportStore,
};

/// The result of the call phase of one attempt.
/// 一次尝试的 call 阶段结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallReport {
    pub passed: bool,
    /// The full failure representation; ignored when the call passed.
    /// 完整的失败描述；调用通过时忽略。
    pub longrepr: String,
}

impl CallReport {
    pub fn passed() -> Self {
        Self {
            passed: true,
            longrepr: String::new(),
        }
    }

    pub fn failed(longrepr: impl Into<String>) -> Self {
        Self {
            passed: false,
            longrepr: longrepr.into(),
        }
    }
}

#[async_trait]
pub trait LifecycleHooks: Send + Sync {
    /// Starts a fresh attempt for `meta` in `ctx`.
    async fn on_setup(&self, ctx: &mut SuiteContext, meta: &CaseMetadata) -> Result<()>;

    /// Records the call outcome on the attempt in progress and forwards it.
    async fn on_call_complete(&self, ctx: &mut SuiteContext, report: &CallReport) -> Result<()>;

    async fn on_teardown(&self, ctx: &mut SuiteContext) -> Result<()>;
}

/// Hooks wired to the device farm (remote runs only) and the report store.
/// 连接到设备农场（仅远程运行）和报告存储的钩子。
pub struct SuiteHooks {
    farm: Option<Arc<dyn DeviceFarm>>,
    store: Arc<dyn ReportStore>,
}

impl SuiteHooks {
    /// `farm` is `Some` only when the devices are provided by the remote farm.
    /// 仅当设备由远程农场提供时 `farm` 才为 `Some`。
    pub fn new(farm: Option<Arc<dyn DeviceFarm>>, store: Arc<dyn ReportStore>) -> Self {
        Self { farm, store }
    }
}

#[async_trait]
impl LifecycleHooks for SuiteHooks {
    async fn on_setup(&self, ctx: &mut SuiteContext, meta: &CaseMetadata) -> Result<()> {
        let record = ctx.begin_test(meta);
        tracing::info!(test = %record.name, attempt = record.attempts(), "setup");
        Ok(())
    }

    async fn on_call_complete(&self, ctx: &mut SuiteContext, report: &CallReport) -> Result<()> {
        let error = (!report.passed).then_some(report.longrepr.as_str());
        ctx.complete_call(report.passed, error)?;

        let record = ctx.current_mut()?;
        if let Some(farm) = &self.farm {
            let jobs = record
                .last_run()
                .map(|run| run.jobs().to_vec())
                .unwrap_or_default();
            for job_id in &jobs {
                farm.update_job(job_id, &record.name, report.passed)
                    .await
                    .with_context(|| format!("Failed to update device-farm job {}", job_id))?;
            }
        }

        self.store
            .save_test(record)
            .with_context(|| format!("Failed to save report for test '{}'", record.name))?;
        Ok(())
    }

    async fn on_teardown(&self, ctx: &mut SuiteContext) -> Result<()> {
        ctx.end_test();
        Ok(())
    }
}
