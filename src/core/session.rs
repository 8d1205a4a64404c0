//! # Test Session Module / 测试会话模块
//!
//! [`SuiteContext`] is the explicit context object threaded through the test
//! lifecycle. It owns the [`TestSuiteData`] and the "current test" slot, which
//! is reset on every setup and cleared on every teardown.
//!
//! [`SuiteContext`] 是贯穿测试生命周期的显式上下文对象。
//! 它拥有 [`TestSuiteData`] 和"当前测试"槽位，每次 setup 时重置，每次 teardown 时清空。

use crate::core::models::{CaseMetadata, SessionError, TestRecord, TestRun, TestSuiteData};

#[derive(Debug, Default)]
pub struct SuiteContext {
    data: TestSuiteData,
}

impl SuiteContext {
    pub fn new(build_name: impl Into<String>, apk_name: impl Into<String>) -> Self {
        Self {
            data: TestSuiteData::new(build_name, apk_name),
        }
    }

    pub fn data(&self) -> &TestSuiteData {
        &self.data
    }

    pub fn records(&self) -> &[TestRecord] {
        &self.data.tests
    }

    pub fn into_data(self) -> TestSuiteData {
        self.data
    }

    /// Starts one attempt of a test.
    ///
    /// The current-test slot is reset first. A record with the same name is
    /// reused (this is how reruns accumulate attempts); otherwise a new record
    /// is created. A fresh [`TestRun`] is appended either way.
    ///
    /// 开始测试的一次尝试。
    /// 首先重置当前测试槽位。同名记录会被复用（重跑即以此累积尝试）；
    /// 否则创建新记录。无论哪种情况都会追加一个新的 [`TestRun`]。
    pub fn begin_test(&mut self, meta: &CaseMetadata) -> &mut TestRecord {
        self.data.current = None;

        let index = match self.data.tests.iter().position(|t| t.name == meta.name) {
            Some(index) => index,
            None => {
                self.data
                    .tests
                    .push(TestRecord::new(meta.name.clone(), meta.testrail_case_id));
                self.data.tests.len() - 1
            }
        };

        self.data.current = Some(index);
        let record = &mut self.data.tests[index];
        record.create_new_testrun();
        record
    }

    pub fn current(&self) -> Option<&TestRecord> {
        self.data.current.map(|i| &self.data.tests[i])
    }

    pub fn current_mut(&mut self) -> Result<&mut TestRecord, SessionError> {
        match self.data.current {
            Some(i) => Ok(&mut self.data.tests[i]),
            None => Err(SessionError::NoCurrentTest),
        }
    }

    /// The attempt in progress for the current test.
    /// 当前测试正在进行的尝试。
    pub fn current_run_mut(&mut self) -> Result<&mut TestRun, SessionError> {
        let record = self.current_mut()?;
        let name = record.name.clone();
        match record.last_run_mut() {
            Some(run) if !run.is_finished() => Ok(run),
            Some(_) => Err(SessionError::RunAlreadyFinished(name)),
            None => Err(SessionError::NoRunInProgress(name)),
        }
    }

    /// Registers a device-farm job id against the attempt in progress.
    pub fn record_job(&mut self, job_id: &str) -> Result<(), SessionError> {
        let run = self.current_run_mut()?;
        run.add_job(job_id);
        Ok(())
    }

    /// Sets the outcome of the attempt in progress.
    /// `error` is stored only for failures; a failure without text stores an empty string.
    ///
    /// 设置正在进行的尝试的结果。
    /// `error` 仅在失败时保存；没有文本的失败会保存空字符串。
    pub fn complete_call(&mut self, passed: bool, error: Option<&str>) -> Result<(), SessionError> {
        let run = self.current_run_mut()?;
        if passed {
            run.finish_passed();
        } else {
            run.finish_failed(error.unwrap_or_default());
        }
        Ok(())
    }

    pub fn end_test(&mut self) {
        self.data.current = None;
    }
}
