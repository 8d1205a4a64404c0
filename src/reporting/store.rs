//! # Report Store Module / 报告存储模块
//!
//! Incremental persistence of test records. The hooks save the current record
//! after every attempt, so a crashed or cancelled run still leaves a report of
//! everything that finished.
//!
//! 测试记录的增量持久化。钩子在每次尝试之后保存当前记录，
//! 因此崩溃或被取消的运行仍会留下所有已完成内容的报告。

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::models::TestRecord;
use crate::infra::fs::{ensure_directory, files_with_extension, sanitize_file_stem};

pub trait ReportStore: Send + Sync {
    /// Persists `record`, replacing any earlier copy of the same test.
    fn save_test(&self, record: &TestRecord) -> Result<()>;

    fn load_tests(&self) -> Result<Vec<TestRecord>>;
}

/// Stores one pretty-printed JSON file per test in a directory.
/// 在目录中为每个测试存储一个格式化的 JSON 文件。
#[derive(Debug, Clone)]
pub struct JsonReportStore {
    dir: PathBuf,
}

impl JsonReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Removes the JSON reports of a previous run.
    /// 删除之前运行的 JSON 报告。
    pub fn clear(&self) -> Result<()> {
        for path in files_with_extension(&self.dir, "json")? {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove old report: {}", path.display()))?;
        }
        Ok(())
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_file_stem(name)))
    }
}

impl ReportStore for JsonReportStore {
    fn save_test(&self, record: &TestRecord) -> Result<()> {
        ensure_directory(&self.dir)?;
        let path = self.path_for(&record.name);
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        Ok(())
    }

    fn load_tests(&self) -> Result<Vec<TestRecord>> {
        files_with_extension(&self.dir, "json")?
            .into_iter()
            .map(|path| {
                let content = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read report: {}", path.display()))?;
                serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse report: {}", path.display()))
            })
            .collect()
    }
}
