// Shared test helpers for integration tests
#![allow(dead_code)]

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::TempDir;

use farm_runner::core::execution::{AttemptContext, AttemptOutput, TestExecutor};
use farm_runner::core::config::TestCase;
use farm_runner::core::models::TestRecord;
use farm_runner::infra::farm::DeviceFarm;
use farm_runner::reporting::ReportStore;

/// Replays a fixed list of outputs per test name. Running out of outputs is
/// reported as an executor error.
#[derive(Default)]
pub struct ScriptedExecutor {
    scripts: Mutex<HashMap<String, VecDeque<AttemptOutput>>>,
    calls: Mutex<Vec<(String, u32)>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, name: &str, outputs: Vec<AttemptOutput>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(name.to_string(), outputs.into());
        self
    }

    /// `(test name, attempt number)` of every call, in order.
    pub fn calls(&self) -> Vec<(String, u32)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TestExecutor for ScriptedExecutor {
    async fn execute(&self, case: &TestCase, ctx: &AttemptContext) -> Result<AttemptOutput> {
        self.calls
            .lock()
            .unwrap()
            .push((case.name.clone(), ctx.attempt));
        let next = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&case.name)
            .and_then(VecDeque::pop_front);
        match next {
            Some(output) => Ok(output),
            None => bail!("no scripted output left for {}", case.name),
        }
    }
}

/// Announces `jobs`, then hangs until the attempt is cancelled and hands back
/// `partial` as a failed attempt.
pub struct HangingExecutor {
    pub jobs: Vec<String>,
    pub partial: String,
    pub calls: Mutex<u32>,
}

impl HangingExecutor {
    pub fn new(jobs: &[&str], partial: &str) -> Self {
        Self {
            jobs: jobs.iter().map(|j| j.to_string()).collect(),
            partial: partial.to_string(),
            calls: Mutex::new(0),
        }
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl TestExecutor for HangingExecutor {
    async fn execute(&self, _case: &TestCase, ctx: &AttemptContext) -> Result<AttemptOutput> {
        *self.calls.lock().unwrap() += 1;
        ctx.cancel.cancelled().await;
        Ok(AttemptOutput::failed(self.partial.clone()).with_jobs(self.jobs.clone()))
    }
}

/// Records every job update in memory.
#[derive(Default)]
pub struct RecordingFarm {
    pub stored: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<(String, usize)>>,
    pub updates: Mutex<Vec<(String, String, bool)>>,
}

impl RecordingFarm {
    pub fn updates(&self) -> Vec<(String, String, bool)> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeviceFarm for RecordingFarm {
    async fn stored_files(&self) -> Result<Vec<String>> {
        Ok(self.stored.lock().unwrap().clone())
    }

    async fn upload_artifact(&self, name: &str, content: Vec<u8>) -> Result<()> {
        self.uploads
            .lock()
            .unwrap()
            .push((name.to_string(), content.len()));
        Ok(())
    }

    async fn update_job(&self, job_id: &str, name: &str, passed: bool) -> Result<()> {
        self.updates
            .lock()
            .unwrap()
            .push((job_id.to_string(), name.to_string(), passed));
        Ok(())
    }
}

/// Keeps every saved snapshot, in save order.
#[derive(Default)]
pub struct MemoryStore {
    pub saves: Mutex<Vec<TestRecord>>,
}

impl MemoryStore {
    pub fn saves(&self) -> Vec<TestRecord> {
        self.saves.lock().unwrap().clone()
    }
}

impl ReportStore for MemoryStore {
    fn save_test(&self, record: &TestRecord) -> Result<()> {
        self.saves.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn load_tests(&self) -> Result<Vec<TestRecord>> {
        let mut latest: Vec<TestRecord> = vec![];
        for record in self.saves() {
            match latest.iter_mut().find(|r| r.name == record.name) {
                Some(slot) => *slot = record,
                None => latest.push(record),
            }
        }
        Ok(latest)
    }
}

pub const TRANSIENT_FAILURE: &str =
    "WebDriverException: Message: Original error: Error: ESOCKETTIMEDOUT";
pub const GENUINE_FAILURE: &str = "AssertionError: balance is 0.5, expected 1.0";

/// Writes a suite configuration into `dir` and returns its path.
pub fn write_suite_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("FarmSuite.toml");
    fs::write(&path, content).expect("Failed to write suite config");
    path
}
