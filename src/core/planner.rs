//! # Test Execution Planner Module / 测试执行计划模块
//!
//! This module selects the test cases of one invocation: nightly-only cases
//! are left out of regular runs and an optional mark narrows the selection.
//!
//! 此模块选择一次调用的测试用例：常规运行会排除仅限夜间的用例，
//! 可选的标记会进一步缩小选择范围。

use crate::core::config::{NIGHTLY_MARK, TestCase};

/// Represents the execution plan for one invocation of the suite.
/// 表示套件一次调用的执行计划。
#[derive(Debug)]
pub struct ExecutionPlan {
    /// The cases to run, in configuration order.
    /// 要运行的用例，按配置顺序排列。
    pub cases_to_run: Vec<TestCase>,
    /// The number of nightly-only cases left out of a regular run.
    /// 常规运行中排除的仅限夜间用例数量。
    pub filtered_nightly_count: usize,
    /// The number of cases left out by the mark filter.
    /// 被标记过滤器排除的用例数量。
    pub filtered_mark_count: usize,
}

impl ExecutionPlan {
    /// TestRail case ids of the selected cases, in run order.
    /// 所选用例的 TestRail 用例 id，按运行顺序排列。
    pub fn testrail_case_ids(&self) -> Vec<u64> {
        self.cases_to_run.iter().filter_map(|c| c.testrail_case_id).collect()
    }
}

/// Creates an execution plan for the given cases.
///
/// # Arguments
/// * `cases` - Every case registered in the configuration
/// * `nightly` - Whether this is a nightly run, which includes nightly-only cases
/// * `mark` - Optional mark a case must carry to be selected
pub fn plan_execution(cases: Vec<TestCase>, nightly: bool, mark: Option<&str>) -> ExecutionPlan {
    let (scheduled, nightly_only): (Vec<_>, Vec<_>) = cases
        .into_iter()
        .partition(|case| nightly || !case.has_mark(NIGHTLY_MARK));

    let (cases_to_run, unmarked): (Vec<_>, Vec<_>) = match mark {
        Some(mark) => scheduled.into_iter().partition(|case| case.has_mark(mark)),
        None => (scheduled, vec![]),
    };

    ExecutionPlan {
        cases_to_run,
        filtered_nightly_count: nightly_only.len(),
        filtered_mark_count: unmarked.len(),
    }
}
