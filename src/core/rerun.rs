//! # Rerun Policy Module / 重跑策略模块
//!
//! Decides whether a failed attempt is re-executed. The decision combines the
//! configured rerun budget with a side-effect-free classification of the
//! failure text against a set of transient-failure patterns.
//!
//! 决定失败的尝试是否重新执行。该决定结合了配置的重跑预算，
//! 以及根据一组瞬态失败模式对失败文本进行的无副作用分类。

use once_cell::sync::Lazy;
use regex::RegexSet;
use thiserror::Error;

/// Failure messages known to come from device-farm or driver infrastructure
/// rather than from the application under test.
/// 已知来自设备农场或驱动基础设施（而非被测应用）的失败消息。
pub const DEFAULT_TRANSIENT_PATTERNS: &[&str] = &[
    r"Original error: Error: ESOCKETTIMEDOUT",
    r"The server didn't respond in time",
    r"An unknown server-side error occurred while processing the command",
    r"Could not proxy command to remote server\. Original error: Error: socket hang up",
    r"The server returned an invalid or incomplete response",
    r"502 Bad Gateway",
    r"504 Gateway Time-out",
    r"Unexpected server error",
    r"Internal Server Error",
    r"Session not started or terminated",
    r"Sauce could not start your job",
    r"ECONNRESET",
];

pub fn default_patterns() -> Vec<String> {
    DEFAULT_TRANSIENT_PATTERNS.iter().map(|p| p.to_string()).collect()
}

/// The class of a failure.
/// 失败的类别。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Caused by infrastructure flakiness; eligible for rerun.
    /// 由基础设施不稳定引起；可以重跑。
    Transient,
    /// A genuine assertion failure or defect.
    /// 真正的断言失败或缺陷。
    Genuine,
}

#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("invalid transient pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("the failure text is empty")]
    EmptyFailure,
}

/// Matches failure text against the configured transient patterns.
#[derive(Debug, Clone)]
pub struct TransientClassifier {
    set: RegexSet,
    patterns: Vec<String>,
}

impl TransientClassifier {
    /// Compiles the given regular expressions. An empty set classifies every
    /// failure as genuine.
    ///
    /// 编译给定的正则表达式。空集合会将所有失败归类为真正的失败。
    pub fn new<I, S>(patterns: I) -> Result<Self, ClassifierError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns: Vec<String> = patterns
            .into_iter()
            .map(|p| p.as_ref().to_string())
            .collect();
        let set = RegexSet::new(&patterns)?;
        Ok(Self { set, patterns })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn classify(&self, failure_text: &str) -> Result<FailureClass, ClassifyError> {
        if failure_text.trim().is_empty() {
            return Err(ClassifyError::EmptyFailure);
        }
        if self.set.is_match(failure_text) {
            Ok(FailureClass::Transient)
        } else {
            Ok(FailureClass::Genuine)
        }
    }

    /// The first pattern matching `failure_text`, for diagnostics.
    /// 第一个匹配 `failure_text` 的模式，用于诊断。
    pub fn matched_pattern(&self, failure_text: &str) -> Option<&str> {
        self.set
            .matches(failure_text)
            .iter()
            .next()
            .map(|i| self.patterns[i].as_str())
    }
}

static BUILT_IN: Lazy<TransientClassifier> = Lazy::new(|| {
    let patterns = default_patterns();
    // The built-in patterns are literal-safe; an empty set is the fail-closed fallback.
    let set = RegexSet::new(&patterns).unwrap_or_else(|_| RegexSet::empty());
    TransientClassifier { set, patterns }
});

impl Default for TransientClassifier {
    /// The built-in patterns, compiled once per process.
    fn default() -> Self {
        BUILT_IN.clone()
    }
}

/// Why a test is not executed again.
/// 测试不再执行的原因。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Passed,
    /// The rerun count is 0.
    RerunDisabled,
    /// Every allowed rerun has been spent.
    BudgetExhausted,
    /// The failure does not match a transient pattern.
    GenuineFailure,
    /// The failure could not be classified.
    Unclassifiable,
    /// The run is shutting down.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RerunDecision {
    Rerun,
    Stop(StopReason),
}

impl RerunDecision {
    pub fn is_rerun(self) -> bool {
        self == RerunDecision::Rerun
    }
}

/// The rerun budget together with the failure classifier.
///
/// A test gets at most `1 + max_reruns` attempts.
///
/// 重跑预算与失败分类器的组合。
/// 一个测试最多进行 `1 + max_reruns` 次尝试。
#[derive(Debug, Clone, Default)]
pub struct RerunPolicy {
    max_reruns: u32,
    classifier: TransientClassifier,
}

impl RerunPolicy {
    pub fn new(max_reruns: u32, classifier: TransientClassifier) -> Self {
        Self {
            max_reruns,
            classifier,
        }
    }

    pub fn max_reruns(&self) -> u32 {
        self.max_reruns
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_reruns.saturating_add(1)
    }

    pub fn classifier(&self) -> &TransientClassifier {
        &self.classifier
    }

    /// Decides what happens after `attempts_made` attempts, the latest of which
    /// ended with `failure` (`None` when it passed).
    ///
    /// Classification errors never propagate: they resolve to
    /// [`StopReason::Unclassifiable`].
    ///
    /// 决定在进行了 `attempts_made` 次尝试之后的行为，其中最近一次以 `failure` 结束
    /// （通过时为 `None`）。分类错误不会传播：它们被解析为 [`StopReason::Unclassifiable`]。
    pub fn should_rerun(&self, attempts_made: u32, failure: Option<&str>) -> RerunDecision {
        let Some(failure_text) = failure else {
            return RerunDecision::Stop(StopReason::Passed);
        };
        if self.max_reruns == 0 {
            return RerunDecision::Stop(StopReason::RerunDisabled);
        }
        if attempts_made >= self.max_attempts() {
            return RerunDecision::Stop(StopReason::BudgetExhausted);
        }
        match self.classifier.classify(failure_text) {
            Ok(FailureClass::Transient) => RerunDecision::Rerun,
            Ok(FailureClass::Genuine) => RerunDecision::Stop(StopReason::GenuineFailure),
            Err(e) => {
                tracing::warn!(error = %e, "failure could not be classified; not rerunning");
                RerunDecision::Stop(StopReason::Unclassifiable)
            }
        }
    }
}
