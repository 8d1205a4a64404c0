//! # Farm Runner Library / Farm Runner 库
//!
//! This library drives a suite of mobile UI tests against a cloud device farm:
//! it uploads the app artifact, runs every test with bounded reruns for
//! transient infrastructure failures, records each attempt and its device
//! jobs, and reports the results to the console, an HTML file, a pull request
//! and TestRail.
//!
//! 此库针对云设备农场驱动一套移动端 UI 测试：上传应用产物，
//! 对每个测试在出现瞬态基础设施失败时进行有限次数的重跑，
//! 记录每次尝试及其设备作业，并将结果报告到控制台、HTML 文件、拉取请求和 TestRail。
//!
//! ## Modules / 模块
//!
//! - `core` - Data model, session state, rerun policy and the suite runner
//! - `infra` - Process execution, file system helpers and the remote service clients
//! - `reporting` - JSON report store, console summary and HTML rendering
//! - `cli` - Command-line interface and commands
//!
//! - `core` - 数据模型、会话状态、重跑策略和套件运行器
//! - `infra` - 进程执行、文件系统辅助函数和远程服务客户端
//! - `reporting` - JSON 报告存储、控制台摘要和 HTML 渲染
//! - `cli` - 命令行接口和命令

pub mod cli;
pub mod core;
pub mod infra;
pub mod reporting;

// Re-export commonly used items
pub use crate::core::config;
pub use crate::core::models;
pub use crate::core::runner;

/// Maps a requested locale onto one the crate ships: the full tag first
/// (e.g. "zh-CN"), then the language part (e.g. "en" from "en-US"), then "en".
///
/// 将请求的语言环境映射到本 crate 提供的语言环境：先匹配完整标签（例如 "zh-CN"），
/// 再匹配语言部分（例如 "en-US" 中的 "en"），最后回退到 "en"。
pub fn resolve_locale(locale: &str) -> String {
    let available_locales = rust_i18n::available_locales!();
    if available_locales.contains(&locale) {
        return locale.to_string();
    }
    locale
        .split(['-', '_'])
        .next()
        .filter(|lang_code| available_locales.contains(lang_code))
        .unwrap_or("en")
        .to_string()
}

/// Initializes i18n from the system locale.
/// 根据系统语言环境初始化国际化。
pub fn init() {
    let locale = sys_locale::get_locale().unwrap_or_else(|| "en".to_string());
    rust_i18n::set_locale(&resolve_locale(&locale));
}

// Initialize i18n
rust_i18n::i18n!("locales", fallback = "en");
