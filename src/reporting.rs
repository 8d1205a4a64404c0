//! # Reporting Module / 报告模块
//!
//! This module handles test reports: incremental JSON persistence of test
//! records, the colored console summary and the HTML report posted to pull
//! requests.
//!
//! 此模块处理测试报告：测试记录的增量 JSON 持久化、彩色控制台摘要，
//! 以及发布到拉取请求的 HTML 报告。

pub mod console;
pub mod html;
pub mod store;

// Re-export common reporting functions
pub use console::{print_failure_details, print_summary};
pub use html::{generate_html_report, render_report_body};
pub use store::{JsonReportStore, ReportStore};
