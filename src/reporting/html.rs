//! # HTML Reporting Module / HTML 报告模块
//!
//! This module renders test records as HTML. The body fragment is what gets
//! posted on a pull request; [`generate_html_report`] wraps it into a
//! standalone, styled page.
//!
//! 此模块将测试记录渲染为 HTML。正文片段会被发布到拉取请求上；
//! [`generate_html_report`] 将其包装为独立的、带样式的页面。

use anyhow::{Context, Result};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use std::fs;
use std::path::Path;

use crate::core::models::{Outcome, TestRecord, TestRun};
use crate::infra::t;
use crate::reporting::console::status_str;

/// Embedded CSS styles for HTML reports / HTML 报告的嵌入式 CSS 样式
const HTML_STYLE: &str = "\
body{font-family:-apple-system,Segoe UI,Helvetica,Arial,sans-serif;margin:2em;color:#24292e}\
.summary-container{display:flex;gap:2em;margin-bottom:1.5em}\
.summary-item{display:flex;flex-direction:column;align-items:center}\
.count{font-size:2em;font-weight:bold}\
.passed-text{color:#28a745}.failed-text{color:#d73a49}\
table{border-collapse:collapse;width:100%}\
th,td{border:1px solid #e1e4e8;padding:6px 10px;text-align:left;vertical-align:top}\
pre{white-space:pre-wrap;background:#f6f8fa;padding:8px;margin:4px 0}";

fn job_link(job_url: &str, job_id: &str) -> String {
    format!("{}/{}", job_url.trim_end_matches('/'), job_id)
}

fn render_run(run: &TestRun, attempt: usize, job_url: &str, locale: &str) -> Markup {
    html! {
        li {
            (t!("report.attempt_log", locale = locale, attempt = attempt))
            @if let Some(outcome) = run.outcome() {
                ": " (outcome.to_string())
            }
            @for (i, job) in run.jobs().iter().enumerate() {
                " " a href=(job_link(job_url, job)) {
                    (t!("html_report.device", locale = locale, number = i + 1))
                }
            }
            @if let Some(error) = run.error() {
                pre { (error.trim_end()) }
            }
        }
    }
}

fn render_record(record: &TestRecord, job_url: &str, locale: &str) -> Markup {
    html! {
        tr {
            td { (record.name) }
            td { (status_str(record, locale)) }
            td {
                @if let Some(case_id) = record.testrail_case_id {
                    (case_id)
                }
            }
            td {
                ul {
                    @for (i, run) in record.testruns().iter().enumerate() {
                        (render_run(run, i + 1, job_url, locale))
                    }
                }
            }
        }
    }
}

fn render_table(records: &[&TestRecord], job_url: &str, locale: &str) -> Markup {
    html! {
        table {
            thead {
                tr {
                    th { (t!("html_report.table.header.name", locale = locale)) }
                    th { (t!("html_report.table.header.status", locale = locale)) }
                    th { (t!("html_report.table.header.case_id", locale = locale)) }
                    th { (t!("html_report.table.header.attempts", locale = locale)) }
                }
            }
            tbody {
                @for record in records {
                    (render_record(record, job_url, locale))
                }
            }
        }
    }
}

/// Renders the report body: counters, then failed tests, then passed tests.
/// Every string from the records is HTML-escaped.
///
/// 渲染报告正文：先是计数，然后是失败的测试，最后是通过的测试。
/// 来自记录的所有字符串都会进行 HTML 转义。
pub fn render_report_body(records: &[TestRecord], job_url: &str, locale: &str) -> String {
    let (passed, failed): (Vec<&TestRecord>, Vec<&TestRecord>) =
        records.iter().partition(|r| r.final_outcome() == Some(Outcome::Passed));

    let markup = html! {
        h2 { (t!("html_report.main_header", locale = locale)) }
        div class="summary-container" {
            div class="summary-item" {
                span class="count" { (records.len()) }
                span class="label" { (t!("html_report.summary.total", locale = locale)) }
            }
            div class="summary-item" {
                span class="count passed-text" { (passed.len()) }
                span class="label" { (t!("html_report.summary.passed", locale = locale)) }
            }
            div class="summary-item" {
                span class="count failed-text" { (failed.len()) }
                span class="label" { (t!("html_report.summary.failed", locale = locale)) }
            }
        }
        @if !failed.is_empty() {
            h3 { (t!("html_report.failed_tests", locale = locale)) }
            (render_table(&failed, job_url, locale))
        }
        @if !passed.is_empty() {
            h3 { (t!("html_report.passed_tests", locale = locale)) }
            (render_table(&passed, job_url, locale))
        }
    };
    markup.into_string()
}

/// Writes a standalone HTML report to `output_path`.
///
/// # Errors / 错误
/// Returns an error if the file cannot be written.
/// 如果无法写入文件则返回错误。
pub fn generate_html_report(
    records: &[TestRecord],
    output_path: &Path,
    job_url: &str,
    locale: &str,
) -> Result<()> {
    let page = html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (t!("html_report.title", locale = locale)) }
                style { (PreEscaped(HTML_STYLE)) }
            }
            body {
                (PreEscaped(render_report_body(records, job_url, locale)))
            }
        }
    };
    fs::write(output_path, page.into_string())
        .with_context(|| format!("Failed to write HTML report: {}", output_path.display()))?;
    Ok(())
}
