//! # Console Reporting Module / 控制台报告模块
//!
//! This module prints the colored end-of-run summary and the details of
//! every failed test.
//!
//! 此模块打印彩色的运行结束摘要以及每个失败测试的详细信息。

use colored::*;

use crate::core::models::{Outcome, TestRecord};
use crate::infra::t;

/// The localized status text of a record.
/// 记录的本地化状态文本。
pub fn status_str(record: &TestRecord, locale: &str) -> String {
    match record.final_outcome() {
        Some(Outcome::Passed) if record.attempts() > 1 => {
            t!("report.status_passed_on_rerun", locale = locale).to_string()
        }
        Some(Outcome::Passed) => t!("report.status_passed", locale = locale).to_string(),
        Some(Outcome::Failed) => t!("report.status_failed", locale = locale).to_string(),
        None => t!("report.status_not_finished", locale = locale).to_string(),
    }
}

/// Prints a formatted summary of test records to the console.
///
/// # Output Format / 输出格式
/// ```text
/// --- Test Summary ---
///   - Passed           | test_send_eth_from_wallet_to_contact     | 1 attempt(s)
///   - Passed on rerun  | test_send_stt_from_wallet                | 2 attempt(s)
///   - Failed           | test_balance_is_updated                  | 1 attempt(s)
/// ```
pub fn print_summary(records: &[TestRecord], locale: &str) {
    println!("\n{}", t!("test_summary_banner", locale = locale).bold());

    for record in records {
        let status = status_str(record, locale);
        let status_colored = match record.final_outcome() {
            Some(Outcome::Passed) if record.attempts() > 1 => status.yellow(),
            Some(Outcome::Passed) => status.green(),
            Some(Outcome::Failed) => status.red(),
            None => status.dimmed(),
        };
        let attempts = t!("report.attempts", locale = locale, count = record.attempts());
        let jobs: Vec<&str> = record
            .last_run()
            .map(|run| run.jobs().iter().map(String::as_str).collect())
            .unwrap_or_default();
        let jobs_str = if jobs.is_empty() {
            String::new()
        } else {
            format!(" [{}]", jobs.join(", "))
        };

        println!(
            "  - {:<18} | {:<40} | {}{}",
            status_colored,
            record.name,
            attempts,
            jobs_str.dimmed()
        );
    }
}

/// Prints every attempt's error text for the tests that ended failed.
/// 打印以失败告终的测试每次尝试的错误文本。
pub fn print_failure_details(records: &[TestRecord], locale: &str) {
    let failed: Vec<&TestRecord> = records
        .iter()
        .filter(|r| r.final_outcome() == Some(Outcome::Failed))
        .collect();
    if failed.is_empty() {
        return;
    }

    println!("\n{}", t!("failure_banner", locale = locale).red().bold());
    println!("{}", "-".repeat(80));

    for (i, record) in failed.iter().enumerate() {
        println!(
            "[{}/{}] {} '{}'",
            i + 1,
            failed.len(),
            t!("report_header_failure", locale = locale).red(),
            record.name.cyan()
        );
        for (attempt, run) in record.testruns().iter().enumerate() {
            let Some(error) = run.error() else { continue };
            println!(
                "\n--- {} ---\n",
                t!("report.attempt_log", locale = locale, attempt = attempt + 1).yellow()
            );
            println!("{}", error.trim_end());
        }
        println!("\n{}", "-".repeat(80));
    }
}
