//! # Reporting Unit Tests / 报告单元测试
//!
//! Tests for the JSON report store and the HTML report rendering.
//!
//! 测试 JSON 报告存储和 HTML 报告渲染。

use tempfile::tempdir;

use farm_runner::core::models::{CaseMetadata, TestRecord};
use farm_runner::core::session::SuiteContext;
use farm_runner::reporting::{JsonReportStore, ReportStore, generate_html_report, render_report_body};

const JOB_URL: &str = "https://saucelabs.com/jobs";

fn records() -> Vec<TestRecord> {
    let mut ctx = SuiteContext::new("build", "app.apk");

    ctx.begin_test(&CaseMetadata::new("test_flaky"));
    ctx.record_job("job-1").unwrap();
    ctx.complete_call(false, Some("504 Gateway Time-out")).unwrap();
    ctx.end_test();
    ctx.begin_test(&CaseMetadata::new("test_flaky"));
    ctx.record_job("job-2").unwrap();
    ctx.complete_call(true, None).unwrap();
    ctx.end_test();

    ctx.begin_test(&CaseMetadata::new("test_<script>").with_case_id(7));
    ctx.complete_call(false, Some("expected <b>1</b> & got 2")).unwrap();
    ctx.end_test();

    ctx.into_data().tests
}

#[cfg(test)]
mod store_tests {
    use super::*;

    #[test]
    fn test_saved_records_load_back() {
        let dir = tempdir().unwrap();
        let store = JsonReportStore::new(dir.path().join("reports"));
        for record in records() {
            store.save_test(&record).unwrap();
        }

        let mut loaded = store.load_tests().unwrap();
        loaded.sort_by(|a, b| a.name.cmp(&b.name));
        let mut expected = records();
        expected.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(loaded, expected);
    }

    #[test]
    fn test_saving_again_replaces_the_previous_snapshot() {
        let dir = tempdir().unwrap();
        let store = JsonReportStore::new(dir.path());
        let mut record = TestRecord::new("test_send", None);
        store.save_test(&record).unwrap();
        record.create_new_testrun();
        store.save_test(&record).unwrap();

        let loaded = store.load_tests().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].attempts(), 1);
    }

    #[test]
    fn test_clear_removes_previous_reports() {
        let dir = tempdir().unwrap();
        let store = JsonReportStore::new(dir.path());
        store.save_test(&TestRecord::new("old", None)).unwrap();
        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        store.clear().unwrap();
        assert!(store.load_tests().unwrap().is_empty());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_missing_directory_loads_nothing() {
        let dir = tempdir().unwrap();
        let store = JsonReportStore::new(dir.path().join("never-created"));
        assert!(store.load_tests().unwrap().is_empty());
        store.clear().unwrap();
    }
}

#[cfg(test)]
mod html_tests {
    use super::*;

    #[test]
    fn test_body_lists_failed_tests_before_passed_ones() {
        let body = render_report_body(&records(), JOB_URL, "en");
        let failed_at = body.find("Failed tests").unwrap();
        let passed_at = body.find("Passed tests").unwrap();
        assert!(failed_at < passed_at);
        assert!(body.contains("Passed on rerun"));
        assert!(body.contains("https://saucelabs.com/jobs/job-1"));
        assert!(body.contains("https://saucelabs.com/jobs/job-2"));
    }

    #[test]
    fn test_record_text_is_escaped() {
        let body = render_report_body(&records(), JOB_URL, "en");
        assert!(body.contains("test_&lt;script&gt;"));
        assert!(body.contains("expected &lt;b&gt;1&lt;/b&gt; &amp; got 2"));
        assert!(!body.contains("<script>"));
    }

    #[test]
    fn test_only_present_sections_are_rendered() {
        let passing: Vec<TestRecord> = records()
            .into_iter()
            .filter(|r| r.is_passed())
            .collect();
        let body = render_report_body(&passing, JOB_URL, "en");
        assert!(!body.contains("Failed tests"));
        assert!(body.contains("Passed tests"));
    }

    #[test]
    fn test_standalone_page_is_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.html");
        generate_html_report(&records(), &path, JOB_URL, "en").unwrap();

        let page = std::fs::read_to_string(&path).unwrap();
        assert!(page.starts_with("<!DOCTYPE html>"));
        assert!(page.contains("<title>UI Test Report</title>"));
    }
}
