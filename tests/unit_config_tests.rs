//! # Config Module Unit Tests / Config 模块单元测试
//!
//! Tests for parsing, validating and loading `FarmSuite.toml`, and for the
//! `Environment` option.
//!
//! 测试 `FarmSuite.toml` 的解析、验证和加载，以及 `Environment` 选项。

mod common;

use farm_runner::core::config::{
    DEFAULT_JOB_MARKER, Environment, SuiteConfig, TestCase, load_suite_config, parse_suite_config,
};
use farm_runner::core::rerun::default_patterns;

#[cfg(test)]
mod parsing_tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse_suite_config(
            r#"
[[cases]]
name = "test_wallet_opens"
command = "python -m pytest tests/test_wallet.py"
"#,
        )
        .unwrap();

        assert_eq!(config.language, "en");
        assert_eq!(config.job_marker, DEFAULT_JOB_MARKER);
        assert_eq!(config.rerun.transient_patterns, default_patterns());
        assert_eq!(config.farm.base_url, "https://saucelabs.com/rest/v1");
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert!(config.testrail.base_url.is_none());
        assert_eq!(config.cases.len(), 1);
        assert!(config.cases[0].marks.is_empty());
        assert!(config.cases[0].timeout_secs.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = parse_suite_config(
            r#"
language = "zh-CN"
job_marker = "SAUCE_JOB="
report_dir = "out/reports"

[rerun]
transient_patterns = ["device \\d+ offline"]

[github]
owner = "status-im"
repo = "status-mobile"

[testrail]
base_url = "https://ethstatus.testrail.net"
project_id = 14

[[cases]]
name = "test_send_tx"
command = "pytest -k test_send_tx"
testrail_case_id = 5342
marks = ["transaction", "nightly"]
timeout_secs = 600
"#,
        )
        .unwrap();

        assert_eq!(config.language, "zh-CN");
        assert_eq!(config.job_marker, "SAUCE_JOB=");
        assert_eq!(config.rerun.transient_patterns, vec!["device \\d+ offline"]);
        assert_eq!(config.github.owner.as_deref(), Some("status-im"));
        assert_eq!(config.testrail.project_id, Some(14));
        let case = &config.cases[0];
        assert_eq!(case.testrail_case_id, Some(5342));
        assert!(case.has_mark("nightly"));
        assert_eq!(case.timeout_secs, Some(600));
        assert_eq!(case.metadata().testrail_case_id, Some(5342));
    }

    #[test]
    fn test_invalid_toml_is_rejected() {
        assert!(parse_suite_config("[[cases]\nname = \"broken\"").is_err());
    }

    #[test]
    fn test_case_without_command_is_rejected() {
        assert!(parse_suite_config("[[cases]]\nname = \"no_command\"").is_err());
    }
}

#[cfg(test)]
mod validation_tests {
    use super::*;

    fn config_with(cases: Vec<TestCase>) -> SuiteConfig {
        SuiteConfig {
            cases,
            ..SuiteConfig::default()
        }
    }

    #[test]
    fn test_duplicate_names_are_rejected() {
        let config = config_with(vec![TestCase::new("dup", "true"), TestCase::new("dup", "false")]);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate"));
    }

    #[test]
    fn test_empty_command_is_rejected() {
        let config = config_with(vec![TestCase::new("blank", "   ")]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_job_marker_is_rejected() {
        let mut config = config_with(vec![TestCase::new("ok", "true")]);
        config.job_marker = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let mut config = config_with(vec![]);
        config.rerun.transient_patterns = vec!["(".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let config = config_with(vec![TestCase::new("test_a", "pytest -k a")]);
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(parse_suite_config(&text).unwrap(), config);
    }
}

#[cfg(test)]
mod loading_tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_are_resolved_against_the_config_directory() {
        let dir = tempdir().unwrap();
        let path = common::write_suite_config(
            &dir,
            "[[cases]]\nname = \"a\"\ncommand = \"true\"\n",
        );

        let config = load_suite_config(&path).unwrap();
        assert_eq!(config.working_dir.as_deref(), Some(dir.path()));
        assert_eq!(config.report_dir, dir.path().join("reports"));
    }

    #[test]
    fn test_relative_working_dir_is_joined() {
        let dir = tempdir().unwrap();
        let path = common::write_suite_config(
            &dir,
            "working_dir = \"tests\"\n[[cases]]\nname = \"a\"\ncommand = \"true\"\n",
        );

        let config = load_suite_config(&path).unwrap();
        assert_eq!(config.working_dir, Some(dir.path().join("tests")));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        assert!(load_suite_config(&dir.path().join("missing.toml")).is_err());
    }
}

#[cfg(test)]
mod environment_tests {
    use super::*;

    #[test]
    fn test_environment_parsing() {
        assert_eq!("local".parse::<Environment>().unwrap(), Environment::Local);
        assert_eq!("Sauce".parse::<Environment>().unwrap(), Environment::Sauce);
        assert!("lab".parse::<Environment>().is_err());
    }

    #[test]
    fn test_only_sauce_is_remote() {
        assert!(Environment::Sauce.is_remote());
        assert!(!Environment::Local.is_remote());
        assert_eq!(Environment::default(), Environment::Sauce);
        assert_eq!(Environment::Local.to_string(), "local");
    }
}
