//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command: configure (artifact upload,
//! TestRail run), run the planned tests with reruns, then unconfigure
//! (pull-request comment, TestRail results).
//!
//! 此模块实现了 `run` 命令：配置（产物上传、TestRail 运行）、
//! 带重跑地运行计划中的测试，然后收尾（拉取请求评论、TestRail 结果）。

use anyhow::{Context, Result, bail};
use colored::*;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        config::{RunOptions, SuiteConfig, load_suite_config},
        execution::CommandExecutor,
        hooks::SuiteHooks,
        models::TestRecord,
        planner,
        rerun::RerunPolicy,
        runner::SuiteRunner,
        session::SuiteContext,
    },
    infra::{
        farm::{self, DeviceFarm, SauceLabsClient, UploadStatus},
        github::{GITHUB_TOKEN_VAR, GithubClient, PullRequestCommenter},
        t,
        testrail::{CaseManagement, TestRailClient},
    },
    reporting::{
        JsonReportStore, ReportStore, generate_html_report, print_failure_details, print_summary,
        render_report_body,
    },
};

/// Executes the run command. Returns whether every executed test passed.
///
/// # Errors
/// Configuration problems and artifact upload failures abort the run before
/// any test starts. Reporting failures propagate.
///
/// 执行运行命令。返回是否所有已执行的测试都通过。
/// 配置问题和产物上传失败会在任何测试开始之前中止运行。报告失败会向上传播。
pub async fn execute(options: RunOptions) -> Result<bool> {
    let config = load_suite_config(&options.config)?;
    let locale = crate::resolve_locale(&config.language);
    rust_i18n::set_locale(&locale);

    let app_name = farm::artifact_name(&options.apk)?;
    println!(
        "{}",
        t!("loading_suite_config", locale = &locale, path = options.config.display())
    );
    println!(
        "{}",
        t!("testing_artifact", locale = &locale, name = app_name.yellow(), build = &options.build_name)
    );
    println!("{}", t!("current_env", locale = &locale, env = options.env).cyan());

    let farm_client: Option<Arc<dyn DeviceFarm>> = if options.env.is_remote() {
        Some(Arc::new(SauceLabsClient::from_env(config.farm.base_url.clone())?))
    } else {
        None
    };
    let case_management = if options.nightly {
        Some(testrail_client(&config)?)
    } else {
        None
    };

    let plan = planner::plan_execution(config.cases.clone(), options.nightly, options.mark.as_deref());
    if plan.filtered_nightly_count > 0 {
        println!(
            "{}",
            t!("filtered_nightly_cases", locale = &locale, filtered = plan.filtered_nightly_count).cyan()
        );
    }
    if plan.filtered_mark_count > 0 {
        println!(
            "{}",
            t!("filtered_mark_cases", locale = &locale, filtered = plan.filtered_mark_count).cyan()
        );
    }
    if plan.cases_to_run.is_empty() {
        println!("{}", t!("no_cases_to_run", locale = &locale).green());
        return Ok(true);
    }

    // Configure
    let testrail_run = match &case_management {
        Some(client) => {
            let run_id = client.add_run(&app_name, &plan.testrail_case_ids()).await?;
            println!("{}", t!("testrail_run_created", locale = &locale, id = run_id).cyan());
            Some(run_id)
        }
        None => None,
    };
    if let Some(farm_client) = &farm_client {
        let http = reqwest::Client::new();
        let status = farm::ensure_artifact_uploaded(farm_client.as_ref(), &http, &options.apk, &app_name)
            .await
            .context(t!("artifact_upload_failed", locale = &locale).to_string())?;
        match status {
            UploadStatus::AlreadyStored => {
                println!("{}", t!("artifact_already_stored", locale = &locale, name = &app_name))
            }
            UploadStatus::Uploaded { bytes } => println!(
                "{}",
                t!("artifact_uploaded", locale = &locale, name = &app_name, bytes = bytes).green()
            ),
        }
    }

    // Run
    if options.rerun_count > 0 {
        println!(
            "{}",
            t!("rerun_enabled", locale = &locale, count = options.rerun_count).yellow()
        );
    }

    let store = Arc::new(JsonReportStore::new(config.report_dir.clone()));
    store.clear()?;
    let hooks = SuiteHooks::new(farm_client.clone(), store.clone());
    let executor = CommandExecutor::new(
        config.working_dir.clone().unwrap_or_default(),
        config.job_marker.clone(),
    );
    let policy = RerunPolicy::new(options.rerun_count, config.classifier()?);
    let stop_token = setup_signal_handler(&locale);

    let mut ctx = SuiteContext::new(options.build_name.clone(), app_name.clone());
    let summary = SuiteRunner::new(&executor, &hooks, &policy, options.env)
        .with_cancellation(stop_token)
        .run_all(&mut ctx, &plan.cases_to_run)
        .await?;

    print_summary(ctx.records(), &locale);

    if let Some(report_path) = &options.html {
        println!(
            "\n{}",
            t!("generating_html_report", locale = &locale, path = report_path.display())
        );
        if let Err(e) = generate_html_report(ctx.records(), report_path, &config.farm.job_url, &locale) {
            eprintln!("{} {:#}", t!("html_report_failed", locale = &locale).red(), e);
        }
    }

    // Unconfigure
    if let Some(pr_number) = options.pr_number {
        let records = store.load_tests()?;
        post_pull_request_report(&config, pr_number, &records, &locale).await?;
        println!("{}", t!("pr_comment_posted", locale = &locale, number = pr_number).green());
    }
    if let (Some(client), Some(run_id)) = (&case_management, testrail_run) {
        client.add_results(run_id, ctx.records()).await?;
        println!("{}", t!("testrail_results_pushed", locale = &locale, id = run_id).green());
    }

    if !summary.not_run.is_empty() {
        println!(
            "{}",
            t!("cases_not_run", locale = &locale, count = summary.not_run.len()).yellow()
        );
    }

    if summary.all_passed() {
        println!("\n{}", t!("all_tests_passed", locale = &locale).green().bold());
        Ok(true)
    } else {
        print_failure_details(ctx.records(), &locale);
        println!(
            "\n{}",
            t!("tests_failed", locale = &locale, count = summary.failed.len()).red().bold()
        );
        Ok(false)
    }
}

fn testrail_client(config: &SuiteConfig) -> Result<TestRailClient> {
    let Some(base_url) = config.testrail.base_url.clone() else {
        bail!("--nightly requires testrail.base_url in the suite config");
    };
    let Some(project_id) = config.testrail.project_id else {
        bail!("--nightly requires testrail.project_id in the suite config");
    };
    TestRailClient::from_env(base_url, project_id, config.farm.job_url.clone())
}

async fn post_pull_request_report(
    config: &SuiteConfig,
    pr_number: u64,
    records: &[TestRecord],
    locale: &str,
) -> Result<()> {
    let (Some(owner), Some(repo)) = (config.github.owner.clone(), config.github.repo.clone()) else {
        bail!("--pr-number requires github.owner and github.repo in the suite config");
    };
    let token = std::env::var(GITHUB_TOKEN_VAR)
        .with_context(|| format!("{} is not set", GITHUB_TOKEN_VAR))?;
    let client = GithubClient::new(config.github.api_url.clone(), owner, repo, token)?;
    let body = render_report_body(records, &config.farm.job_url, locale);
    client.post_comment(pr_number, &body).await
}

/// Sets up a signal handler for graceful shutdown.
fn setup_signal_handler(locale: &str) -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    let locale = locale.to_string();

    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            println!("\n{}", t!("shutdown_signal", locale = &locale).yellow());
            token_clone.cancel();
        }
    });

    token
}
