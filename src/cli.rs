//! # CLI Module / 命令行模块
//!
//! Builds the localized command-line interface and dispatches subcommands.
//!
//! 构建本地化的命令行接口并分派子命令。

pub mod commands;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::core::config::{DEFAULT_CONFIG_FILE, Environment, RunOptions, default_build_name};
use crate::infra::t;

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` argument.
fn pre_parse_language() -> String {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        if let Some(lang) = args.get(pos + 1) {
            return lang.clone();
        }
    }
    // Fallback to system language detection
    sys_locale::get_locale().unwrap_or_else(|| "en".to_string())
}

pub fn build_cli(locale: &str) -> Command {
    Command::new("farm-runner")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli_about", locale = locale).to_string())
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cmd_run_about", locale = locale).to_string())
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .help(t!("arg_config", locale = locale).to_string())
                        .value_name("CONFIG")
                        .default_value(DEFAULT_CONFIG_FILE)
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("build")
                        .long("build")
                        .help(t!("arg_build", locale = locale).to_string())
                        .value_name("BUILD")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("apk")
                        .long("apk")
                        .help(t!("arg_apk", locale = locale).to_string())
                        .value_name("APK")
                        .required(true)
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("env")
                        .long("env")
                        .help(t!("arg_env", locale = locale).to_string())
                        .value_name("ENV")
                        .default_value("sauce")
                        .value_parser(["local", "sauce"])
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("log")
                        .long("log")
                        .help(t!("arg_log", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("pr-number")
                        .long("pr-number")
                        .visible_alias("pr_number")
                        .help(t!("arg_pr_number", locale = locale).to_string())
                        .value_name("PR_NUMBER")
                        .value_parser(clap::value_parser!(u64))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("nightly")
                        .long("nightly")
                        .help(t!("arg_nightly", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("rerun-count")
                        .long("rerun-count")
                        .visible_alias("rerun_count")
                        .help(t!("arg_rerun_count", locale = locale).to_string())
                        .value_name("RERUN_COUNT")
                        .default_value("0")
                        .value_parser(clap::value_parser!(u32))
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("mark")
                        .short('m')
                        .long("mark")
                        .help(t!("arg_mark", locale = locale).to_string())
                        .value_name("MARK")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("html")
                        .long("html")
                        .help(t!("arg_html", locale = locale).to_string())
                        .value_name("HTML")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                ),
        )
        .subcommand(
            Command::new("init")
                .about(t!("cmd_init_about", locale = locale).to_string())
                .arg(
                    Arg::new("non-interactive")
                        .long("non-interactive")
                        .help(t!("arg_non_interactive", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                ),
        )
}

/// Converts the `run` subcommand's matches into [`RunOptions`].
/// 将 `run` 子命令的匹配结果转换为 [`RunOptions`]。
pub fn run_options(matches: &ArgMatches) -> Result<RunOptions> {
    let env = matches
        .get_one::<String>("env")
        .map(String::as_str)
        .unwrap_or("sauce")
        .parse::<Environment>()?;
    let apk = matches
        .get_one::<String>("apk")
        .cloned()
        .context("--apk is required")?;

    Ok(RunOptions {
        config: matches
            .get_one::<PathBuf>("config")
            .cloned()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
        build_name: matches
            .get_one::<String>("build")
            .cloned()
            .unwrap_or_else(default_build_name),
        apk,
        env,
        log: matches.get_flag("log"),
        pr_number: matches.get_one::<u64>("pr-number").copied(),
        nightly: matches.get_flag("nightly"),
        rerun_count: matches.get_one::<u32>("rerun-count").copied().unwrap_or(0),
        mark: matches.get_one::<String>("mark").cloned(),
        html: matches.get_one::<PathBuf>("html").cloned(),
    })
}

/// Installs the `tracing` subscriber. Step logging is shown with `--log`;
/// `RUST_LOG` overrides either level.
///
/// 安装 `tracing` 订阅者。使用 `--log` 时显示步骤日志；`RUST_LOG` 会覆盖级别。
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    // A second initialization (e.g. in tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Entry point used by `main`. Returns `Ok(false)` when the suite ran but
/// some test failed, so that the exit code reflects the aggregate result.
///
/// `main` 使用的入口点。当套件已运行但有测试失败时返回 `Ok(false)`，
/// 以便退出码反映总体结果。
pub async fn run() -> Result<bool> {
    // Pre-parse language and initialize i18n first.
    let language = crate::resolve_locale(&pre_parse_language());
    rust_i18n::set_locale(&language);

    let matches = build_cli(&language).get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let options = run_options(run_matches)?;
            init_logging(options.log);
            commands::run::execute(options).await
        }
        Some(("init", init_matches)) => {
            let non_interactive = init_matches.get_flag("non-interactive");
            commands::init::run_init_wizard(&language, non_interactive)?;
            Ok(true)
        }
        _ => {
            build_cli(&language).print_help()?;
            Ok(true)
        }
    }
}
