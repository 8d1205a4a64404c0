//! # Init Command Module / 初始化命令模块
//!
//! An interactive wizard that writes a starter `FarmSuite.toml` with a few
//! test case templates. `--non-interactive` writes the templates unchanged.
//!
//! 一个交互式向导，用于写入带有若干测试用例模板的初始 `FarmSuite.toml`。
//! `--non-interactive` 会原样写入这些模板。

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Input, MultiSelect, theme::ColorfulTheme};
use std::fs;
use std::path::Path;

use crate::core::config::{DEFAULT_CONFIG_FILE, NIGHTLY_MARK, SuiteConfig, TestCase};
use crate::infra::t;

/// Runs the wizard in the current directory.
///
/// 在当前目录中运行向导。
pub fn run_init_wizard(language: &str, non_interactive: bool) -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    let config = if non_interactive {
        SuiteConfig {
            language: language.to_string(),
            cases: template_cases(),
            ..SuiteConfig::default()
        }
    } else {
        let theme = ColorfulTheme::default();
        println!("\n{}", t!("init.welcome", locale = language).bold().cyan());
        println!("{}\n", t!("init.description", locale = language));

        if path.exists() && !confirm_overwrite(&theme, language)? {
            println!("{}", t!("init.aborted", locale = language).yellow());
            return Ok(());
        }
        SuiteConfig {
            language: language.to_string(),
            cases: prompt_for_cases(&theme, language)?,
            ..SuiteConfig::default()
        }
    };

    write_config(path, &config, language)?;
    println!(
        "\n{} {}",
        "✔".green(),
        t!("init.success", locale = language, path = DEFAULT_CONFIG_FILE).bold()
    );
    println!("{}", t!("init.usage_hint", locale = language));
    Ok(())
}

fn confirm_overwrite(theme: &ColorfulTheme, language: &str) -> Result<bool> {
    Confirm::with_theme(theme)
        .with_prompt(t!("init.overwrite_prompt", locale = language, path = DEFAULT_CONFIG_FILE))
        .default(false)
        .interact()
        .context(t!("init.confirmation_failed", locale = language).to_string())
}

/// The starter cases: a smoke test, a TestRail-tracked nightly test and a
/// placeholder for a custom command.
fn template_cases() -> Vec<TestCase> {
    let mut smoke = TestCase::new("test_wallet_opens", "python -m pytest tests/test_wallet.py");
    smoke.marks = vec!["smoke_1".to_string()];
    smoke.timeout_secs = Some(900);

    let mut nightly = TestCase::new(
        "test_send_transaction",
        "python -m pytest tests/test_transaction.py",
    );
    nightly.testrail_case_id = Some(1);
    nightly.marks = vec!["transaction".to_string(), NIGHTLY_MARK.to_string()];

    let custom = TestCase::new("custom", "./run_ui_test.sh --apk $FARM_APP_NAME");
    vec![smoke, nightly, custom]
}

fn prompt_for_cases(theme: &ColorfulTheme, language: &str) -> Result<Vec<TestCase>> {
    let templates = template_cases();
    let labels = [
        t!("init.template_smoke", locale = language).to_string(),
        t!("init.template_nightly", locale = language).to_string(),
        t!("init.template_custom", locale = language).to_string(),
    ];

    let selections = MultiSelect::with_theme(theme)
        .with_prompt(t!("init.select_templates", locale = language))
        .items(&labels)
        .defaults(&[true, true, false])
        .interact()
        .context(t!("init.selection_failed", locale = language).to_string())?;

    let mut cases = Vec::with_capacity(selections.len());
    for index in selections {
        let Some(mut case) = templates.get(index).cloned() else {
            continue;
        };
        case.command = Input::with_theme(theme)
            .with_prompt(t!("init.command_prompt", locale = language, name = &case.name))
            .default(case.command.clone())
            .interact_text()
            .context(t!("init.input_failed", locale = language).to_string())?;
        cases.push(case);
    }
    Ok(cases)
}

fn write_config(path: &Path, config: &SuiteConfig, language: &str) -> Result<()> {
    let toml_string = toml::to_string_pretty(config)
        .context(t!("init.serialize_failed", locale = language).to_string())?;
    fs::write(path, toml_string)
        .with_context(|| t!("init.write_failed", locale = language, path = path.display()).to_string())?;
    Ok(())
}
