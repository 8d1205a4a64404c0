//! # Command Execution Module / 命令执行模块
//!
//! Spawning test commands and capturing their merged output.
//!
//! 派生测试命令并捕获其合并输出。

use anyhow::{Result, anyhow, bail};
use std::env;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Expands environment variables and `~` in a command line, then splits it
/// into program and arguments with shell quoting rules.
///
/// 展开命令行中的环境变量和 `~`，然后按 shell 引号规则拆分为程序和参数。
pub fn parse_command_line(command_line: &str) -> Result<(String, Vec<String>)> {
    parse_command_line_with(command_line, &[])
}

/// Like [`parse_command_line`], with `vars` taking precedence over the process
/// environment during expansion.
///
/// 与 [`parse_command_line`] 相同，但展开时 `vars` 优先于进程环境变量。
pub fn parse_command_line_with(
    command_line: &str,
    vars: &[(&str, String)],
) -> Result<(String, Vec<String>)> {
    let lookup = |name: &str| -> Result<Option<String>, env::VarError> {
        match vars.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => Ok(Some(value.clone())),
            None => env::var(name).map(Some),
        }
    };
    let expanded = shellexpand::full_with_context(command_line, home_dir, lookup)
        .map_err(|e| anyhow!("Failed to expand command '{}': {}", command_line, e))?
        .to_string();

    let mut parts = shlex::split(&expanded)
        .ok_or_else(|| anyhow!("Failed to parse command: {}", expanded))?;

    if parts.is_empty() {
        bail!("Empty command after parsing.");
    }
    let program = parts.remove(0);
    Ok((program, parts))
}

fn home_dir() -> Option<String> {
    env::var("HOME").ok()
}

/// Spawns a command, captures its stdout and stderr.
/// The output streams are read concurrently and combined into a single string.
///
/// # Returns
/// A tuple containing:
/// - The `ExitStatus` of the process wrapped in an `io::Result`.
/// - The combined stdout and stderr as a `String`.
///
/// 派生一个命令，捕获其 stdout 和 stderr。
/// 输出流被并发读取并合并到一个字符串中。
pub async fn spawn_and_capture(
    cmd: tokio::process::Command,
) -> (std::io::Result<std::process::ExitStatus>, String) {
    let output = Arc::new(tokio::sync::Mutex::new(String::new()));
    let status = spawn_and_capture_into(cmd, Arc::clone(&output)).await;
    let captured = output.lock().await.clone();
    (status, captured)
}

/// Like [`spawn_and_capture`], but appends the output to a caller-owned
/// buffer line by line. When the returned future is dropped early (timeout,
/// cancellation), the buffer still holds every line read so far.
///
/// 与 [`spawn_and_capture`] 相同，但将输出逐行追加到调用方持有的缓冲区。
/// 如果返回的 future 被提前丢弃（超时、取消），缓冲区仍保留已读取的所有行。
pub async fn spawn_and_capture_into(
    mut cmd: tokio::process::Command,
    output: Arc<tokio::sync::Mutex<String>>,
) -> std::io::Result<std::process::ExitStatus> {
    let mut child = cmd
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .spawn()?;

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        return Err(std::io::Error::other("failed to capture child output"));
    };

    // 使用 Arc<Mutex<String>> 来允许多个任务（stdout 和 stderr）并发写入。
    let stdout_handle = tokio::spawn(collect_lines(stdout, Arc::clone(&output)));
    let stderr_handle = tokio::spawn(collect_lines(stderr, Arc::clone(&output)));

    let status = child.wait().await;

    // Wait for both readers so no trailing output is lost.
    // 等待两个读取任务完成，以确保不丢失末尾输出。
    if let Err(e) = stdout_handle.await {
        tracing::warn!(error = %e, "failed to join stdout reader");
    }
    if let Err(e) = stderr_handle.await {
        tracing::warn!(error = %e, "failed to join stderr reader");
    }

    status
}

async fn collect_lines<R>(stream: R, output: Arc<tokio::sync::Mutex<String>>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let mut output = output.lock().await;
        output.push_str(&line);
        output.push('\n');
    }
}
