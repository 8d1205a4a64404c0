//! # File System Operations Module / 文件系统操作模块
//!
//! Helpers for the report directory: file-name sanitizing and directory setup.
//!
//! 报告目录的辅助功能：文件名清理和目录准备。

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Turns a test name into a safe file stem. Anything outside `[A-Za-z0-9_-]`
/// becomes `_`.
///
/// 将测试名称转换为安全的文件名主干。`[A-Za-z0-9_-]` 之外的字符都会变为 `_`。
pub fn sanitize_file_stem(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized
    }
}

/// Creates `dir` (and its parents) when missing.
pub fn ensure_directory(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))
}

/// Lists the files in `dir` with the given extension, sorted by path.
/// A missing directory yields an empty list.
///
/// 列出 `dir` 中具有给定扩展名的文件，按路径排序。目录不存在时返回空列表。
pub fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(vec![]);
    }
    let mut files = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
