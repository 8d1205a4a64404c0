//! # Infrastructure Module / 基础设施模块
//!
//! This module provides infrastructure services for the runner: command
//! execution, file system helpers and the clients of the remote services
//! (device farm, pull-request comments, test-case management).
//!
//! 此模块为运行器提供基础设施服务：命令执行、文件系统辅助功能，
//! 以及远程服务（设备农场、拉取请求评论、测试用例管理）的客户端。

pub mod command;
pub mod farm;
pub mod fs;
pub mod github;
pub mod testrail;

// Re-export i18n functions for easier access
pub use rust_i18n::t;
