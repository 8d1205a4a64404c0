//! # Core Module / 核心模块
//!
//! This module contains the core of the runner: session data models,
//! configuration, the rerun policy, lifecycle hooks and the suite runner.
//!
//! 此模块包含运行器的核心：会话数据模型、配置、重跑策略、生命周期钩子和套件运行器。

pub mod config;
pub mod execution;
pub mod hooks;
pub mod models;
pub mod planner;
pub mod rerun;
pub mod runner;
pub mod session;

// Re-exports
pub use config::SuiteConfig;
pub use rerun::RerunPolicy;
pub use runner::SuiteRunner;
pub use session::SuiteContext;
