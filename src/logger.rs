// 日志系统 - 同时输出到控制台和按天轮转的日志文件

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::EnvFilter;

use crate::utils::file_system::get_log_dir;

/// 构造日志过滤器
///
/// 优先使用 `RUST_LOG` 环境变量，否则使用配置的级别
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// 初始化日志系统
///
/// # 参数
/// - `level`: 默认日志级别
/// - `console`: 是否同时输出到控制台（stderr，避免与进度条输出混在一起）
///
/// # 返回
/// - 日志目录
pub fn init(level: &str, console: bool) -> Result<PathBuf> {
    let log_dir = get_log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("创建日志目录失败: {:?}", log_dir))?;

    // 配置日志输出到文件（每天轮转）
    let file_appender = tracing_appender::rolling::daily(log_dir.clone(), "app.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // 保持 guard 在整个程序生命周期
    std::mem::forget(guard);

    let writer = if console {
        BoxMakeWriter::new(std::io::stderr.and(non_blocking))
    } else {
        BoxMakeWriter::new(non_blocking)
    };

    // 使用本地时区
    let timer = LocalTime::new(time::format_description::parse(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]",
    )?);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(build_filter(level))
        .with_writer(writer)
        .with_timer(timer)
        .with_ansi(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).context("设置全局日志订阅者失败")?;

    Ok(log_dir)
}
